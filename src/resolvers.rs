//! Business resolvers for the typed API operations. Every operation receives
//! the per-request `RequestContext`; identity-requiring operations reject
//! anonymous callers with `sign_in_required`, which is deliberately distinct
//! from the `invalid_token` error the context builder raises.

use crate::error::{AppError, AppResult};
use crate::identity::{AuthProvider, RequestContext, SignInRequest, SignUpRequest};
use crate::schema::{ApiRequest, ApiResponse, Note, User, DEFAULT_FEED_LIMIT};
use crate::storage::{NoteRecord, Store};

fn note_dto(store: &Store, record: &NoteRecord) -> Note {
    Note::from_record(record, store.user_by_id(&record.author_id))
}

fn note_not_found() -> AppError {
    AppError::not_found("note_not_found", "Note not found")
}

/// Execute one operation against the store with the caller's identity.
pub fn dispatch(ctx: &RequestContext, provider: &dyn AuthProvider, req: ApiRequest) -> AppResult<ApiResponse> {
    match req {
        ApiRequest::Notes { limit } => {
            let guard = ctx.store.0.lock();
            let notes = guard
                .notes_newest_first(limit.unwrap_or(DEFAULT_FEED_LIMIT))
                .iter()
                .map(|n| note_dto(&guard, n))
                .collect();
            Ok(ApiResponse::Notes { notes })
        }
        ApiRequest::Note { id } => {
            let guard = ctx.store.0.lock();
            let record = guard.note(&id).ok_or_else(note_not_found)?;
            Ok(ApiResponse::Note { note: note_dto(&guard, record) })
        }
        ApiRequest::MyNotes => {
            let me = ctx.require_principal()?;
            let guard = ctx.store.0.lock();
            let notes = guard
                .notes_by_author(&me.user_id)
                .iter()
                .map(|n| note_dto(&guard, n))
                .collect();
            Ok(ApiResponse::Notes { notes })
        }
        ApiRequest::Favorites => {
            let me = ctx.require_principal()?;
            let guard = ctx.store.0.lock();
            let notes = guard
                .notes_favorited_by(&me.user_id)
                .iter()
                .map(|n| note_dto(&guard, n))
                .collect();
            Ok(ApiResponse::Notes { notes })
        }
        ApiRequest::Me => {
            let me = ctx.require_principal()?;
            let guard = ctx.store.0.lock();
            let user = guard
                .user_by_id(&me.user_id)
                .ok_or_else(|| AppError::not_found("user_not_found", "User not found"))?;
            Ok(ApiResponse::User { user: User::from_record(user) })
        }
        ApiRequest::SignUp { username, email, password } => {
            let token = provider.sign_up(&SignUpRequest { username, email, password })?;
            Ok(ApiResponse::Token { token })
        }
        ApiRequest::SignIn { email, password } => {
            let token = provider.sign_in(&SignInRequest { email, password })?;
            Ok(ApiResponse::Token { token })
        }
        ApiRequest::NewNote { content } => {
            let me = ctx.require_principal()?;
            if content.trim().is_empty() {
                return Err(AppError::user("empty_note", "note content must not be empty"));
            }
            let mut guard = ctx.store.0.lock();
            let record = guard.create_note(&me.user_id, &content)?;
            Ok(ApiResponse::Note { note: note_dto(&guard, &record) })
        }
        ApiRequest::UpdateNote { id, content } => {
            let me = ctx.require_principal()?;
            let mut guard = ctx.store.0.lock();
            let existing = guard.note(&id).ok_or_else(note_not_found)?;
            if existing.author_id != me.user_id {
                return Err(AppError::forbidden("not_note_author", "You don't have permission to modify this note"));
            }
            let record = guard.update_note(&id, &content)?.ok_or_else(note_not_found)?;
            Ok(ApiResponse::Note { note: note_dto(&guard, &record) })
        }
        ApiRequest::DeleteNote { id } => {
            let me = ctx.require_principal()?;
            let mut guard = ctx.store.0.lock();
            let existing = guard.note(&id).ok_or_else(note_not_found)?;
            if existing.author_id != me.user_id {
                return Err(AppError::forbidden("not_note_author", "You don't have permission to modify this note"));
            }
            guard.delete_note(&id)?;
            Ok(ApiResponse::Deleted { id })
        }
        ApiRequest::ToggleFavorite { id } => {
            let me = ctx.require_principal()?;
            let mut guard = ctx.store.0.lock();
            let record = guard.toggle_favorite(&id, &me.user_id)?.ok_or_else(note_not_found)?;
            Ok(ApiResponse::Note { note: note_dto(&guard, &record) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{LocalAuthProvider, Principal};
    use crate::storage::SharedStore;
    use crate::token::TokenCodec;
    use tempfile::tempdir;

    struct Fixture {
        store: SharedStore,
        provider: LocalAuthProvider,
        codec: TokenCodec,
        _tmp: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let tmp = tempdir().unwrap();
        let codec = TokenCodec::new(b"resolver-test-secret");
        let store = SharedStore::new(tmp.path()).unwrap();
        let provider = LocalAuthProvider::new(store.clone(), codec.clone());
        Fixture { store, provider, codec, _tmp: tmp }
    }

    fn signed_up(fx: &Fixture, name: &str) -> Principal {
        let ctx = RequestContext::anonymous(fx.store.clone());
        let resp = dispatch(&ctx, &fx.provider, ApiRequest::SignUp {
            username: name.into(),
            email: format!("{}@example.com", name),
            password: "pw".into(),
        }).unwrap();
        let ApiResponse::Token { token } = resp else { panic!("expected token") };
        fx.codec.verify(&token).unwrap()
    }

    #[test]
    fn anonymous_can_read_feed_but_not_write() {
        let fx = fixture();
        let ctx = RequestContext::anonymous(fx.store.clone());
        let resp = dispatch(&ctx, &fx.provider, ApiRequest::Notes { limit: None }).unwrap();
        assert_eq!(resp, ApiResponse::Notes { notes: vec![] });

        let err = dispatch(&ctx, &fx.provider, ApiRequest::NewNote { content: "x".into() }).unwrap_err();
        assert_eq!(err.code_str(), "sign_in_required");
        assert_eq!(err.http_status(), 403);
    }

    #[test]
    fn note_lifecycle_with_ownership_enforcement() {
        let fx = fixture();
        let ida = signed_up(&fx, "ana");
        let idb = signed_up(&fx, "bob");
        let ana = RequestContext::authenticated(ida, fx.store.clone());
        let bob = RequestContext::authenticated(idb, fx.store.clone());

        let resp = dispatch(&ana, &fx.provider, ApiRequest::NewNote { content: "first".into() }).unwrap();
        let ApiResponse::Note { note } = resp else { panic!("expected note") };
        assert_eq!(note.author.username, "ana");

        // Someone else cannot edit or delete it.
        let err = dispatch(&bob, &fx.provider, ApiRequest::UpdateNote { id: note.id.clone(), content: "hijack".into() }).unwrap_err();
        assert_eq!(err.code_str(), "not_note_author");
        let err = dispatch(&bob, &fx.provider, ApiRequest::DeleteNote { id: note.id.clone() }).unwrap_err();
        assert_eq!(err.code_str(), "not_note_author");

        // But anyone signed in can favorite it.
        let resp = dispatch(&bob, &fx.provider, ApiRequest::ToggleFavorite { id: note.id.clone() }).unwrap();
        let ApiResponse::Note { note: favd } = resp else { panic!("expected note") };
        assert_eq!(favd.favorite_count, 1);

        let resp = dispatch(&ana, &fx.provider, ApiRequest::UpdateNote { id: note.id.clone(), content: "edited".into() }).unwrap();
        let ApiResponse::Note { note: edited } = resp else { panic!("expected note") };
        assert_eq!(edited.content, "edited");

        let resp = dispatch(&ana, &fx.provider, ApiRequest::DeleteNote { id: note.id.clone() }).unwrap();
        assert_eq!(resp, ApiResponse::Deleted { id: note.id.clone() });
        let err = dispatch(&ana, &fx.provider, ApiRequest::Note { id: note.id }).unwrap_err();
        assert_eq!(err.code_str(), "note_not_found");
    }

    #[test]
    fn my_notes_and_favorites_are_scoped_to_caller() {
        let fx = fixture();
        let ida = signed_up(&fx, "cora");
        let idb = signed_up(&fx, "dane");
        let cora = RequestContext::authenticated(ida, fx.store.clone());
        let dane = RequestContext::authenticated(idb, fx.store.clone());

        dispatch(&cora, &fx.provider, ApiRequest::NewNote { content: "cora's".into() }).unwrap();
        let ApiResponse::Note { note } = dispatch(&dane, &fx.provider, ApiRequest::NewNote { content: "dane's".into() }).unwrap() else { panic!() };
        dispatch(&cora, &fx.provider, ApiRequest::ToggleFavorite { id: note.id }).unwrap();

        let ApiResponse::Notes { notes } = dispatch(&cora, &fx.provider, ApiRequest::MyNotes).unwrap() else { panic!() };
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].content, "cora's");

        let ApiResponse::Notes { notes } = dispatch(&cora, &fx.provider, ApiRequest::Favorites).unwrap() else { panic!() };
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].content, "dane's");

        let ApiResponse::Notes { notes } = dispatch(&dane, &fx.provider, ApiRequest::Favorites).unwrap() else { panic!() };
        assert!(notes.is_empty());
    }

    #[test]
    fn me_returns_profile_without_secrets() {
        let fx = fixture();
        let id = signed_up(&fx, "elle");
        let ctx = RequestContext::authenticated(id, fx.store.clone());
        let ApiResponse::User { user } = dispatch(&ctx, &fx.provider, ApiRequest::Me).unwrap() else { panic!() };
        assert_eq!(user.username, "elle");
        assert_eq!(user.email, "elle@example.com");
        let as_json = serde_json::to_value(&user).unwrap();
        assert!(as_json.get("password_hash").is_none());
    }
}
