//! Client-side state tests: credential persistence on disk, the outbound auth
//! link, the derived login state, and the startup routing gate — wired
//! together the way a real session uses them.

use reqwest::header::AUTHORIZATION;
use tempfile::tempdir;

use notedly::client::{
    initial_route, AuthLink, CredentialStore, FileCredentialStore, LoginStateCache, Route,
};
use notedly::identity::Principal;
use notedly::token::TokenCodec;

fn request_builder() -> reqwest::RequestBuilder {
    reqwest::Client::new().post("http://localhost:0/api")
}

#[tokio::test]
async fn stored_credential_survives_a_restart() {
    let tmp = tempdir().unwrap();
    {
        let store = FileCredentialStore::new(tmp.path());
        store.set("persisted-token").await.unwrap();
    }
    // A fresh store over the same folder sees the same credential.
    let store = FileCredentialStore::new(tmp.path());
    assert_eq!(store.get().await.unwrap().as_deref(), Some("persisted-token"));
    assert_eq!(initial_route(&store).await.unwrap(), Route::App);
}

#[tokio::test]
async fn issued_token_flows_from_store_to_header_and_verifies() {
    let tmp = tempdir().unwrap();
    let store = FileCredentialStore::new(tmp.path());

    let codec = TokenCodec::new(b"client-flow-secret");
    let me = Principal { user_id: "u-42".into(), username: "nia".into() };
    let token = codec.issue(&me).unwrap();
    store.set(&token).await.unwrap();

    // The auth link reads the stored credential and attaches it verbatim.
    let link = AuthLink::new(store.clone());
    let request = link.apply(request_builder()).await.unwrap().build().unwrap();
    let header = request.headers().get(AUTHORIZATION).unwrap().to_str().unwrap();
    assert_eq!(header, token);

    // What went over the wire decodes back to the same identity.
    assert_eq!(codec.verify(header).unwrap(), me);
}

#[tokio::test]
async fn sign_out_routes_back_to_the_auth_flow() {
    let tmp = tempdir().unwrap();
    let store = FileCredentialStore::new(tmp.path());
    store.set("tok").await.unwrap();
    assert_eq!(initial_route(&store).await.unwrap(), Route::App);

    store.delete().await.unwrap();
    assert_eq!(initial_route(&store).await.unwrap(), Route::Auth);

    // Deleting an already-absent credential is a no-op, not an error.
    store.delete().await.unwrap();
}

#[tokio::test]
async fn login_state_follows_the_file_store_through_reset() {
    let tmp = tempdir().unwrap();
    let store = FileCredentialStore::new(tmp.path());
    let cache = LoginStateCache::new(store.clone()).await.unwrap();
    assert!(!cache.is_logged_in());

    store.set("tok").await.unwrap();
    assert!(cache.refresh().await.unwrap());

    // A full reset recomputes from the store before returning, so the value
    // observed immediately afterwards matches credential presence.
    assert!(cache.reset().await.unwrap());
    assert!(cache.is_logged_in());

    store.delete().await.unwrap();
    assert!(!cache.reset().await.unwrap());
    assert!(!cache.is_logged_in());
}

#[tokio::test]
async fn unauthenticated_requests_carry_an_empty_header() {
    let tmp = tempdir().unwrap();
    let link = AuthLink::new(FileCredentialStore::new(tmp.path()));
    let request = link.apply(request_builder()).await.unwrap().build().unwrap();
    assert_eq!(request.headers().get(AUTHORIZATION).unwrap(), "");
}
