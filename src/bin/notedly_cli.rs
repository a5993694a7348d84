//!
//! notedly CLI binary
//! -------------------
//! Interactive client for a notedly server. On startup it reads the
//! credential store and lands on either the signed-in or signed-out flow,
//! then runs a small interpreter over the typed API operations.

use std::env;

use anyhow::{anyhow, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use notedly::client::{initial_route, ApiSession, FileCredentialStore, Route};
use notedly::schema::{ApiRequest, ApiResponse, Note};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--connect <url>] [--credentials <dir>]\n\nFlags:\n  --connect <url>        API base URI (default: NOTEDLY_API_URI or http://127.0.0.1:4000)\n  --credentials <dir>    Folder holding the stored token (default: ~/.notedly)\n  -h, --help             Show this help\n\nInteractive commands:\n  signup <username> <email> <password>   create an account and sign in\n  signin <email> <password>              sign in\n  signout                                sign out and forget the token\n  whoami                                 show the signed-in profile\n  feed [limit]                           newest notes from everyone\n  mine                                   your notes\n  favorites                              notes you favorited\n  show <id>                              one note\n  new <content...>                       create a note\n  edit <id> <content...>                 edit one of your notes\n  delete <id>                            delete one of your notes\n  favorite <id>                          toggle a favorite\n  status                                 connection and login status\n  help                                   show this help\n  quit | exit                            leave"
    );
}

fn default_credentials_dir() -> String {
    let home = env::var("HOME").or_else(|_| env::var("USERPROFILE")).unwrap_or_else(|_| ".".into());
    format!("{}/.notedly", home)
}

fn print_note(note: &Note) {
    println!(
        "[{}] @{} ({} favorites, updated {})",
        note.id, note.author.username, note.favorite_count, note.updated_at.format("%Y-%m-%d %H:%M")
    );
    println!("  {}", note.content);
}

fn print_notes(notes: &[Note]) {
    if notes.is_empty() {
        println!("(no notes)");
        return;
    }
    for note in notes {
        print_note(note);
    }
}

async fn run_command(session: &ApiSession<FileCredentialStore>, line: &str) -> Result<bool> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some(cmd) = parts.first() else { return Ok(true) };
    match *cmd {
        "quit" | "exit" => return Ok(false),
        "help" => print_usage("notedly_cli"),
        "status" => {
            println!("logged in: {}", session.is_logged_in());
        }
        "signup" => {
            if parts.len() != 4 {
                return Err(anyhow!("usage: signup <username> <email> <password>"));
            }
            session.sign_up(parts[1], parts[2], parts[3]).await?;
            println!("welcome, {}! you are signed in.", parts[1]);
        }
        "signin" => {
            if parts.len() != 3 {
                return Err(anyhow!("usage: signin <email> <password>"));
            }
            session.sign_in(parts[1], parts[2]).await?;
            println!("signed in.");
        }
        "signout" => {
            session.sign_out().await?;
            println!("signed out.");
        }
        "whoami" => {
            match session.execute(&ApiRequest::Me).await? {
                ApiResponse::User { user } => println!("@{} <{}> ({})", user.username, user.email, user.id),
                other => return Err(anyhow!("unexpected response: {:?}", other)),
            }
        }
        "feed" => {
            let limit = parts.get(1).and_then(|s| s.parse::<usize>().ok());
            match session.execute(&ApiRequest::Notes { limit }).await? {
                ApiResponse::Notes { notes } => print_notes(&notes),
                other => return Err(anyhow!("unexpected response: {:?}", other)),
            }
        }
        "mine" => {
            match session.execute(&ApiRequest::MyNotes).await? {
                ApiResponse::Notes { notes } => print_notes(&notes),
                other => return Err(anyhow!("unexpected response: {:?}", other)),
            }
        }
        "favorites" => {
            match session.execute(&ApiRequest::Favorites).await? {
                ApiResponse::Notes { notes } => print_notes(&notes),
                other => return Err(anyhow!("unexpected response: {:?}", other)),
            }
        }
        "show" => {
            let Some(id) = parts.get(1) else { return Err(anyhow!("usage: show <id>")) };
            match session.execute(&ApiRequest::Note { id: id.to_string() }).await? {
                ApiResponse::Note { note } => print_note(&note),
                other => return Err(anyhow!("unexpected response: {:?}", other)),
            }
        }
        "new" => {
            let content = parts[1..].join(" ");
            match session.execute(&ApiRequest::NewNote { content }).await? {
                ApiResponse::Note { note } => {
                    println!("created {}", note.id);
                }
                other => return Err(anyhow!("unexpected response: {:?}", other)),
            }
        }
        "edit" => {
            if parts.len() < 3 {
                return Err(anyhow!("usage: edit <id> <content...>"));
            }
            let id = parts[1].to_string();
            let content = parts[2..].join(" ");
            match session.execute(&ApiRequest::UpdateNote { id, content }).await? {
                ApiResponse::Note { note } => println!("updated {}", note.id),
                other => return Err(anyhow!("unexpected response: {:?}", other)),
            }
        }
        "delete" => {
            let Some(id) = parts.get(1) else { return Err(anyhow!("usage: delete <id>")) };
            match session.execute(&ApiRequest::DeleteNote { id: id.to_string() }).await? {
                ApiResponse::Deleted { id } => println!("deleted {}", id),
                other => return Err(anyhow!("unexpected response: {:?}", other)),
            }
        }
        "favorite" => {
            let Some(id) = parts.get(1) else { return Err(anyhow!("usage: favorite <id>")) };
            match session.execute(&ApiRequest::ToggleFavorite { id: id.to_string() }).await? {
                ApiResponse::Note { note } => println!("{} now has {} favorites", note.id, note.favorite_count),
                other => return Err(anyhow!("unexpected response: {:?}", other)),
            }
        }
        other => {
            eprintln!("unknown command '{}'; try 'help'", other);
        }
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut base: Option<String> = None;
    let mut credentials_dir: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--connect" => {
                if i + 1 >= args.len() { eprintln!("--connect requires a URL"); print_usage(&program); std::process::exit(2); }
                base = Some(args[i + 1].clone());
                i += 2;
            }
            "--credentials" => {
                if i + 1 >= args.len() { eprintln!("--credentials requires a folder"); print_usage(&program); std::process::exit(2); }
                credentials_dir = Some(args[i + 1].clone());
                i += 2;
            }
            "-h" | "--help" => {
                print_usage(&program);
                return Ok(());
            }
            other => {
                eprintln!("unknown flag '{}'", other);
                print_usage(&program);
                std::process::exit(2);
            }
        }
    }

    let base = base.unwrap_or_else(notedly::config::api_uri);
    let store = FileCredentialStore::new(credentials_dir.unwrap_or_else(default_credentials_dir));

    // Construct the client context once and pass it down; sign-in/out flows
    // mutate it explicitly from here on.
    let session = ApiSession::connect(&base, store).await?;

    // Startup gate: one-shot read of the credential store decides where we land.
    match initial_route(session.credential_store()).await? {
        Route::App => println!("notedly — signed in. try 'feed' or 'help'."),
        Route::Auth => println!("notedly — not signed in. try 'signin' or 'signup'."),
    }

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("notedly> ") {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() { continue; }
                let _ = rl.add_history_entry(&line);
                match run_command(&session, &line).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("readline error: {}", e);
                break;
            }
        }
    }
    Ok(())
}
