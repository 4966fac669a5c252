//! Auth command handlers.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, bail};
use saucier_app::{RunOutcome, UiEvent};
use saucier_core::AuthSession;
use saucier_core::location::{self, History, MemoryHistory, WEB_AUTH_TOKEN_PARAM};
use saucier_core::session::{FileTokenStore, TokenStore, mask_token};

use super::{boot, load_settings};

/// Starts the redirect sign-in, then completes it from the URL the
/// identity provider sent the browser back to.
pub async fn login() -> Result<()> {
    let (config, settings) = load_settings()?;
    let mut runtime = boot(settings, &config.app.location)?;
    if runtime.state().authenticated {
        println!("Already signed in.");
        return Ok(());
    }

    runtime.dispatch(UiEvent::SignInRequested);
    match runtime.run_until_idle().await {
        RunOutcome::Navigated(url) => println!("Sign in at:\n{url}\n"),
        RunOutcome::Idle => {
            let reason = runtime
                .state()
                .sign_in_error
                .clone()
                .unwrap_or_else(|| "sign-in did not start".to_string());
            bail!("Sign-in failed: {reason}");
        }
    }
    drop(runtime);

    print!("Paste the URL you were redirected to: ");
    io::stdout().flush().context("flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read redirect URL")?;

    let history = MemoryHistory::parse(line.trim())?;
    if location::query_value(&history.location(), WEB_AUTH_TOKEN_PARAM).is_none() {
        bail!("The pasted URL has no {WEB_AUTH_TOKEN_PARAM} parameter");
    }

    let store = FileTokenStore::default_location();
    let path = store.path().to_path_buf();
    let session = AuthSession::bootstrap(store, &history)?;
    if !session.is_authenticated() {
        bail!("Sign-in did not produce a session");
    }
    println!("Signed in. Session saved to {}", path.display());
    Ok(())
}

pub fn logout() -> Result<()> {
    let store = FileTokenStore::default_location();
    let token = store.load()?;
    if token.is_none() {
        println!("Not signed in.");
        return Ok(());
    }

    let session = AuthSession::new(store, token);
    session.clear().context("clear session")?;
    println!("Signed out.");
    Ok(())
}

pub fn status() -> Result<()> {
    let store = FileTokenStore::default_location();
    match store.load()? {
        Some(token) => println!("Signed in (token {})", mask_token(&token)),
        None => println!("Not signed in."),
    }
    println!("Session file: {}", store.path().display());
    Ok(())
}
