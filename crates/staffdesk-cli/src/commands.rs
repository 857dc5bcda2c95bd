use anyhow::{bail, Context, Result};
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use staffdesk_core::auth::{FileStore, KeyringStore, MemoryStore, AUTH_TOKEN_KEY};
use staffdesk_core::config::SECRET_KEY_ENV;
use staffdesk_core::{
    AuthState, Config, CredentialStore, Decision, MemoryHistory, Route, RouteGuard, SecretKey,
    SessionManager, StoreBackend, TokenCipher,
};
use tracing::warn;

/// Secret key length produced by `keygen`
const KEYGEN_BYTES: usize = 32;

fn open_store(config: &Config) -> Result<Box<dyn CredentialStore>> {
    Ok(match config.store {
        StoreBackend::Memory => Box::new(MemoryStore::new()),
        StoreBackend::File => Box::new(FileStore::in_dir(&config.data_dir()?)),
        StoreBackend::Keyring => Box::new(KeyringStore::new()),
    })
}

/// Store for commands that write credentials. The memory backend is
/// rejected: whatever it holds is gone when this process exits.
fn persistent_store(config: &Config) -> Result<Box<dyn CredentialStore>> {
    if config.store == StoreBackend::Memory {
        bail!(
            "the memory store only lasts for one command; use --store file or --store keyring to sign in or out"
        );
    }
    open_store(config)
}

/// Build the cipher from the environment. A missing key is not an error
/// here; the guard treats it as a decryption failure.
fn load_cipher() -> Option<TokenCipher> {
    let secret = SecretKey::from_env()?;
    match TokenCipher::new(&secret) {
        Ok(cipher) => Some(cipher),
        Err(e) => {
            warn!(error = %e, "Could not derive token key");
            None
        }
    }
}

fn guard(config: &Config) -> Result<RouteGuard<Box<dyn CredentialStore>>> {
    Ok(RouteGuard::new(open_store(config)?, load_cipher()))
}

pub fn login(config: &Config, token: Option<String>) -> Result<()> {
    let store = persistent_store(config)?;
    let token = match token {
        Some(token) => token,
        None => rpassword::prompt_password("Session token: ")
            .context("Failed to read session token")?,
    };

    let sessions = SessionManager::new(store, load_cipher());
    sessions.sign_in(&token).context("Sign-in failed")?;
    println!("Signed in ({} store)", config.store);
    Ok(())
}

pub fn logout(config: &Config) -> Result<()> {
    let sessions = SessionManager::new(persistent_store(config)?, None);
    sessions.sign_out().context("Sign-out failed")?;
    println!("Signed out");
    Ok(())
}

pub fn check(config: &Config, location: &str, json: bool) -> Result<()> {
    let decision = guard(config)?.evaluate(location);
    if json {
        println!("{}", serde_json::to_string(&decision)?);
    } else {
        println!("{} -> {}", location, describe(&decision));
    }
    Ok(())
}

pub fn visit(config: &Config, locations: &[String]) -> Result<()> {
    let guard = guard(config)?;
    let mut history = MemoryHistory::default();

    for location in locations {
        history.push(location);
        let decision = guard.guard(&mut history);
        println!("{} -> {}", location, describe(&decision));
    }

    println!();
    println!("History:");
    for (i, entry) in history.entries().iter().enumerate() {
        println!("  {:>2}. {}", i + 1, entry);
    }
    Ok(())
}

pub fn status(config: &Config) -> Result<()> {
    let guard = guard(config)?;
    let state = match guard.auth_state() {
        AuthState::Authenticated => "signed in",
        AuthState::Unauthenticated => "signed out",
    };
    let stored = guard.store().get(AUTH_TOKEN_KEY).is_some();

    println!("State:       {}", state);
    println!("Store:       {}", config.store);
    println!("Credential:  {}", if stored { "present" } else { "absent" });
    if config.store == StoreBackend::File {
        let files = FileStore::in_dir(&config.data_dir()?);
        println!("Written:     {}", files.age_display(AUTH_TOKEN_KEY));
        println!("File:        {}", files.path().display());
    }
    let key = if SecretKey::from_env().is_some() { "configured" } else { "missing" };
    println!("Secret key:  {} ({})", key, SECRET_KEY_ENV);
    Ok(())
}

pub fn routes() -> Result<()> {
    for route in Route::ALL {
        let access = if route.is_public() { "public" } else { "protected" };
        println!("{:<18} {:<10} {}", route.path(), access, route.title());
    }
    Ok(())
}

pub fn keygen() -> Result<()> {
    let mut key = [0u8; KEYGEN_BYTES];
    OsRng.fill_bytes(&mut key);
    println!(
        "{}={}",
        SECRET_KEY_ENV,
        base64::engine::general_purpose::STANDARD.encode(key)
    );
    Ok(())
}

fn describe(decision: &Decision) -> String {
    match decision {
        Decision::Render => "render".to_string(),
        Decision::Redirect { to, replace: true } => format!("redirect to {} (replace)", to),
        Decision::Redirect { to, replace: false } => format!("redirect to {}", to),
    }
}
