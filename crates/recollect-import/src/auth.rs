use serde_json::{json, Value};

use crate::config::AuthConfig;
use crate::error::ImportError;
use crate::transport::{AuthTransport, LOGIN_PATH, REGISTER_PATH, SITE_PASSWORD_PATH};

/// How the account step concluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Account {
    Registered,
    LoggedIn,
    /// No credentials configured.
    Anonymous,
}

/// Run the handshake steps that `auth` has credentials for.
///
/// Site password first, then the account: register when a progenitor key is
/// present, falling back to login when the account already exists. Any
/// refusal is an error and no data should be sent afterwards.
pub fn bootstrap<T: AuthTransport>(
    transport: &mut T,
    auth: &AuthConfig,
) -> Result<Account, ImportError> {
    if let Some(password) = &auth.site_password {
        verify_site_password(transport, password)?;
    }

    let (Some(email), Some(password)) = (&auth.email, &auth.password) else {
        return Ok(Account::Anonymous);
    };

    let account = match &auth.progenitor_key {
        Some(key) => register_or_login(transport, email, password, auth.name.as_deref(), key)?,
        None => {
            login(transport, email, password)?;
            Account::LoggedIn
        }
    };
    tracing::info!(email = %email, ?account, "authenticated");
    Ok(account)
}

fn verify_site_password<T: AuthTransport>(
    transport: &mut T,
    password: &str,
) -> Result<(), ImportError> {
    let reply = transport.post_auth(SITE_PASSWORD_PATH, &json!({ "password": password }))?;
    if !reply.is_ok() {
        return Err(reply.unexpected(SITE_PASSWORD_PATH));
    }
    let body: Value = reply.json(SITE_PASSWORD_PATH)?;
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(ImportError::Auth("site password rejected".to_string()));
    }
    tracing::info!("site password accepted");
    Ok(())
}

fn register_or_login<T: AuthTransport>(
    transport: &mut T,
    email: &str,
    password: &str,
    name: Option<&str>,
    progenitor_key: &str,
) -> Result<Account, ImportError> {
    let body = json!({
        "email": email,
        "password": password,
        "name": name.unwrap_or(email),
        "progenitorKey": progenitor_key,
    });
    let reply = transport.post_auth(REGISTER_PATH, &body)?;
    match reply.status {
        201 => Ok(Account::Registered),
        400 if already_exists(&reply.body) => {
            tracing::info!("account exists, logging in");
            login(transport, email, password)?;
            Ok(Account::LoggedIn)
        }
        _ => Err(reply.unexpected(REGISTER_PATH)),
    }
}

fn login<T: AuthTransport>(transport: &mut T, email: &str, password: &str) -> Result<(), ImportError> {
    let reply = transport.post_auth(LOGIN_PATH, &json!({ "email": email, "password": password }))?;
    if reply.is_ok() {
        Ok(())
    } else {
        Err(reply.unexpected(LOGIN_PATH))
    }
}

fn already_exists(body: &str) -> bool {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .is_some_and(|e| e.to_lowercase().contains("already exists"))
}
