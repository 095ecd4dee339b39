use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    Res, config,
    management::TokenError,
    server::start_api_server,
    types::{PkceToken, Token},
    utils, warning,
};

/// Seconds the authorization flow waits for the browser callback.
const CALLBACK_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl TokenResponse {
    fn into_token(self) -> Token {
        Token {
            access_token: self.access_token,
            refresh_token: self.refresh_token.unwrap_or_default(),
            scope: self.scope.unwrap_or_default(),
            expires_in: self.expires_in.unwrap_or(3600),
            obtained_at: Utc::now().timestamp() as u64,
        }
    }
}

/// Runs the OAuth 2.0 PKCE authorization flow and returns the obtained token.
///
/// 1. Generates a code verifier and its S256 challenge
/// 2. Starts the local callback server
/// 3. Opens the authorization URL in the browser (or prints it)
/// 4. Waits up to 60 seconds for the callback to deliver a token
///
/// Persisting the token is left to the caller.
pub async fn authorize(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Res<Token> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);

    let auth_url = format!(
        "{spotify_auth_url}?client_id={client_id}&response_type=code&redirect_uri={redirect_uri}&code_challenge={code_challenge}&code_challenge_method=S256&scope={scope}",
        spotify_auth_url = &config::spotify_apiauth_url(),
        client_id = &config::spotify_client_id()?,
        redirect_uri = &config::spotify_redirect_uri()?,
        code_challenge = code_challenge,
        scope = &config::spotify_scope().replace(' ', "%20")
    );

    // Verifier must be in place before the browser can hit the callback.
    {
        let mut lock = shared_state.lock().await;
        *lock = Some(PkceToken {
            code_verifier,
            token: None,
        });
    }

    let server_state = Arc::clone(&shared_state);
    tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    match wait_for_token(shared_state).await {
        Some(token) => Ok(token),
        None => Err("Authentication failed or timed out.".into()),
    }
}

async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    let max_wait = Duration::from_secs(CALLBACK_TIMEOUT_SECS);
    let start = tokio::time::Instant::now();

    while start.elapsed() < max_wait {
        {
            let lock = shared_state.lock().await;
            if let Some(token) = lock.as_ref().and_then(|p| p.token.clone()) {
                return Some(token);
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

async fn request_token(token_url: &str, form: &[(&str, &str)]) -> Result<Token, TokenError> {
    let res = Client::new().post(token_url).form(form).send().await?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(TokenError::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    Ok(res.json::<TokenResponse>().await?.into_token())
}

/// Exchanges a refresh token for a new access token.
///
/// The returned token's `refresh_token` is empty when the endpoint did not
/// rotate it; [`crate::management::TokenManager::replace`] keeps the old one
/// in that case.
///
/// # Arguments
///
/// * `token_url` - Token endpoint of the accounts service
/// * `client_id` - Client id of the registered application
/// * `refresh_token` - Refresh token of the stored credential
///
/// # Errors
///
/// [`TokenError::Rejected`] when the endpoint answers with a non-2xx status,
/// for example after the user revoked access.
pub async fn refresh_token(
    token_url: &str,
    client_id: &str,
    refresh_token: &str,
) -> Result<Token, TokenError> {
    request_token(
        token_url,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
        ],
    )
    .await
}

/// Exchanges the authorization code received by the callback for a token.
///
/// # Errors
///
/// [`TokenError::Config`] when the client id or redirect URI is not set, and
/// [`TokenError::Rejected`] when the endpoint refuses the code.
pub async fn exchange_code_pkce(code: &str, verifier: &str) -> Result<Token, TokenError> {
    let client_id = config::spotify_client_id()?;
    let redirect_uri = config::spotify_redirect_uri()?;

    request_token(
        &config::spotify_apitoken_url(),
        &[
            ("grant_type", "authorization_code"),
            ("client_id", &client_id),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", &redirect_uri),
        ],
    )
    .await
}
