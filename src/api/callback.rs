use std::{collections::HashMap, future::Future, sync::Arc};

use axum::{Extension, extract::Query, http::StatusCode, response::Html};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
    management::TokenError,
    spotify::auth::exchange_code_pkce,
    types::{PkceToken, Token},
    warning,
};

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("missing PKCE code verifier")]
    MissingVerifier,
    #[error(transparent)]
    Exchange(#[from] TokenError),
}

/// Completes the PKCE flow: exchanges the `code` query parameter for a token
/// and stores it in the shared state, where the waiting CLI picks it up.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<Option<PkceToken>>>>,
) -> (StatusCode, Html<String>) {
    if let Some(error) = params.get("error") {
        warning!("Authorization was denied: {}", error);
        return (
            StatusCode::BAD_REQUEST,
            Html(format!("<h4>Authorization failed: {}</h4>", error)),
        );
    }

    let Some(code) = params.get("code") else {
        return (
            StatusCode::BAD_REQUEST,
            Html("<h4>No authorization code found.</h4>".to_string()),
        );
    };

    let exchanged = complete_exchange(&shared_state, |verifier| async move {
        exchange_code_pkce(code, &verifier).await
    })
    .await;

    match exchanged {
        Ok(()) => (
            StatusCode::OK,
            Html("<h2>Authorization successful.</h2><p>You can close this window.</p>".to_string()),
        ),
        Err(CallbackError::MissingVerifier) => (
            StatusCode::BAD_REQUEST,
            Html("<h4>Missing PKCE code verifier.</h4>".to_string()),
        ),
        Err(e) => {
            warning!("Token exchange failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h4>Failed to authorize with Spotify.</h4>".to_string()),
            )
        }
    }
}

/// Runs the code exchange for the verifier stored in `shared_state` and
/// stores the resulting token next to it.
///
/// The state lock is only held to read the verifier and to store the token,
/// never across `exchange`, so `/health` and the CLI's polling stay
/// responsive while the token endpoint is queried.
///
/// # Arguments
///
/// * `shared_state` - State shared with the waiting `auth` command
/// * `exchange` - Turns the code verifier into a token
///
/// # Errors
///
/// * [`CallbackError::MissingVerifier`] when no authorization flow is running
/// * [`CallbackError::Exchange`] when the token endpoint rejects the code
pub async fn complete_exchange<F, Fut>(
    shared_state: &Mutex<Option<PkceToken>>,
    exchange: F,
) -> Result<(), CallbackError>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<Token, TokenError>>,
{
    let verifier = shared_state
        .lock()
        .await
        .as_ref()
        .map(|p| p.code_verifier.clone())
        .ok_or(CallbackError::MissingVerifier)?;

    let token = exchange(verifier).await?;

    let mut state = shared_state.lock().await;
    let pkce_state = state.as_mut().ok_or(CallbackError::MissingVerifier)?;
    pkce_state.token = Some(token);
    Ok(())
}
