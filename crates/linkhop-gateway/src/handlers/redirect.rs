use crate::error::{AppError, Result};
use crate::extract::Path;
use crate::state::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use linkhop_core::ShortCode;
use linkhop_redirector::Resolution;

/// Sends visitors of a short link on to its target with `302 Found`.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Response> {
    // A malformed code can never have been stored.
    let code = ShortCode::new(code).map_err(|_| AppError::NotFound)?;

    match state.redirector().resolve(&code).await? {
        Resolution::Redirect(target) => Ok((
            StatusCode::FOUND,
            [
                (header::LOCATION, target.url.as_str()),
                (header::CACHE_CONTROL, "no-store"),
            ],
        )
            .into_response()),
        Resolution::NotFound => Err(AppError::NotFound),
    }
}
