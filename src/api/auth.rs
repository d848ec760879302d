use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::AppState;

/// Bearer-token authentication for the scheduler trigger.
///
/// Every request must carry `Authorization: Bearer <CRON_SECRET>`; anything
/// else is rejected with 401 before the handler runs.
pub async fn require_cron_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let expected = state.config.cron_secret.as_str();

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) if value.starts_with("Bearer ") => {
            let token = &value[7..];
            if !expected.is_empty() && token == expected {
                next.run(req).await
            } else {
                (StatusCode::UNAUTHORIZED, "Invalid token").into_response()
            }
        }
        _ => {
            (StatusCode::UNAUTHORIZED, "Missing or invalid Authorization header").into_response()
        }
    }
}
