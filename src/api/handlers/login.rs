use crate::gateway::{
    AccountGateway, ErrorResponse, LoginRequest, LoginResponse, types::MSG_LOGIN_SUCCESSFUL,
};
use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, instrument};

#[utoipa::path(
    post,
    path= "/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Login successful", body = LoginResponse, content_type = "application/json"),
        (status = 400, description = "Missing email", body = ErrorResponse),
        (status = 401, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Document store failure", body = ErrorResponse),
    ),
    tag= "accounts"
)]
// axum handler for login, the password is not verified
#[instrument(skip(gateway, payload))]
pub async fn login(
    gateway: Extension<Arc<AccountGateway>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Unreadable login payload: {}", rejection);
            LoginRequest::default()
        }
    };

    match gateway.authenticate(request).await {
        Ok(account) => (
            StatusCode::OK,
            Json(LoginResponse {
                message: MSG_LOGIN_SUCCESSFUL.to_string(),
                role: account.role,
            }),
        )
            .into_response(),
        Err(err) => {
            if err.is_server_error() {
                error!("Login error: {}", err);
            } else {
                debug!("Login rejected: {}", err);
            }
            err.into_response()
        }
    }
}
