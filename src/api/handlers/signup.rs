use crate::gateway::{
    AccountGateway, ErrorResponse, SignupRequest, SignupResponse, types::MSG_USER_CREATED,
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
    path= "/signup",
    request_body = SignupRequest,
    responses (
        (status = 201, description = "Account created", body = SignupResponse, content_type = "application/json"),
        (status = 400, description = "Invalid input data or user already exists", body = ErrorResponse),
        (status = 500, description = "Identity provider or document store failure", body = ErrorResponse),
    ),
    tag= "accounts"
)]
// axum handler for signup
#[instrument(skip(gateway, payload))]
pub async fn signup(
    gateway: Extension<Arc<AccountGateway>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Response {
    // unreadable bodies fall through to the presence checks
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Unreadable signup payload: {}", rejection);
            SignupRequest::default()
        }
    };

    match gateway.create_account(request).await {
        Ok(created) => (
            StatusCode::CREATED,
            Json(SignupResponse {
                message: MSG_USER_CREATED.to_string(),
                uid: created.uid,
            }),
        )
            .into_response(),
        Err(err) => {
            if err.is_server_error() {
                error!("Signup error: {}", err);
            } else {
                debug!("Signup rejected: {}", err);
            }
            err.into_response()
        }
    }
}
