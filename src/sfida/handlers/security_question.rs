use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info, instrument};

use super::types::SecurityQuestionRequest;
use crate::challenge::{SecurityQuestion, SecurityQuestionStore};

/// Store or replace the security question a principal answers first.
#[utoipa::path(
    put,
    path = "/v1/security-questions/{user_id}",
    params(("user_id" = String, Path, description = "Principal identity")),
    request_body = SecurityQuestionRequest,
    responses(
        (status = 204, description = "Security question stored"),
        (status = 400, description = "Missing question or answer"),
        (status = 500, description = "Store unavailable")
    ),
    tag = "challenge"
)]
#[instrument(skip(store, payload))]
pub async fn store_security_question(
    Path(user_id): Path<String>,
    store: Extension<Arc<dyn SecurityQuestionStore>>,
    payload: Option<Json<SecurityQuestionRequest>>,
) -> axum::response::Response {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing or malformed payload").into_response();
    };

    let user_id = user_id.trim();
    let question = request.question.trim();
    let answer = request.answer.trim();

    if user_id.is_empty() || question.is_empty() || answer.is_empty() {
        return (StatusCode::BAD_REQUEST, "Question and answer are required").into_response();
    }

    match store
        .put(user_id, SecurityQuestion::new(question, answer))
        .await
    {
        Ok(()) => {
            info!(user_id, "security question stored");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(err) => {
            error!("Failed to store security question: {err:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
