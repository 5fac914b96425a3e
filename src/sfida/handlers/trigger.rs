use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::{error, info_span, warn, Instrument};

use super::types::{
    CreateResponse, DefineResponse, TriggerEvent, TriggerResponse, TriggerSource, VerifyResponse,
};
use crate::challenge::{DefineDecision, Orchestrator};

/// Answer one Define, Create or Verify call of the custom-challenge conversation.
#[utoipa::path(
    post,
    path = "/v1/triggers",
    request_body = TriggerEvent,
    responses(
        (status = 200, description = "Event echoed back with the response filled in", body = TriggerEvent),
        (status = 400, description = "Missing or malformed event"),
        (status = 500, description = "No challenge could be issued; the attempt is aborted")
    ),
    tag = "challenge"
)]
pub async fn trigger(
    orchestrator: Extension<Arc<Orchestrator>>,
    payload: Option<Json<TriggerEvent>>,
) -> axum::response::Response {
    let Some(Json(mut event)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing or malformed event").into_response();
    };

    let span = info_span!(
        "challenge.trigger",
        trigger_source = %event.trigger_source,
        user_id = %event.user_name
    );

    let response = match answer(&orchestrator, &event).instrument(span).await {
        Ok(response) => response,
        Err(status) => return (status, "Challenge could not be issued").into_response(),
    };

    event.response = response;

    (StatusCode::OK, Json(event)).into_response()
}

async fn answer(
    orchestrator: &Orchestrator,
    event: &TriggerEvent,
) -> Result<TriggerResponse, StatusCode> {
    let request = &event.request;
    let user_id = event.user_name.as_str();

    let Some(source) = TriggerSource::parse(&event.trigger_source) else {
        warn!("Unexpected trigger source");
        let decision = DefineDecision::FAIL;
        return Ok(TriggerResponse::Define(DefineResponse::from(decision)));
    };

    match source {
        TriggerSource::Define => {
            let contact = request.contact(user_id);
            let decision = orchestrator.define(user_id, contact, &request.session);
            Ok(TriggerResponse::Define(DefineResponse::from(decision)))
        }
        TriggerSource::Create => match orchestrator.create(user_id, &request.session).await {
            Ok(Some(payload)) => Ok(TriggerResponse::Create(CreateResponse::from(payload))),
            Ok(None) => Ok(TriggerResponse::default()),
            Err(err) if err.is_fatal() => {
                error!("Failed to create challenge: {err}");
                Err(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Err(err) => {
                warn!("Challenge not issued: {err}");
                Ok(TriggerResponse::default())
            }
        },
        TriggerSource::Verify => {
            let answer = request.challenge_answer.as_deref().unwrap_or_default();
            let answer_correct =
                orchestrator.verify_wire(&request.private_challenge_parameters, answer);
            Ok(TriggerResponse::Verify(VerifyResponse { answer_correct }))
        }
    }
}
