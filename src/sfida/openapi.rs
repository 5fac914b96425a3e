use utoipa::OpenApi;

use super::handlers::{health, security_question, trigger, types};
use crate::challenge::ChallengeRecord;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        trigger::trigger,
        security_question::store_security_question
    ),
    components(schemas(
        health::Health,
        types::TriggerEvent,
        types::TriggerRequest,
        types::TriggerResponse,
        types::DefineResponse,
        types::CreateResponse,
        types::VerifyResponse,
        types::EmptyResponse,
        types::SecurityQuestionRequest,
        ChallengeRecord
    )),
    tags(
        (name = "challenge", description = "Custom authentication challenge triggers"),
        (name = "health", description = "Service and store health")
    )
)]
pub struct ApiDoc;
