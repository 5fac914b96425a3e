//! Request/response types for the trigger and enrollment endpoints.
//!
//! `TriggerEvent` mirrors the identity provider's custom-challenge event. The
//! same value is echoed back with `response` filled in; the private
//! parameters and the user's answer are accepted but never serialized.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::challenge::{ChallengePayload, ChallengeRecord, DefineDecision, CUSTOM_CHALLENGE};

/// The three phases of the custom-challenge conversation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TriggerSource {
    Define,
    Create,
    Verify,
}

impl TriggerSource {
    /// Resolve the provider's trigger source, accepting the short phase names too.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "DefineAuthChallenge_Authentication" | "Define" => Some(Self::Define),
            "CreateAuthChallenge_Authentication" | "Create" => Some(Self::Create),
            "VerifyAuthChallengeResponse_Authentication" | "Verify" => Some(Self::Verify),
            _ => None,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerEvent {
    pub trigger_source: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_pool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub caller_context: Option<Value>,
    #[serde(default)]
    pub request: TriggerRequest,
    #[serde(default, skip_deserializing)]
    pub response: TriggerResponse,
}

#[derive(ToSchema, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    #[serde(default)]
    pub session: Vec<ChallengeRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub user_attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing)]
    pub private_challenge_parameters: BTreeMap<String, String>,
    #[serde(default, skip_serializing)]
    pub challenge_answer: Option<String>,
}

impl TriggerRequest {
    /// Address the login notification goes to: the email attribute when the
    /// provider sent one, otherwise the principal identity.
    #[must_use]
    pub fn contact<'a>(&'a self, user_name: &'a str) -> &'a str {
        self.user_attributes
            .get("email")
            .map(String::as_str)
            .filter(|email| !email.trim().is_empty())
            .unwrap_or(user_name)
    }
}

#[derive(ToSchema, Serialize)]
#[serde(untagged)]
pub enum TriggerResponse {
    Define(DefineResponse),
    Create(CreateResponse),
    Verify(VerifyResponse),
    Empty(EmptyResponse),
}

impl Default for TriggerResponse {
    fn default() -> Self {
        Self::Empty(EmptyResponse {})
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DefineResponse {
    pub issue_tokens: bool,
    pub fail_authentication: bool,
    pub challenge_name: String,
}

impl From<DefineDecision> for DefineResponse {
    fn from(decision: DefineDecision) -> Self {
        Self {
            issue_tokens: decision.issue_tokens,
            fail_authentication: decision.fail_authentication,
            challenge_name: CUSTOM_CHALLENGE.to_string(),
        }
    }
}

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    pub public_challenge_parameters: BTreeMap<String, String>,
    pub private_challenge_parameters: BTreeMap<String, String>,
    pub challenge_metadata: String,
}

impl From<ChallengePayload> for CreateResponse {
    fn from(payload: ChallengePayload) -> Self {
        Self {
            challenge_metadata: payload.metadata().to_string(),
            private_challenge_parameters: payload.private_parameters.to_wire(),
            public_challenge_parameters: payload.public_parameters,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub answer_correct: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct EmptyResponse {}

#[derive(ToSchema, Deserialize)]
pub struct SecurityQuestionRequest {
    pub question: String,
    pub answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};
    use serde_json::json;

    #[test]
    fn trigger_source_accepts_provider_and_short_names() {
        assert_eq!(
            TriggerSource::parse("DefineAuthChallenge_Authentication"),
            Some(TriggerSource::Define)
        );
        assert_eq!(
            TriggerSource::parse("CreateAuthChallenge_Authentication"),
            Some(TriggerSource::Create)
        );
        assert_eq!(
            TriggerSource::parse("VerifyAuthChallengeResponse_Authentication"),
            Some(TriggerSource::Verify)
        );
        assert_eq!(TriggerSource::parse("Verify"), Some(TriggerSource::Verify));
        assert_eq!(TriggerSource::parse("PreSignUp_SignUp"), None);
    }

    #[test]
    fn trigger_event_echo_omits_secrets() -> Result<()> {
        let event: TriggerEvent = serde_json::from_value(json!({
            "triggerSource": "VerifyAuthChallengeResponse_Authentication",
            "userName": "u1",
            "region": "ca-central-1",
            "request": {
                "privateChallengeParameters": {"answer": "Rex"},
                "challengeAnswer": "rex",
                "userAttributes": {"email": "rider@example.com"}
            },
            "response": {"answerCorrect": true}
        }))?;

        assert_eq!(event.request.challenge_answer.as_deref(), Some("rex"));
        assert_eq!(event.request.contact(&event.user_name), "rider@example.com");

        let echoed = serde_json::to_value(&event)?;
        let request = echoed.get("request").context("missing request")?;
        assert!(request.get("privateChallengeParameters").is_none());
        assert!(request.get("challengeAnswer").is_none());
        assert_eq!(echoed.get("response"), Some(&json!({})));
        assert_eq!(echoed.get("region"), Some(&json!("ca-central-1")));
        Ok(())
    }

    #[test]
    fn contact_falls_back_to_user_name() {
        let request = TriggerRequest::default();
        assert_eq!(request.contact("u1"), "u1");
    }

    #[test]
    fn define_response_always_names_custom_challenge() -> Result<()> {
        let value = serde_json::to_value(DefineResponse::from(DefineDecision::ISSUE_TOKENS))?;
        assert_eq!(
            value,
            json!({
                "issueTokens": true,
                "failAuthentication": false,
                "challengeName": "CUSTOM_CHALLENGE"
            })
        );
        Ok(())
    }
}
