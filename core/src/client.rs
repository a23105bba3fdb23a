//! Stateless HTTP request builder and response parser for the GameHub API.
//!
//! # Design
//! `GameHubClient` holds only a `base_url`. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` from its arguments and the
//! caller's `Session`, and a `parse_*` method that turns an `HttpResponse`
//! into a typed payload or an `ApiError`. No I/O happens here; see
//! `GameHubApi` for the driver that sends requests and tracks the session.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ApiError, GENERIC_FAILURE};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, APPLICATION_JSON, AUTHORIZATION, CONTENT_TYPE};
use crate::session::Session;
use crate::types::{
    AuthResponse, CheckpointListResponse, CheckpointResponse, DeleteResponse, LeaderboardResponse, RankResponse,
    SaveCheckpoint, ScoreResponse, ScoreUpdate, SignIn, SignUp,
};

/// Request builder and response parser for the GameHub backend.
#[derive(Debug, Clone)]
pub struct GameHubClient {
    base_url: String,
}

impl GameHubClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub fn build_sign_up(&self, input: &SignUp) -> Result<HttpRequest, ApiError> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.url("/auth/signup"),
            headers: json_headers(),
            body: Some(to_json(input)?),
        })
    }

    pub fn build_sign_in(&self, email: &str, password: &str) -> Result<HttpRequest, ApiError> {
        let input = SignIn {
            email: email.to_string(),
            password: password.to_string(),
        };
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: self.url("/auth/signin"),
            headers: json_headers(),
            body: Some(to_json(&input)?),
        })
    }

    pub fn build_sign_out(&self, session: &Session) -> HttpRequest {
        self.authed(HttpMethod::Post, "/auth/signout", session)
    }

    /// Fails with `NotAuthenticated` when the session holds no token, since
    /// there is nothing to verify.
    pub fn build_verify_auth(&self, session: &Session) -> Result<HttpRequest, ApiError> {
        if !session.is_authenticated() {
            return Err(ApiError::NotAuthenticated);
        }
        Ok(self.authed(HttpMethod::Get, "/auth/verify", session))
    }

    pub fn parse_sign_up(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_sign_in(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_sign_out(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_verify_auth(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        parse_envelope(response)
    }

    // -----------------------------------------------------------------------
    // Scores
    // -----------------------------------------------------------------------

    pub fn build_update_score(&self, session: &Session, game_type: &str, score: i64) -> Result<HttpRequest, ApiError> {
        let input = ScoreUpdate {
            game_type: game_type.to_string(),
            score,
        };
        let mut req = self.authed(HttpMethod::Post, "/score/update", session);
        req.body = Some(to_json(&input)?);
        Ok(req)
    }

    pub fn build_get_leaderboard(&self, session: &Session, game_type: &str) -> HttpRequest {
        self.authed(HttpMethod::Get, &format!("/leaderboard/{game_type}"), session)
    }

    pub fn build_get_user_rank(&self, session: &Session, game_type: &str) -> HttpRequest {
        self.authed(HttpMethod::Get, &format!("/score/rank/{game_type}"), session)
    }

    pub fn parse_update_score(&self, response: HttpResponse) -> Result<ScoreResponse, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_get_leaderboard(&self, response: HttpResponse) -> Result<LeaderboardResponse, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_get_user_rank(&self, response: HttpResponse) -> Result<RankResponse, ApiError> {
        parse_envelope(response)
    }

    // -----------------------------------------------------------------------
    // Checkpoints
    // -----------------------------------------------------------------------

    pub fn build_save_checkpoint(&self, session: &Session, input: &SaveCheckpoint) -> Result<HttpRequest, ApiError> {
        let mut req = self.authed(HttpMethod::Post, "/checkpoint/save", session);
        req.body = Some(to_json(input)?);
        Ok(req)
    }

    /// Without `checkpoint_id` the backend picks the checkpoint; the query
    /// parameter is omitted entirely rather than sent empty.
    pub fn build_load_checkpoint(
        &self,
        session: &Session,
        game_type: &str,
        checkpoint_id: Option<&str>,
    ) -> HttpRequest {
        let path = match checkpoint_id.filter(|id| !id.is_empty()) {
            Some(id) => format!("/checkpoint/load/{game_type}?checkpointId={id}"),
            None => format!("/checkpoint/load/{game_type}"),
        };
        self.authed(HttpMethod::Get, &path, session)
    }

    pub fn build_list_checkpoints(&self, session: &Session, game_type: &str) -> HttpRequest {
        self.authed(HttpMethod::Get, &format!("/checkpoint/list/{game_type}"), session)
    }

    pub fn build_delete_checkpoint(&self, session: &Session, checkpoint_id: &str) -> HttpRequest {
        self.authed(HttpMethod::Delete, &format!("/checkpoint/{checkpoint_id}"), session)
    }

    pub fn parse_save_checkpoint(&self, response: HttpResponse) -> Result<CheckpointResponse, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_load_checkpoint(&self, response: HttpResponse) -> Result<CheckpointResponse, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_list_checkpoints(&self, response: HttpResponse) -> Result<CheckpointListResponse, ApiError> {
        parse_envelope(response)
    }

    pub fn parse_delete_checkpoint(&self, response: HttpResponse) -> Result<DeleteResponse, ApiError> {
        parse_envelope(response)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authed(&self, method: HttpMethod, path: &str, session: &Session) -> HttpRequest {
        let mut headers = json_headers();
        headers.push((AUTHORIZATION.to_string(), session.authorization()));
        HttpRequest {
            method,
            path: self.url(path),
            headers,
            body: None,
        }
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string())]
}

fn to_json<T: Serialize>(input: &T) -> Result<String, ApiError> {
    serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))
}

/// The backend's `error` field, or the generic fallback.
fn error_message(body: &Value) -> String {
    body.get("error")
        .and_then(Value::as_str)
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or(GENERIC_FAILURE)
        .to_string()
}

/// Decode a response into `T`, mapping non-2xx statuses and
/// `"success": false` bodies to `RequestFailed`.
fn parse_envelope<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    let body: Value = if response.body.trim().is_empty() {
        Value::Object(Default::default())
    } else {
        match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(_) if !response.is_success() => {
                return Err(ApiError::RequestFailed {
                    status: response.status,
                    message: GENERIC_FAILURE.to_string(),
                })
            }
            Err(e) => return Err(ApiError::Deserialization(e.to_string())),
        }
    };

    let rejected = body.get("success").and_then(Value::as_bool) == Some(false);
    if !response.is_success() || rejected {
        return Err(ApiError::RequestFailed {
            status: response.status,
            message: error_message(&body),
        });
    }

    serde_json::from_value(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
