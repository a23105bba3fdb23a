//! Request and response DTOs for the GameHub API.
//!
//! # Design
//! These types mirror the backend's camelCase JSON schema but are defined
//! independently of the mock-server crate; integration tests catch drift.
//! Response types keep every unrecognised field in `extra`, so a payload can
//! be handed back to the caller exactly as the backend sent it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Registration fields for `POST /auth/signup`. Any additional profile fields
/// the backend accepts go in `extra` and are sent alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUp {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SignUp {
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            extra: Map::new(),
        }
    }
}

/// Credentials for `POST /auth/signin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

/// Payload for `POST /score/update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdate {
    pub game_type: String,
    pub score: i64,
}

/// Payload for `POST /checkpoint/save`. `game_state` is opaque to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCheckpoint {
    pub game_type: String,
    pub game_state: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A user id as issued by the backend, which may be numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{n}"),
            UserId::Text(s) => f.write_str(s),
        }
    }
}

/// A checkpoint id as issued by the backend. Numbers keep their exact JSON
/// representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckpointId {
    Number(Number),
    Text(String),
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointId::Number(n) => write!(f, "{n}"),
            CheckpointId::Text(s) => f.write_str(s),
        }
    }
}

/// Identity of a signed-in user.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response to sign-up, sign-in, sign-out and verify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response to `POST /score/update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_score: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response to `GET /leaderboard/{gameType}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response to `GET /score/rank/{gameType}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Number>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A server-persisted snapshot of game state. Fields the backend adds, such
/// as a separate `checkpointId`, stay in `extra` under their own names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CheckpointId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_state: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response to save and load checkpoint calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_id: Option<CheckpointId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Checkpoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response to `GET /checkpoint/list/{gameType}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointListResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response to `DELETE /checkpoint/{checkpointId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_checkpoint_omits_missing_name() {
        let input = SaveCheckpoint {
            game_type: "snake".to_string(),
            game_state: json!({"level": 3}),
            checkpoint_name: None,
        };
        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(body, json!({"gameType": "snake", "gameState": {"level": 3}}));
    }

    #[test]
    fn sign_up_flattens_extra_fields() {
        let mut input = SignUp::new("ada", "ada@example.com", "pw");
        input.extra.insert("displayName".to_string(), json!("Ada"));
        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(body["displayName"], "Ada");
        assert_eq!(body["username"], "ada");
    }

    #[test]
    fn auth_response_preserves_unknown_fields() {
        let raw = json!({
            "success": true,
            "sessionToken": "tok123",
            "user": {"id": 7, "username": "ada", "avatar": "a.png"},
            "expiresIn": 3600
        });
        let parsed: AuthResponse = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(parsed.session_token.as_deref(), Some("tok123"));
        let user = parsed.user.as_ref().unwrap();
        assert_eq!(user.id, Some(UserId::Number(7)));
        assert_eq!(user.extra["avatar"], "a.png");
        assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
    }

    #[test]
    fn user_id_accepts_text() {
        let user: User = serde_json::from_str(r#"{"id":"u-1"}"#).unwrap();
        assert_eq!(user.id.unwrap().to_string(), "u-1");
    }

    #[test]
    fn missing_success_stays_absent() {
        let raw = json!({"leaderboard": []});
        let parsed: LeaderboardResponse = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(parsed.success, None);
        assert!(parsed.leaderboard.is_empty());
        assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
    }

    #[test]
    fn checkpoint_id_accepts_number_or_text() {
        let saved: CheckpointResponse = serde_json::from_str(r#"{"success":true,"checkpointId":42}"#).unwrap();
        assert_eq!(saved.checkpoint_id, Some(CheckpointId::Number(Number::from(42_u64))));
        assert_eq!(saved.checkpoint_id.unwrap().to_string(), "42");

        let cp: Checkpoint = serde_json::from_str(r#"{"id":"c1"}"#).unwrap();
        assert_eq!(cp.id, Some(CheckpointId::Text("c1".to_string())));
    }

    #[test]
    fn checkpoint_keeps_both_id_keys() {
        let raw = json!({"id": "c1", "checkpointId": "c1", "gameType": "snake"});
        let cp: Checkpoint = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(cp.id.as_ref().map(ToString::to_string).as_deref(), Some("c1"));
        assert_eq!(cp.extra["checkpointId"], "c1");
        assert_eq!(serde_json::to_value(&cp).unwrap(), raw);
    }

    #[test]
    fn checkpoint_id_only_is_not_renamed() {
        let raw = json!({"checkpointId": "c1"});
        let cp: Checkpoint = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(cp.id, None);
        assert_eq!(serde_json::to_value(&cp).unwrap(), raw);
    }

    #[test]
    fn created_at_is_opaque() {
        let raw = json!({"success": true, "checkpoints": [
            {"id": 7, "createdAt": 1700000000000_u64},
            {"id": "c2", "createdAt": "2024-01-01T00:00:00Z"}
        ]});
        let parsed: CheckpointListResponse = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(parsed.checkpoints[0].created_at, Some(json!(1700000000000_u64)));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);
    }

    #[test]
    fn fractional_scores_survive() {
        let raw = json!({"success": true, "leaderboard": [{"rank": 1, "username": "ada", "score": 12.5}]});
        let parsed: LeaderboardResponse = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(parsed.leaderboard[0].score.as_ref().and_then(Number::as_f64), Some(12.5));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), raw);

        let score: ScoreResponse = serde_json::from_str(r#"{"score":1.5,"highScore":9.25}"#).unwrap();
        assert_eq!(score.high_score.and_then(|n| n.as_f64()), Some(9.25));
    }
}
