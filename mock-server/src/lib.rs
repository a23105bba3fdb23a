use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
}

#[derive(Clone, Debug)]
struct Account {
    user: User,
    password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub id: String,
    pub game_type: String,
    pub checkpoint_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_state: Option<Value>,
    #[serde(skip)]
    pub sequence: u64,
}

#[derive(Clone, Debug)]
struct StoredCheckpoint {
    owner: u64,
    checkpoint: Checkpoint,
}

#[derive(Deserialize)]
pub struct SignUp {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignIn {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdate {
    pub game_type: String,
    pub score: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCheckpoint {
    pub game_type: String,
    pub game_state: Value,
    pub checkpoint_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadQuery {
    pub checkpoint_id: Option<String>,
}

#[derive(Default)]
pub struct Backend {
    accounts: Vec<Account>,
    sessions: HashMap<String, u64>,
    scores: HashMap<(u64, String), i64>,
    checkpoints: Vec<StoredCheckpoint>,
    // Monotonic counter shared by user ids and checkpoint timestamps.
    clock: u64,
}

impl Backend {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn user(&self, id: u64) -> Option<&User> {
        self.accounts.iter().map(|a| &a.user).find(|u| u.id == id)
    }
}

pub type Db = Arc<RwLock<Backend>>;

type Reply = (StatusCode, Json<Value>);

fn failure(status: StatusCode, error: &str) -> Reply {
    (status, Json(json!({ "success": false, "error": error })))
}

fn ok(body: Value) -> Reply {
    (StatusCode::OK, Json(body))
}

/// Resolve the bearer token in `headers` to a user id.
fn authenticate(backend: &Backend, headers: &HeaderMap) -> Result<u64, Reply> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| backend.sessions.get(token).copied())
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Backend::default()));
    let api = Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/signout", post(sign_out))
        .route("/auth/verify", get(verify))
        .route("/score/update", post(update_score))
        .route("/score/rank/{game_type}", get(user_rank))
        .route("/leaderboard/{game_type}", get(leaderboard))
        .route("/checkpoint/save", post(save_checkpoint))
        .route("/checkpoint/load/{game_type}", get(load_checkpoint))
        .route("/checkpoint/list/{game_type}", get(list_checkpoints))
        .route("/checkpoint/{checkpoint_id}", delete(delete_checkpoint))
        .with_state(db);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- auth ---

async fn sign_up(State(db): State<Db>, Json(input): Json<SignUp>) -> Reply {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Email and password are required");
    }
    let mut backend = db.write().await;
    if backend.accounts.iter().any(|a| a.user.email == input.email) {
        return failure(StatusCode::CONFLICT, "Email already registered");
    }
    let user = User {
        id: backend.tick(),
        username: input.username,
        email: input.email,
    };
    backend.accounts.push(Account {
        user: user.clone(),
        password: input.password,
    });
    tracing::info!(user_id = user.id, "account created");
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "message": "Account created", "user": user })),
    )
}

async fn sign_in(State(db): State<Db>, Json(input): Json<SignIn>) -> Reply {
    let mut backend = db.write().await;
    let Some(user) = backend
        .accounts
        .iter()
        .find(|a| a.user.email == input.email && a.password == input.password)
        .map(|a| a.user.clone())
    else {
        return failure(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };
    let token = Uuid::new_v4().to_string();
    backend.sessions.insert(token.clone(), user.id);
    tracing::info!(user_id = user.id, "session opened");
    ok(json!({ "success": true, "sessionToken": token, "user": user }))
}

async fn sign_out(State(db): State<Db>, headers: HeaderMap) -> Result<Reply, Reply> {
    let mut backend = db.write().await;
    let user_id = authenticate(&backend, &headers)?;
    backend.sessions.retain(|_, owner| *owner != user_id);
    Ok(ok(json!({ "success": true, "message": "Signed out" })))
}

async fn verify(State(db): State<Db>, headers: HeaderMap) -> Result<Reply, Reply> {
    let backend = db.read().await;
    let user_id = authenticate(&backend, &headers)?;
    let user = backend
        .user(user_id)
        .ok_or_else(|| failure(StatusCode::UNAUTHORIZED, "Unauthorized"))?;
    Ok(ok(json!({ "success": true, "user": user })))
}

// --- scores ---

async fn update_score(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ScoreUpdate>,
) -> Result<Reply, Reply> {
    let mut backend = db.write().await;
    let user_id = authenticate(&backend, &headers)?;
    let best = backend
        .scores
        .entry((user_id, input.game_type))
        .or_insert(input.score);
    *best = (*best).max(input.score);
    let high_score = *best;
    Ok(ok(json!({ "success": true, "score": input.score, "highScore": high_score })))
}

/// (user id, best score) pairs for `game_type`, best first.
fn ranking(backend: &Backend, game_type: &str) -> Vec<(u64, i64)> {
    let mut rows: Vec<(u64, i64)> = backend
        .scores
        .iter()
        .filter(|((_, game), _)| game == game_type)
        .map(|((user_id, _), score)| (*user_id, *score))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    rows
}

async fn leaderboard(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(game_type): Path<String>,
) -> Result<Reply, Reply> {
    let backend = db.read().await;
    authenticate(&backend, &headers)?;
    let rows: Vec<Value> = ranking(&backend, &game_type)
        .into_iter()
        .enumerate()
        .map(|(i, (user_id, score))| {
            let username = backend.user(user_id).map(|u| u.username.clone());
            json!({ "rank": i + 1, "username": username, "score": score })
        })
        .collect();
    Ok(ok(json!({ "success": true, "gameType": game_type, "leaderboard": rows })))
}

async fn user_rank(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(game_type): Path<String>,
) -> Result<Reply, Reply> {
    let backend = db.read().await;
    let user_id = authenticate(&backend, &headers)?;
    let rows = ranking(&backend, &game_type);
    let (index, (_, score)) = rows
        .iter()
        .enumerate()
        .find(|(_, (id, _))| *id == user_id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "No score recorded"))?;
    Ok(ok(json!({
        "success": true,
        "rank": index + 1,
        "score": score,
        "totalPlayers": rows.len(),
    })))
}

// --- checkpoints ---

/// Saving under an existing (game type, name) pair overwrites that checkpoint
/// and keeps its id.
async fn save_checkpoint(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<SaveCheckpoint>,
) -> Result<Reply, Reply> {
    let mut backend = db.write().await;
    let user_id = authenticate(&backend, &headers)?;
    let sequence = backend.tick();
    let name = input
        .checkpoint_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "Autosave".to_string());

    let existing = backend.checkpoints.iter().position(|c| {
        c.owner == user_id && c.checkpoint.game_type == input.game_type && c.checkpoint.checkpoint_name == name
    });
    let checkpoint = match existing {
        Some(index) => {
            let stored = &mut backend.checkpoints[index].checkpoint;
            stored.game_state = Some(input.game_state);
            stored.sequence = sequence;
            stored.clone()
        }
        None => {
            let checkpoint = Checkpoint {
                id: Uuid::new_v4().to_string(),
                game_type: input.game_type,
                checkpoint_name: name,
                game_state: Some(input.game_state),
                sequence,
            };
            backend.checkpoints.push(StoredCheckpoint {
                owner: user_id,
                checkpoint: checkpoint.clone(),
            });
            checkpoint
        }
    };
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "checkpointId": checkpoint.id, "checkpoint": checkpoint })),
    ))
}

async fn load_checkpoint(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(game_type): Path<String>,
    Query(query): Query<LoadQuery>,
) -> Result<Reply, Reply> {
    let backend = db.read().await;
    let user_id = authenticate(&backend, &headers)?;
    let owned = backend
        .checkpoints
        .iter()
        .filter(|c| c.owner == user_id && c.checkpoint.game_type == game_type);
    let found = match query.checkpoint_id {
        Some(id) => owned.into_iter().find(|c| c.checkpoint.id == id),
        None => owned.max_by_key(|c| c.checkpoint.sequence),
    };
    let stored = found.ok_or_else(|| failure(StatusCode::NOT_FOUND, "Checkpoint not found"))?;
    Ok(ok(json!({ "success": true, "checkpoint": stored.checkpoint })))
}

async fn list_checkpoints(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(game_type): Path<String>,
) -> Result<Reply, Reply> {
    let backend = db.read().await;
    let user_id = authenticate(&backend, &headers)?;
    let mut checkpoints: Vec<Checkpoint> = backend
        .checkpoints
        .iter()
        .filter(|c| c.owner == user_id && c.checkpoint.game_type == game_type)
        .map(|c| Checkpoint {
            game_state: None,
            ..c.checkpoint.clone()
        })
        .collect();
    checkpoints.sort_by(|a, b| b.sequence.cmp(&a.sequence));
    Ok(ok(json!({ "success": true, "checkpoints": checkpoints })))
}

async fn delete_checkpoint(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(checkpoint_id): Path<String>,
) -> Result<Reply, Reply> {
    let mut backend = db.write().await;
    let user_id = authenticate(&backend, &headers)?;
    let before = backend.checkpoints.len();
    backend
        .checkpoints
        .retain(|c| !(c.owner == user_id && c.checkpoint.id == checkpoint_id));
    if backend.checkpoints.len() == before {
        return Err(failure(StatusCode::NOT_FOUND, "Checkpoint not found"));
    }
    Ok(ok(json!({ "success": true, "message": "Checkpoint deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_serializes_camel_case() {
        let checkpoint = Checkpoint {
            id: "c1".to_string(),
            game_type: "snake".to_string(),
            checkpoint_name: "Level 2".to_string(),
            game_state: None,
            sequence: 3,
        };
        let json = serde_json::to_value(&checkpoint).unwrap();
        assert_eq!(json["gameType"], "snake");
        assert_eq!(json["checkpointName"], "Level 2");
        assert!(json.get("gameState").is_none());
        assert!(json.get("sequence").is_none());
    }

    #[test]
    fn save_checkpoint_name_is_optional() {
        let input: SaveCheckpoint =
            serde_json::from_str(r#"{"gameType":"snake","gameState":{"len":4}}"#).unwrap();
        assert!(input.checkpoint_name.is_none());
        assert_eq!(input.game_state["len"], 4);
    }

    #[test]
    fn score_update_rejects_missing_score() {
        let result: Result<ScoreUpdate, _> = serde_json::from_str(r#"{"gameType":"snake"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn ranking_orders_best_first() {
        let mut backend = Backend::default();
        backend.scores.insert((1, "snake".to_string()), 10);
        backend.scores.insert((2, "snake".to_string()), 30);
        backend.scores.insert((3, "tetris".to_string()), 99);
        assert_eq!(ranking(&backend, "snake"), vec![(2, 30), (1, 10)]);
    }

    #[test]
    fn missing_bearer_is_unauthorized() {
        let backend = Backend::default();
        let (status, _) = authenticate(&backend, &HeaderMap::new()).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
