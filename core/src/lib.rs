//! Async API client for the GameHub game backend.
//!
//! # Overview
//! Covers authentication, score submission, leaderboards and checkpoint
//! persistence. Two layers:
//! - `GameHubClient` builds `HttpRequest` values from (config, session) and
//!   parses `HttpResponse` values, without touching the network.
//! - `GameHubApi` drives a `Transport`, keeps the `Session` and its durable
//!   `TokenStore` in step on sign-in and sign-out, and verifies a stored
//!   token on `restore_session`.
//!
//! # Design
//! - Every operation returns `Result<T, ApiError>`; a failed call never
//!   panics and never leaves the client unusable.
//! - No retries, timeouts or cancellation. Wrap a call externally if one is
//!   needed.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod transport;
pub mod types;

pub use api::{GameHubApi, RestoredSession};
pub use client::GameHubClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore, TOKEN_KEY};
#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;
pub use transport::Transport;
pub use types::{
    AuthResponse, Checkpoint, CheckpointId, CheckpointListResponse, CheckpointResponse, DeleteResponse, LeaderboardEntry,
    LeaderboardResponse, RankResponse, SaveCheckpoint, ScoreResponse, ScoreUpdate, SignIn, SignUp, User, UserId,
};
