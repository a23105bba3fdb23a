//! Session-aware driver over `GameHubClient`.
//!
//! # Design
//! `GameHubApi` owns the `Session`, the durable `TokenStore` and a
//! `Transport`. Each method builds one request from the current session,
//! sends it, and parses the response; any failure on the way comes back as
//! `Err(ApiError)` and leaves the driver usable. Only sign-in, sign-out and
//! `restore_session` touch the session, and they take `&mut self`; every
//! other call takes `&self`, so independent requests can run concurrently.

use serde_json::Value;

use crate::client::GameHubClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::{Session, TokenStore};
use crate::transport::Transport;
use crate::types::{
    AuthResponse, CheckpointListResponse, CheckpointResponse, DeleteResponse, LeaderboardResponse, RankResponse,
    SaveCheckpoint, ScoreResponse, SignUp, User,
};

type Parser<R> = fn(&GameHubClient, HttpResponse) -> Result<R, ApiError>;

/// Outcome of [`GameHubApi::restore_session`].
#[derive(Debug, Clone, PartialEq)]
pub enum RestoredSession {
    /// No token was stored; no request was made.
    Anonymous,
    /// The stored token verified. Holds the user it belongs to when the
    /// backend reported one.
    Authenticated(Option<User>),
    /// The stored token failed verification and was cleared.
    Cleared(ApiError),
}

/// GameHub client bound to a transport and a token store.
pub struct GameHubApi<T, S> {
    client: GameHubClient,
    session: Session,
    transport: T,
    store: S,
}

impl<T: Transport, S: TokenStore> GameHubApi<T, S> {
    /// Build a driver, picking up any token left in `store` by an earlier
    /// run. The token is not verified until [`restore_session`] is called.
    ///
    /// [`restore_session`]: GameHubApi::restore_session
    pub fn new(config: &ClientConfig, transport: T, store: S) -> Self {
        let session = match store.load() {
            Ok(Some(token)) => Session::with_token(token),
            Ok(None) => Session::anonymous(),
            Err(err) => {
                tracing::warn!(error = %err, "could not read stored session token");
                Session::anonymous()
            }
        };
        Self {
            client: GameHubClient::from_config(config),
            session,
            transport,
            store,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn client(&self) -> &GameHubClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn execute<R>(
        &self,
        operation: &'static str,
        request: Result<HttpRequest, ApiError>,
        parse: Parser<R>,
    ) -> Result<R, ApiError> {
        let result = match request {
            Ok(request) => {
                tracing::debug!(operation, method = %request.method, path = %request.path, "sending request");
                match self.transport.send(request).await {
                    Ok(response) => parse(&self.client, response),
                    Err(err) => Err(err),
                }
            }
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            tracing::warn!(operation, error = %err, "request failed");
        }
        result
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub async fn sign_up(&self, input: &SignUp) -> Result<AuthResponse, ApiError> {
        let request = self.client.build_sign_up(input);
        self.execute("sign_up", request, GameHubClient::parse_sign_up).await
    }

    /// Sign in and, when the backend issues a session token, keep it in
    /// memory and in the token store. The response is returned unchanged.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let request = self.client.build_sign_in(email, password);
        let response = self.execute("sign_in", request, GameHubClient::parse_sign_in).await?;

        if let Some(token) = response.session_token.as_deref().filter(|_| response.success != Some(false)) {
            if let Err(err) = self.store.save(token) {
                tracing::warn!(operation = "sign_in", error = %err, "could not persist session token");
                return Err(err);
            }
            self.session.set_token(token);
            tracing::debug!("session token stored");
        }
        Ok(response)
    }

    /// Sign out and forget the session token, in memory and in storage.
    pub async fn sign_out(&mut self) -> Result<AuthResponse, ApiError> {
        let request = Ok(self.client.build_sign_out(&self.session));
        let response = self.execute("sign_out", request, GameHubClient::parse_sign_out).await?;

        self.session.clear();
        if let Err(err) = self.store.clear() {
            tracing::warn!(operation = "sign_out", error = %err, "could not clear stored session token");
            return Err(err);
        }
        tracing::debug!("session token cleared");
        Ok(response)
    }

    /// Check the current token with the backend. Fails with
    /// `NotAuthenticated` without sending anything when no token is held.
    pub async fn verify_auth(&self) -> Result<AuthResponse, ApiError> {
        let request = self.client.build_verify_auth(&self.session);
        self.execute("verify_auth", request, GameHubClient::parse_verify_auth).await
    }

    /// Startup check: verify a token left in the store by an earlier run.
    ///
    /// Issues at most one request. A token that fails verification for any
    /// reason is removed from memory and from the store.
    pub async fn restore_session(&mut self) -> RestoredSession {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(error = %err, "could not read stored session token");
                None
            }
        };
        let Some(token) = stored else {
            self.session.clear();
            return RestoredSession::Anonymous;
        };

        self.session.set_token(token);
        match self.verify_auth().await {
            Ok(response) => {
                tracing::debug!("stored session verified");
                RestoredSession::Authenticated(response.user)
            }
            Err(err) => {
                self.session.clear();
                if let Err(store_err) = self.store.clear() {
                    tracing::warn!(error = %store_err, "could not clear stored session token");
                }
                tracing::debug!(error = %err, "stored session rejected");
                RestoredSession::Cleared(err)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Scores
    // -----------------------------------------------------------------------

    pub async fn update_score(&self, game_type: &str, score: i64) -> Result<ScoreResponse, ApiError> {
        let request = self.client.build_update_score(&self.session, game_type, score);
        self.execute("update_score", request, GameHubClient::parse_update_score).await
    }

    pub async fn get_leaderboard(&self, game_type: &str) -> Result<LeaderboardResponse, ApiError> {
        let request = Ok(self.client.build_get_leaderboard(&self.session, game_type));
        self.execute("get_leaderboard", request, GameHubClient::parse_get_leaderboard)
            .await
    }

    pub async fn get_user_rank(&self, game_type: &str) -> Result<RankResponse, ApiError> {
        let request = Ok(self.client.build_get_user_rank(&self.session, game_type));
        self.execute("get_user_rank", request, GameHubClient::parse_get_user_rank).await
    }

    // -----------------------------------------------------------------------
    // Checkpoints
    // -----------------------------------------------------------------------

    pub async fn save_checkpoint(
        &self,
        game_type: &str,
        game_state: Value,
        checkpoint_name: Option<&str>,
    ) -> Result<CheckpointResponse, ApiError> {
        let input = SaveCheckpoint {
            game_type: game_type.to_string(),
            game_state,
            checkpoint_name: checkpoint_name.map(str::to_string),
        };
        let request = self.client.build_save_checkpoint(&self.session, &input);
        self.execute("save_checkpoint", request, GameHubClient::parse_save_checkpoint)
            .await
    }

    pub async fn load_checkpoint(
        &self,
        game_type: &str,
        checkpoint_id: Option<&str>,
    ) -> Result<CheckpointResponse, ApiError> {
        let request = Ok(self
            .client
            .build_load_checkpoint(&self.session, game_type, checkpoint_id));
        self.execute("load_checkpoint", request, GameHubClient::parse_load_checkpoint)
            .await
    }

    pub async fn list_checkpoints(&self, game_type: &str) -> Result<CheckpointListResponse, ApiError> {
        let request = Ok(self.client.build_list_checkpoints(&self.session, game_type));
        self.execute("list_checkpoints", request, GameHubClient::parse_list_checkpoints)
            .await
    }

    pub async fn delete_checkpoint(&self, checkpoint_id: &str) -> Result<DeleteResponse, ApiError> {
        let request = Ok(self.client.build_delete_checkpoint(&self.session, checkpoint_id));
        self.execute("delete_checkpoint", request, GameHubClient::parse_delete_checkpoint)
            .await
    }
}
