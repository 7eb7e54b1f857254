// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session and token lifecycle management.
//!
//! The cloud issues an access/refresh token pair with a multi-hour
//! lifetime. The [`SessionManager`] owns that pair for one account:
//! authenticate with stored credentials, proactively refresh before
//! expiry, and recover from an authorization rejection mid-flight.
//!
//! # Concurrency
//!
//! Token reads are lock-free snapshots; concurrent operations observe
//! either the pre- or post-refresh pair, never a half-updated one.
//! Mutation is single-flight: a tokio mutex is held across the network
//! round trip of `authenticate`/`refresh` so at most one is in flight at a
//! time, and the new pair is swapped in under a short write lock.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::api::{ApiClient, AuthResponse};
use crate::error::{ApiError, AuthError, Error, Result};

/// Pre-flight validity margin: a token expiring within this window is not
/// worth starting a request with.
pub const PREFLIGHT_MARGIN: Duration = Duration::from_secs(600);

/// Proactive refresh margin, evaluated after every successful batched
/// query (~115 minutes before a multi-hour token lifetime ends).
pub const REFRESH_MARGIN: Duration = Duration::from_secs(6900);

/// The authenticated credential set for one cloud account.
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token carried in the `Access-Token` header.
    pub access_token: String,
    /// Token exchanged for a new pair before expiry.
    pub refresh_token: String,
    /// Cloud user id.
    pub user_id: u64,
    /// Instant at which the access token stops working.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn from_auth(auth: &AuthResponse, user_id: u64) -> Self {
        Self {
            access_token: auth.access_token.clone(),
            refresh_token: auth.refresh_token.clone(),
            user_id,
            // An out-of-range lifetime reads as already expired.
            expires_at: Utc::now() + TimeDelta::try_seconds(auth.expire_in).unwrap_or_default(),
        }
    }
}

/// Owns the session for one cloud account.
///
/// State machine: Unauthenticated, Authenticated, Refreshing, back to
/// Authenticated, with Unauthenticated reachable from any state via
/// [`invalidate`](Self::invalidate) on irrecoverable rejection.
///
/// Tokens live in process memory only; restore a persisted session with
/// [`restore`](Self::restore) after a restart.
#[derive(Debug)]
pub struct SessionManager {
    api: ApiClient,
    username: String,
    password: String,
    session: RwLock<Option<Session>>,
    auth_gate: Mutex<()>,
}

impl SessionManager {
    /// Creates an unauthenticated manager for one account.
    #[must_use]
    pub fn new(api: ApiClient, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            api,
            username: username.into(),
            password: password.into(),
            session: RwLock::new(None),
            auth_gate: Mutex::new(()),
        }
    }

    /// Restores a caller-persisted session.
    pub fn restore(&self, session: Session) {
        *self.session.write() = Some(session);
    }

    /// Returns a snapshot of the current session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Returns the current access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] if no session exists.
    pub fn access_token(&self) -> Result<String> {
        self.session
            .read()
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or_else(|| AuthError::NotAuthenticated.into())
    }

    /// Returns the cloud user id, if authenticated.
    #[must_use]
    pub fn user_id(&self) -> Option<u64> {
        self.session.read().as_ref().map(|s| s.user_id)
    }

    /// Returns `true` if a token exists and its expiry is more than
    /// `within` in the future.
    ///
    /// Total over any margin: a duration beyond chrono's range saturates
    /// and reads as `false`.
    #[must_use]
    pub fn is_valid(&self, within: Duration) -> bool {
        let margin = TimeDelta::from_std(within).unwrap_or(TimeDelta::MAX);
        self.session
            .read()
            .as_ref()
            .is_some_and(|s| s.expires_at.signed_duration_since(Utc::now()) > margin)
    }

    /// Clears the session, forcing re-authentication.
    pub fn invalidate(&self) {
        *self.session.write() = None;
    }

    /// Exchanges the stored credentials for a fresh session.
    ///
    /// At most one authenticate/refresh runs at a time; concurrent callers
    /// wait and then observe the new token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the cloud rejects
    /// the credentials, and [`ApiError::DataEmpty`] when a 200 response
    /// carries no tokens.
    pub async fn authenticate(&self) -> Result<u64> {
        let _flight = self.auth_gate.lock().await;

        let auth = self
            .api
            .login(&self.username, &self.password)
            .await
            .map_err(|err| match err {
                ApiError::Status { .. } | ApiError::SessionExpired => {
                    tracing::warn!(username = %self.username, "User authentication failed");
                    Error::Auth(AuthError::InvalidCredentials)
                }
                other => Error::Api(other),
            })?;

        let user_id = auth
            .user_id
            .ok_or_else(|| ApiError::DataEmpty("login user id".to_string()))?;

        *self.session.write() = Some(Session::from_auth(&auth, user_id));
        tracing::debug!(user_id, "Authenticated");
        Ok(user_id)
    }

    /// Exchanges the refresh token for a new token pair.
    ///
    /// On rejection the previous (still-expiring) session stays in place
    /// and no retry is made; the caller falls back to
    /// [`authenticate`](Self::authenticate).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotAuthenticated`] without a session and
    /// [`AuthError::RefreshRejected`] when the cloud rejects the refresh
    /// token.
    pub async fn refresh(&self) -> Result<()> {
        let _flight = self.auth_gate.lock().await;

        let (access_token, refresh_token, user_id) = {
            let session = self.session.read();
            let session = session.as_ref().ok_or(AuthError::NotAuthenticated)?;
            (
                session.access_token.clone(),
                session.refresh_token.clone(),
                session.user_id,
            )
        };

        // The session mutex is not held across this round trip; only the
        // auth gate serializes it.
        let auth = self
            .api
            .refresh_token(&access_token, &refresh_token)
            .await
            .map_err(|err| match err {
                ApiError::SessionExpired => {
                    tracing::warn!("Refresh token rejected; full re-authentication required");
                    Error::Auth(AuthError::RefreshRejected)
                }
                other => Error::Api(other),
            })?;

        *self.session.write() = Some(Session::from_auth(&auth, user_id));
        tracing::debug!("Token refreshed");
        Ok(())
    }

    /// Refreshes the token, falling back to full re-authentication when
    /// the refresh token itself is rejected.
    ///
    /// # Errors
    ///
    /// Returns the re-authentication error if both steps fail.
    pub async fn refresh_or_reauthenticate(&self) -> Result<()> {
        match self.refresh().await {
            Err(Error::Auth(_)) => {
                self.authenticate().await?;
                Ok(())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiConfig;

    fn manager() -> SessionManager {
        let api = ApiConfig::new().into_client().unwrap();
        SessionManager::new(api, "user@example.test", "secret")
    }

    fn session_expiring_in(seconds: i64) -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            user_id: 7,
            expires_at: Utc::now() + TimeDelta::seconds(seconds),
        }
    }

    #[test]
    fn unauthenticated_is_never_valid() {
        let manager = manager();
        assert!(!manager.is_valid(Duration::ZERO));
        assert!(manager.access_token().is_err());
    }

    #[test]
    fn is_valid_honors_margin() {
        let manager = manager();
        manager.restore(session_expiring_in(3600));

        assert!(manager.is_valid(Duration::ZERO));
        assert!(manager.is_valid(Duration::from_secs(1800)));
        // Expiry minus margin is already in the past.
        assert!(!manager.is_valid(Duration::from_secs(7200)));
    }

    #[test]
    fn out_of_range_margin_reads_as_invalid() {
        let manager = manager();
        manager.restore(session_expiring_in(3600));

        // Margins beyond chrono's range saturate instead of panicking.
        assert!(!manager.is_valid(Duration::from_secs(u64::MAX)));
        assert!(!manager.is_valid(Duration::MAX));
        assert!(manager.is_valid(Duration::ZERO));
    }

    #[test]
    fn proactive_margin_triggers_before_preflight() {
        let manager = manager();
        manager.restore(session_expiring_in(3600));

        // Still fine to start a request, but due for a refresh.
        assert!(manager.is_valid(PREFLIGHT_MARGIN));
        assert!(!manager.is_valid(REFRESH_MARGIN));
    }

    #[test]
    fn invalidate_clears_session() {
        let manager = manager();
        manager.restore(session_expiring_in(3600));
        manager.invalidate();
        assert!(manager.session().is_none());
        assert!(manager.user_id().is_none());
    }
}
