// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Batched polling and command dispatch.
//!
//! The [`Coordinator`] drives one account's device fleet: discover homes
//! and devices, sweep current state with one batched query per product,
//! and push individual commands. Product groups fail independently; a
//! stale group keeps its last known state while the rest of the fleet
//! updates.
//!
//! # Examples
//!
//! ```no_run
//! use linkedgo_lib::{ApiConfig, Coordinator, SessionManager};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), linkedgo_lib::Error> {
//! let api = ApiConfig::new().into_client()?;
//! let session = Arc::new(SessionManager::new(api.clone(), "user", "pass"));
//! session.authenticate().await?;
//!
//! let coordinator = Coordinator::new(api, session);
//! let homes = coordinator.list_homes().await?;
//! let mut devices = coordinator.list_devices(homes[0].id).await?;
//! let outcome = coordinator.refresh_states(&mut devices).await?;
//! println!("updated {} devices", outcome.updated().len());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::api::{ApiClient, DeviceRawState, Home};
use crate::device::Device;
use crate::error::{ApiError, Error, Result};
use crate::session::{PREFLIGHT_MARGIN, REFRESH_MARGIN, SessionManager};
use crate::types::{CommandValue, Service};

/// The result of one [`refresh_states`](Coordinator::refresh_states)
/// sweep.
#[derive(Debug, Default)]
pub struct RefreshOutcome {
    updated: Vec<u64>,
    failures: Vec<(String, ApiError)>,
}

impl RefreshOutcome {
    /// Ids of the devices whose state was updated this sweep.
    #[must_use]
    pub fn updated(&self) -> &[u64] {
        &self.updated
    }

    /// Product groups whose batched query failed, with the error.
    #[must_use]
    pub fn failures(&self) -> &[(String, ApiError)] {
        &self.failures
    }

    /// Returns `true` if every product group was queried successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives polling and command dispatch for one account's devices.
#[derive(Debug)]
pub struct Coordinator {
    api: ApiClient,
    session: Arc<SessionManager>,
}

impl Coordinator {
    /// Creates a coordinator over an authenticated session.
    #[must_use]
    pub fn new(api: ApiClient, session: Arc<SessionManager>) -> Self {
        Self { api, session }
    }

    /// Returns the session manager this coordinator polls with.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Lists the homes of the authenticated user.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AuthError::NotAuthenticated`] without a session,
    /// or an [`ApiError`] from the cloud.
    pub async fn list_homes(&self) -> Result<Vec<Home>> {
        let token = self.valid_token().await?;
        let user_id = self
            .session
            .user_id()
            .ok_or(crate::error::AuthError::NotAuthenticated)?;
        Ok(self.api.homes(&token, user_id).await?)
    }

    /// Enumerates the supported devices in a home.
    ///
    /// Devices with an unrecognized product id are skipped; controlling
    /// an unknown model blind is worse than not exposing it.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] when the device list cannot be fetched.
    pub async fn list_devices(&self, home_id: u64) -> Result<Vec<Device>> {
        let token = self.valid_token().await?;
        let summaries = self.api.home_devices(&token, home_id).await?;

        let mut devices = Vec::with_capacity(summaries.len());
        for summary in summaries {
            match Device::from_summary(&summary) {
                Ok(device) => devices.push(device),
                Err(err) => {
                    tracing::debug!(
                        device_id = summary.id,
                        product_id = %summary.product_id,
                        %err,
                        "Skipping unsupported device"
                    );
                }
            }
        }
        Ok(devices)
    }

    /// Fetches current state for all devices with one batched query per
    /// product, and applies the results.
    ///
    /// Groups are queried concurrently and fail independently: a failed
    /// group's devices keep their last known state and the group is
    /// recorded in the outcome. An expired session triggers at most one
    /// re-authentication per call, after which the failed groups are
    /// retried once.
    ///
    /// After a sweep the token's remaining lifetime is checked and a
    /// proactive refresh is attempted when it runs low; a failed proactive
    /// refresh is logged, not returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RefreshFailed`] when every group failed, or an
    /// auth error when re-authentication itself fails.
    pub async fn refresh_states(&self, devices: &mut [Device]) -> Result<RefreshOutcome> {
        let mut groups: BTreeMap<String, Vec<u64>> = BTreeMap::new();
        for device in devices.iter() {
            groups
                .entry(device.product_id().to_string())
                .or_default()
                .push(device.device_id());
        }
        if groups.is_empty() {
            return Ok(RefreshOutcome::default());
        }

        let token = self.valid_token().await?;
        let mut results = self.query_groups(&token, &groups).await;

        // One recovery pass: if any group hit an expired session, renew
        // once and retry only those groups.
        if results
            .values()
            .any(|result| matches!(result, Err(err) if err.is_session_expired()))
        {
            tracing::info!("Session expired mid-sweep; re-authenticating");
            self.session.refresh_or_reauthenticate().await?;
            let token = self.session.access_token()?;

            let retry: BTreeMap<String, Vec<u64>> = groups
                .iter()
                .filter(|(product_id, _)| {
                    matches!(results.get(*product_id), Some(Err(err)) if err.is_session_expired())
                })
                .map(|(product_id, ids)| (product_id.clone(), ids.clone()))
                .collect();
            results.extend(self.query_groups(&token, &retry).await);
        }

        let mut outcome = RefreshOutcome::default();
        for (product_id, result) in results {
            match result {
                Ok(states) => {
                    let by_id: BTreeMap<u64, DeviceRawState> = states
                        .into_iter()
                        .map(|state| (state.device_id, state))
                        .collect();
                    for device in devices
                        .iter_mut()
                        .filter(|device| device.product_id() == product_id)
                    {
                        if let Some(state) = by_id.get(&device.device_id()) {
                            device.apply_raw(state.raw.clone());
                            outcome.updated.push(device.device_id());
                        } else {
                            tracing::debug!(
                                device_id = device.device_id(),
                                "Device missing from batched query response"
                            );
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(product_id = %product_id, error = %err, "Batched query failed");
                    outcome.failures.push((product_id, err));
                }
            }
        }

        // Judged per group: a group that answered with no matching devices
        // still succeeded.
        if outcome.failures.len() == groups.len() {
            return Err(Error::RefreshFailed(outcome.failures.len()));
        }

        self.refresh_token_if_due().await;
        Ok(outcome)
    }

    /// Encodes and sends one command to one device.
    ///
    /// Encoding happens before any network traffic, so an unsupported or
    /// out-of-range command fails without touching the cloud. Success
    /// means the cloud accepted the write; the device's cached state is
    /// not re-polled here and updates on the next sweep.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::CodecError`] when the model rejects the
    /// command, or an [`ApiError`] when the cloud does.
    pub async fn control_device(
        &self,
        device: &Device,
        service: Service,
        value: &CommandValue,
    ) -> Result<()> {
        let datapoints = device.descriptor().encode(service, device, value)?;

        let token = self.valid_token().await?;
        match self
            .api
            .send_datapoints(&token, device.device_id(), &datapoints)
            .await
        {
            Err(err) if err.is_session_expired() => {
                tracing::info!("Session expired on command; re-authenticating");
                self.session.refresh_or_reauthenticate().await?;
                let token = self.session.access_token()?;
                self.api
                    .send_datapoints(&token, device.device_id(), &datapoints)
                    .await?;
            }
            Err(err) => return Err(err.into()),
            Ok(()) => {}
        }
        tracing::debug!(
            device_id = device.device_id(),
            service = %service,
            "Command accepted"
        );
        Ok(())
    }

    /// Returns an access token worth starting a request with, renewing
    /// first if the current one is about to expire.
    async fn valid_token(&self) -> Result<String> {
        if !self.session.is_valid(PREFLIGHT_MARGIN) && self.session.session().is_some() {
            self.session.refresh_or_reauthenticate().await?;
        }
        self.session.access_token()
    }

    /// Proactively renews the token when its remaining lifetime drops
    /// below the refresh margin. Failure is non-fatal; the next sweep's
    /// pre-flight check or 403 recovery picks it up.
    async fn refresh_token_if_due(&self) {
        if self.session.is_valid(REFRESH_MARGIN) {
            return;
        }
        if let Err(err) = self.session.refresh_or_reauthenticate().await {
            tracing::warn!(error = %err, "Proactive token refresh failed");
        }
    }

    /// Runs one batched query per product group, concurrently.
    async fn query_groups(
        &self,
        token: &str,
        groups: &BTreeMap<String, Vec<u64>>,
    ) -> BTreeMap<String, std::result::Result<Vec<DeviceRawState>, ApiError>> {
        let mut tasks = JoinSet::new();
        for (product_id, ids) in groups {
            let api = self.api.clone();
            let token = token.to_string();
            let product_id = product_id.clone();
            let ids = ids.clone();
            tasks.spawn(async move {
                let result = api.query_states(&token, &product_id, &ids).await;
                (product_id, result)
            });
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((product_id, result)) => {
                    results.insert(product_id, result);
                }
                Err(err) => {
                    // Panics inside a query task surface here.
                    tracing::error!(error = %err, "Batched query task failed to join");
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_outcome_is_complete() {
        let outcome = RefreshOutcome::default();
        assert!(outcome.is_complete());
        assert!(outcome.updated().is_empty());
    }
}
