// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP client for the Xlink cloud API.
//!
//! Every endpoint has a fixed shape: login, token refresh, home list,
//! device list, batched state query, and command dispatch. A 200 status
//! with a parseable body is success; 403 signals session invalidity; any
//! other status is a request failure. Authenticated calls carry an
//! `Access-Token` header.
//!
//! This layer is stateless with respect to tokens: the caller passes the
//! access token in, and the [`SessionManager`](crate::session::SessionManager)
//! owns the token lifecycle.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::types::{Datapoint, RawState};

/// Default Xlink cloud endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api2.xlink.cn";

/// Corp id issued to LinkedGo by the Xlink platform.
pub const DEFAULT_CORP_ID: &str = "100fa6b2eddf2400";

/// Configuration for the Xlink cloud client.
///
/// # Examples
///
/// ```
/// use linkedgo_lib::api::ApiConfig;
/// use std::time::Duration;
///
/// // Defaults
/// let config = ApiConfig::new();
///
/// // With all options
/// let config = ApiConfig::new()
///     .with_base_url("https://api2.example.test")
///     .with_corp_id("0123456789abcdef")
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: String,
    corp_id: String,
    timeout: Duration,
}

impl ApiConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration with the production defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            corp_id: DEFAULT_CORP_ID.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom base URL (used by tests and private deployments).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets a custom corp id.
    #[must_use]
    pub fn with_corp_id(mut self, corp_id: impl Into<String>) -> Self {
        self.corp_id = corp_id.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the corp id.
    #[must_use]
    pub fn corp_id(&self) -> &str {
        &self.corp_id
    }

    /// Creates an [`ApiClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be created.
    pub fn into_client(self) -> Result<ApiClient, ApiError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ApiError::Http)?;

        Ok(ApiClient {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            corp_id: self.corp_id,
            client,
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Tokens and identity returned by login and refresh.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    /// Bearer token for authenticated calls.
    pub access_token: String,
    /// Token exchanged for a new pair before expiry.
    pub refresh_token: String,
    /// Cloud user id; present on login, absent on refresh.
    #[serde(default)]
    pub user_id: Option<u64>,
    /// Token lifetime in seconds from now.
    pub expire_in: i64,
    /// Authorize code issued on login; absent on refresh.
    #[serde(default)]
    pub authorize: Option<String>,
}

/// A home as returned by the home list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Home {
    /// Cloud home id.
    pub id: u64,
    /// Home name as configured by the user.
    pub name: String,
}

/// Device metadata as returned by the home device list.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSummary {
    /// Cloud device id.
    pub id: u64,
    /// Device name.
    pub name: String,
    /// Device MAC address.
    pub mac: String,
    /// Product id; keys the model descriptor lookup.
    pub product_id: String,
    /// MCU firmware version.
    pub mcu_version: String,
    /// Whether the cloud currently sees the device.
    pub is_online: bool,
}

/// One device's raw state from a batched query.
#[derive(Debug, Clone)]
pub struct DeviceRawState {
    /// Cloud device id.
    pub device_id: u64,
    /// The reported datapoint map.
    pub raw: RawState,
}

impl<'de> Deserialize<'de> for DeviceRawState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let map = serde_json::Map::deserialize(deserializer)?;
        // The cloud is inconsistent here and reports the id as either a
        // number or a string.
        let device_id = map
            .get("device_id")
            .and_then(|value| match value {
                serde_json::Value::Number(n) => n.as_u64(),
                serde_json::Value::String(s) => s.parse().ok(),
                _ => None,
            })
            .ok_or_else(|| D::Error::missing_field("device_id"))?;
        let raw = serde_json::from_value(serde_json::Value::Object(map))
            .map_err(D::Error::custom)?;
        Ok(Self { device_id, raw })
    }
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<T> {
    #[serde(default = "Vec::new")]
    list: Vec<T>,
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    corp_id: &'a str,
    phone: &'a str,
    password: &'a str,
    resource: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
struct CommandBody<'a> {
    datapoint: &'a [Datapoint],
}

/// HTTP client for the Xlink cloud.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    corp_id: String,
    client: Client,
}

impl ApiClient {
    /// Returns the base URL of the cloud endpoint.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchanges credentials for tokens.
    ///
    /// `POST /v2/user_auth`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on a non-200 status or a 200 body missing the
    /// token fields.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let url = format!("{}/v2/user_auth", self.base_url);
        let body = LoginBody {
            corp_id: &self.corp_id,
            phone: username,
            password,
            resource: "web",
        };
        self.post_json(&url, None, &body, "login tokens").await
    }

    /// Exchanges the refresh token for a new token pair.
    ///
    /// `POST /v2/user/token/refresh`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::SessionExpired`] when the cloud rejects the
    /// refresh token with a 403.
    pub async fn refresh_token(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<AuthResponse, ApiError> {
        let url = format!("{}/v2/user/token/refresh", self.base_url);
        let body = RefreshBody { refresh_token };
        self.post_json(&url, Some(access_token), &body, "refreshed tokens")
            .await
    }

    /// Lists the homes of a user.
    ///
    /// `GET /v2/homes`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any non-200 status.
    pub async fn homes(&self, access_token: &str, user_id: u64) -> Result<Vec<Home>, ApiError> {
        let url = format!(
            "{}/v2/homes?user_id={user_id}&field=room,zone&version=0",
            self.base_url
        );
        let envelope: ListEnvelope<Home> = self.get_json(&url, access_token, "home list").await?;
        Ok(envelope.list)
    }

    /// Lists the devices of a home.
    ///
    /// `GET /v2/home/{id}/devices`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any non-200 status.
    pub async fn home_devices(
        &self,
        access_token: &str,
        home_id: u64,
    ) -> Result<Vec<DeviceSummary>, ApiError> {
        let url = format!("{}/v2/home/{home_id}/devices", self.base_url);
        let envelope: ListEnvelope<DeviceSummary> =
            self.get_json(&url, access_token, "device list").await?;
        Ok(envelope.list)
    }

    /// Queries the state of multiple devices of one product in one round
    /// trip.
    ///
    /// `POST /v2/product/{id}/v_devices`. The batch endpoint is scoped to a
    /// single product, so the coordinator issues one call per product
    /// group.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any non-200 status; 403 maps to
    /// [`ApiError::SessionExpired`].
    pub async fn query_states(
        &self,
        access_token: &str,
        product_id: &str,
        device_ids: &[u64],
    ) -> Result<Vec<DeviceRawState>, ApiError> {
        let url = format!("{}/v2/product/{product_id}/v_devices", self.base_url);
        let envelope: ListEnvelope<DeviceRawState> = self
            .post_json(&url, Some(access_token), &device_ids, "device states")
            .await?;
        Ok(envelope.list)
    }

    /// Sends an ordered datapoint command to one device.
    ///
    /// `POST /v2/diagnosis/device/set/{id}`. Datapoints are sent in the
    /// given order; some devices require the switch datapoint before the
    /// mode datapoint.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any non-200 status.
    pub async fn send_datapoints(
        &self,
        access_token: &str,
        device_id: u64,
        datapoints: &[Datapoint],
    ) -> Result<(), ApiError> {
        let url = format!("{}/v2/diagnosis/device/set/{device_id}", self.base_url);
        let body = CommandBody { datapoint: datapoints };

        tracing::debug!(url = %url, count = datapoints.len(), "Sending device command");

        let response = self
            .client
            .post(&url)
            .header("Access-Token", access_token)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::Http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16()));
        }
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
        context: &str,
    ) -> Result<T, ApiError> {
        tracing::debug!(url = %url, "Sending GET request");

        let response = self
            .client
            .get(url)
            .header("Access-Token", access_token)
            .send()
            .await
            .map_err(ApiError::Http)?;

        Self::parse_response(response, context).await
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: Option<&str>,
        body: &impl Serialize,
        context: &str,
    ) -> Result<T, ApiError> {
        tracing::debug!(url = %url, "Sending POST request");

        let mut request = self.client.post(url).json(body);
        if let Some(token) = access_token {
            request = request.header("Access-Token", token);
        }
        let response = request.send().await.map_err(ApiError::Http)?;

        Self::parse_response(response, context).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "Request failed");
            return Err(ApiError::from_status(status.as_u16()));
        }

        let body = response.text().await.map_err(ApiError::Http)?;
        // A well-formed 200 missing expected fields indicates a cloud-side
        // contract change, not a transient fault.
        serde_json::from_str(&body).map_err(|err| {
            tracing::warn!(context, %err, "Response missing expected fields");
            ApiError::DataEmpty(context.to_string())
        })
    }
}
