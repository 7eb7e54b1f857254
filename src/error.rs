// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `LinkedGo` library.
//!
//! This module provides the error hierarchy for failures across the library:
//! authentication and token lifecycle, cloud API communication, and the
//! datapoint codec boundary.

use thiserror::Error;

/// The main error type for this library.
///
/// This enum encompasses all possible errors that can occur when talking to
/// the Xlink cloud and translating device state.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during authentication or token refresh.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Error occurred during a cloud API call.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Error occurred while encoding or decoding datapoints.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Every product group in a batched refresh failed.
    #[error("state refresh failed for all {0} product groups")]
    RefreshFailed(usize),
}

/// Errors related to credentials and the token lifecycle.
///
/// These require caller action: re-entering credentials or performing a
/// full re-authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The cloud rejected the supplied username/password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The cloud rejected the refresh token; a full re-authentication with
    /// stored credentials is required.
    #[error("refresh token rejected")]
    RefreshRejected,

    /// No session exists yet; call `authenticate` first.
    #[error("not authenticated")]
    NotAuthenticated,
}

/// Errors related to cloud API communication.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed at the transport level.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The cloud returned a non-success, non-403 status.
    #[error("request failed with HTTP {status}")]
    Status {
        /// The HTTP status code returned by the cloud.
        status: u16,
    },

    /// The cloud returned 403; the session is no longer valid.
    #[error("session expired (HTTP 403)")]
    SessionExpired,

    /// A 200 response was missing expected fields, which indicates a
    /// cloud-side contract change.
    #[error("response data empty: {0}")]
    DataEmpty(String),
}

/// Errors at the datapoint codec boundary.
///
/// These are recovered locally as "attribute unavailable" or "command
/// rejected" and never abort a whole batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// No model descriptor is registered for this product id.
    #[error("unsupported product: {0}")]
    UnsupportedModel(String),

    /// The model declares no decode function for this attribute.
    #[error("model {model} does not support attribute {attribute}")]
    UnsupportedAttribute {
        /// The model name.
        model: &'static str,
        /// The attribute that has no decode function.
        attribute: &'static str,
    },

    /// The model declares no encode function for this service.
    #[error("model {model} does not support service {service}")]
    UnsupportedService {
        /// The model name.
        model: &'static str,
        /// The service that has no encode function.
        service: &'static str,
    },

    /// The raw state does not yet contain the datapoints this attribute
    /// requires.
    #[error("attribute {attribute} not reported yet")]
    NotReported {
        /// The attribute whose datapoints are absent.
        attribute: &'static str,
    },

    /// The requested value is outside the model's declared range or
    /// enumeration; no datapoints were produced.
    #[error("value rejected for service {service}")]
    Rejected {
        /// The service whose encode function rejected the value.
        service: &'static str,
    },
}

impl ApiError {
    /// Maps an HTTP status code to the matching error.
    ///
    /// 403 specifically signals session invalidity; every other non-success
    /// status is a plain request failure.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        if status == 403 {
            Self::SessionExpired
        } else {
            Self::Status { status }
        }
    }

    /// Returns `true` if this error signals an expired session.
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_403_is_session_expired() {
        assert!(ApiError::from_status(403).is_session_expired());
        assert!(!ApiError::from_status(500).is_session_expired());
    }

    #[test]
    fn codec_error_display() {
        let err = CodecError::UnsupportedAttribute {
            model: "ST830",
            attribute: "fan_mode",
        };
        assert_eq!(
            err.to_string(),
            "model ST830 does not support attribute fan_mode"
        );
    }

    #[test]
    fn error_from_api_error() {
        let err: Error = ApiError::from_status(500).into();
        assert!(matches!(err, Error::Api(ApiError::Status { status: 500 })));
    }

    #[test]
    fn data_empty_display() {
        let err = ApiError::DataEmpty("device list".to_string());
        assert_eq!(err.to_string(), "response data empty: device list");
    }
}
