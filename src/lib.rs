// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `LinkedGo` Lib - A Rust library to control LinkedGo thermostats via the
//! Xlink cloud API.
//!
//! This library provides async APIs to authenticate against the Xlink
//! cloud, enumerate a user's homes and devices, poll device state with
//! one batched query per product, and send typed commands that are
//! translated per model into raw datapoint writes.
//!
//! # Supported Features
//!
//! - **Climate control**: HVAC mode, target temperature and humidity,
//!   fan speed, sleep preset
//! - **State polling**: Batched per-product queries with partial-failure
//!   isolation
//! - **Session management**: Token refresh before expiry and transparent
//!   recovery from an expired session
//!
//! # Supported Models
//!
//! - ST830: Cooling/heating thermostat with humidity and fan control
//! - ST1800-HN: Heating-only floor thermostat
//!
//! # Quick Start
//!
//! ```no_run
//! use linkedgo_lib::{ApiConfig, Coordinator, SessionManager};
//! use linkedgo_lib::{Attribute, CommandValue, HvacMode, Service};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> linkedgo_lib::Result<()> {
//!     let api = ApiConfig::new().into_client()?;
//!     let session = Arc::new(SessionManager::new(api.clone(), "13800000000", "password"));
//!     session.authenticate().await?;
//!
//!     let coordinator = Coordinator::new(api, session);
//!     let homes = coordinator.list_homes().await?;
//!     let mut devices = coordinator.list_devices(homes[0].id).await?;
//!
//!     coordinator.refresh_states(&mut devices).await?;
//!     for device in &devices {
//!         println!(
//!             "{}: {:?}",
//!             device.name(),
//!             device.attribute(Attribute::CurrentTemperature)
//!         );
//!     }
//!
//!     coordinator
//!         .control_device(
//!             &devices[0],
//!             Service::SetHvacMode,
//!             &CommandValue::from(HvacMode::Heat),
//!         )
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod coordinator;
mod device;
pub mod error;
pub mod model;
pub mod session;
pub mod types;

pub use api::{ApiClient, ApiConfig, DeviceRawState, DeviceSummary, Home};
pub use coordinator::{Coordinator, RefreshOutcome};
pub use device::Device;
pub use error::{ApiError, AuthError, CodecError, Error, Result};
pub use model::{ModelDescriptor, ST830, ST1800_HN, lookup};
pub use session::{PREFLIGHT_MARGIN, REFRESH_MARGIN, Session, SessionManager};
pub use types::{
    Attribute, AttributeValue, CommandValue, Datapoint, FanMode, HvacAction, HvacMode, PresetMode,
    RawState, Service,
};
