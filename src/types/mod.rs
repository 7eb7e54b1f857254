// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for the normalized climate model.
//!
//! This module provides the vocabulary shared by the codec and the
//! coordinator: the wire-level [`Datapoint`] and [`RawState`], the mode
//! enumerations, and the [`Attribute`]/[`Service`] keys used to look up
//! decode and encode functions in a model descriptor.
//!
//! # Types
//!
//! - [`Datapoint`] - Indexed integer value, the atomic wire unit
//! - [`RawState`] - Per-device map of datapoint index to raw value
//! - [`HvacMode`] / [`HvacAction`] / [`FanMode`] / [`PresetMode`] - Typed modes
//! - [`Attribute`] / [`Service`] - Capability-map keys
//! - [`AttributeValue`] / [`CommandValue`] - Decoded values and desired values

mod attribute;
mod datapoint;
mod modes;

pub use attribute::{Attribute, AttributeValue, CommandValue, Service};
pub use datapoint::{Datapoint, RawState};
pub use modes::{FanMode, HvacAction, HvacMode, PresetMode};
