// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Datapoints and raw device state.
//!
//! The Xlink wire protocol reports and accepts device state as indexed
//! integer values. A [`Datapoint`] is the atomic unit of both state
//! reporting and command dispatch; a [`RawState`] is the per-device map of
//! stringified datapoint index to integer value returned by a batched
//! state query.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An indexed integer value in the Xlink wire protocol.
///
/// Commands are ordered sequences of datapoints. Order matters: some
/// devices require the power-switch datapoint before the mode datapoint.
///
/// # Examples
///
/// ```
/// use linkedgo_lib::types::Datapoint;
///
/// let dp = Datapoint::new(7, 215);
/// assert_eq!(serde_json::to_string(&dp).unwrap(), r#"{"index":7,"value":215}"#);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datapoint {
    /// The datapoint index in the product's physical model.
    pub index: u32,
    /// The raw integer value.
    pub value: i64,
}

impl Datapoint {
    /// Creates a new datapoint.
    #[must_use]
    pub const fn new(index: u32, value: i64) -> Self {
        Self { index, value }
    }
}

/// Raw device state as reported by a batched state query.
///
/// Keys are stringified datapoint indices; values are raw integers. The
/// batch query response mixes datapoints with bookkeeping fields like
/// `device_id`, so construction tolerates and ignores non-numeric keys and
/// non-integer values.
///
/// # Examples
///
/// ```
/// use linkedgo_lib::types::RawState;
///
/// let raw: RawState = serde_json::from_str(r#"{"0":1,"7":215,"device_id":42}"#).unwrap();
/// assert_eq!(raw.get(7), Some(215));
/// assert_eq!(raw.get(99), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawState {
    values: BTreeMap<u32, i64>,
}

impl RawState {
    /// Creates an empty raw state.
    ///
    /// Decode functions must tolerate an empty state and report the
    /// attribute as not yet reported rather than failing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value of a datapoint, if reported.
    #[must_use]
    pub fn get(&self, index: u32) -> Option<i64> {
        self.values.get(&index).copied()
    }

    /// Returns `true` if no datapoints have been reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of reported datapoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Sets a datapoint value.
    pub fn set(&mut self, index: u32, value: i64) {
        self.values.insert(index, value);
    }
}

impl FromIterator<(u32, i64)> for RawState {
    fn from_iter<T: IntoIterator<Item = (u32, i64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for RawState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let map = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let values = map
            .into_iter()
            .filter_map(|(key, value)| Some((key.parse().ok()?, value.as_i64()?)))
            .collect();
        Ok(Self { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datapoint_serializes_as_index_value_pair() {
        let dp = Datapoint::new(0, 1);
        assert_eq!(
            serde_json::to_value(dp).unwrap(),
            serde_json::json!({"index": 0, "value": 1})
        );
    }

    #[test]
    fn raw_state_ignores_non_datapoint_keys() {
        let raw: RawState =
            serde_json::from_str(r#"{"0":1,"116":235,"device_id":7,"mac":"aa:bb"}"#).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw.get(116), Some(235));
        assert_eq!(raw.get(0), Some(1));
    }

    #[test]
    fn empty_raw_state_reports_nothing() {
        let raw = RawState::new();
        assert!(raw.is_empty());
        assert_eq!(raw.get(0), None);
    }

    #[test]
    fn from_iterator_builds_state() {
        let raw: RawState = [(2, 80), (6, 1)].into_iter().collect();
        assert_eq!(raw.get(2), Some(80));
        assert_eq!(raw.get(6), Some(1));
    }
}
