// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identity and tracked state.

use std::collections::HashMap;

use crate::api::DeviceSummary;
use crate::error::CodecError;
use crate::model::{self, ModelDescriptor};
use crate::types::{Attribute, AttributeValue, RawState};

/// A physical device known to the cloud, with its decoded state.
///
/// A device pairs its cloud identity (product id, device id, MAC,
/// firmware) with a shared read-only [`ModelDescriptor`] and two views of
/// its state: the last raw datapoint map reported by the cloud and the
/// normalized attribute map decoded from it. The raw map is kept because
/// some encode operations depend on other current raw values, such as the
/// machine-type datapoint that selects the fan enumeration.
///
/// [`apply_raw`](Self::apply_raw) is the only mutation path for both
/// views. An attribute that stops decoding keeps its last decoded value,
/// so a partial report never blanks the normalized state.
#[derive(Debug, Clone)]
pub struct Device {
    device_id: u64,
    name: String,
    mac: String,
    firmware_version: String,
    online: bool,
    descriptor: &'static ModelDescriptor,
    attributes: HashMap<Attribute, AttributeValue>,
    raw: RawState,
}

impl Device {
    /// Creates a device with an empty raw state.
    ///
    /// The normalized state is seeded by decoding the empty raw map, so
    /// constant attributes (bounds, mode lists, step) are available
    /// immediately while measured attributes stay absent until the first
    /// successful poll.
    #[must_use]
    pub fn new(
        descriptor: &'static ModelDescriptor,
        device_id: u64,
        name: impl Into<String>,
        mac: impl Into<String>,
        firmware_version: impl Into<String>,
        online: bool,
    ) -> Self {
        let mut device = Self {
            device_id,
            name: name.into(),
            mac: mac.into(),
            firmware_version: firmware_version.into(),
            online,
            descriptor,
            attributes: HashMap::new(),
            raw: RawState::new(),
        };
        device.apply_raw(RawState::new());
        device
    }

    /// Builds a device from its cloud metadata.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedModel`] when no descriptor is
    /// registered for the summary's product id.
    pub fn from_summary(summary: &DeviceSummary) -> Result<Self, CodecError> {
        let descriptor = model::lookup(&summary.product_id)
            .ok_or_else(|| CodecError::UnsupportedModel(summary.product_id.clone()))?;
        Ok(Self::new(
            descriptor,
            summary.id,
            summary.name.clone(),
            summary.mac.clone(),
            summary.mcu_version.clone(),
            summary.is_online,
        ))
    }

    /// Returns the product id this device belongs to.
    #[must_use]
    pub fn product_id(&self) -> &'static str {
        self.descriptor.product_id
    }

    /// Returns the cloud device id.
    #[must_use]
    pub fn device_id(&self) -> u64 {
        self.device_id
    }

    /// Returns the device name as configured in the cloud.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the device MAC address.
    #[must_use]
    pub fn mac(&self) -> &str {
        &self.mac
    }

    /// Returns the MCU firmware version.
    #[must_use]
    pub fn firmware_version(&self) -> &str {
        &self.firmware_version
    }

    /// Returns whether the cloud reports the device online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Updates the online flag.
    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    /// Returns the model descriptor shared by all devices of this product.
    #[must_use]
    pub fn descriptor(&self) -> &'static ModelDescriptor {
        self.descriptor
    }

    /// Returns a decoded attribute value, if known.
    #[must_use]
    pub fn attribute(&self, attribute: Attribute) -> Option<&AttributeValue> {
        self.attributes.get(&attribute)
    }

    /// Iterates over all known attribute values.
    pub fn attributes(&self) -> impl Iterator<Item = (Attribute, &AttributeValue)> {
        self.attributes.iter().map(|(key, value)| (*key, value))
    }

    /// Returns the last raw datapoint map reported by the cloud.
    #[must_use]
    pub fn raw_state(&self) -> &RawState {
        &self.raw
    }

    /// Replaces the raw state and re-decodes every declared attribute.
    ///
    /// Raw and normalized state are replaced together. An attribute whose
    /// decode function finds its datapoints absent keeps its previous
    /// value; it is not an error for the device.
    pub fn apply_raw(&mut self, raw: RawState) {
        for attribute in self.descriptor.attributes() {
            match self.descriptor.decode(attribute, &raw) {
                Ok(value) => {
                    self.attributes.insert(attribute, value);
                }
                Err(err) => {
                    tracing::trace!(
                        device_id = self.device_id,
                        attribute = %attribute,
                        %err,
                        "attribute kept at previous value"
                    );
                }
            }
        }
        self.raw = raw;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ST830;
    use crate::types::HvacMode;

    fn st830_device() -> Device {
        Device::new(&ST830, 42, "living room", "aa:bb:cc:dd:ee:ff", "1.2.0", true)
    }

    #[test]
    fn new_device_has_constant_attributes_only() {
        let device = st830_device();
        // Bounds decode from an empty raw map.
        assert_eq!(
            device.attribute(Attribute::MinTemp).and_then(AttributeValue::as_number),
            Some(5.0)
        );
        // Measured values are absent until the first poll.
        assert!(device.attribute(Attribute::CurrentTemperature).is_none());
        assert!(device.raw_state().is_empty());
    }

    #[test]
    fn from_summary_rejects_unknown_products() {
        let summary = DeviceSummary {
            id: 9,
            name: "mystery".to_string(),
            mac: "aa:bb:cc:dd:ee:ff".to_string(),
            product_id: "ffffffffffffffffffffffffffffffff".to_string(),
            mcu_version: "0.0.1".to_string(),
            is_online: true,
        };
        let err = Device::from_summary(&summary).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnsupportedModel(summary.product_id.clone())
        );
    }

    #[test]
    fn apply_raw_decodes_declared_attributes() {
        let mut device = st830_device();
        device.apply_raw([(116, 215), (0, 1), (1, 1)].into_iter().collect());

        assert_eq!(
            device
                .attribute(Attribute::CurrentTemperature)
                .and_then(AttributeValue::as_number),
            Some(21.5)
        );
        assert_eq!(
            device
                .attribute(Attribute::HvacMode)
                .and_then(AttributeValue::as_hvac_mode),
            Some(HvacMode::Heat)
        );
    }

    #[test]
    fn partial_decode_keeps_previous_value() {
        let mut device = st830_device();
        device.apply_raw([(116, 215), (0, 1), (1, 1)].into_iter().collect());

        // Next poll drops the temperature datapoint; the decoded value
        // must survive while the raw state is still replaced.
        device.apply_raw([(0, 0)].into_iter().collect());
        assert_eq!(
            device
                .attribute(Attribute::CurrentTemperature)
                .and_then(AttributeValue::as_number),
            Some(21.5)
        );
        assert_eq!(
            device
                .attribute(Attribute::HvacMode)
                .and_then(AttributeValue::as_hvac_mode),
            Some(HvacMode::Off)
        );
        assert_eq!(device.raw_state().get(116), None);
    }
}
