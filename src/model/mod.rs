// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Physical model descriptors and the product registry.
//!
//! Each supported product family ships a [`ModelDescriptor`]: an immutable
//! capability map from [`Attribute`] to decode function and from
//! [`Service`] to encode function, plus feature flags describing what the
//! hardware supports. One descriptor instance is shared read-only by every
//! device of that product.
//!
//! Decode functions are pure: the same raw state always yields the same
//! value, and an empty or partial raw state yields "not reported" rather
//! than an error. Encode functions are the validation boundary: an
//! out-of-range or unsupported desired value yields no datapoints and no
//! network traffic.
//!
//! # Registry
//!
//! [`lookup`] maps a product id to its descriptor. Unknown products fail
//! closed: the device is excluded from the normalized model, never
//! defaulted to a generic descriptor.

mod st830;
mod st1800_hn;

pub use st830::ST830;
pub use st1800_hn::ST1800_HN;

use crate::device::Device;
use crate::error::CodecError;
use crate::types::{Attribute, AttributeValue, CommandValue, Datapoint, RawState, Service};

/// Decode function: raw datapoint map to typed attribute value.
///
/// Returns `None` when the raw state lacks the datapoints the attribute
/// requires (supported but not yet reported).
pub type DecodeFn = fn(&RawState) -> Option<AttributeValue>;

/// Encode function: desired value to ordered datapoint sequence.
///
/// Takes the device as well as the value because some encodings depend on
/// other current raw values (machine-type-dependent fan enumerations).
/// Returns `None` when the value is outside the model's declared range or
/// enumeration.
pub type EncodeFn = fn(&Device, &CommandValue) -> Option<Vec<Datapoint>>;

/// Feature flags for a physical model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
// Independent hardware feature flags; not a state machine.
#[allow(clippy::struct_excessive_bools)]
pub struct Features {
    /// Supports a target temperature setpoint.
    pub target_temperature: bool,
    /// Supports a target humidity setpoint.
    pub target_humidity: bool,
    /// Supports fan speed control.
    pub fan_mode: bool,
    /// Supports preset modes.
    pub preset_mode: bool,
}

/// Immutable per-product bundle of decode/encode functions and feature
/// flags.
///
/// # Examples
///
/// ```
/// use linkedgo_lib::model;
/// use linkedgo_lib::types::{Attribute, RawState};
///
/// let descriptor = model::lookup(model::ST830.product_id).unwrap();
/// let raw: RawState = [(116, 215)].into_iter().collect();
/// let value = descriptor.decode(Attribute::CurrentTemperature, &raw).unwrap();
/// assert_eq!(value.as_number(), Some(21.5));
/// ```
#[derive(Debug)]
pub struct ModelDescriptor {
    /// Product id this descriptor is registered under.
    pub product_id: &'static str,
    /// Human-readable model name.
    pub model: &'static str,
    /// Feature flags for the physical model.
    pub features: Features,
    /// Capability map: attribute to decode function.
    attributes: &'static [(Attribute, DecodeFn)],
    /// Capability map: service to encode function.
    services: &'static [(Service, EncodeFn)],
}

impl ModelDescriptor {
    /// Decodes one attribute from a raw datapoint map.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedAttribute`] if the model declares
    /// no decode function for the attribute, and [`CodecError::NotReported`]
    /// if the raw state lacks the required datapoints.
    pub fn decode(
        &self,
        attribute: Attribute,
        raw: &RawState,
    ) -> Result<AttributeValue, CodecError> {
        let (_, decode) = self
            .attributes
            .iter()
            .find(|(key, _)| *key == attribute)
            .ok_or(CodecError::UnsupportedAttribute {
                model: self.model,
                attribute: attribute.as_str(),
            })?;
        decode(raw).ok_or(CodecError::NotReported {
            attribute: attribute.as_str(),
        })
    }

    /// Encodes a desired value into an ordered datapoint sequence.
    ///
    /// This is a validation boundary, never a protocol call: rejection
    /// produces no datapoints.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::UnsupportedService`] if the model declares no
    /// encode function for the service, and [`CodecError::Rejected`] if the
    /// desired value is outside the declared range or enumeration.
    pub fn encode(
        &self,
        service: Service,
        device: &Device,
        value: &CommandValue,
    ) -> Result<Vec<Datapoint>, CodecError> {
        let (_, encode) = self
            .services
            .iter()
            .find(|(key, _)| *key == service)
            .ok_or(CodecError::UnsupportedService {
                model: self.model,
                service: service.as_str(),
            })?;
        encode(device, value).ok_or(CodecError::Rejected {
            service: service.as_str(),
        })
    }

    /// Returns `true` if the model declares a decode function for the
    /// attribute.
    #[must_use]
    pub fn supports_attribute(&self, attribute: Attribute) -> bool {
        self.attributes.iter().any(|(key, _)| *key == attribute)
    }

    /// Returns `true` if the model declares an encode function for the
    /// service.
    #[must_use]
    pub fn supports_service(&self, service: Service) -> bool {
        self.services.iter().any(|(key, _)| *key == service)
    }

    /// Iterates over the attributes the model declares support for.
    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.attributes.iter().map(|(key, _)| *key)
    }
}

/// All registered model descriptors.
static REGISTRY: &[&ModelDescriptor] = &[&ST830, &ST1800_HN];

/// Looks up the model descriptor for a product id.
///
/// Fails closed: an unknown product id returns `None` and the device is
/// excluded from the normalized model.
#[must_use]
pub fn lookup(product_id: &str) -> Option<&'static ModelDescriptor> {
    REGISTRY
        .iter()
        .find(|descriptor| descriptor.product_id == product_id)
        .copied()
}
