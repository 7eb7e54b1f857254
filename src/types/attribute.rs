// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Attribute and service keys for the capability map.
//!
//! A model descriptor maps each [`Attribute`] to an optional decode
//! function and each [`Service`] to an optional encode function. Lookup is
//! by enum key at dispatch time; a key absent from a model's table means
//! the physical model does not support it.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::modes::{FanMode, HvacAction, HvacMode, PresetMode};

/// A decodable attribute of the normalized climate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Measured ambient temperature in degrees Celsius.
    CurrentTemperature,
    /// Measured relative humidity in percent.
    CurrentHumidity,
    /// Target temperature in degrees Celsius.
    TargetTemperature,
    /// Target relative humidity in percent.
    TargetHumidity,
    /// Active HVAC operating mode.
    HvacMode,
    /// Modes the device can be switched into.
    HvacModes,
    /// What the unit is currently doing.
    HvacAction,
    /// Active fan speed.
    FanMode,
    /// Fan speeds the device accepts (machine-type dependent).
    FanModes,
    /// Active preset.
    PresetMode,
    /// Presets the device accepts.
    PresetModes,
    /// Lower bound of the target temperature range.
    MinTemp,
    /// Upper bound of the target temperature range.
    MaxTemp,
    /// Lower bound of the target humidity range.
    MinHumidity,
    /// Upper bound of the target humidity range.
    MaxHumidity,
    /// Target temperature adjustment step.
    TargetTempStep,
}

/// A control service the caller can invoke on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    /// Switch the HVAC operating mode (also powers the unit on/off).
    SetHvacMode,
    /// Change the target temperature.
    SetTemperature,
    /// Change the target humidity.
    SetHumidity,
    /// Change the fan speed.
    SetFanMode,
    /// Change the preset.
    SetPresetMode,
}

impl Attribute {
    /// Returns the attribute name as used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CurrentTemperature => "current_temperature",
            Self::CurrentHumidity => "current_humidity",
            Self::TargetTemperature => "target_temperature",
            Self::TargetHumidity => "target_humidity",
            Self::HvacMode => "hvac_mode",
            Self::HvacModes => "hvac_modes",
            Self::HvacAction => "hvac_action",
            Self::FanMode => "fan_mode",
            Self::FanModes => "fan_modes",
            Self::PresetMode => "preset_mode",
            Self::PresetModes => "preset_modes",
            Self::MinTemp => "min_temp",
            Self::MaxTemp => "max_temp",
            Self::MinHumidity => "min_humidity",
            Self::MaxHumidity => "max_humidity",
            Self::TargetTempStep => "target_temp_step",
        }
    }
}

impl Service {
    /// Returns the service name as used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SetHvacMode => "set_hvac_mode",
            Self::SetTemperature => "set_temperature",
            Self::SetHumidity => "set_humidity",
            Self::SetFanMode => "set_fan_mode",
            Self::SetPresetMode => "set_preset_mode",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded, typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A numeric value (temperature, humidity, bound, step).
    Number(f64),
    /// An HVAC operating mode.
    HvacMode(HvacMode),
    /// A list of supported HVAC modes.
    HvacModes(Vec<HvacMode>),
    /// The current HVAC action.
    HvacAction(HvacAction),
    /// A fan speed.
    FanMode(FanMode),
    /// A list of supported fan speeds.
    FanModes(Vec<FanMode>),
    /// A preset mode.
    PresetMode(PresetMode),
    /// A list of supported presets.
    PresetModes(Vec<PresetMode>),
}

impl AttributeValue {
    /// Returns the numeric value, if this is a number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the HVAC mode, if this is one.
    #[must_use]
    pub fn as_hvac_mode(&self) -> Option<HvacMode> {
        match self {
            Self::HvacMode(mode) => Some(*mode),
            _ => None,
        }
    }

    /// Returns the HVAC action, if this is one.
    #[must_use]
    pub fn as_hvac_action(&self) -> Option<HvacAction> {
        match self {
            Self::HvacAction(action) => Some(*action),
            _ => None,
        }
    }

    /// Returns the fan mode, if this is one.
    #[must_use]
    pub fn as_fan_mode(&self) -> Option<FanMode> {
        match self {
            Self::FanMode(mode) => Some(*mode),
            _ => None,
        }
    }

    /// Returns the preset mode, if this is one.
    #[must_use]
    pub fn as_preset_mode(&self) -> Option<PresetMode> {
        match self {
            Self::PresetMode(preset) => Some(*preset),
            _ => None,
        }
    }
}

/// The desired value passed to a control service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandValue {
    /// A numeric setpoint (temperature or humidity).
    Number(f64),
    /// A desired HVAC mode.
    HvacMode(HvacMode),
    /// A desired fan speed.
    FanMode(FanMode),
    /// A desired preset.
    PresetMode(PresetMode),
}

impl From<f64> for CommandValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<HvacMode> for CommandValue {
    fn from(mode: HvacMode) -> Self {
        Self::HvacMode(mode)
    }
}

impl From<FanMode> for CommandValue {
    fn from(mode: FanMode) -> Self {
        Self::FanMode(mode)
    }
}

impl From<PresetMode> for CommandValue {
    fn from(preset: PresetMode) -> Self {
        Self::PresetMode(preset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_names_are_stable() {
        assert_eq!(Attribute::CurrentTemperature.as_str(), "current_temperature");
        assert_eq!(Attribute::TargetTempStep.as_str(), "target_temp_step");
        assert_eq!(Service::SetFanMode.as_str(), "set_fan_mode");
    }

    #[test]
    fn attribute_value_accessors() {
        assert_eq!(AttributeValue::Number(21.5).as_number(), Some(21.5));
        assert_eq!(AttributeValue::Number(21.5).as_fan_mode(), None);
        assert_eq!(
            AttributeValue::HvacMode(HvacMode::Heat).as_hvac_mode(),
            Some(HvacMode::Heat)
        );
    }

    #[test]
    fn command_value_from_conversions() {
        assert_eq!(CommandValue::from(21.0), CommandValue::Number(21.0));
        assert_eq!(
            CommandValue::from(FanMode::High),
            CommandValue::FanMode(FanMode::High)
        );
    }

    #[test]
    fn attribute_value_serializes_untagged() {
        let value = AttributeValue::HvacModes(vec![HvacMode::Off, HvacMode::Heat]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"["off","heat"]"#
        );
    }
}
