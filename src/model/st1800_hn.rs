// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ST1800-HN thermostat physical model.
//!
//! Heat-only floor thermostat: power and target temperature, no fan, no
//! humidity setpoint, no presets.
//!
//! # Datapoints
//!
//! | index | meaning                             |
//! |-------|-------------------------------------|
//! | 0     | power switch (0 off, 1 on)          |
//! | 1     | target temperature, tenths of a °C   |
//! | 20    | current temperature, tenths of a °C  |
//! | 21    | current humidity, tenths of a %     |
//! | 23    | standby bitfield                    |

use super::{Features, ModelDescriptor};
use crate::device::Device;
use crate::types::{
    Attribute, AttributeValue, CommandValue, Datapoint, HvacAction, HvacMode, RawState, Service,
};

const MIN_TEMP: f64 = 5.0;
const MAX_TEMP: f64 = 50.0;
const TEMP_STEP: f64 = 0.5;

// Only bit6 is reported on this model.
const STANDBY_BIT: i64 = 0x40;

#[allow(clippy::cast_precision_loss)]
fn tenths(raw: &RawState, index: u32) -> Option<AttributeValue> {
    raw.get(index).map(|v| AttributeValue::Number(v as f64 / 10.0))
}

fn current_temperature(raw: &RawState) -> Option<AttributeValue> {
    tenths(raw, 20)
}

fn current_humidity(raw: &RawState) -> Option<AttributeValue> {
    tenths(raw, 21)
}

fn target_temperature(raw: &RawState) -> Option<AttributeValue> {
    tenths(raw, 1)
}

fn hvac_action(raw: &RawState) -> Option<AttributeValue> {
    let switch = raw.get(0)?;
    let standby = raw.get(23)?;
    let action = match switch {
        0 => HvacAction::Off,
        1 if (standby & STANDBY_BIT) > 0 => HvacAction::Idle,
        1 => HvacAction::Heating,
        _ => return None,
    };
    Some(AttributeValue::HvacAction(action))
}

fn hvac_mode(raw: &RawState) -> Option<AttributeValue> {
    let mode = match raw.get(0)? {
        0 => HvacMode::Off,
        _ => HvacMode::Heat,
    };
    Some(AttributeValue::HvacMode(mode))
}

fn hvac_modes(_raw: &RawState) -> Option<AttributeValue> {
    Some(AttributeValue::HvacModes(vec![HvacMode::Off, HvacMode::Heat]))
}

fn min_temp(_raw: &RawState) -> Option<AttributeValue> {
    Some(AttributeValue::Number(MIN_TEMP))
}

fn max_temp(_raw: &RawState) -> Option<AttributeValue> {
    Some(AttributeValue::Number(MAX_TEMP))
}

fn target_temp_step(_raw: &RawState) -> Option<AttributeValue> {
    Some(AttributeValue::Number(TEMP_STEP))
}

fn set_hvac_mode(_device: &Device, value: &CommandValue) -> Option<Vec<Datapoint>> {
    let CommandValue::HvacMode(mode) = value else {
        return None;
    };
    match mode {
        HvacMode::Off => Some(vec![Datapoint::new(0, 0)]),
        HvacMode::Heat => Some(vec![Datapoint::new(0, 1)]),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn set_temperature(_device: &Device, value: &CommandValue) -> Option<Vec<Datapoint>> {
    let CommandValue::Number(temperature) = value else {
        return None;
    };
    if !(MIN_TEMP..=MAX_TEMP).contains(temperature) {
        return None;
    }
    Some(vec![Datapoint::new(1, (temperature * 10.0).round() as i64)])
}

/// Descriptor for the ST1800-HN, pid `1603bec1cd5903e91603bec1cd599801`.
pub static ST1800_HN: ModelDescriptor = ModelDescriptor {
    product_id: "1603bec1cd5903e91603bec1cd599801",
    model: "ST1800-HN",
    features: Features {
        target_temperature: true,
        target_humidity: false,
        fan_mode: false,
        preset_mode: false,
    },
    attributes: &[
        (Attribute::CurrentTemperature, current_temperature),
        (Attribute::CurrentHumidity, current_humidity),
        (Attribute::TargetTemperature, target_temperature),
        (Attribute::HvacAction, hvac_action),
        (Attribute::HvacMode, hvac_mode),
        (Attribute::HvacModes, hvac_modes),
        (Attribute::MinTemp, min_temp),
        (Attribute::MaxTemp, max_temp),
        (Attribute::TargetTempStep, target_temp_step),
    ],
    services: &[
        (Service::SetHvacMode, set_hvac_mode),
        (Service::SetTemperature, set_temperature),
    ],
};
