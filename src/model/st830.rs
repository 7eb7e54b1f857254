// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ST830 thermostat physical model.
//!
//! Full climate model: heating/cooling/dry/fan-only with target
//! temperature and humidity, machine-type-dependent fan speeds, and a
//! sleep preset.
//!
//! # Datapoints
//!
//! | index | meaning                              |
//! |-------|--------------------------------------|
//! | 0     | power switch (0 off, 1 on)           |
//! | 1     | main mode (0 cool, 1 heat)           |
//! | 2     | machine type (selects fan table)     |
//! | 3     | user mode (3 dry, 7 fan only)        |
//! | 4     | sleep switch                         |
//! | 6     | fan speed                            |
//! | 7     | target temperature, tenths of a °C    |
//! | 8     | target humidity, percent             |
//! | 116   | current temperature, tenths of a °C   |
//! | 117   | current humidity, tenths of a %      |
//! | 130   | standby bitfield                     |

use super::{Features, ModelDescriptor};
use crate::device::Device;
use crate::types::{
    Attribute, AttributeValue, CommandValue, Datapoint, FanMode, HvacAction, HvacMode, PresetMode,
    RawState, Service,
};

const MIN_TEMP: f64 = 5.0;
const MAX_TEMP: f64 = 35.0;
const MIN_HUMIDITY: f64 = 40.0;
const MAX_HUMIDITY: f64 = 75.0;
const TEMP_STEP: f64 = 0.5;

// bit6: cooling standby; bit7: heating standby.
const STANDBY_BITS: i64 = 0xC0;

/// Machine types reporting the alternating-current fan scale.
const ALTERNATING_TYPES: &[i64] = &[0, 3, 4, 5, 15, 18];
/// Machine types reporting the direct-current fan scale.
const DIRECT_TYPES: &[i64] = &[1, 6, 7, 8, 16, 19, 20, 21, 22, 23, 24, 25, 82];
/// Machine type with three fixed fan speeds and no auto.
const FIXED_TYPE: i64 = 80;

/// One fan enumeration table for a machine-type family.
struct FanTable {
    decode: &'static [(i64, FanMode)],
    encode: &'static [(FanMode, i64)],
    modes: &'static [FanMode],
}

static ALTERNATING: FanTable = FanTable {
    decode: &[
        (0, FanMode::Auto),
        (1, FanMode::Low),
        (2, FanMode::Medium),
        (3, FanMode::High),
    ],
    encode: &[
        (FanMode::Auto, 0),
        (FanMode::Low, 1),
        (FanMode::Medium, 2),
        (FanMode::High, 3),
    ],
    modes: &[FanMode::Auto, FanMode::Low, FanMode::Medium, FanMode::High],
};

// The direct-current encode side is not the mirror of its decode side;
// this matches the hardware, which clamps high/top requests.
static DIRECT: FanTable = FanTable {
    decode: &[
        (0, FanMode::Auto),
        (1, FanMode::Focus),
        (2, FanMode::Low),
        (3, FanMode::Medium),
        (4, FanMode::High),
        (5, FanMode::Top),
    ],
    encode: &[
        (FanMode::Auto, 0),
        (FanMode::Focus, 1),
        (FanMode::Low, 2),
        (FanMode::Medium, 3),
        (FanMode::High, 3),
        (FanMode::Top, 2),
    ],
    modes: &[
        FanMode::Auto,
        FanMode::Focus,
        FanMode::Low,
        FanMode::Medium,
        FanMode::High,
        FanMode::Top,
    ],
};

static FIXED: FanTable = FanTable {
    decode: &[(1, FanMode::Low), (2, FanMode::Medium), (3, FanMode::High)],
    encode: &[(FanMode::Low, 1), (FanMode::Medium, 2), (FanMode::High, 3)],
    modes: &[FanMode::Low, FanMode::Medium, FanMode::High],
};

/// Selects the fan enumeration table for a machine type.
///
/// An absent or unrecognized machine type falls back to the alternating
/// table. This is a hardware-family dispatch, keyed by datapoint 2 of the
/// same raw state (decode) or the device's last raw state (encode).
fn fan_table(machine_type: Option<i64>) -> &'static FanTable {
    match machine_type {
        Some(mt) if DIRECT_TYPES.contains(&mt) => &DIRECT,
        Some(mt) if mt == FIXED_TYPE => &FIXED,
        Some(mt) if ALTERNATING_TYPES.contains(&mt) => &ALTERNATING,
        _ => &ALTERNATING,
    }
}

#[allow(clippy::cast_precision_loss)]
fn tenths(raw: &RawState, index: u32) -> Option<AttributeValue> {
    raw.get(index).map(|v| AttributeValue::Number(v as f64 / 10.0))
}

fn current_temperature(raw: &RawState) -> Option<AttributeValue> {
    tenths(raw, 116)
}

fn current_humidity(raw: &RawState) -> Option<AttributeValue> {
    tenths(raw, 117)
}

fn target_temperature(raw: &RawState) -> Option<AttributeValue> {
    tenths(raw, 7)
}

#[allow(clippy::cast_precision_loss)]
fn target_humidity(raw: &RawState) -> Option<AttributeValue> {
    raw.get(8).map(|v| AttributeValue::Number(v as f64))
}

fn fan_mode(raw: &RawState) -> Option<AttributeValue> {
    let machine_type = raw.get(2)?;
    let speed = raw.get(6)?;
    let table = fan_table(Some(machine_type));
    table
        .decode
        .iter()
        .find(|(v, _)| *v == speed)
        .map(|(_, mode)| AttributeValue::FanMode(*mode))
}

fn fan_modes(raw: &RawState) -> Option<AttributeValue> {
    Some(AttributeValue::FanModes(
        fan_table(raw.get(2)).modes.to_vec(),
    ))
}

fn hvac_action(raw: &RawState) -> Option<AttributeValue> {
    let switch = raw.get(0)?;
    let mode = raw.get(1)?;
    let standby = raw.get(130)?;
    let action = match switch {
        0 => HvacAction::Off,
        // Standby bits take priority over the mode-derived action.
        1 if (standby & STANDBY_BITS) > 0 => HvacAction::Idle,
        1 if mode == 0 => HvacAction::Cooling,
        1 if mode == 1 => HvacAction::Heating,
        _ => return None,
    };
    Some(AttributeValue::HvacAction(action))
}

fn hvac_mode(raw: &RawState) -> Option<AttributeValue> {
    if raw.get(0) == Some(0) {
        return Some(AttributeValue::HvacMode(HvacMode::Off));
    }
    match raw.get(3) {
        Some(3) => return Some(AttributeValue::HvacMode(HvacMode::Dry)),
        Some(7) => return Some(AttributeValue::HvacMode(HvacMode::FanOnly)),
        _ => {}
    }
    match raw.get(1) {
        Some(0) => Some(AttributeValue::HvacMode(HvacMode::Cool)),
        Some(1) => Some(AttributeValue::HvacMode(HvacMode::Heat)),
        _ => None,
    }
}

fn hvac_modes(_raw: &RawState) -> Option<AttributeValue> {
    Some(AttributeValue::HvacModes(vec![
        HvacMode::Off,
        HvacMode::Dry,
        HvacMode::FanOnly,
        HvacMode::Cool,
        HvacMode::Heat,
    ]))
}

fn preset_mode(raw: &RawState) -> Option<AttributeValue> {
    let preset = match raw.get(4)? {
        1 => PresetMode::Sleep,
        _ => PresetMode::None,
    };
    Some(AttributeValue::PresetMode(preset))
}

fn preset_modes(_raw: &RawState) -> Option<AttributeValue> {
    Some(AttributeValue::PresetModes(vec![
        PresetMode::None,
        PresetMode::Sleep,
    ]))
}

fn min_temp(_raw: &RawState) -> Option<AttributeValue> {
    Some(AttributeValue::Number(MIN_TEMP))
}

fn max_temp(_raw: &RawState) -> Option<AttributeValue> {
    Some(AttributeValue::Number(MAX_TEMP))
}

fn min_humidity(_raw: &RawState) -> Option<AttributeValue> {
    Some(AttributeValue::Number(MIN_HUMIDITY))
}

fn max_humidity(_raw: &RawState) -> Option<AttributeValue> {
    Some(AttributeValue::Number(MAX_HUMIDITY))
}

fn target_temp_step(_raw: &RawState) -> Option<AttributeValue> {
    Some(AttributeValue::Number(TEMP_STEP))
}

/// Encodes a mode change as switch-then-mode datapoints.
///
/// The power switch must precede the mode datapoint; the device ignores a
/// mode written while the switch is off.
fn set_hvac_mode(_device: &Device, value: &CommandValue) -> Option<Vec<Datapoint>> {
    let CommandValue::HvacMode(mode) = value else {
        return None;
    };
    let datapoints = match mode {
        HvacMode::Off => vec![Datapoint::new(0, 0)],
        HvacMode::Heat => vec![Datapoint::new(0, 1), Datapoint::new(1, 1)],
        HvacMode::Cool => vec![Datapoint::new(0, 1), Datapoint::new(1, 0)],
        HvacMode::Dry => vec![Datapoint::new(0, 1), Datapoint::new(3, 3)],
        HvacMode::FanOnly => vec![Datapoint::new(0, 1), Datapoint::new(3, 7)],
    };
    Some(datapoints)
}

fn set_preset_mode(_device: &Device, value: &CommandValue) -> Option<Vec<Datapoint>> {
    let CommandValue::PresetMode(preset) = value else {
        return None;
    };
    let switch = match preset {
        PresetMode::None => 0,
        PresetMode::Sleep => 1,
    };
    Some(vec![Datapoint::new(4, switch)])
}

fn set_fan_mode(device: &Device, value: &CommandValue) -> Option<Vec<Datapoint>> {
    let CommandValue::FanMode(mode) = value else {
        return None;
    };
    let table = fan_table(device.raw_state().get(2));
    table
        .encode
        .iter()
        .find(|(m, _)| m == mode)
        .map(|(_, v)| vec![Datapoint::new(6, *v)])
}

#[allow(clippy::cast_possible_truncation)]
fn set_humidity(_device: &Device, value: &CommandValue) -> Option<Vec<Datapoint>> {
    let CommandValue::Number(humidity) = value else {
        return None;
    };
    if !(MIN_HUMIDITY..=MAX_HUMIDITY).contains(humidity) {
        return None;
    }
    Some(vec![Datapoint::new(8, humidity.round() as i64)])
}

#[allow(clippy::cast_possible_truncation)]
fn set_temperature(_device: &Device, value: &CommandValue) -> Option<Vec<Datapoint>> {
    let CommandValue::Number(temperature) = value else {
        return None;
    };
    if !(MIN_TEMP..=MAX_TEMP).contains(temperature) {
        return None;
    }
    Some(vec![Datapoint::new(7, (temperature * 10.0).round() as i64)])
}

/// Descriptor for the ST830, pid `160042bed58403e9160042bed5842801`.
pub static ST830: ModelDescriptor = ModelDescriptor {
    product_id: "160042bed58403e9160042bed5842801",
    model: "ST830",
    features: Features {
        target_temperature: true,
        target_humidity: true,
        fan_mode: true,
        preset_mode: true,
    },
    attributes: &[
        (Attribute::CurrentTemperature, current_temperature),
        (Attribute::CurrentHumidity, current_humidity),
        (Attribute::TargetTemperature, target_temperature),
        (Attribute::TargetHumidity, target_humidity),
        (Attribute::FanMode, fan_mode),
        (Attribute::FanModes, fan_modes),
        (Attribute::HvacAction, hvac_action),
        (Attribute::HvacMode, hvac_mode),
        (Attribute::HvacModes, hvac_modes),
        (Attribute::PresetMode, preset_mode),
        (Attribute::PresetModes, preset_modes),
        (Attribute::MinTemp, min_temp),
        (Attribute::MaxTemp, max_temp),
        (Attribute::MinHumidity, min_humidity),
        (Attribute::MaxHumidity, max_humidity),
        (Attribute::TargetTempStep, target_temp_step),
    ],
    services: &[
        (Service::SetHvacMode, set_hvac_mode),
        (Service::SetPresetMode, set_preset_mode),
        (Service::SetFanMode, set_fan_mode),
        (Service::SetHumidity, set_humidity),
        (Service::SetTemperature, set_temperature),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    fn device_with_raw(raw: RawState) -> Device {
        let mut device = Device::new(&ST830, 1, "test", "00:00", "0", true);
        device.apply_raw(raw);
        device
    }

    #[test]
    fn temperature_decodes_from_tenths() {
        let raw: RawState = [(116, 235)].into_iter().collect();
        assert_eq!(
            ST830.decode(Attribute::CurrentTemperature, &raw).unwrap(),
            AttributeValue::Number(23.5)
        );
    }

    #[test]
    fn decode_is_deterministic() {
        let raw: RawState = [(0, 1), (1, 0), (2, 6), (6, 4), (130, 0)].into_iter().collect();
        let first = ST830.decode(Attribute::FanMode, &raw).unwrap();
        let second = ST830.decode(Attribute::FanMode, &raw).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, AttributeValue::FanMode(FanMode::High));
    }

    #[test]
    fn standby_bits_take_priority_over_mode() {
        let heating: RawState = [(0, 1), (1, 1), (130, 0)].into_iter().collect();
        assert_eq!(
            ST830.decode(Attribute::HvacAction, &heating).unwrap(),
            AttributeValue::HvacAction(HvacAction::Heating)
        );

        let cooling_standby: RawState = [(0, 1), (1, 0), (130, 0x40)].into_iter().collect();
        assert_eq!(
            ST830.decode(Attribute::HvacAction, &cooling_standby).unwrap(),
            AttributeValue::HvacAction(HvacAction::Idle)
        );

        let heating_standby: RawState = [(0, 1), (1, 1), (130, 0x80)].into_iter().collect();
        assert_eq!(
            ST830.decode(Attribute::HvacAction, &heating_standby).unwrap(),
            AttributeValue::HvacAction(HvacAction::Idle)
        );

        let off: RawState = [(0, 0), (1, 1), (130, 0xC0)].into_iter().collect();
        assert_eq!(
            ST830.decode(Attribute::HvacAction, &off).unwrap(),
            AttributeValue::HvacAction(HvacAction::Off)
        );
    }

    #[test]
    fn hvac_mode_cascade() {
        let off: RawState = [(0, 0), (1, 1)].into_iter().collect();
        assert_eq!(
            ST830.decode(Attribute::HvacMode, &off).unwrap(),
            AttributeValue::HvacMode(HvacMode::Off)
        );

        let dry: RawState = [(0, 1), (3, 3), (1, 0)].into_iter().collect();
        assert_eq!(
            ST830.decode(Attribute::HvacMode, &dry).unwrap(),
            AttributeValue::HvacMode(HvacMode::Dry)
        );

        let cool: RawState = [(0, 1), (3, 0), (1, 0)].into_iter().collect();
        assert_eq!(
            ST830.decode(Attribute::HvacMode, &cool).unwrap(),
            AttributeValue::HvacMode(HvacMode::Cool)
        );
    }

    #[test]
    fn fan_table_follows_machine_type() {
        // Machine type 3: alternating scale, speed 1 is low.
        let alternating: RawState = [(2, 3), (6, 1)].into_iter().collect();
        assert_eq!(
            ST830.decode(Attribute::FanMode, &alternating).unwrap(),
            AttributeValue::FanMode(FanMode::Low)
        );

        // Machine type 6: direct scale, speed 1 is focus.
        let direct: RawState = [(2, 6), (6, 1)].into_iter().collect();
        assert_eq!(
            ST830.decode(Attribute::FanMode, &direct).unwrap(),
            AttributeValue::FanMode(FanMode::Focus)
        );

        // Machine type 80: fixed scale, speed 1 is low and there is no auto.
        let fixed: RawState = [(2, 80), (6, 1)].into_iter().collect();
        assert_eq!(
            ST830.decode(Attribute::FanMode, &fixed).unwrap(),
            AttributeValue::FanMode(FanMode::Low)
        );
        let fixed_auto: RawState = [(2, 80), (6, 0)].into_iter().collect();
        assert!(ST830.decode(Attribute::FanMode, &fixed_auto).is_err());
    }

    #[test]
    fn unrecognized_machine_type_falls_back_to_alternating() {
        let raw: RawState = [(2, 999), (6, 2)].into_iter().collect();
        assert_eq!(
            ST830.decode(Attribute::FanMode, &raw).unwrap(),
            AttributeValue::FanMode(FanMode::Medium)
        );

        let modes = ST830.decode(Attribute::FanModes, &RawState::new()).unwrap();
        assert_eq!(
            modes,
            AttributeValue::FanModes(vec![
                FanMode::Auto,
                FanMode::Low,
                FanMode::Medium,
                FanMode::High
            ])
        );
    }

    #[test]
    fn fan_encode_uses_cached_machine_type() {
        let direct = device_with_raw([(2, 6)].into_iter().collect());
        let dps = ST830
            .encode(Service::SetFanMode, &direct, &FanMode::Low.into())
            .unwrap();
        assert_eq!(dps, vec![Datapoint::new(6, 2)]);

        let fixed = device_with_raw([(2, 80)].into_iter().collect());
        let dps = ST830
            .encode(Service::SetFanMode, &fixed, &FanMode::Low.into())
            .unwrap();
        assert_eq!(dps, vec![Datapoint::new(6, 1)]);

        // Auto is not in the fixed table; the command is rejected.
        assert!(
            ST830
                .encode(Service::SetFanMode, &fixed, &FanMode::Auto.into())
                .is_err()
        );
    }

    #[test]
    fn mode_encode_orders_switch_before_mode() {
        let device = device_with_raw(RawState::new());
        let dps = ST830
            .encode(Service::SetHvacMode, &device, &HvacMode::Cool.into())
            .unwrap();
        assert_eq!(dps, vec![Datapoint::new(0, 1), Datapoint::new(1, 0)]);

        let dps = ST830
            .encode(Service::SetHvacMode, &device, &HvacMode::Off.into())
            .unwrap();
        assert_eq!(dps, vec![Datapoint::new(0, 0)]);
    }

    #[test]
    fn temperature_encode_validates_range() {
        let device = device_with_raw(RawState::new());
        let dps = ST830
            .encode(Service::SetTemperature, &device, &21.5.into())
            .unwrap();
        assert_eq!(dps, vec![Datapoint::new(7, 215)]);

        assert!(
            ST830
                .encode(Service::SetTemperature, &device, &4.5.into())
                .is_err()
        );
        assert!(
            ST830
                .encode(Service::SetTemperature, &device, &35.5.into())
                .is_err()
        );
    }

    #[test]
    fn humidity_encode_validates_range() {
        let device = device_with_raw(RawState::new());
        let dps = ST830
            .encode(Service::SetHumidity, &device, &55.0.into())
            .unwrap();
        assert_eq!(dps, vec![Datapoint::new(8, 55)]);

        assert!(
            ST830
                .encode(Service::SetHumidity, &device, &39.0.into())
                .is_err()
        );
        assert!(
            ST830
                .encode(Service::SetHumidity, &device, &76.0.into())
                .is_err()
        );
    }

    #[test]
    fn temperature_round_trips_at_half_degree_steps() {
        let device = device_with_raw(RawState::new());
        let mut setpoint = MIN_TEMP;
        while setpoint <= MAX_TEMP {
            let dps = ST830
                .encode(Service::SetTemperature, &device, &setpoint.into())
                .unwrap();
            let raw: RawState = [(7, dps[0].value)].into_iter().collect();
            let decoded = ST830
                .decode(Attribute::TargetTemperature, &raw)
                .unwrap()
                .as_number()
                .unwrap();
            assert!((decoded - setpoint).abs() < f64::EPSILON);
            setpoint += TEMP_STEP;
        }
    }

    #[test]
    fn wrong_command_value_kind_is_rejected() {
        let device = device_with_raw(RawState::new());
        assert!(
            ST830
                .encode(Service::SetTemperature, &device, &HvacMode::Heat.into())
                .is_err()
        );
        assert!(
            ST830
                .encode(Service::SetFanMode, &device, &21.0.into())
                .is_err()
        );
    }
}
