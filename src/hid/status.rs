use std::fmt;

use serde::{Deserialize, Serialize};

/// Request report: ID 0x21, command 0xFF, subcommand 0x05, zero padded to 20 bytes
pub const BATTERY_REQUEST: [u8; 20] = [
    0x21, 0xFF, 0x05, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Bytes read back per attempt
pub const RESPONSE_LEN: usize = 8;

/// Offsets inside the response report
pub const CHARGE_STATE_OFFSET: usize = 3;
pub const MAGNITUDE_OFFSET: usize = 4;

/// Charge-state codes
pub const STATE_DISCHARGING_LOW: u8 = 0x0e;
pub const STATE_DISCHARGING_HIGH: u8 = 0x0f;
pub const STATE_CHARGING: u8 = 0x10;
pub const STATE_CHARGING_ALT: u8 = 0x11;

/// "No valid reading" marker used by the variant B firmware table
pub const RAW_UNKNOWN: u8 = 255;
/// Variant B charging values; above 100 on purpose, they are not percentages
pub const RAW_CHARGING_LOW: u8 = 200;
pub const RAW_CHARGING: u8 = 199;

/// Which firmware encoding the headset speaks.
///
/// The two device generations disagree on how byte 3 and byte 4 of the
/// response map to a charge level, so a monitor is configured with exactly
/// one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVariant {
    /// Charge state in byte 3, magnitude always in byte 4
    #[default]
    A,
    /// Magnitude in byte 4, or byte 3 when byte 4 is zero
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// 0-100
    Percent(u8),
    /// Charging, firmware does not report a usable level
    Charging,
    /// Sentinel: no valid reading
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    pub level: Level,
    pub charging: bool,
    pub present: bool,
}

impl BatteryStatus {
    /// Nothing answered the battery query.
    pub const fn inactive() -> Self {
        Self {
            level: Level::Unknown,
            charging: false,
            present: false,
        }
    }

    fn reading(level: Level, charging: bool) -> Self {
        match level {
            Level::Unknown => Self::inactive(),
            _ => Self {
                level,
                charging,
                present: true,
            },
        }
    }

    pub fn percentage(&self) -> Option<u8> {
        match (self.present, self.level) {
            (true, Level::Percent(p)) => Some(p),
            _ => None,
        }
    }

    /// A status the poll loop can stop on.
    pub fn is_valid(&self) -> bool {
        self.present && self.level != Level::Unknown
    }
}

impl Default for BatteryStatus {
    fn default() -> Self {
        Self::inactive()
    }
}

/// Text shown by the presentation layer.
impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.present {
            return f.write_str("Headphones: Inactive");
        }
        let state = if self.charging { "Charging" } else { "Active" };
        match self.level {
            Level::Percent(p) => write!(f, "Headphones: {}\nBattery: {}%", state, p),
            Level::Charging => write!(f, "Headphones: {}", state),
            Level::Unknown => f.write_str("Headphones: Inactive"),
        }
    }
}

/// Deciphers a battery response report
///
/// Response format (8 bytes):
/// byte[0]   = report ID echo
/// byte[3]   = charge state (0x0e low range, 0x0f high range, 0x10/0x11 charging)
/// byte[4]   = magnitude fed into the step table
///
/// Reports too short to carry byte 4 decode as inactive.
pub fn decode(buffer: &[u8], variant: ProtocolVariant) -> BatteryStatus {
    if buffer.len() <= MAGNITUDE_OFFSET {
        return BatteryStatus::inactive();
    }
    let state = buffer[CHARGE_STATE_OFFSET];
    let value = buffer[MAGNITUDE_OFFSET];

    match variant {
        ProtocolVariant::A => decode_a(state, value),
        ProtocolVariant::B => decode_b(state, value),
    }
}

fn decode_a(state: u8, value: u8) -> BatteryStatus {
    let charging = state == STATE_CHARGING || state == STATE_CHARGING_ALT;
    BatteryStatus::reading(Level::Percent(percentage_a(state, value)), charging)
}

/// Variant A table. Unrecognised states read as full.
pub fn percentage_a(state: u8, value: u8) -> u8 {
    match state {
        STATE_DISCHARGING_LOW => match value {
            0..=89 => 10,
            90..=119 => 15,
            120..=148 => 20,
            149..=159 => 25,
            160..=169 => 30,
            170..=179 => 35,
            180..=189 => 40,
            190..=199 => 45,
            200..=209 => 50,
            210..=219 => 55,
            220..=239 => 60,
            _ => 65,
        },
        STATE_DISCHARGING_HIGH => match value {
            0..=19 => 70,
            20..=49 => 75,
            50..=69 => 80,
            70..=99 => 85,
            100..=119 => 90,
            120..=129 => 95,
            _ => 100,
        },
        _ => 100,
    }
}

fn decode_b(state: u8, value: u8) -> BatteryStatus {
    match decode_raw_b(state, value) {
        RAW_CHARGING | RAW_CHARGING_LOW => BatteryStatus::reading(Level::Charging, true),
        RAW_UNKNOWN => BatteryStatus::inactive(),
        p => BatteryStatus::reading(Level::Percent(p), false),
    }
}

/// Variant B table as the firmware defines it, sentinels included.
///
/// Returns 0-100, [`RAW_CHARGING`], [`RAW_CHARGING_LOW`] or [`RAW_UNKNOWN`].
pub fn decode_raw_b(state: u8, value: u8) -> u8 {
    let magnitude = if value != 0 { value } else { state };

    match state {
        STATE_CHARGING => {
            if magnitude <= 11 {
                RAW_CHARGING_LOW
            } else {
                RAW_CHARGING
            }
        }
        STATE_DISCHARGING_HIGH => match magnitude {
            130.. => 100,
            120..=129 => 95,
            100..=119 => 90,
            70..=99 => 85,
            50..=69 => 80,
            20..=49 => 75,
            1..=19 => 70,
            0 => RAW_UNKNOWN,
        },
        STATE_DISCHARGING_LOW => match magnitude {
            241.. => 65,
            220..=240 => 60,
            208..=219 => 55,
            200..=207 => 50,
            190..=199 => 45,
            180..=189 => 40,
            169..=179 => 35,
            159..=168 => 30,
            148..=158 => 25,
            119..=147 => 20,
            90..=118 => 15,
            0..=89 => 10,
        },
        _ => RAW_UNKNOWN,
    }
}

/// Dash separated hex, e.g. `21-00-00-0E`.
pub fn format_report(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join("-")
}
