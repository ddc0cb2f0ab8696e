//! Fixed settings and the values that can be changed at runtime over the
//! custom command topic.

use std::time::Duration;

use crate::sensor::ProximityGain;

/// Proximity counts above this wake the display (0 - 1023).
pub const PROXIMITY_THRESHOLD: u16 = 400;
/// Minimum time between two proximity reads, 8 times per second.
pub const POLL_INTERVAL: Duration = Duration::from_millis(125);
/// Period of the slow tick that clears the throttle.
pub const SLOW_TICK_PERIOD: Duration = Duration::from_secs(5);
/// Ambient light is refreshed every 12th slow tick (once a minute).
pub const SLOW_TICKS_PER_REFRESH: u8 = 12;
/// Period of the shared sensor snapshot.
pub const TELEMETRY_PERIOD: Duration = Duration::from_secs(60);

pub const PROXIMITY_GAIN: ProximityGain = ProximityGain::X2;

/// I2C pins, shared with the touch controller.
pub const SDA_PIN: u8 = 19;
pub const SCL_PIN: u8 = 20;

pub const CUSTOM_SUBTOPIC: &str = "custom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Backlight level used in the dark, 10% by default.
    pub brightness_low: u8,
    /// Backlight level otherwise, 75% by default (highest level without flicker on the 7" panel).
    pub brightness_high: u8,
    pub ambient_light_threshold: u16,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            brightness_low: 25,
            brightness_high: 191,
            ambient_light_threshold: 5,
        }
    }
}

impl RuntimeConfig {
    /// Backlight level for a truncated lux value. Equal to the threshold counts as bright.
    pub fn brightness_for(&self, lux: u16) -> u8 {
        if lux < self.ambient_light_threshold {
            self.brightness_low
        } else {
            self.brightness_high
        }
    }

    /// Applies a named command from the custom topic.
    ///
    /// Returns `false` for unknown names, which leave the config untouched.
    pub fn apply_command(&mut self, name: &str, value: &str) -> bool {
        log::info!("Custom MQTT message: {} => {}", name, value);

        match ConfigCommand::parse(name, value) {
            Some(command) => {
                self.apply(command);
                true
            }
            None => {
                log::warn!("Error - Unknown custom MQTT message: {}", name);
                false
            }
        }
    }

    pub fn apply(&mut self, command: ConfigCommand) {
        match command {
            ConfigCommand::BrightnessLow(v) => {
                self.brightness_low = v;
                log::info!("New brightness low value: {}", v);
            }
            ConfigCommand::BrightnessHigh(v) => {
                self.brightness_high = v;
                log::info!("New brightness high value: {}", v);
            }
            ConfigCommand::AmbientLightThreshold(v) => {
                self.ambient_light_threshold = v;
                log::info!("New ambient light threshold value: {}", v);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommand {
    BrightnessLow(u8),
    BrightnessHigh(u8),
    AmbientLightThreshold(u16),
}

impl ConfigCommand {
    /// Values wrap into the field width and non-numeric payloads become 0.
    pub fn parse(name: &str, value: &str) -> Option<Self> {
        let n = parse_int(value);
        match name {
            "brightness_low" => Some(Self::BrightnessLow(n as u8)),
            "brightness_high" => Some(Self::BrightnessHigh(n as u8)),
            "ambient_light_threshold" => Some(Self::AmbientLightThreshold(n as u16)),
            _ => None,
        }
    }
}

/// Lenient decimal parse: optional leading whitespace and sign, then as many
/// digits as there are. No digits gives 0.
pub fn parse_int(value: &str) -> i64 {
    let s = value.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let n = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.wrapping_mul(10).wrapping_add((d - b'0') as i64));

    if negative {
        n.wrapping_neg()
    } else {
        n
    }
}
