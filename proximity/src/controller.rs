//! The reactive policy: wake the display when something comes close and pick
//! a backlight level from the ambient light.
//!
//! All handlers are called from one scheduler loop and run to completion.
//! The controller owns every piece of mutable state, so a multi-threaded host
//! has to confine it to a single thread or wrap it in a lock.

use std::time::Instant;

use serde_json::{Map, Value};

use crate::config::{
    RuntimeConfig, CUSTOM_SUBTOPIC, POLL_INTERVAL, PROXIMITY_GAIN, PROXIMITY_THRESHOLD, SCL_PIN, SDA_PIN,
    SLOW_TICKS_PER_REFRESH,
};
use crate::sensor::{self, ProximityLightSensor, SensorError, SensorReading};
use crate::telemetry::{backlight_command, Dispatcher, ProximityEvent, SnapshotContributor, WAKE_COMMAND};
use crate::throttle::Throttle;

/// Outcome of a fast tick that reacted to a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub proximity: u16,
    pub lux: u16,
    pub brightness: u8,
}

#[derive(Debug)]
struct PollClock {
    last_poll: Instant,
    slow_ticks: u8,
}

pub struct Controller<S> {
    sensor: S,
    config: RuntimeConfig,
    throttle: Throttle,
    reading: SensorReading,
    clock: PollClock,
}

impl<S: ProximityLightSensor> Controller<S> {
    pub fn new(sensor: S, now: Instant) -> Self {
        Self {
            sensor,
            config: RuntimeConfig::default(),
            throttle: Throttle::default(),
            reading: SensorReading::default(),
            clock: PollClock {
                last_poll: now,
                slow_ticks: 0,
            },
        }
    }

    /// Configures the sensor. Failures leave the controller running with
    /// whatever the sensor managed to enable. Returns `false` when degraded.
    pub fn initialize(&mut self) -> bool {
        // each failed step is already logged
        let complete = sensor::initialize(&mut self.sensor, PROXIMITY_GAIN).is_ok();
        if !complete {
            log::warn!("Sensor setup incomplete, running degraded");
        }
        complete
    }

    /// Loop hook. Polls proximity at most once per poll interval and never
    /// while throttled.
    pub fn on_fast_tick<D: Dispatcher>(&mut self, now: Instant, out: &mut D) -> Option<Detection> {
        if !self.throttle.is_open() || now.saturating_duration_since(self.clock.last_poll) <= POLL_INTERVAL {
            return None;
        }
        self.clock.last_poll = now;

        let proximity = match self.sensor.read_proximity() {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Error reading proximity value: {}", e);
                return None;
            }
        };
        self.reading.proximity = proximity;

        if proximity > PROXIMITY_THRESHOLD {
            Some(self.react(proximity, out))
        } else {
            None
        }
    }

    fn react<D: Dispatcher>(&mut self, proximity: u16, out: &mut D) -> Detection {
        // Engage first so a failure further down still gets the cooldown.
        self.throttle.engage();

        out.dispatch_text_line(WAKE_COMMAND);
        log::info!("Proximity detected. Level: {}", proximity);

        match self.sensor.read_ambient_lux() {
            Ok(lux) => {
                self.reading.ambient_lux = lux;
                log::info!("Ambient light lux: {}", self.reading.lux());
            }
            Err(e) => log::warn!("Error reading ambient light lux value: {}", e),
        }

        let lux = self.reading.lux();
        let brightness = self.config.brightness_for(lux);
        out.dispatch_text_line(&backlight_command(brightness));

        let event = ProximityEvent { proximity, lux };
        match event.to_json() {
            Ok(payload) => out.publish_state_subtopic(CUSTOM_SUBTOPIC, &payload),
            Err(e) => log::error!("Proximity event not published: {}", e),
        }

        Detection {
            proximity,
            lux,
            brightness,
        }
    }

    /// Slow hook. Refreshes ambient light every 12th call and always reopens
    /// the throttle.
    pub fn on_slow_tick(&mut self) {
        self.clock.slow_ticks += 1;
        if self.clock.slow_ticks >= SLOW_TICKS_PER_REFRESH {
            self.clock.slow_ticks = 0;
            match self.read_light() {
                Ok((lux, ch0, ch1)) => {
                    self.reading.ambient_lux = lux;
                    self.reading.ch0 = ch0;
                    self.reading.ch1 = ch1;
                    log::info!("Ambient light lux: {}", self.reading.lux());
                }
                Err(e) => log::warn!("Error reading ambient light lux value: {}", e),
            }
        }

        if self.throttle.release() {
            log::info!("Clear proximity throttle flag");
        }
    }

    fn read_light(&mut self) -> Result<(f32, u16, u16), SensorError> {
        let lux = self.sensor.read_ambient_lux()?;
        let (ch0, ch1) = self.sensor.read_raw_channels()?;
        Ok((lux, ch0, ch1))
    }

    pub fn on_config_command(&mut self, name: &str, value: &str) {
        self.config.apply_command(name, value);
    }

    /// True for the bus pins this controller needs for itself.
    pub fn owns_pin(&self, pin: u8) -> bool {
        matches!(pin, SDA_PIN | SCL_PIN)
    }

    /// Last known lux, truncated. Never touches the bus.
    pub fn lux(&self) -> u16 {
        self.reading.lux()
    }

    pub fn reading(&self) -> &SensorReading {
        &self.reading
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn is_throttled(&self) -> bool {
        !self.throttle.is_open()
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }
}

impl<S: ProximityLightSensor> SnapshotContributor for Controller<S> {
    fn contribute(&self, doc: &mut Map<String, Value>) {
        doc.insert("lux".into(), Value::from(self.lux()));
    }
}
