//! Proximity wake and ambient light backlight control for an openHASP plate,
//! driven by an APDS-9930 sensor.
//!
//! The host calls [`Controller::on_fast_tick`] from its main loop and
//! [`Controller::on_slow_tick`] every five seconds. A detection wakes the
//! display, sets the backlight to the low or high level depending on ambient
//! light, and publishes `{"proximity":N,"lux":N}` on the `custom` subtopic.

pub mod apds9930;
pub mod config;
pub mod controller;
pub mod inbound;
pub mod scheduler;
pub mod sensor;
pub mod telemetry;
pub mod throttle;

pub use apds9930::Apds9930;
pub use config::{ConfigCommand, RuntimeConfig};
pub use controller::{Controller, Detection};
pub use inbound::{CommandTopics, Inbound, Subscriber};
pub use scheduler::{Due, TickSchedule};
pub use sensor::{ProximityGain, ProximityLightSensor, SensorError, SensorReading};
pub use telemetry::{Dispatcher, ProximityEvent, SnapshotContributor};
