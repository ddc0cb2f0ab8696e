use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("i2c transaction failed: {0:?}")]
    Bus(ErrorKind),

    #[error("unexpected device id 0x{0:02X}")]
    UnexpectedId(u8),
}

/// Proximity LED gain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityGain {
    X1 = 0,
    X2 = 1,
    X4 = 2,
    X8 = 3,
}

/// Last values read from the sensor. Overwritten in place; a failed read
/// leaves the previous value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReading {
    pub proximity: u16,
    pub ambient_lux: f32,
    pub ch0: u16,
    pub ch1: u16,
}

impl SensorReading {
    /// Lux truncated towards zero, as published and compared against the
    /// ambient light threshold.
    pub fn lux(&self) -> u16 {
        self.ambient_lux as u16
    }
}

/// A combined proximity and ambient light sensor.
///
/// Every call is a single blocking bus operation. Configuration steps are
/// separate so that a failing step does not stop the others from running.
pub trait ProximityLightSensor {
    fn init(&mut self) -> Result<(), SensorError>;
    fn set_proximity_gain(&mut self, gain: ProximityGain) -> Result<(), SensorError>;
    fn enable_proximity_sensor(&mut self, interrupts: bool) -> Result<(), SensorError>;
    fn enable_light_sensor(&mut self, interrupts: bool) -> Result<(), SensorError>;

    fn read_proximity(&mut self) -> Result<u16, SensorError>;
    fn read_ambient_lux(&mut self) -> Result<f32, SensorError>;
    fn read_raw_channels(&mut self) -> Result<(u16, u16), SensorError>;

    /// Register address/value pairs for diagnostics.
    fn dump_registers(&mut self) -> Result<Vec<(u8, u8)>, SensorError> {
        Ok(Vec::new())
    }
}

/// Powers up the sensor and starts both engines without interrupts.
///
/// All steps are attempted even if an earlier one fails, leaving the sensor
/// in whatever degraded state the bus allowed. The first failure is returned.
pub fn initialize<S: ProximityLightSensor>(sensor: &mut S, gain: ProximityGain) -> Result<(), SensorError> {
    log::info!("*** APDS-9930 - Proximity Sensor ***");
    let mut first_error = None;

    match sensor.init() {
        Ok(()) => log::info!("APDS-9930 initialization complete"),
        Err(e) => {
            log::error!("Something went wrong during APDS-9930 init: {}", e);
            first_error = first_error.or(Some(e));
        }
    }

    if let Err(e) = sensor.set_proximity_gain(gain) {
        log::error!("Something went wrong trying to set proximity gain: {}", e);
        first_error = first_error.or(Some(e));
    }

    match sensor.enable_proximity_sensor(false) {
        Ok(()) => log::info!("Proximity sensor is now running"),
        Err(e) => {
            log::error!("Something went wrong during proximity sensor init: {}", e);
            first_error = first_error.or(Some(e));
        }
    }

    match sensor.enable_light_sensor(false) {
        Ok(()) => log::info!("Light sensor is now running"),
        Err(e) => {
            log::error!("Something went wrong during light sensor init: {}", e);
            first_error = first_error.or(Some(e));
        }
    }

    match sensor.dump_registers() {
        Ok(regs) => {
            for (reg, val) in regs {
                log::debug!("{:02X}: 0x{:02X}", reg, val);
            }
        }
        Err(e) => log::debug!("Register dump failed: {}", e),
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Steps {
        fail_init: bool,
        calls: Vec<&'static str>,
    }

    impl ProximityLightSensor for Steps {
        fn init(&mut self) -> Result<(), SensorError> {
            self.calls.push("init");
            if self.fail_init {
                Err(SensorError::UnexpectedId(0xFF))
            } else {
                Ok(())
            }
        }

        fn set_proximity_gain(&mut self, _gain: ProximityGain) -> Result<(), SensorError> {
            self.calls.push("gain");
            Err(SensorError::Bus(ErrorKind::Other))
        }

        fn enable_proximity_sensor(&mut self, _interrupts: bool) -> Result<(), SensorError> {
            self.calls.push("proximity");
            Ok(())
        }

        fn enable_light_sensor(&mut self, _interrupts: bool) -> Result<(), SensorError> {
            self.calls.push("light");
            Ok(())
        }

        fn read_proximity(&mut self) -> Result<u16, SensorError> {
            Ok(0)
        }

        fn read_ambient_lux(&mut self) -> Result<f32, SensorError> {
            Ok(0.0)
        }

        fn read_raw_channels(&mut self) -> Result<(u16, u16), SensorError> {
            Ok((0, 0))
        }
    }

    #[test]
    fn initialize_runs_every_step_after_failures() {
        let mut sensor = Steps { fail_init: true, ..Default::default() };

        let result = initialize(&mut sensor, ProximityGain::X2);

        assert_eq!(sensor.calls, vec!["init", "gain", "proximity", "light"]);
        assert_eq!(result, Err(SensorError::UnexpectedId(0xFF)));
    }

    #[test]
    fn initialize_reports_later_failure() {
        let mut sensor = Steps::default();

        let result = initialize(&mut sensor, ProximityGain::X2);

        assert_eq!(result, Err(SensorError::Bus(ErrorKind::Other)));
    }

    #[test]
    fn lux_truncates() {
        let reading = SensorReading { ambient_lux: 3.9, ..Default::default() };
        assert_eq!(reading.lux(), 3);

        let reading = SensorReading { ambient_lux: -1.0, ..Default::default() };
        assert_eq!(reading.lux(), 0);
    }
}
