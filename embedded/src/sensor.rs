use anyhow::Result;
use esp_idf_svc::hal::gpio::{
    Gpio19,
    Gpio20,
};
use esp_idf_svc::hal::i2c::{
    I2cConfig,
    I2cDriver,
    I2C0,
};
use esp_idf_svc::hal::prelude::*;
use hasp_proximity::Apds9930;

pub type Sensor = Apds9930<I2cDriver<'static>>;

/// APDS-9930 on SDA 19 / SCL 20, the bus the touch controller also sits on.
pub fn apds9930(i2c0: I2C0, sda: Gpio19, scl: Gpio20) -> Result<Sensor> {
    let config = I2cConfig::new().baudrate(100.kHz().into());
    let i2c = I2cDriver::new(i2c0, sda, scl, &config)?;

    Ok(Apds9930::new(i2c))
}
