//! Broadcom APDS-9930 digital proximity and ambient light sensor over I2C.

use embedded_hal::i2c::{Error as _, I2c};

use crate::sensor::{ProximityGain, ProximityLightSensor, SensorError};

pub const ADDRESS: u8 = 0x39;

const ID_VALUES: [u8; 2] = [0x39, 0x12];

// Command byte: register access, repeated byte or auto-increment.
const REPEATED_BYTE: u8 = 0x80;
const AUTO_INCREMENT: u8 = 0xA0;

mod reg {
    pub const ENABLE: u8 = 0x00;
    pub const ATIME: u8 = 0x01;
    pub const PTIME: u8 = 0x02;
    pub const WTIME: u8 = 0x03;
    pub const AILTL: u8 = 0x04;
    pub const AIHTL: u8 = 0x06;
    pub const PILTL: u8 = 0x08;
    pub const PIHTL: u8 = 0x0A;
    pub const PERS: u8 = 0x0C;
    pub const CONFIG: u8 = 0x0D;
    pub const PPULSE: u8 = 0x0E;
    pub const CONTROL: u8 = 0x0F;
    pub const ID: u8 = 0x12;
    pub const CH0DATAL: u8 = 0x14;
    pub const CH1DATAL: u8 = 0x16;
    pub const PDATAL: u8 = 0x18;
    pub const POFFSET: u8 = 0x1E;
}

mod enable {
    pub const PON: u8 = 0x01;
    pub const AEN: u8 = 0x02;
    pub const PEN: u8 = 0x04;
    pub const AIEN: u8 = 0x10;
    pub const PIEN: u8 = 0x20;
}

const DEFAULT_ATIME: u8 = 0xED;
const DEFAULT_WTIME: u8 = 0xFF;
const DEFAULT_PTIME: u8 = 0xFF;
const DEFAULT_PPULSE: u8 = 0x08;
const DEFAULT_POFFSET: u8 = 0;
const DEFAULT_CONFIG: u8 = 0;
const DEFAULT_PILT: u16 = 0;
const DEFAULT_PIHT: u16 = 50;
const DEFAULT_AILT: u16 = 0xFFFF;
const DEFAULT_AIHT: u16 = 0;
const DEFAULT_PERS: u8 = 0x22;

// CONTROL: 100 mA LED drive, CH1 diode, 8x proximity gain, 1x ALS gain.
const LED_DRIVE_100MA: u8 = 0;
const PDIODE_CH1: u8 = 2;
const DEFAULT_CONTROL: u8 = (LED_DRIVE_100MA << 6) | (PDIODE_CH1 << 4) | ((ProximityGain::X8 as u8) << 2) | AlsGain::X1 as u8;

// Lux equation coefficients from the datasheet.
const GA: f32 = 0.49;
const B: f32 = 1.862;
const C: f32 = 0.746;
const D: f32 = 1.291;
const DF: f32 = 52.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlsGain {
    X1 = 0,
    X8 = 1,
    X16 = 2,
    X120 = 3,
}

impl AlsGain {
    fn multiplier(self) -> f32 {
        match self {
            AlsGain::X1 => 1.0,
            AlsGain::X8 => 8.0,
            AlsGain::X16 => 16.0,
            AlsGain::X120 => 120.0,
        }
    }
}

/// Converts raw channel counts to lux for the given integration time and gain.
pub fn counts_to_lux(ch0: u16, ch1: u16, atime: u8, gain: AlsGain) -> f32 {
    let ch0 = ch0 as f32;
    let ch1 = ch1 as f32;

    let iac = (ch0 - B * ch1).max(C * ch0 - D * ch1).max(0.0);
    let integration_ms = 2.73 * (256.0 - atime as f32);
    let lpc = GA * DF / (integration_ms * gain.multiplier());

    iac * lpc
}

pub struct Apds9930<I> {
    i2c: I,
    address: u8,
    als_gain: AlsGain,
}

impl<I: I2c> Apds9930<I> {
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            address: ADDRESS,
            als_gain: AlsGain::X1,
        }
    }

    pub fn release(self) -> I {
        self.i2c
    }

    pub fn set_ambient_light_gain(&mut self, gain: AlsGain) -> Result<(), SensorError> {
        let control = self.read_byte(reg::CONTROL)?;
        self.write_byte(reg::CONTROL, (control & !0x03) | gain as u8)?;
        self.als_gain = gain;
        Ok(())
    }

    fn set_enable_bits(&mut self, bits: u8, on: bool) -> Result<(), SensorError> {
        let current = self.read_byte(reg::ENABLE)?;
        let next = if on { current | bits } else { current & !bits };
        self.write_byte(reg::ENABLE, next)
    }

    fn read_byte(&mut self, register: u8) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(self.address, &[REPEATED_BYTE | register], &mut buf)
            .map_err(|e| SensorError::Bus(e.kind()))?;
        Ok(buf[0])
    }

    fn read_word(&mut self, register: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[AUTO_INCREMENT | register], &mut buf)
            .map_err(|e| SensorError::Bus(e.kind()))?;
        Ok(u16::from_le_bytes(buf))
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[REPEATED_BYTE | register, value])
            .map_err(|e| SensorError::Bus(e.kind()))
    }

    fn write_word(&mut self, register: u8, value: u16) -> Result<(), SensorError> {
        let [lo, hi] = value.to_le_bytes();
        self.i2c
            .write(self.address, &[AUTO_INCREMENT | register, lo, hi])
            .map_err(|e| SensorError::Bus(e.kind()))
    }
}

impl<I: I2c> ProximityLightSensor for Apds9930<I> {
    fn init(&mut self) -> Result<(), SensorError> {
        let id = self.read_byte(reg::ID)?;
        if !ID_VALUES.contains(&id) {
            return Err(SensorError::UnexpectedId(id));
        }

        self.write_byte(reg::ENABLE, 0)?;
        self.write_byte(reg::ATIME, DEFAULT_ATIME)?;
        self.write_byte(reg::WTIME, DEFAULT_WTIME)?;
        self.write_byte(reg::PTIME, DEFAULT_PTIME)?;
        self.write_byte(reg::PPULSE, DEFAULT_PPULSE)?;
        self.write_byte(reg::POFFSET, DEFAULT_POFFSET)?;
        self.write_byte(reg::CONFIG, DEFAULT_CONFIG)?;
        self.write_byte(reg::CONTROL, DEFAULT_CONTROL)?;
        self.als_gain = AlsGain::X1;
        self.write_word(reg::PILTL, DEFAULT_PILT)?;
        self.write_word(reg::PIHTL, DEFAULT_PIHT)?;
        self.write_word(reg::AILTL, DEFAULT_AILT)?;
        self.write_word(reg::AIHTL, DEFAULT_AIHT)?;
        self.write_byte(reg::PERS, DEFAULT_PERS)
    }

    fn set_proximity_gain(&mut self, gain: ProximityGain) -> Result<(), SensorError> {
        let control = self.read_byte(reg::CONTROL)?;
        self.write_byte(reg::CONTROL, (control & !0x0C) | ((gain as u8) << 2))
    }

    fn enable_proximity_sensor(&mut self, interrupts: bool) -> Result<(), SensorError> {
        self.set_enable_bits(enable::PIEN, interrupts)?;
        self.set_enable_bits(enable::PON | enable::PEN, true)
    }

    fn enable_light_sensor(&mut self, interrupts: bool) -> Result<(), SensorError> {
        self.set_enable_bits(enable::AIEN, interrupts)?;
        self.set_enable_bits(enable::PON | enable::AEN, true)
    }

    fn read_proximity(&mut self) -> Result<u16, SensorError> {
        self.read_word(reg::PDATAL)
    }

    fn read_ambient_lux(&mut self) -> Result<f32, SensorError> {
        let (ch0, ch1) = self.read_raw_channels()?;
        Ok(counts_to_lux(ch0, ch1, DEFAULT_ATIME, self.als_gain))
    }

    fn read_raw_channels(&mut self) -> Result<(u16, u16), SensorError> {
        let ch0 = self.read_word(reg::CH0DATAL)?;
        let ch1 = self.read_word(reg::CH1DATAL)?;
        Ok((ch0, ch1))
    }

    fn dump_registers(&mut self) -> Result<Vec<(u8, u8)>, SensorError> {
        let mut regs = Vec::new();
        // 0x10 and 0x11 are reserved
        for register in (0x00..=0x19).filter(|r| *r != 0x10 && *r != 0x11) {
            regs.push((register, self.read_byte(register)?));
        }
        regs.push((reg::POFFSET, self.read_byte(reg::POFFSET)?));
        Ok(regs)
    }
}
