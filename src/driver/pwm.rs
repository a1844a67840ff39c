//! PWM output
//!
//! One PWM channel per side, each followed by an RC low-pass. The render
//! tick sets both duty cycles once per sample.

use super::OutputDriver;
use crate::psg::SAMPLE_MAX;
use crate::{PsgError, Result};
use embedded_hal::pwm::SetDutyCycle;

/// Left and right PWM channels, already configured and enabled
#[derive(Debug)]
pub struct PwmConfig<L, R> {
    /// Left channel
    pub left: L,
    /// Right channel
    pub right: R,
}

impl<L, R> PwmConfig<L, R> {
    /// Pair up two channels
    pub fn new(left: L, right: R) -> Self {
        PwmConfig { left, right }
    }
}

/// Stereo PWM output
#[derive(Debug)]
pub struct PwmDriver<L: SetDutyCycle, R: SetDutyCycle> {
    left: L,
    right: R,
    left_max: u16,
    right_max: u16,
    running: bool,
    faults: u32,
}

/// Scale a 12-bit sample to `0..=max_duty`
#[inline]
fn duty(sample: u16, max_duty: u16) -> u16 {
    let sample = sample.min(SAMPLE_MAX) as u32;
    (sample * max_duty as u32 / SAMPLE_MAX as u32) as u16
}

impl<L: SetDutyCycle, R: SetDutyCycle> PwmDriver<L, R> {
    /// Failed duty cycle updates
    pub fn faults(&self) -> u32 {
        self.faults
    }

    /// Left channel
    pub fn left(&self) -> &L {
        &self.left
    }

    /// Right channel
    pub fn right(&self) -> &R {
        &self.right
    }

    /// Give the channels back
    pub fn release(self) -> (L, R) {
        (self.left, self.right)
    }

    fn set(&mut self, left: u16, right: u16) {
        if self.left.set_duty_cycle(duty(left, self.left_max)).is_err() {
            self.faults = self.faults.saturating_add(1);
        }
        if self.right.set_duty_cycle(duty(right, self.right_max)).is_err() {
            self.faults = self.faults.saturating_add(1);
        }
    }
}

impl<L, R> OutputDriver for PwmDriver<L, R>
where
    L: SetDutyCycle + Send + 'static,
    R: SetDutyCycle + Send + 'static,
{
    type Config = PwmConfig<L, R>;

    fn init(config: PwmConfig<L, R>, _sample_rate: u32) -> Result<Self> {
        let left_max = config.left.max_duty_cycle();
        let right_max = config.right.max_duty_cycle();
        if left_max == 0 || right_max == 0 {
            return Err(PsgError::DriverInit(
                "PWM channel reports a zero duty cycle range".into(),
            ));
        }
        let mut driver = PwmDriver {
            left: config.left,
            right: config.right,
            left_max,
            right_max,
            running: false,
            faults: 0,
        };
        if driver.left.set_duty_cycle_fully_off().is_err()
            || driver.right.set_duty_cycle_fully_off().is_err()
        {
            return Err(PsgError::DriverInit("PWM channel rejected duty update".into()));
        }
        Ok(driver)
    }

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
        self.set(0, 0);
    }

    #[inline]
    fn write(&mut self, left: u16, right: u16) {
        if self.running {
            self.set(left, right);
        }
    }
}
