use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use embedded_hal::pwm::{self, SetDutyCycle};
use embedded_hal::spi::{self, Operation, SpiDevice};
use pico_psg::driver::{PwmConfig, PwmDriver, SpiDacConfig, SpiDacDriver};
use pico_psg::engine::{Engine, EngineConfig};
use pico_psg::PsgError;

/// Shared switch that makes a mock peripheral fail every call
type FaultSwitch = Arc<AtomicBool>;

#[derive(Debug, Default)]
struct MockPwm {
    max: u16,
    duties: Vec<u16>,
    broken: FaultSwitch,
}

impl MockPwm {
    fn with_max(max: u16) -> Self {
        MockPwm {
            max,
            ..Default::default()
        }
    }
}

impl pwm::ErrorType for MockPwm {
    type Error = pwm::ErrorKind;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if self.broken.load(Ordering::Relaxed) {
            return Err(pwm::ErrorKind::Other);
        }
        self.duties.push(duty);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MockSpi {
    words: Vec<u16>,
    broken: FaultSwitch,
}

impl spi::ErrorType for MockSpi {
    type Error = spi::ErrorKind;
}

impl SpiDevice for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        if self.broken.load(Ordering::Relaxed) {
            return Err(spi::ErrorKind::Other);
        }
        for op in operations.iter() {
            if let Operation::Write(bytes) = op {
                assert_eq!(bytes.len(), 2, "one word per frame");
                self.words.push(u16::from_be_bytes([bytes[0], bytes[1]]));
            }
        }
        Ok(())
    }
}

fn config() -> EngineConfig {
    EngineConfig {
        sample_rate: 22_050,
        ..EngineConfig::default()
    }
}

#[test]
fn test_pwm_driver_follows_rendered_output() {
    let pwm = PwmConfig::new(MockPwm::with_max(1000), MockPwm::with_max(1000));
    let (mut psg, mut core) = Engine::offline::<PwmDriver<MockPwm, MockPwm>>(config(), pwm).unwrap();

    // both tone and noise disabled: constant level
    assert!(psg.enqueue(0, 0x08, 0x0F));
    core.run_samples(50);
    let (left, right) = core.shutdown().release();

    // init parks at 0, then one duty per sample, then stop parks at 0 again
    assert_eq!(left.duties.len(), 1 + 50 + 1);
    assert_eq!(left.duties[0], 0);
    assert_eq!(*left.duties.last().unwrap(), 0);
    let level = left.duties[25];
    assert!(level > 500 && level <= 1000, "duty {level}");
    assert_eq!(left.duties[1..51], right.duties[1..51]);
    assert!(left.duties[1..51].iter().all(|&d| d == level));
}

#[test]
fn test_pwm_zero_range_rejected() {
    let pwm = PwmConfig::new(MockPwm::with_max(0), MockPwm::with_max(1000));
    let err = Engine::offline::<PwmDriver<MockPwm, MockPwm>>(config(), pwm).unwrap_err();
    assert!(matches!(err, PsgError::DriverInit(_)));
}

#[test]
fn test_pwm_faults_counted_not_fatal() {
    let left = MockPwm::with_max(255);
    let switch = Arc::clone(&left.broken);
    let pwm = PwmConfig::new(left, MockPwm::with_max(255));
    let (_psg, mut core) = Engine::offline::<PwmDriver<MockPwm, MockPwm>>(config(), pwm).unwrap();
    core.run_samples(10);
    assert_eq!(core.driver().faults(), 0);

    switch.store(true, Ordering::Relaxed);
    core.run_samples(10);
    assert_eq!(core.driver().faults(), 10);
    assert_eq!(core.stats().rendered, 20);

    switch.store(false, Ordering::Relaxed);
    core.run_samples(5);
    assert_eq!(core.driver().faults(), 10);
    let (left, right) = core.shutdown().release();
    assert_eq!(left.duties.len(), 1 + 10 + 5 + 1);
    assert_eq!(right.duties.len(), 1 + 25 + 1);
}

#[test]
fn test_spi_dac_words() {
    let (mut psg, mut core) =
        Engine::offline::<SpiDacDriver<MockSpi>>(config(), SpiDacConfig::new(MockSpi::default()))
            .unwrap();
    assert!(psg.enqueue(0, 0x08, 0x0F));
    core.run_samples(4);
    let words = core.driver().spi().words.clone();
    core.shutdown();

    // shutdown pair at init, zero pair at start
    assert_eq!(&words[..4], &[0x2000, 0xA000, 0x3000, 0xB000]);
    let samples = &words[4..];
    assert_eq!(samples.len(), 8);
    for pair in samples.chunks(2) {
        assert_eq!(pair[0] & 0xF000, 0x3000);
        assert_eq!(pair[1] & 0xF000, 0xB000);
        assert_eq!(pair[0] & 0x0FFF, pair[1] & 0x0FFF);
        assert!(pair[0] & 0x0FFF > 2000);
    }
}

#[test]
fn test_spi_dac_missing_bus_rejected() {
    let spi = MockSpi {
        broken: Arc::new(AtomicBool::new(true)),
        ..Default::default()
    };
    let err = Engine::offline::<SpiDacDriver<MockSpi>>(config(), SpiDacConfig::new(spi)).unwrap_err();
    assert!(matches!(err, PsgError::DriverInit(_)));
}

#[test]
fn test_spi_dac_faults_counted_not_fatal() {
    let spi = MockSpi::default();
    let switch = Arc::clone(&spi.broken);
    let (mut psg, mut core) =
        Engine::offline::<SpiDacDriver<MockSpi>>(config(), SpiDacConfig::new(spi)).unwrap();
    assert!(psg.enqueue(0, 0x08, 0x0F));
    core.run_samples(4);
    assert_eq!(core.driver().faults(), 0);

    switch.store(true, Ordering::Relaxed);
    core.run_samples(6);
    // two transfers per sample, each one failing
    assert_eq!(core.driver().faults(), 12);
    assert_eq!(core.stats().rendered, 10);
    assert_eq!(core.stats().applied, 1);

    switch.store(false, Ordering::Relaxed);
    core.run_samples(1);
    assert_eq!(core.driver().faults(), 12);
    assert_eq!(core.driver().spi().words.len(), 4 + 2 * 4 + 2);
}
