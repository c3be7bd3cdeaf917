//! The digital input's frequency meter.
//!
//! In measure mode the FPGA times the logic input against a 50 MHz reference
//! and reports one period and one high time per measurement, using the same
//! ready/acknowledge handshake as the capture units.

use crate::acquisition::acknowledge;
use crate::interface::Interface;
use crate::low_level::LowLevel;
use crate::registers::{Register, CTRL_START};

/// Frequency of the meter's reference clock.
pub const REFERENCE_HZ: u32 = 50_000_000;

/// Length of one reference tick in nanoseconds.
pub const TICK_NS: u32 = 1_000_000_000 / REFERENCE_HZ;

/// One frequency meter reading.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Measurement {
    pub frequency_hz: u32,
    pub duty_percent: u32,
    pub high_time_ns: u32,
    pub low_time_ns: u32,
}

impl Measurement {
    /// Converts raw reference-tick counts. A zero period, which the meter
    /// reports when the input isn't toggling, gives an all-zero reading.
    pub fn from_ticks(period: u32, high: u32) -> Self {
        if period == 0 {
            return Self::default();
        }
        Self {
            frequency_hz: REFERENCE_HZ / period,
            duty_percent: (u64::from(high) * 100 / u64::from(period)) as u32,
            high_time_ns: high.wrapping_mul(TICK_NS),
            low_time_ns: period.saturating_sub(high).wrapping_mul(TICK_NS),
        }
    }
}

pub struct FrequencyMeter<I: Interface> {
    ll: LowLevel<I>,
    running: bool,
}

impl<I: Interface> FrequencyMeter<I> {
    pub fn new(ei: I) -> Self {
        Self {
            ll: LowLevel::new(ei),
            running: false,
        }
    }

    pub fn take_interface(self) -> I {
        self.ll.take_interface()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) -> Result<(), I::Error> {
        self.running = true;
        self.ll.wr32(Register::DIGITAL_CONTROL, CTRL_START)
    }

    pub fn stop(&mut self) -> Result<(), I::Error> {
        self.running = false;
        self.ll.wr32(Register::DIGITAL_CONTROL, 0)
    }

    /// Returns the latest reading if the meter has one ready, acknowledging
    /// it so the meter can take the next.
    pub fn poll(&mut self) -> Result<Option<Measurement>, I::Error> {
        if !self.running || !self.ll.ready(Register::DIGITAL_STATUS)? {
            return Ok(None);
        }
        let period = self.ll.rd32(Register::DIGITAL_PERIOD)?;
        let high = self.ll.rd32(Register::DIGITAL_HIGH_TIME)?;
        acknowledge(&mut self.ll, Register::DIGITAL_CONTROL)?;
        log::trace!("meter: period {} high {}", period, high);
        Ok(Some(Measurement::from_ticks(period, high)))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::interface::testing::{MockInterface, MockInterfaceCall};
    use crate::registers::STATUS_READY;
    use std::vec;

    #[test]
    fn test_from_ticks() {
        assert_eq!(
            Measurement::from_ticks(50_000, 12_500),
            Measurement {
                frequency_hz: 1000,
                duty_percent: 25,
                high_time_ns: 250_000,
                low_time_ns: 750_000,
            }
        );
        assert_eq!(Measurement::from_ticks(0, 99), Measurement::default());
        // A high time longer than the period is a glitch, not a panic.
        assert_eq!(Measurement::from_ticks(10, 20).low_time_ns, 0);
        // Large counts mustn't overflow the duty calculation.
        let big = Measurement::from_ticks(u32::max_value(), u32::max_value() / 2);
        assert_eq!(big.duty_percent, 49);
    }

    #[test]
    fn test_poll() {
        let mut mock = MockInterface::new();
        mock.setup_word(0x14, STATUS_READY);
        mock.setup_word(0x18, 200);
        mock.setup_word(0x1c, 50);
        let mut meter = FrequencyMeter::new(mock);
        assert_eq!(meter.poll(), Ok(None));

        meter.start().unwrap();
        let m = meter.poll().unwrap().unwrap();
        assert_eq!(m.frequency_hz, 250_000);
        assert_eq!(m.duty_percent, 25);
        assert_eq!(m.high_time_ns, 1000);
        assert_eq!(m.low_time_ns, 3000);

        meter.stop().unwrap();
        assert_eq!(
            meter.take_interface().calls(),
            vec![
                MockInterfaceCall::Write(0x10, 1),
                MockInterfaceCall::Read(0x14),
                MockInterfaceCall::Read(0x18),
                MockInterfaceCall::Read(0x1c),
                MockInterfaceCall::Write(0x10, 3),
                MockInterfaceCall::Barrier,
                MockInterfaceCall::Write(0x10, 1),
                MockInterfaceCall::Write(0x10, 0),
            ]
        );
    }
}
