//! Turning a digital capture into bits or bytes under one of the supported
//! encoding schemes.

pub mod line_codes;
pub mod uart;

use crate::clock::{ClockSelection, SAMPLE_RATE_HZ};
use crate::error::DecodeError;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Upper bound on bits recovered from one capture.
pub const MAX_DECODED_BITS: usize = 24;

/// Capacity of the byte view of a result. UART decoding stops after
/// [`uart::MAX_FRAMES`] bytes, and the line codes pack at most three.
pub const MAX_DECODED_BYTES: usize = 16;

#[derive(TryFromPrimitive, IntoPrimitive, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum EncodingScheme {
    NrzL = 0,
    Rz = 1,
    NrzI = 2,
    Manchester = 3,
    DiffManchester = 4,
    Uart = 5,
}

impl EncodingScheme {
    pub const ALL: [EncodingScheme; 6] = [
        EncodingScheme::NrzL,
        EncodingScheme::Rz,
        EncodingScheme::NrzI,
        EncodingScheme::Manchester,
        EncodingScheme::DiffManchester,
        EncodingScheme::Uart,
    ];

    /// The label a successful result carries.
    pub const fn label(self) -> &'static str {
        match self {
            EncodingScheme::NrzL => "NRZ-L",
            EncodingScheme::Rz => "RZ",
            EncodingScheme::NrzI => "NRZ-I",
            EncodingScheme::Manchester => "Manchester",
            EncodingScheme::DiffManchester => "Diff. Manch",
            EncodingScheme::Uart => "UART",
        }
    }

    /// The selector caption.
    pub const fn name(self) -> &'static str {
        match self {
            EncodingScheme::NrzL => "[NRZ-L]",
            EncodingScheme::Rz => "[RZ]",
            EncodingScheme::NrzI => "[NRZ-I]",
            EncodingScheme::Manchester => "[Manchester]",
            EncodingScheme::DiffManchester => "[Diff. Manch]",
            EncodingScheme::Uart => "[UART]",
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    /// UART is timed by a baud rate, everything else by a bit clock
    /// frequency.
    pub const fn uses_baud(self) -> bool {
        match self {
            EncodingScheme::Uart => true,
            _ => false,
        }
    }

    /// Runs this scheme's decoder. `first_edge` is ignored by UART, which
    /// finds its own start condition.
    pub fn decode(
        self,
        samples: &[bool],
        timing: BitTiming,
        first_edge: Option<usize>,
    ) -> DecodeResult {
        match self {
            EncodingScheme::NrzL => line_codes::nrz_l(samples, timing, first_edge),
            EncodingScheme::Rz => line_codes::rz(samples, timing, first_edge),
            EncodingScheme::NrzI => line_codes::nrz_i(samples, timing, first_edge),
            EncodingScheme::Manchester => line_codes::manchester(samples, timing, first_edge),
            EncodingScheme::DiffManchester => {
                line_codes::diff_manchester(samples, timing, first_edge)
            }
            EncodingScheme::Uart => uart::decode(samples, timing),
        }
    }
}

impl Default for EncodingScheme {
    fn default() -> Self {
        EncodingScheme::NrzL
    }
}

/// The clock a capture is decoded against.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BitTiming {
    pub sample_rate_hz: u32,
    pub rate_hz: u32,
    pub bit_width: u32,
}

impl BitTiming {
    pub const fn new(rate_hz: u32, sample_rate_hz: u32) -> Self {
        Self {
            sample_rate_hz,
            rate_hz,
            bit_width: crate::clock::bit_width(rate_hz, sample_rate_hz),
        }
    }

    /// Timing for a capture taken by the digital unit.
    pub const fn for_selection(sel: ClockSelection) -> Self {
        Self::new(sel.rate_hz(), SAMPLE_RATE_HZ)
    }

    pub(crate) const fn width(&self) -> usize {
        self.bit_width as usize
    }
}

impl From<ClockSelection> for BitTiming {
    fn from(sel: ClockSelection) -> Self {
        Self::for_selection(sel)
    }
}

/// The outcome of one decode attempt.
///
/// A result is complete when it's returned. On failure it still holds
/// whatever was decoded before the fault, and its label is the failure text
/// rather than the scheme name, which is what the instrument displays.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct DecodeResult {
    label: &'static str,
    sample_rate_hz: u32,
    bit_width: u32,
    baud_rate_est: u32,
    bits: heapless::Vec<bool, MAX_DECODED_BITS>,
    bytes: heapless::Vec<u8, MAX_DECODED_BYTES>,
    is_uart_data: bool,
    error: Option<DecodeError>,
}

impl DecodeResult {
    /// The scheme name on success, the failure text otherwise.
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// The nominal rate the capture was decoded at.
    pub fn baud_rate_est(&self) -> u32 {
        self.baud_rate_est
    }

    /// Individual bits in decode order. Empty for UART results, which only
    /// have bytes.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// For line codes, the bits packed most significant first, with any
    /// trailing partial byte zero-padded. For UART, the received bytes.
    pub fn decoded_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn num_bits_decoded(&self) -> usize {
        if self.is_uart_data {
            self.bytes.len() * 8
        } else {
            self.bits.len()
        }
    }

    pub fn is_uart_data(&self) -> bool {
        self.is_uart_data
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    pub fn error(&self) -> Option<DecodeError> {
        self.error
    }
}

/// Accumulates a result while a decoder runs.
pub(crate) struct Decoded {
    timing: BitTiming,
    bits: heapless::Vec<bool, MAX_DECODED_BITS>,
    bytes: heapless::Vec<u8, MAX_DECODED_BYTES>,
    uart: bool,
}

impl Decoded {
    pub(crate) fn line_code(timing: BitTiming) -> Self {
        Self {
            timing,
            bits: heapless::Vec::new(),
            bytes: heapless::Vec::new(),
            uart: false,
        }
    }

    pub(crate) fn uart(timing: BitTiming) -> Self {
        Self {
            uart: true,
            ..Self::line_code(timing)
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.bits.len() >= MAX_DECODED_BITS
    }

    pub(crate) fn bytes_len(&self) -> usize {
        self.bytes.len()
    }

    /// Appends one bit, also packing it into the byte view.
    pub(crate) fn push_bit(&mut self, bit: bool) {
        let n = self.bits.len();
        if self.bits.push(bit).is_err() {
            return;
        }
        if n % 8 == 0 && self.bytes.push(0).is_err() {
            return;
        }
        if bit {
            if let Some(b) = self.bytes.get_mut(n / 8) {
                *b |= 1 << (7 - n % 8);
            }
        }
    }

    /// Bits decoded so far, counting eight per UART byte.
    pub(crate) fn num_bits(&self) -> usize {
        if self.uart {
            self.bytes.len() * 8
        } else {
            self.bits.len()
        }
    }

    pub(crate) fn push_byte(&mut self, byte: u8) {
        let _ = self.bytes.push(byte);
    }

    pub(crate) fn succeed(self, scheme: EncodingScheme) -> DecodeResult {
        self.finish(scheme.label(), None)
    }

    pub(crate) fn fail(self, err: DecodeError) -> DecodeResult {
        log::debug!("decode failed after {} bits: {}", self.num_bits(), err);
        self.finish(err.label(), Some(err))
    }

    fn finish(self, label: &'static str, error: Option<DecodeError>) -> DecodeResult {
        DecodeResult {
            label,
            sample_rate_hz: self.timing.sample_rate_hz,
            bit_width: self.timing.bit_width,
            baud_rate_est: self.timing.rate_hz,
            bits: self.bits,
            bytes: self.bytes,
            is_uart_data: self.uart,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::BaudCode;

    #[test]
    fn test_bits_pack_msb_first() {
        let mut d = Decoded::line_code(BitTiming::new(50_000, SAMPLE_RATE_HZ));
        for bit in [true, false, false, false, false, false, false, true, true].iter() {
            d.push_bit(*bit);
        }
        let res = d.succeed(EncodingScheme::NrzL);
        assert_eq!(res.decoded_bytes(), &[0x81, 0x80]);
        assert_eq!(res.num_bits_decoded(), 9);
        assert_eq!(res.label(), "NRZ-L");
        assert!(res.success());
        assert_eq!(res.bit_width(), 20);
    }

    #[test]
    fn test_bits_stop_at_capacity() {
        let mut d = Decoded::line_code(BitTiming::new(50_000, SAMPLE_RATE_HZ));
        for _ in 0..40 {
            d.push_bit(true);
        }
        assert!(d.is_full());
        let res = d.succeed(EncodingScheme::NrzL);
        assert_eq!(res.num_bits_decoded(), MAX_DECODED_BITS);
        assert_eq!(res.decoded_bytes(), &[0xff, 0xff, 0xff]);
    }

    #[test]
    fn test_failure_label() {
        let d = Decoded::uart(BitTiming::for_selection(ClockSelection::Baud(
            BaudCode::B9600,
        )));
        let res = d.fail(DecodeError::UartNoStart);
        assert_eq!(res.label(), "UART Error (No Start)");
        assert_eq!(res.error(), Some(DecodeError::UartNoStart));
        assert!(!res.success());
        assert!(res.is_uart_data());
        assert_eq!(res.baud_rate_est(), 9600);
        assert_eq!(res.bit_width(), 104);
    }

    #[test]
    fn test_uart_bit_count_includes_bytes() {
        let mut d = Decoded::uart(BitTiming::for_selection(ClockSelection::Baud(
            BaudCode::B9600,
        )));
        d.push_byte(0x41);
        d.push_byte(0x42);
        assert_eq!(d.num_bits(), 16);
        let res = d.fail(DecodeError::UartFraming);
        assert_eq!(res.num_bits_decoded(), 16);
        assert_eq!(res.decoded_bytes(), &[0x41, 0x42]);
    }

    #[test]
    fn test_scheme_selectors() {
        assert_eq!(EncodingScheme::default().name(), "[NRZ-L]");
        assert_eq!(EncodingScheme::Uart.next(), EncodingScheme::NrzL);
        assert_eq!(
            EncodingScheme::Manchester.next(),
            EncodingScheme::DiffManchester
        );
        assert!(EncodingScheme::Uart.uses_baud());
        assert!(!EncodingScheme::Rz.uses_baud());
    }
}
