//! Text renderings of results, matching what the instrument prints on its
//! result panels.
//!
//! These are `Display` adapters, so they work with any `core::fmt::Write`
//! sink without allocating.

use core::fmt;

use crate::decode::DecodeResult;
use crate::meter::Measurement;

/// Most bytes listed on the `Decoded:` and `ASCII:` lines.
pub const MAX_DISPLAY_BYTES: usize = 8;

/// The full result panel for a decode, one line per field.
pub struct Report<'a>(pub &'a DecodeResult);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        writeln!(f, "Encoding: {}", r.label())?;
        writeln!(f, "Baud Rate: {} bps", r.baud_rate_est())?;
        writeln!(f, "1-Bit Width: {} samples", r.bit_width())?;
        write!(f, "{}", DecodedLine(r))?;
        if r.is_uart_data() {
            write!(f, "\n{}", AsciiLine(r))?;
        }
        Ok(())
    }
}

/// `Decoded:` followed by the bit stream in groups of eight, or for UART by
/// the received bytes in hex.
pub struct DecodedLine<'a>(pub &'a DecodeResult);

impl fmt::Display for DecodedLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.0;
        f.write_str("Decoded: ")?;
        if r.is_uart_data() {
            for b in shown_bytes(r) {
                write!(f, "0x{:02X} ", b)?;
            }
            return Ok(());
        }
        let bits = r.bits();
        for (i, bit) in bits.iter().enumerate() {
            f.write_str(if *bit { "1" } else { "0" })?;
            if (i + 1) % 8 == 0 && i + 1 < bits.len() {
                f.write_str(" ")?;
            }
        }
        Ok(())
    }
}

/// `ASCII:` followed by the received bytes, with anything unprintable shown
/// as `.`.
pub struct AsciiLine<'a>(pub &'a DecodeResult);

impl fmt::Display for AsciiLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        f.write_str("ASCII: ")?;
        for b in shown_bytes(self.0) {
            let c = if (0x20..=0x7e).contains(b) {
                *b as char
            } else {
                '.'
            };
            f.write_char(c)?;
        }
        Ok(())
    }
}

fn shown_bytes(r: &DecodeResult) -> &[u8] {
    let bytes = r.decoded_bytes();
    &bytes[..bytes.len().min(MAX_DISPLAY_BYTES)]
}

/// The frequency meter panel.
pub struct MeasurementReport(pub Measurement);

impl fmt::Display for MeasurementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.0;
        let hz = m.frequency_hz;
        if hz > 1_000_000 {
            writeln!(f, "Freq: {}.{:03} MHz", hz / 1_000_000, (hz % 1_000_000) / 1000)?;
        } else if hz > 1000 {
            writeln!(f, "Freq: {}.{:03} kHz", hz / 1000, hz % 1000)?;
        } else {
            writeln!(f, "Freq: {} Hz", hz)?;
        }
        writeln!(f, "Duty: {} %", m.duty_percent)?;
        write_ns(f, "T_high", m.high_time_ns)?;
        f.write_str("\n")?;
        write_ns(f, "T_low", m.low_time_ns)
    }
}

fn write_ns(f: &mut fmt::Formatter<'_>, name: &str, ns: u32) -> fmt::Result {
    if ns > 1000 {
        write!(f, "{}: {}.{:03} us", name, ns / 1000, ns % 1000)
    } else {
        write!(f, "{}: {} ns", name, ns)
    }
}
