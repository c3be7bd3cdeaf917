//! Asynchronous serial decoding.
//!
//! The logic input sits behind an inverting level shifter, so a captured
//! UART line idles low: the start bit reads as 1 and the stop bit as 0. Data
//! bits are not inverted back; a data sample of 1 is a 1 bit.

use super::{BitTiming, DecodeResult, Decoded, EncodingScheme};
use crate::edge::first_rising_edge;
use crate::error::DecodeError;

/// Most frames decoded from one capture.
pub const MAX_FRAMES: usize = 3;

/// Decodes up to [`MAX_FRAMES`] back-to-back 8N1 frames, starting at the
/// first low-to-high transition in the capture.
///
/// Each data bit is sampled at its centre, 1.5 + j bit periods after the
/// start edge, least significant first. Decoding continues into the next
/// frame only if the line is high again exactly ten periods later.
pub fn decode(samples: &[bool], timing: BitTiming) -> DecodeResult {
    let bw = timing.width();
    let mut out = Decoded::uart(timing);
    let mut cur = match first_rising_edge(samples) {
        Some(i) => i,
        None => return out.fail(DecodeError::UartNoStart),
    };

    // Frames are only attempted while the stop bit's centre, 9.5 periods
    // after the start edge, lies inside the capture.
    let fits = |cur: usize| {
        let stop_x2 = cur.saturating_mul(2).saturating_add(bw.saturating_mul(19));
        stop_x2 < samples.len().saturating_mul(2)
    };

    while out.bytes_len() < MAX_FRAMES && fits(cur) {
        let data_start = cur + (bw * 3) / 2;
        let mut byte = 0u8;
        for j in 0..8 {
            match samples.get(data_start + j * bw).copied() {
                Some(true) => byte |= 1 << j,
                Some(false) => {}
                None => return out.fail(DecodeError::UartIncomplete),
            }
        }
        match samples.get(data_start + 8 * bw).copied() {
            Some(false) => {}
            Some(true) => return out.fail(DecodeError::UartFraming),
            None => return out.fail(DecodeError::UartIncomplete),
        }
        out.push_byte(byte);

        cur += 10 * bw;
        match samples.get(cur).copied() {
            Some(true) => {}
            _ => break,
        }
    }

    if out.bytes_len() == 0 {
        return out.fail(DecodeError::UartIncomplete);
    }
    out.succeed(EncodingScheme::Uart)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::capture::CAPTURE_POINTS;
    use crate::clock::{BaudCode, ClockSelection};
    use std::vec::Vec;

    fn timing(baud: BaudCode) -> BitTiming {
        BitTiming::for_selection(ClockSelection::Baud(baud))
    }

    /// An inverted 8N1 line: idle low, start high, stop low.
    fn encode(lead: usize, bytes: &[u8], bw: usize, total: usize) -> Vec<bool> {
        let mut out = Vec::new();
        out.extend(core::iter::repeat(false).take(lead));
        for b in bytes {
            let mut frame = [false; 10];
            frame[0] = true;
            for j in 0..8 {
                frame[1 + j] = (b >> j) & 1 != 0;
            }
            for level in frame.iter() {
                out.extend(core::iter::repeat(*level).take(bw));
            }
        }
        out.resize(total, false);
        out
    }

    #[test]
    fn test_letter_a_at_9600() {
        let t = timing(BaudCode::B9600);
        assert_eq!(t.bit_width, 104);
        let samples = encode(10, b"A", 104, CAPTURE_POINTS);
        let res = decode(&samples, t);
        assert!(res.success(), "{:?}", res);
        assert!(res.is_uart_data());
        assert_eq!(res.decoded_bytes(), &[0x41]);
        assert_eq!(res.num_bits_decoded(), 8);
        assert_eq!(res.label(), "UART");
        assert!(res.bits().is_empty());
    }

    #[test]
    fn test_back_to_back_frames_stop_at_three() {
        let t = timing(BaudCode::B115200);
        let samples = encode(3, b"Hi!?", 8, CAPTURE_POINTS);
        let res = decode(&samples, t);
        assert!(res.success());
        assert_eq!(res.decoded_bytes(), b"Hi!");
        assert_eq!(res.num_bits_decoded(), 24);
    }

    #[test]
    fn test_gap_ends_decoding() {
        let t = timing(BaudCode::B115200);
        let mut samples = encode(3, b"x", 8, 200);
        samples.extend(encode(5, b"y", 8, 200));
        let res = decode(&samples, t);
        assert_eq!(res.decoded_bytes(), b"x");
    }

    #[test]
    fn test_no_start() {
        let t = timing(BaudCode::B9600);
        for level in [false, true].iter() {
            let samples = [*level; 64];
            let res = decode(&samples, t);
            assert_eq!(res.label(), "UART Error (No Start)");
            assert_eq!(res.num_bits_decoded(), 0);
            assert!(res.is_uart_data());
        }
    }

    #[test]
    fn test_incomplete() {
        let t = timing(BaudCode::B9600);
        let samples = encode(900, b"A", 104, CAPTURE_POINTS);
        let res = decode(&samples, t);
        assert_eq!(res.error(), Some(DecodeError::UartIncomplete));
        assert_eq!(res.label(), "UART Error (Incomplete)");
    }

    #[test]
    fn test_framing_keeps_earlier_bytes() {
        let t = timing(BaudCode::B115200);
        let mut samples = encode(3, b"ok", 8, 163);
        // Hold the second frame's stop bit high.
        for v in samples[155..163].iter_mut() {
            *v = true;
        }
        samples.resize(400, false);
        let res = decode(&samples, t);
        assert_eq!(res.label(), "UART Error (Framing)");
        assert_eq!(res.decoded_bytes(), b"o");
        assert_eq!(res.num_bits_decoded(), 8);
    }
}
