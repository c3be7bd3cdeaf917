use crate::capture::CaptureBuffer;
use crate::clock::{ClockSelection, ClockSettings};
use crate::decode::{BitTiming, DecodeResult, EncodingScheme};
use crate::edge::first_edge;

/// Decodes one capture with one scheme.
///
/// Works out the bit timing from `clock`, finds the first edge for the line
/// codes, and hands both to the scheme's decoder. There's exactly one decode
/// attempt: a failed result comes back as-is rather than prompting a retry
/// with some other scheme.
pub fn analyze(samples: &[bool], clock: ClockSelection, scheme: EncodingScheme) -> DecodeResult {
    let timing = BitTiming::for_selection(clock);
    let edge = if scheme.uses_baud() {
        None
    } else {
        first_edge(samples)
    };
    log::trace!(
        "analyze {} samples as {} at {} Hz, bit width {}, first edge {:?}",
        samples.len(),
        scheme.label(),
        timing.rate_hz,
        timing.bit_width,
        edge,
    );
    scheme.decode(samples, timing, edge)
}

/// Decodes a capture using whichever of the instrument's two rate selectors
/// applies to `scheme`.
pub fn analyze_capture(
    capture: &CaptureBuffer,
    settings: ClockSettings,
    scheme: EncodingScheme,
) -> DecodeResult {
    analyze(capture.samples(), settings.selection_for(scheme), scheme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{BaudCode, FrequencyCode};
    use crate::error::DecodeError;

    #[test]
    fn test_selects_rate_for_scheme() {
        let mut levels = [false; 1024];
        // 0x41 at 9600 baud, inverted line.
        let bw = 104;
        let start = 20;
        for (i, level) in [true, true, false, false, false, false, false, true, false]
            .iter()
            .enumerate()
        {
            for v in levels[start + i * bw..start + (i + 1) * bw].iter_mut() {
                *v = *level;
            }
        }
        let capture = CaptureBuffer::from_levels(&levels);
        let settings = ClockSettings::new(FrequencyCode::Khz250, BaudCode::B9600);

        let res = analyze_capture(&capture, settings, EncodingScheme::Uart);
        assert!(res.success());
        assert_eq!(res.decoded_bytes(), &[0x41]);
        assert_eq!(res.baud_rate_est(), 9600);

        let res = analyze_capture(&capture, settings, EncodingScheme::NrzL);
        assert_eq!(res.baud_rate_est(), 250_000);
        assert_eq!(res.bit_width(), 4);
        assert_eq!(res.sample_rate_hz(), 1_000_000);
    }

    #[test]
    fn test_failure_is_returned_unmodified() {
        let levels = [false; 1024];
        let res = analyze(
            &levels,
            ClockSelection::Frequency(FrequencyCode::Khz50),
            EncodingScheme::NrzI,
        );
        assert_eq!(res.error(), Some(DecodeError::NrziSyncFail));
        assert_eq!(res.label(), "NRZ-I Error (Sync Fail)");
    }
}
