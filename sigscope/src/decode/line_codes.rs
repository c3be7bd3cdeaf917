//! Decoders for the five synchronous line codes.
//!
//! Each takes the capture, the bit timing and the capture's first edge (see
//! [`first_edge`](crate::edge::first_edge)), which anchors the phase of the
//! bit grid. The two-sample codes look at a quarter and at three quarters of
//! each period.

use super::{BitTiming, DecodeResult, Decoded, EncodingScheme};
use crate::error::DecodeError;

/// Start of the bit-centre grid used by NRZ-L and RZ: half a period before
/// the edge, or half a period after it if that would be before the start of
/// the capture.
fn centred_start(first_edge: Option<usize>, bw: usize) -> usize {
    match first_edge {
        Some(e) if e >= bw / 2 => e - bw / 2,
        Some(e) => e + bw / 2,
        None => bw / 2,
    }
}

/// Quarter-period sample offsets within a bit period.
fn quarter_offsets(bw: usize) -> (usize, usize) {
    (bw / 4, (bw * 3) / 4)
}

/// NRZ-L: one sample per period, taken as the bit value. Never fails.
pub fn nrz_l(samples: &[bool], timing: BitTiming, first_edge: Option<usize>) -> DecodeResult {
    let bw = timing.width();
    let mut out = Decoded::line_code(timing);
    let mut idx = centred_start(first_edge, bw);

    while !out.is_full() && idx < samples.len() {
        out.push_bit(samples[idx]);
        idx += bw;
    }
    out.succeed(EncodingScheme::NrzL)
}

/// RZ: the first-quarter sample is the bit and the third-quarter sample must
/// have returned to zero.
pub fn rz(samples: &[bool], timing: BitTiming, first_edge: Option<usize>) -> DecodeResult {
    let bw = timing.width();
    let (sp1, sp2) = quarter_offsets(bw);
    let mut out = Decoded::line_code(timing);
    let mut idx = centred_start(first_edge, bw);

    while !out.is_full() && idx.saturating_add(sp2) < samples.len() {
        if samples[idx + sp2] {
            return out.fail(DecodeError::RzNoReturn);
        }
        out.push_bit(samples[idx + sp1]);
        idx += bw;
    }
    out.succeed(EncodingScheme::Rz)
}

/// NRZ-I: a one is a change of level from the previous period's centre.
pub fn nrz_i(samples: &[bool], timing: BitTiming, first_edge: Option<usize>) -> DecodeResult {
    let bw = timing.width();
    let out = Decoded::line_code(timing);
    let mut idx = match first_edge {
        Some(e) => e.saturating_add(bw / 2),
        None => bw / 2,
    };
    if idx < bw {
        return out.fail(DecodeError::NrziSyncFail);
    }
    let mut last = match samples.get(idx - bw) {
        Some(v) => *v,
        None => return out.succeed(EncodingScheme::NrzI),
    };

    let mut out = out;
    while !out.is_full() && idx < samples.len() {
        let cur = samples[idx];
        out.push_bit(cur != last);
        last = cur;
        idx += bw;
    }
    out.succeed(EncodingScheme::NrzI)
}

/// Manchester, IEEE 802.3 convention: low-to-high mid-period is a one,
/// high-to-low is a zero.
pub fn manchester(samples: &[bool], timing: BitTiming, first_edge: Option<usize>) -> DecodeResult {
    let bw = timing.width();
    let (sp1, sp2) = quarter_offsets(bw);
    let mut out = Decoded::line_code(timing);
    let mut idx = first_edge.unwrap_or(0);

    while !out.is_full() && idx.saturating_add(sp2) < samples.len() {
        let bit = match (samples[idx + sp1], samples[idx + sp2]) {
            (false, true) => true,
            (true, false) => false,
            _ => return out.fail(DecodeError::ManchesterNoMidBit),
        };
        out.push_bit(bit);
        idx += bw;
    }
    out.succeed(EncodingScheme::Manchester)
}

/// Differential Manchester: every period changes level mid-period, and a one
/// is a period that starts at the level the previous one ended on.
pub fn diff_manchester(
    samples: &[bool],
    timing: BitTiming,
    first_edge: Option<usize>,
) -> DecodeResult {
    let bw = timing.width();
    let (sp1, sp2) = quarter_offsets(bw);
    let out = Decoded::line_code(timing);
    let mut idx = first_edge.unwrap_or(0);
    if idx < bw / 4 {
        return out.fail(DecodeError::DiffManchesterSyncFail);
    }
    let mut last = match samples.get(idx - bw / 4) {
        Some(v) => *v,
        None => return out.succeed(EncodingScheme::DiffManchester),
    };

    let mut out = out;
    while !out.is_full() && idx.saturating_add(sp2) < samples.len() {
        let first = samples[idx + sp1];
        let second = samples[idx + sp2];
        if first == second {
            return out.fail(DecodeError::DiffManchesterNoMidBit);
        }
        out.push_bit(first == last);
        last = second;
        idx += bw;
    }
    out.succeed(EncodingScheme::DiffManchester)
}
