//! Locating the first transition in a capture, which the decoders use as
//! their phase reference.

/// The first index at or after 1 whose level differs from the first sample.
pub fn first_edge(samples: &[bool]) -> Option<usize> {
    let first = *samples.first()?;
    samples
        .iter()
        .skip(1)
        .position(|v| *v != first)
        .map(|i| i + 1)
}

/// The first index `i` at or after 1 where the line goes from low at `i - 1`
/// to high at `i`, anywhere in the buffer.
pub fn first_rising_edge(samples: &[bool]) -> Option<usize> {
    samples
        .windows(2)
        .position(|w| !w[0] && w[1])
        .map(|i| i + 1)
}

/// Analog counterpart of [`first_edge`]: the first index at or after 1 whose
/// sample lies on the other side of `threshold` from the first sample.
/// Samples equal to the threshold count as high.
pub fn first_crossing(samples: &[u8], threshold: u8) -> Option<usize> {
    let high = |v: u8| v >= threshold;
    let first = high(*samples.first()?);
    samples
        .iter()
        .skip(1)
        .position(|v| high(*v) != first)
        .map(|i| i + 1)
}
