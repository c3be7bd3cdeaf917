//! Owned snapshots of the hardware capture regions.
//!
//! Both types here are only ever built from a complete copy of their region,
//! taken after the producer reports a finished frame, so nothing downstream
//! ever reads memory the producer might still be filling.

/// Number of one-bit samples in a digital capture.
pub const CAPTURE_POINTS: usize = 1024;

/// Number of 32-bit words the digital capture region is read as.
pub const CAPTURE_WORDS: usize = CAPTURE_POINTS / 32;

/// Number of 8-bit samples in an analog frame.
pub const ANALOG_POINTS: usize = 512;

/// A digital capture: one logic level per sample, in time order.
#[derive(Clone, PartialEq, Eq)]
pub struct CaptureBuffer {
    samples: [bool; CAPTURE_POINTS],
}

impl CaptureBuffer {
    /// Unpacks words as the capture unit packs them: 32 samples per word,
    /// earliest sample in the least significant bit.
    pub fn from_words(words: &[u32; CAPTURE_WORDS]) -> Self {
        let mut samples = [false; CAPTURE_POINTS];
        for (i, word) in words.iter().enumerate() {
            for j in 0..32 {
                samples[i * 32 + j] = (word >> j) & 1 != 0;
            }
        }
        Self { samples }
    }

    /// Builds a capture from individual levels, zero-filling whatever the
    /// given slice doesn't cover and ignoring anything beyond
    /// [`CAPTURE_POINTS`].
    pub fn from_levels(levels: &[bool]) -> Self {
        let mut samples = [false; CAPTURE_POINTS];
        for (dst, src) in samples.iter_mut().zip(levels.iter()) {
            *dst = *src;
        }
        Self { samples }
    }

    pub fn samples(&self) -> &[bool] {
        &self.samples[..]
    }

    /// Packs the samples back into the word layout of the capture region.
    pub fn to_words(&self) -> [u32; CAPTURE_WORDS] {
        let mut words = [0u32; CAPTURE_WORDS];
        for (i, v) in self.samples.iter().enumerate() {
            if *v {
                words[i / 32] |= 1 << (i % 32);
            }
        }
        words
    }
}

impl core::fmt::Debug for CaptureBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "CaptureBuffer(")?;
        for w in self.to_words().iter() {
            write!(f, "{:08x}", w)?;
        }
        write!(f, ")")
    }
}

/// An analog frame: one unsigned magnitude per sample, in time order.
#[derive(Clone, PartialEq, Eq)]
pub struct AnalogFrame {
    samples: [u8; ANALOG_POINTS],
}

impl AnalogFrame {
    pub fn from_bytes(bytes: &[u8; ANALOG_POINTS]) -> Self {
        Self { samples: *bytes }
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples[..]
    }
}

impl core::fmt::Debug for AnalogFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("AnalogFrame")
            .field(&&self.samples[..8])
            .finish()
    }
}
