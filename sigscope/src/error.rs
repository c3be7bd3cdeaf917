use core::fmt;

/// Reasons a decoder gave up on a capture.
///
/// A failed [`DecodeResult`](crate::decode::DecodeResult) carries one of
/// these alongside whatever it decoded before the fault. Each variant also
/// has a fixed label, which is the text the instrument shows in place of the
/// encoding name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// An RZ bit did not return to zero in the second half of its period.
    RzNoReturn,
    /// The first NRZ-I sample has no preceding period to compare against.
    NrziSyncFail,
    /// A Manchester period has no transition at its midpoint.
    ManchesterNoMidBit,
    /// The first differential Manchester period has no preceding level.
    DiffManchesterSyncFail,
    /// A differential Manchester period has no transition at its midpoint.
    DiffManchesterNoMidBit,
    /// No low-to-high transition anywhere in the capture.
    UartNoStart,
    /// The capture ended before a full UART frame.
    UartIncomplete,
    /// A UART stop bit was not where it should be.
    UartFraming,
}

impl DecodeError {
    pub const fn label(self) -> &'static str {
        match self {
            DecodeError::RzNoReturn => "RZ Error (No Return)",
            DecodeError::NrziSyncFail => "NRZ-I Error (Sync Fail)",
            DecodeError::ManchesterNoMidBit => "Manchester Error (No Mid-Bit)",
            DecodeError::DiffManchesterSyncFail => "Diff.Manch Error (Sync Fail)",
            DecodeError::DiffManchesterNoMidBit => "Diff.Manch Error (No Mid-Bit)",
            DecodeError::UartNoStart => "UART Error (No Start)",
            DecodeError::UartIncomplete => "UART Error (Incomplete)",
            DecodeError::UartFraming => "UART Error (Framing)",
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
