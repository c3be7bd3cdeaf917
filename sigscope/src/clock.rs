//! Sample clock, selectable line rates, and the analog time base.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// The rate at which the digital capture unit samples its input.
pub const SAMPLE_RATE_HZ: u32 = 1_000_000;

/// Number of samples per transmitted bit, by integer division.
///
/// Returns zero rather than panicking when `rate_hz` is zero. Every decoder
/// is bounded by its output capacity, so a zero width still terminates.
pub const fn bit_width(rate_hz: u32, sample_rate_hz: u32) -> u32 {
    if rate_hz == 0 {
        0
    } else {
        sample_rate_hz / rate_hz
    }
}

/// Bit clock choices for the synchronous line codes.
#[derive(TryFromPrimitive, IntoPrimitive, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum FrequencyCode {
    Khz25 = 0,
    Khz50 = 1,
    Khz100 = 2,
    Khz250 = 3,
}

impl FrequencyCode {
    pub const ALL: [FrequencyCode; 4] = [
        FrequencyCode::Khz25,
        FrequencyCode::Khz50,
        FrequencyCode::Khz100,
        FrequencyCode::Khz250,
    ];

    pub const fn hz(self) -> u32 {
        match self {
            FrequencyCode::Khz25 => 25_000,
            FrequencyCode::Khz50 => 50_000,
            FrequencyCode::Khz100 => 100_000,
            FrequencyCode::Khz250 => 250_000,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            FrequencyCode::Khz25 => "Freq: 25kHz",
            FrequencyCode::Khz50 => "Freq: 50kHz",
            FrequencyCode::Khz100 => "Freq: 100kHz",
            FrequencyCode::Khz250 => "Freq: 250kHz",
        }
    }

    /// The next selection, wrapping around after the last one.
    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }
}

impl Default for FrequencyCode {
    fn default() -> Self {
        FrequencyCode::Khz50
    }
}

/// Baud rate choices for UART decoding.
#[derive(TryFromPrimitive, IntoPrimitive, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum BaudCode {
    B9600 = 0,
    B19200 = 1,
    B38400 = 2,
    B57600 = 3,
    B115200 = 4,
}

impl BaudCode {
    pub const ALL: [BaudCode; 5] = [
        BaudCode::B9600,
        BaudCode::B19200,
        BaudCode::B38400,
        BaudCode::B57600,
        BaudCode::B115200,
    ];

    pub const fn hz(self) -> u32 {
        match self {
            BaudCode::B9600 => 9_600,
            BaudCode::B19200 => 19_200,
            BaudCode::B38400 => 38_400,
            BaudCode::B57600 => 57_600,
            BaudCode::B115200 => 115_200,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            BaudCode::B9600 => "Baud: 9600",
            BaudCode::B19200 => "Baud: 19200",
            BaudCode::B38400 => "Baud: 38400",
            BaudCode::B57600 => "Baud: 57600",
            BaudCode::B115200 => "Baud: 115200",
        }
    }

    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }
}

impl Default for BaudCode {
    fn default() -> Self {
        BaudCode::B9600
    }
}

/// The rate a digital capture is decoded against.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClockSelection {
    Frequency(FrequencyCode),
    Baud(BaudCode),
}

impl ClockSelection {
    pub const fn rate_hz(self) -> u32 {
        match self {
            ClockSelection::Frequency(code) => code.hz(),
            ClockSelection::Baud(code) => code.hz(),
        }
    }

    /// Samples per bit at [`SAMPLE_RATE_HZ`].
    pub const fn bit_width(self) -> u32 {
        bit_width(self.rate_hz(), SAMPLE_RATE_HZ)
    }
}

impl Default for ClockSelection {
    fn default() -> Self {
        ClockSelection::Frequency(FrequencyCode::default())
    }
}

impl From<FrequencyCode> for ClockSelection {
    fn from(code: FrequencyCode) -> Self {
        ClockSelection::Frequency(code)
    }
}

impl From<BaudCode> for ClockSelection {
    fn from(code: BaudCode) -> Self {
        ClockSelection::Baud(code)
    }
}

/// Both rate selectors at once, as the instrument keeps them. Which one
/// applies depends on the encoding scheme in use.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ClockSettings {
    pub frequency: FrequencyCode,
    pub baud: BaudCode,
}

impl ClockSettings {
    pub fn new(frequency: FrequencyCode, baud: BaudCode) -> Self {
        Self { frequency, baud }
    }

    /// The baud selection for UART, the frequency selection otherwise.
    pub fn selection_for(self, scheme: crate::decode::EncodingScheme) -> ClockSelection {
        if scheme.uses_baud() {
            ClockSelection::Baud(self.baud)
        } else {
            ClockSelection::Frequency(self.frequency)
        }
    }
}

/// Horizontal scale of the analog display, which sets how many ADC
/// conversions the analog unit averages into each stored sample.
#[derive(TryFromPrimitive, IntoPrimitive, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum TimeBase {
    Us10 = 0,
    Us20 = 1,
    Us50 = 2,
    Us100 = 3,
    Us200 = 4,
    Us500 = 5,
    Ms1 = 6,
    Ms2 = 7,
    Ms5 = 8,
    Ms10 = 9,
    Ms20 = 10,
}

impl TimeBase {
    pub const ALL: [TimeBase; 11] = [
        TimeBase::Us10,
        TimeBase::Us20,
        TimeBase::Us50,
        TimeBase::Us100,
        TimeBase::Us200,
        TimeBase::Us500,
        TimeBase::Ms1,
        TimeBase::Ms2,
        TimeBase::Ms5,
        TimeBase::Ms10,
        TimeBase::Ms20,
    ];

    /// Microseconds per screen division.
    pub const fn micros(self) -> u32 {
        match self {
            TimeBase::Us10 => 10,
            TimeBase::Us20 => 20,
            TimeBase::Us50 => 50,
            TimeBase::Us100 => 100,
            TimeBase::Us200 => 200,
            TimeBase::Us500 => 500,
            TimeBase::Ms1 => 1_000,
            TimeBase::Ms2 => 2_000,
            TimeBase::Ms5 => 5_000,
            TimeBase::Ms10 => 10_000,
            TimeBase::Ms20 => 20_000,
        }
    }

    /// The value written to `ANALOG_DECIM` for this time base.
    pub const fn decimation(self) -> u32 {
        self.micros() / 2
    }

    /// One step towards a shorter time per division, stopping at the
    /// shortest.
    pub fn faster(self) -> Self {
        let i = self as usize;
        if i == 0 {
            self
        } else {
            Self::ALL[i - 1]
        }
    }

    /// One step towards a longer time per division, stopping at the longest.
    pub fn slower(self) -> Self {
        let i = self as usize;
        Self::ALL.get(i + 1).copied().unwrap_or(self)
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        TimeBase::Ms1
    }
}
