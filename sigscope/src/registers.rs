use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Base address of the FPGA peripheral window on the AHB2 bus. All of the
/// offsets in this module are relative to it.
pub const PERIPH_BASE: usize = 0x8100_0000;

/// Bit 0 of every control register: 1 to run, 0 to stop.
pub const CTRL_START: u32 = 1 << 0;

/// Bit 1 of the capture control registers: pulsed by the CPU to tell the
/// producer that the most recent frame has been copied out.
pub const CTRL_ACK: u32 = 1 << 1;

/// Bit 0 of every status register: set by the producer once a frame is
/// complete, cleared when it observes an acknowledgment.
pub const STATUS_READY: u32 = 1 << 0;

/// Represents a 32-bit register in the FPGA peripheral window.
#[derive(TryFromPrimitive, IntoPrimitive, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u32)]
#[allow(non_camel_case_types)]
pub enum Register {
    MODE_SELECT = 0x00,
    DDS_CONTROL = 0x04,
    ANALOG_CONTROL = 0x08,
    ANALOG_STATUS = 0x0c,
    DIGITAL_CONTROL = 0x10,
    DIGITAL_STATUS = 0x14,
    DIGITAL_PERIOD = 0x18,
    DIGITAL_HIGH_TIME = 0x1c,
    CAPTURE_CONTROL = 0x20,
    CAPTURE_STATUS = 0x24,
    ANALOG_DECIM = 0x28,
    USB_CDC_CONTROL = 0x2c,
}

impl Register {
    /// Number of register slots between offset zero and the last register,
    /// inclusive.
    pub const COUNT: usize = 12;

    pub const fn offset(self) -> u32 {
        self as u32
    }

    /// The position of the register in a flat array of 32-bit words.
    pub const fn index(self) -> usize {
        (self as u32 / 4) as usize
    }
}

/// A fixed-size capture region in the FPGA peripheral window.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Buffer {
    /// 512 unsigned 8-bit samples from the ADC path.
    Analog,
    /// 1024 one-bit samples from the logic input, packed as 32 words.
    DigitalCapture,
}

impl Buffer {
    pub const fn offset(self) -> u32 {
        match self {
            Buffer::Analog => 0x100,
            Buffer::DigitalCapture => 0x400,
        }
    }

    /// Length of the region in bytes.
    pub const fn len(self) -> usize {
        match self {
            Buffer::Analog => crate::capture::ANALOG_POINTS,
            Buffer::DigitalCapture => crate::capture::CAPTURE_WORDS * 4,
        }
    }

    pub fn contains(self, offset: u32) -> bool {
        offset >= self.offset() && ((offset - self.offset()) as usize) < self.len()
    }
}

/// Values for [`Register::MODE_SELECT`], which routes the FPGA's shared
/// front end to one of its functions.
#[derive(TryFromPrimitive, IntoPrimitive, Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u32)]
pub enum Mode {
    ExitToMain = 0x00,
    WaveformOutput = 0x01,
    AnalogInput = 0x02,
    DigitalInput = 0x04,
    UsbCdc = 0x08,
}
