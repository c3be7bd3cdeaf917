use crate::capture::{AnalogFrame, CaptureBuffer, ANALOG_POINTS, CAPTURE_WORDS};
use crate::interface::Interface;
use crate::registers::{Buffer, Mode, Register, CTRL_START, STATUS_READY};

/// `LowLevel` is a thin typed layer over an [`Interface`], matching the
/// register-level operations the acquisition peripheral documents.
///
/// It knows the register map and the layout of the capture regions, but it
/// doesn't know anything about the handshake protocol. That lives in
/// [`acquisition`](crate::acquisition).
pub struct LowLevel<I: Interface> {
    raw: I,
}

impl<I: Interface> LowLevel<I> {
    pub fn new(interface: I) -> Self {
        Self { raw: interface }
    }

    /// Consumes the `LowLevel` and returns its underlying interface.
    pub fn take_interface(self) -> I {
        self.raw
    }

    pub fn borrow_interface(&mut self) -> &mut I {
        &mut self.raw
    }

    pub fn rd32(&mut self, reg: Register) -> Result<u32, I::Error> {
        self.raw.read_u32(reg.offset())
    }

    pub fn wr32(&mut self, reg: Register, v: u32) -> Result<(), I::Error> {
        self.raw.write_u32(reg.offset(), v)
    }

    pub fn barrier(&mut self) {
        self.raw.barrier()
    }

    /// Returns true if the ready bit of the given status register is set.
    pub fn ready(&mut self, status: Register) -> Result<bool, I::Error> {
        Ok(self.rd32(status)? & STATUS_READY != 0)
    }

    /// Copies the whole analog capture region.
    pub fn read_analog_frame(&mut self) -> Result<AnalogFrame, I::Error> {
        let mut data = [0u8; ANALOG_POINTS];
        self.raw.read_bytes(Buffer::Analog.offset(), &mut data)?;
        Ok(AnalogFrame::from_bytes(&data))
    }

    /// Copies the whole digital capture region, one 32-bit word at a time.
    pub fn read_capture(&mut self) -> Result<CaptureBuffer, I::Error> {
        let mut words = [0u32; CAPTURE_WORDS];
        let base = Buffer::DigitalCapture.offset();
        for (i, word) in words.iter_mut().enumerate() {
            *word = self.raw.read_u32(base + (i as u32) * 4)?;
        }
        Ok(CaptureBuffer::from_words(&words))
    }

    pub fn select_mode(&mut self, mode: Mode) -> Result<(), I::Error> {
        log::debug!("mode select {:?}", mode);
        self.wr32(Register::MODE_SELECT, mode.into())
    }

    /// Reads back the current mode, or `None` if the register holds a value
    /// that isn't a known mode.
    pub fn mode(&mut self) -> Result<Option<Mode>, I::Error> {
        use core::convert::TryFrom;
        let raw = self.rd32(Register::MODE_SELECT)?;
        Ok(Mode::try_from(raw).ok())
    }

    /// Enables or disables the FPGA's USB-CDC protocol bridge. The CPU takes
    /// no part in the bridged traffic itself.
    pub fn set_usb_bridge(&mut self, enabled: bool) -> Result<(), I::Error> {
        let v = if enabled { CTRL_START } else { 0 };
        self.wr32(Register::USB_CDC_CONTROL, v)
    }
}
