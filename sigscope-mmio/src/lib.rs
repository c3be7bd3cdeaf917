#![no_std]

use core::sync::atomic::{fence, Ordering};
use sigscope::interface::Interface;
use sigscope::registers::{Buffer, PERIPH_BASE};

/// Length in bytes of the peripheral window, from the first register to the
/// end of the last capture region.
pub const WINDOW_LEN: usize =
    Buffer::DigitalCapture.offset() as usize + Buffer::DigitalCapture.len();

/// `MmioInterface` is an implementation of `sigscope::Interface` that reaches
/// the FPGA registers through volatile loads and stores into a memory-mapped
/// window.
pub struct MmioInterface {
    base: usize,
}

impl MmioInterface {
    /// Create an interface for the window at its usual address,
    /// [`PERIPH_BASE`].
    ///
    /// # Safety
    ///
    /// The caller must be running on the target, with the external memory
    /// controller already configured to map the FPGA, and must not create
    /// more than one of these at a time.
    pub unsafe fn new() -> Self {
        Self::at(PERIPH_BASE)
    }

    /// Create an interface for a window starting at `base`.
    ///
    /// # Safety
    ///
    /// `base` must be four-byte aligned and point to `WINDOW_LEN` bytes that
    /// are valid for volatile reads and writes for as long as the interface
    /// exists, and nothing else may access them in that time.
    pub unsafe fn at(base: usize) -> Self {
        Self { base }
    }

    fn check(&self, offset: u32, len: usize) -> Result<usize, Error> {
        let end = (offset as usize).checked_add(len);
        match end {
            Some(end) if end <= WINDOW_LEN => Ok(self.base + offset as usize),
            _ => Err(Error::OutOfWindow(offset)),
        }
    }

    fn check_word(&self, offset: u32) -> Result<*mut u32, Error> {
        if offset % 4 != 0 {
            return Err(Error::Unaligned(offset));
        }
        self.check(offset, 4).map(|addr| addr as *mut u32)
    }
}

impl Interface for MmioInterface {
    type Error = Error;

    fn read_u32(&mut self, offset: u32) -> Result<u32, Error> {
        let ptr = self.check_word(offset)?;
        Ok(unsafe { core::ptr::read_volatile(ptr) })
    }

    fn write_u32(&mut self, offset: u32, v: u32) -> Result<(), Error> {
        let ptr = self.check_word(offset)?;
        unsafe { core::ptr::write_volatile(ptr, v) };
        Ok(())
    }

    fn read_bytes(&mut self, offset: u32, into: &mut [u8]) -> Result<(), Error> {
        let addr = self.check(offset, into.len())?;

        // The bus bridge is 32 bits wide, so whole words go across as words.
        if addr % 4 == 0 && into.len() % 4 == 0 {
            for (i, chunk) in into.chunks_exact_mut(4).enumerate() {
                let ptr = (addr + i * 4) as *const u32;
                let v = unsafe { core::ptr::read_volatile(ptr) };
                chunk.copy_from_slice(&v.to_le_bytes());
            }
            return Ok(());
        }
        for (i, b) in into.iter_mut().enumerate() {
            *b = unsafe { core::ptr::read_volatile((addr + i) as *const u8) };
        }
        Ok(())
    }

    fn barrier(&mut self) {
        fence(Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    OutOfWindow(u32),
    Unaligned(u32),
}
