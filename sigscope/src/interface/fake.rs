//! Fake `Interface` implementation for testing and simulation.

mod producer;

pub use producer::Producer;

use crate::capture::{ANALOG_POINTS, CAPTURE_WORDS};
use crate::registers::{Buffer, Register};

/// The two capture regions of the fake peripheral window, held in local RAM.
pub struct Ram {
    analog: [u8; ANALOG_POINTS],
    capture: [u8; CAPTURE_WORDS * 4],
}

impl Ram {
    pub fn new() -> Self {
        Self {
            analog: [0; ANALOG_POINTS],
            capture: [0; CAPTURE_WORDS * 4],
        }
    }

    /// The backing bytes for the given capture region.
    pub fn region_mut(&mut self, buf: Buffer) -> &mut [u8] {
        match buf {
            Buffer::Analog => &mut self.analog[..],
            Buffer::DigitalCapture => &mut self.capture[..],
        }
    }

    pub fn region(&self, buf: Buffer) -> &[u8] {
        match buf {
            Buffer::Analog => &self.analog[..],
            Buffer::DigitalCapture => &self.capture[..],
        }
    }

    /// Stores capture words in the little-endian layout the real capture
    /// unit's block RAM presents on the bus.
    pub fn load_capture_words(&mut self, words: &[u32; CAPTURE_WORDS]) {
        store_words(&mut self.capture[..], words);
    }
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes words into a byte region in little-endian order.
pub fn store_words(into: &mut [u8], words: &[u32]) {
    for (chunk, w) in into.chunks_exact_mut(4).zip(words.iter()) {
        chunk.copy_from_slice(&w.to_le_bytes());
    }
}

/// An implementation of [`Interface`](super::Interface) which just reads and
/// writes registers and capture regions held in local RAM.
///
/// On its own this type doesn't implement any of the behavior of the real
/// capture units: a register holds whatever was last written to it. Plug in
/// a different [`RegisterFile`] with [`with_register_file`](Self::with_register_file)
/// to simulate hardware side-effects, such as the [`Producer`] double.
pub struct Interface<RF: RegisterFile = Registers> {
    ram: Ram,
    registers: RF,
}

impl Interface<Registers> {
    pub fn new() -> Self {
        Self {
            ram: Ram::new(),
            registers: Registers::new(),
        }
    }
}

impl Default for Interface<Registers> {
    fn default() -> Self {
        Self::new()
    }
}

impl<RF: RegisterFile> Interface<RF> {
    pub fn with_register_file<RF2: RegisterFile>(self, new: RF2) -> Interface<RF2> {
        Interface {
            ram: self.ram,
            registers: new,
        }
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut Ram {
        &mut self.ram
    }

    pub fn registers(&self) -> &RF {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut RF {
        &mut self.registers
    }

    fn register_at(offset: u32) -> Result<Option<Register>, Error<RF::Error>> {
        use core::convert::TryFrom;
        if (offset % 4) != 0 {
            return Err(Error::Unaligned(offset));
        }
        Ok(Register::try_from(offset).ok())
    }

    fn buffer_at(offset: u32) -> Option<Buffer> {
        [Buffer::Analog, Buffer::DigitalCapture]
            .iter()
            .copied()
            .find(|b| b.contains(offset))
    }
}

impl<RF: RegisterFile> super::Interface for Interface<RF> {
    type Error = Error<RF::Error>;

    fn read_u32(&mut self, offset: u32) -> Result<u32, Self::Error> {
        if let Some(reg) = Self::register_at(offset)? {
            return self
                .registers
                .read(reg, &mut self.ram)
                .map_err(Error::Registers);
        }
        let mut data = [0u8; 4];
        self.read_bytes(offset, &mut data)?;
        Ok(u32::from_le_bytes(data))
    }

    fn write_u32(&mut self, offset: u32, v: u32) -> Result<(), Self::Error> {
        match Self::register_at(offset)? {
            Some(reg) => self
                .registers
                .write(reg, v, &mut self.ram)
                .map_err(Error::Registers),
            None => match Self::buffer_at(offset) {
                // The capture regions belong to the producer.
                Some(_) => Err(Error::ReadOnly(offset)),
                None => Err(Error::UnmappedAddr(offset)),
            },
        }
    }

    fn read_bytes(&mut self, offset: u32, into: &mut [u8]) -> Result<(), Self::Error> {
        let buf = match Self::buffer_at(offset) {
            Some(b) => b,
            None => return Err(Error::UnmappedAddr(offset)),
        };
        let start = (offset - buf.offset()) as usize;
        let region = self.ram.region(buf);
        if start + into.len() > region.len() {
            return Err(Error::OutOfBounds {
                offset,
                len: into.len(),
            });
        }
        into.copy_from_slice(&region[start..start + into.len()]);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<RegError> {
    UnmappedAddr(u32),
    Unaligned(u32),
    ReadOnly(u32),
    OutOfBounds { offset: u32, len: usize },
    Registers(RegError),
}

/// Implemented by types that serve as "hooks" for implementing register
/// behaviors.
pub trait RegisterFile {
    type Error: core::fmt::Debug;

    /// Directly read the backing store for the given register, with no
    /// side-effects and no failures.
    fn internal_read(&self, reg: Register) -> u32;

    /// Directly overwrite the backing store for the given register, with no
    /// side-effects. Tests use this to preload status and measurement
    /// registers.
    fn internal_write(&mut self, reg: Register, v: u32);

    /// Write a new value to the given register, and take any side-effects that
    /// the write might imply.
    fn write(&mut self, reg: Register, v: u32, ram: &mut Ram) -> Result<(), Self::Error>;

    /// Read the value of the given register and also take any side-effects
    /// that the read might imply.
    ///
    /// The default implementation of `read` is just a thin wrapper around
    /// `internal_read`. Implementations can override it to add any additional
    /// side-effects.
    fn read(&mut self, reg: Register, ram: &mut Ram) -> Result<u32, Self::Error> {
        let _ = ram;
        Ok(self.internal_read(reg))
    }
}

/// A plain [`RegisterFile`] where every register simply stores the last
/// value written to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    words: [u32; Register::COUNT],
}

impl Registers {
    pub fn new() -> Self {
        Self {
            words: [0; Register::COUNT],
        }
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile for Registers {
    type Error = core::convert::Infallible;

    fn internal_read(&self, reg: Register) -> u32 {
        self.words[reg.index()]
    }

    fn internal_write(&mut self, reg: Register, v: u32) {
        self.words[reg.index()] = v;
    }

    fn write(&mut self, reg: Register, v: u32, _ram: &mut Ram) -> Result<(), Self::Error> {
        self.internal_write(reg, v);
        Ok(())
    }
}
