//! The seam between this crate and the acquisition hardware.

pub mod fake;

/// Implementations of `Interface` serve as adapters between the register
/// window this library expects and a specific way of reaching it, such as
/// volatile accesses to a memory-mapped peripheral.
///
/// The main library contains no hardware implementation of this trait, in
/// order to keep it portable and testable on a host. The `sigscope-mmio`
/// crate binds it to the real FPGA window, and [`fake`] provides an
/// in-memory register file for tests and simulation.
///
/// All offsets are byte offsets from the start of the peripheral window.
pub trait Interface {
    type Error;

    fn read_u32(&mut self, offset: u32) -> Result<u32, Self::Error>;
    fn write_u32(&mut self, offset: u32, v: u32) -> Result<(), Self::Error>;
    fn read_bytes(&mut self, offset: u32, into: &mut [u8]) -> Result<(), Self::Error>;

    /// Ensures every write issued so far has reached the peripheral before
    /// any later access is issued.
    ///
    /// Implementations backed by real hardware should issue whatever memory
    /// and instruction barriers their architecture needs. The default does
    /// nothing, which suits in-memory implementations.
    fn barrier(&mut self) {}
}

impl<T: Interface + ?Sized> Interface for &mut T {
    type Error = T::Error;

    fn read_u32(&mut self, offset: u32) -> Result<u32, Self::Error> {
        (**self).read_u32(offset)
    }

    fn write_u32(&mut self, offset: u32, v: u32) -> Result<(), Self::Error> {
        (**self).write_u32(offset, v)
    }

    fn read_bytes(&mut self, offset: u32, into: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read_bytes(offset, into)
    }

    fn barrier(&mut self) {
        (**self).barrier()
    }
}
