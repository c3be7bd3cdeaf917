use super::{Ram, RegisterFile, Registers};
use crate::registers::{Buffer, Register, CTRL_ACK, CTRL_START, STATUS_READY};

/// A [`RegisterFile`] that behaves like one of the FPGA capture units: it
/// fills its capture region, raises ready, and waits for the CPU's
/// acknowledgment before producing the next frame.
///
/// Frame contents come from the `fill` callback, which receives the sequence
/// number of the frame and the whole capture region to write into. It returns
/// `false` once it has nothing left to produce, after which the producer
/// stays idle.
///
/// Ready is cleared on the rising edge of ACK, but the next capture only
/// begins once the CPU has dropped ACK again while keeping START asserted,
/// so a consumer that forgets the second half of the pulse stalls the
/// producer just as it would on the real hardware. Capture then takes
/// `latency` status reads to complete.
pub struct Producer<F> {
    regs: Registers,
    control: Register,
    status: Register,
    buffer: Buffer,
    fill: F,
    latency: u32,
    countdown: u32,
    capturing: bool,
    awaiting_release: bool,
    exhausted: bool,
    ignore_ack: bool,
    frames: u32,
    acks: u32,
    stray_acks: u32,
}

impl<F> Producer<F>
where
    F: FnMut(u32, &mut [u8]) -> bool,
{
    pub fn new(control: Register, status: Register, buffer: Buffer, fill: F) -> Self {
        Self {
            regs: Registers::new(),
            control,
            status,
            buffer,
            fill,
            latency: 2,
            countdown: 0,
            capturing: false,
            awaiting_release: false,
            exhausted: false,
            ignore_ack: false,
            frames: 0,
            acks: 0,
            stray_acks: 0,
        }
    }

    /// Number of status reads a capture takes. At least one, so that a
    /// consumer spinning on ready after its acknowledgment always gets to
    /// see the flag drop.
    pub fn latency(mut self, reads: u32) -> Self {
        self.latency = if reads == 0 { 1 } else { reads };
        self
    }

    /// Simulates a stuck producer that never releases ready.
    pub fn ignore_ack(mut self, ignore: bool) -> Self {
        self.ignore_ack = ignore;
        self
    }

    pub fn frames_produced(&self) -> u32 {
        self.frames
    }

    /// Acknowledgments observed while a frame was pending.
    pub fn acks_observed(&self) -> u32 {
        self.acks
    }

    /// Rising ACK edges seen with no frame pending, such as the ones in the
    /// digital unit's arm sequence.
    pub fn stray_acks(&self) -> u32 {
        self.stray_acks
    }

    pub fn is_ready(&self) -> bool {
        self.regs.internal_read(self.status) & STATUS_READY != 0
    }

    fn set_ready(&mut self, ready: bool) {
        let v = self.regs.internal_read(self.status);
        let v = if ready {
            v | STATUS_READY
        } else {
            v & !STATUS_READY
        };
        self.regs.internal_write(self.status, v);
    }

    fn begin_capture(&mut self) {
        self.capturing = true;
        self.countdown = self.latency;
    }
}

impl<F> RegisterFile for Producer<F>
where
    F: FnMut(u32, &mut [u8]) -> bool,
{
    type Error = core::convert::Infallible;

    fn internal_read(&self, reg: Register) -> u32 {
        self.regs.internal_read(reg)
    }

    fn internal_write(&mut self, reg: Register, v: u32) {
        self.regs.internal_write(reg, v)
    }

    fn write(&mut self, reg: Register, v: u32, _ram: &mut Ram) -> Result<(), Self::Error> {
        if reg != self.control {
            self.regs.internal_write(reg, v);
            return Ok(());
        }

        let prev = self.regs.internal_read(reg);
        self.regs.internal_write(reg, v);
        let start = v & CTRL_START != 0;
        let ack = v & CTRL_ACK != 0;

        if ack && prev & CTRL_ACK == 0 {
            if self.is_ready() {
                self.acks += 1;
                if !self.ignore_ack {
                    self.set_ready(false);
                    self.awaiting_release = true;
                }
            } else {
                self.stray_acks += 1;
            }
        }

        if !start {
            self.capturing = false;
            self.awaiting_release = false;
        } else if !ack && (self.awaiting_release || prev & CTRL_START == 0) {
            self.awaiting_release = false;
            self.begin_capture();
        }
        Ok(())
    }

    fn read(&mut self, reg: Register, ram: &mut Ram) -> Result<u32, Self::Error> {
        if reg == self.status && self.capturing && !self.exhausted && !self.is_ready() {
            if self.countdown > 0 {
                self.countdown -= 1;
            } else {
                self.capturing = false;
                if (self.fill)(self.frames, ram.region_mut(self.buffer)) {
                    self.frames += 1;
                    self.set_ready(true);
                } else {
                    self.exhausted = true;
                }
            }
        }
        Ok(self.regs.internal_read(reg))
    }
}
