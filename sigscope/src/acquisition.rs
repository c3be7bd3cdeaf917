//! The ready/acknowledge handshake with the FPGA capture units.
//!
//! Each capture unit fills its region of the peripheral window, raises the
//! ready bit in its status register, and then holds the data until the CPU
//! pulses ACK in the control register. A [`Session`] owns that exchange for
//! one unit: callers [`start`](Session::start) it, call
//! [`poll`](Session::poll) once per pass of their main loop, and get back an
//! owned copy of each frame the unit produces.

use core::marker::PhantomData;

use crate::capture::{AnalogFrame, CaptureBuffer};
use crate::clock::{ClockSelection, TimeBase};
use crate::interface::Interface;
use crate::low_level::LowLevel;
use crate::registers::{Buffer, Register, CTRL_ACK, CTRL_START};

/// A capture unit in the FPGA, described by its registers and by the writes
/// it needs to start a capture.
pub trait CaptureUnit {
    /// What the caller chooses when starting a capture.
    type Setting: Copy + core::fmt::Debug;

    /// The owned snapshot of the capture region.
    type Frame;

    const CONTROL: Register;
    const STATUS: Register;
    const BUFFER: Buffer;

    /// Configures and starts the unit, assuming it's currently stopped.
    fn arm<I: Interface>(ll: &mut LowLevel<I>, setting: Self::Setting) -> Result<(), I::Error>;

    /// Copies the whole capture region.
    fn drain<I: Interface>(ll: &mut LowLevel<I>) -> Result<Self::Frame, I::Error>;
}

/// The ADC path, which stores 512 averaged 8-bit samples per frame.
pub struct AnalogUnit;

impl CaptureUnit for AnalogUnit {
    type Setting = TimeBase;
    type Frame = AnalogFrame;

    const CONTROL: Register = Register::ANALOG_CONTROL;
    const STATUS: Register = Register::ANALOG_STATUS;
    const BUFFER: Buffer = Buffer::Analog;

    fn arm<I: Interface>(ll: &mut LowLevel<I>, setting: TimeBase) -> Result<(), I::Error> {
        ll.wr32(Register::ANALOG_DECIM, setting.decimation())?;
        ll.wr32(Self::CONTROL, CTRL_START)
    }

    fn drain<I: Interface>(ll: &mut LowLevel<I>) -> Result<AnalogFrame, I::Error> {
        ll.read_analog_frame()
    }
}

/// The logic input path, which stores 1024 one-bit samples per frame at
/// [`SAMPLE_RATE_HZ`](crate::clock::SAMPLE_RATE_HZ).
///
/// The unit's sample clock is fixed, so the clock selection only matters to
/// whoever decodes the frames. The session keeps it alongside the capture.
pub struct DigitalUnit;

impl CaptureUnit for DigitalUnit {
    type Setting = ClockSelection;
    type Frame = CaptureBuffer;

    const CONTROL: Register = Register::CAPTURE_CONTROL;
    const STATUS: Register = Register::CAPTURE_STATUS;
    const BUFFER: Buffer = Buffer::DigitalCapture;

    fn arm<I: Interface>(ll: &mut LowLevel<I>, _setting: ClockSelection) -> Result<(), I::Error> {
        // A lone ACK first clears any frame left over from a previous run.
        ll.wr32(Self::CONTROL, CTRL_ACK)?;
        ll.wr32(Self::CONTROL, 0)?;
        ll.wr32(Self::CONTROL, CTRL_START)
    }

    fn drain<I: Interface>(ll: &mut LowLevel<I>) -> Result<CaptureBuffer, I::Error> {
        ll.read_capture()
    }
}

/// Where a [`Session`] is in its handshake with the capture unit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AcquisitionState {
    /// Stopped. Polling does nothing.
    Idle,
    /// Started, and no poll has happened since.
    Armed,
    /// The most recent poll found no frame ready.
    AwaitingReady,
    /// Copying a frame out of the capture region.
    Draining,
    /// Acknowledging a drained frame and waiting for the unit to drop ready.
    Acknowledging,
}

/// Tuning for a [`Session`].
///
/// This behaves as a "builder" type, with methods that modify its
/// parameters. The defaults reproduce the instrument firmware's behavior.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SessionConfig {
    spin_limit: u32,
    restart_after_ack: bool,
    single_shot: bool,
}

impl SessionConfig {
    pub const DEFAULT_SPIN_LIMIT: u32 = 200_000;

    pub fn new() -> Self {
        core::default::Default::default()
    }

    /// How many extra times to read the status register, after
    /// acknowledging a frame, while waiting for ready to drop.
    pub fn spin_limit<'a>(&'a mut self, v: u32) -> &'a mut Self {
        self.spin_limit = v;
        self
    }

    /// Whether to stop and re-arm the unit after each acknowledgment. Some
    /// revisions of the capture units miss the ACK edge without this.
    pub fn restart_after_ack<'a>(&'a mut self, v: bool) -> &'a mut Self {
        self.restart_after_ack = v;
        self
    }

    /// Whether to stop after delivering one frame.
    pub fn single_shot<'a>(&'a mut self, v: bool) -> &'a mut Self {
        self.single_shot = v;
        self
    }

    pub fn get_spin_limit(&self) -> u32 {
        self.spin_limit
    }

    pub fn get_restart_after_ack(&self) -> bool {
        self.restart_after_ack
    }

    pub fn get_single_shot(&self) -> bool {
        self.single_shot
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            spin_limit: Self::DEFAULT_SPIN_LIMIT,
            restart_after_ack: true,
            single_shot: false,
        }
    }
}

/// Drives one capture unit through its handshake.
///
/// The session owns its interface. To share one register window between
/// several sessions, give each a `&mut` borrow of it in turn.
pub struct Session<I: Interface, U: CaptureUnit> {
    ll: LowLevel<I>,
    config: SessionConfig,
    state: AcquisitionState,
    setting: Option<U::Setting>,
    _unit: PhantomData<U>,
}

pub type AnalogSession<I> = Session<I, AnalogUnit>;
pub type DigitalSession<I> = Session<I, DigitalUnit>;

impl<I: Interface, U: CaptureUnit> Session<I, U> {
    pub fn new(ei: I) -> Self {
        Self::with_config(ei, SessionConfig::default())
    }

    pub fn with_config(ei: I, config: SessionConfig) -> Self {
        Self {
            ll: LowLevel::new(ei),
            config,
            state: AcquisitionState::Idle,
            setting: None,
            _unit: PhantomData,
        }
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state != AcquisitionState::Idle
    }

    /// The setting of the most recent `start`, if any.
    pub fn setting(&self) -> Option<U::Setting> {
        self.setting
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn take_interface(self) -> I {
        self.ll.take_interface()
    }

    pub fn borrow_interface(&mut self) -> &mut I {
        self.ll.borrow_interface()
    }

    /// Configures the unit and starts capturing.
    ///
    /// Calling this on a session that's already running is fine, and is how
    /// to apply a new setting mid-run.
    pub fn start(&mut self, setting: U::Setting) -> Result<(), I::Error> {
        log::debug!("{:?}: start with {:?}", U::CONTROL, setting);
        U::arm(&mut self.ll, setting)?;
        self.setting = Some(setting);
        self.state = AcquisitionState::Armed;
        Ok(())
    }

    /// Stops the unit. Always allowed, and stopping twice is harmless.
    pub fn stop(&mut self) -> Result<(), I::Error> {
        log::debug!("{:?}: stop", U::CONTROL);
        self.ll.wr32(U::CONTROL, 0)?;
        self.state = AcquisitionState::Idle;
        Ok(())
    }

    /// Collects the next frame, if the unit has one ready.
    ///
    /// Returns `Ok(None)` without touching the hardware while the session is
    /// idle. Otherwise, when the unit reports ready, copies out the whole
    /// capture region, acknowledges it, and re-arms the unit before
    /// returning the copy. Only interface failures are errors: a unit that
    /// is slow to drop ready after the acknowledgment is logged and then
    /// left for the next poll to sort out.
    pub fn poll(&mut self) -> Result<Option<U::Frame>, I::Error> {
        if self.state == AcquisitionState::Idle {
            return Ok(None);
        }
        if !self.ll.ready(U::STATUS)? {
            self.state = AcquisitionState::AwaitingReady;
            return Ok(None);
        }

        self.state = AcquisitionState::Draining;
        let frame = U::drain(&mut self.ll)?;
        log::trace!("{:?}: drained frame", U::BUFFER);

        self.state = AcquisitionState::Acknowledging;
        acknowledge(&mut self.ll, U::CONTROL)?;
        self.wait_ready_clear()?;

        if self.config.single_shot {
            self.stop()?;
            return Ok(Some(frame));
        }
        if self.config.restart_after_ack {
            self.restart()?;
        }
        self.state = AcquisitionState::Armed;
        Ok(Some(frame))
    }

    fn wait_ready_clear(&mut self) -> Result<(), I::Error> {
        let mut spins = 0;
        while self.ll.ready(U::STATUS)? {
            if spins >= self.config.spin_limit {
                log::warn!(
                    "{:?}: ready still set after {} polls, continuing",
                    U::STATUS,
                    spins
                );
                break;
            }
            spins += 1;
        }
        Ok(())
    }

    fn restart(&mut self) -> Result<(), I::Error> {
        self.ll.wr32(U::CONTROL, 0)?;
        match self.setting {
            Some(setting) => U::arm(&mut self.ll, setting),
            None => Ok(()),
        }
    }
}

/// Pulses ACK while keeping START asserted.
///
/// The unit acts on the edge, so the two writes go out back to back with
/// nothing else allowed to run between them.
pub(crate) fn acknowledge<I: Interface>(
    ll: &mut LowLevel<I>,
    control: Register,
) -> Result<(), I::Error> {
    log::debug!("{:?}: ack", control);
    critical_section::with(|_| {
        ll.wr32(control, CTRL_START | CTRL_ACK)?;
        ll.barrier();
        ll.wr32(control, CTRL_START)
    })
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::capture::{CAPTURE_POINTS, CAPTURE_WORDS};
    use crate::clock::FrequencyCode;
    use crate::interface::fake::{self, store_words, Producer, RegisterFile};
    use crate::interface::testing::{MockInterface, MockInterfaceCall};
    use crate::registers::STATUS_READY;
    use std::vec;
    use std::vec::Vec;

    const FREQ_50K: ClockSelection = ClockSelection::Frequency(FrequencyCode::Khz50);

    /// A digital producer whose frame n has every word set to n + 1.
    fn digital_producer(
        frames: u32,
    ) -> fake::Interface<Producer<impl FnMut(u32, &mut [u8]) -> bool>> {
        let producer = Producer::new(
            DigitalUnit::CONTROL,
            DigitalUnit::STATUS,
            DigitalUnit::BUFFER,
            move |n: u32, buf: &mut [u8]| {
                if n >= frames {
                    return false;
                }
                store_words(buf, &[n + 1; CAPTURE_WORDS]);
                true
            },
        );
        fake::Interface::new().with_register_file(producer)
    }

    fn poll_until<I: Interface, U: CaptureUnit>(
        session: &mut Session<I, U>,
        limit: usize,
    ) -> Option<U::Frame>
    where
        I::Error: core::fmt::Debug,
    {
        for _ in 0..limit {
            if let Some(frame) = session.poll().unwrap() {
                return Some(frame);
            }
        }
        None
    }

    #[test]
    fn test_poll_while_idle_does_nothing() {
        let mut session: DigitalSession<_> = Session::new(MockInterface::new());
        assert_eq!(session.poll(), Ok(None));
        assert_eq!(session.take_interface().calls(), vec![]);
    }

    #[test]
    fn test_stop_then_poll_never_yields() {
        let mut ei = digital_producer(100);
        {
            let mut session: DigitalSession<_> = Session::new(&mut ei);
            session.start(FREQ_50K).unwrap();
            assert!(poll_until(&mut session, 10).is_some());
            session.stop().unwrap();
            assert_eq!(session.state(), AcquisitionState::Idle);
            for _ in 0..50 {
                assert!(session.poll().unwrap().is_none());
            }
            // Stopping twice is fine.
            session.stop().unwrap();
        }

        // The stop took effect while the unit was between frames, so it never
        // produced another one.
        assert_eq!(ei.registers().frames_produced(), 1);
    }

    #[test]
    fn test_stop_with_frame_pending_never_yields() {
        let mut mock = MockInterface::new();
        mock.setup_word(0x24, STATUS_READY);
        let mut session: DigitalSession<_> = Session::new(mock);
        session.start(FREQ_50K).unwrap();
        session.stop().unwrap();
        assert_eq!(session.poll(), Ok(None));
        assert_eq!(
            session.take_interface().writes(),
            vec![(0x20, 2), (0x20, 0), (0x20, 1), (0x20, 0)]
        );
    }

    #[test]
    fn test_consecutive_frames_are_not_mixed() {
        let mut ei = digital_producer(100);
        let mut frames = Vec::new();
        {
            let mut session: DigitalSession<_> = Session::new(&mut ei);
            session.start(FREQ_50K).unwrap();
            for _ in 0..3 {
                frames.push(poll_until(&mut session, 10).unwrap());
            }
        }

        for (n, frame) in frames.iter().enumerate() {
            let want = [n as u32 + 1; CAPTURE_WORDS];
            assert_eq!(frame.to_words(), want, "frame {}", n);
        }
        // Exactly one acknowledgment per frame delivered.
        assert_eq!(ei.registers().acks_observed(), 3);
        assert_eq!(ei.registers().frames_produced(), 3);
    }

    #[test]
    fn test_analog_frames_in_order() {
        let producer = Producer::new(
            AnalogUnit::CONTROL,
            AnalogUnit::STATUS,
            AnalogUnit::BUFFER,
            |n: u32, buf: &mut [u8]| {
                for (i, b) in buf.iter_mut().enumerate() {
                    *b = (n as usize * 7 + i) as u8;
                }
                true
            },
        )
        .latency(5);
        let ei = fake::Interface::new().with_register_file(producer);
        let mut session: AnalogSession<_> = Session::new(ei);
        session.start(TimeBase::Us100).unwrap();

        for n in 0..4usize {
            let frame = poll_until(&mut session, 20).unwrap();
            assert_eq!(frame.samples()[0], (n * 7) as u8);
            assert_eq!(frame.samples()[511], (n * 7 + 511) as u8);
        }
        let ei = session.take_interface();
        assert_eq!(ei.registers().internal_read(Register::ANALOG_DECIM), 50);
        assert_eq!(ei.registers().acks_observed(), 4);
    }

    #[test]
    fn test_digital_handshake_writes() {
        let mut mock = MockInterface::new();
        mock.setup_word(0x24, STATUS_READY);
        mock.setup_word(0x400, 0x8000_0001);
        let mut session: DigitalSession<_> =
            Session::with_config(mock, *SessionConfig::new().spin_limit(3));
        session.start(FREQ_50K).unwrap();
        let frame = session.poll().unwrap().unwrap();
        assert!(frame.samples()[0]);
        assert!(frame.samples()[31]);
        assert_eq!(frame.samples().len(), CAPTURE_POINTS);

        let calls = session.take_interface().calls();
        let mut want = vec![
            MockInterfaceCall::Write(0x20, 2),
            MockInterfaceCall::Write(0x20, 0),
            MockInterfaceCall::Write(0x20, 1),
            MockInterfaceCall::Read(0x24),
        ];
        for i in 0..CAPTURE_WORDS as u32 {
            want.push(MockInterfaceCall::Read(0x400 + i * 4));
        }
        want.extend(vec![
            MockInterfaceCall::Write(0x20, 3),
            MockInterfaceCall::Barrier,
            MockInterfaceCall::Write(0x20, 1),
            // The mock never drops ready, so the spin runs out.
            MockInterfaceCall::Read(0x24),
            MockInterfaceCall::Read(0x24),
            MockInterfaceCall::Read(0x24),
            MockInterfaceCall::Read(0x24),
            MockInterfaceCall::Write(0x20, 0),
            MockInterfaceCall::Write(0x20, 2),
            MockInterfaceCall::Write(0x20, 0),
            MockInterfaceCall::Write(0x20, 1),
        ]);
        assert_eq!(calls, want);
    }

    #[test]
    fn test_analog_restart_writes() {
        let mut mock = MockInterface::new();
        mock.setup_word(0x0c, STATUS_READY);
        let mut session: AnalogSession<_> =
            Session::with_config(mock, *SessionConfig::new().spin_limit(0));
        session.start(TimeBase::default()).unwrap();
        assert!(session.poll().unwrap().is_some());
        assert_eq!(session.state(), AcquisitionState::Armed);
        assert_eq!(
            session.take_interface().writes(),
            vec![
                (0x28, 500),
                (0x08, 1),
                (0x08, 3),
                (0x08, 1),
                (0x08, 0),
                (0x28, 500),
                (0x08, 1),
            ]
        );
    }

    #[test]
    fn test_without_restart() {
        let mut mock = MockInterface::new();
        mock.setup_word(0x0c, STATUS_READY);
        let mut session: AnalogSession<_> = Session::with_config(
            mock,
            *SessionConfig::new().spin_limit(0).restart_after_ack(false),
        );
        session.start(TimeBase::Ms20).unwrap();
        assert!(session.poll().unwrap().is_some());
        assert_eq!(
            session.take_interface().writes(),
            vec![(0x28, 10000), (0x08, 1), (0x08, 3), (0x08, 1)]
        );
    }

    #[test]
    fn test_spin_timeout_is_not_fatal() {
        let producer = Producer::new(
            DigitalUnit::CONTROL,
            DigitalUnit::STATUS,
            DigitalUnit::BUFFER,
            |_, _: &mut [u8]| true,
        )
        .ignore_ack(true);
        let ei = fake::Interface::new().with_register_file(producer);
        let mut session: DigitalSession<_> =
            Session::with_config(ei, *SessionConfig::new().spin_limit(16));
        session.start(FREQ_50K).unwrap();
        assert!(poll_until(&mut session, 10).is_some());
        assert_eq!(session.state(), AcquisitionState::Armed);
        // Ready is stuck, so every later poll sees the same frame again.
        assert!(session.poll().unwrap().is_some());
        assert_eq!(session.take_interface().registers().frames_produced(), 1);
    }

    #[test]
    fn test_single_shot() {
        let mut ei = digital_producer(100);
        {
            let mut session: DigitalSession<_> =
                Session::with_config(&mut ei, *SessionConfig::new().single_shot(true));
            session.start(FREQ_50K).unwrap();
            assert!(poll_until(&mut session, 10).is_some());
            assert!(!session.is_running());
            assert!(poll_until(&mut session, 10).is_none());
            assert_eq!(session.setting(), Some(FREQ_50K));
        }
        assert_eq!(ei.registers().frames_produced(), 1);
    }

    #[test]
    fn test_restart_while_running() {
        let mut session: AnalogSession<_> = Session::new(MockInterface::new());
        session.start(TimeBase::Ms1).unwrap();
        session.start(TimeBase::Ms2).unwrap();
        assert_eq!(session.setting(), Some(TimeBase::Ms2));
        assert_eq!(session.poll(), Ok(None));
        assert_eq!(session.state(), AcquisitionState::AwaitingReady);
        assert_eq!(
            session.take_interface().writes(),
            vec![(0x28, 500), (0x08, 1), (0x28, 1000), (0x08, 1)]
        );
    }

    #[test]
    fn test_interface_errors_propagate() {
        let mock = MockInterface::failing_when(|c| match c {
            MockInterfaceCall::Read(0x24) => true,
            _ => false,
        });
        let mut session: DigitalSession<_> = Session::new(mock);
        session.start(FREQ_50K).unwrap();
        assert_eq!(session.poll(), Err(()));
    }

    #[test]
    fn test_failed_stop_leaves_session_running() {
        let mock = MockInterface::failing_when(|c| match c {
            MockInterfaceCall::Write(0x20, 0) => true,
            _ => false,
        });
        let mut session: DigitalSession<_> = Session::new(mock);
        session.start(FREQ_50K).unwrap_err();
        // The arm sequence writes 0 too, so drive the state by hand.
        session.state = AcquisitionState::Armed;
        assert_eq!(session.stop(), Err(()));
        assert!(session.is_running());
        assert_eq!(session.state(), AcquisitionState::Armed);
    }
}
