//! Acquisition and protocol decoding for an FPGA-attached scope and logic
//! analyzer front end.
//!
//! The FPGA exposes its capture units as a small window of 32-bit registers
//! plus two capture regions. This crate talks to that window only through
//! the [`Interface`] trait, so the same code drives real hardware (via the
//! `sigscope-mmio` crate) and the in-memory [`interface::fake`] used by the
//! tests.
//!
//! The usual flow for the logic input is: start a [`DigitalSession`], poll it
//! until it hands back a [`CaptureBuffer`], then pass that to
//! [`analyzer::analyze_capture`] with the chosen [`EncodingScheme`] to get a
//! [`DecodeResult`], which [`report::Report`] can render as text.

#![no_std]

pub mod acquisition;
pub mod analyzer;
pub mod capture;
pub mod clock;
pub mod decode;
pub mod edge;
pub mod error;
pub mod interface;
pub mod low_level;
pub mod meter;
pub mod registers;
pub mod report;

pub use acquisition::{
    AcquisitionState, AnalogSession, AnalogUnit, CaptureUnit, DigitalSession, DigitalUnit,
    Session, SessionConfig,
};
pub use capture::{AnalogFrame, CaptureBuffer};
pub use clock::{BaudCode, ClockSelection, ClockSettings, FrequencyCode, TimeBase};
pub use decode::{BitTiming, DecodeResult, EncodingScheme};
pub use error::DecodeError;
pub use interface::Interface;
pub use meter::{FrequencyMeter, Measurement};
