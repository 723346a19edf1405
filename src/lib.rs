//! # Volkswagen MEB CAN Safety
//!
//! Message authentication and transmit gating for the Volkswagen MEB
//! platform, for firmware sitting between a driving-assistance computer and
//! the vehicle's CAN buses.
//!
//! ## Overview
//!
//! Inbound safety-relevant messages are trusted only if they pass:
//! - an authenticated CRC-8H2F checksum with a per-message, per-counter
//!   secret byte
//! - rolling counter continuity (4-bit, modulo 16)
//! - an exact length match against the platform revision's layout
//!
//! Outbound messages must appear on a declarative allow-list keyed by
//! (address, bus, length). A stock list covers lateral control; a
//! longitudinal list is only selectable from a debug-capable build.
//!
//! ## Example
//!
//! ```rust
//! use volkswagen_meb_safety::{select_hooks, BuildMode, CanPacket, Revision, Safety, SafetyResult};
//! use volkswagen_meb_safety::variants::ids::{MSG_ACC_18, MSG_HCA_03};
//!
//! # fn main() -> SafetyResult<()> {
//! let hooks = select_hooks(Revision::Rev2024, BuildMode::Production);
//! let safety = Safety::new(hooks, 0)?;
//!
//! // Steering requests are on the stock allow-list
//! let hca = CanPacket::new(0, MSG_HCA_03, &[0u8; 24])?;
//! assert!(safety.tx(&hca));
//!
//! // Acceleration commands are not
//! let acc = CanPacket::new(0, MSG_ACC_18, &[0u8; 32])?;
//! assert!(!safety.tx(&acc));
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

pub mod can;
pub mod common;
pub mod config;
pub mod safety;
pub mod secrets;
pub mod variants;

pub use can::{CanMsg, CanPacket, MessageId, RxCheck, RxMsgDef};
pub use config::{BuildMode, MebConfig, Revision, SafetyParam};
pub use safety::{ChecksumParams, Safety, SafetyConfig, SessionState};
pub use variants::{select_hooks, select_hooks_for_param, Meb, Meb2024, MebHooks, MebLegacy, MebRevision};

/// Result type for configuration and frame construction
pub type SafetyResult<T> = Result<T, SafetyError>;

/// Outcome of receive-side validation of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxStatus {
    /// Tracked frame passed every check
    Ok,
    /// Frame is not in the RX check table; not safety relevant
    Unchecked,
    /// Checksum mismatch - corrupted or forged frame
    ChecksumError,
    /// Counter did not advance
    Repeated,
    /// Counter skipped or went backwards
    WrongSequence,
    /// Known address and bus, wrong length for this revision
    DataLengthError,
    /// Sender-asserted validity bit is not set
    QualityFlagError,
}

impl RxStatus {
    /// Whether the frame may influence latched state
    pub fn is_accepted(self) -> bool {
        matches!(self, RxStatus::Ok | RxStatus::Unchecked)
    }
}

/// Safety error types
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SafetyError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Payload length no CAN-FD DLC can encode
    #[error("Invalid frame length: {0} bytes is not a CAN-FD payload length")]
    InvalidFrameLength(usize),
}

/// Hook interface each vehicle variant implements.
///
/// The variant chooses its tables at init and sees every trusted frame; the
/// generic checks in [`Safety`] run in between.
pub trait SafetyHooks {
    /// Reset the session and compose the configuration for `param`.
    ///
    /// Total over every parameter value: unknown bits are ignored.
    fn init(&self, session: &mut SessionState, param: u16) -> SafetyConfig;

    /// Variant-specific handling of a frame that passed validation
    fn rx(&self, session: &mut SessionState, frame: &CanPacket);

    /// Transmit permission; allow-list membership unless overridden
    fn tx(&self, config: &SafetyConfig, frame: &CanPacket) -> bool {
        config.tx_allowed(frame)
    }
}
