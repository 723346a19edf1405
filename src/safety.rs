//! Composed safety configuration and the generic rx/tx evaluation that
//! consumes it.

use log::{debug, trace, warn};

use crate::can::{CanMsg, CanPacket, RxCheck, RxMsgDef};
use crate::common::counter;
use crate::common::crc_ops::{compute_crc8_h2f_secret, Crc8Lut};
use crate::common::validation;
use crate::{RxStatus, SafetyHooks, SafetyResult};

/// Number of RX checks the harness can track at once
pub const MAX_RX_CHECKS: usize = 16;

/// Latched per-session state, owned by the harness and lent to the hooks.
///
/// Exclusive borrows keep updates of the button pair atomic with respect to
/// the other event path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    pub set_button_prev: bool,
    pub resume_button_prev: bool,
    pub longitudinal: bool,
    pub controls_allowed: bool,
}

impl SessionState {
    pub fn reset_buttons(&mut self) {
        self.set_button_prev = false;
        self.resume_button_prev = false;
    }
}

/// What the checksum pass of one frame covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumParams {
    /// Bytes `1..auth_len` go through the CRC
    pub auth_len: usize,
    /// `None` for unauthenticated identities
    pub secret: Option<u8>,
}

/// Result of matching a frame against the RX check table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxLookup {
    Untracked,
    LengthMismatch { expected: u8 },
    Tracked { index: usize, def: RxMsgDef },
}

/// Tables and accessors selected by a variant's init
#[derive(Debug, Clone, Copy)]
pub struct SafetyConfig {
    pub rx_checks: &'static [RxCheck],
    pub tx_msgs: &'static [CanMsg],
    pub checksum_params: fn(&CanPacket) -> ChecksumParams,
    pub get_counter: fn(&CanPacket) -> u8,
    pub get_checksum: fn(&CanPacket) -> u8,
    /// Absent accessor means every quality-flag check fails
    pub get_quality_flag_valid: Option<fn(&CanPacket) -> bool>,
    pub lut: Crc8Lut,
}

impl SafetyConfig {
    /// Expected checksum byte for `frame`
    pub fn compute_checksum(&self, frame: &CanPacket) -> u8 {
        let params = (self.checksum_params)(frame);
        compute_crc8_h2f_secret(&self.lut, frame.payload(), params.auth_len, params.secret)
    }

    pub fn get_counter(&self, frame: &CanPacket) -> u8 {
        (self.get_counter)(frame)
    }

    pub fn get_checksum(&self, frame: &CanPacket) -> u8 {
        (self.get_checksum)(frame)
    }

    pub fn find_rx_check(&self, frame: &CanPacket) -> RxLookup {
        let mut lookup = RxLookup::Untracked;
        for (index, check) in self.rx_checks.iter().enumerate() {
            for def in check.definitions() {
                if def.addr != frame.addr() || def.bus != frame.bus() {
                    continue;
                }
                if def.len as usize == frame.len() {
                    return RxLookup::Tracked { index, def: *def };
                }
                lookup = RxLookup::LengthMismatch { expected: def.len };
            }
        }
        lookup
    }

    fn find_tx_msg(&self, frame: &CanPacket) -> Option<&CanMsg> {
        self.tx_msgs.iter().find(|msg| msg.matches(frame))
    }

    pub fn tx_allowed(&self, frame: &CanPacket) -> bool {
        self.find_tx_msg(frame).is_some()
    }

    /// Relay-check flag of the allow-list entry matching `frame`
    pub fn relay_checked(&self, frame: &CanPacket) -> Option<bool> {
        self.find_tx_msg(frame).map(|msg| msg.check_relay)
    }
}

/// Per-RxCheck receive state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RxCheckState {
    pub last_counter: u8,
    pub initialized: bool,
    pub last_status: Option<RxStatus>,
}

/// Safety harness: one installed variant plus its session and receive state.
pub struct Safety<H: SafetyHooks> {
    hooks: H,
    config: SafetyConfig,
    session: SessionState,
    rx_state: [RxCheckState; MAX_RX_CHECKS],
}

impl<H: SafetyHooks> Safety<H> {
    /// Install `hooks` and run their init with `param`.
    ///
    /// # Errors
    /// Returns `SafetyError::InvalidConfiguration` if the selected RX table
    /// is larger than [`MAX_RX_CHECKS`].
    pub fn new(hooks: H, param: u16) -> SafetyResult<Self> {
        let mut session = SessionState::default();
        let config = hooks.init(&mut session, param);
        validation::validate_table_capacity(config.rx_checks.len(), MAX_RX_CHECKS)?;
        Ok(Self {
            hooks,
            config,
            session,
            rx_state: [RxCheckState::default(); MAX_RX_CHECKS],
        })
    }

    /// Re-run init, as on a mode re-select. Receive state starts over.
    ///
    /// On error the previous session and configuration stay installed.
    pub fn init(&mut self, param: u16) -> SafetyResult<()> {
        let mut session = self.session;
        let config = self.hooks.init(&mut session, param);
        validation::validate_table_capacity(config.rx_checks.len(), MAX_RX_CHECKS)?;
        self.session = session;
        self.config = config;
        self.rx_state = [RxCheckState::default(); MAX_RX_CHECKS];
        Ok(())
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn config(&self) -> &SafetyConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionState {
        &mut self.session
    }

    pub fn controls_allowed(&self) -> bool {
        self.session.controls_allowed
    }

    pub fn rx_state(&self, index: usize) -> Option<&RxCheckState> {
        if index < self.config.rx_checks.len() {
            self.rx_state.get(index)
        } else {
            None
        }
    }

    /// Validate a received frame and, if trusted, hand it to the variant's
    /// rx hook.
    pub fn rx(&mut self, frame: &CanPacket) -> RxStatus {
        let status = match self.config.find_rx_check(frame) {
            RxLookup::Untracked => {
                trace!("rx {:#x} on bus {} is not tracked", frame.addr(), frame.bus());
                RxStatus::Unchecked
            }
            RxLookup::LengthMismatch { expected } => {
                warn!(
                    "rx {:#x} on bus {}: expected {} bytes, got {}",
                    frame.addr(),
                    frame.bus(),
                    expected,
                    frame.len()
                );
                RxStatus::DataLengthError
            }
            RxLookup::Tracked { index, def } => {
                let status = check_tracked(&self.config, &mut self.rx_state[index], &def, frame);
                self.rx_state[index].last_status = Some(status);
                status
            }
        };

        if status.is_accepted() {
            self.hooks.rx(&mut self.session, frame);
        } else {
            self.session.controls_allowed = false;
        }
        status
    }

    /// Whether `frame` may be put on the bus
    pub fn tx(&self, frame: &CanPacket) -> bool {
        let allowed = self.hooks.tx(&self.config, frame);
        if !allowed {
            debug!(
                "tx {:#x} ({} bytes) on bus {} blocked",
                frame.addr(),
                frame.len(),
                frame.bus()
            );
        }
        allowed
    }
}

fn check_tracked(
    config: &SafetyConfig,
    state: &mut RxCheckState,
    def: &RxMsgDef,
    frame: &CanPacket,
) -> RxStatus {
    if !def.ignore_checksum {
        let received = config.get_checksum(frame);
        let expected = config.compute_checksum(frame);
        if received != expected {
            warn!(
                "rx {:#x}: checksum {:#04x}, expected {:#04x}",
                frame.addr(),
                received,
                expected
            );
            return RxStatus::ChecksumError;
        }
    }

    if def.max_counter > 0 {
        let received = config.get_counter(frame);
        let previous = state.last_counter;
        let status = counter::validate_counter(previous, received, def.max_counter, state.initialized);
        state.last_counter = received;
        state.initialized = true;
        if status != RxStatus::Ok {
            warn!(
                "rx {:#x}: counter {} after {} ({:?})",
                frame.addr(),
                received,
                previous,
                status
            );
            return status;
        }
    }

    if !def.ignore_quality_flag {
        let valid = config
            .get_quality_flag_valid
            .map(|quality| quality(frame))
            .unwrap_or(false);
        if !valid {
            return RxStatus::QualityFlagError;
        }
    }

    RxStatus::Ok
}
