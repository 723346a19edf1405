//! Volkswagen MEB variants.
//!
//! Every revision shares the frame layout (checksum in byte 0, rolling
//! counter in the low nibble of byte 1), the transmit allow-lists and the
//! button handling. Revisions differ in message lengths and secret tables.

use std::marker::PhantomData;

use log::debug;

use crate::can::{CanMsg, CanPacket, RxCheck};
use crate::common::crc_ops::{compute_crc8_autosar, gen_crc_lookup_table_8, CRC8_H2F_POLY};
use crate::common::field_ops::{get_bit, read_nibble_at, write_nibble_at};
use crate::config::{BuildMode, MebConfig, Revision, SafetyParam};
use crate::safety::{ChecksumParams, SafetyConfig, SessionState};
use crate::SafetyHooks;

mod meb;
mod meb_2024;

pub use meb::{MebLegacy, MEB_RX_CHECKS};
pub use meb_2024::{Meb2024, MEB_2024_RX_CHECKS};

/// MEB message addresses
pub mod ids {
    pub const MSG_ESC_51: u32 = 0xFC;
    pub const MSG_LH_EPS_03: u32 = 0x9F;
    pub const MSG_QFK_01: u32 = 0x13D;
    pub const MSG_MOTOR_54: u32 = 0x14C;
    pub const MSG_MOTOR_51: u32 = 0x10B;
    pub const MSG_ACC_18: u32 = 0x14D;
    pub const MSG_MEB_ACC_01: u32 = 0x300;
    pub const MSG_HCA_03: u32 = 0x303;
    pub const MSG_GRA_ACC_01: u32 = 0x12B;
    pub const MSG_LDW_02: u32 = 0x397;
    pub const MSG_MOTOR_14: u32 = 0x3BE;
    pub const MSG_TA_01: u32 = 0x26B;
    pub const MSG_KLR_01: u32 = 0x25D;
    pub const MSG_EA_01: u32 = 0x1A4;
    pub const MSG_EA_02: u32 = 0x1F0;
}

use ids::*;

const CHECKSUM_BYTE: usize = 0;
const COUNTER_BIT_OFFSET: u8 = 8;

// GRA_ACC_01 button bits
const BIT_GRA_CANCEL: usize = 13;
const BIT_GRA_SET: usize = 16;
const BIT_GRA_RESUME: usize = 19;

/// Lateral control only. GRA_ACC_01 may go to bus 0 or 2 so both gateway and
/// camera integrations keep working.
pub const MEB_STOCK_TX_MSGS: &[CanMsg] = &[
    CanMsg::new(MSG_HCA_03, 0, 24, true),
    CanMsg::new(MSG_GRA_ACC_01, 0, 8, false),
    CanMsg::new(MSG_EA_01, 0, 8, false),
    CanMsg::new(MSG_EA_02, 0, 8, true),
    CanMsg::new(MSG_KLR_01, 0, 8, false),
    CanMsg::new(MSG_KLR_01, 2, 8, false),
    CanMsg::new(MSG_GRA_ACC_01, 2, 8, false),
    CanMsg::new(MSG_LDW_02, 0, 8, true),
];

/// Lateral plus longitudinal command authority; button passthrough is no
/// longer needed.
pub const MEB_LONG_TX_MSGS: &[CanMsg] = &[
    CanMsg::new(MSG_MEB_ACC_01, 0, 48, true),
    CanMsg::new(MSG_ACC_18, 0, 32, true),
    CanMsg::new(MSG_HCA_03, 0, 24, true),
    CanMsg::new(MSG_EA_01, 0, 8, false),
    CanMsg::new(MSG_EA_02, 0, 8, true),
    CanMsg::new(MSG_KLR_01, 0, 8, false),
    CanMsg::new(MSG_KLR_01, 2, 8, false),
    CanMsg::new(MSG_LDW_02, 0, 8, true),
    CanMsg::new(MSG_TA_01, 0, 8, true),
];

pub fn meb_get_counter(frame: &CanPacket) -> u8 {
    read_nibble_at(frame.payload(), COUNTER_BIT_OFFSET)
}

pub fn meb_get_checksum(frame: &CanPacket) -> u8 {
    frame.byte(CHECKSUM_BYTE)
}

/// Per-revision tables and checksum layout
pub trait MebRevision {
    const REVISION: Revision;
    const RX_CHECKS: &'static [RxCheck];
    const STOCK_TX_MSGS: &'static [CanMsg] = MEB_STOCK_TX_MSGS;
    const LONG_TX_MSGS: &'static [CanMsg] = MEB_LONG_TX_MSGS;

    /// Authenticated length and secret byte for `frame` at its current counter
    fn checksum_params(frame: &CanPacket) -> ChecksumParams;
}

/// Safety hooks for one MEB revision
#[derive(Debug)]
pub struct Meb<R: MebRevision> {
    build_mode: BuildMode,
    revision: PhantomData<R>,
}

impl<R: MebRevision> Clone for Meb<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R: MebRevision> Copy for Meb<R> {}

impl<R: MebRevision> Meb<R> {
    pub fn new(build_mode: BuildMode) -> Self {
        Self {
            build_mode,
            revision: PhantomData,
        }
    }

    pub fn build_mode(&self) -> BuildMode {
        self.build_mode
    }

    /// Write `counter` and the matching checksum into an outbound frame.
    pub fn seal(&self, frame: &mut CanPacket, counter: u8) {
        write_nibble_at(frame.payload_mut(), COUNTER_BIT_OFFSET, counter);
        let params = R::checksum_params(frame);
        let payload = frame.payload();
        let end = params.auth_len.min(payload.len());
        let authenticated = payload.get(1..end).unwrap_or(&[]);
        let checksum = compute_crc8_autosar(&[authenticated, &[params.secret.unwrap_or(0)]]);
        if let Some(byte) = frame.payload_mut().get_mut(CHECKSUM_BYTE) {
            *byte = checksum;
        }
    }
}

impl<R: MebRevision> SafetyHooks for Meb<R> {
    fn init(&self, session: &mut SessionState, param: u16) -> SafetyConfig {
        session.reset_buttons();
        session.controls_allowed = false;
        session.longitudinal = SafetyParam(param).longitudinal_allowed(self.build_mode);

        let tx_msgs = if session.longitudinal {
            R::LONG_TX_MSGS
        } else {
            R::STOCK_TX_MSGS
        };
        debug!(
            "MEB {} init: {:?} build, longitudinal {}, {} rx checks, {} tx msgs",
            R::REVISION,
            self.build_mode,
            session.longitudinal,
            R::RX_CHECKS.len(),
            tx_msgs.len()
        );

        SafetyConfig {
            rx_checks: R::RX_CHECKS,
            tx_msgs,
            checksum_params: R::checksum_params,
            get_counter: meb_get_counter,
            get_checksum: meb_get_checksum,
            get_quality_flag_valid: None,
            lut: gen_crc_lookup_table_8(CRC8_H2F_POLY),
        }
    }

    fn rx(&self, session: &mut SessionState, frame: &CanPacket) {
        if frame.addr() != MSG_GRA_ACC_01 || frame.bus() != 0 {
            return;
        }
        let data = frame.payload();

        // Engage on the falling edge of Set or Resume
        if session.longitudinal {
            let set_button = get_bit(data, BIT_GRA_SET);
            let resume_button = get_bit(data, BIT_GRA_RESUME);
            if (session.set_button_prev && !set_button)
                || (session.resume_button_prev && !resume_button)
            {
                session.controls_allowed = true;
            }
            session.set_button_prev = set_button;
            session.resume_button_prev = resume_button;
        }

        if get_bit(data, BIT_GRA_CANCEL) {
            session.controls_allowed = false;
        }
    }
}

/// Runtime choice between the MEB revisions
#[derive(Debug, Clone, Copy)]
pub enum MebHooks {
    Legacy(Meb<MebLegacy>),
    Rev2024(Meb<Meb2024>),
}

impl MebHooks {
    pub fn revision(&self) -> Revision {
        match self {
            MebHooks::Legacy(_) => MebLegacy::REVISION,
            MebHooks::Rev2024(_) => Meb2024::REVISION,
        }
    }

    pub fn seal(&self, frame: &mut CanPacket, counter: u8) {
        match self {
            MebHooks::Legacy(hooks) => hooks.seal(frame, counter),
            MebHooks::Rev2024(hooks) => hooks.seal(frame, counter),
        }
    }
}

impl SafetyHooks for MebHooks {
    fn init(&self, session: &mut SessionState, param: u16) -> SafetyConfig {
        match self {
            MebHooks::Legacy(hooks) => hooks.init(session, param),
            MebHooks::Rev2024(hooks) => hooks.init(session, param),
        }
    }

    fn rx(&self, session: &mut SessionState, frame: &CanPacket) {
        match self {
            MebHooks::Legacy(hooks) => hooks.rx(session, frame),
            MebHooks::Rev2024(hooks) => hooks.rx(session, frame),
        }
    }
}

pub fn select_hooks(revision: Revision, build_mode: BuildMode) -> MebHooks {
    match revision {
        Revision::Legacy => MebHooks::Legacy(Meb::new(build_mode)),
        Revision::Rev2024 => MebHooks::Rev2024(Meb::new(build_mode)),
    }
}

/// Pick the revision from the host parameter's layout bit
pub fn select_hooks_for_param(param: u16, build_mode: BuildMode) -> MebHooks {
    let config = MebConfig::from_param(param, build_mode);
    select_hooks(config.revision, config.build_mode)
}
