//! # MEB 2024
//!
//! Second-generation layout. Motor_51, QFK_01 and ESC_51 grew and carry new
//! secret tables; their checksum only covers a fixed leading region of the
//! frame. Every other message is authenticated exactly as on the legacy
//! layout.

use super::ids::*;
use super::meb::MebLegacy;
use super::{meb_get_counter, MebRevision};
use crate::can::{CanPacket, RxCheck};
use crate::common::counter::COUNTER4_MAX;
use crate::config::Revision;
use crate::safety::ChecksumParams;
use crate::secrets::secret_store;

pub const MEB_2024_RX_CHECKS: &[RxCheck] = &[
    RxCheck::counted(MSG_LH_EPS_03, 0, 8, COUNTER4_MAX),
    RxCheck::counted(MSG_MOTOR_14, 0, 8, COUNTER4_MAX),
    RxCheck::counted(MSG_MOTOR_51, 0, 48, COUNTER4_MAX),
    RxCheck::counted(MSG_GRA_ACC_01, 0, 8, COUNTER4_MAX),
    RxCheck::counted(MSG_QFK_01, 0, 32, COUNTER4_MAX),
    RxCheck::counted(MSG_ESC_51, 0, 64, COUNTER4_MAX),
    RxCheck::counted(MSG_MOTOR_54, 0, 32, COUNTER4_MAX),
];

/// 2024 MEB revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Meb2024;

impl MebRevision for Meb2024 {
    const REVISION: Revision = Revision::Rev2024;
    const RX_CHECKS: &'static [RxCheck] = MEB_2024_RX_CHECKS;

    fn checksum_params(frame: &CanPacket) -> ChecksumParams {
        match secret_store(Self::REVISION).find_address(frame.addr()) {
            Some(entry) if entry.id.len as usize == frame.len() => ChecksumParams {
                auth_len: entry.auth_len as usize,
                secret: entry.secret(meb_get_counter(frame)),
            },
            // Address reworked in 2024 but framed with another layout
            Some(_) => ChecksumParams {
                auth_len: frame.len(),
                secret: None,
            },
            None => MebLegacy::checksum_params(frame),
        }
    }
}
