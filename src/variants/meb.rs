//! # MEB (legacy layout)
//!
//! First-generation MEB platforms. The whole frame is authenticated and
//! every safety-relevant message carries its own secret table.

use log::trace;

use super::ids::*;
use super::{meb_get_counter, MebRevision};
use crate::can::{CanPacket, RxCheck};
use crate::common::counter::COUNTER4_MAX;
use crate::config::Revision;
use crate::safety::ChecksumParams;
use crate::secrets::secret_store;

pub const MEB_RX_CHECKS: &[RxCheck] = &[
    RxCheck::counted(MSG_LH_EPS_03, 0, 8, COUNTER4_MAX),
    RxCheck::counted(MSG_MOTOR_14, 0, 8, COUNTER4_MAX),
    RxCheck::counted(MSG_MOTOR_51, 0, 32, COUNTER4_MAX),
    RxCheck::counted(MSG_GRA_ACC_01, 0, 8, COUNTER4_MAX),
    // Assumed length: no legacy base layout was available for QFK_01
    RxCheck::counted(MSG_QFK_01, 0, 24, COUNTER4_MAX),
    RxCheck::counted(MSG_ESC_51, 0, 48, COUNTER4_MAX),
    RxCheck::counted(MSG_MOTOR_54, 0, 32, COUNTER4_MAX),
];

/// Legacy MEB revision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MebLegacy;

impl MebRevision for MebLegacy {
    const REVISION: Revision = Revision::Legacy;
    const RX_CHECKS: &'static [RxCheck] = MEB_RX_CHECKS;

    fn checksum_params(frame: &CanPacket) -> ChecksumParams {
        match secret_store(Self::REVISION).lookup(frame.identity()) {
            Some(entry) => ChecksumParams {
                auth_len: entry.auth_len as usize,
                secret: entry.secret(meb_get_counter(frame)),
            },
            None => {
                // Unknown identity, checksum expected to fail
                trace!("no secret table for {:#x} ({} bytes)", frame.addr(), frame.len());
                ChecksumParams {
                    auth_len: frame.len(),
                    secret: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::crc_ops::compute_crc8_h2f_secret;
    use crate::safety::SessionState;
    use crate::secrets::MEB_LEGACY_SECRETS;
    use crate::variants::test_support::pattern_frame;
    use crate::variants::{select_hooks, Meb};
    use crate::{BuildMode, RxStatus, Safety, SafetyConfig, SafetyHooks};
    use test_log::test;

    fn config() -> SafetyConfig {
        Meb::<MebLegacy>::new(BuildMode::Production).init(&mut SessionState::default(), 0)
    }

    #[test]
    fn test_golden_vectors() {
        let config = config();
        let vectors = [
            (MSG_LH_EPS_03, 8, 0x59),
            (MSG_MOTOR_14, 8, 0x9d),
            (MSG_MOTOR_51, 32, 0xa2),
            (MSG_GRA_ACC_01, 8, 0xfe),
            (MSG_QFK_01, 24, 0x13),
            (MSG_ESC_51, 48, 0xdd),
            (MSG_MOTOR_54, 32, 0x08),
        ];
        for (addr, len, expected) in vectors {
            let frame = pattern_frame(addr, len, 5);
            assert_eq!(frame.byte(1), 0x35);
            assert_eq!(config.compute_checksum(&frame), expected, "{:#x}", addr);
        }
    }

    #[test]
    fn test_golden_vectors_zero_payload() {
        let config = config();
        for (counter, expected) in [(0u8, 0xbd), (1, 0xcf), (2, 0x6b), (3, 0x33)] {
            let mut data = [0u8; 8];
            data[1] = counter;
            let frame = CanPacket::new(0, MSG_GRA_ACC_01, &data).unwrap();
            assert_eq!(config.compute_checksum(&frame), expected);
        }
    }

    #[test]
    fn test_unauthenticated_identity() {
        let config = config();
        let frame = pattern_frame(0x123, 8, 3);
        assert_eq!(
            MebLegacy::checksum_params(&frame),
            ChecksumParams {
                auth_len: 8,
                secret: None
            }
        );
        assert_eq!(config.compute_checksum(&frame), 0x65);
    }

    #[test]
    fn test_checksum_is_deterministic() {
        let config = config();
        let frame = pattern_frame(MSG_ESC_51, 48, 11);
        let first = config.compute_checksum(&frame);
        for _ in 0..4 {
            assert_eq!(config.compute_checksum(&frame), first);
        }
        // bytes past byte 0 and the counter both feed the result
        let mut changed = frame;
        changed.payload_mut()[0] = 0xff;
        assert_eq!(config.compute_checksum(&changed), first);
        let mut changed = frame;
        changed.payload_mut()[47] ^= 0x80;
        assert_ne!(config.compute_checksum(&changed), first);
    }

    #[test]
    fn test_secret_depends_on_counter() {
        let config = config();
        let lut = config.lut;
        for counter in 0..16u8 {
            let frame = pattern_frame(MSG_MOTOR_54, 32, counter);
            let entry = MEB_LEGACY_SECRETS.lookup(frame.identity()).unwrap();
            let expected = compute_crc8_h2f_secret(&lut, frame.payload(), 32, Some(entry.secrets[counter as usize]));
            assert_eq!(config.compute_checksum(&frame), expected);
        }
    }

    #[test]
    fn test_other_layout_is_not_authenticated() {
        // a 2024-length Motor_51 under the legacy tables
        let frame = pattern_frame(MSG_MOTOR_51, 48, 9);
        assert_eq!(MebLegacy::checksum_params(&frame).secret, None);
    }

    #[test]
    fn test_rx_table_is_fully_authenticated() {
        for check in MEB_RX_CHECKS {
            let def = check.msg[0];
            assert_eq!(check.definitions().count(), 1);
            assert_eq!(def.bus, 0);
            assert_eq!(def.max_counter, 15);
            assert!(def.ignore_quality_flag);
            let entry = MEB_LEGACY_SECRETS.lookup(def.identity());
            assert!(entry.is_some(), "{:#x} has no secret table", def.addr);
        }
    }

    #[test]
    fn test_rx_sealed_stream() {
        let hooks = select_hooks(Revision::Legacy, BuildMode::Production);
        let mut safety = Safety::new(hooks, 0).unwrap();
        for step in 0..20u8 {
            let mut frame = pattern_frame(MSG_QFK_01, 24, 0);
            hooks.seal(&mut frame, step % 16);
            assert_eq!(safety.rx(&frame), RxStatus::Ok);
        }
        let mut skipped = pattern_frame(MSG_QFK_01, 24, 0);
        hooks.seal(&mut skipped, 6);
        assert_eq!(safety.rx(&skipped), RxStatus::WrongSequence);

        let long_qfk = pattern_frame(MSG_QFK_01, 32, 7);
        assert_eq!(safety.rx(&long_qfk), RxStatus::DataLengthError);
    }
}
