use crc::{Crc, CRC_8_AUTOSAR};

/// CRC-8H2F / AUTOSAR generator polynomial
pub const CRC8_H2F_POLY: u8 = 0x2F;

/// 256-entry lookup table for a byte-wise CRC-8
pub type Crc8Lut = [u8; 256];

const CRC8_INIT: u8 = 0xFF;
const CRC8_XOR_OUT: u8 = 0xFF;

/// Generate the byte-wise lookup table for an 8-bit CRC with the given polynomial.
///
/// Non-reflected: each candidate byte is shifted left through 8 rounds,
/// folding the polynomial in whenever the top bit falls out.
pub const fn gen_crc_lookup_table_8(poly: u8) -> Crc8Lut {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ poly
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Table-driven CRC-8H2F over `data[1..len]` with a secret byte folded in
/// before the final table pass.
///
/// Byte 0 carries the checksum itself and is never part of the pass. Without
/// a secret the final pass still runs, so the result will not match a frame
/// sealed with any secret.
pub fn compute_crc8_h2f_secret(lut: &Crc8Lut, data: &[u8], len: usize, secret: Option<u8>) -> u8 {
    let mut crc = CRC8_INIT;
    for &byte in data.iter().take(len).skip(1) {
        crc = lut[(crc ^ byte) as usize];
    }
    if let Some(secret) = secret {
        crc ^= secret;
    }
    crc = lut[crc as usize];
    crc ^ CRC8_XOR_OUT
}

/// Compute CRC-8 AUTOSAR (CRC-8H2F) over a sequence of segments
pub fn compute_crc8_autosar(segments: &[&[u8]]) -> u8 {
    let crc = Crc::<u8>::new(&CRC_8_AUTOSAR);
    let mut digest = crc.digest();
    for segment in segments {
        digest.update(segment);
    }
    digest.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_lut_known_entries() {
        let lut = gen_crc_lookup_table_8(CRC8_H2F_POLY);
        assert_eq!(lut[0x00], 0x00);
        assert_eq!(lut[0x01], 0x2f);
        assert_eq!(lut[0x02], 0x5e);
        assert_eq!(lut[0x03], 0x71);
        assert_eq!(lut[0x80], 0xe3);
        assert_eq!(lut[0xff], 0x42);
    }

    #[test]
    fn test_lut_matches_crc_crate_reference() {
        // A single-byte CRC-8 AUTOSAR is init ^ byte through one table pass, then xorout.
        let lut = gen_crc_lookup_table_8(CRC8_H2F_POLY);
        for byte in 0..=255u8 {
            let reference = compute_crc8_autosar(&[&[byte ^ CRC8_INIT]]) ^ CRC8_XOR_OUT;
            assert_eq!(lut[byte as usize], reference, "entry {:#04x}", byte);
        }
    }

    #[test]
    fn test_lut_regeneration_is_stable() {
        assert_eq!(
            gen_crc_lookup_table_8(CRC8_H2F_POLY),
            gen_crc_lookup_table_8(CRC8_H2F_POLY)
        );
    }

    #[test]
    fn test_autosar_check_value() {
        assert_eq!(compute_crc8_autosar(&[b"123456789"]), 0xdf);
        assert_eq!(compute_crc8_autosar(&[b"1234", b"56789"]), 0xdf);
    }

    #[test]
    fn test_secret_fold_equals_appended_byte() {
        let lut = gen_crc_lookup_table_8(CRC8_H2F_POLY);
        let data = [0x00, 0x35, 0x4a, 0x6f, 0x94, 0xb9, 0xde, 0x03];
        for secret in [0x00, 0x6a, 0xf5] {
            assert_eq!(
                compute_crc8_h2f_secret(&lut, &data, data.len(), Some(secret)),
                compute_crc8_autosar(&[&data[1..], &[secret]])
            );
        }
        assert_eq!(
            compute_crc8_h2f_secret(&lut, &data, data.len(), None),
            compute_crc8_autosar(&[&data[1..], &[0x00]])
        );
    }

    #[test]
    fn test_byte_zero_is_excluded() {
        let lut = gen_crc_lookup_table_8(CRC8_H2F_POLY);
        let mut data = [0x00, 0x35, 0x4a, 0x6f, 0x94, 0xb9, 0xde, 0x03];
        let before = compute_crc8_h2f_secret(&lut, &data, data.len(), Some(0x2b));
        data[0] = 0xaa;
        assert_eq!(compute_crc8_h2f_secret(&lut, &data, data.len(), Some(0x2b)), before);
        data[7] ^= 0x01;
        assert_ne!(compute_crc8_h2f_secret(&lut, &data, data.len(), Some(0x2b)), before);
    }

    #[test]
    fn test_length_past_buffer_is_clamped() {
        let lut = gen_crc_lookup_table_8(CRC8_H2F_POLY);
        let data = [0x00, 0x01, 0x02];
        assert_eq!(
            compute_crc8_h2f_secret(&lut, &data, 40, Some(0x10)),
            compute_crc8_h2f_secret(&lut, &data, 3, Some(0x10))
        );
    }
}
