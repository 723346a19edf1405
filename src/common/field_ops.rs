const NIBBLE_MASK: u8 = 0x0F;

/// Read a single bit, numbered LSB-first from the start of the payload.
///
/// Bits past the end of `data` read as clear.
pub fn get_bit(data: &[u8], bit: usize) -> bool {
    data.get(bit >> 3)
        .map(|byte| (byte >> (bit & 0x07)) & 0x01 != 0)
        .unwrap_or(false)
}

pub fn read_nibble_at(data: &[u8], bit_offset: u8) -> u8 {
    let byte_idx = (bit_offset >> 3) as usize;
    let shift = bit_offset & 0x07;
    data.get(byte_idx)
        .map(|byte| (byte >> shift) & NIBBLE_MASK)
        .unwrap_or(0)
}

pub fn write_nibble_at(data: &mut [u8], bit_offset: u8, value: u8) {
    let byte_idx = (bit_offset >> 3) as usize;
    let shift = bit_offset & 0x07;
    if let Some(byte) = data.get_mut(byte_idx) {
        let mask = !(NIBBLE_MASK << shift);
        *byte = (*byte & mask) | ((value & NIBBLE_MASK) << shift);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_bits_lsb_first() {
        let data = [0x00, 0x20, 0x09];
        assert!(get_bit(&data, 13));
        assert!(get_bit(&data, 16));
        assert!(get_bit(&data, 19));
        assert!(!get_bit(&data, 17));
        assert!(!get_bit(&data, 200));
    }

    #[test]
    fn test_nibbles() {
        let mut data = [0x00, 0xA0];
        write_nibble_at(&mut data, 8, 0x1C);
        assert_eq!(data[1], 0xAC);
        assert_eq!(read_nibble_at(&data, 8), 0x0C);
        assert_eq!(read_nibble_at(&data, 12), 0x0A);
        assert_eq!(read_nibble_at(&data, 40), 0x00);
    }
}
