use crate::{SafetyError, SafetyResult};

/// Largest CAN-FD payload
pub const CANFD_MAX_LEN: usize = 64;

/// Payload lengths a CAN-FD DLC can encode
const CANFD_LENGTHS: [usize; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 16, 20, 24, 32, 48, 64];

pub fn is_valid_canfd_length(len: usize) -> bool {
    CANFD_LENGTHS.contains(&len)
}

pub fn validate_frame_length(len: usize) -> SafetyResult<()> {
    if !is_valid_canfd_length(len) {
        return Err(SafetyError::InvalidFrameLength(len));
    }
    Ok(())
}

pub fn validate_table_capacity(len: usize, capacity: usize) -> SafetyResult<()> {
    if len > capacity {
        return Err(SafetyError::InvalidConfiguration(format!(
            "RX check table holds {} entries, at most {} can be tracked",
            len, capacity
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_canfd_lengths() {
        for len in [0, 8, 12, 24, 32, 48, 64] {
            assert!(validate_frame_length(len).is_ok());
        }
        for len in [9, 28, 44, 60, 65] {
            assert!(matches!(
                validate_frame_length(len),
                Err(SafetyError::InvalidFrameLength(l)) if l == len
            ));
        }
    }

    #[test]
    fn test_table_capacity() {
        assert!(validate_table_capacity(7, 16).is_ok());
        assert!(validate_table_capacity(16, 16).is_ok());
        assert!(validate_table_capacity(17, 16).is_err());
    }
}
