use crate::RxStatus;

/// 4-bit rolling counter carried by every tracked MEB message (0-15, modulo 16)
pub const COUNTER4_MAX: u8 = 15;

/// Forward distance from `current` to `received`, with wrap-around
pub fn check_counter_delta(current: u8, received: u8, max_counter: u8) -> u8 {
    let modulo = max_counter as u16 + 1;
    ((modulo + received as u16 - (current as u16 % modulo)) % modulo) as u8
}

/// Rolling counter continuity: exactly one step per frame.
///
/// The first frame seen after init only seeds the counter.
pub fn validate_counter(current: u8, received: u8, max_counter: u8, initialized: bool) -> RxStatus {
    if !initialized {
        return RxStatus::Ok;
    }
    match check_counter_delta(current, received, max_counter) {
        0 => RxStatus::Repeated,
        1 => RxStatus::Ok,
        _ => RxStatus::WrongSequence,
    }
}
