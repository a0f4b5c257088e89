use rand::RngCore;

/// Length of a pickup code in characters (3 random bytes as hex)
pub const PICKUP_CODE_LEN: usize = 6;

/// Source of pickup codes for new orders.
///
/// Candidates may repeat. Storage rejects a code held by another open order and
/// the caller draws again; a code is free for reuse once its order completes or
/// is cancelled.
pub trait PickupCodeGenerator: Send + Sync {
    /// Produce a candidate code of six upper-case hex digits
    fn generate(&self) -> String;
}

/// Codes drawn from the thread-local CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomPickupCodes;

impl PickupCodeGenerator for RandomPickupCodes {
    fn generate(&self) -> String {
        let mut bytes = [0u8; PICKUP_CODE_LEN / 2];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode_upper(bytes)
    }
}

/// Trim and upper-case a code typed in by a person; `None` if it cannot be a pickup code
pub fn normalize_pickup_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_ascii_uppercase();
    if is_valid_pickup_code(&code) {
        Some(code)
    } else {
        None
    }
}

pub fn is_valid_pickup_code(code: &str) -> bool {
    code.len() == PICKUP_CODE_LEN
        && code
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
}
