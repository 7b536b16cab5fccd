//! Human-readable verification codes
//!
//! Codes are printed next to the content hash on signed exports and typed in
//! by hand, so the alphabet leaves out characters that are easy to confuse
//! (`0`/`O`, `1`/`I`).

use rand::Rng;

/// Alphabet used for verification codes (32 symbols)
pub const VERIFICATION_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of every verification code
pub const VERIFICATION_CODE_LEN: usize = 8;

/// Generate a new random verification code.
pub fn generate_verification_code() -> String {
    let mut rng = rand::thread_rng();
    (0..VERIFICATION_CODE_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..VERIFICATION_ALPHABET.len());
            VERIFICATION_ALPHABET[idx] as char
        })
        .collect()
}

/// Check that a code has the right length and only alphabet characters.
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == VERIFICATION_CODE_LEN && code.bytes().all(|b| VERIFICATION_ALPHABET.contains(&b))
}
