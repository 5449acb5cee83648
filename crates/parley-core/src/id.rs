//! Identifier generation for sessions and messages.
//!
//! Both identifiers are time + random composites: the current Unix time in
//! milliseconds followed by nine lowercase base36 characters.

use chrono::Utc;
use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

/// Returns a random lowercase base36 string of `len` characters.
pub fn random_base36(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Generates a message id: `<unix millis>_<9 base36 chars>`.
pub fn generate_message_id() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "{}_{}",
        Utc::now().timestamp_millis(),
        random_base36(&mut rng, SUFFIX_LEN)
    )
}

/// Generates a session id: `session_<unix millis>_<9 base36 chars>`.
pub fn generate_session_id() -> String {
    format!("session_{}", generate_message_id())
}
