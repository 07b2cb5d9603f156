//! Random identifier generation
//!
//! Used to derive collision-resistant names for uploaded files.

use rand::rngs::OsRng;
use rand::Rng;

/// Characters a random string is drawn from
pub const RANDOM_STRING_SOURCE: &[u8; 64] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_+";

/// Return a string of `n` characters drawn uniformly from
/// [`RANDOM_STRING_SOURCE`] using the operating system's CSPRNG
///
/// # Examples
/// ```
/// let s = toolbox::random_string(25);
/// assert_eq!(s.len(), 25);
/// ```
pub fn random_string(n: usize) -> String {
    let mut rng = OsRng;
    (0..n)
        .map(|_| char::from(RANDOM_STRING_SOURCE[rng.gen_range(0..RANDOM_STRING_SOURCE.len())]))
        .collect()
}
