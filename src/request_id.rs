//! Correlation identifiers.
//!
//! Every request gets a fresh 128-bit identifier drawn from the operating
//! system's CSPRNG and rendered as 32 lowercase hex characters. The identifier
//! only exists to group log records, so a broken entropy source must never
//! fail the request: it degrades to [`FALLBACK`] instead.

use rand::TryRngCore;
use rand::rngs::OsRng;

/// Number of random bytes behind one identifier.
const ID_BYTES: usize = 16;

/// Returned when the random source cannot be read.
pub const FALLBACK: &str = "0";

/// Generates a correlation ID from the OS random source.
///
/// ```rust
/// let id = pingd::request_id::generate();
/// assert!(id == "0" || id.len() == 32);
/// ```
pub fn generate() -> String {
    generate_from(&mut OsRng)
}

/// Generates a correlation ID from `rng`, falling back to `"0"` if it fails.
pub fn generate_from<R: TryRngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; ID_BYTES];
    match rng.try_fill_bytes(&mut bytes) {
        Ok(()) => hex::encode(bytes),
        Err(_) => FALLBACK.to_owned(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashSet;
    use std::io;

    use super::*;

    /// A random source that is always unavailable.
    pub(crate) struct Exhausted;

    impl TryRngCore for Exhausted {
        type Error = io::Error;

        fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
            Err(io::Error::other("entropy unavailable"))
        }

        fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
            Err(io::Error::other("entropy unavailable"))
        }

        fn try_fill_bytes(&mut self, _dst: &mut [u8]) -> Result<(), Self::Error> {
            Err(io::Error::other("entropy unavailable"))
        }
    }

    fn is_lower_hex_id(id: &str) -> bool {
        id.len() == 32 && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    #[test]
    fn generated_id_is_32_lowercase_hex_chars() {
        let id = generate();
        assert!(is_lower_hex_id(&id), "unexpected id {id:?}");
    }

    #[test]
    fn ids_do_not_collide() {
        let ids: HashSet<String> = (0..1000).map(|_| generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn failing_source_falls_back_to_zero() {
        assert_eq!(generate_from(&mut Exhausted), "0");
    }
}
