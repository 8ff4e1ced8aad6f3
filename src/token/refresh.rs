use base64::Engine;
use rand::{RngCore, rngs::OsRng};

pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Create a new refresh token from the OS CSPRNG.
///
/// The token carries no structure and no expiry; its only meaning is whether it
/// still equals the value stored for an identity.
///
/// # Errors
/// Returns an error if the OS random source fails.
pub fn generate() -> Result<String, rand::Error> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use std::collections::HashSet;

    #[test]
    fn generate_round_trip() {
        let decoded_len = generate()
            .ok()
            .and_then(|token| URL_SAFE_NO_PAD.decode(token.as_bytes()).ok())
            .map(|bytes| bytes.len());
        assert_eq!(decoded_len, Some(REFRESH_TOKEN_BYTES));
    }

    #[test]
    fn generate_is_url_safe() -> Result<(), rand::Error> {
        let token = generate()?;
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        Ok(())
    }

    #[test]
    fn generate_does_not_repeat() -> Result<(), rand::Error> {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(generate()?));
        }
        Ok(())
    }
}
