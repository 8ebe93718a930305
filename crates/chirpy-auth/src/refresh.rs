use rand::RngCore;

/// Refresh tokens stay valid for 60 days unless revoked.
pub const REFRESH_TOKEN_TTL: chrono::Duration = chrono::Duration::days(60);

/// 32 random bytes, hex encoded.
pub fn make_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_64_hex_chars() {
        let token = make_refresh_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(make_refresh_token(), make_refresh_token());
    }
}
