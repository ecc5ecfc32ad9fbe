use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;

/// Get current Unix timestamp in seconds
pub fn get_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Random identifier, `bytes` bytes of OS entropy as lowercase hex.
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

/// Generate a single-use email-verification token (32 random bytes, hex)
pub fn generate_verification_token() -> String {
    random_hex(32)
}

/// Generate a public job identifier (10 random bytes, hex)
pub fn generate_job_uid() -> String {
    random_hex(10)
}

/// Hash a password using Argon2id (recommended for production)
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString},
    };
    use rand::rngs::OsRng;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("Password hashing failed: {}", e))
}

/// Verify a password against its hash
pub fn verify_password(hash: &str, password: &str) -> anyhow::Result<bool> {
    use argon2::{
        Argon2,
        password_hash::{PasswordHash, PasswordVerifier},
    };

    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Validate email format (basic validation)
pub fn is_valid_email(email: &str) -> bool {
    email.contains('@') && email.contains('.') && email.len() > 3
}

/// Validate a student registration id (alphanumeric, 3-20 chars)
pub fn is_valid_reg_id(reg_id: &str) -> bool {
    if reg_id.len() < 3 || reg_id.len() > 20 {
        return false;
    }

    reg_id.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Validate password strength (min 8 chars)
pub fn is_strong_password(password: &str) -> bool {
    password.len() >= 8
}

/// Sanitize string for database (remove null bytes, trim)
pub fn sanitize_string(input: &str) -> String {
    input.replace('\0', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp() {
        let ts = get_timestamp();
        assert!(ts > 0);
    }

    #[test]
    fn test_verification_token() {
        let token1 = generate_verification_token();
        let token2 = generate_verification_token();
        assert_ne!(token1, token2);
        assert_eq!(token1.len(), 64); // 32 bytes as hex
    }

    #[test]
    fn test_job_uid_length() {
        assert_eq!(generate_job_uid().len(), 20); // 10 bytes as hex
    }

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(&hash, password).unwrap());
        assert!(!verify_password(&hash, "wrong_password").unwrap());
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("test@example.com"));
        assert!(!is_valid_email("invalid"));
        assert!(!is_valid_email("@."));
    }

    #[test]
    fn test_reg_id_validation() {
        assert!(is_valid_reg_id("S101"));
        assert!(is_valid_reg_id("reg_2024"));
        assert!(!is_valid_reg_id("ab")); // too short
        assert!(!is_valid_reg_id("reg@id")); // invalid char
    }

    #[test]
    fn test_password_strength() {
        assert!(is_strong_password("password123"));
        assert!(is_strong_password("12345678"));
        assert!(!is_strong_password("short1"));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_string("  test  "), "test");
        assert_eq!(sanitize_string("test\0null"), "testnull");
    }
}
