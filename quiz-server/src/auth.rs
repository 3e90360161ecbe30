use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("Host password required")]
    MissingHostPassword,
    #[error("Invalid host password")]
    InvalidHostPassword,
    #[error("Invalid join code")]
    InvalidJoinCode,
}

/// Shared-passphrase gate: one password for hosts, an optional join code
/// for players. Only digests are kept in memory.
pub struct PassphraseGate {
    host_digest: [u8; 32],
    join_digest: Option<[u8; 32]>,
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

/// Compares every byte so timing does not depend on where a mismatch is.
fn digests_match(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl PassphraseGate {
    pub fn new(host_password: &str, join_code: Option<&str>) -> Self {
        Self {
            host_digest: digest(host_password),
            join_digest: join_code.map(digest),
        }
    }

    pub fn verify_host(&self, provided: Option<&str>) -> Result<(), AuthError> {
        let provided = provided.ok_or(AuthError::MissingHostPassword)?;
        if digests_match(&self.host_digest, &digest(provided)) {
            Ok(())
        } else {
            tracing::warn!("Rejected host request with wrong password");
            Err(AuthError::InvalidHostPassword)
        }
    }

    pub fn verify_join_code(&self, provided: Option<&str>) -> Result<(), AuthError> {
        let Some(expected) = &self.join_digest else {
            return Ok(());
        };

        match provided {
            Some(code) if digests_match(expected, &digest(code)) => Ok(()),
            _ => Err(AuthError::InvalidJoinCode),
        }
    }

    pub fn requires_join_code(&self) -> bool {
        self.join_digest.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_password() {
        let gate = PassphraseGate::new("secret", None);
        assert_eq!(gate.verify_host(Some("secret")), Ok(()));
        assert_eq!(
            gate.verify_host(Some("Secret")),
            Err(AuthError::InvalidHostPassword)
        );
        assert_eq!(gate.verify_host(None), Err(AuthError::MissingHostPassword));
    }

    #[test]
    fn test_join_code_optional() {
        let open = PassphraseGate::new("secret", None);
        assert!(!open.requires_join_code());
        assert_eq!(open.verify_join_code(None), Ok(()));
        assert_eq!(open.verify_join_code(Some("anything")), Ok(()));

        let gated = PassphraseGate::new("secret", Some("QUIZ42"));
        assert!(gated.requires_join_code());
        assert_eq!(gated.verify_join_code(Some("QUIZ42")), Ok(()));
        assert_eq!(
            gated.verify_join_code(Some("quiz42")),
            Err(AuthError::InvalidJoinCode)
        );
        assert_eq!(gated.verify_join_code(None), Err(AuthError::InvalidJoinCode));
    }
}
