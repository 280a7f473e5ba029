//! Session cookie tokens
//!
//! `"{session_uuid}.{base64url(hmac_sha256(secret, session_uuid))}"`

use kernel::id::SessionId;
use platform::crypto::{from_base64_url, hmac_sha256, to_base64_url, verify_hmac_sha256};

use crate::error::{AuthError, AuthResult};

/// Sign a session id for the cookie
pub fn issue(secret: &[u8], session_id: &SessionId) -> String {
    let session_id = session_id.to_string();
    let signature = hmac_sha256(secret, session_id.as_bytes());

    format!("{}.{}", session_id, to_base64_url(&signature))
}

/// Verify a cookie token and recover the session id
pub fn parse(secret: &[u8], token: &str) -> AuthResult<SessionId> {
    let (session_id, signature_b64) = token.split_once('.').ok_or(AuthError::SessionInvalid)?;

    let signature = from_base64_url(signature_b64).map_err(|_| AuthError::SessionInvalid)?;

    if !verify_hmac_sha256(secret, session_id.as_bytes(), &signature) {
        return Err(AuthError::SessionInvalid);
    }

    session_id.parse().map_err(|_| AuthError::SessionInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issue_then_parse() {
        let id = SessionId::new();
        let token = issue(SECRET, &id);

        assert!(token.starts_with(&id.to_string()));
        assert_eq!(parse(SECRET, &token).unwrap(), id);
    }

    #[test]
    fn test_rejects_forged_tokens() {
        let id = SessionId::new();
        let token = issue(SECRET, &id);
        let other = SessionId::new();
        let (_, sig) = token.split_once('.').unwrap();

        for forged in [
            format!("{other}.{sig}"),
            id.to_string(),
            format!("{id}.not-base64!"),
            format!("{id}."),
            String::new(),
        ] {
            assert!(matches!(parse(SECRET, &forged), Err(AuthError::SessionInvalid)));
        }

        assert!(matches!(
            parse(b"another secret", &token),
            Err(AuthError::SessionInvalid)
        ));
    }
}
