//! Signed session tokens carried in a cookie.
//!
//! A token reads `<user_id>-<expiry>-<signature>`, where `expiry` is a Unix
//! timestamp in seconds and `signature` is the standard base64 (unpadded)
//! HMAC of `<user_id>-<expiry>`. The signature alphabet has no `-`, so the
//! last two dashes always delimit it.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use quill_core::RequestContext;
use sha2::Sha256;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::SessionError;

type HmacSha256 = Hmac<Sha256>;

/// Issues and checks session tokens.
pub trait SessionSigner: Send + Sync {
    /// Token for `user_id`, valid for `max_age_secs` from now.
    fn issue(&self, user_id: &str, max_age_secs: u64) -> String;

    /// The user id carried by `token`, if it is well formed, unexpired and
    /// authentic.
    fn verify(&self, token: &str) -> Result<String, SessionError>;
}

/// HMAC-SHA256 signer keyed by a server secret.
#[derive(Clone)]
pub struct HmacSessionSigner {
    key: HmacSha256,
}

impl HmacSessionSigner {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SessionError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SessionError::EmptySecret);
        }
        let key = HmacSha256::new_from_slice(secret).map_err(|_| SessionError::EmptySecret)?;
        Ok(Self { key })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, SessionError> {
        Self::new(&config.secret)
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        let mut mac = self.key.clone();
        mac.update(payload.as_bytes());
        mac
    }

    /// [`SessionSigner::issue`] with an explicit clock.
    pub fn issue_at(&self, user_id: &str, max_age_secs: u64, now: u64) -> String {
        let payload = format!("{user_id}-{}", now.saturating_add(max_age_secs));
        let signature = STANDARD_NO_PAD.encode(self.mac(&payload).finalize().into_bytes());
        format!("{payload}-{signature}")
    }

    /// [`SessionSigner::verify`] with an explicit clock.
    pub fn verify_at(&self, token: &str, now: u64) -> Result<String, SessionError> {
        let mut parts = token.rsplitn(3, '-');
        let (Some(signature), Some(expiry), Some(user_id)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(SessionError::Malformed);
        };
        if user_id.is_empty() {
            return Err(SessionError::Malformed);
        }
        let expiry: u64 = expiry.parse().map_err(|_| SessionError::Malformed)?;
        if expiry < now {
            return Err(SessionError::Expired);
        }
        let signature = STANDARD_NO_PAD
            .decode(signature)
            .map_err(|_| SessionError::Malformed)?;
        self.mac(&format!("{user_id}-{expiry}"))
            .verify_slice(&signature)
            .map_err(|_| SessionError::BadSignature)?;
        Ok(user_id.to_string())
    }
}

impl std::fmt::Debug for HmacSessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSessionSigner").finish_non_exhaustive()
    }
}

impl SessionSigner for HmacSessionSigner {
    fn issue(&self, user_id: &str, max_age_secs: u64) -> String {
        self.issue_at(user_id, max_age_secs, unix_now())
    }

    fn verify(&self, token: &str) -> Result<String, SessionError> {
        self.verify_at(token, unix_now())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// `Set-Cookie` value for a session token.
pub fn session_cookie(name: &str, token: &str, max_age_secs: u64) -> String {
    format!("{name}={token}; Max-Age={max_age_secs}; Path=/; HttpOnly")
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(name: &str) -> String {
    format!("{name}=-deleted-; Max-Age=0; Path=/; HttpOnly")
}

/// The signed-in user id, read from the session cookie.
///
/// A missing cookie and a rejected token both yield `None`; rejections are
/// logged at `debug`.
pub fn session_user(
    request: &RequestContext,
    config: &SessionConfig,
    signer: &dyn SessionSigner,
) -> Option<String> {
    let token = request.cookie(&config.cookie_name)?;
    match signer.verify(token) {
        Ok(user_id) => Some(user_id),
        Err(e) => {
            debug!(error = %e, "session cookie rejected");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> HmacSessionSigner {
        HmacSessionSigner::new("awesome").unwrap()
    }

    #[test]
    fn token_carries_id_and_expiry() {
        let token = signer().issue_at("0014", 60, 1_000);
        assert!(token.starts_with("0014-1060-"));
        assert_eq!(signer().verify_at(&token, 1_000).unwrap(), "0014");
        assert_eq!(signer().verify_at(&token, 1_060).unwrap(), "0014");
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = signer().issue_at("0014", 60, 1_000);
        assert_eq!(signer().verify_at(&token, 1_061), Err(SessionError::Expired));
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = HmacSessionSigner::new("other").unwrap().issue_at("0014", 60, 1_000);
        assert_eq!(
            signer().verify_at(&token, 1_000),
            Err(SessionError::BadSignature)
        );
    }

    #[test]
    fn tampered_fields_are_rejected() {
        let token = signer().issue_at("0014", 60, 1_000);
        let forged = token.replacen("0014", "0015", 1);
        assert_eq!(signer().verify_at(&forged, 1_000), Err(SessionError::BadSignature));
        let extended = token.replacen("1060", "9999", 1);
        assert_eq!(signer().verify_at(&extended, 1_000), Err(SessionError::BadSignature));
    }

    #[test]
    fn every_issued_token_verifies() {
        let signer = signer();
        for n in 0..200 {
            let user = format!("user{n}");
            let token = signer.issue_at(&user, 60, 1_000);
            let signature = token.rsplit('-').next().unwrap();
            assert!(!signature.contains('-'), "{token}");
            assert_eq!(signer.verify_at(&token, 1_000).as_deref(), Ok(user.as_str()));
        }
    }

    #[test]
    fn malformed_tokens() {
        for token in ["", "abc", "a-b", "a-notanumber-sig", "-1060-sig", "a-1060-!!"] {
            assert_eq!(signer().verify_at(token, 0), Err(SessionError::Malformed), "{token}");
        }
    }

    #[test]
    fn empty_secret_is_refused() {
        assert_eq!(HmacSessionSigner::new("").unwrap_err(), SessionError::EmptySecret);
    }

    #[test]
    fn cookies() {
        assert_eq!(
            session_cookie("s", "tok", 86400),
            "s=tok; Max-Age=86400; Path=/; HttpOnly"
        );
        assert!(clear_session_cookie("s").contains("Max-Age=0"));
    }
}
