//! One-time codes bound to a user and a purpose.
//!
//! Codes are six random digits and stay valid for a fixed window after issue.
//! Issuing a new code never invalidates older ones; verification looks at the
//! most recent record matching the code and purpose.

use rand::Rng;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use super::repo::AccountStore;
use super::repo_types::{Otp, OtpPurpose};

pub const OTP_LEN: usize = 6;
pub const DEFAULT_OTP_TTL: Duration = Duration::minutes(10);

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("invalid OTP")]
    Invalid,
    #[error("OTP has expired")]
    Expired,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:0width$}", n, width = OTP_LEN)
}

fn is_well_formed(code: &str) -> bool {
    code.len() == OTP_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Creates and stores a fresh code for `user_id`.
pub async fn issue(
    store: &dyn AccountStore,
    user_id: Uuid,
    purpose: OtpPurpose,
    ttl: Duration,
) -> anyhow::Result<Otp> {
    let created_at = OffsetDateTime::now_utc();
    let otp = Otp {
        id: Uuid::new_v4(),
        user_id,
        code: generate_code(),
        purpose,
        created_at,
        expires_at: created_at + ttl,
    };
    store.insert_otp(&otp).await?;
    debug!(%user_id, ?purpose, "otp issued");
    Ok(otp)
}

/// Checks `code` against the latest matching record. Does not consume it.
pub async fn verify(
    store: &dyn AccountStore,
    user_id: Uuid,
    code: &str,
    purpose: OtpPurpose,
) -> Result<Otp, OtpError> {
    let code = code.trim();
    if !is_well_formed(code) {
        return Err(OtpError::Invalid);
    }
    let candidate = store.latest_otp(user_id, code, purpose).await?;
    check(candidate, OffsetDateTime::now_utc()).map_err(|e| {
        warn!(%user_id, ?purpose, error = %e, "otp rejected");
        e
    })
}

pub fn check(candidate: Option<Otp>, now: OffsetDateTime) -> Result<Otp, OtpError> {
    let otp = candidate.ok_or(OtpError::Invalid)?;
    if !otp.is_valid_at(now) {
        return Err(OtpError::Expired);
    }
    Ok(otp)
}
