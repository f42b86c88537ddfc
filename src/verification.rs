use std::collections::HashMap;
use std::sync::Mutex;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::configuration::VerificationSettings;
use crate::domain::OtpCode;
use crate::domain::SubscriberEmail;
use crate::domain::Topic;

/// What the visitor asked for when the code was issued. Carried on the
/// pending record because the subscriber row is only written to the store
/// after a successful verification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingProfile {
    pub topics: Vec<Topic>,
    pub max_items: u32,
}

/// An issued-but-unconfirmed code awaiting the matching user-submitted code.
/// At most one of these exists per email; issuing a fresh code overwrites the
/// previous record.
#[derive(Clone, Debug)]
struct PendingVerification {
    code: OtpCode,
    profile: PendingProfile,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    attempts: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("No verification is pending for this address")]
    NotFound,
    #[error("The verification code has expired")]
    Expired,
    #[error("The verification code does not match")]
    Mismatch,
    #[error("Too many wrong attempts; request a new code")]
    TooManyAttempts,
}

/// In-memory table of pending verifications, shared across workers.
///
/// All terminal outcomes (success, expiry, attempt exhaustion) delete the
/// record, so a code can never be redeemed twice. State lives only in this
/// process; a restart drops all pending codes, which merely forces affected
/// visitors to request a fresh one.
pub struct VerificationStore {
    ttl: Duration,
    max_attempts: u32,
    pending: Mutex<HashMap<SubscriberEmail, PendingVerification>>,
}

impl VerificationStore {
    pub fn new(cfg: &VerificationSettings) -> Self {
        Self {
            ttl: Duration::seconds(cfg.otp_ttl_seconds),
            max_attempts: cfg.max_attempts,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Generate and record a fresh code for `email`, replacing any prior
    /// pending code (attempt count included). The caller is responsible for
    /// delivering the returned code to the subscriber.
    pub fn issue(
        &self,
        email: &SubscriberEmail,
        profile: PendingProfile,
    ) -> OtpCode {
        self.issue_at(email, profile, Utc::now())
    }

    fn issue_at(
        &self,
        email: &SubscriberEmail,
        profile: PendingProfile,
        now: DateTime<Utc>,
    ) -> OtpCode {
        let code = OtpCode::generate();
        let record = PendingVerification {
            code: code.clone(),
            profile,
            created_at: now,
            expires_at: now + self.ttl,
            attempts: 0,
        };
        self.pending.lock().unwrap().insert(email.clone(), record);
        tracing::info!(email = %email, "issued verification code");
        code
    }

    /// Issue a fresh code while keeping the profile of the existing pending
    /// record, if there is one. Used by the resend flow, where the visitor
    /// never re-enters their preferences.
    pub fn reissue(
        &self,
        email: &SubscriberEmail,
    ) -> OtpCode {
        let profile = self
            .pending
            .lock()
            .unwrap()
            .get(email)
            .map(|r| r.profile.clone())
            .unwrap_or_default();
        self.issue(email, profile)
    }

    /// Check `code` against the pending record for `email`.
    ///
    /// Failure ladder: no record -> `NotFound`; past expiry -> `Expired` (and
    /// the record is dropped); wrong code -> `Mismatch`, until the attempt
    /// cap is exceeded, after which the record is dropped and
    /// `TooManyAttempts` is returned. A matching code consumes the record and
    /// hands back the profile captured at issue time.
    pub fn verify(
        &self,
        email: &SubscriberEmail,
        code: &OtpCode,
    ) -> Result<PendingProfile, VerifyError> {
        self.verify_at(email, code, Utc::now())
    }

    fn verify_at(
        &self,
        email: &SubscriberEmail,
        code: &OtpCode,
        now: DateTime<Utc>,
    ) -> Result<PendingProfile, VerifyError> {
        let mut pending = self.pending.lock().unwrap();

        let record = pending.get_mut(email).ok_or(VerifyError::NotFound)?;

        if now > record.expires_at {
            pending.remove(email);
            return Err(VerifyError::Expired);
        }

        if record.code != *code {
            record.attempts += 1;
            if record.attempts > self.max_attempts {
                pending.remove(email);
                return Err(VerifyError::TooManyAttempts);
            }
            return Err(VerifyError::Mismatch);
        }

        let record = pending.remove(email).unwrap();
        Ok(record.profile)
    }

    /// Minutes a pending record stays redeemable; shown in the verification
    /// email.
    pub fn ttl_minutes(&self) -> i64 { self.ttl.num_minutes() }
}
