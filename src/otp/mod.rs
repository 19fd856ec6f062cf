mod store;

pub use store::{MemoryOtpStore, OtpStore};

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::auth::{hash_password, is_strong_password, verify_password};
use crate::credentials::CredentialStore;
use crate::email::Mailer;
use crate::error::AppError;

/// Minutes an issued code stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Failed verification attempts allowed before the record is discarded.
pub const MAX_VERIFY_ATTEMPTS: u32 = 3;

/// A live one-time code for a single email address.
#[derive(Debug, Clone, PartialEq)]
pub struct OtpRecord {
    /// 6-digit numeric code as sent to the user.
    pub code: String,
    /// When the code was issued.
    pub issued_at: DateTime<Utc>,
    /// Failed verification attempts so far.
    pub attempts: u32,
    /// Whether the code has been matched since issuance. Reset of the
    /// password is only allowed once this is true.
    pub verified: bool,
}

impl OtpRecord {
    pub fn new(code: String) -> Self {
        OtpRecord {
            code,
            issued_at: Utc::now(),
            attempts: 0,
            verified: false,
        }
    }

    /// A record older than the TTL is treated as absent everywhere.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.issued_at) > Duration::minutes(OTP_TTL_MINUTES)
    }
}

/// Uniformly random 6-digit code.
fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Outcomes of the reset flow that map onto user-facing messages.
#[derive(Debug, Clone, PartialEq)]
pub enum ResetError {
    /// No live OTP record exists for the email.
    NotFound,
    /// The record outlived the 10-minute window.
    Expired,
    /// Submitted code does not match; more attempts remain.
    InvalidCode,
    /// Third failed attempt; the record has been discarded.
    LockedOut,
    /// Reset was attempted before the code was verified.
    NotVerified,
    /// New password fails the strength policy.
    WeakPassword,
    /// New password is identical to the current one.
    SamePassword,
    /// No account exists for the email.
    UserNotFound,
    /// The OTP email could not be delivered.
    SendFailure,
    /// Collaborator failure (store, database).
    Internal(String),
}

impl fmt::Display for ResetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetError::NotFound => write!(f, "No OTP request found"),
            ResetError::Expired => write!(f, "OTP expired"),
            ResetError::InvalidCode => write!(f, "Invalid OTP"),
            ResetError::LockedOut => {
                write!(f, "Too many failed attempts. Please request a new OTP.")
            }
            ResetError::NotVerified => write!(
                f,
                "OTP verification required. Please verify the OTP sent to your email."
            ),
            ResetError::WeakPassword => write!(
                f,
                "Password must contain at least 8 characters, one uppercase letter, \
                 one lowercase letter, one number, and one special character"
            ),
            ResetError::SamePassword => {
                write!(f, "New password must be different from current password")
            }
            ResetError::UserNotFound => write!(f, "User not found"),
            ResetError::SendFailure => write!(f, "Failed to send OTP"),
            ResetError::Internal(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ResetError {}

impl From<AppError> for ResetError {
    fn from(error: AppError) -> ResetError {
        ResetError::Internal(error.to_string())
    }
}

/// Drives the password reset flow: issue a code, verify it, change the
/// password. Collaborators are trait objects so handlers and tests can
/// wire their own backends.
#[derive(Clone)]
pub struct ResetCoordinator {
    store: Arc<dyn OtpStore>,
    mailer: Arc<dyn Mailer>,
    credentials: Arc<dyn CredentialStore>,
}

impl ResetCoordinator {
    pub fn new(
        store: Arc<dyn OtpStore>,
        mailer: Arc<dyn Mailer>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        ResetCoordinator {
            store,
            mailer,
            credentials,
        }
    }

    /// Issues a fresh code for `email` and mails it out.
    ///
    /// Replaces any earlier record for the address. Unknown emails are
    /// skipped without telling the caller, so the endpoint cannot be used
    /// to probe which addresses have accounts.
    pub async fn request_reset(&self, email: &str) -> Result<(), ResetError> {
        self.store.cleanup_expired(OTP_TTL_MINUTES).await?;

        if self.credentials.find_password_hash(email).await?.is_none() {
            log::info!("Password reset requested for unknown email {}", email);
            return Ok(());
        }

        let code = generate_code();
        self.store.set(email, OtpRecord::new(code.clone())).await?;

        let body = format!(
            "Your OTP for password reset is: {}. This OTP will expire in 10 minutes.",
            code
        );
        if let Err(error) = self.mailer.send(email, "Password Reset OTP", &body).await {
            log::error!("Failed to send OTP email to {}: {}", email, error);
            return Err(ResetError::SendFailure);
        }

        log::info!("OTP issued for {}", email);
        Ok(())
    }

    /// Checks `submitted_code` against the live record for `email`.
    ///
    /// A wrong code counts against the attempt limit; the third failure
    /// discards the record. A correct code marks the record verified and
    /// keeps it, so verification can be repeated until expiry or reset.
    pub async fn verify_otp(&self, email: &str, submitted_code: &str) -> Result<(), ResetError> {
        let mut record = match self.store.get(email).await? {
            Some(record) => record,
            None => return Err(ResetError::NotFound),
        };

        if record.is_expired(Utc::now()) {
            self.store.delete(email).await?;
            return Err(ResetError::Expired);
        }

        if submitted_code != record.code {
            record.attempts += 1;
            if record.attempts >= MAX_VERIFY_ATTEMPTS {
                self.store.delete(email).await?;
                return Err(ResetError::LockedOut);
            }
            self.store.set(email, record).await?;
            return Err(ResetError::InvalidCode);
        }

        record.verified = true;
        self.store.set(email, record).await?;
        Ok(())
    }

    /// Replaces the account password once the email holds a verified code.
    ///
    /// The verified-record gate runs before the account lookup, so a
    /// caller who never verified a code learns nothing about whether the
    /// account exists.
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
    ) -> Result<(), ResetError> {
        if !is_strong_password(new_password) {
            return Err(ResetError::WeakPassword);
        }

        let record = match self.store.get(email).await? {
            Some(record) => record,
            None => return Err(ResetError::NotVerified),
        };
        if record.is_expired(Utc::now()) {
            self.store.delete(email).await?;
            return Err(ResetError::Expired);
        }
        if !record.verified {
            return Err(ResetError::NotVerified);
        }

        let current_hash = match self.credentials.find_password_hash(email).await? {
            Some(hash) => hash,
            None => return Err(ResetError::UserNotFound),
        };

        if verify_password(new_password, &current_hash)? {
            return Err(ResetError::SamePassword);
        }

        self.store.delete(email).await?;
        let new_hash = hash_password(new_password)?;
        self.credentials
            .update_password_hash(email, &new_hash)
            .await?;

        log::info!("Password updated for {}", email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;
    use crate::email::MemoryMailer;
    use async_trait::async_trait;

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), AppError> {
            Err(AppError::InternalServerError("connection refused".to_string()))
        }
    }

    struct Harness {
        coordinator: ResetCoordinator,
        store: Arc<MemoryOtpStore>,
        mailer: Arc<MemoryMailer>,
        credentials: Arc<MemoryCredentialStore>,
    }

    const EMAIL: &str = "reader@example.com";
    const CURRENT_PASSWORD: &str = "OldPass1!";

    async fn harness() -> Harness {
        let store = Arc::new(MemoryOtpStore::new());
        let mailer = Arc::new(MemoryMailer::new());
        let credentials = Arc::new(MemoryCredentialStore::new());
        credentials
            .insert(EMAIL, &hash_password(CURRENT_PASSWORD).unwrap())
            .await;
        let coordinator =
            ResetCoordinator::new(store.clone(), mailer.clone(), credentials.clone());
        Harness {
            coordinator,
            store,
            mailer,
            credentials,
        }
    }

    /// Pulls the issued code out of the mailed body.
    fn extract_code(body: &str) -> String {
        body.chars().filter(|c| c.is_ascii_digit()).take(6).collect()
    }

    #[test]
    fn test_generated_codes_are_six_digits_in_range() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().expect("numeric code");
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[actix_rt::test]
    async fn test_request_reset_stores_record_and_mails_code() {
        let h = harness().await;
        h.coordinator.request_reset(EMAIL).await.unwrap();

        let sent = h.mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, EMAIL);
        assert_eq!(sent[0].subject, "Password Reset OTP");
        assert!(sent[0].body.contains("expire in 10 minutes"));

        let record = h.store.get(EMAIL).await.unwrap().expect("record stored");
        assert_eq!(record.code, extract_code(&sent[0].body));
        assert_eq!(record.attempts, 0);
        assert!(!record.verified);
    }

    #[actix_rt::test]
    async fn test_request_reset_replaces_prior_record() {
        let h = harness().await;

        // 000000 is outside the generated range, so a fresh issue can
        // never collide with it.
        let mut prior = OtpRecord::new("000000".to_string());
        prior.verified = true;
        prior.attempts = 2;
        h.store.set(EMAIL, prior).await.unwrap();

        h.coordinator.request_reset(EMAIL).await.unwrap();

        let record = h.store.get(EMAIL).await.unwrap().unwrap();
        assert_ne!(record.code, "000000");
        assert_eq!(record.attempts, 0);
        assert!(!record.verified);
    }

    #[actix_rt::test]
    async fn test_request_reset_unknown_email_acks_without_issuing() {
        let h = harness().await;
        h.coordinator
            .request_reset("stranger@example.com")
            .await
            .unwrap();

        assert!(h.mailer.sent().await.is_empty());
        assert!(h
            .store
            .get("stranger@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[actix_rt::test]
    async fn test_request_reset_surfaces_send_failure() {
        let store = Arc::new(MemoryOtpStore::new());
        let credentials = Arc::new(MemoryCredentialStore::new());
        credentials
            .insert(EMAIL, &hash_password(CURRENT_PASSWORD).unwrap())
            .await;
        let coordinator =
            ResetCoordinator::new(store.clone(), Arc::new(FailingMailer), credentials);

        let result = coordinator.request_reset(EMAIL).await;
        assert_eq!(result, Err(ResetError::SendFailure));
        // The record stays; a retry that succeeds would replace it anyway.
        assert!(store.get(EMAIL).await.unwrap().is_some());
    }

    #[actix_rt::test]
    async fn test_request_reset_purges_expired_records() {
        let h = harness().await;

        let mut stale = OtpRecord::new("000000".to_string());
        stale.issued_at = Utc::now() - Duration::minutes(11);
        h.store.set("stale@example.com", stale).await.unwrap();

        h.coordinator.request_reset(EMAIL).await.unwrap();
        assert!(h.store.get("stale@example.com").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_verify_marks_record_and_repeats() {
        let h = harness().await;
        h.coordinator.request_reset(EMAIL).await.unwrap();
        let code = extract_code(&h.mailer.sent().await[0].body);

        h.coordinator.verify_otp(EMAIL, &code).await.unwrap();
        let record = h.store.get(EMAIL).await.unwrap().unwrap();
        assert!(record.verified);

        // The record is kept, so verifying again still succeeds.
        h.coordinator.verify_otp(EMAIL, &code).await.unwrap();
    }

    #[actix_rt::test]
    async fn test_verify_without_request_reports_not_found() {
        let h = harness().await;
        let result = h.coordinator.verify_otp(EMAIL, "123456").await;
        assert_eq!(result, Err(ResetError::NotFound));
    }

    #[actix_rt::test]
    async fn test_verify_expired_record_deletes_it() {
        let h = harness().await;

        let mut record = OtpRecord::new("123456".to_string());
        record.issued_at = Utc::now() - Duration::minutes(11);
        h.store.set(EMAIL, record).await.unwrap();

        let result = h.coordinator.verify_otp(EMAIL, "123456").await;
        assert_eq!(result, Err(ResetError::Expired));
        assert!(h.store.get(EMAIL).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_verify_within_window_still_succeeds() {
        let h = harness().await;

        let mut record = OtpRecord::new("123456".to_string());
        record.issued_at = Utc::now() - Duration::minutes(9);
        h.store.set(EMAIL, record).await.unwrap();

        h.coordinator.verify_otp(EMAIL, "123456").await.unwrap();
    }

    #[actix_rt::test]
    async fn test_lockout_on_third_wrong_attempt() {
        let h = harness().await;
        h.coordinator.request_reset(EMAIL).await.unwrap();
        let code = extract_code(&h.mailer.sent().await[0].body);

        let result = h.coordinator.verify_otp(EMAIL, "000000").await;
        assert_eq!(result, Err(ResetError::InvalidCode));
        assert_eq!(h.store.get(EMAIL).await.unwrap().unwrap().attempts, 1);

        let result = h.coordinator.verify_otp(EMAIL, "000000").await;
        assert_eq!(result, Err(ResetError::InvalidCode));
        assert_eq!(h.store.get(EMAIL).await.unwrap().unwrap().attempts, 2);

        let result = h.coordinator.verify_otp(EMAIL, "000000").await;
        assert_eq!(result, Err(ResetError::LockedOut));
        assert!(h.store.get(EMAIL).await.unwrap().is_none());

        // The once-correct code is gone with the record.
        let result = h.coordinator.verify_otp(EMAIL, &code).await;
        assert_eq!(result, Err(ResetError::NotFound));
    }

    #[actix_rt::test]
    async fn test_reset_rejects_weak_passwords() {
        let h = harness().await;

        for weak in ["abc", "abcdefgh", "ABCDEFG1!", "abcdefg1!", "Abcdefgh!"] {
            let result = h.coordinator.reset_password(EMAIL, weak).await;
            assert_eq!(result, Err(ResetError::WeakPassword), "{:?}", weak);
        }
    }

    #[actix_rt::test]
    async fn test_reset_requires_verified_record() {
        let h = harness().await;

        // No record at all.
        let result = h.coordinator.reset_password(EMAIL, "Abcdef1!").await;
        assert_eq!(result, Err(ResetError::NotVerified));

        // Issued but never verified.
        h.coordinator.request_reset(EMAIL).await.unwrap();
        let result = h.coordinator.reset_password(EMAIL, "Abcdef1!").await;
        assert_eq!(result, Err(ResetError::NotVerified));
    }

    #[actix_rt::test]
    async fn test_reset_gate_runs_before_account_lookup() {
        let store = Arc::new(MemoryOtpStore::new());
        let coordinator = ResetCoordinator::new(
            store.clone(),
            Arc::new(MemoryMailer::new()),
            Arc::new(MemoryCredentialStore::new()),
        );

        // Unverified record, no account: the gate answers first.
        store
            .set(EMAIL, OtpRecord::new("123456".to_string()))
            .await
            .unwrap();
        let result = coordinator.reset_password(EMAIL, "Abcdef1!").await;
        assert_eq!(result, Err(ResetError::NotVerified));

        // Verified record, no account: only now is the account missing.
        let mut verified = OtpRecord::new("123456".to_string());
        verified.verified = true;
        store.set(EMAIL, verified).await.unwrap();
        let result = coordinator.reset_password(EMAIL, "Abcdef1!").await;
        assert_eq!(result, Err(ResetError::UserNotFound));
    }

    #[actix_rt::test]
    async fn test_reset_expired_record_deletes_it() {
        let h = harness().await;

        let mut record = OtpRecord::new("123456".to_string());
        record.verified = true;
        record.issued_at = Utc::now() - Duration::minutes(11);
        h.store.set(EMAIL, record).await.unwrap();

        let result = h.coordinator.reset_password(EMAIL, "Abcdef1!").await;
        assert_eq!(result, Err(ResetError::Expired));
        assert!(h.store.get(EMAIL).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_reset_rejects_same_password() {
        let h = harness().await;
        h.coordinator.request_reset(EMAIL).await.unwrap();
        let code = extract_code(&h.mailer.sent().await[0].body);
        h.coordinator.verify_otp(EMAIL, &code).await.unwrap();

        let result = h.coordinator.reset_password(EMAIL, CURRENT_PASSWORD).await;
        assert_eq!(result, Err(ResetError::SamePassword));
    }

    #[actix_rt::test]
    async fn test_full_flow_updates_hash_and_consumes_record() {
        let h = harness().await;
        h.coordinator.request_reset(EMAIL).await.unwrap();
        let code = extract_code(&h.mailer.sent().await[0].body);
        h.coordinator.verify_otp(EMAIL, &code).await.unwrap();

        h.coordinator
            .reset_password(EMAIL, "NewPass1!")
            .await
            .unwrap();

        assert!(h.store.get(EMAIL).await.unwrap().is_none());

        let hash = h
            .credentials
            .find_password_hash(EMAIL)
            .await
            .unwrap()
            .expect("account still present");
        assert!(verify_password("NewPass1!", &hash).unwrap());
        assert!(!verify_password(CURRENT_PASSWORD, &hash).unwrap());

        // The consumed record also blocks an immediate second reset.
        let result = h.coordinator.reset_password(EMAIL, "Other1!a").await;
        assert_eq!(result, Err(ResetError::NotVerified));
    }
}
