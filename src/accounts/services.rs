use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::{
    clock::Clock,
    error::StoreError,
    identity::{Identity, IdentityStore},
    ledger::{Ledger, PendingSignup},
};

#[derive(Debug, Error)]
pub enum SignupError {
    #[error("invalid email")]
    InvalidEmail,
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Provisions an unverified identity and its pending-signup entry, stamped
/// with the clock's current time.
///
/// The identity is created first. If the ledger write fails the identity is
/// removed again, since nothing would ever reap it.
#[instrument(skip(identities, ledger, clock))]
pub async fn register_pending(
    identities: &dyn IdentityStore,
    ledger: &dyn Ledger,
    clock: &dyn Clock,
    id: &str,
    email: &str,
) -> Result<PendingSignup, SignupError> {
    let email = email.trim().to_lowercase();
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(SignupError::InvalidEmail);
    }

    identities.create(id, &email).await?;

    let entry = PendingSignup {
        id: id.to_string(),
        email,
        created_at: Some(clock.now()),
    };
    if let Err(e) = ledger.insert(&entry).await {
        error!(user_id = %id, error = %e, "pending signup write failed, rolling back identity");
        if let Err(rollback) = identities.delete(id).await {
            error!(user_id = %id, error = %rollback, "identity rollback failed");
        }
        return Err(e.into());
    }

    info!(user_id = %id, email = %entry.email, "pending signup registered");
    Ok(entry)
}

/// Confirmation link flow: flips the identity's verified flag. The ledger
/// entry stays; the reaper cleans it up once the grace period has passed.
#[instrument(skip(identities))]
pub async fn confirm_verification(
    identities: &dyn IdentityStore,
    id: &str,
) -> Result<Identity, SignupError> {
    let identity = identities.set_verified(id).await?;
    info!(user_id = %id, "email verified");
    Ok(identity)
}
