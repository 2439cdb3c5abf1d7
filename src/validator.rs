use crate::{
    claim::Claim,
    error::{DidTokenError, ValidationKind},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace};

/// The grace period applied to the `nbf` field to absorb clock skew between issuer and verifier.
pub const DEFAULT_NBF_GRACE_PERIOD: Duration = Duration::from_secs(300);

/// The result of validating a DID token.
pub type ValidationResult = Result<(), DidTokenError>;

/// Parameters to be used during validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationParameters {
    /// How long before its `nbf` a token is already accepted.
    ///
    /// This only widens the window backwards, tokens are never accepted past their expiration.
    pub nbf_grace_period: Duration,
}

impl Default for ValidationParameters {
    fn default() -> Self {
        Self { nbf_grace_period: DEFAULT_NBF_GRACE_PERIOD }
    }
}

/// Validates the time window of decoded DID tokens.
///
/// This does not verify the token's proof, see [`DidToken::verify_proof`](crate::DidToken::verify_proof).
pub struct DidTokenValidator {
    parameters: ValidationParameters,
    time_provider: Box<dyn TimeProvider>,
}

impl DidTokenValidator {
    /// Construct a new validator that uses the system clock.
    pub fn new(parameters: ValidationParameters) -> Self {
        Self { parameters, time_provider: Box::new(SystemClockTimeProvider) }
    }

    /// Use the given time provider instead of the system clock.
    pub fn with_time_provider<T: TimeProvider>(mut self, time_provider: T) -> Self {
        self.time_provider = Box::new(time_provider);
        self
    }

    /// The parameters used by this validator.
    pub fn parameters(&self) -> &ValidationParameters {
        &self.parameters
    }

    /// Validate a claim.
    pub fn validate(&self, claim: &Claim) -> ValidationResult {
        let result = self.validate_claim(claim);
        match &result {
            Ok(()) => trace!("DID token is within its validity window"),
            Err(e) => debug!(kind = ?e.kind(), "DID token validation failed: {e}"),
        }
        result
    }

    fn validate_claim(&self, claim: &Claim) -> ValidationResult {
        serde_json::to_string(claim).map_err(|e| DidTokenError::Serialization(e.to_string()))?;

        let now = self.time_provider.current_time().timestamp();
        let grace_period = i64::try_from(self.parameters.nbf_grace_period.as_secs()).unwrap_or(i64::MAX);

        let expires_at = claim.seconds("ext")?;
        validate_condition(expires_at >= now, ValidationKind::Expired)?;

        let not_before = claim.seconds("nbf")?;
        validate_condition(not_before.saturating_sub(grace_period) <= now, ValidationKind::NotYetValid)?;
        Ok(())
    }
}

impl Default for DidTokenValidator {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

fn validate_condition(condition: bool, kind: ValidationKind) -> ValidationResult {
    if condition {
        Ok(())
    } else {
        Err(kind.into())
    }
}

/// A source of the current time.
pub trait TimeProvider: Send + Sync + 'static {
    /// Get the current time.
    fn current_time(&self) -> DateTime<Utc>;
}

/// A time provider that reads the system's wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClockTimeProvider;

impl TimeProvider for SystemClockTimeProvider {
    fn current_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// A fixed instant.
impl TimeProvider for DateTime<Utc> {
    fn current_time(&self) -> DateTime<Utc> {
        *self
    }
}
