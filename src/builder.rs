use crate::claim::JsonObject;
use base64::{prelude::BASE64_STANDARD, Engine};
use chrono::Utc;
use serde_json::Value;
use std::time::Duration;

// Helper to simplify unwrapping options in the builder
macro_rules! try_get {
    ($option:ident) => {
        $option.ok_or(DidTokenBuildError::MissingField(stringify!($option)))
    };
}

/// A DID token builder.
///
/// The proof is embedded as given, nothing is signed. This is mostly useful to produce tokens for
/// tests and fixtures of services that consume them.
#[derive(Clone, Debug, Default)]
pub struct DidTokenBuilder {
    proof: Option<String>,
    issuer: Option<String>,
    subject: Option<String>,
    audience: Option<String>,
    token_id: Option<String>,
    issued_at: Option<i64>,
    expires_at: Option<i64>,
    not_before: Option<i64>,
    extra: JsonObject,
}

impl DidTokenBuilder {
    /// Set the proof for this token.
    pub fn proof<T: Into<String>>(mut self, proof: T) -> Self {
        self.proof = Some(proof.into());
        self
    }

    /// Set the issuer for this token.
    pub fn issuer<T: Into<String>>(mut self, issuer: T) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Set the subject for this token.
    pub fn subject<T: Into<String>>(mut self, subject: T) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the audience for this token.
    pub fn audience<T: Into<String>>(mut self, audience: T) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Set the token id for this token.
    pub fn token_id<T: Into<String>>(mut self, token_id: T) -> Self {
        self.token_id = Some(token_id.into());
        self
    }

    /// Set the issue timestamp, in seconds since the Unix epoch.
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.issued_at = Some(timestamp);
        self
    }

    /// Set the expiration timestamp, in seconds since the Unix epoch.
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.expires_at = Some(timestamp);
        self
    }

    /// Set the expiration time for this token based on an offset from the current time.
    pub fn expires_in(mut self, offset: Duration) -> Self {
        self.expires_at = Some(offset_from_now(offset));
        self
    }

    /// Set the timestamp when this token first becomes valid.
    pub fn not_before(mut self, timestamp: i64) -> Self {
        self.not_before = Some(timestamp);
        self
    }

    /// Add an extra entry to the claim.
    ///
    /// Entries named after a required field are overridden by it.
    pub fn claim<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Build a raw DID token.
    ///
    /// `iat` and `nbf` default to the current time if unset.
    pub fn build(self) -> Result<String, DidTokenBuildError> {
        let Self { proof, issuer, subject, audience, token_id, issued_at, expires_at, not_before, extra } = self;

        let proof = try_get!(proof)?;
        let issuer = try_get!(issuer)?;
        let subject = try_get!(subject)?;
        let audience = try_get!(audience)?;
        let token_id = try_get!(token_id)?;
        let expires_at = try_get!(expires_at)?;
        let now = Utc::now().timestamp();

        let mut claim = extra;
        claim.insert("iat".into(), issued_at.unwrap_or(now).into());
        claim.insert("ext".into(), expires_at.into());
        claim.insert("nbf".into(), not_before.unwrap_or(now).into());
        claim.insert("iss".into(), issuer.into());
        claim.insert("sub".into(), subject.into());
        claim.insert("aud".into(), audience.into());
        claim.insert("tid".into(), token_id.into());

        let claim = serde_json::to_string(&claim).map_err(DidTokenBuildError::Serde)?;
        let token = serde_json::to_string(&[proof, claim]).map_err(DidTokenBuildError::Serde)?;
        Ok(BASE64_STANDARD.encode(token))
    }
}

fn offset_from_now(offset: Duration) -> i64 {
    let offset = i64::try_from(offset.as_secs()).unwrap_or(i64::MAX);
    Utc::now().timestamp().saturating_add(offset)
}

/// An error during the construction of a DID token.
#[derive(Debug, thiserror::Error)]
pub enum DidTokenBuildError {
    #[error("field {0} is missing")]
    MissingField(&'static str),

    #[error("serde: {0}")]
    Serde(serde_json::Error),
}
