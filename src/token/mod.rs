
use crate::{
    claim::Claim,
    decoder::{DecodedDidToken, DidTokenDecoder},
    did::{self, IssuerDid},
    error::DidTokenError,
    validator::{DidTokenValidator, ValidationParameters, ValidationResult},
};
use chrono::{DateTime, Utc};
use std::{fmt, str::FromStr, sync::OnceLock};

/// A DID token.
///
/// Holds the raw, base64 encoded token as received and decodes it the first time any of its
/// contents are accessed. The outcome of that decode, successful or not, is cached and shared
/// by every later call, including concurrent ones.
///
/// # Proof verification
///
/// The token's proof is **not** verified: nothing checks that it was produced by the key behind
/// the claimed issuer. [`DidToken::validate`] only checks the time window and
/// [`DidToken::verify_proof`] always fails with [`DidTokenError::ProofVerificationUnimplemented`].
/// Do not treat [`DidToken::public_address`] as an authenticated identity on its own.
pub struct DidToken {
    raw: String,
    decoder: DidTokenDecoder,
    decoded: OnceLock<Result<DecodedDidToken, DidTokenError>>,
}

impl DidToken {
    /// Construct a token out of its raw representation.
    ///
    /// This never fails, decoding is deferred until the token is used.
    pub fn new<T: Into<String>>(raw: T) -> Self {
        Self::with_decoder(raw, DidTokenDecoder::default())
    }

    /// Construct a token that will be decoded using the given decoder.
    pub fn with_decoder<T: Into<String>>(raw: T, decoder: DidTokenDecoder) -> Self {
        Self { raw: raw.into(), decoder, decoded: OnceLock::new() }
    }

    /// The raw token.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Decode this token into its proof and claim.
    pub fn decode(&self) -> Result<(&str, &Claim), DidTokenError> {
        let decoded = self.decoded()?;
        Ok((&decoded.proof, &decoded.claim))
    }

    /// The proof.
    pub fn proof(&self) -> Result<&str, DidTokenError> {
        Ok(&self.decoded()?.proof)
    }

    /// The proof as raw bytes, decoded from its `0x` prefixed hex form.
    pub fn proof_bytes(&self) -> Result<Vec<u8>, DidTokenError> {
        let proof = self.proof()?;
        let proof = proof.strip_prefix("0x").unwrap_or(proof);
        hex::decode(proof).map_err(|e| DidTokenError::ProofEncoding(e.to_string()))
    }

    /// The claim.
    pub fn claim(&self) -> Result<&Claim, DidTokenError> {
        Ok(&self.decoded()?.claim)
    }

    /// The issuer (`iss`).
    pub fn issuer(&self) -> Result<&str, DidTokenError> {
        self.claim()?.issuer()
    }

    /// The issuer, parsed as a DID.
    pub fn issuer_did(&self) -> Result<IssuerDid, DidTokenError> {
        self.issuer()?.parse()
    }

    /// The public address of the issuer.
    ///
    /// This is the third `:` delimited segment of the issuer, taken verbatim. No key is derived and
    /// nothing ties it to the proof.
    pub fn public_address(&self) -> Result<&str, DidTokenError> {
        did::public_address(self.issuer()?)
    }

    /// The subject (`sub`).
    pub fn subject(&self) -> Result<&str, DidTokenError> {
        self.claim()?.subject()
    }

    /// The audience (`aud`).
    pub fn audience(&self) -> Result<&str, DidTokenError> {
        self.claim()?.audience()
    }

    /// The token id (`tid`).
    pub fn token_id(&self) -> Result<&str, DidTokenError> {
        self.claim()?.token_id()
    }

    /// The time this token was issued at (`iat`).
    pub fn issued_at(&self) -> Result<DateTime<Utc>, DidTokenError> {
        self.claim()?.issued_at()
    }

    /// The time this token expires at (`ext`).
    pub fn expires_at(&self) -> Result<DateTime<Utc>, DidTokenError> {
        self.claim()?.expires_at()
    }

    /// The time before which this token can't be used (`nbf`).
    pub fn not_before(&self) -> Result<DateTime<Utc>, DidTokenError> {
        self.claim()?.not_before()
    }

    /// Validate this token's time window against the system clock.
    ///
    /// The proof is not checked.
    pub fn validate(&self) -> ValidationResult {
        DidTokenValidator::default().validate(self.claim()?)
    }

    /// Validate this token's time window as of the given instant.
    pub fn validate_at(&self, now: DateTime<Utc>) -> ValidationResult {
        DidTokenValidator::default().with_time_provider(now).validate(self.claim()?)
    }

    /// Validate this token's time window against the system clock, using the given parameters.
    pub fn validate_with(&self, parameters: ValidationParameters) -> ValidationResult {
        DidTokenValidator::new(parameters).validate(self.claim()?)
    }

    /// Verify the proof against the issuer.
    ///
    /// Not implemented: after a successful decode this always fails with
    /// [`DidTokenError::ProofVerificationUnimplemented`].
    pub fn verify_proof(&self) -> ValidationResult {
        self.decoded()?;
        Err(DidTokenError::ProofVerificationUnimplemented)
    }

    fn decoded(&self) -> Result<&DecodedDidToken, DidTokenError> {
        self.decoded.get_or_init(|| self.decoder.decode(&self.raw)).as_ref().map_err(Clone::clone)
    }
}

impl Clone for DidToken {
    fn clone(&self) -> Self {
        let decoded = OnceLock::new();
        if let Some(result) = self.decoded.get() {
            let _ = decoded.set(result.clone());
        }
        Self { raw: self.raw.clone(), decoder: self.decoder.clone(), decoded }
    }
}

impl fmt::Debug for DidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DidToken").field("raw", &self.raw).field("decoded", &self.decoded.get()).finish()
    }
}

impl PartialEq for DidToken {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl FromStr for DidToken {
    type Err = DidTokenError;

    /// Parse and eagerly decode a token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = Self::new(s);
        token.decoded()?;
        Ok(token)
    }
}
