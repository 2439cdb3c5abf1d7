use std::fmt;

/// An error when decoding, inspecting or validating a DID token.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DidTokenError {
    #[error("DID token is larger than max allowed: {0} bytes")]
    TooLarge(usize),

    #[error("DID token is malformed, it has to be a base64 encoded JSON serialized string: {0}")]
    Encoding(String),

    #[error("DID token is malformed: {0}")]
    Structure(StructureKind),

    #[error("DID token is missing required field(s): {{{}}}", .fields.join(", "))]
    MissingFields { fields: Vec<&'static str> },

    #[error("claim field '{field}' must be a {expected}")]
    Type { field: &'static str, expected: &'static str },

    #[error("given issuer ({0}) is malformed, it must follow the `did:method-name:method-specific-id` format")]
    MalformedIssuer(String),

    #[error("claim could not be serialized: {0}")]
    Serialization(String),

    #[error("validation failed: {0}")]
    Validation(ValidationKind),

    #[error("proof is not a hex encoded string: {0}")]
    ProofEncoding(String),

    #[error("proof verification is not implemented, the proof has not been checked against the issuer")]
    ProofVerificationUnimplemented,
}

impl DidTokenError {
    /// Get the flat kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TooLarge(_) => ErrorKind::TooLarge,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Structure(_) => ErrorKind::Structure,
            Self::MissingFields { .. } => ErrorKind::MissingFields,
            Self::Type { .. } => ErrorKind::Type,
            Self::MalformedIssuer(_) => ErrorKind::MalformedIssuer,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Validation(ValidationKind::Expired) => ErrorKind::Expired,
            Self::Validation(ValidationKind::NotYetValid) => ErrorKind::NotYetValid,
            Self::ProofEncoding(_) => ErrorKind::ProofEncoding,
            Self::ProofVerificationUnimplemented => ErrorKind::ProofVerificationUnimplemented,
        }
    }

    /// Whether this error was raised while decoding the raw token.
    pub fn is_decode_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::TooLarge | ErrorKind::Encoding | ErrorKind::Structure | ErrorKind::MissingFields)
    }
}

impl From<ValidationKind> for DidTokenError {
    fn from(kind: ValidationKind) -> Self {
        Self::Validation(kind)
    }
}

impl From<StructureKind> for DidTokenError {
    fn from(kind: StructureKind) -> Self {
        Self::Structure(kind)
    }
}

/// The kind of an error, without any of its context.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    TooLarge,
    Encoding,
    Structure,
    MissingFields,
    Type,
    MalformedIssuer,
    Serialization,
    Expired,
    NotYetValid,
    ProofEncoding,
    ProofVerificationUnimplemented,
}

/// The way in which the structure of a token was wrong.
#[derive(Clone, Debug, PartialEq)]
pub enum StructureKind {
    /// The decoded bytes are not a JSON array of strings.
    NotStringArray(String),

    /// The array does not contain exactly `[proof, claim]`.
    PartCount(usize),

    /// The claim is not a JSON serialized object.
    ClaimNotObject(String),
}

impl fmt::Display for StructureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStringArray(e) => write!(f, "it has to be a JSON serialized array of strings: {e}"),
            Self::PartCount(count) => write!(f, "it has to have two parts [proof, claim], found {count}"),
            Self::ClaimNotObject(e) => write!(f, "given claim should be a JSON serialized object: {e}"),
        }
    }
}

/// A time window check that was violated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationKind {
    Expired,
    NotYetValid,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Expired => "given DID token has expired, please generate a new one",
            Self::NotYetValid => "given DID token cannot be used at this time, please check the 'nbf' field",
        };
        write!(f, "{text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn missing_fields_message() {
        let error = DidTokenError::MissingFields { fields: vec!["iat", "tid"] };
        assert_eq!(error.to_string(), "DID token is missing required field(s): {iat, tid}");
    }

    #[rstest]
    #[case::expired(ValidationKind::Expired.into(), ErrorKind::Expired)]
    #[case::not_yet_valid(ValidationKind::NotYetValid.into(), ErrorKind::NotYetValid)]
    #[case::structure(StructureKind::PartCount(3).into(), ErrorKind::Structure)]
    #[case::issuer(DidTokenError::MalformedIssuer("did:ethr".into()), ErrorKind::MalformedIssuer)]
    fn error_kinds(#[case] error: DidTokenError, #[case] expected: ErrorKind) {
        assert_eq!(error.kind(), expected);
    }

    #[rstest]
    #[case::encoding(DidTokenError::Encoding("bad".into()), true)]
    #[case::missing(DidTokenError::MissingFields { fields: vec!["iss"] }, true)]
    #[case::type_error(DidTokenError::Type { field: "iss", expected: "string" }, false)]
    #[case::expired(ValidationKind::Expired.into(), false)]
    fn decode_errors(#[case] error: DidTokenError, #[case] expected: bool) {
        assert_eq!(error.is_decode_error(), expected);
    }
}
