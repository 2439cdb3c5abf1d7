use crate::error::DidTokenError;
use std::{fmt, str::FromStr};

/// The issuer of a DID token, in the `did:method-name:method-specific-id` form.
///
/// Parsing only splits on `:`. Neither the `did` prefix nor the method are checked, and anything
/// past the method specific id is ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssuerDid {
    scheme: String,
    method: String,
    id: String,
}

impl IssuerDid {
    /// The scheme, normally `did`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The method name, e.g. `ethr`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The method specific id. For the `ethr` method this is the public address.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl FromStr for IssuerDid {
    type Err = DidTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = public_address(s)?;
        let mut segments = s.split(':');
        let malformed = || DidTokenError::MalformedIssuer(s.to_string());
        let scheme = segments.next().ok_or_else(malformed)?;
        let method = segments.next().ok_or_else(malformed)?;
        Ok(Self { scheme: scheme.to_string(), method: method.to_string(), id: id.to_string() })
    }
}

impl fmt::Display for IssuerDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { scheme, method, id } = self;
        write!(f, "{scheme}:{method}:{id}")
    }
}

/// Extract the public address out of an issuer, which is its third `:` delimited segment.
pub fn public_address(issuer: &str) -> Result<&str, DidTokenError> {
    issuer.split(':').nth(2).ok_or_else(|| DidTokenError::MalformedIssuer(issuer.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::ethr("did:ethr:0xABCDEF", "0xABCDEF")]
    #[case::extra_segments("did:ethr:0xABCDEF:extra", "0xABCDEF")]
    #[case::empty_id("did:ethr:", "")]
    #[case::no_did_prefix("foo:bar:baz", "baz")]
    fn valid_public_address(#[case] issuer: &str, #[case] expected: &str) {
        assert_eq!(public_address(issuer).expect("extraction failed"), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::one_segment("did")]
    #[case::two_segments("did:ethr")]
    fn malformed_public_address(#[case] issuer: &str) {
        let err = public_address(issuer).expect_err("extraction succeeded");
        assert_eq!(err, DidTokenError::MalformedIssuer(issuer.to_string()));
    }

    #[test]
    fn parse_issuer() {
        let did: IssuerDid = "did:ethr:0xABCDEF".parse().expect("parse failed");
        assert_eq!(did.scheme(), "did");
        assert_eq!(did.method(), "ethr");
        assert_eq!(did.id(), "0xABCDEF");
        assert_eq!(did.to_string(), "did:ethr:0xABCDEF");
    }

    #[test]
    fn parse_malformed_issuer() {
        "did:ethr".parse::<IssuerDid>().expect_err("parse succeeded");
    }
}
