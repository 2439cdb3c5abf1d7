use crate::{
    claim::{Claim, JsonObject},
    error::{DidTokenError, StructureKind},
};
use base64::{prelude::BASE64_STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// The number of parts in a decoded token: `[proof, claim]`.
pub const EXPECTED_TOKEN_PARTS: usize = 2;

/// A DID token decoder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DidTokenDecoder {
    /// The maximum raw token size, in bytes. No limit is applied if unset.
    pub max_raw_token_size: Option<usize>,
}

impl DidTokenDecoder {
    /// Construct a decoder that rejects raw tokens larger than the given number of bytes.
    pub fn with_max_raw_token_size(max_raw_token_size: usize) -> Self {
        Self { max_raw_token_size: Some(max_raw_token_size) }
    }

    /// Decode a raw DID token.
    ///
    /// Each stage needs the output of the previous one, so errors are reported in this order:
    ///
    /// 1. [`DidTokenError::Encoding`] if the input is not standard, padded base64.
    /// 2. [`DidTokenError::Structure`] if the decoded bytes are not `[proof, claim]` or the claim is not a
    ///    JSON object.
    /// 3. [`DidTokenError::MissingFields`] if the claim lacks any of the required fields.
    pub fn decode(&self, raw: &str) -> Result<DecodedDidToken, DidTokenError> {
        let result = self.decode_parts(raw);
        match &result {
            Ok(decoded) => trace!(proof_length = decoded.proof.len(), "decoded DID token"),
            Err(e) => debug!(kind = ?e.kind(), "failed to decode DID token: {e}"),
        }
        result
    }

    fn decode_parts(&self, raw: &str) -> Result<DecodedDidToken, DidTokenError> {
        if let Some(max) = self.max_raw_token_size {
            if raw.len() > max {
                return Err(DidTokenError::TooLarge(max));
            }
        }
        let bytes = BASE64_STANDARD.decode(raw).map_err(|e| DidTokenError::Encoding(e.to_string()))?;
        let parts: Vec<String> =
            serde_json::from_slice(&bytes).map_err(|e| StructureKind::NotStringArray(e.to_string()))?;
        let [proof, claim]: [String; EXPECTED_TOKEN_PARTS] =
            parts.try_into().map_err(|parts: Vec<String>| StructureKind::PartCount(parts.len()))?;
        let claim: JsonObject =
            serde_json::from_str(&claim).map_err(|e| StructureKind::ClaimNotObject(e.to_string()))?;
        let claim = Claim::new(claim)?;
        Ok(DecodedDidToken { proof, claim })
    }
}

/// The proof and claim decoded out of a raw DID token.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedDidToken {
    pub(crate) proof: String,
    pub(crate) claim: Claim,
}

impl DecodedDidToken {
    /// The proof.
    pub fn proof(&self) -> &str {
        &self.proof
    }

    /// The claim.
    pub fn claim(&self) -> &Claim {
        &self.claim
    }

    /// Split this token into its parts.
    pub fn into_parts(self) -> (String, Claim) {
        (self.proof, self.claim)
    }
}
