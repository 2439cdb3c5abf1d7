use crate::error::DidTokenError;
use chrono::{DateTime, Utc};
use serde::{de::Error, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A JSON object.
pub type JsonObject = serde_json::Map<String, Value>;

/// The fields every claim must contain, in the order they're reported when missing.
pub const REQUIRED_FIELDS: [&str; 7] = ["iat", "ext", "nbf", "iss", "sub", "aud", "tid"];

/// The claim embedded in a DID token.
///
/// Only the presence of the [`REQUIRED_FIELDS`] is enforced when a claim is decoded. The types of
/// the values are checked by each accessor, so a claim with e.g. a numeric `iss` decodes fine but
/// [`Claim::issuer`] fails with [`DidTokenError::Type`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Claim(JsonObject);

impl Claim {
    /// Build a claim out of a JSON object, ensuring all required fields are present.
    pub fn new(fields: JsonObject) -> Result<Self, DidTokenError> {
        let missing = missing_fields(&fields);
        if !missing.is_empty() {
            return Err(DidTokenError::MissingFields { fields: missing });
        }
        Ok(Self(fields))
    }

    /// The issuer (`iss`).
    pub fn issuer(&self) -> Result<&str, DidTokenError> {
        self.string("iss")
    }

    /// The subject (`sub`).
    pub fn subject(&self) -> Result<&str, DidTokenError> {
        self.string("sub")
    }

    /// The audience (`aud`).
    pub fn audience(&self) -> Result<&str, DidTokenError> {
        self.string("aud")
    }

    /// The token identifier (`tid`).
    pub fn token_id(&self) -> Result<&str, DidTokenError> {
        self.string("tid")
    }

    /// The time at which the token was issued (`iat`).
    pub fn issued_at(&self) -> Result<DateTime<Utc>, DidTokenError> {
        self.timestamp("iat")
    }

    /// The time at which the token expires (`ext`).
    pub fn expires_at(&self) -> Result<DateTime<Utc>, DidTokenError> {
        self.timestamp("ext")
    }

    /// The time before which the token must not be used (`nbf`).
    pub fn not_before(&self) -> Result<DateTime<Utc>, DidTokenError> {
        self.timestamp("nbf")
    }

    /// Get a raw claim value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get the underlying JSON object.
    pub fn as_object(&self) -> &JsonObject {
        &self.0
    }

    /// Consume this claim and return the underlying JSON object.
    pub fn into_inner(self) -> JsonObject {
        self.0
    }

    /// Read a field as a number of whole seconds since the Unix epoch.
    ///
    /// Both integers and floats are accepted, floats are truncated towards zero.
    pub fn seconds(&self, field: &'static str) -> Result<i64, DidTokenError> {
        let value = self.0.get(field).ok_or(DidTokenError::MissingFields { fields: vec![field] })?;
        let type_error = DidTokenError::Type { field, expected: "number" };
        if let Some(seconds) = value.as_i64() {
            return Ok(seconds);
        }
        // `as` saturates on out of range floats and maps NaN to 0; JSON can't carry NaN anyway.
        value.as_f64().map(|seconds| seconds.trunc() as i64).ok_or(type_error)
    }

    fn timestamp(&self, field: &'static str) -> Result<DateTime<Utc>, DidTokenError> {
        let seconds = self.seconds(field)?;
        DateTime::from_timestamp(seconds, 0).ok_or(DidTokenError::Type { field, expected: "timestamp in range" })
    }

    fn string(&self, field: &'static str) -> Result<&str, DidTokenError> {
        match self.0.get(field) {
            Some(Value::String(value)) => Ok(value),
            Some(_) => Err(DidTokenError::Type { field, expected: "string" }),
            None => Err(DidTokenError::MissingFields { fields: vec![field] }),
        }
    }
}

impl TryFrom<JsonObject> for Claim {
    type Error = DidTokenError;

    fn try_from(fields: JsonObject) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl<'de> Deserialize<'de> for Claim {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = JsonObject::deserialize(deserializer)?;
        Self::new(fields).map_err(D::Error::custom)
    }
}

fn missing_fields(fields: &JsonObject) -> Vec<&'static str> {
    REQUIRED_FIELDS.iter().copied().filter(|field| !fields.contains_key(*field)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn object(value: Value) -> JsonObject {
        value.as_object().cloned().expect("not an object")
    }

    fn full_claim() -> Value {
        json!({
            "iat": 1700000000,
            "ext": 1700000900,
            "nbf": 1700000000,
            "iss": "did:ethr:0xABCDEF",
            "sub": "subject",
            "aud": "audience",
            "tid": "token-id",
        })
    }

    #[test]
    fn all_fields_present() {
        let claim = Claim::new(object(full_claim())).expect("claim rejected");
        assert_eq!(claim.issuer().unwrap(), "did:ethr:0xABCDEF");
        assert_eq!(claim.subject().unwrap(), "subject");
        assert_eq!(claim.audience().unwrap(), "audience");
        assert_eq!(claim.token_id().unwrap(), "token-id");
        assert_eq!(claim.expires_at().unwrap(), DateTime::from_timestamp(1700000900, 0).unwrap());
    }

    #[test]
    fn extra_fields_preserved() {
        let mut fields = object(full_claim());
        fields.insert("add".into(), json!({ "nested": [1, 2] }));
        let claim = Claim::new(fields).expect("claim rejected");
        assert_eq!(claim.get("add"), Some(&json!({ "nested": [1, 2] })));
    }

    #[rstest]
    #[case::one(&["tid"], &["tid"])]
    #[case::canonical_order(&["tid", "iat", "iss"], &["iat", "iss", "tid"])]
    #[case::all(&REQUIRED_FIELDS, &REQUIRED_FIELDS)]
    fn missing(#[case] removed: &[&str], #[case] expected: &[&'static str]) {
        let mut fields = object(full_claim());
        for field in removed {
            fields.remove(*field);
        }
        let err = Claim::new(fields).expect_err("claim accepted");
        assert_eq!(err, DidTokenError::MissingFields { fields: expected.to_vec() });
    }

    #[test]
    fn null_values_count_as_present() {
        let mut fields = object(full_claim());
        fields.insert("sub".into(), Value::Null);
        let claim = Claim::new(fields).expect("claim rejected");
        assert_eq!(claim.subject(), Err(DidTokenError::Type { field: "sub", expected: "string" }));
    }

    #[rstest]
    #[case::integer(json!(1700000000), 1700000000)]
    #[case::float(json!(1700000000.9), 1700000000)]
    #[case::negative_float(json!(-10.5), -10)]
    fn seconds(#[case] value: Value, #[case] expected: i64) {
        let mut fields = object(full_claim());
        fields.insert("ext".into(), value);
        let claim = Claim::new(fields).unwrap();
        assert_eq!(claim.seconds("ext").unwrap(), expected);
    }

    #[rstest]
    #[case::string(json!("1700000000"))]
    #[case::boolean(json!(true))]
    #[case::null(Value::Null)]
    fn non_numeric_seconds(#[case] value: Value) {
        let mut fields = object(full_claim());
        fields.insert("nbf".into(), value);
        let claim = Claim::new(fields).unwrap();
        assert_eq!(claim.seconds("nbf"), Err(DidTokenError::Type { field: "nbf", expected: "number" }));
    }

    #[test]
    fn deserialize_checks_required_fields() {
        let claim: Claim = serde_json::from_value(full_claim()).expect("deserialize failed");
        assert_eq!(serde_json::to_value(&claim).unwrap(), full_claim());

        let err = serde_json::from_value::<Claim>(json!({ "iss": "did:ethr:0x1" })).expect_err("deserialize succeeded");
        assert!(err.to_string().contains("{iat, ext, nbf, sub, aud, tid}"), "{err}");
    }

    #[test]
    fn non_string_issuer() {
        let mut fields = object(full_claim());
        fields.insert("iss".into(), json!(42));
        let claim = Claim::new(fields).unwrap();
        assert_eq!(claim.issuer(), Err(DidTokenError::Type { field: "iss", expected: "string" }));
    }
}
