use chrono::{DateTime, Utc};

/// Canonicalization, signing or verification error.
///
/// Every failure of the verification pipeline has its own variant so that
/// callers can tell an expired signature from an untrusted or tampered one.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("attempt to hash or sign empty canonical data")]
    EmptyInput,

    #[error("invalid key material: {0}")]
    KeyFormat(String),

    #[error("no signed data found")]
    MissingSignature,

    #[error("more than one signed subject found ({0})")]
    MultipleSignatures(usize),

    #[error("malformed signature block: missing or invalid `{0}`")]
    MalformedSignature(&'static str),

    #[error("unsupported signature type `{0}`")]
    UnsupportedAlgorithm(String),

    #[error("unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    #[error("invalid signature timestamp `{0}`")]
    InvalidTimestamp(String),

    #[error("signature timestamp {created} is out of range (now: {now})")]
    SignatureExpired {
        created: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    #[error("unable to resolve public key `{creator}`: {reason}")]
    KeyResolution { creator: String, reason: String },

    #[error("public key `{key}` has been revoked ({revoked})")]
    RevokedKey { key: String, revoked: String },

    #[error("signer `{0}` is not trusted")]
    UntrustedSigner(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid context: {0}")]
    InvalidContext(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn key_resolution(creator: &str, reason: impl ToString) -> Self {
        Self::KeyResolution {
            creator: creator.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub fn key_format(e: impl ToString) -> Self {
        Self::KeyFormat(e.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> String {
        format!("{}", err)
    }
}
