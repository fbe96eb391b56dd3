//! Content hashes of documents.

use sha2::{Digest, Sha256};

use crate::canonical::canonicalize;
use crate::context::Context;
use crate::error::Error;
use crate::value::Document;

/// URN prefix of content hashes.
pub const SHA256_URN_PREFIX: &str = "urn:sha256:";

/// SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// `urn:sha256:<hex>` identity of the canonical form of `document`.
pub fn content_hash(document: &Document, context: &Context) -> Result<String, Error> {
    let canonical = canonicalize(document, context)?;
    if canonical.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(format!("{}{}", SHA256_URN_PREFIX, hex::encode(sha256(&canonical))))
}
