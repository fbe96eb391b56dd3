//! `GraphSignature2012` signatures.
//!
//! A signature block is attached to the signed subject under the
//! `https://w3id.org/security#signature` property:
//!
//! ```json
//! "signature": {
//!   "type": "GraphSignature2012",
//!   "creator": "https://example.com/i/bob/keys/1",
//!   "created": "2012-01-01T00:00:00Z",
//!   "signatureValue": "…"
//! }
//! ```
//!
//! The signature is RSASSA-PKCS1-v1_5 with SHA-256 over
//! `nonce || created || canonical form`, the canonical form being computed
//! over the document without its signature block.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::prelude::*;
use chrono::Duration;
use log::debug;

use crate::canonical::canonicalize;
use crate::context::{
    Context, DC_CREATED, DC_CREATOR, RDF_TYPE, SEC_GRAPH_SIGNATURE_2012, SEC_NONCE,
    SEC_SIGNATURE, SEC_SIGNATURE_VALUE,
};
use crate::error::Error;
use crate::key::PrivateKey;
use crate::policy::TrustPolicy;
pub use crate::rdf::W3C_DATE_FORMAT;
use crate::resolve::KeyResolver;
use crate::value::{Document, Value, AT_GRAPH, AT_TYPE};

/// Media type of JSON-LD documents exchanged with other services.
pub const MEDIA_TYPE_LD_JSON: &str = "application/ld+json";

pub const GRAPH_SIGNATURE_2012: &str = "GraphSignature2012";

/// Maximum distance between a signature's `created` time and the
/// verification time.
pub const DEFAULT_FRESHNESS_WINDOW_MINUTES: i64 = 15;

#[derive(Debug, Clone, Default)]
pub struct SignatureOptions {
    /// IRI of the signing key's public key document.
    pub creator: String,
    /// Defaults to the current time.
    pub created: Option<DateTime<Utc>>,
    pub nonce: Option<String>,
}

impl SignatureOptions {
    pub fn new(creator: impl Into<String>) -> Self {
        Self {
            creator: creator.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerificationOptions {
    /// Accepted distance between `created` and `now`, both ways.
    pub freshness_window: Duration,
    /// Verification time. Defaults to the current time.
    pub now: Option<DateTime<Utc>>,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self {
            freshness_window: Duration::minutes(DEFAULT_FRESHNESS_WINDOW_MINUTES),
            now: None,
        }
    }
}

/// Signature metadata and value, as attached to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBlock {
    pub type_: String,
    pub creator: String,
    pub created: String,
    pub signature_value: String,
    pub nonce: Option<String>,
}

impl SignatureBlock {
    /// Read a block, whatever the spelling of its keys under `context`.
    pub fn from_document(block: &Document, context: &Context) -> Result<Self, Error> {
        let mut type_ = None;
        let mut creator = None;
        let mut created = None;
        let mut signature_value = None;
        let mut nonce = None;
        for (key, value) in block {
            let field = match context.expand_property(key).as_str() {
                AT_TYPE | RDF_TYPE => &mut type_,
                DC_CREATOR => &mut creator,
                DC_CREATED => &mut created,
                SEC_SIGNATURE_VALUE => &mut signature_value,
                SEC_NONCE => &mut nonce,
                _ => continue,
            };
            *field = Some(value);
        }
        fn string(value: Option<&Value>, name: &'static str) -> Result<String, Error> {
            value
                .and_then(Value::as_str)
                .map(ToOwned::to_owned)
                .ok_or(Error::MalformedSignature(name))
        }
        Ok(Self {
            type_: string(type_, "type")?,
            creator: string(creator, "creator")?,
            created: string(created, "created")?,
            signature_value: string(signature_value, "signatureValue")?,
            nonce: match nonce {
                Some(_) => Some(string(nonce, "nonce")?),
                None => None,
            },
        })
    }

    /// Block with its keys compacted through `context`.
    pub fn to_document(&self, context: &Context) -> Document {
        let mut block = Document::new();
        block.insert(context.compact_iri(AT_TYPE), self.type_.as_str());
        block.insert(context.compact_iri(DC_CREATOR), self.creator.as_str());
        block.insert(context.compact_iri(DC_CREATED), self.created.as_str());
        block.insert(
            context.compact_iri(SEC_SIGNATURE_VALUE),
            self.signature_value.as_str(),
        );
        if let Some(nonce) = &self.nonce {
            block.insert(context.compact_iri(SEC_NONCE), nonce.as_str());
        }
        block
    }

    pub fn is_graph_signature_2012(&self, context: &Context) -> bool {
        self.type_ == GRAPH_SIGNATURE_2012
            || context.expand_iri(&self.type_, true) == SEC_GRAPH_SIGNATURE_2012
    }

    pub fn created_at(&self) -> Result<DateTime<Utc>, Error> {
        DateTime::parse_from_rfc3339(&self.created)
            .map(|created| created.with_timezone(&Utc))
            .map_err(|_| Error::InvalidTimestamp(self.created.clone()))
    }
}

/// Bytes whose SHA-256 digest is signed.
pub fn signing_input(nonce: Option<&str>, created: &str, canonical: &[u8]) -> Vec<u8> {
    let nonce = nonce.unwrap_or_default().as_bytes();
    [nonce, created.as_bytes(), canonical].concat()
}

/// Where a signature block sits in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Top { key: String },
    Graph { graph: String, index: usize, key: String },
}

/// Find the only signature block of `document`, looking at the document
/// itself and at the members of its `@graph`.
fn locate(document: &Document, context: &Context) -> Result<(Location, Document), Error> {
    let mut found = Vec::new();
    for (key, value) in document {
        match context.expand_property(key).as_str() {
            SEC_SIGNATURE => {
                for block in value.iter() {
                    found.push((Location::Top { key: key.clone() }, block));
                }
            }
            AT_GRAPH => {
                for (index, member) in value.iter().enumerate() {
                    let member = match member.as_object() {
                        Some(member) => member,
                        None => continue,
                    };
                    for (member_key, value) in member {
                        if context.expand_property(member_key) == SEC_SIGNATURE {
                            for block in value.iter() {
                                let location = Location::Graph {
                                    graph: key.clone(),
                                    index,
                                    key: member_key.clone(),
                                };
                                found.push((location, block));
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    match found.len() {
        0 => Err(Error::MissingSignature),
        1 => {
            let (location, block) = found.remove(0);
            match block.as_object() {
                Some(block) => Ok((location, block.clone())),
                None => Err(Error::MalformedSignature("signature")),
            }
        }
        n => Err(Error::MultipleSignatures(n)),
    }
}

/// Copy of `document` without the block at `location`.
fn strip(document: &Document, location: &Location) -> Document {
    let mut stripped = document.clone();
    match location {
        Location::Top { key } => {
            stripped.remove(key);
        }
        Location::Graph { graph, index, key } => {
            let member = match stripped.get_mut(graph) {
                Some(Value::Array(members)) => members.get_mut(*index),
                Some(member) if *index == 0 => Some(member),
                _ => None,
            };
            if let Some(Value::Object(member)) = member {
                member.remove(key);
            }
        }
    }
    stripped
}

fn is_signed(document: &Document, context: &Context) -> bool {
    !matches!(locate(document, context), Err(Error::MissingSignature))
}

/// <https://w3id.org/security#GraphSignature2012>
pub struct GraphSignature2012;

impl GraphSignature2012 {
    /// Return a signed copy of `document`.
    pub fn sign(
        document: &Document,
        context: &Context,
        key: &PrivateKey,
        options: &SignatureOptions,
    ) -> Result<Document, Error> {
        let local = context.for_document(document)?;
        if is_signed(document, &local) {
            return Err(Error::InvalidDocument(
                "document already carries a signature".to_string(),
            ));
        }
        let canonical = canonicalize(document, context)?;
        if canonical.is_empty() {
            return Err(Error::EmptyInput);
        }
        let created = options
            .created
            .unwrap_or_else(Utc::now)
            .format(W3C_DATE_FORMAT)
            .to_string();
        let input = signing_input(options.nonce.as_deref(), &created, &canonical);
        debug!("signing {} bytes as {}", canonical.len(), options.creator);
        let signature = key.sign_sha256(&input)?;

        let block = SignatureBlock {
            type_: local.compact_iri(SEC_GRAPH_SIGNATURE_2012),
            creator: options.creator.clone(),
            created,
            signature_value: BASE64.encode(signature),
            nonce: options.nonce.clone(),
        };
        let mut signed = document.clone();
        signed.insert(local.compact_iri(SEC_SIGNATURE), block.to_document(&local));
        Ok(signed)
    }

    /// Check the signature of `document`.
    pub async fn verify(
        document: &Document,
        context: &Context,
        resolver: &dyn KeyResolver,
        policy: &dyn TrustPolicy,
        options: &VerificationOptions,
    ) -> Result<(), Error> {
        let local = context.for_document(document)?;
        let (location, block) = locate(document, &local)?;
        let block = SignatureBlock::from_document(&block, &local)?;
        if !block.is_graph_signature_2012(&local) {
            return Err(Error::UnsupportedAlgorithm(block.type_));
        }
        if let Some(nonce) = &block.nonce {
            policy.check_nonce(nonce)?;
        }

        let created = block.created_at()?;
        let now = options.now.unwrap_or_else(Utc::now);
        let window = options.freshness_window;
        // A window too wide to represent leaves that side unbounded.
        let too_old = now
            .checked_sub_signed(window)
            .map_or(false, |earliest| created < earliest);
        let too_new = now
            .checked_add_signed(window)
            .map_or(false, |latest| created > latest);
        if too_old || too_new {
            return Err(Error::SignatureExpired { created, now });
        }

        debug!("resolving signature creator {}", block.creator);
        let mut key = resolver.resolve(&block.creator).await?;
        if key.id.is_empty() {
            key.id = block.creator.clone();
        }
        key.check_revocation()?;
        if !policy.is_trusted(&key) {
            return Err(Error::UntrustedSigner(key.id));
        }
        let public_key = key.public_key()?;

        let canonical = canonicalize(&strip(document, &location), context)?;
        let signature = BASE64
            .decode(&block.signature_value)
            .map_err(|_| Error::InvalidSignature)?;
        let input = signing_input(block.nonce.as_deref(), &block.created, &canonical);
        public_key.verify_sha256(&input, &signature)?;
        debug!("signature by {} verified", block.creator);
        Ok(())
    }
}

/// Shorthand for [`GraphSignature2012::sign`].
pub fn sign(
    document: &Document,
    context: &Context,
    key: &PrivateKey,
    options: &SignatureOptions,
) -> Result<Document, Error> {
    GraphSignature2012::sign(document, context, key, options)
}

/// Shorthand for [`GraphSignature2012::verify`].
pub async fn verify(
    document: &Document,
    context: &Context,
    resolver: &dyn KeyResolver,
    policy: &dyn TrustPolicy,
    options: &VerificationOptions,
) -> Result<(), Error> {
    GraphSignature2012::verify(document, context, resolver, policy, options).await
}
