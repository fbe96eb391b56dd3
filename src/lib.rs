//! Canonicalization, content hashing and `GraphSignature2012` signatures for
//! Linked Data documents.
//!
//! A [`Document`] is canonicalized under a [`Context`] (the term table used to
//! expand compact names such as `dc:title` or `created` into IRIs) into sorted
//! N-Quads. The canonical form is the input of both the [content
//! hash](hash::content_hash) and the [signature](ldp::GraphSignature2012).
//!
//! # Basic Usage
//!
//! ```
//! use graphsig::{hash::content_hash, Context, Document};
//!
//! let document: Document = r#"{
//!   "@context": [
//!     "https://w3id.org/payswarm/v1",
//!     {"ex": "http://example.com/", "id": "http://example.com/id/"}
//!   ],
//!   "@id": "id:1",
//!   "ex:foo": "bar"
//! }"#.parse()?;
//!
//! assert_eq!(
//!   content_hash(&document, Context::payswarm_v1())?,
//!   "urn:sha256:0ae78459e1309a368f22265e047d94407907dd16234fa5629f415c6eb12ef0b3"
//! );
//! # Ok::<(), graphsig::Error>(())
//! ```
//!
//! Signing returns a copy of the document carrying a signature block;
//! verification resolves the signer's public key through a [`KeyResolver`] and
//! leaves trust decisions to a [`TrustPolicy`]:
//!
//! ```
//! # async fn run() -> Result<(), graphsig::Error> {
//! use graphsig::{
//!   AcceptAll, Context, Document, PrivateKey, PublicKeyDocument, SignatureOptions,
//!   StaticKeyResolver, VerificationOptions,
//! };
//!
//! let key = PrivateKey::generate(2048)?;
//! let document: Document = r#"{"id": "urn:x", "dc:title": "Hello"}"#.parse()?;
//! let context = Context::payswarm_v1();
//!
//! let signed = graphsig::sign(
//!   &document,
//!   context,
//!   &key,
//!   &SignatureOptions::new("https://example.com/keys/1"),
//! )?;
//!
//! let mut resolver = StaticKeyResolver::new();
//! resolver.insert(PublicKeyDocument::new(
//!   "https://example.com/keys/1",
//!   key.public_key().to_pem()?,
//! ));
//! graphsig::verify(&signed, context, &resolver, &AcceptAll, &VerificationOptions::default())
//!   .await?;
//! # Ok(())
//! # }
//! ```

pub mod canonical;
pub mod config;
pub mod context;
pub mod error;
pub mod hash;
pub mod key;
pub mod ldp;
pub mod policy;
pub mod rdf;
pub mod resolve;
pub mod value;

pub use canonical::{canonicalize, canonicalize_json};
pub use config::SignerConfig;
pub use context::Context;
pub use error::Error;
pub use hash::content_hash;
pub use key::{PrivateKey, PublicKey};
pub use ldp::{
    sign, verify, GraphSignature2012, SignatureBlock, SignatureOptions, VerificationOptions,
};
pub use policy::{AcceptAll, TrustPolicy, TrustedOwners};
#[cfg(feature = "http")]
pub use resolve::HttpKeyResolver;
pub use resolve::{CachedKeyResolver, KeyResolver, PublicKeyDocument, StaticKeyResolver};
pub use value::{Document, Value};
