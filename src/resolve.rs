//! Resolution of signature creators to public key documents.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::key::PublicKey;

#[cfg(feature = "http")]
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Media types accepted from key servers.
pub const ACCEPT_KEY_DOCUMENT: &str = "application/ld+json, application/json";

/// Public key document served at a creator IRI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyDocument {
    /// Empty when the document leaves its identity implicit; resolvers then
    /// fill in the IRI it was fetched from.
    #[serde(alias = "@id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(alias = "sec:publicKeyPem", alias = "https://w3id.org/security#publicKeyPem")]
    pub public_key_pem: String,
    /// Present once the key has been revoked, usually as a timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked: Option<serde_json::Value>,
    #[serde(flatten)]
    pub property_set: BTreeMap<String, serde_json::Value>,
}

impl PublicKeyDocument {
    pub fn new(id: impl Into<String>, public_key_pem: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner: None,
            public_key_pem: public_key_pem.into(),
            revoked: None,
            property_set: BTreeMap::new(),
        }
    }

    pub fn public_key(&self) -> Result<PublicKey, Error> {
        PublicKey::from_pem(&self.public_key_pem)
    }

    /// Fail with [`Error::RevokedKey`] if the key carries a revocation.
    pub fn check_revocation(&self) -> Result<(), Error> {
        match &self.revoked {
            None => Ok(()),
            Some(revoked) => Err(Error::RevokedKey {
                key: self.id.clone(),
                revoked: match revoked {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            }),
        }
    }
}

/// Dereferences a creator IRI to its public key document.
#[async_trait]
pub trait KeyResolver: Sync {
    async fn resolve(&self, creator: &str) -> Result<PublicKeyDocument, Error>;
}

/// In-memory key directory.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyResolver {
    keys: HashMap<String, PublicKeyDocument>,
}

impl StaticKeyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `key` under its `id`.
    pub fn insert(&mut self, key: PublicKeyDocument) -> Option<PublicKeyDocument> {
        self.keys.insert(key.id.clone(), key)
    }
}

impl FromIterator<PublicKeyDocument> for StaticKeyResolver {
    fn from_iter<T: IntoIterator<Item = PublicKeyDocument>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().map(|key| (key.id.clone(), key)).collect(),
        }
    }
}

#[async_trait]
impl KeyResolver for StaticKeyResolver {
    async fn resolve(&self, creator: &str) -> Result<PublicKeyDocument, Error> {
        self.keys
            .get(creator)
            .cloned()
            .ok_or_else(|| Error::key_resolution(creator, "unknown key"))
    }
}

/// Fetches key documents by `GET`ting the creator IRI.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpKeyResolver {
    timeout: Duration,
}

#[cfg(feature = "http")]
impl HttpKeyResolver {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(feature = "http")]
impl Default for HttpKeyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl KeyResolver for HttpKeyResolver {
    async fn resolve(&self, creator: &str) -> Result<PublicKeyDocument, Error> {
        let url: reqwest::Url = creator
            .parse()
            .map_err(|e| Error::key_resolution(creator, e))?;
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::key_resolution(creator, e))?;
        debug!("fetching public key {}", url);
        let response = client
            .get(url)
            .header(reqwest::header::ACCEPT, ACCEPT_KEY_DOCUMENT)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| Error::key_resolution(creator, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::key_resolution(
                creator,
                format!("server returned {}", status),
            ));
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::key_resolution(creator, e))?;
        let mut key: PublicKeyDocument =
            serde_json::from_slice(&body).map_err(|e| Error::key_resolution(creator, e))?;
        if key.id.is_empty() {
            key.id = creator.to_owned();
        }
        Ok(key)
    }
}

/// Wraps a resolver with a per-creator cache whose entries expire after a
/// fixed time to live. Failures are not cached.
#[derive(Debug)]
pub struct CachedKeyResolver<R> {
    inner: R,
    ttl: Duration,
    cache: Mutex<HashMap<String, (Instant, PublicKeyDocument)>>,
}

impl<R: KeyResolver> CachedKeyResolver<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn cached(&self, creator: &str) -> Option<PublicKeyDocument> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let fresh = cache
            .get(creator)
            .filter(|(fetched, _)| fetched.elapsed() < self.ttl)
            .map(|(_, key)| key.clone());
        if fresh.is_none() {
            cache.remove(creator);
        }
        fresh
    }
}

#[async_trait]
impl<R: KeyResolver> KeyResolver for CachedKeyResolver<R> {
    async fn resolve(&self, creator: &str) -> Result<PublicKeyDocument, Error> {
        if let Some(key) = self.cached(creator) {
            debug!("public key {} served from cache", creator);
            return Ok(key);
        }
        let key = self.inner.resolve(creator).await?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(creator.to_owned(), (Instant::now(), key.clone()));
        Ok(key)
    }
}
