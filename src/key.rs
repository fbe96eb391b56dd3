//! RSA key material.
//!
//! Signatures are RSASSA-PKCS1-v1_5 over a SHA-256 digest. Keys are exchanged
//! as PEM: private keys in PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1
//! (`BEGIN RSA PRIVATE KEY`), public keys in SPKI (`BEGIN PUBLIC KEY`) or
//! PKCS#1 (`BEGIN RSA PUBLIC KEY`).

use std::fmt;

use log::debug;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::Error;
use crate::hash::sha256;

/// Modulus size of newly provisioned signing keys.
pub const DEFAULT_KEY_BITS: usize = 2048;

#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(RsaPrivateKey);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PrivateKey {
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let pem = pem.trim();
        RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map(Self)
            .map_err(Error::key_format)
    }

    /// Generate a new key pair with a modulus of `bits` bits.
    pub fn generate(bits: usize) -> Result<Self, Error> {
        debug!("generating {}-bit RSA key", bits);
        let mut rng = rand::thread_rng();
        RsaPrivateKey::new(&mut rng, bits)
            .map(Self)
            .map_err(Error::key_format)
    }

    /// PKCS#8 PEM encoding.
    pub fn to_pem(&self) -> Result<String, Error> {
        self.0
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(Error::key_format)
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    /// Sign the SHA-256 digest of `message`.
    pub fn sign_sha256(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        let digest = sha256(message);
        self.0
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(Error::key_format)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bits", &(self.0.size() * 8))
            .finish_non_exhaustive()
    }
}

impl PublicKey {
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let pem = pem.trim();
        RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map(Self)
            .map_err(Error::key_format)
    }

    /// SPKI PEM encoding.
    pub fn to_pem(&self) -> Result<String, Error> {
        self.0
            .to_public_key_pem(LineEnding::LF)
            .map_err(Error::key_format)
    }

    /// Check `signature` against the SHA-256 digest of `message`.
    pub fn verify_sha256(&self, message: &[u8], signature: &[u8]) -> Result<(), Error> {
        let digest = sha256(message);
        self.0
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature)
            .map_err(|_| Error::InvalidSignature)
    }
}

impl From<RsaPrivateKey> for PrivateKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self(key)
    }
}

impl From<RsaPublicKey> for PublicKey {
    fn from(key: RsaPublicKey) -> Self {
        Self(key)
    }
}
