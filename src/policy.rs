//! Trust decisions taken during verification.

use std::collections::BTreeSet;

use crate::error::Error;
use crate::resolve::PublicKeyDocument;

/// Decides which signers and nonces a verifier accepts.
pub trait TrustPolicy: Sync {
    /// Check a signature nonce, e.g. against a replay window.
    ///
    /// Nonces cannot be validated without application state, so the default
    /// rejects every signature that carries one.
    fn check_nonce(&self, nonce: &str) -> Result<(), Error> {
        let _ = nonce;
        Err(Error::UnsupportedFeature("signature nonces"))
    }

    /// Whether signatures made with `key` are acceptable.
    fn is_trusted(&self, key: &PublicKeyDocument) -> bool {
        let _ = key;
        true
    }
}

/// Trusts every signer whose key resolves and is not revoked.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl TrustPolicy for AcceptAll {}

/// Trusts keys owned by one of a fixed set of identities.
#[derive(Debug, Clone, Default)]
pub struct TrustedOwners {
    owners: BTreeSet<String>,
}

impl TrustedOwners {
    pub fn new<I, S>(owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            owners: owners.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, owner: impl Into<String>) -> bool {
        self.owners.insert(owner.into())
    }
}

impl TrustPolicy for TrustedOwners {
    fn is_trusted(&self, key: &PublicKeyDocument) -> bool {
        key.owner
            .as_ref()
            .map_or(false, |owner| self.owners.contains(owner))
    }
}
