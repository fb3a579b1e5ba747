//! How user secrets are stored and checked.

use std::fmt;

/// Turns a secret into what gets stored, and checks a secret against it.
///
/// Every path that writes a credential goes through the engine's hasher, so
/// the HTTP API and the admin CLI always agree on the stored format.
pub trait CredentialHasher: Send + Sync + fmt::Debug {
    fn hash(&self, secret: &str) -> String;
    fn verify(&self, secret: &str, stored: &str) -> bool;
}

/// Stores secrets verbatim.
///
/// Fine for development and tests. Deployments plug their own hasher in
/// through [`EngineBuilder::credential_hasher`](crate::EngineBuilder::credential_hasher).
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainCredentials;

impl CredentialHasher for PlainCredentials {
    fn hash(&self, secret: &str) -> String {
        secret.to_string()
    }

    fn verify(&self, secret: &str, stored: &str) -> bool {
        secret == stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_credentials_match_only_the_same_secret() {
        let hasher = PlainCredentials;
        let stored = hasher.hash("hunter2");
        assert!(hasher.verify("hunter2", &stored));
        assert!(!hasher.verify("hunter3", &stored));
    }
}
