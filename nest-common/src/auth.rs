//! Credential verification
//!
//! Login is gated by a `CredentialVerifier`. The service only ever calls
//! `verify`, so a real identity provider can replace the static allow-list
//! without touching any handler.
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies; the session marking and login pages live
//! in the service crate.

use serde::Deserialize;
use std::collections::HashMap;

/// Checks a username/password pair
pub trait CredentialVerifier: Send + Sync {
    /// True iff the pair is accepted
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// One allow-list entry (also the `[[users]]` TOML table shape)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserCredential {
    pub username: String,
    pub password: String,
}

/// Fixed in-memory allow-list
///
/// A pair is accepted only when the username exists and the password
/// matches it exactly. Lookups are case-sensitive.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    users: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new<I, U, P>(users: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        Self {
            users: users
                .into_iter()
                .map(|(u, p)| (u.into(), p.into()))
                .collect(),
        }
    }

    /// Compiled-in allow-list used when no `[[users]]` are configured
    pub fn builtin() -> Self {
        Self::new([("mbcs", "1234"), ("mbcs1", "5678"), ("admin", "adminpass")])
    }

    /// Allow-list from configuration entries; later duplicates win
    pub fn from_config(users: &[UserCredential]) -> Self {
        Self::new(
            users
                .iter()
                .map(|u| (u.username.clone(), u.password.clone())),
        )
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.users
            .get(username)
            .is_some_and(|expected| expected == password)
    }
}
