// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credentials handed to scanners.
//!
//! Secrets are decrypted just-in-time by the (external) credential store
//! and wiped from memory when the per-scan copy is dropped.

use crate::acl::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

crate::define_id! {
    /// Unique identifier for a credential.
    pub struct CredentialId;
}

/// A secret value that is zeroised on drop and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the secret for handing to a scanner session.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Protocol slot a credential fills on a target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CredentialProtocol {
    Ssh,
    Smb,
    Esxi,
    Snmp,
    Krb5,
}

impl CredentialProtocol {
    pub fn name(&self) -> &'static str {
        match self {
            CredentialProtocol::Ssh => "ssh",
            CredentialProtocol::Smb => "smb",
            CredentialProtocol::Esxi => "esxi",
            CredentialProtocol::Snmp => "snmp",
            CredentialProtocol::Krb5 => "krb5",
        }
    }
}

/// The kinds of credential the controller can convert for a scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialKind {
    UsernamePassword {
        username: String,
        password: Secret,
    },
    UsernameSshKey {
        username: String,
        private_key: Secret,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        passphrase: Option<Secret>,
    },
    SnmpV1 {
        community: Secret,
    },
    SnmpV3 {
        username: String,
        password: Secret,
        auth_algorithm: String,
        privacy_password: Secret,
        privacy_algorithm: String,
    },
    Krb5 {
        username: String,
        password: Secret,
        realm: String,
        kdc: String,
    },
    /// Reference into an external credential store, resolved by that store.
    StoreReference {
        reference: String,
    },
}

/// A credential row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub name: String,
    pub owner: UserId,
    pub kind: CredentialKind,
}

impl Credential {
    /// Login name, when the kind carries one.
    pub fn username(&self) -> Option<&str> {
        match &self.kind {
            CredentialKind::UsernamePassword { username, .. }
            | CredentialKind::UsernameSshKey { username, .. }
            | CredentialKind::SnmpV3 { username, .. }
            | CredentialKind::Krb5 { username, .. } => Some(username),
            CredentialKind::SnmpV1 { .. } | CredentialKind::StoreReference { .. } => None,
        }
    }
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
