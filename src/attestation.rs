// Copyright 2026 Grzegorz Blach
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Attestation object parsing and statement verification.

use std::fmt;
use std::str::FromStr;

use ciborium::Value;
use serde::{Deserialize, Serialize};

use crate::algorithm::CoseAlgorithmIdentifier;
use crate::authenticator_data::{AttestedCredentialData, AuthenticatorData};
use crate::cose::decode_cbor_prefix;
use crate::error::{Result, WebAuthnError};

/// Attestation statement formats this crate can verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationFormat {
    /// No attestation ("none").
    None,
    /// Packed attestation ("packed"); only self attestation is verified.
    Packed,
}

impl AttestationFormat {
    /// Returns the `fmt` string used in attestation objects.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttestationFormat::None => "none",
            AttestationFormat::Packed => "packed",
        }
    }
}

impl FromStr for AttestationFormat {
    type Err = WebAuthnError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "none" => Ok(AttestationFormat::None),
            "packed" => Ok(AttestationFormat::Packed),
            _ => Err(WebAuthnError::AttestationFormatNotSupported),
        }
    }
}

impl fmt::Display for AttestationFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A decoded attestation object (`{fmt, attStmt, authData}`).
#[derive(Debug, Clone)]
pub struct AttestationObject {
    pub format: AttestationFormat,
    /// The format-specific statement map.
    pub statement: Vec<(Value, Value)>,
    pub auth_data: AuthenticatorData,
}

impl AttestationObject {
    /// Parses a CBOR attestation object.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The bytes are not a single CBOR map
    /// * `fmt` is missing, not text, or names an unsupported format
    /// * `attStmt` is not a map, or is missing for a format other than "none"
    /// * `authData` is missing or fails to parse
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (value, consumed) = decode_cbor_prefix(bytes).ok_or(WebAuthnError::InvalidAttestationData)?;
        if consumed != bytes.len() {
            return Err(WebAuthnError::InvalidAttestationData);
        }
        let entries = value
            .into_map()
            .map_err(|_| WebAuthnError::InvalidAttestationData)?;

        let format = field(&entries, "fmt")
            .and_then(Value::as_text)
            .ok_or(WebAuthnError::InvalidFmt)?
            .parse::<AttestationFormat>()?;

        let statement = match field(&entries, "attStmt") {
            Some(value) => value.as_map().cloned().ok_or(WebAuthnError::InvalidAttStmt)?,
            None if format == AttestationFormat::None => Vec::new(),
            None => return Err(WebAuthnError::AttestationStatementMissing),
        };

        let auth_data_bytes = field(&entries, "authData")
            .and_then(Value::as_bytes)
            .ok_or(WebAuthnError::InvalidAuthData)?;
        let auth_data = AuthenticatorData::from_bytes(auth_data_bytes)?;

        Ok(AttestationObject {
            format,
            statement,
            auth_data,
        })
    }

    /// Runs the registration checks on the authenticator data and the
    /// attestation statement.
    ///
    /// # Arguments
    ///
    /// * `rp_id` - The relying party ID the credential must be scoped to
    /// * `verification_required` - Whether the UV flag must be set
    /// * `client_data_hash` - SHA-256 of the raw client data JSON
    pub fn verify(
        &self,
        rp_id: &str,
        verification_required: bool,
        client_data_hash: &[u8],
    ) -> Result<()> {
        self.auth_data.verify_rp_id(rp_id)?;
        self.auth_data.verify_user_present()?;

        if verification_required && !self.auth_data.flags.user_verified() {
            return Err(WebAuthnError::UserVerificationRequiredButFlagNotSet);
        }

        let credential = self
            .auth_data
            .attested_credential_data
            .as_ref()
            .ok_or(WebAuthnError::AttestedCredentialDataMissing)?;

        match self.format {
            AttestationFormat::None => self.verify_none(),
            AttestationFormat::Packed => self.verify_packed(credential, client_data_hash),
        }
    }

    fn verify_none(&self) -> Result<()> {
        if !self.statement.is_empty() {
            return Err(WebAuthnError::InvalidAttStmt);
        }
        Ok(())
    }

    fn verify_packed(
        &self,
        credential: &AttestedCredentialData,
        client_data_hash: &[u8],
    ) -> Result<()> {
        let alg = field(&self.statement, "alg")
            .and_then(Value::as_integer)
            .and_then(|i| i64::try_from(i).ok())
            .ok_or(WebAuthnError::InvalidAttStmt)?;
        let sig = field(&self.statement, "sig")
            .and_then(Value::as_bytes)
            .ok_or(WebAuthnError::InvalidAttStmt)?;

        // Full and ECDAA attestation need a certificate chain.
        if field(&self.statement, "x5c").is_some() || field(&self.statement, "ecdaaKeyId").is_some() {
            return Err(WebAuthnError::AttestationVerificationNotSupported);
        }

        let alg = CoseAlgorithmIdentifier::try_from(alg)?;
        if alg != credential.public_key.algorithm() {
            return Err(WebAuthnError::InvalidAlgorithm);
        }

        let mut signed_data = self.auth_data.as_bytes().to_vec();
        signed_data.extend_from_slice(client_data_hash);

        credential.public_key.verify_as(alg, sig, &signed_data)
    }
}

fn field<'a>(entries: &'a [(Value, Value)], name: &str) -> Option<&'a Value> {
    entries
        .iter()
        .find(|(k, _)| k.as_text() == Some(name))
        .map(|(_, v)| v)
}
