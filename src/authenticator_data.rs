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

//! Authenticator data parsing.
//!
//! Layout (WebAuthn Level 3, section 6.1):
//!
//! ```text
//! rpIdHash (32) | flags (1) | signCount (4, BE)
//!   [ aaguid (16) | credIdLen (2, BE) | credId | COSE_Key ]   if AT
//!   [ extensions (CBOR map) ]                                  if ED
//! ```

use aws_lc_rs::digest::{self, SHA256};

use crate::cose::{decode_cbor_prefix, CosePublicKey};
use crate::error::{Result, WebAuthnError};

/// rpIdHash + flags + signCount.
pub const MIN_AUTH_DATA_LENGTH: usize = 37;

const AAGUID_LENGTH: usize = 16;
const CREDENTIAL_ID_LENGTH_SIZE: usize = 2;

/// The flags byte of authenticator data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatorFlags(pub u8);

impl AuthenticatorFlags {
    pub const USER_PRESENT: u8 = 0x01;
    pub const USER_VERIFIED: u8 = 0x04;
    pub const BACKUP_ELIGIBLE: u8 = 0x08;
    pub const BACKUP_STATE: u8 = 0x10;
    pub const ATTESTED_CREDENTIAL_DATA: u8 = 0x40;
    pub const EXTENSION_DATA: u8 = 0x80;

    #[inline]
    fn has(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    /// UP: the user touched the authenticator.
    pub fn user_present(self) -> bool {
        self.has(Self::USER_PRESENT)
    }

    /// UV: the user was verified (PIN, biometric).
    pub fn user_verified(self) -> bool {
        self.has(Self::USER_VERIFIED)
    }

    /// BE: the credential may be backed up (synced passkey).
    pub fn backup_eligible(self) -> bool {
        self.has(Self::BACKUP_ELIGIBLE)
    }

    /// BS: the credential is currently backed up.
    pub fn backup_state(self) -> bool {
        self.has(Self::BACKUP_STATE)
    }

    /// AT: attested credential data follows the counter.
    pub fn attested_credential_data(self) -> bool {
        self.has(Self::ATTESTED_CREDENTIAL_DATA)
    }

    /// ED: an extensions map ends the structure.
    pub fn extension_data(self) -> bool {
        self.has(Self::EXTENSION_DATA)
    }
}

/// The credential block present in authenticator data during registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredentialData {
    /// Authenticator model identifier.
    pub aaguid: [u8; 16],
    /// The new credential's ID.
    pub credential_id: Vec<u8>,
    /// The new credential's public key.
    pub public_key: CosePublicKey,
}

impl AttestedCredentialData {
    /// Parses the block and returns it with the number of bytes consumed.
    fn from_bytes(bytes: &[u8]) -> Result<(Self, usize)> {
        if bytes.len() < AAGUID_LENGTH + CREDENTIAL_ID_LENGTH_SIZE {
            return Err(WebAuthnError::AuthDataTooShort);
        }

        let mut aaguid = [0u8; 16];
        aaguid.copy_from_slice(&bytes[..AAGUID_LENGTH]);

        let id_length = u16::from_be_bytes([bytes[AAGUID_LENGTH], bytes[AAGUID_LENGTH + 1]]) as usize;
        let id_start = AAGUID_LENGTH + CREDENTIAL_ID_LENGTH_SIZE;
        let key_start = id_start + id_length;
        if bytes.len() < key_start {
            return Err(WebAuthnError::AuthDataTooShort);
        }
        let credential_id = bytes[id_start..key_start].to_vec();

        let (key_value, key_length) =
            decode_cbor_prefix(&bytes[key_start..]).ok_or(WebAuthnError::BadPublicKeyBytes)?;
        let public_key = CosePublicKey::from_cbor_value(key_value)?;

        Ok((
            AttestedCredentialData {
                aaguid,
                credential_id,
                public_key,
            },
            key_start + key_length,
        ))
    }
}

/// Parsed authenticator data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorData {
    /// SHA-256 of the RP ID the authenticator scoped the credential to.
    pub rp_id_hash: [u8; 32],
    pub flags: AuthenticatorFlags,
    /// Signature counter, 0 if the authenticator does not keep one.
    pub counter: u32,
    pub attested_credential_data: Option<AttestedCredentialData>,
    /// Raw CBOR of the extensions map.
    pub extensions: Option<Vec<u8>>,
    raw: Vec<u8>,
}

impl AuthenticatorData {
    /// Parses authenticator data, requiring every byte to be accounted for.
    ///
    /// # Errors
    ///
    /// * [`WebAuthnError::AuthDataTooShort`] if a fixed-size field is truncated
    /// * [`WebAuthnError::BadPublicKeyBytes`] or another key error if the
    ///   credential public key is malformed
    /// * [`WebAuthnError::ExtensionDataMissing`] if ED is set with nothing after it
    /// * [`WebAuthnError::LeftOverBytesInAuthenticatorData`] on trailing data
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_AUTH_DATA_LENGTH {
            return Err(WebAuthnError::AuthDataTooShort);
        }

        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(&bytes[..32]);
        let flags = AuthenticatorFlags(bytes[32]);
        let counter = u32::from_be_bytes([bytes[33], bytes[34], bytes[35], bytes[36]]);

        let mut offset = MIN_AUTH_DATA_LENGTH;

        let attested_credential_data = if flags.attested_credential_data() {
            let (data, consumed) = AttestedCredentialData::from_bytes(&bytes[offset..])?;
            offset += consumed;
            Some(data)
        } else {
            None
        };

        let extensions = if flags.extension_data() {
            let rest = &bytes[offset..];
            if rest.is_empty() {
                return Err(WebAuthnError::ExtensionDataMissing);
            }
            let (value, consumed) = decode_cbor_prefix(rest).ok_or(WebAuthnError::InvalidAuthData)?;
            if !value.is_map() {
                return Err(WebAuthnError::InvalidAuthData);
            }
            offset += consumed;
            Some(rest[..consumed].to_vec())
        } else {
            None
        };

        if offset != bytes.len() {
            return Err(WebAuthnError::LeftOverBytesInAuthenticatorData);
        }

        Ok(AuthenticatorData {
            rp_id_hash,
            flags,
            counter,
            attested_credential_data,
            extensions,
            raw: bytes.to_vec(),
        })
    }

    /// The bytes this structure was parsed from, as covered by signatures.
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Returns the attested credential data, failing if the AT flag is clear.
    pub fn require_attested_credential_data(&self) -> Result<&AttestedCredentialData> {
        if !self.flags.attested_credential_data() {
            return Err(WebAuthnError::AttestedCredentialFlagNotSet);
        }
        self.attested_credential_data
            .as_ref()
            .ok_or(WebAuthnError::AttestedCredentialDataMissing)
    }

    /// Checks the RP ID hash against SHA-256 of `rp_id`.
    pub fn verify_rp_id(&self, rp_id: &str) -> Result<()> {
        let expected = digest::digest(&SHA256, rp_id.as_bytes());
        if expected.as_ref() != self.rp_id_hash.as_slice() {
            return Err(WebAuthnError::RelyingPartyIdHashDoesNotMatch);
        }
        Ok(())
    }

    /// Checks the UP flag.
    pub fn verify_user_present(&self) -> Result<()> {
        if !self.flags.user_present() {
            return Err(WebAuthnError::UserPresentFlagNotSet);
        }
        Ok(())
    }
}
