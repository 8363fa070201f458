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

//! Shared data structures for WebAuthn/Passkey operations.

use serde::{Deserialize, Serialize};

use crate::attestation::AttestationFormat;
use crate::cose::CosePublicKey;

/// The only credential type WebAuthn defines.
pub const PUBLIC_KEY_CREDENTIAL_TYPE: &str = "public-key";

/// Longest credential ID accepted at registration.
pub const MAX_CREDENTIAL_ID_LENGTH: usize = 1023;

/// Attestation conveyance preference for passkey registration.
///
/// Specifies whether and how the relying party wants to receive attestation
/// information about the authenticator.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttestationConveyancePreference {
    /// No attestation information is requested.
    None,
    /// Attestation information may be provided if available.
    Indirect,
    /// Direct attestation from the authenticator is requested.
    Direct,
    /// Enterprise attestation is requested (for managed devices).
    Enterprise,
}

/// Resident key requirement for passkey registration.
///
/// Specifies whether the authenticator should store the credential locally
/// (resident/discoverable credential) or rely on the server to provide it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResidentKeyRequirement {
    /// The authenticator should not create a resident credential.
    Discouraged,
    /// A resident credential is preferred but not required.
    Preferred,
    /// A resident credential must be created.
    Required,
}

/// User verification requirement for passkey operations.
///
/// Only `Required` makes the UV flag mandatory when a response is verified.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserVerificationRequirement {
    /// User verification is required.
    Required,
    /// User verification is preferred but not required.
    #[default]
    Preferred,
    /// User verification should not be performed.
    Discouraged,
}

impl UserVerificationRequirement {
    /// Returns true if responses must carry the UV flag.
    pub fn is_required(self) -> bool {
        self == UserVerificationRequirement::Required
    }
}

/// A registered credential, ready to be persisted.
///
/// Created once by a successful registration. Only `counter` changes
/// afterwards, once per successful authentication.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct CredentialRecord {
    /// The unique identifier for this credential.
    pub credential_id: Vec<u8>,

    /// The credential public key.
    pub public_key: CosePublicKey,

    /// The last signature counter seen for this credential.
    pub counter: u32,

    /// The user handle (WebAuthn user.id) the credential belongs to.
    pub user_handle: Vec<u8>,

    /// Authenticator model identifier.
    pub aaguid: [u8; 16],

    /// Attestation format the credential was registered with.
    pub attestation_format: AttestationFormat,

    /// Whether the credential may be synced between devices.
    pub backup_eligible: bool,

    /// Whether the credential was backed up at its last use.
    pub backup_state: bool,
}

/// Information about the relying party (RP).
///
/// The relying party is the web application that is requesting authentication.
#[derive(Serialize, Debug)]
pub struct RelyingParty {
    /// Human-readable name of the relying party.
    pub name: String,

    /// Unique identifier for the relying party (typically the domain).
    pub id: String,
}

/// Information about the user account.
#[derive(Clone, Serialize, Debug)]
pub struct UserInfo {
    /// Unique identifier for the user account (base64url-encoded).
    pub id: String,

    /// Username or account identifier.
    pub name: String,

    /// Human-readable display name for the user.
    #[serde(rename = "displayName")]
    pub display_name: String,
}

/// A public key credential parameter specifying an acceptable algorithm.
#[derive(Serialize, Debug)]
pub struct PubKeyCredParam {
    /// COSE algorithm identifier (e.g., -7 for ES256).
    pub alg: i64,

    /// Credential type (always "public-key" for passkeys).
    #[serde(rename = "type")]
    pub type_: String,
}

/// Authenticator selection criteria for passkey registration.
#[derive(Serialize, Debug)]
pub struct AuthenticatorSelection {
    /// Resident key requirement.
    #[serde(rename = "residentKey")]
    pub resident_key: ResidentKeyRequirement,

    /// User verification requirement.
    #[serde(rename = "userVerification")]
    pub user_verification: UserVerificationRequirement,
}

/// A reference to an existing credential.
///
/// Used as `excludeCredentials` during registration and as
/// `allowCredentials` during authentication.
#[derive(Serialize, Debug)]
pub struct CredentialDescriptor {
    /// The credential ID (base64url-encoded).
    pub id: String,

    /// Credential type (always "public-key" for passkeys).
    #[serde(rename = "type")]
    pub type_: String,
}

impl CredentialDescriptor {
    pub(crate) fn for_record(record: &CredentialRecord) -> Self {
        CredentialDescriptor {
            id: crate::base64url::encode(&record.credential_id),
            type_: PUBLIC_KEY_CREDENTIAL_TYPE.to_string(),
        }
    }
}
