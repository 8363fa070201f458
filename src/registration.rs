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

//! Passkey registration functionality.

use aws_lc_rs::digest::{self, SHA256};
use serde::{Deserialize, Serialize};

use crate::attestation::AttestationObject;
use crate::authenticator_data::AttestedCredentialData;
use crate::base64url;
use crate::client_data::{ClientData, ClientDataType};
use crate::error::{ClientDataField, Result, WebAuthnError};
use crate::store::CredentialStore;
use crate::types::*;
use crate::WebAuthn;

/// Longest user handle WebAuthn allows.
pub const MAX_USER_ID_LENGTH: usize = 64;

/// Challenge sent to the client to begin passkey registration.
///
/// This structure contains all the parameters needed by the WebAuthn client
/// to create a new credential.
#[derive(Serialize, Debug)]
pub struct RegistrationChallenge {
    /// Information about the relying party.
    pub rp: RelyingParty,

    /// Information about the user.
    pub user: UserInfo,

    /// The challenge value (base64url-encoded).
    pub challenge: String,

    /// List of acceptable public key credential parameters.
    #[serde(rename = "pubKeyCredParams")]
    pub pub_key_cred_params: Vec<PubKeyCredParam>,

    /// Timeout for the operation in milliseconds.
    pub timeout: u64,

    /// Attestation conveyance preference.
    pub attestation: AttestationConveyancePreference,

    /// Authenticator selection criteria.
    #[serde(rename = "authenticatorSelection")]
    pub authenticator_selection: AuthenticatorSelection,

    /// List of credentials to exclude from registration.
    ///
    /// These credentials will not be allowed to be registered again,
    /// preventing duplicate registrations.
    #[serde(rename = "excludeCredentials")]
    pub exclude_credentials: Vec<CredentialDescriptor>,
}

/// Server-side state for a passkey registration in progress.
///
/// This state must be stored temporarily and provided when completing the registration.
#[derive(Clone, Debug)]
pub struct RegistrationState {
    /// The challenge that was sent to the client.
    pub challenge: Vec<u8>,

    /// The raw user handle the credential will belong to.
    pub user_handle: Vec<u8>,

    /// The user information.
    pub user: UserInfo,

    /// The user verification requirement sent to the client.
    pub user_verification: UserVerificationRequirement,
}

/// The `response` member of a registration credential.
#[derive(Deserialize, Debug, Clone)]
pub struct AuthenticatorAttestationResponse {
    /// The client data JSON (base64url-encoded).
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,

    /// The CBOR attestation object (base64url-encoded).
    #[serde(rename = "attestationObject")]
    pub attestation_object: String,
}

/// Credential returned by `navigator.credentials.create()`, as JSON.
#[derive(Deserialize, Debug, Clone)]
pub struct RegistrationCredential {
    /// The credential ID as text.
    pub id: String,

    /// The credential ID (base64url-encoded).
    #[serde(rename = "rawId")]
    pub raw_id: String,

    /// Credential type, must be "public-key".
    #[serde(rename = "type")]
    pub type_: String,

    pub response: AuthenticatorAttestationResponse,
}

impl WebAuthn {
    /// Starts a passkey registration ceremony.
    ///
    /// Generates a challenge and returns both the challenge to send to the client
    /// and the state to store on the server.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Unique identifier for the user (16 to 64 bytes)
    /// * `username` - Username or account identifier
    /// * `display_name` - Human-readable display name for the user
    /// * `attestation` - Attestation conveyance preference
    /// * `resident_key` - Resident key requirement
    /// * `user_verification` - User verification requirement
    /// * `existing_credentials` - Optional list of existing credentials to exclude from registration
    ///
    /// # Errors
    ///
    /// Returns [`WebAuthnError::InvalidUserId`] if `user_id` is shorter than
    /// 16 or longer than 64 bytes.
    pub fn start_passkey_registration(
        &self,
        user_id: &[u8],
        username: &str,
        display_name: &str,
        attestation: AttestationConveyancePreference,
        resident_key: ResidentKeyRequirement,
        user_verification: UserVerificationRequirement,
        existing_credentials: Option<&[CredentialRecord]>,
    ) -> Result<(RegistrationChallenge, RegistrationState)> {
        if user_id.len() < 16 || user_id.len() > MAX_USER_ID_LENGTH {
            return Err(WebAuthnError::InvalidUserId);
        }

        let challenge = Self::generate_challenge()?;

        let exclude_credentials = existing_credentials
            .unwrap_or(&[])
            .iter()
            .map(CredentialDescriptor::for_record)
            .collect();

        let user = UserInfo {
            id: base64url::encode(user_id),
            name: username.to_string(),
            display_name: display_name.to_string(),
        };

        let pub_key_cred_params = self
            .config
            .algorithms
            .iter()
            .map(|alg| PubKeyCredParam {
                alg: alg.value(),
                type_: PUBLIC_KEY_CREDENTIAL_TYPE.to_string(),
            })
            .collect();

        let challenge_response = RegistrationChallenge {
            rp: RelyingParty {
                name: self.config.rp_name.clone(),
                id: self.config.rp_id.clone(),
            },
            user: user.clone(),
            challenge: base64url::encode(&challenge),
            pub_key_cred_params,
            timeout: self.config.timeout_ms,
            attestation,
            authenticator_selection: AuthenticatorSelection {
                resident_key,
                user_verification,
            },
            exclude_credentials,
        };

        let state = RegistrationState {
            challenge,
            user_handle: user_id.to_vec(),
            user,
            user_verification,
        };

        Ok((challenge_response, state))
    }

    /// Completes a passkey registration ceremony.
    ///
    /// Verifies the credential returned by the client and returns a record
    /// that can be saved in the database. Checking that the credential ID is
    /// not already registered is left to the caller; see
    /// [`WebAuthn::finish_passkey_registration_with_store`].
    ///
    /// # Errors
    ///
    /// Returns the first check that failed:
    /// * [`WebAuthnError::InvalidRawId`] / [`WebAuthnError::InvalidCredentialCreationType`]
    /// * [`WebAuthnError::InvalidClientDataJson`] for a type, challenge or origin mismatch
    /// * attestation object parse and verification errors
    /// * [`WebAuthnError::CredentialRawIdTooBig`] for IDs over 1023 bytes
    /// * [`WebAuthnError::UnsupportedCredentialPublicKeyAlgorithm`] if the key
    ///   algorithm is not in the configured list
    pub fn finish_passkey_registration(
        &self,
        credential: &RegistrationCredential,
        state: &RegistrationState,
    ) -> Result<CredentialRecord> {
        self.verify_registration(credential, state)
            .inspect_err(|e| tracing::debug!(error = %e, credential = %credential.id, "registration rejected"))
    }

    /// Completes a passkey registration and stores the new credential.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`WebAuthn::finish_passkey_registration`],
    /// returns [`WebAuthnError::CredentialIdAlreadyExists`] if the store
    /// already holds a credential with this ID.
    pub fn finish_passkey_registration_with_store<S: CredentialStore + ?Sized>(
        &self,
        credential: &RegistrationCredential,
        state: &RegistrationState,
        store: &S,
    ) -> Result<CredentialRecord> {
        let record = self.finish_passkey_registration(credential, state)?;

        if !store.insert_if_absent(record.clone()) {
            tracing::debug!(credential = %credential.id, "credential ID already registered");
            return Err(WebAuthnError::CredentialIdAlreadyExists);
        }

        Ok(record)
    }

    fn verify_registration(
        &self,
        credential: &RegistrationCredential,
        state: &RegistrationState,
    ) -> Result<CredentialRecord> {
        // Decode envelope
        let raw_id = base64url::decode(&credential.raw_id).map_err(|_| WebAuthnError::InvalidRawId)?;
        if credential.type_ != PUBLIC_KEY_CREDENTIAL_TYPE {
            return Err(WebAuthnError::InvalidCredentialCreationType);
        }

        // Hash the client data exactly as received
        let client_data_bytes = base64url::decode(&credential.response.client_data_json)
            .map_err(|_| WebAuthnError::InvalidClientDataJson(ClientDataField::Malformed))?;
        let client_data_hash = digest::digest(&SHA256, &client_data_bytes);

        // Verify client data
        let client_data = ClientData::from_bytes(&client_data_bytes)?;
        client_data.verify(ClientDataType::Create, &state.challenge, &self.config.rp_origin)?;

        // Verify attestation object
        let attestation_bytes = base64url::decode(&credential.response.attestation_object)
            .map_err(|_| WebAuthnError::InvalidAttestationData)?;
        let attestation = AttestationObject::from_bytes(&attestation_bytes)?;
        attestation.verify(
            &self.config.rp_id,
            state.user_verification.is_required(),
            client_data_hash.as_ref(),
        )?;

        // Verify credential
        let attested = attestation.auth_data.require_attested_credential_data()?;
        verify_credential_id(&raw_id, attested)?;
        if !self.config.algorithms.contains(&attested.public_key.algorithm()) {
            return Err(WebAuthnError::UnsupportedCredentialPublicKeyAlgorithm);
        }

        Ok(CredentialRecord {
            credential_id: attested.credential_id.clone(),
            public_key: attested.public_key.clone(),
            counter: attestation.auth_data.counter,
            user_handle: state.user_handle.clone(),
            aaguid: attested.aaguid,
            attestation_format: attestation.format,
            backup_eligible: attestation.auth_data.flags.backup_eligible(),
            backup_state: attestation.auth_data.flags.backup_state(),
        })
    }
}

/// The credential ID must fit in 1023 bytes and match the envelope's rawId.
pub(crate) fn verify_credential_id(raw_id: &[u8], attested: &AttestedCredentialData) -> Result<()> {
    if attested.credential_id.len() > MAX_CREDENTIAL_ID_LENGTH {
        return Err(WebAuthnError::CredentialRawIdTooBig);
    }
    if raw_id != attested.credential_id.as_slice() {
        return Err(WebAuthnError::InvalidRawId);
    }
    Ok(())
}
