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

//! Passkey authentication functionality.

use aws_lc_rs::digest::{self, SHA256};
use serde::{Deserialize, Serialize};

use crate::authenticator_data::AuthenticatorData;
use crate::base64url;
use crate::client_data::{ClientData, ClientDataType};
use crate::config::ZeroCounterPolicy;
use crate::error::{ClientDataField, Result, WebAuthnError};
use crate::store::CredentialStore;
use crate::types::*;
use crate::WebAuthn;

/// Challenge sent to the client to begin passkey authentication.
///
/// This structure contains all the parameters needed by the WebAuthn client
/// to authenticate using an existing credential.
#[derive(Serialize, Debug)]
pub struct AuthenticationChallenge {
    /// The challenge value (base64url-encoded).
    pub challenge: String,

    /// Timeout for the operation in milliseconds.
    pub timeout: u64,

    /// The relying party identifier.
    #[serde(rename = "rpId")]
    pub rp_id: String,

    /// List of credentials that are allowed for this authentication.
    #[serde(rename = "allowCredentials")]
    pub allow_credentials: Vec<CredentialDescriptor>,

    /// User verification requirement.
    #[serde(rename = "userVerification")]
    pub user_verification: UserVerificationRequirement,
}

/// Server-side state for a passkey authentication in progress.
///
/// This state must be stored temporarily and provided when completing the authentication.
#[derive(Clone, Debug)]
pub struct AuthenticationState {
    /// The challenge that was sent to the client.
    pub challenge: Vec<u8>,

    /// List of credential IDs that are allowed for this authentication.
    /// Empty for the usernameless (discoverable credential) flow.
    pub allowed_credentials: Vec<Vec<u8>>,

    /// The user verification requirement sent to the client.
    pub user_verification: UserVerificationRequirement,
}

/// The `response` member of an authentication credential.
#[derive(Deserialize, Debug, Clone)]
pub struct AuthenticatorAssertionResponse {
    /// The client data JSON (base64url-encoded).
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,

    /// The authenticator data (base64url-encoded).
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: String,

    /// The signature over the authenticator data and client data hash (base64url-encoded).
    pub signature: String,

    /// The user handle of a discoverable credential (base64url-encoded).
    #[serde(rename = "userHandle", default)]
    pub user_handle: Option<String>,
}

/// Credential returned by `navigator.credentials.get()`, as JSON.
#[derive(Deserialize, Debug, Clone)]
pub struct AuthenticationCredential {
    /// The credential ID as text.
    pub id: String,

    /// The credential ID that was used (base64url-encoded).
    #[serde(rename = "rawId")]
    pub raw_id: String,

    /// Credential type, must be "public-key".
    #[serde(rename = "type")]
    pub type_: String,

    pub response: AuthenticatorAssertionResponse,
}

/// Result of a successful authentication.
///
/// Persist `counter` (and `backup_state`) on the stored credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationResult {
    /// The credential ID that was used for authentication.
    pub credential_id: Vec<u8>,

    /// The signature counter to store for the credential.
    pub counter: u32,

    /// Whether the authenticator verified the user.
    pub user_verified: bool,

    /// Whether the credential is currently backed up.
    pub backup_state: bool,
}

impl WebAuthn {
    /// Starts a passkey authentication ceremony.
    ///
    /// Generates a challenge and returns both the challenge to send to the client
    /// and the state to store on the server.
    ///
    /// # Arguments
    ///
    /// * `credentials` - Stored credentials allowed for this authentication;
    ///   pass an empty slice for the usernameless flow
    /// * `user_verification` - User verification requirement
    pub fn start_passkey_authentication(
        &self,
        credentials: &[CredentialRecord],
        user_verification: UserVerificationRequirement,
    ) -> Result<(AuthenticationChallenge, AuthenticationState)> {
        let challenge = Self::generate_challenge()?;

        let challenge_response = AuthenticationChallenge {
            challenge: base64url::encode(&challenge),
            timeout: self.config.timeout_ms,
            rp_id: self.config.rp_id.clone(),
            allow_credentials: credentials.iter().map(CredentialDescriptor::for_record).collect(),
            user_verification,
        };

        let state = AuthenticationState {
            challenge,
            allowed_credentials: credentials.iter().map(|c| c.credential_id.clone()).collect(),
            user_verification,
        };

        Ok((challenge_response, state))
    }

    /// Completes a passkey authentication ceremony.
    ///
    /// Verifies the signature and authenticator data returned by the client
    /// against the stored credential.
    ///
    /// # Arguments
    ///
    /// * `credential` - The credential data returned by the client
    /// * `state` - The authentication state stored on the server
    /// * `record` - The stored credential matching `credential.raw_id`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The credential type is not "public-key" or the credential is not allowed
    /// * The client data is invalid, or its challenge or origin doesn't match
    /// * The authenticator data is malformed, scoped to another RP, or lacks UP/UV
    /// * The signature is invalid
    /// * The counter hasn't increased (possible replay attack)
    pub fn finish_passkey_authentication(
        &self,
        credential: &AuthenticationCredential,
        state: &AuthenticationState,
        record: &CredentialRecord,
    ) -> Result<AuthenticationResult> {
        self.verify_authentication(credential, state, record).inspect_err(|e| match e {
            WebAuthnError::PotentialReplayAttack => {
                tracing::warn!(credential = %credential.id, "signature counter did not advance")
            }
            _ => tracing::debug!(error = %e, credential = %credential.id, "authentication rejected"),
        })
    }

    /// Completes a passkey authentication and advances the stored counter.
    ///
    /// The store's compare-and-swap is called once, only when the counter
    /// moves. Losing that race to a concurrent authentication of the same
    /// credential is reported as a replay.
    pub fn finish_passkey_authentication_with_store<S: CredentialStore + ?Sized>(
        &self,
        credential: &AuthenticationCredential,
        state: &AuthenticationState,
        record: &CredentialRecord,
        store: &S,
    ) -> Result<AuthenticationResult> {
        let result = self.finish_passkey_authentication(credential, state, record)?;

        if result.counter != record.counter
            && !store.compare_and_swap_counter(&record.credential_id, record.counter, result.counter)
        {
            tracing::warn!(credential = %credential.id, "stored counter changed during authentication");
            return Err(WebAuthnError::PotentialReplayAttack);
        }

        Ok(result)
    }

    fn verify_authentication(
        &self,
        credential: &AuthenticationCredential,
        state: &AuthenticationState,
        record: &CredentialRecord,
    ) -> Result<AuthenticationResult> {
        // Verify credential
        if credential.type_ != PUBLIC_KEY_CREDENTIAL_TYPE {
            return Err(WebAuthnError::InvalidAssertionCredentialType);
        }
        let credential_id = base64url::decode(&credential.raw_id).map_err(|_| WebAuthnError::InvalidRawId)?;
        verify_credential_allowed(&credential_id, state, record)?;
        if let Some(user_handle) = &credential.response.user_handle {
            verify_user_handle(&base64url::decode(user_handle)?, record)?;
        }

        // Verify client data
        let client_data_bytes = base64url::decode(&credential.response.client_data_json)
            .map_err(|_| WebAuthnError::InvalidClientDataJson(ClientDataField::Malformed))?;
        let client_data = ClientData::from_bytes(&client_data_bytes)?;
        client_data.verify(ClientDataType::Get, &state.challenge, &self.config.rp_origin)?;

        // Verify authenticator data
        let auth_data_bytes = base64url::decode(&credential.response.authenticator_data)
            .map_err(|_| WebAuthnError::InvalidAuthData)?;
        let auth_data = AuthenticatorData::from_bytes(&auth_data_bytes)?;
        auth_data.verify_rp_id(&self.config.rp_id)?;
        auth_data.verify_user_present()?;
        if state.user_verification.is_required() && !auth_data.flags.user_verified() {
            return Err(WebAuthnError::UserVerifiedFlagNotSet);
        }

        // Verify signature over authenticatorData || SHA-256(clientDataJSON)
        let signature = base64url::decode(&credential.response.signature)
            .map_err(|_| WebAuthnError::InvalidSignature)?;
        let client_data_hash = digest::digest(&SHA256, &client_data_bytes);
        let mut signed_data = auth_data_bytes;
        signed_data.extend_from_slice(client_data_hash.as_ref());
        record.public_key.verify(&signature, &signed_data)?;

        // Verify counter
        let counter = next_counter(record.counter, auth_data.counter, self.config.zero_counter_policy)?;

        Ok(AuthenticationResult {
            credential_id,
            counter,
            user_verified: auth_data.flags.user_verified(),
            backup_state: auth_data.flags.backup_state(),
        })
    }
}

/// The credential must be the stored one and, unless the flow is
/// usernameless, one of those offered to the client.
pub(crate) fn verify_credential_allowed(
    credential_id: &[u8],
    state: &AuthenticationState,
    record: &CredentialRecord,
) -> Result<()> {
    if credential_id != record.credential_id.as_slice() {
        return Err(WebAuthnError::CredentialNotAllowed);
    }
    if !state.allowed_credentials.is_empty()
        && !state.allowed_credentials.iter().any(|id| id.as_slice() == credential_id)
    {
        return Err(WebAuthnError::CredentialNotAllowed);
    }
    Ok(())
}

pub(crate) fn verify_user_handle(user_handle: &[u8], record: &CredentialRecord) -> Result<()> {
    if !record.user_handle.is_empty() && user_handle != record.user_handle.as_slice() {
        return Err(WebAuthnError::UserHandleMismatch);
    }
    Ok(())
}

/// Computes the counter to store after an authentication.
///
/// A stored counter of 0 means the authenticator has no counter, so nothing
/// is compared. Otherwise the received counter must be strictly greater.
pub(crate) fn next_counter(stored: u32, received: u32, policy: ZeroCounterPolicy) -> Result<u32> {
    if stored == 0 || received > stored {
        return Ok(received);
    }
    if received == 0 && policy == ZeroCounterPolicy::Ignore {
        return Ok(stored);
    }
    Err(WebAuthnError::PotentialReplayAttack)
}
