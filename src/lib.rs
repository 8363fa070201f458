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

//! webauthn-rp - WebAuthn relying party verification for Rust
//!
//! This crate validates the responses a browser and authenticator produce
//! during passkey registration and authentication, so that a server can
//! trust a public key as belonging to a user without ever holding a secret.
//!
//! # Features
//!
//! - COSE EC2 (ES256/ES384/ES512) and RSA (RS1, RS256/384/512, PS256/384/512) keys
//! - "none" and "packed" (self) attestation
//! - Strict authenticator data parsing (no trailing bytes)
//! - Replay protection via signature counters, with an atomic store seam
//! - A closed error taxonomy that can be matched exhaustively
//!
//! # Example
//!
//! ```rust
//! use webauthn_rp::{
//!     WebAuthn, AttestationConveyancePreference, ResidentKeyRequirement,
//!     UserVerificationRequirement, CredentialRecord,
//! };
//!
//! // Initialize with your relying party information
//! let webauthn = WebAuthn::new(
//!     "example.com",              // Relying Party ID (domain)
//!     "https://example.com",      // Relying Party Origin
//!     "Example Corp"              // Relying Party Name
//! );
//!
//! // Registration flow
//! // Step 1: Start registration and send challenge to client
//! # let user_existing_credentials: Vec<CredentialRecord> = vec![];
//! let user_id = b"unique_user_identifier_12345"; // 16 to 64 bytes
//! let (registration_challenge, registration_state) = webauthn.start_passkey_registration(
//!     user_id,                                        // User ID (bytes)
//!     "alice@example.com",                            // Username
//!     "Alice Smith",                                  // Display name
//!     AttestationConveyancePreference::None,          // Attestation
//!     ResidentKeyRequirement::Preferred,              // Resident key
//!     UserVerificationRequirement::Preferred,         // User verification
//!     Some(user_existing_credentials.as_slice()),     // Exclude existing credentials
//! ).expect("user_id must be 16 to 64 bytes");
//!
//! // Send registration_challenge to client (as JSON)
//! // Client uses WebAuthn API to create credential
//!
//! // Step 2: Receive credential from client and complete registration
//! # /*
//! let record = webauthn.finish_passkey_registration(
//!     &registration_credential,  // Credential from client
//!     &registration_state,       // State from step 1
//! )?;
//! # */
//!
//! // Save record to your database associated with the user
//!
//! // Authentication flow
//! // Step 1: Start authentication and send challenge to client
//! # let user_credentials: Vec<CredentialRecord> = vec![];
//! let (authentication_challenge, authentication_state) = webauthn.start_passkey_authentication(
//!     &user_credentials,                         // User's stored credentials
//!     UserVerificationRequirement::Preferred,    // User verification
//! ).expect("system random number generator");
//!
//! // Step 2: Receive credential from client and verify authentication
//! # /*
//! let result = webauthn.finish_passkey_authentication(
//!     &authentication_credential,  // Credential from client
//!     &authentication_state,       // State from step 1
//!     &record,                     // Stored credential from database
//! )?;
//!
//! // Update the counter in your database to prevent replay attacks
//! record.counter = result.counter;
//! # */
//! ```
//!
//! # Concurrency
//!
//! Verification is synchronous and holds no shared state. Two authentications
//! of the same credential must not both advance its counter: either serialize
//! them in storage, or use the `*_with_store` variants with a
//! [`CredentialStore`] whose compare-and-swap is atomic.

pub mod algorithm;
pub mod attestation;
pub mod authenticator_data;
mod authentication;
pub mod base64url;
mod client_data;
mod config;
pub mod cose;
mod error;
mod registration;
mod store;
mod types;

#[cfg(test)]
mod tests;

use aws_lc_rs::rand::{SecureRandom, SystemRandom};

// Re-export public types
pub use algorithm::CoseAlgorithmIdentifier;
pub use attestation::{AttestationFormat, AttestationObject};
pub use authentication::{
    AuthenticationChallenge, AuthenticationCredential, AuthenticationResult, AuthenticationState,
    AuthenticatorAssertionResponse,
};
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData, AuthenticatorFlags};
pub use client_data::{ClientData, ClientDataType};
pub use config::{WebAuthnConfig, ZeroCounterPolicy, DEFAULT_TIMEOUT_MS};
pub use cose::{CoseEllipticCurve, CosePublicKey, Ec2PublicKey, RsaPublicKey};
pub use error::{ClientDataField, Result, WebAuthnError};
pub use registration::{
    AuthenticatorAttestationResponse, RegistrationChallenge, RegistrationCredential,
    RegistrationState,
};
pub use store::{CredentialStore, MemoryCredentialStore};
pub use types::*;

/// Size of generated challenges in bytes.
pub const CHALLENGE_LENGTH: usize = 32;

/// A relying party: the entry point for both ceremonies.
///
/// Holds configuration only, so one instance can be shared between threads.
#[derive(Debug, Clone)]
pub struct WebAuthn {
    pub config: WebAuthnConfig,
}

impl WebAuthn {
    /// Creates a relying party with default policy.
    ///
    /// # Arguments
    ///
    /// * `rp_id` - The relying party identifier (typically the domain, e.g., "example.com")
    /// * `rp_origin` - The relying party origin (e.g., `https://example.com`)
    /// * `rp_name` - The human-readable relying party name (e.g., "Example Corp")
    ///
    /// # Example
    ///
    /// ```
    /// # use webauthn_rp::WebAuthn;
    /// let webauthn = WebAuthn::new("example.com", "https://example.com", "Example Corp");
    /// ```
    pub fn new(rp_id: &str, rp_origin: &str, rp_name: &str) -> Self {
        Self::with_config(WebAuthnConfig::new(rp_id, rp_origin, rp_name))
    }

    /// Creates a relying party from a full configuration.
    pub fn with_config(config: WebAuthnConfig) -> Self {
        Self { config }
    }

    /// Generates a cryptographically secure random challenge.
    pub(crate) fn generate_challenge() -> Result<Vec<u8>> {
        let rng = SystemRandom::new();
        let mut challenge = vec![0u8; CHALLENGE_LENGTH];
        rng.fill(&mut challenge).map_err(|_| {
            tracing::error!("system random number generator failed");
            WebAuthnError::RandomnessUnavailable
        })?;
        Ok(challenge)
    }
}
