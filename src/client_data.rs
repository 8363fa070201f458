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

//! Client data parsing and verification for WebAuthn operations.

use std::fmt;
use std::str::FromStr;

use crate::base64url;
use crate::error::{ClientDataField, Result, WebAuthnError};

/// The type of WebAuthn operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientDataType {
    /// Registration operation ("webauthn.create").
    Create,
    /// Authentication operation ("webauthn.get").
    Get,
}

impl ClientDataType {
    /// Returns the string representation used in the client data JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientDataType::Create => "webauthn.create",
            ClientDataType::Get => "webauthn.get",
        }
    }
}

impl FromStr for ClientDataType {
    type Err = WebAuthnError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "webauthn.create" => Ok(ClientDataType::Create),
            "webauthn.get" => Ok(ClientDataType::Get),
            _ => Err(WebAuthnError::InvalidClientDataJson(ClientDataField::Malformed)),
        }
    }
}

impl fmt::Display for ClientDataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parsed client data from WebAuthn operations.
///
/// This structure contains the parsed fields from the client data JSON
/// that is sent by the browser during registration and authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientData {
    /// The type of operation (Create for registration, Get for authentication).
    pub type_: ClientDataType,

    /// The challenge that was signed, decoded from base64url.
    pub challenge: Vec<u8>,

    /// The origin of the requesting page.
    pub origin: String,

    /// Whether the request came from a cross-origin iframe.
    pub cross_origin: bool,

    /// The top-level origin, present for cross-origin requests.
    pub top_origin: Option<String>,
}

impl ClientData {
    /// Parses client data from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`WebAuthnError::InvalidClientDataJson`] if:
    /// * The JSON parsing fails
    /// * Required fields are missing
    /// * The type is not a WebAuthn ceremony type
    /// * The challenge is not base64url
    pub fn from_bytes(bytes: &[u8]) -> Result<ClientData> {
        let malformed = WebAuthnError::InvalidClientDataJson(ClientDataField::Malformed);

        let json: serde_json::Value = serde_json::from_slice(bytes).map_err(|e| {
            tracing::debug!(error = %e, "client data is not JSON");
            malformed
        })?;

        let type_ = json["type"]
            .as_str()
            .ok_or(malformed)?
            .parse::<ClientDataType>()?;

        let challenge = json["challenge"]
            .as_str()
            .ok_or(malformed)
            .and_then(|c| base64url::decode(c).map_err(|_| malformed))?;

        let origin = json["origin"].as_str().ok_or(malformed)?.to_string();

        let cross_origin = json["crossOrigin"].as_bool().unwrap_or(false);
        let top_origin = json["topOrigin"].as_str().map(str::to_string);

        Ok(ClientData {
            type_,
            challenge,
            origin,
            cross_origin,
            top_origin,
        })
    }

    /// Parses a base64url-encoded client data JSON string.
    ///
    /// The challenge field can be used to look up pending registration or
    /// authentication state before the ceremony is finished.
    ///
    /// # Example
    ///
    /// ```
    /// # use webauthn_rp::ClientData;
    /// # /*
    /// let client_data = ClientData::from_base64(&credential.response.client_data_json)?;
    /// let state = pending_states.remove(&client_data.challenge)
    ///     .ok_or("No pending state")?;
    /// # */
    /// ```
    #[inline]
    pub fn from_base64(client_data_json: &str) -> Result<ClientData> {
        let bytes = base64url::decode(client_data_json)
            .map_err(|_| WebAuthnError::InvalidClientDataJson(ClientDataField::Malformed))?;
        Self::from_bytes(&bytes)
    }

    #[allow(rustdoc::bare_urls)]
    /// Verifies the client data against expected values.
    ///
    /// The origin is compared exactly: no normalization, no subdomain matching.
    ///
    /// # Arguments
    ///
    /// * `expected_type` - The expected type (Create or Get)
    /// * `expected_challenge` - The challenge bytes issued for this ceremony
    /// * `expected_origin` - The expected origin (e.g., "https://example.com")
    pub fn verify(
        &self,
        expected_type: ClientDataType,
        expected_challenge: &[u8],
        expected_origin: &str,
    ) -> Result<()> {
        if self.type_ != expected_type {
            tracing::debug!(expected = %expected_type, got = %self.type_, "client data type mismatch");
            return Err(WebAuthnError::InvalidClientDataJson(ClientDataField::Type));
        }

        if self.challenge != expected_challenge {
            return Err(WebAuthnError::InvalidClientDataJson(ClientDataField::Challenge));
        }

        if self.origin != expected_origin {
            tracing::debug!(expected = expected_origin, got = %self.origin, "client data origin mismatch");
            return Err(WebAuthnError::InvalidClientDataJson(ClientDataField::Origin));
        }

        Ok(())
    }
}
