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

//! Error taxonomy shared by every parser and ceremony verifier.

use std::fmt;

/// The client data field that caused a client data rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientDataField {
    /// The JSON could not be parsed or a required field is missing.
    Malformed,
    /// The ceremony type did not match.
    Type,
    /// The challenge did not match the one issued.
    Challenge,
    /// The origin did not match the relying party origin.
    Origin,
}

impl fmt::Display for ClientDataField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ClientDataField::Malformed => "malformed",
            ClientDataField::Type => "type",
            ClientDataField::Challenge => "challenge",
            ClientDataField::Origin => "origin",
        };
        f.write_str(name)
    }
}

/// Every way a WebAuthn ceremony can be rejected.
///
/// The set is closed and flat so callers can match on it exhaustively. No
/// variant wraps another error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WebAuthnError {
    // Shared
    #[error("invalid client data JSON ({0})")]
    InvalidClientDataJson(ClientDataField),
    #[error("attested credential data missing")]
    AttestedCredentialDataMissing,
    #[error("relying party ID hash does not match")]
    RelyingPartyIdHashDoesNotMatch,
    #[error("user present flag not set")]
    UserPresentFlagNotSet,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("base64url decode error")]
    Base64Decode,

    // Attestation object
    #[error("user verification required but flag not set")]
    UserVerificationRequiredButFlagNotSet,
    #[error("attestation statement missing")]
    AttestationStatementMissing,
    #[error("attestation verification not supported")]
    AttestationVerificationNotSupported,
    #[error("invalid attestation data")]
    InvalidAttestationData,
    #[error("invalid authenticator data")]
    InvalidAuthData,
    #[error("invalid attestation format")]
    InvalidFmt,
    #[error("invalid attestation statement")]
    InvalidAttStmt,
    #[error("attestation format not supported")]
    AttestationFormatNotSupported,

    // Ceremonies
    #[error("invalid user ID")]
    InvalidUserId,
    #[error("unsupported credential public key algorithm")]
    UnsupportedCredentialPublicKeyAlgorithm,
    #[error("credential ID already exists")]
    CredentialIdAlreadyExists,
    #[error("user verified flag not set")]
    UserVerifiedFlagNotSet,
    #[error("potential replay attack")]
    PotentialReplayAttack,
    #[error("invalid assertion credential type")]
    InvalidAssertionCredentialType,
    #[error("credential not allowed")]
    CredentialNotAllowed,
    #[error("user handle does not match credential owner")]
    UserHandleMismatch,
    #[error("random number generator unavailable")]
    RandomnessUnavailable,

    // Credential creation response
    #[error("invalid raw ID")]
    InvalidRawId,
    #[error("invalid credential creation type")]
    InvalidCredentialCreationType,
    #[error("credential raw ID too big")]
    CredentialRawIdTooBig,

    // Authenticator data
    #[error("authenticator data too short")]
    AuthDataTooShort,
    #[error("attested credential flag not set")]
    AttestedCredentialFlagNotSet,
    #[error("extension data missing")]
    ExtensionDataMissing,
    #[error("leftover bytes in authenticator data")]
    LeftOverBytesInAuthenticatorData,

    // Credential public key
    #[error("bad public key bytes")]
    BadPublicKeyBytes,
    #[error("invalid key type")]
    InvalidKeyType,
    #[error("invalid algorithm")]
    InvalidAlgorithm,
    #[error("invalid curve")]
    InvalidCurve,
    #[error("invalid X coordinate")]
    InvalidXCoordinate,
    #[error("invalid Y coordinate")]
    InvalidYCoordinate,
    #[error("unsupported COSE algorithm")]
    UnsupportedCoseAlgorithm,
    #[error("unsupported COSE algorithm for EC2 public key")]
    UnsupportedCoseAlgorithmForEc2PublicKey,
    #[error("invalid modulus")]
    InvalidModulus,
    #[error("invalid exponent")]
    InvalidExponent,
    #[error("unsupported COSE algorithm for RSA public key")]
    UnsupportedCoseAlgorithmForRsaPublicKey,
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = WebAuthnError> = std::result::Result<T, E>;
