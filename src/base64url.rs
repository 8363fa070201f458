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

//! URL-safe base64 helpers.
//!
//! Browsers send every binary WebAuthn field as base64url. Some clients pad,
//! most don't, so decoding accepts both while encoding never pads.

use base64::alphabet::URL_SAFE;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;

use crate::error::{Result, WebAuthnError};

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes binary data as base64url without padding.
#[inline]
pub fn encode(data: &[u8]) -> String {
    ENGINE.encode(data)
}

/// Decodes base64url text, padded or not.
///
/// # Errors
///
/// Returns [`WebAuthnError::Base64Decode`] if the input contains characters
/// outside the base64url alphabet or has an impossible length.
pub fn decode(s: &str) -> Result<Vec<u8>> {
    ENGINE.decode(s).map_err(|e| {
        tracing::debug!(error = %e, "base64url decode failed");
        WebAuthnError::Base64Decode
    })
}
