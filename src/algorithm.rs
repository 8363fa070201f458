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

//! COSE algorithm identifiers accepted for credential public keys.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::WebAuthnError;

/// A signature algorithm from the IANA COSE Algorithms registry.
///
/// The set is closed: an identifier outside of it is rejected, never ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum CoseAlgorithmIdentifier {
    /// ECDSA with SHA-256 on P-256.
    Es256,
    /// ECDSA with SHA-384 on P-384.
    Es384,
    /// ECDSA with SHA-512 on P-521.
    Es512,
    /// RSASSA-PKCS1-v1_5 with SHA-1.
    Rs1,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    Rs256,
    /// RSASSA-PKCS1-v1_5 with SHA-384.
    Rs384,
    /// RSASSA-PKCS1-v1_5 with SHA-512.
    Rs512,
    /// RSASSA-PSS with SHA-256.
    Ps256,
    /// RSASSA-PSS with SHA-384.
    Ps384,
    /// RSASSA-PSS with SHA-512.
    Ps512,
}

impl CoseAlgorithmIdentifier {
    /// Every supported algorithm, in registry order.
    pub const ALL: [CoseAlgorithmIdentifier; 10] = [
        CoseAlgorithmIdentifier::Es256,
        CoseAlgorithmIdentifier::Es384,
        CoseAlgorithmIdentifier::Es512,
        CoseAlgorithmIdentifier::Rs1,
        CoseAlgorithmIdentifier::Rs256,
        CoseAlgorithmIdentifier::Rs384,
        CoseAlgorithmIdentifier::Rs512,
        CoseAlgorithmIdentifier::Ps256,
        CoseAlgorithmIdentifier::Ps384,
        CoseAlgorithmIdentifier::Ps512,
    ];

    /// Returns the IANA integer value.
    pub fn value(self) -> i64 {
        match self {
            CoseAlgorithmIdentifier::Es256 => -7,
            CoseAlgorithmIdentifier::Es384 => -35,
            CoseAlgorithmIdentifier::Es512 => -36,
            CoseAlgorithmIdentifier::Rs1 => -65535,
            CoseAlgorithmIdentifier::Rs256 => -257,
            CoseAlgorithmIdentifier::Rs384 => -258,
            CoseAlgorithmIdentifier::Rs512 => -259,
            CoseAlgorithmIdentifier::Ps256 => -37,
            CoseAlgorithmIdentifier::Ps384 => -38,
            CoseAlgorithmIdentifier::Ps512 => -39,
        }
    }

    /// Returns true for the ECDSA family.
    pub fn is_ec2(self) -> bool {
        matches!(
            self,
            CoseAlgorithmIdentifier::Es256
                | CoseAlgorithmIdentifier::Es384
                | CoseAlgorithmIdentifier::Es512
        )
    }

    /// Returns true for the RSA families (PKCS#1 v1.5 and PSS).
    pub fn is_rsa(self) -> bool {
        !self.is_ec2()
    }

    /// Returns the registry name, e.g. `"ES256"`.
    pub fn name(self) -> &'static str {
        match self {
            CoseAlgorithmIdentifier::Es256 => "ES256",
            CoseAlgorithmIdentifier::Es384 => "ES384",
            CoseAlgorithmIdentifier::Es512 => "ES512",
            CoseAlgorithmIdentifier::Rs1 => "RS1",
            CoseAlgorithmIdentifier::Rs256 => "RS256",
            CoseAlgorithmIdentifier::Rs384 => "RS384",
            CoseAlgorithmIdentifier::Rs512 => "RS512",
            CoseAlgorithmIdentifier::Ps256 => "PS256",
            CoseAlgorithmIdentifier::Ps384 => "PS384",
            CoseAlgorithmIdentifier::Ps512 => "PS512",
        }
    }
}

impl TryFrom<i64> for CoseAlgorithmIdentifier {
    type Error = WebAuthnError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        CoseAlgorithmIdentifier::ALL
            .into_iter()
            .find(|alg| alg.value() == value)
            .ok_or(WebAuthnError::UnsupportedCoseAlgorithm)
    }
}

impl From<CoseAlgorithmIdentifier> for i64 {
    fn from(alg: CoseAlgorithmIdentifier) -> Self {
        alg.value()
    }
}

impl fmt::Display for CoseAlgorithmIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
