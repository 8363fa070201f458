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

//! COSE_Key decoding and signature verification.
//!
//! Credential public keys arrive as a CBOR map keyed by small integers
//! (RFC 9052 section 7). Only EC2 and RSA keys are understood; the algorithm
//! embedded in the key decides which primitive verifies a signature.

use std::io::Cursor;

use aws_lc_rs::signature::{
    EcdsaVerificationAlgorithm, RsaParameters, RsaPublicKeyComponents, UnparsedPublicKey,
    ECDSA_P256_SHA256_ASN1, ECDSA_P384_SHA384_ASN1, ECDSA_P521_SHA512_ASN1,
    RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY, RSA_PKCS1_2048_8192_SHA256,
    RSA_PKCS1_2048_8192_SHA384, RSA_PKCS1_2048_8192_SHA512, RSA_PSS_2048_8192_SHA256,
    RSA_PSS_2048_8192_SHA384, RSA_PSS_2048_8192_SHA512,
};
use ciborium::Value;
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};

use crate::algorithm::CoseAlgorithmIdentifier;
use crate::base64url;
use crate::error::{Result, WebAuthnError};

const LABEL_KTY: i64 = 1;
const LABEL_ALG: i64 = 3;
const LABEL_CRV: i64 = -1;
const LABEL_X: i64 = -2;
const LABEL_Y: i64 = -3;
const LABEL_N: i64 = -1;
const LABEL_E: i64 = -2;

const KTY_EC2: i64 = 2;
const KTY_RSA: i64 = 3;

/// Elliptic curves usable with EC2 keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoseEllipticCurve {
    /// NIST P-256 (COSE value 1).
    P256,
    /// NIST P-384 (COSE value 2).
    P384,
    /// NIST P-521 (COSE value 3).
    P521,
}

impl CoseEllipticCurve {
    fn from_value(value: i64) -> Option<Self> {
        match value {
            1 => Some(CoseEllipticCurve::P256),
            2 => Some(CoseEllipticCurve::P384),
            3 => Some(CoseEllipticCurve::P521),
            _ => None,
        }
    }

    /// Returns the COSE registry value.
    pub fn value(self) -> i64 {
        match self {
            CoseEllipticCurve::P256 => 1,
            CoseEllipticCurve::P384 => 2,
            CoseEllipticCurve::P521 => 3,
        }
    }

    /// Length in bytes of each affine coordinate.
    pub fn coordinate_length(self) -> usize {
        match self {
            CoseEllipticCurve::P256 => 32,
            CoseEllipticCurve::P384 => 48,
            CoseEllipticCurve::P521 => 66,
        }
    }

    /// The only curve an ECDSA algorithm may be used with.
    fn for_algorithm(alg: CoseAlgorithmIdentifier) -> Option<Self> {
        match alg {
            CoseAlgorithmIdentifier::Es256 => Some(CoseEllipticCurve::P256),
            CoseAlgorithmIdentifier::Es384 => Some(CoseEllipticCurve::P384),
            CoseAlgorithmIdentifier::Es512 => Some(CoseEllipticCurve::P521),
            _ => None,
        }
    }
}

/// An elliptic curve public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ec2PublicKey {
    /// Algorithm the key was declared for.
    pub algorithm: CoseAlgorithmIdentifier,
    /// Curve the point lies on.
    pub curve: CoseEllipticCurve,
    /// Affine X coordinate, big-endian.
    pub x: Vec<u8>,
    /// Affine Y coordinate, big-endian.
    pub y: Vec<u8>,
}

impl Ec2PublicKey {
    fn from_entries(algorithm: CoseAlgorithmIdentifier, entries: &[(Value, Value)]) -> Result<Self> {
        let expected = CoseEllipticCurve::for_algorithm(algorithm)
            .ok_or(WebAuthnError::UnsupportedCoseAlgorithmForEc2PublicKey)?;

        let curve = lookup_integer(entries, LABEL_CRV)
            .and_then(CoseEllipticCurve::from_value)
            .ok_or(WebAuthnError::InvalidCurve)?;
        if curve != expected {
            return Err(WebAuthnError::InvalidCurve);
        }

        let x = lookup_bytes(entries, LABEL_X)
            .filter(|x| x.len() == curve.coordinate_length())
            .ok_or(WebAuthnError::InvalidXCoordinate)?;
        let y = lookup_bytes(entries, LABEL_Y)
            .filter(|y| y.len() == curve.coordinate_length())
            .ok_or(WebAuthnError::InvalidYCoordinate)?;

        Ok(Ec2PublicKey {
            algorithm,
            curve,
            x: x.to_vec(),
            y: y.to_vec(),
        })
    }

    /// Uncompressed SEC1 encoding (`0x04 || x || y`).
    pub fn sec1_point(&self) -> Vec<u8> {
        let mut point = Vec::with_capacity(1 + self.x.len() + self.y.len());
        point.push(0x04);
        point.extend_from_slice(&self.x);
        point.extend_from_slice(&self.y);
        point
    }

    fn verify(&self, alg: CoseAlgorithmIdentifier, signature: &[u8], message: &[u8]) -> Result<()> {
        let params: &'static EcdsaVerificationAlgorithm = match (alg, self.curve) {
            (CoseAlgorithmIdentifier::Es256, CoseEllipticCurve::P256) => &ECDSA_P256_SHA256_ASN1,
            (CoseAlgorithmIdentifier::Es384, CoseEllipticCurve::P384) => &ECDSA_P384_SHA384_ASN1,
            (CoseAlgorithmIdentifier::Es512, CoseEllipticCurve::P521) => &ECDSA_P521_SHA512_ASN1,
            _ => return Err(WebAuthnError::UnsupportedCoseAlgorithmForEc2PublicKey),
        };

        // The verification algorithm hashes the message itself.
        UnparsedPublicKey::new(params, self.sec1_point())
            .verify(message, signature)
            .map_err(|_| WebAuthnError::InvalidSignature)
    }
}

/// An RSA public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKey {
    /// Algorithm the key was declared for.
    pub algorithm: CoseAlgorithmIdentifier,
    /// Modulus, big-endian.
    pub n: Vec<u8>,
    /// Public exponent, big-endian.
    pub e: Vec<u8>,
}

impl RsaPublicKey {
    fn from_entries(algorithm: CoseAlgorithmIdentifier, entries: &[(Value, Value)]) -> Result<Self> {
        if !algorithm.is_rsa() {
            return Err(WebAuthnError::UnsupportedCoseAlgorithmForRsaPublicKey);
        }

        let n = lookup_bytes(entries, LABEL_N)
            .filter(|n| !n.is_empty())
            .ok_or(WebAuthnError::InvalidModulus)?;
        let e = lookup_bytes(entries, LABEL_E)
            .filter(|e| !e.is_empty())
            .ok_or(WebAuthnError::InvalidExponent)?;

        Ok(RsaPublicKey {
            algorithm,
            n: n.to_vec(),
            e: e.to_vec(),
        })
    }

    fn verify(&self, alg: CoseAlgorithmIdentifier, signature: &[u8], message: &[u8]) -> Result<()> {
        let params: &'static RsaParameters = match alg {
            CoseAlgorithmIdentifier::Rs1 => &RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
            CoseAlgorithmIdentifier::Rs256 => &RSA_PKCS1_2048_8192_SHA256,
            CoseAlgorithmIdentifier::Rs384 => &RSA_PKCS1_2048_8192_SHA384,
            CoseAlgorithmIdentifier::Rs512 => &RSA_PKCS1_2048_8192_SHA512,
            CoseAlgorithmIdentifier::Ps256 => &RSA_PSS_2048_8192_SHA256,
            CoseAlgorithmIdentifier::Ps384 => &RSA_PSS_2048_8192_SHA384,
            CoseAlgorithmIdentifier::Ps512 => &RSA_PSS_2048_8192_SHA512,
            CoseAlgorithmIdentifier::Es256
            | CoseAlgorithmIdentifier::Es384
            | CoseAlgorithmIdentifier::Es512 => {
                return Err(WebAuthnError::UnsupportedCoseAlgorithmForRsaPublicKey)
            }
        };

        let components = RsaPublicKeyComponents {
            n: self.n.as_slice(),
            e: self.e.as_slice(),
        };
        components
            .verify(params, message, signature)
            .map_err(|_| WebAuthnError::InvalidSignature)
    }
}

/// A credential public key decoded from its COSE_Key form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CosePublicKey {
    /// Elliptic curve key (kty 2).
    Ec2(Ec2PublicKey),
    /// RSA key (kty 3).
    Rsa(RsaPublicKey),
}

impl CosePublicKey {
    /// Decodes a COSE_Key from CBOR bytes.
    ///
    /// The input must hold exactly one CBOR item.
    ///
    /// # Errors
    ///
    /// Returns [`WebAuthnError::BadPublicKeyBytes`] on malformed CBOR, and the
    /// field-specific error when the map is well formed but the key is not.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (value, consumed) = decode_cbor_prefix(bytes).ok_or(WebAuthnError::BadPublicKeyBytes)?;
        if consumed != bytes.len() {
            return Err(WebAuthnError::BadPublicKeyBytes);
        }
        Self::from_cbor_value(value)
    }

    /// Decodes a COSE_Key from an already parsed CBOR value.
    pub fn from_cbor_value(value: Value) -> Result<Self> {
        let entries = value.into_map().map_err(|_| WebAuthnError::BadPublicKeyBytes)?;

        let kty = lookup_integer(&entries, LABEL_KTY).ok_or(WebAuthnError::BadPublicKeyBytes)?;
        let alg = lookup_integer(&entries, LABEL_ALG).ok_or(WebAuthnError::BadPublicKeyBytes)?;

        if kty != KTY_EC2 && kty != KTY_RSA {
            return Err(WebAuthnError::InvalidKeyType);
        }
        let algorithm = CoseAlgorithmIdentifier::try_from(alg)?;

        match kty {
            KTY_EC2 => Ec2PublicKey::from_entries(algorithm, &entries).map(CosePublicKey::Ec2),
            _ => RsaPublicKey::from_entries(algorithm, &entries).map(CosePublicKey::Rsa),
        }
    }

    /// The algorithm this key is bound to.
    pub fn algorithm(&self) -> CoseAlgorithmIdentifier {
        match self {
            CosePublicKey::Ec2(key) => key.algorithm,
            CosePublicKey::Rsa(key) => key.algorithm,
        }
    }

    /// Verifies `signature` over `message` with the key's own algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`WebAuthnError::InvalidSignature`] if the signature does not verify.
    #[inline]
    pub fn verify(&self, signature: &[u8], message: &[u8]) -> Result<()> {
        self.verify_as(self.algorithm(), signature, message)
    }

    /// Verifies `signature` over `message` under an explicitly named algorithm.
    ///
    /// Fails with the "unsupported algorithm for key type" error when `alg`
    /// cannot be used with this key.
    pub fn verify_as(
        &self,
        alg: CoseAlgorithmIdentifier,
        signature: &[u8],
        message: &[u8],
    ) -> Result<()> {
        match self {
            CosePublicKey::Ec2(key) => key.verify(alg, signature, message),
            CosePublicKey::Rsa(key) => key.verify(alg, signature, message),
        }
    }

    /// Re-encodes the key as a COSE_Key CBOR map.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let int = |v: i64| Value::Integer(v.into());
        let entries = match self {
            CosePublicKey::Ec2(key) => vec![
                (int(LABEL_KTY), int(KTY_EC2)),
                (int(LABEL_ALG), int(key.algorithm.value())),
                (int(LABEL_CRV), int(key.curve.value())),
                (int(LABEL_X), Value::Bytes(key.x.clone())),
                (int(LABEL_Y), Value::Bytes(key.y.clone())),
            ],
            CosePublicKey::Rsa(key) => vec![
                (int(LABEL_KTY), int(KTY_RSA)),
                (int(LABEL_ALG), int(key.algorithm.value())),
                (int(LABEL_N), Value::Bytes(key.n.clone())),
                (int(LABEL_E), Value::Bytes(key.e.clone())),
            ],
        };

        let mut bytes = Vec::new();
        ciborium::into_writer(&Value::Map(entries), &mut bytes)
            .map_err(|_| WebAuthnError::BadPublicKeyBytes)?;
        Ok(bytes)
    }
}

// Persisted as base64url text of the COSE encoding; loading re-validates the key.
impl Serialize for CosePublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let bytes = self.to_bytes().map_err(<S::Error as ser::Error>::custom)?;
        serializer.serialize_str(&base64url::encode(&bytes))
    }
}

impl<'de> Deserialize<'de> for CosePublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = base64url::decode(&text).map_err(<D::Error as de::Error>::custom)?;
        CosePublicKey::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

/// Decodes one CBOR item from the front of `bytes`, returning it together
/// with the number of bytes it occupied.
pub(crate) fn decode_cbor_prefix(bytes: &[u8]) -> Option<(Value, usize)> {
    let mut cursor = Cursor::new(bytes);
    let value: Value = ciborium::from_reader(&mut cursor).ok()?;
    let consumed = usize::try_from(cursor.position()).ok()?;
    Some((value, consumed))
}

fn lookup(entries: &[(Value, Value)], label: i64) -> Option<&Value> {
    entries
        .iter()
        .find(|(k, _)| k.as_integer().and_then(|i| i64::try_from(i).ok()) == Some(label))
        .map(|(_, v)| v)
}

fn lookup_integer(entries: &[(Value, Value)], label: i64) -> Option<i64> {
    lookup(entries, label)
        .and_then(Value::as_integer)
        .and_then(|i| i64::try_from(i).ok())
}

fn lookup_bytes(entries: &[(Value, Value)], label: i64) -> Option<&[u8]> {
    lookup(entries, label)
        .and_then(Value::as_bytes)
        .map(Vec::as_slice)
}
