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

use aws_lc_rs::digest::{self, SHA256};
use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::rsa::KeySize;
use aws_lc_rs::signature::{
    EcdsaKeyPair, EcdsaSigningAlgorithm, KeyPair, RsaEncoding, RsaKeyPair,
    ECDSA_P256_SHA256_ASN1_SIGNING, ECDSA_P384_SHA384_ASN1_SIGNING,
    ECDSA_P521_SHA512_ASN1_SIGNING, RSA_PKCS1_SHA256, RSA_PSS_SHA256,
};
use ciborium::Value;

use crate::*;

pub const RP_ID: &str = "example.com";
pub const RP_ORIGIN: &str = "https://example.com";
pub const USER_HANDLE: &[u8] = b"user_handle_0001";

pub const UP: u8 = AuthenticatorFlags::USER_PRESENT;
pub const UV: u8 = AuthenticatorFlags::USER_VERIFIED;
pub const AT: u8 = AuthenticatorFlags::ATTESTED_CREDENTIAL_DATA;
pub const ED: u8 = AuthenticatorFlags::EXTENSION_DATA;

pub fn test_webauthn() -> WebAuthn {
    WebAuthn::new(RP_ID, RP_ORIGIN, "Example")
}

pub fn encode_cbor(value: &Value) -> Vec<u8> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).unwrap();
    bytes
}

/// Helper function to create an EC2 COSE key
pub fn create_ec2_cose_key(alg: i64, crv: i64, x: &[u8], y: &[u8]) -> Vec<u8> {
    encode_cbor(&Value::Map(vec![
        (Value::Integer(1.into()), Value::Integer(2.into())), // kty: EC2
        (Value::Integer(3.into()), Value::Integer(alg.into())), // alg
        (Value::Integer((-1).into()), Value::Integer(crv.into())), // crv
        (Value::Integer((-2).into()), Value::Bytes(x.to_vec())), // x coordinate
        (Value::Integer((-3).into()), Value::Bytes(y.to_vec())), // y coordinate
    ]))
}

/// Helper function to create an RSA COSE key
pub fn create_rsa_cose_key(alg: i64, n: &[u8], e: &[u8]) -> Vec<u8> {
    encode_cbor(&Value::Map(vec![
        (Value::Integer(1.into()), Value::Integer(3.into())), // kty: RSA
        (Value::Integer(3.into()), Value::Integer(alg.into())), // alg
        (Value::Integer((-1).into()), Value::Bytes(n.to_vec())), // n (modulus)
        (Value::Integer((-2).into()), Value::Bytes(e.to_vec())), // e (exponent)
    ]))
}

enum Signer {
    Ecdsa(EcdsaKeyPair),
    Rsa(RsaKeyPair, &'static dyn RsaEncoding),
}

/// A freshly generated key pair together with its COSE public key.
pub struct TestKey {
    signer: Signer,
    pub cose_key: Vec<u8>,
}

impl TestKey {
    fn ecdsa(signing: &'static EcdsaSigningAlgorithm, alg: i64, crv: i64) -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(signing, &rng).unwrap();
        let key_pair = EcdsaKeyPair::from_pkcs8(signing, pkcs8.as_ref()).unwrap();

        // Uncompressed point: 0x04 || x || y
        let point = key_pair.public_key().as_ref();
        let coordinate_length = (point.len() - 1) / 2;
        let x = &point[1..1 + coordinate_length];
        let y = &point[1 + coordinate_length..];
        let cose_key = create_ec2_cose_key(alg, crv, x, y);

        TestKey {
            signer: Signer::Ecdsa(key_pair),
            cose_key,
        }
    }

    fn rsa(encoding: &'static dyn RsaEncoding, alg: i64) -> Self {
        let (key_pair, n, e) = create_test_rsa_keypair();
        TestKey {
            signer: Signer::Rsa(key_pair, encoding),
            cose_key: create_rsa_cose_key(alg, &n, &e),
        }
    }

    pub fn es256() -> Self {
        Self::ecdsa(&ECDSA_P256_SHA256_ASN1_SIGNING, -7, 1)
    }

    pub fn es384() -> Self {
        Self::ecdsa(&ECDSA_P384_SHA384_ASN1_SIGNING, -35, 2)
    }

    pub fn es512() -> Self {
        Self::ecdsa(&ECDSA_P521_SHA512_ASN1_SIGNING, -36, 3)
    }

    pub fn rs256() -> Self {
        Self::rsa(&RSA_PKCS1_SHA256, -257)
    }

    pub fn ps256() -> Self {
        Self::rsa(&RSA_PSS_SHA256, -37)
    }

    pub fn public_key(&self) -> CosePublicKey {
        CosePublicKey::from_bytes(&self.cose_key).unwrap()
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let rng = SystemRandom::new();
        match &self.signer {
            Signer::Ecdsa(key_pair) => key_pair.sign(&rng, message).unwrap().as_ref().to_vec(),
            Signer::Rsa(key_pair, encoding) => {
                let mut signature = vec![0u8; key_pair.public_modulus_len()];
                key_pair.sign(*encoding, &rng, message, &mut signature).unwrap();
                signature
            }
        }
    }
}

pub fn rp_id_hash(rp_id: &str) -> Vec<u8> {
    digest::digest(&SHA256, rp_id.as_bytes()).as_ref().to_vec()
}

/// Helper function to create authenticator data without attested credential data
pub fn create_test_authenticator_data(flags: u8, counter: u32) -> Vec<u8> {
    let mut auth_data = Vec::new();
    auth_data.extend_from_slice(&rp_id_hash(RP_ID)); // rpIdHash
    auth_data.push(flags);
    auth_data.extend_from_slice(&counter.to_be_bytes()); // counter
    auth_data
}

/// Helper function to create authenticator data carrying a new credential
pub fn create_attested_authenticator_data(
    flags: u8,
    counter: u32,
    credential_id: &[u8],
    cose_key: &[u8],
) -> Vec<u8> {
    let mut auth_data = create_test_authenticator_data(flags | AT, counter);
    auth_data.extend_from_slice(&[0u8; 16]); // aaguid
    auth_data.extend_from_slice(&(credential_id.len() as u16).to_be_bytes()); // credIdLen
    auth_data.extend_from_slice(credential_id);
    auth_data.extend_from_slice(cose_key);
    auth_data
}

/// Helper function to create an attestation object
pub fn create_test_attestation_object(fmt: &str, att_stmt: Option<Value>, auth_data: &[u8]) -> Vec<u8> {
    let mut att_obj = vec![(Value::Text("fmt".to_string()), Value::Text(fmt.to_string()))];
    if let Some(att_stmt) = att_stmt {
        att_obj.push((Value::Text("attStmt".to_string()), att_stmt));
    }
    att_obj.push((Value::Text("authData".to_string()), Value::Bytes(auth_data.to_vec())));
    encode_cbor(&Value::Map(att_obj))
}

/// Helper function to create client data JSON
pub fn create_test_client_data_json(type_: &str, challenge: &[u8], origin: &str) -> Vec<u8> {
    let client_data = serde_json::json!({
        "type": type_,
        "challenge": base64url::encode(challenge),
        "origin": origin,
        "crossOrigin": false
    });
    serde_json::to_vec(&client_data).unwrap()
}

pub fn create_registration_credential(
    credential_id: &[u8],
    client_data_json: &[u8],
    attestation_object: &[u8],
) -> RegistrationCredential {
    RegistrationCredential {
        id: base64url::encode(credential_id),
        raw_id: base64url::encode(credential_id),
        type_: "public-key".to_string(),
        response: AuthenticatorAttestationResponse {
            client_data_json: base64url::encode(client_data_json),
            attestation_object: base64url::encode(attestation_object),
        },
    }
}

pub fn create_registration_state(
    challenge: &[u8],
    user_verification: UserVerificationRequirement,
) -> RegistrationState {
    RegistrationState {
        challenge: challenge.to_vec(),
        user_handle: USER_HANDLE.to_vec(),
        user: UserInfo {
            id: base64url::encode(USER_HANDLE),
            name: "alice".to_string(),
            display_name: "Alice".to_string(),
        },
        user_verification,
    }
}

/// Signs `authenticatorData || SHA-256(clientDataJSON)` and packs an assertion.
pub fn create_authentication_credential(
    key: &TestKey,
    credential_id: &[u8],
    client_data_json: &[u8],
    auth_data: &[u8],
) -> AuthenticationCredential {
    let mut signed_data = auth_data.to_vec();
    signed_data.extend_from_slice(digest::digest(&SHA256, client_data_json).as_ref());
    let signature = key.sign(&signed_data);

    AuthenticationCredential {
        id: base64url::encode(credential_id),
        raw_id: base64url::encode(credential_id),
        type_: "public-key".to_string(),
        response: AuthenticatorAssertionResponse {
            client_data_json: base64url::encode(client_data_json),
            authenticator_data: base64url::encode(auth_data),
            signature: base64url::encode(&signature),
            user_handle: None,
        },
    }
}

pub fn create_authentication_state(
    challenge: &[u8],
    allowed_credentials: Vec<Vec<u8>>,
    user_verification: UserVerificationRequirement,
) -> AuthenticationState {
    AuthenticationState {
        challenge: challenge.to_vec(),
        allowed_credentials,
        user_verification,
    }
}

pub fn create_credential_record(key: &TestKey, credential_id: &[u8], counter: u32) -> CredentialRecord {
    CredentialRecord {
        credential_id: credential_id.to_vec(),
        public_key: key.public_key(),
        counter,
        user_handle: USER_HANDLE.to_vec(),
        aaguid: [0u8; 16],
        attestation_format: AttestationFormat::None,
        backup_eligible: false,
        backup_state: false,
    }
}

/// Helper to create a test RSA key pair and return (key_pair, n, e)
pub fn create_test_rsa_keypair() -> (RsaKeyPair, Vec<u8>, Vec<u8>) {
    let key_pair = RsaKeyPair::generate(KeySize::Rsa2048).unwrap();

    // The public key is a DER RSAPublicKey: SEQUENCE { n INTEGER, e INTEGER }
    let pub_key = key_pair.public_key();
    let (n, e) = parse_rsa_public_key(pub_key.as_ref());

    (key_pair, n, e)
}

/// Parse RSA public key bytes to extract n (modulus) and e (exponent)
fn parse_rsa_public_key(pub_key_bytes: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let mut pos = 0;

    // Skip SEQUENCE tag (0x30) and read length
    assert_eq!(pub_key_bytes[pos], 0x30);
    pos += 1;
    let (_, len_bytes) = read_der_length(&pub_key_bytes[pos..]);
    pos += len_bytes;

    let (n, consumed) = read_der_integer(&pub_key_bytes[pos..]);
    pos += consumed;
    let (e, _) = read_der_integer(&pub_key_bytes[pos..]);

    (n, e)
}

/// Reads an INTEGER, dropping the sign byte DER adds to positive values
fn read_der_integer(data: &[u8]) -> (Vec<u8>, usize) {
    assert_eq!(data[0], 0x02);
    let (len, len_bytes) = read_der_length(&data[1..]);
    let start = 1 + len_bytes;
    let mut value = data[start..start + len].to_vec();
    if value.len() > 1 && value[0] == 0x00 {
        value.remove(0);
    }
    (value, start + len)
}

/// Read DER length encoding, returns (length, bytes_consumed)
fn read_der_length(data: &[u8]) -> (usize, usize) {
    if data[0] < 0x80 {
        (data[0] as usize, 1)
    } else {
        let num_bytes = (data[0] & 0x7F) as usize;
        let mut len = 0usize;
        for i in 0..num_bytes {
            len = (len << 8) | (data[1 + i] as usize);
        }
        (len, 1 + num_bytes)
    }
}
