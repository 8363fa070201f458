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
use ciborium::Value;

use super::helpers::*;
use crate::*;

const CREDENTIAL_ID: &[u8] = &[0x11; 16];

fn client_data_hash() -> Vec<u8> {
    digest::digest(&SHA256, b"client data").as_ref().to_vec()
}

fn packed_statement(alg: i64, sig: Vec<u8>) -> Value {
    Value::Map(vec![
        (Value::Text("alg".to_string()), Value::Integer(alg.into())),
        (Value::Text("sig".to_string()), Value::Bytes(sig)),
    ])
}

/// Self attestation: the credential key signs authData || clientDataHash.
fn self_attested(key: &TestKey, flags: u8) -> Vec<u8> {
    let auth_data = create_attested_authenticator_data(flags, 0, CREDENTIAL_ID, &key.cose_key);
    let mut signed = auth_data.clone();
    signed.extend_from_slice(&client_data_hash());
    let statement = packed_statement(key.public_key().algorithm().value(), key.sign(&signed));
    create_test_attestation_object("packed", Some(statement), &auth_data)
}

fn parse_error(bytes: &[u8]) -> WebAuthnError {
    AttestationObject::from_bytes(bytes).unwrap_err()
}

fn none_object(flags: u8) -> AttestationObject {
    let key = TestKey::es256();
    let auth_data = create_attested_authenticator_data(flags, 0, CREDENTIAL_ID, &key.cose_key);
    let bytes = create_test_attestation_object("none", Some(Value::Map(vec![])), &auth_data);
    AttestationObject::from_bytes(&bytes).unwrap()
}

// ===== Parsing tests =====

#[test]
fn test_parse_none_attestation() {
    let key = TestKey::es256();
    let auth_data = create_attested_authenticator_data(UP, 0, CREDENTIAL_ID, &key.cose_key);
    let bytes = create_test_attestation_object("none", Some(Value::Map(vec![])), &auth_data);

    let object = AttestationObject::from_bytes(&bytes).unwrap();
    assert_eq!(object.format, AttestationFormat::None);
    assert!(object.statement.is_empty());
    assert_eq!(object.auth_data.as_bytes(), auth_data.as_slice());
}

#[test]
fn test_parse_none_attestation_without_statement() {
    let key = TestKey::es256();
    let auth_data = create_attested_authenticator_data(UP, 0, CREDENTIAL_ID, &key.cose_key);
    let bytes = create_test_attestation_object("none", None, &auth_data);

    let object = AttestationObject::from_bytes(&bytes).unwrap();
    assert!(object.statement.is_empty());
}

#[test]
fn test_parse_invalid_cbor() {
    assert_eq!(parse_error(&[0xFF, 0xFE, 0xFD]), WebAuthnError::InvalidAttestationData);
}

#[test]
fn test_parse_not_a_map() {
    let bytes = encode_cbor(&Value::Array(vec![Value::Text("none".to_string())]));
    assert_eq!(parse_error(&bytes), WebAuthnError::InvalidAttestationData);
}

#[test]
fn test_parse_trailing_bytes() {
    let key = TestKey::es256();
    let auth_data = create_attested_authenticator_data(UP, 0, CREDENTIAL_ID, &key.cose_key);
    let mut bytes = create_test_attestation_object("none", None, &auth_data);
    bytes.push(0x00);

    assert_eq!(parse_error(&bytes), WebAuthnError::InvalidAttestationData);
}

#[test]
fn test_parse_missing_fmt() {
    let bytes = encode_cbor(&Value::Map(vec![(
        Value::Text("authData".to_string()),
        Value::Bytes(create_test_authenticator_data(UP, 0)),
    )]));
    assert_eq!(parse_error(&bytes), WebAuthnError::InvalidFmt);
}

#[test]
fn test_parse_fmt_not_text() {
    let bytes = encode_cbor(&Value::Map(vec![
        (Value::Text("fmt".to_string()), Value::Integer(1.into())),
        (
            Value::Text("authData".to_string()),
            Value::Bytes(create_test_authenticator_data(UP, 0)),
        ),
    ]));
    assert_eq!(parse_error(&bytes), WebAuthnError::InvalidFmt);
}

#[test]
fn test_parse_unsupported_formats() {
    for fmt in ["tpm", "android-key", "android-safetynet", "fido-u2f", "apple", "NONE"] {
        let bytes = create_test_attestation_object(fmt, Some(Value::Map(vec![])), &create_test_authenticator_data(UP, 0));
        assert_eq!(
            parse_error(&bytes),
            WebAuthnError::AttestationFormatNotSupported,
            "format {} should be rejected",
            fmt
        );
    }
}

#[test]
fn test_parse_statement_not_a_map() {
    let bytes = create_test_attestation_object(
        "packed",
        Some(Value::Bytes(vec![1, 2, 3])),
        &create_test_authenticator_data(UP, 0),
    );
    assert_eq!(parse_error(&bytes), WebAuthnError::InvalidAttStmt);
}

#[test]
fn test_parse_packed_without_statement() {
    let bytes = create_test_attestation_object("packed", None, &create_test_authenticator_data(UP, 0));
    assert_eq!(parse_error(&bytes), WebAuthnError::AttestationStatementMissing);
}

#[test]
fn test_parse_missing_auth_data() {
    let bytes = encode_cbor(&Value::Map(vec![
        (Value::Text("fmt".to_string()), Value::Text("none".to_string())),
        (Value::Text("attStmt".to_string()), Value::Map(vec![])),
    ]));
    assert_eq!(parse_error(&bytes), WebAuthnError::InvalidAuthData);
}

#[test]
fn test_parse_malformed_auth_data() {
    let bytes = create_test_attestation_object("none", None, &[0u8; 10]);
    assert_eq!(parse_error(&bytes), WebAuthnError::AuthDataTooShort);
}

#[test]
fn test_format_names() {
    assert_eq!("none".parse::<AttestationFormat>().unwrap(), AttestationFormat::None);
    assert_eq!("packed".parse::<AttestationFormat>().unwrap(), AttestationFormat::Packed);
    assert_eq!(AttestationFormat::Packed.to_string(), "packed");
    assert_eq!(serde_json::to_string(&AttestationFormat::None).unwrap(), "\"none\"");
}

// ===== Verification order tests =====

#[test]
fn test_verify_none_success() {
    assert!(none_object(UP).verify(RP_ID, false, &client_data_hash()).is_ok());
}

#[test]
fn test_verify_rp_id_checked_first() {
    // Fails on the RP ID even though UP is also missing
    let object = none_object(0);
    assert_eq!(
        object.verify("other.example", true, &client_data_hash()),
        Err(WebAuthnError::RelyingPartyIdHashDoesNotMatch)
    );
}

#[test]
fn test_verify_user_present_required() {
    assert_eq!(
        none_object(UV).verify(RP_ID, false, &client_data_hash()),
        Err(WebAuthnError::UserPresentFlagNotSet)
    );
}

#[test]
fn test_verify_user_verification_required() {
    let object = none_object(UP);
    assert_eq!(
        object.verify(RP_ID, true, &client_data_hash()),
        Err(WebAuthnError::UserVerificationRequiredButFlagNotSet)
    );
    assert!(none_object(UP | UV).verify(RP_ID, true, &client_data_hash()).is_ok());
}

#[test]
fn test_verify_attested_credential_data_missing() {
    let bytes = create_test_attestation_object("none", None, &create_test_authenticator_data(UP, 0));
    let object = AttestationObject::from_bytes(&bytes).unwrap();

    assert_eq!(
        object.verify(RP_ID, false, &client_data_hash()),
        Err(WebAuthnError::AttestedCredentialDataMissing)
    );
}

#[test]
fn test_verify_none_with_statement() {
    let key = TestKey::es256();
    let auth_data = create_attested_authenticator_data(UP, 0, CREDENTIAL_ID, &key.cose_key);
    let bytes = create_test_attestation_object("none", Some(packed_statement(-7, vec![1, 2, 3])), &auth_data);
    let object = AttestationObject::from_bytes(&bytes).unwrap();

    assert_eq!(
        object.verify(RP_ID, false, &client_data_hash()),
        Err(WebAuthnError::InvalidAttStmt)
    );
}

// ===== Packed self attestation tests =====

#[test]
fn test_verify_packed_self_attestation_es256() {
    let object = AttestationObject::from_bytes(&self_attested(&TestKey::es256(), UP)).unwrap();
    assert_eq!(object.format, AttestationFormat::Packed);
    assert!(object.verify(RP_ID, false, &client_data_hash()).is_ok());
}

#[test]
fn test_verify_packed_self_attestation_rs256() {
    let object = AttestationObject::from_bytes(&self_attested(&TestKey::rs256(), UP | UV)).unwrap();
    assert!(object.verify(RP_ID, true, &client_data_hash()).is_ok());
}

#[test]
fn test_verify_packed_signature_over_other_client_data() {
    let object = AttestationObject::from_bytes(&self_attested(&TestKey::es256(), UP)).unwrap();
    let other_hash = digest::digest(&SHA256, b"other client data");

    assert_eq!(
        object.verify(RP_ID, false, other_hash.as_ref()),
        Err(WebAuthnError::InvalidSignature)
    );
}

#[test]
fn test_verify_packed_algorithm_mismatch() {
    let key = TestKey::es256();
    let auth_data = create_attested_authenticator_data(UP, 0, CREDENTIAL_ID, &key.cose_key);
    let bytes = create_test_attestation_object("packed", Some(packed_statement(-35, vec![0u8; 70])), &auth_data);
    let object = AttestationObject::from_bytes(&bytes).unwrap();

    assert_eq!(
        object.verify(RP_ID, false, &client_data_hash()),
        Err(WebAuthnError::InvalidAlgorithm)
    );
}

#[test]
fn test_verify_packed_unknown_algorithm() {
    let key = TestKey::es256();
    let auth_data = create_attested_authenticator_data(UP, 0, CREDENTIAL_ID, &key.cose_key);
    let bytes = create_test_attestation_object("packed", Some(packed_statement(-8, vec![0u8; 64])), &auth_data);
    let object = AttestationObject::from_bytes(&bytes).unwrap();

    assert_eq!(
        object.verify(RP_ID, false, &client_data_hash()),
        Err(WebAuthnError::UnsupportedCoseAlgorithm)
    );
}

#[test]
fn test_verify_packed_missing_fields() {
    let key = TestKey::es256();
    let auth_data = create_attested_authenticator_data(UP, 0, CREDENTIAL_ID, &key.cose_key);

    let no_sig = Value::Map(vec![(Value::Text("alg".to_string()), Value::Integer((-7).into()))]);
    let no_alg = Value::Map(vec![(Value::Text("sig".to_string()), Value::Bytes(vec![0u8; 64]))]);
    let text_alg = Value::Map(vec![
        (Value::Text("alg".to_string()), Value::Text("ES256".to_string())),
        (Value::Text("sig".to_string()), Value::Bytes(vec![0u8; 64])),
    ]);

    for statement in [no_sig, no_alg, text_alg] {
        let bytes = create_test_attestation_object("packed", Some(statement), &auth_data);
        let object = AttestationObject::from_bytes(&bytes).unwrap();
        assert_eq!(
            object.verify(RP_ID, false, &client_data_hash()),
            Err(WebAuthnError::InvalidAttStmt)
        );
    }
}

#[test]
fn test_verify_packed_full_attestation_not_supported() {
    let key = TestKey::es256();
    let auth_data = create_attested_authenticator_data(UP, 0, CREDENTIAL_ID, &key.cose_key);

    for extra in ["x5c", "ecdaaKeyId"] {
        let statement = Value::Map(vec![
            (Value::Text("alg".to_string()), Value::Integer((-7).into())),
            (Value::Text("sig".to_string()), Value::Bytes(vec![0u8; 64])),
            (Value::Text(extra.to_string()), Value::Array(vec![Value::Bytes(vec![0x30])])),
        ]);
        let bytes = create_test_attestation_object("packed", Some(statement), &auth_data);
        let object = AttestationObject::from_bytes(&bytes).unwrap();
        assert_eq!(
            object.verify(RP_ID, false, &client_data_hash()),
            Err(WebAuthnError::AttestationVerificationNotSupported),
            "{} should be rejected",
            extra
        );
    }
}
