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

//! Relying party configuration.

use serde::Deserialize;

use crate::algorithm::CoseAlgorithmIdentifier;

/// Default ceremony timeout sent to the client, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// How to treat a signature counter of 0 from a credential whose stored
/// counter is already nonzero.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZeroCounterPolicy {
    /// Reject it as a potential replay (cloned authenticator).
    #[default]
    TreatAsReplay,
    /// Accept it as "counter unsupported" and keep the stored value.
    Ignore,
}

/// Relying party settings.
///
/// Deserializable so it can be loaded with the rest of an application's
/// configuration; every field but the three identifiers has a default.
#[derive(Deserialize, Debug, Clone)]
pub struct WebAuthnConfig {
    /// The relying party identifier (typically the domain).
    pub rp_id: String,

    /// The relying party origin (e.g., `https://example.com`).
    pub rp_origin: String,

    /// The human-readable relying party name.
    pub rp_name: String,

    /// Timeout for ceremonies in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Credential algorithms offered to clients and accepted at registration,
    /// in order of preference.
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<CoseAlgorithmIdentifier>,

    #[serde(default)]
    pub zero_counter_policy: ZeroCounterPolicy,
}

impl WebAuthnConfig {
    /// Creates a configuration with default policy.
    pub fn new(rp_id: &str, rp_origin: &str, rp_name: &str) -> Self {
        Self {
            rp_id: rp_id.to_string(),
            rp_origin: rp_origin.to_string(),
            rp_name: rp_name.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            algorithms: default_algorithms(),
            zero_counter_policy: ZeroCounterPolicy::default(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

// RS1 is left out; it has to be opted into explicitly.
fn default_algorithms() -> Vec<CoseAlgorithmIdentifier> {
    vec![
        CoseAlgorithmIdentifier::Es256,
        CoseAlgorithmIdentifier::Rs256,
        CoseAlgorithmIdentifier::Es384,
        CoseAlgorithmIdentifier::Es512,
        CoseAlgorithmIdentifier::Ps256,
        CoseAlgorithmIdentifier::Ps384,
        CoseAlgorithmIdentifier::Ps512,
        CoseAlgorithmIdentifier::Rs384,
        CoseAlgorithmIdentifier::Rs512,
    ]
}
