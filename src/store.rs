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

//! The storage seam used by the `*_with_store` ceremony variants.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::CredentialRecord;

/// Atomic primitives a credential store must provide.
///
/// Each ceremony calls at most one of these, once. Implementations must make
/// each call atomic with respect to the credential it touches (a row lock, a
/// conditional `UPDATE ... WHERE counter = ?`, and so on).
pub trait CredentialStore {
    /// Stores `record` unless a credential with the same ID exists.
    ///
    /// Returns false on collision.
    fn insert_if_absent(&self, record: CredentialRecord) -> bool;

    /// Sets the counter of `credential_id` to `new` if it still equals
    /// `current`.
    ///
    /// Returns false if the credential is unknown or the counter moved.
    fn compare_and_swap_counter(&self, credential_id: &[u8], current: u32, new: u32) -> bool;
}

/// A process-local store, for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    by_id: Mutex<HashMap<Vec<u8>, CredentialRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<Vec<u8>, CredentialRecord>> {
        // Mutations are single inserts or assignments, so a poisoned map is still consistent.
        self.by_id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up by credential_id.
    pub fn get(&self, credential_id: &[u8]) -> Option<CredentialRecord> {
        self.records().get(credential_id).cloned()
    }

    /// All credentials owned by `user_handle`.
    pub fn get_by_user(&self, user_handle: &[u8]) -> Vec<CredentialRecord> {
        self.records()
            .values()
            .filter(|record| record.user_handle == user_handle)
            .cloned()
            .collect()
    }

    pub fn credential_count(&self) -> usize {
        self.records().len()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn insert_if_absent(&self, record: CredentialRecord) -> bool {
        let mut records = self.records();
        if records.contains_key(&record.credential_id) {
            return false;
        }
        records.insert(record.credential_id.clone(), record);
        true
    }

    fn compare_and_swap_counter(&self, credential_id: &[u8], current: u32, new: u32) -> bool {
        match self.records().get_mut(credential_id) {
            Some(record) if record.counter == current => {
                record.counter = new;
                true
            }
            _ => false,
        }
    }
}
