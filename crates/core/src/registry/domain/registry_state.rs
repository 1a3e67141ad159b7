use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shared::constants::FIRST_IDENTITY_ID;
use crate::shared::encoding::Encoding;

pub type IdentityId = u64;

/// Borrowed view of one registered identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Identity<'a> {
    pub id: IdentityId,
    pub encoding: &'a Encoding,
    pub display_name: &'a str,
}

/// Everything the registry persists: the id counter plus the encoding and
/// name tables.
///
/// Both tables are keyed by id and always hold the same key set. `BTreeMap`
/// gives ascending-id iteration, which is also minting order, so matching
/// and serialization are deterministic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistryState {
    next_id: IdentityId,
    encodings: BTreeMap<IdentityId, Encoding>,
    names: BTreeMap<IdentityId, String>,
}

impl RegistryState {
    pub fn new() -> Self {
        Self {
            next_id: FIRST_IDENTITY_ID,
            encodings: BTreeMap::new(),
            names: BTreeMap::new(),
        }
    }

    pub fn next_id(&self) -> IdentityId {
        self.next_id
    }

    pub fn encodings(&self) -> &BTreeMap<IdentityId, Encoding> {
        &self.encodings
    }

    pub fn names(&self) -> &BTreeMap<IdentityId, String> {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.encodings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encodings.is_empty()
    }

    /// Descriptor length established by the stored encodings, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.encodings.values().next().map(Encoding::len)
    }

    pub fn identity(&self, id: IdentityId) -> Option<Identity<'_>> {
        let encoding = self.encodings.get(&id)?;
        let display_name = self.names.get(&id)?;
        Some(Identity {
            id,
            encoding,
            display_name,
        })
    }

    pub fn identities(&self) -> impl Iterator<Item = Identity<'_>> {
        self.encodings
            .iter()
            .zip(self.names.values())
            .map(|((&id, encoding), display_name)| Identity {
                id,
                encoding,
                display_name,
            })
    }

    /// Registers `encoding` under the next id with its default name.
    ///
    /// Returns `None`, leaving the state untouched, once the id space is used up.
    pub(crate) fn mint(&mut self, encoding: Encoding) -> Option<IdentityId> {
        let id = self.next_id;
        self.next_id = id.checked_add(1)?;
        self.encodings.insert(id, encoding);
        self.names.insert(id, default_display_name(id));
        Some(id)
    }

    /// Returns `false` when `id` is not registered.
    pub(crate) fn set_name(&mut self, id: IdentityId, name: String) -> bool {
        match self.names.get_mut(&id) {
            Some(slot) => {
                *slot = name;
                true
            }
            None => false,
        }
    }

    /// Checks the structural invariants a decoded record must satisfy.
    pub fn validate(&self) -> Result<(), String> {
        if self.next_id < FIRST_IDENTITY_ID {
            return Err(format!(
                "next_id must be at least {FIRST_IDENTITY_ID}, got {}",
                self.next_id
            ));
        }
        if !self.encodings.keys().eq(self.names.keys()) {
            return Err("encodings and names have different id sets".to_string());
        }
        if let Some(&max_id) = self.encodings.keys().next_back() {
            if self.next_id <= max_id {
                return Err(format!(
                    "next_id {} is not greater than highest id {max_id}",
                    self.next_id
                ));
            }
        }
        if self.encodings.contains_key(&0) {
            return Err("id 0 is not a valid identity id".to_string());
        }
        let mut dimension = None;
        for (id, encoding) in &self.encodings {
            if encoding.is_empty() {
                return Err(format!("encoding for id {id} is empty"));
            }
            if !encoding.is_finite() {
                return Err(format!("encoding for id {id} has non-finite values"));
            }
            match dimension {
                None => dimension = Some(encoding.len()),
                Some(d) if d != encoding.len() => {
                    return Err(format!(
                        "encoding for id {id} has {} dimensions, expected {d}",
                        encoding.len()
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

impl Default for RegistryState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn default_display_name(id: IdentityId) -> String {
    format!("Person {id}")
}
