use std::sync::{Arc, Mutex, MutexGuard};

use crate::registry::domain::identity_registry::{IdentityRegistry, Resolution};
use crate::registry::domain::registry_error::RegistryError;
use crate::registry::domain::registry_state::IdentityId;
use crate::shared::encoding::Encoding;

/// Cloneable handle that serializes all access to one registry.
///
/// The lock covers the whole match → mint → persist sequence, so two threads
/// resolving similar unseen faces cannot both mint an identity.
#[derive(Clone)]
pub struct SharedIdentityRegistry {
    inner: Arc<Mutex<IdentityRegistry>>,
}

impl SharedIdentityRegistry {
    pub fn new(registry: IdentityRegistry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }

    pub fn resolve(&self, candidate: &Encoding) -> Result<Resolution, RegistryError> {
        self.lock().resolve(candidate)
    }

    pub fn rename(&self, id: IdentityId, name: &str) -> Result<(), RegistryError> {
        self.lock().rename(id, name)
    }

    /// Runs `f` with the registry locked, e.g. to list identities.
    pub fn with<R>(&self, f: impl FnOnce(&IdentityRegistry) -> R) -> R {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, IdentityRegistry> {
        // State is only swapped in after a successful save, so a panic while
        // the lock was held cannot have left it half-updated.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
