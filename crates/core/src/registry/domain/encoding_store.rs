use crate::registry::domain::registry_error::StoreError;
use crate::registry::domain::registry_state::RegistryState;

/// Domain interface for durable registry persistence.
///
/// The whole [`RegistryState`] is the unit of persistence: `save` replaces
/// the previous record atomically, so a failed save leaves the last good
/// record in place.
pub trait EncodingStore: Send {
    /// Returns the persisted state, or an empty state when nothing has been
    /// saved yet. A record that exists but cannot be decoded is an error.
    fn load(&self) -> Result<RegistryState, StoreError>;

    fn save(&mut self, state: &RegistryState) -> Result<(), StoreError>;
}
