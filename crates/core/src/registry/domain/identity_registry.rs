use crate::registry::domain::encoding_store::EncodingStore;
use crate::registry::domain::matcher::Matcher;
use crate::registry::domain::registry_config::RegistryConfig;
use crate::registry::domain::registry_error::RegistryError;
use crate::registry::domain::registry_state::{Identity, IdentityId, RegistryState};
use crate::shared::encoding::Encoding;

/// Outcome of resolving one face descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub id: IdentityId,
    pub display_name: String,
    /// `true` when this call registered the identity.
    pub is_new: bool,
}

/// Assigns stable identities to face descriptors and keeps them persisted.
///
/// The registry is the only writer of its store. Every mutation is staged on
/// a copy of the state and swapped in only after the store accepted it, so a
/// failed save leaves both the record on disk and the in-memory state as they
/// were. Callers sharing a registry across threads must serialize access; see
/// [`SharedIdentityRegistry`](crate::registry::infrastructure::shared_identity_registry::SharedIdentityRegistry).
pub struct IdentityRegistry {
    store: Box<dyn EncodingStore>,
    state: RegistryState,
    matcher: Matcher,
    configured_dimension: Option<usize>,
}

impl IdentityRegistry {
    /// Loads the persisted state from `store`.
    pub fn open(
        store: Box<dyn EncodingStore>,
        config: &RegistryConfig,
    ) -> Result<Self, RegistryError> {
        config.validate().map_err(RegistryError::Config)?;
        let state = store.load().map_err(RegistryError::Load)?;
        if let (Some(stored), Some(configured)) = (state.dimension(), config.dimension) {
            if stored != configured {
                return Err(RegistryError::DimensionMismatch { stored, configured });
            }
        }
        log::info!(
            "Loaded {} known identities (next id {})",
            state.len(),
            state.next_id()
        );
        Ok(Self {
            store,
            state,
            matcher: config.matcher(),
            configured_dimension: config.dimension,
        })
    }

    /// Returns the identity `candidate` belongs to, registering a new one
    /// when nothing known is within the match threshold.
    ///
    /// A match is a pure read. A new identity is returned only after it has
    /// been durably saved; on [`RegistryError::Persistence`] no id is consumed.
    pub fn resolve(&mut self, candidate: &Encoding) -> Result<Resolution, RegistryError> {
        self.check_encoding(candidate)?;

        if let Some(id) = self.matcher.find_match(candidate, self.state.encodings()) {
            let display_name = self.display_name(id)?;
            log::debug!("Matched face to identity {id}");
            return Ok(Resolution {
                id,
                display_name,
                is_new: false,
            });
        }

        let mut staged = self.state.clone();
        let id = staged
            .mint(candidate.clone())
            .ok_or(RegistryError::IdsExhausted)?;
        self.commit(staged)?;
        log::info!("Registered new identity {id}");

        Ok(Resolution {
            id,
            display_name: self.display_name(id)?,
            is_new: true,
        })
    }

    /// Changes the display name of an existing identity and persists it.
    pub fn rename(&mut self, id: IdentityId, name: &str) -> Result<(), RegistryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RegistryError::BlankName);
        }
        let mut staged = self.state.clone();
        if !staged.set_name(id, name.to_string()) {
            return Err(RegistryError::UnknownIdentity(id));
        }
        self.commit(staged)?;
        log::info!("Renamed identity {id} to '{name}'");
        Ok(())
    }

    pub fn identity(&self, id: IdentityId) -> Option<Identity<'_>> {
        self.state.identity(id)
    }

    pub fn identities(&self) -> impl Iterator<Item = Identity<'_>> {
        self.state.identities()
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn next_id(&self) -> IdentityId {
        self.state.next_id()
    }

    /// Descriptor length new encodings must have, if one is established.
    pub fn dimension(&self) -> Option<usize> {
        self.state.dimension().or(self.configured_dimension)
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn state(&self) -> &RegistryState {
        &self.state
    }

    fn check_encoding(&self, candidate: &Encoding) -> Result<(), RegistryError> {
        if candidate.is_empty() {
            return Err(RegistryError::EmptyEncoding);
        }
        if !candidate.is_finite() {
            return Err(RegistryError::NonFiniteEncoding);
        }
        if let Some(expected) = self.dimension() {
            if candidate.len() != expected {
                return Err(RegistryError::InvalidEncoding {
                    expected,
                    actual: candidate.len(),
                });
            }
        }
        Ok(())
    }

    fn commit(&mut self, staged: RegistryState) -> Result<(), RegistryError> {
        self.store
            .save(&staged)
            .map_err(RegistryError::Persistence)?;
        self.state = staged;
        Ok(())
    }

    fn display_name(&self, id: IdentityId) -> Result<String, RegistryError> {
        self.state
            .names()
            .get(&id)
            .cloned()
            .ok_or(RegistryError::UnknownIdentity(id))
    }
}
