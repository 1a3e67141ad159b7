use std::ffi::OsString;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::registry::domain::encoding_store::EncodingStore;
use crate::registry::domain::registry_error::StoreError;
use crate::registry::domain::registry_state::RegistryState;

/// Stores the registry as a single pretty-printed JSON document.
///
/// Saves go to a `.part` sibling that is synced and then renamed over the
/// record, so readers only ever see a complete old or complete new record.
/// Floats are written in shortest round-trip form and parsed back exactly
/// (serde_json `float_roundtrip`), which keeps encodings bit-identical.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        match self.path.file_name() {
            Some(name) => {
                let mut temp_name = OsString::from(name);
                temp_name.push(".part");
                self.path.with_file_name(temp_name)
            }
            None => self.path.with_extension("part"),
        }
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn write_atomic(&self, bytes: &[u8], temp_path: &Path) -> Result<(), StoreError> {
        let parent = self.parent_dir();
        fs::create_dir_all(parent).map_err(write_err(parent))?;

        let mut file = fs::File::create(temp_path).map_err(write_err(temp_path))?;
        file.write_all(bytes).map_err(write_err(temp_path))?;
        file.flush().map_err(write_err(temp_path))?;
        file.sync_all().map_err(write_err(temp_path))?;
        drop(file);

        fs::rename(temp_path, &self.path).map_err(write_err(&self.path))?;
        // The new record is already in place, so a failed directory sync
        // cannot be rolled back; report it and keep the save.
        if let Err(e) = sync_dir(parent) {
            log::warn!("Failed to sync directory {}: {e}", parent.display());
        }
        Ok(())
    }
}

impl EncodingStore for JsonFileStore {
    fn load(&self) -> Result<RegistryState, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!(
                    "No registry at {}, starting empty",
                    self.path.display()
                );
                return Ok(RegistryState::new());
            }
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        decode_state(&bytes).map_err(|reason| StoreError::Corrupt {
            path: self.path.clone(),
            reason,
        })
    }

    fn save(&mut self, state: &RegistryState) -> Result<(), StoreError> {
        let bytes = encode_state(state).map_err(StoreError::Encode)?;
        let temp_path = self.temp_path();

        let result = self.write_atomic(&bytes, &temp_path);

        // Clean up .part file on any error
        if result.is_err() {
            let _ = fs::remove_file(&temp_path);
        }

        result
    }
}

/// Flushes directory entries so a completed rename survives power loss.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError {
    let path = path.to_path_buf();
    move |source| StoreError::Write { path, source }
}

/// Serialized form of a state. Identical states always produce identical bytes.
pub fn encode_state(state: &RegistryState) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec_pretty(state)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Parses and validates a serialized state.
pub fn decode_state(bytes: &[u8]) -> Result<RegistryState, String> {
    let state: RegistryState = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    state.validate()?;
    Ok(state)
}
