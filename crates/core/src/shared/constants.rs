/// Maximum descriptor distance for two faces to count as the same identity.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

/// Default location of the persisted registry, relative to the working directory.
pub const DEFAULT_STORAGE_FILE: &str = "known_faces.json";

/// First id handed out by an empty registry.
pub const FIRST_IDENTITY_ID: u64 = 1;

pub const CONFIG_DIR_NAME: &str = "FaceKeeper";
pub const CONFIG_FILE_NAME: &str = "config.json";
