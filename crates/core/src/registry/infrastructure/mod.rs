pub mod json_file_store;
pub mod registry_worker;
pub mod shared_identity_registry;
