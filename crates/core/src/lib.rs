//! Persistent face-identity registry.
//!
//! Turns face descriptors from an external detector into stable identities
//! that survive restarts. See [`registry::domain::identity_registry`] for the
//! core and [`pipeline::recognize_faces_use_case`] for the per-frame flow.

pub mod detection {
    pub mod domain {
        pub mod face_encoder;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod frame_annotator;
    pub mod recognize_faces_use_case;
}

pub mod registry {
    pub mod domain {
        pub mod encoding_store;
        pub mod identity_registry;
        pub mod matcher;
        pub mod registry_config;
        pub mod registry_error;
        pub mod registry_state;
    }
    pub mod infrastructure;
}

pub mod shared {
    pub mod constants;
    pub mod encoding;
    pub mod frame;
    pub mod region;
}
