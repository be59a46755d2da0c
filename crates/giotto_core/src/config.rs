//! Dispatch core configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a [`crate::DispatchCore`].
#[derive(
    Debug,
    Clone,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_")]
pub struct DispatchConfig {
    /// Application id used for all remote command API calls.
    #[builder(default)]
    #[serde(default)]
    application_id: u64,

    /// Whether commands sync with the remote list by default, and whether
    /// the destructive reconciliation sweep runs at ready time.
    #[serde(default = "default_global_sync")]
    #[builder(default = "default_global_sync()")]
    global_sync_command: bool,
}

fn default_global_sync() -> bool {
    false
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            application_id: 0,
            global_sync_command: default_global_sync(),
        }
    }
}

impl DispatchConfig {
    /// Create a configuration for the given application.
    pub fn new(application_id: u64) -> Self {
        Self {
            application_id,
            global_sync_command: default_global_sync(),
        }
    }
}
