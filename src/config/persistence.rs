//! File persistence configuration

pub struct PersistenceConfig {
    /// Path for saving/loading application UI state
    pub app_state_path: &'static str,
}

pub const PERSISTENCE: PersistenceConfig = PersistenceConfig {
    app_state_path: ".terminal_state.json",
};
