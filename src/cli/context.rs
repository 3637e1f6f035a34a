//! Per-invocation state shared by the command handlers.

use mediaid_config::{ConfigManager, IntakeConfig};
use mediaid_core::{
    Clock, MemorySessionStore, SearchSettings, SessionStore, SystemClock,
    DEFAULT_QUIET_PERIOD_MS,
};
use tracing::debug;

use crate::cli::output::{self, OutputPreferences};
use crate::errors::IntakeError;
use crate::http::HttpIntakeApi;
use crate::session_store::FileSessionStore;

pub struct AppContext {
    manager: ConfigManager,
    config: IntakeConfig,
    clock: SystemClock,
}

impl AppContext {
    /// Resolves the base directory from the environment and loads the config.
    pub fn load() -> Result<Self, IntakeError> {
        Self::with_manager(ConfigManager::from_env()?)
    }

    pub fn with_manager(manager: ConfigManager) -> Result<Self, IntakeError> {
        let config = manager.load()?.with_env_overrides();
        debug!(
            config = %manager.config_path().display(),
            api = config.base_url(),
            "configuration loaded"
        );
        apply_output_preferences(&config);
        Ok(Self {
            manager,
            config,
            clock: SystemClock,
        })
    }

    pub fn manager(&self) -> &ConfigManager {
        &self.manager
    }

    /// Effective configuration, environment overrides included.
    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Replaces the in-memory config after a command saved a new one.
    pub fn replace_config(&mut self, config: IntakeConfig) {
        self.config = config.with_env_overrides();
        apply_output_preferences(&self.config);
    }

    pub fn clock(&self) -> &dyn Clock {
        &self.clock
    }

    pub fn api(&self) -> Result<HttpIntakeApi, IntakeError> {
        Ok(HttpIntakeApi::from_config(&self.config)?)
    }

    /// File-backed unless the user opted out of remembering sessions.
    pub fn session_store(&self) -> Box<dyn SessionStore> {
        if self.config.remember_session {
            Box::new(FileSessionStore::new(self.manager.session_path()))
        } else {
            Box::new(MemorySessionStore::new())
        }
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            quiet_period_ms: i64::try_from(self.config.search_debounce_ms)
                .unwrap_or(DEFAULT_QUIET_PERIOD_MS),
            limit: self.config.search_limit.max(1),
        }
    }
}

fn apply_output_preferences(config: &IntakeConfig) {
    output::set_preferences(OutputPreferences {
        screen_reader_mode: config.accessibility.plain_output,
        high_contrast_mode: config.accessibility.high_contrast,
        color_enabled: config.use_color(),
    });
}
