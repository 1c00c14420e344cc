use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the registry and for logging.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub registry: RegistrySettings,
    pub logging: LoggingSettings,
}

/// Behavior of a single registry.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Label attached to the registry's log lines.
    pub name: String,
    /// Replay the retained message to each new subscriber.
    pub replay_last: bool,
    /// Make `unsubscribe` report handles the registry does not hold.
    pub strict_unsubscribe: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub registry: Option<PartialRegistrySettings>,
    pub logging: Option<PartialLoggingSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialRegistrySettings {
    pub name: Option<String>,
    pub replay_last: Option<bool>,
    pub strict_unsubscribe: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLoggingSettings {
    pub level: Option<String>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            replay_last: false,
            strict_unsubscribe: false,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            registry: RegistrySettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl PartialSettings {
    /// Fills every missing value from `Settings::default()`.
    pub fn merge_with_defaults(self) -> Settings {
        let default = Settings::default();
        let registry = self.registry;
        let logging = self.logging;

        Settings {
            registry: RegistrySettings {
                name: registry
                    .as_ref()
                    .and_then(|r| r.name.clone())
                    .unwrap_or(default.registry.name),
                replay_last: registry
                    .as_ref()
                    .and_then(|r| r.replay_last)
                    .unwrap_or(default.registry.replay_last),
                strict_unsubscribe: registry
                    .as_ref()
                    .and_then(|r| r.strict_unsubscribe)
                    .unwrap_or(default.registry.strict_unsubscribe),
            },
            logging: LoggingSettings {
                level: logging
                    .as_ref()
                    .and_then(|l| l.level.clone())
                    .unwrap_or(default.logging.level),
            },
        }
    }
}
