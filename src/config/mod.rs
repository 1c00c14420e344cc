//! Configuration loading.
//!
//! Values come from an optional `config/default` file (any format the
//! `config` crate understands) layered under `FANOUT_`-prefixed environment
//! variables, e.g. `FANOUT_REGISTRY__REPLAY_LAST=true`.

mod settings;

use config::{Config, ConfigError, Environment, File};

pub use settings::{
    LoggingSettings, PartialLoggingSettings, PartialRegistrySettings, PartialSettings,
    RegistrySettings, Settings,
};

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from("config/default")
}

/// Same as [`load_config`] with an explicit file stem.
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix("FANOUT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge_with_defaults())
}
