//! Configuration errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "No API key found. Pass --api-key, set model.api_key in the config file, or export {env_var}"
    )]
    MissingCredential { env_var: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
}
