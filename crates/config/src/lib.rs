//! Configuration loading, env substitution, and the merchbell config schema.
//!
//! Config files: `merchbell.toml`, `merchbell.yaml`, or `merchbell.json`
//! Searched in `./` then `~/.config/merchbell/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    error::{Error, Result},
    loader::{config_dir, discover_and_load, load_config},
    schema::{
        ChatConfig, CommerceConfig, DigestConfig, MerchbellConfig, SendWindow, ServerConfig,
        StoreConfig,
    },
};
