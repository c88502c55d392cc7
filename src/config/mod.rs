// src/config/mod.rs

//! Configuration loading and validation for docwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the resolved [`Params`] (`model.rs`).
//! - Load a config file from disk and layer CLI flags over it (`loader.rs`).
//! - Validate the resolved parameters (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_from_path, resolve_params};
pub use model::{ConfigFile, Params, DEFAULT_LISTEN_INTERVAL, MIN_LISTEN_INTERVAL};
pub use validate::validate_params;
