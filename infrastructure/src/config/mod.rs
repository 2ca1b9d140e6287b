//! Configuration file loading for xylos
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment variables `XYLOS_<SECTION>__<KEY>`
//! 2. `--config <path>` specified file
//! 3. Project root: `./xylos.toml` or `./.xylos.toml`
//! 4. Global: `$XDG_CONFIG_HOME/xylos/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileBackendConfig, FileChatConfig, FileConfig, FileLoggingConfig, FileOutputConfig,
    FileSpeechConfig, expand_home,
};
pub use loader::{ConfigLoader, ENV_PREFIX};
