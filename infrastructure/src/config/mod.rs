//! Configuration file loading

mod file_config;
mod loader;

pub use file_config::{
    FileConfig, FileOrchestratorConfig, FileResolverConfig, FileSpecializationConfig,
};
pub use loader::ConfigLoader;
