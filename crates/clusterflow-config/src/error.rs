use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Cluster descriptor not found. Looked in:\n\
        - current directory: cluster.local.yaml, cluster.yaml, cluster.json\n\
        - ./.clusterflow/ directory\n\
        - ~/.config/clusterflow/cluster.yaml\n\
        Set CLUSTERFLOW_DESCRIPTOR to point at a file directly"
    )]
    DescriptorNotFound,

    #[error("Unsupported descriptor format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
