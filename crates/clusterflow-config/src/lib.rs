pub mod error;

pub use error::*;

use clusterflow_cloud::ResourceDescriptor;
use std::path::{Path, PathBuf};

const DESCRIPTOR_CANDIDATES: [&str; 3] = ["cluster.local.yaml", "cluster.yaml", "cluster.json"];

/// ClusterFlow config directory, created on first use
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("clusterflow");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Default directory for persisted continuation state
pub fn get_state_dir() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("state"))
}

/// Locate the cluster descriptor file
///
/// Search order:
/// 1. `CLUSTERFLOW_DESCRIPTOR` environment variable (direct path)
/// 2. current directory: cluster.local.yaml, cluster.yaml, cluster.json
/// 3. `./.clusterflow/` with the same names
/// 4. `~/.config/clusterflow/cluster.yaml` (global default)
pub fn find_descriptor_file() -> Result<PathBuf> {
    if let Ok(descriptor_path) = std::env::var("CLUSTERFLOW_DESCRIPTOR") {
        let path = PathBuf::from(descriptor_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    for dir in [current_dir.clone(), current_dir.join(".clusterflow")] {
        if !dir.is_dir() {
            continue;
        }
        for filename in &DESCRIPTOR_CANDIDATES {
            let path = dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("clusterflow").join("cluster.yaml");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::DescriptorNotFound)
}

/// Parse a descriptor file, YAML or JSON by extension
pub fn load_descriptor(path: &Path) -> Result<ResourceDescriptor> {
    let content = std::fs::read_to_string(path)?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })
        }
        Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}
