pub mod create;
pub mod reset;
pub mod status;

use clap::Args;
use clusterflow_cloud::{ContinuationStore, ResourceDescriptor};
use colored::Colorize;
use std::path::PathBuf;

/// Cluster descriptor given on the command line
///
/// Flags override values read from a descriptor file. When no file is given
/// and the flags alone are incomplete, the file is discovered the usual way.
#[derive(Args, Debug, Default, Clone)]
pub struct DescriptorArgs {
    /// Descriptor file (YAML or JSON)
    #[arg(short, long, env = "CLUSTERFLOW_DESCRIPTOR")]
    pub file: Option<PathBuf>,
    /// GCP project
    #[arg(long, env = "CLUSTERFLOW_PROJECT")]
    pub project: Option<String>,
    /// GCP zone, e.g. us-central1-a
    #[arg(long, env = "CLUSTERFLOW_ZONE")]
    pub zone: Option<String>,
    /// Cluster name
    #[arg(short, long, env = "CLUSTERFLOW_NAME")]
    pub name: Option<String>,
    /// Initial node count
    #[arg(long, env = "CLUSTERFLOW_NODES")]
    pub nodes: Option<u32>,
    /// Secrets Manager secret holding the service account key
    #[arg(long, env = "CLUSTERFLOW_SECRET")]
    pub secret: Option<String>,
    /// Region of the secret
    #[arg(long, env = "CLUSTERFLOW_SECRET_REGION")]
    pub secret_region: Option<String>,
}

impl DescriptorArgs {
    /// Build the descriptor from flags, a file, or both
    pub fn resolve(self) -> anyhow::Result<ResourceDescriptor> {
        let base = match &self.file {
            Some(path) => Some(clusterflow_config::load_descriptor(path)?),
            None if self.is_complete() => None,
            None => {
                let path = clusterflow_config::find_descriptor_file()?;
                tracing::debug!(path = %path.display(), "Using discovered descriptor");
                Some(clusterflow_config::load_descriptor(&path)?)
            }
        };

        let descriptor = self.apply(base);
        descriptor.validate()?;
        Ok(descriptor)
    }

    fn is_complete(&self) -> bool {
        self.project.is_some()
            && self.zone.is_some()
            && self.name.is_some()
            && self.secret.is_some()
            && self.secret_region.is_some()
    }

    fn apply(self, base: Option<ResourceDescriptor>) -> ResourceDescriptor {
        let base = base.unwrap_or_else(|| ResourceDescriptor {
            project: String::new(),
            zone: String::new(),
            name: String::new(),
            initial_node_count: 1,
            secret: String::new(),
            secret_region: String::new(),
        });

        ResourceDescriptor {
            project: self.project.unwrap_or(base.project),
            zone: self.zone.unwrap_or(base.zone),
            name: self.name.unwrap_or(base.name),
            initial_node_count: self.nodes.unwrap_or(base.initial_node_count),
            secret: self.secret.unwrap_or(base.secret),
            secret_region: self.secret_region.unwrap_or(base.secret_region),
        }
    }
}

/// Open the continuation store, falling back to the config state directory
pub fn open_store(state_dir: Option<PathBuf>) -> anyhow::Result<ContinuationStore> {
    let state_dir = match state_dir {
        Some(dir) => dir,
        None => clusterflow_config::get_state_dir()?,
    };
    Ok(ContinuationStore::new(state_dir))
}

pub fn print_descriptor(descriptor: &ResourceDescriptor) {
    println!("{} {}", "Cluster:".bold(), descriptor.key().cyan());
    println!("  nodes:  {}", descriptor.initial_node_count);
    println!("  secret: {} ({})", descriptor.secret, descriptor.secret_region);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn full_flags() -> DescriptorArgs {
        DescriptorArgs {
            file: None,
            project: Some("p".to_string()),
            zone: Some("us-central1-a".to_string()),
            name: Some("c1".to_string()),
            nodes: Some(3),
            secret: Some("gke/deployer".to_string()),
            secret_region: Some("us-east-1".to_string()),
        }
    }

    #[test]
    fn test_flags_alone_build_descriptor() {
        let descriptor = full_flags().resolve().unwrap();
        assert_eq!(descriptor.key(), "p/us-central1-a/c1");
        assert_eq!(descriptor.initial_node_count, 3);
    }

    #[test]
    fn test_node_count_defaults_to_one() {
        let args = DescriptorArgs {
            nodes: None,
            ..full_flags()
        };
        assert_eq!(args.resolve().unwrap().initial_node_count, 1);
    }

    #[test]
    fn test_flags_override_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("cluster.yaml");
        fs::write(
            &path,
            "project: p\nzone: z\nname: from-file\ninitialNodeCount: 2\nsecret: s\nsecretRegion: r\n",
        )
        .unwrap();

        let args = DescriptorArgs {
            file: Some(path),
            name: Some("from-flag".to_string()),
            ..DescriptorArgs::default()
        };
        let descriptor = args.resolve().unwrap();

        assert_eq!(descriptor.name, "from-flag");
        assert_eq!(descriptor.project, "p");
        assert_eq!(descriptor.initial_node_count, 2);
    }

    #[test]
    fn test_invalid_flags_are_rejected() {
        let args = DescriptorArgs {
            nodes: Some(0),
            ..full_flags()
        };
        assert!(args.resolve().is_err());
    }
}
