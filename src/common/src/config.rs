// Copyright 2026 the nebula-br Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;

use serde::Deserialize;

use crate::error::{BrError, Result};

/// Fallback parallelism for backend transfers on restore.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// One cluster member as declared in the topology file.
///
/// `addrs` is the `host:port` the service listens on; SSH always goes to port
/// 22 of the host part. `data_dir` is only consulted on restore.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NodeInfo {
    pub addrs: String,
    pub root_dir: String,
    #[serde(default)]
    pub data_dir: String,
    pub user: String,
}

impl NodeInfo {
    /// The host part of `addrs`, for dialing SSH.
    pub fn host(&self) -> Result<&str> {
        Ok(split_addr(&self.addrs)?.0)
    }
}

/// Splits `host:port` into its two parts.
pub fn split_addr(addrs: &str) -> Result<(&str, &str)> {
    let mut parts = addrs.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(host), Some(port), None) => Ok((host, port)),
        _ => Err(BrError::AddressMalformed {
            addr: addrs.to_owned(),
        }),
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BackupConfig {
    pub meta_nodes: Vec<NodeInfo>,
    pub storage_nodes: Vec<NodeInfo>,
    /// Empty means all graph spaces.
    #[serde(default)]
    pub space_names: Vec<String>,
    pub backend_url: String,
    pub max_ssh_connections: usize,
    pub max_concurrent: usize,
    /// Opaque pass-through for the backend CLI.
    #[serde(default)]
    pub command_args: String,
}

impl BackupConfig {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| BrError::ConfigInvalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.meta_nodes.is_empty() {
            return Err(BrError::ConfigInvalid(
                "at least one meta node is required".to_owned(),
            ));
        }
        for node in self.meta_nodes.iter().chain(self.storage_nodes.iter()) {
            split_addr(&node.addrs)?;
            check_absolute(&node.root_dir, "root_dir")?;
        }
        if self.max_ssh_connections == 0 {
            return Err(BrError::ConfigInvalid(
                "max_ssh_connections must be greater than zero".to_owned(),
            ));
        }
        if self.max_concurrent == 0 {
            return Err(BrError::ConfigInvalid(
                "max_concurrent must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RestoreConfig {
    pub meta_nodes: Vec<NodeInfo>,
    pub storage_nodes: Vec<NodeInfo>,
    pub backend_url: String,
    pub backup_name: String,
    #[serde(default)]
    pub max_concurrent: usize,
    #[serde(default)]
    pub command_args: String,
}

impl RestoreConfig {
    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| BrError::ConfigInvalid(e.to_string()))
    }

    /// Validates the topology and applies the `max_concurrent` default.
    pub fn validate(&mut self) -> Result<()> {
        if self.meta_nodes.is_empty() {
            return Err(BrError::ConfigInvalid(
                "at least one meta node is required".to_owned(),
            ));
        }
        for node in self.meta_nodes.iter().chain(self.storage_nodes.iter()) {
            split_addr(&node.addrs)?;
            check_absolute(&node.root_dir, "root_dir")?;
            check_absolute(&node.data_dir, "data_dir")?;
        }
        if self.backup_name.is_empty() {
            return Err(BrError::ConfigInvalid(
                "the backup_name configuration must be set".to_owned(),
            ));
        }
        if self.max_concurrent == 0 {
            self.max_concurrent = DEFAULT_MAX_CONCURRENT;
        }
        Ok(())
    }
}

/// Cleanup takes its arguments from the command line rather than a topology
/// file. Only the first meta seed is dialed; the rest are recorded for the
/// operator's reference.
#[derive(Clone, Debug, Default)]
pub struct CleanupConfig {
    pub backup_name: String,
    pub meta_server: Vec<String>,
}

impl CleanupConfig {
    pub fn validate(&self) -> Result<()> {
        if self.backup_name.is_empty() {
            return Err(BrError::ConfigInvalid(
                "the backup_name configuration must be set".to_owned(),
            ));
        }
        if self.meta_server.is_empty() {
            return Err(BrError::ConfigInvalid(
                "at least one meta server address is required".to_owned(),
            ));
        }
        for addr in &self.meta_server {
            split_addr(addr)?;
        }
        Ok(())
    }
}

fn check_absolute(dir: &str, field: &str) -> Result<()> {
    if !Path::new(dir).is_absolute() {
        return Err(BrError::ConfigInvalid(format!(
            "{field} `{dir}` must be an absolute path"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const BACKUP_YAML: &str = r#"
meta_nodes:
  - addrs: "192.168.8.129:45500"
    root_dir: "/home/nebula/meta"
    user: "nebula"
storage_nodes:
  - addrs: "192.168.8.129:44500"
    root_dir: "/home/nebula/storage"
    user: "nebula"
backend_url: "s3://nebulabackup"
max_ssh_connections: 2
max_concurrent: 5
"#;

    #[test]
    fn test_backup_config_from_yaml() {
        let config = BackupConfig::from_yaml(BACKUP_YAML).unwrap();
        config.validate().unwrap();
        assert_eq!(config.meta_nodes.len(), 1);
        assert_eq!(config.meta_nodes[0].addrs, "192.168.8.129:45500");
        assert_eq!(config.storage_nodes[0].user, "nebula");
        assert!(config.space_names.is_empty());
        assert_eq!(config.max_ssh_connections, 2);
    }

    #[test]
    fn test_split_addr() {
        assert_eq!(split_addr("127.0.0.1:9559").unwrap(), ("127.0.0.1", "9559"));
        assert_matches!(
            split_addr("111"),
            Err(BrError::AddressMalformed { addr }) if addr == "111"
        );
        assert_matches!(split_addr("a:b:c"), Err(BrError::AddressMalformed { .. }));
    }

    #[test]
    fn test_backup_config_rejects_relative_root() {
        let mut config = BackupConfig::from_yaml(BACKUP_YAML).unwrap();
        config.storage_nodes[0].root_dir = "nebula/storage".to_owned();
        assert_matches!(config.validate(), Err(BrError::ConfigInvalid(_)));
    }

    #[test]
    fn test_backup_config_rejects_zero_parallelism() {
        let mut config = BackupConfig::from_yaml(BACKUP_YAML).unwrap();
        config.max_ssh_connections = 0;
        assert_matches!(config.validate(), Err(BrError::ConfigInvalid(_)));
    }

    #[test]
    fn test_restore_config_defaults_max_concurrent() {
        let mut config = RestoreConfig {
            meta_nodes: vec![NodeInfo {
                addrs: "127.0.0.1:9559".to_owned(),
                root_dir: "/home/nebula/meta".to_owned(),
                data_dir: "/home/nebula/meta/data".to_owned(),
                user: "nebula".to_owned(),
            }],
            storage_nodes: vec![],
            backend_url: "local:///data/backup".to_owned(),
            backup_name: "BACKUP_2026_08_01".to_owned(),
            max_concurrent: 0,
            command_args: String::new(),
        };
        config.validate().unwrap();
        assert_eq!(config.max_concurrent, 5);
    }

    #[test]
    fn test_restore_config_requires_backup_name() {
        let mut config = RestoreConfig {
            meta_nodes: vec![NodeInfo {
                addrs: "127.0.0.1:9559".to_owned(),
                root_dir: "/home/nebula/meta".to_owned(),
                data_dir: "/home/nebula/meta/data".to_owned(),
                user: "nebula".to_owned(),
            }],
            backend_url: "local:///data/backup".to_owned(),
            ..Default::default()
        };
        assert_matches!(config.validate(), Err(BrError::ConfigInvalid(_)));
    }

    #[test]
    fn test_cleanup_config_checks_meta_addr() {
        let config = CleanupConfig {
            backup_name: "BACKUP_2026_08_01".to_owned(),
            meta_server: vec!["192.168.8.129".to_owned()],
        };
        assert_matches!(config.validate(), Err(BrError::AddressMalformed { .. }));
    }
}
