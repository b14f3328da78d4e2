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

//! The full-backup state machine.
//!
//! check → index → `CreateBackup` at the leader → pre-create the backend
//! prefix → upload meta SSTs and storage checkpoints concurrently → persist
//! and upload the manifest → drop the server-side snapshot.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use nebula_br_common::config::{BackupConfig, NodeInfo};
use nebula_br_common::error::{BrError, Result};
use nebula_br_meta_client::{manifest, util};
use nebula_br_pb::meta::BackupMeta;
use nebula_br_storage::{ExternalStorage, StorageCommand};

use crate::{run_local_command, TMP_DIR};

/// One space checkpoint to ship from one storage host.
#[derive(Debug)]
struct SpaceInfo {
    space_id: i64,
    checkpoint_dir: String,
}

pub struct Backup {
    config: BackupConfig,
    meta_node_map: HashMap<String, NodeInfo>,
    storage_node_map: HashMap<String, NodeInfo>,
    meta_leader: NodeInfo,
    backend: ExternalStorage,
    meta_file_name: PathBuf,
}

impl Backup {
    pub fn new(config: BackupConfig) -> Result<Self> {
        let backend = ExternalStorage::new(
            &config.backend_url,
            config.max_concurrent,
            &config.command_args,
        )?;
        let meta_leader = config.meta_nodes.first().cloned().ok_or_else(|| {
            BrError::ConfigInvalid("at least one meta node is required".to_owned())
        })?;
        Ok(Self {
            config,
            meta_node_map: HashMap::new(),
            storage_node_map: HashMap::new(),
            meta_leader,
            backend,
            meta_file_name: PathBuf::new(),
        })
    }

    pub async fn backup_cluster(&mut self) -> Result<()> {
        tracing::info!("start backup cluster");
        self.check().await?;
        self.init();
        let meta = self.create_backup().await?;
        self.upload_all(meta).await
    }

    /// Backend reachability probe on every cluster host.
    async fn check(&self) -> Result<()> {
        let nodes: Vec<NodeInfo> = self
            .config
            .meta_nodes
            .iter()
            .chain(self.config.storage_nodes.iter())
            .cloned()
            .collect();
        nebula_br_remote::check_command(&self.backend.check_command(), &nodes).await
    }

    fn init(&mut self) {
        self.meta_node_map = node_map(&self.config.meta_nodes);
        self.storage_node_map = node_map(&self.config.storage_nodes);
    }

    /// Obtains the manifest from the meta-leader and records which node
    /// turned out to be the leader.
    async fn create_backup(&mut self) -> Result<BackupMeta> {
        let first_addr = self.meta_leader.addrs.clone();
        let (meta, leader_addr) =
            nebula_br_meta_client::create_backup(&first_addr, &self.config.space_names).await?;
        if leader_addr != self.meta_leader.addrs {
            self.meta_leader =
                self.meta_node_map
                    .get(&leader_addr)
                    .cloned()
                    .ok_or_else(|| {
                        BrError::ConfigInvalid(format!(
                            "meta leader `{leader_addr}` is not part of the configured topology"
                        ))
                    })?;
        }
        Ok(meta)
    }

    async fn exec_pre_command(&mut self, backup_name: &str) -> Result<()> {
        self.backend.set_backup_name(backup_name);
        if let Some(argv) = self.backend.backup_pre_command() {
            run_local_command(&argv).await?;
        }
        Ok(())
    }

    /// Meta SST paths with relative entries resolved against the leader's
    /// install root.
    fn meta_files(&self, meta: &BackupMeta) -> Vec<String> {
        meta.meta_files
            .iter()
            .map(|f| {
                let name = String::from_utf8_lossy(f).into_owned();
                resolve_dir(&name, &self.meta_leader.root_dir)
            })
            .collect()
    }

    /// Manifest checkpoints partitioned by producing storage host, relative
    /// checkpoint dirs resolved against that host's install root.
    fn partition_checkpoints(&self, meta: &BackupMeta) -> Result<BTreeMap<String, Vec<SpaceInfo>>> {
        let mut partitions: BTreeMap<String, Vec<SpaceInfo>> = BTreeMap::new();
        for (space_id, info) in &meta.backup_info {
            for cp in &info.cp_dirs {
                let host = cp.host.as_ref().ok_or_else(|| {
                    anyhow::anyhow!("manifest checkpoint of space {space_id} carries no host")
                })?;
                let host = util::host_addr_to_string(host);
                let dir = String::from_utf8_lossy(&cp.checkpoint_dir).into_owned();
                let dir = if Path::new(&dir).is_absolute() {
                    dir
                } else {
                    let node = self.storage_node_map.get(&host).ok_or_else(|| {
                        BrError::ConfigInvalid(format!(
                            "storage host `{host}` from the manifest is not part of the configured topology"
                        ))
                    })?;
                    resolve_dir(&dir, &node.root_dir)
                };
                partitions.entry(host).or_default().push(SpaceInfo {
                    space_id: *space_id,
                    checkpoint_dir: dir,
                });
            }
        }
        for infos in partitions.values_mut() {
            infos.sort_by_key(|info| info.space_id);
        }
        Ok(partitions)
    }

    async fn upload_all(&mut self, mut meta: BackupMeta) -> Result<()> {
        let backup_name = String::from_utf8_lossy(&meta.backup_name).into_owned();
        self.exec_pre_command(&backup_name).await?;

        let meta_files = self.meta_files(&meta);
        let partitions = self.partition_checkpoints(&meta)?;

        tracing::info!(
            sst_files = meta_files.len(),
            storage_hosts = partitions.len(),
            "start upload"
        );

        // One task ships the meta SSTs from the leader; one pooled batch per
        // storage host ships its checkpoints, at most `max_ssh_connections`
        // in flight per host.
        let mut tasks = Vec::with_capacity(partitions.len() + 1);
        tasks.push(nebula_br_remote::exec_batch(
            self.meta_leader.host()?.to_owned(),
            self.meta_leader.user.clone(),
            1,
            vec![self.backend.backup_meta_command(&meta_files)],
        ));
        for (host, infos) in &partitions {
            let node = self.storage_node_map.get(host).ok_or_else(|| {
                BrError::ConfigInvalid(format!(
                    "storage host `{host}` from the manifest is not part of the configured topology"
                ))
            })?;
            let cmds = infos
                .iter()
                .map(|info| {
                    self.backend.backup_storage_command(
                        &info.checkpoint_dir,
                        host,
                        &info.space_id.to_string(),
                    )
                })
                .collect();
            tasks.push(nebula_br_remote::exec_batch(
                node.host()?.to_owned(),
                node.user.clone(),
                self.config.max_ssh_connections,
                cmds,
            ));
        }
        try_join_all(tasks).await?;

        self.meta_file_name = Path::new(TMP_DIR).join(format!("{backup_name}.meta"));
        manifest::write_backup_meta(&mut meta, &self.meta_file_name).await?;
        tracing::info!(path = %self.meta_file_name.display(), "write meta data finished");

        let argv = self
            .backend
            .backup_meta_file_command(&self.meta_file_name.to_string_lossy());
        run_local_command(&argv).await?;

        // The manifest is externalized, so the in-cluster snapshot is now
        // redundant. A failed drop leaves garbage for `cleanup`, not a
        // broken backup.
        if let Err(e) =
            nebula_br_meta_client::drop_snapshot(&self.meta_leader.addrs, &meta.backup_name).await
        {
            tracing::warn!(error = %e, "drop server-side snapshot failed, run cleanup to remove it");
        }

        tracing::info!(%backup_name, "backup cluster finished");
        Ok(())
    }
}

fn node_map(nodes: &[NodeInfo]) -> HashMap<String, NodeInfo> {
    nodes
        .iter()
        .map(|node| (node.addrs.clone(), node.clone()))
        .collect()
}

fn resolve_dir(dir: &str, root: &str) -> String {
    if Path::new(dir).is_absolute() {
        dir.to_owned()
    } else {
        Path::new(root).join(dir).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use nebula_br_pb::meta::{CheckpointInfo, HostAddr, SpaceBackupInfo};

    use super::*;

    fn node(addrs: &str, root_dir: &str) -> NodeInfo {
        NodeInfo {
            addrs: addrs.to_owned(),
            root_dir: root_dir.to_owned(),
            data_dir: String::new(),
            user: "nebula".to_owned(),
        }
    }

    fn checkpoint(host: &str, port: i32, dir: &str) -> CheckpointInfo {
        CheckpointInfo {
            host: Some(HostAddr {
                host: host.to_owned(),
                port,
            }),
            checkpoint_dir: dir.as_bytes().to_vec(),
        }
    }

    fn backup_under_test() -> Backup {
        let config = BackupConfig {
            meta_nodes: vec![node("192.168.8.129:45500", "/home/nebula/meta")],
            storage_nodes: vec![
                node("192.168.8.129:44500", "/home/nebula/storage0"),
                node("192.168.8.130:44500", "/home/nebula/storage1"),
            ],
            space_names: vec![],
            backend_url: "local:///data/backup".to_owned(),
            max_ssh_connections: 2,
            max_concurrent: 5,
            command_args: String::new(),
        };
        let mut backup = Backup::new(config).unwrap();
        backup.init();
        backup
    }

    #[test]
    fn test_meta_files_resolved_against_leader_root() {
        let backup = backup_under_test();
        let meta = BackupMeta {
            meta_files: vec![b"data/meta/a.sst".to_vec(), b"/abs/b.sst".to_vec()],
            ..Default::default()
        };
        assert_eq!(
            backup.meta_files(&meta),
            vec![
                "/home/nebula/meta/data/meta/a.sst".to_owned(),
                "/abs/b.sst".to_owned(),
            ]
        );
    }

    #[test]
    fn test_partition_checkpoints_by_host() {
        let backup = backup_under_test();
        let mut meta = BackupMeta::default();
        meta.backup_info.insert(
            1,
            SpaceBackupInfo {
                cp_dirs: vec![
                    checkpoint("192.168.8.129", 44500, "data/checkpoints/1"),
                    checkpoint("192.168.8.130", 44500, "/abs/checkpoints/1"),
                ],
            },
        );
        meta.backup_info.insert(
            2,
            SpaceBackupInfo {
                cp_dirs: vec![checkpoint("192.168.8.129", 44500, "data/checkpoints/2")],
            },
        );

        let partitions = backup.partition_checkpoints(&meta).unwrap();
        assert_eq!(partitions.len(), 2);
        let first = &partitions["192.168.8.129:44500"];
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].space_id, 1);
        assert_eq!(
            first[0].checkpoint_dir,
            "/home/nebula/storage0/data/checkpoints/1"
        );
        assert_eq!(first[1].space_id, 2);
        let second = &partitions["192.168.8.130:44500"];
        assert_eq!(second[0].checkpoint_dir, "/abs/checkpoints/1");
    }

    #[test]
    fn test_partition_rejects_unknown_host() {
        let backup = backup_under_test();
        let mut meta = BackupMeta::default();
        meta.backup_info.insert(
            1,
            SpaceBackupInfo {
                cp_dirs: vec![checkpoint("10.0.0.1", 44500, "data/checkpoints/1")],
            },
        );
        assert_matches!(
            backup.partition_checkpoints(&meta),
            Err(BrError::ConfigInvalid(_))
        );
    }
}
