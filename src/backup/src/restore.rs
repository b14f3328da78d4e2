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

//! The full-restore state machine.
//!
//! check → fetch and decode the manifest → topology guard → stop the cluster
//! → wipe the data roots → download meta SSTs and storage checkpoints
//! concurrently → start metad → submit the remapped manifest to every meta
//! node → start storaged.
//!
//! Host remapping is 1:1 and positional: the manifest's storage hosts are
//! sorted lexicographically by `host:port` and assigned to the configured
//! storage nodes in order, which keeps reruns reproducible.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;

use futures::future::try_join_all;
use nebula_br_common::config::{NodeInfo, RestoreConfig};
use nebula_br_common::error::{BrError, Result};
use nebula_br_meta_client::{manifest, util};
use nebula_br_pb::meta::{BackupMeta, HostPair};
use nebula_br_storage::{ExternalStorage, StorageCommand};

use crate::{run_local_command, TMP_DIR};

/// Grace period after starting metad, letting the replica group form a
/// quorum before `RestoreMeta` is submitted.
const META_QUORUM_DELAY: Duration = Duration::from_secs(3);

pub struct Restore {
    config: RestoreConfig,
    backend: ExternalStorage,
    meta_file_name: String,
}

impl Restore {
    pub fn new(config: RestoreConfig) -> Result<Self> {
        let mut backend = ExternalStorage::new(
            &config.backend_url,
            config.max_concurrent,
            &config.command_args,
        )?;
        backend.set_backup_name(&config.backup_name);
        let meta_file_name = format!("{}.meta", config.backup_name);
        Ok(Self {
            config,
            backend,
            meta_file_name,
        })
    }

    pub async fn restore_cluster(&mut self) -> Result<()> {
        tracing::info!(backup_name = %self.config.backup_name, "start restore cluster");
        self.check().await?;
        self.download_meta_file().await?;
        let meta = self.load_meta_file().await?;

        let hosts = manifest_storage_hosts(&meta)?;
        check_physical_topology(&hosts, &self.config.storage_nodes)?;

        self.stop_cluster().await?;
        self.cleanup_original().await?;

        let sst_files = self.download_all(&meta, &hosts).await?;

        self.start_meta_service().await?;
        tokio::time::sleep(META_QUORUM_DELAY).await;

        self.restore_meta(&hosts, sst_files).await?;
        self.start_storage_service().await?;

        tracing::info!(backup_name = %self.config.backup_name, "restore cluster finished");
        Ok(())
    }

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

    async fn download_meta_file(&self) -> Result<()> {
        let argv = self
            .backend
            .restore_meta_file_command(&self.meta_file_name, TMP_DIR);
        run_local_command(&argv).await
    }

    async fn load_meta_file(&self) -> Result<BackupMeta> {
        manifest::read_backup_meta(&Path::new(TMP_DIR).join(&self.meta_file_name)).await
    }

    async fn stop_cluster(&self) -> Result<()> {
        self.service_command("stop").await
    }

    async fn start_meta_service(&self) -> Result<()> {
        self.exec_on_nodes(&self.config.meta_nodes, |node| {
            format!(
                "cd {} && scripts/nebula.service start metad &>/dev/null &",
                node.root_dir
            )
        })
        .await
    }

    async fn start_storage_service(&self) -> Result<()> {
        self.exec_on_nodes(&self.config.storage_nodes, |node| {
            format!(
                "cd {} && scripts/nebula.service start storaged &>/dev/null &",
                node.root_dir
            )
        })
        .await
    }

    async fn service_command(&self, action: &str) -> Result<()> {
        let mut tasks = Vec::new();
        for node in &self.config.storage_nodes {
            tasks.push(nebula_br_remote::exec_command(
                node.host()?.to_owned(),
                node.user.clone(),
                format!(
                    "cd {} && scripts/nebula.service {action} storaged",
                    node.root_dir
                ),
            ));
        }
        for node in &self.config.meta_nodes {
            tasks.push(nebula_br_remote::exec_command(
                node.host()?.to_owned(),
                node.user.clone(),
                format!(
                    "cd {} && scripts/nebula.service {action} metad",
                    node.root_dir
                ),
            ));
        }
        try_join_all(tasks).await?;
        Ok(())
    }

    async fn exec_on_nodes(
        &self,
        nodes: &[NodeInfo],
        cmd: impl Fn(&NodeInfo) -> String,
    ) -> Result<()> {
        let mut tasks = Vec::with_capacity(nodes.len());
        for node in nodes {
            tasks.push(nebula_br_remote::exec_command(
                node.host()?.to_owned(),
                node.user.clone(),
                cmd(node),
            ));
        }
        try_join_all(tasks).await?;
        Ok(())
    }

    /// Wipes and recreates every node's data root before downloading.
    async fn cleanup_original(&self) -> Result<()> {
        let mut tasks = Vec::new();
        for node in &self.config.storage_nodes {
            let cmd = self
                .backend
                .restore_storage_pre_command(&format!("{}/nebula", node.data_dir));
            tasks.push(nebula_br_remote::exec_command(
                node.host()?.to_owned(),
                node.user.clone(),
                cmd,
            ));
        }
        for node in &self.config.meta_nodes {
            let cmd = self
                .backend
                .restore_meta_pre_command(&format!("{}/nebula", node.data_dir));
            tasks.push(nebula_br_remote::exec_command(
                node.host()?.to_owned(),
                node.user.clone(),
                cmd,
            ));
        }
        try_join_all(tasks).await?;
        Ok(())
    }

    /// Downloads meta SSTs to every meta node and each source host's space
    /// dirs to its assigned storage node, all in one task group. Returns the
    /// downloaded SST paths keyed by meta address, for `RestoreMeta`.
    async fn download_all(
        &self,
        meta: &BackupMeta,
        hosts: &[String],
    ) -> Result<HashMap<String, Vec<Vec<u8>>>> {
        let meta_files: Vec<String> = meta
            .meta_files
            .iter()
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();

        let mut tasks = Vec::new();
        let mut sst_files = HashMap::new();
        for node in &self.config.meta_nodes {
            let (cmd, files) = self.backend.restore_meta_command(&meta_files, &node.data_dir);
            tasks.push(nebula_br_remote::exec_command(
                node.host()?.to_owned(),
                node.user.clone(),
                cmd,
            ));
            sst_files.insert(
                node.addrs.clone(),
                files.into_iter().map(String::into_bytes).collect(),
            );
        }

        let partitions = space_partitions(meta)?;
        for (host, node) in hosts.iter().zip(&self.config.storage_nodes) {
            let space_ids = partitions.get(host).cloned().unwrap_or_default();
            tracing::info!(source = %host, target = %node.addrs, spaces = space_ids.len(), "download storage");
            let cmd = self.backend.restore_storage_command(
                host,
                &space_ids,
                &format!("{}/nebula", node.data_dir),
            );
            tasks.push(nebula_br_remote::exec_command(
                node.host()?.to_owned(),
                node.user.clone(),
                cmd,
            ));
        }

        try_join_all(tasks).await?;
        Ok(sst_files)
    }

    /// Submits the remap pairs and each meta node's SSTs to every meta node.
    async fn restore_meta(
        &self,
        hosts: &[String],
        sst_files: HashMap<String, Vec<Vec<u8>>>,
    ) -> Result<()> {
        let host_pairs = build_host_pairs(hosts, &self.config.storage_nodes)?;
        let mut tasks = Vec::with_capacity(self.config.meta_nodes.len());
        for node in &self.config.meta_nodes {
            tracing::info!(addr = %node.addrs, "will restore meta");
            let files = sst_files.get(&node.addrs).cloned().unwrap_or_default();
            tasks.push(nebula_br_meta_client::restore_meta(
                &node.addrs,
                files,
                host_pairs.clone(),
            ));
        }
        try_join_all(tasks).await?;
        Ok(())
    }
}

/// Distinct storage hosts of the manifest, sorted lexicographically by
/// `host:port`.
fn manifest_storage_hosts(meta: &BackupMeta) -> Result<Vec<String>> {
    let mut hosts = BTreeSet::new();
    for (space_id, info) in &meta.backup_info {
        for cp in &info.cp_dirs {
            let host = cp.host.as_ref().ok_or_else(|| {
                anyhow::anyhow!("manifest checkpoint of space {space_id} carries no host")
            })?;
            hosts.insert(util::host_addr_to_string(host));
        }
    }
    Ok(hosts.into_iter().collect())
}

/// The restorer supports 1:1 host remapping, not re-sharding: the manifest
/// must name exactly as many storage hosts as the restore topology has.
fn check_physical_topology(hosts: &[String], storage_nodes: &[NodeInfo]) -> Result<()> {
    if hosts.len() != storage_nodes.len() {
        return Err(BrError::TopologyMismatch {
            manifest_hosts: hosts.len(),
            config_hosts: storage_nodes.len(),
        });
    }
    Ok(())
}

/// Space ids per manifest storage host, in ascending order.
fn space_partitions(meta: &BackupMeta) -> Result<BTreeMap<String, Vec<String>>> {
    let mut partitions: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
    for (space_id, info) in &meta.backup_info {
        for cp in &info.cp_dirs {
            let host = cp.host.as_ref().ok_or_else(|| {
                anyhow::anyhow!("manifest checkpoint of space {space_id} carries no host")
            })?;
            partitions
                .entry(util::host_addr_to_string(host))
                .or_default()
                .insert(*space_id);
        }
    }
    Ok(partitions
        .into_iter()
        .map(|(host, ids)| (host, ids.iter().map(|id| id.to_string()).collect()))
        .collect())
}

/// One remap pair per positional assignment whose source host differs from
/// its destination; identity mappings are omitted.
fn build_host_pairs(hosts: &[String], storage_nodes: &[NodeInfo]) -> Result<Vec<HostPair>> {
    let mut pairs = Vec::new();
    for (host, node) in hosts.iter().zip(storage_nodes) {
        if *host != node.addrs {
            pairs.push(HostPair {
                from_host: Some(util::parse_host_addr(host)?),
                to_host: Some(util::parse_host_addr(&node.addrs)?),
            });
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use nebula_br_pb::meta::{CheckpointInfo, HostAddr, SpaceBackupInfo};

    use super::*;

    fn node(addrs: &str) -> NodeInfo {
        NodeInfo {
            addrs: addrs.to_owned(),
            root_dir: "/home/nebula".to_owned(),
            data_dir: "/home/nebula/data".to_owned(),
            user: "nebula".to_owned(),
        }
    }

    fn checkpoint(host: &str, port: i32) -> CheckpointInfo {
        CheckpointInfo {
            host: Some(HostAddr {
                host: host.to_owned(),
                port,
            }),
            checkpoint_dir: b"data/checkpoints/1".to_vec(),
        }
    }

    fn manifest_with_hosts(hosts: &[(&str, i32)]) -> BackupMeta {
        let mut meta = BackupMeta::default();
        meta.backup_info.insert(
            9,
            SpaceBackupInfo {
                cp_dirs: hosts.iter().map(|(h, p)| checkpoint(h, *p)).collect(),
            },
        );
        meta
    }

    #[test]
    fn test_manifest_hosts_are_sorted_and_distinct() {
        let meta = manifest_with_hosts(&[
            ("192.168.8.130", 44500),
            ("192.168.8.129", 44500),
            ("192.168.8.130", 44500),
        ]);
        let hosts = manifest_storage_hosts(&meta).unwrap();
        assert_eq!(hosts, vec!["192.168.8.129:44500", "192.168.8.130:44500"]);
    }

    #[test]
    fn test_topology_guard() {
        let hosts = vec!["192.168.8.129:44500".to_owned()];
        check_physical_topology(&hosts, &[node("10.0.0.1:44500")]).unwrap();
        let err = check_physical_topology(
            &hosts,
            &[node("10.0.0.1:44500"), node("10.0.0.2:44500")],
        )
        .unwrap_err();
        assert_matches!(
            err,
            BrError::TopologyMismatch {
                manifest_hosts: 1,
                config_hosts: 2,
            }
        );
    }

    #[test]
    fn test_build_host_pairs_omits_identity() {
        let hosts = vec![
            "192.168.8.129:44500".to_owned(),
            "192.168.8.130:44500".to_owned(),
        ];
        let nodes = vec![node("192.168.8.129:44500"), node("10.0.0.2:44500")];
        let pairs = build_host_pairs(&hosts, &nodes).unwrap();
        assert_eq!(pairs.len(), 1);
        let pair = &pairs[0];
        assert_eq!(pair.from_host.as_ref().unwrap().host, "192.168.8.130");
        assert_eq!(pair.to_host.as_ref().unwrap().host, "10.0.0.2");
        assert_eq!(pair.to_host.as_ref().unwrap().port, 44500);
    }

    #[test]
    fn test_space_partitions_ordered() {
        let mut meta = manifest_with_hosts(&[("192.168.8.129", 44500)]);
        meta.backup_info.insert(
            2,
            SpaceBackupInfo {
                cp_dirs: vec![checkpoint("192.168.8.129", 44500)],
            },
        );
        let partitions = space_partitions(&meta).unwrap();
        assert_eq!(
            partitions["192.168.8.129:44500"],
            vec!["2".to_owned(), "9".to_owned()]
        );
    }
}
