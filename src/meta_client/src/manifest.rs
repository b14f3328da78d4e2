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

//! Manifest (de)serialization.
//!
//! The on-disk artifact `<BackupName>.meta` is the plain wire encoding of
//! [`BackupMeta`] — the same IDL the RPC speaks, so the file interoperates
//! with the database server. Changing this encoding is a breaking change.

use std::path::Path;

use nebula_br_common::error::Result;
use nebula_br_pb::meta::BackupMeta;
use prost::Message;

/// Rewrites every meta file entry to its basename. Applied exactly once,
/// right before the manifest is persisted.
pub fn strip_meta_file_paths(meta: &mut BackupMeta) {
    for file in &mut meta.meta_files {
        *file = basename(file).to_vec();
    }
}

fn basename(path: &[u8]) -> &[u8] {
    path.rsplit(|b| *b == b'/').next().unwrap_or(path)
}

/// Serializes the manifest to `path`, stripping meta file paths to basenames
/// first.
pub async fn write_backup_meta(meta: &mut BackupMeta, path: &Path) -> Result<()> {
    strip_meta_file_paths(meta);
    tokio::fs::write(path, meta.encode_to_vec()).await?;
    Ok(())
}

pub async fn read_backup_meta(path: &Path) -> Result<BackupMeta> {
    let buf = tokio::fs::read(path).await?;
    Ok(BackupMeta::decode(buf.as_slice()).map_err(anyhow::Error::new)?)
}

#[cfg(test)]
mod tests {
    use nebula_br_pb::meta::{CheckpointInfo, HostAddr, SpaceBackupInfo};

    use super::*;

    fn sample_meta() -> BackupMeta {
        let mut meta = BackupMeta {
            backup_name: b"BACKUP_2026_08_01".to_vec(),
            meta_files: vec![b"a.sst".to_vec(), b"b.sst".to_vec()],
            ..Default::default()
        };
        meta.backup_info.insert(
            1,
            SpaceBackupInfo {
                cp_dirs: vec![CheckpointInfo {
                    host: Some(HostAddr {
                        host: "192.168.8.129".to_owned(),
                        port: 44500,
                    }),
                    checkpoint_dir: b"/home/nebula/storage/checkpoints/1".to_vec(),
                }],
            },
        );
        meta
    }

    #[test]
    fn test_strip_meta_file_paths() {
        let mut meta = sample_meta();
        meta.meta_files = vec![b"/data/meta/a.sst".to_vec(), b"b.sst".to_vec()];
        strip_meta_file_paths(&mut meta);
        assert_eq!(meta.meta_files, vec![b"a.sst".to_vec(), b"b.sst".to_vec()]);
    }

    #[tokio::test]
    async fn test_manifest_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BACKUP_2026_08_01.meta");
        let mut meta = sample_meta();
        write_backup_meta(&mut meta, &path).await.unwrap();
        let decoded = read_backup_meta(&path).await.unwrap();
        assert_eq!(decoded, meta);
    }
}
