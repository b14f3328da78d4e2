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

//! Shell-command builders for the external storage backends.
//!
//! A backend never performs I/O itself: it only renders command strings (or
//! argv vectors for the few commands that run locally) which the
//! orchestrators execute over SSH or as local processes. Config-supplied
//! fields (paths, hosts, extra args) are interpolated verbatim; the operator
//! fully trusts the topology file.

use std::path::Path;

use itertools::Itertools;
use nebula_br_common::error::{BrError, Result};
use url::Url;

pub mod hdfs;
pub mod local;
pub mod oss;
pub mod s3;

pub use hdfs::HdfsStore;
pub use local::LocalStore;
pub use oss::OssStore;
pub use s3::S3Store;

/// The command contract every backend satisfies.
pub trait StorageCommand {
    /// Appends the backup name as a trailing path segment of the URL. Not
    /// idempotent — call it at most once per instance.
    fn set_backup_name(&mut self, name: &str);

    fn uri(&self) -> &str;

    /// Reachability probe run on every cluster host.
    fn check_command(&self) -> String;

    /// Creates the destination prefix; run locally once. `None` when the
    /// backend does not need one.
    fn backup_pre_command(&self) -> Option<Vec<String>>;

    /// Run on the meta-leader host to push the listed SSTs into
    /// `<url>/meta/`.
    fn backup_meta_command(&self, src: &[String]) -> String;

    /// Run on a storage host to push `<src>/data` and `<src>/wal` into
    /// `<url>/storage/<host>/<space_id>/`.
    fn backup_storage_command(&self, src: &str, host: &str, space_id: &str) -> String;

    /// Run locally to push the serialized manifest.
    fn backup_meta_file_command(&self, src: &str) -> Vec<String>;

    /// Run locally to pull the manifest into `dst`.
    fn restore_meta_file_command(&self, file: &str, dst: &str) -> Vec<String>;

    /// Run on a meta host to pull the named SSTs into `dst`; returns the
    /// command and the final destination paths.
    fn restore_meta_command(&self, src: &[String], dst: &str) -> (String, Vec<String>);

    /// Run on a storage host to pull all space dirs of one source `host`
    /// into `dst`.
    fn restore_storage_command(&self, host: &str, space_ids: &[String], dst: &str) -> String;

    /// Wipes and recreates the meta data directory before restore.
    fn restore_meta_pre_command(&self, dst: &str) -> String;

    /// Wipes and recreates the storage data directory before restore.
    fn restore_storage_pre_command(&self, dst: &str) -> String;
}

/// The backend selected from the URL scheme of `backend_url`.
#[derive(Debug)]
pub enum ExternalStorage {
    Local(LocalStore),
    S3(S3Store),
    Oss(OssStore),
    Hdfs(HdfsStore),
}

/// Routes a method call to the concrete backend.
macro_rules! dispatch {
    ($impl:expr, $store:ident => $body:expr) => {
        match $impl {
            ExternalStorage::Local($store) => $body,
            ExternalStorage::S3($store) => $body,
            ExternalStorage::Oss($store) => $body,
            ExternalStorage::Hdfs($store) => $body,
        }
    };
}

impl ExternalStorage {
    /// Selects the backend by URL scheme: `local://`, `s3://`, `oss://` or
    /// `hdfs://`. Anything else is unsupported.
    pub fn new(url: &str, max_concurrent: usize, args: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|_| BrError::BackendUnsupported {
            url: url.to_owned(),
        })?;
        match parsed.scheme() {
            "local" => Ok(Self::Local(LocalStore::new(parsed.path()))),
            "s3" => Ok(Self::S3(S3Store::new(url, args))),
            "oss" => Ok(Self::Oss(OssStore::new(url, max_concurrent, args))),
            "hdfs" => Ok(Self::Hdfs(HdfsStore::new(url, args))),
            _ => Err(BrError::BackendUnsupported {
                url: url.to_owned(),
            }),
        }
    }
}

impl StorageCommand for ExternalStorage {
    fn set_backup_name(&mut self, name: &str) {
        dispatch!(self, store => store.set_backup_name(name))
    }

    fn uri(&self) -> &str {
        dispatch!(self, store => store.uri())
    }

    fn check_command(&self) -> String {
        dispatch!(self, store => store.check_command())
    }

    fn backup_pre_command(&self) -> Option<Vec<String>> {
        dispatch!(self, store => store.backup_pre_command())
    }

    fn backup_meta_command(&self, src: &[String]) -> String {
        dispatch!(self, store => store.backup_meta_command(src))
    }

    fn backup_storage_command(&self, src: &str, host: &str, space_id: &str) -> String {
        dispatch!(self, store => store.backup_storage_command(src, host, space_id))
    }

    fn backup_meta_file_command(&self, src: &str) -> Vec<String> {
        dispatch!(self, store => store.backup_meta_file_command(src))
    }

    fn restore_meta_file_command(&self, file: &str, dst: &str) -> Vec<String> {
        dispatch!(self, store => store.restore_meta_file_command(file, dst))
    }

    fn restore_meta_command(&self, src: &[String], dst: &str) -> (String, Vec<String>) {
        dispatch!(self, store => store.restore_meta_command(src, dst))
    }

    fn restore_storage_command(&self, host: &str, space_ids: &[String], dst: &str) -> String {
        dispatch!(self, store => store.restore_storage_command(host, space_ids, dst))
    }

    fn restore_meta_pre_command(&self, dst: &str) -> String {
        dispatch!(self, store => store.restore_meta_pre_command(dst))
    }

    fn restore_storage_pre_command(&self, dst: &str) -> String {
        dispatch!(self, store => store.restore_storage_pre_command(dst))
    }
}

/// Joins non-empty tokens with single spaces, so empty `args` do not leave
/// double-space artifacts in the rendered command.
pub(crate) fn join_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    tokens.into_iter().filter(|t| !t.is_empty()).join(" ")
}

/// Appends `name` as a new trailing path segment of `url`.
pub(crate) fn push_segment(url: &mut String, name: &str) {
    if !url.ends_with('/') {
        url.push('/');
    }
    url.push_str(name);
}

/// `rm -rf <dst> && mkdir -p <dst>` — shared by every backend's restore
/// pre-commands.
pub(crate) fn wipe_and_recreate(dst: &str) -> String {
    format!("rm -rf {dst} && mkdir -p {dst}")
}

/// The directory containing `file`. The meta SSTs all live under the meta
/// service's checkpoint directory, so syncing the parent of the first file
/// ships all of them.
pub(crate) fn parent_dir(file: &str) -> String {
    Path::new(file)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| ".".to_owned())
}
