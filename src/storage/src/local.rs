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

//! Local-filesystem backend: plain `cp`/`mkdir` on a directory that must be
//! reachable under the same path from every cluster host (e.g. NFS).

use itertools::Itertools;

use crate::{push_segment, wipe_and_recreate, StorageCommand};

#[derive(Debug)]
pub struct LocalStore {
    dir: String,
}

impl LocalStore {
    pub fn new(dir: &str) -> Self {
        Self {
            dir: dir.to_owned(),
        }
    }
}

impl StorageCommand for LocalStore {
    fn set_backup_name(&mut self, name: &str) {
        push_segment(&mut self.dir, name);
    }

    fn uri(&self) -> &str {
        &self.dir
    }

    fn check_command(&self) -> String {
        format!("ls {}", self.dir)
    }

    fn backup_pre_command(&self) -> Option<Vec<String>> {
        Some(vec!["mkdir".to_owned(), self.dir.clone()])
    }

    fn backup_meta_command(&self, src: &[String]) -> String {
        let meta_dir = format!("{}/meta", self.dir);
        format!(
            "mkdir -p {meta_dir} && cp -rf {} {meta_dir}",
            src.iter().join(" ")
        )
    }

    fn backup_storage_command(&self, src: &str, host: &str, space_id: &str) -> String {
        // The host segment keeps its colon on this backend.
        let storage_dir = format!("{}/storage/{host}/{space_id}", self.dir);
        format!("mkdir -p {storage_dir} && cp -rf {src}/data {src}/wal {storage_dir}")
    }

    fn backup_meta_file_command(&self, src: &str) -> Vec<String> {
        vec!["cp".to_owned(), src.to_owned(), self.dir.clone()]
    }

    fn restore_meta_file_command(&self, file: &str, dst: &str) -> Vec<String> {
        vec![
            "cp".to_owned(),
            format!("{}/{file}", self.dir),
            dst.to_owned(),
        ]
    }

    fn restore_meta_command(&self, src: &[String], dst: &str) -> (String, Vec<String>) {
        let meta_dir = format!("{}/meta", self.dir);
        let files = src.iter().map(|f| format!("{meta_dir}/{f}")).join(" ");
        let dst_files = src.iter().map(|f| format!("{dst}/{f}")).collect();
        (format!("cp -rf {files} {dst}"), dst_files)
    }

    fn restore_storage_command(&self, host: &str, space_ids: &[String], dst: &str) -> String {
        let dirs = space_ids
            .iter()
            .map(|id| format!("{}/storage/{host}/{id}", self.dir))
            .join(" ");
        format!("cp -rf {dirs} {dst}")
    }

    fn restore_meta_pre_command(&self, dst: &str) -> String {
        wipe_and_recreate(dst)
    }

    fn restore_storage_pre_command(&self, dst: &str) -> String {
        wipe_and_recreate(dst)
    }
}
