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

//! Alibaba OSS backend driven through `ossutil`. Every transfer carries
//! `-j <max_concurrent>` to bound the tool's own parallelism.

use crate::{join_tokens, parent_dir, push_segment, wipe_and_recreate, StorageCommand};

#[derive(Debug)]
pub struct OssStore {
    url: String,
    args: String,
    max_concurrent: usize,
}

impl OssStore {
    pub fn new(url: &str, max_concurrent: usize, args: &str) -> Self {
        Self {
            url: url.to_owned(),
            args: args.to_owned(),
            max_concurrent,
        }
    }

    fn cp_command(&self, src: &str, dst: &str) -> String {
        let jobs = self.max_concurrent.to_string();
        join_tokens(["ossutil", self.args.as_str(), "cp", "-r", src, dst, "-j", jobs.as_str()])
    }

    fn cp_argv(&self, src: &str, dst: &str) -> Vec<String> {
        let mut argv = vec!["ossutil".to_owned()];
        argv.extend(self.args.split_whitespace().map(str::to_owned));
        argv.extend(["cp", "-r", src, dst, "-j"].map(str::to_owned));
        argv.push(self.max_concurrent.to_string());
        argv
    }
}

impl StorageCommand for OssStore {
    fn set_backup_name(&mut self, name: &str) {
        push_segment(&mut self.url, name);
    }

    fn uri(&self) -> &str {
        &self.url
    }

    fn check_command(&self) -> String {
        join_tokens(["ossutil", self.args.as_str(), "ls", self.url.as_str()])
    }

    fn backup_pre_command(&self) -> Option<Vec<String>> {
        None
    }

    fn backup_meta_command(&self, src: &[String]) -> String {
        let src_dir = src.first().map(|f| parent_dir(f)).unwrap_or_default();
        self.cp_command(&src_dir, &format!("{}/meta/", self.url))
    }

    fn backup_storage_command(&self, src: &str, host: &str, space_id: &str) -> String {
        self.cp_command(src, &format!("{}/storage/{host}/{space_id}/", self.url))
    }

    fn backup_meta_file_command(&self, src: &str) -> Vec<String> {
        self.cp_argv(src, &format!("{}/", self.url))
    }

    fn restore_meta_file_command(&self, file: &str, dst: &str) -> Vec<String> {
        self.cp_argv(&format!("{}/{file}", self.url), dst)
    }

    fn restore_meta_command(&self, src: &[String], dst: &str) -> (String, Vec<String>) {
        let cmd = self.cp_command(&format!("{}/meta/", self.url), dst);
        let dst_files = src.iter().map(|f| format!("{dst}/{f}")).collect();
        (cmd, dst_files)
    }

    fn restore_storage_command(&self, host: &str, _space_ids: &[String], dst: &str) -> String {
        self.cp_command(&format!("{}/storage/{host}/", self.url), dst)
    }

    fn restore_meta_pre_command(&self, dst: &str) -> String {
        wipe_and_recreate(dst)
    }

    fn restore_storage_pre_command(&self, dst: &str) -> String {
        wipe_and_recreate(dst)
    }
}
