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

//! HDFS backend driven through `hadoop fs`.
//!
//! `-copyFromLocal` does not create intermediate directories, so every copy
//! is preceded by `hadoop fs -mkdir -p` on the destination. The host segment
//! of the layout is split into `<ip>/<port>` because a colon is not a valid
//! HDFS path character.

use crate::{join_tokens, push_segment, wipe_and_recreate, StorageCommand};

#[derive(Debug)]
pub struct HdfsStore {
    url: String,
    args: String,
}

impl HdfsStore {
    pub fn new(url: &str, args: &str) -> Self {
        Self {
            url: url.to_owned(),
            args: args.to_owned(),
        }
    }

    fn storage_dir(&self, host: &str) -> String {
        match host.split_once(':') {
            Some((ip, port)) => format!("{}/storage/{ip}/{port}", self.url),
            None => format!("{}/storage/{host}", self.url),
        }
    }

    fn copy_from_local<'a>(&'a self, files: impl IntoIterator<Item = &'a str>, dir: &'a str) -> String {
        join_tokens(
            ["hadoop", "fs", "-copyFromLocal"]
                .into_iter()
                .chain(self.args.split_whitespace())
                .chain(files)
                .chain([dir]),
        )
    }

    fn copy_to_local<'a>(&'a self, files: impl IntoIterator<Item = &'a str>, dst: &'a str) -> String {
        join_tokens(
            ["hadoop", "fs", "-copyToLocal", "-f"]
                .into_iter()
                .chain(self.args.split_whitespace())
                .chain(files)
                .chain([dst]),
        )
    }
}

impl StorageCommand for HdfsStore {
    fn set_backup_name(&mut self, name: &str) {
        push_segment(&mut self.url, name);
    }

    fn uri(&self) -> &str {
        &self.url
    }

    fn check_command(&self) -> String {
        join_tokens(["hadoop", "fs", "-ls", self.url.as_str()])
    }

    fn backup_pre_command(&self) -> Option<Vec<String>> {
        Some(vec![
            "hadoop".to_owned(),
            "fs".to_owned(),
            "-mkdir".to_owned(),
            self.url.clone(),
        ])
    }

    fn backup_meta_command(&self, src: &[String]) -> String {
        let meta_dir = format!("{}/meta", self.url);
        let copy = self.copy_from_local(src.iter().map(String::as_str), &meta_dir);
        format!("hadoop fs -mkdir -p {meta_dir} && {copy}")
    }

    fn backup_storage_command(&self, src: &str, host: &str, space_id: &str) -> String {
        let storage_dir = format!("{}/{space_id}", self.storage_dir(host));
        let data = format!("{src}/data");
        let wal = format!("{src}/wal");
        let copy = self.copy_from_local([data.as_str(), wal.as_str()], &storage_dir);
        format!("hadoop fs -mkdir -p {storage_dir} && {copy}")
    }

    fn backup_meta_file_command(&self, src: &str) -> Vec<String> {
        let mut argv = vec!["hadoop".to_owned(), "fs".to_owned(), "-copyFromLocal".to_owned()];
        argv.extend(self.args.split_whitespace().map(str::to_owned));
        argv.push(src.to_owned());
        argv.push(self.url.clone());
        argv
    }

    fn restore_meta_file_command(&self, file: &str, dst: &str) -> Vec<String> {
        let mut argv = vec![
            "hadoop".to_owned(),
            "fs".to_owned(),
            "-copyToLocal".to_owned(),
            "-f".to_owned(),
        ];
        argv.extend(self.args.split_whitespace().map(str::to_owned));
        argv.push(format!("{}/{file}", self.url));
        argv.push(dst.to_owned());
        argv
    }

    fn restore_meta_command(&self, src: &[String], dst: &str) -> (String, Vec<String>) {
        let files: Vec<String> = src
            .iter()
            .map(|f| format!("{}/meta/{f}", self.url))
            .collect();
        let cmd = self.copy_to_local(files.iter().map(String::as_str), dst);
        let dst_files = src.iter().map(|f| format!("{dst}/{f}")).collect();
        (cmd, dst_files)
    }

    fn restore_storage_command(&self, host: &str, space_ids: &[String], dst: &str) -> String {
        let storage_dir = self.storage_dir(host);
        let dirs: Vec<String> = space_ids
            .iter()
            .map(|id| format!("{storage_dir}/{id}"))
            .collect();
        self.copy_to_local(dirs.iter().map(String::as_str), dst)
    }

    fn restore_meta_pre_command(&self, dst: &str) -> String {
        wipe_and_recreate(dst)
    }

    fn restore_storage_pre_command(&self, dst: &str) -> String {
        wipe_and_recreate(dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_precreates_destination() {
        let mut hdfs = HdfsStore::new("hdfs://namenode:9000/backup", "");
        hdfs.set_backup_name("b1");
        assert_eq!(
            hdfs.backup_storage_command("/home/nebula/cp1", "192.168.8.129:44500", "1"),
            "hadoop fs -mkdir -p hdfs://namenode:9000/backup/b1/storage/192.168.8.129/44500/1 && \
             hadoop fs -copyFromLocal /home/nebula/cp1/data /home/nebula/cp1/wal \
             hdfs://namenode:9000/backup/b1/storage/192.168.8.129/44500/1"
        );
    }

    #[test]
    fn test_meta_command_lists_every_file() {
        let mut hdfs = HdfsStore::new("hdfs://namenode:9000/backup", "");
        hdfs.set_backup_name("b2");
        assert_eq!(
            hdfs.backup_meta_command(&["/data/a.sst".to_owned(), "/data/b.sst".to_owned()]),
            "hadoop fs -mkdir -p hdfs://namenode:9000/backup/b2/meta && \
             hadoop fs -copyFromLocal /data/a.sst /data/b.sst hdfs://namenode:9000/backup/b2/meta"
        );
    }

    #[test]
    fn test_args_follow_the_copy_flag() {
        let mut hdfs = HdfsStore::new("hdfs://namenode:9000/backup", "-D dfs.replication=2");
        hdfs.set_backup_name("b3");
        assert_eq!(
            hdfs.backup_meta_file_command("/tmp/b3.meta"),
            vec![
                "hadoop",
                "fs",
                "-copyFromLocal",
                "-D",
                "dfs.replication=2",
                "/tmp/b3.meta",
                "hdfs://namenode:9000/backup/b3",
            ]
        );
        let (cmd, files) = hdfs.restore_meta_command(&["a.sst".to_owned()], "/home/data");
        assert_eq!(
            cmd,
            "hadoop fs -copyToLocal -f -D dfs.replication=2 \
             hdfs://namenode:9000/backup/b3/meta/a.sst /home/data"
        );
        assert_eq!(files, vec!["/home/data/a.sst".to_owned()]);
    }
}
