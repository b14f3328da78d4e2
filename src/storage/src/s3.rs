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

//! S3 backend driven through the `aws` CLI.
//!
//! Directory payloads go through `aws s3 sync` (recursive and idempotent);
//! the single manifest file goes through `aws s3 cp`.

use crate::{join_tokens, parent_dir, push_segment, wipe_and_recreate, StorageCommand};

#[derive(Debug)]
pub struct S3Store {
    url: String,
    args: String,
}

impl S3Store {
    pub fn new(url: &str, args: &str) -> Self {
        Self {
            url: url.to_owned(),
            args: args.to_owned(),
        }
    }

    fn cp_argv(&self, src: &str, dst: &str) -> Vec<String> {
        let mut argv = vec!["aws".to_owned()];
        argv.extend(self.args.split_whitespace().map(str::to_owned));
        argv.extend(["s3", "cp", src, dst].map(str::to_owned));
        argv
    }
}

impl StorageCommand for S3Store {
    fn set_backup_name(&mut self, name: &str) {
        push_segment(&mut self.url, name);
    }

    fn uri(&self) -> &str {
        &self.url
    }

    fn check_command(&self) -> String {
        join_tokens(["aws", self.args.as_str(), "s3", "ls", self.url.as_str()])
    }

    fn backup_pre_command(&self) -> Option<Vec<String>> {
        None
    }

    fn backup_meta_command(&self, src: &[String]) -> String {
        // All meta SSTs share one parent directory; sync that instead of
        // naming every file.
        let src_dir = src.first().map(|f| parent_dir(f)).unwrap_or_default();
        let meta_dir = format!("{}/meta/", self.url);
        join_tokens(["aws", self.args.as_str(), "s3", "sync", src_dir.as_str(), meta_dir.as_str()])
    }

    fn backup_storage_command(&self, src: &str, host: &str, space_id: &str) -> String {
        let storage_dir = format!("{}/storage/{host}/{space_id}/", self.url);
        join_tokens(["aws", self.args.as_str(), "s3", "sync", src, storage_dir.as_str()])
    }

    fn backup_meta_file_command(&self, src: &str) -> Vec<String> {
        self.cp_argv(src, &format!("{}/", self.url))
    }

    fn restore_meta_file_command(&self, file: &str, dst: &str) -> Vec<String> {
        self.cp_argv(&format!("{}/{file}", self.url), dst)
    }

    fn restore_meta_command(&self, src: &[String], dst: &str) -> (String, Vec<String>) {
        let meta_dir = format!("{}/meta/", self.url);
        let cmd = join_tokens(["aws", self.args.as_str(), "s3", "sync", meta_dir.as_str(), dst]);
        let dst_files = src.iter().map(|f| format!("{dst}/{f}")).collect();
        (cmd, dst_files)
    }

    fn restore_storage_command(&self, host: &str, _space_ids: &[String], dst: &str) -> String {
        let storage_dir = format!("{}/storage/{host}/", self.url);
        join_tokens(["aws", self.args.as_str(), "s3", "sync", storage_dir.as_str(), dst])
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
    fn test_set_backup_name() {
        let mut s3 = S3Store::new("s3://nebulabackup/", "");
        s3.set_backup_name("backupname1");
        assert_eq!(s3.uri(), "s3://nebulabackup/backupname1");

        let mut s3 = S3Store::new("s3://nebulabackup", "");
        s3.set_backup_name("backupname2");
        assert_eq!(s3.uri(), "s3://nebulabackup/backupname2");
    }

    #[test]
    fn test_storage_command() {
        let mut s3 = S3Store::new("s3://nebulabackup/", "");
        s3.set_backup_name("backupname3");
        let cmd = s3.backup_storage_command("/home/nebula/", "127.0.0.1", "1");
        assert_eq!(
            cmd,
            "aws s3 sync /home/nebula/ s3://nebulabackup/backupname3/storage/127.0.0.1/1/"
        );

        let cmd = s3.restore_storage_command("127.0.0.1", &["1".to_owned()], "/home/data");
        assert_eq!(
            cmd,
            "aws s3 sync s3://nebulabackup/backupname3/storage/127.0.0.1/ /home/data"
        );
    }

    #[test]
    fn test_meta_command() {
        let mut s3 = S3Store::new("s3://nebulabackup", "");
        s3.set_backup_name("backupmeta");
        let files = vec![
            "/data/a.sst".to_owned(),
            "/data/b.sst".to_owned(),
            "/data/c.sst".to_owned(),
        ];
        let cmd = s3.backup_meta_command(&files);
        assert_eq!(cmd, "aws s3 sync /data s3://nebulabackup/backupmeta/meta/");

        let names = vec!["a.sst".to_owned(), "b.sst".to_owned(), "c.sst".to_owned()];
        let (cmd, sst_files) = s3.restore_meta_command(&names, "/home/data");
        assert_eq!(
            cmd,
            "aws s3 sync s3://nebulabackup/backupmeta/meta/ /home/data"
        );
        assert_eq!(
            sst_files,
            vec![
                "/home/data/a.sst".to_owned(),
                "/home/data/b.sst".to_owned(),
                "/home/data/c.sst".to_owned(),
            ]
        );
    }

    #[test]
    fn test_meta_file_command() {
        let mut s3 = S3Store::new("s3://nebulabackupfile/", "");
        s3.set_backup_name("backupmetafile");
        let cmd = s3.backup_meta_file_command("/home/nebula/backup.meta");
        assert_eq!(
            cmd,
            vec![
                "aws",
                "s3",
                "cp",
                "/home/nebula/backup.meta",
                "s3://nebulabackupfile/backupmetafile/",
            ]
        );

        let cmd = s3.restore_meta_file_command("backup.meta", "/home/data");
        assert_eq!(
            cmd,
            vec![
                "aws",
                "s3",
                "cp",
                "s3://nebulabackupfile/backupmetafile/backup.meta",
                "/home/data",
            ]
        );
    }

    #[test]
    fn test_extra_args_are_inserted() {
        let mut s3 = S3Store::new("s3://nebulabackup/", "--endpoint-url http://127.0.0.1:9000");
        s3.set_backup_name("b1");
        assert_eq!(
            s3.check_command(),
            "aws --endpoint-url http://127.0.0.1:9000 s3 ls s3://nebulabackup/b1"
        );
        assert_eq!(
            s3.backup_meta_file_command("/tmp/b1.meta"),
            vec![
                "aws",
                "--endpoint-url",
                "http://127.0.0.1:9000",
                "s3",
                "cp",
                "/tmp/b1.meta",
                "s3://nebulabackup/b1/",
            ]
        );
    }
}
