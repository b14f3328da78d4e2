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

//! The backup, restore and cleanup orchestrators.
//!
//! Each run is a sequence of fan-out phases: a phase spawns one task per
//! node (or per checkpoint), joins them all, and the first error aborts the
//! run. Nothing of a later phase starts before the whole previous phase has
//! completed. No state is rolled back on failure; the operator runs
//! `cleanup` to drop a half-made server-side snapshot.

use nebula_br_common::error::{BrError, Result};

pub mod backup;
pub mod cleanup;
pub mod restore;

/// The scratch directory holding `<BackupName>.meta` during a run.
/// Concurrent runs with the same backup name collide and are unsupported.
pub(crate) const TMP_DIR: &str = "/tmp";

/// Runs one backend CLI command on the local host, failing on non-zero exit.
pub(crate) async fn run_local_command(argv: &[String]) -> Result<()> {
    let rendered = argv.join(" ");
    tracing::info!(command = %rendered, "run local command");
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| BrError::ConfigInvalid("empty backend command".to_owned()))?;
    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await?;
    if !output.status.success() {
        tracing::error!(
            command = %rendered,
            stderr = %String::from_utf8_lossy(&output.stderr),
            "local command failed"
        );
        return Err(BrError::BackendCommandFailed {
            command: rendered,
            code: output.status.code().unwrap_or(-1),
        });
    }
    Ok(())
}
