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

//! Drops a server-side snapshot that a finished (or aborted) backup left in
//! the cluster. The manifest on the backend is left alone.

use nebula_br_common::config::CleanupConfig;
use nebula_br_common::error::{BrError, Result};

pub struct Cleanup {
    config: CleanupConfig,
}

impl Cleanup {
    pub fn new(config: CleanupConfig) -> Self {
        Self { config }
    }

    pub async fn run(&self) -> Result<()> {
        let addr = self.config.meta_server.first().ok_or_else(|| {
            BrError::ConfigInvalid("at least one meta server address is required".to_owned())
        })?;
        let leader =
            nebula_br_meta_client::drop_snapshot(addr, self.config.backup_name.as_bytes())
                .await
                .map_err(|e| match e {
                    BrError::LeaderNotFound => e,
                    other => BrError::Cleanup(Box::new(other)),
                })?;
        tracing::info!(backup_name = %self.config.backup_name, %leader, "cleanup finished");
        Ok(())
    }
}
