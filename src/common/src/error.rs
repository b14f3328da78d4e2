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

use thiserror::Error;

pub type Result<T, E = BrError> = std::result::Result<T, E>;

/// The error type shared by every layer of the tool.
///
/// The executor layer never retries; retry lives in the meta client only.
/// Orchestrators treat any of these as terminal unless noted otherwise at the
/// call site.
#[derive(Error, Debug)]
pub enum BrError {
    #[error("the address `{addr}` must contain the port")]
    AddressMalformed { addr: String },

    #[error("ssh to `{host}` unavailable")]
    SshUnavailable {
        host: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("meta rpc to `{addr}` failed: {message}")]
    MetaRpc { addr: String, message: String },

    #[error("meta leader not found")]
    LeaderNotFound,

    #[error("the physical topology of storage must be consistent")]
    TopologyMismatch {
        manifest_hosts: usize,
        config_hosts: usize,
    },

    #[error("invalid config: {0}")]
    ConfigInvalid(String),

    #[error("unsupported backend storage url: {url}")]
    BackendUnsupported { url: String },

    #[error("backend command `{command}` exited with code {code}")]
    BackendCommandFailed { command: String, code: i32 },

    #[error("restore failed")]
    RestoreFailed,

    #[error("cleanup failed")]
    Cleanup(#[source] Box<BrError>),

    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
