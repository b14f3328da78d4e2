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

//! Client for the meta service's backup RPCs.
//!
//! Two retry policies live here and nowhere else: the leader-follow loop for
//! `CreateBackup`/`DropSnapshot` (unbounded in hops, terminated by any
//! non-leader-change code) and the bounded retry for `RestoreMeta`.

use std::future::Future;
use std::time::Duration;

use nebula_br_common::error::{BrError, Result};
use nebula_br_pb::meta::meta_service_client::MetaServiceClient;
use nebula_br_pb::meta::{
    BackupMeta, CreateBackupRequest, CreateBackupResponse, DropSnapshotRequest, ErrorCode,
    ExecResponse, HostAddr, HostPair, RestoreMetaRequest,
};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tonic::transport::{Channel, Endpoint};

pub mod manifest;
pub mod util;

const META_RPC_TIMEOUT: Duration = Duration::from_secs(120);
const RESTORE_RETRY_ATTEMPTS: usize = 3;
const RESTORE_RETRY_BACKOFF: Duration = Duration::from_secs(2);

fn rpc_error(addr: &str, message: impl ToString) -> BrError {
    BrError::MetaRpc {
        addr: addr.to_owned(),
        message: message.to_string(),
    }
}

/// A transport to one meta server.
#[derive(Default)]
pub struct MetaClient {
    client: Option<MetaServiceClient<Channel>>,
    addr: String,
}

impl MetaClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dials `addr`. May be called repeatedly on the same client; a prior
    /// transport is closed first.
    pub async fn open(&mut self, addr: &str) -> Result<()> {
        self.close();
        tracing::info!(%addr, "open meta transport");
        let endpoint = Endpoint::from_shared(format!("http://{addr}"))
            .map_err(|e| rpc_error(addr, e))?
            .connect_timeout(META_RPC_TIMEOUT)
            .timeout(META_RPC_TIMEOUT);
        let channel = endpoint.connect().await.map_err(|e| rpc_error(addr, e))?;
        self.client = Some(MetaServiceClient::new(channel));
        self.addr = addr.to_owned();
        Ok(())
    }

    pub fn close(&mut self) {
        self.client = None;
    }

    fn client(&mut self) -> Result<&mut MetaServiceClient<Channel>> {
        let addr = self.addr.clone();
        self.client
            .as_mut()
            .ok_or_else(|| rpc_error(&addr, "client not open"))
    }

    pub async fn create_backup(&mut self, req: CreateBackupRequest) -> Result<CreateBackupResponse> {
        let addr = self.addr.clone();
        let resp = self
            .client()?
            .create_backup(req)
            .await
            .map_err(|e| rpc_error(&addr, e))?;
        Ok(resp.into_inner())
    }

    pub async fn drop_snapshot(&mut self, req: DropSnapshotRequest) -> Result<ExecResponse> {
        let addr = self.addr.clone();
        let resp = self
            .client()?
            .drop_snapshot(req)
            .await
            .map_err(|e| rpc_error(&addr, e))?;
        Ok(resp.into_inner())
    }

    pub async fn restore_meta(&mut self, req: RestoreMetaRequest) -> Result<ExecResponse> {
        let addr = self.addr.clone();
        let resp = self
            .client()?
            .restore_meta(req)
            .await
            .map_err(|e| rpc_error(&addr, e))?;
        Ok(resp.into_inner())
    }
}

/// Drives the leader-follow loop: `call` issues the RPC against one address
/// and reports `(code, leader, payload)`.
///
/// The only terminal states are a success, a leader change carrying the
/// sentinel default leader, and any other non-success code. Returns the
/// payload together with the address that finally served it.
pub async fn follow_leader<R, F, Fut>(first_addr: &str, mut call: F) -> Result<(R, String)>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<(ErrorCode, Option<HostAddr>, R)>>,
{
    let mut addr = first_addr.to_owned();
    loop {
        let (code, leader, resp) = call(addr.clone()).await?;
        match code {
            ErrorCode::Succeeded => return Ok((resp, addr)),
            ErrorCode::ELeaderChanged => {
                let leader = leader
                    .filter(|l| !l.host.is_empty())
                    .ok_or(BrError::LeaderNotFound)?;
                let next = util::host_addr_to_string(&leader);
                tracing::info!(leader = %next, "meta leader changed");
                addr = next;
            }
            code => {
                return Err(rpc_error(
                    &addr,
                    format!("error code {}", code.as_str_name()),
                ));
            }
        }
    }
}

/// Obtains a snapshot manifest from the meta-leader, following leader
/// changes. Returns the manifest and the address of the leader that served
/// it.
pub async fn create_backup(first_addr: &str, spaces: &[String]) -> Result<(BackupMeta, String)> {
    let (resp, leader_addr) = follow_leader(first_addr, |addr| async move {
        let mut client = MetaClient::new();
        client.open(&addr).await?;
        let req = CreateBackupRequest {
            spaces: spaces.iter().map(|s| s.clone().into_bytes()).collect(),
        };
        let resp = client.create_backup(req).await?;
        Ok((resp.code(), resp.leader.clone(), resp))
    })
    .await?;
    let meta = resp.meta.ok_or_else(|| {
        rpc_error(
            &leader_addr,
            "successful CreateBackup response carried no manifest",
        )
    })?;
    Ok((meta, leader_addr))
}

/// Asks the meta-leader to drop the named server-side snapshot, following
/// leader changes. Returns the address of the leader that served the drop.
pub async fn drop_snapshot(first_addr: &str, name: &[u8]) -> Result<String> {
    let (_, leader_addr) = follow_leader(first_addr, |addr| async move {
        let mut client = MetaClient::new();
        client.open(&addr).await?;
        let resp = client
            .drop_snapshot(DropSnapshotRequest { name: name.to_vec() })
            .await?;
        Ok((resp.code(), resp.leader, ()))
    })
    .await?;
    Ok(leader_addr)
}

/// Submits the remapped manifest to one meta node.
///
/// No leader-follow here — every meta node of the restore topology receives
/// the request and the new quorum reconciles afterwards. Dial failures,
/// transport failures and non-success codes are all retried on the bounded
/// budget.
pub async fn restore_meta(addr: &str, files: Vec<Vec<u8>>, hosts: Vec<HostPair>) -> Result<()> {
    retry_restore(RESTORE_RETRY_BACKOFF, || {
        let (files, hosts) = (files.clone(), hosts.clone());
        async move {
            let mut client = MetaClient::new();
            client.open(addr).await?;
            let resp = client.restore_meta(RestoreMetaRequest { files, hosts }).await?;
            match resp.code() {
                ErrorCode::Succeeded => Ok(()),
                code => Err(rpc_error(
                    addr,
                    format!("error code {}", code.as_str_name()),
                )),
            }
        }
    })
    .await?;
    tracing::info!(%addr, "restore meta succeeded");
    Ok(())
}

/// Runs `op` up to [`RESTORE_RETRY_ATTEMPTS`] times with a fixed `backoff`
/// between attempts; an exhausted budget maps to [`BrError::RestoreFailed`].
async fn retry_restore<F, Fut>(backoff: Duration, op: F) -> Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let strategy = FixedInterval::new(backoff).take(RESTORE_RETRY_ATTEMPTS - 1);
    Retry::spawn(strategy, op).await.map_err(|e| {
        tracing::error!(error = %e, "restore meta retry budget exhausted");
        BrError::RestoreFailed
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use assert_matches::assert_matches;

    use super::*;

    fn leader(host: &str, port: i32) -> Option<HostAddr> {
        Some(HostAddr {
            host: host.to_owned(),
            port,
        })
    }

    #[tokio::test]
    async fn test_follow_leader_terminates_after_k_hops() {
        let calls = AtomicUsize::new(0);
        let (resp, addr) = follow_leader("127.0.0.1:9559", |addr| {
            let hop = calls.fetch_add(1, Ordering::Relaxed);
            async move {
                match hop {
                    0 => {
                        assert_eq!(addr, "127.0.0.1:9559");
                        Ok((ErrorCode::ELeaderChanged, leader("127.0.0.2", 9559), 0))
                    }
                    1 => {
                        assert_eq!(addr, "127.0.0.2:9559");
                        Ok((ErrorCode::ELeaderChanged, leader("127.0.0.3", 9559), 0))
                    }
                    _ => Ok((ErrorCode::Succeeded, None, 42)),
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(resp, 42);
        assert_eq!(addr, "127.0.0.3:9559");
    }

    #[tokio::test]
    async fn test_follow_leader_without_leader_hint() {
        let err = follow_leader("127.0.0.1:9559", |_| async {
            Ok((ErrorCode::ELeaderChanged, None, ()))
        })
        .await
        .unwrap_err();
        assert_matches!(err, BrError::LeaderNotFound);

        // The default (all-zero) leader is the same sentinel.
        let err = follow_leader("127.0.0.1:9559", |_| async {
            Ok((ErrorCode::ELeaderChanged, leader("", 0), ()))
        })
        .await
        .unwrap_err();
        assert_matches!(err, BrError::LeaderNotFound);
    }

    #[tokio::test]
    async fn test_follow_leader_stops_on_terminal_code() {
        let calls = AtomicUsize::new(0);
        let err = follow_leader("127.0.0.1:9559", |_| {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Ok((ErrorCode::EBackupFailure, None, ())) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_matches!(err, BrError::MetaRpc { message, .. } if message.contains("E_BACKUP_FAILURE"));
    }

    #[tokio::test]
    async fn test_retry_restore_succeeds_on_third_attempt() {
        let calls = AtomicUsize::new(0);
        retry_restore(Duration::ZERO, || {
            let attempt = calls.fetch_add(1, Ordering::Relaxed);
            async move {
                if attempt < 2 {
                    Err(rpc_error("127.0.0.1:9559", "transport error"))
                } else {
                    Ok(())
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_retry_restore_exhausts_budget() {
        let calls = AtomicUsize::new(0);
        let err = retry_restore(Duration::ZERO, || {
            calls.fetch_add(1, Ordering::Relaxed);
            async { Err(rpc_error("127.0.0.1:9559", "transport error")) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_matches!(err, BrError::RestoreFailed);
    }
}
