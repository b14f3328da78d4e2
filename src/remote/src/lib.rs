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

//! Remote command execution over SSH.
//!
//! Sessions are plain libssh2 connections driven from `spawn_blocking`; one
//! shell command runs per channel. There is no retry at this layer — every
//! dial, auth or non-zero exit surfaces as [`BrError::SshUnavailable`] and the
//! caller decides what to do with it.

use std::io::Read;
use std::net::TcpStream;
use std::path::PathBuf;

use futures::future::try_join_all;
use nebula_br_common::config::{split_addr, NodeInfo};
use nebula_br_common::error::{BrError, Result};
use ssh2::Session;
use tokio::task;

const SSH_PORT: u16 = 22;

fn ssh_error(host: &str, source: impl Into<anyhow::Error>) -> BrError {
    BrError::SshUnavailable {
        host: host.to_owned(),
        source: source.into(),
    }
}

fn private_key_path(host: &str) -> Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| ssh_error(host, anyhow::anyhow!("$HOME is not set")))?;
    let path = PathBuf::from(home).join(".ssh").join("id_rsa");
    if !path.exists() {
        return Err(ssh_error(
            host,
            anyhow::anyhow!("private key {} not found", path.display()),
        ));
    }
    Ok(path)
}

/// One authenticated SSH connection to a cluster host.
pub struct Client {
    session: Session,
    host: String,
    user: String,
}

impl Client {
    /// Dials `host:22` and authenticates with the caller's private key at
    /// `$HOME/.ssh/id_rsa`. Any host key is accepted.
    pub fn connect(host: &str, user: &str) -> Result<Self> {
        let key = private_key_path(host)?;
        let tcp = TcpStream::connect((host, SSH_PORT)).map_err(|e| ssh_error(host, e))?;
        let mut session = Session::new().map_err(|e| ssh_error(host, e))?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| ssh_error(host, e))?;
        session
            .userauth_pubkey_file(user, None, &key, None)
            .map_err(|e| ssh_error(host, e))?;
        Ok(Self {
            session,
            host: host.to_owned(),
            user: user.to_owned(),
        })
    }

    /// Runs one shell command in a fresh channel, capturing stdout. Fails on
    /// non-zero remote exit.
    pub fn exec(&self, cmd: &str) -> Result<String> {
        tracing::info!(host = %self.host, user = %self.user, %cmd, "ssh will exec");
        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| ssh_error(&self.host, e))?;
        channel.exec(cmd).map_err(|e| ssh_error(&self.host, e))?;
        let mut stdout = String::new();
        channel
            .read_to_string(&mut stdout)
            .map_err(|e| ssh_error(&self.host, e))?;
        channel.wait_close().map_err(|e| ssh_error(&self.host, e))?;
        let status = channel.exit_status().map_err(|e| ssh_error(&self.host, e))?;
        if status != 0 {
            return Err(ssh_error(
                &self.host,
                anyhow::anyhow!("`{cmd}` exited with status {status}"),
            ));
        }
        tracing::debug!(host = %self.host, %cmd, %stdout, "remote command finished");
        Ok(stdout)
    }
}

/// A fixed number of independently dialed connections to the same host, used
/// to bound per-host parallelism.
pub struct ClientPool {
    clients: Vec<Client>,
}

impl ClientPool {
    pub fn connect(host: &str, user: &str, connections: usize) -> Result<Self> {
        let mut clients = Vec::with_capacity(connections);
        for _ in 0..connections {
            clients.push(Client::connect(host, user)?);
        }
        Ok(Self { clients })
    }
}

/// Dials a fresh connection and runs a single command on it.
pub async fn exec_command(host: String, user: String, cmd: String) -> Result<String> {
    Ok(
        task::spawn_blocking(move || Client::connect(&host, &user)?.exec(&cmd))
            .await
            .map_err(anyhow::Error::from)??,
    )
}

/// Round-robins `cmds` over `connections` pooled sessions to one host. Each
/// session runs its share sequentially; the shares run in parallel, so at
/// most `connections` commands are in flight on the host at once.
pub async fn exec_batch(
    host: String,
    user: String,
    connections: usize,
    cmds: Vec<String>,
) -> Result<()> {
    let pool = {
        let (host, user) = (host.clone(), user.clone());
        task::spawn_blocking(move || ClientPool::connect(&host, &user, connections))
            .await
            .map_err(anyhow::Error::from)??
    };
    let handles = pool
        .clients
        .into_iter()
        .zip(round_robin(cmds, connections))
        .map(|(client, share)| {
            task::spawn_blocking(move || {
                for cmd in &share {
                    client.exec(cmd)?;
                }
                Ok(())
            })
        })
        .collect::<Vec<_>>();
    let results: Vec<Result<()>> = try_join_all(handles).await.map_err(anyhow::Error::from)?;
    results.into_iter().collect::<Result<Vec<_>>>()?;
    Ok(())
}

/// Runs the same probe command on every node in parallel; any failure fails
/// the whole check.
pub async fn check_command(cmd: &str, nodes: &[NodeInfo]) -> Result<()> {
    let mut tasks = Vec::with_capacity(nodes.len());
    for node in nodes {
        let host = node.host()?.to_owned();
        tasks.push(exec_command(host, node.user.clone(), cmd.to_owned()));
    }
    try_join_all(tasks).await?;
    Ok(())
}

/// Pre-flight probe used by config validation: the address must carry a port
/// and an SSH session must open to it.
pub async fn check_ssh(addrs: &str, user: &str) -> Result<()> {
    let (host, _) = split_addr(addrs)?;
    let (host, user) = (host.to_owned(), user.to_owned());
    task::spawn_blocking(move || Client::connect(&host, &user).map(|_| ()))
        .await
        .map_err(anyhow::Error::from)??;
    Ok(())
}

fn round_robin(cmds: Vec<String>, connections: usize) -> Vec<Vec<String>> {
    let mut shares = vec![Vec::new(); connections.max(1)];
    for (i, cmd) in cmds.into_iter().enumerate() {
        let share = i % shares.len();
        shares[share].push(cmd);
    }
    shares
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn test_check_ssh_rejects_address_without_port() {
        let err = check_ssh("111", "testuser").await.unwrap_err();
        assert_matches!(err, BrError::AddressMalformed { addr } if addr == "111");
    }

    #[test]
    fn test_round_robin_bounds_per_connection_share() {
        let cmds: Vec<String> = (0..7).map(|i| format!("cmd{i}")).collect();
        let shares = round_robin(cmds, 3);
        assert_eq!(shares.len(), 3);
        assert_eq!(shares[0], vec!["cmd0", "cmd3", "cmd6"]);
        assert_eq!(shares[1], vec!["cmd1", "cmd4"]);
        assert_eq!(shares[2], vec!["cmd2", "cmd5"]);
    }

    #[test]
    fn test_round_robin_handles_zero_connections() {
        let shares = round_robin(vec!["ls".to_owned()], 0);
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0], vec!["ls"]);
    }
}
