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

//! The `br` command line front end: argument parsing, config loading and
//! pre-flight validation ahead of the orchestrators.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use nebula_br_backup::backup::Backup;
use nebula_br_backup::cleanup::Cleanup;
use nebula_br_backup::restore::Restore;
use nebula_br_common::config::{BackupConfig, CleanupConfig, NodeInfo, RestoreConfig};
use nebula_br_common::error::Result;

#[derive(Parser, Debug)]
#[command(
    name = "br",
    about = "Backup and restore tool for a distributed graph database"
)]
pub struct BrCli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Back up the cluster to external storage.
    Backup {
        #[command(subcommand)]
        command: BackupCommand,
    },
    /// Restore a cluster from a previously captured snapshot.
    Restore {
        #[command(subcommand)]
        command: RestoreCommand,
    },
    /// Drop the server-side snapshot of a finished backup.
    Cleanup(CleanupArgs),
    /// Print the version.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum BackupCommand {
    /// Full backup.
    Full {
        /// Topology file path.
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum RestoreCommand {
    /// Full restore.
    Full {
        /// Topology file path.
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Name of the backup whose server-side snapshot should be dropped.
    #[arg(long = "backup_name")]
    pub backup_name: String,
    /// Meta server seed address; may be repeated, the first one is dialed.
    #[arg(long = "meta", required = true)]
    pub meta: Vec<String>,
}

pub async fn run(cli: BrCli) -> Result<()> {
    match cli.command {
        Command::Backup {
            command: BackupCommand::Full { config },
        } => run_backup_full(&config).await,
        Command::Restore {
            command: RestoreCommand::Full { config },
        } => run_restore_full(&config).await,
        Command::Cleanup(args) => run_cleanup(args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn run_backup_full(path: &Path) -> Result<()> {
    let config = BackupConfig::from_yaml(&fs_err::read_to_string(path)?)?;
    config.validate()?;
    check_cluster_ssh(config.meta_nodes.iter().chain(config.storage_nodes.iter())).await?;
    Backup::new(config)?.backup_cluster().await
}

async fn run_restore_full(path: &Path) -> Result<()> {
    let mut config = RestoreConfig::from_yaml(&fs_err::read_to_string(path)?)?;
    config.validate()?;
    check_cluster_ssh(config.meta_nodes.iter().chain(config.storage_nodes.iter())).await?;
    Restore::new(config)?.restore_cluster().await
}

async fn run_cleanup(args: CleanupArgs) -> Result<()> {
    let config = CleanupConfig {
        backup_name: args.backup_name,
        meta_server: args.meta,
    };
    config.validate()?;
    Cleanup::new(config).run().await
}

/// An SSH session must open to every node before an orchestrator touches the
/// cluster.
async fn check_cluster_ssh<'a>(nodes: impl Iterator<Item = &'a NodeInfo>) -> Result<()> {
    for node in nodes {
        tracing::info!(addr = %node.addrs, "checking ssh");
        nebula_br_remote::check_ssh(&node.addrs, &node.user).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn test_parse_backup_full() {
        let cli =
            BrCli::try_parse_from(["br", "backup", "full", "--config", "backup.yaml"]).unwrap();
        match cli.command {
            Command::Backup {
                command: BackupCommand::Full { config },
            } => assert_eq!(config, PathBuf::from("backup.yaml")),
            _ => panic!("parsed into the wrong subcommand"),
        }
    }

    #[test]
    fn test_backup_full_requires_config() {
        let err = BrCli::try_parse_from(["br", "backup", "full"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_parse_cleanup_flags() {
        let cli = BrCli::try_parse_from([
            "br",
            "cleanup",
            "--backup_name",
            "BACKUP_2026_08_01",
            "--meta",
            "192.168.8.129:45500",
            "--meta",
            "192.168.8.130:45500",
        ])
        .unwrap();
        match cli.command {
            Command::Cleanup(args) => {
                assert_eq!(args.backup_name, "BACKUP_2026_08_01");
                assert_eq!(args.meta.len(), 2);
            }
            _ => panic!("parsed into the wrong subcommand"),
        }
    }

    #[test]
    fn test_parse_version() {
        let cli = BrCli::try_parse_from(["br", "version"]).unwrap();
        assert!(matches!(cli.command, Command::Version));
    }
}
