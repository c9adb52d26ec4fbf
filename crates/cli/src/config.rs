//! Command-line and environment configuration.
//!
//! Every connection setting can come from a flag or from its `GIT_*`
//! environment variable; flags win.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gitprovider::{MergeMethod, Visibility};

#[derive(Debug, Parser)]
#[command(name = "gitprovider", version)]
#[command(about = "Drive Azure DevOps, Gitea and Bitbucket repositories through one interface", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionConfig,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    Azure,
    Gitea,
    Bitbucket,
}

#[derive(Debug, Clone, Args)]
pub struct ConnectionConfig {
    /// Backend kind
    #[arg(long, env = "GIT_KIND", value_enum, global = true)]
    pub kind: Option<ProviderKind>,

    /// Server or API root. Required for Gitea
    #[arg(long, env = "GIT_SERVER", global = true)]
    pub server: Option<String>,

    /// Access token, personal access token or app password
    #[arg(long, env = "GIT_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Bitbucket username for app-password authentication
    #[arg(long, env = "GIT_USER", global = true)]
    pub user: Option<String>,

    /// Azure DevOps organization; also the default repository owner
    #[arg(long, env = "GIT_ORGANIZATION", global = true)]
    pub organization: Option<String>,

    /// Azure DevOps project
    #[arg(long, env = "GIT_PROJECT", global = true)]
    pub project: Option<String>,
}

/// Identifies one repository.
#[derive(Debug, Clone, Args)]
pub struct RepoArgs {
    /// Owning organization, workspace or user. Defaults to --organization
    #[arg(long)]
    pub owner: Option<String>,

    /// Repository name
    #[arg(long = "repo")]
    pub name: String,

    /// The owner is a user account rather than an organization
    #[arg(long)]
    pub user_owned: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Repository metadata and administration
    #[command(subcommand)]
    Repo(RepoCommand),
    /// Branch commit views and multi-file commits
    #[command(subcommand)]
    Commits(CommitsCommand),
    /// Branch creation
    #[command(subcommand)]
    Branch(BranchCommand),
    /// Pull requests
    #[command(subcommand)]
    Pr(PrCommand),
}

#[derive(Debug, Subcommand)]
pub enum RepoCommand {
    /// Show repository metadata
    Info(RepoArgs),
    /// List the owner's repositories
    List {
        #[arg(long)]
        owner: Option<String>,
        #[arg(long)]
        user_owned: bool,
    },
    /// Create the repository or bring its metadata to the given values
    Reconcile {
        #[command(flatten)]
        repo: RepoArgs,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        default_branch: Option<String>,
        #[arg(long, value_enum)]
        visibility: Option<VisibilityArg>,
    },
    /// Delete the repository
    Delete(RepoArgs),
}

#[derive(Debug, Subcommand)]
pub enum CommitsCommand {
    /// List commit views for a branch
    List {
        #[command(flatten)]
        repo: RepoArgs,
        #[arg(long)]
        branch: String,
        /// Page size; 0 returns everything
        #[arg(long, default_value_t = 0)]
        per_page: usize,
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Commit local files to a branch, one write per file
    Create {
        #[command(flatten)]
        repo: RepoArgs,
        #[arg(long)]
        branch: String,
        #[arg(short, long)]
        message: String,
        /// `REMOTE_PATH=LOCAL_FILE`, repeatable
        #[arg(long = "file", value_parser = parse_file_arg)]
        files: Vec<FileArg>,
    },
}

#[derive(Debug, Subcommand)]
pub enum BranchCommand {
    /// Create a branch at a commit
    Create {
        #[command(flatten)]
        repo: RepoArgs,
        #[arg(long)]
        name: String,
        #[arg(long)]
        sha: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum PrCommand {
    /// Open a pull request from --branch into --base
    Create {
        #[command(flatten)]
        repo: RepoArgs,
        #[arg(long)]
        title: String,
        #[arg(long)]
        branch: String,
        #[arg(long)]
        base: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List pull requests in every state
    List(RepoArgs),
    /// Show one pull request
    Get {
        #[command(flatten)]
        repo: RepoArgs,
        #[arg(long)]
        number: u64,
    },
    /// Merge a pull request
    Merge {
        #[command(flatten)]
        repo: RepoArgs,
        #[arg(long)]
        number: u64,
        #[arg(long, value_enum, default_value_t = MergeArg::Merge)]
        method: MergeArg,
        #[arg(short, long, default_value = "")]
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VisibilityArg {
    Public,
    Internal,
    Private,
}

impl From<VisibilityArg> for Visibility {
    fn from(value: VisibilityArg) -> Self {
        match value {
            VisibilityArg::Public => Visibility::Public,
            VisibilityArg::Internal => Visibility::Internal,
            VisibilityArg::Private => Visibility::Private,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MergeArg {
    Merge,
    Squash,
    Rebase,
}

impl From<MergeArg> for MergeMethod {
    fn from(value: MergeArg) -> Self {
        match value {
            MergeArg::Merge => MergeMethod::Merge,
            MergeArg::Squash => MergeMethod::Squash,
            MergeArg::Rebase => MergeMethod::Rebase,
        }
    }
}

/// One file of `commits create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArg {
    pub remote: String,
    pub local: PathBuf,
}

fn parse_file_arg(value: &str) -> Result<FileArg, String> {
    match value.split_once('=') {
        Some((remote, local)) if !remote.is_empty() && !local.is_empty() => Ok(FileArg {
            remote: remote.to_string(),
            local: PathBuf::from(local),
        }),
        _ => Err(format!("expected REMOTE_PATH=LOCAL_FILE, got '{value}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_commit_with_files() {
        let cli = Cli::try_parse_from([
            "gitprovider",
            "--kind",
            "gitea",
            "--server",
            "https://gitea.example.com",
            "commits",
            "create",
            "--owner",
            "acme",
            "--repo",
            "infra",
            "--branch",
            "main",
            "-m",
            "add docs",
            "--file",
            "docs/a.md=./a.md",
            "--file",
            "b.txt=/tmp/b.txt",
        ])
        .unwrap();

        assert_eq!(cli.connection.kind, Some(ProviderKind::Gitea));
        match cli.command {
            Command::Commits(CommitsCommand::Create { repo, files, .. }) => {
                assert_eq!(repo.owner.as_deref(), Some("acme"));
                assert_eq!(repo.name, "infra");
                assert_eq!(files.len(), 2);
                assert_eq!(files[0].remote, "docs/a.md");
                assert_eq!(files[1].local, PathBuf::from("/tmp/b.txt"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_connection_flags_are_global() {
        let cli = Cli::try_parse_from([
            "gitprovider",
            "pr",
            "merge",
            "--repo",
            "infra",
            "--number",
            "4",
            "--kind",
            "azure",
            "--organization",
            "acme",
            "--project",
            "ops",
        ])
        .unwrap();

        assert_eq!(cli.connection.kind, Some(ProviderKind::Azure));
        assert!(matches!(
            cli.command,
            Command::Pr(PrCommand::Merge { number: 4, method: MergeArg::Merge, .. })
        ));
    }

    #[test]
    fn test_file_arg_requires_both_sides() {
        assert!(parse_file_arg("a=b").is_ok());
        assert!(parse_file_arg("=b").is_err());
        assert!(parse_file_arg("a=").is_err());
        assert!(parse_file_arg("ab").is_err());
    }
}
