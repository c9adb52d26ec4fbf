//! Subcommands over the neutral client. Everything here is generic over the
//! driver; only [`crate::backend`] knows the concrete types.

use anyhow::{bail, Context, Result};
use gitprovider::{
    Client, CommitFile, Driver, OrganizationRef, Repository, RepositoryInfo, RepositoryRef, UserRef,
};
use serde_json::{json, Value};

use crate::config::{BranchCommand, Command, CommitsCommand, PrCommand, RepoArgs, RepoCommand};

pub async fn run<D: Driver>(
    client: &Client<D>,
    command: &Command,
    default_owner: Option<&str>,
) -> Result<Value> {
    match command {
        Command::Repo(command) => repo(client, command, default_owner).await,
        Command::Commits(command) => commits(client, command, default_owner).await,
        Command::Branch(BranchCommand::Create { repo, name, sha }) => {
            let repository = resolve(client, repo, default_owner).await?;
            repository.branches().create(name, sha).await?;
            Ok(json!({ "branch": name, "sha": sha }))
        }
        Command::Pr(command) => pull_requests(client, command, default_owner).await,
    }
}

async fn repo<D: Driver>(
    client: &Client<D>,
    command: &RepoCommand,
    default_owner: Option<&str>,
) -> Result<Value> {
    match command {
        RepoCommand::Info(args) => {
            let repository = resolve(client, args, default_owner).await?;
            Ok(json!(repository.info()))
        }
        RepoCommand::List { owner, user_owned } => {
            let owner = owner_or_default(owner.as_deref(), default_owner)?;
            let domain = client.supported_domain();
            let repositories = if *user_owned {
                client.user_repositories().list(&UserRef::new(domain, owner)).await?
            } else {
                client
                    .org_repositories()
                    .list(&OrganizationRef::new(domain, owner))
                    .await?
            };
            Ok(Value::Array(
                repositories
                    .iter()
                    .map(|r| json!({ "name": r.repository().repository_name(), "info": r.info() }))
                    .collect(),
            ))
        }
        RepoCommand::Reconcile {
            repo,
            description,
            default_branch,
            visibility,
        } => {
            let reference = reference(client, repo, default_owner)?;
            let desired = RepositoryInfo {
                description: description.clone(),
                default_branch: default_branch.clone(),
                visibility: visibility.map(Into::into),
            };
            let (repository, changed) = if repo.user_owned {
                client.user_repositories().reconcile(&reference, desired).await?
            } else {
                client.org_repositories().reconcile(&reference, desired).await?
            };
            Ok(json!({ "changed": changed, "info": repository.info() }))
        }
        RepoCommand::Delete(args) => {
            let repository = resolve(client, args, default_owner).await?;
            repository.delete().await?;
            Ok(json!({ "deleted": repository.repository().to_string() }))
        }
    }
}

async fn commits<D: Driver>(
    client: &Client<D>,
    command: &CommitsCommand,
    default_owner: Option<&str>,
) -> Result<Value> {
    match command {
        CommitsCommand::List {
            repo,
            branch,
            per_page,
            page,
        } => {
            let repository = resolve(client, repo, default_owner).await?;
            let commits = repository.commits().list_page(branch, *per_page, *page).await?;
            Ok(Value::Array(
                commits
                    .iter()
                    .map(|c| json!({ "branch": c.branch().as_str(), "sha": c.sha().as_str() }))
                    .collect(),
            ))
        }
        CommitsCommand::Create {
            repo,
            branch,
            message,
            files,
        } => {
            let mut changes = Vec::with_capacity(files.len());
            for file in files {
                let content = tokio::fs::read_to_string(&file.local)
                    .await
                    .with_context(|| format!("failed to read {}", file.local.display()))?;
                changes.push(CommitFile::new(file.remote.clone(), content));
            }

            let repository = resolve(client, repo, default_owner).await?;
            let head = repository.commits().create(branch, message, &changes).await?;
            Ok(json!({ "branch": head.branch().as_str(), "sha": head.sha().as_str(), "files": changes.len() }))
        }
    }
}

async fn pull_requests<D: Driver>(
    client: &Client<D>,
    command: &PrCommand,
    default_owner: Option<&str>,
) -> Result<Value> {
    match command {
        PrCommand::Create {
            repo,
            title,
            branch,
            base,
            description,
        } => {
            let repository = resolve(client, repo, default_owner).await?;
            let pr = repository
                .pull_requests()
                .create(title, branch, base, description)
                .await?;
            Ok(json!(pr.get()))
        }
        PrCommand::List(args) => {
            let repository = resolve(client, args, default_owner).await?;
            let prs = repository.pull_requests().list().await?;
            Ok(Value::Array(prs.iter().map(|pr| json!(pr.get())).collect()))
        }
        PrCommand::Get { repo, number } => {
            let repository = resolve(client, repo, default_owner).await?;
            let pr = repository.pull_requests().get(*number).await?;
            Ok(json!(pr.get()))
        }
        PrCommand::Merge {
            repo,
            number,
            method,
            message,
        } => {
            let repository = resolve(client, repo, default_owner).await?;
            let pull_requests = repository.pull_requests();
            pull_requests.merge(*number, (*method).into(), message).await?;
            let pr = pull_requests.get(*number).await?;
            Ok(json!(pr.get()))
        }
    }
}

async fn resolve<D: Driver>(
    client: &Client<D>,
    args: &RepoArgs,
    default_owner: Option<&str>,
) -> Result<Repository<D>> {
    let reference = reference(client, args, default_owner)?;
    let repository = if args.user_owned {
        client.user_repositories().get(&reference).await
    } else {
        client.org_repositories().get(&reference).await
    };
    repository.with_context(|| format!("failed to resolve repository {reference}"))
}

fn reference<D: Driver>(
    client: &Client<D>,
    args: &RepoArgs,
    default_owner: Option<&str>,
) -> Result<RepositoryRef> {
    let owner = owner_or_default(args.owner.as_deref(), default_owner)?;
    let domain = client.supported_domain();
    Ok(if args.user_owned {
        RepositoryRef::user(domain, owner, args.name.as_str())
    } else {
        RepositoryRef::organization(domain, owner, args.name.as_str())
    })
}

fn owner_or_default<'a>(owner: Option<&'a str>, default_owner: Option<&'a str>) -> Result<&'a str> {
    match owner.or(default_owner) {
        Some(owner) if !owner.trim().is_empty() => Ok(owner),
        _ => bail!("no repository owner given (--owner, or --organization as the default)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_falls_back_to_the_organization() {
        assert_eq!(owner_or_default(Some("me"), Some("acme")).unwrap(), "me");
        assert_eq!(owner_or_default(None, Some("acme")).unwrap(), "acme");
        assert!(owner_or_default(None, None).is_err());
        assert!(owner_or_default(Some(" "), None).is_err());
    }
}
