//! Backend selection.
//!
//! The neutral client is generic over its driver; [`Backend`] is the tagged
//! union that lets the binary pick one at run time.

use anyhow::{bail, Context, Result};
use azure::AzureDriver;
use bitbucket::BitbucketDriver;
use gitea::GiteaDriver;
use gitprovider::Client;
use serde_json::Value;
use tracing::info;

use crate::commands;
use crate::config::{Command, ConnectionConfig, ProviderKind};

pub enum Backend {
    Azure(Client<AzureDriver>),
    Gitea(Client<GiteaDriver>),
    Bitbucket(Client<BitbucketDriver>),
}

impl Backend {
    /// Builds the driver for `config.kind`. Settings the kind requires are
    /// checked here, before any request is made.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let token = config.token.as_deref();
        let backend = match config.kind {
            None => bail!("no backend kind configured (--kind or GIT_KIND)"),
            Some(ProviderKind::Azure) => {
                let organization = required(&config.organization, "--organization", "GIT_ORGANIZATION")?;
                let project = required(&config.project, "--project", "GIT_PROJECT")?;
                let server = config.server.as_deref().unwrap_or(azure::DEFAULT_SERVER);
                let driver = AzureDriver::new(server, organization, project, token)
                    .with_context(|| format!("invalid Azure DevOps server '{server}'"))?;
                Backend::Azure(Client::new(driver))
            }
            Some(ProviderKind::Gitea) => {
                let server = required(&config.server, "--server", "GIT_SERVER")?;
                let driver = GiteaDriver::new(server, token)
                    .with_context(|| format!("invalid Gitea server '{server}'"))?;
                Backend::Gitea(Client::new(driver))
            }
            Some(ProviderKind::Bitbucket) => {
                let server = config.server.as_deref().unwrap_or(bitbucket::DEFAULT_SERVER);
                let driver = BitbucketDriver::new(server, config.user.as_deref(), token)
                    .with_context(|| format!("invalid Bitbucket API root '{server}'"))?;
                Backend::Bitbucket(Client::new(driver))
            }
        };
        info!(provider = %backend.provider_id(), domain = backend.domain(), "backend selected");
        Ok(backend)
    }

    pub fn provider_id(&self) -> gitprovider::ProviderId {
        match self {
            Backend::Azure(client) => client.provider_id(),
            Backend::Gitea(client) => client.provider_id(),
            Backend::Bitbucket(client) => client.provider_id(),
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            Backend::Azure(client) => client.supported_domain(),
            Backend::Gitea(client) => client.supported_domain(),
            Backend::Bitbucket(client) => client.supported_domain(),
        }
    }

    /// Runs `command` and returns its JSON output.
    pub async fn run(&self, command: &Command, default_owner: Option<&str>) -> Result<Value> {
        match self {
            Backend::Azure(client) => commands::run(client, command, default_owner).await,
            Backend::Gitea(client) => commands::run(client, command, default_owner).await,
            Backend::Bitbucket(client) => commands::run(client, command, default_owner).await,
        }
    }
}

fn required<'c>(value: &'c Option<String>, flag: &str, env: &str) -> Result<&'c str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("{flag} ({env}) is required for this backend"),
    }
}
