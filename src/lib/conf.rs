/// Defines what makes for a valid deployment context
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::buildspec::BuildSpec;
use crate::stack::Environment;
use crate::utils::{ensure_arn, ensure_present};


#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
/// Represents an entire `bloginfra.toml`
pub struct PlatformConfig {
    pub environment: EnvironmentConfig,
    pub dns: DnsConfig,
    pub certificates: CertificatesConfig,
    pub notifications: NotificationsConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub deploy: DeployConfig,
    pub backend: BackendConfig,
}

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
pub struct EnvironmentConfig {
    pub account: String,
    pub region: String,
}

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
pub struct DnsConfig {
    pub zone_name: String,
    pub zone_id: String,
}

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
/// TLS certificates referenced by ARN; they are created out of band
pub struct CertificatesConfig {
    pub apex: String,
    pub auth: String,
}

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
pub struct NotificationsConfig {
    pub channel_arn: String,
}

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
/// Where the sources live and how to read them
pub struct SourceConfig {
    pub owner: String,
    pub website_repository: String,
    pub infrastructure_repository: String,
    pub branch: String,
    /// name of the secret holding the access token, resolved at deploy time
    pub credential_secret: String,
}

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Default)]
pub struct DeployConfig {
    /// optional override for the website deploy destination key
    pub destination_key: Option<String>,
    /// optional path to a custom build spec for the website build
    pub build_spec: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq)]
pub struct BackendConfig {
    pub repository: String,
    pub handler: String,
    /// key the function bundle is published under
    pub lambda_output_key: String,
    /// key the generated API definition is extracted under
    pub api_definition_key: String,
}

impl PlatformConfig {
    pub fn from_file(path: &Path) -> Result<PlatformConfig> {
        let mut s = String::new();
        let mut f = File::open(path)
            .with_context(|| format!("could not open context file {}", path.display()))?;
        f.read_to_string(&mut s)?;
        let config: PlatformConfig = toml::from_str(&s)?;
        config.validate()?;
        Ok(config)
    }

    /// Every required field must carry a value; ARNs must look like ARNs
    pub fn validate(&self) -> Result<()> {
        ensure_present("account", &self.environment.account)?;
        ensure_present("region", &self.environment.region)?;
        ensure_present("zone name", &self.dns.zone_name)?;
        ensure_present("zone id", &self.dns.zone_id)?;
        ensure_arn("apex certificate", &self.certificates.apex)?;
        ensure_arn("auth certificate", &self.certificates.auth)?;
        ensure_arn("notification channel", &self.notifications.channel_arn)?;
        ensure_present("repository owner", &self.source.owner)?;
        ensure_present("website repository", &self.source.website_repository)?;
        ensure_present(
            "infrastructure repository",
            &self.source.infrastructure_repository,
        )?;
        ensure_present("target branch", &self.source.branch)?;
        ensure_present("credential secret", &self.source.credential_secret)?;
        if let Some(key) = &self.deploy.destination_key {
            ensure_present("deploy destination key", key)?;
        }
        ensure_present("backend repository", &self.backend.repository)?;
        ensure_present("backend handler", &self.backend.handler)?;
        ensure_present("lambda output key", &self.backend.lambda_output_key)?;
        ensure_present("api definition key", &self.backend.api_definition_key)?;
        Ok(())
    }

    pub fn environment(&self) -> Environment {
        Environment {
            account: self.environment.account.clone(),
            region: self.environment.region.clone(),
        }
    }

    /// Loads the custom website build spec when one is configured
    pub fn primary_build_spec(&self) -> Result<Option<BuildSpec>> {
        match &self.deploy.build_spec {
            None => Ok(None),
            Some(p) => {
                let mut s = String::new();
                let mut f = File::open(p)
                    .with_context(|| format!("could not open build spec file {}", p))?;
                f.read_to_string(&mut s)?;
                let spec = BuildSpec::from_yaml(&s)
                    .with_context(|| format!("could not parse build spec file {}", p))?;
                Ok(Some(spec))
            }
        }
    }
}
