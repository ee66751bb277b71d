use std::{collections::HashMap, env, str::FromStr};

use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use thiserror::Error;
use tokio::runtime::Handle;
use url::Url;

use super::{
    aws::{datasync, logs, opensearchserverless},
    names::{dns_suffix, ServicePackageName},
};

/// Provider block of the configuration file. Every field may also come from
/// the environment.
#[derive(Default, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub token: Option<String>,
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    DefaultChain,
    Profile(String),
    Static {
        access_key: String,
        secret_key: String,
        token: Option<String>,
    },
}

impl ProviderConfig {
    /// Fills whatever the configuration file left unset from the environment.
    pub fn with_env_defaults(mut self) -> Self {
        if self.region.is_none() {
            self.region = env::var("AWS_REGION")
                .or_else(|_| env::var("AWS_DEFAULT_REGION"))
                .ok();
        }
        if self.profile.is_none() && self.access_key.is_none() {
            self.profile = env::var("AWS_PROFILE").ok();
        }
        for package in ServicePackageName::iter() {
            if let Ok(endpoint) = env::var(package.endpoint_env_var()) {
                self.endpoints
                    .entry(package.to_string())
                    .or_insert(endpoint);
            }
        }
        self
    }

    pub fn credential_source(&self) -> Result<CredentialSource, ConnsError> {
        match (&self.access_key, &self.secret_key) {
            (Some(access_key), Some(secret_key)) => Ok(CredentialSource::Static {
                access_key: access_key.clone(),
                secret_key: secret_key.clone(),
                token: self.token.clone(),
            }),
            (None, None) => Ok(self
                .profile
                .clone()
                .map(CredentialSource::Profile)
                .unwrap_or(CredentialSource::DefaultChain)),
            _ => Err(ConnsError::IncompleteCredentials),
        }
    }

    pub fn validated_endpoints(
        &self,
    ) -> Result<HashMap<ServicePackageName, String>, ConnsError> {
        self.endpoints
            .iter()
            .try_fold(HashMap::new(), |mut acc, (package, endpoint)| {
                let package = ServicePackageName::from_str(package)
                    .map_err(|_| ConnsError::UnknownServicePackage(package.clone()))?;
                if let Some(endpoint) = validate_endpoint(endpoint)? {
                    acc.insert(package, endpoint);
                }
                Ok(acc)
            })
    }

    /// Resolves the configuration into the host meta value. All validation of
    /// ambient configuration happens here, once.
    pub fn load(&self, handle: &Handle) -> Result<AwsClient, ConnsError> {
        let region = self
            .region
            .clone()
            .filter(|r| !r.is_empty())
            .ok_or(ConnsError::MissingRegion)?;
        let endpoints = self.validated_endpoints()?;
        let source = self.credential_source()?;
        tracing::debug!("Loading AWS configuration for region {}", region);
        let sdk_config = handle.block_on(async move {
            let loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region));
            let loader = match source {
                CredentialSource::DefaultChain => loader,
                CredentialSource::Profile(name) => loader.profile_name(name),
                CredentialSource::Static {
                    access_key,
                    secret_key,
                    token,
                } => loader.credentials_provider(Credentials::new(
                    access_key,
                    secret_key,
                    token,
                    None,
                    "rsprovider",
                )),
            };
            loader.load().await
        });
        AwsClient::new(handle, sdk_config, endpoints)
    }
}

/// Empty endpoints mean "use default resolution"; anything else must be an
/// absolute http(s) URL.
pub fn validate_endpoint(endpoint: &str) -> Result<Option<String>, ConnsError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Ok(None);
    }
    let url = Url::parse(endpoint)
        .map_err(|e| ConnsError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(Some(endpoint.to_string())),
        _ => Err(ConnsError::InvalidEndpoint(endpoint.to_string())),
    }
}

/// Ambient configuration handed to a client factory.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    sdk_config: SdkConfig,
    region: String,
    endpoint: Option<String>,
}

impl ClientConfig {
    pub fn new(sdk_config: SdkConfig, endpoint: Option<&str>) -> Result<Self, ConnsError> {
        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .ok_or(ConnsError::MissingRegion)?;
        let endpoint = match endpoint {
            Some(endpoint) => validate_endpoint(endpoint)?,
            None => None,
        };
        Ok(Self {
            sdk_config,
            region,
            endpoint,
        })
    }

    pub fn sdk_config(&self) -> &SdkConfig {
        &self.sdk_config
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// The endpoint override, if one was configured.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Where requests of `package` are sent.
    pub fn resolved_endpoint(&self, package: ServicePackageName) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!(
                "https://{}.{}.{}",
                package.endpoint_id(),
                self.region,
                dns_suffix(&self.region)
            ),
        }
    }
}

/// Host meta value shared by every handler call.
#[derive(Clone)]
pub struct AwsClient {
    handle: Handle,
    sdk_config: SdkConfig,
    region: String,
    endpoints: HashMap<ServicePackageName, String>,
}

impl AwsClient {
    pub fn new(
        handle: &Handle,
        sdk_config: SdkConfig,
        endpoints: HashMap<ServicePackageName, String>,
    ) -> Result<Self, ConnsError> {
        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .ok_or(ConnsError::MissingRegion)?;
        Ok(Self {
            handle: handle.clone(),
            sdk_config,
            region,
            endpoints,
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn client_config(&self, package: ServicePackageName) -> ClientConfig {
        ClientConfig {
            sdk_config: self.sdk_config.clone(),
            region: self.region.clone(),
            endpoint: self.endpoints.get(&package).cloned(),
        }
    }

    pub fn datasync_conn(&self) -> aws_sdk_datasync::Client {
        datasync::ServicePackage.new_conn(&self.client_config(ServicePackageName::DataSync))
    }

    pub fn logs_conn(&self) -> aws_sdk_cloudwatchlogs::Client {
        logs::ServicePackage.new_conn(&self.client_config(ServicePackageName::Logs))
    }

    pub fn logs_client(&self) -> aws_sdk_cloudwatchlogs::Client {
        logs::ServicePackage.new_client(&self.client_config(ServicePackageName::Logs))
    }

    pub fn opensearchserverless_client(&self) -> aws_sdk_opensearchserverless::Client {
        opensearchserverless::ServicePackage.new_client(
            &self.client_config(ServicePackageName::OpenSearchServerless),
        )
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnsError {
    #[error("MissingRegion: no region configured")]
    MissingRegion,
    #[error("InvalidEndpoint: {0}")]
    InvalidEndpoint(String),
    #[error("UnknownServicePackage: {0}")]
    UnknownServicePackage(String),
    #[error("IncompleteCredentials: access_key and secret_key must be set together")]
    IncompleteCredentials,
}
