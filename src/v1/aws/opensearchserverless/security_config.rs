use std::sync::Arc;

use aws_sdk_opensearchserverless::{
    types::{SamlConfigOptions, SecurityConfigDetail, SecurityConfigType},
    Client,
};
use serde::{Deserialize, Serialize};

use crate::v1::{
    aws::{AwsManager, AwsResource, AwsResourceCreator},
    conns::AwsClient,
    manager::{not_found_as_none, ManagerError, ResourceManager},
};

pub type SecurityConfigInput = SerializableCreateSecurityConfigInput;
pub type SecurityConfigOutput = SerializableSecurityConfig;
pub type SecurityConfigManager = AwsManager<SecurityConfigInput, SecurityConfigOutput, Client>;
pub type SecurityConfig = AwsResource<SecurityConfigInput, SecurityConfigOutput>;

impl AwsResourceCreator for SecurityConfig {
    type Input = SecurityConfigInput;
    type Output = SecurityConfigOutput;
    fn r#type() -> &'static str {
        "aws_opensearchserverless_security_config"
    }
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>> {
        SecurityConfigManager::new(client, client.opensearchserverless_client()).arc()
    }
    fn resource_id(output: &Self::Output) -> String {
        output.id.clone()
    }
    fn needs_replace(latest: &Self::Input, input: &Self::Input) -> bool {
        latest.name != input.name || latest.r#type != input.r#type
    }
    fn fill_computed(prior: &Self::Input, input: &mut Self::Input) {
        if input.saml_options.session_timeout.is_none() {
            input.saml_options.session_timeout = prior.saml_options.session_timeout;
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableSamlOptions {
    pub metadata: String,
    #[serde(default)]
    pub group_attribute: Option<String>,
    #[serde(default)]
    pub user_attribute: Option<String>,
    #[serde(default)]
    pub session_timeout: Option<i32>,
}

impl TryFrom<&SerializableSamlOptions> for SamlConfigOptions {
    type Error = ManagerError;
    fn try_from(value: &SerializableSamlOptions) -> Result<Self, Self::Error> {
        SamlConfigOptions::builder()
            .metadata(&value.metadata)
            .set_group_attribute(value.group_attribute.clone())
            .set_user_attribute(value.user_attribute.clone())
            .set_session_timeout(value.session_timeout)
            .build()
            .map_err(|e| ManagerError::InvalidInput(e.to_string()))
    }
}

impl From<SamlConfigOptions> for SerializableSamlOptions {
    fn from(value: SamlConfigOptions) -> Self {
        Self {
            metadata: value.metadata,
            group_attribute: value.group_attribute,
            user_attribute: value.user_attribute,
            session_timeout: value.session_timeout,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableCreateSecurityConfigInput {
    pub name: String,
    #[serde(default = "default_type")]
    pub r#type: String,
    pub saml_options: SerializableSamlOptions,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_type() -> String {
    SecurityConfigType::Saml.as_str().to_string()
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableSecurityConfig {
    pub id: String,
    pub name: String,
    pub r#type: String,
    pub saml_options: SerializableSamlOptions,
    pub description: Option<String>,
    pub config_version: Option<String>,
}

impl From<SecurityConfigDetail> for SerializableSecurityConfig {
    fn from(value: SecurityConfigDetail) -> Self {
        let id = value.id.unwrap_or_default();
        Self {
            // Identifiers look like `saml/<account>/<name>`.
            name: id.rsplit('/').next().unwrap_or_default().to_string(),
            id,
            r#type: value
                .r#type
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            saml_options: value.saml_options.map(Into::into).unwrap_or_default(),
            description: value.description.filter(|d| !d.is_empty()),
            config_version: value.config_version,
        }
    }
}

impl ResourceManager<SecurityConfigInput, SecurityConfigOutput> for SecurityConfigManager {
    fn lookup(&self, id: &str) -> Result<Option<SecurityConfigOutput>, ManagerError> {
        let response = self.handle.block_on(async {
            self.client
                .get_security_config()
                .id(id)
                .send()
                .await
                .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))
        });
        not_found_as_none(response, super::NOT_FOUND)
            .map(|response| response.and_then(|r| r.security_config_detail).map(Into::into))
    }
    fn create(&self, input: &mut SecurityConfigInput) -> Result<SecurityConfigOutput, ManagerError> {
        let saml_options = SamlConfigOptions::try_from(&input.saml_options)?;
        self.handle.block_on(async {
            self.client
                .create_security_config()
                .name(&input.name)
                .r#type(SecurityConfigType::from(input.r#type.as_str()))
                .saml_options(saml_options)
                .set_description(input.description.clone())
                .send()
                .await
                .map_err(|e| ManagerError::CreateFail(format!("{:?}", e.into_source())))
                .and_then(|response| {
                    response.security_config_detail.map(Into::into).ok_or(
                        ManagerError::CreateFail("Security config not returned".to_string()),
                    )
                })
        })
    }
    fn delete(&self, latest: &SecurityConfigOutput) -> Result<bool, ManagerError> {
        self.handle.block_on(async {
            self.client
                .delete_security_config()
                .id(&latest.id)
                .send()
                .await
                .map_err(|e| ManagerError::DeleteFail(format!("{:?}", e.into_source())))
                .map(|_| true)
        })
    }
    fn syncup(
        &self,
        latest: &SecurityConfigOutput,
        input: &mut SecurityConfigInput,
    ) -> Result<Option<SecurityConfigOutput>, ManagerError> {
        if latest.saml_options == input.saml_options && latest.description == input.description {
            return Ok(None);
        }
        let saml_options = SamlConfigOptions::try_from(&input.saml_options)?;
        self.handle.block_on(async {
            self.client
                .update_security_config()
                .id(&latest.id)
                .set_config_version(latest.config_version.clone())
                .saml_options(saml_options)
                .set_description(input.description.clone())
                .send()
                .await
                .map_err(|e| ManagerError::UpdateFail(format!("{:?}", e.into_source())))
                .map(|response| response.security_config_detail.map(Into::into))
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::v1::handler::ResourceHandler;

    #[test]
    fn service_session_timeout_is_not_a_change() {
        let handler = SecurityConfig::default();
        let observed = json!({
            "name": "okta",
            "saml_options": {"metadata": "<xml/>", "session_timeout": 60}
        });
        let config = json!({"name": "okta", "saml_options": {"metadata": "<xml/>"}});
        assert!(!handler.has_changes(&observed, &config).unwrap());

        let config = json!({
            "name": "okta",
            "saml_options": {"metadata": "<xml/>", "session_timeout": 90}
        });
        assert!(handler.has_changes(&observed, &config).unwrap());
        assert!(!handler.requires_replace(&observed, &config).unwrap());
    }

    #[test]
    fn name_comes_from_identifier() {
        let detail = SecurityConfigDetail::builder()
            .id("saml/123456789012/okta")
            .r#type(SecurityConfigType::Saml)
            .saml_options(
                SamlConfigOptions::builder()
                    .metadata("<xml/>")
                    .build()
                    .unwrap(),
            )
            .build();
        let config: SerializableSecurityConfig = detail.into();
        assert_eq!(config.name, "okta");
        assert_eq!(config.r#type, "saml");
        assert_eq!(config.saml_options.metadata, "<xml/>");
    }
}
