use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    Absent,
    #[default]
    Present,
}

/// One desired object as written in the configuration file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResourceConfig {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub depends_on: HashSet<String>,
    #[serde(default)]
    pub state: ResourceState,
    #[serde(default)]
    pub config: Value,
}

impl ResourceConfig {
    pub fn new(type_name: impl ToString, name: impl ToString, config: Value) -> Self {
        Self {
            type_name: type_name.to_string(),
            name: name.to_string(),
            depends_on: HashSet::new(),
            state: ResourceState::Present,
            config,
        }
    }

    pub fn depends_on(mut self, address: impl ToString) -> Self {
        self.depends_on.insert(address.to_string());
        self
    }

    pub fn absent(mut self) -> Self {
        self.state = ResourceState::Absent;
        self
    }

    /// `type.name`, unique within a configuration.
    pub fn address(&self) -> String {
        address(&self.type_name, &self.name)
    }
}

pub fn address(type_name: &str, name: &str) -> String {
    format!("{}.{}", type_name, name)
}

/// What the provider knows about one managed object after the last apply,
/// refresh or import.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StateRecord {
    pub address: String,
    pub type_name: String,
    pub id: String,
    /// Configuration the object was last applied with.
    pub input: Value,
    /// Attributes last read back from the service.
    pub output: Value,
    #[serde(default)]
    pub dependencies: HashSet<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataSourceConfig {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn config_file_shape() {
        let resource: ResourceConfig = serde_json::from_value(json!({
            "type": "aws_datasync_location_s3",
            "name": "test",
            "depends_on": ["aws_cloudwatch_log_group.app"],
            "config": {"subdirectory": "/test"}
        }))
        .unwrap();
        assert_eq!(resource.address(), "aws_datasync_location_s3.test");
        assert_eq!(resource.state, ResourceState::Present);
        assert!(resource.depends_on.contains("aws_cloudwatch_log_group.app"));

        let absent: ResourceConfig = serde_json::from_value(json!({
            "type": "aws_cloudwatch_log_group", "name": "app", "state": "absent"
        }))
        .unwrap();
        assert_eq!(absent.state, ResourceState::Absent);
        assert_eq!(absent.config, Value::Null);
    }
}
