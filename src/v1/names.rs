use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString};

/// Sub-services known to the provider.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    EnumIter,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ServicePackageName {
    DataSync,
    Logs,
    OpenSearchServerless,
}

impl ServicePackageName {
    /// Endpoint prefix used by the vendor's default endpoint resolution.
    pub fn endpoint_id(&self) -> &'static str {
        match self {
            ServicePackageName::DataSync => "datasync",
            ServicePackageName::Logs => "logs",
            ServicePackageName::OpenSearchServerless => "aoss",
        }
    }

    /// Environment variable that overrides this package's endpoint.
    pub fn endpoint_env_var(&self) -> String {
        format!("RSPROVIDER_ENDPOINT_{}", self.to_string().to_uppercase())
    }
}

pub const DEFAULT_DNS_SUFFIX: &str = "amazonaws.com";
pub const CHINA_DNS_SUFFIX: &str = "amazonaws.com.cn";

pub fn dns_suffix(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        CHINA_DNS_SUFFIX
    } else {
        DEFAULT_DNS_SUFFIX
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn names_round_trip_through_strings() {
        assert_eq!(ServicePackageName::Logs.to_string(), "logs");
        assert_eq!(
            ServicePackageName::from_str("OpenSearchServerless").unwrap(),
            ServicePackageName::OpenSearchServerless
        );
        assert!(ServicePackageName::from_str("ec2").is_err());
    }

    #[test]
    fn endpoint_env_var_is_upper_case() {
        assert_eq!(
            ServicePackageName::DataSync.endpoint_env_var(),
            "RSPROVIDER_ENDPOINT_DATASYNC"
        );
    }

    #[test]
    fn china_regions_use_their_own_suffix() {
        assert_eq!(dns_suffix("cn-north-1"), CHINA_DNS_SUFFIX);
        assert_eq!(dns_suffix("eu-west-1"), DEFAULT_DNS_SUFFIX);
    }
}
