use serde::{Deserialize, Serialize};

use super::trim_log_group_arn;
use crate::v1::{
    aws::{AwsDataSource, AwsDataSourceReader},
    conns::AwsClient,
    manager::ManagerError,
};

#[derive(Debug, Default, Deserialize)]
pub struct LogGroupsArgs {
    #[serde(default)]
    pub log_group_name_prefix: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableLogGroups {
    pub id: String,
    pub arns: Vec<String>,
    pub log_group_names: Vec<String>,
}

pub type LogGroups = AwsDataSource<LogGroupsArgs, SerializableLogGroups>;

impl AwsDataSourceReader for LogGroups {
    type Args = LogGroupsArgs;
    type Output = SerializableLogGroups;
    fn r#type() -> &'static str {
        "aws_cloudwatch_log_groups"
    }
    fn read(client: &AwsClient, args: &Self::Args) -> Result<Self::Output, ManagerError> {
        let conn = client.logs_client();
        client.handle().block_on(async {
            let mut output = SerializableLogGroups {
                id: client.region().to_string(),
                ..Default::default()
            };
            let mut next_token = None;
            loop {
                let response = conn
                    .describe_log_groups()
                    .set_log_group_name_prefix(args.log_group_name_prefix.clone())
                    .set_next_token(next_token)
                    .send()
                    .await
                    .map_err(|e| ManagerError::LookupFail(format!("{:?}", e.into_source())))?;
                for group in response.log_groups.unwrap_or_default() {
                    if let Some(arn) = group.arn {
                        output.arns.push(trim_log_group_arn(&arn).to_string());
                    }
                    if let Some(name) = group.log_group_name {
                        output.log_group_names.push(name);
                    }
                }
                match response.next_token {
                    Some(token) => next_token = Some(token),
                    None => break,
                }
            }
            Ok(output)
        })
    }
}
