//! Builds a data protection policy JSON document from typed arguments.
//! Nothing is sent to the service.

use serde::{Deserialize, Serialize};

use crate::v1::{
    aws::{AwsDataSource, AwsDataSourceReader},
    conns::AwsClient,
    manager::ManagerError,
};

const DEFAULT_VERSION: &str = "2021-06-01";

#[derive(Debug, Deserialize)]
pub struct DocumentArgs {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    pub statement: Vec<StatementArgs>,
}

#[derive(Debug, Deserialize)]
pub struct StatementArgs {
    #[serde(default)]
    pub sid: Option<String>,
    pub data_identifiers: Vec<String>,
    pub operation: OperationArgs,
}

#[derive(Debug, Default, Deserialize)]
pub struct OperationArgs {
    #[serde(default)]
    pub audit: Option<AuditArgs>,
    #[serde(default)]
    pub deidentify: Option<DeidentifyArgs>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuditArgs {
    pub findings_destination: FindingsDestinationArgs,
}

#[derive(Debug, Default, Deserialize)]
pub struct FindingsDestinationArgs {
    #[serde(default)]
    pub cloudwatch_logs: Option<LogGroupTarget>,
    #[serde(default)]
    pub firehose: Option<FirehoseTarget>,
    #[serde(default)]
    pub s3: Option<BucketTarget>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all(serialize = "PascalCase"))]
pub struct LogGroupTarget {
    pub log_group: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all(serialize = "PascalCase"))]
pub struct FirehoseTarget {
    pub delivery_stream: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all(serialize = "PascalCase"))]
pub struct BucketTarget {
    pub bucket: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeidentifyArgs {
    #[serde(default)]
    pub mask_config: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Document<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    version: &'a str,
    statement: Vec<Statement<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Statement<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    sid: Option<&'a str>,
    data_identifier: &'a [String],
    operation: Operation<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Operation<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    audit: Option<Audit<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deidentify: Option<Deidentify>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Audit<'a> {
    findings_destination: FindingsDestination<'a>,
}

#[derive(Serialize)]
struct FindingsDestination<'a> {
    #[serde(rename = "CloudWatchLogs", skip_serializing_if = "Option::is_none")]
    cloudwatch_logs: Option<&'a LogGroupTarget>,
    #[serde(rename = "Firehose", skip_serializing_if = "Option::is_none")]
    firehose: Option<&'a FirehoseTarget>,
    #[serde(rename = "S3", skip_serializing_if = "Option::is_none")]
    s3: Option<&'a BucketTarget>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Deidentify {
    mask_config: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableDocument {
    pub json: String,
}

pub type DataProtectionPolicyDocument = AwsDataSource<DocumentArgs, SerializableDocument>;

impl AwsDataSourceReader for DataProtectionPolicyDocument {
    type Args = DocumentArgs;
    type Output = SerializableDocument;
    fn r#type() -> &'static str {
        "aws_cloudwatch_log_data_protection_policy_document"
    }
    fn read(_client: &AwsClient, args: &Self::Args) -> Result<Self::Output, ManagerError> {
        build_document(args).map(|json| SerializableDocument { json })
    }
}

pub fn build_document(args: &DocumentArgs) -> Result<String, ManagerError> {
    if args.statement.len() < 2 {
        return Err(ManagerError::InvalidInput(
            "a data protection policy needs an audit and a de-identify statement".to_string(),
        ));
    }
    let statement = args
        .statement
        .iter()
        .map(|s| {
            if s.data_identifiers.is_empty() {
                return Err(ManagerError::InvalidInput(
                    "statement data_identifiers must not be empty".to_string(),
                ));
            }
            Ok(Statement {
                sid: s.sid.as_deref(),
                data_identifier: &s.data_identifiers,
                operation: Operation {
                    audit: s.operation.audit.as_ref().map(|audit| Audit {
                        findings_destination: FindingsDestination {
                            cloudwatch_logs: audit.findings_destination.cloudwatch_logs.as_ref(),
                            firehose: audit.findings_destination.firehose.as_ref(),
                            s3: audit.findings_destination.s3.as_ref(),
                        },
                    }),
                    deidentify: s.operation.deidentify.as_ref().map(|d| Deidentify {
                        mask_config: d.mask_config.clone().unwrap_or_default(),
                    }),
                },
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let document = Document {
        name: &args.name,
        description: args.description.as_deref(),
        version: args.version.as_deref().unwrap_or(DEFAULT_VERSION),
        statement,
    };
    serde_json::to_string(&document).map_err(|e| ManagerError::InvalidInput(e.to_string()))
}
