mod common;

use std::collections::HashSet;

use common::{json_response, sdk_config, target, TestEnv};
use rsprovider::{
    prelude::*,
    v1::aws::{datasync, logs, opensearchserverless},
};
use serde_json::json;
use wiremock::{
    matchers::{header, method},
    Mock,
};

#[test]
fn type_names_are_unique_across_the_provider() {
    let mut resources = HashSet::new();
    let mut data_sources = HashSet::new();
    for package in service_packages() {
        for descriptor in package
            .framework_resources()
            .iter()
            .chain(package.sdk_resources())
        {
            assert!(resources.insert(descriptor.type_name), "{}", descriptor.type_name);
        }
        for descriptor in package
            .framework_data_sources()
            .iter()
            .chain(package.sdk_data_sources())
        {
            assert!(data_sources.insert(descriptor.type_name), "{}", descriptor.type_name);
        }
    }
    assert_eq!(resources.len(), 15);
    assert_eq!(data_sources.len(), 3);
}

#[test]
fn factories_build_the_declared_type() {
    for package in service_packages() {
        for descriptor in package
            .framework_resources()
            .iter()
            .chain(package.sdk_resources())
        {
            assert_eq!((descriptor.factory)().type_name(), descriptor.type_name);
        }
        for descriptor in package
            .framework_data_sources()
            .iter()
            .chain(package.sdk_data_sources())
        {
            assert_eq!((descriptor.factory)().type_name(), descriptor.type_name);
        }
    }
}

#[test]
fn tables_keep_declaration_order() {
    let names = |descriptors: &[rsprovider::v1::types::ResourceDescriptor]| {
        descriptors.iter().map(|d| d.type_name).collect::<Vec<_>>()
    };
    assert_eq!(
        names(logs::ServicePackage.sdk_resources()),
        vec![
            "aws_cloudwatch_log_data_protection_policy",
            "aws_cloudwatch_log_destination",
            "aws_cloudwatch_log_destination_policy",
            "aws_cloudwatch_log_group",
            "aws_cloudwatch_log_metric_filter",
            "aws_cloudwatch_log_resource_policy",
            "aws_cloudwatch_log_stream",
            "aws_cloudwatch_log_subscription_filter",
            "aws_cloudwatch_query_definition",
        ]
    );
    assert_eq!(
        logs::ServicePackage
            .sdk_data_sources()
            .iter()
            .map(|d| d.type_name)
            .collect::<Vec<_>>(),
        vec![
            "aws_cloudwatch_log_data_protection_policy_document",
            "aws_cloudwatch_log_group",
            "aws_cloudwatch_log_groups",
        ]
    );
    assert!(logs::ServicePackage.framework_resources().is_empty());
    assert_eq!(
        names(opensearchserverless::ServicePackage.framework_resources()),
        vec![
            "aws_opensearchserverless_access_policy",
            "aws_opensearchserverless_collection",
            "aws_opensearchserverless_security_config",
            "aws_opensearchserverless_security_policy",
            "aws_opensearchserverless_vpc_endpoint",
        ]
    );
    assert!(opensearchserverless::ServicePackage.sdk_resources().is_empty());
    assert_eq!(
        names(datasync::ServicePackage.sdk_resources()),
        vec!["aws_datasync_location_s3"]
    );
    assert!(datasync::ServicePackage.framework_data_sources().is_empty());
    assert!(datasync::ServicePackage.sdk_data_sources().is_empty());
}

#[test]
fn descriptor_metadata() {
    let location = &datasync::ServicePackage.sdk_resources()[0];
    assert_eq!(location.name, Some("Location S3"));
    assert_eq!(location.tags.and_then(|t| t.identifier_attribute), Some("id"));

    let group = logs::ServicePackage
        .sdk_resources()
        .iter()
        .find(|d| d.type_name == "aws_cloudwatch_log_group")
        .unwrap();
    assert_eq!(group.name, Some("Log Group"));
    assert!(group.tags.is_some());
    assert_eq!(group.tags.and_then(|t| t.identifier_attribute), None);

    let collection = &opensearchserverless::ServicePackage.framework_resources()[1];
    assert_eq!(collection.name, Some("Collection"));
    assert_eq!(
        collection.tags.and_then(|t| t.identifier_attribute),
        Some("arn")
    );
}

#[test]
fn endpoint_override_routes_every_factory_to_the_override() {
    let env = TestEnv::new();
    env.mount(
        Mock::given(method("POST"))
            .and(header("x-amz-target", "Logs_20140328.DescribeLogGroups"))
            .respond_with(json_response(
                200,
                json!({"logGroups": [{
                    "logGroupName": "app",
                    "arn": "arn:aws:logs:us-west-2:123456789012:log-group:app:*"
                }]}),
            )),
    );
    env.mount(
        Mock::given(method("POST"))
            .and(header("x-amz-target", "FmrsService.ListLocations"))
            .respond_with(json_response(200, json!({"Locations": []}))),
    );
    env.mount(
        Mock::given(method("POST"))
            .and(header("x-amz-target", "OpenSearchServerless.ListCollections"))
            .respond_with(json_response(200, json!({"collectionSummaries": []}))),
    );
    let config = ClientConfig::new(sdk_config(), Some(&env.server.uri())).unwrap();

    for conn in [
        logs::ServicePackage.new_conn(&config),
        logs::ServicePackage.new_client(&config),
    ] {
        let response = env.rt.block_on(conn.describe_log_groups().send()).unwrap();
        assert_eq!(response.log_groups().len(), 1);
    }
    env.rt
        .block_on(datasync::ServicePackage.new_conn(&config).list_locations().send())
        .unwrap();
    env.rt
        .block_on(
            opensearchserverless::ServicePackage
                .new_client(&config)
                .list_collections()
                .send(),
        )
        .unwrap();

    let received = env.rt.block_on(env.server.received_requests()).unwrap();
    let targets: Vec<String> = received.iter().filter_map(target).collect();
    assert_eq!(
        targets,
        vec![
            "Logs_20140328.DescribeLogGroups",
            "Logs_20140328.DescribeLogGroups",
            "FmrsService.ListLocations",
            "OpenSearchServerless.ListCollections",
        ]
    );
}

#[test]
fn empty_override_keeps_the_vendor_endpoint() {
    let config = ClientConfig::new(sdk_config(), Some("")).unwrap();
    assert_eq!(config.endpoint(), None);
    assert_eq!(
        config.resolved_endpoint(ServicePackageName::DataSync),
        "https://datasync.us-west-2.amazonaws.com"
    );
    assert_eq!(logs::ServicePackage.new_conn(&config).config().endpoint_url(), None);
    assert_eq!(logs::ServicePackage.new_client(&config).config().endpoint_url(), None);
    assert_eq!(datasync::ServicePackage.new_conn(&config).config().endpoint_url(), None);
    assert_eq!(
        opensearchserverless::ServicePackage
            .new_client(&config)
            .config()
            .endpoint_url(),
        None
    );

    let config = ClientConfig::new(sdk_config(), Some("http://localhost:4566")).unwrap();
    assert_eq!(
        logs::ServicePackage.new_conn(&config).config().endpoint_url(),
        Some("http://localhost:4566")
    );
    assert_eq!(
        opensearchserverless::ServicePackage
            .new_client(&config)
            .config()
            .endpoint_url(),
        Some("http://localhost:4566")
    );
    assert!(matches!(
        ClientConfig::new(sdk_config(), Some("ftp://localhost")),
        Err(ConnsError::InvalidEndpoint(_))
    ));
}

#[test]
fn data_sources_read_through_the_host_client() {
    let env = TestEnv::new();
    env.mount(
        Mock::given(method("POST"))
            .and(header("x-amz-target", "Logs_20140328.DescribeLogGroups"))
            .respond_with(json_response(
                200,
                json!({"logGroups": [
                    {"logGroupName": "app", "arn": "arn:aws:logs:us-west-2:123456789012:log-group:app:*"},
                    {"logGroupName": "web", "arn": "arn:aws:logs:us-west-2:123456789012:log-group:web:*"}
                ]}),
            )),
    );
    let client = env.client(ServicePackageName::Logs);
    let dir = tempfile::tempdir().unwrap();
    let cloud = common::cloud(&client, &dir.path().join("state"), vec![]);

    let groups = cloud
        .read_data_source("aws_cloudwatch_log_groups", &serde_json::Value::Null)
        .unwrap();
    assert_eq!(groups["log_group_names"], json!(["app", "web"]));
    assert_eq!(
        groups["arns"][0],
        json!("arn:aws:logs:us-west-2:123456789012:log-group:app")
    );
    assert!(matches!(
        cloud.read_data_source("aws_datasync_location_s3", &json!({})),
        Err(ProviderError::RegistryError(_))
    ));
}
