//! Parsing of DataSync location URIs such as `s3://bucket/dir/` or
//! `s3://arn:aws:s3-outposts:region:account:outpost/op-1/accesspoint/ap/dir/`.

use crate::v1::manager::ManagerError;

const SCHEMES: &[&str] = &["azure-blob", "efs", "hdfs", "nfs", "s3", "smb"];

fn invalid(uri: &str) -> ManagerError {
    ManagerError::LookupFail(format!("unable to parse location URI ({})", uri))
}

fn is_known_scheme(scheme: &str) -> bool {
    SCHEMES.contains(&scheme)
        || (scheme.starts_with("fsx")
            && scheme.len() > 3
            && scheme
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'))
}

fn strip_scheme(uri: &str) -> Option<&str> {
    let (scheme, rest) = uri.split_once("://")?;
    (is_known_scheme(scheme) && !rest.is_empty()).then_some(rest)
}

/// Splits `host[:port]/subdir` into the host and the subdirectory.
fn split_global_id(value: &str) -> Option<(&str, &str)> {
    let (head, subdirectory) = value.split_at(value.find('/')?);
    let host = match head.split_once(':') {
        Some((host, port)) if port.len() <= 5 && port.chars().all(|c| c.is_ascii_digit()) => host,
        Some(_) => return None,
        None => head,
    };
    let valid_host = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    valid_host.then_some((host, subdirectory))
}

fn arn_resource(value: &str) -> Option<&str> {
    if !value.starts_with("arn:") {
        return None;
    }
    value.splitn(6, ':').nth(5)
}

/// Path below the access point in `outpost/<id>/accesspoint/<name>/<path>`.
/// The last access point segment followed by a path wins.
fn access_point_subdirectory(resource: &str) -> Option<&str> {
    resource
        .rmatch_indices("/accesspoint/")
        .filter(|(start, _)| resource[..*start].starts_with("outpost/"))
        .find_map(|(start, marker)| {
            let after = &resource[start + marker.len()..];
            after.find('/').map(|slash| &after[slash..])
        })
}

pub fn subdirectory_from_location_uri(uri: &str) -> Result<String, ManagerError> {
    let rest = strip_scheme(uri).ok_or_else(|| invalid(uri))?;
    let subdirectory = match arn_resource(rest) {
        Some(resource) => access_point_subdirectory(resource),
        None => split_global_id(rest).map(|(_, subdirectory)| subdirectory),
    };
    subdirectory
        .map(str::to_string)
        .ok_or_else(|| invalid(uri))
}

/// Host part of a location URI (the bucket name for S3). ARN-form URIs have
/// no plain global identifier.
pub fn global_id_from_location_uri(uri: &str) -> Result<String, ManagerError> {
    let rest = strip_scheme(uri).ok_or_else(|| invalid(uri))?;
    split_global_id(rest)
        .map(|(host, _)| host.to_string())
        .ok_or_else(|| invalid(uri))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("s3://my-bucket/test/", "/test/")]
    #[case("s3://my-bucket/", "/")]
    #[case("efs://us-west-2.fs-abcdef01/path/to/dir/", "/path/to/dir/")]
    #[case("nfs://example.com:2049/export/", "/export/")]
    #[case("fsxw://us-west-2.fs-0123/share/", "/share/")]
    #[case(
        "s3://arn:aws:s3-outposts:eu-west-3:123456789012:outpost/op-01ac5d28a6a232904/accesspoint/example/dir/",
        "/dir/"
    )]
    #[case(
        "s3://arn:aws:s3-outposts:eu-west-3:123456789012:outpost/op-01ac5d28a6a232904/accesspoint/example/",
        "/"
    )]
    #[case(
        "s3://arn:aws:s3-outposts:eu-west-3:123456789012:outpost/op-1/accesspoint/ap/a/b/",
        "/a/b/"
    )]
    fn subdirectory(#[case] uri: &str, #[case] expected: &str) {
        assert_eq!(subdirectory_from_location_uri(uri).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("ftp://host/dir/")]
    #[case("s3://")]
    #[case("s3://bucket-without-subdir")]
    #[case("nfs://host:port/dir/")]
    #[case("s3://arn:aws:s3-outposts:eu-west-3:123456789012:outpost/op-1/accesspoint/ap")]
    #[case("s3://arn:aws:s3:us-west-2:123456789012:accesspoint/ap/dir/")]
    fn rejects_malformed(#[case] uri: &str) {
        assert!(subdirectory_from_location_uri(uri).is_err());
    }

    #[test]
    fn bucket_from_uri() {
        assert_eq!(
            global_id_from_location_uri("s3://my-bucket/test/").unwrap(),
            "my-bucket"
        );
        assert!(global_id_from_location_uri(
            "s3://arn:aws:s3-outposts:eu-west-3:123456789012:outpost/op-1/accesspoint/a/"
        )
        .is_err());
    }
}
