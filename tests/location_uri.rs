use proptest::prelude::*;
use rsprovider::v1::aws::datasync::uri::{
    global_id_from_location_uri, subdirectory_from_location_uri,
};

fn arb_subdirectory() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z0-9_.-]{1,12}", 0..5).prop_map(|segments| {
        if segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", segments.join("/"))
        }
    })
}

proptest! {
    #[test]
    fn plain_s3_uri_yields_bucket_and_subdirectory(
        bucket in "[a-z0-9][a-z0-9.-]{2,40}",
        subdirectory in arb_subdirectory(),
    ) {
        let uri = format!("s3://{}{}", bucket, subdirectory);
        prop_assert_eq!(subdirectory_from_location_uri(&uri).unwrap(), subdirectory);
        prop_assert_eq!(global_id_from_location_uri(&uri).unwrap(), bucket);
    }

    #[test]
    fn outposts_uri_yields_the_access_point_path(
        outpost in "op-[0-9a-f]{17}",
        access_point in "[a-z][a-z0-9-]{2,20}",
        subdirectory in arb_subdirectory(),
    ) {
        let uri = format!(
            "s3://arn:aws:s3-outposts:eu-west-3:123456789012:outpost/{}/accesspoint/{}{}",
            outpost, access_point, subdirectory
        );
        prop_assume!(!subdirectory.contains("/accesspoint/"));
        prop_assert_eq!(subdirectory_from_location_uri(&uri).unwrap(), subdirectory);
        prop_assert!(global_id_from_location_uri(&uri).is_err());
    }

    #[test]
    fn unknown_schemes_are_rejected(scheme in "[a-z]{2,8}", rest in "[a-z]{1,8}/[a-z]{0,8}") {
        prop_assume!(!["efs", "hdfs", "nfs", "smb"].contains(&scheme.as_str()));
        prop_assume!(!scheme.starts_with("fsx"));
        let uri = format!("{}://{}", scheme, rest);
        prop_assert!(subdirectory_from_location_uri(&uri).is_err());
    }
}
