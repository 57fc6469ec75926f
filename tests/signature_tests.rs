//! Shared-secret signature round trips across the request surface.

use serde_json::json;

use hmvp::signature::{self, SIGNATURE_PARAM};
use hmvp::{Params, Request};

fn params(pairs: &[(&str, serde_json::Value)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn applied_signature_verifies_with_the_same_secret() {
    let mut request = Request::external("/user/5", params(&[("limit", json!("3"))]));
    request.apply_signature("s3cr3t");

    assert!(request.params.contains_key(SIGNATURE_PARAM));
    assert!(request.verify_signature("s3cr3t").is_ok());
}

#[test]
fn wrong_secret_is_rejected() {
    let mut request = Request::external("/user/5", Params::new());
    request.apply_signature("s3cr3t");
    assert!(request.verify_signature("other").is_err());
}

#[test]
fn mutating_any_param_after_signing_invalidates_the_signature() {
    let mut request = Request::external("/user/5", params(&[("limit", json!("3"))]));
    request.apply_signature("s3cr3t");

    request.params.insert("limit".to_string(), json!("30"));
    assert!(request.verify_signature("s3cr3t").is_err());
}

#[test]
fn mutating_the_path_after_signing_invalidates_the_signature() {
    let mut request = Request::external("/user/5", Params::new());
    request.apply_signature("s3cr3t");

    request.set_path("/user/6");
    assert!(request.verify_signature("s3cr3t").is_err());
}

#[test]
fn signature_is_stable_under_param_insertion_order() {
    let forward = params(&[("a", json!("1")), ("b", json!("2"))]);
    let reversed = params(&[("b", json!("2")), ("a", json!("1"))]);
    assert_eq!(
        signature::compute("s3cr3t", "/x", &forward),
        signature::compute("s3cr3t", "/x", &reversed)
    );
}

#[test]
fn missing_signature_is_rejected_for_external_requests() {
    let request = Request::external("/user/5", Params::new());
    assert!(request.verify_signature("s3cr3t").is_err());
}

#[test]
fn internal_requests_verify_without_a_signature() {
    let request = Request::new("/user/5", Params::new());
    assert!(request.verify_signature("s3cr3t").is_ok());
}
