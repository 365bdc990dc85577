use serde_json::json;

use walletbridge_core::{codes, next_request_id, Request, Response, RpcError, PROTOCOL_VERSION};

#[test]
fn request_carries_protocol_version_and_unique_ids() {
    let a = Request::new("eth_request_accounts", json!(null));
    let b = Request::new("eth_request_accounts", json!(null));
    assert_eq!(a.jsonrpc, PROTOCOL_VERSION);
    assert_ne!(a.id, b.id);

    let later = next_request_id();
    assert!(later > b.id);
}

#[test]
fn success_response_serializes_with_result_and_without_error() {
    let response = Response::success(7, json!(["0xAAA"]));
    let wire = serde_json::to_value(&response).expect("serializes");
    assert_eq!(wire, json!({ "id": 7, "result": ["0xAAA"] }));

    let parsed: Response = serde_json::from_value(wire).expect("round-trips");
    assert_eq!(parsed, response);
}

#[test]
fn error_response_serializes_with_error_and_without_result() {
    let response = Response::failure(9, RpcError::method_not_supported());
    let wire = serde_json::to_value(&response).expect("serializes");
    assert_eq!(
        wire,
        json!({
            "id": 9,
            "error": { "message": "method not supported", "code": codes::METHOD_NOT_SUPPORTED }
        })
    );
    assert!(wire.get("result").is_none());
}

#[test]
fn required_param_reports_the_missing_key() {
    let request = Request::new("starknet_sign_message", json!({}));
    let err = request
        .required_param("message")
        .expect_err("missing param must fail");
    assert_eq!(err.code, codes::INVALID_PARAMS);
    assert!(err.message.contains("message"));
}
