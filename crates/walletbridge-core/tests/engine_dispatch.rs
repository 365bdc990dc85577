use serde_json::json;

use walletbridge_core::{codes, Engine, EngineSetupError, Middleware, Request, RpcError};

fn ping_engine() -> Engine {
    Engine::new(vec![
        Middleware::new("ping", |_req| async { Ok(json!("pong")) }),
        Middleware::new("fail", |_req| async {
            Err(RpcError::new("handler exploded", codes::INTERNAL_ERROR))
        }),
    ])
    .expect("engine assembles")
}

#[tokio::test]
async fn dispatch_success_sets_result_and_not_error() {
    let engine = ping_engine();
    let request = Request::new("ping", json!(null));
    let id = request.id;

    let response = engine.dispatch(request).await;
    assert_eq!(response.id, id);
    assert_eq!(response.result(), Some(&json!("pong")));
    assert!(response.error().is_none());
}

#[tokio::test]
async fn dispatch_handler_failure_sets_error_and_not_result() {
    let engine = ping_engine();
    let response = engine.dispatch(Request::new("fail", json!(null))).await;

    let error = response.error().expect("error is set");
    assert_eq!(error.code, codes::INTERNAL_ERROR);
    assert_eq!(error.message, "handler exploded");
    assert!(response.result().is_none());
}

#[tokio::test]
async fn dispatch_unknown_method_resolves_to_method_not_found() {
    let engine = ping_engine();
    let response = engine
        .dispatch(Request::new("eth_no_such_method", json!([])))
        .await;

    let error = response.error().expect("error is set");
    assert_eq!(error.code, codes::METHOD_NOT_FOUND);
    assert!(error.message.contains("eth_no_such_method"));
}

#[tokio::test]
async fn dispatch_runs_the_first_matching_handler_exactly_once() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let calls = Arc::new(AtomicUsize::new(0));
    let counted = Arc::clone(&calls);
    let engine = Engine::new(vec![Middleware::new("counted", move |_req| {
        let calls = Arc::clone(&counted);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(json!(true))
        }
    })])
    .expect("engine assembles");

    engine.dispatch(Request::new("counted", json!(null))).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn engine_rejects_duplicate_method_claims_at_construction() {
    let err = Engine::new(vec![
        Middleware::new("ping", |_req| async { Ok(json!("a")) }),
        Middleware::new("ping", |_req| async { Ok(json!("b")) }),
    ])
    .expect_err("duplicate method must fail fast");
    assert_eq!(err, EngineSetupError::DuplicateMethod("ping".to_owned()));
}
