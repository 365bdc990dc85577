use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::rpc::{Request, Response, RpcError};

type HandlerFn = Arc<dyn Fn(Request) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync>;

/// One method-recognizing step in the request pipeline: a declared method
/// name plus the async handler that satisfies it.
#[derive(Clone)]
pub struct Middleware {
    method: String,
    handler: HandlerFn,
}

impl Middleware {
    pub fn new<F, Fut>(method: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RpcError>> + Send + 'static,
    {
        Self {
            method: method.into(),
            handler: Arc::new(move |req| Box::pin(handler(req))),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

impl std::fmt::Debug for Middleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Middleware")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineSetupError {
    #[error("duplicate middleware for method: {0}")]
    DuplicateMethod(String),
}

/// Immutable ordered assembly of middleware forming one wallet's request
/// router. Construction rejects two middleware claiming the same method, so
/// dispatch never has to disambiguate shadowed handlers.
#[derive(Debug)]
pub struct Engine {
    middlewares: Vec<Middleware>,
}

impl Engine {
    pub fn new(middlewares: Vec<Middleware>) -> Result<Self, EngineSetupError> {
        let mut seen = HashSet::new();
        for mw in &middlewares {
            if !seen.insert(mw.method.clone()) {
                return Err(EngineSetupError::DuplicateMethod(mw.method.clone()));
            }
        }
        Ok(Self { middlewares })
    }

    /// Walks the middleware list once; the first (and only) middleware whose
    /// declared method matches handles the request. All failure, including a
    /// handler failing, resolves to an error response rather than an Err.
    pub async fn dispatch(&self, request: Request) -> Response {
        let id = request.id;
        let Some(mw) = self
            .middlewares
            .iter()
            .find(|mw| mw.method == request.method)
        else {
            return Response::failure(id, RpcError::method_not_found(&request.method));
        };
        match (mw.handler)(request).await {
            Ok(result) => Response::success(id, result),
            Err(error) => Response::failure(id, error),
        }
    }
}
