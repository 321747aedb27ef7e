//! Services exposed for remote invocation.
//!
//! A service is a named set of operations. Each operation declares its
//! [`OperationSchema`] up front; the dispatcher binds arguments against it and
//! calls [`RpcService::invoke`] with the result.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::binder::BoundArgs;
use crate::error::{InvocationError, RegistryError};
use crate::error_codes;
use crate::signature::OperationSchema;

/// Trait for services reachable as `<alias>.<operation>`
#[async_trait]
pub trait RpcService: Send + Sync {
    /// Every invocable operation with its declared signature
    fn operations(&self) -> &[OperationSchema];

    /// Look up one operation by name
    fn operation(&self, name: &str) -> Option<&OperationSchema> {
        self.operations().iter().find(|op| op.name == name)
    }

    /// Invoke an operation with arguments already bound against its signature
    async fn invoke(&self, operation: &str, args: BoundArgs) -> Result<Value, InvocationError>;
}

/// Boxed future returned by closure-backed operations
pub type OperationFuture = BoxFuture<'static, Result<Value, InvocationError>>;

type OperationFn = Arc<dyn Fn(BoundArgs) -> OperationFuture + Send + Sync>;

/// A service assembled from async closures
pub struct FnService {
    operations: Vec<OperationSchema>,
    handlers: HashMap<String, OperationFn>,
}

impl FnService {
    pub fn builder() -> ServiceBuilder {
        ServiceBuilder::new()
    }
}

impl std::fmt::Debug for FnService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnService")
            .field("operations", &self.operations)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RpcService for FnService {
    fn operations(&self) -> &[OperationSchema] {
        &self.operations
    }

    async fn invoke(&self, operation: &str, args: BoundArgs) -> Result<Value, InvocationError> {
        match self.handlers.get(operation) {
            Some(handler) => handler(args).await,
            None => Err(InvocationError::with_code(
                error_codes::METHOD_NOT_FOUND,
                format!("Operation '{}' is not declared", operation),
            )),
        }
    }
}

/// Builder for [`FnService`]
#[derive(Default)]
pub struct ServiceBuilder {
    operations: Vec<OperationSchema>,
    handlers: HashMap<String, OperationFn>,
    /// First configuration problem, reported by `build`
    error: Option<RegistryError>,
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an operation and the closure that implements it
    pub fn operation<F, Fut>(mut self, schema: OperationSchema, handler: F) -> Self
    where
        F: Fn(BoundArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, InvocationError>> + Send + 'static,
    {
        if self.error.is_some() {
            return self;
        }
        if schema.name.is_empty() {
            self.error = Some(RegistryError::EmptyOperation);
            return self;
        }
        if self.handlers.contains_key(&schema.name) {
            self.error = Some(RegistryError::DuplicateOperation(schema.name));
            return self;
        }

        let handler: OperationFn = Arc::new(move |args| handler(args).boxed());
        self.handlers.insert(schema.name.clone(), handler);
        self.operations.push(schema);
        self
    }

    pub fn build(self) -> Result<FnService, RegistryError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(FnService {
                operations: self.operations,
                handlers: self.handlers,
            }),
        }
    }
}
