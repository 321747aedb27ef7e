//! Method resolution and invocation for a single validated request.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::binder;
use crate::config::ServerConfig;
use crate::error::{InvocationError, JsonRpcErrorObject};
use crate::error_codes;
use crate::mapper::ErrorMapper;
use crate::registry::ServiceRegistry;
use crate::request::JsonRpcRequest;
use crate::response::JsonRpcMessage;
use crate::service::RpcService;

/// Split `<alias>.<name>`. Anything other than exactly one separator with
/// non-empty parts is rejected.
pub fn split_method(method: &str) -> Option<(&str, &str)> {
    let (alias, name) = method.split_once(crate::METHOD_SEPARATOR)?;
    if alias.is_empty() || name.is_empty() || name.contains(crate::METHOD_SEPARATOR) {
        None
    } else {
        Some((alias, name))
    }
}

/// Resolves `alias.name` through the registry, binds parameters and invokes
/// the operation. Every failure comes back as an error object; nothing
/// escapes past a single request.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ServiceRegistry>,
    mapper: ErrorMapper,
    invocation_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ServiceRegistry>, config: &ServerConfig) -> Self {
        Self {
            registry,
            mapper: ErrorMapper::new(config.expose_fault_messages),
            invocation_timeout: config.invocation_timeout,
        }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Process one request. Notifications are executed but yield `None`.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcMessage> {
        let notification = request.is_notification();
        let id = request.response_id();
        let method = request.method.clone();

        let message = match self.execute(request).await {
            Ok(result) => JsonRpcMessage::success(id, result),
            Err(error) => {
                debug!(method = %method, code = error.code, "Request failed");
                JsonRpcMessage::error(id, error)
            }
        };

        if notification {
            debug!(
                method = %method,
                failed = message.is_error(),
                "Notification processed, no response"
            );
            None
        } else {
            Some(message)
        }
    }

    async fn execute(&self, request: JsonRpcRequest) -> Result<Value, JsonRpcErrorObject> {
        let Some((alias, name)) = split_method(&request.method) else {
            debug!(method = %request.method, "Method is not of the form <alias>.<name>");
            return Err(JsonRpcErrorObject::invalid_request());
        };

        let Some(service) = self.registry.resolve(alias) else {
            debug!(alias, "Unknown service alias");
            return Err(JsonRpcErrorObject::method_not_found());
        };

        let args = {
            let Some(schema) = service.operation(name) else {
                debug!(alias, operation = name, "Unknown operation");
                return Err(JsonRpcErrorObject::method_not_found());
            };
            binder::bind(&schema.signature, request.params.as_ref()).map_err(|err| {
                debug!(alias, operation = name, error = %err, "Parameter binding failed");
                self.mapper.map(&err.into())
            })?
        };

        self.invoke(service, name.to_string(), args)
            .await
            .map_err(|err| {
                warn!(alias, operation = name, error = %err, "Invocation failed");
                self.mapper.map(&err)
            })
    }

    /// Run the operation on its own task so panics are contained. The task is
    /// aborted when the deadline passes or the caller stops waiting.
    async fn invoke(
        &self,
        service: Arc<dyn RpcService>,
        operation: String,
        args: binder::BoundArgs,
    ) -> Result<Value, InvocationError> {
        let task = tokio::spawn(async move { service.invoke(&operation, args).await });
        let _guard = AbortOnDrop(task.abort_handle());

        let joined = match self.invocation_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => return Err(InvocationError::Timeout(limit)),
            },
            None => task.await,
        };

        match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => Err(InvocationError::Panicked),
            Err(_) => Err(InvocationError::with_code(
                error_codes::INTERNAL_ERROR,
                "Operation was cancelled",
            )),
        }
    }
}

/// Aborts the invocation task once nothing awaits it
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("mapper", &self.mapper)
            .field("invocation_timeout", &self.invocation_timeout)
            .finish()
    }
}
