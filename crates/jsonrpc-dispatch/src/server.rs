//! Entry point tying the parser, coordinator and dispatcher together.

use std::sync::Arc;

use tracing::{debug, info};

use crate::batch::BatchCoordinator;
use crate::catalog::Catalog;
use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::error::RegistryError;
use crate::parser::parse_payload;
use crate::registry::ServiceRegistry;
use crate::response::ResponsePayload;
use crate::service::RpcService;

/// A configured JSON-RPC engine.
///
/// Cheap to clone; clones share the frozen registry and may serve exchanges
/// concurrently.
#[derive(Debug, Clone)]
pub struct JsonRpcServer {
    coordinator: BatchCoordinator,
    config: Arc<ServerConfig>,
}

impl JsonRpcServer {
    pub fn builder() -> JsonRpcServerBuilder {
        JsonRpcServerBuilder::new()
    }

    pub fn new(registry: ServiceRegistry, config: ServerConfig) -> Self {
        info!(
            services = registry.len(),
            timeout = ?config.invocation_timeout,
            "JSON-RPC server configured"
        );
        let dispatcher = Dispatcher::new(Arc::new(registry), &config);
        let coordinator = BatchCoordinator::new(dispatcher, &config);
        Self {
            coordinator,
            config: Arc::new(config),
        }
    }

    /// Process one raw exchange. `ResponsePayload::Empty` means no body.
    pub async fn process(&self, raw: &[u8]) -> ResponsePayload {
        match parse_payload(raw) {
            Ok(payload) => self.coordinator.run(payload).await,
            Err(error) => {
                debug!(code = error.error.code, "Payload rejected before dispatch");
                ResponsePayload::Single(error.into())
            }
        }
    }

    pub async fn process_str(&self, raw: &str) -> ResponsePayload {
        self.process(raw.as_bytes()).await
    }

    /// Describe every visible operation of the registered services
    pub fn catalog(&self) -> Catalog {
        Catalog::from_registry(self.registry())
    }

    pub fn registry(&self) -> &ServiceRegistry {
        self.coordinator.dispatcher().registry()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Builder for [`JsonRpcServer`]
#[derive(Debug, Default)]
pub struct JsonRpcServerBuilder {
    registry: ServiceRegistry,
    config: ServerConfig,
}

impl JsonRpcServerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a service under an alias
    pub fn service<S>(
        mut self,
        alias: impl Into<String>,
        service: S,
    ) -> Result<Self, RegistryError>
    where
        S: RpcService + 'static,
    {
        self.registry.register(alias, service)?;
        Ok(self)
    }

    /// Replace the registry wholesale
    pub fn registry(mut self, registry: ServiceRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> JsonRpcServer {
        JsonRpcServer::new(self.registry, self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::BoundArgs;
    use crate::service::FnService;
    use crate::signature::{OperationSchema, ParamSpec};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn server() -> JsonRpcServer {
        let greeter = FnService::builder()
            .operation(
                OperationSchema::new("hello")
                    .param(ParamSpec::string("name").with_default(json!("world"))),
                |args: BoundArgs| async move {
                    let name: String = args.get("name")?;
                    Ok(json!(format!("hello {name}")))
                },
            )
            .build()
            .unwrap();

        JsonRpcServer::builder()
            .service("greeter", greeter)
            .unwrap()
            .build()
    }

    #[tokio::test]
    async fn test_process_single() {
        let payload = server()
            .process_str(r#"{"jsonrpc":"2.0","method":"greeter.hello","id":"x"}"#)
            .await;

        assert_eq!(
            payload.to_value(),
            Some(json!({"jsonrpc": "2.0", "result": "hello world", "id": "x"}))
        );
    }

    #[tokio::test]
    async fn test_process_parse_error() {
        let payload = server().process(b"{oops").await;
        let value = payload.to_value().unwrap();
        assert_eq!(value["error"]["code"], -32700);
        assert!(value["id"].is_null());
    }

    #[tokio::test]
    async fn test_clones_share_registry() {
        let server = server();
        let clone = server.clone();
        let a_raw = r#"{"jsonrpc":"2.0","method":"greeter.hello","params":["a"],"id":1}"#;
        let b_raw = r#"{"jsonrpc":"2.0","method":"greeter.hello","params":["b"],"id":2}"#;
        let (a, b) = tokio::join!(server.process_str(a_raw), clone.process_str(b_raw));
        assert_eq!(a.messages()[0].result(), Some(&json!("hello a")));
        assert_eq!(b.messages()[0].result(), Some(&json!("hello b")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_exchange_stops_invocation() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let worker = FnService::builder()
            .operation(OperationSchema::new("spin"), move |_| {
                let counter = counter.clone();
                async move {
                    for _ in 0..20 {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                    Ok(Value::Null)
                }
            })
            .build()
            .unwrap();
        let server = JsonRpcServer::builder()
            .service("worker", worker)
            .unwrap()
            .build();

        let outcome = tokio::time::timeout(
            Duration::from_millis(35),
            server.process_str(r#"{"jsonrpc":"2.0","method":"worker.spin","id":1}"#),
        )
        .await;
        assert!(outcome.is_err());

        let at_drop = ticks.load(Ordering::SeqCst);
        assert!(at_drop < 20);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), at_drop);
    }

    #[test]
    fn test_builder_rejects_duplicate_alias() {
        let make = || FnService::builder().build().unwrap();
        let err = JsonRpcServer::builder()
            .service("dup", make())
            .unwrap()
            .service("dup", make())
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateAlias("dup".into()));
    }

    #[test]
    fn test_catalog_via_server() {
        let catalog = server().catalog();
        assert!(catalog.services["greeter"].contains_key("hello"));
    }
}
