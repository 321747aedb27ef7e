//! # JSON-RPC 2.0 Dispatch Engine
//!
//! A transport-agnostic JSON-RPC 2.0 server core. Services are registered
//! under an alias and their operations are called as `"<alias>.<operation>"`.
//! Raw payloads go in, a response body (or no body at all) comes out.
//!
//! ## Features
//! - Single requests, batches and notifications
//! - Named and positional parameter binding against declared signatures
//! - Type checks and coercion for `string`, `bool`, `int` and `array` parameters
//! - Canonical error taxonomy with per-item failure isolation
//! - Per-invocation deadline and panic containment
//! - Self-description catalog built from registration-time schemas
//!
//! ```rust,no_run
//! use jsonrpc_dispatch::prelude::*;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), RegistryError> {
//! let calc = FnService::builder()
//!     .operation(
//!         OperationSchema::new("add")
//!             .param(ParamSpec::int("a"))
//!             .param(ParamSpec::int("b")),
//!         |args: BoundArgs| async move {
//!             let a: i64 = args.get("a")?;
//!             let b: i64 = args.get("b")?;
//!             Ok(json!(a + b))
//!         },
//!     )
//!     .build()?;
//!
//! let server = JsonRpcServer::builder().service("calc", calc)?.build();
//! let body = server
//!     .process_str(r#"{"jsonrpc":"2.0","method":"calc.add","params":[1,2],"id":1}"#)
//!     .await
//!     .to_json_string();
//! assert_eq!(body.as_deref(), Some(r#"{"jsonrpc":"2.0","result":3,"id":1}"#));
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod binder;
pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod mapper;
pub mod parser;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod server;
pub mod service;
pub mod signature;
pub mod types;

// Re-export main types
pub use binder::{BindingError, BoundArgs};
pub use catalog::Catalog;
pub use config::ServerConfig;
pub use error::{
    InvocationError, JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject, RegistryError, RpcFault,
};
pub use registry::ServiceRegistry;
pub use request::{JsonRpcRequest, RequestParams};
pub use response::{JsonRpcMessage, JsonRpcResponse, ResponsePayload};
pub use server::{JsonRpcServer, JsonRpcServerBuilder};
pub use service::{FnService, RpcService, ServiceBuilder};
pub use signature::{MethodSignature, OperationSchema, ParamSpec, ParamType};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Separates the service alias from the operation name in `method`
pub const METHOD_SEPARATOR: char = '.';

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    /// Default bucket for uncategorized application faults
    pub const SERVER_ERROR: i64 = -32000;
}
