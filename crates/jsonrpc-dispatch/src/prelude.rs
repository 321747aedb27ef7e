//! # JSON-RPC Dispatch Prelude
//!
//! Convenient re-exports of the types needed to define services and run the
//! engine.
//!
//! ```rust
//! use jsonrpc_dispatch::prelude::*;
//! ```

// Engine
pub use crate::config::ServerConfig;
pub use crate::response::ResponsePayload;
pub use crate::server::JsonRpcServer;

// Service definition
pub use crate::binder::BoundArgs;
pub use crate::error::{InvocationError, RegistryError, RpcFault};
pub use crate::registry::ServiceRegistry;
pub use crate::service::{FnService, RpcService};
pub use crate::signature::{OperationSchema, ParamSpec, ParamType};

// Protocol types
pub use crate::error::{JsonRpcError, JsonRpcErrorCode};
pub use crate::request::{JsonRpcRequest, RequestParams};
pub use crate::response::{JsonRpcMessage, JsonRpcResponse};
pub use crate::types::RequestId;

// Standard error codes
pub use crate::error_codes::*;
