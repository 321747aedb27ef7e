//! Declared shape of exposed operations.
//!
//! Every operation carries an explicit [`MethodSignature`] supplied at
//! registration time. The binder reads it on each call and the catalog
//! renders it for consumers.

use serde_json::Value;
use std::fmt;

/// Declared type of a single parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// No declared type; any value passes through unchanged
    Untyped,
    String,
    Bool,
    Int,
    /// JSON array or object
    Array,
    /// A non-builtin class type. Such parameters can never be bound.
    Object(String),
}

impl ParamType {
    pub fn is_builtin(&self) -> bool {
        !matches!(self, ParamType::Object(_))
    }

    /// Type hint shown in the catalog; `None` for untyped parameters
    pub fn hint(&self) -> Option<&str> {
        match self {
            ParamType::Untyped => None,
            ParamType::String => Some("string"),
            ParamType::Bool => Some("bool"),
            ParamType::Int => Some("int"),
            ParamType::Array => Some("array"),
            ParamType::Object(name) => Some(name),
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hint().unwrap_or("mixed"))
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub declared_type: ParamType,
    /// `Some` when the parameter is optional; the value may itself be `null`
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, declared_type: ParamType) -> Self {
        Self {
            name: name.into(),
            declared_type,
            default: None,
            description: None,
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Untyped)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::String)
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Bool)
    }

    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Int)
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Array)
    }

    pub fn object(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Object(type_name.into()))
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Ordered parameter list of an operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodSignature {
    params: Vec<ParamSpec>,
}

impl MethodSignature {
    pub fn new(params: Vec<ParamSpec>) -> Self {
        Self { params }
    }

    pub fn push(&mut self, param: ParamSpec) {
        self.params.push(param);
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl FromIterator<ParamSpec> for MethodSignature {
    fn from_iter<I: IntoIterator<Item = ParamSpec>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Registration-time description of one exposed operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationSchema {
    pub name: String,
    pub description: Option<String>,
    pub signature: MethodSignature,
    /// Callable but left out of the catalog
    pub hidden: bool,
}

impl OperationSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            signature: MethodSignature::default(),
            hidden: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn param(mut self, param: ParamSpec) -> Self {
        self.signature.push(param);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}
