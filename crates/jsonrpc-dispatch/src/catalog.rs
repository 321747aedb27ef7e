//! Self-description of exposed services.
//!
//! Renders the registry as
//! `{"services": {alias: {operation: {description, parameters}}}, "deprecated": []}`
//! from the schemas supplied at registration. Hidden operations and
//! parameters of non-builtin types are left out.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::registry::ServiceRegistry;
use crate::signature::{OperationSchema, ParamSpec};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    pub services: BTreeMap<String, BTreeMap<String, OperationDoc>>,
    pub deprecated: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDoc {
    pub description: Option<String>,
    pub parameters: BTreeMap<String, ParameterDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDoc {
    pub description: Option<String>,
    pub declared_type: Option<String>,
    pub optional: bool,
    /// `null` for mandatory parameters; `optional` tells it apart from a `null` default
    pub default_value: Option<Value>,
}

impl Catalog {
    pub fn from_registry(registry: &ServiceRegistry) -> Self {
        let services = registry
            .iter()
            .filter_map(|(alias, service)| {
                let operations: BTreeMap<String, OperationDoc> = service
                    .operations()
                    .iter()
                    .filter(|op| !op.hidden)
                    .map(|op| (op.name.clone(), OperationDoc::from(op)))
                    .collect();
                (!operations.is_empty()).then(|| (alias.to_string(), operations))
            })
            .collect();

        Self {
            services,
            deprecated: Vec::new(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl From<&OperationSchema> for OperationDoc {
    fn from(op: &OperationSchema) -> Self {
        let parameters = op
            .signature
            .params()
            .iter()
            .filter(|param| param.declared_type.is_builtin())
            .map(|param| (param.name.clone(), ParameterDoc::from(param)))
            .collect();

        Self {
            description: op.description.clone(),
            parameters,
        }
    }
}

impl From<&ParamSpec> for ParameterDoc {
    fn from(param: &ParamSpec) -> Self {
        Self {
            description: param.description.clone(),
            declared_type: param.declared_type.hint().map(str::to_string),
            optional: param.has_default(),
            default_value: param.default.clone(),
        }
    }
}
