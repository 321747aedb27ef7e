//! Parameter binding and type coercion.
//!
//! Supplied `params` are matched against a [`MethodSignature`] either by name
//! or by position, checked against each declared type, and handed to the
//! operation keyed by parameter name.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::error::InvocationError;
use crate::error_codes;
use crate::request::{BindingMode, RequestParams};
use crate::signature::{MethodSignature, ParamSpec, ParamType};

/// Reasons a declared parameter could not be bound
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("Parameter \"{0}\" is mandatory")]
    Missing(String),

    #[error("Parameter \"{name}\" must be {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("Parameter \"{0}\" cannot be resolved")]
    Unresolvable(String),
}

impl BindingError {
    /// Unresolvable class types carry no code and fall into the generic bucket
    pub fn code(&self) -> Option<i64> {
        match self {
            BindingError::Missing(_) | BindingError::TypeMismatch { .. } => {
                Some(error_codes::INVALID_PARAMS)
            }
            BindingError::Unresolvable(_) => None,
        }
    }
}

/// Arguments bound to an operation, keyed by parameter name in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    args: Vec<(String, Value)>,
}

impl BoundArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.args.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.args.push((name, value)),
        }
    }

    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.args.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Deserialize a bound argument. A missing or mistyped value is an
    /// application failure of the operation, not a binding failure.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, InvocationError> {
        let value = self.get_value(name).ok_or_else(|| {
            InvocationError::failure(format!("Argument \"{}\" is not bound", name))
        })?;
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_value(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.args.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.args.into_iter().collect::<Map<String, Value>>())
    }
}

impl FromIterator<(String, Value)> for BoundArgs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut args = BoundArgs::new();
        for (name, value) in iter {
            args.insert(name, value);
        }
        args
    }
}

/// Bind supplied params against a signature.
///
/// Absent `params` bind positionally against nothing, so only defaulted
/// parameters can succeed. A present `null` counts as absent.
pub fn bind(
    signature: &MethodSignature,
    params: Option<&RequestParams>,
) -> Result<BoundArgs, BindingError> {
    let mode = params
        .map(RequestParams::binding_mode)
        .unwrap_or(BindingMode::Positional);

    let mut args = BoundArgs::new();
    for (position, param) in signature.params().iter().enumerate() {
        if !param.declared_type.is_builtin() {
            debug!(
                param = %param.name,
                declared = %param.declared_type,
                "parameter type cannot be bound"
            );
            return Err(BindingError::Unresolvable(param.name.clone()));
        }

        let supplied = params
            .and_then(|p| match mode {
                BindingMode::Named => p.get(&param.name),
                BindingMode::Positional => p.get_index(position),
            })
            .filter(|value| !value.is_null());

        let value = match (supplied, &param.default) {
            (Some(value), _) => coerce(param, value)?,
            (None, Some(default)) => default.clone(),
            (None, None) => return Err(BindingError::Missing(param.name.clone())),
        };
        args.insert(param.name.clone(), value);
    }

    Ok(args)
}

/// Check a supplied value against the declared type, coercing where allowed
pub fn coerce(param: &ParamSpec, value: &Value) -> Result<Value, BindingError> {
    let mismatch = |expected| BindingError::TypeMismatch {
        name: param.name.clone(),
        expected,
    };

    match &param.declared_type {
        ParamType::Untyped => Ok(value.clone()),
        ParamType::String => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(mismatch("string")),
        },
        ParamType::Bool => match value {
            Value::Bool(_) => Ok(value.clone()),
            _ => bool_flag(value).map(Value::Bool).ok_or_else(|| mismatch("bool")),
        },
        ParamType::Int => {
            if is_numeric(value) {
                Ok(value.clone())
            } else {
                Err(mismatch("numeric"))
            }
        }
        ParamType::Array => match value {
            Value::Array(_) | Value::Object(_) => Ok(value.clone()),
            _ => Err(mismatch("array")),
        },
        ParamType::Object(_) => Err(BindingError::Unresolvable(param.name.clone())),
    }
}

/// `0`, `1`, `"0"` and `"1"` stand in for booleans. Floats such as `1.0` do not.
fn bool_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => match n.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        },
        _ => None,
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => is_numeric_str(s),
        _ => false,
    }
}

/// Decimal numbers with optional sign, fraction and exponent, allowing
/// surrounding whitespace. Rejects hex, `inf` and `nan`.
fn is_numeric_str(s: &str) -> bool {
    let s = s.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0B' | '\x0C'));
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);

    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(at) => (&body[..at], Some(&body[at + 1..])),
        None => (body, None),
    };

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (mantissa, ""),
    };
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return false;
    }

    match exponent {
        Some(exp) => {
            let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !digits.is_empty() && all_digits(digits)
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> RequestParams {
        RequestParams::from_value(value).unwrap()
    }

    fn add_signature() -> MethodSignature {
        MethodSignature::new(vec![ParamSpec::int("a"), ParamSpec::int("b")])
    }

    #[test]
    fn test_positional_binding() {
        let args = bind(&add_signature(), Some(&params(json!([1, 2])))).unwrap();
        assert_eq!(args.get_value("a"), Some(&json!(1)));
        assert_eq!(args.get_value("b"), Some(&json!(2)));
        assert_eq!(args.into_value(), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_named_binding_ignores_order() {
        let args = bind(&add_signature(), Some(&params(json!({"b": 5, "a": 4})))).unwrap();
        assert_eq!(args.get::<i64>("a").unwrap(), 4);
        assert_eq!(args.get::<i64>("b").unwrap(), 5);
    }

    #[test]
    fn test_missing_mandatory_parameter() {
        let err = bind(&add_signature(), Some(&params(json!({"a": 1})))).unwrap_err();
        assert_eq!(err, BindingError::Missing("b".into()));
        assert_eq!(err.to_string(), "Parameter \"b\" is mandatory");
        assert_eq!(err.code(), Some(-32602));
    }

    #[test]
    fn test_absent_params_use_defaults() {
        let signature = MethodSignature::new(vec![
            ParamSpec::string("greeting").with_default(json!("hello")),
            ParamSpec::untyped("extra").with_default(json!(null)),
        ]);
        let args = bind(&signature, None).unwrap();
        assert_eq!(args.get_value("greeting"), Some(&json!("hello")));
        assert_eq!(args.get_value("extra"), Some(&json!(null)));
    }

    #[test]
    fn test_absent_params_without_default_fail() {
        let err = bind(&add_signature(), None).unwrap_err();
        assert_eq!(err, BindingError::Missing("a".into()));
    }

    #[test]
    fn test_null_value_counts_as_absent() {
        let signature = MethodSignature::new(vec![ParamSpec::int("limit").with_default(json!(10))]);
        let args = bind(&signature, Some(&params(json!([null])))).unwrap();
        assert_eq!(args.get_value("limit"), Some(&json!(10)));

        let err = bind(&add_signature(), Some(&params(json!([1, null])))).unwrap_err();
        assert_eq!(err, BindingError::Missing("b".into()));
    }

    #[test]
    fn test_extra_params_are_ignored() {
        let args = bind(&add_signature(), Some(&params(json!([1, 2, 3])))).unwrap();
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_sequential_object_binds_by_position() {
        let args = bind(&add_signature(), Some(&params(json!({"0": 7, "1": 8})))).unwrap();
        assert_eq!(args.get_value("a"), Some(&json!(7)));
        assert_eq!(args.get_value("b"), Some(&json!(8)));
    }

    #[test]
    fn test_string_type_is_strict() {
        let param = ParamSpec::string("name");
        assert_eq!(coerce(&param, &json!("x")).unwrap(), json!("x"));
        let err = coerce(&param, &json!(5)).unwrap_err();
        assert_eq!(err.to_string(), "Parameter \"name\" must be string");
    }

    #[test]
    fn test_bool_coercion() {
        let param = ParamSpec::bool("flag");
        assert_eq!(coerce(&param, &json!("1")).unwrap(), json!(true));
        assert_eq!(coerce(&param, &json!("0")).unwrap(), json!(false));
        assert_eq!(coerce(&param, &json!(1)).unwrap(), json!(true));
        assert_eq!(coerce(&param, &json!(0)).unwrap(), json!(false));
        assert_eq!(coerce(&param, &json!(false)).unwrap(), json!(false));

        assert!(coerce(&param, &json!("yes")).is_err());
        assert!(coerce(&param, &json!(2)).is_err());
        assert!(coerce(&param, &json!(1.0)).is_err());
        assert!(coerce(&param, &json!("true")).is_err());
    }

    #[test]
    fn test_int_accepts_numeric_without_narrowing() {
        let param = ParamSpec::int("n");
        assert_eq!(coerce(&param, &json!(3)).unwrap(), json!(3));
        assert_eq!(coerce(&param, &json!(2.5)).unwrap(), json!(2.5));
        assert_eq!(coerce(&param, &json!("42")).unwrap(), json!("42"));
        assert_eq!(coerce(&param, &json!(" -1.5e3 ")).unwrap(), json!(" -1.5e3 "));

        let err = coerce(&param, &json!("abc")).unwrap_err();
        assert_eq!(err.to_string(), "Parameter \"n\" must be numeric");
        assert!(coerce(&param, &json!(true)).is_err());
        assert!(coerce(&param, &json!([1])).is_err());
    }

    #[test]
    fn test_numeric_strings() {
        for ok in ["0", "12", "-3", "+4", "1.5", ".5", "5.", "1e3", "2E-2", " 7", "7 "] {
            assert!(is_numeric_str(ok), "{ok:?} should be numeric");
        }
        for bad in ["", " ", ".", "-", "1e", "e3", "0x1A", "inf", "NaN", "1.2.3", "1 2", "١"] {
            assert!(!is_numeric_str(bad), "{bad:?} should not be numeric");
        }
    }

    #[test]
    fn test_array_accepts_arrays_and_objects() {
        let param = ParamSpec::array("items");
        assert!(coerce(&param, &json!([1, 2])).is_ok());
        assert!(coerce(&param, &json!({"k": "v"})).is_ok());
        assert!(coerce(&param, &json!("[1,2]")).is_err());
    }

    #[test]
    fn test_untyped_passes_through() {
        let param = ParamSpec::untyped("anything");
        assert_eq!(coerce(&param, &json!({"x": [1]})).unwrap(), json!({"x": [1]}));
    }

    #[test]
    fn test_object_type_is_unresolvable() {
        let signature = MethodSignature::new(vec![ParamSpec::object("clock", "Clock")]);
        let err = bind(&signature, Some(&params(json!([{"now": 1}])))).unwrap_err();
        assert_eq!(err, BindingError::Unresolvable("clock".into()));
        assert_eq!(err.code(), None);

        // Unresolvable wins even when a default exists
        let signature = MethodSignature::new(vec![
            ParamSpec::object("clock", "Clock").with_default(json!(null)),
        ]);
        assert!(matches!(
            bind(&signature, None),
            Err(BindingError::Unresolvable(_))
        ));
    }

    #[test]
    fn test_bound_args_get_reports_failures() {
        let args = bind(&add_signature(), Some(&params(json!(["1", 2])))).unwrap();
        assert!(args.get::<i64>("a").is_err());
        assert!(args.get::<i64>("missing").is_err());
        assert!(args.contains("b"));
    }
}
