//! Declared output schemas.
//!
//! The schema is derived from the Rust record types with `schemars` and then
//! narrowed to the OpenAPI subset the generation service accepts: upper-case
//! `type` names, no `$ref`, `nullable` instead of `null` unions.

use schemars::{schema_for, JsonSchema};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::model::{AnswerEvaluation, GuidedQuestion};

const MAX_DEPTH: usize = 32;

/// Provider-facing description of the JSON shape a reply must take.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResponseSchema(Value);

impl ResponseSchema {
    /// Derive the schema for `T`.
    #[instrument(target = "guided_quiz::schema", fields(ty = std::any::type_name::<T>()))]
    pub fn for_type<T: JsonSchema>() -> Self {
        let root = schema_for!(T);
        let root = root.as_value();
        let defs = root
            .get("$defs")
            .or_else(|| root.get("definitions"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let narrowed = narrow(root, &defs, 0);
        debug!(target: "guided_quiz::schema", defs = defs.len(), "derived response schema");
        Self(narrowed)
    }

    /// An array of guided questions.
    pub fn guided_questions() -> Self {
        Self::for_type::<Vec<GuidedQuestion>>()
    }

    /// A single answer evaluation.
    pub fn answer_evaluation() -> Self {
        Self::for_type::<AnswerEvaluation>()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Names of the required properties of the object this schema describes,
    /// looking through one level of array.
    pub fn required_fields(&self) -> Vec<&str> {
        let object = match self.0.get("items") {
            Some(items) => items,
            None => &self.0,
        };
        object
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

fn narrow(node: &Value, defs: &Map<String, Value>, depth: usize) -> Value {
    let Some(obj) = node.as_object() else {
        return Value::Object(Map::new());
    };
    if depth > MAX_DEPTH {
        return Value::Object(Map::new());
    }

    if let Some(target) = obj.get("$ref").and_then(Value::as_str) {
        let name = target.rsplit('/').next().unwrap_or(target);
        let mut resolved = defs
            .get(name)
            .map(|def| narrow(def, defs, depth + 1))
            .unwrap_or_else(|| Value::Object(Map::new()));
        copy_description(obj, &mut resolved);
        return resolved;
    }

    if let Some(inner) = single(obj.get("allOf")) {
        let mut resolved = narrow(inner, defs, depth + 1);
        copy_description(obj, &mut resolved);
        return resolved;
    }

    for key in ["oneOf", "anyOf"] {
        if let Some(variants) = obj.get(key).and_then(Value::as_array) {
            let mut resolved = narrow_union(variants, defs, depth);
            copy_description(obj, &mut resolved);
            return resolved;
        }
    }

    let mut out = Map::new();
    match obj.get("type") {
        Some(Value::String(ty)) => {
            out.insert("type".into(), Value::String(ty.to_uppercase()));
        }
        Some(Value::Array(types)) => {
            let concrete: Vec<&str> = types
                .iter()
                .filter_map(Value::as_str)
                .filter(|t| *t != "null")
                .collect();
            if let [only] = concrete.as_slice() {
                out.insert("type".into(), Value::String(only.to_uppercase()));
            }
            if concrete.len() < types.len() {
                out.insert("nullable".into(), Value::Bool(true));
            }
        }
        _ => {}
    }

    if let Some(values) = obj.get("enum").and_then(Value::as_array) {
        let values: Vec<Value> = values.iter().filter(|v| !v.is_null()).cloned().collect();
        out.entry("type").or_insert_with(|| Value::String("STRING".into()));
        out.insert("enum".into(), Value::Array(values));
    } else if let Some(constant) = obj.get("const") {
        out.entry("type").or_insert_with(|| Value::String("STRING".into()));
        out.insert("enum".into(), Value::Array(vec![constant.clone()]));
    }

    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        let props: Map<String, Value> = props
            .iter()
            .map(|(name, schema)| (name.clone(), narrow(schema, defs, depth + 1)))
            .collect();
        out.insert("properties".into(), Value::Object(props));
    }
    if let Some(required) = obj.get("required") {
        out.insert("required".into(), required.clone());
    }
    if let Some(items) = obj.get("items") {
        out.insert("items".into(), narrow(items, defs, depth + 1));
    }
    if let Some(description) = obj.get("description") {
        out.insert("description".into(), description.clone());
    }

    Value::Object(out)
}

/// String-constant unions collapse into an enum; `T | null` becomes nullable `T`.
fn narrow_union(variants: &[Value], defs: &Map<String, Value>, depth: usize) -> Value {
    let constants: Option<Vec<Value>> = variants
        .iter()
        .map(|v| v.get("const").or_else(|| single(v.get("enum"))).cloned())
        .collect();
    if let Some(constants) = constants {
        let mut out = Map::new();
        out.insert("type".into(), Value::String("STRING".into()));
        out.insert("enum".into(), Value::Array(constants));
        return Value::Object(out);
    }

    let is_null = |v: &Value| v.get("type").and_then(Value::as_str) == Some("null");
    let concrete: Vec<&Value> = variants.iter().filter(|v| !is_null(v)).collect();
    let mut resolved = match concrete.as_slice() {
        [only] => narrow(only, defs, depth + 1),
        _ => Value::Object(Map::new()),
    };
    if concrete.len() < variants.len() {
        if let Some(map) = resolved.as_object_mut() {
            map.insert("nullable".into(), Value::Bool(true));
        }
    }
    resolved
}

fn single(value: Option<&Value>) -> Option<&Value> {
    match value.and_then(Value::as_array).map(Vec::as_slice) {
        Some([only]) => Some(only),
        _ => None,
    }
}

fn copy_description(from: &Map<String, Value>, to: &mut Value) {
    if let (Some(description), Some(map)) = (from.get("description"), to.as_object_mut()) {
        map.insert("description".into(), description.clone());
    }
}
