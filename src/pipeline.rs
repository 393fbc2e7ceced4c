//! Route Validation
//!
//! Framework-agnostic request/response validation for one route. A web
//! framework integration hands each request part to
//! [`RouteValidator::transform`] and each response to
//! [`RouteValidator::encode_response`]:
//!
//! | part     | steps                                      |
//! |----------|--------------------------------------------|
//! | body     | clean → decode                             |
//! | query    | clean → convert → default → decode         |
//! | param    | split arrays on `,` → convert → decode     |
//! | response | encode → clean                             |
//!
//! Checkers come from the process-wide compile cache, so a validator can be
//! built per request without recompiling.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::compile::{cache_compile, TypeCheck};
use crate::config::ToolkitConfig;
use crate::detect::has_transform;
use crate::enhance::EnhanceOptions;
use crate::error::{Result, SchemaError, ValidationFailure};
use crate::guard;
use crate::merge::MergedError;
use crate::openapi::RouteDocs;
use crate::schema::SchemaRef;
use crate::value;

// =============================================================================
// Route Schemas
// =============================================================================

/// Parts that must have a schema whenever they carry a value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredParts {
    pub body: bool,
    pub query: bool,
    pub params: bool,
    pub response: bool,
}

/// Schemas and options for one route
#[derive(Debug, Clone)]
pub struct RouteSchemas {
    pub summary: Option<String>,
    pub description: Option<String>,
    /// Object schema; each property documents as a query parameter
    pub query: Option<SchemaRef>,
    pub body: Option<SchemaRef>,
    pub response: Option<SchemaRef>,
    /// Path parameter name → schema
    pub params: IndexMap<String, SchemaRef>,
    /// `$ref` targets for every schema above
    pub references: Vec<SchemaRef>,
    pub required: RequiredParts,
    /// When false, responses only run encode codecs and are never checked
    pub validate_response: bool,
    /// Downgrade schemas in [`RouteValidator::docs`]
    pub downgrade_schema: bool,
    /// Options for [`ValidationFailure::report`]
    pub enhance: EnhanceOptions,
    pub strip_empty_paths: bool,
}

impl Default for RouteSchemas {
    fn default() -> Self {
        Self {
            summary: None,
            description: None,
            query: None,
            body: None,
            response: None,
            params: IndexMap::new(),
            references: Vec::new(),
            required: RequiredParts::default(),
            validate_response: true,
            downgrade_schema: true,
            enhance: EnhanceOptions::default(),
            strip_empty_paths: false,
        }
    }
}

impl RouteSchemas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults taken from loaded configuration
    pub fn from_config(config: &ToolkitConfig) -> Self {
        Self {
            validate_response: config.validation.validate_response,
            downgrade_schema: config.openapi.downgrade,
            enhance: config.enhance_options(),
            strip_empty_paths: config.validation.strip_empty_paths,
            ..Self::default()
        }
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn query(mut self, schema: impl Into<SchemaRef>) -> Self {
        self.query = Some(schema.into());
        self
    }

    pub fn body(mut self, schema: impl Into<SchemaRef>) -> Self {
        self.body = Some(schema.into());
        self
    }

    pub fn response(mut self, schema: impl Into<SchemaRef>) -> Self {
        self.response = Some(schema.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, schema: impl Into<SchemaRef>) -> Self {
        self.params.insert(name.into(), schema.into());
        self
    }

    pub fn reference(mut self, schema: impl Into<SchemaRef>) -> Self {
        self.references.push(schema.into());
        self
    }

    pub fn required(mut self, required: RequiredParts) -> Self {
        self.required = required;
        self
    }

    pub fn validate_response(mut self, validate: bool) -> Self {
        self.validate_response = validate;
        self
    }

    pub fn downgrade_schema(mut self, downgrade: bool) -> Self {
        self.downgrade_schema = downgrade;
        self
    }

    pub fn enhance(mut self, options: EnhanceOptions) -> Self {
        self.enhance = options;
        self
    }

    pub fn strip_empty_paths(mut self, strip: bool) -> Self {
        self.strip_empty_paths = strip;
        self
    }
}

/// Which part of a request a value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPart {
    Body,
    Query,
    /// Path parameter by name
    Param(String),
}

impl RequestPart {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPart::Body => "body",
            RequestPart::Query => "query",
            RequestPart::Param(_) => "param",
        }
    }
}

impl fmt::Display for RequestPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `null`, `false`, `0`, `""`, `[]` and `{}`
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Validates and shapes the parts of one route
#[derive(Debug, Clone)]
pub struct RouteValidator {
    schemas: RouteSchemas,
}

impl RouteValidator {
    pub fn new(schemas: RouteSchemas) -> Self {
        Self { schemas }
    }

    pub fn schemas(&self) -> &RouteSchemas {
        &self.schemas
    }

    /// Clean, coerce, check and decode one request part
    pub fn transform(&self, part: &RequestPart, value: Value) -> Result<Value> {
        let refs = &self.schemas.references;
        match part {
            RequestPart::Body => {
                let Some(schema) = &self.schemas.body else {
                    return self.unschematized(part, self.schemas.required.body, value);
                };
                let value = value::clean(schema, refs, value);
                self.decode(part, schema, value)
            }
            RequestPart::Query => {
                let Some(schema) = &self.schemas.query else {
                    return self.unschematized(part, self.schemas.required.query, value);
                };
                let value = value::clean(schema, refs, value);
                let value = value::convert(schema, refs, value);
                let value = value::default(schema, refs, value);
                self.decode(part, schema, value)
            }
            RequestPart::Param(name) => {
                let Some(schema) = self.schemas.params.get(name) else {
                    if self.schemas.required.params {
                        warn!(param = %name, "no schema for path parameter");
                        return Err(SchemaError::MissingSchema {
                            part: part.to_string(),
                            name: Some(name.clone()),
                        });
                    }
                    return Ok(value);
                };
                let value = match value {
                    Value::String(text) if guard::is_array(schema) => Value::Array(
                        text.split(',').map(|item| Value::String(item.to_string())).collect(),
                    ),
                    other => other,
                };
                let value = value::convert(schema, refs, value);
                self.decode(part, schema, value)
            }
        }
    }

    /// Encode and clean a handler's return value
    pub fn encode_response(&self, value: Option<Value>) -> Result<Option<Value>> {
        let refs = &self.schemas.references;
        let Some(schema) = &self.schemas.response else {
            if value.is_some() && self.schemas.required.response {
                warn!("response returned without a response schema");
                return Err(SchemaError::MissingSchema {
                    part: "response".to_string(),
                    name: None,
                });
            }
            return Ok(value);
        };
        let Some(value) = value else {
            return Ok(None);
        };

        let encoded = if self.schemas.validate_response {
            let checker = cache_compile(schema, refs)?;
            checker
                .encode(value)
                .map_err(|err| self.validation_error("response", &checker, err))?
        } else if has_transform(schema) {
            value::transform_encode(schema, refs, value)?
        } else {
            value
        };
        Ok(Some(value::clean(schema, refs, encoded)))
    }

    /// OpenAPI fragment for this route, documenting the response under
    /// `status`
    pub fn docs(&self, status: u16) -> Result<RouteDocs> {
        let schemas = &self.schemas;
        let mut docs = RouteDocs::new(schemas.downgrade_schema);
        if let Some(summary) = &schemas.summary {
            docs = docs.summary(summary.clone());
        }
        if let Some(description) = &schemas.description {
            docs = docs.description(description.clone());
        }
        if let Some(query) = &schemas.query {
            docs = docs.query(query)?;
        }
        if let Some(body) = &schemas.body {
            docs = docs.body(body);
        }
        if let Some(response) = &schemas.response {
            docs = docs.response(status, response);
        }
        for (name, schema) in &schemas.params {
            docs = docs.path_param(name.clone(), schema);
        }
        Ok(docs)
    }

    /// Per-path report for a failure, using the route's enhance options
    pub fn report(&self, failure: &ValidationFailure) -> Vec<MergedError> {
        failure.report(&self.schemas.enhance, self.schemas.strip_empty_paths)
    }

    fn unschematized(&self, part: &RequestPart, required: bool, value: Value) -> Result<Value> {
        if required && !is_empty(&value) {
            warn!(part = %part, "value received without a schema");
            return Err(SchemaError::MissingSchema {
                part: part.to_string(),
                name: None,
            });
        }
        Ok(value)
    }

    fn decode(&self, part: &RequestPart, schema: &SchemaRef, value: Value) -> Result<Value> {
        let checker = cache_compile(schema, &self.schemas.references)?;
        checker
            .decode(value)
            .map_err(|err| self.validation_error(part.as_str(), &checker, err))
    }

    fn validation_error(&self, part: &str, checker: &TypeCheck, err: SchemaError) -> SchemaError {
        match err {
            SchemaError::DecodeCheck(check) | SchemaError::EncodeCheck(check) => {
                let errors = checker.errors(&check.value);
                let failure =
                    ValidationFailure::new(part, *check, errors).with_references(checker.references());
                debug!(
                    part,
                    path = %failure.error.path,
                    errors = failure.errors.len(),
                    "validation failed"
                );
                SchemaError::Validation(Box::new(failure))
            }
            other => other,
        }
    }
}
