//! OpenAPI Shaping
//!
//! Turns schemas into the fragments an OpenAPI 3.0 document needs:
//! parameter objects for query and path params, request bodies and
//! responses. Schemas are downgraded on the way out unless told otherwise;
//! validation always runs against the original schema.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{json, Value};

use crate::detect::needs_downgrade;
use crate::downgrade::downgrade;
use crate::error::{Result, SchemaError};
use crate::schema::{Schema, SchemaKind, SchemaRef};

const JSON_MEDIA_TYPE: &str = "application/json";

// =============================================================================
// Parameters
// =============================================================================

/// An OpenAPI parameter, minus its location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSchema {
    pub name: String,
    pub required: bool,
    /// Property schema without `description`, `example` and `examples`,
    /// which move up to the parameter itself
    pub schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Value>,
}

/// Parameter object for a single schema
pub fn param_schema(name: impl Into<String>, schema: &Schema, required: bool) -> ParamSchema {
    let mut json = schema.to_json();
    if let Value::Object(map) = &mut json {
        for key in ["description", "example", "examples"] {
            map.remove(key);
        }
    }
    ParamSchema {
        name: name.into(),
        required,
        schema: json,
        description: schema.options.description.clone(),
        example: schema.options.example.clone(),
        examples: schema.options.examples.clone(),
    }
}

/// One parameter per property of an object schema, in declaration order
pub fn param_schemas(schema: &Schema) -> Result<Vec<ParamSchema>> {
    let SchemaKind::Object(object) = &schema.kind else {
        return Err(SchemaError::NotAnObject(schema.tag().to_string()));
    };
    Ok(object
        .properties
        .iter()
        .map(|(name, property)| param_schema(name, property, object.is_required(name)))
        .collect())
}

/// JSON for documentation, downgraded when `downgrade` is set and the tree
/// contains something to downgrade.
pub fn document_schema(schema: &SchemaRef, downgrade_schema: bool) -> Value {
    if downgrade_schema && needs_downgrade(schema) {
        downgrade(schema).to_json()
    } else {
        schema.to_json()
    }
}

fn document_ref(schema: &SchemaRef, downgrade_schema: bool) -> SchemaRef {
    if downgrade_schema && needs_downgrade(schema) {
        downgrade(schema)
    } else {
        SchemaRef::clone(schema)
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Where a parameter lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Query,
    Path,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    #[serde(rename = "in")]
    pub location: ParamLocation,
    #[serde(flatten)]
    pub param: ParamSchema,
}

/// HTTP methods, with the status code their responses document by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Search,
    All,
}

impl HttpMethod {
    pub fn default_status(&self) -> u16 {
        match self {
            HttpMethod::Post => 201,
            HttpMethod::Delete => 204,
            _ => 200,
        }
    }
}

/// OpenAPI operation fragment for one route
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RouteDocs {
    #[serde(skip)]
    downgrade: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, Value>,
}

impl RouteDocs {
    /// Empty fragment; `downgrade` applies to every schema added later
    pub fn new(downgrade: bool) -> Self {
        Self {
            downgrade,
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

    /// One query parameter per property of an object schema
    pub fn query(mut self, schema: &SchemaRef) -> Result<Self> {
        let schema = document_ref(schema, self.downgrade);
        for param in param_schemas(&schema)? {
            self.parameters.push(Parameter {
                location: ParamLocation::Query,
                param,
            });
        }
        Ok(self)
    }

    /// A required path parameter
    pub fn path_param(mut self, name: impl Into<String>, schema: &SchemaRef) -> Self {
        let schema = document_ref(schema, self.downgrade);
        self.parameters.push(Parameter {
            location: ParamLocation::Path,
            param: param_schema(name, &schema, true),
        });
        self
    }

    pub fn body(mut self, schema: &SchemaRef) -> Self {
        self.request_body = Some(json!({
            "content": { JSON_MEDIA_TYPE: { "schema": document_schema(schema, self.downgrade) } }
        }));
        self
    }

    pub fn response(mut self, status: u16, schema: &SchemaRef) -> Self {
        self.responses.insert(
            status.to_string(),
            json!({
                "description": "",
                "content": { JSON_MEDIA_TYPE: { "schema": document_schema(schema, self.downgrade) } }
            }),
        );
        self
    }

    pub fn to_json(&self) -> Value {
        // plain data, serialization cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{kinds, ObjectSchema};

    #[test]
    fn test_param_schema_moves_docs_keys() {
        let schema = Schema::string()
            .with_description("Search term")
            .with_example(json!("rust"))
            .with_min_length(1);
        let param = param_schema("q", &schema, false);
        assert_eq!(param.schema, json!({"type": "string", "minLength": 1}));
        assert_eq!(param.description.as_deref(), Some("Search term"));
        assert_eq!(param.example, Some(json!("rust")));
        assert_eq!(param.examples, None);
    }

    #[test]
    fn test_param_schemas_required_flags() {
        let schema = Schema::from(
            ObjectSchema::new()
                .property("page", Schema::integer())
                .optional("q", Schema::string()),
        );
        let params = param_schemas(&schema).unwrap();
        let flags: Vec<_> = params.iter().map(|p| (p.name.as_str(), p.required)).collect();
        assert_eq!(flags, vec![("page", true), ("q", false)]);
    }

    #[test]
    fn test_param_schemas_rejects_non_object() {
        assert!(matches!(
            param_schemas(&Schema::string()),
            Err(SchemaError::NotAnObject(tag)) if tag == "String"
        ));
    }

    #[test]
    fn test_document_schema_downgrade_flag() {
        let schema = kinds::nullable(Schema::string()).into_ref();
        assert_eq!(
            document_schema(&schema, true),
            json!({"type": "string", "nullable": true})
        );
        assert_eq!(
            document_schema(&schema, false),
            json!({"anyOf": [{"type": "string"}, {"type": "null"}]})
        );
    }

    #[test]
    fn test_route_docs_fragment() {
        let query = Schema::from(
            ObjectSchema::new()
                .nullish("cursor", Schema::string())
                .optional("limit", Schema::integer()),
        )
        .into_ref();
        let docs = RouteDocs::new(true)
            .summary("List users")
            .query(&query)
            .unwrap()
            .path_param("org", &kinds::uuid().into_ref())
            .response(200, &Schema::array(Schema::string()).into_ref());

        assert_eq!(
            docs.to_json(),
            json!({
                "summary": "List users",
                "parameters": [
                    {"in": "query", "name": "cursor", "required": false,
                     "schema": {"type": "string", "nullable": true}},
                    {"in": "query", "name": "limit", "required": false,
                     "schema": {"type": "integer"}},
                    {"in": "path", "name": "org", "required": true,
                     "schema": {"type": "string", "format": "uuid"}}
                ],
                "responses": {
                    "200": {
                        "description": "",
                        "content": {"application/json": {"schema": {"type": "array", "items": {"type": "string"}}}}
                    }
                }
            })
        );
    }

    #[test]
    fn test_default_status() {
        assert_eq!(HttpMethod::Post.default_status(), 201);
        assert_eq!(HttpMethod::Delete.default_status(), 204);
        assert_eq!(HttpMethod::Get.default_status(), 200);
    }
}
