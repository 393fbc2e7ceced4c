//! Schema node model
//!
//! A [`Schema`] is an immutable tree node: a [`SchemaKind`] discriminant with
//! kind-specific fields, plus [`SchemaOptions`] metadata shared by every kind.
//! Children are held as [`SchemaRef`] (`Arc<Schema>`) so transformations can
//! share untouched subtrees and the compile cache can key on identity.
//!
//! ```
//! use typed_schemas::schema::{ObjectSchema, Schema};
//!
//! let user = Schema::from(
//!     ObjectSchema::new()
//!         .property("id", Schema::string().with_format("uuid"))
//!         .optional("nickname", Schema::string()),
//! )
//! .into_ref();
//! assert_eq!(user.tag(), "Object");
//! ```

pub mod json;
pub mod kinds;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

/// Shared, immutable reference to a schema node.
pub type SchemaRef = Arc<Schema>;

// =============================================================================
// Options
// =============================================================================

/// Metadata carried by every schema kind
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaOptions {
    /// `$id`
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// String format name (`email`, `uuid`, ...), checked via the format registry
    pub format: Option<String>,
    pub default: Option<Value>,
    pub example: Option<Value>,
    pub examples: Option<Value>,
    /// OpenAPI 3.0 `nullable` marker; documentation only, never validated
    pub nullable: bool,
    /// Keywords without a dedicated field, emitted as-is
    pub extensions: Map<String, Value>,
}

// =============================================================================
// Value Types
// =============================================================================

/// JSON `type` keyword values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }

    pub fn from_json_type(type_str: &str) -> Option<Self> {
        match type_str {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compare two JSON numbers by value, so `1` and `1.0` are equal.
pub(crate) fn numbers_equal(a: &Number, b: &Number) -> bool {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x == y,
        _ => a.as_f64() == b.as_f64(),
    }
}

/// Constant of a literal schema
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Boolean(bool),
    Number(Number),
    String(String),
}

impl LiteralValue {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Number(n) => Some(Self::Number(n.clone())),
            Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Boolean(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
        }
    }

    /// The `type` an OpenAPI 3.0 consumer expects for this constant
    pub fn json_type(&self) -> JsonType {
        match self {
            Self::Boolean(_) => JsonType::Boolean,
            Self::Number(_) => JsonType::Number,
            Self::String(_) => JsonType::String,
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Boolean(a), Value::Bool(b)) => a == b,
            (Self::Number(a), Value::Number(b)) => numbers_equal(a, b),
            (Self::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for LiteralValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for LiteralValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for LiteralValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for LiteralValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Member of a [`SchemaKind::UnionEnum`]
#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
    String(String),
    Number(Number),
}

impl EnumValue {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Number(n) => Some(Self::Number(n.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Number(n) => Value::Number(n.clone()),
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String(a), Value::String(b)) => a == b,
            (Self::Number(a), Value::Number(b)) => numbers_equal(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for EnumValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i32> for EnumValue {
    fn from(value: i32) -> Self {
        Self::Number(value.into())
    }
}

impl From<i64> for EnumValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

// =============================================================================
// Kind-Specific Fields
// =============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberBounds {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringBounds {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
}

/// `{"const": ...}`, optionally with the redundant `type`/`enum` keywords
/// OpenAPI 3.0 tooling needs.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralSchema {
    pub value: LiteralValue,
    pub json_type: Option<JsonType>,
    pub enum_values: Option<Vec<LiteralValue>>,
}

impl LiteralSchema {
    pub fn new(value: impl Into<LiteralValue>) -> Self {
        Self {
            value: value.into(),
            json_type: None,
            enum_values: None,
        }
    }

    /// Both `type` and `enum` are present
    pub fn is_enriched(&self) -> bool {
        self.json_type.is_some() && self.enum_values.is_some()
    }

    /// Copy with `type` and `enum` derived from the constant
    pub fn enriched(&self) -> Self {
        Self {
            value: self.value.clone(),
            json_type: Some(self.value.json_type()),
            enum_values: Some(vec![self.value.clone()]),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub items: SchemaRef,
    pub min_items: Option<usize>,
    pub max_items: Option<usize>,
}

/// `additionalProperties` of an object schema
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdditionalProperties {
    /// Keyword absent
    #[default]
    Allow,
    /// `false`
    Deny,
    Schema(SchemaRef),
}

/// Object schema with properties kept in declaration order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    pub properties: IndexMap<String, SchemaRef>,
    pub required: Vec<String>,
    pub additional_properties: AdditionalProperties,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required property
    pub fn property(mut self, name: impl Into<String>, schema: impl Into<SchemaRef>) -> Self {
        let name = name.into();
        if !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema.into());
        self
    }

    /// Add an optional property
    pub fn optional(mut self, name: impl Into<String>, schema: impl Into<SchemaRef>) -> Self {
        let name = name.into();
        self.required.retain(|r| r != &name);
        self.properties.insert(name, schema.into());
        self
    }

    /// Add an optional property that also accepts `null`
    pub fn nullish(self, name: impl Into<String>, schema: impl Into<SchemaRef>) -> Self {
        self.optional(name, kinds::nullable(schema))
    }

    pub fn additional_properties(mut self, additional: AdditionalProperties) -> Self {
        self.additional_properties = additional;
        self
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required.iter().any(|r| r == name)
    }
}

/// String-keyed map
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    pub value: SchemaRef,
}

/// Decode/encode conversion applied around a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// RFC 3339 string, normalized to UTC with millisecond precision
    DateTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformSchema {
    pub inner: SchemaRef,
    pub codec: Codec,
}

// =============================================================================
// Schema Kind
// =============================================================================

/// Discriminant plus kind-specific fields
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Any,
    Null,
    Boolean,
    Integer(NumberBounds),
    Number(NumberBounds),
    String(StringBounds),
    Literal(LiteralSchema),
    Array(ArraySchema),
    Object(ObjectSchema),
    Record(RecordSchema),
    /// `anyOf`
    Union(Vec<SchemaRef>),
    /// `allOf`
    Intersect(Vec<SchemaRef>),
    /// `enum` over strings/numbers, checked as a single custom kind
    UnionEnum(Vec<EnumValue>),
    /// `oneOf`: exactly one branch must match
    UnionOneOf(Vec<SchemaRef>),
    /// `$ref` to a schema by `$id`
    Ref(String),
    Transform(TransformSchema),
}

impl SchemaKind {
    /// Kind tag, as used by the checker in `Kind` errors
    pub fn tag(&self) -> &'static str {
        match self {
            SchemaKind::Any => "Any",
            SchemaKind::Null => "Null",
            SchemaKind::Boolean => "Boolean",
            SchemaKind::Integer(_) => "Integer",
            SchemaKind::Number(_) => "Number",
            SchemaKind::String(_) => "String",
            SchemaKind::Literal(_) => "Literal",
            SchemaKind::Array(_) => "Array",
            SchemaKind::Object(_) => "Object",
            SchemaKind::Record(_) => "Record",
            SchemaKind::Union(_) => "Union",
            SchemaKind::Intersect(_) => "Intersect",
            SchemaKind::UnionEnum(_) => "UnionEnum",
            SchemaKind::UnionOneOf(_) => "UnionOneOf",
            SchemaKind::Ref(_) => "Ref",
            SchemaKind::Transform(_) => "Transform",
        }
    }

    /// Direct children, in declaration order
    pub fn children(&self) -> Vec<&SchemaRef> {
        match self {
            SchemaKind::Array(array) => vec![&array.items],
            SchemaKind::Object(object) => {
                let mut children: Vec<&SchemaRef> = object.properties.values().collect();
                if let AdditionalProperties::Schema(additional) = &object.additional_properties {
                    children.push(additional);
                }
                children
            }
            SchemaKind::Record(record) => vec![&record.value],
            SchemaKind::Union(branches)
            | SchemaKind::Intersect(branches)
            | SchemaKind::UnionOneOf(branches) => branches.iter().collect(),
            SchemaKind::Transform(transform) => vec![&transform.inner],
            _ => Vec::new(),
        }
    }
}

// =============================================================================
// Schema
// =============================================================================

/// A schema node
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    pub options: SchemaOptions,
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            options: SchemaOptions::default(),
        }
    }

    pub fn into_ref(self) -> SchemaRef {
        Arc::new(self)
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    pub fn id(&self) -> Option<&str> {
        self.options.id.as_deref()
    }

    // -------------------------------------------------------------------------
    // Constructors
    // -------------------------------------------------------------------------

    pub fn any() -> Self {
        Self::new(SchemaKind::Any)
    }

    pub fn null() -> Self {
        Self::new(SchemaKind::Null)
    }

    pub fn boolean() -> Self {
        Self::new(SchemaKind::Boolean)
    }

    pub fn integer() -> Self {
        Self::new(SchemaKind::Integer(NumberBounds::default()))
    }

    pub fn number() -> Self {
        Self::new(SchemaKind::Number(NumberBounds::default()))
    }

    pub fn string() -> Self {
        Self::new(SchemaKind::String(StringBounds::default()))
    }

    /// Bare literal: `{"const": value}`
    pub fn literal(value: impl Into<LiteralValue>) -> Self {
        Self::new(SchemaKind::Literal(LiteralSchema::new(value)))
    }

    pub fn array(items: impl Into<SchemaRef>) -> Self {
        Self::new(SchemaKind::Array(ArraySchema {
            items: items.into(),
            min_items: None,
            max_items: None,
        }))
    }

    /// Object whose properties are all required
    pub fn object<I, K, S>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, S)>,
        K: Into<String>,
        S: Into<SchemaRef>,
    {
        let object = properties
            .into_iter()
            .fold(ObjectSchema::new(), |object, (name, schema)| object.property(name, schema));
        Self::new(SchemaKind::Object(object))
    }

    pub fn record(value: impl Into<SchemaRef>) -> Self {
        Self::new(SchemaKind::Record(RecordSchema { value: value.into() }))
    }

    pub fn union<I, S>(branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SchemaRef>,
    {
        Self::new(SchemaKind::Union(branches.into_iter().map(Into::into).collect()))
    }

    pub fn intersect<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SchemaRef>,
    {
        Self::new(SchemaKind::Intersect(members.into_iter().map(Into::into).collect()))
    }

    /// `{"$ref": id}`
    pub fn reference(id: impl Into<String>) -> Self {
        Self::new(SchemaKind::Ref(id.into()))
    }

    pub fn transform(inner: impl Into<SchemaRef>, codec: Codec) -> Self {
        Self::new(SchemaKind::Transform(TransformSchema {
            inner: inner.into(),
            codec,
        }))
    }

    // -------------------------------------------------------------------------
    // Options
    // -------------------------------------------------------------------------

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.options.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.options.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.options.description = Some(description.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.options.format = Some(format.into());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.options.default = Some(default);
        self
    }

    pub fn with_example(mut self, example: Value) -> Self {
        self.options.example = Some(example);
        self
    }

    pub fn with_examples(mut self, examples: Value) -> Self {
        self.options.examples = Some(examples);
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.options.nullable = nullable;
        self
    }

    pub fn with_extension(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.extensions.insert(key.into(), value);
        self
    }

    // -------------------------------------------------------------------------
    // Constraints (ignored by kinds they don't apply to)
    // -------------------------------------------------------------------------

    pub fn with_minimum(mut self, minimum: f64) -> Self {
        if let SchemaKind::Integer(bounds) | SchemaKind::Number(bounds) = &mut self.kind {
            bounds.minimum = Some(minimum);
        }
        self
    }

    pub fn with_maximum(mut self, maximum: f64) -> Self {
        if let SchemaKind::Integer(bounds) | SchemaKind::Number(bounds) = &mut self.kind {
            bounds.maximum = Some(maximum);
        }
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        if let SchemaKind::String(bounds) = &mut self.kind {
            bounds.min_length = Some(min_length);
        }
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        if let SchemaKind::String(bounds) = &mut self.kind {
            bounds.max_length = Some(max_length);
        }
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        if let SchemaKind::String(bounds) = &mut self.kind {
            bounds.pattern = Some(pattern.into());
        }
        self
    }

    pub fn with_min_items(mut self, min_items: usize) -> Self {
        if let SchemaKind::Array(array) = &mut self.kind {
            array.min_items = Some(min_items);
        }
        self
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        if let SchemaKind::Array(array) = &mut self.kind {
            array.max_items = Some(max_items);
        }
        self
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Self::new(SchemaKind::Object(object))
    }
}

impl From<ObjectSchema> for SchemaRef {
    fn from(object: ObjectSchema) -> Self {
        Arc::new(Schema::from(object))
    }
}
