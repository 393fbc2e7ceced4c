//! Typed Schemas
//!
//! Schema-driven validation and OpenAPI shaping for JSON APIs.
//!
//! ## Features
//!
//! - **Schema Model**: JSON Schema nodes plus custom kinds (`UnionEnum`,
//!   `UnionOneOf`, transforms) and builders for the common API shapes
//! - **OpenAPI Downgrade**: Rewrites `T | null` unions and bare literals into
//!   forms OpenAPI 3.0 understands
//! - **Value Engine**: check, clean, convert, default and transform passes
//! - **Compile Cache**: One checker per schema node, shared process-wide
//! - **Readable Errors**: Enhanced, path-merged error reports for clients
//! - **Route Adapter**: Request/response pipelines and operation docs
//! - **Env Loader**: Typed settings from environment variables
//!
//! ## Layout
//!
//! ```text
//! schema/      model, JSON mapping, utility kinds
//! guard        kind predicates
//! downgrade    OpenAPI 3.0 rewrite
//! detect       tree queries (needs_downgrade, ids, transforms)
//! value/       check, clean, convert, default, transform
//! compile      checker compilation + identity-keyed cache
//! enhance      error enhancement, format_path
//! merge        per-path error aggregation
//! openapi      parameter and operation fragments
//! pipeline     route validation
//! env          environment loader
//! config       toolkit configuration
//! ```

pub mod compile;
pub mod config;
pub mod detect;
pub mod downgrade;
pub mod enhance;
pub mod env;
pub mod error;
pub mod formats;
pub mod guard;
pub mod merge;
pub mod openapi;
pub mod pipeline;
pub mod schema;
pub mod value;

pub use compile::{cache_compile, CompileCache, Compiler, TypeCheck, TypeCompiler};
pub use config::ToolkitConfig;
pub use detect::{collect_ids, has_id, has_transform, needs_downgrade};
pub use downgrade::downgrade;
pub use enhance::{enhance_errors, enhance_errors_with, format_path, EnhanceOptions, EnhancedError};
pub use env::{create_env, create_env_from_process};
pub use error::{CheckError, Result, SchemaError, ValidationFailure};
pub use merge::{merge_errors, MergedError};
pub use openapi::{param_schema, param_schemas, HttpMethod, ParamSchema, RouteDocs};
pub use pipeline::{RequestPart, RequiredParts, RouteSchemas, RouteValidator};
pub use schema::{Schema, SchemaKind, SchemaRef};
pub use value::{ValueError, ValueErrorType};
