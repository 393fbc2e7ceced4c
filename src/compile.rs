//! Checker Compilation and Caching
//!
//! [`TypeCompiler`] turns a schema plus its `$ref` targets into a
//! [`TypeCheck`]; [`CompileCache`] memoizes that work per schema *reference*.
//! Two structurally equal schemas behind different `Arc`s compile separately;
//! the same `Arc` compiles once for the life of the cache.
//!
//! Concurrent misses for one schema may both compile. The first result stored
//! wins and every caller gets that one.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{CheckError, Result, SchemaError};
use crate::schema::{Schema, SchemaKind, SchemaRef};
use crate::value::{self, Resolver, ValueErrorIterator};

// =============================================================================
// Compiler
// =============================================================================

/// Builds a checker for a schema
pub trait Compiler {
    type Output;

    fn compile(&self, schema: &SchemaRef, references: &[SchemaRef]) -> Result<Self::Output>;
}

/// The default compiler: resolves refs and precompiles patterns up front
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeCompiler;

impl Compiler for TypeCompiler {
    type Output = TypeCheck;

    fn compile(&self, schema: &SchemaRef, references: &[SchemaRef]) -> Result<TypeCheck> {
        let mut patterns = HashMap::new();
        prepare(schema, references, &mut patterns)?;
        for reference in references {
            prepare(reference, references, &mut patterns)?;
        }
        Ok(TypeCheck {
            schema: Arc::clone(schema),
            references: references.to_vec(),
            patterns,
        })
    }
}

/// Verify every `$ref` resolves and compile every `pattern`.
fn prepare(
    schema: &Schema,
    references: &[SchemaRef],
    patterns: &mut HashMap<String, Regex>,
) -> Result<()> {
    match &schema.kind {
        SchemaKind::Ref(id) => {
            if !references.iter().any(|r| r.id() == Some(id.as_str())) {
                return Err(SchemaError::UnresolvedReference(id.clone()));
            }
        }
        SchemaKind::String(bounds) => {
            if let Some(pattern) = &bounds.pattern {
                if !patterns.contains_key(pattern) {
                    let regex = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    })?;
                    patterns.insert(pattern.clone(), regex);
                }
            }
        }
        _ => {}
    }
    for child in schema.kind.children() {
        prepare(child, references, patterns)?;
    }
    Ok(())
}

// =============================================================================
// Type Check
// =============================================================================

/// Compiled checker
#[derive(Debug)]
pub struct TypeCheck {
    schema: SchemaRef,
    references: Vec<SchemaRef>,
    patterns: HashMap<String, Regex>,
}

impl TypeCheck {
    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.references).with_patterns(&self.patterns)
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn references(&self) -> &[SchemaRef] {
        &self.references
    }

    pub fn check(&self, value: &Value) -> bool {
        self.resolver().check(&self.schema, value)
    }

    pub fn errors(&self, value: &Value) -> ValueErrorIterator {
        self.resolver().errors(&self.schema, value)
    }

    /// Check `value`, then run decode codecs
    pub fn decode(&self, value: Value) -> Result<Value> {
        if let Some(error) = self.errors(&value).first() {
            return Err(SchemaError::DecodeCheck(Box::new(CheckError {
                schema: Arc::clone(&self.schema),
                value,
                error,
            })));
        }
        value::transform_decode(&self.schema, &self.references, value)
    }

    /// Run encode codecs, then check the result
    pub fn encode(&self, value: Value) -> Result<Value> {
        let encoded = value::transform_encode(&self.schema, &self.references, value)?;
        if let Some(error) = self.errors(&encoded).first() {
            return Err(SchemaError::EncodeCheck(Box::new(CheckError {
                schema: Arc::clone(&self.schema),
                value: encoded,
                error,
            })));
        }
        Ok(encoded)
    }
}

// =============================================================================
// Cache
// =============================================================================

struct CacheEntry<T> {
    // held so the address used as key is never reused while cached
    _schema: SchemaRef,
    checker: Arc<T>,
}

/// Identity-keyed memo of compiled checkers
pub struct CompileCache<C: Compiler> {
    compiler: C,
    entries: RwLock<HashMap<usize, CacheEntry<C::Output>>>,
}

impl<C: Compiler + Default> Default for CompileCache<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: Compiler> CompileCache<C> {
    pub fn new(compiler: C) -> Self {
        Self {
            compiler,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Cached checker for `schema`, compiling on first sight of this `Arc`.
    ///
    /// `references` only matter on a miss; later calls with different
    /// references get the checker compiled first.
    pub fn get_or_compile(&self, schema: &SchemaRef, references: &[SchemaRef]) -> Result<Arc<C::Output>> {
        let key = Arc::as_ptr(schema) as usize;
        if let Some(entry) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(&entry.checker));
        }

        // compile outside the lock
        let checker = Arc::new(self.compiler.compile(schema, references)?);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(key).or_insert_with(|| CacheEntry {
            _schema: Arc::clone(schema),
            checker,
        });
        Ok(Arc::clone(&entry.checker))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }
}

static GLOBAL_CACHE: Lazy<CompileCache<TypeCompiler>> = Lazy::new(CompileCache::default);

/// Compile through the process-wide cache
pub fn cache_compile(schema: &SchemaRef, references: &[SchemaRef]) -> Result<Arc<TypeCheck>> {
    GLOBAL_CACHE.get_or_compile(schema, references)
}
