//! Named, versioned transformations and the registry that resolves them
//!
//! A transform is registered once by the caller, together with its source or
//! documentation text. Records persist only a [`TransformRef`]; replay after a
//! reload looks the reference up in a [`TransformRegistry`].

use crate::error::{ChainError, Result};
use crate::value::{DataValue, Parameters};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by a transform function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransformError(pub String);

impl TransformError {
    /// Create a transform error from any message
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Signature every transform function implements.
pub type TransformFn =
    dyn Fn(&DataValue, &Parameters) -> std::result::Result<DataValue, TransformError> + Send + Sync;

/// Persistable identity of a transform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformRef {
    /// Registered name
    pub name: String,
    /// Registered version
    pub version: u32,
}

impl fmt::Display for TransformRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A named transformation plus the source text recorded for audit.
#[derive(Clone)]
pub struct Transform {
    name: String,
    version: u32,
    source: String,
    func: Arc<TransformFn>,
}

impl Transform {
    /// Create a transform
    ///
    /// # Examples
    ///
    /// ```
    /// use trove_domain::{DataValue, Transform};
    ///
    /// let shout = Transform::new("shout", 1, "uppercase the text", |value, _params| {
    ///     Ok(DataValue::Text(value.as_text().unwrap_or_default().to_uppercase()))
    /// });
    /// assert_eq!(shout.reference().to_string(), "shout@1");
    /// ```
    pub fn new<F>(name: impl Into<String>, version: u32, source: impl Into<String>, func: F) -> Self
    where
        F: Fn(&DataValue, &Parameters) -> std::result::Result<DataValue, TransformError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            version,
            source: source.into(),
            func: Arc::new(func),
        }
    }

    /// Registered name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered version
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Source or documentation text captured into records
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Persistable reference to this transform
    pub fn reference(&self) -> TransformRef {
        TransformRef {
            name: self.name.clone(),
            version: self.version,
        }
    }

    /// Apply the transform
    pub fn apply(&self, value: &DataValue, parameters: &Parameters) -> Result<DataValue> {
        (self.func)(value, parameters).map_err(|e| ChainError::TransformFailed {
            name: self.name.clone(),
            reason: e.0,
        })
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Caller-supplied table of transforms available for replay.
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    transforms: BTreeMap<String, Arc<Transform>>,
}

impl TransformRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform; names must be unique
    pub fn register(&mut self, transform: Transform) -> Result<Arc<Transform>> {
        if self.transforms.contains_key(transform.name()) {
            return Err(ChainError::DuplicateTransform(transform.name().to_string()));
        }
        let transform = Arc::new(transform);
        self.transforms
            .insert(transform.name().to_string(), Arc::clone(&transform));
        Ok(transform)
    }

    /// Look a transform up by name
    pub fn get(&self, name: &str) -> Option<Arc<Transform>> {
        self.transforms.get(name).cloned()
    }

    /// Resolve a persisted reference; name and version must both match
    pub fn resolve(&self, reference: &TransformRef) -> Option<Arc<Transform>> {
        self.transforms
            .get(&reference.name)
            .filter(|t| t.version() == reference.version)
            .cloned()
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.transforms.keys().map(String::as_str).collect()
    }

    /// Number of registered transforms
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str, version: u32) -> Transform {
        Transform::new(name, version, "fn identity(x) { x }", |v, _| Ok(v.clone()))
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = TransformRegistry::new();
        registry.register(identity("identity", 1)).unwrap();
        assert!(registry.get("identity").is_some());
        assert_eq!(registry.names(), vec!["identity"]);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = TransformRegistry::new();
        registry.register(identity("identity", 1)).unwrap();
        let err = registry.register(identity("identity", 2)).unwrap_err();
        assert!(matches!(err, ChainError::DuplicateTransform(name) if name == "identity"));
    }

    #[test]
    fn test_resolve_requires_matching_version() {
        let mut registry = TransformRegistry::new();
        registry.register(identity("identity", 2)).unwrap();

        let current = TransformRef { name: "identity".into(), version: 2 };
        let stale = TransformRef { name: "identity".into(), version: 1 };
        assert!(registry.resolve(&current).is_some());
        assert!(registry.resolve(&stale).is_none());
    }

    #[test]
    fn test_apply_maps_error() {
        let failing = Transform::new("boom", 1, "", |_, _| Err(TransformError::new("bad input")));
        let err = failing.apply(&DataValue::from("x"), &Parameters::new()).unwrap_err();
        assert_eq!(err.to_string(), "Transform 'boom' failed: bad input");
    }

    #[test]
    fn test_transform_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(TransformError::new("bad input"));
        assert_eq!(err.to_string(), "bad input");
    }
}
