use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::blueprint::Blueprint;
use crate::lazy::LazyValue;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Dynamic value flowing through fixtures.
///
/// Objects and blueprints compare by identity, everything else structurally.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Object(ObjectRef),
    Blueprint(Arc<Blueprint>),
    Lazy(LazyValue),
    Sequence(Sequence),
    /// Marks a post-generation hook that received no extracted value.
    NotProvided,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Blueprint(_) => "blueprint",
            Value::Lazy(_) => "lazy",
            Value::Sequence(_) => "sequence",
            Value::NotProvided => "not_provided",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_blueprint(&self) -> Option<&Arc<Blueprint>> {
        match self {
            Value::Blueprint(blueprint) => Some(blueprint),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_provided(&self) -> bool {
        !matches!(self, Value::NotProvided)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::NotProvided, Value::NotProvided) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Blueprint(a), Value::Blueprint(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::NotProvided => f.write_str("NotProvided"),
            Value::Bool(value) => write!(f, "Bool({value})"),
            Value::Int(value) => write!(f, "Int({value})"),
            Value::Float(value) => write!(f, "Float({value})"),
            Value::Text(value) => write!(f, "Text({value:?})"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(object) => object.fmt(f),
            Value::Blueprint(blueprint) => write!(f, "Blueprint({})", blueprint.name()),
            Value::Lazy(lazy) => lazy.fmt(f),
            Value::Sequence(_) => f.write_str("Sequence(..)"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Value::Object(object)
    }
}

impl From<Arc<Blueprint>> for Value {
    fn from(blueprint: Arc<Blueprint>) -> Self {
        Value::Blueprint(blueprint)
    }
}

impl From<LazyValue> for Value {
    fn from(lazy: LazyValue) -> Self {
        Value::Lazy(lazy)
    }
}

impl From<Sequence> for Value {
    fn from(sequence: Sequence) -> Self {
        Value::Sequence(sequence)
    }
}

/// A constructed model instance. Fields stay mutable so post-generation hooks can
/// attach data after construction.
pub struct Object {
    id: u64,
    model: String,
    fields: RwLock<IndexMap<String, Value>>,
}

/// Shared handle to an [`Object`]; clones point at the same instance.
#[derive(Clone)]
pub struct ObjectRef(Arc<Object>);

impl ObjectRef {
    pub fn new(model: impl Into<String>, fields: IndexMap<String, Value>) -> Self {
        ObjectRef(Arc::new(Object {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            model: model.into(),
            fields: RwLock::new(fields),
        }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn model(&self) -> &str {
        &self.0.model
    }

    pub fn get(&self, field: &str) -> Option<Value> {
        let fields = self.0.fields.read().unwrap_or_else(PoisonError::into_inner);
        fields.get(field).cloned()
    }

    pub fn set(&self, field: impl Into<String>, value: Value) {
        let mut fields = self.0.fields.write().unwrap_or_else(PoisonError::into_inner);
        fields.insert(field.into(), value);
    }

    /// Appends to a list field, creating it when absent.
    pub fn push(&self, field: &str, value: Value) {
        let mut fields = self.0.fields.write().unwrap_or_else(PoisonError::into_inner);
        match fields.get_mut(field) {
            Some(Value::List(items)) => items.push(value),
            _ => {
                fields.insert(field.to_string(), Value::List(vec![value]));
            }
        }
    }

    pub fn field_names(&self) -> Vec<String> {
        let fields = self.0.fields.read().unwrap_or_else(PoisonError::into_inner);
        fields.keys().cloned().collect()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    // Fields are left out: reverse associations make object graphs cyclic.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.0.model, self.0.id)
    }
}

/// Value computed from the build step's sequence number at construction time.
#[derive(Clone)]
pub struct Sequence(Arc<dyn Fn(u64) -> Value + Send + Sync>);

impl Sequence {
    pub fn new(f: impl Fn(u64) -> Value + Send + Sync + 'static) -> Self {
        Sequence(Arc::new(f))
    }

    pub fn value_at(&self, sequence: u64) -> Value {
        (self.0)(sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objects_compare_by_identity() {
        let a = ObjectRef::new("Author", IndexMap::new());
        let b = ObjectRef::new("Author", IndexMap::new());
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn not_provided_is_distinct_from_falsy_values() {
        assert!(!Value::NotProvided.is_provided());
        assert!(Value::Null.is_provided());
        assert!(Value::Bool(false).is_provided());
        assert_ne!(Value::NotProvided, Value::Null);
    }

    #[test]
    fn push_creates_and_extends_lists() {
        let author = ObjectRef::new("Author", IndexMap::new());
        author.push("books", Value::from("first"));
        author.push("books", Value::from("second"));
        assert_eq!(
            author.get("books"),
            Some(Value::List(vec!["first".into(), "second".into()]))
        );
    }
}
