//! Dynamic values and reflectively constructed instances

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::metadata::TypeDescriptor;
use crate::types::TypeRef;

/// Shared handle to a constructed instance
pub type ObjectRef = Arc<Instance>;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// A value passed to or returned from the engine
#[derive(Clone)]
pub enum Value {
    /// Result of a `void` method
    Void,
    /// The null reference
    Null,
    /// `boolean`
    Bool(bool),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `double`
    Double(f64),
    /// `String`
    Str(Arc<str>),
    /// An instance of a registered class
    Object(ObjectRef),
}

impl Value {
    /// The zero value a slot of type `ty` starts with
    pub fn zero(ty: &TypeRef) -> Self {
        match ty {
            TypeRef::Void => Value::Void,
            TypeRef::Boolean => Value::Bool(false),
            TypeRef::Int => Value::Int(0),
            TypeRef::Long => Value::Long(0),
            TypeRef::Double => Value::Double(0.0),
            TypeRef::String | TypeRef::Named(_) => Value::Null,
        }
    }

    /// Create a string value
    pub fn str(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }

    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i32
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as i64
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as object handle
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Short description of the runtime type, for error messages
    pub fn type_label(&self) -> String {
        match self {
            Value::Void => "void".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Long(_) => "long".to_string(),
            Value::Double(_) => "double".to_string(),
            Value::Str(_) => "String".to_string(),
            Value::Object(obj) => obj.type_name().to_string(),
        }
    }
}

impl PartialEq for Value {
    /// Primitives and strings compare by value, objects by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(i) => write!(f, "{}L", i),
            Value::Double(d) => write!(f, "{:?}", d),
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Object(obj) => write!(f, "{}@{}", obj.type_name(), obj.id()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Long(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

/// An object produced by a reflective constructor call.
///
/// Slots cover every instance field of the type and its ancestors, laid out
/// root-first; a field descriptor's `slot` indexes into them.
pub struct Instance {
    id: u64,
    ty: Arc<TypeDescriptor>,
    slots: RwLock<Vec<Value>>,
}

impl Instance {
    pub(crate) fn allocate(ty: Arc<TypeDescriptor>, slots: Vec<Value>) -> ObjectRef {
        Arc::new(Self {
            id: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            ty,
            slots: RwLock::new(slots),
        })
    }

    /// Process-unique instance number
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Runtime type of the instance
    pub fn type_descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    /// Qualified name of the runtime type
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    pub(crate) fn read_slot(&self, slot: usize) -> Value {
        self.slots.read().get(slot).cloned().unwrap_or(Value::Null)
    }

    pub(crate) fn write_slot(&self, slot: usize, value: Value) {
        let mut slots = self.slots.write();
        if slot >= slots.len() {
            slots.resize(slot + 1, Value::Null);
        }
        slots[slot] = value;
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("type", &self.ty.name())
            .field("slots", &*self.slots.read())
            .finish()
    }
}
