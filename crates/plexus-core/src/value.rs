//! Loosely-typed port values.
//!
//! The engine never inspects what a port holds. [`Value`] is a tagged union
//! wide enough for the payloads simulations pass around; controllers
//! extract the type they expect through the `as_*` accessors, which fail
//! with [`ValueError::TypeMismatch`] instead of guessing.
//!
//! `Value` owns its contents, so cloning is a deep copy. Connection
//! propagation relies on this: two ports never alias the same list or map.

use std::fmt;

use indexmap::IndexMap;

use crate::error::ValueError;

/// Discriminant of a [`Value`], used in type-mismatch errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::None`].
    None,
    /// [`Value::Bool`].
    Bool,
    /// [`Value::Int`].
    Int,
    /// [`Value::Float`].
    Float,
    /// [`Value::Str`].
    Str,
    /// [`Value::List`].
    List,
    /// [`Value::Map`].
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::List => "list",
            Self::Map => "map",
        };
        f.write_str(name)
    }
}

/// A port value.
///
/// `Value::None` is the empty value: ports created without an initial value
/// hold it until something writes to them.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// No value.
    #[default]
    None,
    /// Boolean flag.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// UTF-8 string.
    Str(String),
    /// Ordered list of values.
    List(Vec<Value>),
    /// String-keyed map preserving insertion order.
    Map(IndexMap<String, Value>),
}

impl Value {
    /// The discriminant of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::None => ValueKind::None,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Str(_) => ValueKind::Str,
            Self::List(_) => ValueKind::List,
            Self::Map(_) => ValueKind::Map,
        }
    }

    /// Whether this is [`Value::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Extract a boolean.
    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(other.mismatch(ValueKind::Bool)),
        }
    }

    /// Extract an integer.
    pub fn as_int(&self) -> Result<i64, ValueError> {
        match self {
            Self::Int(i) => Ok(*i),
            other => Err(other.mismatch(ValueKind::Int)),
        }
    }

    /// Extract a float. Integers are widened.
    pub fn as_float(&self) -> Result<f64, ValueError> {
        match self {
            Self::Float(x) => Ok(*x),
            Self::Int(i) => Ok(*i as f64),
            other => Err(other.mismatch(ValueKind::Float)),
        }
    }

    /// Borrow a string.
    pub fn as_str(&self) -> Result<&str, ValueError> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(other.mismatch(ValueKind::Str)),
        }
    }

    /// Borrow a list.
    pub fn as_list(&self) -> Result<&[Value], ValueError> {
        match self {
            Self::List(items) => Ok(items),
            other => Err(other.mismatch(ValueKind::List)),
        }
    }

    /// Borrow a map.
    pub fn as_map(&self) -> Result<&IndexMap<String, Value>, ValueError> {
        match self {
            Self::Map(entries) => Ok(entries),
            other => Err(other.mismatch(ValueKind::Map)),
        }
    }

    fn mismatch(&self, expected: ValueKind) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Self::Map(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::None, Into::into)
    }
}
