//! Runtime values shared by the compiler (constants) and the VM.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::bytecode::instruction::Instructions;

/// A runtime value. Compound values share their payload behind `Rc`, so
/// cloning a `Value` is cheap and identity comparisons stay meaningful.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    String(Rc<String>),
    Null,
    Array(Rc<Vec<Value>>),
    Hash(Rc<IndexMap<HashKey, HashPair>>),
    Function(Rc<CompiledFunction>),
    Closure(Rc<Closure>),
    /// Index into the builtin registry.
    Builtin(usize),
    /// Builtin failures travel on the stack as ordinary values.
    Error(String),
}

/// Key for hash values. Only integers, booleans and strings are hashable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(Rc<String>),
}

/// A hash entry retains the original key value alongside the stored value,
/// so iteration and inspection report keys faithfully.
#[derive(Debug, Clone)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

/// A function lowered to bytecode, stored in the constant pool.
#[derive(Debug)]
pub struct CompiledFunction {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
}

/// A compiled function bundled with its captured free variables.
#[derive(Debug)]
pub struct Closure {
    pub func: Rc<CompiledFunction>,
    pub free: Vec<Value>,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::String(_) => "STRING",
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "COMPILED_FUNCTION",
            Value::Closure(_) => "CLOSURE",
            Value::Builtin(_) => "BUILTIN",
            Value::Error(_) => "ERROR",
        }
    }

    /// Everything is truthy except `false` and `null`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(value) => *value,
            Value::Null => false,
            _ => true,
        }
    }

    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(value) => Some(HashKey::Integer(*value)),
            Value::Boolean(value) => Some(HashKey::Boolean(*value)),
            Value::String(value) => Some(HashKey::String(Rc::clone(value))),
            _ => None,
        }
    }

    /// Identity comparison, the `==`/`!=` semantics for non-integers.
    ///
    /// Booleans and null compare by value, which is what pointer identity
    /// on interned singletons means. Reference values compare by allocation
    /// identity: two structurally equal arrays are not `==`.
    pub fn same_identity(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            // The registry holds one builtin per index, so index equality
            // is object identity.
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{}", value),
            Value::Boolean(value) => write!(f, "{}", value),
            Value::String(value) => f.write_str(value),
            Value::Null => f.write_str("null"),
            Value::Array(elements) => {
                let elems: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", elems.join(", "))
            }
            Value::Hash(pairs) => {
                let pairs: Vec<String> = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key, pair.value))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Value::Function(func) => write!(f, "CompiledFunction[{:p}]", Rc::as_ptr(func)),
            Value::Closure(closure) => write!(f, "Closure[{:p}]", Rc::as_ptr(closure)),
            Value::Builtin(_) => f.write_str("builtin function"),
            Value::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_hash_keys_compare_by_content() {
        let hello1 = Value::String(Rc::new("Hello World".to_string()));
        let hello2 = Value::String(Rc::new("Hello World".to_string()));
        let diff = Value::String(Rc::new("My name is johnny".to_string()));

        assert_eq!(hello1.hash_key(), hello2.hash_key());
        assert_ne!(hello1.hash_key(), diff.hash_key());
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Integer(0).is_truthy());
        assert!(Value::String(Rc::new(String::new())).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn test_identity_comparison() {
        let arr = Rc::new(vec![Value::Integer(1)]);
        let a = Value::Array(Rc::clone(&arr));
        let b = Value::Array(arr);
        let c = Value::Array(Rc::new(vec![Value::Integer(1)]));

        assert!(a.same_identity(&b));
        assert!(!a.same_identity(&c));
        assert!(Value::Null.same_identity(&Value::Null));
        assert!(!Value::Boolean(true).same_identity(&Value::Boolean(false)));
    }

    #[test]
    fn test_unhashable_values() {
        assert!(Value::Array(Rc::new(Vec::new())).hash_key().is_none());
        assert!(Value::Null.hash_key().is_none());
    }
}
