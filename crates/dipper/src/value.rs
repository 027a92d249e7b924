//! The Dipper runtime value system.
//!
//! Every value the VM can observe is one variant of [`Value`]. Scalars are
//! stored inline; containers own their elements, so `Clone` is a deep copy
//! (the value graph is acyclic by construction). Functions are shared via
//! `Rc` and compared by identity.
//!
//! Operator dispatch goes through four typed families — [`Value::op_bool`],
//! [`Value::op_int`], [`Value::op_float`], [`Value::op_str`] (plus
//! [`Value::op_list`] for list concatenation) — mirroring how the opcodes
//! `EQ`..`LTE` and `ADD`..`DIV` pick a family from the destination
//! register's kind. In-place mutation of a register goes through the
//! `assign_*` methods, which fail on a kind mismatch.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::IndexMap;
use strum::Display;

use crate::errors::ValueError;
use crate::function::FuncObj;
use crate::ops::{ArithOp, CmpOp};

/// The kind tag of a [`Value`], used for operator legality checks and
/// diagnostics. Struct instances all share the `Obj` kind; their actual
/// type is the [`StructDef`] they point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Kind {
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Func,
    Obj,
}

impl Kind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::List => "list",
            Self::Func => "func",
            Self::Obj => "obj",
        }
    }
}

/// A tagged runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Func(Rc<FuncObj>),
    Struct(StructInstance),
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Bool(_) => Kind::Bool,
            Self::Int(_) => Kind::Int,
            Self::Float(_) => Kind::Float,
            Self::Str(_) => Kind::Str,
            Self::List(_) => Kind::List,
            Self::Func(_) => Kind::Func,
            Self::Struct(_) => Kind::Obj,
        }
    }

    /// The default value for a declared type name, for pre-populating data
    /// registers and struct fields. Returns `None` for names that are not
    /// primitive (struct types are resolved by the caller against the
    /// enclosing module).
    #[must_use]
    pub fn default_for_type(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int(0)),
            "float" => Some(Self::Float(0.0)),
            "str" => Some(Self::Str(String::new())),
            "bool" => Some(Self::Bool(false)),
            "list" => Some(Self::List(Vec::new())),
            "auto" | "" => Some(Self::Null),
            s if s.starts_with('[') => Some(Self::List(Vec::new())),
            _ => None,
        }
    }

    /// Truthiness: null and zero-ish values are false, containers are true
    /// when non-empty, functions and struct instances are always true.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(v) => *v != 0,
            Self::Float(v) => *v != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) => !items.is_empty(),
            Self::Func(_) | Self::Struct(_) => true,
        }
    }

    pub fn as_int(&self) -> Result<i64, ValueError> {
        match self {
            Self::Null => Ok(0),
            Self::Bool(b) => Ok(i64::from(*b)),
            Self::Int(v) => Ok(*v),
            Self::Float(v) => Ok(*v as i64),
            other => Err(ValueError::NotNumeric(other.kind().name())),
        }
    }

    pub fn as_float(&self) -> Result<f64, ValueError> {
        match self {
            Self::Int(v) => Ok(*v as f64),
            Self::Float(v) => Ok(*v),
            other => Err(ValueError::NotNumeric(other.kind().name())),
        }
    }

    /// Element or character count; errors for kinds without a length.
    pub fn len(&self) -> Result<usize, ValueError> {
        match self {
            Self::Str(s) => Ok(s.chars().count()),
            Self::List(items) => Ok(items.len()),
            other => Err(ValueError::NoLength(other.kind().name())),
        }
    }

    /// The `str` capability: how the value prints under `WRITEO`.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Null => "null".to_owned(),
            Self::Bool(true) => "True".to_owned(),
            Self::Bool(false) => "False".to_owned(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => format_float(*v),
            Self::Str(s) => s.clone(),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(Self::display).collect();
                format!("[{}]", parts.join(", "))
            }
            Self::Func(f) => format!("<func {}>", f.name),
            Self::Struct(inst) => {
                let parts: Vec<String> = inst.fields.iter().map(Self::display).collect();
                format!("{}({})", inst.def.name, parts.join(", "))
            }
        }
    }

    /// Debugging representation used in register dumps.
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            Self::Str(s) => format!("\"{s}\""),
            Self::List(items) => {
                let parts: Vec<String> = items.iter().map(Self::repr).collect();
                format!("[{}]", parts.join(", "))
            }
            Self::Struct(inst) => {
                let parts: Vec<String> = inst.fields.iter().map(Self::repr).collect();
                format!("{}({})", inst.def.name, parts.join(", "))
            }
            other => other.display(),
        }
    }

    /// Hash for hashable kinds. Null, lists, and functions are unhashable;
    /// a struct instance is hashable iff every field is.
    pub fn hash_u64(&self) -> Result<u64, ValueError> {
        let mut hasher = DefaultHasher::new();
        self.feed_hash(&mut hasher)?;
        Ok(hasher.finish())
    }

    fn feed_hash(&self, hasher: &mut DefaultHasher) -> Result<(), ValueError> {
        match self {
            Self::Bool(b) => {
                0u8.hash(hasher);
                b.hash(hasher);
            }
            Self::Int(v) => {
                1u8.hash(hasher);
                v.hash(hasher);
            }
            Self::Float(v) => {
                2u8.hash(hasher);
                v.to_bits().hash(hasher);
            }
            Self::Str(s) => {
                3u8.hash(hasher);
                s.hash(hasher);
            }
            Self::Struct(inst) => {
                4u8.hash(hasher);
                inst.def.name.hash(hasher);
                for field in &inst.fields {
                    field.feed_hash(hasher)?;
                }
            }
            other => return Err(ValueError::Unhashable(other.kind().name())),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Operator families
    // ------------------------------------------------------------------

    /// Comparison family; the result of `EQ`..`LTE` and the condition of
    /// `BEQ`/`BNE`. Equality is defined per kind (element-wise for lists,
    /// field-wise for struct instances of the same def, identity for
    /// functions); ordering is numeric-only. Mixed kinds are a type error.
    pub fn op_bool(&self, op: CmpOp, other: &Self) -> Result<bool, ValueError> {
        if op.is_equality() {
            let eq = self.eq_value(other)?;
            return Ok(if op == CmpOp::Eq { eq } else { !eq });
        }
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Ok(cmp_ordered(op, a.partial_cmp(b))),
            (Self::Float(a), Self::Float(b)) => Ok(cmp_ordered(op, a.partial_cmp(b))),
            (Self::Int(a), Self::Float(b)) => Ok(cmp_ordered(op, (*a as f64).partial_cmp(b))),
            (Self::Float(a), Self::Int(b)) => Ok(cmp_ordered(op, a.partial_cmp(&(*b as f64)))),
            _ => Err(self.unsupported(op.to_string(), other)),
        }
    }

    fn eq_value(&self, other: &Self) -> Result<bool, ValueError> {
        match (self, other) {
            (Self::Null, Self::Null) => Ok(true),
            (Self::Bool(a), Self::Bool(b)) => Ok(a == b),
            (Self::Int(a), Self::Int(b)) => Ok(a == b),
            (Self::Float(a), Self::Float(b)) => Ok(a == b),
            (Self::Int(a), Self::Float(b)) => Ok((*a as f64) == *b),
            (Self::Float(a), Self::Int(b)) => Ok(*a == (*b as f64)),
            (Self::Str(a), Self::Str(b)) => Ok(a == b),
            (Self::List(a), Self::List(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b) {
                    if !x.eq_value(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (Self::Func(a), Self::Func(b)) => Ok(Rc::ptr_eq(a, b)),
            (Self::Struct(a), Self::Struct(b)) => {
                if !Rc::ptr_eq(&a.def, &b.def) {
                    return Err(self.unsupported("==", other));
                }
                for (x, y) in a.fields.iter().zip(&b.fields) {
                    if !x.eq_value(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Err(self.unsupported("==", other)),
        }
    }

    /// Integer family: `+ - * /` on two ints, truncating toward zero for
    /// division.
    pub fn op_int(&self, op: ArithOp, other: &Self) -> Result<i64, ValueError> {
        let (Self::Int(a), Self::Int(b)) = (self, other) else {
            return Err(self.unsupported(op.to_string(), other));
        };
        match op {
            ArithOp::Add => Ok(a.wrapping_add(*b)),
            ArithOp::Sub => Ok(a.wrapping_sub(*b)),
            ArithOp::Mul => Ok(a.wrapping_mul(*b)),
            ArithOp::Div => {
                if *b == 0 {
                    Err(ValueError::DivisionByZero)
                } else {
                    Ok(a.wrapping_div(*b))
                }
            }
        }
    }

    /// Float family: `+ - * /`; int operands are promoted, so this is also
    /// the path for mixed int/float arithmetic.
    pub fn op_float(&self, op: ArithOp, other: &Self) -> Result<f64, ValueError> {
        let a = self
            .as_float()
            .map_err(|_| self.unsupported(op.to_string(), other))?;
        let b = other
            .as_float()
            .map_err(|_| self.unsupported(op.to_string(), other))?;
        match op {
            ArithOp::Add => Ok(a + b),
            ArithOp::Sub => Ok(a - b),
            ArithOp::Mul => Ok(a * b),
            ArithOp::Div => {
                if b == 0.0 {
                    Err(ValueError::DivisionByZero)
                } else {
                    Ok(a / b)
                }
            }
        }
    }

    /// String family: only `+` (concatenation) is defined.
    pub fn op_str(&self, op: ArithOp, other: &Self) -> Result<String, ValueError> {
        match (self, other, op) {
            (Self::Str(a), Self::Str(b), ArithOp::Add) => Ok(format!("{a}{b}")),
            _ => Err(self.unsupported(op.to_string(), other)),
        }
    }

    /// List family: only `+` (concatenation) is defined. Elements are
    /// copied, so the result is independent of both operands.
    pub fn op_list(&self, op: ArithOp, other: &Self) -> Result<Vec<Self>, ValueError> {
        match (self, other, op) {
            (Self::List(a), Self::List(b), ArithOp::Add) => {
                let mut out = a.clone();
                out.extend(b.iter().cloned());
                Ok(out)
            }
            _ => Err(self.unsupported(op.to_string(), other)),
        }
    }

    // ------------------------------------------------------------------
    // In-place assignment
    // ------------------------------------------------------------------

    pub fn assign_int(&mut self, v: i64) -> Result<(), ValueError> {
        match self {
            Self::Int(slot) => {
                *slot = v;
                Ok(())
            }
            other => Err(ValueError::AssignMismatch {
                expected: other.kind().name(),
                found: "int",
            }),
        }
    }

    pub fn assign_float(&mut self, v: f64) -> Result<(), ValueError> {
        match self {
            Self::Float(slot) => {
                *slot = v;
                Ok(())
            }
            other => Err(ValueError::AssignMismatch {
                expected: other.kind().name(),
                found: "float",
            }),
        }
    }

    pub fn assign_str(&mut self, v: String) -> Result<(), ValueError> {
        match self {
            Self::Str(slot) => {
                *slot = v;
                Ok(())
            }
            other => Err(ValueError::AssignMismatch {
                expected: other.kind().name(),
                found: "str",
            }),
        }
    }

    pub fn assign_bool(&mut self, v: bool) -> Result<(), ValueError> {
        match self {
            Self::Bool(slot) => {
                *slot = v;
                Ok(())
            }
            other => Err(ValueError::AssignMismatch {
                expected: other.kind().name(),
                found: "bool",
            }),
        }
    }

    pub fn assign_list(&mut self, v: Vec<Self>) -> Result<(), ValueError> {
        match self {
            Self::List(slot) => {
                *slot = v;
                Ok(())
            }
            other => Err(ValueError::AssignMismatch {
                expected: other.kind().name(),
                found: "list",
            }),
        }
    }

    /// The `SET` opcode: copy `src` into this register through the
    /// type-appropriate assign. Cross-kind assignment fails; struct
    /// instances additionally require the same def.
    pub fn assign_from(&mut self, src: &Self) -> Result<(), ValueError> {
        match (&mut *self, src) {
            (Self::Null, Self::Null) => Ok(()),
            (Self::Bool(d), Self::Bool(s)) => {
                *d = *s;
                Ok(())
            }
            (Self::Int(d), Self::Int(s)) => {
                *d = *s;
                Ok(())
            }
            (Self::Float(d), Self::Float(s)) => {
                *d = *s;
                Ok(())
            }
            (Self::Str(d), Self::Str(s)) => {
                d.clone_from(s);
                Ok(())
            }
            (Self::List(d), Self::List(s)) => {
                d.clone_from(s);
                Ok(())
            }
            (Self::Func(d), Self::Func(s)) => {
                *d = Rc::clone(s);
                Ok(())
            }
            (Self::Struct(d), Self::Struct(s)) if Rc::ptr_eq(&d.def, &s.def) => {
                d.fields.clone_from(&s.fields);
                Ok(())
            }
            (dest, src) => Err(ValueError::AssignMismatch {
                expected: dest.kind().name(),
                found: src.kind().name(),
            }),
        }
    }

    fn unsupported(&self, op: impl ToString, other: &Self) -> ValueError {
        ValueError::UnsupportedOperator {
            op: op.to_string(),
            lhs: self.kind().name(),
            rhs: other.kind().name(),
        }
    }
}

fn cmp_ordered(op: CmpOp, ord: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering::{Equal, Greater, Less};
    match (op, ord) {
        (CmpOp::Lt, Some(Less)) => true,
        (CmpOp::Gt, Some(Greater)) => true,
        (CmpOp::Lte, Some(Less | Equal)) => true,
        (CmpOp::Gte, Some(Greater | Equal)) => true,
        _ => false,
    }
}

/// Formats a float the way Dipper prints it: trailing zeros stripped but at
/// least one fractional digit kept (`2.0`, not `2`).
#[must_use]
pub fn format_float(v: f64) -> String {
    let s = v.to_string();
    if s.contains('.') || s.contains('e') || s.contains("inf") || s.contains("NaN") {
        s
    } else {
        format!("{s}.0")
    }
}

// ----------------------------------------------------------------------
// Struct definitions and instances
// ----------------------------------------------------------------------

/// A named struct type: ordered mapping of field name to declared type
/// name. Shared by reference; instances point back at their def.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDef {
    pub name: String,
    pub fields: IndexMap<String, String>,
}

impl StructDef {
    #[must_use]
    pub fn new(name: impl Into<String>, fields: IndexMap<String, String>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// A fresh instance with every field default-initialized from its
    /// declared type (struct-typed and unknown fields start as null).
    #[must_use]
    pub fn instantiate(def: &Rc<Self>) -> StructInstance {
        let fields = def
            .fields
            .values()
            .map(|ty| Value::default_for_type(ty).unwrap_or(Value::Null))
            .collect();
        StructInstance {
            def: Rc::clone(def),
            fields,
        }
    }
}

/// A value bound to a [`StructDef`]: a fixed-length field array whose
/// length always equals the def's field count.
#[derive(Debug, Clone)]
pub struct StructInstance {
    pub def: Rc<StructDef>,
    pub fields: Vec<Value>,
}

impl StructInstance {
    /// Positional field binding used when `CALL` targets a struct name.
    /// Each argument is checked against the field's declared type before
    /// being moved in; `auto` and struct-typed fields accept any value of
    /// the right shape.
    pub fn bind_fields(&mut self, args: Vec<Value>) -> Result<(), ValueError> {
        debug_assert_eq!(self.fields.len(), self.def.fields.len());
        for (idx, ((field, ty), value)) in self.def.fields.iter().zip(args).enumerate() {
            if !type_accepts(ty, &value) {
                return Err(ValueError::FieldMismatch {
                    def: self.def.name.clone(),
                    field: field.clone(),
                    expected: ty.clone(),
                    found: value.kind().name(),
                });
            }
            self.fields[idx] = value;
        }
        Ok(())
    }
}

/// Whether a value of this kind may be stored in a slot declared with the
/// given type name.
#[must_use]
pub fn type_accepts(ty: &str, value: &Value) -> bool {
    match ty {
        "auto" | "" => true,
        "int" => matches!(value, Value::Int(_)),
        "float" => matches!(value, Value::Float(_)),
        "str" => matches!(value, Value::Str(_)),
        "bool" => matches!(value, Value::Bool(_)),
        "list" => matches!(value, Value::List(_)),
        s if s.starts_with('[') => matches!(value, Value::List(_)),
        // struct type name: match the instance's def
        other => match value {
            Value::Struct(inst) => inst.def.name == other,
            _ => false,
        },
    }
}
