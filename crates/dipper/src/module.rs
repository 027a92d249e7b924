//! Named scopes: ordered tables of constants, struct definitions,
//! functions, and sub-namespaces.
//!
//! A module is built from parsed top-level items in two passes so that
//! forward references and mutual recursion resolve: the first pass installs
//! prototypes (function signatures with no body, and complete struct defs),
//! the second compiles every function body against the now-populated
//! namespace.

use std::fmt::Write;
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use crate::ast::{Item, StructDecl};
use crate::bytecode::Compiler;
use crate::errors::CompileError;
use crate::function::{FuncObj, Param};
use crate::value::{StructDef, Value};

/// What a name refers to inside a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Unknown,
    Const,
    Struct,
    Func,
    Namespace,
}

/// A named ordered namespace.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: String,
    consts: IndexMap<String, Value>,
    structs: IndexMap<String, Rc<StructDef>>,
    funcs: IndexMap<String, Rc<FuncObj>>,
    namespaces: IndexMap<String, Module>,
}

impl Module {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builds a module from parsed top-level items.
    ///
    /// Pass one installs prototypes for every definition; pass two compiles
    /// each function body with the module itself as the resolution context.
    pub fn from_items(filename: &str, name: &str, items: &[Item]) -> Result<Self, CompileError> {
        let mut module = Self::new(name);

        for item in items {
            match item {
                Item::Function(func) => {
                    let params = func
                        .args
                        .iter()
                        .map(|arg| Param::new(&arg.name, &arg.ty))
                        .collect();
                    module.set_func(
                        &func.name,
                        FuncObj::prototype(&func.name, filename, params, &func.return_type),
                    );
                }
                Item::Struct(decl) => {
                    module.set_struct(&decl.name, make_struct_def(decl)?);
                }
            }
        }
        debug!(
            "module '{name}': installed {} prototypes",
            module.funcs.len() + module.structs.len()
        );

        for item in items {
            if let Item::Function(func) = item {
                let compiled = Compiler::compile_function(filename, func, &module)?;
                module.set_func(&func.name, compiled);
            }
        }
        debug!("module '{name}': compiled {} functions", module.funcs.len());

        Ok(module)
    }

    pub fn set_const(&mut self, name: &str, value: Value) {
        self.consts.insert(name.to_owned(), value);
    }

    pub fn set_struct(&mut self, name: &str, def: StructDef) {
        self.structs.insert(name.to_owned(), Rc::new(def));
    }

    pub fn set_func(&mut self, name: &str, func: FuncObj) {
        self.funcs.insert(name.to_owned(), Rc::new(func));
    }

    pub fn set_namespace(&mut self, name: &str, namespace: Self) {
        self.namespaces.insert(name.to_owned(), namespace);
    }

    #[must_use]
    pub fn get_const(&self, name: &str) -> Option<&Value> {
        self.consts.get(name)
    }

    #[must_use]
    pub fn get_struct(&self, name: &str) -> Option<&Rc<StructDef>> {
        self.structs.get(name)
    }

    #[must_use]
    pub fn get_func(&self, name: &str) -> Option<&Rc<FuncObj>> {
        self.funcs.get(name)
    }

    #[must_use]
    pub fn get_namespace(&self, name: &str) -> Option<&Self> {
        self.namespaces.get(name)
    }

    /// The kind of entry registered under a name, searching constants,
    /// structs, functions, then sub-namespaces.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> NameKind {
        if self.consts.contains_key(name) {
            NameKind::Const
        } else if self.structs.contains_key(name) {
            NameKind::Struct
        } else if self.funcs.contains_key(name) {
            NameKind::Func
        } else if self.namespaces.contains_key(name) {
            NameKind::Namespace
        } else {
            NameKind::Unknown
        }
    }

    /// Human-readable dump of the whole namespace (the `-c` flag).
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "--- Namespace '{}' ---", self.name);

        if !self.consts.is_empty() {
            out.push_str("Constants:\n");
            for (name, value) in &self.consts {
                let _ = writeln!(out, "    {name} = {}", value.repr());
            }
        }
        if !self.structs.is_empty() {
            out.push_str("Structs:\n");
            for (name, def) in &self.structs {
                let fields: Vec<String> = def
                    .fields
                    .iter()
                    .map(|(f, ty)| format!("{f}:{ty}"))
                    .collect();
                let _ = writeln!(out, "    {name} {{ {} }}", fields.join(", "));
            }
        }
        if !self.funcs.is_empty() {
            out.push_str("Functions:\n");
            for (name, func) in &self.funcs {
                let _ = writeln!(out, "----- {name} -----");
                out.push_str(&func.disassemble());
            }
        }
        for namespace in self.namespaces.values() {
            out.push_str(&namespace.dump());
        }
        out
    }
}

fn make_struct_def(decl: &StructDecl) -> Result<StructDef, CompileError> {
    let mut fields = IndexMap::new();
    for field in &decl.fields {
        if fields.insert(field.name.clone(), field.ty.clone()).is_some() {
            return Err(CompileError::new(
                format!("duplicate field '{}' in struct {}", field.name, decl.name),
                field.pos,
            ));
        }
    }
    Ok(StructDef::new(&decl.name, fields))
}
