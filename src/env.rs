//! Environment (C3, §4.2).
//!
//! A name → (type, role) binding table with lexical nesting. Parents are a
//! back-reference only — they outlive every child within a single compile,
//! so a borrowed reference (rather than `Rc`/`RefCell`) is enough; child
//! scopes extend their own bindings and are never observed by the parent.

use indexmap::IndexMap;

use crate::error::EnvError;
use crate::types::Type;

/// What role a name plays, used only to reject redefinition and for
/// introspection — it has no effect on codegen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Keyword,
    Builtin,
    Contract,
    ContractParam,
    ContractValue,
    Clause,
    ClauseParam,
    ClauseValue,
}

#[derive(Clone, Debug)]
pub struct Binding {
    pub typ: Option<Type>,
    pub role: Role,
}

pub struct Environment<'a> {
    parent: Option<&'a Environment<'a>>,
    bindings: IndexMap<String, Binding>,
}

impl<'a> Environment<'a> {
    /// Creates a new top-level scope with no parent.
    pub fn new() -> Self {
        Environment {
            parent: None,
            bindings: IndexMap::new(),
        }
    }

    /// Creates a fresh child scope (used for each clause, §4.2).
    pub fn child(&'a self) -> Environment<'a> {
        Environment {
            parent: Some(self),
            bindings: IndexMap::new(),
        }
    }

    /// Adds a binding to this scope. Fails if `name` already exists in
    /// *this* scope — shadowing a parent scope's binding (e.g. a clause
    /// param reusing a contract param's name) is allowed, since `add` only
    /// consults this scope's own bindings.
    pub fn add(&mut self, name: impl Into<String>, typ: Option<Type>, role: Role) -> Result<(), EnvError> {
        let name = name.into();
        if self.bindings.contains_key(&name) {
            return Err(EnvError::Redefined { name });
        }
        self.bindings.insert(name, Binding { typ, role });
        Ok(())
    }

    /// Looks up `name`'s type, searching this scope then each parent in
    /// turn. Returns `None` both when the name is undefined and when it is
    /// defined with no type (keywords, builtins, contract, clause names).
    pub fn lookup_type(&self, name: &str) -> Option<&Type> {
        self.lookup(name).and_then(|binding| binding.typ.as_ref())
    }

    /// Looks up `name`'s full binding, searching this scope then parents.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        if let Some(binding) = self.bindings.get(name) {
            return Some(binding);
        }
        self.parent.and_then(|parent| parent.lookup(name))
    }

    /// Whether `name` is bound anywhere visible from this scope.
    pub fn is_defined(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

impl<'a> Default for Environment<'a> {
    fn default() -> Self {
        Self::new()
    }
}
