// This file is part of bashrs, a Bash-compatible shell interpreter.

//! Shell variables: scalars, indexed arrays, associative arrays, and the
//! attribute flags `declare`/`typeset` can attach to them.

use bitflags::bitflags;
use std::collections::BTreeMap;

bitflags! {
    /// Flags set by `declare`/`typeset`/`export`/`readonly`/`local`.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Attributes: u16 {
        const READONLY  = 1 << 0;
        const EXPORT    = 1 << 1;
        const INTEGER   = 1 << 2;
        const NAMEREF   = 1 << 3;
        const LOWERCASE = 1 << 4;
        const UPPERCASE = 1 << 5;
        const ARRAY     = 1 << 6;
        const ASSOC     = 1 << 7;
    }
}

/// The value a [`Variable`] holds.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Scalar(String),
    /// Bash indexed arrays are sparse; absent indices are simply absent from
    /// the map rather than holding an empty string.
    IndexedArray(BTreeMap<i64, String>),
    AssociativeArray(BTreeMap<String, String>),
}

impl Value {
    /// The value as used when a command substitutes `"$var"`: arrays yield
    /// their element at index 0 (Bash's rule for scalar contexts).
    pub fn as_scalar(&self) -> String {
        match self {
            Value::Scalar(s) => s.clone(),
            Value::IndexedArray(map) => map.get(&0).cloned().unwrap_or_default(),
            Value::AssociativeArray(map) => map.values().next().cloned().unwrap_or_default(),
        }
    }

    /// The elements `"${arr[@]}"` expands to, in index/key order.
    pub fn elements(&self) -> Vec<String> {
        match self {
            Value::Scalar(s) => vec![s.clone()],
            Value::IndexedArray(map) => map.values().cloned().collect(),
            Value::AssociativeArray(map) => map.values().cloned().collect(),
        }
    }
}

/// A named shell variable: its value plus the attributes that govern
/// assignment, export, and `unset` behavior.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub value: Value,
    pub attributes: Attributes,
}

impl Variable {
    pub fn new(value: impl Into<String>) -> Self {
        Variable { value: Value::Scalar(value.into()), attributes: Attributes::empty() }
    }

    pub fn new_array(elements: Vec<String>) -> Self {
        let map = elements.into_iter().enumerate().map(|(i, v)| (i as i64, v)).collect();
        Variable { value: Value::IndexedArray(map), attributes: Attributes::ARRAY }
    }

    pub fn is_readonly(&self) -> bool {
        self.attributes.contains(Attributes::READONLY)
    }

    pub fn is_exported(&self) -> bool {
        self.attributes.contains(Attributes::EXPORT)
    }

    /// Applies the `lower`/`upper`/`integer` case- and type-coercing
    /// attributes to a freshly assigned scalar, the way `declare -l`/`-u`/`-i`
    /// do on every subsequent assignment.
    pub fn coerce(&mut self, raw: String) -> String {
        let mut s = raw;
        if self.attributes.contains(Attributes::LOWERCASE) {
            s = s.to_lowercase();
        }
        if self.attributes.contains(Attributes::UPPERCASE) {
            s = s.to_uppercase();
        }
        if self.attributes.contains(Attributes::INTEGER) {
            let n: i64 = s.trim().parse().unwrap_or(0);
            s = n.to_string();
        }
        s
    }
}

/// A single lexical scope of variables: the session's global scope, or a
/// function invocation's `local` scope pushed on top of it.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    vars: std::collections::HashMap<String, Variable>,
}

/// The variable-lookup stack: the global scope plus one pushed scope per
/// active function call. Unlike yash-rs's context stack (which also carries
/// positional parameters and distinguishes volatile builtin contexts), this
/// keeps scoping to exactly what `local` needs; positional parameters are
/// tracked separately on [`crate::Session`].
#[derive(Clone, Debug)]
pub struct VariableSet {
    scopes: Vec<Scope>,
}

impl Default for VariableSet {
    fn default() -> Self {
        VariableSet { scopes: vec![Scope::default()] }
    }
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Looks up `name`, searching from the innermost scope outward.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.scopes.iter().rev().find_map(|s| s.vars.get(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.scopes.iter_mut().rev().find_map(|s| s.vars.get_mut(name))
    }

    /// True if `name` is declared in any scope.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Declares `name` as `local` in the innermost scope, copying any
    /// outer value so reads before the first local assignment still see it
    /// (Bash's actual `local` semantics: uninitialized, but harmless here
    /// since callers immediately assign).
    pub fn declare_local(&mut self, name: &str) {
        let scope = self.scopes.last_mut().expect("base scope always present");
        scope.vars.entry(name.to_string()).or_insert_with(|| Variable::new(""));
    }

    /// Assigns into whichever scope already holds `name`, or the global
    /// scope if it's new — the ordinary (non-`local`) assignment rule.
    pub fn assign(&mut self, name: &str, var: Variable) {
        for scope in self.scopes.iter_mut().rev() {
            if scope.vars.contains_key(name) {
                scope.vars.insert(name.to_string(), var);
                return;
            }
        }
        self.scopes[0].vars.insert(name.to_string(), var);
    }

    /// Assigns into the innermost scope unconditionally — used for `local
    /// name=value` and for-loop/function-parameter binding.
    pub fn assign_local(&mut self, name: &str, var: Variable) {
        self.scopes.last_mut().expect("base scope always present").vars.insert(name.to_string(), var);
    }

    pub fn unset(&mut self, name: &str) -> Option<Variable> {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(v) = scope.vars.remove(name) {
                return Some(v);
            }
        }
        None
    }

    /// All names visible in any scope, innermost wins — used by `${!prefix*}`
    /// and `export -p`/`declare -p`.
    pub fn names(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut names = Vec::new();
        for scope in self.scopes.iter().rev() {
            for name in scope.vars.keys() {
                if seen.insert(name.clone()) {
                    names.push(name.clone());
                }
            }
        }
        names.sort();
        names
    }

    pub fn exported(&self) -> Vec<(String, String)> {
        self.names()
            .into_iter()
            .filter_map(|name| {
                let var = self.get(&name)?;
                var.is_exported().then(|| (name, var.value.as_scalar()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_and_get() {
        let mut set = VariableSet::new();
        set.assign("x", Variable::new("5"));
        assert_eq!(set.get("x").unwrap().value.as_scalar(), "5");
    }

    #[test]
    fn local_shadows_outer() {
        let mut set = VariableSet::new();
        set.assign("x", Variable::new("outer"));
        set.push_scope();
        set.assign_local("x", Variable::new("inner"));
        assert_eq!(set.get("x").unwrap().value.as_scalar(), "inner");
        set.pop_scope();
        assert_eq!(set.get("x").unwrap().value.as_scalar(), "outer");
    }

    #[test]
    fn plain_assign_updates_outer_scope_from_inner() {
        let mut set = VariableSet::new();
        set.assign("x", Variable::new("outer"));
        set.push_scope();
        set.assign("x", Variable::new("updated"));
        set.pop_scope();
        assert_eq!(set.get("x").unwrap().value.as_scalar(), "updated");
    }

    #[test]
    fn unset_removes_from_innermost_scope_first() {
        let mut set = VariableSet::new();
        set.assign("x", Variable::new("outer"));
        set.push_scope();
        set.assign_local("x", Variable::new("inner"));
        set.unset("x");
        assert_eq!(set.get("x").unwrap().value.as_scalar(), "inner");
    }

    #[test]
    fn coerce_uppercase_attribute() {
        let mut var = Variable::new("");
        var.attributes |= Attributes::UPPERCASE;
        let coerced = var.coerce("hello".to_string());
        assert_eq!(coerced, "HELLO");
    }
}
