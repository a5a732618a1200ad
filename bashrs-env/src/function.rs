// This file is part of bashrs, a Bash-compatible shell interpreter.

//! The function table: `name () { ... }` definitions registered for later
//! invocation as simple commands.

use bashrs_syntax::ast::FunctionDefinition;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone, Debug, Default)]
pub struct Functions {
    table: HashMap<String, Rc<FunctionDefinition>>,
}

impl Functions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, def: FunctionDefinition) {
        self.table.insert(def.name.clone(), Rc::new(def));
    }

    pub fn get(&self, name: &str) -> std::option::Option<Rc<FunctionDefinition>> {
        self.table.get(name).cloned()
    }

    pub fn remove(&mut self, name: &str) -> std::option::Option<Rc<FunctionDefinition>> {
        self.table.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
