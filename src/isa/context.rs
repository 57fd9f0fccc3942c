//! Machine state store (§3 `Context`, §4.B).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::key::Key;
use crate::sym::Sym;

/// Outcome of an SMT query against a `Context`'s accumulated obligations.
/// Attached by the solver driver in a second pass (§3 Lifecycle, §4.G).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum Solution {
    #[default]
    Unknown,
    Unsatisfiable,
    Satisfiable(BTreeMap<String, i32>),
}

impl Solution {
    pub fn is_unsat(&self) -> bool {
        matches!(self, Solution::Unsatisfiable)
    }
}

/// One execution point: bindings, accumulated path condition, user
/// constraints, free-variable declarations, and (once solved) a
/// satisfiability verdict.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Context {
    pub bindings: BTreeMap<Key, Sym>,
    pub path_condition: Sym,
    /// Ordered `(label, assertion)` pairs.
    pub constraints: Vec<(String, Sym)>,
    /// Free-variable name -> defining equality, declared for the solver.
    pub store: BTreeMap<String, Sym>,
    pub solution: Solution,
}

impl Context {
    pub fn new() -> Self {
        Self {
            bindings: BTreeMap::new(),
            path_condition: Sym::bool(true),
            constraints: Vec::new(),
            store: BTreeMap::new(),
            solution: Solution::Unknown,
        }
    }

    /// Missing keys read as `Const 0` — the semantic floor (§3).
    pub fn read(&self, key: Key) -> Sym {
        self.bindings.get(&key).cloned().unwrap_or_else(Sym::zero)
    }

    pub fn write(&mut self, key: Key, value: Sym) {
        self.bindings.insert(key, value);
    }

    pub fn declare_free_var(&mut self, name: impl Into<String>, def: Sym) {
        self.store.insert(name.into(), def);
    }

    pub fn add_constraint(&mut self, label: impl Into<String>, assertion: Sym) {
        self.constraints.push((label.into(), assertion));
    }

    /// Enumerate `Addr` bindings in address order, for solver submission
    /// (memory-image dumps) and for display.
    pub fn dump_memory(&self) -> Vec<(i32, &Sym)> {
        self.bindings
            .iter()
            .filter_map(|(k, v)| match k {
                Key::Addr(a) => Some((*a, v)),
                _ => None,
            })
            .collect()
    }

    /// Every `Var` name occurring in bindings, path condition, or
    /// constraints — a structural walk of `Sym` (§4.B).
    pub fn find_free_vars(&self) -> std::collections::BTreeSet<String> {
        let mut out = std::collections::BTreeSet::new();
        for v in self.bindings.values() {
            v.free_vars(&mut out);
        }
        self.path_condition.free_vars(&mut out);
        for (_, c) in &self.constraints {
            c.free_vars(&mut out);
        }
        out
    }

    pub fn is_halted(&self) -> bool {
        matches!(
            self.bindings.get(&Key::F(crate::key::Flag::Halted)),
            Some(Sym::Const(crate::concrete::Concrete::Bool(true)))
        )
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
