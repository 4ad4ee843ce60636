// File: src/symtable.rs
//
// Parse-time symbol table for the Sprig language.
// Tracks which names are declared in each lexical scope while the parser
// walks the source. Values are never stored here; the interpreter keeps
// its own Environment chain at run time.
//
// The table is a stack of scopes (Vec<Scope>). Lookups search from the
// innermost scope outward. Closing a block scope applies the configured
// BlockScopeVisibility policy.

use ahash::AHashSet;
use log::debug;
use std::fmt;

/// What happens to the names declared in a block when the block closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockScopeVisibility {
    /// Names declared in a block stay visible to the statements that follow
    /// the block in the enclosing scope
    #[default]
    HoistToParent,
    /// Names declared in a block are dropped with it
    Discard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Root,
    Block,
    Function,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScopeKind::Root => write!(f, "ROOT"),
            ScopeKind::Block => write!(f, "BLOCK"),
            ScopeKind::Function => write!(f, "FUNC"),
        }
    }
}

/// A single scope; `id` only exists for diagnostics
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: u64,
    pub kind: ScopeKind,
    names: AHashSet<String>,
}

impl Scope {
    fn new(id: u64, kind: ScopeKind) -> Self {
        Scope { id, kind, names: AHashSet::new() }
    }

    pub fn declares(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    next_id: u64,
    policy: BlockScopeVisibility,
}

impl SymbolTable {
    /// Create a table with a single root scope and the default policy
    pub fn new() -> Self {
        Self::with_policy(BlockScopeVisibility::default())
    }

    pub fn with_policy(policy: BlockScopeVisibility) -> Self {
        SymbolTable { scopes: vec![Scope::new(0, ScopeKind::Root)], next_id: 1, policy }
    }

    pub fn policy(&self) -> BlockScopeVisibility {
        self.policy
    }

    /// Number of open scopes, the root included
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn current(&self) -> &Scope {
        // The root scope is never popped
        &self.scopes[self.scopes.len() - 1]
    }

    /// Declare `name` in the innermost scope
    pub fn set(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.names.insert(name.to_string());
        }
    }

    /// True if `name` is declared in the innermost scope or any enclosing one
    pub fn contains(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|scope| scope.declares(name))
    }

    /// Open a scope and return its diagnostic id
    pub fn push(&mut self, kind: ScopeKind) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        debug!("symtable: open {}-{}", kind, id);
        self.scopes.push(Scope::new(id, kind));
        id
    }

    /// Close the innermost block scope, applying the visibility policy
    pub fn close_block(&mut self) {
        let Some(child) = self.pop() else {
            return;
        };
        if self.policy == BlockScopeVisibility::HoistToParent {
            self.merge_refs(child);
        }
    }

    /// Close the innermost function scope; parameters and locals are dropped
    pub fn close_function(&mut self) {
        self.pop();
    }

    /// Copy every name declared in `child` into the innermost scope
    fn merge_refs(&mut self, child: Scope) {
        if let Some(parent) = self.scopes.last_mut() {
            debug!("symtable: hoist {} name(s) from {}-{}", child.names.len(), child.kind, child.id);
            parent.names.extend(child.names);
        }
    }

    fn pop(&mut self) -> Option<Scope> {
        if self.scopes.len() > 1 {
            let scope = self.scopes.pop();
            if let Some(ref scope) = scope {
                debug!("symtable: close {}-{}", scope.kind, scope.id);
            }
            scope
        } else {
            None
        }
    }

    /// Drop every scope above the root without merging (error recovery)
    pub fn unwind(&mut self) {
        self.scopes.truncate(1);
    }

    /// Every visible name, sorted, for "did you mean" suggestions
    pub fn visible_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.scopes.iter().flat_map(|scope| scope.names.iter().cloned()).collect();
        names.sort();
        names.dedup();
        names
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
