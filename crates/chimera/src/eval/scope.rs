use std::collections::HashMap;

use crate::types::Value;

/// Handle to one frame of a [`ScopeArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug)]
struct Frame {
    parent: Option<ScopeId>,
    bindings: HashMap<String, Vec<Value>>,
}

/// Append-only storage for variable scopes.
///
/// Each frame links to its parent by index, so a nested rule block gets a
/// child frame and lookups walk block-local, then enclosing blocks, then the
/// sheet frame. Variables hold a value list (`$pad: 1px 2px;`).
#[derive(Debug, Default)]
pub struct ScopeArena {
    frames: Vec<Frame>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frame without a parent.
    pub fn root(&mut self) -> ScopeId {
        self.push(None)
    }

    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        self.push(Some(parent))
    }

    fn push(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.frames.push(Frame {
            parent,
            bindings: HashMap::new(),
        });
        ScopeId(self.frames.len() - 1)
    }

    pub fn define(&mut self, scope: ScopeId, name: impl Into<String>, values: Vec<Value>) {
        self.frames[scope.0].bindings.insert(name.into(), values);
    }

    /// Resolves `name` from `scope` outwards.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&[Value]> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let frame = &self.frames[id.0];
            if let Some(values) = frame.bindings.get(name) {
                return Some(values);
            }
            current = frame.parent;
        }
        None
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
