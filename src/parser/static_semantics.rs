//! Declaration bookkeeping done while the syntax tree is being built.
//!
//! The builder opens a frame for every function and every block-like scope,
//! declares names into the innermost frame as it meets them, and closes the
//! frame once the last child has been built. Closing yields a
//! [`ScopeSummary`], so a summary is only ever observed complete: everything a
//! function body declares, including names it hoists from nested blocks, is
//! known before the body is attached to the tree.

use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use crate::parser::ast::{FunctionData, IdentifierData, Meta};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeclarationKind {
    Var,
    Let,
    Const,
    Parameter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredName {
    pub name: String,
    pub meta: Meta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexicalName {
    pub name: String,
    pub meta: Meta,
    pub is_const: bool,
}

/// Static declarations of one function or block scope.
///
/// For a function (or script) scope `var_names` are the hoisted `var`
/// bindings. For a block scope they are the `var` names declared somewhere
/// inside the block; they are kept only so redeclaration against the block's
/// lexical names can be diagnosed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScopeSummary {
    pub strict: bool,
    pub parameters: Vec<DeclaredName>,
    pub var_names: Vec<DeclaredName>,
    pub lexical_names: Vec<LexicalName>,
    pub functions: Vec<Rc<FunctionData>>,
}
impl ScopeSummary {
    pub fn has_lexical_declarations(&self) -> bool {
        !self.lexical_names.is_empty() || !self.functions.is_empty()
    }

    /// Hoisted `var` names, first declaration wins, duplicates dropped.
    pub fn var_declared_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = vec![];
        for d in &self.var_names {
            if !names.contains(&d.name.as_str()) {
                names.push(&d.name);
            }
        }
        names
    }

    pub fn is_lexically_declared(&self, name: &str) -> bool {
        self.lexical_names.iter().any(|l| l.name == name)
    }
}

struct ScopeFrame {
    is_function: bool,
    summary: ScopeSummary,
}

pub struct ScopeTracker {
    frames: Vec<ScopeFrame>,
}
impl ScopeTracker {
    pub fn new() -> Self {
        ScopeTracker { frames: vec![] }
    }

    /// Open a function (or script) scope. Strictness is inherited from the
    /// enclosing frame, or switched on by the body's own directive.
    pub fn open_function(&mut self, has_strict_directive: bool) -> ScopeGuard<'_> {
        let strict = has_strict_directive || self.is_strict();
        self.push(true, strict)
    }

    pub fn open_block(&mut self) -> ScopeGuard<'_> {
        let strict = self.is_strict();
        self.push(false, strict)
    }

    fn push(&mut self, is_function: bool, strict: bool) -> ScopeGuard<'_> {
        let depth = self.frames.len();
        self.frames.push(ScopeFrame {
            is_function,
            summary: ScopeSummary {
                strict,
                ..ScopeSummary::default()
            },
        });
        ScopeGuard {
            tracker: self,
            depth,
            released: false,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.frames.last().map(|f| f.summary.strict).unwrap_or(false)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Record a declaration in the currently open scope. `var` travels up to
    /// the nearest function frame and leaves a trace in every block it passes.
    pub fn declare(&mut self, id: &IdentifierData, kind: DeclarationKind) {
        let declared = DeclaredName {
            name: id.name.to_string(),
            meta: id.meta,
        };
        match kind {
            DeclarationKind::Var => {
                for frame in self.frames.iter_mut().rev() {
                    frame.summary.var_names.push(declared.clone());
                    if frame.is_function {
                        break;
                    }
                }
            }
            DeclarationKind::Let | DeclarationKind::Const => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.summary.lexical_names.push(LexicalName {
                        name: declared.name,
                        meta: declared.meta,
                        is_const: kind == DeclarationKind::Const,
                    });
                }
            }
            DeclarationKind::Parameter => {
                if let Some(frame) = self.frames.last_mut() {
                    frame.summary.parameters.push(declared);
                }
            }
        }
    }

    /// Record a function declaration for hoisting into the current scope.
    pub fn declare_function(&mut self, function: Rc<FunctionData>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.summary.functions.push(function);
        }
    }
}

impl Default for ScopeTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// An open scope frame. Dereferences to the tracker so nested scopes can be
/// opened through it. Dropping the guard without calling [`ScopeGuard::close`]
/// discards the frame (and anything opened above it).
pub struct ScopeGuard<'a> {
    tracker: &'a mut ScopeTracker,
    depth: usize,
    released: bool,
}
impl<'a> ScopeGuard<'a> {
    pub fn close(mut self) -> ScopeSummary {
        self.released = true;
        self.tracker.frames.truncate(self.depth + 1);
        self.tracker
            .frames
            .pop()
            .map(|f| f.summary)
            .unwrap_or_default()
    }
}
impl<'a> Deref for ScopeGuard<'a> {
    type Target = ScopeTracker;

    fn deref(&self) -> &ScopeTracker {
        self.tracker
    }
}
impl<'a> DerefMut for ScopeGuard<'a> {
    fn deref_mut(&mut self) -> &mut ScopeTracker {
        self.tracker
    }
}
impl<'a> Drop for ScopeGuard<'a> {
    fn drop(&mut self) {
        if !self.released {
            self.tracker.frames.truncate(self.depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> IdentifierData {
        IdentifierData {
            name: name.to_string(),
            meta: Meta::default(),
        }
    }

    #[test]
    fn var_hoists_through_blocks() {
        let mut tracker = ScopeTracker::new();
        let mut function = tracker.open_function(false);
        {
            let mut block = function.open_block();
            block.declare(&id("x"), DeclarationKind::Var);
            block.declare(&id("y"), DeclarationKind::Let);
            let summary = block.close();
            assert_eq!(summary.var_names.len(), 1);
            assert!(summary.is_lexically_declared("y"));
        }
        let summary = function.close();
        assert_eq!(summary.var_declared_names(), vec!["x"]);
        assert!(!summary.is_lexically_declared("y"));
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn dropped_guard_releases_frame() {
        let mut tracker = ScopeTracker::new();
        {
            let mut function = tracker.open_function(true);
            let _block = function.open_block();
        }
        assert_eq!(tracker.depth(), 0);
        assert!(!tracker.is_strict());
    }

    #[test]
    fn strictness_is_inherited() {
        let mut tracker = ScopeTracker::new();
        let mut outer = tracker.open_function(true);
        let inner = outer.open_function(false);
        assert!(inner.is_strict());
        assert!(inner.close().strict);
    }
}
