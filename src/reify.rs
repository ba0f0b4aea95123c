//! Substituting bindings into terms, and querying for unbound variables.

use crate::dispatch::{Pattern, Registry, Shape};
use crate::subst::Subst;
use crate::term::Term;
use crate::trampoline::{evaluate, observe, Emit, Flow, Observer, Step, Thunk};
use crate::var::VarScope;
use hashbrown::HashSet;
use std::sync::{Arc, OnceLock};

/// A reify handler: starts reifying one term under a substitution.
pub type ReifyHandler = Arc<dyn Fn(&Term, &Subst, &VarScope) -> Thunk<Term> + Send + Sync>;

static REGISTRY: OnceLock<Registry<ReifyHandler>> = OnceLock::new();

fn registry() -> &'static Registry<ReifyHandler> {
    REGISTRY.get_or_init(|| {
        let registry: Registry<ReifyHandler> = Registry::new("reify", Arc::new(reify_leaf));
        registry.register([Pattern::Exact(Shape::Var)], Arc::new(reify_var));
        for shape in [
            Shape::Tuple,
            Shape::List,
            Shape::Iter,
            Shape::Set,
            Shape::Map,
            Shape::Slice,
        ] {
            registry.register([Pattern::Exact(shape)], Arc::new(reify_children));
        }
        registry
    })
}

/// Install a reify handler for terms matching `pattern`.
///
/// Handlers that need sub-results must return a suspended [`Step`] that
/// emits [`Emit::Call`] with [`reify_thunk`] for each one; recursing directly
/// gives up stack safety.
pub fn register_reify<F>(pattern: Pattern, handler: F)
where
    F: Fn(&Term, &Subst, &VarScope) -> Thunk<Term> + Send + Sync + 'static,
{
    registry().register([pattern], Arc::new(handler));
}

/// Dispatch one reify step for `term`.
pub fn reify_thunk(term: &Term, s: &Subst, scope: &VarScope) -> Thunk<Term> {
    let handler = registry().lookup(&[Shape::of(term, scope)]);
    handler(term, s, scope)
}

fn reify_leaf(term: &Term, _s: &Subst, _scope: &VarScope) -> Thunk<Term> {
    Thunk::Ready(term.clone())
}

fn reify_var(term: &Term, s: &Subst, scope: &VarScope) -> Thunk<Term> {
    let walked = s.walk(term);
    if scope.is_var(walked) {
        Thunk::Ready(walked.clone())
    } else {
        reify_thunk(walked, s, scope)
    }
}

fn reify_children(term: &Term, s: &Subst, scope: &VarScope) -> Thunk<Term> {
    if term.arity() == 0 {
        return Thunk::Ready(term.clone());
    }
    Thunk::suspend(ReifyChildren {
        original: term.clone(),
        children: term.children().cloned().collect(),
        results: Vec::with_capacity(term.arity()),
        next: 0,
        subst: s.clone(),
        scope: scope.clone(),
        constructing: false,
    })
}

/// Reifies each child in order, then rebuilds the term; an unchanged term is
/// returned as the original instance.
struct ReifyChildren {
    original: Term,
    children: Vec<Term>,
    results: Vec<Term>,
    next: usize,
    subst: Subst,
    scope: VarScope,
    constructing: bool,
}

impl Step<Term> for ReifyChildren {
    fn resume(&mut self, input: Option<Term>) -> Emit<Term> {
        if let Some(child) = input {
            self.results.push(child);
        }
        if !self.constructing {
            if let Some(child) = self.children.get(self.next) {
                self.next += 1;
                return Emit::Call(reify_thunk(child, &self.subst, &self.scope));
            }
            self.constructing = true;
            return Emit::Construct;
        }
        let unchanged = self.results.len() == self.children.len()
            && self
                .results
                .iter()
                .zip(&self.children)
                .all(|(new, old)| new.same(old));
        if unchanged {
            Emit::Done(self.original.clone())
        } else {
            Emit::Done(self.original.rebuild(std::mem::take(&mut self.results)))
        }
    }
}

/// Replace every bound variable in `term` by its binding, recursively.
pub fn reify(term: &Term, s: &Subst) -> Term {
    VarScope::new().reify(term, s)
}

/// The variables (under the empty scope) left unbound in `term` after `s`.
pub fn unground_lvars(term: &Term, s: &Subst) -> HashSet<Term> {
    VarScope::new().unground_lvars(term, s)
}

/// Whether `term` has no unbound variables under `s`.
pub fn isground(term: &Term, s: &Subst) -> bool {
    VarScope::new().isground(term, s)
}

/// Collects variables; skips rebuilding compound terms.
struct CollectVars<'a> {
    scope: &'a VarScope,
    found: HashSet<Term>,
}

impl Observer<Term> for CollectVars<'_> {
    fn value(&mut self, value: &Term) -> Flow {
        if self.scope.is_var(value) {
            self.found.insert(value.clone());
        }
        Flow::Continue
    }

    fn construct(&mut self) -> Flow {
        Flow::Prune
    }
}

/// Stops at the first variable.
struct FirstVar<'a> {
    scope: &'a VarScope,
    found: bool,
}

impl Observer<Term> for FirstVar<'_> {
    fn value(&mut self, value: &Term) -> Flow {
        if self.scope.is_var(value) {
            self.found = true;
            Flow::Halt
        } else {
            Flow::Continue
        }
    }

    fn construct(&mut self) -> Flow {
        Flow::Prune
    }
}

impl VarScope {
    /// [`reify`] with this scope's atoms treated as variables.
    pub fn reify(&self, term: &Term, s: &Subst) -> Term {
        if s.is_empty() {
            return term.clone();
        }
        evaluate(reify_thunk(term, s, self))
    }

    pub fn unground_lvars(&self, term: &Term, s: &Subst) -> HashSet<Term> {
        let mut collect = CollectVars {
            scope: self,
            found: HashSet::new(),
        };
        observe(reify_thunk(term, s, self), &mut collect);
        collect.found
    }

    pub fn isground(&self, term: &Term, s: &Subst) -> bool {
        let mut first = FirstVar {
            scope: self,
            found: false,
        };
        observe(reify_thunk(term, s, self), &mut first);
        !first.found
    }
}

#[cfg(test)]
#[path = "tests/reify.rs"]
mod tests;
