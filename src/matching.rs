//! Multiple dispatch on unification patterns.
//!
//! A [`Dispatcher`] holds handlers keyed by signatures, which are tuples of
//! terms that may contain variables. Calling it unifies the arguments against
//! each signature, most specific first, and runs the first handler that
//! matches with the resulting bindings.

use crate::error::DispatchError;
use crate::freeze::freeze;
use crate::reify::reify;
use crate::subst::Subst;
use crate::term::{Atom, Term};
use crate::toposort::toposort;
#[cfg(feature = "tracing")]
use crate::trace::debug;
use crate::unify::unify;
use crate::var::{isvar, Var};
use hashbrown::HashMap;
use parking_lot::RwLock;
use rustc_hash::FxHasher;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// Is `a` at least as specific a pattern as `b`?
///
/// True when `b` is a variable and `a` is not, or when unifying `a` with `b`
/// leaves `a` unchanged once variable-to-variable bindings are discarded.
pub fn supersedes(a: &Term, b: &Term) -> bool {
    if isvar(b) && !isvar(a) {
        return true;
    }
    let Some(s) = unify(a, b, &Subst::new()) else {
        return false;
    };
    let s = s.filter(|k, v| !(isvar(k) && isvar(v)));
    reify(a, &s) == *a
}

/// Must `a` be tried before `b`?
///
/// `tie_break` decides when each supersedes the other.
pub fn edge(a: &Term, b: &Term, tie_break: impl FnOnce() -> bool) -> bool {
    if !supersedes(a, b) {
        return false;
    }
    if supersedes(b, a) {
        tie_break()
    } else {
        true
    }
}

/// How to order two signatures that supersede each other.
#[derive(Clone, Copy, Debug, Default)]
pub enum TieBreak {
    /// Larger FxHash of the signature first; registration order on collision.
    #[default]
    Hash,
    /// Earlier registration first.
    Registration,
    /// `f(a, b)` says whether `a` goes before `b`. An inconsistent `f` can
    /// make the order cyclic, which [`Dispatcher::add`] reports.
    Custom(fn(&Term, &Term) -> bool),
}

fn fx_hash(term: &Term) -> u64 {
    let mut hasher = FxHasher::default();
    term.hash(&mut hasher);
    hasher.finish()
}

impl TieBreak {
    /// Whether `a` (registered at `ia`) goes before `b` (registered at `ib`).
    pub fn prefers(self, a: &Term, ia: usize, b: &Term, ib: usize) -> bool {
        match self {
            TieBreak::Hash => match fx_hash(a).cmp(&fx_hash(b)) {
                std::cmp::Ordering::Equal => ia < ib,
                other => other.is_gt(),
            },
            TieBreak::Registration => ia < ib,
            TieBreak::Custom(f) => f(a, b),
        }
    }
}

/// Most-specific-first order of `signatures`, as indices.
///
/// Signatures with no ordering constraint between them keep registration
/// order. On a cycle, returns the indices involved.
pub fn ordering(signatures: &[Term], tie_break: TieBreak) -> Result<Vec<usize>, Vec<usize>> {
    let edges: Vec<SmallVec<[usize; 4]>> = signatures
        .iter()
        .enumerate()
        .map(|(i, a)| {
            signatures
                .iter()
                .enumerate()
                .filter(|&(j, b)| i != j && edge(a, b, || tie_break.prefers(a, i, b, j)))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();
    toposort(&edges)
}

/// The arguments a handler was called with and the bindings that matched them.
pub struct Match<'a> {
    pub args: &'a [Term],
    pub signature: &'a Term,
    pub bindings: Subst,
}

impl Match<'_> {
    /// The value bound to `var` by the matching signature.
    pub fn get(&self, var: &Var) -> Option<&Term> {
        self.bindings.get(&Term::from(var))
    }

    /// The value bound to the variable whose token is `token`.
    pub fn named(&self, token: impl Into<Atom>) -> Option<&Term> {
        self.get(&Var::new(token))
    }

    /// Every binding keyed by variable token.
    pub fn by_token(&self) -> HashMap<Atom, Term> {
        self.bindings
            .iter()
            .filter_map(|(k, v)| Some((k.as_var()?.token(), v.clone())))
            .collect()
    }
}

pub type Handler<R> = Arc<dyn Fn(&Match<'_>) -> R + Send + Sync>;

/// Handlers keyed by signature, tried most specific first.
pub struct Dispatcher<R> {
    name: String,
    signatures: Vec<Term>,
    handlers: Vec<Handler<R>>,
    index: HashMap<Term, usize>,
    order: Vec<usize>,
    tie_break: TieBreak,
}

impl<R> Dispatcher<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Dispatcher {
            name: name.into(),
            signatures: Vec::new(),
            handlers: Vec::new(),
            index: HashMap::new(),
            order: Vec::new(),
            tie_break: TieBreak::default(),
        }
    }

    /// Use `tie_break` for signatures that supersede each other.
    ///
    /// Fails if the signatures already registered have no acyclic order
    /// under `tie_break`.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Result<Self, DispatchError> {
        self.order = ordering(&self.signatures, tie_break).map_err(|cycle| self.cycle(&cycle))?;
        self.tie_break = tie_break;
        Ok(self)
    }

    fn cycle(&self, members: &[usize]) -> DispatchError {
        #[cfg(feature = "tracing")]
        debug!(dispatcher = %self.name, members = members.len(), "ordering_cycle");
        DispatchError::Cycle {
            name: self.name.clone(),
            members: members.iter().map(|&i| self.signatures[i].clone()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Signatures in the order they are tried.
    pub fn ordering(&self) -> impl Iterator<Item = &Term> + '_ {
        self.order.iter().map(|&i| &self.signatures[i])
    }

    /// Register `handler` for `signature`, replacing any handler already
    /// registered for an equal signature.
    ///
    /// Fails, leaving the dispatcher unchanged, if the new signature makes
    /// the specificity order cyclic.
    pub fn add<F>(
        &mut self,
        signature: impl IntoIterator<Item = Term>,
        handler: F,
    ) -> Result<(), DispatchError>
    where
        F: Fn(&Match<'_>) -> R + Send + Sync + 'static,
    {
        let signature = freeze(&Term::tuple(signature));
        let handler: Handler<R> = Arc::new(handler);
        if let Some(&i) = self.index.get(&signature) {
            self.handlers[i] = handler;
            return Ok(());
        }

        self.signatures.push(signature.clone());
        self.handlers.push(handler);
        match ordering(&self.signatures, self.tie_break) {
            Ok(order) => {
                #[cfg(feature = "tracing")]
                debug!(dispatcher = %self.name, signature = %signature, "signature_added");
                self.index.insert(signature, self.signatures.len() - 1);
                self.order = order;
                Ok(())
            }
            Err(cycle) => {
                let err = self.cycle(&cycle);
                self.signatures.pop();
                self.handlers.pop();
                Err(err)
            }
        }
    }

    /// The first signature in specificity order that `args` unify with, its
    /// handler, and the bindings.
    pub fn resolve(&self, args: &[Term]) -> Result<(&Handler<R>, &Term, Subst), DispatchError> {
        let frozen = freeze(&Term::tuple(args.iter().cloned()));
        for &i in &self.order {
            let signature = &self.signatures[i];
            if signature.arity() != args.len() {
                continue;
            }
            if let Some(s) = unify(&frozen, signature, &Subst::new()) {
                return Ok((&self.handlers[i], signature, s));
            }
        }

        #[cfg(feature = "tracing")]
        debug!(dispatcher = %self.name, args = %frozen, "no_match");

        Err(DispatchError::NoMatch {
            name: self.name.clone(),
            args: frozen,
            known: self.ordering().cloned().collect(),
        })
    }

    /// Run the handler of the most specific signature matching `args`.
    pub fn call(&self, args: &[Term]) -> Result<R, DispatchError> {
        let (handler, signature, bindings) = self.resolve(args)?;
        Ok(handler(&Match {
            args,
            signature,
            bindings,
        }))
    }
}

/// Dispatchers by name.
pub struct Namespace<R> {
    dispatchers: HashMap<String, Dispatcher<R>>,
}

impl<R> Default for Namespace<R> {
    fn default() -> Self {
        Namespace {
            dispatchers: HashMap::new(),
        }
    }
}

impl<R> Namespace<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler to the dispatcher `name`, creating it on first use.
    pub fn register<F>(
        &mut self,
        name: &str,
        signature: impl IntoIterator<Item = Term>,
        handler: F,
    ) -> Result<(), DispatchError>
    where
        F: Fn(&Match<'_>) -> R + Send + Sync + 'static,
    {
        self.dispatchers
            .entry(name.to_string())
            .or_insert_with(|| Dispatcher::new(name))
            .add(signature, handler)
    }

    pub fn get(&self, name: &str) -> Option<&Dispatcher<R>> {
        self.dispatchers.get(name)
    }

    pub fn call(&self, name: &str, args: &[Term]) -> Result<R, DispatchError> {
        self.get(name)
            .ok_or_else(|| DispatchError::Unknown(name.to_string()))?
            .call(args)
    }
}

static GLOBAL: OnceLock<RwLock<Namespace<Term>>> = OnceLock::new();

/// The process-wide namespace used by [`register`] and [`call`].
pub fn global() -> &'static RwLock<Namespace<Term>> {
    GLOBAL.get_or_init(|| RwLock::new(Namespace::new()))
}

/// Register `handler` under `name` in the global namespace.
pub fn register<F>(
    name: &str,
    signature: impl IntoIterator<Item = Term>,
    handler: F,
) -> Result<(), DispatchError>
where
    F: Fn(&Match<'_>) -> Term + Send + Sync + 'static,
{
    global().write().register(name, signature, handler)
}

/// Call the global dispatcher `name`.
///
/// The handler runs after the namespace lock is released, so it may itself
/// call or register.
pub fn call(name: &str, args: &[Term]) -> Result<Term, DispatchError> {
    let (handler, signature, bindings) = {
        let namespace = global().read();
        let dispatcher = namespace
            .get(name)
            .ok_or_else(|| DispatchError::Unknown(name.to_string()))?;
        let (handler, signature, bindings) = dispatcher.resolve(args)?;
        (handler.clone(), signature.clone(), bindings)
    };
    Ok(handler(&Match {
        args,
        signature: &signature,
        bindings,
    }))
}

#[cfg(test)]
#[path = "tests/matching.rs"]
mod tests;
