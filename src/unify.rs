use crate::dispatch::{Pattern, Registry, Shape};
use crate::subst::Subst;
use crate::term::Term;
use crate::trampoline::{evaluate, Emit, Step, Thunk};
use crate::var::VarScope;
use std::sync::{Arc, OnceLock};

#[cfg(feature = "tracing")]
use crate::trace::{debug_span, trace};

/// Outcome of a unification step: the extended substitution, or `None` on failure.
pub type Unified = Option<Subst>;

/// A unify handler: starts unifying two terms under a substitution.
pub type UnifyHandler =
    Arc<dyn Fn(&Term, &Term, Subst, &VarScope) -> Thunk<Unified> + Send + Sync>;

static REGISTRY: OnceLock<Registry<UnifyHandler>> = OnceLock::new();

fn registry() -> &'static Registry<UnifyHandler> {
    REGISTRY.get_or_init(|| {
        let registry: Registry<UnifyHandler> = Registry::new("unify", Arc::new(unify_equal));
        registry.register(
            [Pattern::Exact(Shape::Var), Pattern::Any],
            Arc::new(unify_var),
        );
        registry.register(
            [Pattern::Any, Pattern::Exact(Shape::Var)],
            Arc::new(unify_var),
        );
        for shape in [Shape::Tuple, Shape::List, Shape::Iter] {
            registry.register(
                [Pattern::Exact(shape), Pattern::Exact(shape)],
                Arc::new(unify_seq),
            );
        }
        registry.register(
            [Pattern::Exact(Shape::Set), Pattern::Exact(Shape::Set)],
            Arc::new(unify_set),
        );
        registry.register(
            [Pattern::Exact(Shape::Map), Pattern::Exact(Shape::Map)],
            Arc::new(unify_map),
        );
        registry.register(
            [Pattern::Exact(Shape::Slice), Pattern::Exact(Shape::Slice)],
            Arc::new(unify_slice),
        );
        registry
    })
}

/// Install a unify handler for term pairs matching `patterns`.
///
/// See [`crate::reify::register_reify`] for how handlers should request
/// sub-unifications.
pub fn register_unify<F>(patterns: [Pattern; 2], handler: F)
where
    F: Fn(&Term, &Term, Subst, &VarScope) -> Thunk<Unified> + Send + Sync + 'static,
{
    registry().register(patterns, Arc::new(handler));
}

/// Dispatch one unify step for `u` and `v`.
pub fn unify_thunk(u: &Term, v: &Term, s: Subst, scope: &VarScope) -> Thunk<Unified> {
    let handler = registry().lookup(&[Shape::of(u, scope), Shape::of(v, scope)]);
    handler(u, v, s, scope)
}

fn unify_equal(u: &Term, v: &Term, s: Subst, _scope: &VarScope) -> Thunk<Unified> {
    if u == v {
        Thunk::Ready(Some(s))
    } else {
        #[cfg(feature = "tracing")]
        trace!(left = ?Shape::of(u, _scope), right = ?Shape::of(v, _scope), "unify_mismatch");
        Thunk::Ready(None)
    }
}

fn unify_var(u: &Term, v: &Term, s: Subst, scope: &VarScope) -> Thunk<Unified> {
    let u = s.walk(u).clone();
    let v = s.walk(v).clone();
    if u == v {
        Thunk::Ready(Some(s))
    } else if scope.is_var(&u) {
        Thunk::Ready(Some(s.assoc(u, v)))
    } else if scope.is_var(&v) {
        Thunk::Ready(Some(s.assoc(v, u)))
    } else {
        unify_thunk(&u, &v, s, scope)
    }
}

/// Unify aligned pairs left to right, threading the substitution and
/// stopping at the first failure.
pub fn unify_pairs(pairs: Vec<(Term, Term)>, s: Subst, scope: &VarScope) -> Thunk<Unified> {
    if pairs.is_empty() {
        return Thunk::Ready(Some(s));
    }
    Thunk::suspend(UnifyPairs {
        pairs,
        next: 0,
        subst: Some(s),
        scope: scope.clone(),
    })
}

struct UnifyPairs {
    pairs: Vec<(Term, Term)>,
    next: usize,
    subst: Option<Subst>,
    scope: VarScope,
}

impl Step<Unified> for UnifyPairs {
    fn resume(&mut self, input: Option<Unified>) -> Emit<Unified> {
        match input {
            Some(None) => return Emit::Done(None),
            Some(Some(s)) => self.subst = Some(s),
            None => {}
        }
        let Some(s) = self.subst.take() else {
            return Emit::Done(None);
        };
        match self.pairs.get(self.next) {
            Some((a, b)) => {
                self.next += 1;
                Emit::Call(unify_thunk(a, b, s, &self.scope))
            }
            None => Emit::Done(Some(s)),
        }
    }
}

fn mismatch(_why: &'static str) -> Thunk<Unified> {
    #[cfg(feature = "tracing")]
    trace!(reason = _why, "unify_mismatch");
    Thunk::Ready(None)
}

fn unify_seq(u: &Term, v: &Term, s: Subst, scope: &VarScope) -> Thunk<Unified> {
    let (Some(a), Some(b)) = (u.items(), v.items()) else {
        return mismatch("not a sequence");
    };
    if a.len() != b.len() {
        return mismatch("length");
    }
    unify_pairs(
        a.iter().cloned().zip(b.iter().cloned()).collect(),
        s,
        scope,
    )
}

/// Elements common to both sets are matched to each other; the remaining
/// elements are paired positionally in canonical order.
fn unify_set(u: &Term, v: &Term, s: Subst, scope: &VarScope) -> Thunk<Unified> {
    let (Term::Set(a), Term::Set(b)) = (u, v) else {
        return mismatch("not a set");
    };
    let left: Vec<Term> = a.difference(b).cloned().collect();
    let right: Vec<Term> = b.difference(a).cloned().collect();
    if left.len() != right.len() {
        return mismatch("set size");
    }
    unify_pairs(left.into_iter().zip(right).collect(), s, scope)
}

fn unify_map(u: &Term, v: &Term, s: Subst, scope: &VarScope) -> Thunk<Unified> {
    let (Term::Map(a), Term::Map(b)) = (u, v) else {
        return mismatch("not a map");
    };
    if a.len() != b.len() {
        return mismatch("map size");
    }
    let mut pairs = Vec::with_capacity(a.len());
    for (key, left) in a.iter() {
        let Some(right) = b.get(key) else {
            return mismatch("map keys");
        };
        pairs.push((left.clone(), right.clone()));
    }
    unify_pairs(pairs, s, scope)
}

fn unify_slice(u: &Term, v: &Term, s: Subst, scope: &VarScope) -> Thunk<Unified> {
    let (Term::Slice(a), Term::Slice(b)) = (u, v) else {
        return mismatch("not a slice");
    };
    unify_pairs(
        vec![
            (a.start.clone(), b.start.clone()),
            (a.stop.clone(), b.stop.clone()),
            (a.step.clone(), b.step.clone()),
        ],
        s,
        scope,
    )
}

/// Unify `u` and `v` under `s`, returning the extended substitution, or
/// `None` if they cannot be made equal.
///
/// There is no occurs check: unifying a variable with a term containing it
/// succeeds and produces a cyclic binding.
pub fn unify(u: &Term, v: &Term, s: &Subst) -> Option<Subst> {
    VarScope::new().unify(u, v, s)
}

/// [`unify`] starting from the empty substitution.
pub fn unify_empty(u: &Term, v: &Term) -> Option<Subst> {
    unify(u, v, &Subst::new())
}

impl VarScope {
    /// [`unify`] with this scope's atoms treated as variables.
    pub fn unify(&self, u: &Term, v: &Term, s: &Subst) -> Option<Subst> {
        #[cfg(feature = "tracing")]
        let _span = debug_span!("unify", bindings = s.len()).entered();

        if u.same(v) {
            return Some(s.clone());
        }
        let result = evaluate(unify_thunk(u, v, s.clone(), self));

        #[cfg(feature = "tracing")]
        trace!(success = result.is_some(), "unify_done");

        result
    }
}
