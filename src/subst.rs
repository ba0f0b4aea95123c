use crate::contracting::ContractingMap;
use crate::term::Term;
use hashbrown::hash_map;
use hashbrown::HashMap;
use std::fmt;
use std::sync::Arc;

/// A substitution: bindings from variables to terms.
///
/// Two representations share one interface:
/// - plain (`Subst::new`): chains are stored as given and followed on lookup;
/// - contracting (`Subst::contracting`): chains are shortened on insert, so a
///   lookup is already the end of the chain.
///
/// Bindings are shared copy-on-write, so cloning a substitution to extend it
/// leaves the original untouched.
#[derive(Clone)]
pub struct Subst {
    repr: Repr,
}

#[derive(Clone)]
enum Repr {
    Plain(Arc<HashMap<Term, Term>>),
    Contracting(Arc<ContractingMap>),
}

impl Subst {
    /// Create an empty plain substitution.
    pub fn new() -> Self {
        Subst {
            repr: Repr::Plain(Arc::default()),
        }
    }

    /// Create an empty contracting substitution.
    pub fn contracting() -> Self {
        Subst {
            repr: Repr::Contracting(Arc::default()),
        }
    }

    /// A contracting substitution holding `bindings`, inserted in order.
    pub fn contracting_from<I: IntoIterator<Item = (Term, Term)>>(bindings: I) -> Self {
        Subst {
            repr: Repr::Contracting(Arc::new(bindings.into_iter().collect())),
        }
    }

    pub fn is_contracting(&self) -> bool {
        matches!(self.repr, Repr::Contracting(_))
    }

    /// Get the direct binding for `key`, if any.
    pub fn get(&self, key: &Term) -> Option<&Term> {
        match &self.repr {
            Repr::Plain(map) => map.get(key),
            Repr::Contracting(map) => map.get(key),
        }
    }

    pub fn contains_key(&self, key: &Term) -> bool {
        self.get(key).is_some()
    }

    /// Follow the binding chain from `term` to its end.
    ///
    /// Non-variable terms are returned unchanged. A cyclic chain in a plain
    /// substitution stops after visiting every binding once.
    pub fn walk<'a>(&'a self, term: &'a Term) -> &'a Term {
        if !matches!(term, Term::Var(_) | Term::Atom(_)) {
            return term;
        }
        match &self.repr {
            Repr::Plain(map) => {
                let mut current = term;
                for _ in 0..map.len() {
                    match map.get(current) {
                        Some(next) => current = next,
                        None => break,
                    }
                }
                current
            }
            Repr::Contracting(map) => map.get(term).unwrap_or(term),
        }
    }

    /// Bind `key` to `value` in place. Binding a term to itself is a no-op.
    pub fn bind(&mut self, key: Term, value: Term) {
        match &mut self.repr {
            Repr::Plain(map) => {
                if key != value {
                    Arc::make_mut(map).insert(key, value);
                }
            }
            Repr::Contracting(map) => Arc::make_mut(map).insert(key, value),
        }
    }

    /// This substitution extended with `key -> value`.
    pub fn assoc(mut self, key: impl Into<Term>, value: impl Into<Term>) -> Self {
        self.bind(key.into(), value.into());
        self
    }

    pub fn remove(&mut self, key: &Term) -> Option<Term> {
        if !self.contains_key(key) {
            return None;
        }
        match &mut self.repr {
            Repr::Plain(map) => Arc::make_mut(map).remove(key),
            Repr::Contracting(map) => Arc::make_mut(map).remove(key),
        }
    }

    /// Number of stored bindings.
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Plain(map) => map.len(),
            Repr::Contracting(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterator over (key, value) bindings, in no particular order.
    pub fn iter(&self) -> hash_map::Iter<'_, Term, Term> {
        match &self.repr {
            Repr::Plain(map) => map.iter(),
            Repr::Contracting(map) => map.iter(),
        }
    }

    /// A substitution of the same kind holding only the bindings `keep` accepts.
    pub fn filter(&self, mut keep: impl FnMut(&Term, &Term) -> bool) -> Subst {
        let mut out = match self.repr {
            Repr::Plain(_) => Subst::new(),
            Repr::Contracting(_) => Subst::contracting(),
        };
        for (k, v) in self.iter().filter(|(k, v)| keep(k, v)) {
            out.bind(k.clone(), v.clone());
        }
        out
    }
}

/// `s` extended with `key -> value`; `s` itself is unchanged.
pub fn assoc(s: &Subst, key: impl Into<Term>, value: impl Into<Term>) -> Subst {
    s.clone().assoc(key, value)
}

impl Default for Subst {
    fn default() -> Self {
        Self::new()
    }
}

/// Substitutions are equal when they hold the same bindings, whatever their
/// representation.
impl PartialEq for Subst {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for Subst {}

impl fmt::Debug for Subst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort();
        f.debug_map().entries(entries).finish()
    }
}

impl FromIterator<(Term, Term)> for Subst {
    fn from_iter<I: IntoIterator<Item = (Term, Term)>>(iter: I) -> Self {
        let mut s = Subst::new();
        for (k, v) in iter {
            s.bind(k, v);
        }
        s
    }
}

impl<K: Into<Term>, V: Into<Term>, const N: usize> From<[(K, V); N]> for Subst {
    fn from(bindings: [(K, V); N]) -> Self {
        bindings
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect()
    }
}

#[cfg(test)]
#[path = "tests/subst.rs"]
mod tests;
