//! An association store that keeps every binding chain one hop long.
//!
//! Inserting `key -> value` resolves `value` one step, re-points every key
//! that currently maps to `key`, and drops bindings that would close a cycle.
//! Afterwards no value is also a key, so a lookup is the full walk.

use crate::term::Term;
#[cfg(feature = "tracing")]
use crate::trace::trace;
use hashbrown::hash_map;
use hashbrown::{HashMap, HashSet};
use std::fmt;

#[derive(Clone, Default)]
pub struct ContractingMap {
    forward: HashMap<Term, Term>,
    /// value -> keys currently bound to it
    inverse: HashMap<Term, HashSet<Term>>,
}

impl ContractingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &Term) -> Option<&Term> {
        self.forward.get(key)
    }

    pub fn contains_key(&self, key: &Term) -> bool {
        self.forward.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, Term, Term> {
        self.forward.iter()
    }

    /// Bind `key` to `value`, contracting chains through `key`.
    pub fn insert(&mut self, key: Term, value: Term) {
        let mut target = self.forward.get(&value).cloned().unwrap_or_else(|| value.clone());
        if target == key {
            // value already leads back to key: drop that edge rather than close a cycle
            #[cfg(feature = "tracing")]
            trace!(key = %key, value = %value, "chain_cycle_broken");
            self.remove(&value);
            target = value;
        }
        if target == key {
            return;
        }

        self.remove(&key);
        if let Some(sources) = self.inverse.remove(&key) {
            for source in sources {
                if source == target {
                    self.forward.remove(&source);
                    continue;
                }
                self.forward.insert(source.clone(), target.clone());
                self.inverse.entry(target.clone()).or_default().insert(source);
            }
        }
        self.inverse.entry(target.clone()).or_default().insert(key.clone());
        self.forward.insert(key, target);
    }

    pub fn remove(&mut self, key: &Term) -> Option<Term> {
        let old = self.forward.remove(key)?;
        if let Some(keys) = self.inverse.get_mut(&old) {
            keys.remove(key);
            if keys.is_empty() {
                self.inverse.remove(&old);
            }
        }
        Some(old)
    }
}

impl PartialEq for ContractingMap {
    fn eq(&self, other: &Self) -> bool {
        self.forward == other.forward
    }
}

impl Eq for ContractingMap {}

impl FromIterator<(Term, Term)> for ContractingMap {
    fn from_iter<I: IntoIterator<Item = (Term, Term)>>(iter: I) -> Self {
        let mut map = ContractingMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl fmt::Debug for ContractingMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.forward.iter().collect();
        entries.sort();
        f.debug_map().entries(entries).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::var::{var, Var};

    fn t(v: &Var) -> Term {
        Term::from(v)
    }

    fn abcd() -> (Var, Var, Var, Var) {
        (var("cm_a"), var("cm_b"), var("cm_c"), var("cm_d"))
    }

    /// No binding maps to itself and no value is also a key.
    fn assert_contracted(map: &ContractingMap) {
        for (k, v) in map.iter() {
            assert_ne!(k, v, "self-binding for {}", k);
            assert!(!map.contains_key(v), "value {} of {} is also a key", v, k);
        }
    }

    #[test]
    fn chains_collapse_on_construction() {
        let (a, b, c, d) = abcd();
        let m: ContractingMap = [(t(&b), t(&c)), (t(&c), t(&a)), (t(&d), t(&d))]
            .into_iter()
            .collect();
        let expected: ContractingMap = [(t(&b), t(&a)), (t(&c), t(&a))].into_iter().collect();
        assert_eq!(m, expected);
        assert_eq!(m.len(), 2, "d -> d is never stored");
        assert_contracted(&m);
    }

    #[test]
    fn two_cycle_keeps_the_later_binding() {
        let (_, b, c, d) = abcd();
        let m: ContractingMap = [(t(&b), t(&c)), (t(&c), t(&b)), (t(&d), t(&d))]
            .into_iter()
            .collect();
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&t(&c)), Some(&t(&b)));

        let m: ContractingMap = [(t(&c), t(&b)), (t(&b), t(&c))].into_iter().collect();
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(&t(&b)), Some(&t(&c)));
    }

    #[test]
    fn insert_repoints_existing_sources() {
        let (a, b, c, _) = abcd();
        let mut m = ContractingMap::new();
        m.insert(t(&a), t(&b));
        m.insert(t(&b), t(&c));
        assert_eq!(m.get(&t(&a)), Some(&t(&c)));
        assert_eq!(m.get(&t(&b)), Some(&t(&c)));
        assert_eq!(m.len(), 2);
        assert_contracted(&m);
    }

    #[test]
    fn insert_resolves_bound_value() {
        let (a, b, c, _) = abcd();
        let mut m = ContractingMap::new();
        m.insert(t(&b), t(&c));
        m.insert(t(&a), t(&b));
        assert_eq!(m.get(&t(&a)), Some(&t(&c)));
        assert_eq!(m.get(&t(&b)), Some(&t(&c)));
    }

    #[test]
    fn closing_a_cycle_drops_the_old_edge() {
        let (a, b, c, _) = abcd();
        let mut m = ContractingMap::new();
        m.insert(t(&b), t(&c));
        m.insert(t(&a), t(&b));
        m.insert(t(&c), t(&a));
        assert_eq!(m.get(&t(&b)), Some(&t(&a)));
        assert_eq!(m.get(&t(&c)), Some(&t(&a)));
        assert_eq!(m.len(), 2);
        assert_contracted(&m);
    }

    #[test]
    fn long_chain_stays_one_hop() {
        let vs: Vec<Var> = (0..1000).map(|i| var(format!("cm_chain_{}", i).as_str())).collect();
        let mut m = ContractingMap::new();
        for pair in vs.windows(2) {
            m.insert(t(&pair[0]), t(&pair[1]));
        }
        let last = t(&vs[vs.len() - 1]);
        assert_eq!(m.len(), vs.len() - 1);
        assert!(
            vs[..vs.len() - 1].iter().all(|v| m.get(&t(v)) == Some(&last)),
            "Every key should resolve to the chain's end in one lookup"
        );
        assert_contracted(&m);
    }

    #[test]
    fn remove_forgets_inverse_entry() {
        let (a, b, c, _) = abcd();
        let mut m = ContractingMap::new();
        m.insert(t(&a), t(&b));
        assert_eq!(m.remove(&t(&a)), Some(t(&b)));
        assert!(m.is_empty());
        // b no longer has sources, so binding it must not touch a
        m.insert(t(&b), t(&c));
        assert_eq!(m.get(&t(&a)), None);
    }

    #[test]
    fn values_may_be_compound() {
        let (a, b, _, _) = abcd();
        let mut m = ContractingMap::new();
        m.insert(t(&a), t(&b));
        m.insert(t(&b), crate::tuple![1, 2]);
        assert_eq!(m.get(&t(&a)), Some(&crate::tuple![1, 2]));
    }
}
