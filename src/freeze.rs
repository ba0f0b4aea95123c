use crate::term::Term;

/// Convert containers to a canonical tuple form usable as a lookup key.
///
/// Lists and iters become tuples, sets become tuples in canonical element
/// order, and maps become tuples of `(key, value)` tuples in key order.
/// Everything else is returned as is. Recurses into container elements.
pub fn freeze(term: &Term) -> Term {
    match term {
        Term::Tuple(items) | Term::List(items) | Term::Iter(items) => {
            Term::tuple(items.iter().map(freeze))
        }
        Term::Set(set) => Term::tuple(set.iter().map(freeze)),
        Term::Map(map) => {
            Term::tuple(map.iter().map(|(k, v)| Term::tuple([freeze(k), freeze(v)])))
        }
        _ => term.clone(),
    }
}
