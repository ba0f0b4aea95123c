//! Terms far deeper than the host stack could recurse through.

use unification::{isground, reify, unground_lvars, unify, unify_empty, var, Subst, Term, Var};

const DEPTH: usize = 50_000;

/// `[1, [2, [..., [DEPTH - 1, last]]]]`, with `var(i)` heads when `with_vars`.
fn chain(last: Term, with_vars: bool) -> Term {
    let mut inner = last;
    for i in (1..DEPTH as i64).rev() {
        let head = if with_vars {
            Term::from(var(i))
        } else {
            Term::int(i)
        };
        inner = Term::list([head, inner]);
    }
    inner
}

fn tail() -> Var {
    var("deep_tail")
}

#[test]
fn unify_binds_variable_at_the_bottom() {
    let a = tail();
    let form = chain(Term::from(&a), false);
    let term = chain(Term::str("a"), false);

    let s = unify_empty(&form, &term).expect("chains should unify");
    assert_eq!(s.len(), 1);
    assert_eq!(s.get(&Term::from(&a)), Some(&Term::str("a")));
}

#[test]
fn unify_fails_on_mismatch_at_the_bottom() {
    let form = chain(Term::str("a"), false);
    let term = chain(Term::str("b"), false);
    assert!(unify_empty(&form, &term).is_none());
}

#[test]
fn unify_binds_every_head() {
    let form = chain(Term::from(tail()), true);
    let term = chain(Term::int(0), false);

    let s = unify_empty(&form, &term).expect("chains should unify");
    assert_eq!(s.len(), DEPTH);
    assert_eq!(s.get(&Term::from(var(1i64))), Some(&Term::int(1)));
    assert_eq!(
        s.get(&Term::from(var((DEPTH - 1) as i64))),
        Some(&Term::int((DEPTH - 1) as i64))
    );
}

#[test]
fn reify_substitutes_at_the_bottom() {
    let a = tail();
    let form = chain(Term::from(&a), false);
    let s = Subst::new().assoc(&a, "a");

    let reified = reify(&form, &s);
    assert!(reified == chain(Term::str("a"), false));
}

#[test]
fn reify_after_unify_round_trips() {
    let form = chain(Term::from(tail()), true);
    let term = chain(Term::int(0), false);

    let s = unify(&form, &term, &Subst::new()).expect("chains should unify");
    assert!(reify(&form, &s) == term);
}

#[test]
fn unchanged_deep_term_is_returned_as_is() {
    let term = chain(Term::int(0), false);
    let s = Subst::new().assoc(tail(), 1);
    assert!(reify(&term, &s).same(&term));
}

#[test]
fn ground_queries_on_deep_terms() {
    let a = tail();
    let form = chain(Term::from(&a), false);

    assert!(!isground(&form, &Subst::new()));
    let unbound = unground_lvars(&form, &Subst::new());
    assert_eq!(unbound.len(), 1);
    assert!(unbound.contains(&Term::from(&a)));

    let s = Subst::new().assoc(&a, 0);
    assert!(isground(&form, &s));
    assert!(unground_lvars(&form, &s).is_empty());
}

#[test]
fn contracting_subst_on_deep_terms() {
    let a = tail();
    let b = var("deep_tail_b");
    let form = chain(Term::from(&a), false);

    let s = Subst::contracting().assoc(&a, &b).assoc(&b, "end");
    assert_eq!(s.get(&Term::from(&a)), Some(&Term::str("end")));
    assert!(reify(&form, &s) == chain(Term::str("end"), false));
}

#[test]
fn long_variable_chain_walks_to_the_end() {
    let vs: Vec<Var> = (0..DEPTH).map(|i| var(format!("deep_link_{}", i).as_str())).collect();
    let mut s = Subst::new();
    for pair in vs.windows(2) {
        s = s.assoc(&pair[0], &pair[1]);
    }
    let last = vs.last().expect("non-empty");
    s = s.assoc(last, 7);

    assert_eq!(s.walk(&Term::from(&vs[0])), &Term::int(7));
    assert_eq!(reify(&Term::from(&vs[0]), &s), Term::int(7));
}
