use proptest::prelude::*;
use unification::{isground, reify, unground_lvars, unify_empty, var, Subst, Term};

const VAR_COUNT: usize = 5;
const ATOM_NAMES: [&str; 3] = ["a", "b", "c"];
const KEY_NAMES: [&str; 3] = ["k0", "k1", "k2"];

#[derive(Clone, Debug)]
enum RawTerm {
    Int(i64),
    Str(usize),
    Var(usize),
    Tuple(Vec<RawTerm>),
    List(Vec<RawTerm>),
    Map(Vec<(usize, RawTerm)>),
}

fn raw_term_strategy(with_vars: bool) -> impl Strategy<Value = RawTerm> {
    let max_var = if with_vars { VAR_COUNT } else { 0 };
    let leaf = prop_oneof![
        (0i64..4).prop_map(RawTerm::Int),
        (0..ATOM_NAMES.len()).prop_map(RawTerm::Str),
        (0..max_var.max(1)).prop_map(move |i| {
            if with_vars {
                RawTerm::Var(i)
            } else {
                RawTerm::Int(i as i64)
            }
        }),
    ];

    leaf.prop_recursive(3, 24, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(RawTerm::Tuple),
            prop::collection::vec(inner.clone(), 0..3).prop_map(RawTerm::List),
            prop::collection::vec((0..KEY_NAMES.len(), inner), 0..3).prop_map(RawTerm::Map),
        ]
    })
}

fn pattern() -> impl Strategy<Value = RawTerm> {
    raw_term_strategy(true)
}

fn ground() -> impl Strategy<Value = RawTerm> {
    raw_term_strategy(false)
}

fn pvar(i: usize) -> Term {
    Term::from(var(format!("prop_v{}", i).as_str()))
}

fn build_term(raw: &RawTerm) -> Term {
    match raw {
        RawTerm::Int(i) => Term::int(*i),
        RawTerm::Str(i) => Term::str(ATOM_NAMES[*i]),
        RawTerm::Var(i) => pvar(*i),
        RawTerm::Tuple(items) => Term::tuple(items.iter().map(build_term)),
        RawTerm::List(items) => Term::list(items.iter().map(build_term)),
        RawTerm::Map(entries) => Term::map(
            entries
                .iter()
                .map(|(k, v)| (Term::str(KEY_NAMES[*k]), build_term(v))),
        ),
    }
}

/// One optional binding per variable. Variable `i` is bound either to a ground
/// term or to a variable `j > i`, so the substitution never has a cycle.
fn acyclic_bindings() -> impl Strategy<Value = Vec<Option<(bool, usize, RawTerm)>>> {
    prop::collection::vec(
        prop::option::of((any::<bool>(), 0..VAR_COUNT, ground())),
        VAR_COUNT..=VAR_COUNT,
    )
}

fn build_bindings(raw: &[Option<(bool, usize, RawTerm)>]) -> Vec<(Term, Term)> {
    raw.iter()
        .enumerate()
        .filter_map(|(i, binding)| {
            let (to_var, j, ground) = binding.as_ref()?;
            let value = if *to_var && *j > i {
                pvar(*j)
            } else {
                build_term(ground)
            };
            Some((pvar(i), value))
        })
        .collect()
}

fn plain(bindings: &[(Term, Term)]) -> Subst {
    bindings.iter().cloned().collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn unify_is_reflexive(raw in pattern()) {
        let a = build_term(&raw);
        let b = build_term(&raw);
        prop_assert_eq!(unify_empty(&a, &b), Some(Subst::new()));
    }

    #[test]
    fn unify_is_symmetric(p in pattern(), g in ground()) {
        let p = build_term(&p);
        let g = build_term(&g);
        prop_assert_eq!(unify_empty(&p, &g), unify_empty(&g, &p));
    }

    #[test]
    fn unifier_makes_pattern_equal_to_target(p in pattern(), g in ground()) {
        let p = build_term(&p);
        let g = build_term(&g);
        if let Some(s) = unify_empty(&p, &g) {
            prop_assert_eq!(reify(&p, &s), g);
        }
    }

    #[test]
    fn pattern_unifies_with_its_own_instance(p in pattern(), bindings in acyclic_bindings()) {
        let p = build_term(&p);
        let s = plain(&build_bindings(&bindings));
        let instance = reify(&p, &s);
        let unifier = unify_empty(&p, &instance);
        prop_assert!(unifier.is_some());
    }

    #[test]
    fn reify_is_idempotent(raw in pattern(), bindings in acyclic_bindings()) {
        let term = build_term(&raw);
        let s = plain(&build_bindings(&bindings));
        let once = reify(&term, &s);
        let twice = reify(&once, &s);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn reified_term_has_no_bound_variables(raw in pattern(), bindings in acyclic_bindings()) {
        let term = build_term(&raw);
        let s = plain(&build_bindings(&bindings));
        let reified = reify(&term, &s);
        for v in unground_lvars(&reified, &Subst::new()) {
            prop_assert!(!s.contains_key(&v), "{} is bound but survived reify", v);
        }
    }

    #[test]
    fn isground_agrees_with_unground_lvars(raw in pattern(), bindings in acyclic_bindings()) {
        let term = build_term(&raw);
        let s = plain(&build_bindings(&bindings));
        prop_assert_eq!(isground(&term, &s), unground_lvars(&term, &s).is_empty());
    }

    #[test]
    fn contracting_subst_reifies_like_plain(raw in pattern(), bindings in acyclic_bindings()) {
        let term = build_term(&raw);
        let bindings = build_bindings(&bindings);
        let contracting = Subst::contracting_from(bindings.iter().cloned());
        prop_assert_eq!(reify(&term, &contracting), reify(&term, &plain(&bindings)));
    }

    #[test]
    fn contracting_subst_stays_one_hop(
        inserts in prop::collection::vec((0..VAR_COUNT, any::<bool>(), 0..VAR_COUNT), 0..24)
    ) {
        let mut s = Subst::contracting();
        for (k, to_var, v) in inserts {
            let value = if to_var { pvar(v) } else { Term::int(v as i64) };
            s = s.assoc(pvar(k), value);
            for (key, value) in s.iter() {
                prop_assert_ne!(key, value);
                prop_assert!(!s.contains_key(value), "{} -> {} is not contracted", key, value);
            }
        }
    }
}
