use super::*;
use crate::test_utils::long_chain;
use crate::var::var;
use std::collections::hash_map::DefaultHasher;

fn hash_of(t: &Term) -> u64 {
    let mut h = DefaultHasher::new();
    t.hash(&mut h);
    h.finish()
}

// ========== CONSTRUCTION ==========

#[test]
fn macros_convert_elements() {
    let x = var("term_x");
    let t = tuple![1, "a", true, (), &x];
    let items = t.items().expect("tuple has items");
    assert_eq!(items[0], Term::int(1));
    assert_eq!(items[1], Term::str("a"));
    assert_eq!(items[2], Term::from(true));
    assert_eq!(items[3], Term::NONE);
    assert!(items[4].is_var());
}

#[test]
fn empty_containers() {
    assert_eq!(tuple![].arity(), 0);
    assert_eq!(list![].arity(), 0);
    assert_eq!(set![].to_string(), "set()");
    assert_eq!(map! {}.to_string(), "{}");
}

#[test]
fn as_int_only_for_integers() {
    assert_eq!(Term::int(4).as_int(), Some(4));
    assert_eq!(Term::str("4").as_int(), None);
}

// ========== EQUALITY & ORDER ==========

#[test]
fn sequence_kinds_are_distinct() {
    assert_ne!(list![1], tuple![1]);
    assert_ne!(Term::iter([Term::int(1)]), list![1]);
}

#[test]
fn set_equality_ignores_insertion_order() {
    assert_eq!(set![3, 1, 2], set![1, 2, 3]);
    assert_eq!(set![1, 1, 2].arity(), 2);
}

#[test]
fn map_lookup_by_key() {
    let m = map! { "a" => 1, "b" => list![2] };
    assert_eq!(m.attr("a"), Some(&Term::int(1)));
    assert_eq!(m.get(&Term::str("b")), Some(&list![2]));
    assert_eq!(m.attr("c"), None);
}

#[test]
fn ordering_is_lexicographic() {
    assert!(tuple![1, 2] < tuple![1, 3]);
    assert!(tuple![1] < tuple![1, 0]);
    assert!(Term::int(5) < Term::from(var("term_order")), "atoms sort before vars");
}

#[test]
fn equal_terms_hash_equally() {
    let a = tuple![1, list![2, 3], map! { 4 => 5 }];
    let b = tuple![1, list![2, 3], map! { 4 => 5 }];
    assert!(!a.same(&b));
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

// ========== CHILDREN & REBUILD ==========

#[test]
fn map_children_alternate_keys_and_values() {
    let m = map! { 1 => "one", 2 => "two" };
    let kids: Vec<&Term> = m.children().collect();
    assert_eq!(
        kids,
        vec![&Term::int(1), &Term::str("one"), &Term::int(2), &Term::str("two")]
    );
}

#[test]
fn rebuild_preserves_shape() {
    let s = Term::slice(1, 2, 3);
    let rebuilt = s.rebuild(vec![Term::int(7), Term::int(8), Term::int(9)]);
    assert_eq!(rebuilt, Term::slice(7, 8, 9));

    let m = map! { 1 => 2 };
    assert_eq!(m.rebuild(vec![Term::int(1), Term::int(3)]), map! { 1 => 3 });

    let l = list![1, 2];
    assert_eq!(l.rebuild(vec![Term::int(2), Term::int(1)]), list![2, 1]);
}

#[test]
fn clone_shares_structure() {
    let a = list![1, 2];
    let b = a.clone();
    assert!(a.same(&b));
}

// ========== DISPLAY ==========

#[test]
fn display_forms() {
    let x = var("term_disp");
    assert_eq!(tuple![1].to_string(), "(1,)");
    assert_eq!(tuple![1, "a"].to_string(), "(1, \"a\")");
    assert_eq!(list![&x, ()].to_string(), "[~term_disp, None]");
    assert_eq!(Term::slice(1, (), 2).to_string(), "slice(1, None, 2)");
    assert_eq!(map! { 1 => true }.to_string(), "{1: true}");
    assert_eq!(Term::iter([Term::int(1)]).to_string(), "iter([1])");
}

// ========== DEEP TERMS ==========

#[test]
fn deep_terms_compare_hash_and_drop() {
    let a = long_chain(Term::str("end"), 100_000, false);
    let b = long_chain(Term::str("end"), 100_000, false);
    assert!(a == b);
    assert_eq!(hash_of(&a), hash_of(&b));

    let c = long_chain(Term::str("other"), 100_000, false);
    assert!(a != c);
    assert!(a < c);
    drop(a);
    drop(b);
    drop(c);
}
