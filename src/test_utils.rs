use crate::term::Term;
use crate::var::{var, Var};

pub(crate) fn t(v: &Var) -> Term {
    Term::from(v)
}

/// `[1, [2, [..., [n - 1, last]]]]`, built bottom-up without recursion.
///
/// With `with_vars` each head is `var(i)` instead of the integer `i`.
pub(crate) fn long_chain(last: Term, n: usize, with_vars: bool) -> Term {
    let mut inner = last;
    for i in (1..n as i64).rev() {
        let head = if with_vars {
            Term::from(var(i))
        } else {
            Term::int(i)
        };
        inner = Term::list([head, inner]);
    }
    inner
}
