use crate::term::Term;
use thiserror::Error;

/// Failures of multiple dispatch. Unification failure is not an error; it is
/// reported as `None`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no match found for `{name}`\nknown signatures: {}\ninput: {args}", join(.known))]
    NoMatch {
        name: String,
        args: Term,
        known: Vec<Term>,
    },

    #[error("signature ordering for `{name}` is cyclic among: {}", join(.members))]
    Cycle { name: String, members: Vec<Term> },

    #[error("no dispatcher named `{0}`")]
    Unknown(String),
}

fn join(terms: &[Term]) -> String {
    terms
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
