//! Unification and reification over structural terms.
//!
//! Terms are atoms, logic variables, tuples, lists, iters, sets, maps,
//! slices, and user-defined records. [`unify`] finds a substitution making two
//! terms equal; [`reify`] applies one. Both run on an explicit evaluation
//! stack ([`trampoline`]), so term depth is limited by memory, not by the
//! call stack. Handlers are looked up in runtime-extensible registries
//! ([`dispatch`]), so new term types plug in without touching the engine.
//!
//! On top of that, [`matching`] provides multiple dispatch on unification
//! patterns: handlers registered for signatures like `("inc", x)` are tried
//! most specific first.
//!
//! ```
//! use unification::{reify, tuple, unify_empty, var};
//!
//! let x = var("x");
//! let s = unify_empty(&tuple![1, &x], &tuple![1, 2]).unwrap();
//! assert_eq!(reify(&tuple![&x, &x], &s), tuple![2, 2]);
//! ```

pub mod contracting;
pub mod dispatch;
pub mod error;
pub mod freeze;
pub mod matching;
pub mod object;
pub mod reify;
pub mod subst;
pub mod symbol;
pub mod term;
pub mod toposort;
pub mod trace;
pub mod trampoline;
pub mod unify;
pub mod var;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::DispatchError;
pub use freeze::freeze;
pub use matching::{Dispatcher, Match, Namespace};
pub use object::{unifiable, Object, Record};
pub use reify::{isground, reify, unground_lvars};
pub use subst::{assoc, Subst};
pub use term::{Atom, Term};
pub use unify::{unify, unify_empty};
pub use var::{fresh_var, isvar, var, vars, Var, VarScope};
