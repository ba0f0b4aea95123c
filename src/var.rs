use crate::term::{Atom, Term};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use hashbrown::HashSet;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, OnceLock, Weak};

struct VarCell {
    token: Atom,
}

/// A logic variable.
///
/// Variables are interned by token: while any handle is alive, constructing a
/// variable with the same token returns the same instance. Equality, ordering
/// and hashing go through the token.
#[derive(Clone)]
pub struct Var(Arc<VarCell>);

/// Below this size the intern table is never swept.
const MIN_SWEEP: usize = 1024;

static INTERNED: OnceLock<DashMap<Atom, Weak<VarCell>>> = OnceLock::new();
static NEXT_ID: AtomicU64 = AtomicU64::new(1);
static SWEEP_AT: AtomicUsize = AtomicUsize::new(MIN_SWEEP);

fn interned() -> &'static DashMap<Atom, Weak<VarCell>> {
    INTERNED.get_or_init(DashMap::new)
}

/// Evict dead entries once the table has doubled since the last sweep.
fn maybe_sweep(table: &DashMap<Atom, Weak<VarCell>>) {
    if table.len() < SWEEP_AT.load(AtomicOrdering::Relaxed) {
        return;
    }
    table.retain(|_, cell| cell.strong_count() > 0);
    SWEEP_AT.store((2 * table.len()).max(MIN_SWEEP), AtomicOrdering::Relaxed);
}

impl Var {
    /// The canonical variable for `token`.
    pub fn new(token: impl Into<Atom>) -> Var {
        let token = token.into();
        let table = interned();
        let var = match table.entry(token) {
            Entry::Occupied(mut slot) => match slot.get().upgrade() {
                Some(cell) => Var(cell),
                None => {
                    let cell = Arc::new(VarCell { token });
                    slot.insert(Arc::downgrade(&cell));
                    Var(cell)
                }
            },
            Entry::Vacant(slot) => {
                let cell = Arc::new(VarCell { token });
                slot.insert(Arc::downgrade(&cell));
                Var(cell)
            }
        };
        maybe_sweep(table);
        var
    }

    /// A fresh variable with token `_{n}`.
    pub fn fresh() -> Var {
        Var::fresh_with_prefix("")
    }

    /// A fresh variable with token `{prefix}_{n}`, `n` from a process-wide counter.
    pub fn fresh_with_prefix(prefix: &str) -> Var {
        let id = NEXT_ID.fetch_add(1, AtomicOrdering::Relaxed);
        Var::new(Atom::str(&format!("{}_{}", prefix, id)))
    }

    pub fn token(&self) -> Atom {
        self.0.token
    }

    /// Whether both handles are the same interned instance.
    pub fn ptr_eq(&self, other: &Var) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.token == other.0.token
    }
}

impl Eq for Var {}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.token.hash(state);
    }
}

impl PartialOrd for Var {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Var {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.token.cmp(&other.0.token)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("~")?;
        self.0.token.fmt_bare(f)
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// The canonical variable for `token`.
pub fn var(token: impl Into<Atom>) -> Var {
    Var::new(token)
}

/// A fresh, globally unique variable.
pub fn fresh_var() -> Var {
    Var::fresh()
}

/// `n` fresh variables.
pub fn vars(n: usize) -> Vec<Var> {
    (0..n).map(|_| Var::fresh()).collect()
}

/// Is `term` a logic variable?
pub fn isvar(term: &Term) -> bool {
    term.is_var()
}

/// A set of atoms treated as logic variables, in addition to [`Var`]s.
///
/// Scopes are immutable snapshots: [`VarScope::extend`] returns a new scope,
/// so leaving a nested scope is just dropping it. The engine entry points on
/// this type (`unify`, `reify`, `isground`, `unground_lvars`) consult the
/// scope wherever the plain functions consult [`isvar`].
#[derive(Clone, Debug, Default)]
pub struct VarScope {
    atoms: Option<Arc<HashSet<Atom>>>,
}

impl VarScope {
    /// The empty scope: only [`Var`]s are variables.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<A: Into<Atom>>(atoms: impl IntoIterator<Item = A>) -> Self {
        Self::new().extend(atoms)
    }

    /// A new scope containing this scope's atoms plus `atoms`.
    pub fn extend<A: Into<Atom>>(&self, atoms: impl IntoIterator<Item = A>) -> Self {
        let mut set = self.atoms.as_deref().cloned().unwrap_or_default();
        set.extend(atoms.into_iter().map(Into::into));
        VarScope {
            atoms: if set.is_empty() {
                None
            } else {
                Some(Arc::new(set))
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_none()
    }

    pub fn contains(&self, atom: &Atom) -> bool {
        self.atoms.as_ref().is_some_and(|set| set.contains(atom))
    }

    /// Is `term` a variable under this scope?
    pub fn is_var(&self, term: &Term) -> bool {
        match term {
            Term::Var(_) => true,
            Term::Atom(a) => self.contains(a),
            _ => false,
        }
    }
}
