//! Runtime-extensible handler tables keyed by argument shape.
//!
//! A handler is registered for a tuple of [`Pattern`]s, one per argument.
//! Lookup picks the most specific registered tuple for the concrete argument
//! [`Shape`]s: per position an exact shape beats a category, which beats
//! [`Pattern::Any`], and earlier positions weigh more than later ones.
//! Resolutions are cached until the next registration.

use crate::term::Term;
#[cfg(feature = "tracing")]
use crate::trace::debug;
use crate::var::VarScope;
use hashbrown::HashMap;
use parking_lot::RwLock;
use smallvec::{smallvec, SmallVec};
use std::any::TypeId;

/// The concrete kind of a term, as seen by dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Atom,
    Var,
    Tuple,
    List,
    Iter,
    Set,
    Map,
    Slice,
    /// A record of the given concrete type.
    Object(TypeId),
}

/// Families of shapes a handler can be registered for at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    /// Tuples, lists and iters.
    Sequence,
    /// Any record type.
    Record,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    Exact(Shape),
    Category(Category),
    Any,
}

impl Shape {
    /// The shape of `term`; atoms in `scope` count as variables.
    pub fn of(term: &Term, scope: &VarScope) -> Shape {
        match term {
            Term::Atom(_) if scope.is_var(term) => Shape::Var,
            Term::Atom(_) => Shape::Atom,
            Term::Var(_) => Shape::Var,
            Term::Tuple(_) => Shape::Tuple,
            Term::List(_) => Shape::List,
            Term::Iter(_) => Shape::Iter,
            Term::Set(_) => Shape::Set,
            Term::Map(_) => Shape::Map,
            Term::Slice(_) => Shape::Slice,
            Term::Object(o) => Shape::Object(o.type_id()),
        }
    }

    pub fn category(self) -> Option<Category> {
        match self {
            Shape::Tuple | Shape::List | Shape::Iter => Some(Category::Sequence),
            Shape::Object(_) => Some(Category::Record),
            _ => None,
        }
    }
}

impl Pattern {
    /// Exact pattern for records of type `T`.
    pub fn object<T: 'static>() -> Pattern {
        Pattern::Exact(Shape::Object(TypeId::of::<T>()))
    }

    pub fn matches(self, shape: Shape) -> bool {
        match self {
            Pattern::Exact(s) => s == shape,
            Pattern::Category(c) => shape.category() == Some(c),
            Pattern::Any => true,
        }
    }

    /// Patterns matching `shape`, most specific first.
    fn candidates(shape: Shape) -> SmallVec<[Pattern; 3]> {
        let mut out: SmallVec<[Pattern; 3]> = smallvec![Pattern::Exact(shape)];
        if let Some(c) = shape.category() {
            out.push(Pattern::Category(c));
        }
        out.push(Pattern::Any);
        out
    }
}

impl From<Shape> for Pattern {
    fn from(shape: Shape) -> Self {
        Pattern::Exact(shape)
    }
}

impl From<Category> for Pattern {
    fn from(category: Category) -> Self {
        Pattern::Category(category)
    }
}

type Key = SmallVec<[Pattern; 3]>;
type Shapes = SmallVec<[Shape; 3]>;

struct Table<H> {
    entries: HashMap<Key, H>,
    resolved: HashMap<Shapes, H>,
}

impl<H: Clone> Table<H> {
    /// Enumerate candidate keys lexicographically, leftmost position most
    /// significant, and return the first registered one.
    fn most_specific(&self, shapes: &[Shape]) -> Option<H> {
        let candidates: SmallVec<[SmallVec<[Pattern; 3]>; 3]> =
            shapes.iter().map(|&s| Pattern::candidates(s)).collect();
        let mut choice: SmallVec<[usize; 3]> = smallvec![0; shapes.len()];
        loop {
            let key: Key = choice
                .iter()
                .zip(&candidates)
                .map(|(&i, patterns)| patterns[i])
                .collect();
            if let Some(handler) = self.entries.get(&key) {
                return Some(handler.clone());
            }
            let mut pos = shapes.len();
            loop {
                if pos == 0 {
                    return None;
                }
                pos -= 1;
                choice[pos] += 1;
                if choice[pos] < candidates[pos].len() {
                    break;
                }
                choice[pos] = 0;
            }
        }
    }
}

/// A named handler table with a fallback for unmatched shapes.
pub struct Registry<H> {
    name: &'static str,
    fallback: H,
    table: RwLock<Table<H>>,
}

impl<H: Clone> Registry<H> {
    pub fn new(name: &'static str, fallback: H) -> Self {
        Registry {
            name,
            fallback,
            table: RwLock::new(Table {
                entries: HashMap::new(),
                resolved: HashMap::new(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Install `handler` for `patterns`, replacing any handler registered for
    /// exactly the same patterns.
    pub fn register(&self, patterns: impl IntoIterator<Item = Pattern>, handler: H) {
        let key: Key = patterns.into_iter().collect();
        #[cfg(feature = "tracing")]
        debug!(registry = self.name, patterns = ?key, "register");
        let mut table = self.table.write();
        table.entries.insert(key, handler);
        table.resolved.clear();
    }

    /// The handler for `shapes`: the most specific registration, or the fallback.
    pub fn lookup(&self, shapes: &[Shape]) -> H {
        if let Some(handler) = self.table.read().resolved.get(shapes) {
            return handler.clone();
        }
        let mut table = self.table.write();
        let handler = table
            .most_specific(shapes)
            .unwrap_or_else(|| self.fallback.clone());
        table.resolved.insert(shapes.into(), handler.clone());
        handler
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.table.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
