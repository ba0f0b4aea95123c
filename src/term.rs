use crate::object::{Object, Record};
use crate::symbol::Symbol;
use crate::var::Var;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::{btree_map, btree_set, BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// An opaque leaf value compared by value equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Atom {
    None,
    Bool(bool),
    Int(i64),
    Str(Symbol),
}

impl Atom {
    pub fn str(name: &str) -> Self {
        Atom::Str(Symbol::intern(name))
    }

    /// Render without quoting strings (used for variable tokens).
    pub(crate) fn fmt_bare(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Str(s) => f.write_str(s.as_str()),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::None => f.write_str("None"),
            Atom::Bool(b) => write!(f, "{}", b),
            Atom::Int(i) => write!(f, "{}", i),
            Atom::Str(s) => write!(f, "{:?}", s.as_str()),
        }
    }
}

impl From<i64> for Atom {
    fn from(i: i64) -> Self {
        Atom::Int(i)
    }
}

impl From<i32> for Atom {
    fn from(i: i32) -> Self {
        Atom::Int(i64::from(i))
    }
}

impl From<bool> for Atom {
    fn from(b: bool) -> Self {
        Atom::Bool(b)
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Atom::str(s)
    }
}

impl From<()> for Atom {
    fn from(_: ()) -> Self {
        Atom::None
    }
}

/// The positional (start, stop, step) triple.
#[derive(Clone)]
pub struct Slice {
    pub start: Term,
    pub stop: Term,
    pub step: Term,
}

/// A term. Compound children are shared, so cloning is cheap.
///
/// Equality, ordering, hashing and dropping walk the term with explicit
/// stacks; only `Display`/`Debug` recurse on the host stack.
#[derive(Clone)]
pub enum Term {
    Atom(Atom),
    Var(Var),
    /// Fixed-arity tuple.
    Tuple(Arc<[Term]>),
    List(Arc<[Term]>),
    /// A materialized lazy sequence; never equal to a list or tuple.
    Iter(Arc<[Term]>),
    Set(Arc<BTreeSet<Term>>),
    Map(Arc<BTreeMap<Term, Term>>),
    Slice(Arc<Slice>),
    Object(Object),
}

impl Term {
    pub const NONE: Term = Term::Atom(Atom::None);

    pub fn int(i: i64) -> Self {
        Term::Atom(Atom::Int(i))
    }

    pub fn str(s: &str) -> Self {
        Term::Atom(Atom::str(s))
    }

    pub fn tuple<I: IntoIterator<Item = Term>>(items: I) -> Self {
        Term::Tuple(items.into_iter().collect::<Vec<_>>().into())
    }

    pub fn list<I: IntoIterator<Item = Term>>(items: I) -> Self {
        Term::List(items.into_iter().collect::<Vec<_>>().into())
    }

    pub fn iter<I: IntoIterator<Item = Term>>(items: I) -> Self {
        Term::Iter(items.into_iter().collect::<Vec<_>>().into())
    }

    pub fn set<I: IntoIterator<Item = Term>>(items: I) -> Self {
        Term::Set(Arc::new(items.into_iter().collect()))
    }

    pub fn map<I: IntoIterator<Item = (Term, Term)>>(entries: I) -> Self {
        Term::Map(Arc::new(entries.into_iter().collect()))
    }

    pub fn slice(start: impl Into<Term>, stop: impl Into<Term>, step: impl Into<Term>) -> Self {
        Term::Slice(Arc::new(Slice {
            start: start.into(),
            stop: stop.into(),
            step: step.into(),
        }))
    }

    pub fn object<R: Record>(record: R) -> Self {
        Term::Object(Object::new(record))
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_))
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Term::Var(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<Atom> {
        match self {
            Term::Atom(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Term::Atom(Atom::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Term::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Items of a tuple, list or iter.
    pub fn items(&self) -> Option<&[Term]> {
        match self {
            Term::Tuple(items) | Term::List(items) | Term::Iter(items) => Some(items),
            _ => None,
        }
    }

    /// Value at `key` in a map.
    pub fn get(&self, key: &Term) -> Option<&Term> {
        match self {
            Term::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Value at string key `name` in a map (the attribute-bag form of records).
    pub fn attr(&self, name: &str) -> Option<&Term> {
        self.get(&Term::str(name))
    }

    /// Whether the term has children the engine descends into.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Term::Tuple(_)
                | Term::List(_)
                | Term::Iter(_)
                | Term::Set(_)
                | Term::Map(_)
                | Term::Slice(_)
        )
    }

    /// Number of children yielded by [`Term::children`].
    pub fn arity(&self) -> usize {
        match self {
            Term::Tuple(items) | Term::List(items) | Term::Iter(items) => items.len(),
            Term::Set(set) => set.len(),
            Term::Map(map) => 2 * map.len(),
            Term::Slice(_) => 3,
            Term::Atom(_) | Term::Var(_) | Term::Object(_) => 0,
        }
    }

    /// Children in canonical order. Maps yield key, value, key, value, ...
    pub fn children(&self) -> Children<'_> {
        Children(match self {
            Term::Tuple(items) | Term::List(items) | Term::Iter(items) => {
                ChildIter::Seq(items.iter())
            }
            Term::Set(set) => ChildIter::Set(set.iter()),
            Term::Map(map) => ChildIter::Map {
                entries: map.iter(),
                value: None,
            },
            Term::Slice(slice) => ChildIter::Slice { slice, next: 0 },
            Term::Atom(_) | Term::Var(_) | Term::Object(_) => ChildIter::Leaf,
        })
    }

    /// Build a term of the same shape from replacement children, given in
    /// [`Term::children`] order. Leaves are returned unchanged.
    pub fn rebuild(&self, children: Vec<Term>) -> Term {
        match self {
            Term::Tuple(_) => Term::Tuple(children.into()),
            Term::List(_) => Term::List(children.into()),
            Term::Iter(_) => Term::Iter(children.into()),
            Term::Set(_) => Term::Set(Arc::new(children.into_iter().collect())),
            Term::Map(_) => {
                let mut entries = BTreeMap::new();
                let mut it = children.into_iter();
                while let (Some(k), Some(v)) = (it.next(), it.next()) {
                    entries.insert(k, v);
                }
                Term::Map(Arc::new(entries))
            }
            Term::Slice(_) => {
                let mut it = children.into_iter();
                Term::Slice(Arc::new(Slice {
                    start: it.next().unwrap_or(Term::NONE),
                    stop: it.next().unwrap_or(Term::NONE),
                    step: it.next().unwrap_or(Term::NONE),
                }))
            }
            Term::Atom(_) | Term::Var(_) | Term::Object(_) => self.clone(),
        }
    }

    /// Identity check: the same shared instance (or the same leaf value).
    pub fn same(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Atom(a), Term::Atom(b)) => a == b,
            (Term::Var(a), Term::Var(b)) => a == b,
            (Term::Tuple(a), Term::Tuple(b))
            | (Term::List(a), Term::List(b))
            | (Term::Iter(a), Term::Iter(b)) => Arc::ptr_eq(a, b),
            (Term::Set(a), Term::Set(b)) => Arc::ptr_eq(a, b),
            (Term::Map(a), Term::Map(b)) => Arc::ptr_eq(a, b),
            (Term::Slice(a), Term::Slice(b)) => Arc::ptr_eq(a, b),
            (Term::Object(a), Term::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Term::Atom(_) => 0,
            Term::Var(_) => 1,
            Term::Tuple(_) => 2,
            Term::List(_) => 3,
            Term::Iter(_) => 4,
            Term::Set(_) => 5,
            Term::Map(_) => 6,
            Term::Slice(_) => 7,
            Term::Object(_) => 8,
        }
    }

    /// Move uniquely owned compound children into `out`, leaving atoms behind.
    fn detach_children(&mut self, out: &mut Vec<Term>) {
        match self {
            Term::Tuple(items) | Term::List(items) | Term::Iter(items) => {
                if let Some(items) = Arc::get_mut(items) {
                    for item in items.iter_mut().filter(|t| t.is_compound()) {
                        out.push(std::mem::replace(item, Term::NONE));
                    }
                }
            }
            Term::Set(set) => {
                if let Some(set) = Arc::get_mut(set) {
                    out.extend(std::mem::take(set).into_iter().filter(Term::is_compound));
                }
            }
            Term::Map(map) => {
                if let Some(map) = Arc::get_mut(map) {
                    for (k, v) in std::mem::take(map) {
                        if k.is_compound() {
                            out.push(k);
                        }
                        if v.is_compound() {
                            out.push(v);
                        }
                    }
                }
            }
            Term::Slice(slice) => {
                if let Some(slice) = Arc::get_mut(slice) {
                    for field in [&mut slice.start, &mut slice.stop, &mut slice.step] {
                        if field.is_compound() {
                            out.push(std::mem::replace(field, Term::NONE));
                        }
                    }
                }
            }
            Term::Atom(_) | Term::Var(_) | Term::Object(_) => {}
        }
    }
}

impl Drop for Term {
    fn drop(&mut self) {
        let mut orphans = Vec::new();
        self.detach_children(&mut orphans);
        while let Some(mut orphan) = orphans.pop() {
            orphan.detach_children(&mut orphans);
        }
    }
}

/// Iterator over the children of a term, see [`Term::children`].
pub struct Children<'a>(ChildIter<'a>);

enum ChildIter<'a> {
    Leaf,
    Seq(std::slice::Iter<'a, Term>),
    Set(btree_set::Iter<'a, Term>),
    Map {
        entries: btree_map::Iter<'a, Term, Term>,
        value: Option<&'a Term>,
    },
    Slice {
        slice: &'a Slice,
        next: u8,
    },
}

impl<'a> Iterator for Children<'a> {
    type Item = &'a Term;

    fn next(&mut self) -> Option<&'a Term> {
        match &mut self.0 {
            ChildIter::Leaf => None,
            ChildIter::Seq(it) => it.next(),
            ChildIter::Set(it) => it.next(),
            ChildIter::Map { entries, value } => {
                if let Some(v) = value.take() {
                    return Some(v);
                }
                let (k, v) = entries.next()?;
                *value = Some(v);
                Some(k)
            }
            ChildIter::Slice { slice, next } => {
                let slice: &'a Slice = *slice;
                let field = match *next {
                    0 => &slice.start,
                    1 => &slice.stop,
                    2 => &slice.step,
                    _ => return None,
                };
                *next += 1;
                Some(field)
            }
        }
    }
}

/// Compare everything about two nodes except their children.
fn head_cmp(a: &Term, b: &Term) -> Ordering {
    match (a, b) {
        (Term::Atom(x), Term::Atom(y)) => x.cmp(y),
        (Term::Var(x), Term::Var(y)) => x.cmp(y),
        (Term::Object(x), Term::Object(y)) => x.cmp(y),
        _ => a.rank().cmp(&b.rank()),
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> Ordering {
        let head = head_cmp(self, other);
        if head != Ordering::Equal || self.same(other) {
            return head;
        }

        // Lexicographic over children, one iterator pair per open level.
        let mut stack: Vec<(Children<'_>, Children<'_>)> = vec![(self.children(), other.children())];
        while let Some((left, right)) = stack.last_mut() {
            match (left.next(), right.next()) {
                (Some(a), Some(b)) => {
                    let head = head_cmp(a, b);
                    if head != Ordering::Equal {
                        return head;
                    }
                    if a.is_compound() && !a.same(b) {
                        stack.push((a.children(), b.children()));
                    }
                }
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (None, None) => {
                    stack.pop();
                }
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut stack: SmallVec<[&Term; 16]> = SmallVec::new();
        stack.push(self);
        while let Some(term) = stack.pop() {
            state.write_u8(term.rank());
            match term {
                Term::Atom(a) => a.hash(state),
                Term::Var(v) => v.hash(state),
                Term::Object(o) => o.hash(state),
                _ => {
                    state.write_usize(term.arity());
                    stack.extend(term.children());
                }
            }
        }
    }
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl IntoIterator<Item = &'a Term>,
) -> fmt::Result {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Atom(a) => write!(f, "{}", a),
            Term::Var(v) => write!(f, "{}", v),
            Term::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items.iter())?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Term::List(items) => {
                f.write_str("[")?;
                write_joined(f, items.iter())?;
                f.write_str("]")
            }
            Term::Iter(items) => {
                f.write_str("iter([")?;
                write_joined(f, items.iter())?;
                f.write_str("])")
            }
            Term::Set(set) if set.is_empty() => f.write_str("set()"),
            Term::Set(set) => {
                f.write_str("{")?;
                write_joined(f, set.iter())?;
                f.write_str("}")
            }
            Term::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Term::Slice(s) => write!(f, "slice({}, {}, {})", s.start, s.stop, s.step),
            Term::Object(o) => write!(f, "{:?}", o),
        }
    }
}

impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slice({}, {}, {})", self.start, self.stop, self.step)
    }
}

impl From<Atom> for Term {
    fn from(a: Atom) -> Self {
        Term::Atom(a)
    }
}

impl From<Var> for Term {
    fn from(v: Var) -> Self {
        Term::Var(v)
    }
}

impl From<&Var> for Term {
    fn from(v: &Var) -> Self {
        Term::Var(v.clone())
    }
}

impl From<&Term> for Term {
    fn from(t: &Term) -> Self {
        t.clone()
    }
}

impl From<i64> for Term {
    fn from(i: i64) -> Self {
        Term::int(i)
    }
}

impl From<i32> for Term {
    fn from(i: i32) -> Self {
        Term::int(i64::from(i))
    }
}

impl From<bool> for Term {
    fn from(b: bool) -> Self {
        Term::Atom(Atom::Bool(b))
    }
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::str(s)
    }
}

impl From<()> for Term {
    fn from(_: ()) -> Self {
        Term::NONE
    }
}

impl From<Object> for Term {
    fn from(o: Object) -> Self {
        Term::Object(o)
    }
}

/// Build a tuple term; elements go through `Term::from`.
#[macro_export]
macro_rules! tuple {
    ($($x:expr),* $(,)?) => {
        $crate::term::Term::tuple([$($crate::term::Term::from($x)),*])
    };
}

/// Build a list term; elements go through `Term::from`.
#[macro_export]
macro_rules! list {
    ($($x:expr),* $(,)?) => {
        $crate::term::Term::list([$($crate::term::Term::from($x)),*])
    };
}

/// Build a set term; elements go through `Term::from`.
#[macro_export]
macro_rules! set {
    ($($x:expr),* $(,)?) => {
        $crate::term::Term::set([$($crate::term::Term::from($x)),*])
    };
}

/// Build a map term from `key => value` pairs.
#[macro_export]
macro_rules! map {
    ($($k:expr => $v:expr),* $(,)?) => {
        $crate::term::Term::map([$(($crate::term::Term::from($k), $crate::term::Term::from($v))),*])
    };
}

#[cfg(test)]
mod tests;
