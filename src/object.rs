//! User-defined record types as terms.
//!
//! A record exposes its attributes as a term, either a map from attribute
//! name to value or a tuple of positional slot values, and can rebuild a copy
//! of itself from attributes of the same form. That is all the engine needs
//! to unify records field by field and to reify variables inside them.

use crate::dispatch::{Category, Pattern};
use crate::reify::{register_reify, reify_thunk};
use crate::subst::Subst;
use crate::term::Term;
use crate::trampoline::{Emit, Step, Thunk};
use crate::unify::{register_unify, unify_thunk, Unified};
use crate::var::VarScope;
#[cfg(feature = "tracing")]
use crate::trace::debug;
use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Upcast helper so a `dyn Record` can reach its concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A user-defined term type.
pub trait Record: AsAny + fmt::Debug + Send + Sync + 'static {
    /// Attributes as a map (`{"name": value}`) or a tuple of slot values.
    fn attrs(&self) -> Term;

    /// A new instance of the same type from attributes shaped like
    /// [`Record::attrs`]. `None` if `attrs` has the wrong form.
    ///
    /// When reify gets `None` back it keeps the original record, variables
    /// and all, and emits a `record_rebuild_failed` debug event.
    fn rebuild(&self, attrs: &Term) -> Option<Object>;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A shared handle to a record.
///
/// Two objects are equal when they have the same concrete type and equal
/// attributes.
#[derive(Clone)]
pub struct Object(Arc<dyn Record>);

impl Object {
    pub fn new<R: Record>(record: R) -> Self {
        Object(Arc::new(record))
    }

    pub fn type_id(&self) -> TypeId {
        AsAny::as_any(&*self.0).type_id()
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    pub fn attrs(&self) -> Term {
        self.0.attrs()
    }

    pub fn rebuild(&self, attrs: &Term) -> Option<Object> {
        self.0.rebuild(attrs)
    }

    pub fn record(&self) -> &dyn Record {
        &*self.0
    }

    pub fn downcast_ref<R: Record>(&self) -> Option<&R> {
        AsAny::as_any(&*self.0).downcast_ref()
    }

    /// Whether both handles share one instance.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const u8,
            Arc::as_ptr(&other.0) as *const u8,
        )
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.type_id() == other.type_id() && self.attrs() == other.attrs())
    }
}

impl Eq for Object {}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id().hash(state);
        self.attrs().hash(state);
    }
}

impl PartialOrd for Object {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Object {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.ptr_eq(other) {
            return Ordering::Equal;
        }
        self.type_name()
            .cmp(other.type_name())
            .then_with(|| self.type_id().cmp(&other.type_id()))
            .then_with(|| self.attrs().cmp(&other.attrs()))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Unify two records of the same type attribute by attribute.
pub fn unify_object(u: &Term, v: &Term, s: Subst, scope: &VarScope) -> Thunk<Unified> {
    match (u.as_object(), v.as_object()) {
        (Some(a), Some(b)) if a.type_id() == b.type_id() => {
            unify_thunk(&a.attrs(), &b.attrs(), s, scope)
        }
        _ => Thunk::Ready(None),
    }
}

/// Reify the attributes of a record, rebuilding it only if they changed.
pub fn reify_object(term: &Term, s: &Subst, scope: &VarScope) -> Thunk<Term> {
    let Some(object) = term.as_object() else {
        return Thunk::Ready(term.clone());
    };
    Thunk::suspend(ReifyObject {
        original: term.clone(),
        object: object.clone(),
        attrs: object.attrs(),
        reified: None,
        phase: Phase::Attrs,
        subst: s.clone(),
        scope: scope.clone(),
    })
}

enum Phase {
    Attrs,
    Construct,
    Build,
}

struct ReifyObject {
    original: Term,
    object: Object,
    attrs: Term,
    reified: Option<Term>,
    phase: Phase,
    subst: Subst,
    scope: VarScope,
}

impl Step<Term> for ReifyObject {
    fn resume(&mut self, input: Option<Term>) -> Emit<Term> {
        match self.phase {
            Phase::Attrs => {
                self.phase = Phase::Construct;
                Emit::Call(reify_thunk(&self.attrs, &self.subst, &self.scope))
            }
            Phase::Construct => {
                self.reified = input;
                self.phase = Phase::Build;
                Emit::Construct
            }
            Phase::Build => {
                let Some(attrs) = self.reified.take().filter(|attrs| *attrs != self.attrs) else {
                    return Emit::Done(self.original.clone());
                };
                match self.object.rebuild(&attrs) {
                    Some(rebuilt) => Emit::Done(Term::Object(rebuilt)),
                    None => {
                        #[cfg(feature = "tracing")]
                        debug!(record = self.object.type_name(), attrs = %attrs, "record_rebuild_failed");
                        Emit::Done(self.original.clone())
                    }
                }
            }
        }
    }
}

/// Register the record unify and reify handlers for type `T`.
pub fn unifiable<T: Record>() {
    register_unify([Pattern::object::<T>(), Pattern::object::<T>()], unify_object);
    register_reify(Pattern::object::<T>(), reify_object);
}

/// Register the record handlers for every record type at once.
pub fn unifiable_records() {
    register_unify(
        [
            Pattern::Category(Category::Record),
            Pattern::Category(Category::Record),
        ],
        unify_object,
    );
    register_reify(Pattern::Category(Category::Record), reify_object);
}
