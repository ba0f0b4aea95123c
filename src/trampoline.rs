//! Explicit-stack evaluation of suspended computations.
//!
//! Unify and reify are naturally recursive: a compound term needs the results
//! of its children before it can finish. Instead of recursing on the host
//! stack, each handler returns a [`Thunk`]: either a finished value or a
//! [`Step`] that asks the evaluator to run sub-computations for it. The
//! evaluator keeps pending steps on a heap-allocated stack, so term depth is
//! bounded by memory rather than by the call stack.
//!
//! # Protocol
//!
//! A step is resumed with the result of its last [`Emit::Call`] (or `None` on
//! the first resume, after [`Emit::Construct`], and when the called step was
//! pruned by an observer). It answers with exactly one [`Emit`]:
//!
//! - `Call(thunk)`: evaluate `thunk`, then resume me with its result;
//! - `Construct`: every sub-result is in, the next resume assembles the value;
//! - `Done(value)`: my result; I am popped and my caller resumed with it.

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// A computation that is either already finished or suspended.
pub enum Thunk<T> {
    Ready(T),
    Suspended(Box<dyn Step<T>>),
}

impl<T> Thunk<T> {
    pub fn suspend<S: Step<T> + 'static>(step: S) -> Self {
        Thunk::Suspended(Box::new(step))
    }
}

/// What a step asks of the evaluator when resumed.
pub enum Emit<T> {
    Call(Thunk<T>),
    Construct,
    Done(T),
}

/// A resumable unit of work.
pub trait Step<T> {
    fn resume(&mut self, input: Option<T>) -> Emit<T>;
}

impl<T, F> Step<T> for F
where
    F: FnMut(Option<T>) -> Emit<T>,
{
    fn resume(&mut self, input: Option<T>) -> Emit<T> {
        self(input)
    }
}

/// An observer's verdict on an emitted value or construction marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Abandon the step that emitted it; its caller is resumed with `None`.
    Prune,
    /// Stop the whole evaluation.
    Halt,
}

/// Watches a computation as it runs.
///
/// `value` sees every value produced (immediate results handed to a step and
/// final step results); `construct` sees every construction marker.
pub trait Observer<T> {
    fn value(&mut self, _value: &T) -> Flow {
        Flow::Continue
    }

    fn construct(&mut self) -> Flow {
        Flow::Continue
    }
}

struct Unobserved;

impl<T> Observer<T> for Unobserved {}

/// Run a computation to completion.
pub fn evaluate<T>(thunk: Thunk<T>) -> T {
    drive(thunk, &mut Unobserved).expect("an unobserved computation always produces a value")
}

/// Run a computation under `observer`.
///
/// Returns `None` if the observer halted the evaluation or pruned the
/// outermost step.
pub fn observe<T, O: Observer<T>>(thunk: Thunk<T>, observer: &mut O) -> Option<T> {
    drive(thunk, observer)
}

fn drive<T, O: Observer<T>>(thunk: Thunk<T>, observer: &mut O) -> Option<T> {
    let mut stack: Vec<Box<dyn Step<T>>> = match thunk {
        Thunk::Ready(value) => {
            return match observer.value(&value) {
                Flow::Continue => Some(value),
                Flow::Prune | Flow::Halt => None,
            };
        }
        Thunk::Suspended(step) => vec![step],
    };
    let mut input: Option<T> = None;
    #[cfg(feature = "tracing")]
    let mut max_depth = 1usize;

    while let Some(top) = stack.last_mut() {
        match top.resume(input.take()) {
            Emit::Call(Thunk::Suspended(step)) => {
                stack.push(step);
                #[cfg(feature = "tracing")]
                {
                    max_depth = max_depth.max(stack.len());
                }
            }
            Emit::Call(Thunk::Ready(value)) => match observer.value(&value) {
                Flow::Continue => input = Some(value),
                Flow::Prune => {
                    stack.pop();
                }
                Flow::Halt => {
                    #[cfg(feature = "tracing")]
                    trace!(depth = stack.len(), "trampoline_halt");
                    return None;
                }
            },
            Emit::Construct => match observer.construct() {
                Flow::Continue => {}
                Flow::Prune => {
                    stack.pop();
                }
                Flow::Halt => return None,
            },
            Emit::Done(value) => {
                stack.pop();
                match observer.value(&value) {
                    Flow::Continue => input = Some(value),
                    Flow::Prune => {}
                    Flow::Halt => {
                        #[cfg(feature = "tracing")]
                        trace!(depth = stack.len(), "trampoline_halt");
                        return None;
                    }
                }
            }
        }
    }

    #[cfg(feature = "tracing")]
    trace!(max_depth, "trampoline_done");

    input
}
