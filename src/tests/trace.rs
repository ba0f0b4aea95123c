use super::*;
use crate::term::Term;
use crate::unify::unify_empty;

#[test]
fn macros_accept_structured_fields() {
    let _bindings = 3usize;
    trace!(_bindings, "trace message");
    debug!(registry = "unify", "debug message");
    info!("info message");
    warn!(depth = 10, "warn message");

    let _span = debug_span!("unify", _bindings).entered();
    let _inner = trace_span!("step").entered();
    let _level = Level::DEBUG;
}

#[test]
fn init_subscriber_is_idempotent() {
    init_subscriber();
    init_subscriber();
}

#[test]
fn engine_runs_with_subscriber_installed() {
    init_subscriber();
    let s = unify_empty(&crate::tuple![1, 2], &crate::tuple![1, 2]);
    assert!(s.is_some_and(|s| s.is_empty()));
    assert!(unify_empty(&Term::int(1), &Term::int(2)).is_none());
}
