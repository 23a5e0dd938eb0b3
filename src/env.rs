use std::{cell::RefCell, ffi::OsStr};

#[derive(Clone, Copy)]
struct Env {
    trace_enabled: bool,
    minimal: bool,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

/// Read configuration from the process environment. Call once at startup.
pub fn init() {
    let value = Env {
        trace_enabled: var_is("LS8_TRACE", "1"),
        minimal: var_is("LS8_MINIMAL", "1"),
    };
    set_env(value);
}

/// `LS8_TRACE=1` traces every run, as if `--trace` was passed.
pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace_enabled)
}

/// `LS8_MINIMAL=1` behaves like `--minimal`, for scripted runs.
pub fn is_minimal() -> bool {
    with_env(|env| env.minimal)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}
