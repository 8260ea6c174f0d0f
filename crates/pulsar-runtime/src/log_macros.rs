/// Domain-aware logging macros.
///
/// Each macro injects a `domain` field automatically so callers never need
/// to remember the string literal. Domains: `sys` (lifecycle), `conf`
/// (configuration and compiled-plan loading), `cycle` (the evaluation
/// loop), `store` (sensor-store I/O).
///
/// # Usage
///
/// ```ignore
/// use crate::log_macros::*;
///
/// ps_info!(sys, rules = plan.rules.len(), "runtime bootstrap complete");
/// ps_warn!(cycle, rule = name, error = %e, "rule evaluation error");
/// ps_debug!(store, keys = n, "snapshot read");
/// ```
///
/// The macros accept any tracing-compatible field syntax after the domain
/// identifier. The domain identifier is **not** a string; it is a bare
/// identifier that the macro converts to a `&str` literal.

// ---------------------------------------------------------------------------
// Core macro — dispatches to the matching tracing level macro.
// ---------------------------------------------------------------------------

/// Internal helper. Do not call directly; use `ps_error!` … `ps_trace!`.
#[doc(hidden)]
macro_rules! ps_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

// ---------------------------------------------------------------------------
// Public per-level macros
// ---------------------------------------------------------------------------

/// Log at ERROR level with an automatic `domain` field.
macro_rules! ps_error {
    ($domain:ident, $($rest:tt)*) => {
        ps_log!(error, $domain, $($rest)*)
    };
}

/// Log at WARN level with an automatic `domain` field.
macro_rules! ps_warn {
    ($domain:ident, $($rest:tt)*) => {
        ps_log!(warn, $domain, $($rest)*)
    };
}

/// Log at INFO level with an automatic `domain` field.
macro_rules! ps_info {
    ($domain:ident, $($rest:tt)*) => {
        ps_log!(info, $domain, $($rest)*)
    };
}

/// Log at DEBUG level with an automatic `domain` field.
macro_rules! ps_debug {
    ($domain:ident, $($rest:tt)*) => {
        ps_log!(debug, $domain, $($rest)*)
    };
}

/// Log at TRACE level with an automatic `domain` field.
#[allow(unused_macros)]
macro_rules! ps_trace {
    ($domain:ident, $($rest:tt)*) => {
        ps_log!(trace, $domain, $($rest)*)
    };
}
