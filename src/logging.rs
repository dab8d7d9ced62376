/// Debug-only console logging
///
/// The `log!` macro is compiled out of release builds unless the `console_logging`
/// feature is enabled. Warnings and errors go through `leptos::logging::{warn, error}`
/// and are always kept.
///
/// Output goes through `leptos::logging::console_log`, which writes to the browser
/// console in the wasm build and to stdout under native tests.
///
/// # Examples
///
/// ```ignore
/// use transit_map::log;
///
/// log!("Rendered {} routes", count);
/// ```
#[macro_export]
macro_rules! log {
    ($($arg:expr),+ $(,)?) => {
        #[cfg(any(debug_assertions, feature = "console_logging"))]
        {
            leptos::logging::log!($($arg),+);
        }
    };
}
