//! Panic capture for per-cell isolation.
//!
//! Workers run every cell under `catch_unwind`, so a panic in a stage only
//! fails that cell. The hook installed by [`init`] records where the panic
//! happened (per thread) and logs it through `tracing` before chaining to
//! the previous hook; the worker then picks the description up with
//! [`take_last_panic`] when it turns the panic into a cell error.

use std::any::Any;
use std::cell::RefCell;
use std::panic::{self, PanicHookInfo};
use std::sync::OnceLock;

static INSTALLED: OnceLock<()> = OnceLock::new();

thread_local! {
    static LAST_PANIC: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Install the panic hook. Later calls are ignored.
pub fn init() {
    INSTALLED.get_or_init(|| {
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            let description = describe(info);
            tracing::error!("panic: {}", description);
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(description));
            original_hook(info);
        }));
    });
}

/// Description of the most recent panic on this thread, if the hook saw one.
pub fn take_last_panic() -> Option<String> {
    LAST_PANIC.with(|slot| slot.borrow_mut().take())
}

/// Best-effort text of a panic payload.
pub fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn describe(info: &PanicHookInfo<'_>) -> String {
    let message = payload_message(info.payload());
    match info.location() {
        Some(location) => format!(
            "{} at {}:{}:{}",
            message,
            location.file(),
            location.line(),
            location.column()
        ),
        None => message,
    }
}
