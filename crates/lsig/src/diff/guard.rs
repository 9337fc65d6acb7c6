//! Panic isolation for engine calls.
//!
//! An engine panic must become a value the driver can compare and report,
//! not an unwind through the driver. The capturing hook is chained in front
//! of whatever hook is installed when the first guarded call runs, so a
//! fuzzing engine's own hook still sees every panic raised outside a guard.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use super::PanicInfo;

static INSTALL_HOOK: Once = Once::new();

thread_local! {
    static GUARDED: Cell<bool> = const { Cell::new(false) };
    static CAPTURED: RefCell<Option<PanicInfo>> = const { RefCell::new(None) };
}

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARDED.get() {
                let captured = PanicInfo {
                    message: payload_message(info.payload()),
                    location: info.location().map(ToString::to_string),
                };
                CAPTURED.set(Some(captured));
            } else {
                previous(info);
            }
        }));
    });
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Clears the guard flag even if the closure unwinds past `catch_unwind`.
struct Scope {
    was_guarded: bool,
}

impl Scope {
    fn enter() -> Self {
        Self {
            was_guarded: GUARDED.replace(true),
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        GUARDED.set(self.was_guarded);
    }
}

/// Run `f`, converting a panic into [`PanicInfo`].
///
/// Panics inside `f` are not printed; the caller decides how to report
/// them.
pub fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, PanicInfo> {
    install_hook();

    let result = {
        let _scope = Scope::enter();
        panic::catch_unwind(AssertUnwindSafe(f))
    };

    result.map_err(|payload| {
        CAPTURED.take().unwrap_or_else(|| PanicInfo {
            message: payload_message(payload.as_ref()),
            location: None,
        })
    })
}
