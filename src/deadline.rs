//! Per-call deadlines and cancellation for the read-write/read-only database handles
//! (§5: "All database calls are issued with a per-call deadline ... derived from a
//! root context so shutdown can interrupt in-flight queries").
//!
//! `rusqlite`'s query machinery is synchronous, so there is no `select().await` to
//! race against a timer. Instead we install a SQLite progress handler for the
//! duration of one call: SQLite polls it every `n` VM instructions and aborts the
//! running statement the moment it returns `true`. That gives the same effect as a
//! cooperative cancellation check in an async executor, just driven from C callback
//! frequency instead of a poll loop.
//!
//! Usage is an install/finish pair rather than a single closure-taking wrapper: the
//! work between them typically needs a `&mut Connection` (transactions, prepared
//! statements), and threading that through a closure while this module also holds a
//! `&Connection` for the teardown call would fight the borrow checker for no reason.
//!
//! ```ignore
//! let watch = deadline::install(&conn, &cancel, cfg.query_deadline);
//! let result = ingest::insert(&mut conn, ...);
//! deadline::finish(&conn, watch, "insert", cfg.query_deadline, result)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

use rusqlite::Connection;

use crate::cancel::CancelToken;
use crate::errors::{IbStoreError, Result};

/// How many SQLite VM instructions elapse between progress-handler invocations.
/// Small enough that a cancellation or deadline is noticed promptly; large enough
/// that the handler's own overhead stays negligible against real query cost.
const PROGRESS_STEP: std::os::raw::c_int = 1_000;

const REASON_NONE: u8 = 0;
const REASON_CANCELLED: u8 = 1;
const REASON_TIMEOUT: u8 = 2;

/// Handle returned by [`install`]; pass to [`finish`] once the guarded work is done.
pub(crate) struct Watch {
    reason: Arc<AtomicU8>,
}

/// Install a progress handler on `conn` that aborts the in-flight statement once
/// `cancel` fires or `timeout` elapses from this call.
pub(crate) fn install(conn: &Connection, cancel: &CancelToken, timeout: Duration) -> Watch {
    let deadline = Instant::now() + timeout;
    let reason = Arc::new(AtomicU8::new(REASON_NONE));
    let reason_for_handler = Arc::clone(&reason);
    let cancel = cancel.clone();

    conn.progress_handler(
        PROGRESS_STEP,
        Some(move || {
            if cancel.is_cancelled() {
                reason_for_handler.store(REASON_CANCELLED, Ordering::SeqCst);
                return true;
            }
            if Instant::now() >= deadline {
                reason_for_handler.store(REASON_TIMEOUT, Ordering::SeqCst);
                return true;
            }
            false
        }),
    );

    Watch { reason }
}

/// Install the same watch on every connection in `conns` (used by `Scan`, which
/// reads on the read-only handle and writes on the read-write handle in one call).
pub(crate) fn install_multi(conns: &[&Connection], cancel: &CancelToken, timeout: Duration) -> Watch {
    let deadline = Instant::now() + timeout;
    let reason = Arc::new(AtomicU8::new(REASON_NONE));

    for conn in conns {
        let reason_for_handler = Arc::clone(&reason);
        let cancel = cancel.clone();
        conn.progress_handler(
            PROGRESS_STEP,
            Some(move || {
                if cancel.is_cancelled() {
                    reason_for_handler.store(REASON_CANCELLED, Ordering::SeqCst);
                    return true;
                }
                if Instant::now() >= deadline {
                    reason_for_handler.store(REASON_TIMEOUT, Ordering::SeqCst);
                    return true;
                }
                false
            }),
        );
    }

    Watch { reason }
}

/// Remove the progress handler from `conn` and translate `result` into a
/// [`IbStoreError::Cancelled`]/[`IbStoreError::Timeout`] if the watch tripped during
/// the call, leaving any unrelated error (or success) untouched.
pub(crate) fn finish<T>(conn: &Connection, watch: Watch, context: &'static str, timeout: Duration, result: Result<T>) -> Result<T> {
    conn.progress_handler(PROGRESS_STEP, None::<fn() -> bool>);
    translate(watch, context, timeout, result)
}

/// Like [`finish`] but tears down every connection the watch was installed on.
pub(crate) fn finish_multi<T>(
    conns: &[&Connection],
    watch: Watch,
    context: &'static str,
    timeout: Duration,
    result: Result<T>,
) -> Result<T> {
    for conn in conns {
        conn.progress_handler(PROGRESS_STEP, None::<fn() -> bool>);
    }
    translate(watch, context, timeout, result)
}

fn translate<T>(watch: Watch, context: &'static str, timeout: Duration, result: Result<T>) -> Result<T> {
    match watch.reason.load(Ordering::SeqCst) {
        REASON_CANCELLED if result.is_err() => Err(IbStoreError::Cancelled { context }),
        REASON_TIMEOUT if result.is_err() => Err(IbStoreError::Timeout {
            context,
            elapsed_ms: timeout.as_millis() as u64,
        }),
        _ => result,
    }
}
