//! [`TimerScheduler`](crate::application::timer::TimerScheduler) implementations.
//!
//! - **`runtime`** – `TokioScheduler`, real time on a tokio runtime.  Used by
//!   the demo binary.
//! - **`manual`** – `ManualScheduler`, a virtual clock that only moves when a
//!   test calls `advance`.  Makes repeat timing exactly reproducible.

pub mod manual;
pub mod runtime;

pub use manual::ManualScheduler;
pub use runtime::TokioScheduler;
