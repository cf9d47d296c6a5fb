//! HTTP surface for the semantic claim dedupe engine — axum router,
//! handlers, environment config, and the `AppError` → HTTP mapping. The
//! dedupe logic itself lives in `dedupe-core`; this crate is framing only,
//! the same division `sem_os_server` keeps against `sem_os_core`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
