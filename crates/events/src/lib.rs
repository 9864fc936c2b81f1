//! Background delivery for dailyspend.
//!
//! - [`delivery`]: [`Notifier`](dailyspend_core::notifier::Notifier)
//!   implementations (SMTP email, log-only).
//! - [`queue`]: [`LimitCheckQueue`] fed by the API after each new expense and
//!   the [`LimitCheckWorker`] that drains it.

pub mod delivery;
pub mod queue;

pub use delivery::email::{EmailConfig, EmailError, EmailNotifier};
pub use delivery::log::LogNotifier;
pub use queue::{LimitCheck, LimitCheckQueue, LimitCheckWorker, LimitChecker};
