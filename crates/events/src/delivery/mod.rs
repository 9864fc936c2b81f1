//! Delivery channels for limit notifications.

pub mod email;
pub mod log;
