//! Request handlers, one module per resource.

pub mod auth;
pub mod category;
pub mod expense;
pub mod export;
pub mod profile;
pub mod statistics;
