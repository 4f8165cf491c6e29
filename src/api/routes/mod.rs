//! Route modules, one per resource. Each exposes `router()`.
//!
//! Path parameters are named `:id` throughout so nested paths such as
//! `/projects/:id/tools` can share a prefix with `/projects/:id`.

pub mod catalog;
pub mod environments;
pub mod projects;
pub mod scenarios;
pub mod simulations;
