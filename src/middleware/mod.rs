//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns. pingd ships exactly one: [`trace`], which the
//! [`Router`](crate::Router) applies to every registered handler.

pub mod trace;
