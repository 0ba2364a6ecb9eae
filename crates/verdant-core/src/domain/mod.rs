//! Control-loop domain logic
//!
//! Action selection, action-value learning, actuator mapping, and the
//! stateless recommendation query.

pub mod action;
pub mod actuator;
pub mod qtable;
pub mod recommend;
