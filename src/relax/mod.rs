//! Driving a pile to its stable configuration.
//!
//! [`stabilize`](stabilize()) is the synchronous fixed-point toppling loop;
//! [`warm_start`](warm_start()) trades one restricted linear solve for a
//! large cut in its round count.

pub mod stabilize;
pub mod warm_start;

pub use stabilize::{Stabilized, stabilize};
pub use warm_start::warm_start;
