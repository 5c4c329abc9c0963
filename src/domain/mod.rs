//! Pure business logic: pricing rules, cart snapshots, the order aggregate
//! and its status state machine. Nothing in this tree performs I/O.

pub mod cart;
pub mod order;
pub mod pricing;
pub mod status;
