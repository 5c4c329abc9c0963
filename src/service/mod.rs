//! Use-case orchestration. Each function here owns one transactional scope:
//! either everything it does commits, or none of it does.

pub mod checkout;
pub mod orders;
