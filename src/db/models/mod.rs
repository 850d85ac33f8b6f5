//! Database models split into domain-specific modules.

pub mod appointment;
pub mod common;
pub mod patient;
pub mod payment;
pub mod user;

pub use appointment::*;
pub use common::*;
pub use patient::*;
pub use payment::*;
pub use user::*;
