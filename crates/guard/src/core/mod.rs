//! Core guard functionality

pub mod builder;
pub mod guard;

pub use builder::CruftGuardBuilder;
pub use guard::CruftGuard;
