//! Repository layer over SQLite.
//!
//! Each repository is a trait plus a `Sqlx*` implementation so services can
//! be exercised against fakes in unit tests.

pub mod account;
pub mod reset_token;
pub mod role;

pub use account::{AccountRepository, SqlxAccountRepository};
pub use reset_token::{ResetTokenRepository, SqlxResetTokenRepository};
pub use role::{RoleRepository, SqlxRoleRepository};
