//! Domain layer
//!
//! Pure domain identifiers with zero infrastructure dependencies. Account and
//! role records live in `crate::auth::models`; this module only carries the
//! type-safe ID wrappers they reference.

pub mod id;

pub use id::{ResetTokenId, RoleId, UserId};
