//! Database models split into domain-specific modules.
//!
//! Each module holds the row types, their query methods and the request /
//! response DTOs that travel over the API for that entity.

pub mod common;
pub mod ingredient;
pub mod membership;
pub mod recipe;
pub mod shopping_list;
pub mod tag;
pub mod user;

pub use common::*;
pub use ingredient::*;
pub use membership::*;
pub use recipe::*;
pub use shopping_list::*;
pub use tag::*;
pub use user::*;
