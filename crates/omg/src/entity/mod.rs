//! SeaORM entity definitions for the local mirror.

pub mod my_repo;
pub mod my_star;
pub mod prelude;
pub mod repo;
