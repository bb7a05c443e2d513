//! `SeaORM` entities.

pub mod prelude;

pub mod projects;
pub mod users;
