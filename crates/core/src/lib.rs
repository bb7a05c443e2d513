//! Domain logic for Folio.
//!
//! No web or database dependencies live here.
//!
//! - `auth` - password hashing
//! - `storage` - image storage gateway over S3-compatible object stores

pub mod auth;
pub mod storage;
