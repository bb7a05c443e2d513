//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod project;
pub mod user;

pub use project::{CreateProjectInput, ProjectError, ProjectRepository, UpdateProjectInput};
pub use user::{UserError, UserRepository};
