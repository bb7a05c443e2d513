//! Entity re-exports.

pub use super::projects::Entity as Projects;
pub use super::users::Entity as Users;
