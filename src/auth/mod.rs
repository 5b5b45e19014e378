mod claims;
mod dto;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod session;

pub use handlers::{AuthMutation, AuthQuery};
pub use session::{resolve_viewer, Viewer};
