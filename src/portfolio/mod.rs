mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use handlers::{PortfolioMutation, PortfolioQuery};
