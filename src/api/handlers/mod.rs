//! HTTP request handlers.

pub mod auth_handler;
pub mod health_handler;
pub mod medical_handler;
pub mod performance_handler;
pub mod search_handler;

pub use auth_handler::auth_routes;
pub use health_handler::{health_check, root};
pub use medical_handler::medical_routes;
pub use performance_handler::performance_routes;
pub use search_handler::search_routes;
