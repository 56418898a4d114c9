pub mod auth;
pub mod error;

pub use auth::{Auth, RequestOptions};
pub use error::AuthError;
