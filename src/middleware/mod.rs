pub mod auth;
pub mod response;

pub use auth::{resolve_authentication, AuthUser, Authenticator};
pub use response::{Outcome, Payload};
