// Document routes are mounted under the configured prefix and resolve the
// tenant from the authenticated user; health sits outside the mount.
pub mod documents;
pub mod health;

pub use documents::routes as document_routes;
pub use health::health;
