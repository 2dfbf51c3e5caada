/// Middleware for the API server
///
/// - `auth`: bearer-token gate for student routes
/// - `security`: security response headers

pub mod auth;
pub mod security;
