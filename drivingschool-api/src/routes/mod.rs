/// API route handlers, by resource
///
/// - `health`: liveness and store connectivity
/// - `auth`: student registration and login
/// - `students`: student CRUD, scheduling and certificates
/// - `tutors`: tutor CRUD, availability and lesson validation
/// - `lessons`: lesson CRUD and free slots

pub mod auth;
pub mod health;
pub mod lessons;
pub mod students;
pub mod tutors;
