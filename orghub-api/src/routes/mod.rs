/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `echo`: Request echo used by smoke tests
/// - `auth`: Registration, login and the current user
/// - `organizations`: Organizations, switching and member management

pub mod auth;
pub mod echo;
pub mod health;
pub mod organizations;
