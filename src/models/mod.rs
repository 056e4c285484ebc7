//! Data models for the catalog

pub mod book;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookResponse, LoanStatus, NewBook};
pub use user::{Credentials, User, UserInfo};
