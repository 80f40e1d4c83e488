//! Data models for Biblio

pub mod book;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookStatus, BorrowedBook};
pub use user::{User, UserShort};
