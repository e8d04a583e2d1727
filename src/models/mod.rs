//! Data models for Shelfkeeper

pub mod activity;
pub mod book;
pub mod pagination;
pub mod stats;
pub mod user;

// Re-export commonly used types
pub use activity::{Activity, ActivityType, NewActivity};
pub use book::{Book, BookStatus, BorrowedBook};
pub use pagination::{PageQuery, PageRequest, Pagination};
pub use user::{User, UserRef};
