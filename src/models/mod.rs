pub mod book;
pub mod user;

pub use book::{Book, BookInput, BookWithOwner};
pub use user::{User, UserRecord};
