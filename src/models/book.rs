use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Input structure for creating or updating a book listing.
/// Contains validation rules for its fields.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct BookInput {
    /// The title of the book.
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// The author of the book.
    /// Must be between 1 and 100 characters.
    #[validate(length(min = 1, max = 100))]
    pub author: String,

    /// Year of publication.
    #[validate(range(min = 0, max = 3000))]
    pub published_year: i32,

    /// Optional genre label.
    #[validate(length(max = 100))]
    pub genre: Option<String>,

    /// An optional description of the book or its condition.
    /// Maximum length of 1000 characters if provided.
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Represents a book listing as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Book {
    /// Unique identifier for the book (UUID v4).
    pub id: Uuid,
    /// The title of the book.
    pub title: String,
    /// The author of the book.
    pub author: String,
    /// Year of publication.
    pub published_year: i32,
    /// Optional genre label.
    pub genre: Option<String>,
    /// An optional description of the book or its condition.
    pub description: Option<String>,
    /// Identifier of the user who listed the book.
    pub user_id: i32,
    /// Timestamp of when the listing was created.
    pub created_at: DateTime<Utc>,
}

/// A book listing joined with its owner's public contact details.
/// Returned by the public browse endpoints so readers can reach out.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct BookWithOwner {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub published_year: i32,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    /// Username of the listing owner.
    pub owner_username: String,
    /// Email of the listing owner.
    pub owner_email: String,
}

impl Book {
    /// Creates a new `Book` instance from `BookInput` and the owner's `user_id`.
    /// Sets `created_at` to the current time and `id` to a new UUID.
    pub fn new(input: BookInput, user_id: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            author: input.author,
            published_year: input.published_year,
            genre: input.genre,
            description: input.description,
            user_id,
            created_at: Utc::now(),
        }
    }
}
