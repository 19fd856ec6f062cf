use crate::{
    auth::AuthenticatedUserId,
    error::AppError,
    models::{Book, BookInput, BookWithOwner},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const BOOK_WITH_OWNER_SELECT: &str =
    "SELECT b.id, b.title, b.author, b.published_year, b.genre, b.description, \
            b.user_id, b.created_at, \
            u.username AS owner_username, u.email AS owner_email \
     FROM books b \
     JOIN users u ON u.id = b.user_id";

async fn fetch_book_with_owner(
    pool: &PgPool,
    book_id: Uuid,
) -> Result<Option<BookWithOwner>, AppError> {
    let book = sqlx::query_as::<_, BookWithOwner>(&format!(
        "{} WHERE b.id = $1",
        BOOK_WITH_OWNER_SELECT
    ))
    .bind(book_id)
    .fetch_optional(pool)
    .await?;

    Ok(book)
}

/// Retrieves all book listings.
///
/// Public endpoint: anyone can browse the catalogue. Each listing carries
/// the owner's username and email so interested readers can get in touch.
/// Listings are ordered by creation date in descending order.
///
/// ## Responses:
/// - `200 OK`: Returns a JSON array of listings with owner details.
/// - `500 Internal Server Error`: For database errors.
#[get("")]
pub async fn get_books(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let books = sqlx::query_as::<_, BookWithOwner>(&format!(
        "{} ORDER BY b.created_at DESC",
        BOOK_WITH_OWNER_SELECT
    ))
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(books))
}

/// Retrieves all book listings offered by one user.
///
/// Public endpoint, same shape as the full catalogue.
///
/// ## Path Parameters:
/// - `user_id`: The ID of the listing owner.
///
/// ## Responses:
/// - `200 OK`: Returns a JSON array of the user's listings.
/// - `500 Internal Server Error`: For database errors.
#[get("/user/{user_id}")]
pub async fn get_books_by_user(
    pool: web::Data<PgPool>,
    user_id: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let books = sqlx::query_as::<_, BookWithOwner>(&format!(
        "{} WHERE b.user_id = $1 ORDER BY b.created_at DESC",
        BOOK_WITH_OWNER_SELECT
    ))
    .bind(user_id.into_inner())
    .fetch_all(&**pool)
    .await?;

    Ok(HttpResponse::Ok().json(books))
}

/// Creates a new book listing for the authenticated user.
///
/// The owner is always the token subject; any owner id in the payload is
/// ignored.
///
/// ## Request Body:
/// A JSON object matching `BookInput`: `title`, `author`, `published_year`,
/// plus optional `genre` and `description`.
///
/// ## Responses:
/// - `201 Created`: Returns the new listing with owner details.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: If the token subject no longer has an account.
/// - `422 Unprocessable Entity`: If input validation fails.
/// - `500 Internal Server Error`: For database errors.
#[post("")]
pub async fn create_book(
    pool: web::Data<PgPool>,
    book_data: web::Json<BookInput>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    // Validate input
    book_data.validate()?;

    let owner = sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE id = $1")
        .bind(user.0)
        .fetch_optional(&**pool)
        .await?;

    if owner.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    let book = Book::new(book_data.into_inner(), user.0);

    sqlx::query(
        "INSERT INTO books (id, title, author, published_year, genre, description, user_id, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(book.id)
    .bind(&book.title)
    .bind(&book.author)
    .bind(book.published_year)
    .bind(&book.genre)
    .bind(&book.description)
    .bind(book.user_id)
    .bind(book.created_at)
    .execute(&**pool)
    .await?;

    let created = fetch_book_with_owner(&pool, book.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".into()))?;

    Ok(HttpResponse::Created().json(created))
}

/// Replaces the fields of a listing owned by the authenticated user.
///
/// ## Path Parameters:
/// - `id`: The UUID of the listing to update.
///
/// ## Responses:
/// - `200 OK`: Returns the updated listing with owner details.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: If the listing does not exist or belongs to another user.
/// - `422 Unprocessable Entity`: If input validation fails.
/// - `500 Internal Server Error`: For database errors.
#[put("/{id}")]
pub async fn update_book(
    pool: web::Data<PgPool>,
    book_id: web::Path<Uuid>,
    book_data: web::Json<BookInput>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    book_data.validate()?;
    let book_uuid = book_id.into_inner();

    // Absent and not-owned are indistinguishable on purpose.
    let result = sqlx::query(
        "UPDATE books
         SET title = $1, author = $2, published_year = $3, genre = $4, description = $5
         WHERE id = $6 AND user_id = $7",
    )
    .bind(&book_data.title)
    .bind(&book_data.author)
    .bind(book_data.published_year)
    .bind(&book_data.genre)
    .bind(&book_data.description)
    .bind(book_uuid)
    .bind(user.0)
    .execute(&**pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Book not found or user does not have permission".into(),
        ));
    }

    let updated = fetch_book_with_owner(&pool, book_uuid)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".into()))?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Deletes a listing owned by the authenticated user.
///
/// ## Path Parameters:
/// - `id`: The UUID of the listing to delete.
///
/// ## Responses:
/// - `200 OK`: `{"message": "Book deleted"}` on success.
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `404 Not Found`: If the listing does not exist or belongs to another user.
/// - `500 Internal Server Error`: For database errors.
#[delete("/{id}")]
pub async fn delete_book(
    pool: web::Data<PgPool>,
    book_id: web::Path<Uuid>,
    user: AuthenticatedUserId,
) -> Result<impl Responder, AppError> {
    let result = sqlx::query("DELETE FROM books WHERE id = $1 AND user_id = $2")
        .bind(book_id.into_inner())
        .bind(user.0)
        .execute(&**pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "Book not found or user does not have permission".into(),
        ));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Book deleted" })))
}
