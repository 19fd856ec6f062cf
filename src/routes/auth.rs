use crate::{
    auth::{
        generate_token, hash_password, verify_password, AuthResponse, LoginRequest,
        LoginResponse, RegisterRequest,
    },
    error::AppError,
    models::UserRecord,
};
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Register a new user
///
/// Creates a new user account and returns an authentication token.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    register_data.validate()?;

    // Check if email already exists
    let existing_user =
        sqlx::query_scalar::<_, i32>("SELECT id FROM users WHERE email = $1")
            .bind(&register_data.email)
            .fetch_optional(&**pool)
            .await?;

    if existing_user.is_some() {
        return Err(AppError::BadRequest("User already exists".into()));
    }

    // Hash password
    let password_hash = hash_password(&register_data.password)?;

    // Insert new user
    let user_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&register_data.username)
    .bind(&register_data.email)
    .bind(&password_hash)
    .fetch_one(&**pool)
    .await?;

    // Generate token
    let token = generate_token(user_id)?;

    Ok(HttpResponse::Created().json(AuthResponse { token, user_id }))
}

/// Sign in
///
/// Authenticates a user and returns a token plus the user's profile.
/// Unknown email and wrong password are indistinguishable to the caller.
#[post("/signin")]
pub async fn signin(
    pool: web::Data<PgPool>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    // Validate input
    login_data.validate()?;

    // Get user from database
    let user = sqlx::query_as::<_, UserRecord>(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1",
    )
    .bind(&login_data.email)
    .fetch_optional(&**pool)
    .await?;

    match user {
        Some(record) => {
            // Verify password
            if verify_password(&login_data.password, &record.password_hash)? {
                let token = generate_token(record.id)?;
                Ok(HttpResponse::Ok().json(LoginResponse {
                    token,
                    user: record.into(),
                }))
            } else {
                Err(AppError::Unauthorized("Invalid credentials".into()))
            }
        }
        None => Err(AppError::Unauthorized("Invalid credentials".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;
    use serde_json::json;
    use sqlx::PgPool;

    // Lazy pool: validation failures are rejected before any query runs,
    // so these tests pass without a database.
    fn lazy_pool() -> PgPool {
        PgPool::connect_lazy("postgres://localhost/bookbridge_test").unwrap()
    }

    #[actix_rt::test]
    async fn test_register_validation() {
        let app = test::init_service(
            actix_web::App::new()
                .app_data(web::Data::new(lazy_pool()))
                .service(register),
        )
        .await;

        // Test invalid email
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "username": "test",
                "email": "invalid-email",
                "password": "password123"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_client_error());

        // Test short password
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "username": "test",
                "email": "test@example.com",
                "password": "short"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_client_error());

        // Test username with forbidden characters
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(json!({
                "username": "bad name!",
                "email": "test@example.com",
                "password": "password123"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_client_error());
    }

    #[actix_rt::test]
    async fn test_signin_validation() {
        let app = test::init_service(
            actix_web::App::new()
                .app_data(web::Data::new(lazy_pool()))
                .service(signin),
        )
        .await;

        // Test invalid email
        let req = test::TestRequest::post()
            .uri("/signin")
            .set_json(json!({
                "email": "invalid-email",
                "password": "password123"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_client_error());

        // Test short password
        let req = test::TestRequest::post()
            .uri("/signin")
            .set_json(json!({
                "email": "test@example.com",
                "password": "short"
            }))
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_client_error());
    }
}
