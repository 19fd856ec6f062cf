use actix_web::{post, web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::error::AppError;
use crate::otp::ResetCoordinator;

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email)]
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Request a password reset OTP
///
/// Emails a one-time code to the address if an account exists. The
/// response does not reveal whether the address is registered.
#[post("/forgot-password")]
pub async fn forgot_password(
    coordinator: web::Data<ResetCoordinator>,
    request: web::Json<ForgotPasswordRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    coordinator.request_reset(&request.email).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "OTP sent successfully" })))
}

/// Verify a password reset OTP
///
/// Checks the submitted code against the one issued for the email.
/// The success body mirrors forgot-password; clients key off the
/// status code.
#[post("/verify-otp")]
pub async fn verify_otp(
    coordinator: web::Data<ResetCoordinator>,
    request: web::Json<VerifyOtpRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    coordinator.verify_otp(&request.email, &request.otp).await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "OTP sent successfully" })))
}

/// Set a new password after OTP verification
///
/// Only works once the email's current OTP has been verified.
#[post("/reset-password")]
pub async fn reset_password(
    coordinator: web::Data<ResetCoordinator>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    coordinator
        .reset_password(&request.email, &request.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password updated successfully"
    })))
}
