#![doc = "The `bookbridge` library crate."]
#![doc = ""]
#![doc = "This crate contains the domain models, authentication mechanisms, the OTP"]
#![doc = "password-reset coordinator, routing configuration, and error handling for"]
#![doc = "the BookBridge application. It is used by the main binary (`main.rs`) to"]
#![doc = "construct and run the application."]

pub mod auth;
pub mod config;
pub mod credentials;
pub mod email;
pub mod error;
pub mod models;
pub mod otp;
pub mod routes;
