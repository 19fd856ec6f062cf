pub mod auth;
pub mod books;
pub mod health;
pub mod passreset;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::signin),
    )
    .service(
        web::scope("/books")
            .service(books::get_books)
            .service(books::get_books_by_user)
            .service(books::create_book)
            .service(books::update_book)
            .service(books::delete_book),
    )
    // The reset flow is mounted at the root, matching the paths the web
    // client calls.
    .service(passreset::forgot_password)
    .service(passreset::verify_otp)
    .service(passreset::reset_password);
}
