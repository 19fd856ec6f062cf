use std::env;

pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_from: String,
}

impl Config {
    pub fn from_env() -> Self {
        let smtp_username = env::var("EMAIL_USER").expect("EMAIL_USER must be set");
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_password: env::var("EMAIL_PASS").expect("EMAIL_PASS must be set"),
            // The sender address defaults to the account used to authenticate.
            smtp_from: env::var("EMAIL_FROM").unwrap_or_else(|_| smtp_username.clone()),
            smtp_username,
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required environment variables and clear optional ones so the
        // defaults are actually exercised.
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var("EMAIL_USER", "team@example.com");
        env::set_var("EMAIL_PASS", "app-password");
        env::remove_var("SERVER_PORT");
        env::remove_var("SERVER_HOST");
        env::remove_var("SMTP_HOST");
        env::remove_var("EMAIL_FROM");

        let config = Config::from_env();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 3001);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.smtp_from, "team@example.com");

        // Test custom values
        env::set_var("SERVER_PORT", "8080");
        env::set_var("SERVER_HOST", "0.0.0.0");
        env::set_var("EMAIL_FROM", "noreply@example.com");

        let config = Config::from_env();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.smtp_from, "noreply@example.com");
        assert_eq!(config.server_url(), "http://0.0.0.0:8080");
    }
}
