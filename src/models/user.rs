use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Public view of an account, safe to return from handlers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Full row from the `users` table, including the password hash.
/// Never serialized; convert to `User` before it leaves the handler.
#[derive(Debug, FromRow, Clone)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            username: record.username,
            email: record.email,
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_record_drops_hash() {
        let record = UserRecord {
            id: 7,
            username: "reader".to_string(),
            email: "reader@example.com".to_string(),
            password_hash: "$2b$10$abcdefghijklmnopqrstuv".to_string(),
            created_at: Utc::now(),
        };

        let user: User = record.clone().into();
        assert_eq!(user.id, record.id);
        assert_eq!(user.username, record.username);
        assert_eq!(user.email, record.email);

        let json = serde_json::to_value(&user).expect("serialize user");
        assert!(json.get("password_hash").is_none());
    }
}
