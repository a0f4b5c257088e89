use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account type of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Consumer,
    Seller,
    Admin,
}

impl UserType {
    /// Convert from database string
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "consumer" => Ok(UserType::Consumer),
            "seller" => Ok(UserType::Seller),
            "admin" => Ok(UserType::Admin),
            _ => Err(format!("Invalid user type: {}", s)),
        }
    }

    /// Convert to database string
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Consumer => "consumer",
            UserType::Seller => "seller",
            UserType::Admin => "admin",
        }
    }
}

/// User model, looked up for identity and ownership checks
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub user_type: String, // Stored as TEXT, use UserType enum for type safety
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn new(email: String, name: String, user_type: UserType) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            user_type: user_type.as_str().to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn user_type_enum(&self) -> UserType {
        UserType::from_str(&self.user_type).unwrap_or(UserType::Consumer)
    }

    pub fn is_seller(&self) -> bool {
        self.user_type_enum() == UserType::Seller
    }
}
