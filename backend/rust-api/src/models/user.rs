use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// User surface stored in the "users" collection. Credentials, password
/// reset and token issuance live in an external auth service; this model
/// carries only what authorization and display need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    /// Course ids the user is enrolled in
    #[serde(default)]
    pub subscription: Vec<ObjectId>,
}

/// Closed role set, exhaustively matched in every access check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Instructor,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Student => "student",
            UserRole::Instructor => "instructor",
            UserRole::Admin => "admin",
        }
    }
}

/// User view returned to clients.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub subscription: Vec<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            id: user.id.to_hex(),
            name: user.name,
            email: user.email,
            role: user.role,
            subscription: user.subscription.iter().map(|id| id.to_hex()).collect(),
        }
    }
}

/// Request to change a user's role (admin only). The closed enum makes an
/// unknown role a deserialization error rather than a stored typo.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}
