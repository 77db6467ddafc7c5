use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Collection, Database};

use crate::error::ApiError;
use crate::middlewares::auth::JwtClaims;
use crate::models::{parse_object_id, User, UserProfile, UserRole};

pub struct UserService {
    mongo: Database,
}

impl UserService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn users(&self) -> Collection<User> {
        self.mongo.collection("users")
    }

    /// All users except the caller.
    pub async fn list(&self, claims: &JwtClaims) -> Result<Vec<UserProfile>, ApiError> {
        let caller = claims.object_id()?;
        let mut cursor = self.users().find(doc! { "_id": { "$ne": caller } }).await?;

        let mut users = Vec::new();
        while let Some(user) = cursor.try_next().await? {
            users.push(UserProfile::from(user));
        }
        Ok(users)
    }

    /// Sets a user's role. Admin-only at the routing layer; an admin cannot
    /// demote themselves.
    pub async fn update_role(
        &self,
        claims: &JwtClaims,
        user_id: &str,
        role: UserRole,
    ) -> Result<(), ApiError> {
        let target = parse_object_id(user_id, "user")?;
        self.users()
            .find_one(doc! { "_id": target })
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        if target == claims.object_id()? && role != UserRole::Admin {
            return Err(ApiError::forbidden(
                "You cannot demote yourself from admin",
            ));
        }

        self.users()
            .update_one(
                doc! { "_id": target },
                doc! { "$set": { "role": role.as_str() } },
            )
            .await?;

        tracing::info!("Role of user {} set to {}", user_id, role.as_str());
        Ok(())
    }
}
