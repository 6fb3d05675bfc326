use async_trait::async_trait;
use serde::Serialize;
use sqlx::{error::DatabaseError, FromRow, PgPool};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Account with its nutrition target. `daily_calorie_intake` and
/// `target_weight` are mutable after signup; the rest is fixed at creation.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub weight: f64,
    pub height: f64,
    pub target_weight: f64,
    pub daily_calorie_intake: f64,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub weight: f64,
    pub height: f64,
    pub target_weight: f64,
    pub daily_calorie_intake: f64,
}

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new: NewUser) -> Result<User, UserStoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserStoreError>;

    /// Updates the mutable goal fields; `None` leaves a field untouched.
    /// Returns `None` when the user no longer exists.
    async fn update_goals(
        &self,
        id: Uuid,
        target_weight: Option<f64>,
        daily_calorie_intake: Option<f64>,
    ) -> Result<Option<User>, UserStoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, email, password_hash, weight, height, target_weight, daily_calorie_intake, created_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new: NewUser) -> Result<User, UserStoreError> {
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, weight, height, target_weight, daily_calorie_intake)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.weight)
        .bind(new.height)
        .bind(new.target_weight)
        .bind(new.daily_calorie_intake)
        .fetch_one(&self.pool)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(UserStoreError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1",
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserStoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1",
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_goals(
        &self,
        id: Uuid,
        target_weight: Option<f64>,
        daily_calorie_intake: Option<f64>,
    ) -> Result<Option<User>, UserStoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET target_weight = COALESCE($2, target_weight),
                daily_calorie_intake = COALESCE($3, daily_calorie_intake)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(target_weight)
        .bind(daily_calorie_intake)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

/// In-memory user store for `AppState::fake()` and tests.
#[derive(Default)]
pub struct MemoryUsers {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserStore for MemoryUsers {
    async fn create(&self, new: NewUser) -> Result<User, UserStoreError> {
        let mut users = self.users.lock().await;
        if users.iter().any(|u| u.email == new.email) {
            return Err(UserStoreError::DuplicateEmail);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            password_hash: new.password_hash,
            weight: new.weight,
            height: new.height,
            target_weight: new.target_weight,
            daily_calorie_intake: new.daily_calorie_intake,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserStoreError> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_goals(
        &self,
        id: Uuid,
        target_weight: Option<f64>,
        daily_calorie_intake: Option<f64>,
    ) -> Result<Option<User>, UserStoreError> {
        let mut users = self.users.lock().await;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(w) = target_weight {
            user.target_weight = w;
        }
        if let Some(kcal) = daily_calorie_intake {
            user.daily_calorie_intake = kcal;
        }
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            weight: 82.0,
            height: 180.0,
            target_weight: 76.0,
            daily_calorie_intake: 2200.0,
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryUsers::default();
        store.create(new_user("a@example.com")).await.expect("first");
        let err = store.create(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, UserStoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn update_goals_touches_only_provided_fields() {
        let store = MemoryUsers::default();
        let user = store.create(new_user("b@example.com")).await.expect("create");

        let updated = store
            .update_goals(user.id, None, Some(1800.0))
            .await
            .expect("update")
            .expect("user exists");
        assert_eq!(updated.daily_calorie_intake, 1800.0);
        assert_eq!(updated.target_weight, 76.0);
    }

    #[tokio::test]
    async fn update_goals_of_unknown_user_is_none() {
        let store = MemoryUsers::default();
        let res = store
            .update_goals(Uuid::new_v4(), Some(70.0), None)
            .await
            .expect("update");
        assert!(res.is_none());
    }

    #[test]
    fn password_hash_never_serializes() {
        let user = User {
            id: Uuid::new_v4(),
            email: "c@example.com".into(),
            password_hash: "secret".into(),
            weight: 80.0,
            height: 178.0,
            target_weight: 75.0,
            daily_calorie_intake: 2000.0,
            created_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(!json.contains("secret"));
        assert!(json.contains("dailyCalorieIntake"));
    }
}
