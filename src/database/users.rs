use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use super::{deleted, Database};
use crate::errors::FleetError;
use crate::models::user::{User, UserRequest};

/// Users with their parent accounts collected into an array
pub(super) const SELECT_USERS: &str = "SELECT u.uuid, u.username, u.id_card, u.roles,
        ARRAY(SELECT p.parent_uuid FROM user_parents p WHERE p.child_uuid = u.uuid
            ORDER BY p.parent_uuid) AS parent_accounts
    FROM users u";

impl Database {
    pub async fn list_users(&self) -> Result<Vec<User>, FleetError> {
        let users = sqlx::query_as::<_, User>(&format!("{SELECT_USERS} ORDER BY u.username"))
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn get_user(&self, uuid: Uuid) -> Result<User, FleetError> {
        sqlx::query_as::<_, User>(&format!("{SELECT_USERS} WHERE u.uuid = $1"))
            .bind(uuid)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FleetError::not_found("User", uuid))
    }

    pub async fn create_user(&self, request: &UserRequest) -> Result<User, FleetError> {
        let uuid = Uuid::new_v4();
        let parents = request.parents_of(uuid)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("INSERT INTO users (uuid, username, id_card, roles) VALUES ($1, $2, $3, $4)")
            .bind(uuid)
            .bind(request.username.trim())
            .bind(request.id_card.as_deref())
            .bind(request.role_names())
            .execute(&mut *tx)
            .await?;
        Self::set_parents(&mut tx, uuid, &parents).await?;
        tx.commit().await?;

        self.get_user(uuid).await
    }

    pub async fn update_user(&self, uuid: Uuid, request: &UserRequest) -> Result<User, FleetError> {
        let parents = request.parents_of(uuid)?;

        let mut tx = self.pool.begin().await?;
        let result =
            sqlx::query("UPDATE users SET username = $2, id_card = $3, roles = $4 WHERE uuid = $1")
                .bind(uuid)
                .bind(request.username.trim())
                .bind(request.id_card.as_deref())
                .bind(request.role_names())
                .execute(&mut *tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(FleetError::not_found("User", uuid));
        }
        sqlx::query("DELETE FROM user_parents WHERE child_uuid = $1")
            .bind(uuid)
            .execute(&mut *tx)
            .await?;
        Self::set_parents(&mut tx, uuid, &parents).await?;
        tx.commit().await?;

        self.get_user(uuid).await
    }

    pub async fn delete_user(&self, uuid: Uuid) -> Result<(), FleetError> {
        let result = sqlx::query("DELETE FROM users WHERE uuid = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await
            .map_err(FleetError::on_delete)?;
        deleted(result, "User", uuid)
    }

    /// Accounts that list the user as a parent
    pub async fn user_children(&self, uuid: Uuid) -> Result<Vec<User>, FleetError> {
        self.get_user(uuid).await?;
        let users = sqlx::query_as::<_, User>(&format!(
            "{SELECT_USERS} JOIN user_parents up ON up.child_uuid = u.uuid
             WHERE up.parent_uuid = $1
             ORDER BY u.username"
        ))
        .bind(uuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn set_parents(
        tx: &mut Transaction<'_, Postgres>,
        child: Uuid,
        parents: &[Uuid],
    ) -> Result<(), FleetError> {
        for parent in parents {
            sqlx::query("INSERT INTO user_parents (child_uuid, parent_uuid) VALUES ($1, $2)")
                .bind(child)
                .bind(parent)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }
}
