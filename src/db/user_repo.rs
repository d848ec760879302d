use sqlx::PgPool;
use uuid::Uuid;

use crate::models::UserAccount;

pub async fn get_user(pool: &PgPool, user_id: Uuid) -> anyhow::Result<Option<UserAccount>> {
    let user = sqlx::query_as::<_, UserAccount>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}
