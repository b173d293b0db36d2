//! Minimal access to the subscriber table.
//!
//! Subscribers belong to the subscriber-management system; the import only
//! needs to find one by email or create one.

use sqlx::{SqliteConnection, SqliteExecutor};

use crate::error_handling::GeoError;
use crate::storage::models::NewSubscriber;

/// Finds a subscriber id by email, ignoring case.
pub async fn find_subscriber_by_email<'e, E>(
    executor: E,
    email: &str,
) -> Result<Option<i64>, GeoError>
where
    E: SqliteExecutor<'e>,
{
    let id = sqlx::query_scalar("SELECT id FROM subscribers WHERE LOWER(email) = LOWER(?) LIMIT 1")
        .bind(email)
        .fetch_optional(executor)
        .await?;
    Ok(id)
}

/// Returns whether a subscriber with this id exists.
pub async fn subscriber_exists<'e, E>(executor: E, subscriber_id: i64) -> Result<bool, GeoError>
where
    E: SqliteExecutor<'e>,
{
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM subscribers WHERE id = ?")
        .bind(subscriber_id)
        .fetch_optional(executor)
        .await?;
    Ok(found.is_some())
}

/// Creates a subscriber and returns its id.
pub async fn create_subscriber(
    conn: &mut SqliteConnection,
    subscriber: &NewSubscriber,
) -> Result<i64, GeoError> {
    let id = sqlx::query_scalar(
        "INSERT INTO subscribers (uuid, email, name, attribs, status, created_at_ms)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING id",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&subscriber.email)
    .bind(&subscriber.name)
    .bind(subscriber.attribs.to_string())
    .bind(&subscriber.status)
    .bind(chrono::Utc::now().timestamp_millis())
    .fetch_one(&mut *conn)
    .await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::{create_test_pool, insert_subscriber};

    #[tokio::test]
    async fn test_find_by_email_is_case_insensitive() {
        let pool = create_test_pool().await;
        let id = insert_subscriber(&pool, "Contact@Paris.fr", "enabled").await;

        let found = find_subscriber_by_email(&pool, "contact@PARIS.fr")
            .await
            .expect("lookup");
        assert_eq!(found, Some(id));

        let missing = find_subscriber_by_email(&pool, "nobody@paris.fr")
            .await
            .expect("lookup");
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_create_subscriber_stores_attributes() {
        let pool = create_test_pool().await;
        let mut conn = pool.acquire().await.expect("acquire");
        let id = create_subscriber(
            &mut conn,
            &NewSubscriber {
                email: "mairie@nice.fr".into(),
                name: "Mairie de Nice".into(),
                attribs: serde_json::json!({"contact_type": "mairie"}),
                status: "enabled".into(),
            },
        )
        .await
        .expect("create");
        assert!(subscriber_exists(&mut *conn, id).await.expect("exists"));
        assert!(!subscriber_exists(&mut *conn, id + 1).await.expect("exists"));
        drop(conn);

        let attribs: String = sqlx::query_scalar("SELECT attribs FROM subscribers WHERE id = ?")
            .bind(id)
            .fetch_one(&pool)
            .await
            .expect("attribs");
        let value: serde_json::Value = serde_json::from_str(&attribs).expect("json");
        assert_eq!(value["contact_type"], "mairie");
    }
}
