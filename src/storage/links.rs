//! Subscriber ↔ commune associations.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error_handling::GeoError;
use crate::storage::communes::commune_select;
use crate::storage::models::Commune;
use crate::storage::subscribers::subscriber_exists;

/// Links a subscriber to a commune.
///
/// Both ends must exist (`NotFound` otherwise). Linking an already linked
/// pair is a no-op; the return value tells whether a new link was written.
pub async fn link_subscriber_to_commune(
    conn: &mut SqliteConnection,
    subscriber_id: i64,
    commune_id: i64,
) -> Result<bool, GeoError> {
    if !subscriber_exists(&mut *conn, subscriber_id).await? {
        return Err(GeoError::not_found("subscriber", subscriber_id));
    }
    let commune_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM communes WHERE id = ?")
        .bind(commune_id)
        .fetch_optional(&mut *conn)
        .await?;
    if commune_exists.is_none() {
        return Err(GeoError::not_found("commune", commune_id));
    }

    let result = sqlx::query(
        "INSERT INTO subscriber_communes (subscriber_id, commune_id, created_at_ms)
         VALUES (?, ?, ?)
         ON CONFLICT (subscriber_id, commune_id) DO NOTHING",
    )
    .bind(subscriber_id)
    .bind(commune_id)
    .bind(chrono::Utc::now().timestamp_millis())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Removes the link between a subscriber and a commune.
///
/// Returns whether a link existed. Removing a missing link is not an error.
pub async fn unlink_subscriber_from_commune(
    pool: &SqlitePool,
    subscriber_id: i64,
    commune_id: i64,
) -> Result<bool, GeoError> {
    let result =
        sqlx::query("DELETE FROM subscriber_communes WHERE subscriber_id = ? AND commune_id = ?")
            .bind(subscriber_id)
            .bind(commune_id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

/// Lists the communes linked to a subscriber, ordered by name.
pub async fn list_communes_for_subscriber(
    pool: &SqlitePool,
    subscriber_id: i64,
) -> Result<Vec<Commune>, GeoError> {
    let mut query = commune_select();
    query.push(" JOIN subscriber_communes sc ON sc.commune_id = c.id WHERE sc.subscriber_id = ");
    query.push_bind(subscriber_id);
    query.push(" ORDER BY c.name, c.insee_code");

    let rows = query.build().fetch_all(pool).await?;
    Ok(rows.iter().map(Commune::from_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_helpers::{create_test_pool, insert_commune, insert_subscriber};

    #[tokio::test]
    async fn test_link_is_idempotent() {
        let pool = create_test_pool().await;
        let commune_id = insert_commune(&pool, "69123", "Lyon", "69", 515_695, &[]).await;
        let subscriber_id = insert_subscriber(&pool, "mairie@lyon.fr", "enabled").await;

        let mut conn = pool.acquire().await.expect("acquire");
        assert!(link_subscriber_to_commune(&mut conn, subscriber_id, commune_id)
            .await
            .expect("first link"));
        assert!(!link_subscriber_to_commune(&mut conn, subscriber_id, commune_id)
            .await
            .expect("second link"));
        drop(conn);

        let communes = list_communes_for_subscriber(&pool, subscriber_id)
            .await
            .expect("list");
        assert_eq!(communes.len(), 1);
        assert_eq!(communes[0].insee_code, "69123");
    }

    #[tokio::test]
    async fn test_link_requires_existing_ends() {
        let pool = create_test_pool().await;
        let commune_id = insert_commune(&pool, "69123", "Lyon", "69", 515_695, &[]).await;
        let subscriber_id = insert_subscriber(&pool, "mairie@lyon.fr", "enabled").await;

        let mut conn = pool.acquire().await.expect("acquire");
        let err = link_subscriber_to_commune(&mut conn, subscriber_id + 100, commune_id)
            .await
            .expect_err("unknown subscriber");
        assert!(matches!(err, GeoError::NotFound { entity: "subscriber", .. }));

        let err = link_subscriber_to_commune(&mut conn, subscriber_id, commune_id + 100)
            .await
            .expect_err("unknown commune");
        assert!(matches!(err, GeoError::NotFound { entity: "commune", .. }));
    }

    #[tokio::test]
    async fn test_unlink() {
        let pool = create_test_pool().await;
        let lyon = insert_commune(&pool, "69123", "Lyon", "69", 515_695, &[]).await;
        let nice = insert_commune(&pool, "06088", "Nice", "06", 342_637, &[]).await;
        let subscriber_id = insert_subscriber(&pool, "elus@example.fr", "enabled").await;

        let mut conn = pool.acquire().await.expect("acquire");
        link_subscriber_to_commune(&mut conn, subscriber_id, nice)
            .await
            .expect("link nice");
        link_subscriber_to_commune(&mut conn, subscriber_id, lyon)
            .await
            .expect("link lyon");
        drop(conn);

        let names: Vec<String> = list_communes_for_subscriber(&pool, subscriber_id)
            .await
            .expect("list")
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Lyon", "Nice"]);

        assert!(unlink_subscriber_from_commune(&pool, subscriber_id, lyon)
            .await
            .expect("unlink"));
        assert!(!unlink_subscriber_from_commune(&pool, subscriber_id, lyon)
            .await
            .expect("unlink again"));

        let remaining = list_communes_for_subscriber(&pool, subscriber_id)
            .await
            .expect("list");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Nice");
    }
}
