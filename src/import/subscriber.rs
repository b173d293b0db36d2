//! Subscriber creation and linking for imported mairies.

use serde_json::json;
use sqlx::SqliteConnection;

use super::result::SubscriberOutcome;
use super::validate::ValidRecord;
use crate::config::{MAIRIE_CONTACT_TYPE, SUBSCRIBER_STATUS_ENABLED};
use crate::error_handling::GeoError;
use crate::storage::{
    create_subscriber, find_subscriber_by_email, link_subscriber_to_commune, NewSubscriber,
};

/// Builds the subscriber created for a mairie without an existing account.
pub fn new_mairie_subscriber(record: &ValidRecord, email: &str) -> NewSubscriber {
    let commune = &record.commune;
    let name = record
        .contact_name
        .clone()
        .unwrap_or_else(|| format!("Mairie de {}", commune.name));

    let mut commune_attribs = json!({
        "insee_code": commune.insee_code,
        "name": commune.name,
        "department_code": commune.department_code,
        "population": commune.population,
    });
    if !commune.postal_codes.is_empty() {
        commune_attribs["postal_codes"] = json!(commune.postal_codes);
    }

    NewSubscriber {
        email: email.to_string(),
        name,
        attribs: json!({
            "commune": commune_attribs,
            "contact_type": MAIRIE_CONTACT_TYPE,
        }),
        status: SUBSCRIBER_STATUS_ENABLED.to_string(),
    }
}

/// Links the record's email to `commune_id`, creating the subscriber when no
/// existing one matches the email (case-insensitively).
pub async fn attach_subscriber(
    conn: &mut SqliteConnection,
    record: &ValidRecord,
    email: &str,
    commune_id: i64,
) -> Result<SubscriberOutcome, GeoError> {
    if let Some(subscriber_id) = find_subscriber_by_email(&mut *conn, email).await? {
        link_subscriber_to_commune(conn, subscriber_id, commune_id).await?;
        log::debug!("Linked existing subscriber {subscriber_id} to commune {commune_id}");
        return Ok(SubscriberOutcome::Linked);
    }

    let subscriber_id = create_subscriber(conn, &new_mairie_subscriber(record, email)).await?;
    link_subscriber_to_commune(conn, subscriber_id, commune_id).await?;
    log::debug!("Created subscriber {subscriber_id} for commune {commune_id}");
    Ok(SubscriberOutcome::Created)
}
