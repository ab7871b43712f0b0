use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// User record in the `Users` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,    // unique user ID
    pub email: String, // lowercased, indexed by EmailIndex
    pub password: String, // Argon2 hash, never returned to clients
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
