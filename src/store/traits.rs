//! `ProfileStore` trait: async interface for catcher persistence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

/// One registered catcher in one group.
///
/// Unique by `(group_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatcherRecord {
    pub plate_number: String,
    pub user_id: String,
    pub user_name: String,
    pub self_intro: String,
    pub haunted_places: String,
    pub cover_url: String,
    pub group_id: String,
    pub group_name: String,
}

/// Backend-agnostic catcher storage.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Insert a catcher, or overwrite every non-key field of the existing
    /// row with the same `(group_id, user_id)`. Returns the row id.
    async fn upsert_catcher(&self, record: &CatcherRecord) -> Result<i64, DatabaseError>;

    /// Catchers whose plate contains `fragment`, in insertion order.
    ///
    /// `scope_group_id` is the group the query came from; matches from every
    /// group are returned so the caller can show all of a user's groups.
    async fn search_catchers_by_plate(
        &self,
        scope_group_id: &str,
        fragment: &str,
    ) -> Result<Vec<CatcherRecord>, DatabaseError>;

    /// Every record registered by one user, in insertion order.
    async fn list_catchers_for_user(&self, user_id: &str)
    -> Result<Vec<CatcherRecord>, DatabaseError>;

    /// Bump the sighting counter for an unregistered plate, creating it at 1.
    /// Returns the new count.
    async fn increment_wild_catcher(&self, plate_number: &str) -> Result<i64, DatabaseError>;
}
