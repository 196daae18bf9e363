//! Base repository trait for database operations.

use crate::db::errors::Result;

/// A repository is the data access layer for one postgres table (plus the
/// join tables it owns). Each implementation borrows a connection, usually a
/// transaction, so a handler can compose several repositories atomically.
///
/// Entities in this service are never hard-deleted; retirement goes through an
/// `is_active` flag or a status column, so there is no `delete` here.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The request type for updating entities
    type UpdateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// List entities matching the filter, honouring its skip/limit
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Count entities matching the filter, ignoring skip/limit
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64>;

    /// Update an entity by ID
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}
