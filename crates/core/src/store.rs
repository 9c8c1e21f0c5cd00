// crates/core/src/store.rs
//! `LiveStore` trait: the read-only data-store surface the aggregator needs.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{EstimationRule, Member, NamedEntity, TimeRecord, UserProfile};

pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to time records and the reference tables joined onto them.
///
/// Implementations:
/// - `backoffice_db::Database`: schema-scoped Postgres
/// - `testing::MemoryStore`: in-memory rows with call counting (feature `test-support`)
///
/// Callers never pass an empty id slice; the aggregator skips those lookups.
#[async_trait]
pub trait LiveStore: Send + Sync {
    /// All time records whose end time is unset.
    async fn active_time_records(&self) -> StoreResult<Vec<TimeRecord>>;

    /// Estimation rules for any of the given tasks, ordered by start date then id.
    async fn estimation_rules(&self, task_ids: &[String]) -> StoreResult<Vec<EstimationRule>>;

    async fn members_by_user(&self, user_ids: &[i64]) -> StoreResult<Vec<Member>>;

    async fn users(&self, user_ids: &[i64]) -> StoreResult<Vec<UserProfile>>;

    async fn clients(&self, ids: &[String]) -> StoreResult<Vec<NamedEntity>>;

    async fn products(&self, ids: &[String]) -> StoreResult<Vec<NamedEntity>>;

    async fn tasks(&self, ids: &[String]) -> StoreResult<Vec<NamedEntity>>;

    /// Cheap round-trip used by health checks.
    async fn ping(&self) -> StoreResult<()>;
}
