// crates/core/src/testing.rs
//! In-memory [`LiveStore`] for tests.
//!
//! Filters rows the way the SQL store does, counts every call, and can be told
//! to fail a given lookup or to stall before answering.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Lookup, StoreError};
use crate::store::{LiveStore, StoreResult};
use crate::types::{EstimationRule, Member, NamedEntity, TimeRecord, UserProfile};

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub records: Vec<TimeRecord>,
    pub rules: Vec<EstimationRule>,
    pub members: Vec<Member>,
    pub users: Vec<UserProfile>,
    pub clients: Vec<NamedEntity>,
    pub products: Vec<NamedEntity>,
    pub tasks: Vec<NamedEntity>,
    failing: HashSet<Lookup>,
    fail_active: bool,
    delay: Option<Duration>,
    active_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, records: Vec<TimeRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn with_rules(mut self, rules: Vec<EstimationRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_members(mut self, members: Vec<Member>) -> Self {
        self.members = members;
        self
    }

    pub fn with_users(mut self, users: Vec<UserProfile>) -> Self {
        self.users = users;
        self
    }

    pub fn with_clients(mut self, clients: Vec<NamedEntity>) -> Self {
        self.clients = clients;
        self
    }

    pub fn with_products(mut self, products: Vec<NamedEntity>) -> Self {
        self.products = products;
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<NamedEntity>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Make the given lookup return an error.
    pub fn fail_lookup(mut self, lookup: Lookup) -> Self {
        self.failing.insert(lookup);
        self
    }

    /// Make the active-record query return an error.
    pub fn fail_active_records(mut self) -> Self {
        self.fail_active = true;
        self
    }

    /// Sleep before answering the active-record query.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn active_calls(&self) -> usize {
        self.active_calls.load(Ordering::SeqCst)
    }

    /// Number of reference lookups (estimation rules included) that reached the store.
    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, lookup: Lookup, relation: &'static str) -> StoreResult<()> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&lookup) {
            return Err(StoreError::query(relation, format!("{lookup} lookup failed")));
        }
        Ok(())
    }
}

fn by_ids(rows: &[NamedEntity], ids: &[String]) -> Vec<NamedEntity> {
    rows.iter().filter(|r| ids.contains(&r.id)).cloned().collect()
}

#[async_trait]
impl LiveStore for MemoryStore {
    async fn active_time_records(&self) -> StoreResult<Vec<TimeRecord>> {
        self.active_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_active {
            return Err(StoreError::query("registro_tempo", "relation does not exist"));
        }
        Ok(self.records.iter().filter(|r| r.is_active()).cloned().collect())
    }

    async fn estimation_rules(&self, task_ids: &[String]) -> StoreResult<Vec<EstimationRule>> {
        self.lookup(Lookup::EstimationRules, "tempo_estimado_regra")?;
        Ok(self
            .rules
            .iter()
            .filter(|r| task_ids.contains(&r.task_id))
            .cloned()
            .collect())
    }

    async fn members_by_user(&self, user_ids: &[i64]) -> StoreResult<Vec<Member>> {
        self.lookup(Lookup::Members, "membro")?;
        Ok(self
            .members
            .iter()
            .filter(|m| user_ids.contains(&m.user_id))
            .cloned()
            .collect())
    }

    async fn users(&self, user_ids: &[i64]) -> StoreResult<Vec<UserProfile>> {
        self.lookup(Lookup::Users, "usuarios")?;
        Ok(self
            .users
            .iter()
            .filter(|u| user_ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn clients(&self, ids: &[String]) -> StoreResult<Vec<NamedEntity>> {
        self.lookup(Lookup::Clients, "cp_cliente")?;
        Ok(by_ids(&self.clients, ids))
    }

    async fn products(&self, ids: &[String]) -> StoreResult<Vec<NamedEntity>> {
        self.lookup(Lookup::Products, "cp_produto")?;
        Ok(by_ids(&self.products, ids))
    }

    async fn tasks(&self, ids: &[String]) -> StoreResult<Vec<NamedEntity>> {
        self.lookup(Lookup::Tasks, "cp_tarefa")?;
        Ok(by_ids(&self.tasks, ids))
    }

    async fn ping(&self) -> StoreResult<()> {
        if self.fail_active {
            return Err(StoreError::Unavailable("memory store marked as failing".into()));
        }
        Ok(())
    }
}
