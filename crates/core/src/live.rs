// crates/core/src/live.rs
//! Active-session aggregation for the live monitoring dashboard.
//!
//! One request runs:
//! 1. the active time-record query (short-circuits when empty),
//! 2. estimation rules plus five reference lookups, issued concurrently,
//! 3. an in-memory join over typed lookup maps,
//! 4. a descending sort on elapsed time.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::dates::format_iso_date_br;
use crate::duration::{estimate_to_ms, format_duration_compact};
use crate::error::{LiveError, Lookup, StoreError};
use crate::store::LiveStore;
use crate::types::{
    to_iso_millis, ActiveSession, EstimationRule, Member, NamedEntity, TimeRecord, UserProfile,
    UNKNOWN_MEMBER_NAME,
};

/// Default deadline for one aggregation.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(10);

/// How reference-lookup failures are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LookupPolicy {
    /// Any failed lookup fails the whole aggregation.
    #[default]
    FailFast,
    /// A failed lookup is logged and treated as an empty result.
    Isolate,
}

impl LookupPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailFast => "fail-fast",
            Self::Isolate => "isolate",
        }
    }
}

impl std::fmt::Display for LookupPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "fail_fast" | "failfast" => Ok(Self::FailFast),
            "isolate" => Ok(Self::Isolate),
            other => Err(format!(
                "unknown lookup policy '{other}' (expected 'fail-fast' or 'isolate')"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorOptions {
    pub policy: LookupPolicy,
    pub deadline: Duration,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            policy: LookupPolicy::default(),
            deadline: DEFAULT_DEADLINE,
        }
    }
}

/// Distinct foreign keys referenced by a set of active records.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReferenceIds {
    pub users: Vec<i64>,
    pub clients: Vec<String>,
    pub products: Vec<String>,
    pub tasks: Vec<String>,
}

impl ReferenceIds {
    pub fn collect(records: &[TimeRecord]) -> Self {
        let mut users = BTreeSet::new();
        let mut clients = BTreeSet::new();
        let mut products = BTreeSet::new();
        let mut tasks = BTreeSet::new();

        for r in records {
            users.extend(r.user_id);
            clients.extend(non_empty(&r.client_id));
            products.extend(non_empty(&r.product_id));
            tasks.extend(non_empty(&r.task_id));
        }

        Self {
            users: users.into_iter().collect(),
            clients: clients.into_iter().collect(),
            products: products.into_iter().collect(),
            tasks: tasks.into_iter().collect(),
        }
    }
}

fn non_empty(id: &Option<String>) -> Option<String> {
    id.as_deref().filter(|s| !s.is_empty()).map(str::to_owned)
}

/// Composite key of an estimation rule: the task and its responsible member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EstimationKey {
    pub task_id: String,
    pub responsible_id: i64,
}

/// Lookup maps built once per request.
#[derive(Debug, Default)]
pub struct ReferenceData {
    /// Keyed by user id.
    pub members: HashMap<i64, Member>,
    pub users: HashMap<i64, UserProfile>,
    pub clients: HashMap<String, Option<String>>,
    pub products: HashMap<String, Option<String>>,
    pub tasks: HashMap<String, Option<String>>,
    pub estimations: HashMap<EstimationKey, EstimationRule>,
}

impl ReferenceData {
    /// Build the maps. Later estimation rules overwrite earlier ones sharing a key,
    /// so with rows ordered by start date the most recent rule wins.
    pub fn from_rows(
        rules: Vec<EstimationRule>,
        members: Vec<Member>,
        users: Vec<UserProfile>,
        clients: Vec<NamedEntity>,
        products: Vec<NamedEntity>,
        tasks: Vec<NamedEntity>,
    ) -> Self {
        let names = |rows: Vec<NamedEntity>| -> HashMap<String, Option<String>> {
            rows.into_iter().map(|e| (e.id, e.name)).collect()
        };

        Self {
            members: members.into_iter().map(|m| (m.user_id, m)).collect(),
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            clients: names(clients),
            products: names(products),
            // A task row without a name still resolves, to an empty name.
            tasks: tasks
                .into_iter()
                .map(|t| (t.id, Some(t.name.unwrap_or_default())))
                .collect(),
            estimations: rules
                .into_iter()
                .map(|r| {
                    let key = EstimationKey {
                        task_id: r.task_id.clone(),
                        responsible_id: r.responsible_id,
                    };
                    (key, r)
                })
                .collect(),
        }
    }

    fn estimation_for(
        &self,
        task_id: Option<&str>,
        member: Option<&Member>,
    ) -> Option<&EstimationRule> {
        let task_id = task_id.filter(|t| !t.is_empty())?;
        let member = member.filter(|m| m.id != 0)?;
        self.estimations.get(&EstimationKey {
            task_id: task_id.to_owned(),
            responsible_id: member.id,
        })
    }
}

/// Enrich each active record with names and durations. Output order follows input.
pub fn join_sessions(
    records: &[TimeRecord],
    refs: &ReferenceData,
    now: DateTime<Utc>,
) -> Vec<ActiveSession> {
    records
        .iter()
        .map(|r| {
            let member = r.user_id.and_then(|id| refs.members.get(&id));
            let estimation = refs.estimation_for(r.task_id.as_deref(), member);

            let estimated_formatted = estimation
                .and_then(|e| e.estimated_value)
                .filter(|v| *v != 0.0 && !v.is_nan())
                .map(|v| format_duration_compact(estimate_to_ms(v)));
            let estimated_date_formatted = estimation
                .and_then(|e| e.start_date.as_deref())
                .filter(|d| !d.is_empty())
                .map(format_iso_date_br);

            ActiveSession {
                id: r.id.clone(),
                user_id: r.user_id,
                started_at: to_iso_millis(&r.start_time),
                member_id: member.map(|m| m.id).unwrap_or(0),
                member_name: member
                    .and_then(|m| m.name.as_deref())
                    .filter(|n| !n.is_empty())
                    .unwrap_or(UNKNOWN_MEMBER_NAME)
                    .to_string(),
                photo: r
                    .user_id
                    .and_then(|id| refs.users.get(&id))
                    .and_then(|u| u.photo.clone()),
                client_id: r.client_id.clone(),
                client_name: resolve_name(&refs.clients, &r.client_id),
                product_id: r.product_id.clone(),
                product_name: resolve_name(&refs.products, &r.product_id),
                task_id: r.task_id.clone(),
                task_name: resolve_name(&refs.tasks, &r.task_id),
                estimation_id: estimation.map(|e| e.id.clone()),
                elapsed_ms: (now - r.start_time).num_milliseconds(),
                estimated_formatted,
                estimated_date_formatted,
            }
        })
        .collect()
}

fn resolve_name(map: &HashMap<String, Option<String>>, id: &Option<String>) -> Option<String> {
    id.as_ref().and_then(|id| map.get(id)).cloned().flatten()
}

/// Longest-running session first.
pub fn sort_by_elapsed(sessions: &mut [ActiveSession]) {
    sessions.sort_by(|a, b| b.elapsed_ms.cmp(&a.elapsed_ms));
}

/// Aggregates currently running sessions from a [`LiveStore`].
#[derive(Clone)]
pub struct LiveSessionAggregator {
    store: Arc<dyn LiveStore>,
    options: AggregatorOptions,
}

impl LiveSessionAggregator {
    pub fn new(store: Arc<dyn LiveStore>, options: AggregatorOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> AggregatorOptions {
        self.options
    }

    /// All active sessions as of now, bounded by the configured deadline.
    ///
    /// Dropping the returned future cancels any in-flight store calls.
    pub async fn active_sessions(&self) -> Result<Vec<ActiveSession>, LiveError> {
        let deadline = self.options.deadline;
        tokio::time::timeout(deadline, self.active_sessions_at(Utc::now()))
            .await
            .map_err(|_| LiveError::DeadlineExceeded(deadline))?
    }

    /// Same as [`active_sessions`](Self::active_sessions) with an explicit clock and no deadline.
    pub async fn active_sessions_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActiveSession>, LiveError> {
        let records = self
            .store
            .active_time_records()
            .await
            .map_err(LiveError::ActiveRecords)?;

        if records.is_empty() {
            debug!("No active time records");
            return Ok(Vec::new());
        }

        let ids = ReferenceIds::collect(&records);
        debug!(
            records = records.len(),
            users = ids.users.len(),
            clients = ids.clients.len(),
            products = ids.products.len(),
            tasks = ids.tasks.len(),
            "Loading live session references"
        );

        let refs = self.load_references(&ids).await?;
        let mut sessions = join_sessions(&records, &refs, now);
        sort_by_elapsed(&mut sessions);
        Ok(sessions)
    }

    async fn load_references(&self, ids: &ReferenceIds) -> Result<ReferenceData, LiveError> {
        let store = self.store.as_ref();

        let rules = fetch(Lookup::EstimationRules, &ids.tasks, |ids| {
            store.estimation_rules(ids)
        });
        let members = fetch(Lookup::Members, &ids.users, |ids| {
            store.members_by_user(ids)
        });
        let users = fetch(Lookup::Users, &ids.users, |ids| store.users(ids));
        let clients = fetch(Lookup::Clients, &ids.clients, |ids| store.clients(ids));
        let products = fetch(Lookup::Products, &ids.products, |ids| store.products(ids));
        let tasks = fetch(Lookup::Tasks, &ids.tasks, |ids| store.tasks(ids));

        let (rules, members, users, clients, products, tasks) = match self.options.policy {
            LookupPolicy::FailFast => {
                tokio::try_join!(rules, members, users, clients, products, tasks)?
            }
            LookupPolicy::Isolate => {
                let (r, m, u, c, p, t) =
                    tokio::join!(rules, members, users, clients, products, tasks);
                (
                    or_empty(r),
                    or_empty(m),
                    or_empty(u),
                    or_empty(c),
                    or_empty(p),
                    or_empty(t),
                )
            }
        };

        Ok(ReferenceData::from_rows(
            rules, members, users, clients, products, tasks,
        ))
    }
}

/// Run one lookup, skipping the store entirely when there is nothing to look up.
async fn fetch<'a, I, T, F, Fut>(
    lookup: Lookup,
    ids: &'a [I],
    query: F,
) -> Result<Vec<T>, LiveError>
where
    F: FnOnce(&'a [I]) -> Fut,
    Fut: Future<Output = Result<Vec<T>, StoreError>>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    query(ids)
        .await
        .map_err(|source| LiveError::Lookup { lookup, source })
}

fn or_empty<T>(result: Result<Vec<T>, LiveError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "Reference lookup failed, continuing without it");
        Vec::new()
    })
}
