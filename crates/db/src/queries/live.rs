// crates/db/src/queries/live.rs
// Live monitoring reads: active time records and the reference rows joined onto them.

use async_trait::async_trait;
use backoffice_core::{
    EstimationRule, LiveStore, Member, NamedEntity, StoreResult, TimeRecord, UserProfile,
};
use chrono::{DateTime, Utc};
use tracing::warn;

use super::relations::*;
use crate::{Database, DbError, DbResult};

type TimeRecordRow = (
    String,
    Option<i64>,
    DateTime<Utc>,
    Option<DateTime<Utc>>,
    Option<String>,
    Option<String>,
    Option<String>,
);

type EstimationRuleRow = (String, String, Option<i64>, Option<f64>, Option<String>);

impl Database {
    /// Time records with no end time. Ids are cast to text so integer and UUID
    /// keys come back the same way.
    pub async fn get_active_time_records(&self) -> DbResult<Vec<TimeRecord>> {
        let sql = format!(
            r#"
            SELECT id::text, usuario_id::int8, data_inicio::timestamptz, data_fim::timestamptz,
                   cliente_id::text, produto_id::text, tarefa_id::text
            FROM {}
            WHERE data_fim IS NULL
            "#,
            self.table(TIME_RECORDS)
        );
        let rows: Vec<TimeRecordRow> = sqlx::query_as(&sql).fetch_all(self.pool()).await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, user_id, start_time, end_time, client_id, product_id, task_id)| TimeRecord {
                    id,
                    user_id,
                    start_time,
                    end_time,
                    client_id,
                    product_id,
                    task_id,
                },
            )
            .collect())
    }

    /// Estimation rules for the given tasks, oldest start date first so that a
    /// later rule for the same (task, responsible) pair overrides an earlier one.
    pub async fn get_estimation_rules(&self, task_ids: &[String]) -> DbResult<Vec<EstimationRule>> {
        let sql = format!(
            r#"
            SELECT r.id::text, r.tarefa_id::text, r.responsavel_id::int8,
                   r.tempo_estimado_dia::float8, r.data_inicio::text
            FROM {} r
            WHERE r.tarefa_id::text = ANY($1)
            ORDER BY r.data_inicio ASC NULLS FIRST, r.id ASC
            "#,
            self.table(ESTIMATION_RULES)
        );
        let rows: Vec<EstimationRuleRow> = sqlx::query_as(&sql)
            .bind(task_ids)
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, task_id, responsible_id, estimated_value, start_date)| {
                let Some(responsible_id) = responsible_id else {
                    warn!(rule_id = %id, "Estimation rule without responsible, skipping");
                    return None;
                };
                Some(EstimationRule {
                    id,
                    task_id,
                    responsible_id,
                    estimated_value,
                    start_date,
                })
            })
            .collect())
    }

    pub async fn get_members_by_user(&self, user_ids: &[i64]) -> DbResult<Vec<Member>> {
        let sql = format!(
            "SELECT id::int8, usuario_id::int8, nome FROM {} WHERE usuario_id = ANY($1)",
            self.table(MEMBERS)
        );
        let rows: Vec<(i64, i64, Option<String>)> = sqlx::query_as(&sql)
            .bind(user_ids)
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, user_id, name)| Member { id, user_id, name })
            .collect())
    }

    pub async fn get_user_profiles(&self, user_ids: &[i64]) -> DbResult<Vec<UserProfile>> {
        let sql = format!(
            "SELECT id::int8, foto_perfil FROM {} WHERE id = ANY($1)",
            self.table(USERS)
        );
        let rows: Vec<(i64, Option<String>)> = sqlx::query_as(&sql)
            .bind(user_ids)
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, photo)| UserProfile { id, photo })
            .collect())
    }

    /// `id`/`nome` rows from a client, product or task table.
    pub async fn get_named(&self, relation: &str, ids: &[String]) -> DbResult<Vec<NamedEntity>> {
        let sql = format!(
            "SELECT id::text, nome FROM {} WHERE id::text = ANY($1)",
            self.table(relation)
        );
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(&sql)
            .bind(ids)
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| NamedEntity { id, name })
            .collect())
    }
}

fn tag<T>(relation: &'static str, result: DbResult<T>) -> StoreResult<T> {
    result.map_err(|e: DbError| e.into_store_error(relation))
}

#[async_trait]
impl LiveStore for Database {
    async fn active_time_records(&self) -> StoreResult<Vec<TimeRecord>> {
        tag(TIME_RECORDS, self.get_active_time_records().await)
    }

    async fn estimation_rules(&self, task_ids: &[String]) -> StoreResult<Vec<EstimationRule>> {
        tag(ESTIMATION_RULES, self.get_estimation_rules(task_ids).await)
    }

    async fn members_by_user(&self, user_ids: &[i64]) -> StoreResult<Vec<Member>> {
        tag(MEMBERS, self.get_members_by_user(user_ids).await)
    }

    async fn users(&self, user_ids: &[i64]) -> StoreResult<Vec<UserProfile>> {
        tag(USERS, self.get_user_profiles(user_ids).await)
    }

    async fn clients(&self, ids: &[String]) -> StoreResult<Vec<NamedEntity>> {
        tag(CLIENTS, self.get_named(CLIENTS, ids).await)
    }

    async fn products(&self, ids: &[String]) -> StoreResult<Vec<NamedEntity>> {
        tag(PRODUCTS, self.get_named(PRODUCTS, ids).await)
    }

    async fn tasks(&self, ids: &[String]) -> StoreResult<Vec<NamedEntity>> {
        tag(TASKS, self.get_named(TASKS, ids).await)
    }

    async fn ping(&self) -> StoreResult<()> {
        Database::ping(self)
            .await
            .map_err(|e| e.into_store_error("SELECT 1"))
    }
}
