//! Integration tests for the live monitoring queries.
//!
//! These need a reachable Postgres. Set `TEST_DATABASE_URL` to run them; when it
//! is unset every test returns early. Each test works in its own throwaway schema.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use backoffice_core::{AggregatorOptions, LiveSessionAggregator, LiveStore};
use backoffice_db::{Database, SchemaName};
use pretty_assertions::assert_eq;
use sqlx::postgres::PgPoolOptions;

async fn test_db(tag: &str) -> Option<Database> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(6)
        .connect(&url)
        .await
        .expect("connect to TEST_DATABASE_URL");

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    let name = format!("live_{tag}_{}_{nanos}", std::process::id());
    let schema = SchemaName::parse(&name).unwrap();
    let db = Database::from_pool(pool, schema);

    let ddl = format!(
        r#"
        CREATE SCHEMA "{s}";
        CREATE TABLE {records} (
            id BIGSERIAL PRIMARY KEY,
            usuario_id BIGINT,
            data_inicio TIMESTAMPTZ NOT NULL,
            data_fim TIMESTAMPTZ,
            cliente_id TEXT,
            produto_id TEXT,
            tarefa_id TEXT
        );
        CREATE TABLE {rules} (
            id BIGSERIAL PRIMARY KEY,
            tarefa_id TEXT NOT NULL,
            responsavel_id BIGINT,
            tempo_estimado_dia NUMERIC,
            data_inicio DATE
        );
        CREATE TABLE {members} (id BIGINT PRIMARY KEY, usuario_id BIGINT, nome TEXT);
        CREATE TABLE {users} (id BIGINT PRIMARY KEY, foto_perfil TEXT);
        CREATE TABLE {clients} (id TEXT PRIMARY KEY, nome TEXT);
        CREATE TABLE {products} (id TEXT PRIMARY KEY, nome TEXT);
        CREATE TABLE {tasks} (id TEXT PRIMARY KEY, nome TEXT);
        "#,
        s = db.schema(),
        records = db.table("registro_tempo"),
        rules = db.table("tempo_estimado_regra"),
        members = db.table("membro"),
        users = db.table("usuarios"),
        clients = db.table("cp_cliente"),
        products = db.table("cp_produto"),
        tasks = db.table("cp_tarefa"),
    );
    sqlx::raw_sql(&ddl).execute(db.pool()).await.expect("create schema");
    Some(db)
}

async fn drop_schema(db: &Database) {
    let sql = format!(r#"DROP SCHEMA "{}" CASCADE"#, db.schema());
    sqlx::raw_sql(&sql).execute(db.pool()).await.expect("drop schema");
}

async fn seed(db: &Database) {
    let sql = format!(
        r#"
        INSERT INTO {records} (usuario_id, data_inicio, data_fim, cliente_id, produto_id, tarefa_id) VALUES
            (10, now() - interval '2 hours', NULL, 'c1', 'p1', 't1'),
            (11, now() - interval '5 minutes', NULL, NULL, NULL, NULL),
            (12, now() - interval '1 day', now() - interval '20 hours', 'c1', NULL, NULL);
        INSERT INTO {rules} (tarefa_id, responsavel_id, tempo_estimado_dia, data_inicio) VALUES
            ('t1', 500, 4, '2023-01-01'),
            ('t1', 500, 8, '2024-03-05'),
            ('t1', 10, 1, '2024-06-01'),
            ('t1', NULL, 2, '2024-06-01');
        INSERT INTO {members} VALUES (500, 10, 'Ana Souza');
        INSERT INTO {users} VALUES (10, 'https://cdn.example/ana.png'), (11, NULL);
        INSERT INTO {clients} VALUES ('c1', 'Padaria Central');
        INSERT INTO {products} VALUES ('p1', 'BPO Financeiro');
        INSERT INTO {tasks} VALUES ('t1', 'Conciliação bancária');
        "#,
        records = db.table("registro_tempo"),
        rules = db.table("tempo_estimado_regra"),
        members = db.table("membro"),
        users = db.table("usuarios"),
        clients = db.table("cp_cliente"),
        products = db.table("cp_produto"),
        tasks = db.table("cp_tarefa"),
    );
    sqlx::raw_sql(&sql).execute(db.pool()).await.expect("seed rows");
}

#[tokio::test]
async fn test_active_records_exclude_finished_sessions() {
    let Some(db) = test_db("active").await else {
        return;
    };
    seed(&db).await;

    let records = db.active_time_records().await.unwrap();
    let mut users: Vec<i64> = records.iter().filter_map(|r| r.user_id).collect();
    users.sort();
    assert_eq!(users, vec![10, 11]);
    assert!(records.iter().all(|r| r.end_time.is_none()));

    drop_schema(&db).await;
}

#[tokio::test]
async fn test_active_record_without_user_is_kept() {
    let Some(db) = test_db("nulluser").await else {
        return;
    };
    seed(&db).await;
    let sql = format!(
        "INSERT INTO {} (usuario_id, data_inicio) VALUES (NULL, now() - interval '3 hours')",
        db.table("registro_tempo")
    );
    sqlx::raw_sql(&sql).execute(db.pool()).await.expect("insert orphan");

    let aggregator = LiveSessionAggregator::new(Arc::new(db.clone()), AggregatorOptions::default());
    let sessions = aggregator.active_sessions().await.unwrap();

    assert_eq!(sessions.len(), 3);
    assert_eq!(sessions[0].user_id, None);
    assert_eq!(sessions[0].member_id, 0);
    assert_eq!(sessions[0].member_name, "Usuário Desconhecido");
    assert_eq!(sessions[1].member_name, "Ana Souza");

    drop_schema(&db).await;
}

#[tokio::test]
async fn test_estimation_rules_skip_rows_without_responsible() {
    let Some(db) = test_db("rules").await else {
        return;
    };
    seed(&db).await;

    let rules = db.estimation_rules(&["t1".to_string()]).await.unwrap();
    assert_eq!(rules.len(), 3);
    assert_eq!(rules[0].start_date.as_deref(), Some("2023-01-01"));
    assert_eq!(rules[1].estimated_value, Some(8.0));

    drop_schema(&db).await;
}

#[tokio::test]
async fn test_aggregator_over_postgres() {
    let Some(db) = test_db("aggregate").await else {
        return;
    };
    seed(&db).await;

    let aggregator = LiveSessionAggregator::new(Arc::new(db.clone()), AggregatorOptions::default());
    let sessions = aggregator.active_sessions().await.unwrap();

    assert_eq!(sessions.len(), 2);
    let first = &sessions[0];
    assert_eq!(first.user_id, Some(10));
    assert_eq!(first.member_id, 500);
    assert_eq!(first.member_name, "Ana Souza");
    assert_eq!(first.client_name.as_deref(), Some("Padaria Central"));
    assert_eq!(first.product_name.as_deref(), Some("BPO Financeiro"));
    assert_eq!(first.task_name.as_deref(), Some("Conciliação bancária"));
    assert_eq!(first.estimated_formatted.as_deref(), Some("8h"));
    assert_eq!(first.estimated_date_formatted.as_deref(), Some("05/03/2024"));
    assert!(first.elapsed_ms >= 2 * 3_600_000);

    let second = &sessions[1];
    assert_eq!(second.member_id, 0);
    assert_eq!(second.member_name, "Usuário Desconhecido");
    assert_eq!(second.photo, None);

    drop_schema(&db).await;
}

#[tokio::test]
async fn test_ping() {
    let Some(db) = test_db("ping").await else {
        return;
    };
    db.ping().await.unwrap();
    drop_schema(&db).await;
}
