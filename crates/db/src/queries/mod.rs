// crates/db/src/queries/mod.rs
// Read queries against the back-office schema.

mod live;

/// Relations read by the live monitoring queries.
pub(crate) mod relations {
    pub const TIME_RECORDS: &str = "registro_tempo";
    pub const ESTIMATION_RULES: &str = "tempo_estimado_regra";
    pub const MEMBERS: &str = "membro";
    pub const USERS: &str = "usuarios";
    pub const CLIENTS: &str = "cp_cliente";
    pub const PRODUCTS: &str = "cp_produto";
    pub const TASKS: &str = "cp_tarefa";
}
