use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Malformed value in '{table}.{field}': {detail}")]
    MalformedInput {
        table:  String,
        field:  String,
        detail: String,
    },

    #[error("Invalid configuration: {detail}")]
    Config { detail: String },

    #[error("Rule '{rule}' failed: {detail}")]
    RuleFault { rule: String, detail: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScoutError {
    pub fn malformed(table: &str, field: &str, detail: impl Into<String>) -> Self {
        Self::MalformedInput {
            table:  table.to_string(),
            field:  field.to_string(),
            detail: detail.into(),
        }
    }

    pub fn rule_fault(rule: &str, detail: impl Into<String>) -> Self {
        Self::RuleFault {
            rule:   rule.to_string(),
            detail: detail.into(),
        }
    }
}

pub type ScoutResult<T> = Result<T, ScoutError>;
