//! SQL scripts bundled with the binary
//!
//! Migration and seed scripts are plain multi-statement SQL files. SQLite
//! executes one statement per query, so scripts are split before running.

/// Schema for invoices and attachments
pub const SCHEMA_SQL: &str = include_str!("../../migrations/001_create_invoices.sql");

/// Drops every table the schema creates
pub const RESET_SQL: &str = include_str!("../../seeds/reset.sql");

/// Sample rows loaded after a reset
pub const SEED_SQL: &str = include_str!("../../seeds/sample_invoices.sql");

/// Split a script into individual statements
///
/// Comment lines and trailing `--` comments are dropped. Statements must not
/// contain `;` or `--` inside string literals.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut cleaned_sql = String::new();
    for line in script.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("--") {
            continue;
        }
        let without_comments = match trimmed.find("--") {
            Some(comment_pos) => &trimmed[..comment_pos],
            None => trimmed,
        };
        cleaned_sql.push_str(without_comments.trim());
        cleaned_sql.push(' ');
    }

    cleaned_sql
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
