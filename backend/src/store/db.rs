//! Invoice database operations
//!
//! Handles all relational store interactions for invoices and attachments.

use crate::error::AppError;
use crate::store::models::{
    Attachment, AttachmentId, Invoice, InvoiceId, NewAttachment, NewInvoice,
};
use crate::store::schema::{split_statements, RESET_SQL, SCHEMA_SQL, SEED_SQL};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

fn db_error(context: &str) -> impl FnOnce(sqlx::Error) -> AppError + '_ {
    move |e| AppError::Database(format!("{}: {}", context, e))
}

/// Database connection pool for invoice operations
pub struct InvoiceDb {
    pool: SqlitePool,
}

impl InvoiceDb {
    /// Initialize database connection pool and apply the schema
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    ///
    /// # Returns
    /// * `Ok(InvoiceDb)` if successful
    /// * `Err(AppError)` if connection or migration failed
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        if let Some(parent) = PathBuf::from(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Internal(anyhow::anyhow!("Failed to create db directory: {}", e))
                })?;
            }
        }

        // SQLite connection string format: sqlite:path/to/db.db
        let connection_string = if db_path.starts_with("sqlite:") {
            db_path.to_string()
        } else {
            format!("sqlite:{}", db_path)
        };

        let options = SqliteConnectOptions::from_str(&connection_string)
            .map_err(db_error("Invalid database path"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_error("Failed to connect to database"))?;

        info!("Connected to SQLite database at: {}", db_path);

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations...");
        let mut tx = self.pool.begin().await.map_err(db_error("Migration failed"))?;
        Self::run_script(&mut tx, SCHEMA_SQL).await?;
        tx.commit().await.map_err(db_error("Migration failed"))?;
        info!("Database migrations completed successfully");
        Ok(())
    }

    async fn run_script(tx: &mut Transaction<'_, Sqlite>, script: &str) -> Result<(), AppError> {
        for statement in split_statements(script) {
            sqlx::query(&statement)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    AppError::Database(format!(
                        "Script failed: {} - Statement: {}",
                        e,
                        statement.chars().take(100).collect::<String>()
                    ))
                })?;
        }
        Ok(())
    }

    /// Drop both tables, recreate the schema and load the sample rows
    ///
    /// Runs in one transaction, so a failure leaves the old data in place.
    pub async fn reseed(&self) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(db_error("Reseed failed"))?;
        Self::run_script(&mut tx, RESET_SQL).await?;
        Self::run_script(&mut tx, SCHEMA_SQL).await?;
        Self::run_script(&mut tx, SEED_SQL).await?;
        tx.commit().await.map_err(db_error("Reseed failed"))?;
        info!("Database reseeded");
        Ok(())
    }

    /// Get all invoices, most recent date first
    pub async fn list_invoices(&self) -> Result<Vec<Invoice>, AppError> {
        sqlx::query_as::<_, Invoice>("SELECT * FROM invoices ORDER BY date DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to fetch invoices"))
    }

    /// Get an invoice by ID
    pub async fn get_invoice(&self, id: InvoiceId) -> Result<Option<Invoice>, AppError> {
        sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch invoice"))
    }

    /// Insert an invoice and return the stored row
    pub async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<Invoice, AppError> {
        let row = sqlx::query_as::<_, Invoice>(
            "INSERT INTO invoices (provider, service, amount, status, date) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&invoice.provider)
        .bind(&invoice.service)
        .bind(invoice.amount)
        .bind(&invoice.status)
        .bind(&invoice.date)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create invoice"))?;

        debug!(invoice_id = row.id, "Created invoice");
        Ok(row)
    }

    /// Set the status column of an invoice
    ///
    /// # Returns
    /// Number of rows affected (0 when the invoice does not exist)
    pub async fn update_invoice_status(
        &self,
        id: InvoiceId,
        status: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE invoices SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to update invoice"))?;

        debug!(invoice_id = id, status = %status, "Updated invoice status");
        Ok(result.rows_affected())
    }

    /// Delete an invoice (cascades to attachments)
    pub async fn delete_invoice(&self, id: InvoiceId) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete invoice"))?;

        debug!(invoice_id = id, "Deleted invoice");
        Ok(result.rows_affected())
    }

    /// Get every attachment row
    pub async fn list_attachments(&self) -> Result<Vec<Attachment>, AppError> {
        sqlx::query_as::<_, Attachment>("SELECT * FROM attachments ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to fetch attachments"))
    }

    /// Get all attachments of one invoice
    pub async fn attachments_for_invoice(
        &self,
        invoice_id: InvoiceId,
    ) -> Result<Vec<Attachment>, AppError> {
        sqlx::query_as::<_, Attachment>(
            "SELECT * FROM attachments WHERE invoice_id = ? ORDER BY id ASC",
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch attachments"))
    }

    /// Get an attachment by ID
    pub async fn get_attachment(&self, id: AttachmentId) -> Result<Option<Attachment>, AppError> {
        sqlx::query_as::<_, Attachment>("SELECT * FROM attachments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch attachment"))
    }

    /// Insert an attachment row and return it
    pub async fn insert_attachment(
        &self,
        attachment: &NewAttachment,
    ) -> Result<Attachment, AppError> {
        let row = sqlx::query_as::<_, Attachment>(
            "INSERT INTO attachments (invoice_id, category, file_name, file_path, file_url) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(attachment.invoice_id)
        .bind(&attachment.category)
        .bind(&attachment.file_name)
        .bind(&attachment.file_path)
        .bind(&attachment.file_url)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create attachment"))?;

        debug!(
            attachment_id = row.id,
            invoice_id = row.invoice_id,
            "Created attachment"
        );
        Ok(row)
    }

    /// Delete an attachment row
    pub async fn delete_attachment(&self, id: AttachmentId) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete attachment"))?;

        debug!(attachment_id = id, "Deleted attachment");
        Ok(result.rows_affected())
    }
}
