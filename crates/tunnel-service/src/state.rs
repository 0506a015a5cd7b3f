//! Application state.

use std::sync::Arc;

use chrono::NaiveDateTime;

use tunnel_backup::BackupRunner;
use tunnel_core::VoidRule;
use tunnel_store::Store;

use crate::config::{Defaults, ServiceConfig};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Backup jobs (optional).
    pub backups: Option<Arc<BackupRunner>>,
}

/// Per-request values every workflow reads.
#[derive(Debug, Clone, Copy)]
pub struct WriteContext {
    /// Fallback identifiers.
    pub defaults: Defaults,
    /// Balance rule.
    pub void_rule: VoidRule,
    /// Timestamp of the request, local server time.
    pub now: NaiveDateTime,
}

impl WriteContext {
    /// Today's date.
    #[must_use]
    pub fn today(&self) -> chrono::NaiveDate {
        self.now.date()
    }
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Self {
        let backups = match BackupRunner::new(config.backup.clone()) {
            Ok(runner) => {
                tracing::info!(
                    backup_dir = %config.backup.backup_dir.display(),
                    database = %config.backup.connection.database,
                    "Backups enabled"
                );
                Some(Arc::new(runner))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to create backup runner");
                None
            }
        };

        if backups.is_none() {
            tracing::warn!("Backups not configured - /api/backup will answer 503");
        }

        if config.api_key.is_none() {
            tracing::warn!("API_KEY not set - every /api request will be rejected");
        }

        Self {
            store,
            config,
            backups,
        }
    }

    /// Build the context for one write request.
    #[must_use]
    pub fn write_context(&self) -> WriteContext {
        WriteContext {
            defaults: self.config.defaults,
            void_rule: self.config.void_rule,
            now: chrono::Local::now().naive_local(),
        }
    }

    /// Check if backups are configured.
    #[must_use]
    pub fn has_backups(&self) -> bool {
        self.backups.is_some()
    }
}
