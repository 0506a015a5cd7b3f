//! Error types for backup jobs.

use std::path::PathBuf;

/// Errors that can occur while producing or serving a backup.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    /// Filesystem or process spawn failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// mysqldump exited with a non-zero code.
    #[error("mysqldump failed with return code {exit_code}: {stderr}")]
    CommandFailed {
        /// The exit code returned by the command.
        exit_code: i32,
        /// The stderr output from the command.
        stderr: String,
    },

    /// The dump file was not created.
    #[error("archivo backup no fue creado: {0}")]
    MissingDump(PathBuf),

    /// The dump file is empty.
    #[error("archivo backup está vacío: {0}")]
    EmptyDump(PathBuf),

    /// A requested file name is not a backup archive.
    #[error("nombre de archivo inválido: {0}")]
    InvalidFilename(String),

    /// A requested archive does not exist.
    #[error("archivo no encontrado: {0}")]
    NotFound(String),

    /// The connection settings are unusable.
    #[error("configuración inválida: {0}")]
    Config(String),

    /// The compression task panicked or was cancelled.
    #[error("compression task failed: {0}")]
    Compression(String),

    /// The webhook request could not be delivered.
    #[error("webhook error: {0}")]
    Webhook(#[from] reqwest::Error),
}
