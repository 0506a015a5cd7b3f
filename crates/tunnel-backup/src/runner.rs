//! Backup job execution.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use chrono::Local;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, error, info, instrument, warn};

use crate::archive::{self, is_archive_name};
use crate::config::BackupConfig;
use crate::error::BackupError;

const USER_AGENT: &str = "TunnelCUSPI-Webhook/1.0";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A finished archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    /// Archive file name, prefixed with the job id.
    pub filename: String,
    /// Full path.
    pub path: PathBuf,
    /// Compressed size in bytes.
    pub size_bytes: u64,
    /// Uncompressed dump size in bytes.
    pub dump_bytes: u64,
}

/// Body posted to the caller's webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WebhookPayload {
    /// The archive is ready.
    Completed {
        /// Job id.
        job_id: String,
        /// Archive file name.
        filename: String,
        /// Compressed size in MiB, two decimals.
        filesize_mb: String,
        /// Public download link.
        download_url: String,
        /// When the archive stops being served.
        expires_at: String,
        /// Wall time of the job.
        total_time_seconds: u64,
        /// Completion time.
        timestamp: String,
    },
    /// The job failed.
    Failed {
        /// Job id.
        job_id: String,
        /// Failure message.
        error: String,
        /// Failure time.
        timestamp: String,
    },
}

/// Runs backup jobs against one database.
#[derive(Debug, Clone)]
pub struct BackupRunner {
    config: BackupConfig,
    http: reqwest::Client,
}

impl BackupRunner {
    /// Create a runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: BackupConfig) -> Result<Self, BackupError> {
        let http = reqwest::Client::builder()
            .timeout(config.webhook_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { config, http })
    }

    /// The runner's configuration.
    #[must_use]
    pub fn config(&self) -> &BackupConfig {
        &self.config
    }

    /// A fresh job id, `backup_<32 hex digits>`.
    #[must_use]
    pub fn new_job_id() -> String {
        format!("backup_{}", uuid::Uuid::new_v4().simple())
    }

    /// Run a job in the background and report to `webhook_url` when done.
    pub fn spawn(&self, job_id: String, webhook_url: String) -> tokio::task::JoinHandle<()> {
        let runner = self.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let payload = match runner.run(&job_id).await {
                Ok(artifact) => runner.completed_payload(&job_id, &artifact, started.elapsed()),
                Err(e) => {
                    error!(%job_id, error = %e, "Backup fallido");
                    WebhookPayload::Failed {
                        job_id: job_id.clone(),
                        error: e.to_string(),
                        timestamp: now_text(),
                    }
                }
            };
            if let Err(e) = runner.notify(&webhook_url, &payload).await {
                warn!(%job_id, error = %e, "Webhook no entregado");
            }
        })
    }

    /// Produce an archive: prune, dump, compress, rename.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails. The dump and any partial archive
    /// are removed before the error is returned.
    #[instrument(skip(self))]
    pub async fn run(&self, job_id: &str) -> Result<BackupArtifact, BackupError> {
        let dir = &self.config.backup_dir;
        tokio::fs::create_dir_all(dir).await?;

        archive::prune(dir, self.config.max_keep.saturating_sub(1)).await?;

        let stamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        let sql_path = dir.join(format!("sicar_backup_{stamp}.sql"));

        let dumped = self.dump(job_id, &sql_path).await;
        let dump_bytes = match dumped {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tokio::fs::remove_file(&sql_path).await;
                return Err(e);
            }
        };

        let gz_path = PathBuf::from(format!("{}.gz", sql_path.display()));
        if let Err(e) = compress(&sql_path, &gz_path).await {
            let _ = tokio::fs::remove_file(&gz_path).await;
            let _ = tokio::fs::remove_file(&sql_path).await;
            return Err(e);
        }
        tokio::fs::remove_file(&sql_path).await?;

        let filename = format!("{job_id}_sicar_backup_{stamp}.sql.gz");
        let path = dir.join(&filename);
        if let Err(e) = tokio::fs::rename(&gz_path, &path).await {
            let _ = tokio::fs::remove_file(&gz_path).await;
            return Err(e.into());
        }
        let size_bytes = tokio::fs::metadata(&path).await?.len();

        info!(%filename, dump_bytes, size_bytes, "Backup completado");
        Ok(BackupArtifact {
            filename,
            path,
            size_bytes,
            dump_bytes,
        })
    }

    /// Deliver a webhook payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the receiver answers with an error status.
    #[instrument(skip(self, payload))]
    pub async fn notify(&self, webhook_url: &str, payload: &WebhookPayload) -> Result<(), BackupError> {
        let response = self
            .http
            .post(webhook_url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        debug!(status = %response.status(), "Webhook entregado");
        Ok(())
    }

    /// Delete archives past their expiry. Returns the deleted names.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub async fn cleanup_expired(&self) -> Result<Vec<String>, BackupError> {
        let max_age = Duration::from_secs(u64::from(self.config.expiry_hours) * 3600);
        archive::remove_expired(&self.config.backup_dir, max_age).await
    }

    /// Path of a downloadable archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not an archive name or the file is missing.
    pub async fn resolve_download(&self, filename: &str) -> Result<PathBuf, BackupError> {
        if !is_archive_name(filename) {
            return Err(BackupError::InvalidFilename(filename.to_string()));
        }
        let path = self.config.backup_dir.join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(BackupError::NotFound(filename.to_string())),
        }
    }

    fn completed_payload(
        &self,
        job_id: &str,
        artifact: &BackupArtifact,
        elapsed: Duration,
    ) -> WebhookPayload {
        let expires = Local::now() + chrono::Duration::hours(i64::from(self.config.expiry_hours));
        WebhookPayload::Completed {
            job_id: job_id.to_string(),
            filename: artifact.filename.clone(),
            filesize_mb: megabytes(artifact.size_bytes),
            download_url: self.config.download_url(&artifact.filename),
            expires_at: expires.format(TIMESTAMP_FORMAT).to_string(),
            total_time_seconds: elapsed.as_secs(),
            timestamp: now_text(),
        }
    }

    /// Run mysqldump into `sql_path`. Returns the dump size.
    async fn dump(&self, job_id: &str, sql_path: &Path) -> Result<u64, BackupError> {
        let conn = &self.config.connection;
        let cnf_path = self.config.backup_dir.join(format!(".{job_id}.cnf"));
        write_private(&cnf_path, conn.defaults_file().as_bytes()).await?;

        let out = std::fs::File::create(sql_path)?;
        let mut command = Command::new(&self.config.mysqldump_path);
        command
            .arg(format!("--defaults-file={}", cnf_path.display()))
            .args(["--single-transaction", "--routines", "--triggers"])
            .arg(&conn.database)
            .stdout(Stdio::from(out))
            .stderr(Stdio::piped());

        debug!(
            mysqldump = %self.config.mysqldump_path.display(),
            host = %conn.host,
            database = %conn.database,
            "Ejecutando mysqldump"
        );

        let started = Instant::now();
        let result = match command.spawn() {
            Ok(child) => child.wait_with_output().await,
            Err(e) => Err(e),
        };
        let _ = tokio::fs::remove_file(&cnf_path).await;
        let output = result?;

        if !output.status.success() {
            return Err(BackupError::CommandFailed {
                exit_code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let size = match tokio::fs::metadata(sql_path).await {
            Ok(meta) => meta.len(),
            Err(_) => return Err(BackupError::MissingDump(sql_path.to_path_buf())),
        };
        if size == 0 {
            return Err(BackupError::EmptyDump(sql_path.to_path_buf()));
        }

        info!(
            size_mb = %megabytes(size),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "mysqldump ejecutado"
        );
        Ok(size)
    }
}

/// Gzip `src` into `dst` at maximum compression on a blocking thread.
async fn compress(src: &Path, dst: &Path) -> Result<(), BackupError> {
    let src = src.to_path_buf();
    let dst = dst.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<(), BackupError> {
        let mut input = std::io::BufReader::new(std::fs::File::open(&src)?);
        let output = std::fs::File::create(&dst)?;
        let mut encoder = GzEncoder::new(output, Compression::best());
        std::io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.flush()?;
        Ok(())
    })
    .await
    .map_err(|e| BackupError::Compression(e.to_string()))?
}

/// Write a file readable only by the owner. The mode is set at creation so
/// the contents are never visible to other users.
async fn write_private(path: &Path, contents: &[u8]) -> Result<(), BackupError> {
    let path = path.to_path_buf();
    let contents = contents.to_vec();
    tokio::task::spawn_blocking(move || -> Result<(), BackupError> {
        match std::fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path)?;
        file.write_all(&contents)?;
        file.flush()?;
        Ok(())
    })
    .await
    .map_err(|e| BackupError::Io(std::io::Error::other(e)))?
}

#[allow(clippy::cast_precision_loss)]
fn megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / (1024.0 * 1024.0))
}

fn now_text() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
