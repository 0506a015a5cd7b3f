//! Supplier-article links (`proveedorarticulo`).
//!
//! The single form fails the request on the first problem. The batch form
//! runs every row in the same transaction and reports per-row failures next
//! to the successes, so a spreadsheet import can show which lines to fix.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tunnel_core::validation::{list_len, min_decimal};
use tunnel_core::{ArticleId, SupplierId, TunnelError};
use tunnel_store::{Session, StoreError, SupplierArticle, SupplierArticleView, UpsertOutcome};

use crate::state::WriteContext;

const MAX_ROWS: usize = 1000;

/// Why one link could not be written.
#[derive(Debug, thiserror::Error)]
pub enum AssignError {
    /// Missing or inactive article.
    #[error("Artículo no existe o está inactivo")]
    Article,

    /// Missing or inactive supplier.
    #[error("Proveedor no existe o está inactivo")]
    Supplier,

    /// Anything else, usually the database.
    #[error(transparent)]
    Other(#[from] TunnelError),
}

impl From<StoreError> for AssignError {
    fn from(err: StoreError) -> Self {
        Self::Other(err.into())
    }
}

impl AssignError {
    /// Code reported for a failed batch row.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Article => "ARTICULO_NO_EXISTE",
            Self::Supplier => "PROVEEDOR_NO_EXISTE",
            Self::Other(_) => "ERROR_SICAR",
        }
    }
}

impl From<AssignError> for TunnelError {
    fn from(err: AssignError) -> Self {
        match err {
            AssignError::Other(inner) => inner,
            other => TunnelError::conflict(other.to_string()),
        }
    }
}

// ============================================================================
// Requests and outcomes
// ============================================================================

/// Body of `POST /api/articulo/asignar-proveedor`.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignRequest {
    /// Article.
    pub art_id: ArticleId,
    /// Supplier.
    pub pro_id: SupplierId,
    /// Supplier's code for the article; NULL is stored as empty.
    #[serde(rename = "claveProveedor")]
    pub clave_proveedor: Option<String>,
    /// Purchase price.
    #[serde(rename = "precioCompra")]
    pub precio_compra: Decimal,
}

/// One row of a batch import.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchRow {
    /// Link values.
    #[serde(flatten)]
    pub link: AssignRequest,
    /// Spreadsheet row the values came from.
    pub fila_excel: i64,
}

/// Body of `POST /api/articulo/asignar-proveedor-masivo`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchAssignRequest {
    /// Rows to apply.
    #[serde(default)]
    pub asignaciones: Vec<BatchRow>,
}

/// A written link.
#[derive(Debug, Clone, Serialize)]
pub struct AssignedLink {
    /// The link joined with article and supplier names.
    #[serde(flatten)]
    pub link: SupplierArticleView,
    /// Whether the row was updated or inserted.
    pub operacion: UpsertOutcome,
}

/// A batch row that succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSuccess {
    /// The written link.
    #[serde(flatten)]
    pub assigned: AssignedLink,
    /// Spreadsheet row.
    pub fila_excel: i64,
}

/// A batch row that failed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    /// Article.
    pub art_id: ArticleId,
    /// Supplier.
    pub pro_id: SupplierId,
    /// Spreadsheet row.
    pub fila_excel: i64,
    /// Message.
    pub error: String,
    /// Machine-readable code.
    pub codigo_error: &'static str,
}

/// Batch counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct BatchStats {
    /// Rows seen.
    pub total_procesados: usize,
    /// Rows written.
    pub exitosos: usize,
    /// Rows rejected.
    pub errores: usize,
    /// Existing links updated.
    pub actualizaciones: usize,
    /// New links inserted.
    pub inserciones: usize,
}

/// Result of a batch import.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    /// Counters.
    pub stats: BatchStats,
    /// Successful rows.
    pub exitosos: Vec<BatchSuccess>,
    /// Failed rows.
    pub errores: Vec<BatchFailure>,
}

// ============================================================================
// Workflows
// ============================================================================

fn validate_price(field: &str, req: &AssignRequest) -> tunnel_core::Result<()> {
    min_decimal(field, req.precio_compra, Decimal::ZERO).map(|_| ())
}

async fn upsert_link(
    session: &mut dyn Session,
    ctx: &WriteContext,
    req: &AssignRequest,
) -> Result<AssignedLink, AssignError> {
    match session.get_article(req.art_id).await? {
        Some(article) if article.is_active() => {}
        _ => return Err(AssignError::Article),
    }
    match session.get_supplier(req.pro_id).await? {
        Some(supplier) if supplier.status == 1 => {}
        _ => return Err(AssignError::Supplier),
    }

    let operacion = session
        .upsert_supplier_article(SupplierArticle {
            pro_id: req.pro_id,
            art_id: req.art_id,
            clave_proveedor: req.clave_proveedor.clone().unwrap_or_default(),
            precio_compra: req.precio_compra,
            fecha: ctx.now,
        })
        .await?;
    debug!(art_id = %req.art_id, pro_id = %req.pro_id, ?operacion, "Relación proveedor-artículo escrita");

    let link = session
        .supplier_article_view(req.pro_id, req.art_id)
        .await?
        .ok_or_else(|| {
            TunnelError::Storage(format!(
                "proveedorarticulo ({}, {}) not readable after write",
                req.pro_id, req.art_id
            ))
        })?;

    Ok(AssignedLink { link, operacion })
}

/// Insert or update one supplier-article link.
pub async fn assign_supplier(
    session: &mut dyn Session,
    ctx: &WriteContext,
    req: AssignRequest,
) -> tunnel_core::Result<AssignedLink> {
    validate_price("precioCompra", &req)?;
    Ok(upsert_link(session, ctx, &req).await?)
}

/// Apply many links, collecting per-row failures.
pub async fn assign_suppliers_batch(
    session: &mut dyn Session,
    ctx: &WriteContext,
    req: BatchAssignRequest,
) -> tunnel_core::Result<BatchOutcome> {
    list_len("asignaciones", &req.asignaciones, 1, MAX_ROWS)?;
    for (i, row) in req.asignaciones.iter().enumerate() {
        validate_price(&format!("asignaciones.{i}.precioCompra"), &row.link)?;
    }

    let mut stats = BatchStats::default();
    let mut exitosos = Vec::new();
    let mut errores = Vec::new();

    for row in req.asignaciones {
        stats.total_procesados += 1;
        match upsert_link(session, ctx, &row.link).await {
            Ok(assigned) => {
                stats.exitosos += 1;
                match assigned.operacion {
                    UpsertOutcome::Update => stats.actualizaciones += 1,
                    UpsertOutcome::Insert => stats.inserciones += 1,
                }
                exitosos.push(BatchSuccess {
                    assigned,
                    fila_excel: row.fila_excel,
                });
            }
            Err(err) => {
                stats.errores += 1;
                warn!(
                    fila_excel = row.fila_excel,
                    art_id = %row.link.art_id,
                    pro_id = %row.link.pro_id,
                    error = %err,
                    "Fila rechazada"
                );
                errores.push(BatchFailure {
                    art_id: row.link.art_id,
                    pro_id: row.link.pro_id,
                    fila_excel: row.fila_excel,
                    error: err.to_string(),
                    codigo_error: err.code(),
                });
            }
        }
    }

    Ok(BatchOutcome {
        stats,
        exitosos,
        errores,
    })
}
