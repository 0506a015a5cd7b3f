//! Sale creation.
//!
//! A sale is written the way the ERP's own point of sale writes it: header,
//! lines, per-line and summary taxes, payment methods, stock decrement,
//! an optional credit account and applied credit notes.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tunnel_core::pricing::SaleCosting;
use tunnel_core::validation::{date, datetime, list_len, min_decimal, status_flag};
use tunnel_core::{
    amount_to_words, round2, ArticleId, CashDrawerId, ClientId, CreditId, CreditNoteId,
    CurrencyId, Result, SaleId, TaxId, TunnelError, UserId, VendorId,
};
use tunnel_store::schema::DEFAULT_UNIT;
use tunnel_store::{
    NewCredit, NewSale, NewSaleCreditNote, NewSaleLine, NewSaleLineTax, NewSalePayment,
    NewSaleTax, Session,
};

use super::{active_articles, active_client};
use crate::state::WriteContext;

const MAX_LINES: usize = 1000;
const DEFAULT_DECIMALS: i32 = 2;

// ============================================================================
// Request
// ============================================================================

/// Body of `POST /api/sicar/ventas/store`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleRequest {
    /// Header.
    pub venta: SaleHeaderInput,
    /// Lines.
    #[serde(default)]
    pub detalles: Vec<SaleLineInput>,
    /// Taxes per line.
    #[serde(default, rename = "detallesImpuestos")]
    pub detalles_impuestos: Vec<SaleLineTaxInput>,
    /// Tax summary.
    #[serde(default)]
    pub impuestos: Vec<SaleTaxInput>,
    /// Payment methods.
    #[serde(default, rename = "formasPago")]
    pub formas_pago: Vec<SalePaymentInput>,
    /// Credit account opened by the sale.
    #[serde(rename = "creditoCliente")]
    pub credito_cliente: Option<SaleCreditInput>,
    /// Credit notes applied.
    #[serde(default, rename = "notasCredito")]
    pub notas_credito: Vec<SaleNoteInput>,
}

/// Sale header.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct SaleHeaderInput {
    /// `Y-m-d H:i:s`.
    pub fecha: String,
    pub subtotal: Decimal,
    pub descuento: Option<Decimal>,
    pub total: Decimal,
    #[serde(rename = "cli_id")]
    pub cli_id: ClientId,
    #[serde(rename = "usu_id")]
    pub usu_id: UserId,
    #[serde(rename = "suc_id")]
    pub suc_id: i64,
    pub status: i32,
    pub cambio: Option<Decimal>,
    pub comentario: Option<String>,
    #[serde(rename = "caj_id")]
    pub caj_id: Option<CashDrawerId>,
    #[serde(rename = "mon_id")]
    pub mon_id: Option<CurrencyId>,
    #[serde(rename = "vnd_id")]
    pub vnd_id: Option<VendorId>,
    pub tipo_cambio: Option<Decimal>,
}

/// Sale line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct SaleLineInput {
    #[serde(rename = "art_id")]
    pub art_id: ArticleId,
    pub clave: Option<String>,
    pub descripcion: Option<String>,
    pub cantidad: Decimal,
    pub unidad: Option<String>,
    pub precio_sin: Decimal,
    pub precio_con: Decimal,
    pub importe_sin: Decimal,
    pub importe_con: Decimal,
    #[serde(default)]
    pub precio_compra: Decimal,
    pub orden: Option<i32>,
    pub desc_porcentaje: Option<Decimal>,
    pub desc_total: Option<Decimal>,
}

/// Tax applied to one line.
#[derive(Debug, Clone, Deserialize)]
#[allow(missing_docs)]
pub struct SaleLineTaxInput {
    pub art_id: ArticleId,
    pub imp_id: TaxId,
    pub base: Decimal,
    pub tasa: Decimal,
    pub importe: Decimal,
}

/// Tax total for the sale.
#[derive(Debug, Clone, Deserialize)]
#[allow(missing_docs)]
pub struct SaleTaxInput {
    pub imp_id: TaxId,
    pub base: Decimal,
    pub importe: Decimal,
}

/// One payment method.
#[derive(Debug, Clone, Deserialize)]
#[allow(missing_docs)]
pub struct SalePaymentInput {
    pub tpa_id: i32,
    pub importe: Decimal,
}

/// Credit account created with the sale.
#[derive(Debug, Clone, Deserialize)]
#[allow(missing_docs)]
pub struct SaleCreditInput {
    #[serde(rename = "fechaLimite")]
    pub fecha_limite: String,
    pub total: Decimal,
    pub comentario: Option<String>,
    pub status: Option<i32>,
}

/// Credit note applied to the sale.
#[derive(Debug, Clone, Deserialize)]
#[allow(missing_docs)]
pub struct SaleNoteInput {
    pub ncr_id: CreditNoteId,
    pub importe: Decimal,
}

/// Result of a sale creation.
#[derive(Debug, Clone, Serialize)]
pub struct SaleOutcome {
    /// New sale id.
    pub ven_id: SaleId,
    /// Credit account opened, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ccl_id: Option<CreditId>,
    /// Total in words.
    pub letra: String,
    /// Number of lines written.
    pub articulos: usize,
}

// ============================================================================
// Workflow
// ============================================================================

fn validate(req: &SaleRequest) -> Result<chrono::NaiveDateTime> {
    let fecha = datetime("venta.fecha", &req.venta.fecha)?;
    status_flag("venta.status", req.venta.status)?;
    min_decimal("venta.subtotal", req.venta.subtotal, Decimal::ZERO)?;
    min_decimal("venta.total", req.venta.total, Decimal::ZERO)?;
    list_len("detalles", &req.detalles, 1, MAX_LINES)?;
    list_len("formasPago", &req.formas_pago, 1, MAX_LINES)?;

    for (i, line) in req.detalles.iter().enumerate() {
        min_decimal(&format!("detalles.{i}.cantidad"), line.cantidad, dec!(0.0001))?;
        min_decimal(&format!("detalles.{i}.precioCon"), line.precio_con, Decimal::ZERO)?;
        min_decimal(&format!("detalles.{i}.precioCompra"), line.precio_compra, Decimal::ZERO)?;
    }
    for (i, pago) in req.formas_pago.iter().enumerate() {
        min_decimal(&format!("formasPago.{i}.importe"), pago.importe, Decimal::ZERO)?;
    }
    if let Some(credito) = &req.credito_cliente {
        date("creditoCliente.fechaLimite", &credito.fecha_limite)?;
        min_decimal("creditoCliente.total", credito.total, Decimal::ZERO)?;
    }
    Ok(fecha)
}

/// Write a complete sale.
pub async fn create_sale(
    session: &mut dyn Session,
    ctx: &WriteContext,
    req: SaleRequest,
) -> Result<SaleOutcome> {
    let fecha = validate(&req)?;
    let venta = &req.venta;

    let client = active_client(session, venta.cli_id).await?;
    let ids: Vec<ArticleId> = req.detalles.iter().map(|d| d.art_id).collect();
    let articles = active_articles(session, &ids).await?;
    let conf = session.sales_config().await?;

    let costing = SaleCosting::compute(
        req.detalles.iter().map(|d| (d.precio_compra, d.cantidad)),
        venta.subtotal,
        venta.total,
    );
    let letra = amount_to_words(venta.total);

    let ven_id = session
        .insert_sale(NewSale {
            fecha,
            subtotal: round2(venta.subtotal),
            descuento: round2(venta.descuento.unwrap_or_default()),
            total: round2(venta.total),
            cambio: round2(venta.cambio.unwrap_or_default()),
            comentario: venta.comentario.clone().unwrap_or_default(),
            status: venta.status,
            caj_id: venta.caj_id.unwrap_or(ctx.defaults.caj_id),
            mon_id: venta.mon_id.unwrap_or(CurrencyId::new(1)),
            vnd_id: venta.vnd_id,
            letra: letra.clone(),
            total_compra: round2(costing.total_cost),
            total_utilidad: round2(costing.total_profit),
            subtotal_compra: round2(costing.subtotal_cost),
            subtotal_utilidad: round2(costing.subtotal_profit),
            mon_tipo_cambio: venta.tipo_cambio.unwrap_or(Decimal::ONE),
            decimales: conf.as_ref().map_or(DEFAULT_DECIMALS, |c| c.decimales),
        })
        .await?;
    debug!(%ven_id, cli_id = %client.cli_id, suc_id = venta.suc_id, usu_id = %venta.usu_id, "Venta insertada");

    for (i, line) in (1..).zip(&req.detalles) {
        let article = &articles[&line.art_id];
        session
            .insert_sale_line(NewSaleLine {
                ven_id,
                art_id: line.art_id,
                clave: line.clave.clone().unwrap_or_else(|| article.clave.clone()),
                descripcion: line
                    .descripcion
                    .clone()
                    .unwrap_or_else(|| article.descripcion.clone()),
                cantidad: line.cantidad,
                unidad: line
                    .unidad
                    .clone()
                    .or_else(|| article.unidad_venta.clone())
                    .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
                precio_sin: line.precio_sin,
                precio_con: line.precio_con,
                importe_sin: line.importe_sin,
                importe_con: line.importe_con,
                desc_porcentaje: line.desc_porcentaje.unwrap_or_default(),
                desc_total: line.desc_total.unwrap_or_default(),
                precio_compra: line.precio_compra,
                importe_compra: round2(line.precio_compra * line.cantidad),
                orden: line.orden.unwrap_or(i),
                det_imp: req.detalles_impuestos.iter().any(|t| t.art_id == line.art_id),
            })
            .await?;
    }

    for tax in &req.detalles_impuestos {
        let row = session
            .get_tax(tax.imp_id)
            .await?
            .ok_or(TunnelError::NotFound {
                entity: "Impuesto",
                id: tax.imp_id.get(),
            })?;
        session
            .insert_sale_line_tax(NewSaleLineTax {
                ven_id,
                art_id: tax.art_id,
                imp_id: tax.imp_id,
                nombre: row.nombre,
                impuesto: tax.tasa,
                total: tax.importe,
                tipo_factor: row.tipo_factor,
                aplica_iva: row.aplicar_iva,
            })
            .await?;
    }

    for (orden, tax) in (1..).zip(&req.impuestos) {
        session
            .insert_sale_tax(NewSaleTax {
                ven_id,
                imp_id: tax.imp_id,
                subtotal: tax.base,
                total: tax.importe,
                orden,
            })
            .await?;
    }

    for pago in &req.formas_pago {
        session
            .insert_sale_payment(NewSalePayment {
                ven_id,
                tpa_id: pago.tpa_id,
                total: pago.importe,
            })
            .await?;
    }

    let check_stock = conf.as_ref().is_some_and(|c| !c.vender_sin_inv);
    for line in &req.detalles {
        if check_stock {
            let existencia = session
                .get_article(line.art_id)
                .await?
                .map_or(Decimal::ZERO, |a| a.existencia);
            if line.cantidad > existencia {
                debug!(art_id = %line.art_id, %existencia, cantidad = %line.cantidad, "Existencia insuficiente");
                return Err(TunnelError::LimitExceeded {
                    what: "total solicitado",
                    limit_label: "la existencia del artículo",
                    limit: existencia,
                    requested: line.cantidad,
                });
            }
        }
        session.adjust_stock(line.art_id, -line.cantidad).await?;
    }

    let ccl_id = match &req.credito_cliente {
        Some(credito) => {
            let ccl_id = session
                .insert_credit(NewCredit {
                    cli_id: client.cli_id,
                    ven_id,
                    fecha_limite: date("creditoCliente.fechaLimite", &credito.fecha_limite)?,
                    total: round2(credito.total),
                    comentario: credito.comentario.clone().unwrap_or_default(),
                    status: credito.status.unwrap_or(1),
                })
                .await?;
            debug!(%ccl_id, %ven_id, "Crédito de venta insertado");
            Some(ccl_id)
        }
        None => None,
    };

    for nota in &req.notas_credito {
        session
            .insert_sale_credit_note(NewSaleCreditNote {
                ven_id,
                ncr_id: nota.ncr_id,
                total: nota.importe,
            })
            .await?;
    }

    Ok(SaleOutcome {
        ven_id,
        ccl_id,
        letra,
        articulos: req.detalles.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Defaults;
    use tunnel_core::VoidRule;
    use tunnel_store::{MemoryStore, SalesConfig, Store};

    fn ctx() -> WriteContext {
        WriteContext {
            defaults: Defaults::default(),
            void_rule: VoidRule::Group,
            now: chrono::Local::now().naive_local(),
        }
    }

    async fn store(vender_sin_inv: bool) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .seed(|t| {
                t.sales_config = Some(SalesConfig {
                    vender_sin_inv,
                    decimales: 2,
                    ..SalesConfig::default()
                });
                t.add_client(1, "Juan Pérez");
                t.add_article(7, "TOR-01", dec!(116.00)).existencia = dec!(3);
                t.add_tax(1, "IVA", dec!(16), &[7]);
            })
            .await;
        store
    }

    fn request(cantidad: f64) -> SaleRequest {
        serde_json::from_value(serde_json::json!({
            "venta": {
                "fecha": "2025-03-01 10:30:00",
                "subtotal": 200.0,
                "total": 232.0,
                "cli_id": 1,
                "usu_id": 1,
                "suc_id": 1,
                "status": 1
            },
            "detalles": [{
                "art_id": 7,
                "cantidad": cantidad,
                "precioSin": 100.0,
                "precioCon": 116.0,
                "importeSin": 200.0,
                "importeCon": 232.0,
                "precioCompra": 50.0
            }],
            "detallesImpuestos": [{"art_id": 7, "imp_id": 1, "base": 200.0, "tasa": 16.0, "importe": 32.0}],
            "impuestos": [{"imp_id": 1, "base": 200.0, "importe": 32.0}],
            "formasPago": [{"tpa_id": 1, "importe": 232.0}],
            "creditoCliente": {"fechaLimite": "2025-04-01", "total": 232.0}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_sale_writes_every_table() {
        let store = store(false).await;
        let mut session = store.begin().await.unwrap();
        let out = create_sale(session.as_mut(), &ctx(), request(2.0))
            .await
            .unwrap();
        session.commit().await.unwrap();

        assert_eq!(out.letra, "(DOSCIENTOS TREINTA Y DOS PESOS 00/100 MN)");
        let tables = store.snapshot().await;
        let sale = &tables.sales[&out.ven_id];
        assert_eq!(sale.total_compra, dec!(100.00));
        assert_eq!(sale.total_utilidad, dec!(132.00));
        assert_eq!(sale.caj_id, CashDrawerId::new(1));
        assert!(tables.sale_lines[0].det_imp);
        assert_eq!(tables.sale_line_taxes[0].nombre, "IVA");
        assert_eq!(tables.sale_taxes[0].orden, 1);
        assert_eq!(tables.sale_payments.len(), 1);
        assert_eq!(tables.articles[&ArticleId::new(7)].existencia, dec!(1));
        assert_eq!(tables.new_credits.len(), 1);
        assert!(out.ccl_id.is_some());
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let store = store(false).await;
        let mut session = store.begin().await.unwrap();
        let err = create_sale(session.as_mut(), &ctx(), request(5.0))
            .await
            .unwrap_err();
        drop(session);

        assert_eq!(err.code(), "limit_exceeded");
        assert!(err.to_string().ends_with("excede la existencia del artículo (3)"));
        let tables = store.snapshot().await;
        assert!(tables.sales.is_empty());
        assert_eq!(tables.articles[&ArticleId::new(7)].existencia, dec!(3));
    }

    #[tokio::test]
    async fn test_selling_without_stock_allowed() {
        let store = store(true).await;
        let mut session = store.begin().await.unwrap();
        create_sale(session.as_mut(), &ctx(), request(5.0))
            .await
            .unwrap();
        session.commit().await.unwrap();

        assert_eq!(
            store.snapshot().await.articles[&ArticleId::new(7)].existencia,
            dec!(-2)
        );
    }
}
