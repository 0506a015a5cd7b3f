//! Quotations: empty headers, single lines priced from the catalog, and
//! whole documents built by CUSPI.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tunnel_core::money::round_dp;
use tunnel_core::pricing::{
    price_with_taxes, price_without_taxes, select_price_level, unit_cost, ArticleTax, Ieps,
    QuotationLineAmounts,
};
use tunnel_core::validation::{date, list_len, min_decimal};
use tunnel_core::{
    round2, ArticleId, ClientId, CurrencyId, QuotationId, Result, TunnelError, UserId, VendorId,
};
use tunnel_store::schema::{audit, DEFAULT_CURRENCY, DEFAULT_UNIT};
use tunnel_store::{
    ArticleRow, CurrencyRow, HistoryRow, NewQuotation, NewQuotationLine, QuotationView,
    SalesConfig, Session, UserRow,
};

use super::{active_articles, active_client};
use crate::state::WriteContext;

const MAX_LINES: usize = 1000;

// ============================================================================
// Requests and outcomes
// ============================================================================

/// Body of `POST /api/cotizaciones/agregar-articulo`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddArticleRequest {
    /// Quotation.
    pub cot_id: QuotationId,
    /// Article to add.
    pub art_id: ArticleId,
    /// Quantity.
    pub cantidad: Decimal,
}

/// Body of `POST /api/cotizaciones/crear`.
#[derive(Debug, Clone, Deserialize)]
pub struct CuspiQuotationRequest {
    /// Document date, `Y-m-d`.
    pub fecha: String,
    /// Document total.
    pub total: Decimal,
    /// Document subtotal.
    pub subtotal: Decimal,
    /// Discount, written only when positive.
    pub descuento: Option<Decimal>,
    /// Customer.
    pub cli_id: ClientId,
    /// Acting user, defaults to the system user.
    pub usu_id: Option<UserId>,
    /// Currency, defaults to the national one.
    pub mon_id: Option<CurrencyId>,
    /// Sales person.
    pub vnd_id: Option<VendorId>,
    /// Lines.
    #[serde(default)]
    pub detalles: Vec<CuspiQuotationLine>,
}

/// One line of a CUSPI quotation.
#[derive(Debug, Clone, Deserialize)]
pub struct CuspiQuotationLine {
    /// Article.
    pub art_id: ArticleId,
    /// Quantity.
    pub cantidad: Decimal,
    /// Unit price with taxes.
    #[serde(rename = "precioCon")]
    pub precio_con: Decimal,
    /// Line amount with taxes.
    #[serde(rename = "importeCon")]
    pub importe_con: Decimal,
    /// Unit purchase price; computed from the catalog when absent.
    #[serde(rename = "precioCompra")]
    pub precio_compra: Option<Decimal>,
    /// Line purchase amount.
    #[serde(rename = "importeCompra")]
    pub importe_compra: Option<Decimal>,
}

/// Summary of a new empty quotation.
#[derive(Debug, Clone, Serialize)]
pub struct EmptyQuotation {
    /// Key.
    pub cot_id: QuotationId,
    /// Date.
    pub fecha: NaiveDate,
    /// Customer name.
    pub cliente: String,
    /// Total.
    pub total: Decimal,
    /// Subtotal.
    pub subtotal: Decimal,
    /// Currency abbreviation.
    pub moneda: String,
}

/// Result of `create_empty`.
#[derive(Debug, Clone, Serialize)]
pub struct EmptyQuotationOutcome {
    /// The quotation.
    pub cotizacion: EmptyQuotation,
}

/// The line added to a quotation.
#[derive(Debug, Clone, Serialize)]
pub struct AddedLine {
    /// Quotation.
    pub cot_id: QuotationId,
    /// Article.
    pub art_id: ArticleId,
    /// Article code.
    pub clave: String,
    /// Article description.
    pub descripcion: String,
    /// Quantity.
    pub cantidad: Decimal,
    /// Unit price with taxes.
    pub precio: Decimal,
    /// Line amount with taxes.
    pub importe: Decimal,
    /// Margin over purchase, percent.
    pub utilidad: Decimal,
    /// Line number.
    pub orden: i32,
}

/// Result of `add_article`.
#[derive(Debug, Clone, Serialize)]
pub struct AddArticleOutcome {
    /// The new line.
    pub detalle: AddedLine,
}

/// Result of `create_from_cuspi`.
#[derive(Debug, Clone, Serialize)]
pub struct CuspiQuotationOutcome {
    /// Key.
    pub cot_id: QuotationId,
    /// Joined header.
    pub cotizacion: QuotationView,
    /// Number of lines written.
    pub articulos_agregados: usize,
}

// ============================================================================
// Shared steps
// ============================================================================

fn header(
    conf: &SalesConfig,
    currency: &CurrencyRow,
    fecha: NaiveDate,
    usu_id: UserId,
    cli_id: ClientId,
    vnd_id: Option<VendorId>,
) -> NewQuotation {
    NewQuotation {
        fecha,
        header: conf.cot_header.clone(),
        footer: conf.cot_footer.clone(),
        subtotal: Decimal::ZERO,
        descuento: None,
        total: Decimal::ZERO,
        mon_abr: currency.abr.clone(),
        mon_tipo_cambio: currency.tipo_cambio,
        img: conf.cot_mos_img,
        caracteristicas: conf.cot_mos_car,
        desglosado: conf.cot_desglosar,
        mos_descuento: conf.cot_descuento,
        mos_peso: conf.cot_peso,
        mos_firma: conf.cot_mos_firma,
        leyenda_impuestos: conf.cot_leyenda_impuestos.clone(),
        mos_paridad: conf.cot_mos_paridad,
        mos_detalle_paq: conf.cot_mos_detalle_paq,
        mos_clave_art: conf.cot_mos_clave_art,
        mos_pre_ant_desc: conf.cot_mos_pre_ant_desc,
        usu_id,
        cli_id,
        mon_id: currency.mon_id,
        vnd_id,
    }
}

async fn active_user(session: &mut dyn Session, usu_id: UserId) -> Result<Option<UserRow>> {
    Ok(session.get_user(usu_id).await?.filter(|u| u.status == 1))
}

async fn system_user(session: &mut dyn Session, ctx: &WriteContext) -> Result<UserRow> {
    let usu_id = ctx.defaults.system_usu_id;
    active_user(session, usu_id).await?.ok_or_else(|| {
        TunnelError::conflict(format!(
            "El usuario del sistema ({usu_id}) no existe o está inactivo"
        ))
    })
}

async fn user_vendor(session: &mut dyn Session, user: &UserRow) -> Result<Option<VendorId>> {
    match user.vnd_id {
        Some(vnd_id) if session.vendor_active(vnd_id).await? => Ok(Some(vnd_id)),
        _ => Ok(None),
    }
}

async fn record_creation(
    session: &mut dyn Session,
    ctx: &WriteContext,
    cot_id: QuotationId,
    usu_id: UserId,
) -> Result<()> {
    session
        .insert_history(HistoryRow {
            id: cot_id.get(),
            tabla: audit::QUOTATION.to_string(),
            movimiento: audit::MOVE_CREATE,
            usu_id,
            fecha: ctx.now,
        })
        .await?;
    Ok(())
}

/// Price inputs for one quotation line.
struct LinePricing {
    /// Customer price level.
    level: i32,
    /// Whether the level follows the customer.
    per_client: bool,
    /// Price with taxes given by the caller.
    price_with: Option<Decimal>,
    /// Purchase price given by the caller.
    purchase: Option<Decimal>,
}

async fn priced_line(
    session: &mut dyn Session,
    cot_id: QuotationId,
    article: &ArticleRow,
    cantidad: Decimal,
    pricing: &LinePricing,
    orden: i32,
) -> Result<NewQuotationLine> {
    let taxes: Vec<ArticleTax> = session
        .article_taxes(article.art_id)
        .await?
        .iter()
        .map(|t| ArticleTax {
            rate: t.porcentaje,
            percentage: t.aplicacion == 1,
        })
        .collect();
    let ieps = Ieps {
        active: article.ieps_activo,
        quota: article.cuota_ieps,
    };

    let purchase = pricing.purchase.unwrap_or_else(|| {
        price_with_taxes(
            unit_cost(article.pre_compra_prom, article.factor),
            ieps,
            &taxes,
        )
    });
    let price_with = pricing.price_with.unwrap_or_else(|| {
        select_price_level(article.price_levels(), pricing.level, pricing.per_client)
    });
    let price_without = price_without_taxes(price_with, &taxes);

    let amounts = QuotationLineAmounts::compute(
        round_dp(cantidad, 3),
        round2(purchase),
        round2(price_with),
        round2(price_without),
    );

    Ok(NewQuotationLine {
        cot_id,
        art_id: article.art_id,
        clave: article.clave.clone(),
        descripcion: article.descripcion.clone(),
        cantidad: amounts.quantity,
        unidad: article
            .unidad_venta
            .clone()
            .unwrap_or_else(|| DEFAULT_UNIT.to_string()),
        precio_compra: amounts.purchase_price,
        precio_sin: amounts.price_without,
        precio_con: amounts.price_with,
        importe_compra: round2(amounts.purchase_amount),
        importe_sin: round2(amounts.amount_without),
        importe_con: round2(amounts.amount_with),
        diferencia: round2(amounts.difference),
        utilidad: round_dp(amounts.margin, 6),
        caracteristicas: article.caracteristicas.clone(),
        orden,
    })
}

// ============================================================================
// Workflows
// ============================================================================

/// Create a quotation with no lines for the walk-in customer.
pub async fn create_empty(
    session: &mut dyn Session,
    ctx: &WriteContext,
) -> Result<EmptyQuotationOutcome> {
    let conf = session
        .sales_config()
        .await?
        .ok_or_else(|| TunnelError::conflict("No existe configuración de ventas (ventaconf)"))?;
    let currency = session
        .default_currency()
        .await?
        .ok_or_else(|| TunnelError::conflict("No hay una moneda activa configurada"))?;
    let client = session
        .default_client()
        .await?
        .ok_or_else(|| TunnelError::conflict("No hay clientes activos"))?;
    let user = system_user(session, ctx).await?;
    let vnd_id = user_vendor(session, &user).await?;

    let fecha = ctx.today();
    let cot_id = session
        .insert_quotation(header(&conf, &currency, fecha, user.usu_id, client.cli_id, vnd_id))
        .await?;
    record_creation(session, ctx, cot_id, user.usu_id).await?;
    debug!(%cot_id, cli_id = %client.cli_id, "Cotización vacía creada");

    Ok(EmptyQuotationOutcome {
        cotizacion: EmptyQuotation {
            cot_id,
            fecha,
            cliente: client.nombre,
            total: Decimal::ZERO,
            subtotal: Decimal::ZERO,
            moneda: currency.abr,
        },
    })
}

/// Add one catalog article to an active quotation.
pub async fn add_article(
    session: &mut dyn Session,
    req: AddArticleRequest,
) -> Result<AddArticleOutcome> {
    let cantidad = min_decimal("cantidad", req.cantidad, dec!(0.001))?;

    let quotation = session
        .get_quotation(req.cot_id)
        .await?
        .ok_or(TunnelError::NotFound {
            entity: "Cotización",
            id: req.cot_id.get(),
        })?;
    if quotation.status != 1 {
        return Err(TunnelError::conflict(format!(
            "La cotización {} no está activa",
            req.cot_id
        )));
    }

    let article = session
        .get_article(req.art_id)
        .await?
        .ok_or(TunnelError::NotFound {
            entity: "Artículo",
            id: req.art_id.get(),
        })?;
    if !article.is_active() {
        return Err(TunnelError::conflict(format!(
            "El artículo {} está inactivo",
            req.art_id
        )));
    }
    if session.quotation_has_article(req.cot_id, req.art_id).await? {
        return Err(TunnelError::conflict(format!(
            "El artículo {} ya existe en la cotización {}",
            req.art_id, req.cot_id
        )));
    }

    let per_client = session
        .sales_config()
        .await?
        .is_some_and(|c| c.num_pre_cli);
    let level = session
        .get_client(quotation.cli_id)
        .await?
        .map_or(1, |c| c.precio);

    let orden = session.max_quotation_order(req.cot_id).await? + 1;
    let pricing = LinePricing {
        level,
        per_client,
        price_with: None,
        purchase: None,
    };
    let line = priced_line(session, req.cot_id, &article, cantidad, &pricing, orden).await?;
    let detalle = AddedLine {
        cot_id: line.cot_id,
        art_id: line.art_id,
        clave: line.clave.clone(),
        descripcion: line.descripcion.clone(),
        cantidad: line.cantidad,
        precio: line.precio_con,
        importe: line.importe_con,
        utilidad: line.utilidad,
        orden,
    };

    session.insert_quotation_line(line).await?;
    let total = session.refresh_quotation_totals(req.cot_id).await?;
    debug!(cot_id = %req.cot_id, art_id = %req.art_id, %total, "Artículo agregado a cotización");

    Ok(AddArticleOutcome { detalle })
}

/// Create a quotation from a document priced by CUSPI.
pub async fn create_from_cuspi(
    session: &mut dyn Session,
    ctx: &WriteContext,
    req: CuspiQuotationRequest,
) -> Result<CuspiQuotationOutcome> {
    let fecha = date("fecha", &req.fecha)?;
    let total = min_decimal("total", req.total, dec!(0.01))?;
    let subtotal = min_decimal("subtotal", req.subtotal, Decimal::ZERO)?;
    if let Some(descuento) = req.descuento {
        min_decimal("descuento", descuento, Decimal::ZERO)?;
    }
    list_len("detalles", &req.detalles, 1, MAX_LINES)?;

    let mut seen = HashSet::with_capacity(req.detalles.len());
    for (i, line) in req.detalles.iter().enumerate() {
        min_decimal(&format!("detalles.{i}.cantidad"), line.cantidad, dec!(0.001))?;
        min_decimal(&format!("detalles.{i}.precioCon"), line.precio_con, dec!(0.01))?;
        min_decimal(&format!("detalles.{i}.importeCon"), line.importe_con, dec!(0.01))?;
        if let Some(precio) = line.precio_compra {
            min_decimal(&format!("detalles.{i}.precioCompra"), precio, Decimal::ZERO)?;
        }
        if !seen.insert(line.art_id) {
            return Err(TunnelError::validation(format!(
                "El artículo {} está repetido en los detalles",
                line.art_id
            )));
        }
    }

    let client = active_client(session, req.cli_id).await?;
    let ids: Vec<ArticleId> = req.detalles.iter().map(|d| d.art_id).collect();
    let articles = active_articles(session, &ids).await?;

    let conf = session.sales_config().await?.unwrap_or_default();
    let currency = match (session.default_currency().await?, req.mon_id) {
        (Some(currency), None) => currency,
        (Some(currency), Some(mon_id)) if currency.mon_id == mon_id => currency,
        (_, Some(mon_id)) => CurrencyRow {
            mon_id,
            abr: DEFAULT_CURRENCY.to_string(),
            tipo_cambio: Decimal::ONE,
        },
        (None, None) => {
            return Err(TunnelError::conflict("No hay una moneda activa configurada"))
        }
    };

    let user = match req.usu_id {
        Some(usu_id) => match active_user(session, usu_id).await? {
            Some(user) => user,
            None => system_user(session, ctx).await?,
        },
        None => system_user(session, ctx).await?,
    };
    let vnd_id = match req.vnd_id {
        Some(vnd_id) if session.vendor_active(vnd_id).await? => Some(vnd_id),
        _ => user_vendor(session, &user).await?,
    };

    let cot_id = session
        .insert_quotation(header(&conf, &currency, fecha, user.usu_id, client.cli_id, vnd_id))
        .await?;

    for (orden, line) in (1..).zip(&req.detalles) {
        let pricing = LinePricing {
            level: client.precio,
            per_client: conf.num_pre_cli,
            price_with: Some(line.precio_con),
            purchase: line.precio_compra,
        };
        let article = &articles[&line.art_id];
        let row = priced_line(session, cot_id, article, line.cantidad, &pricing, orden).await?;
        session.insert_quotation_line(row).await?;
    }

    let descuento = req.descuento.filter(|d| *d > Decimal::ZERO).map(round2);
    session
        .set_quotation_totals(cot_id, round2(subtotal), descuento, round2(total))
        .await?;
    record_creation(session, ctx, cot_id, user.usu_id).await?;

    let cotizacion = session.quotation_view(cot_id).await?.ok_or_else(|| {
        TunnelError::Storage(format!("cotización {cot_id} no encontrada tras crearla"))
    })?;
    debug!(%cot_id, lineas = req.detalles.len(), "Cotización CUSPI creada");

    Ok(CuspiQuotationOutcome {
        cot_id,
        cotizacion,
        articulos_agregados: req.detalles.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Defaults;
    use tunnel_core::VoidRule;
    use tunnel_store::{MemoryStore, Store};

    fn ctx() -> WriteContext {
        WriteContext {
            defaults: Defaults::default(),
            void_rule: VoidRule::Group,
            now: chrono::Local::now().naive_local(),
        }
    }

    async fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .seed(|t| {
                t.sales_config = Some(SalesConfig {
                    cot_header: "Cotización".into(),
                    decimales: 2,
                    ..SalesConfig::default()
                });
                t.add_currency(1, "MXN", true);
                t.add_client(1, "Juan Pérez");
                t.add_client(2, "PUBLICO EN GENERAL");
                t.add_vendor(3, "Mostrador");
                t.add_user(1, "Sistema", Some(3));
                let article = t.add_article(7, "TOR-01", dec!(116.00));
                article.pre_compra_prom = dec!(50.00);
                t.add_tax(1, "IVA", dec!(16), &[7]);
                t.add_article(8, "TOR-02", dec!(10.00)).status = 0;
            })
            .await;
        store
    }

    #[tokio::test]
    async fn test_empty_quotation_uses_walk_in_client() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let out = create_empty(session.as_mut(), &ctx()).await.unwrap();
        session.commit().await.unwrap();

        assert_eq!(out.cotizacion.cliente, "PUBLICO EN GENERAL");
        assert_eq!(out.cotizacion.moneda, "MXN");
        let tables = store.snapshot().await;
        let record = &tables.quotations[&out.cotizacion.cot_id];
        assert_eq!(record.header.vnd_id, Some(VendorId::new(3)));
        assert_eq!(tables.history[0].movimiento, audit::MOVE_CREATE);
    }

    #[tokio::test]
    async fn test_empty_quotation_requires_sales_config() {
        let store = store().await;
        store.seed(|t| t.sales_config = None).await;
        let mut session = store.begin().await.unwrap();
        let err = create_empty(session.as_mut(), &ctx()).await.unwrap_err();
        assert_eq!(err.code(), "state_conflict");
    }

    #[tokio::test]
    async fn test_add_article_prices_line() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let cot_id = create_empty(session.as_mut(), &ctx())
            .await
            .unwrap()
            .cotizacion
            .cot_id;

        let out = add_article(
            session.as_mut(),
            AddArticleRequest {
                cot_id,
                art_id: ArticleId::new(7),
                cantidad: dec!(2),
            },
        )
        .await
        .unwrap();

        assert_eq!(out.detalle.orden, 1);
        assert_eq!(out.detalle.precio, dec!(116.00));
        assert_eq!(out.detalle.importe, dec!(232.00));
        // purchase 50 + 16% = 58 per unit, 116 for two
        assert_eq!(out.detalle.utilidad, dec!(100.000000));

        let again = add_article(
            session.as_mut(),
            AddArticleRequest {
                cot_id,
                art_id: ArticleId::new(7),
                cantidad: dec!(1),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(again.code(), "state_conflict");
    }

    fn cuspi_request(detalles: serde_json::Value) -> CuspiQuotationRequest {
        serde_json::from_value(serde_json::json!({
            "fecha": "2025-03-01",
            "total": 232.0,
            "subtotal": 200.0,
            "descuento": 0,
            "cli_id": 1,
            "detalles": detalles,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_cuspi_quotation_sets_given_totals() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let out = create_from_cuspi(
            session.as_mut(),
            &ctx(),
            cuspi_request(serde_json::json!([
                {"art_id": 7, "cantidad": 2, "precioCon": 116.0, "importeCon": 232.0}
            ])),
        )
        .await
        .unwrap();

        assert_eq!(out.articulos_agregados, 1);
        assert_eq!(out.cotizacion.total, dec!(232.00));
        assert_eq!(out.cotizacion.subtotal, dec!(200.00));
        assert_eq!(out.cotizacion.descuento, None);
        assert_eq!(out.cotizacion.cliente, "Juan Pérez");
        assert_eq!(out.cotizacion.usuario, "Sistema");
    }

    #[tokio::test]
    async fn test_cuspi_quotation_lists_invalid_articles() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let err = create_from_cuspi(
            session.as_mut(),
            &ctx(),
            cuspi_request(serde_json::json!([
                {"art_id": 8, "cantidad": 1, "precioCon": 10.0, "importeCon": 10.0},
                {"art_id": 99, "cantidad": 1, "precioCon": 10.0, "importeCon": 10.0}
            ])),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Artículos inválidos o inactivos: 8, 99");
    }
}
