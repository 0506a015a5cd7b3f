//! Purchase orders sent to suppliers.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tunnel_core::money::round_dp;
use tunnel_core::validation::{list_len, max_len, min_decimal};
use tunnel_core::{round2, ArticleId, PurchaseOrderId, Result, SupplierId, TunnelError};
use tunnel_store::{NewPurchaseOrder, PurchaseOrderLine, Session, SupplierRow};

use super::{active_articles, flag, FlexBool};
use crate::state::WriteContext;

const MAX_COMMENT: usize = 1000;

/// Body of `POST /api/pedidos/crear`.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseOrderRequest {
    /// Supplier.
    pub pro_id: SupplierId,
    /// Free text.
    pub comentario: Option<String>,
    /// Print options.
    #[serde(default)]
    pub opciones: OrderOptions,
    /// Lines.
    #[serde(default)]
    pub articulos: Vec<OrderLineInput>,
}

/// Print options stored on the order header.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct OrderOptions {
    pub img: Option<FlexBool>,
    pub caracteristicas: Option<FlexBool>,
    pub desglosado: Option<FlexBool>,
    pub mostrar_precios: Option<FlexBool>,
    pub mostrar_clave_alterna: Option<FlexBool>,
}

/// One ordered article.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    /// Article.
    pub art_id: ArticleId,
    /// Quantity.
    pub cantidad: Decimal,
    /// Unit purchase price.
    #[serde(rename = "precioCompra")]
    pub precio_compra: Decimal,
}

/// Summary of the written order.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderSummary {
    /// New order id.
    pub ped_id: PurchaseOrderId,
    /// Order total.
    pub total: Decimal,
    /// Order date.
    pub fecha: NaiveDate,
    /// Number of lines.
    pub articulos: usize,
    /// Supplier name.
    pub proveedor: String,
    /// Lines written.
    pub detalles: Vec<PurchaseOrderLine>,
}

/// Result of an order creation.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseOrderOutcome {
    /// The order.
    pub pedido: PurchaseOrderSummary,
}

/// Load an active supplier.
pub(crate) async fn active_supplier(
    session: &mut dyn Session,
    pro_id: SupplierId,
) -> Result<SupplierRow> {
    let supplier = session
        .get_supplier(pro_id)
        .await?
        .ok_or(TunnelError::NotFound {
            entity: "Proveedor",
            id: pro_id.get(),
        })?;
    if supplier.status != 1 {
        return Err(TunnelError::conflict(format!(
            "El proveedor {pro_id} está inactivo"
        )));
    }
    Ok(supplier)
}

/// Create a purchase order with its lines.
pub async fn create_order(
    session: &mut dyn Session,
    ctx: &WriteContext,
    req: PurchaseOrderRequest,
) -> Result<PurchaseOrderOutcome> {
    max_len("comentario", req.comentario.as_deref(), MAX_COMMENT)?;
    list_len("articulos", &req.articulos, 1, usize::MAX)?;
    for (i, line) in req.articulos.iter().enumerate() {
        min_decimal(&format!("articulos.{i}.cantidad"), line.cantidad, dec!(0.0001))?;
        min_decimal(
            &format!("articulos.{i}.precioCompra"),
            line.precio_compra,
            Decimal::ZERO,
        )?;
    }
    let opciones = &req.opciones;
    let img = flag("opciones.img", opciones.img.as_ref(), false)?;
    let caracteristicas = flag(
        "opciones.caracteristicas",
        opciones.caracteristicas.as_ref(),
        false,
    )?;
    let desglosado = flag("opciones.desglosado", opciones.desglosado.as_ref(), false)?;
    let mostrar_precios = flag(
        "opciones.mostrarPrecios",
        opciones.mostrar_precios.as_ref(),
        false,
    )?;
    let mostrar_clave_alterna = flag(
        "opciones.mostrarClaveAlterna",
        opciones.mostrar_clave_alterna.as_ref(),
        false,
    )?;

    let supplier = active_supplier(session, req.pro_id).await?;
    let ids: Vec<ArticleId> = req.articulos.iter().map(|a| a.art_id).collect();
    let articles = active_articles(session, &ids).await?;

    let total = round2(
        req.articulos
            .iter()
            .map(|a| a.cantidad * a.precio_compra)
            .sum(),
    );
    let fecha = ctx.today();

    let ped_id = session
        .insert_purchase_order(NewPurchaseOrder {
            fecha,
            total,
            img,
            caracteristicas,
            desglosado,
            mostrar_precios,
            mostrar_clave_alterna,
            comentario: req.comentario.clone().unwrap_or_default(),
            usu_id: ctx.defaults.system_usu_id,
            pro_id: supplier.pro_id,
        })
        .await?;
    debug!(%ped_id, pro_id = %supplier.pro_id, %total, "Pedido insertado");

    let mut detalles = Vec::with_capacity(req.articulos.len());
    for (orden, input) in (1..).zip(&req.articulos) {
        let article = &articles[&input.art_id];
        let cantidad = round_dp(input.cantidad, 4);
        let precio_compra = round_dp(input.precio_compra, 6);
        let line = PurchaseOrderLine {
            ped_id,
            art_id: input.art_id,
            clave: article.clave.clone(),
            descripcion: article.descripcion.clone(),
            cantidad,
            unidad: article.unidad_compra.clone(),
            precio_compra,
            importe_compra: round2(cantidad * precio_compra),
            orden,
        };
        session.insert_purchase_order_line(line.clone()).await?;
        detalles.push(line);
    }

    Ok(PurchaseOrderOutcome {
        pedido: PurchaseOrderSummary {
            ped_id,
            total,
            fecha,
            articulos: detalles.len(),
            proveedor: supplier.nombre,
            detalles,
        },
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
                t.add_supplier(4, "Aceros del Norte");
                t.add_article(7, "VAR-38", dec!(90)).unidad_compra = Some("TON".into());
                t.add_article(8, "ALM-12", dec!(15)).status = 0;
            })
            .await;
        store
    }

    fn request(body: serde_json::Value) -> PurchaseOrderRequest {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn test_order_written() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let out = create_order(
            session.as_mut(),
            &ctx(),
            request(serde_json::json!({
                "pro_id": 4,
                "opciones": {"img": 1, "mostrarPrecios": true},
                "articulos": [{"art_id": 7, "cantidad": 2.5, "precioCompra": 10.333}]
            })),
        )
        .await
        .unwrap();
        session.commit().await.unwrap();

        let pedido = &out.pedido;
        assert_eq!(pedido.total, dec!(25.83));
        assert_eq!(pedido.proveedor, "Aceros del Norte");
        assert_eq!(pedido.detalles[0].orden, 1);
        assert_eq!(pedido.detalles[0].unidad.as_deref(), Some("TON"));

        let tables = store.snapshot().await;
        let header = &tables.purchase_orders[&pedido.ped_id];
        assert!(header.img);
        assert!(header.mostrar_precios);
        assert!(!header.desglosado);
        assert_eq!(header.usu_id, tunnel_core::UserId::new(1));
    }

    #[tokio::test]
    async fn test_inactive_article_rejected() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let err = create_order(
            session.as_mut(),
            &ctx(),
            request(serde_json::json!({
                "pro_id": 4,
                "articulos": [
                    {"art_id": 7, "cantidad": 1, "precioCompra": 1},
                    {"art_id": 8, "cantidad": 1, "precioCompra": 1}
                ]
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Artículos inválidos o inactivos: 8");
    }

    #[tokio::test]
    async fn test_unknown_supplier() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let err = create_order(
            session.as_mut(),
            &ctx(),
            request(serde_json::json!({
                "pro_id": 9,
                "articulos": [{"art_id": 7, "cantidad": 1, "precioCompra": 1}]
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "not_found");
    }
}
