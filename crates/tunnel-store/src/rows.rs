//! Row types read from and written to the SICAR schema.
//!
//! Field names follow the ERP column names so a row can be echoed back to
//! CUSPI as-is (the `insertados` blocks of the write endpoints).

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

use tunnel_core::{
    ArticleId, CashDrawerId, ClientGroupId, ClientId, CreditId, CreditNoteId, CurrencyId,
    PaymentGroupId, PaymentId, PurchaseOrderId, QuotationId, SaleId, SupplierId, TaxId,
    TaxRegimeId, UserId, VendorId,
};

/// Timestamps go back to CUSPI in the ERP's `Y-m-d H:i:s` text form.
fn erp_datetime<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format("%Y-%m-%d %H:%M:%S"))
}

// ============================================================================
// Credits and payments
// ============================================================================

/// `creditocliente` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditRow {
    /// Key.
    pub ccl_id: CreditId,
    /// Originating sale.
    pub ven_id: Option<SaleId>,
    /// Customer.
    pub cli_id: ClientId,
    /// Principal.
    pub total: Decimal,
    /// 1 open, 2 settled.
    pub status: i32,
    /// Due date.
    #[serde(rename = "fechaLimite")]
    pub fecha_limite: Option<NaiveDate>,
    /// Memo.
    pub comentario: Option<String>,
}

/// New `creditocliente` row created with a credit sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewCredit {
    /// Customer.
    pub cli_id: ClientId,
    /// Originating sale.
    pub ven_id: SaleId,
    /// Due date.
    #[serde(rename = "fechaLimite")]
    pub fecha_limite: NaiveDate,
    /// Principal.
    pub total: Decimal,
    /// Memo.
    pub comentario: String,
    /// Status code.
    pub status: i32,
}

/// `abonocliente` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRow {
    /// Key.
    pub acl_id: PaymentId,
    /// Payment date.
    pub fecha: NaiveDate,
    /// Amount.
    pub total: Decimal,
    /// Memo.
    pub comentario: String,
    /// 1 active, -1 voided.
    pub status: i32,
    /// Credit paid.
    pub ccl_id: CreditId,
    /// Payment method code.
    pub tpa_id: i32,
    /// Group, for multi-account legs.
    pub acp_id: Option<PaymentGroupId>,
}

/// Values for a new `abonocliente` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// Payment date.
    pub fecha: NaiveDate,
    /// Amount.
    pub total: Decimal,
    /// Memo.
    pub comentario: String,
    /// Credit paid.
    pub ccl_id: CreditId,
    /// Payment method code.
    pub tpa_id: i32,
    /// Group, for multi-account legs.
    pub acp_id: Option<PaymentGroupId>,
}

impl NewPayment {
    /// Attach the generated key. New payments are always active.
    #[must_use]
    pub fn into_row(self, acl_id: PaymentId) -> PaymentRow {
        PaymentRow {
            acl_id,
            fecha: self.fecha,
            total: self.total,
            comentario: self.comentario,
            status: 1,
            ccl_id: self.ccl_id,
            tpa_id: self.tpa_id,
            acp_id: self.acp_id,
        }
    }
}

/// `abonoclientepago` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentGroupRow {
    /// Key.
    pub acp_id: PaymentGroupId,
    /// Date.
    pub fecha: NaiveDate,
    /// Amount before it was split.
    pub total: Decimal,
    /// Memo.
    pub comentario: String,
}

/// `abonoclientetarjeta` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CardDetailRow {
    /// Payment.
    pub acl_id: PaymentId,
    /// 1 credit, 2 debit.
    pub tipo: i32,
}

/// `movimiento` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementRow {
    /// Key.
    pub mov_id: i64,
    /// Amount.
    pub total: Decimal,
    /// Memo.
    pub comentario: String,
    /// 1 inflow.
    pub tipo: i32,
    /// Status code.
    pub status: i32,
    /// Extended type, unused for payments.
    #[serde(rename = "tipoExt")]
    pub tipo_ext: Option<i32>,
    /// Drawer.
    pub caj_id: CashDrawerId,
    /// Payment method code.
    pub tpa_id: i32,
    /// Payment.
    pub acl_id: Option<PaymentId>,
}

/// Values for a new payment `movimiento` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    /// Amount.
    pub total: Decimal,
    /// Memo.
    pub comentario: String,
    /// Drawer.
    pub caj_id: CashDrawerId,
    /// Payment method code.
    pub tpa_id: i32,
    /// Payment.
    pub acl_id: PaymentId,
}

impl NewMovement {
    /// Attach the generated key.
    #[must_use]
    pub fn into_row(self, mov_id: i64) -> MovementRow {
        MovementRow {
            mov_id,
            total: self.total,
            comentario: self.comentario,
            tipo: crate::schema::MOVEMENT_INFLOW,
            status: 1,
            tipo_ext: None,
            caj_id: self.caj_id,
            tpa_id: self.tpa_id,
            acl_id: Some(self.acl_id),
        }
    }
}

/// `caja` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CashDrawerRow {
    /// Key.
    pub caj_id: CashDrawerId,
    /// Running total.
    pub total: Decimal,
}

/// Echo of a drawer increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CashDrawerChange {
    /// Drawer.
    pub caj_id: CashDrawerId,
    /// Total before.
    pub total_anterior: Decimal,
    /// Amount added.
    pub monto_agregado: Decimal,
    /// Total after.
    pub total_nuevo: Decimal,
}

/// `historial` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    /// Target row id.
    pub id: i64,
    /// Target table label.
    pub tabla: String,
    /// Operation code.
    pub movimiento: i32,
    /// Acting user.
    pub usu_id: UserId,
    /// Timestamp.
    #[serde(serialize_with = "erp_datetime")]
    pub fecha: NaiveDateTime,
}

/// A payment with every row attached to it, for delta-sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncedPayment {
    /// The payment.
    pub abonocliente: PaymentRow,
    /// Cash movement.
    pub movimiento: Option<MovementRow>,
    /// Audit entries for the payment.
    pub historial: Vec<HistoryRow>,
    /// Card detail.
    pub tarjeta: Option<CardDetailRow>,
    /// Parent group.
    pub grupo: Option<PaymentGroupRow>,
}

// ============================================================================
// Customers
// ============================================================================

/// Lookup view of a `cliente` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientRow {
    /// Key.
    pub cli_id: ClientId,
    /// Name.
    pub nombre: String,
    /// 1 active.
    pub status: i32,
    /// Price level 1..=5.
    pub precio: i32,
}

/// Values for a new `cliente` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct NewClient {
    pub nombre: String,
    pub representante: String,
    pub domicilio: String,
    #[serde(rename = "noExt")]
    pub no_ext: String,
    #[serde(rename = "noInt")]
    pub no_int: String,
    pub localidad: String,
    pub ciudad: String,
    pub estado: String,
    pub pais: String,
    #[serde(rename = "codigoPostal")]
    pub codigo_postal: String,
    pub colonia: String,
    pub rfc: String,
    pub curp: String,
    pub telefono: String,
    pub celular: String,
    pub mail: String,
    pub comentario: String,
    pub status: i32,
    pub limite: Decimal,
    pub precio: i32,
    #[serde(rename = "diasCredito")]
    pub dias_credito: i32,
    pub retener: bool,
    #[serde(rename = "desglosarIEPS")]
    pub desglosar_ieps: bool,
    pub notificar: bool,
    pub clave: Option<String>,
    #[serde(rename = "usoCfdi")]
    pub uso_cfdi: Option<String>,
    #[serde(rename = "idCIF")]
    pub id_cif: Option<String>,
    #[serde(rename = "eduNivel")]
    pub edu_nivel: Option<String>,
    #[serde(rename = "eduClave")]
    pub edu_clave: Option<String>,
    #[serde(rename = "eduRfc")]
    pub edu_rfc: Option<String>,
    #[serde(rename = "eduNombre")]
    pub edu_nombre: Option<String>,
    pub grc_id: Option<ClientGroupId>,
    pub rgf_id: Option<TaxRegimeId>,
}

impl NewClient {
    /// A customer with only a name, every other column at its ERP default.
    #[must_use]
    pub fn named(nombre: impl Into<String>) -> Self {
        Self {
            nombre: nombre.into(),
            representante: String::new(),
            domicilio: String::new(),
            no_ext: String::new(),
            no_int: String::new(),
            localidad: String::new(),
            ciudad: String::new(),
            estado: String::new(),
            pais: String::new(),
            codigo_postal: String::new(),
            colonia: String::new(),
            rfc: String::new(),
            curp: String::new(),
            telefono: String::new(),
            celular: String::new(),
            mail: String::new(),
            comentario: String::new(),
            status: 1,
            limite: Decimal::ZERO,
            precio: 1,
            dias_credito: 0,
            retener: false,
            desglosar_ieps: false,
            notificar: true,
            clave: None,
            uso_cfdi: None,
            id_cif: None,
            edu_nivel: None,
            edu_clave: None,
            edu_rfc: None,
            edu_nombre: None,
            grc_id: None,
            rgf_id: None,
        }
    }
}

// ============================================================================
// Configuration and reference data
// ============================================================================

/// The fields of `ventaconf` this bridge reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct SalesConfig {
    pub cot_header: String,
    pub cot_footer: String,
    pub cot_mos_img: i32,
    pub cot_mos_car: i32,
    pub cot_desglosar: i32,
    pub cot_descuento: i32,
    pub cot_peso: i32,
    pub cot_mos_firma: i32,
    pub cot_leyenda_impuestos: String,
    pub cot_mos_paridad: i32,
    pub cot_mos_detalle_paq: i32,
    pub cot_mos_clave_art: i32,
    pub cot_mos_pre_ant_desc: i32,
    /// Price level follows the customer.
    pub num_pre_cli: bool,
    /// Allow selling without stock.
    pub vender_sin_inv: bool,
    /// Decimals for sale documents.
    pub decimales: i32,
}

/// `moneda` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyRow {
    /// Key.
    pub mon_id: CurrencyId,
    /// Abbreviation.
    pub abr: String,
    /// Exchange rate.
    #[serde(rename = "tipoCambio")]
    pub tipo_cambio: Decimal,
}

/// `usuario` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRow {
    /// Key.
    pub usu_id: UserId,
    /// Name.
    pub nombre: String,
    /// 1 active.
    pub status: i32,
    /// Linked sales person.
    pub vnd_id: Option<VendorId>,
}

// ============================================================================
// Articles and taxes
// ============================================================================

/// `articulo` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct ArticleRow {
    pub art_id: ArticleId,
    pub clave: String,
    pub descripcion: String,
    pub status: i32,
    pub existencia: Decimal,
    #[serde(rename = "preCompraProm")]
    pub pre_compra_prom: Decimal,
    pub factor: Decimal,
    #[serde(rename = "iepsActivo")]
    pub ieps_activo: bool,
    #[serde(rename = "cuotaIeps")]
    pub cuota_ieps: Decimal,
    pub precio1: Decimal,
    pub precio2: Decimal,
    pub precio3: Decimal,
    pub precio4: Decimal,
    #[serde(rename = "unidadVenta")]
    pub unidad_venta: Option<String>,
    #[serde(rename = "unidadCompra")]
    pub unidad_compra: Option<String>,
    pub caracteristicas: Option<String>,
}

impl ArticleRow {
    /// Whether the article can be used in new documents.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == 1
    }

    /// Price levels 1..=4.
    #[must_use]
    pub fn price_levels(&self) -> [Decimal; 4] {
        [self.precio1, self.precio2, self.precio3, self.precio4]
    }
}

/// Compact article view returned by the catalog sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct ArticleSyncRow {
    pub art_id: ArticleId,
    pub clave: String,
    pub precio1: Decimal,
    pub precio2: Decimal,
    pub existencia: Decimal,
    pub status: i32,
}

/// `impuesto` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct TaxRow {
    pub imp_id: TaxId,
    pub nombre: String,
    pub porcentaje: Decimal,
    /// 1 percentage, 0 fixed amount.
    pub aplicacion: i32,
    #[serde(rename = "tipoFactor")]
    pub tipo_factor: Option<String>,
    #[serde(rename = "aplicarIVA")]
    pub aplicar_iva: Option<i32>,
    pub status: i32,
}

// ============================================================================
// Quotations
// ============================================================================

/// Values for a new `cotizacion` row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct NewQuotation {
    pub fecha: NaiveDate,
    pub header: String,
    pub footer: String,
    pub subtotal: Decimal,
    pub descuento: Option<Decimal>,
    pub total: Decimal,
    pub mon_abr: String,
    pub mon_tipo_cambio: Decimal,
    pub img: i32,
    pub caracteristicas: i32,
    pub desglosado: i32,
    pub mos_descuento: i32,
    pub mos_peso: i32,
    pub mos_firma: i32,
    pub leyenda_impuestos: String,
    pub mos_paridad: i32,
    pub mos_detalle_paq: i32,
    pub mos_clave_art: i32,
    pub mos_pre_ant_desc: i32,
    pub usu_id: UserId,
    pub cli_id: ClientId,
    pub mon_id: CurrencyId,
    pub vnd_id: Option<VendorId>,
}

/// Lookup view of a `cotizacion` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotationRow {
    /// Key.
    pub cot_id: QuotationId,
    /// Customer.
    pub cli_id: ClientId,
    /// 1 active.
    pub status: i32,
}

/// Values for a new `detallecot` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct NewQuotationLine {
    pub cot_id: QuotationId,
    pub art_id: ArticleId,
    pub clave: String,
    pub descripcion: String,
    pub cantidad: Decimal,
    pub unidad: String,
    #[serde(rename = "precioCompra")]
    pub precio_compra: Decimal,
    #[serde(rename = "precioSin")]
    pub precio_sin: Decimal,
    #[serde(rename = "precioCon")]
    pub precio_con: Decimal,
    #[serde(rename = "importeCompra")]
    pub importe_compra: Decimal,
    #[serde(rename = "importeSin")]
    pub importe_sin: Decimal,
    #[serde(rename = "importeCon")]
    pub importe_con: Decimal,
    pub diferencia: Decimal,
    pub utilidad: Decimal,
    pub caracteristicas: Option<String>,
    pub orden: i32,
}

/// Quotation joined with customer, user, sales person and currency names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct QuotationView {
    pub cot_id: QuotationId,
    pub fecha: NaiveDate,
    pub header: String,
    pub footer: String,
    pub subtotal: Decimal,
    pub descuento: Option<Decimal>,
    pub total: Decimal,
    pub status: i32,
    pub cliente: String,
    pub cli_id: ClientId,
    pub usuario: String,
    pub usu_id: UserId,
    pub vendedor: Option<String>,
    pub vnd_id: Option<VendorId>,
    pub moneda: Option<String>,
    pub mon_id: Option<CurrencyId>,
}

// ============================================================================
// Sales
// ============================================================================

/// Values for a new `venta` row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct NewSale {
    pub fecha: NaiveDateTime,
    pub subtotal: Decimal,
    pub descuento: Decimal,
    pub total: Decimal,
    pub cambio: Decimal,
    pub comentario: String,
    pub status: i32,
    pub caj_id: CashDrawerId,
    pub mon_id: CurrencyId,
    pub vnd_id: Option<VendorId>,
    pub letra: String,
    pub total_compra: Decimal,
    pub total_utilidad: Decimal,
    pub subtotal_compra: Decimal,
    pub subtotal_utilidad: Decimal,
    pub mon_tipo_cambio: Decimal,
    pub decimales: i32,
}

/// Values for a new `detallev` row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct NewSaleLine {
    pub ven_id: SaleId,
    pub art_id: ArticleId,
    pub clave: String,
    pub descripcion: String,
    pub cantidad: Decimal,
    pub unidad: String,
    pub precio_sin: Decimal,
    pub precio_con: Decimal,
    pub importe_sin: Decimal,
    pub importe_con: Decimal,
    pub desc_porcentaje: Decimal,
    pub desc_total: Decimal,
    pub precio_compra: Decimal,
    pub importe_compra: Decimal,
    pub orden: i32,
    /// Line taxes were sent with the sale.
    pub det_imp: bool,
}

/// Values for a new `detallevimpuesto` row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct NewSaleLineTax {
    pub ven_id: SaleId,
    pub art_id: ArticleId,
    pub imp_id: TaxId,
    pub nombre: String,
    /// Rate applied.
    pub impuesto: Decimal,
    pub total: Decimal,
    pub tipo_factor: Option<String>,
    pub aplica_iva: Option<i32>,
}

/// Values for a new `ventaimp` row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct NewSaleTax {
    pub ven_id: SaleId,
    pub imp_id: TaxId,
    pub subtotal: Decimal,
    pub total: Decimal,
    pub orden: i32,
}

/// Values for a new `ventatipopago` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSalePayment {
    /// Sale.
    pub ven_id: SaleId,
    /// Payment method code.
    pub tpa_id: i32,
    /// Amount.
    pub total: Decimal,
}

/// Values for a new `ventanotacredito` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSaleCreditNote {
    /// Sale.
    pub ven_id: SaleId,
    /// Credit note.
    pub ncr_id: CreditNoteId,
    /// Amount applied.
    pub total: Decimal,
}

// ============================================================================
// Suppliers and purchase orders
// ============================================================================

/// `proveedor` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierRow {
    /// Key.
    pub pro_id: SupplierId,
    /// Name.
    pub nombre: String,
    /// Short name.
    pub alias: Option<String>,
    /// 1 active.
    pub status: i32,
}

/// Values for a new `pedido` row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct NewPurchaseOrder {
    pub fecha: NaiveDate,
    pub total: Decimal,
    pub img: bool,
    pub caracteristicas: bool,
    pub desglosado: bool,
    pub mostrar_precios: bool,
    pub mostrar_clave_alterna: bool,
    pub comentario: String,
    pub usu_id: UserId,
    pub pro_id: SupplierId,
}

/// `detalleped` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct PurchaseOrderLine {
    pub ped_id: PurchaseOrderId,
    pub art_id: ArticleId,
    pub clave: String,
    pub descripcion: String,
    pub cantidad: Decimal,
    pub unidad: Option<String>,
    #[serde(rename = "precioCompra")]
    pub precio_compra: Decimal,
    #[serde(rename = "importeCompra")]
    pub importe_compra: Decimal,
    pub orden: i32,
}

/// `proveedorarticulo` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplierArticle {
    /// Supplier.
    pub pro_id: SupplierId,
    /// Article.
    pub art_id: ArticleId,
    /// Supplier's own article code.
    pub clave_proveedor: String,
    /// Purchase price.
    pub precio_compra: Decimal,
    /// Last change.
    pub fecha: NaiveDateTime,
}

/// Whether an upsert changed an existing row or created one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UpsertOutcome {
    /// Existing row updated.
    Update,
    /// New row inserted.
    Insert,
}

/// Supplier-article link joined with article and supplier names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(missing_docs)]
pub struct SupplierArticleView {
    pub pro_id: SupplierId,
    pub art_id: ArticleId,
    #[serde(rename = "claveProveedor")]
    pub clave_proveedor: String,
    #[serde(rename = "precioCompra")]
    pub precio_compra: Decimal,
    #[serde(serialize_with = "erp_datetime")]
    pub fecha: NaiveDateTime,
    pub articulo_clave: String,
    pub articulo_descripcion: String,
    pub proveedor_nombre: String,
    pub proveedor_alias: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_history_timestamp_uses_erp_format() {
        let row = HistoryRow {
            id: 10,
            tabla: "AbonoCliente".to_string(),
            movimiento: 0,
            usu_id: UserId::new(1),
            fecha: at(12, 45, 0),
        };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["fecha"], Value::from("2025-03-01 12:45:00"));
    }

    #[test]
    fn test_supplier_link_timestamp_uses_erp_format() {
        let view = SupplierArticleView {
            pro_id: SupplierId::new(4),
            art_id: ArticleId::new(7),
            clave_proveedor: "AN-77".to_string(),
            precio_compra: Decimal::new(4750, 2),
            fecha: at(9, 5, 7),
            articulo_clave: "TOR-01".to_string(),
            articulo_descripcion: "Tornillo".to_string(),
            proveedor_nombre: "Aceros del Norte".to_string(),
            proveedor_alias: None,
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["fecha"], Value::from("2025-03-01 09:05:07"));
    }
}
