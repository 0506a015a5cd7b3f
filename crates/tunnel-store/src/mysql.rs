//! MySQL backend over the SICAR schema.
//!
//! Queries are runtime-checked (`sqlx::query` + `bind`); the schema is owned by
//! the ERP and is not available at compile time.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlPoolOptions, MySqlQueryResult, MySqlRow};
use sqlx::{MySql, MySqlPool, Row, Transaction};
use tracing::{debug, info};

use tunnel_core::{
    ArticleId, CashDrawerId, ClientGroupId, ClientId, CreditId, CurrencyId, NoteFact,
    PaymentFact, PaymentGroupId, PaymentId, PaymentStatus, PurchaseOrderId, QuotationId, SaleId,
    SupplierId, TaxId, TaxRegimeId, UserId, VendorId,
};

use crate::error::{Result, StoreError};
use crate::rows::{
    ArticleRow, ArticleSyncRow, CardDetailRow, CashDrawerChange, CashDrawerRow, ClientRow,
    CreditRow, CurrencyRow, HistoryRow, MovementRow, NewClient, NewCredit, NewMovement,
    NewPayment, NewPurchaseOrder, NewQuotation, NewQuotationLine, NewSale, NewSaleCreditNote,
    NewSaleLine, NewSaleLineTax, NewSalePayment, NewSaleTax, PaymentGroupRow, PaymentRow,
    PurchaseOrderLine, QuotationRow, QuotationView, SalesConfig, SupplierArticle,
    SupplierArticleView, SupplierRow, SyncedPayment, TaxRow, UpsertOutcome, UserRow,
};
use crate::schema::{audit, DEFAULT_CURRENCY};
use crate::{Session, Store};

/// Pool acquire timeout.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Store backed by the ERP database.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Connect a pool to `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(url)
            .await?;
        info!(max_connections, "MySQL pool ready");
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for MySqlStore {
    async fn begin(&self) -> Result<Box<dyn Session>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(MySqlSession { tx }))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "mysql"
    }
}

/// One transaction on the ERP database.
pub struct MySqlSession {
    tx: Transaction<'static, MySql>,
}

// ============================================================================
// Row decoding
// ============================================================================

fn inserted_id(result: &MySqlQueryResult) -> Result<i64> {
    i64::try_from(result.last_insert_id())
        .map_err(|_| StoreError::RowDecode(format!("insert id {} out of range", result.last_insert_id())))
}

fn flag(row: &MySqlRow, column: &str) -> Result<bool> {
    Ok(row.try_get::<Option<i64>, _>(column)?.unwrap_or(0) != 0)
}

fn credit_row(row: &MySqlRow) -> Result<CreditRow> {
    Ok(CreditRow {
        ccl_id: CreditId::new(row.try_get("ccl_id")?),
        ven_id: row.try_get::<Option<i64>, _>("ven_id")?.map(SaleId::new),
        cli_id: ClientId::new(row.try_get("cli_id")?),
        total: row.try_get("total")?,
        status: row.try_get("status")?,
        fecha_limite: row.try_get("fechaLimite")?,
        comentario: row.try_get("comentario")?,
    })
}

fn payment_row(row: &MySqlRow) -> Result<PaymentRow> {
    Ok(PaymentRow {
        acl_id: PaymentId::new(row.try_get("acl_id")?),
        fecha: row.try_get("fecha")?,
        total: row.try_get("total")?,
        comentario: row
            .try_get::<Option<String>, _>("comentario")?
            .unwrap_or_default(),
        status: row.try_get("status")?,
        ccl_id: CreditId::new(row.try_get("ccl_id")?),
        tpa_id: row.try_get("tpa_id")?,
        acp_id: row
            .try_get::<Option<i64>, _>("acp_id")?
            .map(PaymentGroupId::new),
    })
}

fn article_row(row: &MySqlRow) -> Result<ArticleRow> {
    Ok(ArticleRow {
        art_id: ArticleId::new(row.try_get("art_id")?),
        clave: row.try_get("clave")?,
        descripcion: row.try_get("descripcion")?,
        status: row.try_get("status")?,
        existencia: row.try_get("existencia")?,
        pre_compra_prom: row
            .try_get::<Option<Decimal>, _>("preCompraProm")?
            .unwrap_or_default(),
        factor: row.try_get::<Option<Decimal>, _>("factor")?.unwrap_or(Decimal::ONE),
        ieps_activo: flag(row, "iepsActivo")?,
        cuota_ieps: row
            .try_get::<Option<Decimal>, _>("cuotaIeps")?
            .unwrap_or_default(),
        precio1: row.try_get("precio1")?,
        precio2: row.try_get("precio2")?,
        precio3: row.try_get("precio3")?,
        precio4: row.try_get("precio4")?,
        unidad_venta: row.try_get("unidadVenta")?,
        unidad_compra: row.try_get("unidadCompra")?,
        caracteristicas: row.try_get("caracteristicas")?,
    })
}

fn tax_row(row: &MySqlRow) -> Result<TaxRow> {
    Ok(TaxRow {
        imp_id: TaxId::new(row.try_get("imp_id")?),
        nombre: row.try_get("nombre")?,
        porcentaje: row.try_get("porcentaje")?,
        aplicacion: row.try_get("aplicacion")?,
        tipo_factor: row.try_get("tipoFactor")?,
        aplicar_iva: row.try_get("aplicarIVA")?,
        status: row.try_get("status")?,
    })
}

fn client_row(row: &MySqlRow) -> Result<ClientRow> {
    Ok(ClientRow {
        cli_id: ClientId::new(row.try_get("cli_id")?),
        nombre: row.try_get("nombre")?,
        status: row.try_get("status")?,
        precio: row.try_get::<Option<i32>, _>("precio")?.unwrap_or(1),
    })
}

const CREDIT_COLUMNS: &str =
    "ccl_id, ven_id, cli_id, total, status, fechaLimite, comentario";

const ARTICLE_COLUMNS: &str = "art_id, clave, descripcion, status, existencia, preCompraProm, \
     factor, CAST(iepsActivo AS SIGNED) AS iepsActivo, cuotaIeps, precio1, precio2, precio3, \
     precio4, unidadVenta, unidadCompra, caracteristicas";

const TAX_COLUMNS: &str =
    "i.imp_id, i.nombre, i.porcentaje, i.aplicacion, i.tipoFactor, i.aplicarIVA, i.status";

impl MySqlSession {
    async fn credit_query(&mut self, ccl_id: CreditId, lock: bool) -> Result<Option<CreditRow>> {
        let sql = format!(
            "SELECT {CREDIT_COLUMNS} FROM creditocliente WHERE ccl_id = ?{}",
            if lock { " FOR UPDATE" } else { "" }
        );
        sqlx::query(&sql)
            .bind(ccl_id.get())
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(credit_row)
            .transpose()
    }

    async fn synced_payment(&mut self, payment: PaymentRow) -> Result<SyncedPayment> {
        let acl_id = payment.acl_id.get();

        let movimiento = sqlx::query(
            "SELECT mov_id, total, comentario, tipo, status, tipoExt, caj_id, tpa_id, acl_id \
             FROM movimiento WHERE acl_id = ? ORDER BY mov_id LIMIT 1",
        )
        .bind(acl_id)
        .fetch_optional(&mut *self.tx)
        .await?
        .map(|row| -> Result<MovementRow> {
            Ok(MovementRow {
                mov_id: row.try_get("mov_id")?,
                total: row.try_get("total")?,
                comentario: row
                    .try_get::<Option<String>, _>("comentario")?
                    .unwrap_or_default(),
                tipo: row.try_get("tipo")?,
                status: row.try_get("status")?,
                tipo_ext: row.try_get("tipoExt")?,
                caj_id: CashDrawerId::new(row.try_get("caj_id")?),
                tpa_id: row.try_get("tpa_id")?,
                acl_id: row.try_get::<Option<i64>, _>("acl_id")?.map(PaymentId::new),
            })
        })
        .transpose()?;

        let historial = sqlx::query(
            "SELECT id, tabla, movimiento, usu_id, fecha FROM historial \
             WHERE tabla = ? AND id = ? ORDER BY fecha",
        )
        .bind(audit::PAYMENT)
        .bind(acl_id)
        .fetch_all(&mut *self.tx)
        .await?
        .iter()
        .map(|row| -> Result<HistoryRow> {
            Ok(HistoryRow {
                id: row.try_get("id")?,
                tabla: row.try_get("tabla")?,
                movimiento: row.try_get("movimiento")?,
                usu_id: UserId::new(row.try_get("usu_id")?),
                fecha: row.try_get("fecha")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

        let tarjeta = sqlx::query("SELECT acl_id, tipo FROM abonoclientetarjeta WHERE acl_id = ?")
            .bind(acl_id)
            .fetch_optional(&mut *self.tx)
            .await?
            .map(|row| -> Result<CardDetailRow> {
                Ok(CardDetailRow {
                    acl_id: PaymentId::new(row.try_get("acl_id")?),
                    tipo: row.try_get("tipo")?,
                })
            })
            .transpose()?;

        let grupo = match payment.acp_id {
            Some(acp_id) => sqlx::query(
                "SELECT acp_id, fecha, total, comentario FROM abonoclientepago WHERE acp_id = ?",
            )
            .bind(acp_id.get())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(|row| -> Result<PaymentGroupRow> {
                Ok(PaymentGroupRow {
                    acp_id: PaymentGroupId::new(row.try_get("acp_id")?),
                    fecha: row.try_get("fecha")?,
                    total: row.try_get("total")?,
                    comentario: row
                        .try_get::<Option<String>, _>("comentario")?
                        .unwrap_or_default(),
                })
            })
            .transpose()?,
            None => None,
        };

        Ok(SyncedPayment {
            abonocliente: payment,
            movimiento,
            historial,
            tarjeta,
            grupo,
        })
    }
}

#[async_trait]
impl Session for MySqlSession {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    // Credits and payments
    // =========================================================================

    async fn lock_credit(&mut self, ccl_id: CreditId) -> Result<Option<CreditRow>> {
        self.credit_query(ccl_id, true).await
    }

    async fn get_credit(&mut self, ccl_id: CreditId) -> Result<Option<CreditRow>> {
        self.credit_query(ccl_id, false).await
    }

    async fn payment_facts(&mut self, ccl_id: CreditId) -> Result<Vec<PaymentFact>> {
        let rows = sqlx::query(
            "SELECT ac.total, ac.status, \
                EXISTS(SELECT 1 FROM recepcionpago rp \
                       WHERE rp.acl_id = ac.acl_id AND rp.status = -1) AS receipt_voided, \
                (ac.acp_id IS NOT NULL AND EXISTS( \
                    SELECT 1 FROM abonocliente ac2 \
                    JOIN recepcionpago rp2 ON rp2.acl_id = ac2.acl_id \
                    WHERE ac2.acp_id = ac.acp_id AND rp2.status = -1)) AS group_receipt_voided \
             FROM abonocliente ac WHERE ac.ccl_id = ? ORDER BY ac.acl_id",
        )
        .bind(ccl_id.get())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter()
            .map(|row| -> Result<PaymentFact> {
                Ok(PaymentFact {
                    amount: row.try_get("total")?,
                    status: PaymentStatus::from_code(row.try_get("status")?),
                    receipt_voided: flag(row, "receipt_voided")?,
                    group_receipt_voided: flag(row, "group_receipt_voided")?,
                })
            })
            .collect()
    }

    async fn note_facts(&mut self, ccl_id: CreditId) -> Result<Vec<NoteFact>> {
        let rows = sqlx::query("SELECT total, status FROM creditoclientenotcre WHERE ccl_id = ?")
            .bind(ccl_id.get())
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter()
            .map(|row| -> Result<NoteFact> {
                Ok(NoteFact {
                    amount: row.try_get("total")?,
                    active: row.try_get::<i32, _>("status")? == 1,
                })
            })
            .collect()
    }

    async fn lock_cash_drawer(&mut self, caj_id: CashDrawerId) -> Result<Option<CashDrawerRow>> {
        sqlx::query("SELECT caj_id, total FROM caja WHERE caj_id = ? FOR UPDATE")
            .bind(caj_id.get())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(|row| -> Result<CashDrawerRow> {
                Ok(CashDrawerRow {
                    caj_id: CashDrawerId::new(row.try_get("caj_id")?),
                    total: row.try_get("total")?,
                })
            })
            .transpose()
    }

    async fn add_to_cash_drawer(
        &mut self,
        caj_id: CashDrawerId,
        amount: Decimal,
    ) -> Result<CashDrawerChange> {
        let before = self
            .lock_cash_drawer(caj_id)
            .await?
            .map_or(Decimal::ZERO, |drawer| drawer.total);

        sqlx::query("UPDATE caja SET total = total + ? WHERE caj_id = ?")
            .bind(amount)
            .bind(caj_id.get())
            .execute(&mut *self.tx)
            .await?;

        Ok(CashDrawerChange {
            caj_id,
            total_anterior: before,
            monto_agregado: amount,
            total_nuevo: before + amount,
        })
    }

    async fn insert_payment_group(
        &mut self,
        fecha: NaiveDate,
        total: Decimal,
        comentario: &str,
    ) -> Result<PaymentGroupRow> {
        let result =
            sqlx::query("INSERT INTO abonoclientepago (fecha, total, comentario) VALUES (?, ?, ?)")
                .bind(fecha)
                .bind(total)
                .bind(comentario)
                .execute(&mut *self.tx)
                .await?;

        Ok(PaymentGroupRow {
            acp_id: PaymentGroupId::new(inserted_id(&result)?),
            fecha,
            total,
            comentario: comentario.to_string(),
        })
    }

    async fn insert_payment(&mut self, payment: NewPayment) -> Result<PaymentRow> {
        let result = sqlx::query(
            "INSERT INTO abonocliente (fecha, total, comentario, status, ccl_id, tpa_id, acp_id) \
             VALUES (?, ?, ?, 1, ?, ?, ?)",
        )
        .bind(payment.fecha)
        .bind(payment.total)
        .bind(&payment.comentario)
        .bind(payment.ccl_id.get())
        .bind(payment.tpa_id)
        .bind(payment.acp_id.map(PaymentGroupId::get))
        .execute(&mut *self.tx)
        .await?;

        let acl_id = PaymentId::new(inserted_id(&result)?);
        debug!(%acl_id, "abonocliente inserted");
        Ok(payment.into_row(acl_id))
    }

    async fn insert_movement(&mut self, movement: NewMovement) -> Result<MovementRow> {
        let result = sqlx::query(
            "INSERT INTO movimiento (total, comentario, tipo, status, tipoExt, caj_id, tpa_id, \
                ven_id, com_id, acl_id, apr_id, cor_id, ncr_id, ncp_id, sip_id) \
             VALUES (?, ?, ?, 1, NULL, ?, ?, NULL, NULL, ?, NULL, NULL, NULL, NULL, NULL)",
        )
        .bind(movement.total)
        .bind(&movement.comentario)
        .bind(crate::schema::MOVEMENT_INFLOW)
        .bind(movement.caj_id.get())
        .bind(movement.tpa_id)
        .bind(movement.acl_id.get())
        .execute(&mut *self.tx)
        .await?;

        Ok(movement.into_row(inserted_id(&result)?))
    }

    async fn insert_card_detail(&mut self, detail: CardDetailRow) -> Result<()> {
        sqlx::query("INSERT INTO abonoclientetarjeta (acl_id, tipo) VALUES (?, ?)")
            .bind(detail.acl_id.get())
            .bind(detail.tipo)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_history(&mut self, entry: HistoryRow) -> Result<()> {
        sqlx::query(
            "INSERT INTO historial (id, tabla, movimiento, usu_id, fecha) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry.id)
        .bind(&entry.tabla)
        .bind(entry.movimiento)
        .bind(entry.usu_id.get())
        .bind(entry.fecha)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn set_credit_status(&mut self, ccl_id: CreditId, status: i32) -> Result<()> {
        sqlx::query("UPDATE creditocliente SET status = ? WHERE ccl_id = ?")
            .bind(status)
            .bind(ccl_id.get())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn payments_after(
        &mut self,
        after: PaymentId,
        credit: Option<CreditId>,
    ) -> Result<Vec<SyncedPayment>> {
        let rows = sqlx::query(
            "SELECT acl_id, fecha, total, comentario, status, ccl_id, tpa_id, acp_id \
             FROM abonocliente WHERE acl_id > ? AND (? IS NULL OR ccl_id = ?) ORDER BY acl_id",
        )
        .bind(after.get())
        .bind(credit.map(CreditId::get))
        .bind(credit.map(CreditId::get))
        .fetch_all(&mut *self.tx)
        .await?;

        let payments = rows.iter().map(payment_row).collect::<Result<Vec<_>>>()?;
        let mut synced = Vec::with_capacity(payments.len());
        for payment in payments {
            synced.push(self.synced_payment(payment).await?);
        }
        Ok(synced)
    }

    async fn insert_credit(&mut self, credit: NewCredit) -> Result<CreditId> {
        let result = sqlx::query(
            "INSERT INTO creditocliente (cli_id, ven_id, fechaLimite, total, comentario, status) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(credit.cli_id.get())
        .bind(credit.ven_id.get())
        .bind(credit.fecha_limite)
        .bind(credit.total)
        .bind(&credit.comentario)
        .bind(credit.status)
        .execute(&mut *self.tx)
        .await?;
        Ok(CreditId::new(inserted_id(&result)?))
    }

    // =========================================================================
    // Customers
    // =========================================================================

    async fn get_client(&mut self, cli_id: ClientId) -> Result<Option<ClientRow>> {
        sqlx::query("SELECT cli_id, nombre, status, precio FROM cliente WHERE cli_id = ?")
            .bind(cli_id.get())
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(client_row)
            .transpose()
    }

    async fn default_client(&mut self) -> Result<Option<ClientRow>> {
        let walk_in = sqlx::query(
            "SELECT cli_id, nombre, status, precio FROM cliente WHERE status = 1 \
             AND (UPPER(nombre) LIKE ? OR UPPER(nombre) LIKE ? OR UPPER(nombre) LIKE ?) \
             ORDER BY cli_id LIMIT 1",
        )
        .bind("%PÚBLICO%")
        .bind("%PUBLICO%")
        .bind("%GENERAL%")
        .fetch_optional(&mut *self.tx)
        .await?;

        let row = match walk_in {
            Some(row) => Some(row),
            None => {
                sqlx::query(
                    "SELECT cli_id, nombre, status, precio FROM cliente WHERE status = 1 \
                     ORDER BY cli_id LIMIT 1",
                )
                .fetch_optional(&mut *self.tx)
                .await?
            }
        };
        row.as_ref().map(client_row).transpose()
    }

    async fn client_key_exists(&mut self, clave: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM cliente WHERE clave = ? LIMIT 1")
            .bind(clave)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.is_some())
    }

    async fn client_group_active(&mut self, grc_id: ClientGroupId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM grupocliente WHERE grc_id = ? AND status = 1")
            .bind(grc_id.get())
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.is_some())
    }

    async fn tax_regime_exists(&mut self, rgf_id: TaxRegimeId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM regimenfiscal WHERE rgf_id = ?")
            .bind(rgf_id.get())
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.is_some())
    }

    async fn insert_client(&mut self, client: NewClient) -> Result<ClientId> {
        let result = sqlx::query(
            "INSERT INTO cliente (nombre, representante, domicilio, noExt, noInt, localidad, \
                ciudad, estado, pais, codigoPostal, colonia, rfc, curp, telefono, celular, mail, \
                comentario, status, limite, precio, diasCredito, retener, desglosarIEPS, \
                notificar, clave, usoCfdi, idCIF, foto, huella, muestra, sid, eduNivel, \
                eduClave, eduRfc, eduNombre, grc_id, rgf_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, \
                ?, ?, NULL, NULL, NULL, NULL, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&client.nombre)
        .bind(&client.representante)
        .bind(&client.domicilio)
        .bind(&client.no_ext)
        .bind(&client.no_int)
        .bind(&client.localidad)
        .bind(&client.ciudad)
        .bind(&client.estado)
        .bind(&client.pais)
        .bind(&client.codigo_postal)
        .bind(&client.colonia)
        .bind(&client.rfc)
        .bind(&client.curp)
        .bind(&client.telefono)
        .bind(&client.celular)
        .bind(&client.mail)
        .bind(&client.comentario)
        .bind(client.status)
        .bind(client.limite)
        .bind(client.precio)
        .bind(client.dias_credito)
        .bind(client.retener)
        .bind(client.desglosar_ieps)
        .bind(client.notificar)
        .bind(&client.clave)
        .bind(&client.uso_cfdi)
        .bind(&client.id_cif)
        .bind(&client.edu_nivel)
        .bind(&client.edu_clave)
        .bind(&client.edu_rfc)
        .bind(&client.edu_nombre)
        .bind(client.grc_id.map(ClientGroupId::get))
        .bind(client.rgf_id.map(TaxRegimeId::get))
        .execute(&mut *self.tx)
        .await?;
        Ok(ClientId::new(inserted_id(&result)?))
    }

    // =========================================================================
    // Configuration and reference data
    // =========================================================================

    async fn sales_config(&mut self) -> Result<Option<SalesConfig>> {
        let Some(row) = sqlx::query(
            "SELECT cotHeader, cotFooter, \
                CAST(cotMosImg AS SIGNED) AS cotMosImg, CAST(cotMosCar AS SIGNED) AS cotMosCar, \
                CAST(cotDesglosar AS SIGNED) AS cotDesglosar, \
                CAST(cotDescuento AS SIGNED) AS cotDescuento, CAST(cotPeso AS SIGNED) AS cotPeso, \
                CAST(cotMosFirma AS SIGNED) AS cotMosFirma, cotLeyendaImpuestos, \
                CAST(cotMosParidad AS SIGNED) AS cotMosParidad, \
                CAST(cotMosDetallePaq AS SIGNED) AS cotMosDetallePaq, \
                CAST(cotMosClaveArt AS SIGNED) AS cotMosClaveArt, \
                CAST(cotMosPreAntDesc AS SIGNED) AS cotMosPreAntDesc, \
                CAST(numPreCli AS SIGNED) AS numPreCli, \
                CAST(venderSinInv AS SIGNED) AS venderSinInv, \
                CAST(decimales AS SIGNED) AS decimales \
             FROM ventaconf LIMIT 1",
        )
        .fetch_optional(&mut *self.tx)
        .await?
        else {
            return Ok(None);
        };

        let int = |column: &str| -> Result<i32> {
            let value = row.try_get::<Option<i64>, _>(column)?.unwrap_or(0);
            i32::try_from(value).map_err(|_| StoreError::RowDecode(format!("{column} = {value}")))
        };
        let text = |column: &str| -> Result<String> {
            Ok(row.try_get::<Option<String>, _>(column)?.unwrap_or_default())
        };

        Ok(Some(SalesConfig {
            cot_header: text("cotHeader")?,
            cot_footer: text("cotFooter")?,
            cot_mos_img: int("cotMosImg")?,
            cot_mos_car: int("cotMosCar")?,
            cot_desglosar: int("cotDesglosar")?,
            cot_descuento: int("cotDescuento")?,
            cot_peso: int("cotPeso")?,
            cot_mos_firma: int("cotMosFirma")?,
            cot_leyenda_impuestos: text("cotLeyendaImpuestos")?,
            cot_mos_paridad: int("cotMosParidad")?,
            cot_mos_detalle_paq: int("cotMosDetallePaq")?,
            cot_mos_clave_art: int("cotMosClaveArt")?,
            cot_mos_pre_ant_desc: int("cotMosPreAntDesc")?,
            num_pre_cli: int("numPreCli")? != 0,
            vender_sin_inv: int("venderSinInv")? != 0,
            decimales: row
                .try_get::<Option<i64>, _>("decimales")?
                .and_then(|d| i32::try_from(d).ok())
                .unwrap_or(2),
        }))
    }

    async fn default_currency(&mut self) -> Result<Option<CurrencyRow>> {
        let row = sqlx::query(
            "SELECT mon_id, abr, tipoCambio FROM moneda WHERE status = 1 \
             ORDER BY (mn = 1) DESC, mon_id LIMIT 1",
        )
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(|row| -> Result<CurrencyRow> {
            Ok(CurrencyRow {
                mon_id: CurrencyId::new(row.try_get("mon_id")?),
                abr: row
                    .try_get::<Option<String>, _>("abr")?
                    .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
                tipo_cambio: row
                    .try_get::<Option<Decimal>, _>("tipoCambio")?
                    .unwrap_or(Decimal::ONE),
            })
        })
        .transpose()
    }

    async fn get_user(&mut self, usu_id: UserId) -> Result<Option<UserRow>> {
        sqlx::query("SELECT usu_id, nombre, status, vnd_id FROM usuario WHERE usu_id = ?")
            .bind(usu_id.get())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(|row| -> Result<UserRow> {
                Ok(UserRow {
                    usu_id: UserId::new(row.try_get("usu_id")?),
                    nombre: row.try_get("nombre")?,
                    status: row.try_get("status")?,
                    vnd_id: row.try_get::<Option<i64>, _>("vnd_id")?.map(VendorId::new),
                })
            })
            .transpose()
    }

    async fn vendor_active(&mut self, vnd_id: VendorId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM vendedor WHERE vnd_id = ? AND status = 1")
            .bind(vnd_id.get())
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.is_some())
    }

    // =========================================================================
    // Articles and taxes
    // =========================================================================

    async fn get_article(&mut self, art_id: ArticleId) -> Result<Option<ArticleRow>> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articulo WHERE art_id = ?");
        sqlx::query(&sql)
            .bind(art_id.get())
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(article_row)
            .transpose()
    }

    async fn article_taxes(&mut self, art_id: ArticleId) -> Result<Vec<TaxRow>> {
        let sql = format!(
            "SELECT {TAX_COLUMNS} FROM articuloimpuesto ai \
             JOIN impuesto i ON ai.imp_id = i.imp_id \
             WHERE ai.art_id = ? AND i.status = 1"
        );
        sqlx::query(&sql)
            .bind(art_id.get())
            .fetch_all(&mut *self.tx)
            .await?
            .iter()
            .map(tax_row)
            .collect()
    }

    async fn get_tax(&mut self, imp_id: TaxId) -> Result<Option<TaxRow>> {
        let sql = format!("SELECT {TAX_COLUMNS} FROM impuesto i WHERE i.imp_id = ?");
        sqlx::query(&sql)
            .bind(imp_id.get())
            .fetch_optional(&mut *self.tx)
            .await?
            .as_ref()
            .map(tax_row)
            .transpose()
    }

    async fn adjust_stock(&mut self, art_id: ArticleId, delta: Decimal) -> Result<()> {
        sqlx::query("UPDATE articulo SET existencia = existencia + ? WHERE art_id = ?")
            .bind(delta)
            .bind(art_id.get())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn recent_articles(&mut self, limit: u32) -> Result<Vec<ArticleSyncRow>> {
        sqlx::query(
            "SELECT art_id, clave, precio1, precio2, existencia, status FROM articulo \
             ORDER BY art_id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&mut *self.tx)
        .await?
        .iter()
        .map(|row| -> Result<ArticleSyncRow> {
            Ok(ArticleSyncRow {
                art_id: ArticleId::new(row.try_get("art_id")?),
                clave: row.try_get("clave")?,
                precio1: row.try_get("precio1")?,
                precio2: row.try_get("precio2")?,
                existencia: row.try_get("existencia")?,
                status: row.try_get("status")?,
            })
        })
        .collect()
    }

    // =========================================================================
    // Quotations
    // =========================================================================

    async fn insert_quotation(&mut self, q: NewQuotation) -> Result<QuotationId> {
        let result = sqlx::query(
            "INSERT INTO cotizacion (fecha, header, footer, subtotal, descuento, total, \
                monSubtotal, monDescuento, monTotal, monAbr, monTipoCambio, peso, status, img, \
                caracteristicas, desglosado, mosDescuento, mosPeso, impuestos, mosFirma, \
                leyendaImpuestos, mosParidad, bloqueada, mosDetallePaq, mosClaveArt, \
                folioMovil, serieMovil, totalSipa, mosPreAntDesc, usu_id, cli_id, mon_id, vnd_id) \
             VALUES (?, ?, ?, ?, ?, ?, NULL, NULL, NULL, ?, ?, NULL, 1, ?, ?, ?, ?, ?, 0, ?, ?, \
                ?, 0, ?, ?, NULL, NULL, NULL, ?, ?, ?, ?, ?)",
        )
        .bind(q.fecha)
        .bind(&q.header)
        .bind(&q.footer)
        .bind(q.subtotal)
        .bind(q.descuento)
        .bind(q.total)
        .bind(&q.mon_abr)
        .bind(q.mon_tipo_cambio)
        .bind(q.img)
        .bind(q.caracteristicas)
        .bind(q.desglosado)
        .bind(q.mos_descuento)
        .bind(q.mos_peso)
        .bind(q.mos_firma)
        .bind(&q.leyenda_impuestos)
        .bind(q.mos_paridad)
        .bind(q.mos_detalle_paq)
        .bind(q.mos_clave_art)
        .bind(q.mos_pre_ant_desc)
        .bind(q.usu_id.get())
        .bind(q.cli_id.get())
        .bind(q.mon_id.get())
        .bind(q.vnd_id.map(VendorId::get))
        .execute(&mut *self.tx)
        .await?;
        Ok(QuotationId::new(inserted_id(&result)?))
    }

    async fn get_quotation(&mut self, cot_id: QuotationId) -> Result<Option<QuotationRow>> {
        sqlx::query("SELECT cot_id, cli_id, status FROM cotizacion WHERE cot_id = ?")
            .bind(cot_id.get())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(|row| -> Result<QuotationRow> {
                Ok(QuotationRow {
                    cot_id: QuotationId::new(row.try_get("cot_id")?),
                    cli_id: ClientId::new(row.try_get("cli_id")?),
                    status: row.try_get("status")?,
                })
            })
            .transpose()
    }

    async fn quotation_has_article(
        &mut self,
        cot_id: QuotationId,
        art_id: ArticleId,
    ) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM detallecot WHERE cot_id = ? AND art_id = ? LIMIT 1")
            .bind(cot_id.get())
            .bind(art_id.get())
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.is_some())
    }

    async fn max_quotation_order(&mut self, cot_id: QuotationId) -> Result<i32> {
        let row = sqlx::query(
            "SELECT CAST(COALESCE(MAX(orden), 0) AS SIGNED) AS orden FROM detallecot WHERE cot_id = ?",
        )
        .bind(cot_id.get())
        .fetch_one(&mut *self.tx)
        .await?;
        let orden: i64 = row.try_get("orden")?;
        i32::try_from(orden).map_err(|_| StoreError::RowDecode(format!("orden = {orden}")))
    }

    async fn insert_quotation_line(&mut self, line: NewQuotationLine) -> Result<()> {
        sqlx::query(
            "INSERT INTO detallecot (cot_id, art_id, clave, descripcion, cantidad, unidad, \
                precioCompra, precioNorSin, precioNorCon, precioSin, precioCon, importeCompra, \
                importeNorSin, importeNorCon, importeSin, importeCon, monPrecioNorSin, \
                monPrecioNorCon, monPrecioSin, monPrecioCon, monImporteNorSin, monImporteNorCon, \
                monImporteSin, monImporteCon, diferencia, utilidad, descPorcentaje, descTotal, \
                caracteristicas, orden) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL, NULL, NULL, \
                NULL, NULL, NULL, NULL, ?, ?, 0, 0, ?, ?)",
        )
        .bind(line.cot_id.get())
        .bind(line.art_id.get())
        .bind(&line.clave)
        .bind(&line.descripcion)
        .bind(line.cantidad)
        .bind(&line.unidad)
        .bind(line.precio_compra)
        .bind(line.precio_sin)
        .bind(line.precio_con)
        .bind(line.precio_sin)
        .bind(line.precio_con)
        .bind(line.importe_compra)
        .bind(line.importe_sin)
        .bind(line.importe_con)
        .bind(line.importe_sin)
        .bind(line.importe_con)
        .bind(line.diferencia)
        .bind(line.utilidad)
        .bind(&line.caracteristicas)
        .bind(line.orden)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn refresh_quotation_totals(&mut self, cot_id: QuotationId) -> Result<Decimal> {
        let row = sqlx::query(
            "SELECT CAST(COALESCE(SUM(importeCon), 0) AS DECIMAL(18, 2)) AS total \
             FROM detallecot WHERE cot_id = ?",
        )
        .bind(cot_id.get())
        .fetch_one(&mut *self.tx)
        .await?;
        let total: Decimal = row.try_get("total")?;

        sqlx::query("UPDATE cotizacion SET subtotal = ?, total = ? WHERE cot_id = ?")
            .bind(total)
            .bind(total)
            .bind(cot_id.get())
            .execute(&mut *self.tx)
            .await?;
        Ok(total)
    }

    async fn set_quotation_totals(
        &mut self,
        cot_id: QuotationId,
        subtotal: Decimal,
        descuento: Option<Decimal>,
        total: Decimal,
    ) -> Result<()> {
        sqlx::query("UPDATE cotizacion SET subtotal = ?, total = ?, descuento = ? WHERE cot_id = ?")
            .bind(subtotal)
            .bind(total)
            .bind(descuento)
            .bind(cot_id.get())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn quotation_view(&mut self, cot_id: QuotationId) -> Result<Option<QuotationView>> {
        sqlx::query(
            "SELECT c.cot_id, c.fecha, c.header, c.footer, c.subtotal, c.descuento, c.total, \
                c.status, cl.nombre AS cliente, cl.cli_id, u.nombre AS usuario, u.usu_id, \
                v.nombre AS vendedor, v.vnd_id, m.abr AS moneda, m.mon_id \
             FROM cotizacion c \
             JOIN cliente cl ON c.cli_id = cl.cli_id \
             JOIN usuario u ON c.usu_id = u.usu_id \
             LEFT JOIN vendedor v ON c.vnd_id = v.vnd_id \
             LEFT JOIN moneda m ON c.mon_id = m.mon_id \
             WHERE c.cot_id = ?",
        )
        .bind(cot_id.get())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(|row| -> Result<QuotationView> {
            Ok(QuotationView {
                cot_id: QuotationId::new(row.try_get("cot_id")?),
                fecha: row.try_get("fecha")?,
                header: row.try_get::<Option<String>, _>("header")?.unwrap_or_default(),
                footer: row.try_get::<Option<String>, _>("footer")?.unwrap_or_default(),
                subtotal: row.try_get("subtotal")?,
                descuento: row.try_get("descuento")?,
                total: row.try_get("total")?,
                status: row.try_get("status")?,
                cliente: row.try_get("cliente")?,
                cli_id: ClientId::new(row.try_get("cli_id")?),
                usuario: row.try_get("usuario")?,
                usu_id: UserId::new(row.try_get("usu_id")?),
                vendedor: row.try_get("vendedor")?,
                vnd_id: row.try_get::<Option<i64>, _>("vnd_id")?.map(VendorId::new),
                moneda: row.try_get("moneda")?,
                mon_id: row.try_get::<Option<i64>, _>("mon_id")?.map(CurrencyId::new),
            })
        })
        .transpose()
    }

    // =========================================================================
    // Sales
    // =========================================================================

    async fn insert_sale(&mut self, sale: NewSale) -> Result<SaleId> {
        let result = sqlx::query(
            "INSERT INTO venta (fecha, subtotal0, subtotal, descuento, total, cambio, comentario, \
                status, caj_id, mon_id, vnd_id, rcc_id, letra, peso, totalCompra, totalUtilidad, \
                subtotalCompra, subtotalUtilidad, monAbr, monTipoCambio, decimales, porPeriodo, \
                ventaPorAjuste) \
             VALUES (?, 0, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, 0, ?, ?, ?, ?, ?, ?, ?, 0, 0)",
        )
        .bind(sale.fecha)
        .bind(sale.subtotal)
        .bind(sale.descuento)
        .bind(sale.total)
        .bind(sale.cambio)
        .bind(&sale.comentario)
        .bind(sale.status)
        .bind(sale.caj_id.get())
        .bind(sale.mon_id.get())
        .bind(sale.vnd_id.map(VendorId::get))
        .bind(&sale.letra)
        .bind(sale.total_compra)
        .bind(sale.total_utilidad)
        .bind(sale.subtotal_compra)
        .bind(sale.subtotal_utilidad)
        .bind(DEFAULT_CURRENCY)
        .bind(sale.mon_tipo_cambio)
        .bind(sale.decimales)
        .execute(&mut *self.tx)
        .await?;
        Ok(SaleId::new(inserted_id(&result)?))
    }

    async fn insert_sale_line(&mut self, line: NewSaleLine) -> Result<()> {
        sqlx::query(
            "INSERT INTO detallev (ven_id, art_id, clave, descripcion, cantidad, unidad, \
                precioSin, precioCon, importeSin, importeCon, descPorcentaje, descTotal, \
                precioCompra, orden, precioNorSin, precioNorCon, importeNorSin, importeNorCon, \
                importeCompra, sinGravar, caracteristicas, detImp, iepsActivo, cuotaIeps, \
                cuentaPredial, movVen, movVenC, lote, receta, tipo) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, '', ?, 0, 0, \
                '', 0, 0, 0, 0, 0)",
        )
        .bind(line.ven_id.get())
        .bind(line.art_id.get())
        .bind(&line.clave)
        .bind(&line.descripcion)
        .bind(line.cantidad)
        .bind(&line.unidad)
        .bind(line.precio_sin)
        .bind(line.precio_con)
        .bind(line.importe_sin)
        .bind(line.importe_con)
        .bind(line.desc_porcentaje)
        .bind(line.desc_total)
        .bind(line.precio_compra)
        .bind(line.orden)
        .bind(line.precio_sin)
        .bind(line.precio_con)
        .bind(line.importe_sin)
        .bind(line.importe_con)
        .bind(line.importe_compra)
        .bind(line.det_imp)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_sale_line_tax(&mut self, tax: NewSaleLineTax) -> Result<()> {
        sqlx::query(
            "INSERT INTO detallevimpuesto (ven_id, art_id, imp_id, nombre, impuesto, tras, total, \
                monTotal, tipoFactor, aplicaIVA) \
             VALUES (?, ?, ?, ?, ?, 1, ?, NULL, ?, ?)",
        )
        .bind(tax.ven_id.get())
        .bind(tax.art_id.get())
        .bind(tax.imp_id.get())
        .bind(&tax.nombre)
        .bind(tax.impuesto)
        .bind(tax.total)
        .bind(&tax.tipo_factor)
        .bind(tax.aplica_iva)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_sale_tax(&mut self, tax: NewSaleTax) -> Result<()> {
        sqlx::query(
            "INSERT INTO ventaimp (ven_id, imp_id, subtotal, total, tras, orden, aplicaIVA, \
                monSubtotal, monTotal) \
             VALUES (?, ?, ?, ?, 1, ?, NULL, NULL, NULL)",
        )
        .bind(tax.ven_id.get())
        .bind(tax.imp_id.get())
        .bind(tax.subtotal)
        .bind(tax.total)
        .bind(tax.orden)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_sale_payment(&mut self, payment: NewSalePayment) -> Result<()> {
        sqlx::query("INSERT INTO ventatipopago (ven_id, tpa_id, total, monTotal) VALUES (?, ?, ?, ?)")
            .bind(payment.ven_id.get())
            .bind(payment.tpa_id)
            .bind(payment.total)
            .bind(payment.total)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_sale_credit_note(&mut self, note: NewSaleCreditNote) -> Result<()> {
        sqlx::query("INSERT INTO ventanotacredito (ven_id, ncr_id, total) VALUES (?, ?, ?)")
            .bind(note.ven_id.get())
            .bind(note.ncr_id.get())
            .bind(note.total)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Suppliers and purchase orders
    // =========================================================================

    async fn get_supplier(&mut self, pro_id: SupplierId) -> Result<Option<SupplierRow>> {
        sqlx::query("SELECT pro_id, nombre, alias, status FROM proveedor WHERE pro_id = ?")
            .bind(pro_id.get())
            .fetch_optional(&mut *self.tx)
            .await?
            .map(|row| -> Result<SupplierRow> {
                Ok(SupplierRow {
                    pro_id: SupplierId::new(row.try_get("pro_id")?),
                    nombre: row.try_get("nombre")?,
                    alias: row.try_get("alias")?,
                    status: row.try_get("status")?,
                })
            })
            .transpose()
    }

    async fn insert_purchase_order(&mut self, order: NewPurchaseOrder) -> Result<PurchaseOrderId> {
        let result = sqlx::query(
            "INSERT INTO pedido (fecha, total, monAbr, monTotal, monTipoCambio, img, \
                caracteristicas, desglosado, mostrarPrecios, mostrarClaveAlterna, comentario, \
                status, usu_id, pro_id) \
             VALUES (?, ?, NULL, NULL, NULL, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(order.fecha)
        .bind(order.total)
        .bind(order.img)
        .bind(order.caracteristicas)
        .bind(order.desglosado)
        .bind(order.mostrar_precios)
        .bind(order.mostrar_clave_alterna)
        .bind(&order.comentario)
        .bind(order.usu_id.get())
        .bind(order.pro_id.get())
        .execute(&mut *self.tx)
        .await?;
        Ok(PurchaseOrderId::new(inserted_id(&result)?))
    }

    async fn insert_purchase_order_line(&mut self, line: PurchaseOrderLine) -> Result<()> {
        sqlx::query(
            "INSERT INTO detalleped (ped_id, art_id, clave, descripcion, cantidad, unidad, \
                precioCompra, importeCompra, monPrecioCompra, monImporteCompra, orden) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL, ?)",
        )
        .bind(line.ped_id.get())
        .bind(line.art_id.get())
        .bind(&line.clave)
        .bind(&line.descripcion)
        .bind(line.cantidad)
        .bind(&line.unidad)
        .bind(line.precio_compra)
        .bind(line.importe_compra)
        .bind(line.orden)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn upsert_supplier_article(&mut self, link: SupplierArticle) -> Result<UpsertOutcome> {
        let existing = sqlx::query(
            "SELECT 1 FROM proveedorarticulo WHERE pro_id = ? AND art_id = ? FOR UPDATE",
        )
        .bind(link.pro_id.get())
        .bind(link.art_id.get())
        .fetch_optional(&mut *self.tx)
        .await?;

        if existing.is_some() {
            sqlx::query(
                "UPDATE proveedorarticulo SET claveProveedor = ?, precioCompra = ?, fecha = ? \
                 WHERE pro_id = ? AND art_id = ?",
            )
            .bind(&link.clave_proveedor)
            .bind(link.precio_compra)
            .bind(link.fecha)
            .bind(link.pro_id.get())
            .bind(link.art_id.get())
            .execute(&mut *self.tx)
            .await?;
            Ok(UpsertOutcome::Update)
        } else {
            sqlx::query(
                "INSERT INTO proveedorarticulo (pro_id, art_id, claveProveedor, precioCompra, fecha) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(link.pro_id.get())
            .bind(link.art_id.get())
            .bind(&link.clave_proveedor)
            .bind(link.precio_compra)
            .bind(link.fecha)
            .execute(&mut *self.tx)
            .await?;
            Ok(UpsertOutcome::Insert)
        }
    }

    async fn supplier_article_view(
        &mut self,
        pro_id: SupplierId,
        art_id: ArticleId,
    ) -> Result<Option<SupplierArticleView>> {
        sqlx::query(
            "SELECT pa.pro_id, pa.art_id, pa.claveProveedor, pa.precioCompra, pa.fecha, \
                a.clave AS articulo_clave, a.descripcion AS articulo_descripcion, \
                p.nombre AS proveedor_nombre, p.alias AS proveedor_alias \
             FROM proveedorarticulo pa \
             JOIN articulo a ON pa.art_id = a.art_id \
             JOIN proveedor p ON pa.pro_id = p.pro_id \
             WHERE pa.pro_id = ? AND pa.art_id = ?",
        )
        .bind(pro_id.get())
        .bind(art_id.get())
        .fetch_optional(&mut *self.tx)
        .await?
        .map(|row| -> Result<SupplierArticleView> {
            let fecha: NaiveDateTime = row.try_get("fecha")?;
            Ok(SupplierArticleView {
                pro_id: SupplierId::new(row.try_get("pro_id")?),
                art_id: ArticleId::new(row.try_get("art_id")?),
                clave_proveedor: row
                    .try_get::<Option<String>, _>("claveProveedor")?
                    .unwrap_or_default(),
                precio_compra: row.try_get("precioCompra")?,
                fecha,
                articulo_clave: row.try_get("articulo_clave")?,
                articulo_descripcion: row.try_get("articulo_descripcion")?,
                proveedor_nombre: row.try_get("proveedor_nombre")?,
                proveedor_alias: row.try_get("proveedor_alias")?,
            })
        })
        .transpose()
    }
}
