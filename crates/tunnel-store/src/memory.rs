//! In-memory backend.
//!
//! All tables live behind one `tokio::sync::Mutex`. A session owns the lock
//! for its whole lifetime and mutates a staged copy; `commit` swaps the copy
//! in, dropping the session throws it away.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use tunnel_core::money::round2;
use tunnel_core::{
    ArticleId, CashDrawerId, ClientGroupId, ClientId, CreditId, CurrencyId, NoteFact,
    PaymentFact, PaymentGroupId, PaymentId, PaymentStatus, PurchaseOrderId, QuotationId, SaleId,
    SupplierId, TaxId, TaxRegimeId, UserId, VendorId,
};

use crate::error::Result;
use crate::rows::{
    ArticleRow, ArticleSyncRow, CardDetailRow, CashDrawerChange, CashDrawerRow, ClientRow,
    CreditRow, CurrencyRow, HistoryRow, MovementRow, NewClient, NewCredit, NewMovement,
    NewPayment, NewPurchaseOrder, NewQuotation, NewQuotationLine, NewSale, NewSaleCreditNote,
    NewSaleLine, NewSaleLineTax, NewSalePayment, NewSaleTax, PaymentGroupRow, PaymentRow,
    PurchaseOrderLine, QuotationRow, QuotationView, SalesConfig, SupplierArticle,
    SupplierArticleView, SupplierRow, SyncedPayment, TaxRow, UpsertOutcome, UserRow,
};
use crate::schema::DEFAULT_CLIENT_KEYWORDS;
use crate::{Session, Store};

/// `recepcionpago` as far as balances care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptRecord {
    /// Payment the receipt covers.
    pub acl_id: PaymentId,
    /// -1 when voided.
    pub status: i32,
}

/// `creditoclientenotcre` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditNoteRecord {
    /// Credit.
    pub ccl_id: CreditId,
    /// Amount.
    pub total: Decimal,
    /// 1 active.
    pub status: i32,
}

/// `moneda` row with its selection flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyRecord {
    /// Row.
    pub row: CurrencyRow,
    /// 1 active.
    pub status: i32,
    /// National currency.
    pub national: bool,
}

/// `vendedor` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorRecord {
    /// Name.
    pub nombre: String,
    /// 1 active.
    pub status: i32,
}

/// `cotizacion` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotationRecord {
    /// Header values.
    pub header: NewQuotation,
    /// 1 active.
    pub status: i32,
}

/// Every table the bridge touches.
#[derive(Debug, Clone, Default)]
#[allow(missing_docs)]
pub struct Tables {
    pub credits: BTreeMap<CreditId, CreditRow>,
    pub payments: BTreeMap<PaymentId, PaymentRow>,
    pub payment_groups: BTreeMap<PaymentGroupId, PaymentGroupRow>,
    pub card_details: Vec<CardDetailRow>,
    pub receipts: Vec<ReceiptRecord>,
    pub credit_notes: Vec<CreditNoteRecord>,
    pub cash_drawers: BTreeMap<CashDrawerId, CashDrawerRow>,
    pub movements: Vec<MovementRow>,
    pub history: Vec<HistoryRow>,
    pub clients: BTreeMap<ClientId, NewClient>,
    pub client_groups: BTreeMap<ClientGroupId, i32>,
    pub tax_regimes: BTreeSet<TaxRegimeId>,
    pub sales_config: Option<SalesConfig>,
    pub currencies: BTreeMap<CurrencyId, CurrencyRecord>,
    pub users: BTreeMap<UserId, UserRow>,
    pub vendors: BTreeMap<VendorId, VendorRecord>,
    pub articles: BTreeMap<ArticleId, ArticleRow>,
    pub article_taxes: Vec<(ArticleId, TaxId)>,
    pub taxes: BTreeMap<TaxId, TaxRow>,
    pub quotations: BTreeMap<QuotationId, QuotationRecord>,
    pub quotation_lines: Vec<NewQuotationLine>,
    pub sales: BTreeMap<SaleId, NewSale>,
    pub sale_lines: Vec<NewSaleLine>,
    pub sale_line_taxes: Vec<NewSaleLineTax>,
    pub sale_taxes: Vec<NewSaleTax>,
    pub sale_payments: Vec<NewSalePayment>,
    pub sale_credit_notes: Vec<NewSaleCreditNote>,
    pub new_credits: Vec<NewCredit>,
    pub suppliers: BTreeMap<SupplierId, SupplierRow>,
    pub purchase_orders: BTreeMap<PurchaseOrderId, NewPurchaseOrder>,
    pub purchase_order_lines: Vec<PurchaseOrderLine>,
    pub supplier_articles: BTreeMap<(SupplierId, ArticleId), SupplierArticle>,
}

fn next_key<K: Copy + Into<i64>, V>(map: &BTreeMap<K, V>) -> i64 {
    map.keys().next_back().map_or(1, |k| (*k).into() + 1)
}

impl Tables {
    // =========================================================================
    // Seeding helpers
    // =========================================================================

    /// Add an open credit account.
    pub fn add_credit(&mut self, ccl_id: i64, cli_id: i64, total: Decimal) -> &mut CreditRow {
        let ccl_id = CreditId::new(ccl_id);
        self.credits.entry(ccl_id).or_insert(CreditRow {
            ccl_id,
            ven_id: None,
            cli_id: ClientId::new(cli_id),
            total,
            status: 1,
            fecha_limite: None,
            comentario: None,
        })
    }

    /// Add an already-recorded payment.
    pub fn add_payment(&mut self, acl_id: i64, ccl_id: i64, total: Decimal) -> &mut PaymentRow {
        let acl_id = PaymentId::new(acl_id);
        self.payments.entry(acl_id).or_insert(PaymentRow {
            acl_id,
            fecha: NaiveDate::default(),
            total,
            comentario: String::new(),
            status: 1,
            ccl_id: CreditId::new(ccl_id),
            tpa_id: 1,
            acp_id: None,
        })
    }

    /// Add a cash drawer.
    pub fn add_cash_drawer(&mut self, caj_id: i64, total: Decimal) {
        let caj_id = CashDrawerId::new(caj_id);
        self.cash_drawers
            .insert(caj_id, CashDrawerRow { caj_id, total });
    }

    /// Add an active customer.
    pub fn add_client(&mut self, cli_id: i64, nombre: &str) -> &mut NewClient {
        self.clients
            .entry(ClientId::new(cli_id))
            .or_insert_with(|| NewClient::named(nombre))
    }

    /// Add an active user with an optional sales person.
    pub fn add_user(&mut self, usu_id: i64, nombre: &str, vnd_id: Option<i64>) {
        let usu_id = UserId::new(usu_id);
        self.users.insert(
            usu_id,
            UserRow {
                usu_id,
                nombre: nombre.to_string(),
                status: 1,
                vnd_id: vnd_id.map(VendorId::new),
            },
        );
    }

    /// Add an active sales person.
    pub fn add_vendor(&mut self, vnd_id: i64, nombre: &str) {
        self.vendors.insert(
            VendorId::new(vnd_id),
            VendorRecord {
                nombre: nombre.to_string(),
                status: 1,
            },
        );
    }

    /// Add an active currency.
    pub fn add_currency(&mut self, mon_id: i64, abr: &str, national: bool) {
        let mon_id = CurrencyId::new(mon_id);
        self.currencies.insert(
            mon_id,
            CurrencyRecord {
                row: CurrencyRow {
                    mon_id,
                    abr: abr.to_string(),
                    tipo_cambio: Decimal::ONE,
                },
                status: 1,
                national,
            },
        );
    }

    /// Add an active article priced at `precio1` on every level.
    pub fn add_article(&mut self, art_id: i64, clave: &str, precio1: Decimal) -> &mut ArticleRow {
        let art_id = ArticleId::new(art_id);
        self.articles.entry(art_id).or_insert(ArticleRow {
            art_id,
            clave: clave.to_string(),
            descripcion: format!("Artículo {clave}"),
            status: 1,
            existencia: Decimal::ZERO,
            pre_compra_prom: Decimal::ZERO,
            factor: Decimal::ONE,
            ieps_activo: false,
            cuota_ieps: Decimal::ZERO,
            precio1,
            precio2: precio1,
            precio3: precio1,
            precio4: precio1,
            unidad_venta: None,
            unidad_compra: None,
            caracteristicas: None,
        })
    }

    /// Add a tax and link it to articles.
    pub fn add_tax(&mut self, imp_id: i64, nombre: &str, porcentaje: Decimal, articles: &[i64]) {
        let imp_id = TaxId::new(imp_id);
        self.taxes.insert(
            imp_id,
            TaxRow {
                imp_id,
                nombre: nombre.to_string(),
                porcentaje,
                aplicacion: 1,
                tipo_factor: Some("Tasa".to_string()),
                aplicar_iva: Some(0),
                status: 1,
            },
        );
        for art in articles {
            self.article_taxes.push((ArticleId::new(*art), imp_id));
        }
    }

    /// Add an active supplier.
    pub fn add_supplier(&mut self, pro_id: i64, nombre: &str) {
        let pro_id = SupplierId::new(pro_id);
        self.suppliers.insert(
            pro_id,
            SupplierRow {
                pro_id,
                nombre: nombre.to_string(),
                alias: None,
                status: 1,
            },
        );
    }

    // =========================================================================
    // Queries shared by the session
    // =========================================================================

    fn receipt_voided(&self, acl_id: PaymentId) -> bool {
        self.receipts
            .iter()
            .any(|r| r.acl_id == acl_id && r.status == -1)
    }

    fn client_row(cli_id: ClientId, client: &NewClient) -> ClientRow {
        ClientRow {
            cli_id,
            nombre: client.nombre.clone(),
            status: client.status,
            precio: client.precio,
        }
    }

    fn synced(&self, payment: &PaymentRow) -> SyncedPayment {
        SyncedPayment {
            abonocliente: payment.clone(),
            movimiento: self
                .movements
                .iter()
                .find(|m| m.acl_id == Some(payment.acl_id))
                .cloned(),
            historial: self
                .history
                .iter()
                .filter(|h| h.tabla == crate::schema::audit::PAYMENT && h.id == payment.acl_id.get())
                .cloned()
                .collect(),
            tarjeta: self
                .card_details
                .iter()
                .find(|c| c.acl_id == payment.acl_id)
                .copied(),
            grupo: payment
                .acp_id
                .and_then(|acp| self.payment_groups.get(&acp).cloned()),
        }
    }
}

/// In-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutate the committed tables directly.
    pub async fn seed<F>(&self, f: F)
    where
        F: FnOnce(&mut Tables),
    {
        let mut tables = self.tables.lock().await;
        f(&mut tables);
    }

    /// A copy of the committed tables.
    pub async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Session>> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemorySession { guard, staged }))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// A transaction over [`MemoryStore`].
pub struct MemorySession {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl Session for MemorySession {
    async fn commit(self: Box<Self>) -> Result<()> {
        let MemorySession { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    // =========================================================================
    // Credits and payments
    // =========================================================================

    async fn lock_credit(&mut self, ccl_id: CreditId) -> Result<Option<CreditRow>> {
        Ok(self.staged.credits.get(&ccl_id).cloned())
    }

    async fn get_credit(&mut self, ccl_id: CreditId) -> Result<Option<CreditRow>> {
        Ok(self.staged.credits.get(&ccl_id).cloned())
    }

    async fn payment_facts(&mut self, ccl_id: CreditId) -> Result<Vec<PaymentFact>> {
        let t = &self.staged;
        Ok(t.payments
            .values()
            .filter(|p| p.ccl_id == ccl_id)
            .map(|p| {
                let group_receipt_voided = p.acp_id.is_some_and(|acp| {
                    t.payments
                        .values()
                        .filter(|q| q.acp_id == Some(acp))
                        .any(|q| t.receipt_voided(q.acl_id))
                });
                PaymentFact {
                    amount: p.total,
                    status: PaymentStatus::from_code(p.status),
                    receipt_voided: t.receipt_voided(p.acl_id),
                    group_receipt_voided,
                }
            })
            .collect())
    }

    async fn note_facts(&mut self, ccl_id: CreditId) -> Result<Vec<NoteFact>> {
        Ok(self
            .staged
            .credit_notes
            .iter()
            .filter(|n| n.ccl_id == ccl_id)
            .map(|n| NoteFact {
                amount: n.total,
                active: n.status == 1,
            })
            .collect())
    }

    async fn lock_cash_drawer(&mut self, caj_id: CashDrawerId) -> Result<Option<CashDrawerRow>> {
        Ok(self.staged.cash_drawers.get(&caj_id).copied())
    }

    async fn add_to_cash_drawer(
        &mut self,
        caj_id: CashDrawerId,
        amount: Decimal,
    ) -> Result<CashDrawerChange> {
        let drawer = self
            .staged
            .cash_drawers
            .entry(caj_id)
            .or_insert(CashDrawerRow {
                caj_id,
                total: Decimal::ZERO,
            });
        let before = drawer.total;
        drawer.total = round2(before + amount);
        Ok(CashDrawerChange {
            caj_id,
            total_anterior: before,
            monto_agregado: amount,
            total_nuevo: drawer.total,
        })
    }

    async fn insert_payment_group(
        &mut self,
        fecha: NaiveDate,
        total: Decimal,
        comentario: &str,
    ) -> Result<PaymentGroupRow> {
        let acp_id = PaymentGroupId::new(next_key(&self.staged.payment_groups));
        let row = PaymentGroupRow {
            acp_id,
            fecha,
            total,
            comentario: comentario.to_string(),
        };
        self.staged.payment_groups.insert(acp_id, row.clone());
        Ok(row)
    }

    async fn insert_payment(&mut self, payment: NewPayment) -> Result<PaymentRow> {
        let acl_id = PaymentId::new(next_key(&self.staged.payments));
        let row = payment.into_row(acl_id);
        self.staged.payments.insert(acl_id, row.clone());
        Ok(row)
    }

    async fn insert_movement(&mut self, movement: NewMovement) -> Result<MovementRow> {
        let mov_id = self.staged.movements.iter().map(|m| m.mov_id).max().unwrap_or(0) + 1;
        let row = movement.into_row(mov_id);
        self.staged.movements.push(row.clone());
        Ok(row)
    }

    async fn insert_card_detail(&mut self, detail: CardDetailRow) -> Result<()> {
        self.staged.card_details.push(detail);
        Ok(())
    }

    async fn insert_history(&mut self, entry: HistoryRow) -> Result<()> {
        self.staged.history.push(entry);
        Ok(())
    }

    async fn set_credit_status(&mut self, ccl_id: CreditId, status: i32) -> Result<()> {
        if let Some(credit) = self.staged.credits.get_mut(&ccl_id) {
            credit.status = status;
        }
        Ok(())
    }

    async fn payments_after(
        &mut self,
        after: PaymentId,
        credit: Option<CreditId>,
    ) -> Result<Vec<SyncedPayment>> {
        let t = &self.staged;
        Ok(t.payments
            .range((std::ops::Bound::Excluded(after), std::ops::Bound::Unbounded))
            .map(|(_, p)| p)
            .filter(|p| credit.map_or(true, |c| p.ccl_id == c))
            .map(|p| t.synced(p))
            .collect())
    }

    async fn insert_credit(&mut self, credit: NewCredit) -> Result<CreditId> {
        let ccl_id = CreditId::new(next_key(&self.staged.credits));
        self.staged.credits.insert(
            ccl_id,
            CreditRow {
                ccl_id,
                ven_id: Some(credit.ven_id),
                cli_id: credit.cli_id,
                total: credit.total,
                status: credit.status,
                fecha_limite: Some(credit.fecha_limite),
                comentario: Some(credit.comentario.clone()),
            },
        );
        self.staged.new_credits.push(credit);
        Ok(ccl_id)
    }

    // =========================================================================
    // Customers
    // =========================================================================

    async fn get_client(&mut self, cli_id: ClientId) -> Result<Option<ClientRow>> {
        Ok(self
            .staged
            .clients
            .get(&cli_id)
            .map(|c| Tables::client_row(cli_id, c)))
    }

    async fn default_client(&mut self) -> Result<Option<ClientRow>> {
        let active = || self.staged.clients.iter().filter(|(_, c)| c.status == 1);
        let walk_in = active().find(|(_, c)| {
            let upper = c.nombre.to_uppercase();
            DEFAULT_CLIENT_KEYWORDS.iter().any(|k| upper.contains(k))
        });
        Ok(walk_in
            .or_else(|| active().next())
            .map(|(id, c)| Tables::client_row(*id, c)))
    }

    async fn client_key_exists(&mut self, clave: &str) -> Result<bool> {
        Ok(self
            .staged
            .clients
            .values()
            .any(|c| c.clave.as_deref() == Some(clave)))
    }

    async fn client_group_active(&mut self, grc_id: ClientGroupId) -> Result<bool> {
        Ok(self.staged.client_groups.get(&grc_id) == Some(&1))
    }

    async fn tax_regime_exists(&mut self, rgf_id: TaxRegimeId) -> Result<bool> {
        Ok(self.staged.tax_regimes.contains(&rgf_id))
    }

    async fn insert_client(&mut self, client: NewClient) -> Result<ClientId> {
        let cli_id = ClientId::new(next_key(&self.staged.clients));
        self.staged.clients.insert(cli_id, client);
        Ok(cli_id)
    }

    // =========================================================================
    // Configuration and reference data
    // =========================================================================

    async fn sales_config(&mut self) -> Result<Option<SalesConfig>> {
        Ok(self.staged.sales_config.clone())
    }

    async fn default_currency(&mut self) -> Result<Option<CurrencyRow>> {
        let active = || self.staged.currencies.values().filter(|c| c.status == 1);
        Ok(active()
            .find(|c| c.national)
            .or_else(|| active().next())
            .map(|c| c.row.clone()))
    }

    async fn get_user(&mut self, usu_id: UserId) -> Result<Option<UserRow>> {
        Ok(self.staged.users.get(&usu_id).cloned())
    }

    async fn vendor_active(&mut self, vnd_id: VendorId) -> Result<bool> {
        Ok(self
            .staged
            .vendors
            .get(&vnd_id)
            .is_some_and(|v| v.status == 1))
    }

    // =========================================================================
    // Articles and taxes
    // =========================================================================

    async fn get_article(&mut self, art_id: ArticleId) -> Result<Option<ArticleRow>> {
        Ok(self.staged.articles.get(&art_id).cloned())
    }

    async fn article_taxes(&mut self, art_id: ArticleId) -> Result<Vec<TaxRow>> {
        let t = &self.staged;
        Ok(t.article_taxes
            .iter()
            .filter(|(art, _)| *art == art_id)
            .filter_map(|(_, imp)| t.taxes.get(imp))
            .filter(|tax| tax.status == 1)
            .cloned()
            .collect())
    }

    async fn get_tax(&mut self, imp_id: TaxId) -> Result<Option<TaxRow>> {
        Ok(self.staged.taxes.get(&imp_id).cloned())
    }

    async fn adjust_stock(&mut self, art_id: ArticleId, delta: Decimal) -> Result<()> {
        if let Some(article) = self.staged.articles.get_mut(&art_id) {
            article.existencia += delta;
        }
        Ok(())
    }

    async fn recent_articles(&mut self, limit: u32) -> Result<Vec<ArticleSyncRow>> {
        Ok(self
            .staged
            .articles
            .values()
            .rev()
            .take(limit as usize)
            .map(|a| ArticleSyncRow {
                art_id: a.art_id,
                clave: a.clave.clone(),
                precio1: a.precio1,
                precio2: a.precio2,
                existencia: a.existencia,
                status: a.status,
            })
            .collect())
    }

    // =========================================================================
    // Quotations
    // =========================================================================

    async fn insert_quotation(&mut self, quotation: NewQuotation) -> Result<QuotationId> {
        let cot_id = QuotationId::new(next_key(&self.staged.quotations));
        self.staged.quotations.insert(
            cot_id,
            QuotationRecord {
                header: quotation,
                status: 1,
            },
        );
        Ok(cot_id)
    }

    async fn get_quotation(&mut self, cot_id: QuotationId) -> Result<Option<QuotationRow>> {
        Ok(self.staged.quotations.get(&cot_id).map(|q| QuotationRow {
            cot_id,
            cli_id: q.header.cli_id,
            status: q.status,
        }))
    }

    async fn quotation_has_article(
        &mut self,
        cot_id: QuotationId,
        art_id: ArticleId,
    ) -> Result<bool> {
        Ok(self
            .staged
            .quotation_lines
            .iter()
            .any(|l| l.cot_id == cot_id && l.art_id == art_id))
    }

    async fn max_quotation_order(&mut self, cot_id: QuotationId) -> Result<i32> {
        Ok(self
            .staged
            .quotation_lines
            .iter()
            .filter(|l| l.cot_id == cot_id)
            .map(|l| l.orden)
            .max()
            .unwrap_or(0))
    }

    async fn insert_quotation_line(&mut self, line: NewQuotationLine) -> Result<()> {
        self.staged.quotation_lines.push(line);
        Ok(())
    }

    async fn refresh_quotation_totals(&mut self, cot_id: QuotationId) -> Result<Decimal> {
        let total = round2(
            self.staged
                .quotation_lines
                .iter()
                .filter(|l| l.cot_id == cot_id)
                .map(|l| l.importe_con)
                .sum(),
        );
        if let Some(q) = self.staged.quotations.get_mut(&cot_id) {
            q.header.subtotal = total;
            q.header.total = total;
        }
        Ok(total)
    }

    async fn set_quotation_totals(
        &mut self,
        cot_id: QuotationId,
        subtotal: Decimal,
        descuento: Option<Decimal>,
        total: Decimal,
    ) -> Result<()> {
        if let Some(q) = self.staged.quotations.get_mut(&cot_id) {
            q.header.subtotal = subtotal;
            q.header.descuento = descuento;
            q.header.total = total;
        }
        Ok(())
    }

    async fn quotation_view(&mut self, cot_id: QuotationId) -> Result<Option<QuotationView>> {
        let t = &self.staged;
        let Some(q) = t.quotations.get(&cot_id) else {
            return Ok(None);
        };
        let (Some(client), Some(user)) = (t.clients.get(&q.header.cli_id), t.users.get(&q.header.usu_id))
        else {
            return Ok(None);
        };
        let vendor = q.header.vnd_id.and_then(|v| t.vendors.get(&v));
        let currency = t.currencies.get(&q.header.mon_id);

        Ok(Some(QuotationView {
            cot_id,
            fecha: q.header.fecha,
            header: q.header.header.clone(),
            footer: q.header.footer.clone(),
            subtotal: q.header.subtotal,
            descuento: q.header.descuento,
            total: q.header.total,
            status: q.status,
            cliente: client.nombre.clone(),
            cli_id: q.header.cli_id,
            usuario: user.nombre.clone(),
            usu_id: user.usu_id,
            vendedor: vendor.map(|v| v.nombre.clone()),
            vnd_id: vendor.and(q.header.vnd_id),
            moneda: currency.map(|c| c.row.abr.clone()),
            mon_id: currency.map(|c| c.row.mon_id),
        }))
    }

    // =========================================================================
    // Sales
    // =========================================================================

    async fn insert_sale(&mut self, sale: NewSale) -> Result<SaleId> {
        let ven_id = SaleId::new(next_key(&self.staged.sales));
        self.staged.sales.insert(ven_id, sale);
        Ok(ven_id)
    }

    async fn insert_sale_line(&mut self, line: NewSaleLine) -> Result<()> {
        self.staged.sale_lines.push(line);
        Ok(())
    }

    async fn insert_sale_line_tax(&mut self, tax: NewSaleLineTax) -> Result<()> {
        self.staged.sale_line_taxes.push(tax);
        Ok(())
    }

    async fn insert_sale_tax(&mut self, tax: NewSaleTax) -> Result<()> {
        self.staged.sale_taxes.push(tax);
        Ok(())
    }

    async fn insert_sale_payment(&mut self, payment: NewSalePayment) -> Result<()> {
        self.staged.sale_payments.push(payment);
        Ok(())
    }

    async fn insert_sale_credit_note(&mut self, note: NewSaleCreditNote) -> Result<()> {
        self.staged.sale_credit_notes.push(note);
        Ok(())
    }

    // =========================================================================
    // Suppliers and purchase orders
    // =========================================================================

    async fn get_supplier(&mut self, pro_id: SupplierId) -> Result<Option<SupplierRow>> {
        Ok(self.staged.suppliers.get(&pro_id).cloned())
    }

    async fn insert_purchase_order(&mut self, order: NewPurchaseOrder) -> Result<PurchaseOrderId> {
        let ped_id = PurchaseOrderId::new(next_key(&self.staged.purchase_orders));
        self.staged.purchase_orders.insert(ped_id, order);
        Ok(ped_id)
    }

    async fn insert_purchase_order_line(&mut self, line: PurchaseOrderLine) -> Result<()> {
        self.staged.purchase_order_lines.push(line);
        Ok(())
    }

    async fn upsert_supplier_article(&mut self, link: SupplierArticle) -> Result<UpsertOutcome> {
        let key = (link.pro_id, link.art_id);
        let outcome = if self.staged.supplier_articles.contains_key(&key) {
            UpsertOutcome::Update
        } else {
            UpsertOutcome::Insert
        };
        self.staged.supplier_articles.insert(key, link);
        Ok(outcome)
    }

    async fn supplier_article_view(
        &mut self,
        pro_id: SupplierId,
        art_id: ArticleId,
    ) -> Result<Option<SupplierArticleView>> {
        let t = &self.staged;
        let link = t.supplier_articles.get(&(pro_id, art_id));
        let article = t.articles.get(&art_id);
        let supplier = t.suppliers.get(&pro_id);

        Ok(match (link, article, supplier) {
            (Some(link), Some(article), Some(supplier)) => Some(SupplierArticleView {
                pro_id,
                art_id,
                clave_proveedor: link.clave_proveedor.clone(),
                precio_compra: link.precio_compra,
                fecha: link.fecha,
                articulo_clave: article.clave.clone(),
                articulo_descripcion: article.descripcion.clone(),
                proveedor_nombre: supplier.nombre.clone(),
                proveedor_alias: supplier.alias.clone(),
            }),
            _ => None,
        })
    }
}
