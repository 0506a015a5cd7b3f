//! Credit payments: single posts, multi-account splits, balance and delta-sync reads.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tunnel_core::money::floor_zero;
use tunnel_core::validation::{list_len, max_decimals, max_len, min_decimal};
use tunnel_core::{
    is_settled, outstanding_balance, plan_split, round2, CashDrawerId, ClientId, CreditId,
    CreditStatus, PaymentGroupId, PaymentId, PaymentTerms, Result, SplitAccount, TunnelError,
    UserId, VoidRule,
};
use tunnel_store::schema::audit;
use tunnel_store::{
    CardDetailRow, CashDrawerChange, CreditRow, HistoryRow, MovementRow, NewMovement, NewPayment,
    PaymentGroupRow, PaymentRow, Session, SyncedPayment,
};

use crate::state::WriteContext;

const MAX_REFERENCE_LEN: usize = 255;
const MAX_SPLIT_ACCOUNTS: usize = 100;

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /api/abonos/crear`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    /// Credit to pay.
    pub ccl_id: CreditId,
    /// Amount.
    pub monto: Decimal,
    /// Payment method code.
    pub tpa_id: i32,
    /// Memo.
    pub referencia: Option<String>,
    /// Drawer, defaults to the configured one.
    pub caj_id: Option<CashDrawerId>,
    /// Acting user, defaults to the bot user.
    pub usu_id: Option<UserId>,
    /// `credito` or `debito`, card payments only.
    pub tipo_tarjeta: Option<String>,
    /// Last payment id CUSPI already has.
    pub ultimo_acl_id: Option<PaymentId>,
}

/// Body of `POST /api/abonos/multipago`.
#[derive(Debug, Clone, Deserialize)]
pub struct MultiPaymentRequest {
    /// Credits to pay, in fill order.
    #[serde(default)]
    pub ccl_ids: Vec<CreditId>,
    /// Amount to spread.
    pub monto: Decimal,
    /// Payment method code.
    pub tpa_id: i32,
    /// Memo for the group.
    pub referencia: Option<String>,
    /// Drawer, defaults to the configured one.
    pub caj_id: Option<CashDrawerId>,
    /// Acting user, defaults to the bot user.
    pub usu_id: Option<UserId>,
    /// `credito` or `debito`, card payments only.
    pub tipo_tarjeta: Option<String>,
    /// Last payment id CUSPI already has.
    pub ultimo_acl_id: Option<PaymentId>,
}

/// Query of `GET /api/abonos/sync`.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncQuery {
    /// Watermark; payments above it are returned.
    #[serde(default)]
    pub desde: Option<PaymentId>,
    /// Restrict to one credit.
    pub ccl_id: Option<CreditId>,
}

// ============================================================================
// Outcomes
// ============================================================================

/// Status change written when a payment settles a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreditStatusChange {
    /// Credit.
    pub ccl_id: CreditId,
    /// Status before.
    pub status_anterior: i32,
    /// Status after.
    pub status_nuevo: i32,
}

/// Every row written for one payment.
#[derive(Debug, Clone, Serialize)]
pub struct LegRows {
    /// The payment.
    pub abonocliente: PaymentRow,
    /// Cash movement.
    pub movimiento: MovementRow,
    /// Drawer increment.
    pub caja: CashDrawerChange,
    /// Card detail, card payments only.
    pub tarjeta: Option<CardDetailRow>,
    /// Audit entries.
    pub historial: Vec<HistoryRow>,
    /// Credit status change, when settled.
    pub creditocliente: Option<CreditStatusChange>,
}

/// Result of a single payment.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOutcome {
    /// New payment id.
    pub acl_id: PaymentId,
    /// Whether the credit was settled.
    #[serde(rename = "creditoLiquidado")]
    pub credito_liquidado: bool,
    /// Balance before the payment.
    #[serde(rename = "saldoAnterior")]
    pub saldo_anterior: Decimal,
    /// Amount applied.
    #[serde(rename = "montoAbonado")]
    pub monto_abonado: Decimal,
    /// Balance after the payment.
    #[serde(rename = "nuevoSaldo")]
    pub nuevo_saldo: Decimal,
    /// Rows written.
    pub insertados: LegRows,
    /// Payments CUSPI has not seen yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pendientes: Option<Vec<SyncedPayment>>,
}

/// How one credit took part in a split.
#[derive(Debug, Clone, Serialize)]
pub struct Distribution {
    /// Credit.
    pub ccl_id: CreditId,
    /// Balance before.
    #[serde(rename = "saldoAnterior")]
    pub saldo_anterior: Decimal,
    /// Amount of the leg.
    #[serde(rename = "montoAplicado")]
    pub monto_aplicado: Decimal,
    /// Balance after.
    #[serde(rename = "nuevoSaldo")]
    pub nuevo_saldo: Decimal,
    /// Whether the leg settled the credit.
    pub liquidado: bool,
    /// Payment id of the leg.
    pub acl_id: PaymentId,
}

/// Rows written by a split.
#[derive(Debug, Clone, Serialize)]
pub struct SplitRows {
    /// The group.
    pub abonoclientepago: PaymentGroupRow,
    /// One entry per leg.
    pub abonos: Vec<LegRows>,
}

/// Result of a multi-account payment.
#[derive(Debug, Clone, Serialize)]
pub struct MultiPaymentOutcome {
    /// Group id.
    pub acp_id: PaymentGroupId,
    /// Credits settled.
    pub liquidados: Vec<CreditId>,
    /// Credits paid in part.
    pub parciales: Vec<CreditId>,
    /// Credits the amount did not reach.
    pub sin_aplicar: Vec<CreditId>,
    /// Per-leg detail.
    pub distribucion: Vec<Distribution>,
    /// Rows written.
    pub insertados: SplitRows,
    /// Payments CUSPI has not seen yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pendientes: Option<Vec<SyncedPayment>>,
}

/// Result of a delta-sync read.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
    /// Watermark used.
    pub desde: PaymentId,
    /// Number of payments returned.
    pub total: usize,
    /// The payments.
    pub abonos: Vec<SyncedPayment>,
}

/// Current balance of a credit.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceOutcome {
    /// Credit.
    pub ccl_id: CreditId,
    /// Customer.
    pub cli_id: ClientId,
    /// Principal.
    pub total: Decimal,
    /// Status code.
    pub status: i32,
    /// Outstanding balance.
    pub saldo: Decimal,
    /// Whether the credit is settled.
    pub liquidado: bool,
}

// ============================================================================
// Shared steps
// ============================================================================

/// Outstanding balance of a credit, computed from its payments and notes.
pub async fn credit_balance(
    session: &mut dyn Session,
    credit: &CreditRow,
    rule: VoidRule,
) -> Result<Decimal> {
    let payments = session.payment_facts(credit.ccl_id).await?;
    let notes = session.note_facts(credit.ccl_id).await?;
    Ok(outstanding_balance(credit.total, &payments, &notes, rule))
}

async fn lock_open_credit(session: &mut dyn Session, ccl_id: CreditId) -> Result<CreditRow> {
    let credit = session
        .lock_credit(ccl_id)
        .await?
        .ok_or(TunnelError::NotFound {
            entity: "Crédito",
            id: ccl_id.get(),
        })?;

    if CreditStatus::from_code(credit.status) != CreditStatus::Open {
        return Err(TunnelError::conflict(format!(
            "El crédito {ccl_id} no está activo (status {})",
            credit.status
        )));
    }
    Ok(credit)
}

async fn lock_drawer(session: &mut dyn Session, caj_id: CashDrawerId) -> Result<()> {
    session
        .lock_cash_drawer(caj_id)
        .await?
        .ok_or(TunnelError::NotFound {
            entity: "Caja",
            id: caj_id.get(),
        })?;
    Ok(())
}

fn validate_amount(monto: Decimal, referencia: Option<&str>) -> Result<Decimal> {
    max_decimals("monto", monto, 2)?;
    let monto = min_decimal("monto", round2(monto), dec!(0.01))?;
    max_len("referencia", referencia, MAX_REFERENCE_LEN)?;
    Ok(monto)
}

/// One payment against one credit.
struct Leg<'a> {
    credit: &'a CreditRow,
    amount: Decimal,
    balance_before: Decimal,
    terms: PaymentTerms,
    memo: String,
    caj_id: CashDrawerId,
    usu_id: UserId,
    acp_id: Option<PaymentGroupId>,
}

/// Write the payment, movement, drawer increment, card detail, audit rows and
/// the settle transition for one leg.
async fn apply_leg(session: &mut dyn Session, ctx: &WriteContext, leg: Leg<'_>) -> Result<LegRows> {
    let ccl_id = leg.credit.ccl_id;
    let tpa_id = leg.terms.method.code();

    let abonocliente = session
        .insert_payment(NewPayment {
            fecha: ctx.today(),
            total: leg.amount,
            comentario: leg.memo.clone(),
            ccl_id,
            tpa_id,
            acp_id: leg.acp_id,
        })
        .await?;
    let acl_id = abonocliente.acl_id;
    debug!(%acl_id, %ccl_id, monto = %leg.amount, "Abono insertado");

    let movimiento = session
        .insert_movement(NewMovement {
            total: leg.amount,
            comentario: leg.memo,
            caj_id: leg.caj_id,
            tpa_id,
            acl_id,
        })
        .await?;
    debug!(mov_id = movimiento.mov_id, "Movimiento insertado");

    let caja = session.add_to_cash_drawer(leg.caj_id, leg.amount).await?;
    debug!(caj_id = %caja.caj_id, total_nuevo = %caja.total_nuevo, "Caja actualizada");

    let tarjeta = match leg.terms.card {
        Some(kind) => {
            let detail = CardDetailRow {
                acl_id,
                tipo: kind.code(),
            };
            session.insert_card_detail(detail).await?;
            Some(detail)
        }
        None => None,
    };

    let mut historial = vec![HistoryRow {
        id: acl_id.get(),
        tabla: audit::PAYMENT.to_string(),
        movimiento: audit::MOVE_WRITE,
        usu_id: leg.usu_id,
        fecha: ctx.now,
    }];
    session.insert_history(historial[0].clone()).await?;

    let balance_after = floor_zero(round2(leg.balance_before - leg.amount));
    let creditocliente = if is_settled(balance_after) {
        session
            .set_credit_status(ccl_id, CreditStatus::Settled.code())
            .await?;
        let entry = HistoryRow {
            id: ccl_id.get(),
            tabla: audit::CREDIT.to_string(),
            movimiento: audit::MOVE_WRITE,
            usu_id: leg.usu_id,
            fecha: ctx.now,
        };
        session.insert_history(entry.clone()).await?;
        historial.push(entry);
        debug!(%ccl_id, "Crédito liquidado");
        Some(CreditStatusChange {
            ccl_id,
            status_anterior: CreditStatus::Open.code(),
            status_nuevo: CreditStatus::Settled.code(),
        })
    } else {
        None
    };

    Ok(LegRows {
        abonocliente,
        movimiento,
        caja,
        tarjeta,
        historial,
        creditocliente,
    })
}

/// Payments above `watermark`, minus the ones this request created.
async fn pending_since(
    session: &mut dyn Session,
    watermark: Option<PaymentId>,
    credit: Option<CreditId>,
    created: &[PaymentId],
) -> Result<Option<Vec<SyncedPayment>>> {
    let Some(after) = watermark else {
        return Ok(None);
    };
    let mut rows = session.payments_after(after, credit).await?;
    rows.retain(|p| !created.contains(&p.abonocliente.acl_id));
    Ok(Some(rows))
}

// ============================================================================
// Workflows
// ============================================================================

/// Post one payment against one credit.
pub async fn post_payment(
    session: &mut dyn Session,
    ctx: &WriteContext,
    req: PaymentRequest,
) -> Result<PaymentOutcome> {
    let monto = validate_amount(req.monto, req.referencia.as_deref())?;
    let terms = PaymentTerms::parse(req.tpa_id, req.tipo_tarjeta.as_deref())?;
    let caj_id = req.caj_id.unwrap_or(ctx.defaults.caj_id);
    let usu_id = req.usu_id.unwrap_or(ctx.defaults.bot_usu_id);

    let credit = lock_open_credit(session, req.ccl_id).await?;
    let balance = credit_balance(session, &credit, ctx.void_rule).await?;
    debug!(ccl_id = %credit.ccl_id, saldo = %balance, monto = %monto, "Saldo calculado");

    if monto > balance {
        return Err(TunnelError::LimitExceeded {
            what: "monto",
            limit_label: "el saldo pendiente",
            limit: balance,
            requested: monto,
        });
    }

    lock_drawer(session, caj_id).await?;

    let rows = apply_leg(
        session,
        ctx,
        Leg {
            credit: &credit,
            amount: monto,
            balance_before: balance,
            terms,
            memo: req.referencia.unwrap_or_default(),
            caj_id,
            usu_id,
            acp_id: None,
        },
    )
    .await?;

    let acl_id = rows.abonocliente.acl_id;
    let pendientes =
        pending_since(session, req.ultimo_acl_id, Some(credit.ccl_id), &[acl_id]).await?;

    Ok(PaymentOutcome {
        acl_id,
        credito_liquidado: rows.creditocliente.is_some(),
        saldo_anterior: balance,
        monto_abonado: monto,
        nuevo_saldo: floor_zero(round2(balance - monto)),
        insertados: rows,
        pendientes,
    })
}

/// Spread one amount over several credits of the same customer, in the given order.
pub async fn post_multi_payment(
    session: &mut dyn Session,
    ctx: &WriteContext,
    req: MultiPaymentRequest,
) -> Result<MultiPaymentOutcome> {
    let monto = validate_amount(req.monto, req.referencia.as_deref())?;
    let terms = PaymentTerms::parse(req.tpa_id, req.tipo_tarjeta.as_deref())?;
    list_len("ccl_ids", &req.ccl_ids, 2, MAX_SPLIT_ACCOUNTS)?;
    let caj_id = req.caj_id.unwrap_or(ctx.defaults.caj_id);
    let usu_id = req.usu_id.unwrap_or(ctx.defaults.bot_usu_id);

    // Lock in ascending id order so concurrent splits cannot deadlock.
    let mut lock_order = req.ccl_ids.clone();
    lock_order.sort_unstable();
    lock_order.dedup();
    let mut credits = BTreeMap::new();
    for ccl_id in lock_order {
        let credit = lock_open_credit(session, ccl_id).await?;
        credits.insert(ccl_id, credit);
    }

    let mut accounts = Vec::with_capacity(req.ccl_ids.len());
    for ccl_id in &req.ccl_ids {
        let credit = &credits[ccl_id];
        accounts.push(SplitAccount {
            credit_id: credit.ccl_id,
            client_id: credit.cli_id,
            balance: credit_balance(session, credit, ctx.void_rule).await?,
        });
    }

    let plan = plan_split(&accounts, monto)?;
    debug!(
        legs = plan.legs.len(),
        untouched = plan.untouched.len(),
        "Distribución calculada"
    );

    lock_drawer(session, caj_id).await?;

    let memo = req.referencia.unwrap_or_default();
    let group = session
        .insert_payment_group(ctx.today(), monto, &memo)
        .await?;
    debug!(acp_id = %group.acp_id, "Grupo de abonos insertado");

    let mut distribucion = Vec::with_capacity(plan.legs.len());
    let mut abonos = Vec::with_capacity(plan.legs.len());
    for leg in &plan.legs {
        let rows = apply_leg(
            session,
            ctx,
            Leg {
                credit: &credits[&leg.credit_id],
                amount: leg.amount,
                balance_before: leg.balance_before,
                terms,
                memo: String::new(),
                caj_id,
                usu_id,
                acp_id: Some(group.acp_id),
            },
        )
        .await?;
        distribucion.push(Distribution {
            ccl_id: leg.credit_id,
            saldo_anterior: leg.balance_before,
            monto_aplicado: leg.amount,
            nuevo_saldo: leg.balance_after,
            liquidado: leg.settles,
            acl_id: rows.abonocliente.acl_id,
        });
        abonos.push(rows);
    }

    let created: Vec<PaymentId> = distribucion.iter().map(|d| d.acl_id).collect();
    let pendientes = pending_since(session, req.ultimo_acl_id, None, &created).await?;

    Ok(MultiPaymentOutcome {
        acp_id: group.acp_id,
        liquidados: plan.settled(),
        parciales: plan.partial(),
        sin_aplicar: plan.untouched.clone(),
        distribucion,
        insertados: SplitRows {
            abonoclientepago: group,
            abonos,
        },
        pendientes,
    })
}

/// Payments above a watermark, optionally for one credit.
pub async fn sync_payments(session: &mut dyn Session, query: SyncQuery) -> Result<SyncOutcome> {
    let desde = query.desde.unwrap_or(PaymentId::new(0));
    let abonos = session.payments_after(desde, query.ccl_id).await?;
    Ok(SyncOutcome {
        desde,
        total: abonos.len(),
        abonos,
    })
}

/// Current balance of one credit.
pub async fn credit_status(
    session: &mut dyn Session,
    ctx: &WriteContext,
    ccl_id: CreditId,
) -> Result<BalanceOutcome> {
    let credit = session
        .get_credit(ccl_id)
        .await?
        .ok_or(TunnelError::NotFound {
            entity: "Crédito",
            id: ccl_id.get(),
        })?;
    let saldo = credit_balance(session, &credit, ctx.void_rule).await?;

    Ok(BalanceOutcome {
        ccl_id,
        cli_id: credit.cli_id,
        total: credit.total,
        status: credit.status,
        saldo,
        liquidado: CreditStatus::from_code(credit.status) == CreditStatus::Settled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Defaults;
    use rust_decimal_macros::dec;
    use tunnel_store::{MemoryStore, Store};

    fn ctx() -> WriteContext {
        WriteContext {
            defaults: Defaults::default(),
            void_rule: VoidRule::Group,
            now: chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
                .and_then(|d| d.and_hms_opt(10, 0, 0))
                .unwrap(),
        }
    }

    fn request(ccl_id: i64, monto: Decimal) -> PaymentRequest {
        PaymentRequest {
            ccl_id: CreditId::new(ccl_id),
            monto,
            tpa_id: 1,
            referencia: Some("Pago CUSPI".into()),
            caj_id: None,
            usu_id: None,
            tipo_tarjeta: None,
            ultimo_acl_id: None,
        }
    }

    async fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .seed(|t| {
                t.add_cash_drawer(1, dec!(0));
                t.add_credit(10, 5, dec!(100.00));
                t.add_credit(11, 5, dec!(50.00));
                t.add_credit(12, 5, dec!(80.00));
                t.add_credit(20, 6, dec!(40.00));
                t.add_payment(1, 10, dec!(0.00));
            })
            .await;
        store
    }

    #[tokio::test]
    async fn test_partial_payment_keeps_credit_open() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let out = post_payment(session.as_mut(), &ctx(), request(10, dec!(40)))
            .await
            .unwrap();
        session.commit().await.unwrap();

        assert_eq!(out.saldo_anterior, dec!(100.00));
        assert_eq!(out.nuevo_saldo, dec!(60.00));
        assert!(!out.credito_liquidado);
        assert!(out.pendientes.is_none());
        assert_eq!(out.insertados.historial.len(), 1);
        assert_eq!(out.insertados.historial[0].usu_id, UserId::new(23));

        let tables = store.snapshot().await;
        assert_eq!(tables.credits[&CreditId::new(10)].status, 1);
        assert_eq!(tables.cash_drawers[&CashDrawerId::new(1)].total, dec!(40.00));
    }

    #[tokio::test]
    async fn test_exact_payment_settles() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let out = post_payment(session.as_mut(), &ctx(), request(11, dec!(50)))
            .await
            .unwrap();
        session.commit().await.unwrap();

        assert!(out.credito_liquidado);
        assert_eq!(out.nuevo_saldo, Decimal::ZERO);
        assert_eq!(out.insertados.historial.len(), 2);
        assert_eq!(out.insertados.historial[1].tabla, "CreditoCliente");
        assert_eq!(
            store.snapshot().await.credits[&CreditId::new(11)].status,
            2
        );
    }

    #[tokio::test]
    async fn test_overpayment_rejected_without_writes() {
        let store = store().await;
        let before = store.snapshot().await;
        let mut session = store.begin().await.unwrap();
        let err = post_payment(session.as_mut(), &ctx(), request(11, dec!(50.01)))
            .await
            .unwrap_err();
        drop(session);

        assert_eq!(err.code(), "limit_exceeded");
        let after = store.snapshot().await;
        assert_eq!(after.payments.len(), before.payments.len());
        assert!(after.movements.is_empty());
        assert_eq!(after.cash_drawers, before.cash_drawers);
    }

    #[tokio::test]
    async fn test_card_requires_kind() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let mut req = request(10, dec!(10));
        req.tpa_id = 6;
        let err = post_payment(session.as_mut(), &ctx(), req).await.unwrap_err();
        assert_eq!(err.code(), "validation");
    }

    #[tokio::test]
    async fn test_missing_drawer() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let mut req = request(10, dec!(10));
        req.caj_id = Some(CashDrawerId::new(9));
        let err = post_payment(session.as_mut(), &ctx(), req).await.unwrap_err();
        assert_eq!(err.to_string(), "Caja ID 9 no encontrado");
    }

    #[tokio::test]
    async fn test_pending_excludes_own_payment() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let mut req = request(10, dec!(10));
        req.ultimo_acl_id = Some(PaymentId::new(0));
        let out = post_payment(session.as_mut(), &ctx(), req).await.unwrap();

        let pending = out.pendientes.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].abonocliente.acl_id, PaymentId::new(1));
    }

    fn multi(ids: &[i64], monto: Decimal) -> MultiPaymentRequest {
        MultiPaymentRequest {
            ccl_ids: ids.iter().copied().map(CreditId::new).collect(),
            monto,
            tpa_id: 4,
            referencia: Some("Transferencia".into()),
            caj_id: None,
            usu_id: None,
            tipo_tarjeta: None,
            ultimo_acl_id: None,
        }
    }

    #[tokio::test]
    async fn test_split_fills_in_caller_order() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let out = post_multi_payment(session.as_mut(), &ctx(), multi(&[10, 11, 12], dec!(120)))
            .await
            .unwrap();
        session.commit().await.unwrap();

        assert_eq!(out.liquidados, vec![CreditId::new(10)]);
        assert_eq!(out.parciales, vec![CreditId::new(11)]);
        assert_eq!(out.sin_aplicar, vec![CreditId::new(12)]);
        assert_eq!(out.distribucion[0].monto_aplicado, dec!(100.00));
        assert_eq!(out.distribucion[1].monto_aplicado, dec!(20.00));
        assert_eq!(out.distribucion[1].nuevo_saldo, dec!(30.00));

        let tables = store.snapshot().await;
        let legs: Vec<_> = tables
            .payments
            .values()
            .filter(|p| p.acp_id == Some(out.acp_id))
            .collect();
        assert_eq!(legs.len(), 2);
        assert!(legs.iter().all(|p| p.comentario.is_empty()));
        assert_eq!(tables.payment_groups[&out.acp_id].comentario, "Transferencia");
        assert_eq!(tables.cash_drawers[&CashDrawerId::new(1)].total, dec!(120.00));
    }

    #[tokio::test]
    async fn test_split_rejects_mixed_clients() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        let err = post_multi_payment(session.as_mut(), &ctx(), multi(&[10, 20], dec!(10)))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "state_conflict");
    }

    #[tokio::test]
    async fn test_sync_and_balance() {
        let store = store().await;
        let mut session = store.begin().await.unwrap();
        post_payment(session.as_mut(), &ctx(), request(12, dec!(30)))
            .await
            .unwrap();

        let synced = sync_payments(
            session.as_mut(),
            SyncQuery {
                desde: Some(PaymentId::new(1)),
                ccl_id: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(synced.total, 1);
        assert!(synced.abonos[0].movimiento.is_some());

        let balance = credit_status(session.as_mut(), &ctx(), CreditId::new(12))
            .await
            .unwrap();
        assert_eq!(balance.saldo, dec!(50.00));
        assert!(!balance.liquidado);
    }
}
