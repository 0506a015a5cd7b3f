//! Customer creation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use tunnel_core::validation::{int_in, max_len, min_decimal, require_text, status_flag};
use tunnel_core::{ClientGroupId, ClientId, Result, TaxRegimeId, TunnelError, UserId};
use tunnel_store::schema::audit;
use tunnel_store::{HistoryRow, NewClient, Session};

use super::{flag, FlexBool};
use crate::state::WriteContext;

/// Body of `POST /api/clientes`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientRequest {
    /// Customer fields.
    pub cliente: ClientInput,
    /// Acting user, defaults to the bot user.
    pub usu_id: Option<UserId>,
}

/// Customer fields as CUSPI sends them.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct ClientInput {
    pub nombre: Option<String>,
    pub representante: Option<String>,
    pub domicilio: Option<String>,
    pub no_ext: Option<String>,
    pub no_int: Option<String>,
    pub localidad: Option<String>,
    pub ciudad: Option<String>,
    pub estado: Option<String>,
    pub pais: Option<String>,
    pub codigo_postal: Option<String>,
    pub colonia: Option<String>,
    pub rfc: Option<String>,
    pub curp: Option<String>,
    pub telefono: Option<String>,
    pub celular: Option<String>,
    pub mail: Option<String>,
    pub comentario: Option<String>,
    pub status: Option<i32>,
    pub limite: Option<Decimal>,
    pub precio: Option<i32>,
    pub dias_credito: Option<i32>,
    pub retener: Option<FlexBool>,
    #[serde(rename = "desglosarIEPS")]
    pub desglosar_ieps: Option<FlexBool>,
    pub notificar: Option<FlexBool>,
    pub clave: Option<String>,
    pub uso_cfdi: Option<String>,
    #[serde(rename = "idCIF")]
    pub id_cif: Option<String>,
    pub edu_nivel: Option<String>,
    pub edu_clave: Option<String>,
    pub edu_rfc: Option<String>,
    pub edu_nombre: Option<String>,
    #[serde(rename = "grc_id")]
    pub grc_id: Option<ClientGroupId>,
    #[serde(rename = "rgf_id")]
    pub rgf_id: Option<TaxRegimeId>,
}

/// The inserted customer row with its key.
#[derive(Debug, Clone, Serialize)]
pub struct InsertedClient {
    /// Key.
    pub cli_id: ClientId,
    /// Columns written.
    #[serde(flatten)]
    pub row: NewClient,
}

/// Rows written for a new customer.
#[derive(Debug, Clone, Serialize)]
pub struct ClientRows {
    /// The customer.
    pub cliente: InsertedClient,
    /// Audit entry.
    pub historial: HistoryRow,
}

/// Result of a customer creation.
#[derive(Debug, Clone, Serialize)]
pub struct ClientOutcome {
    /// New customer id.
    pub cli_id: ClientId,
    /// Rows written.
    pub insertados: ClientRows,
}

impl ClientInput {
    fn validate_lengths(&self) -> Result<()> {
        let limits: [(&str, &Option<String>, usize); 24] = [
            ("nombre", &self.nombre, 1000),
            ("representante", &self.representante, 1000),
            ("domicilio", &self.domicilio, 120),
            ("localidad", &self.localidad, 120),
            ("ciudad", &self.ciudad, 120),
            ("noExt", &self.no_ext, 45),
            ("noInt", &self.no_int, 45),
            ("estado", &self.estado, 45),
            ("pais", &self.pais, 45),
            ("colonia", &self.colonia, 45),
            ("rfc", &self.rfc, 45),
            ("curp", &self.curp, 45),
            ("telefono", &self.telefono, 45),
            ("celular", &self.celular, 45),
            ("clave", &self.clave, 45),
            ("eduRfc", &self.edu_rfc, 45),
            ("codigoPostal", &self.codigo_postal, 10),
            ("usoCfdi", &self.uso_cfdi, 10),
            ("mail", &self.mail, 255),
            ("comentario", &self.comentario, 255),
            ("idCIF", &self.id_cif, 20),
            ("eduNivel", &self.edu_nivel, 128),
            ("eduClave", &self.edu_clave, 128),
            ("eduNombre", &self.edu_nombre, 120),
        ];
        for (field, value, max) in limits {
            max_len(field, value.as_deref(), max)?;
        }
        Ok(())
    }

    fn into_row(self, nombre: String) -> Result<NewClient> {
        let defaults = NewClient::named(nombre);
        Ok(NewClient {
            status: self
                .status
                .map_or(Ok(defaults.status), |s| status_flag("status", s))?,
            limite: self
                .limite
                .map_or(Ok(defaults.limite), |l| min_decimal("limite", l, Decimal::ZERO))?,
            precio: self
                .precio
                .map_or(Ok(defaults.precio), |p| int_in("precio", p, 1..=5))?,
            dias_credito: self
                .dias_credito
                .map_or(Ok(defaults.dias_credito), |d| {
                    int_in("diasCredito", d, 0..=i32::MAX)
                })?,
            retener: flag("retener", self.retener.as_ref(), defaults.retener)?,
            desglosar_ieps: flag(
                "desglosarIEPS",
                self.desglosar_ieps.as_ref(),
                defaults.desglosar_ieps,
            )?,
            notificar: flag("notificar", self.notificar.as_ref(), defaults.notificar)?,
            representante: self.representante.unwrap_or_default(),
            domicilio: self.domicilio.unwrap_or_default(),
            no_ext: self.no_ext.unwrap_or_default(),
            no_int: self.no_int.unwrap_or_default(),
            localidad: self.localidad.unwrap_or_default(),
            ciudad: self.ciudad.unwrap_or_default(),
            estado: self.estado.unwrap_or_default(),
            pais: self.pais.unwrap_or_default(),
            codigo_postal: self.codigo_postal.unwrap_or_default(),
            colonia: self.colonia.unwrap_or_default(),
            rfc: self.rfc.unwrap_or_default(),
            curp: self.curp.unwrap_or_default(),
            telefono: self.telefono.unwrap_or_default(),
            celular: self.celular.unwrap_or_default(),
            mail: self.mail.unwrap_or_default(),
            comentario: self.comentario.unwrap_or_default(),
            clave: self.clave.filter(|c| !c.trim().is_empty()),
            uso_cfdi: self.uso_cfdi,
            id_cif: self.id_cif,
            edu_nivel: self.edu_nivel,
            edu_clave: self.edu_clave,
            edu_rfc: self.edu_rfc,
            edu_nombre: self.edu_nombre,
            grc_id: self.grc_id,
            rgf_id: self.rgf_id,
            nombre: defaults.nombre,
        })
    }
}

/// Create a customer and its audit entry.
pub async fn create_client(
    session: &mut dyn Session,
    ctx: &WriteContext,
    req: ClientRequest,
) -> Result<ClientOutcome> {
    let input = req.cliente;
    input.validate_lengths()?;
    let nombre = require_text("cliente.nombre", input.nombre.as_deref())?.to_string();
    let row = input.into_row(nombre)?;

    if let Some(clave) = &row.clave {
        if session.client_key_exists(clave).await? {
            return Err(TunnelError::conflict(format!(
                "La clave '{clave}' ya existe en otro cliente"
            )));
        }
    }
    if let Some(grc_id) = row.grc_id {
        if !session.client_group_active(grc_id).await? {
            return Err(TunnelError::conflict(format!(
                "El grupo de cliente ID {grc_id} no existe o está inactivo"
            )));
        }
    }
    if let Some(rgf_id) = row.rgf_id {
        if !session.tax_regime_exists(rgf_id).await? {
            return Err(TunnelError::conflict(format!(
                "El régimen fiscal ID {rgf_id} no existe"
            )));
        }
    }

    let cli_id = session.insert_client(row.clone()).await?;
    debug!(%cli_id, nombre = %row.nombre, "Cliente insertado");

    let historial = HistoryRow {
        id: cli_id.get(),
        tabla: audit::CLIENT.to_string(),
        movimiento: audit::MOVE_WRITE,
        usu_id: req.usu_id.unwrap_or(ctx.defaults.bot_usu_id),
        fecha: ctx.now,
    };
    session.insert_history(historial.clone()).await?;

    Ok(ClientOutcome {
        cli_id,
        insertados: ClientRows {
            cliente: InsertedClient { cli_id, row },
            historial,
        },
    })
}
