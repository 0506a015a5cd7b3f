//! Write workflows.
//!
//! Each workflow validates its request, reads what it needs and writes its
//! rows through one [`Session`](tunnel_store::Session). Handlers open the
//! session, run the workflow and commit; any error drops the session and the
//! transaction is rolled back.

pub mod clients;
pub mod orders;
pub mod payments;
pub mod quotations;
pub mod sales;
pub mod suppliers;

use std::collections::BTreeMap;

use serde::Deserialize;

use tunnel_core::{ArticleId, ClientId, Result, TunnelError};
use tunnel_store::{ArticleRow, ClientRow, Session};

/// A boolean sent as `true`/`false`, `0`/`1` or `"0"`/`"1"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FlexBool {
    /// JSON boolean.
    Bool(bool),
    /// JSON number.
    Int(i64),
    /// JSON string.
    Text(String),
}

impl FlexBool {
    /// Interpret the value, rejecting anything that is not a boolean.
    pub fn parse(&self, field: &str) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Int(0) => Ok(false),
            Self::Int(1) => Ok(true),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "0" | "false" => Ok(false),
                "1" | "true" => Ok(true),
                _ => Err(invalid_bool(field)),
            },
            Self::Int(_) => Err(invalid_bool(field)),
        }
    }
}

fn invalid_bool(field: &str) -> TunnelError {
    TunnelError::validation(format!("El campo {field} debe ser verdadero o falso"))
}

/// Parse an optional flag, falling back to `default`.
pub(crate) fn flag(field: &str, value: Option<&FlexBool>, default: bool) -> Result<bool> {
    value.map_or(Ok(default), |v| v.parse(field))
}

/// Load an active customer.
pub(crate) async fn active_client(
    session: &mut dyn Session,
    cli_id: ClientId,
) -> Result<ClientRow> {
    let client = session
        .get_client(cli_id)
        .await?
        .ok_or(TunnelError::NotFound {
            entity: "Cliente",
            id: cli_id.get(),
        })?;
    if client.status != 1 {
        return Err(TunnelError::conflict(format!(
            "El cliente {cli_id} está inactivo"
        )));
    }
    Ok(client)
}

/// Load every listed article, failing with all missing or inactive ids at once.
pub(crate) async fn active_articles(
    session: &mut dyn Session,
    ids: &[ArticleId],
) -> Result<BTreeMap<ArticleId, ArticleRow>> {
    let mut found = BTreeMap::new();
    let mut invalid = Vec::new();

    for &art_id in ids {
        if found.contains_key(&art_id) || invalid.contains(&art_id) {
            continue;
        }
        match session.get_article(art_id).await? {
            Some(article) if article.is_active() => {
                found.insert(art_id, article);
            }
            _ => invalid.push(art_id),
        }
    }

    if invalid.is_empty() {
        Ok(found)
    } else {
        let list = invalid
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Err(TunnelError::conflict(format!(
            "Artículos inválidos o inactivos: {list}"
        )))
    }
}
