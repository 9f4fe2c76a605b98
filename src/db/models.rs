use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::value::to_record;
use crate::error::ShimError;
use crate::query::{Lookup, UpsertArgs};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct DbExchangeRate {
    pub id: i64,
    pub currency: String,
    pub rate: f64,
    pub is_stable: bool,
    pub volatility: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub struct DbSupplier {
    /// `supp_<epoch-millis>_<base36>`, assigned on the insert branch only.
    pub id: String,
    pub external_id: String,
    pub name: String,
    pub country: Option<String>,
    pub contact_email: Option<String>,
    pub rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRateCreate {
    pub rate: f64,
    pub is_stable: bool,
    pub volatility: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRatePatch {
    /// `None` => do not change; `Some(v)` => update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_stable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Upsert keyed on `currency`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRateUpsert {
    pub currency: String,
    pub update: ExchangeRatePatch,
    pub create: ExchangeRateCreate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierPatch {
    /// `None` => do not change; `Some(v)` => update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

/// Upsert keyed on `externalId`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierUpsert {
    pub external_id: String,
    pub update: SupplierPatch,
    pub create: SupplierCreate,
}

impl TryFrom<&ExchangeRateUpsert> for UpsertArgs {
    type Error = ShimError;

    fn try_from(u: &ExchangeRateUpsert) -> Result<Self, Self::Error> {
        Ok(UpsertArgs {
            lookup: Lookup::new("currency", u.currency.clone()),
            update: to_record(&u.update)?,
            create: to_record(&u.create)?,
        })
    }
}

impl TryFrom<&SupplierUpsert> for UpsertArgs {
    type Error = ShimError;

    fn try_from(u: &SupplierUpsert) -> Result<Self, Self::Error> {
        Ok(UpsertArgs {
            lookup: Lookup::new("externalId", u.external_id.clone()),
            update: to_record(&u.update)?,
            create: to_record(&u.create)?,
        })
    }
}
