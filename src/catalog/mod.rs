use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

pub mod filter;
pub mod reconcile;
pub mod validation;

pub use filter::{filter_products, CatalogFilter, CategoryFilter};
pub use reconcile::{reconcile_created, reconcile_deleted, reconcile_updated, sort_by_created_desc};
pub use validation::{validate_draft, FieldErrors, FormField};

/// Server-assigned identifier. Kept opaque: numeric ids stay numeric on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Number(id) => write!(f, "{id}"),
            ProductId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ProductId {
    fn from(value: i64) -> Self {
        ProductId::Number(value)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        ProductId::Text(value.to_string())
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum Categoria {
    Fruta,
    Legume,
    Verdura,
}

impl Categoria {
    pub fn icon(self) -> &'static str {
        match self {
            Categoria::Fruta => "🍊",
            Categoria::Legume => "🥕",
            Categoria::Verdura => "🥬",
        }
    }

    /// Steps through the fixed set, wrapping at both ends.
    pub fn cycle(self, delta: isize) -> Self {
        let all: Vec<Categoria> = Categoria::iter().collect();
        let len = all.len() as isize;
        let current = all.iter().position(|c| *c == self).unwrap_or(0) as isize;
        all[(current + delta).rem_euclid(len) as usize]
    }
}

/// A catalog record as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub titulo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub preco: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categoria: String,
    #[serde(
        default,
        deserialize_with = "lenient_stock",
        skip_serializing_if = "Option::is_none"
    )]
    pub estoque: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_criacao: Option<String>,
}

impl Product {
    /// Milliseconds since the epoch; missing or unparseable dates count as 0.
    pub fn created_timestamp(&self) -> i64 {
        self.created_at()
            .map(|dt| (dt.unix_timestamp_nanos() / 1_000_000) as i64)
            .unwrap_or(0)
    }

    pub fn created_at(&self) -> Option<OffsetDateTime> {
        self.data_criacao.as_deref().and_then(parse_created_at)
    }

    pub fn category(&self) -> Option<Categoria> {
        self.categoria.parse().ok()
    }
}

/// Raw form values for a product, exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub titulo: String,
    pub descricao: String,
    pub preco: String,
    pub categoria: String,
    pub estoque: String,
    pub data_criacao: String,
}

impl Default for ProductDraft {
    fn default() -> Self {
        Self {
            titulo: String::new(),
            descricao: String::new(),
            preco: String::new(),
            categoria: Categoria::Fruta.to_string(),
            estoque: String::new(),
            data_criacao: String::new(),
        }
    }
}

impl ProductDraft {
    pub fn from_product(product: &Product) -> Self {
        let categoria = if product.categoria.is_empty() {
            Categoria::Fruta.to_string()
        } else {
            product.categoria.clone()
        };
        Self {
            titulo: product.titulo.clone(),
            descricao: product.descricao.clone().unwrap_or_default(),
            preco: product.preco.to_string(),
            categoria,
            estoque: product.estoque.map(|n| n.to_string()).unwrap_or_default(),
            data_criacao: product.data_criacao.clone().unwrap_or_default(),
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Titulo => &self.titulo,
            FormField::Descricao => &self.descricao,
            FormField::Preco => &self.preco,
            FormField::Categoria => &self.categoria,
            FormField::Estoque => &self.estoque,
        }
    }

    pub fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Titulo => &mut self.titulo,
            FormField::Descricao => &mut self.descricao,
            FormField::Preco => &mut self.preco,
            FormField::Categoria => &mut self.categoria,
            FormField::Estoque => &mut self.estoque,
        }
    }

    pub fn cycle_categoria(&mut self, delta: isize) {
        let next = match self.categoria.parse::<Categoria>() {
            Ok(current) => current.cycle(delta),
            Err(_) => Categoria::Fruta,
        };
        self.categoria = next.to_string();
    }

    /// Validates the draft and, when every field passes, builds the request body.
    pub fn to_payload(&self) -> Result<ProductPayload, FieldErrors> {
        let errors = validate_draft(self);
        if !errors.is_empty() {
            return Err(errors);
        }
        let preco = parse_locale_number(&self.preco).ok_or_else(|| {
            let mut errors = FieldErrors::default();
            errors.insert(FormField::Preco, validation::PRECO_MESSAGE);
            errors
        })?;
        let estoque = parse_locale_number(&self.estoque).map(|n| n as i64);
        let data_criacao = Some(self.data_criacao.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        Ok(ProductPayload {
            titulo: self.titulo.trim().to_string(),
            descricao: self.descricao.trim().to_string(),
            preco,
            categoria: self.categoria.clone(),
            estoque,
            data_criacao,
        })
    }
}

/// Body sent to the create, update and validation endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub titulo: String,
    pub descricao: String,
    pub preco: f64,
    pub categoria: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estoque: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_criacao: Option<String>,
}

/// Parses user-typed numbers, accepting a comma as decimal separator.
pub fn parse_locale_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Accepts RFC 3339, offset-less timestamps and bare dates; the latter two are read as UTC.
pub fn parse_created_at(raw: &str) -> Option<OffsetDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Some(dt);
    }
    let local = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    if let Ok(dt) = PrimitiveDateTime::parse(trimmed, &local) {
        return Some(dt.assume_utc());
    }
    let date_only = format_description!("[year]-[month]-[day]");
    Date::parse(trimmed, &date_only)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Reads an explicit `null` the same as a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
    Null(()),
}

impl RawNumber {
    fn value(self) -> Option<f64> {
        match self {
            RawNumber::Number(value) => Some(value).filter(|value| value.is_finite()),
            RawNumber::Text(text) => parse_locale_number(&text),
            RawNumber::Null(()) => None,
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RawNumber::deserialize(deserializer)?.value().unwrap_or(0.0))
}

/// Stock counts are whole units; fractional values are truncated toward zero.
fn lenient_stock<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RawNumber::deserialize(deserializer)?
        .value()
        .map(|value| value.trunc() as i64))
}
