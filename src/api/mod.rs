//! HTTP access to the catalog backend.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{null_as_default, Product, ProductId, ProductPayload};
use crate::config::ApiConfig;

pub mod validation;

pub use validation::{AdvisoryValidation, RemoteVerdict, ValidationPolicy};

const PRODUCTS_PATH: &str = "produtos";
const VALIDATE_PATH: &str = "validar-produto";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("building HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: String,
        url: String,
        status: u16,
        body: String,
    },
    #[error("decoding response from {method} {url}: {source}")]
    Decode {
        method: String,
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Verdict returned by `POST /validar-produto`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    #[serde(default, deserialize_with = "null_as_default")]
    pub valido: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub erros: Option<Vec<String>>,
}

/// The five backend calls the client relies on.
pub trait CatalogApi: Send {
    fn list_products(&self) -> Result<Vec<Product>, ApiError>;
    fn create_product(&self, payload: &ProductPayload) -> Result<Product, ApiError>;
    fn update_product(&self, id: &ProductId, payload: &ProductPayload)
        -> Result<Product, ApiError>;
    fn delete_product(&self, id: &ProductId) -> Result<(), ApiError>;
    fn validate_product(&self, payload: &ProductPayload) -> Result<ValidationVerdict, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: Url,
}

impl HttpCatalogClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url).map_err(|err| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "URL cannot carry a path".into(),
            });
        }

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::new(&config.base_url, config.timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<String, ApiError> {
        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().map_err(|source| ApiError::Transport {
            method: method.to_string(),
            url: url.to_string(),
            source,
        })?;
        let status = response.status();
        let text = response.text().map_err(|source| ApiError::Transport {
            method: method.to_string(),
            url: url.to_string(),
            source,
        })?;
        tracing::debug!(%method, %url, status = status.as_u16(), "catalog request finished");
        if !status.is_success() {
            return Err(ApiError::Status {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }

    fn decode<T: DeserializeOwned>(method: &Method, url: &Url, text: &str) -> Result<T, ApiError> {
        serde_json::from_str(text).map_err(|source| ApiError::Decode {
            method: method.to_string(),
            url: url.to_string(),
            source,
        })
    }
}

impl CatalogApi for HttpCatalogClient {
    fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let url = self.endpoint(&[PRODUCTS_PATH]);
        let text = self.execute::<()>(Method::GET, url.clone(), None)?;
        let value: serde_json::Value = Self::decode(&Method::GET, &url, &text)?;
        if !value.is_array() {
            tracing::warn!(%url, "product listing was not an array; treating as empty");
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|source| ApiError::Decode {
            method: Method::GET.to_string(),
            url: url.to_string(),
            source,
        })
    }

    fn create_product(&self, payload: &ProductPayload) -> Result<Product, ApiError> {
        let url = self.endpoint(&[PRODUCTS_PATH]);
        let text = self.execute(Method::POST, url.clone(), Some(payload))?;
        Self::decode(&Method::POST, &url, &text)
    }

    fn update_product(
        &self,
        id: &ProductId,
        payload: &ProductPayload,
    ) -> Result<Product, ApiError> {
        let id = id.to_string();
        let url = self.endpoint(&[PRODUCTS_PATH, id.as_str()]);
        let text = self.execute(Method::PUT, url.clone(), Some(payload))?;
        Self::decode(&Method::PUT, &url, &text)
    }

    fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let id = id.to_string();
        let url = self.endpoint(&[PRODUCTS_PATH, id.as_str()]);
        self.execute::<()>(Method::DELETE, url, None)?;
        Ok(())
    }

    fn validate_product(&self, payload: &ProductPayload) -> Result<ValidationVerdict, ApiError> {
        let url = self.endpoint(&[VALIDATE_PATH]);
        let text = self.execute(Method::POST, url.clone(), Some(payload))?;
        Self::decode(&Method::POST, &url, &text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer) -> HttpCatalogClient {
        HttpCatalogClient::new(&server.base_url(), Duration::from_secs(5)).expect("client")
    }

    fn payload() -> ProductPayload {
        ProductPayload {
            titulo: "Tomate Italiano".into(),
            descricao: String::new(),
            preco: 8.5,
            categoria: "Legume".into(),
            estoque: Some(12),
            data_criacao: None,
        }
    }

    #[test]
    fn lists_products() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/produtos")
                .header("content-type", "application/json");
            then.status(200).json_body(json!([
                { "id": 1, "titulo": "Alface Crespa", "preco": 3.5, "categoria": "Verdura" },
                { "id": 2, "titulo": "Banana Prata", "preco": "6.90", "categoria": "Fruta",
                  "dataCriacao": "2024-02-01" }
            ]));
        });

        let products = client_for(&server).list_products().expect("list");
        mock.assert();
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].preco, 6.9);
    }

    #[test]
    fn non_array_listing_is_empty() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/produtos");
            then.status(200).json_body(json!({ "items": [] }));
        });
        let products = client_for(&server).list_products().expect("list");
        assert!(products.is_empty());
    }

    #[test]
    fn creates_with_json_payload() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path("/produtos").json_body(json!({
                "titulo": "Tomate Italiano",
                "descricao": "",
                "preco": 8.5,
                "categoria": "Legume",
                "estoque": 12
            }));
            then.status(201).json_body(json!({
                "id": 10,
                "titulo": "Tomate Italiano",
                "preco": 8.5,
                "categoria": "Legume",
                "estoque": 12,
                "dataCriacao": "2024-06-01T12:00:00Z"
            }));
        });

        let created = client_for(&server).create_product(&payload()).expect("create");
        mock.assert();
        assert_eq!(created.id, ProductId::Number(10));
    }

    #[test]
    fn updates_and_deletes_by_id() {
        let server = MockServer::start();
        let update = server.mock(|when, then| {
            when.method(PUT).path("/produtos/10");
            then.status(200).json_body(json!({
                "id": 10, "titulo": "Tomate Italiano", "preco": 8.5, "categoria": "Legume"
            }));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/produtos/10");
            then.status(204);
        });

        let client = client_for(&server);
        let id = ProductId::Number(10);
        client.update_product(&id, &payload()).expect("update");
        client.delete_product(&id).expect("delete");
        update.assert();
        delete.assert();
    }

    #[test]
    fn base_url_path_prefix_is_kept() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/produtos");
            then.status(200).json_body(json!([]));
        });
        let client =
            HttpCatalogClient::new(&server.url("/api/"), Duration::from_secs(5)).expect("client");
        client.list_products().expect("list");
        mock.assert();
    }

    #[test]
    fn reads_validation_verdict() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/validar-produto");
            then.status(200)
                .json_body(json!({ "valido": false, "erros": ["Preço acima do permitido."] }));
        });
        let verdict = client_for(&server).validate_product(&payload()).expect("verdict");
        assert!(!verdict.valido);
        assert_eq!(verdict.erros, Some(vec!["Preço acima do permitido.".to_string()]));
    }

    #[test]
    fn null_verdict_counts_as_rejection() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/validar-produto");
            then.status(200).json_body(json!({ "valido": null, "erros": null }));
        });
        let client = client_for(&server);
        let verdict = client.validate_product(&payload()).expect("verdict");
        assert!(!verdict.valido);
        assert_eq!(
            AdvisoryValidation::default().check(&client, &payload()),
            RemoteVerdict::Rejected(vec![validation::FALLBACK_REJECTION.to_string()])
        );
    }

    #[test]
    fn non_success_status_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/produtos");
            then.status(500).body("boom");
        });
        let err = client_for(&server).create_product(&payload()).expect_err("500");
        assert_matches!(err, ApiError::Status { status: 500, ref body, .. } if body == "boom");
    }

    #[test]
    fn unreachable_backend_is_a_transport_error() {
        let client =
            HttpCatalogClient::new("http://127.0.0.1:9", Duration::from_millis(500)).expect("client");
        let err = client.list_products().expect_err("nothing listens on port 9");
        assert_matches!(err, ApiError::Transport { .. });
    }

    #[test]
    fn rejects_unusable_base_url() {
        let err = HttpCatalogClient::new("not a url", Duration::from_secs(1)).expect_err("invalid");
        assert_matches!(err, ApiError::InvalidBaseUrl { .. });
    }
}
