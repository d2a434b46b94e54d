use crate::api::{AdvisoryValidation, ApiError, CatalogApi, RemoteVerdict};
use crate::app::state::{SubmitFailure, SubmitMode};
use crate::catalog::{sort_by_created_desc, Product, ProductId, ProductPayload};

/// Runs catalog operations against a backend, applying the remote validation policy.
pub struct ActionDispatcher<'a> {
    api: &'a dyn CatalogApi,
    validation: AdvisoryValidation,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(api: &'a dyn CatalogApi, validation: AdvisoryValidation) -> Self {
        Self { api, validation }
    }

    pub fn load_products(&self) -> Result<Vec<Product>, ApiError> {
        let products = self.api.list_products().inspect_err(|err| {
            tracing::error!(error = %err, "loading products failed");
        })?;
        tracing::info!(count = products.len(), "products loaded");
        Ok(sort_by_created_desc(&products))
    }

    /// Validates remotely, then creates or updates depending on `editing`.
    pub fn submit(
        &self,
        payload: &ProductPayload,
        editing: Option<&ProductId>,
    ) -> Result<Product, SubmitFailure> {
        if let RemoteVerdict::Rejected(errors) = self.validation.check(self.api, payload) {
            return Err(SubmitFailure::Rejected(errors));
        }
        let result = match editing {
            Some(id) => self.api.update_product(id, payload),
            None => self.api.create_product(payload),
        };
        result
            .inspect(|product| {
                tracing::info!(id = %product.id, mode = ?Self::mode(editing), "product saved");
            })
            .map_err(|err| {
                tracing::error!(error = %err, mode = ?Self::mode(editing), "saving product failed");
                SubmitFailure::Failed {
                    detail: err.to_string(),
                }
            })
    }

    pub fn delete(&self, id: &ProductId) -> Result<(), ApiError> {
        self.api
            .delete_product(id)
            .inspect(|_| tracing::info!(%id, "product deleted"))
            .inspect_err(|err| tracing::error!(%id, error = %err, "deleting product failed"))
    }

    pub fn mode(editing: Option<&ProductId>) -> SubmitMode {
        if editing.is_some() {
            SubmitMode::Update
        } else {
            SubmitMode::Create
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::{ValidationPolicy, ValidationVerdict};
    use assert_matches::assert_matches;
    use std::sync::{Arc, Mutex};

    /// In-memory backend that records calls.
    #[derive(Clone, Default)]
    pub(crate) struct FakeApi {
        pub products: Vec<Product>,
        pub verdict: Option<ValidationVerdict>,
        pub fail_writes: bool,
        pub calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeApi {
        fn record(&self, call: impl Into<String>) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call.into());
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
        }

        fn outage(method: &str, path: &str) -> ApiError {
            ApiError::Status {
                method: method.into(),
                url: format!("http://localhost:3000{path}"),
                status: 503,
                body: String::new(),
            }
        }

        fn stored(id: i64, payload: &ProductPayload) -> Product {
            Product {
                id: ProductId::Number(id),
                titulo: payload.titulo.clone(),
                descricao: Some(payload.descricao.clone()),
                preco: payload.preco,
                categoria: payload.categoria.clone(),
                estoque: payload.estoque,
                data_criacao: Some("2024-06-01T10:00:00Z".into()),
            }
        }
    }

    impl CatalogApi for FakeApi {
        fn list_products(&self) -> Result<Vec<Product>, ApiError> {
            self.record("list");
            Ok(self.products.clone())
        }

        fn create_product(&self, payload: &ProductPayload) -> Result<Product, ApiError> {
            self.record("create");
            if self.fail_writes {
                return Err(Self::outage("POST", "/produtos"));
            }
            Ok(Self::stored(99, payload))
        }

        fn update_product(&self, id: &ProductId, payload: &ProductPayload) -> Result<Product, ApiError> {
            self.record(format!("update {id}"));
            if self.fail_writes {
                return Err(Self::outage("PUT", "/produtos"));
            }
            let mut product = Self::stored(0, payload);
            product.id = id.clone();
            Ok(product)
        }

        fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
            self.record(format!("delete {id}"));
            if self.fail_writes {
                return Err(Self::outage("DELETE", "/produtos"));
            }
            Ok(())
        }

        fn validate_product(&self, _: &ProductPayload) -> Result<ValidationVerdict, ApiError> {
            self.record("validate");
            self.verdict
                .clone()
                .ok_or_else(|| Self::outage("POST", "/validar-produto"))
        }
    }

    pub(crate) fn payload() -> ProductPayload {
        ProductPayload {
            titulo: "Cenoura Orgânica".into(),
            descricao: "Colhida na semana".into(),
            preco: 4.75,
            categoria: "Legume".into(),
            estoque: Some(30),
            data_criacao: None,
        }
    }

    #[test]
    fn unreachable_validation_still_creates() {
        let api = FakeApi::default();
        let dispatcher = ActionDispatcher::new(&api, AdvisoryValidation::default());
        let product = dispatcher.submit(&payload(), None).expect("created");
        assert_eq!(product.id, ProductId::Number(99));
        assert_eq!(api.calls(), vec!["validate", "create"]);
    }

    #[test]
    fn explicit_rejection_skips_create() {
        let api = FakeApi {
            verdict: Some(ValidationVerdict {
                valido: false,
                erros: Some(vec!["Categoria não aceita.".into()]),
            }),
            ..FakeApi::default()
        };
        let dispatcher = ActionDispatcher::new(&api, AdvisoryValidation::default());
        let err = dispatcher.submit(&payload(), None).expect_err("rejected");
        assert_eq!(err, SubmitFailure::Rejected(vec!["Categoria não aceita.".into()]));
        assert_eq!(api.calls(), vec!["validate"]);
    }

    #[test]
    fn editing_issues_update() {
        let api = FakeApi {
            verdict: Some(ValidationVerdict {
                valido: true,
                erros: None,
            }),
            ..FakeApi::default()
        };
        let dispatcher = ActionDispatcher::new(&api, AdvisoryValidation::default());
        let id = ProductId::from("abc");
        let product = dispatcher.submit(&payload(), Some(&id)).expect("updated");
        assert_eq!(product.id, id);
        assert_eq!(api.calls(), vec!["validate", "update abc"]);
    }

    #[test]
    fn write_failure_is_reported() {
        let api = FakeApi {
            fail_writes: true,
            ..FakeApi::default()
        };
        let dispatcher =
            ActionDispatcher::new(&api, AdvisoryValidation::new(ValidationPolicy::Off));
        assert_matches!(
            dispatcher.submit(&payload(), None),
            Err(SubmitFailure::Failed { .. })
        );
        assert!(dispatcher.delete(&ProductId::Number(1)).is_err());
        assert_eq!(api.calls(), vec!["create", "delete 1"]);
    }

    #[test]
    fn load_sorts_newest_first() {
        let older = FakeApi::stored(1, &payload());
        let mut newer = FakeApi::stored(2, &payload());
        newer.data_criacao = Some("2024-07-01T00:00:00Z".into());
        let api = FakeApi {
            products: vec![older, newer],
            ..FakeApi::default()
        };
        let products = ActionDispatcher::new(&api, AdvisoryValidation::default())
            .load_products()
            .expect("load");
        assert_eq!(products[0].id, ProductId::Number(2));
    }
}
