use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::api::{AdvisoryValidation, CatalogApi};
use crate::app::actions::ActionDispatcher;
use crate::app::state::{ApiRequest, PageAction};

/// Background thread that performs backend calls so the UI never blocks on the network.
///
/// Requests are handled one at a time in submission order; each produces exactly one
/// result action.
pub struct ApiWorker {
    requests: Sender<ApiRequest>,
    results: Receiver<PageAction>,
    handle: Option<JoinHandle<()>>,
}

impl ApiWorker {
    pub fn spawn(api: Box<dyn CatalogApi>, validation: AdvisoryValidation) -> Result<Self> {
        let (requests, inbox) = unbounded::<ApiRequest>();
        let (outbox, results) = unbounded::<PageAction>();
        let handle = thread::Builder::new()
            .name("greeneats-api".into())
            .spawn(move || {
                let dispatcher = ActionDispatcher::new(api.as_ref(), validation);
                for request in inbox {
                    let action = perform(&dispatcher, request);
                    if outbox.send(action).is_err() {
                        break;
                    }
                }
                tracing::debug!("api worker stopped");
            })
            .context("spawning api worker thread")?;
        Ok(Self {
            requests,
            results,
            handle: Some(handle),
        })
    }

    pub fn dispatch(&self, request: ApiRequest) {
        tracing::debug!(?request, "queueing api request");
        if self.requests.send(request).is_err() {
            tracing::error!("api worker is gone; request dropped");
        }
    }

    /// Result actions that are ready, without waiting.
    pub fn drain(&self) -> Vec<PageAction> {
        self.results.try_iter().collect()
    }

    #[cfg(test)]
    fn recv_timeout(&self, timeout: std::time::Duration) -> Option<PageAction> {
        self.results.recv_timeout(timeout).ok()
    }
}

impl Drop for ApiWorker {
    fn drop(&mut self) {
        let (closed, _) = unbounded();
        drop(std::mem::replace(&mut self.requests, closed));
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("api worker panicked");
            }
        }
    }
}

fn perform(dispatcher: &ActionDispatcher<'_>, request: ApiRequest) -> PageAction {
    match request {
        ApiRequest::FetchProducts => match dispatcher.load_products() {
            Ok(products) => PageAction::ProductsLoaded(products),
            Err(_) => PageAction::ProductsFailed,
        },
        ApiRequest::Submit {
            submission,
            payload,
            editing,
        } => PageAction::SubmitFinished {
            submission,
            mode: ActionDispatcher::mode(editing.as_ref()),
            outcome: dispatcher.submit(&payload, editing.as_ref()),
        },
        ApiRequest::Delete { product } => {
            let succeeded = dispatcher.delete(&product.id).is_ok();
            PageAction::DeleteFinished {
                id: product.id,
                succeeded,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::actions::tests::{payload, FakeApi};
    use crate::app::state::SubmitMode;
    use crate::catalog::{Product, ProductId};
    use assert_matches::assert_matches;
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    #[test]
    fn results_arrive_in_request_order() {
        let api = FakeApi::default();
        let worker = ApiWorker::spawn(Box::new(api.clone()), AdvisoryValidation::default())
            .expect("spawn");
        worker.dispatch(ApiRequest::FetchProducts);
        worker.dispatch(ApiRequest::Submit {
            submission: 4,
            payload: payload(),
            editing: None,
        });

        assert_matches!(worker.recv_timeout(WAIT), Some(PageAction::ProductsLoaded(list)) if list.is_empty());
        assert_matches!(
            worker.recv_timeout(WAIT),
            Some(PageAction::SubmitFinished { submission: 4, mode: SubmitMode::Create, outcome: Ok(_) })
        );
        assert_eq!(api.calls(), vec!["list", "validate", "create"]);
    }

    #[test]
    fn failed_delete_reports_the_id() {
        let api = FakeApi {
            fail_writes: true,
            ..FakeApi::default()
        };
        let worker = ApiWorker::spawn(Box::new(api), AdvisoryValidation::default()).expect("spawn");
        worker.dispatch(ApiRequest::Delete { product: product(5) });
        assert_eq!(
            worker.recv_timeout(WAIT),
            Some(PageAction::DeleteFinished {
                id: ProductId::Number(5),
                succeeded: false
            })
        );
        assert!(worker.drain().is_empty());
    }

    fn product(id: i64) -> Product {
        Product {
            id: ProductId::Number(id),
            titulo: "Rúcula Hidropônica".into(),
            descricao: None,
            preco: 3.0,
            categoria: "Verdura".into(),
            estoque: None,
            data_criacao: None,
        }
    }
}
