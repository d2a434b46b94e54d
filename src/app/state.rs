use std::time::Duration;

use crate::catalog::{
    filter_products, reconcile_created, reconcile_deleted, reconcile_updated, sort_by_created_desc,
    CatalogFilter, FieldErrors, FormField, Product, ProductDraft, ProductId, ProductPayload,
};

pub const LOAD_FAILED_MESSAGE: &str = "Não foi possível carregar os produtos. Tente novamente.";
pub const PERSIST_FAILED_MESSAGE: &str = "Não foi possível salvar o produto. Tente novamente.";
pub const CREATED_MESSAGE: &str = "Produto criado com sucesso!";
pub const UPDATED_MESSAGE: &str = "Produto atualizado com sucesso!";
pub const DELETED_MESSAGE: &str = "Produto excluído com sucesso!";
pub const DELETE_FAILED_MESSAGE: &str = "Erro ao excluir produto. Tente novamente.";
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3_500);

const MAX_SEARCH_CHARS: usize = 80;

/// Confirmation question shown before a delete.
pub fn delete_prompt(titulo: &str) -> String {
    let titulo = titulo.trim();
    let target = if titulo.is_empty() { "este produto" } else { titulo };
    format!("Tem certeza que deseja excluir {target}?")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    Create,
    Update,
}

/// Why a validated submission did not produce a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitFailure {
    /// The server returned an explicit invalid verdict.
    Rejected(Vec<String>),
    /// Create or update failed after validation passed.
    Failed { detail: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub editing: Option<Product>,
    pub draft: ProductDraft,
    pub focus: FormField,
    pub field_errors: FieldErrors,
    pub server_errors: Vec<String>,
    /// Id of the save in flight for this form, if any.
    pub submission: Option<u64>,
}

impl FormState {
    fn create() -> Self {
        Self::with(None, ProductDraft::default())
    }

    fn edit(product: Product) -> Self {
        let draft = ProductDraft::from_product(&product);
        Self::with(Some(product), draft)
    }

    fn with(editing: Option<Product>, draft: ProductDraft) -> Self {
        Self {
            editing,
            draft,
            focus: FormField::Titulo,
            field_errors: FieldErrors::default(),
            server_errors: Vec::new(),
            submission: None,
        }
    }

    pub fn submitting(&self) -> bool {
        self.submission.is_some()
    }

    pub fn mode(&self) -> SubmitMode {
        if self.editing.is_some() {
            SubmitMode::Update
        } else {
            SubmitMode::Create
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Form(FormState),
    ConfirmDelete(Product),
}

/// What the main area shows.
#[derive(Debug, PartialEq)]
pub enum PageView<'a> {
    Loading,
    Error(&'a str),
    Empty,
    Ready(Vec<&'a Product>),
}

/// Network work the runtime performs on the controller's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    FetchProducts,
    Submit {
        submission: u64,
        payload: ProductPayload,
        editing: Option<ProductId>,
    },
    Delete {
        product: Product,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Request(ApiRequest),
    /// Clear toast `id` after `after`; replaces any earlier pending dismissal.
    DismissToast { id: u64, after: Duration },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageAction {
    Mount,
    Reload,
    ProductsLoaded(Vec<Product>),
    ProductsFailed,
    SelectNext,
    SelectPrevious,
    BeginSearch,
    SearchInput(char),
    SearchBackspace,
    FinishSearch,
    CancelSearch,
    CycleCategory(isize),
    ClearFilters,
    OpenCreate,
    OpenEditSelected,
    CloseOverlay,
    FormNextField,
    FormPreviousField,
    FormInput(char),
    FormBackspace,
    FormCycleCategory(isize),
    Submit,
    SubmitFinished {
        submission: u64,
        mode: SubmitMode,
        outcome: Result<Product, SubmitFailure>,
    },
    RequestDeleteSelected,
    ConfirmDelete,
    DeleteFinished {
        id: ProductId,
        succeeded: bool,
    },
    ToastExpired(u64),
}

/// All page state. Advanced only through [`PageState::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub products: Vec<Product>,
    pub loading: bool,
    pub error: Option<String>,
    pub filter: CatalogFilter,
    pub search_active: bool,
    pub selected: usize,
    pub overlay: Option<Overlay>,
    pub toast: Option<Toast>,
    toast_seq: u64,
    submission_seq: u64,
    toast_duration: Duration,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl PageState {
    pub fn new(toast_duration: Duration) -> Self {
        Self {
            products: Vec::new(),
            loading: true,
            error: None,
            filter: CatalogFilter::default(),
            search_active: false,
            selected: 0,
            overlay: None,
            toast: None,
            toast_seq: 0,
            submission_seq: 0,
            toast_duration,
        }
    }

    pub fn visible(&self) -> Vec<&Product> {
        filter_products(&self.products, &self.filter)
    }

    pub fn view(&self) -> PageView<'_> {
        if self.loading {
            return PageView::Loading;
        }
        if let Some(message) = &self.error {
            return PageView::Error(message);
        }
        let visible = self.visible();
        if visible.is_empty() {
            PageView::Empty
        } else {
            PageView::Ready(visible)
        }
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.visible().get(self.selected).copied()
    }

    pub fn form(&self) -> Option<&FormState> {
        match &self.overlay {
            Some(Overlay::Form(form)) => Some(form),
            _ => None,
        }
    }

    pub fn pending_delete(&self) -> Option<&Product> {
        match &self.overlay {
            Some(Overlay::ConfirmDelete(product)) => Some(product),
            _ => None,
        }
    }

    /// Consumes the state and returns its successor plus the effects to run.
    pub fn update(mut self, action: PageAction) -> (Self, Vec<Effect>) {
        let mut effects = Vec::new();
        self.apply(action, &mut effects);
        (self, effects)
    }

    fn apply(&mut self, action: PageAction, effects: &mut Vec<Effect>) {
        match action {
            PageAction::Mount | PageAction::Reload => {
                self.loading = true;
                self.error = None;
                effects.push(Effect::Request(ApiRequest::FetchProducts));
            }
            PageAction::ProductsLoaded(products) => {
                self.loading = false;
                self.error = None;
                self.products = sort_by_created_desc(&products);
                self.normalize_selection();
            }
            PageAction::ProductsFailed => {
                self.loading = false;
                self.error = Some(LOAD_FAILED_MESSAGE.to_string());
            }
            PageAction::SelectNext => self.move_selection(1),
            PageAction::SelectPrevious => self.move_selection(-1),
            PageAction::BeginSearch => self.search_active = true,
            PageAction::SearchInput(ch) => {
                if self.filter.search.chars().count() < MAX_SEARCH_CHARS {
                    self.filter.search.push(ch);
                    self.selected = 0;
                }
            }
            PageAction::SearchBackspace => {
                if self.filter.search.pop().is_some() {
                    self.selected = 0;
                }
            }
            PageAction::FinishSearch => self.search_active = false,
            PageAction::CancelSearch => {
                self.search_active = false;
                self.filter.search.clear();
                self.selected = 0;
            }
            PageAction::CycleCategory(delta) => {
                self.filter.category = self.filter.category.cycle(delta);
                self.selected = 0;
            }
            PageAction::ClearFilters => {
                self.filter.clear();
                self.search_active = false;
                self.selected = 0;
            }
            PageAction::OpenCreate => {
                if self.overlay.is_none() {
                    self.overlay = Some(Overlay::Form(FormState::create()));
                }
            }
            PageAction::OpenEditSelected => {
                if self.overlay.is_some() {
                    return;
                }
                if let Some(product) = self.selected_product().cloned() {
                    self.overlay = Some(Overlay::Form(FormState::edit(product)));
                }
            }
            PageAction::CloseOverlay => self.overlay = None,
            PageAction::FormNextField => self.with_form(|form| form.focus = form.focus.cycle(1)),
            PageAction::FormPreviousField => {
                self.with_form(|form| form.focus = form.focus.cycle(-1))
            }
            PageAction::FormInput(ch) => self.with_form(|form| {
                let field = form.focus;
                if field == FormField::Categoria {
                    return;
                }
                let value = form.draft.field_mut(field);
                if value.chars().count() < field.max_chars() {
                    value.push(ch);
                }
            }),
            PageAction::FormBackspace => self.with_form(|form| {
                if form.focus != FormField::Categoria {
                    form.draft.field_mut(form.focus).pop();
                }
            }),
            PageAction::FormCycleCategory(delta) => {
                self.with_form(|form| form.draft.cycle_categoria(delta))
            }
            PageAction::Submit => self.submit(effects),
            PageAction::SubmitFinished {
                submission,
                mode,
                outcome,
            } => self.submit_finished(submission, mode, outcome, effects),
            PageAction::RequestDeleteSelected => {
                if self.overlay.is_some() {
                    return;
                }
                if let Some(product) = self.selected_product().cloned() {
                    self.overlay = Some(Overlay::ConfirmDelete(product));
                }
            }
            PageAction::ConfirmDelete => {
                if let Some(Overlay::ConfirmDelete(product)) = self.overlay.take() {
                    effects.push(Effect::Request(ApiRequest::Delete { product }));
                }
            }
            PageAction::DeleteFinished { id, succeeded } => {
                if succeeded {
                    self.products = reconcile_deleted(&self.products, &id);
                    self.normalize_selection();
                    effects.push(self.show_toast(DELETED_MESSAGE, ToastKind::Success));
                } else {
                    effects.push(self.show_toast(DELETE_FAILED_MESSAGE, ToastKind::Error));
                }
            }
            PageAction::ToastExpired(id) => {
                if self.toast.as_ref().map(|toast| toast.id) == Some(id) {
                    self.toast = None;
                }
            }
        }
    }

    fn submit(&mut self, effects: &mut Vec<Effect>) {
        let Some(Overlay::Form(form)) = self.overlay.as_mut() else {
            return;
        };
        if form.submitting() {
            return;
        }
        match form.draft.to_payload() {
            Err(errors) => {
                form.field_errors = errors;
            }
            Ok(payload) => {
                self.submission_seq += 1;
                let submission = self.submission_seq;
                form.field_errors = FieldErrors::default();
                form.server_errors.clear();
                form.submission = Some(submission);
                effects.push(Effect::Request(ApiRequest::Submit {
                    submission,
                    payload,
                    editing: form.editing.as_ref().map(|product| product.id.clone()),
                }));
            }
        }
    }

    fn submit_finished(
        &mut self,
        submission: u64,
        mode: SubmitMode,
        outcome: Result<Product, SubmitFailure>,
        effects: &mut Vec<Effect>,
    ) {
        match outcome {
            Ok(product) => {
                let message = match mode {
                    SubmitMode::Create => {
                        self.products = reconcile_created(&self.products, product);
                        CREATED_MESSAGE
                    }
                    SubmitMode::Update => {
                        self.products = reconcile_updated(&self.products, product);
                        UPDATED_MESSAGE
                    }
                };
                self.normalize_selection();
                if self.form().and_then(|form| form.submission) == Some(submission) {
                    self.overlay = None;
                }
                effects.push(self.show_toast(message, ToastKind::Success));
            }
            Err(failure) => {
                let errors = match failure {
                    SubmitFailure::Rejected(errors) => errors,
                    SubmitFailure::Failed { .. } => vec![PERSIST_FAILED_MESSAGE.to_string()],
                };
                self.with_form(|form| {
                    if form.submission == Some(submission) {
                        form.submission = None;
                        form.server_errors = errors;
                    }
                });
            }
        }
    }

    fn show_toast(&mut self, message: &str, kind: ToastKind) -> Effect {
        self.toast_seq += 1;
        let id = self.toast_seq;
        self.toast = Some(Toast {
            id,
            message: message.to_string(),
            kind,
        });
        Effect::DismissToast {
            id,
            after: self.toast_duration,
        }
    }

    fn with_form(&mut self, f: impl FnOnce(&mut FormState)) {
        if let Some(Overlay::Form(form)) = self.overlay.as_mut() {
            f(form);
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.visible().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = (self.selected as isize + delta).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    fn normalize_selection(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}
