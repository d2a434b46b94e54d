use indexmap::IndexMap;
use strum::{Display, EnumIter, IntoEnumIterator};

use super::{parse_locale_number, Categoria, ProductDraft};

pub const TITULO_MESSAGE: &str = "Título deve ter pelo menos 5 caracteres.";
pub const PRECO_MESSAGE: &str = "Informe um preço maior que zero.";
pub const CATEGORIA_MESSAGE: &str = "Categoria inválida.";
pub const ESTOQUE_NEGATIVE_MESSAGE: &str = "Estoque não pode ser negativo.";
pub const ESTOQUE_INTEGER_MESSAGE: &str = "Estoque deve ser um número inteiro.";

const MIN_TITULO_CHARS: usize = 5;

/// Form fields in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum FormField {
    Titulo,
    Descricao,
    Preco,
    Categoria,
    Estoque,
}

impl FormField {
    pub fn label(self) -> &'static str {
        match self {
            FormField::Titulo => "Título *",
            FormField::Descricao => "Descrição",
            FormField::Preco => "Preço *",
            FormField::Categoria => "Categoria *",
            FormField::Estoque => "Estoque",
        }
    }

    pub fn max_chars(self) -> usize {
        match self {
            FormField::Titulo => 120,
            FormField::Descricao => 500,
            FormField::Preco | FormField::Estoque => 16,
            FormField::Categoria => 0,
        }
    }

    pub fn cycle(self, delta: isize) -> Self {
        let all: Vec<FormField> = FormField::iter().collect();
        let len = all.len() as isize;
        let current = all.iter().position(|f| *f == self).unwrap_or(0) as isize;
        all[(current + delta).rem_euclid(len) as usize]
    }
}

/// Field-level validation messages, only for invalid fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: IndexMap<FormField, String>,
}

impl FieldErrors {
    pub fn insert(&mut self, field: FormField, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.errors.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// Checks every rule independently; an empty result means the draft can be submitted.
pub fn validate_draft(draft: &ProductDraft) -> FieldErrors {
    let mut errors = FieldErrors::default();

    if draft.titulo.trim().chars().count() < MIN_TITULO_CHARS {
        errors.insert(FormField::Titulo, TITULO_MESSAGE);
    }

    match parse_locale_number(&draft.preco) {
        Some(price) if price > 0.0 => {}
        _ => errors.insert(FormField::Preco, PRECO_MESSAGE),
    }

    if draft.categoria.parse::<Categoria>().is_err() {
        errors.insert(FormField::Categoria, CATEGORIA_MESSAGE);
    }

    if !draft.estoque.trim().is_empty() {
        match parse_locale_number(&draft.estoque) {
            Some(stock) if stock < 0.0 => errors.insert(FormField::Estoque, ESTOQUE_NEGATIVE_MESSAGE),
            Some(stock) if stock.fract() != 0.0 => {
                errors.insert(FormField::Estoque, ESTOQUE_INTEGER_MESSAGE)
            }
            Some(_) => {}
            None => errors.insert(FormField::Estoque, ESTOQUE_INTEGER_MESSAGE),
        }
    }

    errors
}
