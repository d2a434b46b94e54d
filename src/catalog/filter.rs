use std::fmt;
use std::str::FromStr;

use super::{Categoria, Product};

pub const ALL_CATEGORIES_LABEL: &str = "Todas";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Categoria),
}

impl CategoryFilter {
    pub fn matches(&self, categoria: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(expected) => {
                let expected: &str = expected.as_ref();
                expected == categoria
            }
        }
    }

    /// Cycles Todas → Fruta → Legume → Verdura → Todas.
    pub fn cycle(self, delta: isize) -> Self {
        let options = [
            CategoryFilter::All,
            CategoryFilter::Only(Categoria::Fruta),
            CategoryFilter::Only(Categoria::Legume),
            CategoryFilter::Only(Categoria::Verdura),
        ];
        let len = options.len() as isize;
        let current = options.iter().position(|f| *f == self).unwrap_or(0) as isize;
        options[(current + delta).rem_euclid(len) as usize]
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES_LABEL),
            CategoryFilter::Only(categoria) => write!(f, "{categoria}"),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ALL_CATEGORIES_LABEL {
            return Ok(CategoryFilter::All);
        }
        s.parse::<Categoria>()
            .map(CategoryFilter::Only)
            .map_err(|_| format!("unknown category '{s}' (expected Todas, Fruta, Legume or Verdura)"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub search: String,
    pub category: CategoryFilter,
}

impl CatalogFilter {
    pub fn normalized_search(&self) -> String {
        self.search.trim().to_lowercase()
    }

    pub fn matches(&self, product: &Product) -> bool {
        let needle = self.normalized_search();
        matches_with(&needle, self.category, product)
    }

    pub fn is_default(&self) -> bool {
        *self == CatalogFilter::default()
    }

    pub fn clear(&mut self) {
        *self = CatalogFilter::default();
    }
}

/// Returns the matching products in their original order.
pub fn filter_products<'a>(products: &'a [Product], filter: &CatalogFilter) -> Vec<&'a Product> {
    let needle = filter.normalized_search();
    products
        .iter()
        .filter(|product| matches_with(&needle, filter.category, product))
        .collect()
}

fn matches_with(needle: &str, category: CategoryFilter, product: &Product) -> bool {
    let matches_search = needle.is_empty() || product.titulo.to_lowercase().contains(needle);
    matches_search && category.matches(&product.categoria)
}
