//! Keeps the local product list ordered newest first while server responses are merged in.
//!
//! Every function takes the previous list by reference and returns a fresh one.

use std::cmp::Reverse;

use super::{Product, ProductId};

/// Stable sort by creation time, newest first. Undated records sink to the end.
pub fn sort_by_created_desc(products: &[Product]) -> Vec<Product> {
    let mut sorted = products.to_vec();
    sort_in_place(&mut sorted);
    sorted
}

pub fn reconcile_created(products: &[Product], created: Product) -> Vec<Product> {
    let mut next = Vec::with_capacity(products.len() + 1);
    next.extend(
        products
            .iter()
            .filter(|product| product.id != created.id)
            .cloned(),
    );
    next.insert(0, created);
    sort_in_place(&mut next);
    next
}

pub fn reconcile_updated(products: &[Product], updated: Product) -> Vec<Product> {
    let mut next: Vec<Product> = products
        .iter()
        .map(|product| {
            if product.id == updated.id {
                updated.clone()
            } else {
                product.clone()
            }
        })
        .collect();
    sort_in_place(&mut next);
    next
}

pub fn reconcile_deleted(products: &[Product], deleted: &ProductId) -> Vec<Product> {
    products
        .iter()
        .filter(|product| &product.id != deleted)
        .cloned()
        .collect()
}

fn sort_in_place(products: &mut [Product]) {
    products.sort_by_key(|product| Reverse(product.created_timestamp()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, created: Option<&str>) -> Product {
        Product {
            id: ProductId::Number(id),
            titulo: format!("Produto {id}"),
            descricao: None,
            preco: 1.0,
            categoria: "Fruta".into(),
            estoque: None,
            data_criacao: created.map(str::to_string),
        }
    }

    fn ids(products: &[Product]) -> Vec<String> {
        products.iter().map(|p| p.id.to_string()).collect()
    }

    fn is_sorted_desc(products: &[Product]) -> bool {
        products
            .windows(2)
            .all(|pair| pair[0].created_timestamp() >= pair[1].created_timestamp())
    }

    #[test]
    fn newest_first() {
        let list = vec![product(1, Some("2024-01-01")), product(2, Some("2024-02-01"))];
        assert_eq!(ids(&sort_by_created_desc(&list)), vec!["2", "1"]);
    }

    #[test]
    fn sorting_is_idempotent_and_stable() {
        let list = vec![
            product(1, None),
            product(2, Some("2024-03-01")),
            product(3, Some("garbage")),
            product(4, Some("2024-03-01")),
            product(5, Some("2023-12-31T23:59:59Z")),
        ];
        let once = sort_by_created_desc(&list);
        assert_eq!(ids(&once), vec!["2", "4", "5", "1", "3"]);
        let twice = sort_by_created_desc(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn created_record_lands_in_order_exactly_once() {
        let list = sort_by_created_desc(&[
            product(1, Some("2024-01-01")),
            product(2, Some("2024-03-01")),
        ]);
        let next = reconcile_created(&list, product(9, Some("2024-02-01")));
        assert_eq!(ids(&next), vec!["2", "9", "1"]);
        assert_eq!(next.iter().filter(|p| p.id == ProductId::Number(9)).count(), 1);
        assert!(is_sorted_desc(&next));
        assert_eq!(list.len(), 2, "input untouched");
    }

    #[test]
    fn undated_created_record_goes_last() {
        let list = vec![product(1, Some("2024-01-01"))];
        let next = reconcile_created(&list, product(2, None));
        assert_eq!(ids(&next), vec!["1", "2"]);
    }

    #[test]
    fn update_replaces_matching_record_and_resorts() {
        let list = sort_by_created_desc(&[
            product(1, Some("2024-01-01")),
            product(2, Some("2024-02-01")),
        ]);
        let mut changed = product(1, Some("2024-05-01"));
        changed.titulo = "Renomeado".into();
        let next = reconcile_updated(&list, changed);
        assert_eq!(ids(&next), vec!["1", "2"]);
        assert_eq!(next[0].titulo, "Renomeado");
        assert_eq!(list[1].titulo, "Produto 1", "input untouched");
    }

    #[test]
    fn update_of_unknown_record_leaves_list_alone() {
        let list = vec![product(1, Some("2024-01-01"))];
        let next = reconcile_updated(&list, product(5, Some("2024-09-01")));
        assert_eq!(ids(&next), vec!["1"]);
    }

    #[test]
    fn delete_removes_by_id() {
        let list = vec![product(1, None), product(2, None)];
        let next = reconcile_deleted(&list, &ProductId::Number(2));
        assert_eq!(ids(&next), vec!["1"]);
        assert_eq!(list.len(), 2);
    }
}
