//! Product name search.
//!
//! Two passes over an in-memory catalog:
//!
//! 1. **Exact**: case-insensitive substring match on the product name.
//!    Results keep catalog (identifier) order.
//! 2. **Approximate**, only when pass 1 finds nothing: a name matches when the
//!    query is a character subsequence of it, or when the query is close to
//!    the whole name or to one of its words by normalized Damerau-Levenshtein
//!    similarity. Results are ranked by score, best first, ties broken by
//!    identifier.
//!
//! Both passes scan every product, which is fine for a boutique-sized catalog
//! and is the first thing to revisit if the catalog grows.

use crate::types::Product;

/// Minimum similarity for a typo-tolerant match.
pub const FUZZY_THRESHOLD: f64 = 0.6;

/// Errors that can occur when searching.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// The query is empty or only whitespace.
    #[error("Query is required")]
    EmptyQuery,
}

/// Search `catalog` for products whose name matches `query`.
///
/// `catalog` is expected in identifier order.
///
/// # Errors
///
/// Returns `SearchError::EmptyQuery` if `query` is blank.
pub fn search_products(query: &str, catalog: Vec<Product>) -> Result<Vec<Product>, SearchError> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    let (exact, rest): (Vec<Product>, Vec<Product>) = catalog
        .into_iter()
        .partition(|p| p.name.to_lowercase().contains(&query));
    if !exact.is_empty() {
        return Ok(exact);
    }

    let mut scored: Vec<(f64, Product)> = rest
        .into_iter()
        .filter_map(|p| approximate_score(&query, &p.name.to_lowercase()).map(|s| (s, p)))
        .collect();
    scored.sort_by(|(a_score, a), (b_score, b)| {
        b_score.total_cmp(a_score).then_with(|| a.id.cmp(&b.id))
    });

    Ok(scored.into_iter().map(|(_, p)| p).collect())
}

/// Score `name` against `query` (both lowercase), or `None` if it is not a match.
fn approximate_score(query: &str, name: &str) -> Option<f64> {
    let subsequence = subsequence_score(query, name);
    let similarity = std::iter::once(name)
        .chain(name.split_whitespace())
        .map(|candidate| strsim::normalized_damerau_levenshtein(query, candidate))
        .fold(0.0_f64, f64::max);

    if subsequence.is_none() && similarity < FUZZY_THRESHOLD {
        return None;
    }
    Some(subsequence.unwrap_or(0.0).max(similarity))
}

/// Fraction of `name` covered by `query` when every query character appears
/// in `name` in order.
#[allow(clippy::cast_precision_loss)]
fn subsequence_score(query: &str, name: &str) -> Option<f64> {
    let mut remaining = name.chars();
    let all_found = query.chars().all(|q| remaining.any(|c| c == q));
    if !all_found {
        return None;
    }
    let name_len = name.chars().count().max(1);
    Some(query.chars().count() as f64 / name_len as f64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::{Price, ProductId};

    fn product(id: i32, name: &str) -> Product {
        let price = Price::new(Decimal::new(10, 0)).unwrap();
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            images: Vec::new(),
            category: "unisex".to_owned(),
            new_price: price,
            old_price: price,
            sizes: Vec::new(),
            date: Utc::now(),
            available: true,
        }
    }

    fn names(results: &[Product]) -> Vec<&str> {
        results.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_exact_pass_wins() {
        let catalog = vec![product(1, "Red Shirt"), product(2, "Blue Pants")];
        let results = search_products("shirt", catalog).unwrap();
        assert_eq!(names(&results), vec!["Red Shirt"]);
    }

    #[test]
    fn test_exact_pass_is_case_insensitive_and_ordered() {
        let catalog = vec![
            product(1, "Linen SHIRT"),
            product(2, "Socks"),
            product(3, "shirt dress"),
        ];
        let results = search_products("Shirt", catalog).unwrap();
        assert_eq!(names(&results), vec!["Linen SHIRT", "shirt dress"]);
    }

    #[test]
    fn test_fallback_tolerates_transposed_letters() {
        let catalog = vec![product(1, "Red Shirt"), product(2, "Blue Pants")];
        let results = search_products("shrit", catalog).unwrap();
        assert_eq!(names(&results), vec!["Red Shirt"]);
    }

    #[test]
    fn test_fallback_matches_subsequence() {
        let catalog = vec![product(1, "Red Shirt"), product(2, "Blue Pants")];
        let results = search_products("rdsht", catalog).unwrap();
        assert_eq!(names(&results), vec!["Red Shirt"]);
    }

    #[test]
    fn test_fallback_ranks_closest_first() {
        let catalog = vec![product(1, "Jackets"), product(2, "Jacket")];
        let results = search_products("jackt", catalog).unwrap();
        assert_eq!(names(&results), vec!["Jacket", "Jackets"]);
    }

    #[test]
    fn test_fallback_ties_break_by_id() {
        let catalog = vec![product(7, "Wool Scarf"), product(3, "Silk Scarf")];
        let results = search_products("scraf", catalog).unwrap();
        assert_eq!(names(&results), vec!["Silk Scarf", "Wool Scarf"]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let catalog = vec![product(1, "Red Shirt")];
        assert!(search_products("umbrella", catalog).unwrap().is_empty());
    }

    #[test]
    fn test_blank_query_rejected() {
        assert_eq!(
            search_products("   ", vec![product(1, "Red Shirt")]),
            Err(SearchError::EmptyQuery)
        );
    }
}
