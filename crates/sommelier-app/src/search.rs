// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Catalog, Category, PairingItem};

/// Lowercased, trimmed form of a query; empty means "no text constraint".
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Stable boolean filter over the catalog. Total and side-effect free.
pub fn filter<'c>(catalog: &'c Catalog, query: &str, category: Category) -> Vec<&'c PairingItem> {
    let needle = normalize_query(query);
    let results: Vec<&PairingItem> = catalog
        .items()
        .iter()
        .filter(|item| category.admits(item) && matches_query(item, &needle))
        .collect();
    tracing::debug!(
        query = %needle,
        category = category.as_str(),
        results = results.len(),
        "filter pass"
    );
    results
}

/// `needle` must already be normalized.
pub fn matches_query(item: &PairingItem, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    contains_folded(item.name(), needle)
        || item
            .matches()
            .iter()
            .any(|partner| contains_folded(partner, needle))
        || item
            .restaurant()
            .is_some_and(|restaurant| contains_folded(restaurant, needle))
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::{filter, normalize_query};
    use crate::{Catalog, CatalogPairing, Category, Course, PairingItem, PairingKind};
    use anyhow::Result;

    fn pairing(
        name: &str,
        kind: PairingKind,
        matches: &[&str],
        course: Option<Course>,
        restaurant: Option<&str>,
    ) -> CatalogPairing {
        CatalogPairing {
            name: name.to_owned(),
            kind,
            matches: matches.iter().map(|value| (*value).to_owned()).collect(),
            description: String::new(),
            course,
            restaurant: restaurant.map(str::to_owned),
        }
    }

    fn steak_and_merlot() -> Catalog {
        Catalog::from_items(vec![
            pairing("Steak", PairingKind::Food, &["Merlot", "Cabernet"], None, None),
            pairing("Merlot", PairingKind::Wine, &["Steak"], None, None),
        ])
    }

    fn mixed_catalog() -> Catalog {
        Catalog::from_items(vec![
            pairing("Steak", PairingKind::Food, &["Merlot", "Cabernet"], None, None),
            pairing("Merlot", PairingKind::Wine, &["Steak"], None, None),
            pairing(
                "Burrata",
                PairingKind::Food,
                &["Vermentino"],
                Some(Course::Starter),
                Some("Osteria Lucia"),
            ),
            pairing(
                "Tiramisu",
                PairingKind::Food,
                &["Vin Santo"],
                Some(Course::Dessert),
                Some("Osteria Lucia"),
            ),
            pairing("Port", PairingKind::Wine, &["Dark Chocolate"], None, None),
        ])
    }

    fn names<'a>(results: &[&'a PairingItem]) -> Vec<&'a str> {
        results.iter().map(|item| item.name()).collect()
    }

    #[test]
    fn empty_query_and_all_returns_full_catalog_in_order() {
        let catalog = mixed_catalog();
        let results = filter(&catalog, "", Category::All);
        let expected: Vec<&PairingItem> = catalog.items().iter().collect();
        assert_eq!(results, expected);
    }

    #[test]
    fn whitespace_query_is_treated_as_empty() {
        let catalog = mixed_catalog();
        assert_eq!(filter(&catalog, "   ", Category::All).len(), catalog.len());
        assert_eq!(normalize_query("  StEaK "), "steak");
    }

    #[test]
    fn steak_query_matches_by_name_and_by_partner() {
        let catalog = steak_and_merlot();
        let results = filter(&catalog, "steak", Category::All);
        assert_eq!(names(&results), vec!["Steak", "Merlot"]);
    }

    #[test]
    fn query_is_case_insensitive() {
        let catalog = steak_and_merlot();
        assert_eq!(
            names(&filter(&catalog, "CABER", Category::All)),
            vec!["Steak"]
        );
    }

    #[test]
    fn unknown_query_yields_empty_results() {
        let catalog = steak_and_merlot();
        assert!(filter(&catalog, "nonexistent", Category::All).is_empty());
    }

    #[test]
    fn restaurant_name_is_searchable() {
        let catalog = mixed_catalog();
        assert_eq!(
            names(&filter(&catalog, "osteria", Category::All)),
            vec!["Burrata", "Tiramisu"]
        );
    }

    #[test]
    fn type_and_course_categories_filter_independently_of_query() {
        let catalog = mixed_catalog();
        assert_eq!(
            names(&filter(&catalog, "", Category::Wine)),
            vec!["Merlot", "Port"]
        );
        assert_eq!(
            names(&filter(&catalog, "", Category::Dessert)),
            vec!["Tiramisu"]
        );
        assert!(filter(&catalog, "", Category::Main).is_empty());
        assert_eq!(
            names(&filter(&catalog, "steak", Category::Food)),
            vec!["Steak"]
        );
    }

    #[test]
    fn every_item_is_found_by_its_lowercased_name() -> Result<()> {
        let catalog = Catalog::load()?;
        for item in catalog.items() {
            let results = filter(&catalog, &item.name().to_lowercase(), Category::All);
            assert!(
                results.iter().any(|found| *found == item),
                "{} not found by its own name",
                item.name()
            );
        }
        Ok(())
    }

    #[test]
    fn category_results_are_a_subset_of_all() -> Result<()> {
        let catalog = Catalog::load()?;
        for query in ["", "pinot", "steak", "osteria", "cheese", "zzz"] {
            let everything = filter(&catalog, query, Category::All);
            for category in Category::ALL {
                for item in filter(&catalog, query, category) {
                    assert!(
                        everything.contains(&item),
                        "{} in {} but not in all for {query:?}",
                        item.name(),
                        category.as_str()
                    );
                }
            }
        }
        Ok(())
    }

    #[test]
    fn filtering_is_idempotent() -> Result<()> {
        let catalog = Catalog::load()?;
        let first = filter(&catalog, "Pinot", Category::Wine);
        let second = filter(&catalog, "Pinot", Category::Wine);
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn empty_catalog_filters_to_empty() {
        let catalog = Catalog::default();
        assert!(filter(&catalog, "steak", Category::All).is_empty());
        assert!(filter(&catalog, "", Category::All).is_empty());
    }
}
