// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Category;

pub const APP_TITLE: &str = "Sommelier";
pub const APP_SUBTITLE: &str = "Discover the perfect pairing for your palate.";
pub const SEARCH_PLACEHOLDER: &str =
    "Search for food (e.g., Steak) or wine (e.g., Merlot)...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseSection {
    pub title: &'static str,
    pub blurb: &'static str,
    pub category: Category,
    pub suggested_query: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseView {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub sections: Vec<BrowseSection>,
}

const EXPLORE_SECTIONS: [BrowseSection; 4] = [
    BrowseSection {
        title: "Red meat, big reds",
        blurb: "Structured tannins for grilled and roasted cuts.",
        category: Category::Wine,
        suggested_query: "steak",
    },
    BrowseSection {
        title: "From the sea",
        blurb: "Crisp whites and bubbles for shellfish and fish.",
        category: Category::All,
        suggested_query: "oysters",
    },
    BrowseSection {
        title: "Tonight's starters",
        blurb: "Small plates from our partner restaurants.",
        category: Category::Starter,
        suggested_query: "",
    },
    BrowseSection {
        title: "Sweet endings",
        blurb: "Dessert wines and the dishes that love them.",
        category: Category::Dessert,
        suggested_query: "",
    },
];

/// Curated explore presentation. Independent of the catalog and of any
/// session state, so every call yields an identical value.
pub fn render_browse_view() -> BrowseView {
    BrowseView {
        title: APP_TITLE,
        subtitle: APP_SUBTITLE,
        sections: EXPLORE_SECTIONS.to_vec(),
    }
}

impl BrowseView {
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(self.title);
        out.push('\n');
        out.push_str(self.subtitle);
        out.push_str("\n\nExplore\n");
        for section in &self.sections {
            out.push_str(&format!("\n  {}\n    {}\n", section.title, section.blurb));
            let hint = match (section.suggested_query, section.category) {
                ("", category) => format!("    try: category {}\n", category.as_str()),
                (query, Category::All) => format!("    try: \"{query}\"\n"),
                (query, category) => {
                    format!("    try: \"{query}\" in {}\n", category.as_str())
                }
            };
            out.push_str(&hint);
        }
        out
    }
}
