// SPDX-FileCopyrightText: 2026 Opsdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static ticket category catalog.
//!
//! Pure data: category ids, display labels, and SLA hints. Categories
//! without an SLA (`feature`, `other`) get a custom line at creation time
//! instead of a time window.

/// A ticket category definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub id: &'static str,
    pub label: &'static str,
    pub emoji: &'static str,
    /// Human-readable SLA window, `None` for categories with no SLA.
    pub sla: Option<&'static str>,
}

/// All selectable categories, in menu order.
pub const CATEGORIES: &[Category] = &[
    Category {
        id: "report",
        label: "Report issue",
        emoji: "\u{1F4CA}",
        sla: Some("6-12 hours"),
    },
    Category {
        id: "rating",
        label: "Incorrect rating",
        emoji: "\u{2B50}",
        sla: Some("4-8 hours"),
    },
    Category {
        id: "widget",
        label: "Widget & integrations",
        emoji: "\u{1F517}",
        sla: Some("1-2 business days"),
    },
    Category {
        id: "access",
        label: "Access & roles",
        emoji: "\u{1F510}",
        sla: Some("1-3 hours"),
    },
    Category {
        id: "howto",
        label: "Setup & usage",
        emoji: "\u{1F4A1}",
        sla: Some("1-3 business days"),
    },
    Category {
        id: "billing",
        label: "Billing & documents",
        emoji: "\u{1F4B3}",
        sla: Some("1-2 business days"),
    },
    Category {
        id: "urgent",
        label: "Urgent issue",
        emoji: "\u{1F6A8}",
        sla: Some("30-60 minutes"),
    },
    Category {
        id: "feature",
        label: "Feature request",
        emoji: "\u{2728}",
        sla: None,
    },
    Category {
        id: "other",
        label: "Other",
        emoji: "\u{1F4DD}",
        sla: None,
    },
];

/// Look up a category by id.
pub fn category_by_id(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == id)
}

/// Display label with emoji, falling back to the raw id for unknown
/// categories (old tickets may carry ids no longer in the catalog).
pub fn category_label(id: &str) -> String {
    match category_by_id(id) {
        Some(c) => format!("{} {}", c.emoji, c.label),
        None => id.to_string(),
    }
}

/// SLA hint for a category, if it has one.
pub fn sla_time(id: &str) -> Option<&'static str> {
    category_by_id(id).and_then(|c| c.sla)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_category() {
        let cat = category_by_id("billing").unwrap();
        assert_eq!(cat.label, "Billing & documents");
        assert_eq!(cat.sla, Some("1-2 business days"));
    }

    #[test]
    fn lookup_unknown_category_is_none() {
        assert!(category_by_id("nonsense").is_none());
    }

    #[test]
    fn label_falls_back_to_raw_id() {
        assert_eq!(category_label("legacy_cat"), "legacy_cat");
        assert!(category_label("access").contains("Access & roles"));
    }

    #[test]
    fn feature_and_other_have_no_sla() {
        assert_eq!(sla_time("feature"), None);
        assert_eq!(sla_time("other"), None);
        assert_eq!(sla_time("access"), Some("1-3 hours"));
    }

    #[test]
    fn category_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for cat in CATEGORIES {
            assert!(seen.insert(cat.id), "duplicate category id {}", cat.id);
        }
    }
}
