//! Keyword classification of charge descriptions.

use crate::models::record::{Category, SizeClass};

/// Category keywords in priority order; the first one contained in the text wins.
const CATEGORY_KEYWORDS: &[(&str, Category)] = &[
    ("Despatch", Category::Despatch),
    ("Return", Category::Return),
];

const SIZE_KEYWORDS: &[(&str, SizeClass)] = &[
    ("Packet", SizeClass::Packet),
    ("Parcel", SizeClass::Parcel),
];

/// Classify a charge by its description. Falls back to `Surcharge`.
pub fn classify_charge(description: &str) -> Category {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(keyword, _)| description.contains(keyword))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Surcharge)
}

/// Size subclass, only for despatches.
pub fn order_size(description: &str, category: Category) -> Option<SizeClass> {
    if category != Category::Despatch {
        return None;
    }

    let size = SIZE_KEYWORDS
        .iter()
        .find(|(keyword, _)| description.contains(keyword))
        .map(|(_, size)| *size)
        .unwrap_or(SizeClass::Other);
    Some(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_charge() {
        assert_eq!(classify_charge("Despatch Packet"), Category::Despatch);
        assert_eq!(classify_charge("Return Parcel"), Category::Return);
        assert_eq!(classify_charge("Fuel Surcharge"), Category::Surcharge);
    }

    #[test]
    fn test_classify_priority() {
        // Both keywords present: Despatch is checked first.
        assert_eq!(classify_charge("Return Despatch Parcel"), Category::Despatch);
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert_eq!(classify_charge("despatch packet"), Category::Surcharge);
    }

    #[test]
    fn test_order_size() {
        assert_eq!(order_size("Despatch Packet", Category::Despatch), Some(SizeClass::Packet));
        assert_eq!(order_size("Despatch Parcel", Category::Despatch), Some(SizeClass::Parcel));
        assert_eq!(order_size("Despatch Large", Category::Despatch), Some(SizeClass::Other));
        assert_eq!(order_size("Return Parcel", Category::Return), None);
    }
}
