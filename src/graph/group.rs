use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use eframe::egui::{Vec2, vec2};

/// Known node categories. Anything else lands in `Other`, which clusters at the
/// canvas center and takes a hashed palette slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Person,
    Organization,
    Location,
    Event,
    Document,
    Concept,
    Other,
}

impl GroupKind {
    #[cfg(test)]
    pub const KNOWN: [Self; 6] = [
        Self::Person,
        Self::Organization,
        Self::Location,
        Self::Event,
        Self::Document,
        Self::Concept,
    ];

    pub fn classify(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "person" | "people" | "user" | "author" => Self::Person,
            "organization" | "organisation" | "company" | "org" => Self::Organization,
            "location" | "place" | "city" | "country" => Self::Location,
            "event" | "meeting" => Self::Event,
            "document" | "paper" | "article" | "file" => Self::Document,
            "concept" | "topic" | "tag" => Self::Concept,
            _ => Self::Other,
        }
    }

    /// Cluster anchor as an offset from the canvas center.
    pub fn anchor(self) -> Vec2 {
        match self {
            Self::Person => vec2(-220.0, -160.0),
            Self::Organization => vec2(220.0, -160.0),
            Self::Location => vec2(-220.0, 160.0),
            Self::Event => vec2(220.0, 160.0),
            Self::Document => vec2(0.0, -260.0),
            Self::Concept => vec2(0.0, 260.0),
            Self::Other => Vec2::ZERO,
        }
    }

    pub fn palette_slot(self, label: &str, palette_len: usize) -> usize {
        if palette_len == 0 {
            return 0;
        }

        match self {
            Self::Person => 0,
            Self::Organization => 1,
            Self::Location => 2,
            Self::Event => 3,
            Self::Document => 4,
            Self::Concept => 5,
            Self::Other => {
                let mut hasher = DefaultHasher::new();
                label.trim().to_ascii_lowercase().hash(&mut hasher);
                6 + (hasher.finish() as usize % palette_len.saturating_sub(6).max(1))
            }
        }
        .min(palette_len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_is_case_insensitive_with_aliases() {
        assert_eq!(GroupKind::classify("Person"), GroupKind::Person);
        assert_eq!(GroupKind::classify(" COMPANY "), GroupKind::Organization);
        assert_eq!(GroupKind::classify("paper"), GroupKind::Document);
        assert_eq!(GroupKind::classify("Gene"), GroupKind::Other);
        assert_eq!(GroupKind::classify(""), GroupKind::Other);
    }

    #[test]
    fn unknown_groups_anchor_at_center() {
        assert_eq!(GroupKind::Other.anchor(), Vec2::ZERO);
        for kind in GroupKind::KNOWN {
            assert_ne!(kind.anchor(), Vec2::ZERO);
        }
    }

    #[test]
    fn palette_slot_is_stable_and_in_range() {
        let first = GroupKind::Other.palette_slot("Gene", 10);
        let second = GroupKind::Other.palette_slot("gene", 10);
        assert_eq!(first, second);
        assert!((6..10).contains(&first));
        assert_eq!(GroupKind::Person.palette_slot("Person", 10), 0);
        assert_eq!(GroupKind::Concept.palette_slot("x", 3), 2);
    }
}
