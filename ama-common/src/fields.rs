//! Registry of tracked document fields
//!
//! The AMA log documents are schema-loose JSON; the services only ever
//! touch a fixed set of dotted field paths. Each entry declares the URL
//! key it is addressed by, the dotted path into the document, whether the
//! value is an array of tags or a single scalar, and whether the field
//! participates in canonicalization (which doubles as the default for
//! applying mappings during aggregation).

/// A tracked document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Short key used in URLs and logs
    pub key: &'static str,
    /// Dotted path into the document JSON
    pub path: &'static str,
    /// True when the field holds an array of tags (unwound element-wise)
    pub array: bool,
    /// True when the field is canonicalized and aggregated through the
    /// mapping table by default
    pub canonicalize: bool,
}

/// All fields the services know about, in declared order.
///
/// The canonicalization job iterates the `canonicalize = true` entries in
/// exactly this order.
pub const TRACKED_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        key: "category",
        path: "question_abstraction.categorization.category",
        array: false,
        canonicalize: true,
    },
    FieldSpec {
        key: "subcategory",
        path: "question_abstraction.categorization.subcategory",
        array: false,
        canonicalize: true,
    },
    FieldSpec {
        key: "type",
        path: "question_abstraction.categorization.type",
        array: false,
        canonicalize: true,
    },
    FieldSpec {
        key: "domain",
        path: "question_abstraction.semantic.domain",
        array: false,
        canonicalize: true,
    },
    FieldSpec {
        key: "hauptthemen",
        path: "tags.hauptthemen",
        array: true,
        canonicalize: true,
    },
    FieldSpec {
        key: "theologische_konzepte",
        path: "tags.theologische_konzepte",
        array: true,
        canonicalize: true,
    },
    FieldSpec {
        key: "main_goal",
        path: "question_abstraction.semantic.main_goal",
        array: false,
        canonicalize: false,
    },
    FieldSpec {
        key: "information_goal",
        path: "question_abstraction.semantic.information_goal",
        array: false,
        canonicalize: false,
    },
    // Bounded enum; collapsing synonyms is meaningless here
    FieldSpec {
        key: "complexity",
        path: "question_abstraction.semantic.complexity",
        array: false,
        canonicalize: false,
    },
    // Free-form reference namespace; deliberately never canonicalized
    FieldSpec {
        key: "bibelreferenzen",
        path: "tags.bibelreferenzen",
        array: true,
        canonicalize: false,
    },
    FieldSpec {
        key: "historischer_kontext",
        path: "tags.historischer_kontext",
        array: true,
        canonicalize: false,
    },
    FieldSpec {
        key: "konfession",
        path: "tags.konfession",
        array: true,
        canonicalize: false,
    },
    FieldSpec {
        key: "pastorale_themen",
        path: "tags.pastorale_themen",
        array: true,
        canonicalize: false,
    },
];

/// URL key of the network graph's source-side tag namespace
pub const NETWORK_SOURCE_KEY: &str = "bibelreferenzen";

/// URL key of the network graph's target-side tag namespace
pub const NETWORK_TARGET_KEY: &str = "hauptthemen";

/// Look up a field by its URL key.
pub fn field_by_key(key: &str) -> Option<&'static FieldSpec> {
    TRACKED_FIELDS.iter().find(|f| f.key == key)
}

/// Fields processed by the canonicalization job, in declared order.
pub fn canonicalized_fields() -> impl Iterator<Item = &'static FieldSpec> {
    TRACKED_FIELDS.iter().filter(|f| f.canonicalize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_key() {
        let field = field_by_key("hauptthemen").unwrap();
        assert_eq!(field.path, "tags.hauptthemen");
        assert!(field.array);
        assert!(field.canonicalize);

        assert!(field_by_key("no_such_field").is_none());
    }

    #[test]
    fn canonicalized_fields_order_matches_declaration() {
        let keys: Vec<&str> = canonicalized_fields().map(|f| f.key).collect();
        assert_eq!(
            keys,
            vec![
                "category",
                "subcategory",
                "type",
                "domain",
                "hauptthemen",
                "theologische_konzepte",
            ]
        );
    }

    #[test]
    fn excluded_namespaces_are_not_canonicalized() {
        assert!(!field_by_key("bibelreferenzen").unwrap().canonicalize);
        assert!(!field_by_key("complexity").unwrap().canonicalize);
    }

    #[test]
    fn network_namespaces_resolve() {
        assert!(field_by_key(NETWORK_SOURCE_KEY).unwrap().array);
        assert!(field_by_key(NETWORK_TARGET_KEY).unwrap().array);
    }
}
