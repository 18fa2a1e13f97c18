//! Stock statuses and metadata fields installed by `edflow init`.

use crate::model::{Kind, MetadataType, NewTerm};

struct DefaultTerm {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    metadata_type: Option<MetadataType>,
}

const DEFAULT_STATUSES: &[DefaultTerm] = &[
    DefaultTerm {
        name: "Pitch",
        slug: "pitch",
        description: "Idea proposed; waiting for acceptance.",
        metadata_type: None,
    },
    DefaultTerm {
        name: "Assigned",
        slug: "assigned",
        description: "Post idea assigned to writer.",
        metadata_type: None,
    },
    DefaultTerm {
        name: "In Progress",
        slug: "in-progress",
        description: "Writer is working on the post.",
        metadata_type: None,
    },
    DefaultTerm {
        name: "Draft",
        slug: "draft",
        description: "Post is a draft; not ready for review or publication.",
        metadata_type: None,
    },
    DefaultTerm {
        name: "Pending Review",
        slug: "pending",
        description: "Post needs to be reviewed by an editor.",
        metadata_type: None,
    },
];

const DEFAULT_FIELDS: &[DefaultTerm] = &[
    DefaultTerm {
        name: "Assignment",
        slug: "assignment",
        description: "What the post needs to cover.",
        metadata_type: Some(MetadataType::Text),
    },
    DefaultTerm {
        name: "Needs Photo",
        slug: "needs-photo",
        description: "Checked if this post needs a photo.",
        metadata_type: Some(MetadataType::Checkbox),
    },
    DefaultTerm {
        name: "Word Count",
        slug: "word-count",
        description: "Required post length in words.",
        metadata_type: Some(MetadataType::Text),
    },
];

/// The stock terms of a kind, in their intended order.
pub fn defaults_for(kind: Kind) -> Vec<NewTerm> {
    let source = match kind {
        Kind::Status => DEFAULT_STATUSES,
        Kind::MetadataField => DEFAULT_FIELDS,
    };
    source
        .iter()
        .map(|d| {
            let term = NewTerm::new(d.name, d.slug).with_description(d.description);
            match d.metadata_type {
                Some(t) => term.with_type(t),
                None => term,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::slugify;

    #[test]
    fn test_fields_all_have_types() {
        assert!(defaults_for(Kind::MetadataField)
            .iter()
            .all(|t| t.metadata_type.is_some()));
        assert!(defaults_for(Kind::Status)
            .iter()
            .all(|t| t.metadata_type.is_none()));
    }

    #[test]
    fn test_field_slugs_match_names() {
        for term in defaults_for(Kind::MetadataField) {
            assert_eq!(slugify(&term.name), term.slug);
        }
    }
}
