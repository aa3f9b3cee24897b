//! Which detector classes carry text worth recognizing.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_TAXONOMY;
use crate::backend::ClassTable;

/// Field names recognized on a Vietnamese citizen identity card.
pub const DEFAULT_TEXT_LABELS: &[&str] = &[
    "dob",
    "gender",
    "id",
    "name",
    "nationality",
    "current_place1",
    "current_place2",
    "expire_date",
    "issue_date",
    "origin_place1",
    "origin_place2",
    "personal_identifi",
];

/// Class names of the identity card detector, indexed by class identifier.
pub const ID_CARD_CLASSES: &[&str] = &[
    "bhyt",
    "cccd",
    "current_place1",
    "current_place2",
    "dob",
    "expire_date",
    "gender",
    "id",
    "id_",
    "ihos",
    "iplace",
    "issue_date",
    "name",
    "nationality",
    "origin_place1",
    "origin_place2",
    "personal_identifi",
];

/// Returns [`ID_CARD_CLASSES`] as a class table.
pub fn id_card_class_table() -> ClassTable {
    (0u32..)
        .zip(ID_CARD_CLASSES)
        .map(|(id, name)| (id, (*name).to_owned()))
        .collect()
}

/// The configured set of semantic field names.
///
/// On its own the taxonomy knows nothing about class identifiers. Those are
/// derived once a detection backend's class table is known, see
/// [`RegionTaxonomy::bind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionTaxonomy {
    labels: BTreeSet<String>,
}

impl RegionTaxonomy {
    /// Creates a taxonomy from field names.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the configured field names in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// Returns true if `label` is a configured field name.
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Returns the number of configured field names.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true if no field names are configured.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Derives the class-identifier set from a detector's class table.
    ///
    /// Field names that the table does not contain are kept aside in
    /// [`BoundTaxonomy::missing_labels`]; such fields are never produced.
    pub fn bind(&self, class_table: &ClassTable) -> BoundTaxonomy {
        let classes: BTreeMap<u32, String> = class_table
            .iter()
            .filter(|(_, name)| self.contains(name))
            .map(|(id, name)| (*id, name.clone()))
            .collect();

        let present: BTreeSet<&str> = classes.values().map(String::as_str).collect();
        let missing: Vec<String> = self
            .labels
            .iter()
            .filter(|label| !present.contains(label.as_str()))
            .cloned()
            .collect();

        if !missing.is_empty() {
            tracing::debug!(
                target: TRACING_TARGET_TAXONOMY,
                missing = ?missing,
                "detector class table lacks some text labels"
            );
        }

        tracing::debug!(
            target: TRACING_TARGET_TAXONOMY,
            text_class_ids = ?classes.keys().collect::<Vec<_>>(),
            "taxonomy bound to class table"
        );

        BoundTaxonomy {
            labels: self.clone(),
            classes,
            missing,
        }
    }
}

impl Default for RegionTaxonomy {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_LABELS.iter().copied())
    }
}

/// A [`RegionTaxonomy`] resolved against a concrete class table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundTaxonomy {
    labels: RegionTaxonomy,
    classes: BTreeMap<u32, String>,
    missing: Vec<String>,
}

impl BoundTaxonomy {
    /// Returns the field name for a class, or `None` if it is not text-bearing.
    pub fn classify(&self, class_id: u32) -> Option<&str> {
        self.classes.get(&class_id).map(String::as_str)
    }

    /// Returns the text-bearing class identifiers in ascending order.
    pub fn class_ids(&self) -> Vec<u32> {
        self.classes.keys().copied().collect()
    }

    /// Returns configured field names absent from the class table.
    pub fn missing_labels(&self) -> &[String] {
        &self.missing
    }

    /// Returns the taxonomy this binding was derived from.
    pub fn taxonomy(&self) -> &RegionTaxonomy {
        &self.labels
    }
}
