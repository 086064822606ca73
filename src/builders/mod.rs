pub mod coworker;
pub mod deal;
pub mod document;
pub mod note;
pub mod organization;
pub mod person;

pub use coworker::CoworkerBuilder;
pub use deal::DealBuilder;
pub use document::{DocumentBuilder, DocumentTarget};
pub use note::{DealNoteBuilder, OrganizationNoteBuilder};
pub use organization::OrganizationBuilder;
pub use person::{EmployedPerson, PersonBuilder};

use std::collections::HashMap;

use tracing::debug;

use crate::config::CustomFieldConfig;
use crate::error::Result;
use crate::model::root::RootModel;
use crate::model::{CustomValues, Tags};
use crate::reference::EntityKind;
use crate::rows::Row;
use crate::text;

/// Why a row produced no entity. Skips are ordinary outcomes: counted,
/// logged at debug level, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A required column is absent or blank.
    MissingValue { column: String },
    /// A mandatory reference names an entity the model does not hold.
    UnresolvedReference {
        kind: EntityKind,
        integration_id: String,
    },
    /// The assembled note text came out empty.
    EmptyText,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingValue { column } => {
                write!(f, "required column '{column}' is empty")
            }
            SkipReason::UnresolvedReference {
                kind,
                integration_id,
            } => write!(f, "references unknown {kind} '{integration_id}'"),
            SkipReason::EmptyText => write!(f, "note text is empty"),
        }
    }
}

/// The deal-to-organization link table. Read in full before the deal phase;
/// it creates no entities of its own.
#[derive(Debug, Clone, Default)]
pub struct DealOrganizationLinks {
    map: HashMap<String, String>,
}

impl DealOrganizationLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previously linked organization when the deal was
    /// already mapped.
    pub fn insert(
        &mut self,
        deal_id: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Option<String> {
        self.map.insert(deal_id.into(), organization_id.into())
    }

    pub fn organization_for(&self, deal_id: &str) -> Option<&str> {
        self.map.get(deal_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// What a builder may look at while mapping a row: the model as built so
/// far and the link table. Builders only read; all mutation stays with the
/// importer.
pub struct BuildContext<'a> {
    pub model: &'a RootModel,
    pub links: &'a DealOrganizationLinks,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BuildOutcome<T> {
    Built(T),
    Skipped(SkipReason),
}

/// Maps rows of one source table to entity drafts.
///
/// Builders are plain configuration-driven values constructed once at
/// startup; everything row-specific arrives through `build`. Returning
/// `Skipped` drops the row and is routine; returning an error aborts the
/// import and is reserved for contract violations such as an undeclared
/// deal status.
pub trait EntityBuilder {
    type Entity;

    fn kind(&self) -> EntityKind;

    fn build(&self, row: &Row, ctx: &BuildContext<'_>) -> Result<BuildOutcome<Self::Entity>>;
}

/// Reads a column as an email address, silently dropping values that do
/// not look like one.
pub(crate) fn valid_email(row: &Row, column: &str) -> Option<String> {
    let raw = row.non_empty(column)?;
    if text::is_valid_email(raw) {
        Some(raw.to_string())
    } else {
        debug!(value = raw, "dropping malformed email address");
        None
    }
}

pub(crate) fn apply_tags(tags: &mut Tags, row: &Row, option_columns: &[String], set_columns: &[String]) {
    for column in option_columns {
        if let Some(value) = row.non_empty(column) {
            tags.set(value);
        }
    }
    for column in set_columns {
        if let Some(raw) = row.get(column) {
            for value in text::split_set_field(raw) {
                tags.set(&value);
            }
        }
    }
}

pub(crate) fn apply_custom_fields(
    values: &mut CustomValues,
    row: &Row,
    fields: &[CustomFieldConfig],
) {
    for field in fields {
        if let Some(value) = row.non_empty(&field.column) {
            values.set(&field.integration_id, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_map_deals_to_organizations() {
        let mut links = DealOrganizationLinks::new();
        assert_eq!(links.insert("9", "1"), None);
        assert_eq!(links.insert("9", "2"), Some("1".to_string()));
        assert_eq!(links.organization_for("9"), Some("2"));
        assert_eq!(links.organization_for("8"), None);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn email_helper_drops_malformed_values() {
        let row = Row::from_pairs([("Email", "not an email"), ("Other", "a@b.se")]);
        assert_eq!(valid_email(&row, "Email"), None);
        assert_eq!(valid_email(&row, "Other").as_deref(), Some("a@b.se"));
        assert_eq!(valid_email(&row, "Absent"), None);
    }

    #[test]
    fn tag_columns_feed_tags() {
        let row = Row::from_pairs([("Branch", "Retail"), ("Markets", "SE;NO; ;DK")]);
        let mut tags = Tags::default();
        apply_tags(
            &mut tags,
            &row,
            &["Branch".to_string()],
            &["Markets".to_string()],
        );
        assert_eq!(
            tags.iter().collect::<Vec<_>>(),
            vec!["Retail", "SE", "NO", "DK"]
        );
    }
}
