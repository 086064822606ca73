use std::collections::HashMap;

use crate::builders::{BuildContext, BuildOutcome, EntityBuilder, PersonBuilder, SkipReason};
use crate::config::{ImportConfig, NoteColumns, PersonIdScope};
use crate::error::{ImportError, Result};
use crate::model::{Attachment, Note, NoteClassification};
use crate::reference::EntityKind;
use crate::rows::Row;
use crate::text;

/// Builds notes from the company history table.
///
/// When the deployment maps activity categories to classifications, the
/// note text is the plain history column. Without a mapping every note is a
/// comment and the category is folded into the text, since it would
/// otherwise be lost.
pub struct OrganizationNoteBuilder {
    columns: NoteColumns,
    classifications: HashMap<String, NoteClassification>,
    person_id_scope: PersonIdScope,
}

impl OrganizationNoteBuilder {
    pub fn new(config: &ImportConfig) -> Result<Self> {
        Ok(Self {
            columns: config.columns.note.clone(),
            classifications: classification_map(config)?,
            person_id_scope: config.person.id_scope,
        })
    }
}

impl EntityBuilder for OrganizationNoteBuilder {
    type Entity = Note;

    fn kind(&self) -> EntityKind {
        EntityKind::Note
    }

    fn build(&self, row: &Row, ctx: &BuildContext<'_>) -> Result<BuildOutcome<Note>> {
        let Some(organization_id) = row.non_empty(&self.columns.organization_id) else {
            return Ok(BuildOutcome::Skipped(SkipReason::MissingValue {
                column: self.columns.organization_id.clone(),
            }));
        };
        let Some(organization) = ctx.model.find_organization(organization_id) else {
            return Ok(BuildOutcome::Skipped(SkipReason::UnresolvedReference {
                kind: EntityKind::Organization,
                integration_id: organization_id.to_string(),
            }));
        };
        let created_by = match resolve_author(row, &self.columns, ctx) {
            Ok(author) => author,
            Err(skip) => return Ok(BuildOutcome::Skipped(skip)),
        };

        let category = row.non_empty(&self.columns.category);
        let history = row.non_empty(&self.columns.history);
        let (classification, text) = if self.classifications.is_empty() {
            let text = match (category, history) {
                (Some(category), Some(history)) => format!("{category}: {history}"),
                (None, Some(history)) => history.to_string(),
                _ => String::new(),
            };
            (NoteClassification::Comment, text)
        } else {
            let classification = category
                .and_then(|value| self.classifications.get(value).copied())
                .unwrap_or_default();
            (classification, history.unwrap_or_default().to_string())
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Ok(BuildOutcome::Skipped(SkipReason::EmptyText));
        }

        // The person is a weak reference, looked up among the employees of
        // this organization using the same id scoping the person phase used.
        let person = row.non_empty(&self.columns.person_id).and_then(|raw_id| {
            let id = PersonBuilder::scoped_id(self.person_id_scope, organization_id, raw_id);
            organization
                .find_employee(&id)
                .map(|employee| employee.integration_id.clone())
        });

        Ok(BuildOutcome::Built(Note {
            attached_to: Attachment::Organization(organization_id.to_string()),
            text,
            classification,
            date: row
                .non_empty(&self.columns.date)
                .and_then(text::parse_timestamp),
            created_by,
            person,
        }))
    }
}

/// Builds notes from the project history table. The raw history text is
/// prefixed with its category in the source, so when a classification
/// mapping carries that information the prefix is stripped from the text.
pub struct DealNoteBuilder {
    columns: NoteColumns,
    classifications: HashMap<String, NoteClassification>,
}

impl DealNoteBuilder {
    pub fn new(config: &ImportConfig) -> Result<Self> {
        Ok(Self {
            columns: config.columns.note.clone(),
            classifications: classification_map(config)?,
        })
    }
}

impl EntityBuilder for DealNoteBuilder {
    type Entity = Note;

    fn kind(&self) -> EntityKind {
        EntityKind::Note
    }

    fn build(&self, row: &Row, ctx: &BuildContext<'_>) -> Result<BuildOutcome<Note>> {
        let Some(deal_id) = row.non_empty(&self.columns.deal_id) else {
            return Ok(BuildOutcome::Skipped(SkipReason::MissingValue {
                column: self.columns.deal_id.clone(),
            }));
        };
        if ctx.model.find_deal(deal_id).is_none() {
            return Ok(BuildOutcome::Skipped(SkipReason::UnresolvedReference {
                kind: EntityKind::Deal,
                integration_id: deal_id.to_string(),
            }));
        }
        let created_by = match resolve_author(row, &self.columns, ctx) {
            Ok(author) => author,
            Err(skip) => return Ok(BuildOutcome::Skipped(skip)),
        };

        let category = row.non_empty(&self.columns.category);
        let raw = row.non_empty(&self.columns.raw_history).unwrap_or_default();
        let (classification, text) = if self.classifications.is_empty() {
            (NoteClassification::Comment, raw.to_string())
        } else {
            let classification = category
                .and_then(|value| self.classifications.get(value).copied())
                .unwrap_or_default();
            let text = match category {
                Some(category) => raw.replacen(&format!("{category}:"), "", 1),
                None => raw.to_string(),
            };
            (classification, text)
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Ok(BuildOutcome::Skipped(SkipReason::EmptyText));
        }

        Ok(BuildOutcome::Built(Note {
            attached_to: Attachment::Deal(deal_id.to_string()),
            text,
            classification,
            date: row
                .non_empty(&self.columns.date)
                .and_then(text::parse_timestamp),
            created_by,
            person: None,
        }))
    }
}

fn resolve_author(
    row: &Row,
    columns: &NoteColumns,
    ctx: &BuildContext<'_>,
) -> std::result::Result<String, SkipReason> {
    let Some(coworker_id) = row.non_empty(&columns.coworker_id) else {
        return Err(SkipReason::MissingValue {
            column: columns.coworker_id.clone(),
        });
    };
    if ctx.model.find_coworker(coworker_id).is_none() {
        return Err(SkipReason::UnresolvedReference {
            kind: EntityKind::Coworker,
            integration_id: coworker_id.to_string(),
        });
    }
    Ok(coworker_id.to_string())
}

fn classification_map(
    config: &ImportConfig,
) -> Result<HashMap<String, NoteClassification>> {
    let mut map = HashMap::new();
    for (category, name) in &config.history.classifications {
        let classification = NoteClassification::from_name(name).ok_or_else(|| {
            ImportError::Config(format!(
                "'{name}' is not a note classification (mapped from category '{category}')"
            ))
        })?;
        map.insert(category.clone(), classification);
    }
    Ok(map)
}
