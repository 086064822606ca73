use crate::builders::{BuildContext, BuildOutcome, EntityBuilder, SkipReason};
use crate::config::{DocumentColumns, ImportConfig};
use crate::constants;
use crate::error::Result;
use crate::model::{Attachment, Document};
use crate::reference::EntityKind;
use crate::rows::Row;

/// Which side of the export a document table belongs to. Organization and
/// deal documents share one source id space, so ids get a target prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentTarget {
    Organization,
    Deal,
}

/// Builds document references from either document table. The author is a
/// weak reference falling back to the import coworker; the attachment
/// target is mandatory.
pub struct DocumentBuilder {
    columns: DocumentColumns,
    target: DocumentTarget,
}

impl DocumentBuilder {
    pub fn new(config: &ImportConfig, target: DocumentTarget) -> Self {
        Self {
            columns: config.columns.document.clone(),
            target,
        }
    }
}

impl EntityBuilder for DocumentBuilder {
    type Entity = Document;

    fn kind(&self) -> EntityKind {
        EntityKind::Document
    }

    fn build(&self, row: &Row, ctx: &BuildContext<'_>) -> Result<BuildOutcome<Document>> {
        let Some(raw_id) = row.non_empty(&self.columns.id) else {
            return Ok(BuildOutcome::Skipped(SkipReason::MissingValue {
                column: self.columns.id.clone(),
            }));
        };

        let (integration_id, target_column) = match self.target {
            DocumentTarget::Organization => (
                format!("{}{raw_id}", constants::ORGANIZATION_DOCUMENT_PREFIX),
                &self.columns.organization_id,
            ),
            DocumentTarget::Deal => (
                format!("{}{raw_id}", constants::DEAL_DOCUMENT_PREFIX),
                &self.columns.deal_id,
            ),
        };

        let Some(target_id) = row.non_empty(target_column) else {
            return Ok(BuildOutcome::Skipped(SkipReason::MissingValue {
                column: target_column.clone(),
            }));
        };
        let attached_to = match self.target {
            DocumentTarget::Organization => {
                if ctx.model.find_organization(target_id).is_none() {
                    return Ok(BuildOutcome::Skipped(SkipReason::UnresolvedReference {
                        kind: EntityKind::Organization,
                        integration_id: target_id.to_string(),
                    }));
                }
                Attachment::Organization(target_id.to_string())
            }
            DocumentTarget::Deal => {
                if ctx.model.find_deal(target_id).is_none() {
                    return Ok(BuildOutcome::Skipped(SkipReason::UnresolvedReference {
                        kind: EntityKind::Deal,
                        integration_id: target_id.to_string(),
                    }));
                }
                Attachment::Deal(target_id.to_string())
            }
        };

        let created_by = row
            .non_empty(&self.columns.created_by)
            .filter(|id| ctx.model.find_coworker(id).is_some())
            .unwrap_or(ctx.model.import_coworker_id())
            .to_string();

        Ok(BuildOutcome::Built(Document {
            integration_id,
            attached_to,
            path: row.non_empty(&self.columns.path).unwrap_or_default().to_string(),
            name: row.non_empty(&self.columns.name).map(str::to_string),
            created_by,
        }))
    }
}
