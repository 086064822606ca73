use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::builders::{
    BuildContext, BuildOutcome, CoworkerBuilder, DealBuilder, DealNoteBuilder,
    DealOrganizationLinks, DocumentBuilder, DocumentTarget, EntityBuilder,
    OrganizationBuilder, OrganizationNoteBuilder, PersonBuilder, SkipReason,
};
use crate::config::ImportConfig;
use crate::error::{ImportError, Result};
use crate::model::root::RootModel;
use crate::reference::Registered;
use crate::rows::{RowSource, SourceTable};

/// Import phases in dependency order: every kind is fully imported before
/// any phase that references it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Configure,
    Coworkers,
    Organizations,
    Persons,
    OrganizationNotes,
    DealLinks,
    Deals,
    DealNotes,
    OrganizationDocuments,
    DealDocuments,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Configure => "configure",
            Phase::Coworkers => "coworkers",
            Phase::Organizations => "organizations",
            Phase::Persons => "persons",
            Phase::OrganizationNotes => "organization_notes",
            Phase::DealLinks => "deal_links",
            Phase::Deals => "deals",
            Phase::DealNotes => "deal_notes",
            Phase::OrganizationDocuments => "organization_documents",
            Phase::DealDocuments => "deal_documents",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Row outcomes for one phase.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseStats {
    pub phase: Phase,
    pub rows: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub row_errors: usize,
    pub skip_reasons: Vec<String>,
}

impl PhaseStats {
    fn new(phase: Phase) -> Self {
        Self {
            phase,
            rows: 0,
            created: 0,
            updated: 0,
            skipped: 0,
            row_errors: 0,
            skip_reasons: Vec::new(),
        }
    }

    fn record_skip(&mut self, reason: &SkipReason) {
        self.skipped += 1;
        self.skip_reasons.push(reason.to_string());
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportStats {
    pub phases: Vec<PhaseStats>,
}

impl ImportStats {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseStats> {
        self.phases.iter().find(|stats| stats.phase == phase)
    }

    pub fn rows(&self) -> usize {
        self.phases.iter().map(|p| p.rows).sum()
    }

    pub fn created(&self) -> usize {
        self.phases.iter().map(|p| p.created).sum()
    }

    pub fn updated(&self) -> usize {
        self.phases.iter().map(|p| p.updated).sum()
    }

    pub fn skipped(&self) -> usize {
        self.phases.iter().map(|p| p.skipped).sum()
    }

    pub fn row_errors(&self) -> usize {
        self.phases.iter().map(|p| p.row_errors).sum()
    }
}

/// Everything one import run produced.
#[derive(Debug)]
pub struct ImportReport {
    pub run_id: Uuid,
    pub model: RootModel,
    pub stats: ImportStats,
}

/// Drives a full import: completeness check, configuration, then the row
/// phases in dependency order. The importer owns all model mutation;
/// builders only map rows.
pub struct Importer {
    config: ImportConfig,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    /// Tables the enabled phases will read. All of them must exist before
    /// the first row is touched, otherwise entities would silently lose
    /// references to rows in the absent files.
    pub fn required_tables(&self) -> Vec<SourceTable> {
        let mut tables = vec![
            SourceTable::Coworkers,
            SourceTable::Organizations,
            SourceTable::Persons,
        ];
        if self.config.history.import {
            tables.push(SourceTable::OrganizationNotes);
        }
        if self.config.deal.import {
            tables.push(SourceTable::DealLinks);
            tables.push(SourceTable::Deals);
            if self.config.history.import {
                tables.push(SourceTable::DealNotes);
            }
        }
        if self.config.documents.import {
            tables.push(SourceTable::OrganizationDocuments);
            if self.config.deal.import {
                tables.push(SourceTable::DealDocuments);
            }
        }
        tables
    }

    fn ensure_complete(&self, source: &dyn RowSource) -> Result<()> {
        let missing: Vec<String> = self
            .required_tables()
            .into_iter()
            .filter(|table| !source.has_table(*table))
            .map(|table| table.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::MissingTables { tables: missing });
        }
        Ok(())
    }

    /// The configure phase: declares custom fields and the deal status
    /// catalog from config, then seals the settings.
    fn configure(&self, model: &mut RootModel) -> Result<()> {
        for field in &self.config.organization.custom_fields {
            model.settings.set_organization_field(field.definition())?;
        }
        for field in &self.config.person.custom_fields {
            model.settings.set_person_field(field.definition())?;
        }
        for field in &self.config.deal.custom_fields {
            model.settings.set_deal_field(field.definition())?;
        }
        for status in &self.config.deal.statuses {
            model.settings.add_deal_status(status.clone())?;
        }
        if let Some(label) = &self.config.deal.default_status {
            model.settings.set_default_deal_status(label)?;
        }
        model.settings.seal();
        Ok(())
    }

    #[instrument(skip(self, source))]
    pub fn run(&self, source: &dyn RowSource) -> Result<ImportReport> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%run_id, "starting import");

        // Builder construction validates the configured mappings, so config
        // typos surface before any file is opened.
        let coworkers = CoworkerBuilder::new(&self.config);
        let organizations = OrganizationBuilder::new(&self.config)?;
        let persons = PersonBuilder::new(&self.config);
        let organization_notes = OrganizationNoteBuilder::new(&self.config)?;
        let deals = DealBuilder::new(&self.config);
        let deal_notes = DealNoteBuilder::new(&self.config)?;
        let organization_documents =
            DocumentBuilder::new(&self.config, DocumentTarget::Organization);
        let deal_documents = DocumentBuilder::new(&self.config, DocumentTarget::Deal);

        self.ensure_complete(source)?;

        let mut model = RootModel::new();
        let mut stats = ImportStats::default();
        let mut links = DealOrganizationLinks::new();

        debug!(phase = %Phase::Configure, "declaring settings");
        self.configure(&mut model)?;

        stats.phases.push(self.drive(
            source,
            SourceTable::Coworkers,
            Phase::Coworkers,
            &coworkers,
            &links,
            &mut model,
            |model, coworker| Some(model.add_coworker(coworker)),
        )?);

        stats.phases.push(self.drive(
            source,
            SourceTable::Organizations,
            Phase::Organizations,
            &organizations,
            &links,
            &mut model,
            |model, organization| Some(model.add_organization(organization)),
        )?);

        stats.phases.push(self.drive(
            source,
            SourceTable::Persons,
            Phase::Persons,
            &persons,
            &links,
            &mut model,
            |model, built| model.add_person(&built.employer, built.person),
        )?);

        if self.config.history.import {
            stats.phases.push(self.drive(
                source,
                SourceTable::OrganizationNotes,
                Phase::OrganizationNotes,
                &organization_notes,
                &links,
                &mut model,
                |model, note| {
                    model.add_note(note);
                    Some(Registered::Created)
                },
            )?);
        }

        if self.config.deal.import {
            let link_stats = self.read_links(source, &mut links)?;
            stats.phases.push(link_stats);

            stats.phases.push(self.drive(
                source,
                SourceTable::Deals,
                Phase::Deals,
                &deals,
                &links,
                &mut model,
                |model, deal| Some(model.add_deal(deal)),
            )?);

            if self.config.history.import {
                stats.phases.push(self.drive(
                    source,
                    SourceTable::DealNotes,
                    Phase::DealNotes,
                    &deal_notes,
                    &links,
                    &mut model,
                    |model, note| {
                        model.add_note(note);
                        Some(Registered::Created)
                    },
                )?);
            }
        }

        if self.config.documents.import {
            stats.phases.push(self.drive(
                source,
                SourceTable::OrganizationDocuments,
                Phase::OrganizationDocuments,
                &organization_documents,
                &links,
                &mut model,
                |model, document| Some(model.add_document(document)),
            )?);

            if self.config.deal.import {
                stats.phases.push(self.drive(
                    source,
                    SourceTable::DealDocuments,
                    Phase::DealDocuments,
                    &deal_documents,
                    &links,
                    &mut model,
                    |model, document| Some(model.add_document(document)),
                )?);
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        histogram!("crm_import_duration_seconds").record(elapsed);

        let counts = model.entity_counts();
        info!(
            %run_id,
            rows = stats.rows(),
            created = stats.created(),
            updated = stats.updated(),
            skipped = stats.skipped(),
            row_errors = stats.row_errors(),
            organizations = counts.organizations,
            persons = counts.persons,
            deals = counts.deals,
            notes = counts.notes,
            documents = counts.documents,
            "import finished"
        );

        Ok(ImportReport {
            run_id,
            model,
            stats,
        })
    }

    /// Runs one row phase: open the table, build every row, apply the
    /// drafts to the model. `apply` returning `None` means the draft's
    /// target disappeared, which is counted as a skip.
    fn drive<B, F>(
        &self,
        source: &dyn RowSource,
        table: SourceTable,
        phase: Phase,
        builder: &B,
        links: &DealOrganizationLinks,
        model: &mut RootModel,
        mut apply: F,
    ) -> Result<PhaseStats>
    where
        B: EntityBuilder,
        F: FnMut(&mut RootModel, B::Entity) -> Option<Registered>,
    {
        let mut stats = PhaseStats::new(phase);

        for row in source.open(table)? {
            stats.rows += 1;
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    stats.row_errors += 1;
                    warn!(phase = %phase, error = %e, "dropping malformed row");
                    continue;
                }
            };

            let outcome = {
                let ctx = BuildContext {
                    model,
                    links,
                };
                builder.build(&row, &ctx)?
            };

            match outcome {
                BuildOutcome::Built(entity) => match apply(model, entity) {
                    Some(Registered::Created) => stats.created += 1,
                    Some(Registered::Updated) => stats.updated += 1,
                    None => {
                        stats.skipped += 1;
                        debug!(phase = %phase, "draft target vanished before apply");
                    }
                },
                BuildOutcome::Skipped(reason) => {
                    debug!(phase = %phase, %reason, "skipping row");
                    stats.record_skip(&reason);
                }
            }
        }

        counter!("crm_rows_total", "phase" => phase.name()).increment(stats.rows as u64);
        counter!("crm_created_total", "phase" => phase.name()).increment(stats.created as u64);
        counter!("crm_updated_total", "phase" => phase.name()).increment(stats.updated as u64);
        counter!("crm_skipped_total", "phase" => phase.name()).increment(stats.skipped as u64);
        counter!("crm_row_errors_total", "phase" => phase.name())
            .increment(stats.row_errors as u64);
        info!(
            phase = %phase,
            rows = stats.rows,
            created = stats.created,
            updated = stats.updated,
            skipped = stats.skipped,
            row_errors = stats.row_errors,
            "phase complete"
        );

        Ok(stats)
    }

    /// Reads the deal-to-organization link table into a plain map. It feeds
    /// the deal phase and creates no entities itself.
    fn read_links(
        &self,
        source: &dyn RowSource,
        links: &mut DealOrganizationLinks,
    ) -> Result<PhaseStats> {
        let mut stats = PhaseStats::new(Phase::DealLinks);
        let columns = &self.config.columns.deal_link;

        for row in source.open(SourceTable::DealLinks)? {
            stats.rows += 1;
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    stats.row_errors += 1;
                    warn!(phase = %Phase::DealLinks, error = %e, "dropping malformed row");
                    continue;
                }
            };

            let deal_id = row.non_empty(&columns.deal);
            let organization_id = row.non_empty(&columns.organization);
            match (deal_id, organization_id) {
                (Some(deal_id), Some(organization_id)) => {
                    match links.insert(deal_id, organization_id) {
                        None => stats.created += 1,
                        Some(_) => stats.updated += 1,
                    }
                }
                (None, _) => stats.record_skip(&SkipReason::MissingValue {
                    column: columns.deal.clone(),
                }),
                (_, None) => stats.record_skip(&SkipReason::MissingValue {
                    column: columns.organization.clone(),
                }),
            }
        }

        counter!("crm_rows_total", "phase" => Phase::DealLinks.name())
            .increment(stats.rows as u64);
        info!(
            phase = %Phase::DealLinks,
            rows = stats.rows,
            links = links.len(),
            "phase complete"
        );
        Ok(stats)
    }
}
