use std::collections::HashMap;

use tracing::debug;

use crate::builders::{
    apply_custom_fields, apply_tags, valid_email, BuildContext, BuildOutcome, EntityBuilder,
    SkipReason,
};
use crate::config::{responsible_column, CustomFieldConfig, ImportConfig, OrganizationColumns};
use crate::error::{ImportError, Result};
use crate::model::{Address, Organization, Relation};
use crate::reference::EntityKind;
use crate::rows::Row;
use crate::text;

/// Builds organizations from the company table.
pub struct OrganizationBuilder {
    columns: OrganizationColumns,
    responsible_column: Option<String>,
    relation_column: Option<String>,
    relations: HashMap<String, Relation>,
    option_tag_columns: Vec<String>,
    set_tag_columns: Vec<String>,
    custom_fields: Vec<CustomFieldConfig>,
    phone_delimiters: Vec<char>,
}

impl OrganizationBuilder {
    /// Resolves the configured relation mapping up front so a typo in the
    /// config fails the run before any row is read.
    pub fn new(config: &ImportConfig) -> Result<Self> {
        let mut relations = HashMap::new();
        for (source_value, relation_name) in &config.organization.relations {
            let relation = Relation::from_name(relation_name).ok_or_else(|| {
                ImportError::Config(format!(
                    "'{relation_name}' is not a relation (mapped from option value '{source_value}')"
                ))
            })?;
            relations.insert(source_value.clone(), relation);
        }

        Ok(Self {
            columns: config.columns.organization.clone(),
            responsible_column: config
                .organization
                .responsible_field
                .as_deref()
                .map(responsible_column),
            relation_column: config.organization.relation_column.clone(),
            relations,
            option_tag_columns: config.organization.option_tag_columns.clone(),
            set_tag_columns: config.organization.set_tag_columns.clone(),
            custom_fields: config.organization.custom_fields.clone(),
            phone_delimiters: config.phone_delimiters.clone(),
        })
    }

    fn read_address(
        row: &Row,
        street: &str,
        zip_code: &str,
        city: &str,
        country: &str,
    ) -> Option<Address> {
        let address = Address {
            street: row.non_empty(street).map(str::to_string),
            zip_code: row.non_empty(zip_code).map(str::to_string),
            city: row.non_empty(city).map(str::to_string),
            country: row.non_empty(country).map(str::to_string),
        };
        if address.is_empty() {
            None
        } else {
            Some(address)
        }
    }
}

impl EntityBuilder for OrganizationBuilder {
    type Entity = Organization;

    fn kind(&self) -> EntityKind {
        EntityKind::Organization
    }

    fn build(&self, row: &Row, ctx: &BuildContext<'_>) -> Result<BuildOutcome<Organization>> {
        let Some(id) = row.non_empty(&self.columns.id) else {
            return Ok(BuildOutcome::Skipped(SkipReason::MissingValue {
                column: self.columns.id.clone(),
            }));
        };
        let Some(name) = row.non_empty(&self.columns.name) else {
            return Ok(BuildOutcome::Skipped(SkipReason::MissingValue {
                column: self.columns.name.clone(),
            }));
        };

        let mut organization = Organization::new(id, name);
        organization.organization_number = row
            .non_empty(&self.columns.organization_number)
            .map(str::to_string);
        organization.email = valid_email(row, &self.columns.email);
        organization.web_site = row.non_empty(&self.columns.web_site).map(str::to_string);
        organization.central_phone_number = row
            .non_empty(&self.columns.central_phone)
            .and_then(|raw| text::normalize_phone_field(raw, &self.phone_delimiters));

        organization.postal_address = Self::read_address(
            row,
            &self.columns.street,
            &self.columns.zip_code,
            &self.columns.city,
            &self.columns.country,
        );
        organization.visit_address = Self::read_address(
            row,
            &self.columns.visit_street,
            &self.columns.visit_zip_code,
            &self.columns.visit_city,
            &self.columns.visit_country,
        );

        if let Some(column) = &self.relation_column {
            if let Some(value) = row.non_empty(column) {
                match self.relations.get(value) {
                    Some(relation) => organization.relation = *relation,
                    None => debug!(value, "option value has no relation mapping"),
                }
            }
        }

        // The responsible coworker is a weak reference: an unknown id costs
        // the reference, not the organization.
        if let Some(column) = &self.responsible_column {
            if let Some(coworker_id) = row.non_empty(column) {
                if ctx.model.find_coworker(coworker_id).is_some() {
                    organization.responsible_coworker = Some(coworker_id.to_string());
                } else {
                    debug!(coworker_id, "dropping unresolved responsible coworker");
                }
            }
        }

        apply_tags(
            &mut organization.tags,
            row,
            &self.option_tag_columns,
            &self.set_tag_columns,
        );
        apply_custom_fields(&mut organization.custom_values, row, &self.custom_fields);

        Ok(BuildOutcome::Built(organization))
    }
}
