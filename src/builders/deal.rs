use tracing::debug;

use crate::builders::{
    apply_custom_fields, apply_tags, BuildContext, BuildOutcome, EntityBuilder, SkipReason,
};
use crate::config::{responsible_column, CustomFieldConfig, DealColumns, ImportConfig};
use crate::error::Result;
use crate::model::Deal;
use crate::reference::EntityKind;
use crate::rows::Row;
use crate::text;

/// Builds deals from the project table. The owning organization comes from
/// the link table read beforehand; a deal without a resolvable organization
/// is kept, just without a customer.
pub struct DealBuilder {
    columns: DealColumns,
    responsible_column: Option<String>,
    option_tag_columns: Vec<String>,
    set_tag_columns: Vec<String>,
    custom_fields: Vec<CustomFieldConfig>,
}

impl DealBuilder {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            columns: config.columns.deal.clone(),
            responsible_column: config
                .deal
                .responsible_field
                .as_deref()
                .map(responsible_column),
            option_tag_columns: config.deal.option_tag_columns.clone(),
            set_tag_columns: config.deal.set_tag_columns.clone(),
            custom_fields: config.deal.custom_fields.clone(),
        }
    }
}

impl EntityBuilder for DealBuilder {
    type Entity = Deal;

    fn kind(&self) -> EntityKind {
        EntityKind::Deal
    }

    fn build(&self, row: &Row, ctx: &BuildContext<'_>) -> Result<BuildOutcome<Deal>> {
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

        let mut deal = Deal::new(id, name);
        deal.description = row.non_empty(&self.columns.description).map(str::to_string);
        deal.value = row.non_empty(&self.columns.value).and_then(parse_value);
        deal.probability = row
            .non_empty(&self.columns.probability)
            .and_then(parse_probability);
        deal.order_date = row.non_empty(&self.columns.order_date).and_then(text::parse_day);

        // A status outside the declared catalog aborts the import; resolving
        // through the catalog also canonicalizes the label's case.
        deal.status = match row.non_empty(&self.columns.status) {
            Some(label) => Some(ctx.model.settings.resolve_deal_status(label)?.label.clone()),
            None => ctx.model.settings.default_deal_status().map(str::to_string),
        };

        if let Some(organization_id) = ctx.links.organization_for(id) {
            if ctx.model.find_organization(organization_id).is_some() {
                deal.customer = Some(organization_id.to_string());
            } else {
                debug!(deal = id, organization_id, "dropping unresolved deal customer");
            }
        }

        if let Some(column) = &self.responsible_column {
            if let Some(coworker_id) = row.non_empty(column) {
                if ctx.model.find_coworker(coworker_id).is_some() {
                    deal.responsible_coworker = Some(coworker_id.to_string());
                } else {
                    debug!(coworker_id, "dropping unresolved responsible coworker");
                }
            }
        }

        apply_tags(
            &mut deal.tags,
            row,
            &self.option_tag_columns,
            &self.set_tag_columns,
        );
        apply_custom_fields(&mut deal.custom_values, row, &self.custom_fields);

        Ok(BuildOutcome::Built(deal))
    }
}

/// Monetary values arrive with currency fluff and thousand separators.
fn parse_value(raw: &str) -> Option<i64> {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    if digits.is_empty() {
        debug!(value = raw, "deal value is not numeric");
    }
    digits.parse().ok()
}

fn parse_probability(raw: &str) -> Option<u8> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.parse::<u32>() {
        Ok(percent) if percent <= 100 => Some(percent as u8),
        _ => {
            debug!(value = raw, "deal probability is not a percentage");
            None
        }
    }
}
