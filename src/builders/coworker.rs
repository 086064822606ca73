use crate::builders::{valid_email, BuildContext, BuildOutcome, EntityBuilder, SkipReason};
use crate::config::{CoworkerColumns, ImportConfig};
use crate::error::Result;
use crate::model::Coworker;
use crate::reference::EntityKind;
use crate::rows::Row;
use crate::text;

/// Builds coworkers from the user table. The source has a single full-name
/// column, split according to the configured locale.
pub struct CoworkerBuilder {
    columns: CoworkerColumns,
    locale: String,
    phone_delimiters: Vec<char>,
}

impl CoworkerBuilder {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            columns: config.columns.coworker.clone(),
            locale: config.locale.clone(),
            phone_delimiters: config.phone_delimiters.clone(),
        }
    }
}

impl EntityBuilder for CoworkerBuilder {
    type Entity = Coworker;

    fn kind(&self) -> EntityKind {
        EntityKind::Coworker
    }

    fn build(&self, row: &Row, _ctx: &BuildContext<'_>) -> Result<BuildOutcome<Coworker>> {
        let Some(id) = row.non_empty(&self.columns.id) else {
            return Ok(BuildOutcome::Skipped(SkipReason::MissingValue {
                column: self.columns.id.clone(),
            }));
        };
        let Some(raw_name) = row.non_empty(&self.columns.name) else {
            return Ok(BuildOutcome::Skipped(SkipReason::MissingValue {
                column: self.columns.name.clone(),
            }));
        };

        let mut coworker = Coworker::new(id);
        let name = text::parse_full_name(raw_name, &self.locale);
        coworker.first_name = name.first_name;
        coworker.last_name = name.last_name;
        coworker.email = valid_email(row, &self.columns.email);
        coworker.direct_phone_number = row
            .non_empty(&self.columns.direct_phone)
            .and_then(|raw| text::normalize_phone_field(raw, &self.phone_delimiters));
        coworker.mobile_phone_number = row
            .non_empty(&self.columns.mobile_phone)
            .and_then(|raw| text::normalize_phone_field(raw, &self.phone_delimiters));

        Ok(BuildOutcome::Built(coworker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::DealOrganizationLinks;
    use crate::model::root::RootModel;

    fn build(row: Row) -> BuildOutcome<Coworker> {
        let model = RootModel::new();
        let links = DealOrganizationLinks::new();
        let ctx = BuildContext {
            model: &model,
            links: &links,
        };
        CoworkerBuilder::new(&ImportConfig::default())
            .build(&row, &ctx)
            .unwrap()
    }

    #[test]
    fn splits_the_name_column() {
        let row = Row::from_pairs([("idUser", "7"), ("Name", "Anna Andersson")]);
        match build(row) {
            BuildOutcome::Built(coworker) => {
                assert_eq!(coworker.integration_id, "7");
                assert_eq!(coworker.first_name.as_deref(), Some("Anna"));
                assert_eq!(coworker.last_name.as_deref(), Some("Andersson"));
            }
            other => panic!("expected coworker, got {other:?}"),
        }
    }

    #[test]
    fn rows_without_id_or_name_are_skipped() {
        let row = Row::from_pairs([("Name", "Anna Andersson")]);
        assert_eq!(
            build(row),
            BuildOutcome::Skipped(SkipReason::MissingValue {
                column: "idUser".to_string()
            })
        );

        let row = Row::from_pairs([("idUser", "7"), ("Name", "  ")]);
        assert_eq!(
            build(row),
            BuildOutcome::Skipped(SkipReason::MissingValue {
                column: "Name".to_string()
            })
        );
    }

    #[test]
    fn optional_contact_columns_are_cleaned() {
        let row = Row::from_pairs([
            ("idUser", "7"),
            ("Name", "Anna Andersson"),
            ("Email", "broken@"),
            ("Telephone", "08-1 / 08-2"),
        ]);
        match build(row) {
            BuildOutcome::Built(coworker) => {
                assert_eq!(coworker.email, None);
                assert_eq!(coworker.direct_phone_number.as_deref(), Some("08-1, 08-2"));
                assert_eq!(coworker.mobile_phone_number, None);
            }
            other => panic!("expected coworker, got {other:?}"),
        }
    }
}
