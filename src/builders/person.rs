use crate::builders::{
    apply_custom_fields, apply_tags, valid_email, BuildContext, BuildOutcome, EntityBuilder,
    SkipReason,
};
use crate::config::{CustomFieldConfig, ImportConfig, PersonColumns, PersonIdScope};
use crate::error::Result;
use crate::model::Person;
use crate::reference::EntityKind;
use crate::rows::Row;
use crate::text;

/// A person draft together with the employer it must be attached to.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployedPerson {
    pub employer: String,
    pub person: Person,
}

/// Builds persons from the contact table. The employer is a mandatory
/// reference: a row whose organization is not in the model is dropped.
pub struct PersonBuilder {
    columns: PersonColumns,
    id_scope: PersonIdScope,
    locale: String,
    phone_delimiters: Vec<char>,
    option_tag_columns: Vec<String>,
    set_tag_columns: Vec<String>,
    custom_fields: Vec<CustomFieldConfig>,
}

impl PersonBuilder {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            columns: config.columns.person.clone(),
            id_scope: config.person.id_scope,
            locale: config.locale.clone(),
            phone_delimiters: config.phone_delimiters.clone(),
            option_tag_columns: config.person.option_tag_columns.clone(),
            set_tag_columns: config.person.set_tag_columns.clone(),
            custom_fields: config.person.custom_fields.clone(),
        }
    }

    /// Person ids in desktop exports are often only unique within their
    /// organization; scoping prefixes them with the employer id.
    pub fn scoped_id(scope: PersonIdScope, employer_id: &str, raw_id: &str) -> String {
        match scope {
            PersonIdScope::Global => raw_id.to_string(),
            PersonIdScope::PerOrganization => format!("{employer_id}-{raw_id}"),
        }
    }
}

impl EntityBuilder for PersonBuilder {
    type Entity = EmployedPerson;

    fn kind(&self) -> EntityKind {
        EntityKind::Person
    }

    fn build(&self, row: &Row, ctx: &BuildContext<'_>) -> Result<BuildOutcome<EmployedPerson>> {
        let Some(raw_id) = row.non_empty(&self.columns.id) else {
            return Ok(BuildOutcome::Skipped(SkipReason::MissingValue {
                column: self.columns.id.clone(),
            }));
        };
        let Some(employer_id) = row.non_empty(&self.columns.organization_id) else {
            return Ok(BuildOutcome::Skipped(SkipReason::MissingValue {
                column: self.columns.organization_id.clone(),
            }));
        };
        if ctx.model.find_organization(employer_id).is_none() {
            return Ok(BuildOutcome::Skipped(SkipReason::UnresolvedReference {
                kind: EntityKind::Organization,
                integration_id: employer_id.to_string(),
            }));
        }

        let mut person = Person::new(Self::scoped_id(self.id_scope, employer_id, raw_id));
        person.first_name = row.non_empty(&self.columns.first_name).map(str::to_string);
        person.last_name = row.non_empty(&self.columns.last_name).map(str::to_string);

        // Some exports carry one combined name column instead of two
        if person.first_name.is_none() && person.last_name.is_none() {
            if let Some(full_name_column) = &self.columns.full_name {
                if let Some(raw_name) = row.non_empty(full_name_column) {
                    let name = text::parse_full_name(raw_name, &self.locale);
                    person.first_name = name.first_name;
                    person.last_name = name.last_name;
                }
            }
        }

        person.email = valid_email(row, &self.columns.email);
        person.direct_phone_number = row
            .non_empty(&self.columns.direct_phone)
            .and_then(|raw| text::normalize_phone_field(raw, &self.phone_delimiters));
        person.mobile_phone_number = row
            .non_empty(&self.columns.mobile_phone)
            .and_then(|raw| text::normalize_phone_field(raw, &self.phone_delimiters));
        person.position = row.non_empty(&self.columns.position).map(str::to_string);

        apply_tags(
            &mut person.tags,
            row,
            &self.option_tag_columns,
            &self.set_tag_columns,
        );
        apply_custom_fields(&mut person.custom_values, row, &self.custom_fields);

        Ok(BuildOutcome::Built(EmployedPerson {
            employer: employer_id.to_string(),
            person,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::DealOrganizationLinks;
    use crate::model::root::RootModel;
    use crate::model::Organization;

    fn model_with_acme() -> RootModel {
        let mut model = RootModel::new();
        model.add_organization(Organization::new("1", "Acme AB"));
        model
    }

    #[test]
    fn attaches_to_known_employer() {
        let model = model_with_acme();
        let links = DealOrganizationLinks::new();
        let ctx = BuildContext {
            model: &model,
            links: &links,
        };
        let builder = PersonBuilder::new(&ImportConfig::default());
        let row = Row::from_pairs([
            ("idPerson", "21"),
            ("idCompany", "1"),
            ("First name", "Bo"),
            ("Last name", "Berg"),
        ]);

        match builder.build(&row, &ctx).unwrap() {
            BuildOutcome::Built(built) => {
                assert_eq!(built.employer, "1");
                assert_eq!(built.person.integration_id, "21");
                assert_eq!(built.person.first_name.as_deref(), Some("Bo"));
            }
            other => panic!("expected person, got {other:?}"),
        }
    }

    #[test]
    fn per_organization_scope_qualifies_the_id() {
        let mut config = ImportConfig::default();
        config.person.id_scope = PersonIdScope::PerOrganization;
        let model = model_with_acme();
        let links = DealOrganizationLinks::new();
        let ctx = BuildContext {
            model: &model,
            links: &links,
        };
        let row = Row::from_pairs([("idPerson", "21"), ("idCompany", "1")]);

        match PersonBuilder::new(&config).build(&row, &ctx).unwrap() {
            BuildOutcome::Built(built) => assert_eq!(built.person.integration_id, "1-21"),
            other => panic!("expected person, got {other:?}"),
        }
    }

    #[test]
    fn unknown_employer_drops_the_row() {
        let model = RootModel::new();
        let links = DealOrganizationLinks::new();
        let ctx = BuildContext {
            model: &model,
            links: &links,
        };
        let builder = PersonBuilder::new(&ImportConfig::default());
        let row = Row::from_pairs([("idPerson", "21"), ("idCompany", "404")]);

        assert_eq!(
            builder.build(&row, &ctx).unwrap(),
            BuildOutcome::Skipped(SkipReason::UnresolvedReference {
                kind: EntityKind::Organization,
                integration_id: "404".to_string(),
            })
        );
    }

    #[test]
    fn falls_back_to_parsing_a_combined_name_column() {
        let mut config = ImportConfig::default();
        config.columns.person.full_name = Some("Name".to_string());
        let model = model_with_acme();
        let links = DealOrganizationLinks::new();
        let ctx = BuildContext {
            model: &model,
            links: &links,
        };
        let row = Row::from_pairs([
            ("idPerson", "21"),
            ("idCompany", "1"),
            ("Name", "Anna Andersson"),
        ]);

        match PersonBuilder::new(&config).build(&row, &ctx).unwrap() {
            BuildOutcome::Built(built) => {
                assert_eq!(built.person.first_name.as_deref(), Some("Anna"));
                assert_eq!(built.person.last_name.as_deref(), Some("Andersson"));
            }
            other => panic!("expected person, got {other:?}"),
        }
    }
}
