use std::fmt;

use serde::Serialize;
use tracing::info;

use crate::model::root::RootModel;
use crate::model::settings::{CustomFieldDefinition, Settings};
use crate::model::{
    Attachment, Coworker, CustomValues, Deal, Document, Note, Organization, Person,
};
use crate::reference::EntityKind;
use crate::text;

/// One broken rule on one entity. Notes carry no integration id, so the id
/// is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: EntityKind,
    pub integration_id: Option<String>,
    pub field: &'static str,
    pub reason: String,
}

impl Violation {
    fn new(
        kind: EntityKind,
        integration_id: Option<&str>,
        field: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            integration_id: integration_id.map(str::to_string),
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.integration_id {
            Some(id) => write!(f, "{} {}: {} {}", self.kind, id, self.field, self.reason),
            None => write!(f, "{}: {} {}", self.kind, self.field, self.reason),
        }
    }
}

/// Checks every entity against its kind's rules and returns the complete
/// list of violations, in model order. An empty list means the model is fit
/// for export.
pub fn validate(model: &RootModel) -> Vec<Violation> {
    let mut violations = Vec::new();

    for coworker in model.coworkers() {
        check_coworker(coworker, &mut violations);
    }
    for organization in model.organizations() {
        check_organization(model, organization, &mut violations);
        for person in &organization.employees {
            check_person(&model.settings, person, &mut violations);
        }
    }
    for deal in model.deals() {
        check_deal(model, deal, &mut violations);
    }
    for note in model.notes() {
        check_note(model, note, &mut violations);
    }
    for document in model.documents() {
        check_document(model, document, &mut violations);
    }

    info!(violations = violations.len(), "validation finished");
    violations
}

impl RootModel {
    /// Full rule pass over the model, see [`validate`].
    pub fn validate(&self) -> Vec<Violation> {
        validate(self)
    }
}

fn check_coworker(coworker: &Coworker, violations: &mut Vec<Violation>) {
    let kind = EntityKind::Coworker;
    let name = coworker.full_name();
    if coworker.integration_id.is_empty() && name.is_empty() {
        violations.push(Violation::new(
            kind,
            None,
            "identity",
            "has neither an integration id nor a name",
        ));
        return;
    }
    let id = Some(coworker.integration_id.as_str());
    if coworker.integration_id.is_empty() {
        violations.push(Violation::new(kind, id, "integration_id", "is empty"));
    }
    if name.is_empty() {
        violations.push(Violation::new(kind, id, "name", "is empty"));
    }
    check_email(kind, id, coworker.email.as_deref(), violations);
}

fn check_organization(
    model: &RootModel,
    organization: &Organization,
    violations: &mut Vec<Violation>,
) {
    let kind = EntityKind::Organization;
    if organization.integration_id.is_empty() && organization.name.trim().is_empty() {
        violations.push(Violation::new(
            kind,
            None,
            "identity",
            "has neither an integration id nor a name",
        ));
        return;
    }
    let id = Some(organization.integration_id.as_str());
    if organization.integration_id.is_empty() {
        violations.push(Violation::new(kind, id, "integration_id", "is empty"));
    }
    if organization.name.trim().is_empty() {
        violations.push(Violation::new(kind, id, "name", "is empty"));
    }
    check_email(kind, id, organization.email.as_deref(), violations);
    if let Some(coworker_id) = &organization.responsible_coworker {
        if model.find_coworker(coworker_id).is_none() {
            violations.push(Violation::new(
                kind,
                id,
                "responsible_coworker",
                format!("references unknown coworker {coworker_id}"),
            ));
        }
    }
    check_custom_values(
        kind,
        id,
        &organization.custom_values,
        &model.settings.organization.custom_fields,
        violations,
    );
}

fn check_person(settings: &Settings, person: &Person, violations: &mut Vec<Violation>) {
    let kind = EntityKind::Person;
    let name = person.full_name();
    if person.integration_id.is_empty() && name.is_empty() {
        violations.push(Violation::new(
            kind,
            None,
            "identity",
            "has neither an integration id nor a name",
        ));
        return;
    }
    let id = Some(person.integration_id.as_str());
    if person.integration_id.is_empty() {
        violations.push(Violation::new(kind, id, "integration_id", "is empty"));
    }
    if name.is_empty() {
        violations.push(Violation::new(kind, id, "name", "is empty"));
    }
    check_email(kind, id, person.email.as_deref(), violations);
    check_custom_values(
        kind,
        id,
        &person.custom_values,
        &settings.person.custom_fields,
        violations,
    );
}

fn check_deal(model: &RootModel, deal: &Deal, violations: &mut Vec<Violation>) {
    let kind = EntityKind::Deal;
    if deal.integration_id.is_empty() && deal.name.trim().is_empty() {
        violations.push(Violation::new(
            kind,
            None,
            "identity",
            "has neither an integration id nor a name",
        ));
        return;
    }
    let id = Some(deal.integration_id.as_str());
    if deal.integration_id.is_empty() {
        violations.push(Violation::new(kind, id, "integration_id", "is empty"));
    }
    if deal.name.trim().is_empty() {
        violations.push(Violation::new(kind, id, "name", "is empty"));
    }
    if let Some(probability) = deal.probability {
        if probability > 100 {
            violations.push(Violation::new(
                kind,
                id,
                "probability",
                format!("is {probability}, must be at most 100"),
            ));
        }
    }
    if let Some(status) = &deal.status {
        if model.settings.resolve_deal_status(status).is_err() {
            violations.push(Violation::new(
                kind,
                id,
                "status",
                format!("{status} is not in the declared catalog"),
            ));
        }
    }
    if let Some(customer) = &deal.customer {
        if model.find_organization(customer).is_none() {
            violations.push(Violation::new(
                kind,
                id,
                "customer",
                format!("references unknown organization {customer}"),
            ));
        }
    }
    if let Some(coworker_id) = &deal.responsible_coworker {
        if model.find_coworker(coworker_id).is_none() {
            violations.push(Violation::new(
                kind,
                id,
                "responsible_coworker",
                format!("references unknown coworker {coworker_id}"),
            ));
        }
    }
    check_custom_values(
        kind,
        id,
        &deal.custom_values,
        &model.settings.deal.custom_fields,
        violations,
    );
}

fn check_note(model: &RootModel, note: &Note, violations: &mut Vec<Violation>) {
    let kind = EntityKind::Note;
    if note.text.trim().is_empty() {
        violations.push(Violation::new(kind, None, "text", "is empty"));
    }
    if model.find_coworker(&note.created_by).is_none() {
        violations.push(Violation::new(
            kind,
            None,
            "created_by",
            format!("references unknown coworker {}", note.created_by),
        ));
    }
    check_attachment(model, kind, None, &note.attached_to, violations);
    if let Some(person_id) = &note.person {
        if model.find_person(person_id).is_none() {
            violations.push(Violation::new(
                kind,
                None,
                "person",
                format!("references unknown person {person_id}"),
            ));
        }
    }
}

fn check_document(model: &RootModel, document: &Document, violations: &mut Vec<Violation>) {
    let kind = EntityKind::Document;
    let id = Some(document.integration_id.as_str());
    if document.integration_id.is_empty() {
        violations.push(Violation::new(kind, id, "integration_id", "is empty"));
    }
    if document.path.trim().is_empty() {
        violations.push(Violation::new(kind, id, "path", "is empty"));
    }
    if model.find_coworker(&document.created_by).is_none() {
        violations.push(Violation::new(
            kind,
            id,
            "created_by",
            format!("references unknown coworker {}", document.created_by),
        ));
    }
    check_attachment(model, kind, id, &document.attached_to, violations);
}

fn check_attachment(
    model: &RootModel,
    kind: EntityKind,
    id: Option<&str>,
    attached_to: &Attachment,
    violations: &mut Vec<Violation>,
) {
    let resolved = match attached_to {
        Attachment::Organization(target) => model.find_organization(target).is_some(),
        Attachment::Deal(target) => model.find_deal(target).is_some(),
    };
    if !resolved {
        violations.push(Violation::new(
            kind,
            id,
            "attached_to",
            format!(
                "references unknown {} {}",
                attached_to.kind(),
                attached_to.integration_id()
            ),
        ));
    }
}

fn check_email(
    kind: EntityKind,
    id: Option<&str>,
    email: Option<&str>,
    violations: &mut Vec<Violation>,
) {
    if let Some(email) = email {
        if !text::is_valid_email(email) {
            violations.push(Violation::new(
                kind,
                id,
                "email",
                format!("{email} is not a valid address"),
            ));
        }
    }
}

fn check_custom_values(
    kind: EntityKind,
    id: Option<&str>,
    values: &CustomValues,
    declared: &[CustomFieldDefinition],
    violations: &mut Vec<Violation>,
) {
    for value in values.iter() {
        if !declared.iter().any(|field| field.integration_id == value.field) {
            violations.push(Violation::new(
                kind,
                id,
                "custom_values",
                format!("references undeclared field {}", value.field),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::settings::{DealAssessment, DealStatus};
    use crate::model::{Attachment, NoteClassification};

    fn note(attached_to: Attachment) -> Note {
        Note {
            attached_to,
            text: "called about the offer".to_string(),
            classification: NoteClassification::Comment,
            date: None,
            created_by: "import".to_string(),
            person: None,
        }
    }

    fn populated_model() -> RootModel {
        let mut model = RootModel::new();
        model
            .settings
            .add_deal_status(DealStatus {
                label: "Order".to_string(),
                assessment: DealAssessment::PositiveEndState,
            })
            .unwrap();

        let mut anna = Coworker::new("7");
        anna.first_name = Some("Anna".to_string());
        model.add_coworker(anna);

        model.add_organization(Organization::new("1", "Acme"));
        let mut bo = Person::new("1-21");
        bo.first_name = Some("Bo".to_string());
        model.add_person("1", bo);

        let mut deal = Deal::new("9", "Big deal");
        deal.customer = Some("1".to_string());
        deal.status = Some("Order".to_string());
        model.add_deal(deal);

        model.add_note(note(Attachment::Organization("1".to_string())));
        model
    }

    #[test]
    fn clean_model_has_no_violations() {
        assert!(populated_model().validate().is_empty());
    }

    #[test]
    fn entity_without_id_and_name_is_flagged_once() {
        let mut model = RootModel::new();
        model.add_coworker(Coworker::new(""));
        let violations = model.validate();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "identity");
        assert_eq!(violations[0].integration_id, None);
    }

    #[test]
    fn dangling_references_are_reported_per_field() {
        let mut model = populated_model();
        let mut deal = Deal::new("10", "Side deal");
        deal.customer = Some("unknown-org".to_string());
        deal.responsible_coworker = Some("ghost".to_string());
        model.add_deal(deal);
        model.add_note(note(Attachment::Deal("404".to_string())));

        let violations = model.validate();
        let fields: Vec<&str> = violations.iter().map(|v| v.field).collect();
        assert!(fields.contains(&"customer"));
        assert!(fields.contains(&"responsible_coworker"));
        assert!(fields.contains(&"attached_to"));
    }

    #[test]
    fn out_of_range_and_undeclared_values_are_flagged() {
        let mut model = populated_model();
        let mut deal = Deal::new("11", "Odd deal");
        deal.probability = Some(250);
        deal.status = Some("Lost".to_string());
        deal.custom_values.set("undeclared", "x");
        model.add_deal(deal);

        let violations = model.validate();
        let fields: Vec<&str> = violations.iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["probability", "status", "custom_values"]);
    }

    #[test]
    fn empty_note_text_and_document_path_are_flagged() {
        let mut model = populated_model();
        let mut empty_note = note(Attachment::Organization("1".to_string()));
        empty_note.text = " ".to_string();
        model.add_note(empty_note);
        model.add_document(Document {
            integration_id: "o-55".to_string(),
            attached_to: Attachment::Organization("1".to_string()),
            path: String::new(),
            name: None,
            created_by: "import".to_string(),
        });

        let violations = model.validate();
        assert!(violations.iter().any(|v| v.field == "text"));
        assert!(violations
            .iter()
            .any(|v| v.field == "path" && v.integration_id.as_deref() == Some("o-55")));
        let shown = violations
            .iter()
            .find(|v| v.field == "path")
            .map(ToString::to_string)
            .unwrap_or_default();
        assert_eq!(shown, "document o-55: path is empty");
    }
}
