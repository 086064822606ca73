use serde::Serialize;

use crate::constants;
use crate::error::{ImportError, Result};
use crate::model::settings::Settings;
use crate::model::{Coworker, Deal, Document, Note, Organization, Person};
use crate::reference::{ReferenceMap, Registered};

/// How many entities the model holds, not counting the synthetic import
/// coworker. Two runs over the same source must produce equal counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub coworkers: usize,
    pub organizations: usize,
    pub persons: usize,
    pub deals: usize,
    pub notes: usize,
    pub documents: usize,
}

impl EntityCounts {
    pub fn total(&self) -> usize {
        self.coworkers
            + self.organizations
            + self.persons
            + self.deals
            + self.notes
            + self.documents
    }
}

/// The assembled target model.
///
/// Entities with ids live in per-kind reference maps; notes accumulate in
/// order. A synthetic "import" coworker is registered up front so authorship
/// never dangles even when the source user is gone.
#[derive(Debug, Clone, Serialize)]
pub struct RootModel {
    pub settings: Settings,
    import_coworker: String,
    coworkers: ReferenceMap<Coworker>,
    organizations: ReferenceMap<Organization>,
    deals: ReferenceMap<Deal>,
    notes: Vec<Note>,
    documents: ReferenceMap<Document>,
}

impl RootModel {
    pub fn new() -> Self {
        let mut coworkers = ReferenceMap::new();
        let mut import_coworker = Coworker::new(constants::IMPORT_COWORKER_ID);
        import_coworker.first_name = Some("Import".to_string());
        coworkers.register(import_coworker);

        Self {
            settings: Settings::default(),
            import_coworker: constants::IMPORT_COWORKER_ID.to_string(),
            coworkers,
            organizations: ReferenceMap::new(),
            deals: ReferenceMap::new(),
            notes: Vec::new(),
            documents: ReferenceMap::new(),
        }
    }

    /// Integration id of the fallback author for orphaned entities.
    pub fn import_coworker_id(&self) -> &str {
        &self.import_coworker
    }

    pub fn add_coworker(&mut self, coworker: Coworker) -> Registered {
        self.coworkers.register(coworker)
    }

    pub fn add_organization(&mut self, organization: Organization) -> Registered {
        self.organizations.register(organization)
    }

    /// Attaches the person to its employer. `None` when the employer is not
    /// in the model, which callers treat as an unresolved reference.
    pub fn add_person(&mut self, employer_id: &str, person: Person) -> Option<Registered> {
        self.organizations
            .find_mut(employer_id)
            .map(|organization| organization.add_employee(person))
    }

    pub fn add_deal(&mut self, deal: Deal) -> Registered {
        self.deals.register(deal)
    }

    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn add_document(&mut self, document: Document) -> Registered {
        self.documents.register(document)
    }

    pub fn find_coworker(&self, integration_id: &str) -> Option<&Coworker> {
        self.coworkers.find(integration_id)
    }

    pub fn find_organization(&self, integration_id: &str) -> Option<&Organization> {
        self.organizations.find(integration_id)
    }

    pub fn find_deal(&self, integration_id: &str) -> Option<&Deal> {
        self.deals.find(integration_id)
    }

    pub fn find_document(&self, integration_id: &str) -> Option<&Document> {
        self.documents.find(integration_id)
    }

    /// Looks a person up across all organizations.
    pub fn find_person(&self, integration_id: &str) -> Option<&Person> {
        self.organizations
            .iter()
            .find_map(|organization| organization.find_employee(integration_id))
    }

    pub fn coworkers(&self) -> &ReferenceMap<Coworker> {
        &self.coworkers
    }

    pub fn organizations(&self) -> &ReferenceMap<Organization> {
        &self.organizations
    }

    pub fn deals(&self) -> &ReferenceMap<Deal> {
        &self.deals
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn documents(&self) -> &ReferenceMap<Document> {
        &self.documents
    }

    pub fn entity_counts(&self) -> EntityCounts {
        EntityCounts {
            coworkers: self.coworkers.len().saturating_sub(1),
            organizations: self.organizations.len(),
            persons: self
                .organizations
                .iter()
                .map(|organization| organization.employees.len())
                .sum(),
            deals: self.deals.len(),
            notes: self.notes.len(),
            documents: self.documents.len(),
        }
    }

    /// Cheap structural check before validation and export. An import that
    /// produced nothing at all means the source was empty or misconfigured,
    /// and exporting it would silently wipe the target.
    pub fn sanity_check(&self) -> Result<()> {
        if self.entity_counts().total() == 0 {
            return Err(ImportError::Sanity(
                "the import produced no entities; check the source directory".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RootModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attachment;
    use crate::model::NoteClassification;

    #[test]
    fn fresh_model_has_the_import_coworker() {
        let model = RootModel::new();
        let coworker = model.find_coworker("import").unwrap();
        assert_eq!(coworker.full_name(), "Import");
        assert_eq!(model.entity_counts().coworkers, 0);
    }

    #[test]
    fn persons_require_a_known_employer() {
        let mut model = RootModel::new();
        assert_eq!(model.add_person("1", Person::new("p1")), None);

        model.add_organization(Organization::new("1", "Acme"));
        assert_eq!(
            model.add_person("1", Person::new("p1")),
            Some(Registered::Created)
        );
        assert!(model.find_person("p1").is_some());
        assert_eq!(model.entity_counts().persons, 1);
    }

    #[test]
    fn empty_model_fails_sanity_check() {
        let model = RootModel::new();
        assert!(model.sanity_check().is_err());

        let mut model = RootModel::new();
        model.add_note(Note {
            attached_to: Attachment::Organization("1".to_string()),
            text: "called".to_string(),
            classification: NoteClassification::Comment,
            date: None,
            created_by: "import".to_string(),
            person: None,
        });
        assert!(model.sanity_check().is_ok());
    }

    #[test]
    fn serializes_with_stable_top_level_shape() {
        let mut model = RootModel::new();
        model.add_organization(Organization::new("1", "Acme"));
        let json = serde_json::to_value(&model).unwrap();
        for key in [
            "settings",
            "import_coworker",
            "coworkers",
            "organizations",
            "deals",
            "notes",
            "documents",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json["import_coworker"], "import");
    }
}
