use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants;
use crate::error::{ImportError, Result};
use crate::model::settings::{CustomFieldDefinition, CustomFieldType, DealStatus};
use crate::rows::SourceTable;

/// Everything a deployment tunes about an import: source location, column
/// names, per-kind mappings and phase toggles. Loaded once at startup and
/// shared read-only from then on; the defaults match a stock LIME Easy
/// export so a plain Swedish migration runs with no config file at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    /// BCP 47 style language tag steering name order and option labels.
    pub locale: String,
    /// Characters that separate numbers inside one phone field.
    pub phone_delimiters: Vec<char>,
    pub source: SourceConfig,
    pub organization: OrganizationConfig,
    pub person: PersonConfig,
    pub deal: DealConfig,
    pub history: HistoryConfig,
    pub documents: DocumentConfig,
    pub columns: ColumnMap,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            locale: "sv".to_string(),
            phone_delimiters: vec![',', '/', '\\'],
            source: SourceConfig::default(),
            organization: OrganizationConfig::default(),
            person: PersonConfig::default(),
            deal: DealConfig::default(),
            history: HistoryConfig::default(),
            documents: DocumentConfig::default(),
            columns: ColumnMap::default(),
        }
    }
}

impl ImportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ImportError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: ImportConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Directory holding the exported table files.
    pub dir: PathBuf,
    /// File name per table, for exports that were renamed or localized.
    pub files: TableFiles,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("export"),
            files: TableFiles::default(),
        }
    }
}

/// File name of each source table. Defaults are what the desktop exporter
/// writes; single entries can be overridden in the `[source.files]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TableFiles {
    pub coworkers: String,
    pub organizations: String,
    pub persons: String,
    pub organization_notes: String,
    pub organization_documents: String,
    pub deal_links: String,
    pub deals: String,
    pub deal_notes: String,
    pub deal_documents: String,
}

impl Default for TableFiles {
    fn default() -> Self {
        let name = |table: SourceTable| table.default_file_name().to_string();
        Self {
            coworkers: name(SourceTable::Coworkers),
            organizations: name(SourceTable::Organizations),
            persons: name(SourceTable::Persons),
            organization_notes: name(SourceTable::OrganizationNotes),
            organization_documents: name(SourceTable::OrganizationDocuments),
            deal_links: name(SourceTable::DealLinks),
            deals: name(SourceTable::Deals),
            deal_notes: name(SourceTable::DealNotes),
            deal_documents: name(SourceTable::DealDocuments),
        }
    }
}

impl TableFiles {
    pub fn file_name(&self, table: SourceTable) -> &str {
        match table {
            SourceTable::Coworkers => &self.coworkers,
            SourceTable::Organizations => &self.organizations,
            SourceTable::Persons => &self.persons,
            SourceTable::OrganizationNotes => &self.organization_notes,
            SourceTable::OrganizationDocuments => &self.organization_documents,
            SourceTable::DealLinks => &self.deal_links,
            SourceTable::Deals => &self.deals,
            SourceTable::DealNotes => &self.deal_notes,
            SourceTable::DealDocuments => &self.deal_documents,
        }
    }
}

/// A custom field: its declaration for the target model plus the source
/// column it is populated from.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomFieldConfig {
    pub integration_id: String,
    pub title: String,
    #[serde(default, rename = "type")]
    pub field_type: CustomFieldType,
    pub column: String,
}

impl CustomFieldConfig {
    pub fn definition(&self) -> CustomFieldDefinition {
        CustomFieldDefinition {
            integration_id: self.integration_id.clone(),
            title: self.title.clone(),
            field_type: self.field_type,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrganizationConfig {
    /// Label of the source field naming the responsible coworker; the
    /// export carries it as an "idUser-<label>" column.
    pub responsible_field: Option<String>,
    /// Option column translated to a commercial relation.
    pub relation_column: Option<String>,
    /// Source option value to `Relation` variant name.
    pub relations: HashMap<String, String>,
    /// Option columns whose value becomes a single tag.
    pub option_tag_columns: Vec<String>,
    /// ';'-separated set columns, one tag per segment.
    pub set_tag_columns: Vec<String>,
    pub custom_fields: Vec<CustomFieldConfig>,
}

/// Whether person ids from the source are unique on their own or only
/// within their organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonIdScope {
    /// Source ids are unique across the whole export and kept as-is.
    #[default]
    Global,
    /// Source ids repeat across organizations; the import qualifies them
    /// with the employer id.
    PerOrganization,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersonConfig {
    pub id_scope: PersonIdScope,
    pub option_tag_columns: Vec<String>,
    pub set_tag_columns: Vec<String>,
    pub custom_fields: Vec<CustomFieldConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DealConfig {
    pub import: bool,
    pub responsible_field: Option<String>,
    /// The status catalog. A deal row naming a status outside this list
    /// aborts the import.
    pub statuses: Vec<DealStatus>,
    /// Status for deal rows with an empty status column.
    pub default_status: Option<String>,
    pub option_tag_columns: Vec<String>,
    pub set_tag_columns: Vec<String>,
    pub custom_fields: Vec<CustomFieldConfig>,
}

impl Default for DealConfig {
    fn default() -> Self {
        Self {
            import: true,
            responsible_field: None,
            statuses: Vec::new(),
            default_status: None,
            option_tag_columns: Vec::new(),
            set_tag_columns: Vec::new(),
            custom_fields: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    pub import: bool,
    /// Source activity category to `NoteClassification` variant name.
    /// Unmapped categories fall back to plain comments.
    pub classifications: HashMap<String, String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            import: true,
            classifications: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
    pub import: bool,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self { import: true }
    }
}

/// Column names per table. Every lookup the builders do goes through this
/// map, so renamed exports are handled entirely in configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnMap {
    pub coworker: CoworkerColumns,
    pub organization: OrganizationColumns,
    pub person: PersonColumns,
    pub deal: DealColumns,
    pub deal_link: DealLinkColumns,
    pub note: NoteColumns,
    pub document: DocumentColumns,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoworkerColumns {
    pub id: String,
    pub name: String,
    pub email: String,
    pub direct_phone: String,
    pub mobile_phone: String,
}

impl Default for CoworkerColumns {
    fn default() -> Self {
        Self {
            id: "idUser".to_string(),
            name: "Name".to_string(),
            email: "Email".to_string(),
            direct_phone: "Telephone".to_string(),
            mobile_phone: "Mobile".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrganizationColumns {
    pub id: String,
    pub name: String,
    pub organization_number: String,
    pub email: String,
    pub web_site: String,
    pub central_phone: String,
    pub street: String,
    pub zip_code: String,
    pub city: String,
    pub country: String,
    pub visit_street: String,
    pub visit_zip_code: String,
    pub visit_city: String,
    pub visit_country: String,
}

impl Default for OrganizationColumns {
    fn default() -> Self {
        Self {
            id: "idCompany".to_string(),
            name: "Company name".to_string(),
            organization_number: "Org no".to_string(),
            email: "Email".to_string(),
            web_site: "Web site".to_string(),
            central_phone: "Telephone".to_string(),
            street: "Street address".to_string(),
            zip_code: "Zip code".to_string(),
            city: "City".to_string(),
            country: "Country".to_string(),
            visit_street: "Visiting address".to_string(),
            visit_zip_code: "Visiting zip code".to_string(),
            visit_city: "Visiting city".to_string(),
            visit_country: "Visiting country".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersonColumns {
    pub id: String,
    pub organization_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Single full-name column, parsed when the split columns are absent.
    pub full_name: Option<String>,
    pub email: String,
    pub direct_phone: String,
    pub mobile_phone: String,
    pub position: String,
}

impl Default for PersonColumns {
    fn default() -> Self {
        Self {
            id: "idPerson".to_string(),
            organization_id: "idCompany".to_string(),
            first_name: "First name".to_string(),
            last_name: "Last name".to_string(),
            full_name: None,
            email: "Email".to_string(),
            direct_phone: "Telephone".to_string(),
            mobile_phone: "Mobile".to_string(),
            position: "Position".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DealColumns {
    pub id: String,
    pub name: String,
    pub description: String,
    pub value: String,
    pub probability: String,
    pub status: String,
    pub order_date: String,
}

impl Default for DealColumns {
    fn default() -> Self {
        Self {
            id: "idProject".to_string(),
            name: "Name".to_string(),
            description: "Description".to_string(),
            value: "Value".to_string(),
            probability: "Probability".to_string(),
            status: "Status".to_string(),
            order_date: "Order date".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DealLinkColumns {
    pub deal: String,
    pub organization: String,
}

impl Default for DealLinkColumns {
    fn default() -> Self {
        Self {
            deal: "idProject".to_string(),
            organization: "idCompany".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoteColumns {
    pub organization_id: String,
    pub deal_id: String,
    pub coworker_id: String,
    pub person_id: String,
    pub date: String,
    pub category: String,
    pub history: String,
    pub raw_history: String,
}

impl Default for NoteColumns {
    fn default() -> Self {
        Self {
            organization_id: "idCompany".to_string(),
            deal_id: "idProject".to_string(),
            coworker_id: "idUser".to_string(),
            person_id: "idPerson".to_string(),
            date: "Date".to_string(),
            category: "Category".to_string(),
            history: "History".to_string(),
            raw_history: "RawHistory".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentColumns {
    pub id: String,
    pub path: String,
    pub name: String,
    pub created_by: String,
    pub organization_id: String,
    pub deal_id: String,
}

impl Default for DocumentColumns {
    fn default() -> Self {
        Self {
            id: "idDocument".to_string(),
            path: "Path".to_string(),
            name: "Comment".to_string(),
            created_by: "idUser-Created".to_string(),
            organization_id: "idCompany".to_string(),
            deal_id: "idProject".to_string(),
        }
    }
}

/// Column carrying the responsible coworker for a given source field label.
pub fn responsible_column(field_label: &str) -> String {
    format!("{}{}", constants::RESPONSIBLE_COLUMN_PREFIX, field_label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::settings::DealAssessment;

    #[test]
    fn empty_config_yields_lime_easy_defaults() {
        let config: ImportConfig = toml::from_str("").unwrap();
        assert_eq!(config.locale, "sv");
        assert_eq!(config.source.dir, PathBuf::from("export"));
        assert_eq!(config.columns.coworker.id, "idUser");
        assert_eq!(config.columns.organization.name, "Company name");
        assert!(config.deal.import);
        assert!(config.history.import);
        assert_eq!(config.person.id_scope, PersonIdScope::Global);
    }

    #[test]
    fn full_config_parses() {
        let config: ImportConfig = toml::from_str(
            r#"
            locale = "sv"
            phone_delimiters = [",", "/"]

            [source]
            dir = "dump"

            [organization]
            responsible_field = "Ansvarig"
            relation_column = "Relation"
            option_tag_columns = ["Branch"]
            set_tag_columns = ["Markets"]

            [organization.relations]
            "1.Customer" = "IsACustomer"

            [[organization.custom_fields]]
            integration_id = "ackoms"
            title = "Invoiced"
            column = "ACKOMS"

            [person]
            id_scope = "per_organization"

            [deal]
            responsible_field = "Ansvarig"
            default_status = "Qualified"

            [[deal.statuses]]
            label = "Qualified"

            [[deal.statuses]]
            label = "Order"
            assessment = "positive_end_state"

            [history]
            import = true

            [history.classifications]
            "Phone call" = "SalesCall"

            [documents]
            import = false

            [columns.organization]
            name = "NAMN"
            "#,
        )
        .unwrap();

        assert_eq!(config.phone_delimiters, vec![',', '/']);
        assert_eq!(config.person.id_scope, PersonIdScope::PerOrganization);
        assert_eq!(config.deal.statuses.len(), 2);
        assert_eq!(config.deal.statuses[1].assessment, DealAssessment::PositiveEndState);
        assert_eq!(config.organization.custom_fields[0].integration_id, "ackoms");
        assert_eq!(
            config.history.classifications.get("Phone call").map(String::as_str),
            Some("SalesCall")
        );
        assert!(!config.documents.import);
        assert_eq!(config.columns.organization.name, "NAMN");
        // untouched sections keep their defaults
        assert_eq!(config.columns.organization.id, "idCompany");
        assert_eq!(config.columns.deal.id, "idProject");
    }

    #[test]
    fn table_file_names_can_be_overridden() {
        let config: ImportConfig = toml::from_str(
            "[source]\ndir = \"dump\"\n\n[source.files]\ncoworkers = \"Anvandare.txt\"\n",
        )
        .unwrap();
        assert_eq!(
            config.source.files.file_name(SourceTable::Coworkers),
            "Anvandare.txt"
        );
        // untouched tables keep the exporter's naming
        assert_eq!(config.source.files.file_name(SourceTable::Deals), "Project.txt");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: std::result::Result<ImportConfig, _> = toml::from_str("[deal]\nimportt = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn responsible_column_uses_source_prefix() {
        assert_eq!(responsible_column("Ansvarig"), "idUser-Ansvarig");
    }
}
