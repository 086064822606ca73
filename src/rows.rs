use crate::constants;
use crate::error::Result;

/// The tables a CRM export is made of. Each maps to one file in a
/// tab-separated desktop export, but sources are free to back them with
/// anything that yields rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceTable {
    Coworkers,
    Organizations,
    Persons,
    OrganizationNotes,
    OrganizationDocuments,
    DealLinks,
    Deals,
    DealNotes,
    DealDocuments,
}

impl SourceTable {
    pub fn name(&self) -> &'static str {
        match self {
            SourceTable::Coworkers => "coworkers",
            SourceTable::Organizations => "organizations",
            SourceTable::Persons => "persons",
            SourceTable::OrganizationNotes => "organization_notes",
            SourceTable::OrganizationDocuments => "organization_documents",
            SourceTable::DealLinks => "deal_links",
            SourceTable::Deals => "deals",
            SourceTable::DealNotes => "deal_notes",
            SourceTable::DealDocuments => "deal_documents",
        }
    }

    /// File name the desktop exporter gives this table.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            SourceTable::Coworkers => constants::COWORKER_FILE,
            SourceTable::Organizations => constants::ORGANIZATION_FILE,
            SourceTable::Persons => constants::PERSON_FILE,
            SourceTable::OrganizationNotes => constants::ORGANIZATION_NOTE_FILE,
            SourceTable::OrganizationDocuments => constants::ORGANIZATION_DOCUMENT_FILE,
            SourceTable::DealLinks => constants::DEAL_LINK_FILE,
            SourceTable::Deals => constants::DEAL_FILE,
            SourceTable::DealNotes => constants::DEAL_NOTE_FILE,
            SourceTable::DealDocuments => constants::DEAL_DOCUMENT_FILE,
        }
    }
}

impl std::fmt::Display for SourceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One record from a source table: column name to raw value, in source
/// order. Lookups are by column name so deployments can remap columns in
/// configuration without touching the readers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    columns: Vec<(String, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.columns.push((name.into(), value.into()));
    }

    /// Raw value of the first column with this name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Trimmed value, with blank values treated as absent.
    pub fn non_empty(&self, column: &str) -> Option<&str> {
        self.get(column)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

/// A provider of CRM export rows.
///
/// Implementations read local files or in-memory fixtures; the import
/// pipeline only ever walks rows through this trait. Iterators are lazy and
/// yield row-scoped errors so one bad line never aborts a table.
pub trait RowSource {
    /// Whether this source can provide the given table at all.
    fn has_table(&self, table: SourceTable) -> bool;

    /// Opens a fresh pass over the table's rows.
    fn open(&self, table: SourceTable) -> Result<RowIter<'_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_by_column_name() {
        let row = Row::from_pairs([("idUser", "7"), ("Name", "Anna Andersson")]);
        assert_eq!(row.get("Name"), Some("Anna Andersson"));
        assert_eq!(row.get("Telephone"), None);
    }

    #[test]
    fn non_empty_trims_and_drops_blanks() {
        let row = Row::from_pairs([("Name", "  Acme AB "), ("Telephone", "   ")]);
        assert_eq!(row.non_empty("Name"), Some("Acme AB"));
        assert_eq!(row.non_empty("Telephone"), None);
        assert_eq!(row.get("Telephone"), Some("   "));
    }

    #[test]
    fn first_of_duplicate_columns_wins() {
        let mut row = Row::new();
        row.push("id", "1");
        row.push("id", "2");
        assert_eq!(row.get("id"), Some("1"));
    }

    #[test]
    fn tables_have_stable_file_names() {
        assert_eq!(SourceTable::Coworkers.default_file_name(), "User.txt");
        assert_eq!(SourceTable::DealLinks.default_file_name(), "Project-Included.txt");
        assert_eq!(SourceTable::OrganizationNotes.to_string(), "organization_notes");
    }
}
