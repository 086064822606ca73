/// File name constants for the LIME Easy export layout
/// These constants define the mapping between source tables and the
/// tab-separated files a desktop export produces

// One file per source table, named by the exporting application
pub const COWORKER_FILE: &str = "User.txt";
pub const ORGANIZATION_FILE: &str = "Company.txt";
pub const PERSON_FILE: &str = "Company-Person.txt";
pub const ORGANIZATION_NOTE_FILE: &str = "Company-History.txt";
pub const ORGANIZATION_DOCUMENT_FILE: &str = "Company-Document.txt";
pub const DEAL_FILE: &str = "Project.txt";
pub const DEAL_LINK_FILE: &str = "Project-Included.txt";
pub const DEAL_NOTE_FILE: &str = "Project-History.txt";
pub const DEAL_DOCUMENT_FILE: &str = "Project-Document.txt";

// Responsible-coworker columns are exported as "idUser-<field label>"
pub const RESPONSIBLE_COLUMN_PREFIX: &str = "idUser-";

// Integration id of the synthetic coworker that owns entities whose
// source author cannot be resolved
pub const IMPORT_COWORKER_ID: &str = "import";

// Prefixes keeping organization and deal document ids from colliding
pub const ORGANIZATION_DOCUMENT_PREFIX: &str = "o-";
pub const DEAL_DOCUMENT_PREFIX: &str = "d-";
