use std::fs;
use std::path::Path;

use crm_migrate::config::ImportConfig;
use crm_migrate::error::ImportError;
use crm_migrate::export::{Exporter, JsonExporter};
use crm_migrate::importer::{Importer, Phase};
use crm_migrate::rows::SourceTable;
use crm_migrate::sources::TabFileSource;

fn write_table(dir: &Path, table: SourceTable, content: &str) {
    fs::write(dir.join(table.default_file_name()), content).unwrap();
}

/// Lays down a full export directory the way the desktop exporter does:
/// one tab-separated file per table, quoted values, CRLF line endings.
fn write_export(dir: &Path) {
    write_table(
        dir,
        SourceTable::Coworkers,
        "idUser\tName\r\n\"7\"\t\"Anna Andersson\"\r\n",
    );
    write_table(
        dir,
        SourceTable::Organizations,
        "idCompany\tCompany name\tEmail\r\n1\tAcme\tinfo@acme.se\r\n2\tBeta AB\t\r\n",
    );
    write_table(
        dir,
        SourceTable::Persons,
        "idPerson\tidCompany\tFirst name\tLast name\r\n9\t1\tBo\tBerg\r\n",
    );
    write_table(
        dir,
        SourceTable::OrganizationNotes,
        "idCompany\tidUser\tCategory\tHistory\r\n1\t7\tMeeting\tKickoff at their office\r\n",
    );
    write_table(
        dir,
        SourceTable::DealLinks,
        "idProject\tidCompany\r\n55\t1\r\n",
    );
    write_table(
        dir,
        SourceTable::Deals,
        "idProject\tName\tValue\r\n55\tSpring order\t12 000\r\n",
    );
    write_table(
        dir,
        SourceTable::DealNotes,
        "idProject\tidUser\tRawHistory\r\n55\t7\tAgreed on terms\r\n",
    );
    write_table(
        dir,
        SourceTable::OrganizationDocuments,
        "idDocument\tidCompany\tPath\r\n70\t1\tK:\\docs\\offer.doc\r\n",
    );
    write_table(
        dir,
        SourceTable::DealDocuments,
        "idDocument\tidProject\tPath\r\n71\t55\tK:\\docs\\contract.doc\r\n",
    );
}

#[test]
fn imports_a_directory_and_writes_a_schema_checked_export() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path());

    let source = TabFileSource::new(dir.path());
    let report = Importer::new(ImportConfig::default()).run(&source).unwrap();

    let counts = report.model.entity_counts();
    assert_eq!(counts.coworkers, 1);
    assert_eq!(counts.organizations, 2);
    assert_eq!(counts.persons, 1);
    assert_eq!(counts.deals, 1);
    assert_eq!(counts.notes, 2);
    assert_eq!(counts.documents, 2);
    assert_eq!(report.stats.row_errors(), 0);
    assert!(report.model.validate().is_empty());

    let output = dir.path().join("out").join("crm-import.json");
    JsonExporter::new(&output).export(&report.model).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["organizations"][0]["name"], "Acme");
    assert_eq!(written["organizations"][0]["employees"][0]["integration_id"], "9");
    assert_eq!(written["deals"][0]["customer"], "1");
    assert_eq!(written["deals"][0]["value"], 12000);
}

#[test]
fn a_mangled_line_costs_one_row_not_the_import() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path());
    write_table(
        dir.path(),
        SourceTable::Persons,
        "idPerson\tidCompany\tFirst name\r\n9\t1\tBo\r\nBROKEN LINE WITHOUT TABS\r\n10\t1\tEva\r\n",
    );

    let source = TabFileSource::new(dir.path());
    let report = Importer::new(ImportConfig::default()).run(&source).unwrap();

    let persons = report.stats.phase(Phase::Persons).unwrap();
    assert_eq!(persons.rows, 3);
    assert_eq!(persons.created, 2);
    assert_eq!(persons.row_errors, 1);
    assert_eq!(report.model.entity_counts().persons, 2);
}

#[test]
fn a_missing_file_is_fatal_before_any_entity() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path());
    fs::remove_file(dir.path().join(SourceTable::Deals.default_file_name())).unwrap();

    let source = TabFileSource::new(dir.path());
    match Importer::new(ImportConfig::default()).run(&source) {
        Err(ImportError::MissingTables { tables }) => {
            assert_eq!(tables, vec!["deals".to_string()]);
        }
        other => panic!("expected missing tables, got {other:?}"),
    }
}
