use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::config::TableFiles;
use crate::error::{ImportError, Result};
use crate::rows::{Row, RowIter, RowSource, SourceTable};

/// Reads the tab-separated text files a desktop export drops in a folder,
/// one file per table with a header line naming the columns.
///
/// Fields may be wrapped in double quotes, which are stripped. Blank lines
/// are skipped. A line whose field count differs from the header becomes a
/// row-scoped error, so one mangled line costs one entity, not the import.
pub struct TabFileSource {
    dir: PathBuf,
    files: TableFiles,
}

impl TabFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_files(dir, TableFiles::default())
    }

    /// A source whose files do not carry the exporter's stock names.
    pub fn with_files(dir: impl Into<PathBuf>, files: TableFiles) -> Self {
        Self {
            dir: dir.into(),
            files,
        }
    }

    pub fn path_for(&self, table: SourceTable) -> PathBuf {
        self.dir.join(self.files.file_name(table))
    }
}

impl RowSource for TabFileSource {
    fn has_table(&self, table: SourceTable) -> bool {
        self.path_for(table).is_file()
    }

    fn open(&self, table: SourceTable) -> Result<RowIter<'_>> {
        let path = self.path_for(table);
        let bytes = fs::read(&path)?;
        // Exports from old desktop installs are not reliably UTF-8
        let content = String::from_utf8_lossy(&bytes).into_owned();

        let mut lines = content
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.to_string()))
            .collect::<Vec<_>>()
            .into_iter();

        let headers = loop {
            match lines.next() {
                Some((_, line)) if line.trim().is_empty() => continue,
                Some((_, line)) => break split_fields(&line),
                None => {
                    debug!(table = table.name(), path = %path.display(), "table file is empty");
                    return Ok(Box::new(std::iter::empty()));
                }
            }
        };

        let rows = lines
            .filter(|(_, line)| !line.trim().is_empty())
            .map(move |(number, line)| {
                let fields = split_fields(&line);
                if fields.len() != headers.len() {
                    return Err(ImportError::MalformedRow {
                        table: table.name().to_string(),
                        line: number,
                        reason: format!(
                            "expected {} fields, found {}",
                            headers.len(),
                            fields.len()
                        ),
                    });
                }
                Ok(Row::from_pairs(headers.iter().cloned().zip(fields)))
            });

        Ok(Box::new(rows))
    }
}

fn split_fields(line: &str) -> Vec<String> {
    line.split('\t')
        .map(|field| field.trim().trim_matches('"').to_string())
        .collect()
}
