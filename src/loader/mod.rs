//! Reading the uploaded CSV into a validated [`RecordStore`].

use crate::fs::FileSystem;
use crate::model::{ColumnRow, MappingError, Record, RecordStore, RoleMapping};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("'{0}' is not a CSV file")]
    NotCsv(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("The CSV has no header row")]
    EmptyHeader,
    #[error("Invalid column mapping: {0}")]
    Mapping(#[from] MappingError),
}

/// Header and rows of a CSV, before any roles are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub records: Vec<Record>,
    /// Rows with more fields than the header; the extra fields are dropped.
    pub overlong: usize,
}

impl CsvTable {
    /// Suggested role for every column.
    pub fn columns(&self) -> Vec<ColumnRow> {
        columns(&self.header)
    }

    pub fn into_store(self, mapping: RoleMapping) -> Result<RecordStore, LoadError> {
        Ok(RecordStore::new(self.header, self.records, mapping)?)
    }
}

/// Only `.csv` files are accepted, case-insensitively.
pub fn check_extension(path: &Path) -> Result<(), LoadError> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Ok(())
    } else {
        Err(LoadError::NotCsv(path.to_path_buf()))
    }
}

/// Parse CSV text. Rows may be shorter than the header; missing trailing
/// fields are simply absent from the record.
pub fn parse_table(content: &str) -> Result<CsvTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let header: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    if header.iter().all(|h| h.is_empty()) {
        return Err(LoadError::EmptyHeader);
    }

    let mut records = Vec::new();
    let mut overlong = 0;
    for row in reader.records() {
        let row = row?;
        if row.len() > header.len() {
            overlong += 1;
        }
        records.push(Record::from_pairs(
            header.iter().map(String::as_str).zip(row.iter()),
        ));
    }

    if overlong > 0 {
        tracing::warn!(rows = overlong, "rows with more fields than the header were truncated");
    }
    tracing::debug!(columns = header.len(), rows = records.len(), "parsed CSV");

    Ok(CsvTable {
        header,
        records,
        overlong,
    })
}

/// Read and parse a CSV file.
pub fn read_table(fs: &dyn FileSystem, path: &Path) -> Result<CsvTable, LoadError> {
    check_extension(path)?;
    let content = fs.read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&content)
}

/// Read a CSV file and validate it against `mapping`, or against the
/// suggested roles of its columns when no mapping is given.
pub fn load(
    fs: &dyn FileSystem,
    path: &Path,
    mapping: Option<RoleMapping>,
) -> Result<RecordStore, LoadError> {
    let table = read_table(fs, path)?;
    let mapping = match mapping {
        Some(mapping) => mapping,
        None => RoleMapping::from_rows(&table.columns())?,
    };
    tracing::info!(path = %path.display(), records = table.records.len(), "loaded dataset");
    table.into_store(mapping)
}

/// Column table with suggested roles, in header order except that
/// `messageType` goes last.
pub fn columns(header: &[String]) -> Vec<ColumnRow> {
    ColumnRow::suggest_all(header.iter().map(String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFs;
    use crate::model::{ColumnRole, Side};

    const ENRON: &str = "\
date,fromEmail,fromJobtitle,toEmail,toJobtitle,messageType,sentiment
2001-05-14,ann@enron.com,CEO,bob@enron.com,Trader,TO,0.02
2001-05-15,bob@enron.com,Trader,ann@enron.com,CEO,CC,-0.01
2001-05-16,cid@enron.com,Analyst,ann@enron.com
";

    #[test]
    fn test_extension_check() {
        assert!(check_extension(Path::new("mail.csv")).is_ok());
        assert!(check_extension(Path::new("MAIL.CSV")).is_ok());
        assert!(matches!(
            check_extension(Path::new("mail.tsv")),
            Err(LoadError::NotCsv(_))
        ));
        assert!(check_extension(Path::new("mail")).is_err());
    }

    #[test]
    fn test_short_rows_lack_trailing_columns() {
        let table = parse_table(ENRON).unwrap();
        assert_eq!(table.header.len(), 7);
        assert_eq!(table.records.len(), 3);

        let short = &table.records[2];
        assert_eq!(short.get("toEmail"), Some("ann@enron.com"));
        assert_eq!(short.get("toJobtitle"), None);
    }

    #[test]
    fn test_overlong_rows_are_counted() {
        let table = parse_table("a,b\n1,2,3\n4,5\n").unwrap();
        assert_eq!(table.overlong, 1);
        assert_eq!(table.records[0].columns().count(), 2);
    }

    #[test]
    fn test_load_with_suggested_roles() {
        let fs = MockFs::with_files([("/data/mail.csv", ENRON)]);
        let store = load(&fs, Path::new("/data/mail.csv"), None).unwrap();

        let mapping = store.mapping();
        assert_eq!(mapping.identity(Side::Source).unwrap().attribute, "email");
        assert_eq!(mapping.main_link_attribute().unwrap().name, "sentiment");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_load_rejects_unknown_column() {
        let fs = MockFs::with_files([("/data/mail.csv", "from,to\na,b\n")]);
        let mapping = RoleMapping::new(
            vec![crate::model::AttributeSpec::new("from", "id")],
            vec![crate::model::AttributeSpec::new("to", "id")],
            vec![crate::model::AttributeSpec::new("weight", "weight")],
            None,
        );

        let err = load(&fs, Path::new("/data/mail.csv"), Some(mapping)).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Mapping(MappingError::UnknownColumn(ref c)) if c == "weight"
        ));
    }

    #[test]
    fn test_unmapped_columns_fail_suggestion() {
        let fs = MockFs::with_files([("/data/other.csv", "from,to\na,b\n")]);
        let err = load(&fs, Path::new("/data/other.csv"), None).unwrap_err();
        assert!(matches!(err, LoadError::Mapping(MappingError::NoSourceAttributes)));
    }

    #[test]
    fn test_missing_file() {
        let fs = MockFs::new();
        let err = load(&fs, Path::new("/nowhere.csv"), None).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_columns_default_unused() {
        let header = vec!["subject".to_string(), "fromEmail".to_string()];
        let rows = columns(&header);
        assert_eq!(rows[0].useas, ColumnRole::Unused);
        assert_eq!(rows[0].attribute, "subject");
        assert_eq!(rows[1].useas, ColumnRole::SourceNode);
    }
}
