//! Input roster loading
//!
//! The roster is a delimited file with one row per tracked instance.
//! Missing required columns are fatal before any per-instance work begins.

use crate::error::{AdvisorError, Result};
use crate::models::RosterEntry;
use std::path::Path;

/// Columns every roster must carry.
const REQUIRED_COLUMNS: [&str; 2] = ["instance", "region"];

/// Read and validate the input roster.
pub fn load_roster(path: &Path) -> Result<Vec<RosterEntry>> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| AdvisorError::RosterRead {
        path: path.to_path_buf(),
        source,
    })?;

    let headers = reader
        .headers()
        .map_err(|source| AdvisorError::RosterRead {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header.trim() == column) {
            return Err(AdvisorError::RosterColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }
    }

    let mut entries = Vec::new();
    for record in reader.deserialize() {
        let entry: RosterEntry = record.map_err(|source| AdvisorError::RosterRead {
            path: path.to_path_buf(),
            source,
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_roster(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_well_formed_roster() {
        let file = write_roster("instance,region\ndb-one,us-east-1\ndb-two,eu-west-1\n");
        let entries = load_roster(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].instance, "db-one");
        assert_eq!(entries[1].region, "eu-west-1");
    }

    #[test]
    fn extra_columns_are_ignored() {
        let file = write_roster("instance,region,owner\ndb-one,us-east-1,platform\n");
        let entries = load_roster(file.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].instance, "db-one");
    }

    #[test]
    fn missing_region_column_is_fatal() {
        let file = write_roster("instance\ndb-one\n");
        let err = load_roster(file.path()).unwrap_err();
        assert!(matches!(
            err,
            AdvisorError::RosterColumn { ref column, .. } if column == "region"
        ));
    }

    #[test]
    fn missing_instance_column_is_fatal() {
        let file = write_roster("name,region\ndb-one,us-east-1\n");
        let err = load_roster(file.path()).unwrap_err();
        assert!(matches!(
            err,
            AdvisorError::RosterColumn { ref column, .. } if column == "instance"
        ));
    }
}
