use crate::parsers::mercari_parser::ItemRecord;
use csv::WriterBuilder;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const HEADER: [&str; 5] = [
    "Item Name",
    "Item Price",
    "Discount Price (if applicable)",
    "Size",
    "URL",
];

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Unable to write results to {path:?}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Unable to write results to {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes the header and one row per record, replacing `path` only once the
/// whole file has been written.
pub fn write_records(records: &[ItemRecord], path: &Path) -> Result<(), WriteError> {
    let staging = staging_path(path);

    if let Err(err) = write_to(records, &staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(err);
    }

    fs::rename(&staging, path).map_err(|source| {
        let _ = fs::remove_file(&staging);
        WriteError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Errors name `destination`, the path the caller asked for.
fn write_to(
    records: &[ItemRecord],
    staging: &Path,
    destination: &Path,
) -> Result<(), WriteError> {
    let io_error = |source| WriteError::Io {
        path: destination.to_path_buf(),
        source,
    };
    let csv_error = |source| WriteError::Csv {
        path: destination.to_path_buf(),
        source,
    };

    let file = File::create(staging).map_err(io_error)?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);

    wtr.write_record(HEADER).map_err(csv_error)?;
    for record in records {
        wtr.serialize(record).map_err(csv_error)?;
    }

    let file = wtr
        .into_inner()
        .map_err(|err| io_error(err.into_error()))?;
    file.sync_all().map_err(io_error)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use csv::ReaderBuilder;

    fn tmp_path(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("mercari_scraper_writer_{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir.push("output.csv");
        dir
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap()
            .records()
            .map(|row| row.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    fn records() -> Vec<ItemRecord> {
        vec![
            ItemRecord {
                name: Some("Carhartt Detroit Jacket, Brown".to_string()),
                price: Some("$110.00".to_string()),
                discounted_price: Some("$80.00".to_string()),
                size: Some("L".to_string()),
                url: "https://www.mercari.com/item/m2/".to_string(),
            },
            ItemRecord {
                name: Some("80s \"Windbreaker\"".to_string()),
                price: Some("$22.00".to_string()),
                discounted_price: None,
                size: None,
                url: "https://www.mercari.com/item/m3/".to_string(),
            },
        ]
    }

    #[test]
    fn test_writes_header_and_rows_in_order() {
        let path = tmp_path("rows");
        write_records(&records(), &path).unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], HEADER.map(str::to_string).to_vec());
        assert_eq!(
            rows[1],
            vec![
                "Carhartt Detroit Jacket, Brown",
                "$110.00",
                "$80.00",
                "L",
                "https://www.mercari.com/item/m2/"
            ]
        );
        assert_eq!(
            rows[2],
            vec![
                "80s \"Windbreaker\"",
                "$22.00",
                "",
                "",
                "https://www.mercari.com/item/m3/"
            ]
        );
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn test_absent_fields_are_empty_not_placeholders() {
        let path = tmp_path("empty_fields");
        write_records(&records(), &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("None"));
        assert!(!raw.contains("null"));
        assert!(raw.ends_with('\n'));
    }

    #[test]
    fn test_header_written_without_records() {
        let path = tmp_path("no_records");
        write_records(&[], &path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "Item Name,Item Price,Discount Price (if applicable),Size,URL\n"
        );
    }

    #[test]
    fn test_overwrites_existing_file() {
        let path = tmp_path("overwrite");
        fs::write(&path, "stale contents\nmore stale\n").unwrap();

        write_records(&records()[..1], &path).unwrap();

        assert_eq!(read_rows(&path).len(), 2);
    }

    #[test]
    fn test_failed_write_reports_path() {
        let mut path = tmp_path("missing_dir");
        path.pop();
        path.push("does_not_exist");
        path.push("output.csv");

        let err = write_records(&records(), &path).unwrap_err();

        match &err {
            WriteError::Io { path: reported, .. } => assert_eq!(reported, &path),
            other => panic!("expected an io error, got {:?}", other),
        }
        assert!(!err.to_string().contains(".partial"));
        assert!(!path.exists());
        assert!(!staging_path(&path).exists());
    }
}
