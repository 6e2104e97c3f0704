use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};

use crate::ingest::{decode::UTF8_BOM, RawTable};

/// Write `table` as UTF-8 CSV prefixed with a BOM so spreadsheet tools pick the
/// right encoding. Parent directories are created as needed.
pub fn write_csv_with_bom(path: &Path, table: &RawTable) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {:?}", parent))?;
    }

    let file = File::create(path).with_context(|| format!("creating {:?}", path))?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM)
        .with_context(|| format!("writing BOM to {:?}", path))?;

    let mut wtr = WriterBuilder::new().flexible(true).from_writer(out);
    wtr.write_record(&table.headers)
        .with_context(|| format!("writing header to {:?}", path))?;
    for row in &table.rows {
        wtr.write_record(row)
            .with_context(|| format!("writing record to {:?}", path))?;
    }
    wtr.flush().with_context(|| format!("flushing {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_csv_with_bom() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("out.csv");
        let table = RawTable {
            headers: vec!["name".into(), "type".into()],
            rows: vec![vec!["带,逗号".into(), "餐饮服务".into()]],
        };

        write_csv_with_bom(&path, &table)?;

        let bytes = fs::read(&path)?;
        assert!(bytes.starts_with(UTF8_BOM));
        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..])?;
        assert_eq!(text, "name,type\n\"带,逗号\",餐饮服务\n");
        Ok(())
    }

    #[test]
    fn test_write_error_names_the_path() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("taken.csv");
        fs::create_dir_all(&path)?;
        let table = RawTable {
            headers: vec!["type".into()],
            rows: vec![],
        };

        let err = write_csv_with_bom(&path, &table).unwrap_err();
        assert!(format!("{:#}", err).contains("taken.csv"));
        Ok(())
    }
}
