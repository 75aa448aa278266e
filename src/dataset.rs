use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use rayon::prelude::*;
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::{info, warn};

use crate::error::ExtractError;
use crate::extractor::{MatchFeatures, extract_match_file};
use crate::features::{FEATURE_COLUMNS, FeatureRow};

const PROGRESS_EVERY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "" => Ok(TableFormat::Csv),
            "xlsx" => Ok(TableFormat::Xlsx),
            other => Err(anyhow!("unsupported table extension '.{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub output: PathBuf,
    pub files_total: usize,
    pub files_succeeded: usize,
    pub rows_written: usize,
    pub started_at: String,
    pub finished_at: String,
    pub errors: Vec<String>,
}

/// `*.json` files directly under `dir`, sorted by name so runs are reproducible.
pub fn list_match_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("read match directory {}", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.context("read directory entry")?.path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Extracts every file, keeping input order. With `jobs > 1` the work runs on a dedicated rayon
/// pool; the collected output is identical to the sequential run.
pub fn extract_files(
    files: &[PathBuf],
    jobs: usize,
) -> Vec<Result<Vec<FeatureRow>, ExtractError>> {
    if jobs <= 1 {
        return files.iter().map(|p| extract_match_file(p)).collect();
    }
    match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
        Ok(pool) => pool.install(|| files.par_iter().map(|p| extract_match_file(p)).collect()),
        Err(err) => {
            warn!(error = %err, "failed to build extraction pool, running sequentially");
            files.iter().map(|p| extract_match_file(p)).collect()
        }
    }
}

pub fn build_feature_table(input_dir: &Path, output: &Path, jobs: usize) -> Result<BuildSummary> {
    let format = TableFormat::from_path(output)?;
    let started_at = Utc::now().to_rfc3339();
    let files = list_match_files(input_dir)?;
    if files.is_empty() {
        warn!(dir = %input_dir.display(), "no match files found");
    }

    let results = extract_files(&files, jobs);

    let mut rows = Vec::new();
    let mut errors = Vec::new();
    let mut files_succeeded = 0usize;
    for (i, (path, result)) in files.iter().zip(results).enumerate() {
        match result {
            Ok(match_rows) => {
                rows.extend(match_rows);
                files_succeeded += 1;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Error processing match");
                errors.push(format!("{}: {err}", path.display()));
            }
        }
        if (i + 1) % PROGRESS_EVERY == 0 {
            info!("Processed {} matches...", i + 1);
        }
    }

    write_table(output, format, &rows)?;
    info!(
        rows = rows.len(),
        output = %output.display(),
        run_rate = MatchFeatures::RUN_RATE.label(),
        "Saved feature table"
    );

    Ok(BuildSummary {
        output: output.to_path_buf(),
        files_total: files.len(),
        files_succeeded,
        rows_written: rows.len(),
        started_at,
        finished_at: Utc::now().to_rfc3339(),
        errors,
    })
}

pub fn write_table(path: &Path, format: TableFormat, rows: &[FeatureRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }
    match format {
        TableFormat::Csv => write_csv(path, rows),
        TableFormat::Xlsx => write_xlsx(path, rows),
    }
}

fn write_csv(path: &Path, rows: &[FeatureRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("create feature table {}", path.display()))?;
    if rows.is_empty() {
        writer
            .write_record(FEATURE_COLUMNS)
            .context("write feature table header")?;
    }
    for row in rows {
        writer.serialize(row).context("write feature row")?;
    }
    writer.flush().context("flush feature table")?;
    Ok(())
}

fn write_xlsx(path: &Path, rows: &[FeatureRow]) -> Result<()> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("features")?;
        write_rows(sheet, rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_rows(worksheet: &mut Worksheet, rows: &[FeatureRow]) -> Result<()> {
    for (col_idx, name) in FEATURE_COLUMNS.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, *name)
            .with_context(|| format!("write header cell {col_idx}"))?;
    }
    for (idx, row) in rows.iter().enumerate() {
        let row_idx = (idx + 1) as u32;
        for (col_idx, value) in row.to_cells().iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet
                .write_string(row_idx, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

pub fn read_table(path: &Path) -> Result<Vec<FeatureRow>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("open feature table {}", path.display()))?;
    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<FeatureRow>().enumerate() {
        rows.push(record.with_context(|| {
            format!("parse feature table {} row {}", path.display(), idx + 1)
        })?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_format_from_extension() {
        assert_eq!(
            TableFormat::from_path(Path::new("out/t20_data.csv")).unwrap(),
            TableFormat::Csv
        );
        assert_eq!(
            TableFormat::from_path(Path::new("t20_data.XLSX")).unwrap(),
            TableFormat::Xlsx
        );
        assert!(TableFormat::from_path(Path::new("t20_data.parquet")).is_err());
    }
}
