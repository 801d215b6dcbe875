//! Collection of routines to build the depth of field reports

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    iter::once,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::table::FormattedTable;

pub mod markdown;
pub use markdown::MarkdownReport;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("{0:?} is not a valid file path")]
    InvalidPath(PathBuf),
    #[error("failed to create {1:?}")]
    Creating(#[source] io::Error, PathBuf),
    #[error("failed to write {1:?}")]
    Writing(#[source] io::Error, PathBuf),
    #[error("failed to finalize {1:?}")]
    Finalizing(#[source] io::Error, PathBuf),
}
type Result<T> = std::result::Result<T, ReportError>;

/// File written under a temporary name next to its target and moved into place on
/// [StagedFile::commit]
///
/// The temporary file is deleted if the [StagedFile] is dropped before being committed,
/// so a failed export never leaves a truncated file at the target path.
/// The temporary file keeps the target extension for the encoders that rely on it.
#[derive(Debug)]
pub struct StagedFile {
    target: PathBuf,
    file: NamedTempFile,
}
impl StagedFile {
    pub fn new<P: AsRef<Path>>(target: P) -> Result<Self> {
        let target = target.as_ref().to_path_buf();
        let stem = target
            .file_stem()
            .ok_or_else(|| ReportError::InvalidPath(target.clone()))?
            .to_string_lossy()
            .into_owned();
        let suffix = target
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let file = tempfile::Builder::new()
            .prefix(&format!(".{stem}."))
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|e| ReportError::Creating(e, target.clone()))?;
        Ok(Self { target, file })
    }
    /// Path of the temporary file
    pub fn partial(&self) -> &Path {
        self.file.path()
    }
    pub fn target(&self) -> &Path {
        &self.target
    }
    pub fn file_mut(&mut self) -> &mut File {
        self.file.as_file_mut()
    }
    /// Moves the temporary file to the target path
    pub fn commit(self) -> Result<PathBuf> {
        let Self { target, file } = self;
        file.persist(&target)
            .map_err(|e| ReportError::Finalizing(e.error, target.clone()))?;
        Ok(target)
    }
}

/// Writes `contents` to `path` through a [StagedFile]
pub fn write_staged<P: AsRef<Path>>(path: P, contents: &str) -> Result<PathBuf> {
    let mut staged = StagedFile::new(path)?;
    {
        let partial = staged.partial().to_path_buf();
        let mut buf = BufWriter::new(staged.file_mut());
        buf.write_all(contents.as_bytes())
            .and_then(|_| buf.flush())
            .map_err(|e| ReportError::Writing(e, partial))?;
    }
    staged.commit()
}

/// Plain text table, row labels left aligned and cells right aligned
///
/// With a `column_header`, the header line starts with the column header and the
/// row header sits alone on the next line.
pub fn text_table(row_header: &str, column_header: Option<&str>, table: &FormattedTable) -> String {
    let label_width = table
        .rows
        .iter()
        .map(|(label, _)| label.len())
        .chain(once(row_header.len()))
        .chain(column_header.map(str::len))
        .max()
        .unwrap_or_default();
    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(j, column)| {
            table
                .rows
                .iter()
                .filter_map(|(_, cells)| cells.get(j))
                .map(|cell| cell.len())
                .chain(once(column.len()))
                .max()
                .unwrap_or_default()
        })
        .collect();
    let line = |label: &str, cells: &[String]| -> String {
        let mut line = format!("{:<width$}", label, width = label_width);
        cells.iter().zip(widths.iter()).for_each(|(cell, width)| {
            line.push_str(&format!("  {:>width$}", cell, width = width));
        });
        line.trim_end().to_string()
    };
    let mut lines = vec![];
    match column_header {
        Some(column_header) => {
            lines.push(line(column_header, &table.columns));
            lines.push(row_header.to_string());
        }
        None => lines.push(line(row_header, &table.columns)),
    }
    lines.extend(table.rows.iter().map(|(label, cells)| line(label, cells)));
    lines.join("\n")
}

/// Markdown table with the row labels in the first column
pub fn markdown_table(row_header: &str, column_prefix: &str, table: &FormattedTable) -> String {
    let mut lines = vec![format!(
        "| {} | {} |",
        row_header,
        table
            .columns
            .iter()
            .map(|column| format!("{column_prefix}{column}"))
            .collect::<Vec<_>>()
            .join(" | ")
    )];
    lines.push(format!(
        "|:---|{}",
        table.columns.iter().map(|_| "---:|").collect::<String>()
    ));
    lines.extend(
        table
            .rows
            .iter()
            .map(|(label, cells)| format!("| {} | {} |", label, cells.join(" | "))),
    );
    lines.join("\n")
}
