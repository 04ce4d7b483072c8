//! Delimiter-separated export of every monitor's latest window.

use chrono::Utc;
use deltamon_common::types::Report;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Appends one record per tick. Columns are fixed when the sink is opened; a
/// monitor that failed its tick contributes empty fields.
pub struct CsvSink {
    out: csv::Writer<File>,
    widths: Vec<usize>,
}

impl CsvSink {
    /// Open `path` for appending and write the header if the file is empty.
    ///
    /// `delim` must be an ASCII character; the config loader enforces it.
    pub fn open<'a, I, R>(path: &Path, delim: char, monitors: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = &'a R>,
        R: Report + ?Sized + 'a,
    {
        anyhow::ensure!(delim.is_ascii(), "csv delimiter {delim:?} is not ASCII");
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let fresh = file.metadata()?.len() == 0;
        let headers: Vec<Vec<String>> = monitors.into_iter().map(|m| m.csv_header()).collect();
        let widths = headers.iter().map(Vec::len).collect();

        let mut out = csv::WriterBuilder::new()
            .delimiter(delim as u8)
            .from_writer(file);
        if fresh {
            let columns = headers.into_iter().flatten();
            out.write_record(std::iter::once("timestamp".to_string()).chain(columns))?;
            out.flush()?;
        }
        Ok(Self { out, widths })
    }

    /// `rows` yields, per monitor in opening order, its report if the tick
    /// succeeded.
    pub fn append<'a, I, R>(&mut self, rows: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = Option<&'a R>>,
        R: Report + ?Sized + 'a,
    {
        let fields = rows
            .into_iter()
            .zip(&self.widths)
            .flat_map(|(row, width)| match row {
                Some(report) => report.csv_row(),
                None => vec![String::new(); *width],
            });
        let record: Vec<String> = std::iter::once(Utc::now().to_rfc3339())
            .chain(fields)
            .collect();
        self.out.write_record(&record)?;
        self.out.flush()?;
        Ok(())
    }
}
