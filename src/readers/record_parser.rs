use crate::error::{ProcessingError, Result};
use crate::models::{Cell, Delimiter, DelimiterDetection, RawRow, RawTable};
use crate::utils::constants::{
    DEFAULT_BUFFER_SIZE, DEFAULT_SNIFF_LINES, MONTH_COLUMN, YEAR_COLUMN,
};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Reads one observation file into a [`RawTable`].
///
/// The splitting rule is inferred from a leading sample of non-blank lines
/// and then applied unchanged to every row. Rows that split to a different
/// width are kept as they are; judging them is the validator's job.
pub struct RecordParser {
    sniff_lines: usize,
    use_mmap: bool,
}

impl RecordParser {
    pub fn new() -> Self {
        Self {
            sniff_lines: DEFAULT_SNIFF_LINES,
            use_mmap: false,
        }
    }

    pub fn with_sniff_lines(mut self, sniff_lines: usize) -> Self {
        self.sniff_lines = sniff_lines.max(1);
        self
    }

    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    /// Parse a file from disk.
    pub fn parse_file(&self, path: &Path) -> Result<RawTable> {
        let content = self.read_content(path)?;
        self.parse_content(path, &content)
    }

    /// Parse already-loaded text; `path` only labels the result and errors.
    pub fn parse_content(&self, path: &Path, content: &str) -> Result<RawTable> {
        let lines: Vec<(usize, &str)> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| (index + 1, line))
            .collect();

        if lines.is_empty() {
            return Err(ProcessingError::parse(path, "file contains no data lines"));
        }

        let sample: Vec<&str> = lines
            .iter()
            .take(self.sniff_lines)
            .map(|(_, line)| *line)
            .collect();

        let detection = detect_delimiter(&sample).ok_or_else(|| {
            ProcessingError::parse(
                path,
                format!(
                    "no consistent delimiter across the first {} lines",
                    sample.len()
                ),
            )
        })?;

        debug!(
            "{}: {} delimiter, {} fields ({}/{} sampled lines agree)",
            path.display(),
            detection.delimiter,
            detection.sample_width,
            detection.agreeing_lines,
            detection.sampled_lines
        );

        let mut rows = Vec::with_capacity(lines.len());
        for (line_number, line) in &lines {
            let fields = split_line(line, detection.delimiter).map_err(|e| {
                ProcessingError::parse(path, format!("line {}: {}", line_number, e))
            })?;
            rows.push(RawRow {
                line_number: *line_number,
                cells: fields.iter().map(|f| Cell::parse(f)).collect(),
            });
        }

        let has_header = looks_like_header(&rows);
        let columns = if has_header {
            let header = rows.remove(0);
            header.cells.iter().map(|c| c.to_string()).collect()
        } else {
            (1..=detection.sample_width)
                .map(|i| format!("column_{}", i))
                .collect()
        };

        Ok(RawTable {
            source: path.to_path_buf(),
            columns,
            rows,
            detection,
            has_header,
        })
    }

    /// First `count` raw lines of a file, for quick inspection.
    pub fn inspect_head(&self, path: &Path, count: usize) -> Result<Vec<String>> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let mut lines = Vec::with_capacity(count);
        let mut buffer = Vec::new();

        while lines.len() < count {
            buffer.clear();
            if reader.read_until(b'\n', &mut buffer)? == 0 {
                break;
            }
            let line = decode_text(&buffer);
            lines.push(line.trim_end_matches(&['\r', '\n'][..]).to_string());
        }

        Ok(lines)
    }

    fn read_content(&self, path: &Path) -> Result<String> {
        let file = File::open(path)
            .map_err(|e| ProcessingError::parse(path, format!("cannot open file: {}", e)))?;
        let length = file.metadata()?.len();

        if length == 0 {
            return Err(ProcessingError::parse(path, "file is empty"));
        }

        if self.use_mmap {
            // Safety: the mapping is read once and dropped before returning.
            let mmap = unsafe { Mmap::map(&file) }
                .map_err(|e| ProcessingError::parse(path, format!("cannot map file: {}", e)))?;
            Ok(decode_text(&mmap))
        } else {
            let mut bytes = Vec::with_capacity(length as usize);
            BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file)
                .read_to_end(&mut bytes)
                .map_err(|e| ProcessingError::parse(path, format!("cannot read file: {}", e)))?;
            Ok(decode_text(&bytes))
        }
    }
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new()
    }
}

/// UTF-8 when valid, otherwise Windows-1252 (common for legacy station files).
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Split one line with a fixed rule. Byte delimiters go through the CSV
/// reader so quoted fields keep embedded delimiters.
pub fn split_line(line: &str, delimiter: Delimiter) -> std::result::Result<Vec<String>, csv::Error> {
    match delimiter.as_byte() {
        None => Ok(line.split_whitespace().map(str::to_string).collect()),
        Some(byte) => {
            let mut reader = csv::ReaderBuilder::new()
                .delimiter(byte)
                .has_headers(false)
                .flexible(true)
                .trim(csv::Trim::All)
                .from_reader(line.as_bytes());
            let mut record = csv::StringRecord::new();
            if reader.read_record(&mut record)? {
                Ok(record.iter().map(str::to_string).collect())
            } else {
                Ok(Vec::new())
            }
        }
    }
}

/// Pick the candidate whose modal field count (> 1) is shared by a strict
/// majority of the sample. Most agreeing lines wins; ties go to the earlier
/// candidate.
pub fn detect_delimiter(sample: &[&str]) -> Option<DelimiterDetection> {
    if sample.is_empty() {
        return None;
    }

    let mut best: Option<DelimiterDetection> = None;

    for candidate in Delimiter::CANDIDATES {
        let widths: Vec<usize> = sample
            .iter()
            .map(|line| split_line(line, candidate).map_or(0, |fields| fields.len()))
            .collect();

        let Some((width, agreeing)) = modal_width(&widths) else {
            continue;
        };

        if width < 2 || agreeing * 2 <= sample.len() {
            continue;
        }

        if best.as_ref().map_or(true, |b| agreeing > b.agreeing_lines) {
            best = Some(DelimiterDetection {
                delimiter: candidate,
                sample_width: width,
                sampled_lines: sample.len(),
                agreeing_lines: agreeing,
            });
        }
    }

    best
}

/// Most frequent width and its count; ties go to the width seen first.
fn modal_width(widths: &[usize]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    let mut seen = Vec::new();

    for &width in widths {
        if seen.contains(&width) {
            continue;
        }
        seen.push(width);
        let count = widths.iter().filter(|&&w| w == width).count();
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((width, count));
        }
    }

    best
}

/// The first row is a header when it is all text and a later row holds a
/// number, or when its year and month cells are text while a later row has
/// numbers in both positions. Day columns may be named `1`, `2`, ...
fn looks_like_header(rows: &[RawRow]) -> bool {
    let Some((first, rest)) = rows.split_first() else {
        return false;
    };

    let all_text = !first.cells.is_empty() && first.cells.iter().all(Cell::is_text);
    if all_text && rest.iter().any(|row| row.cells.iter().any(Cell::is_number)) {
        return true;
    }

    fn date_cells(row: &RawRow) -> (Option<&Cell>, Option<&Cell>) {
        (row.cells.get(YEAR_COLUMN), row.cells.get(MONTH_COLUMN))
    }
    let named_date_columns = matches!(
        date_cells(first),
        (Some(year), Some(month)) if year.is_text() && month.is_text()
    );
    named_date_columns
        && rest.iter().any(|row| {
            matches!(
                date_cells(row),
                (Some(year), Some(month)) if year.is_number() && month.is_number()
            )
        })
}
