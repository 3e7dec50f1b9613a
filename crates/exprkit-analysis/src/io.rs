//! CSV/TSV loaders for counts, gene lengths and patient survival tables.
//!
//! Readers accept any [`io::Read`] plus a field delimiter; the `load_*`
//! helpers open a file and pick the delimiter from its extension (`.tsv` and
//! `.txt` are tab separated, anything else comma separated).
//!
//! # Formats
//!
//! ```text
//! counts:        gene,<sample>,<sample>,...    one row per gene
//! gene lengths:  gene,length                   one row per gene
//! patients:      sample,lifetime,dead          empty lifetime = unknown
//! ```
//!
//! Every file starts with a header row. Rows with a different number of
//! fields than the header are rejected.

use std::{
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use log::{debug, info};
use ndarray::Array2;

use crate::{
    normalize::GeneLengths,
    survival::{Patient, PatientTable},
    table::{ExpressionTable, IdKind, TableError},
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum LoadError {
    #[display("failed to open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("malformed table: {_0}")]
    #[from]
    Csv(csv::Error),
    #[display("line {line}: invalid {column} value '{value}'")]
    Parse {
        line: u64,
        column: String,
        value: String,
    },
    #[display("header must name the id column and at least one sample")]
    MissingSamples,
    #[display("{_0}")]
    #[from]
    Table(TableError),
}

/// Reads a count table: a header `id,<samples...>` followed by one row per gene.
///
/// # Examples
///
/// ```
/// use exprkit_analysis::io::read_counts;
///
/// let data = "gene,s1,s2\nA1BG,10,0\nTP53,3,8\n";
/// let table = read_counts(data.as_bytes(), b',').unwrap();
/// assert_eq!(table.samples(), &["s1".to_owned(), "s2".to_owned()]);
/// assert_eq!(table.counts()[[1, 1]], 8.0);
/// ```
pub fn read_counts<R>(reader: R, delimiter: u8) -> Result<ExpressionTable, LoadError>
where
    R: io::Read,
{
    let mut csv = reader_builder(delimiter).from_reader(reader);
    let samples = csv
        .headers()?
        .iter()
        .skip(1)
        .map(str::to_owned)
        .collect::<Vec<_>>();
    if samples.is_empty() {
        return Err(LoadError::MissingSamples);
    }

    let mut genes = vec![];
    let mut values = vec![];
    for record in csv.records() {
        let record = record?;
        let line = line_of(&record);
        genes.push(record[0].to_owned());
        for (field, sample) in record.iter().skip(1).zip(&samples) {
            values.push(parse_number(field, line, sample)?);
        }
    }

    let shape = (genes.len(), samples.len());
    let counts = Array2::from_shape_vec(shape, values).map_err(|_| TableError::Shape {
        kind: IdKind::Gene,
        labels: genes.len(),
        dim: shape.0,
    })?;
    let table = ExpressionTable::new(genes, samples, counts)?;
    debug!(
        "read count table with {} genes and {} samples",
        table.n_genes(),
        table.n_samples()
    );
    Ok(table)
}

/// Reads a two-column `gene,length` table.
pub fn read_gene_lengths<R>(reader: R, delimiter: u8) -> Result<GeneLengths, LoadError>
where
    R: io::Read,
{
    let mut csv = reader_builder(delimiter).from_reader(reader);
    let mut lengths = GeneLengths::new();
    for record in csv.records() {
        let record = record?;
        let line = line_of(&record);
        let gene = field(&record, 0, line, "gene")?;
        let length = parse_number(field(&record, 1, line, "length")?, line, "length")?;
        if lengths.insert(gene.to_owned(), length).is_some() {
            return Err(TableError::DuplicateId {
                kind: IdKind::Gene,
                id: gene.to_owned(),
            }
            .into());
        }
    }
    debug!("read {} gene lengths", lengths.len());
    Ok(lengths)
}

/// Reads a `sample,lifetime,dead` patient table.
///
/// An empty lifetime cell is read as `NaN` (unknown lifetime, censored).
/// `dead` accepts `true`/`false`, `1`/`0` and `yes`/`no`, case-insensitively.
///
/// # Examples
///
/// ```
/// use exprkit_analysis::io::read_patients;
///
/// let data = "sample,lifetime,dead\np1,12.5,true\np2,,false\n";
/// let patients = read_patients(data.as_bytes(), b',').unwrap();
/// assert!(patients.get("p1").unwrap().dead);
/// assert!(patients.get("p2").unwrap().lifetime.is_nan());
/// ```
pub fn read_patients<R>(reader: R, delimiter: u8) -> Result<PatientTable, LoadError>
where
    R: io::Read,
{
    let mut csv = reader_builder(delimiter).from_reader(reader);
    let mut patients = PatientTable::new();
    for record in csv.records() {
        let record = record?;
        let line = line_of(&record);
        let sample = field(&record, 0, line, "sample")?;
        let lifetime = match field(&record, 1, line, "lifetime")? {
            "" => f64::NAN,
            value => parse_number(value, line, "lifetime")?,
        };
        let dead = parse_flag(field(&record, 2, line, "dead")?, line)?;
        if patients
            .insert(sample.to_owned(), Patient { lifetime, dead })
            .is_some()
        {
            return Err(TableError::DuplicateId {
                kind: IdKind::Sample,
                id: sample.to_owned(),
            }
            .into());
        }
    }
    debug!("read {} patients", patients.len());
    Ok(patients)
}

pub fn load_counts<P>(path: P) -> Result<ExpressionTable, LoadError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let table = read_counts(open(path)?, delimiter_for(path))?;
    info!(
        "loaded {} genes x {} samples from {}",
        table.n_genes(),
        table.n_samples(),
        path.display()
    );
    Ok(table)
}

pub fn load_gene_lengths<P>(path: P) -> Result<GeneLengths, LoadError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let lengths = read_gene_lengths(open(path)?, delimiter_for(path))?;
    info!("loaded {} gene lengths from {}", lengths.len(), path.display());
    Ok(lengths)
}

pub fn load_patients<P>(path: P) -> Result<PatientTable, LoadError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let patients = read_patients(open(path)?, delimiter_for(path))?;
    info!("loaded {} patients from {}", patients.len(), path.display());
    Ok(patients)
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Open {
            path: path.to_owned(),
            source,
        })
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("tsv" | "txt") => b'\t',
        _ => b',',
    }
}

fn reader_builder(delimiter: u8) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All);
    builder
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map_or(0, csv::Position::line)
}

fn field<'a>(
    record: &'a csv::StringRecord,
    idx: usize,
    line: u64,
    column: &str,
) -> Result<&'a str, LoadError> {
    record.get(idx).ok_or_else(|| LoadError::Parse {
        line,
        column: column.to_owned(),
        value: String::new(),
    })
}

fn parse_number(value: &str, line: u64, column: &str) -> Result<f64, LoadError> {
    value.parse().map_err(|_| LoadError::Parse {
        line,
        column: column.to_owned(),
        value: value.to_owned(),
    })
}

fn parse_flag(value: &str, line: u64) -> Result<bool, LoadError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(LoadError::Parse {
            line,
            column: "dead".to_owned(),
            value: value.to_owned(),
        }),
    }
}
