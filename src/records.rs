// 📥 Roster Records - Input tables for identity resolution
// Source A (LiveHeats / IWT), Source B (PWA), and the country mapping table.
//
// Rows are read through permissive "raw" shapes (every column optional,
// header aliases for the federation exports) and then validated into the
// immutable records the resolver works on. Only the name is mandatory.

use crate::error::RosterError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// SOURCE A
// ============================================================================

/// Athlete as exported by the source A collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceARecord {
    pub name: String,
    pub year_of_birth: Option<i32>,
    pub country: Option<String>,
    pub nationality: Option<String>,
    pub external_id: String,
    pub alt_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSourceARow {
    #[serde(default)]
    name: Option<String>,

    #[serde(default, alias = "yob")]
    year_of_birth: Option<String>,

    #[serde(default)]
    dob: Option<String>,

    #[serde(default)]
    country: Option<String>,

    #[serde(default)]
    nationality: Option<String>,

    #[serde(default)]
    external_id: Option<String>,

    /// LiveHeats export column; `external_id` wins when both are present
    #[serde(default)]
    id: Option<String>,

    #[serde(default)]
    alt_id: Option<String>,
}

impl RawSourceARow {
    fn into_record(self, row: usize) -> Result<SourceARecord, RosterError> {
        let name = required_name(self.name, "source A", row)?;

        // year_of_birth wins; otherwise fall back to the dob prefix
        let year_of_birth = self
            .year_of_birth
            .as_deref()
            .and_then(parse_year)
            .or_else(|| self.dob.as_deref().and_then(parse_year));

        Ok(SourceARecord {
            name,
            year_of_birth,
            country: non_blank(self.country),
            nationality: non_blank(self.nationality),
            external_id: non_blank(self.external_id)
                .or_else(|| non_blank(self.id))
                .unwrap_or_default(),
            alt_id: non_blank(self.alt_id),
        })
    }
}

/// Athlete object from the LiveHeats athletes JSON dump
#[derive(Debug, Deserialize)]
struct LiveHeatsAthlete {
    #[serde(default)]
    id: Option<serde_json::Value>,

    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    dob: Option<String>,

    #[serde(default)]
    nationality: Option<String>,

    #[serde(default)]
    country: Option<String>,
}

impl LiveHeatsAthlete {
    fn into_record(self, row: usize) -> Result<SourceARecord, RosterError> {
        let name = required_name(self.name, "source A", row)?;

        let external_id = match self.id {
            Some(serde_json::Value::String(s)) => s.trim().to_string(),
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Ok(SourceARecord {
            name,
            year_of_birth: self.dob.as_deref().and_then(parse_year),
            country: non_blank(self.country),
            nationality: non_blank(self.nationality),
            external_id,
            alt_id: None,
        })
    }
}

// ============================================================================
// SOURCE B
// ============================================================================

/// Sailor as scraped from the source B site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceBRecord {
    pub name: String,
    pub year_of_birth: Option<i32>,
    pub nationality_raw: String,
    pub sail_no: String,
    pub profile_url: String,
}

#[derive(Debug, Deserialize)]
struct RawSourceBRow {
    #[serde(default, alias = "Name")]
    name: Option<String>,

    #[serde(default, alias = "Year of Birth")]
    year_of_birth: Option<String>,

    #[serde(default, alias = "Nationality")]
    nationality_raw: Option<String>,

    #[serde(default, alias = "Sail No")]
    sail_no: Option<String>,

    #[serde(default, alias = "Profile URL")]
    profile_url: Option<String>,
}

impl RawSourceBRow {
    fn into_record(self, row: usize) -> Result<SourceBRecord, RosterError> {
        let name = required_name(self.name, "source B", row)?;

        Ok(SourceBRecord {
            name,
            year_of_birth: self.year_of_birth.as_deref().and_then(parse_year),
            nationality_raw: self.nationality_raw.unwrap_or_default(),
            sail_no: non_blank(self.sail_no).unwrap_or_default(),
            profile_url: non_blank(self.profile_url).unwrap_or_default(),
        })
    }
}

// ============================================================================
// COUNTRY MAPPING
// ============================================================================

/// Demonym → canonical country / nationality code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryMapping {
    #[serde(alias = "pwa_demonyms")]
    pub demonym: String,

    #[serde(alias = "Name")]
    pub canonical_country: String,

    #[serde(alias = "live_heats_nationality")]
    pub canonical_nationality_code: String,
}

// ============================================================================
// ROSTER FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    Csv,
    Json,
}

/// Detect roster format from the file extension
pub fn detect_format(path: &Path) -> Result<RosterFormat> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "csv" => Ok(RosterFormat::Csv),
        "json" => Ok(RosterFormat::Json),
        _ => Err(RosterError::UnsupportedFormat(path.display().to_string()).into()),
    }
}

// ============================================================================
// LOADERS
// ============================================================================

/// Load source A from CSV or LiveHeats JSON, picked by extension
pub fn load_source_a(path: &Path) -> Result<Vec<SourceARecord>> {
    match detect_format(path)? {
        RosterFormat::Csv => load_source_a_csv(path),
        RosterFormat::Json => load_source_a_json(path),
    }
}

pub fn load_source_a_csv(path: &Path) -> Result<Vec<SourceARecord>> {
    let rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open source A CSV: {:?}", path))?;
    read_source_a(rdr)
}

pub fn load_source_a_json(path: &Path) -> Result<Vec<SourceARecord>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read source A JSON: {:?}", path))?;
    parse_source_a_json(&content)
}

/// Parse a LiveHeats athletes array; year of birth comes from `dob`
pub fn parse_source_a_json(content: &str) -> Result<Vec<SourceARecord>> {
    let athletes: Vec<LiveHeatsAthlete> =
        serde_json::from_str(content).context("Failed to parse source A JSON")?;

    let mut records = Vec::with_capacity(athletes.len());
    for (i, athlete) in athletes.into_iter().enumerate() {
        records.push(athlete.into_record(i + 1)?);
    }

    Ok(records)
}

pub fn read_source_a<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<Vec<SourceARecord>> {
    let mut records = Vec::new();

    for (i, result) in rdr.deserialize::<RawSourceARow>().enumerate() {
        let raw = result.context("Failed to deserialize source A row")?;
        records.push(raw.into_record(i + 1)?);
    }

    Ok(records)
}

pub fn load_source_b(path: &Path) -> Result<Vec<SourceBRecord>> {
    let rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open source B CSV: {:?}", path))?;
    read_source_b(rdr)
}

pub fn read_source_b<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<Vec<SourceBRecord>> {
    let mut records = Vec::new();

    for (i, result) in rdr.deserialize::<RawSourceBRow>().enumerate() {
        let raw = result.context("Failed to deserialize source B row")?;
        records.push(raw.into_record(i + 1)?);
    }

    Ok(records)
}

pub fn load_country_mappings(path: &Path) -> Result<Vec<CountryMapping>> {
    let rdr = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open country mapping CSV: {:?}", path))?;
    read_country_mappings(rdr)
}

pub fn read_country_mappings<R: std::io::Read>(
    mut rdr: csv::Reader<R>,
) -> Result<Vec<CountryMapping>> {
    let mut mappings = Vec::new();

    for result in rdr.deserialize() {
        let mapping: CountryMapping = result.context("Failed to deserialize country mapping")?;
        mappings.push(mapping);
    }

    Ok(mappings)
}

/// Write any serializable rows as CSV (header from the first row)
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV: {:?}", path))?;

    for row in rows {
        wtr.serialize(row).context("Failed to serialize row")?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

// ============================================================================
// FIELD HELPERS
// ============================================================================

/// Lenient year parser: "1998", "1998.0" (float exports), "1998-04-02" (dob).
/// Only four-digit years survive; anything else is no signal.
pub fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let year = match trimmed.split_once(['.', '-']) {
        // "1998.0", "1998.00"
        Some((whole, rest)) if trimmed.as_bytes()[whole.len()] == b'.' => {
            if rest.is_empty() || !rest.chars().all(|c| c == '0') {
                return None;
            }
            whole
        }
        // "1998-04-02"
        Some((whole, _)) => whole,
        None => trimmed,
    };

    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    year.parse::<i32>()
        .ok()
        .filter(|y| (MIN_YEAR..=MAX_YEAR).contains(y))
}

const MIN_YEAR: i32 = 1000;
const MAX_YEAR: i32 = 9999;

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_name(
    name: Option<String>,
    roster: &'static str,
    row: usize,
) -> Result<String, RosterError> {
    non_blank(name).ok_or(RosterError::MissingName { roster, line: row })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &str) -> csv::Reader<&[u8]> {
        csv::Reader::from_reader(data.as_bytes())
    }

    #[test]
    fn test_parse_year_variants() {
        assert_eq!(parse_year("1998"), Some(1998));
        assert_eq!(parse_year(" 1998 "), Some(1998));
        assert_eq!(parse_year("1998.0"), Some(1998));
        assert_eq!(parse_year("1998-04-02"), Some(1998));
        assert_eq!(parse_year(""), None);
        assert_eq!(parse_year("nan"), None);
        assert_eq!(parse_year("unknown"), None);
        assert_eq!(parse_year("1998.5"), None);
        assert_eq!(parse_year("1998."), None);
    }

    #[test]
    fn test_parse_year_rejects_out_of_range() {
        assert_eq!(parse_year("1e3"), None);
        assert_eq!(parse_year("-1e10"), None);
        assert_eq!(parse_year("0"), None);
        assert_eq!(parse_year("-5"), None);
        assert_eq!(parse_year("99999"), None);
        assert_eq!(parse_year("999"), None);
        assert_eq!(parse_year("inf"), None);
        assert_eq!(parse_year("+1998"), None);
        assert_eq!(parse_year("98-04-02"), None);
    }

    #[test]
    fn test_source_a_external_id_column_wins_over_id() {
        let data = "id,external_id,name\nlh-1,ext-9,Jane Doe\nlh-2,,John Roe\n";
        let records = read_source_a(reader(data)).unwrap();

        assert_eq!(records[0].external_id, "ext-9");
        assert_eq!(records[1].external_id, "lh-2");
    }

    #[test]
    fn test_read_source_a_csv_export_headers() {
        let data = "id,name,image,dob,nationality,year_of_birth\n\
                    123,Coco Foveau,,1998-05-01,FRA,1998\n\
                    456,Jane Doe,,,,\n";

        let records = read_source_a(reader(data)).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Coco Foveau");
        assert_eq!(records[0].external_id, "123");
        assert_eq!(records[0].year_of_birth, Some(1998));
        assert_eq!(records[0].nationality.as_deref(), Some("FRA"));
        assert_eq!(records[1].year_of_birth, None);
        assert_eq!(records[1].nationality, None);
        assert_eq!(records[1].alt_id, None);
    }

    #[test]
    fn test_source_a_year_falls_back_to_dob() {
        let data = "name,dob,year_of_birth\nJane Doe,1995-02-03,\n";
        let records = read_source_a(reader(data)).unwrap();
        assert_eq!(records[0].year_of_birth, Some(1995));
    }

    #[test]
    fn test_source_a_missing_name_fails() {
        let data = "id,name,year_of_birth\n1,Jane Doe,1995\n2,  ,1996\n";

        let err = read_source_a(reader(data)).unwrap_err();
        let roster_err = err.downcast_ref::<RosterError>().unwrap();

        assert_eq!(
            roster_err,
            &RosterError::MissingName { roster: "source A", line: 2 }
        );
    }

    #[test]
    fn test_read_source_b_pwa_headers() {
        let data = "Name,Year of Birth,Nationality,Sail No,Profile URL\n\
                    Coraline Foveau,1998.0,French,F-191,https://example.org/sailor/1\n\
                    Unknown Rider,,Martian,,\n";

        let records = read_source_b(reader(data)).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].year_of_birth, Some(1998));
        assert_eq!(records[0].nationality_raw, "French");
        assert_eq!(records[0].sail_no, "F-191");
        assert_eq!(records[1].year_of_birth, None);
        assert_eq!(records[1].sail_no, "");
    }

    #[test]
    fn test_source_b_missing_name_fails() {
        let data = "Name,Nationality\n,French\n";
        let err = read_source_b(reader(data)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RosterError>(),
            Some(RosterError::MissingName { roster: "source B", line: 1 })
        ));
    }

    #[test]
    fn test_read_country_mappings_aliases() {
        let data = "pwa_demonyms,Name,live_heats_nationality\nFrench,France,FRA\n";
        let mappings = read_country_mappings(reader(data)).unwrap();

        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].demonym, "French");
        assert_eq!(mappings[0].canonical_country, "France");
        assert_eq!(mappings[0].canonical_nationality_code, "FRA");
    }

    #[test]
    fn test_parse_source_a_json() {
        let content = r#"[
            {"id": "a1", "name": "Jane Doe", "image": null, "dob": "1995-06-01", "nationality": "USA"},
            {"id": 42, "name": "John Roe", "dob": null, "nationality": null}
        ]"#;

        let records = parse_source_a_json(content).unwrap();

        assert_eq!(records[0].external_id, "a1");
        assert_eq!(records[0].year_of_birth, Some(1995));
        assert_eq!(records[1].external_id, "42");
        assert_eq!(records[1].year_of_birth, None);
    }

    #[test]
    fn test_parse_source_a_json_missing_name() {
        let content = r#"[{"id": "a1", "dob": "1995-06-01"}]"#;
        let err = parse_source_a_json(content).unwrap_err();
        assert!(err.downcast_ref::<RosterError>().is_some());
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("a.csv")).unwrap(), RosterFormat::Csv);
        assert_eq!(detect_format(Path::new("a.JSON")).unwrap(), RosterFormat::Json);
        assert!(detect_format(Path::new("a.xlsx")).is_err());
    }
}
