//! Roster import: maps parsed spreadsheet rows onto students.
//!
//! Rows arrive already split into `column -> value` pairs. Each known column
//! has a setter; a setter that rejects its value is reported as a
//! [`FieldFailure`] and the rest of the row is still imported. Rows without a
//! usable student number cannot be keyed and are skipped.
//!
//! Re-importing a student merges: blank or rejected values never clear what
//! is already stored.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
  Error, Result,
  scan::ScanCode,
  student::{NewStudent, Sex, StudentProfile},
  store::Directory,
};

/// Column holding the scan code. Required.
pub const KEY_COLUMN: &str = "StudentNumber";

/// A parsed spreadsheet row.
pub type Row = HashMap<String, String>;

type Setter = fn(&mut StudentProfile, &str) -> Result<(), String>;

const COLUMNS: &[(&str, Setter)] = &[
  ("FirstName", set_first_name as Setter),
  ("MiddleName", set_middle_name as Setter),
  ("LastName", set_last_name as Setter),
  ("Sex", set_sex as Setter),
  ("Department", set_department as Setter),
  ("Year", set_year_level as Setter),
  ("DateOfBirth", set_date_of_birth as Setter),
  ("Photo", set_photo as Setter),
];

// ─── Report ──────────────────────────────────────────────────────────────────

/// A value that could not be applied. The row itself was still imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailure {
  /// 1-based position of the row in the import.
  pub row:    usize,
  pub column: String,
  pub value:  String,
  pub reason: String,
}

/// A row that was not imported at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
  pub row:    usize,
  pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
  pub created:        usize,
  pub updated:        usize,
  pub rows_failed:    Vec<RowFailure>,
  pub field_failures: Vec<FieldFailure>,
}

// ─── Mapping ─────────────────────────────────────────────────────────────────

/// Map one row to a [`NewStudent`], collecting field failures into `failures`.
pub fn map_row(
  index: usize,
  row: &Row,
  failures: &mut Vec<FieldFailure>,
) -> Result<NewStudent, RowFailure> {
  let mut key = None;
  let mut profile = StudentProfile::default();

  for (raw_column, raw_value) in row {
    let column = normalize_header(raw_column);
    let value = raw_value.trim();

    if column.eq_ignore_ascii_case(KEY_COLUMN) {
      key = Some(value);
      continue;
    }
    if value.is_empty() {
      continue;
    }

    let Some((name, setter)) = COLUMNS
      .iter()
      .find(|(name, _)| name.eq_ignore_ascii_case(column))
    else {
      debug!(row = index, column, "ignoring unknown roster column");
      continue;
    };

    if let Err(reason) = setter(&mut profile, value) {
      warn!(row = index, column = *name, %reason, "roster field rejected");
      failures.push(FieldFailure {
        row: index,
        column: (*name).to_owned(),
        value: value.to_owned(),
        reason,
      });
    }
  }

  let Some(key) = key.filter(|k| !k.is_empty()) else {
    return Err(RowFailure { row: index, reason: format!("missing {KEY_COLUMN}") });
  };
  // Stored codes must be scannable.
  match ScanCode::parse(key) {
    Ok(code) => Ok(NewStudent { scan_code: code.as_str().to_owned(), profile }),
    Err(_) => Err(RowFailure { row: index, reason: format!("invalid {KEY_COLUMN}") }),
  }
}

/// Merge every row into `directory`.
///
/// Field and row failures are collected in the report. Store failures abort
/// the import.
pub async fn import_roster<D>(directory: &D, rows: &[Row]) -> Result<ImportReport>
where
  D: Directory,
{
  let mut report = ImportReport::default();

  for (i, row) in rows.iter().enumerate() {
    let index = i + 1;
    let input = match map_row(index, row, &mut report.field_failures) {
      Ok(input) => input,
      Err(failure) => {
        warn!(row = index, reason = %failure.reason, "roster row skipped");
        report.rows_failed.push(failure);
        continue;
      }
    };

    let (_, created) = directory.merge_student(input).await.map_err(Error::store)?;
    if created {
      report.created += 1;
    } else {
      report.updated += 1;
    }
  }

  Ok(report)
}

fn normalize_header(raw: &str) -> &str { raw.trim_start_matches('\u{feff}').trim() }

// ─── Setters ─────────────────────────────────────────────────────────────────

fn set_first_name(p: &mut StudentProfile, v: &str) -> Result<(), String> {
  p.first_name = Some(v.to_owned());
  Ok(())
}

fn set_middle_name(p: &mut StudentProfile, v: &str) -> Result<(), String> {
  p.middle_name = Some(v.to_owned());
  Ok(())
}

fn set_last_name(p: &mut StudentProfile, v: &str) -> Result<(), String> {
  p.last_name = Some(v.to_owned());
  Ok(())
}

fn set_department(p: &mut StudentProfile, v: &str) -> Result<(), String> {
  p.department = Some(v.to_owned());
  Ok(())
}

fn set_photo(p: &mut StudentProfile, v: &str) -> Result<(), String> {
  if v.contains(['/', '\\']) {
    return Err("photo must be a bare file name".into());
  }
  p.photo = Some(v.to_owned());
  Ok(())
}

fn set_sex(p: &mut StudentProfile, v: &str) -> Result<(), String> {
  p.sex = Some(match v.to_ascii_lowercase().as_str() {
    "m" | "male" => Sex::Male,
    "f" | "female" => Sex::Female,
    _ => return Err("expected M or F".into()),
  });
  Ok(())
}

fn set_year_level(p: &mut StudentProfile, v: &str) -> Result<(), String> {
  match v.parse::<u8>() {
    Ok(year @ 1..=12) => {
      p.year_level = Some(year);
      Ok(())
    }
    _ => Err("expected a year level between 1 and 12".into()),
  }
}

fn set_date_of_birth(p: &mut StudentProfile, v: &str) -> Result<(), String> {
  let date = NaiveDate::parse_from_str(v, "%Y-%m-%d")
    .or_else(|_| NaiveDate::parse_from_str(v, "%m/%d/%Y"))
    .map_err(|_| "expected YYYY-MM-DD or MM/DD/YYYY".to_owned())?;
  p.date_of_birth = Some(date);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(pairs: &[(&str, &str)]) -> Row {
    pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
  }

  #[test]
  fn maps_known_columns_and_ignores_others() {
    let mut failures = Vec::new();
    let input = map_row(
      1,
      &row(&[
        ("\u{feff}StudentNumber", " 2025-0002 "),
        ("FirstName", "Maria"),
        ("LastName", "Santos"),
        ("Sex", "f"),
        ("Year", "2"),
        ("DateOfBirth", "03/14/2007"),
        ("SocialSecurityNumber", "not imported"),
        ("MiddleName", ""),
      ]),
      &mut failures,
    )
    .unwrap();

    assert!(failures.is_empty());
    assert_eq!(input.scan_code, "2025-0002");
    assert_eq!(input.profile.first_name.as_deref(), Some("Maria"));
    assert_eq!(input.profile.middle_name, None);
    assert_eq!(input.profile.sex, Some(Sex::Female));
    assert_eq!(input.profile.year_level, Some(2));
    assert_eq!(input.profile.date_of_birth, NaiveDate::from_ymd_opt(2007, 3, 14));
  }

  #[test]
  fn bad_fields_are_reported_but_row_survives() {
    let mut failures = Vec::new();
    let input = map_row(
      4,
      &row(&[
        ("StudentNumber", "2025-0009"),
        ("FirstName", "Jun"),
        ("Sex", "x"),
        ("Year", "fourth"),
        ("Photo", "../etc/passwd"),
      ]),
      &mut failures,
    )
    .unwrap();

    assert_eq!(input.profile.first_name.as_deref(), Some("Jun"));
    assert_eq!(input.profile.sex, None);

    let mut columns: Vec<_> = failures.iter().map(|f| f.column.as_str()).collect();
    columns.sort_unstable();
    assert_eq!(columns, ["Photo", "Sex", "Year"]);
    assert!(failures.iter().all(|f| f.row == 4));
  }

  #[test]
  fn row_without_student_number_is_skipped() {
    let mut failures = Vec::new();
    let err = map_row(2, &row(&[("StudentNumber", "  "), ("FirstName", "Ana")]), &mut failures)
      .unwrap_err();
    assert_eq!(err.row, 2);
    assert_eq!(err.reason, "missing StudentNumber");
  }

  #[test]
  fn unscannable_student_number_is_skipped() {
    let mut failures = Vec::new();
    let long = "9".repeat(80);
    let err = map_row(5, &row(&[("StudentNumber", long.as_str())]), &mut failures).unwrap_err();
    assert_eq!(err.row, 5);
    assert_eq!(err.reason, "invalid StudentNumber");

    let err = map_row(6, &row(&[("StudentNumber", "2025\u{7}0001")]), &mut failures).unwrap_err();
    assert_eq!(err.reason, "invalid StudentNumber");
  }
}
