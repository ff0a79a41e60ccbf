//! Student — the cardholder a scan code resolves to.
//!
//! Only `student_id` and `scan_code` matter to attendance recording. The
//! profile is display-only and is maintained through the roster import and
//! the admin endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Biological sex as recorded on the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
  Male,
  Female,
}

/// Display attributes printed on the kiosk and the ID card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
  pub first_name:    Option<String>,
  pub middle_name:   Option<String>,
  pub last_name:     Option<String>,
  pub sex:           Option<Sex>,
  pub department:    Option<String>,
  pub year_level:    Option<u8>,
  pub date_of_birth: Option<NaiveDate>,
  /// File name of the photo, relative to the photo directory.
  pub photo:         Option<String>,
}

/// A student known to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
  pub student_id: Uuid,
  /// The student number encoded in the QR badge. Unique.
  pub scan_code:  String,
  pub profile:    StudentProfile,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Student {
  /// "First Middle Last", skipping blanks. Falls back to the scan code.
  pub fn display_name(&self) -> String {
    let p = &self.profile;
    let name = [&p.first_name, &p.middle_name, &p.last_name]
      .into_iter()
      .filter_map(|part| part.as_deref().map(str::trim))
      .filter(|part| !part.is_empty())
      .collect::<Vec<_>>()
      .join(" ");

    if name.is_empty() {
      self.scan_code.clone()
    } else {
      name
    }
  }
}

impl StudentProfile {
  /// Overwrite the fields that are set in `other`; unset fields keep their
  /// current value.
  pub fn merge(&mut self, other: StudentProfile) {
    let StudentProfile {
      first_name,
      middle_name,
      last_name,
      sex,
      department,
      year_level,
      date_of_birth,
      photo,
    } = other;
    self.first_name = first_name.or(self.first_name.take());
    self.middle_name = middle_name.or(self.middle_name.take());
    self.last_name = last_name.or(self.last_name.take());
    self.sex = sex.or(self.sex.take());
    self.department = department.or(self.department.take());
    self.year_level = year_level.or(self.year_level.take());
    self.date_of_birth = date_of_birth.or(self.date_of_birth.take());
    self.photo = photo.or(self.photo.take());
  }
}

/// Input to [`Directory::upsert_student`](crate::store::Directory::upsert_student).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
  pub scan_code: String,
  #[serde(default)]
  pub profile:   StudentProfile,
}

impl NewStudent {
  pub fn new(scan_code: impl Into<String>) -> Self {
    Self { scan_code: scan_code.into(), profile: StudentProfile::default() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn student(profile: StudentProfile) -> Student {
    let now = Utc::now();
    Student {
      student_id: Uuid::new_v4(),
      scan_code: "2025-0002".into(),
      profile,
      created_at: now,
      updated_at: now,
    }
  }

  #[test]
  fn display_name_skips_missing_parts() {
    let s = student(StudentProfile {
      first_name: Some("Maria".into()),
      middle_name: Some("  ".into()),
      last_name: Some("Santos".into()),
      ..Default::default()
    });
    assert_eq!(s.display_name(), "Maria Santos");
  }

  #[test]
  fn display_name_falls_back_to_scan_code() {
    let s = student(StudentProfile::default());
    assert_eq!(s.display_name(), "2025-0002");
  }

  #[test]
  fn merge_keeps_fields_missing_from_update() {
    let mut stored = StudentProfile {
      first_name: Some("Maria".into()),
      sex: Some(Sex::Female),
      department: Some("Education".into()),
      ..Default::default()
    };
    stored.merge(StudentProfile {
      department: Some("Nursing".into()),
      year_level: Some(3),
      ..Default::default()
    });
    assert_eq!(stored.first_name.as_deref(), Some("Maria"));
    assert_eq!(stored.sex, Some(Sex::Female));
    assert_eq!(stored.department.as_deref(), Some("Nursing"));
    assert_eq!(stored.year_level, Some(3));
  }
}
