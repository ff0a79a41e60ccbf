//! The scan decision table.
//!
//! [`decide`] is a pure function of the scan mode and what the store holds
//! for the student today. It names exactly one write; the recorder applies it.
//!
//! | Mode            | Today's state           | Write                  |
//! |-----------------|-------------------------|------------------------|
//! | explicit in     | any                     | insert, time_in        |
//! | explicit out    | open event              | close that event       |
//! | explicit out    | no open event           | insert, time_out only  |
//! | auto            | no event                | insert, time_in        |
//! | auto            | latest event is open    | close that event       |
//! | auto            | latest event has an out | insert, time_in        |

use serde::{Deserialize, Serialize};

use crate::{
  attendance::{AttendanceEvent, EventId},
  scan::{ScanAction, ScanKind},
  store::Guard,
};

/// How the direction of a scan is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
  /// The station declared the direction.
  Explicit(ScanAction),
  /// Infer the direction from today's latest event.
  Auto,
}

impl From<Option<ScanAction>> for Mode {
  fn from(action: Option<ScanAction>) -> Self {
    action.map_or(Mode::Auto, Mode::Explicit)
  }
}

/// Store reads for one student and one day. Only the field the mode needs is
/// populated.
#[derive(Debug, Clone, Default)]
pub struct DaySnapshot {
  /// Latest event with `time_out` unset (explicit time-out).
  pub open:   Option<AttendanceEvent>,
  /// Latest event of the day (auto).
  pub latest: Option<AttendanceEvent>,
}

/// The single write a scan performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Write {
  /// Insert a new event stamped on the `direction` side only.
  Insert { direction: ScanAction, guard: Guard },
  /// Set `time_out` on an open event.
  Close(EventId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
  pub write: Write,
  pub kind:  ScanKind,
}

pub fn decide(mode: Mode, day: &DaySnapshot) -> Decision {
  match mode {
    Mode::Explicit(ScanAction::TimeIn) => Decision {
      write: Write::Insert { direction: ScanAction::TimeIn, guard: Guard::Always },
      kind:  ScanKind::TimeIn,
    },

    Mode::Explicit(ScanAction::TimeOut) => match &day.open {
      Some(open) => Decision { write: Write::Close(open.event_id), kind: ScanKind::TimeOut },
      None => Decision {
        write: Write::Insert { direction: ScanAction::TimeOut, guard: Guard::NoOpenEvent },
        kind:  ScanKind::OrphanTimeOut,
      },
    },

    Mode::Auto => match &day.latest {
      None => Decision {
        write: Write::Insert { direction: ScanAction::TimeIn, guard: Guard::LatestIs(None) },
        kind:  ScanKind::TimeIn,
      },
      Some(latest) if latest.time_out.is_none() => {
        Decision { write: Write::Close(latest.event_id), kind: ScanKind::TimeOut }
      }
      Some(latest) => Decision {
        write: Write::Insert {
          direction: ScanAction::TimeIn,
          guard:     Guard::LatestIs(Some(latest.event_id)),
        },
        kind:  ScanKind::NewTimeIn,
      },
    },
  }
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone, Utc};
  use uuid::Uuid;

  use super::*;

  fn event(id: i64, time_in: bool, time_out: bool) -> AttendanceEvent {
    let at = Utc.with_ymd_and_hms(2025, 8, 11, 7, 30, 0).unwrap();
    AttendanceEvent {
      event_id:   EventId(id),
      student_id: Uuid::new_v4(),
      date:       NaiveDate::from_ymd_opt(2025, 8, 11).unwrap(),
      time_in:    time_in.then_some(at),
      time_out:   time_out.then_some(at),
      created_at: at,
      updated_at: at,
    }
  }

  #[test]
  fn explicit_time_in_ignores_state() {
    let day = DaySnapshot { open: Some(event(1, true, false)), latest: None };
    let d = decide(Mode::Explicit(ScanAction::TimeIn), &day);
    assert_eq!(d.kind, ScanKind::TimeIn);
    assert_eq!(
      d.write,
      Write::Insert { direction: ScanAction::TimeIn, guard: Guard::Always }
    );
  }

  #[test]
  fn explicit_time_out_closes_open_event() {
    let day = DaySnapshot { open: Some(event(7, true, false)), latest: None };
    let d = decide(Mode::Explicit(ScanAction::TimeOut), &day);
    assert_eq!(d.write, Write::Close(EventId(7)));
    assert_eq!(d.kind, ScanKind::TimeOut);
  }

  #[test]
  fn explicit_time_out_without_open_event_is_orphan() {
    let d = decide(Mode::Explicit(ScanAction::TimeOut), &DaySnapshot::default());
    assert_eq!(d.kind, ScanKind::OrphanTimeOut);
    assert_eq!(
      d.write,
      Write::Insert { direction: ScanAction::TimeOut, guard: Guard::NoOpenEvent }
    );
  }

  #[test]
  fn auto_cycles_through_the_day() {
    let d = decide(Mode::Auto, &DaySnapshot::default());
    assert_eq!(d.kind, ScanKind::TimeIn);
    assert_eq!(
      d.write,
      Write::Insert { direction: ScanAction::TimeIn, guard: Guard::LatestIs(None) }
    );

    let day = DaySnapshot { open: None, latest: Some(event(3, true, false)) };
    let d = decide(Mode::Auto, &day);
    assert_eq!(d.write, Write::Close(EventId(3)));

    let day = DaySnapshot { open: None, latest: Some(event(3, true, true)) };
    let d = decide(Mode::Auto, &day);
    assert_eq!(d.kind, ScanKind::NewTimeIn);
    assert_eq!(
      d.write,
      Write::Insert {
        direction: ScanAction::TimeIn,
        guard:     Guard::LatestIs(Some(EventId(3))),
      }
    );
  }

  #[test]
  fn auto_after_orphan_starts_new_cycle() {
    let day = DaySnapshot { open: None, latest: Some(event(4, false, true)) };
    assert_eq!(decide(Mode::Auto, &day).kind, ScanKind::NewTimeIn);
  }
}
