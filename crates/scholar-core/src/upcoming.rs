//! Nearest-upcoming-record selection across scholars.
//!
//! Given a snapshot of scholars and a reference `now`, pick for each scholar
//! the single soonest record that is scheduled at or after `now` and has not
//! occurred, then order the picks by date. Which records are considered is
//! decided by an extractor (meetings, milestones, both, or anything a caller
//! supplies); which scholars are considered is decided by a scope predicate.
//!
//! The computation is pure: no I/O, no ambient clock.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::scholar::{
  LinkedScholar, MilestoneKind, Schedule, Scholar, ScholarSummary,
};

// ─── Record identity ─────────────────────────────────────────────────────────

/// Identifies a dated record within its scholar document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RecordKey {
  Meeting(Uuid),
  Milestone(MilestoneKind),
}

/// A dated record lifted out of a scholar document. Records whose scheduled
/// date is missing or unreadable never become candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
  pub record:       RecordKey,
  pub scheduled_at: DateTime<Utc>,
  pub occurred:     bool,
}

impl Candidate {
  fn from_schedule(record: RecordKey, schedule: &Schedule) -> Option<Self> {
    Some(Self {
      record,
      scheduled_at: schedule.scheduled_at?,
      occurred: schedule.occurred,
    })
  }

  pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
    !self.occurred && self.scheduled_at >= now
  }
}

// ─── Categories ──────────────────────────────────────────────────────────────

/// The built-in record categories.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
  /// Doctoral-committee meetings, in list order.
  Meetings,
  /// Milestone fields, in [`MilestoneKind`] declaration order.
  Milestones,
  /// Meetings followed by milestones.
  All,
}

impl Category {
  pub fn extract(self, scholar: &Scholar) -> Vec<Candidate> {
    match self {
      Self::Meetings => meeting_candidates(scholar),
      Self::Milestones => milestone_candidates(scholar),
      Self::All => {
        let mut out = meeting_candidates(scholar);
        out.extend(milestone_candidates(scholar));
        out
      }
    }
  }
}

pub fn meeting_candidates(scholar: &Scholar) -> Vec<Candidate> {
  scholar
    .dc_meetings
    .iter()
    .flatten()
    .filter_map(|m| {
      Candidate::from_schedule(RecordKey::Meeting(m.meeting_id), &m.schedule)
    })
    .collect()
}

pub fn milestone_candidates(scholar: &Scholar) -> Vec<Candidate> {
  let Some(milestones) = &scholar.milestones else {
    return Vec::new();
  };
  MilestoneKind::iter()
    .filter_map(|kind| {
      milestones
        .get(kind)
        .and_then(|s| Candidate::from_schedule(RecordKey::Milestone(kind), s))
    })
    .collect()
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// One scholar's nearest upcoming record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingEntry {
  pub scholar_id:   Uuid,
  pub record:       RecordKey,
  pub scheduled_at: DateTime<Utc>,
  /// Always `false`; kept so clients can treat entries like stored records.
  pub occurred:     bool,
  pub scholar:      ScholarSummary,
}

// ─── Finder ──────────────────────────────────────────────────────────────────

/// The soonest upcoming candidate for one scholar. Ties on `scheduled_at`
/// keep the first candidate in extraction order.
pub fn nearest_upcoming(
  candidates: impl IntoIterator<Item = Candidate>,
  now: DateTime<Utc>,
) -> Option<Candidate> {
  candidates
    .into_iter()
    .filter(|c| c.is_upcoming(now))
    .min_by_key(|c| c.scheduled_at)
}

/// Select at most one upcoming record per in-scope scholar and return them
/// sorted ascending by scheduled date.
///
/// Scholars are skipped when their owner link is unresolved, when `in_scope`
/// rejects them, or when `extract` yields no upcoming record. The sort is
/// stable, so scholars sharing a date keep their input order.
pub fn find_nearest_upcoming<'a, I, E, P>(
  subjects: I,
  now: DateTime<Utc>,
  extract: E,
  in_scope: P,
) -> Vec<UpcomingEntry>
where
  I: IntoIterator<Item = &'a LinkedScholar>,
  E: Fn(&Scholar) -> Vec<Candidate>,
  P: Fn(&LinkedScholar) -> bool,
{
  let mut entries: Vec<UpcomingEntry> = subjects
    .into_iter()
    .filter(|linked| in_scope(*linked))
    .filter_map(|linked| {
      let owner = linked.owner.as_ref()?;
      let nearest = nearest_upcoming(extract(&linked.scholar), now)?;
      Some(UpcomingEntry {
        scholar_id:   linked.scholar.scholar_id,
        record:       nearest.record,
        scheduled_at: nearest.scheduled_at,
        occurred:     false,
        scholar:      linked.scholar.summary(owner.clone()),
      })
    })
    .collect();

  entries.sort_by_key(|e| e.scheduled_at);
  entries
}
