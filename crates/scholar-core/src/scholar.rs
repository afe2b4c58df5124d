//! Scholar profile documents and the dated records they carry.
//!
//! A scholar document is stored whole. Every nested structure is optional so
//! that partially-initialised documents still decode; readers treat a missing
//! category as "nothing scheduled".

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result, dates, user::UserSummary};

// ─── Schedule ────────────────────────────────────────────────────────────────

/// The date-bearing core shared by meetings and milestones.
///
/// States: scheduled in the future, rescheduled (a new `scheduled_at`), or
/// occurred (terminal).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
  #[serde(default, deserialize_with = "dates::lenient")]
  pub scheduled_at: Option<DateTime<Utc>>,
  /// Absent, `null`, or anything other than `true` means "not yet".
  #[serde(default, deserialize_with = "dates::lenient_flag")]
  pub occurred:     bool,
  #[serde(default, deserialize_with = "dates::lenient")]
  pub occurred_at:  Option<DateTime<Utc>>,
}

impl Schedule {
  pub fn at(scheduled_at: DateTime<Utc>) -> Self {
    Self {
      scheduled_at: Some(scheduled_at),
      occurred:     false,
      occurred_at:  None,
    }
  }

  pub fn reschedule(&mut self, scheduled_at: DateTime<Utc>) -> Result<()> {
    if self.occurred {
      return Err(Error::AlreadyOccurred);
    }
    self.scheduled_at = Some(scheduled_at);
    Ok(())
  }

  /// Mark the record as having taken place. Idempotent on the flag; the
  /// actual date is overwritten if supplied again.
  pub fn mark_occurred(&mut self, occurred_at: DateTime<Utc>) {
    self.occurred = true;
    self.occurred_at = Some(occurred_at);
  }
}

// ─── Doctoral committee meetings ─────────────────────────────────────────────

/// A doctoral-committee (DC) meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DcMeeting {
  pub meeting_id: Uuid,
  #[serde(flatten)]
  pub schedule:   Schedule,
  #[serde(default)]
  pub agenda:     Option<String>,
  #[serde(default)]
  pub minutes:    Option<String>,
}

// ─── Milestones ──────────────────────────────────────────────────────────────

/// The fixed thesis-track milestones, in programme order.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MilestoneKind {
  CourseworkCompletion,
  SynopsisSeminar,
  PreSubmissionSeminar,
  ThesisSubmission,
  VivaVoce,
}

/// One optional schedule per [`MilestoneKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestones {
  #[serde(default)]
  pub coursework_completion:  Option<Schedule>,
  #[serde(default)]
  pub synopsis_seminar:       Option<Schedule>,
  #[serde(default)]
  pub pre_submission_seminar: Option<Schedule>,
  #[serde(default)]
  pub thesis_submission:      Option<Schedule>,
  #[serde(default)]
  pub viva_voce:              Option<Schedule>,
}

impl Milestones {
  pub fn get(&self, kind: MilestoneKind) -> Option<&Schedule> {
    match kind {
      MilestoneKind::CourseworkCompletion => self.coursework_completion.as_ref(),
      MilestoneKind::SynopsisSeminar => self.synopsis_seminar.as_ref(),
      MilestoneKind::PreSubmissionSeminar => self.pre_submission_seminar.as_ref(),
      MilestoneKind::ThesisSubmission => self.thesis_submission.as_ref(),
      MilestoneKind::VivaVoce => self.viva_voce.as_ref(),
    }
  }

  pub fn slot_mut(&mut self, kind: MilestoneKind) -> &mut Option<Schedule> {
    match kind {
      MilestoneKind::CourseworkCompletion => &mut self.coursework_completion,
      MilestoneKind::SynopsisSeminar => &mut self.synopsis_seminar,
      MilestoneKind::PreSubmissionSeminar => &mut self.pre_submission_seminar,
      MilestoneKind::ThesisSubmission => &mut self.thesis_submission,
      MilestoneKind::VivaVoce => &mut self.viva_voce,
    }
  }
}

// ─── Coursework ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
  pub code:    String,
  pub title:   String,
  pub credits: f32,
  #[serde(default)]
  pub grade:   Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coursework {
  #[serde(default)]
  pub courses: Vec<Course>,
}

// ─── Scholar ─────────────────────────────────────────────────────────────────

/// A PhD scholar's profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scholar {
  pub scholar_id:        Uuid,
  /// Owning account. May point at a deleted or missing user.
  pub user_id:           Uuid,
  #[serde(default)]
  pub supervisor_id:     Option<Uuid>,
  pub enrollment_number: String,
  pub department:        String,
  #[serde(default)]
  pub research_area:     Option<String>,
  #[serde(default)]
  pub joined_on:         Option<NaiveDate>,
  #[serde(default)]
  pub coursework:        Option<Coursework>,
  #[serde(default)]
  pub dc_meetings:       Option<Vec<DcMeeting>>,
  #[serde(default)]
  pub milestones:        Option<Milestones>,
  pub created_at:        DateTime<Utc>,
}

impl Scholar {
  pub fn meeting_mut(&mut self, meeting_id: Uuid) -> Result<&mut DcMeeting> {
    self
      .dc_meetings
      .iter_mut()
      .flatten()
      .find(|m| m.meeting_id == meeting_id)
      .ok_or(Error::MeetingNotFound(meeting_id))
  }

  /// Append a new meeting, initialising the list if needed.
  pub fn schedule_meeting(
    &mut self,
    scheduled_at: DateTime<Utc>,
    agenda: Option<String>,
  ) -> &DcMeeting {
    let meetings = self.dc_meetings.get_or_insert_with(Vec::new);
    meetings.push(DcMeeting {
      meeting_id: Uuid::new_v4(),
      schedule: Schedule::at(scheduled_at),
      agenda,
      minutes: None,
    });
    &meetings[meetings.len() - 1]
  }

  /// Schedule a milestone for the first time, or move it if it has not yet
  /// occurred.
  pub fn schedule_milestone(
    &mut self,
    kind: MilestoneKind,
    scheduled_at: DateTime<Utc>,
  ) -> Result<Schedule> {
    let slot = self
      .milestones
      .get_or_insert_with(Milestones::default)
      .slot_mut(kind);
    match slot.as_mut() {
      Some(existing) => existing.reschedule(scheduled_at)?,
      None => *slot = Some(Schedule::at(scheduled_at)),
    }
    Ok(slot.clone().unwrap_or_default())
  }

  pub fn milestone_mut(&mut self, kind: MilestoneKind) -> Result<&mut Schedule> {
    self
      .milestones
      .as_mut()
      .and_then(|m| m.slot_mut(kind).as_mut())
      .ok_or(Error::MilestoneNotScheduled(kind))
  }

  pub fn summary(&self, owner: UserSummary) -> ScholarSummary {
    ScholarSummary {
      scholar_id:        self.scholar_id,
      enrollment_number: self.enrollment_number.clone(),
      department:        self.department.clone(),
      supervisor_id:     self.supervisor_id,
      owner,
    }
  }
}

/// Input to [`crate::store::PortalStore::create_scholar`].
#[derive(Debug, Clone)]
pub struct NewScholar {
  pub user_id:           Uuid,
  pub supervisor_id:     Option<Uuid>,
  pub enrollment_number: String,
  pub department:        String,
  pub research_area:     Option<String>,
  pub joined_on:         Option<NaiveDate>,
}

/// A scholar with its owner link resolved. `owner` is `None` when the linked
/// account is missing or soft-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedScholar {
  pub scholar: Scholar,
  pub owner:   Option<UserSummary>,
}

/// Compact scholar description embedded in list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScholarSummary {
  pub scholar_id:        Uuid,
  pub enrollment_number: String,
  pub department:        String,
  pub supervisor_id:     Option<Uuid>,
  pub owner:             UserSummary,
}
