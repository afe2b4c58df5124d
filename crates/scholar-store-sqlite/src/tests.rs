//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, TimeZone, Utc};
use scholar_core::{
  document::Document,
  forum::NewEvent,
  publication::{NewPublication, PublicationKind},
  scholar::{MilestoneKind, NewScholar},
  session::{PasswordReset, Session},
  store::PortalStore,
  upcoming::{Category, find_nearest_upcoming},
  user::{NewUser, Role},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(email: &str, role: Role) -> NewUser {
  NewUser {
    email:         email.into(),
    name:          email.split('@').next().unwrap_or(email).into(),
    role,
    password_hash: "$argon2id$placeholder".into(),
  }
}

fn new_scholar(user_id: Uuid, supervisor_id: Option<Uuid>) -> NewScholar {
  NewScholar {
    user_id,
    supervisor_id,
    enrollment_number: "PHD-2024-001".into(),
    department:        "Computer Science".into(),
    research_area:     Some("Distributed systems".into()),
    joined_on:         None,
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_user() {
  let s = store().await;

  let user = s.create_user(new_user("ada@uni.edu", Role::Supervisor)).await.unwrap();
  let fetched = s.get_user(user.user_id).await.unwrap().unwrap();
  assert_eq!(fetched.email, "ada@uni.edu");
  assert_eq!(fetched.role, Role::Supervisor);
  assert_eq!(fetched.password_hash, "$argon2id$placeholder");
  assert!(fetched.is_active());

  let by_email = s.find_user_by_email("ada@uni.edu").await.unwrap().unwrap();
  assert_eq!(by_email.user_id, user.user_id);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  s.create_user(new_user("dup@uni.edu", Role::Scholar)).await.unwrap();
  let err = s.create_user(new_user("dup@uni.edu", Role::Admin)).await;
  assert!(matches!(err, Err(crate::Error::Database(_))));
}

#[tokio::test]
async fn list_users_skips_deleted_and_filters_role() {
  let s = store().await;
  s.create_user(new_user("a@uni.edu", Role::Scholar)).await.unwrap();
  let b = s.create_user(new_user("b@uni.edu", Role::Scholar)).await.unwrap();
  s.create_user(new_user("c@uni.edu", Role::Admin)).await.unwrap();

  assert!(s.soft_delete_user(b.user_id).await.unwrap());
  assert!(!s.soft_delete_user(b.user_id).await.unwrap());

  let all = s.list_users(None).await.unwrap();
  assert_eq!(all.len(), 2);
  let scholars = s.list_users(Some(Role::Scholar)).await.unwrap();
  assert_eq!(scholars.len(), 1);
  assert_eq!(scholars[0].email, "a@uni.edu");

  let deleted = s.get_user(b.user_id).await.unwrap().unwrap();
  assert!(!deleted.is_active());
}

#[tokio::test]
async fn set_password_hash_for_missing_user_errors() {
  let s = store().await;
  let err = s.set_password_hash(Uuid::new_v4(), "x".into()).await.unwrap_err();
  assert!(matches!(err, crate::Error::UserNotFound(_)));
}

// ─── Sessions & resets ───────────────────────────────────────────────────────

#[tokio::test]
async fn sessions_roundtrip_and_revoke() {
  let s = store().await;
  let user = s.create_user(new_user("s@uni.edu", Role::Scholar)).await.unwrap();
  let now = Utc::now();

  for hash in ["h1", "h2"] {
    s.create_session(Session {
      token_hash: hash.into(),
      user_id:    user.user_id,
      created_at: now,
      expires_at: now + Duration::hours(1),
    })
    .await
    .unwrap();
  }

  let got = s.get_session("h1").await.unwrap().unwrap();
  assert_eq!(got.user_id, user.user_id);

  s.delete_session("h1").await.unwrap();
  assert!(s.get_session("h1").await.unwrap().is_none());
  assert!(s.get_session("h2").await.unwrap().is_some());

  s.delete_user_sessions(user.user_id).await.unwrap();
  assert!(s.get_session("h2").await.unwrap().is_none());
}

#[tokio::test]
async fn reset_token_redeems_once() {
  let s = store().await;
  let user = s.create_user(new_user("r@uni.edu", Role::Scholar)).await.unwrap();
  let now = Utc::now();

  s.create_password_reset(PasswordReset {
    token_hash: "reset".into(),
    user_id:    user.user_id,
    created_at: now,
    expires_at: now + Duration::minutes(30),
    used_at:    None,
  })
  .await
  .unwrap();

  let first = s.redeem_password_reset("reset", now).await.unwrap().unwrap();
  assert_eq!(first.user_id, user.user_id);
  assert!(first.used_at.is_some());

  assert!(s.redeem_password_reset("reset", now).await.unwrap().is_none());
  assert!(s.redeem_password_reset("unknown", now).await.unwrap().is_none());
}

#[tokio::test]
async fn expired_reset_token_is_not_redeemable() {
  let s = store().await;
  let user = s.create_user(new_user("e@uni.edu", Role::Scholar)).await.unwrap();
  let issued = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

  s.create_password_reset(PasswordReset {
    token_hash: "old".into(),
    user_id:    user.user_id,
    created_at: issued,
    expires_at: issued + Duration::minutes(30),
    used_at:    None,
  })
  .await
  .unwrap();

  let later = issued + Duration::hours(2);
  assert!(s.redeem_password_reset("old", later).await.unwrap().is_none());
}

// ─── Scholars ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scholar_document_roundtrip() {
  let s = store().await;
  let owner = s.create_user(new_user("phd@uni.edu", Role::Scholar)).await.unwrap();

  let scholar = s.create_scholar(new_scholar(owner.user_id, None)).await.unwrap();
  let at = Utc.with_ymd_and_hms(2031, 2, 1, 10, 0, 0).unwrap();
  let edited = s
    .update_scholar(scholar.scholar_id, move |sch| {
      sch.schedule_meeting(at, Some("Progress review".into()));
      sch.schedule_milestone(MilestoneKind::ThesisSubmission, at)?;
      Ok::<_, scholar_core::Error>(sch.clone())
    })
    .await
    .unwrap()
    .unwrap()
    .unwrap();

  let fetched = s.get_scholar(scholar.scholar_id).await.unwrap().unwrap();
  assert_eq!(fetched, edited);
  assert_eq!(fetched.dc_meetings.as_ref().map(Vec::len), Some(1));

  let by_user = s.find_scholar_by_user(owner.user_id).await.unwrap().unwrap();
  assert_eq!(by_user.scholar_id, scholar.scholar_id);
}

#[tokio::test]
async fn update_missing_scholar_is_none() {
  let s = store().await;
  let outcome = s
    .update_scholar(Uuid::new_v4(), |_| Ok::<_, scholar_core::Error>(()))
    .await
    .unwrap();
  assert!(outcome.is_none());
}

#[tokio::test]
async fn failed_edit_writes_nothing() {
  let s = store().await;
  let owner = s.create_user(new_user("x@uni.edu", Role::Scholar)).await.unwrap();
  let scholar = s.create_scholar(new_scholar(owner.user_id, None)).await.unwrap();

  let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
  let outcome = s
    .update_scholar(scholar.scholar_id, move |sch| {
      sch.schedule_meeting(at, None);
      sch.milestone_mut(MilestoneKind::VivaVoce).map(|_| ())
    })
    .await
    .unwrap()
    .unwrap();
  assert!(matches!(
    outcome,
    Err(scholar_core::Error::MilestoneNotScheduled(MilestoneKind::VivaVoce))
  ));

  let fetched = s.get_scholar(scholar.scholar_id).await.unwrap().unwrap();
  assert_eq!(fetched.dc_meetings, None);
}

#[tokio::test]
async fn concurrent_edits_are_all_kept() {
  let s = store().await;
  let owner = s.create_user(new_user("busy@uni.edu", Role::Scholar)).await.unwrap();
  let scholar = s.create_scholar(new_scholar(owner.user_id, None)).await.unwrap();
  let id = scholar.scholar_id;

  let tasks: Vec<_> = (1..=8)
    .map(|day| {
      let s = s.clone();
      tokio::spawn(async move {
        let at = Utc.with_ymd_and_hms(2030, 1, day, 0, 0, 0).unwrap();
        s.update_scholar(id, move |sch| {
          Ok::<_, scholar_core::Error>(sch.schedule_meeting(at, None).meeting_id)
        })
        .await
      })
    })
    .collect();
  for task in tasks {
    task.await.unwrap().unwrap().unwrap().unwrap();
  }

  let fetched = s.get_scholar(id).await.unwrap().unwrap();
  assert_eq!(fetched.dc_meetings.map(|m| m.len()), Some(8));
}

#[tokio::test]
async fn linked_scholars_resolve_soft_deleted_owner_to_none() {
  let s = store().await;
  let live = s.create_user(new_user("live@uni.edu", Role::Scholar)).await.unwrap();
  let gone = s.create_user(new_user("gone@uni.edu", Role::Scholar)).await.unwrap();
  s.create_scholar(new_scholar(live.user_id, None)).await.unwrap();
  s.create_scholar(new_scholar(gone.user_id, None)).await.unwrap();
  s.create_scholar(new_scholar(Uuid::new_v4(), None)).await.unwrap();
  s.soft_delete_user(gone.user_id).await.unwrap();

  let linked = s.list_linked_scholars().await.unwrap();
  assert_eq!(linked.len(), 3);
  assert_eq!(
    linked[0].owner.as_ref().map(|o| o.user_id),
    Some(live.user_id)
  );
  assert!(linked[1].owner.is_none());
  assert!(linked[2].owner.is_none());
}

#[tokio::test]
async fn upcoming_over_stored_snapshot() {
  let s = store().await;
  let now = Utc.with_ymd_and_hms(2029, 1, 1, 0, 0, 0).unwrap();

  let mut expected = Vec::new();
  for (email, month) in [("late@uni.edu", 9), ("early@uni.edu", 3)] {
    let user = s.create_user(new_user(email, Role::Scholar)).await.unwrap();
    let scholar = s.create_scholar(new_scholar(user.user_id, None)).await.unwrap();
    let at = Utc.with_ymd_and_hms(2029, month, 1, 0, 0, 0).unwrap();
    s.update_scholar(scholar.scholar_id, move |sch| {
      sch.schedule_meeting(at, None);
      Ok::<_, scholar_core::Error>(())
    })
    .await
    .unwrap()
    .unwrap()
    .unwrap();
    expected.push(scholar.scholar_id);
  }
  expected.reverse();

  let snapshot = s.list_linked_scholars().await.unwrap();
  let entries = find_nearest_upcoming(
    &snapshot,
    now,
    |sch| Category::Meetings.extract(sch),
    |_| true,
  );
  let ids: Vec<_> = entries.iter().map(|e| e.scholar_id).collect();
  assert_eq!(ids, expected);
}

// ─── Publications ────────────────────────────────────────────────────────────

#[tokio::test]
async fn publications_list_newest_year_first() {
  let s = store().await;
  let owner = s.create_user(new_user("pub@uni.edu", Role::Scholar)).await.unwrap();
  let scholar = s.create_scholar(new_scholar(owner.user_id, None)).await.unwrap();

  for year in [2021, 2024, 2022] {
    s.add_publication(NewPublication {
      scholar_id: scholar.scholar_id,
      title:      format!("Paper {year}"),
      authors:    vec!["A. Scholar".into()],
      venue:      "Journal of Things".into(),
      year,
      kind:       PublicationKind::Journal,
      doi:        None,
    })
    .await
    .unwrap();
  }

  let pubs = s.list_publications(scholar.scholar_id).await.unwrap();
  let years: Vec<_> = pubs.iter().map(|p| p.year).collect();
  assert_eq!(years, [2024, 2022, 2021]);

  assert!(s.delete_publication(pubs[0].publication_id).await.unwrap());
  assert!(s.get_publication(pubs[0].publication_id).await.unwrap().is_none());
}

// ─── Events & threads ────────────────────────────────────────────────────────

#[tokio::test]
async fn events_filter_and_cascade_comments() {
  let s = store().await;
  let admin = s.create_user(new_user("admin@uni.edu", Role::Admin)).await.unwrap();
  let base = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();

  let past = s
    .create_event(NewEvent {
      title:       "Orientation".into(),
      description: "Welcome".into(),
      starts_at:   base - Duration::days(10),
      location:    None,
      created_by:  admin.user_id,
    })
    .await
    .unwrap();
  let future = s
    .create_event(NewEvent {
      title:       "Colloquium".into(),
      description: "Talks".into(),
      starts_at:   base + Duration::days(10),
      location:    Some("Hall B".into()),
      created_by:  admin.user_id,
    })
    .await
    .unwrap();

  let upcoming = s.list_events(Some(base)).await.unwrap();
  assert_eq!(upcoming.len(), 1);
  assert_eq!(upcoming[0].event_id, future.event_id);
  assert_eq!(s.list_events(None).await.unwrap()[0].event_id, past.event_id);

  s.add_comment(future.event_id, admin.user_id, "first".into()).await.unwrap();
  s.add_comment(future.event_id, admin.user_id, "second".into()).await.unwrap();
  let comments = s.list_comments(future.event_id).await.unwrap();
  assert_eq!(
    comments.iter().map(|c| c.body.as_str()).collect::<Vec<_>>(),
    ["first", "second"]
  );

  assert!(s.delete_event(future.event_id).await.unwrap());
  assert!(s.list_comments(future.event_id).await.unwrap().is_empty());
  assert!(!s.delete_event(future.event_id).await.unwrap());
}

#[tokio::test]
async fn threads_and_posts() {
  let s = store().await;
  let user = s.create_user(new_user("t@uni.edu", Role::Scholar)).await.unwrap();

  let first = s.create_thread("Lab access".into(), user.user_id).await.unwrap();
  let second = s.create_thread("Thesis template".into(), user.user_id).await.unwrap();

  let threads = s.list_threads().await.unwrap();
  assert_eq!(threads[0].thread_id, second.thread_id);
  assert_eq!(threads[1].thread_id, first.thread_id);

  s.add_post(first.thread_id, user.user_id, "Who has the key?".into()).await.unwrap();
  s.add_post(first.thread_id, user.user_id, "Found it.".into()).await.unwrap();
  let posts = s.list_posts(first.thread_id).await.unwrap();
  assert_eq!(posts.len(), 2);
  assert_eq!(posts[1].body, "Found it.");
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn documents_count_shared_hashes() {
  let s = store().await;
  let owner = s.create_user(new_user("doc@uni.edu", Role::Scholar)).await.unwrap();
  let scholar = s.create_scholar(new_scholar(owner.user_id, None)).await.unwrap();

  let make = |name: &str| Document {
    document_id:  Uuid::new_v4(),
    scholar_id:   scholar.scholar_id,
    file_name:    name.into(),
    media_type:   "application/pdf".into(),
    content_hash: "abc123".into(),
    size:         42,
    uploaded_by:  owner.user_id,
    uploaded_at:  Utc::now(),
  };
  let a = make("synopsis.pdf");
  let b = make("synopsis-copy.pdf");
  s.add_document(a.clone()).await.unwrap();
  s.add_document(b.clone()).await.unwrap();

  assert_eq!(s.count_documents_with_hash("abc123").await.unwrap(), 2);
  assert_eq!(s.list_documents(scholar.scholar_id).await.unwrap().len(), 2);

  assert!(s.delete_document(a.document_id).await.unwrap());
  assert_eq!(s.count_documents_with_hash("abc123").await.unwrap(), 1);
  assert_eq!(s.get_document(b.document_id).await.unwrap(), Some(b));
}
