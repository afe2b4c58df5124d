//! Router tests against an in-memory `SqliteStore`.

use std::sync::Arc;

use axum::{
  Extension,
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode},
};
use scholar_core::{
  access::Actor,
  scholar::NewScholar,
  store::PortalStore,
  user::{NewUser, Role},
};
use scholar_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use crate::api_router;

async fn store() -> Arc<SqliteStore> {
  Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"))
}

async fn user(store: &SqliteStore, email: &str, role: Role) -> Actor {
  let u = store
    .create_user(NewUser {
      email:         email.into(),
      name:          email.into(),
      role,
      password_hash: "$argon2id$placeholder".into(),
    })
    .await
    .unwrap();
  Actor { user_id: u.user_id, role }
}

async fn scholar(
  store: &SqliteStore,
  owner: &Actor,
  supervisor: Option<&Actor>,
) -> Uuid {
  store
    .create_scholar(NewScholar {
      user_id:           owner.user_id,
      supervisor_id:     supervisor.map(|s| s.user_id),
      enrollment_number: "PHD-7".into(),
      department:        "Biology".into(),
      research_area:     None,
      joined_on:         None,
    })
    .await
    .unwrap()
    .scholar_id
}

async fn call(
  store: &Arc<SqliteStore>,
  actor: Actor,
  method: Method,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let app = api_router(store.clone()).layer(Extension(actor));
  let req = Request::builder()
    .method(method)
    .uri(uri)
    .header("content-type", "application/json");
  let req = match body {
    Some(v) => req.body(Body::from(v.to_string())).unwrap(),
    None => req.body(Body::empty()).unwrap(),
  };

  let resp = app.oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn only_admins_manage_users() {
  let s = store().await;
  let admin = user(&s, "admin@uni.edu", Role::Admin).await;
  let sch = user(&s, "sch@uni.edu", Role::Scholar).await;

  let (status, _) = call(&s, sch, Method::GET, "/users", None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let body = json!({
    "email": "  New.Person@Uni.edu ",
    "name": "New Person",
    "role": "supervisor",
    "password": "correct horse"
  });
  let (status, created) =
    call(&s, admin, Method::POST, "/users", Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["email"], "new.person@uni.edu");
  assert!(created.get("password_hash").is_none());

  let (status, _) = call(&s, admin, Method::POST, "/users", Some(body)).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let short = json!({
    "email": "x@uni.edu", "name": "X", "role": "scholar", "password": "short"
  });
  let (status, _) = call(&s, admin, Method::POST, "/users", Some(short)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleted_user_drops_out_of_listing() {
  let s = store().await;
  let admin = user(&s, "admin@uni.edu", Role::Admin).await;
  let gone = user(&s, "gone@uni.edu", Role::Scholar).await;

  let uri = format!("/users/{}", gone.user_id);
  let (status, _) = call(&s, admin, Method::DELETE, &uri, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, users) = call(&s, admin, Method::GET, "/users", None).await;
  let emails: Vec<_> = users
    .as_array()
    .unwrap()
    .iter()
    .map(|u| u["email"].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(emails, vec!["admin@uni.edu".to_owned()]);

  let self_uri = format!("/users/{}", admin.user_id);
  let (status, _) = call(&s, admin, Method::DELETE, &self_uri, None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Scholars ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn scholar_listing_is_scoped_by_role() {
  let s = store().await;
  let admin = user(&s, "admin@uni.edu", Role::Admin).await;
  let sup = user(&s, "sup@uni.edu", Role::Supervisor).await;
  let mine = user(&s, "mine@uni.edu", Role::Scholar).await;
  let other = user(&s, "other@uni.edu", Role::Scholar).await;
  let mine_id = scholar(&s, &mine, Some(&sup)).await;
  let other_id = scholar(&s, &other, None).await;

  let (_, all) = call(&s, admin, Method::GET, "/scholars", None).await;
  assert_eq!(all.as_array().unwrap().len(), 2);

  let (_, supervised) = call(&s, sup, Method::GET, "/scholars", None).await;
  let supervised = supervised.as_array().unwrap();
  assert_eq!(supervised.len(), 1);
  assert_eq!(supervised[0]["scholar"]["scholar_id"], mine_id.to_string());

  let uri = format!("/scholars/{other_id}");
  let (status, _) = call(&s, mine, Method::GET, &uri, None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = call(&s, sup, Method::GET, &uri, None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_scholar_validates_the_linked_account() {
  let s = store().await;
  let admin = user(&s, "admin@uni.edu", Role::Admin).await;
  let sup = user(&s, "sup@uni.edu", Role::Supervisor).await;
  let sch = user(&s, "sch@uni.edu", Role::Scholar).await;

  let body = |user_id: Uuid, supervisor_id: Uuid| {
    json!({
      "user_id": user_id,
      "supervisor_id": supervisor_id,
      "enrollment_number": "PHD-1",
      "department": "History"
    })
  };

  let (status, _) =
    call(&s, admin, Method::POST, "/scholars", Some(body(sup.user_id, sup.user_id)))
      .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, created) =
    call(&s, admin, Method::POST, "/scholars", Some(body(sch.user_id, sup.user_id)))
      .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["supervisor_id"], sup.user_id.to_string());

  let (status, _) =
    call(&s, admin, Method::POST, "/scholars", Some(body(sch.user_id, sup.user_id)))
      .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) =
    call(&s, sup, Method::POST, "/scholars", Some(body(sch.user_id, sup.user_id)))
      .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn supervisor_cannot_reassign_supervisor() {
  let s = store().await;
  let sup = user(&s, "sup@uni.edu", Role::Supervisor).await;
  let other_sup = user(&s, "sup2@uni.edu", Role::Supervisor).await;
  let sch = user(&s, "sch@uni.edu", Role::Scholar).await;
  let id = scholar(&s, &sch, Some(&sup)).await;
  let uri = format!("/scholars/{id}");

  let (status, updated) = call(
    &s,
    sup,
    Method::PUT,
    &uri,
    Some(json!({ "research_area": "Ecology" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["research_area"], "Ecology");

  let (status, _) = call(
    &s,
    sup,
    Method::PUT,
    &uri,
    Some(json!({ "supervisor_id": other_sup.user_id })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = call(
    &s,
    sch,
    Method::PUT,
    &uri,
    Some(json!({ "research_area": "Self-assigned" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn courses_accumulate_and_reject_duplicates() {
  let s = store().await;
  let admin = user(&s, "admin@uni.edu", Role::Admin).await;
  let sch = user(&s, "sch@uni.edu", Role::Scholar).await;
  let id = scholar(&s, &sch, None).await;
  let uri = format!("/scholars/{id}/courses");

  let course = json!({ "code": "RM-701", "title": "Research Methods", "credits": 4.0 });
  let (status, cw) = call(&s, admin, Method::POST, &uri, Some(course.clone())).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(cw["courses"].as_array().unwrap().len(), 1);

  let (status, _) = call(&s, admin, Method::POST, &uri, Some(course)).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let zero = json!({ "code": "X-1", "title": "Nothing", "credits": 0.0 });
  let (status, _) = call(&s, admin, Method::POST, &uri, Some(zero)).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Meetings, milestones, upcoming ──────────────────────────────────────────

#[tokio::test]
async fn occurred_meeting_cannot_be_rescheduled() {
  let s = store().await;
  let sup = user(&s, "sup@uni.edu", Role::Supervisor).await;
  let sch = user(&s, "sch@uni.edu", Role::Scholar).await;
  let id = scholar(&s, &sch, Some(&sup)).await;

  let (status, meeting) = call(
    &s,
    sup,
    Method::POST,
    &format!("/scholars/{id}/meetings"),
    Some(json!({ "scheduled_at": "2030-02-01T10:00:00Z", "agenda": "Progress" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let mid = meeting["meeting_id"].as_str().unwrap().to_owned();

  let (status, held) = call(
    &s,
    sup,
    Method::POST,
    &format!("/scholars/{id}/meetings/{mid}/occurred"),
    Some(json!({ "minutes": "All good" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(held["occurred"], true);
  assert_eq!(held["minutes"], "All good");

  let (status, _) = call(
    &s,
    sup,
    Method::POST,
    &format!("/scholars/{id}/meetings/{mid}/reschedule"),
    Some(json!({ "scheduled_at": "2030-03-01T10:00:00Z" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = call(
    &s,
    sup,
    Method::POST,
    &format!("/scholars/{id}/meetings/{}/occurred", Uuid::new_v4()),
    Some(json!({})),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = call(
    &s,
    sch,
    Method::POST,
    &format!("/scholars/{id}/meetings"),
    Some(json!({ "scheduled_at": "2030-02-01T10:00:00Z" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn simultaneous_meeting_requests_are_all_stored() {
  let s = store().await;
  let sup = user(&s, "sup@uni.edu", Role::Supervisor).await;
  let sch = user(&s, "sch@uni.edu", Role::Scholar).await;
  let id = scholar(&s, &sch, Some(&sup)).await;
  let uri = format!("/scholars/{id}/meetings");
  let viva_uri = format!("/scholars/{id}/milestones/viva_voce");

  let (first, second, third) = tokio::join!(
    call(
      &s,
      sup,
      Method::POST,
      &uri,
      Some(json!({ "scheduled_at": "2030-02-01T10:00:00Z" })),
    ),
    call(
      &s,
      sup,
      Method::POST,
      &uri,
      Some(json!({ "scheduled_at": "2030-03-01T10:00:00Z" })),
    ),
    call(
      &s,
      sup,
      Method::PUT,
      &viva_uri,
      Some(json!({ "scheduled_at": "2031-01-01T00:00:00Z" })),
    ),
  );
  assert_eq!(first.0, StatusCode::CREATED);
  assert_eq!(second.0, StatusCode::CREATED);
  assert_eq!(third.0, StatusCode::OK);

  let (status, stored) =
    call(&s, sup, Method::GET, &format!("/scholars/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(stored["dc_meetings"].as_array().unwrap().len(), 2);
  assert_eq!(
    stored["milestones"]["viva_voce"]["scheduled_at"],
    "2031-01-01T00:00:00Z"
  );

  let (status, _) = call(
    &s,
    sup,
    Method::POST,
    &format!("/scholars/{}/meetings", Uuid::new_v4()),
    Some(json!({ "scheduled_at": "2030-02-01T10:00:00Z" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn milestone_kind_must_be_known() {
  let s = store().await;
  let admin = user(&s, "admin@uni.edu", Role::Admin).await;
  let sch = user(&s, "sch@uni.edu", Role::Scholar).await;
  let id = scholar(&s, &sch, None).await;

  let (status, _) = call(
    &s,
    admin,
    Method::PUT,
    &format!("/scholars/{id}/milestones/graduation_party"),
    Some(json!({ "scheduled_at": "2030-01-01T00:00:00Z" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(
    &s,
    admin,
    Method::POST,
    &format!("/scholars/{id}/milestones/viva_voce/occurred"),
    Some(json!({})),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upcoming_returns_nearest_record_per_visible_scholar() {
  let s = store().await;
  let admin = user(&s, "admin@uni.edu", Role::Admin).await;
  let sup = user(&s, "sup@uni.edu", Role::Supervisor).await;
  let a = user(&s, "a@uni.edu", Role::Scholar).await;
  let b = user(&s, "b@uni.edu", Role::Scholar).await;
  let a_id = scholar(&s, &a, Some(&sup)).await;
  let b_id = scholar(&s, &b, None).await;

  for (id, at) in [
    (a_id, "2030-06-01T00:00:00Z"),
    (a_id, "2030-04-01T00:00:00Z"),
    (b_id, "2030-05-01T00:00:00Z"),
  ] {
    let (status, _) = call(
      &s,
      admin,
      Method::POST,
      &format!("/scholars/{id}/meetings"),
      Some(json!({ "scheduled_at": at })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
  }
  let (status, _) = call(
    &s,
    admin,
    Method::PUT,
    &format!("/scholars/{b_id}/milestones/synopsis_seminar"),
    Some(json!({ "scheduled_at": "2030-03-01T00:00:00Z" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let now = "2030-01-01T00:00:00Z";
  let (status, meetings) =
    call(&s, admin, Method::GET, &format!("/upcoming/meetings?now={now}"), None)
      .await;
  assert_eq!(status, StatusCode::OK);
  let meetings = meetings.as_array().unwrap();
  assert_eq!(meetings.len(), 2);
  assert_eq!(meetings[0]["scholar_id"], a_id.to_string());
  assert_eq!(meetings[0]["scheduled_at"], "2030-04-01T00:00:00Z");
  assert_eq!(meetings[0]["record"]["kind"], "meeting");
  assert_eq!(meetings[1]["scholar_id"], b_id.to_string());
  assert_eq!(meetings[1]["scholar"]["owner"]["email"], "b@uni.edu");

  let (_, all) =
    call(&s, admin, Method::GET, &format!("/upcoming/all?now={now}"), None).await;
  let all = all.as_array().unwrap();
  assert_eq!(all[0]["scholar_id"], b_id.to_string());
  assert_eq!(all[0]["record"], json!({ "kind": "milestone", "id": "synopsis_seminar" }));

  let (_, scoped) =
    call(&s, sup, Method::GET, &format!("/upcoming/all?now={now}"), None).await;
  assert_eq!(scoped.as_array().unwrap().len(), 1);

  let (_, later) = call(
    &s,
    admin,
    Method::GET,
    "/upcoming/meetings?now=2031-01-01T00:00:00Z",
    None,
  )
  .await;
  assert_eq!(later, json!([]));

  let (status, _) =
    call(&s, admin, Method::GET, "/upcoming/seminars", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Publications ────────────────────────────────────────────────────────────

#[tokio::test]
async fn scholars_contribute_their_own_publications() {
  let s = store().await;
  let owner = user(&s, "owner@uni.edu", Role::Scholar).await;
  let stranger = user(&s, "stranger@uni.edu", Role::Scholar).await;
  let id = scholar(&s, &owner, None).await;
  let uri = format!("/scholars/{id}/publications");

  let body = json!({
    "title": "On Graphs",
    "authors": ["Owner", "Coauthor"],
    "venue": "J. Graph Theory",
    "year": 2024
  });
  let (status, _) = call(&s, stranger, Method::POST, &uri, Some(body.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, created) = call(&s, owner, Method::POST, &uri, Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["kind"], "journal");

  let (_, list) = call(&s, owner, Method::GET, &uri, None).await;
  assert_eq!(list.as_array().unwrap().len(), 1);

  let pid = created["publication_id"].as_str().unwrap();
  let del = format!("/publications/{pid}");
  let (status, _) = call(&s, stranger, Method::DELETE, &del, None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = call(&s, owner, Method::DELETE, &del, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
}

// ─── Events & threads ────────────────────────────────────────────────────────

#[tokio::test]
async fn event_lifecycle_respects_roles() {
  let s = store().await;
  let sup = user(&s, "sup@uni.edu", Role::Supervisor).await;
  let other_sup = user(&s, "sup2@uni.edu", Role::Supervisor).await;
  let sch = user(&s, "sch@uni.edu", Role::Scholar).await;

  let body = json!({
    "title": "Colloquium",
    "description": "Monthly talk",
    "starts_at": "2099-09-01T15:00:00Z"
  });
  let (status, _) = call(&s, sch, Method::POST, "/events", Some(body.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, event) = call(&s, sup, Method::POST, "/events", Some(body)).await;
  assert_eq!(status, StatusCode::CREATED);
  let eid = event["event_id"].as_str().unwrap().to_owned();

  let (status, _) = call(
    &s,
    sch,
    Method::POST,
    &format!("/events/{eid}/comments"),
    Some(json!({ "body": "Will attend" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (_, detail) = call(&s, sch, Method::GET, &format!("/events/{eid}"), None).await;
  assert_eq!(detail["title"], "Colloquium");
  assert_eq!(detail["comments"][0]["body"], "Will attend");

  let (_, upcoming) = call(&s, sch, Method::GET, "/events?upcoming=true", None).await;
  assert_eq!(upcoming.as_array().unwrap().len(), 1);

  let (status, _) =
    call(&s, other_sup, Method::DELETE, &format!("/events/{eid}"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = call(&s, sup, Method::DELETE, &format!("/events/{eid}"), None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = call(&s, sup, Method::GET, &format!("/events/{eid}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn thread_starts_with_its_opening_post() {
  let s = store().await;
  let a = user(&s, "a@uni.edu", Role::Scholar).await;
  let b = user(&s, "b@uni.edu", Role::Supervisor).await;

  let (status, created) = call(
    &s,
    a,
    Method::POST,
    "/threads",
    Some(json!({ "title": "LaTeX templates", "body": "Which one?" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  let tid = created["thread"]["thread_id"].as_str().unwrap().to_owned();

  let (status, _) = call(
    &s,
    b,
    Method::POST,
    &format!("/threads/{tid}/posts"),
    Some(json!({ "body": "The department one." })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (_, detail) = call(&s, a, Method::GET, &format!("/threads/{tid}"), None).await;
  let posts = detail["posts"].as_array().unwrap();
  assert_eq!(posts.len(), 2);
  assert_eq!(posts[1]["author_id"], b.user_id.to_string());

  let (status, _) = call(
    &s,
    a,
    Method::POST,
    "/threads",
    Some(json!({ "title": " ", "body": "x" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}
