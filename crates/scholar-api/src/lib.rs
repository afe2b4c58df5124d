//! JSON REST API for the scholar portal.
//!
//! Exposes an axum [`Router`] backed by any [`PortalStore`]. Authentication
//! is the caller's responsibility: every request must carry the
//! authenticated [`Actor`](scholar_core::access::Actor) as a request
//! extension, which handlers use for role checks.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", scholar_api::api_router(store.clone()))
//! .layer(from_fn_with_state(state, require_session))
//! ```

pub mod error;
pub mod events;
pub mod password;
pub mod publications;
pub mod schedule;
pub mod scholars;
pub mod threads;
pub mod upcoming;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post, put},
};
use scholar_core::store::PortalStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: PortalStore + 'static,
{
  Router::new()
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route("/users/{id}", get(users::get_one::<S>).delete(users::remove::<S>))
    // Scholars
    .route("/scholars", get(scholars::list::<S>).post(scholars::create::<S>))
    .route("/scholars/{id}", get(scholars::get_one::<S>).put(scholars::update::<S>))
    .route("/scholars/{id}/courses", post(scholars::add_course::<S>))
    // Meetings & milestones
    .route("/scholars/{id}/meetings", post(schedule::schedule_meeting::<S>))
    .route(
      "/scholars/{id}/meetings/{meeting_id}/occurred",
      post(schedule::meeting_occurred::<S>),
    )
    .route(
      "/scholars/{id}/meetings/{meeting_id}/reschedule",
      post(schedule::reschedule_meeting::<S>),
    )
    .route("/scholars/{id}/milestones/{kind}", put(schedule::schedule_milestone::<S>))
    .route(
      "/scholars/{id}/milestones/{kind}/occurred",
      post(schedule::milestone_occurred::<S>),
    )
    .route("/upcoming/{category}", get(upcoming::handler::<S>))
    // Publications
    .route(
      "/scholars/{id}/publications",
      get(publications::list::<S>).post(publications::create::<S>),
    )
    .route("/publications/{id}", delete(publications::remove::<S>))
    // Events
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route("/events/{id}", get(events::get_one::<S>).delete(events::remove::<S>))
    .route(
      "/events/{id}/comments",
      get(events::list_comments::<S>).post(events::add_comment::<S>),
    )
    // Threads
    .route("/threads", get(threads::list::<S>).post(threads::create::<S>))
    .route("/threads/{id}", get(threads::get_one::<S>))
    .route("/threads/{id}/posts", post(threads::add_post::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
