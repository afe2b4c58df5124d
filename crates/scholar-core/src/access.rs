//! Role-based access rules.
//!
//! Handlers receive the authenticated [`Actor`] and ask these functions before
//! touching a resource. The rules are deliberately flat: admins can do
//! anything, supervisors manage the scholars assigned to them, and scholars
//! can read their own record and contribute publications and documents to it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  forum::Event,
  scholar::{LinkedScholar, Scholar},
  user::Role,
};

/// The authenticated principal behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub user_id: Uuid,
  pub role:    Role,
}

impl Actor {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }

  /// The set of scholars this actor may see in list views.
  pub fn scope(&self) -> Scope {
    match self.role {
      Role::Admin => Scope::All,
      Role::Supervisor => Scope::SupervisedBy(self.user_id),
      Role::Scholar => Scope::OwnedBy(self.user_id),
    }
  }
}

/// Which scholars a list view covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  All,
  SupervisedBy(Uuid),
  OwnedBy(Uuid),
}

impl Scope {
  pub fn admits(&self, scholar: &Scholar) -> bool {
    match self {
      Self::All => true,
      Self::SupervisedBy(id) => scholar.supervisor_id == Some(*id),
      Self::OwnedBy(id) => scholar.user_id == *id,
    }
  }

  pub fn admits_linked(&self, linked: &LinkedScholar) -> bool {
    self.admits(&linked.scholar)
  }
}

pub fn can_view_scholar(actor: &Actor, scholar: &Scholar) -> bool {
  actor.is_admin()
    || scholar.supervisor_id == Some(actor.user_id)
    || scholar.user_id == actor.user_id
}

/// Edit the profile, schedule meetings and milestones.
pub fn can_manage_scholar(actor: &Actor, scholar: &Scholar) -> bool {
  actor.is_admin()
    || (actor.role == Role::Supervisor
      && scholar.supervisor_id == Some(actor.user_id))
}

/// Add publications and upload documents.
pub fn can_contribute(actor: &Actor, scholar: &Scholar) -> bool {
  can_manage_scholar(actor, scholar) || scholar.user_id == actor.user_id
}

pub fn can_create_event(actor: &Actor) -> bool {
  matches!(actor.role, Role::Admin | Role::Supervisor)
}

pub fn can_delete_event(actor: &Actor, event: &Event) -> bool {
  actor.is_admin() || event.created_by == actor.user_id
}
