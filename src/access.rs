// src/access.rs

//! Who may submit prompts.
//!
//! Authentication itself happens in the transport; the relay only consumes
//! its yes/no answer before a prompt can reach the executor.

use std::collections::HashSet;

use crate::config::AccessSection;
use crate::engine::ActorId;

pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, actor: &ActorId) -> bool;
}

/// Static allow-list from `[access].allowed_actors`. An empty list lets
/// everyone in.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    actors: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(actors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            actors: actors.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows_everyone(&self) -> bool {
        self.actors.is_empty()
    }
}

impl From<&AccessSection> for AllowList {
    fn from(section: &AccessSection) -> Self {
        Self::new(section.allowed_actors.iter().cloned())
    }
}

impl Authorizer for AllowList {
    fn is_authorized(&self, actor: &ActorId) -> bool {
        self.allows_everyone() || self.actors.contains(actor.as_str())
    }
}
