// src/engine/gate.rs

//! Single-flight admission control.
//!
//! Each scope owns one slot, modelled as a one-permit semaphore. Holding the
//! slot means holding a [`GatePermit`]; the slot is released when the permit
//! is dropped, which covers normal return, error paths, panics and futures
//! that get cancelled mid-flight alike.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::engine::ActorId;
use crate::errors::{RelayError, Result};
use crate::types::GateScope;

/// Key under which every actor shares one slot in [`GateScope::Global`].
const GLOBAL_KEY: &str = "*";

#[derive(Debug)]
pub struct AdmissionGate {
    scope: GateScope,
    slots: Mutex<HashMap<String, Arc<Semaphore>>>,
}

/// Proof of holding a scope's slot. Dropping it releases the slot.
#[derive(Debug)]
pub struct GatePermit {
    key: String,
    _permit: OwnedSemaphorePermit,
}

impl GatePermit {
    /// Release the slot now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        debug!(scope = %self.key, "admission slot released");
    }
}

impl AdmissionGate {
    pub fn new(scope: GateScope) -> Self {
        Self {
            scope,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// One slot for everyone.
    pub fn global() -> Self {
        Self::new(GateScope::Global)
    }

    pub fn scope(&self) -> GateScope {
        self.scope
    }

    /// Take the slot for `actor`'s scope if it is free. Never waits.
    pub fn try_acquire(&self, actor: &ActorId) -> Option<GatePermit> {
        let (key, slot) = self.slot(actor);
        match slot.try_acquire_owned() {
            Ok(permit) => {
                debug!(scope = %key, actor = %actor, "admission slot acquired");
                Some(GatePermit {
                    key,
                    _permit: permit,
                })
            }
            Err(_) => {
                debug!(scope = %key, actor = %actor, "admission slot busy");
                None
            }
        }
    }

    /// Wait until the slot for `actor`'s scope is free, then take it.
    pub async fn acquire(&self, actor: &ActorId) -> Result<GatePermit> {
        let (key, slot) = self.slot(actor);
        let permit = slot
            .acquire_owned()
            .await
            .map_err(|_| RelayError::Runtime(format!("admission gate for '{key}' closed")))?;
        debug!(scope = %key, actor = %actor, "admission slot acquired after waiting");
        Ok(GatePermit {
            key,
            _permit: permit,
        })
    }

    /// Whether `actor`'s scope currently has an execution in flight.
    pub fn is_busy(&self, actor: &ActorId) -> bool {
        let (_, slot) = self.slot(actor);
        slot.available_permits() == 0
    }

    fn slot(&self, actor: &ActorId) -> (String, Arc<Semaphore>) {
        let key = match self.scope {
            GateScope::Global => GLOBAL_KEY.to_string(),
            GateScope::Actor => actor.as_str().to_string(),
        };
        // The map is only ever inserted into, so a poisoned lock still holds
        // a consistent map.
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone();
        (key, slot)
    }
}

impl Default for AdmissionGate {
    fn default() -> Self {
        Self::global()
    }
}
