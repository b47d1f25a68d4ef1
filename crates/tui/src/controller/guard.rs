//! Single-slot in-flight guard.
//!
//! A handler takes the slot of the resource it mutates for the whole call; a
//! second caller finds it taken and backs off with `Outcome::Busy` instead
//! of racing the first one.

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex, PoisonError},
};

use api_types::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resource {
    /// Login, register and logout.
    Session,
    /// The account list (account creation).
    Accounts,
    /// Operations on one account.
    Account(AccountId),
}

#[derive(Debug, Clone, Default)]
pub struct InFlight {
    slots: Arc<Mutex<BTreeSet<Resource>>>,
}

impl InFlight {
    pub fn try_acquire(&self, resource: Resource) -> Option<Slot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if !slots.insert(resource) {
            return None;
        }
        Some(Slot {
            slots: Arc::clone(&self.slots),
            resource,
        })
    }

    pub fn active(&self) -> BTreeSet<Resource> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Held slot; released on drop.
#[derive(Debug)]
pub struct Slot {
    slots: Arc<Mutex<BTreeSet<Resource>>>,
    resource: Resource,
}

impl Drop for Slot {
    fn drop(&mut self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.resource);
    }
}
