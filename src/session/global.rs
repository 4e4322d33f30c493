//! Process-wide session binder.
//!
//! An application process owns exactly one background media session, so the
//! binder that arbitrates it lives here rather than in ambient statics:
//!
//! 1. [`install`] once at startup with the host collaborators. Later calls
//!    return the binder that is already installed.
//! 2. [`get`], [`attach`], [`detach`], [`register_control_receiver`] from
//!    anywhere in the process.
//! 3. [`reset`] detaches and drops the installed binder. Intended for tests
//!    and for hosts that rebuild their platform bridge.

use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

use super::binder::SessionBinder;
use crate::config::ServiceConfig;
use crate::error::TransportError;
use crate::events::ServiceEvents;
use crate::platform::Platform;
use crate::utils::sync::{read_or_recover, write_or_recover};

static BINDER: Lazy<RwLock<Option<SessionBinder>>> = Lazy::new(|| RwLock::new(None));

pub fn install(platform: Platform, config: ServiceConfig) -> SessionBinder {
    let mut slot = write_or_recover(&BINDER, "global session binder");
    if let Some(existing) = slot.as_ref() {
        log::warn!("Session binder already installed, keeping the existing one");
        return existing.clone();
    }

    let binder = SessionBinder::new(platform, config);
    *slot = Some(binder.clone());
    log::info!("Session binder installed");
    binder
}

pub fn get() -> Option<SessionBinder> {
    read_or_recover(&BINDER, "global session binder").clone()
}

/// Returns false when no binder is installed.
pub fn attach(listener: Option<&Arc<dyn ServiceEvents>>) -> bool {
    match get() {
        Some(binder) => {
            binder.attach(listener);
            true
        }
        None => {
            log::warn!("attach called before a session binder was installed");
            false
        }
    }
}

pub fn detach() {
    if let Some(binder) = get() {
        binder.detach();
    }
}

pub fn register_control_receiver() -> Result<(), TransportError> {
    get()
        .ok_or(TransportError::NotInstalled)?
        .register_control_receiver()
}

pub fn reset() {
    let previous = write_or_recover(&BINDER, "global session binder").take();
    if let Some(binder) = previous {
        binder.detach();
        log::debug!("Session binder reset");
    }
}
