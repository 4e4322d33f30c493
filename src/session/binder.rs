use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::connection::ServiceConnection;
use super::media_session::{MediaSession, SessionHandle};
use crate::artwork::CoverArtLoader;
use crate::config::ServiceConfig;
use crate::control::{ControlEventBus, ControlSignal};
use crate::error::TransportError;
use crate::events::{ServiceEvent, ServiceEvents};
use crate::log_context;
use crate::notification::NotificationProjector;
use crate::platform::{ActionHandler, Platform};
use crate::utils::logger::{log_event, log_session, LogContext, LogEvent, SessionPhase};
use crate::utils::sync::lock_or_recover;

/// Connection state of the single background session
enum ConnectionState {
    Idle,
    Pending(u64),
    Connected(SessionHandle),
}

enum AttachStep {
    Reuse(SessionHandle),
    Wait(u64),
    Bind {
        attempt: u64,
        /// Connected session whose notification is already gone
        stale: Option<SessionHandle>,
    },
}

pub(super) struct BinderShared {
    platform: Platform,
    config: Arc<ServiceConfig>,
    loader: Arc<CoverArtLoader>,
    bus: Arc<ControlEventBus>,
    connection: Mutex<ConnectionState>,
    next_attempt: AtomicU64,
    receiver_registered: AtomicBool,
}

/// Arbitrates the one background session and the one event listener.
///
/// The binder is the only writer of both slots. Use [`crate::session::global`]
/// for the process-wide instance; separate instances are independent.
#[derive(Clone)]
pub struct SessionBinder {
    shared: Arc<BinderShared>,
}

impl SessionBinder {
    pub fn new(platform: Platform, config: ServiceConfig) -> Self {
        let config = Arc::new(config);
        let loader = Arc::new(CoverArtLoader::new(platform.assets.clone(), &config));

        Self {
            shared: Arc::new(BinderShared {
                platform,
                config,
                loader,
                bus: Arc::new(ControlEventBus::new()),
                connection: Mutex::new(ConnectionState::Idle),
                next_attempt: AtomicU64::new(0),
                receiver_registered: AtomicBool::new(false),
            }),
        }
    }

    /// Register `listener` and make sure a session exists.
    ///
    /// With a connected session the `Binder` event is delivered before this
    /// returns. Otherwise it follows once the host reports the connection.
    /// `None` keeps the current registration.
    pub fn attach(&self, listener: Option<&Arc<dyn ServiceEvents>>) {
        let step = {
            let mut conn = self.shared.lock_connection();
            // Registered under the connection lock so a concurrent detach
            // either sees this listener or leaves it in place.
            if let Some(listener) = listener {
                self.shared.bus.replace_listener(listener);
            }

            let step = match &*conn {
                ConnectionState::Connected(session) if session.is_active() => {
                    AttachStep::Reuse(session.clone())
                }
                ConnectionState::Connected(stale) => AttachStep::Bind {
                    attempt: self.shared.new_attempt(),
                    stale: Some(stale.clone()),
                },
                ConnectionState::Pending(attempt) => AttachStep::Wait(*attempt),
                ConnectionState::Idle => AttachStep::Bind {
                    attempt: self.shared.new_attempt(),
                    stale: None,
                },
            };
            if let AttachStep::Bind { attempt, .. } = &step {
                *conn = ConnectionState::Pending(*attempt);
            }
            step
        };

        match step {
            AttachStep::Reuse(session) => {
                log_session(session.id(), SessionPhase::Reused);
                if !self.shared.bus.deliver(ServiceEvent::Binder(session)) {
                    log::debug!("Session already connected but no listener registered");
                }
            }
            AttachStep::Wait(attempt) => {
                log::debug!("Session #{} bind already in flight", attempt);
            }
            AttachStep::Bind { attempt, stale } => {
                if let Some(stale) = stale {
                    log::warn!(
                        "Session #{} lost its notification, replacing it with #{}",
                        stale.id(),
                        attempt
                    );
                    stale.shut_down();
                    self.shared.platform.host.unbind(stale.id());
                }

                log_session(attempt, SessionPhase::BindRequested);
                let connection = ServiceConnection::new(attempt, Arc::downgrade(&self.shared));
                if let Err(e) = self.shared.platform.host.bind(connection) {
                    log::warn!("Background host refused session #{}: {}", attempt, e);
                    self.shared.abandon_attempt(attempt);
                }
            }
        }
    }

    /// Tear down the session, release the host binding and stop delivering
    /// to the registered listener. A no-op without a session.
    ///
    /// Only the binding and registration current when detach started are
    /// released; an `attach` racing with the teardown keeps its own.
    pub fn detach(&self) {
        let (previous, registration) = {
            let mut conn = self.shared.lock_connection();
            let previous = std::mem::replace(&mut *conn, ConnectionState::Idle);
            (previous, self.shared.bus.generation())
        };

        let attempt = match previous {
            ConnectionState::Idle => {
                log::debug!("detach: no session bound");
                return;
            }
            ConnectionState::Pending(attempt) => {
                log_session(attempt, SessionPhase::Cancelled);
                attempt
            }
            ConnectionState::Connected(session) => {
                session.shut_down();
                log_session(session.id(), SessionPhase::Detached);
                session.id()
            }
        };

        self.shared.platform.host.unbind(attempt);
        if !self.shared.bus.clear_listener(registration) {
            log::debug!("Listener re-registered during detach, keeping it");
        }
    }

    /// Subscribe the control actions on the OS transport, once per binder.
    pub fn register_control_receiver(&self) -> Result<(), TransportError> {
        if self.shared.receiver_registered.swap(true, Ordering::SeqCst) {
            log::debug!("Control receiver already registered");
            return Ok(());
        }

        let bus = self.shared.bus.clone();
        let handler: ActionHandler = Box::new(move |action: &str| {
            match ControlSignal::from_action(action) {
                Some(signal) => bus.dispatch(signal),
                None => log::warn!("Ignoring unknown control action '{}'", action),
            }
        });

        let actions = ControlSignal::actions();
        if let Err(e) = self.shared.platform.transport.subscribe(&actions, handler) {
            self.shared.receiver_registered.store(false, Ordering::SeqCst);
            log::error!("Failed to register control receiver: {}", e);
            return Err(e);
        }

        log::info!("Control receiver registered for {:?}", actions);
        Ok(())
    }

    pub fn session(&self) -> Option<SessionHandle> {
        match &*self.shared.lock_connection() {
            ConnectionState::Connected(session) => Some(session.clone()),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.shared.lock_connection(), ConnectionState::Connected(_))
    }

    pub fn is_connecting(&self) -> bool {
        matches!(*self.shared.lock_connection(), ConnectionState::Pending(_))
    }

    /// The bus control signals are dispatched through
    pub fn control_bus(&self) -> Arc<ControlEventBus> {
        self.shared.bus.clone()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.shared.config
    }
}

impl BinderShared {
    fn lock_connection(&self) -> MutexGuard<'_, ConnectionState> {
        lock_or_recover(&self.connection, "SessionBinder")
    }

    fn new_attempt(&self) -> u64 {
        self.next_attempt.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(super) fn handle_connected(&self, attempt: u64) {
        let session = {
            let mut conn = self.lock_connection();
            match &*conn {
                ConnectionState::Pending(current) if *current == attempt => {}
                ConnectionState::Connected(existing) if existing.id() == attempt => {
                    log::debug!("Duplicate connect for session #{}", attempt);
                    return;
                }
                _ => {
                    log::debug!("Ignoring connect for cancelled session #{}", attempt);
                    return;
                }
            }

            let projector = NotificationProjector::new(
                self.platform.surface.clone(),
                self.loader.clone(),
                self.config.clone(),
            );
            match MediaSession::start(attempt, projector) {
                Ok(session) => {
                    *conn = ConnectionState::Connected(session.clone());
                    session
                }
                Err(e) => {
                    log::error!("Session #{} could not set up its notification: {}", attempt, e);
                    *conn = ConnectionState::Idle;
                    drop(conn);
                    self.platform.host.unbind(attempt);
                    return;
                }
            }
        };

        log_event(LogEvent::Session {
            id: attempt,
            phase: SessionPhase::Connected,
            context: Some(LogContext {
                fields: log_context! {
                    "channel" => session.notification().channel_id,
                    "notification_id" => session.notification().id,
                },
            }),
        });

        if !self.bus.deliver(ServiceEvent::Binder(session)) {
            log::debug!("Session #{} connected with no listener registered", attempt);
        }
    }

    pub(super) fn handle_disconnected(&self, attempt: u64) {
        let previous = {
            let mut conn = self.lock_connection();
            let current = match &*conn {
                ConnectionState::Connected(session) => session.id() == attempt,
                ConnectionState::Pending(pending) => *pending == attempt,
                ConnectionState::Idle => false,
            };
            if !current {
                log::debug!("Ignoring disconnect for stale session #{}", attempt);
                return;
            }
            std::mem::replace(&mut *conn, ConnectionState::Idle)
        };

        match previous {
            ConnectionState::Connected(session) => {
                log_session(session.id(), SessionPhase::Disconnected);
                session.shut_down();
            }
            ConnectionState::Pending(_) => {
                log::warn!("Session #{} failed to connect", attempt);
            }
            ConnectionState::Idle => {}
        }

        // The listener stays registered so a later attach can redeliver Binder.
        self.platform.host.unbind(attempt);
    }

    fn abandon_attempt(&self, attempt: u64) {
        let mut conn = self.lock_connection();
        if matches!(*conn, ConnectionState::Pending(current) if current == attempt) {
            *conn = ConnectionState::Idle;
        }
    }
}
