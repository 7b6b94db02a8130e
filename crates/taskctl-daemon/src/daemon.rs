//! Process-wide daemon state machine.
//!
//! OS signal handlers only store a requested [`DaemonState`] into a static
//! atomic. The main loop calls [`Daemon::poll`], which resolves transient
//! requests and runs the bound hooks outside of signal context.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::context::LifecycleContext;
use crate::hook::HookOutcome;

/// Daemon lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DaemonState {
    /// Initial state, before `start_all`.
    Start = 0,
    Running = 1,
    /// Reload requested, resolved by the next poll.
    Reload = 2,
    /// Terminal until an explicit `start_all`.
    Stop = 3,
    /// User signal 1 requested, resolved by the next poll.
    User1 = 4,
    /// User signal 2 requested, resolved by the next poll.
    User2 = 5,
}

impl DaemonState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => DaemonState::Start,
            1 => DaemonState::Running,
            2 => DaemonState::Reload,
            4 => DaemonState::User1,
            5 => DaemonState::User2,
            _ => DaemonState::Stop,
        }
    }

    /// Whether this state is a pending request that `poll` resolves.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            DaemonState::Reload | DaemonState::User1 | DaemonState::User2
        )
    }
}

impl fmt::Display for DaemonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonState::Start => write!(f, "start"),
            DaemonState::Running => write!(f, "running"),
            DaemonState::Reload => write!(f, "reload"),
            DaemonState::Stop => write!(f, "stop"),
            DaemonState::User1 => write!(f, "user1"),
            DaemonState::User2 => write!(f, "user2"),
        }
    }
}

/// A bound lifecycle callback.
pub type Hook = Arc<dyn Fn() -> HookOutcome + Send + Sync>;

#[derive(Default)]
struct CallbackSlots {
    before_start: Option<Hook>,
    before_reload: Option<Hook>,
    on_user1: Option<Hook>,
    on_user2: Option<Hook>,
    before_close: Option<Hook>,
}

/// State word written by the OS signal handlers.
///
/// Lives outside the lazily created [`Daemon`] so a signal arriving during
/// initialization never touches an unfinished value.
static SIGNAL_STATE: AtomicU8 = AtomicU8::new(DaemonState::Start as u8);

static INSTANCE: Lazy<Daemon> = Lazy::new(|| Daemon::with_state(&SIGNAL_STATE));

/// Store a request unless the state word is already `Stop`.
///
/// Only touches the atomic, so it is safe to call from a signal handler.
fn request_on(state: &AtomicU8, requested: DaemonState) -> bool {
    state
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
            (current != DaemonState::Stop as u8).then_some(requested as u8)
        })
        .is_ok()
}

/// Entry point for the installed signal handlers.
pub(crate) fn request_from_signal(requested: DaemonState) {
    request_on(&SIGNAL_STATE, requested);
}

/// Lifecycle state machine with optional hooks.
///
/// Exactly one instance is wired to OS signals: [`Daemon::instance`].
pub struct Daemon {
    state: &'static AtomicU8,
    hooks: Mutex<CallbackSlots>,
}

impl Daemon {
    /// The process-wide daemon.
    pub fn instance() -> &'static Daemon {
        &INSTANCE
    }

    /// A daemon with its own state word, not reachable from signal handlers.
    ///
    /// The state word is leaked, so this is meant for tests and tools that
    /// create a handful of instances.
    pub fn detached() -> Self {
        let state: &'static AtomicU8 =
            Box::leak(Box::new(AtomicU8::new(DaemonState::Start as u8)));
        Self::with_state(state)
    }

    fn with_state(state: &'static AtomicU8) -> Self {
        Self {
            state,
            hooks: Mutex::new(CallbackSlots::default()),
        }
    }

    /// Current state as last stored.
    pub fn state(&self) -> DaemonState {
        DaemonState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Overwrite the state unconditionally.
    pub fn set_state(&self, state: DaemonState) {
        debug!("Daemon state set to {}", state);
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Request a state change the way a signal does.
    ///
    /// Ignored once the daemon is stopped; returns whether it was accepted.
    pub fn request(&self, state: DaemonState) -> bool {
        request_on(self.state, state)
    }

    /// Request a reload. Lock-free and allocation-free.
    pub fn reload_request(&self) {
        self.request(DaemonState::Reload);
    }

    /// Whether the state is currently `Running`. Does not dispatch anything.
    pub fn is_running(&self) -> bool {
        self.state() == DaemonState::Running
    }

    /// Enter `Running` and run the before-start hook.
    pub fn start_all(&self) -> HookOutcome {
        self.state.store(DaemonState::Running as u8, Ordering::SeqCst);
        let outcome = invoke(self.hook(|slots| &slots.before_start));
        info!("Daemon started (start hook: {})", outcome);
        outcome
    }

    /// Resolve a pending request and report whether the daemon keeps running.
    ///
    /// A pending reload/user request is reset to `Running` before its hook
    /// runs; a hook reporting failure moves the daemon to `Stop`. A request
    /// that arrives while the hook runs stays pending for the next call.
    pub fn poll(&self) -> bool {
        let current = self.state();
        if current.is_transient() {
            self.dispatch(current);
        }

        let resolved = self.state();
        resolved == DaemonState::Running || resolved.is_transient()
    }

    fn dispatch(&self, request: DaemonState) {
        if self
            .state
            .compare_exchange(
                request as u8,
                DaemonState::Running as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            // Superseded by a newer request; the next poll handles it.
            return;
        }

        let hook = self.hook(|slots| match request {
            DaemonState::Reload => &slots.before_reload,
            DaemonState::User1 => &slots.on_user1,
            _ => &slots.on_user2,
        });
        let outcome = invoke(hook);

        if outcome.is_failed() {
            self.state.store(DaemonState::Stop as u8, Ordering::SeqCst);
            warn!("{} hook failed, daemon stopping", request);
        } else {
            info!("Handled {} request (hook: {})", request, outcome);
        }
    }

    /// Enter `Stop` and run the before-close hook.
    pub fn close_all(&self) -> HookOutcome {
        self.state.store(DaemonState::Stop as u8, Ordering::SeqCst);
        let outcome = invoke(self.hook(|slots| &slots.before_close));
        info!("Daemon closed (close hook: {})", outcome);
        outcome
    }

    /// Bind the hook run by `start_all`.
    pub fn set_start_hook<F>(&self, hook: F)
    where
        F: Fn() -> HookOutcome + Send + Sync + 'static,
    {
        self.hooks.lock().before_start = Some(Arc::new(hook));
    }

    /// Bind the hook dispatched for a reload request.
    pub fn set_reload_hook<F>(&self, hook: F)
    where
        F: Fn() -> HookOutcome + Send + Sync + 'static,
    {
        self.hooks.lock().before_reload = Some(Arc::new(hook));
    }

    /// Bind the hook dispatched for a user-signal-1 request.
    pub fn set_user1_hook<F>(&self, hook: F)
    where
        F: Fn() -> HookOutcome + Send + Sync + 'static,
    {
        self.hooks.lock().on_user1 = Some(Arc::new(hook));
    }

    /// Bind the hook dispatched for a user-signal-2 request.
    pub fn set_user2_hook<F>(&self, hook: F)
    where
        F: Fn() -> HookOutcome + Send + Sync + 'static,
    {
        self.hooks.lock().on_user2 = Some(Arc::new(hook));
    }

    /// Bind the hook run by `close_all`.
    pub fn set_close_hook<F>(&self, hook: F)
    where
        F: Fn() -> HookOutcome + Send + Sync + 'static,
    {
        self.hooks.lock().before_close = Some(Arc::new(hook));
    }

    /// Drop every bound hook.
    pub fn clear_hooks(&self) {
        *self.hooks.lock() = CallbackSlots::default();
    }

    /// Bind all five hooks to a lifecycle context.
    ///
    /// Start goes to `start`, reload to `reconfigure`, the user signals to
    /// `on_signal_1`/`on_signal_2` and close to `shutdown`.
    pub fn bind_context(&self, ctx: Arc<dyn LifecycleContext>) {
        let mut slots = self.hooks.lock();

        let c = Arc::clone(&ctx);
        slots.before_start = Some(Arc::new(move || c.start()));
        let c = Arc::clone(&ctx);
        slots.before_reload = Some(Arc::new(move || c.reconfigure()));
        let c = Arc::clone(&ctx);
        slots.on_user1 = Some(Arc::new(move || c.on_signal_1()));
        let c = Arc::clone(&ctx);
        slots.on_user2 = Some(Arc::new(move || c.on_signal_2()));
        slots.before_close = Some(Arc::new(move || ctx.shutdown()));

        debug!("Lifecycle context bound to daemon hooks");
    }

    /// Clone a hook out so it runs without the slot lock held.
    fn hook(&self, select: impl FnOnce(&CallbackSlots) -> &Option<Hook>) -> Option<Hook> {
        let slots = self.hooks.lock();
        select(&slots).clone()
    }
}

fn invoke(hook: Option<Hook>) -> HookOutcome {
    hook.map_or(HookOutcome::Unset, |h| h())
}

impl fmt::Debug for Daemon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.hooks.lock();
        f.debug_struct("Daemon")
            .field("state", &self.state())
            .field("before_start", &slots.before_start.is_some())
            .field("before_reload", &slots.before_reload.is_some())
            .field("on_user1", &slots.on_user1.is_some())
            .field("on_user2", &slots.on_user2.is_some())
            .field("before_close", &slots.before_close.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
