//! Transient success/error notifications.
//!
//! There is only ever one notification. `show` replaces whatever is displayed, cancels the
//! pending auto-hide and schedules a new one; `hide` conceals it and cancels the timer. Drawing
//! is delegated to a [`NotificationSurface`].

use crate::constants::{
    DISMISS_KEY, ERROR_BACKGROUND, ERROR_ICON, SUCCESS_BACKGROUND, SUCCESS_ICON,
};
use crate::events::{FormEventHandler, Propagation};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Fixed colour/icon pairing for a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationStyle {
    pub background: &'static str,
    pub icon: &'static str,
}

impl NotificationKind {
    pub fn style(&self) -> NotificationStyle {
        match self {
            NotificationKind::Success => NotificationStyle {
                background: SUCCESS_BACKGROUND,
                icon: SUCCESS_ICON,
            },
            NotificationKind::Error => NotificationStyle {
                background: ERROR_BACKGROUND,
                icon: ERROR_ICON,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationState {
    pub message: String,
    pub kind: NotificationKind,
    pub visible: bool,
}

impl Default for NotificationState {
    fn default() -> Self {
        Self {
            message: String::new(),
            kind: NotificationKind::Success,
            visible: false,
        }
    }
}

/// Whatever actually draws the notification region.
pub trait NotificationSurface: Send + Sync {
    fn render(&self, state: &NotificationState);
    fn conceal(&self);
}

struct PresenterState {
    current: NotificationState,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

struct PresenterInner {
    surface: Arc<dyn NotificationSurface>,
    auto_hide: Duration,
    state: Mutex<PresenterState>,
}

impl PresenterInner {
    fn lock(&self) -> MutexGuard<'_, PresenterState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Hide only if nothing was shown since the timer for `generation` was armed.
    fn expire(&self, generation: u64) {
        {
            let mut state = self.lock();
            if state.generation != generation || !state.current.visible {
                return;
            }
            state.current.visible = false;
            state.pending = None;
        }
        tracing::debug!("notification auto-hidden");
        self.surface.conceal();
    }
}

#[derive(Clone)]
pub struct NotificationPresenter {
    inner: Arc<PresenterInner>,
}

impl NotificationPresenter {
    pub fn new(surface: Arc<dyn NotificationSurface>, auto_hide: Duration) -> Self {
        Self {
            inner: Arc::new(PresenterInner {
                surface,
                auto_hide,
                state: Mutex::new(PresenterState {
                    current: NotificationState::default(),
                    generation: 0,
                    pending: None,
                }),
            }),
        }
    }

    pub fn show(&self, message: impl Into<String>, kind: NotificationKind) {
        let message = message.into();
        match kind {
            NotificationKind::Success => tracing::info!(%message, "notification"),
            NotificationKind::Error => tracing::warn!(%message, "notification"),
        }

        let rendered = {
            let mut state = self.inner.lock();
            if let Some(pending) = state.pending.take() {
                pending.abort();
            }
            state.generation = state.generation.wrapping_add(1);
            state.current = NotificationState {
                message,
                kind,
                visible: true,
            };

            let generation = state.generation;
            state.pending = match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let inner = Arc::downgrade(&self.inner);
                    let delay = self.inner.auto_hide;
                    Some(handle.spawn(async move {
                        tokio::time::sleep(delay).await;
                        if let Some(inner) = inner.upgrade() {
                            inner.expire(generation);
                        }
                    }))
                }
                Err(_) => {
                    tracing::warn!("no async runtime; notification will not auto-hide");
                    None
                }
            };

            state.current.clone()
        };

        self.inner.surface.render(&rendered);
    }

    pub fn hide(&self) {
        let was_visible = {
            let mut state = self.inner.lock();
            if let Some(pending) = state.pending.take() {
                pending.abort();
            }
            state.generation = state.generation.wrapping_add(1);
            std::mem::replace(&mut state.current.visible, false)
        };

        if was_visible {
            self.inner.surface.conceal();
        }
    }

    pub fn current(&self) -> NotificationState {
        self.inner.lock().current.clone()
    }

    pub fn is_visible(&self) -> bool {
        self.inner.lock().current.visible
    }
}

impl FormEventHandler for NotificationPresenter {
    fn on_key_down(&self, key: &str) -> Propagation {
        if key == DISMISS_KEY && self.is_visible() {
            self.hide();
        }
        Propagation::Continue
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum SurfaceCall {
        Render(NotificationState),
        Conceal,
    }

    /// Surface that remembers every call it received.
    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        calls: Mutex<Vec<SurfaceCall>>,
    }

    impl RecordingSurface {
        pub(crate) fn calls(&self) -> Vec<SurfaceCall> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn rendered_messages(&self) -> Vec<(NotificationKind, String)> {
            self.calls()
                .into_iter()
                .filter_map(|call| match call {
                    SurfaceCall::Render(state) => Some((state.kind, state.message)),
                    SurfaceCall::Conceal => None,
                })
                .collect()
        }
    }

    impl NotificationSurface for RecordingSurface {
        fn render(&self, state: &NotificationState) {
            self.calls
                .lock()
                .unwrap()
                .push(SurfaceCall::Render(state.clone()));
        }

        fn conceal(&self) {
            self.calls.lock().unwrap().push(SurfaceCall::Conceal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::{RecordingSurface, SurfaceCall};
    use super::*;
    use crate::constants::NOTIFICATION_AUTO_HIDE;
    use tokio::time::sleep;

    fn presenter() -> (NotificationPresenter, Arc<RecordingSurface>) {
        let surface = Arc::new(RecordingSurface::default());
        (
            NotificationPresenter::new(surface.clone(), NOTIFICATION_AUTO_HIDE),
            surface,
        )
    }

    #[test]
    fn kinds_map_to_fixed_styles() {
        assert_eq!(NotificationKind::Success.style().icon, "fas fa-check-circle");
        assert_eq!(
            NotificationKind::Error.style().background,
            "linear-gradient(135deg, #f56565, #e53e3e)"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn auto_hides_after_five_seconds() {
        let (presenter, surface) = presenter();
        presenter.show("Form submitted successfully!", NotificationKind::Success);

        sleep(Duration::from_millis(4999)).await;
        assert!(presenter.is_visible());

        sleep(Duration::from_millis(2)).await;
        assert!(!presenter.is_visible());
        assert_eq!(surface.calls().last(), Some(&SurfaceCall::Conceal));
    }

    #[tokio::test(start_paused = true)]
    async fn show_again_restarts_the_timer() {
        let (presenter, _surface) = presenter();
        presenter.show("first", NotificationKind::Success);

        sleep(Duration::from_millis(3000)).await;
        presenter.show("second", NotificationKind::Error);

        sleep(Duration::from_millis(3000)).await;
        assert!(presenter.is_visible(), "first timer must have been cancelled");
        assert_eq!(presenter.current().message, "second");
        assert_eq!(presenter.current().kind, NotificationKind::Error);

        sleep(Duration::from_millis(2001)).await;
        assert!(!presenter.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn hide_cancels_pending_timer() {
        let (presenter, surface) = presenter();
        presenter.show("first", NotificationKind::Success);
        presenter.hide();
        assert!(!presenter.is_visible());

        sleep(Duration::from_millis(6000)).await;
        let conceals = surface
            .calls()
            .into_iter()
            .filter(|c| *c == SurfaceCall::Conceal)
            .count();
        assert_eq!(conceals, 1);
    }

    #[tokio::test]
    async fn escape_dismisses_only_when_visible() {
        let (presenter, surface) = presenter();

        presenter.on_key_down("Escape");
        assert!(surface.calls().is_empty());

        presenter.show("oops", NotificationKind::Error);
        presenter.on_key_down("Enter");
        assert!(presenter.is_visible());

        presenter.on_key_down("Escape");
        assert!(!presenter.is_visible());
    }

    #[test]
    fn show_without_runtime_still_renders() {
        let (presenter, surface) = presenter();
        presenter.show("no timers here", NotificationKind::Success);
        assert!(presenter.is_visible());
        assert_eq!(surface.rendered_messages().len(), 1);
    }
}
