//! Navigation boundary.
//!
//! # Design
//! Screens and their parameters are a closed set, so routes are an enum
//! rather than a screen name plus an untyped params bag. Focus is published
//! per screen on a `watch` channel; controllers subscribe through
//! `drive_focus` and never learn how navigation is rendered.
//!
//! A `watch` receiver only sees the latest value, so a blur followed by a
//! refocus it has not read yet would look like nothing happened. `Focus`
//! therefore carries a visit counter that grows on every focus-in, and
//! `drive_focus` replays the missed blur when the counter jumps.
//!
//! `StackNavigator` is a headless stack with native-stack semantics and is
//! what tests and non-UI hosts use. A UI shell implements `Navigator` itself
//! and forwards to its own router.

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use crate::controller::form::FormMode;
use crate::types::PostId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Home,
    Detail,
    PostForm,
}

impl Screen {
    pub const ALL: [Screen; 3] = [Screen::Home, Screen::Detail, Screen::PostForm];

    pub fn name(&self) -> &'static str {
        match self {
            Screen::Home => "HomeScreen",
            Screen::Detail => "DetailScreen",
            Screen::PostForm => "PostActionScreen",
        }
    }

    fn index(&self) -> usize {
        match self {
            Screen::Home => 0,
            Screen::Detail => 1,
            Screen::PostForm => 2,
        }
    }
}

/// A screen together with the parameters it is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Detail(PostId),
    PostForm(FormMode),
}

impl Route {
    pub fn screen(&self) -> Screen {
        match self {
            Route::Home => Screen::Home,
            Route::Detail(_) => Screen::Detail,
            Route::PostForm(_) => Screen::PostForm,
        }
    }
}

/// Focus state of one screen as published by a `Navigator`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Focus {
    pub focused: bool,
    /// Number of times the screen has gained focus.
    pub visits: u64,
}

impl Focus {
    /// A screen that is visible for the first time.
    pub fn visible() -> Self {
        Self {
            focused: true,
            visits: 1,
        }
    }

    /// Apply a focus change. Returns false when nothing changed.
    pub fn set(&mut self, focused: bool) -> bool {
        if self.focused == focused {
            return false;
        }
        self.focused = focused;
        if focused {
            self.visits += 1;
        }
        true
    }
}

/// Receives screen transitions from the controllers.
pub trait Navigator: Send + Sync {
    fn navigate_to(&self, route: Route);

    fn go_back(&self);

    /// Focus state of `screen`; `focused` flips whenever it becomes or stops
    /// being the visible screen.
    fn subscribe_focus(&self, screen: Screen) -> watch::Receiver<Focus>;
}

/// A controller that reloads on focus.
#[async_trait]
pub trait FocusAware: Send + Sync {
    async fn focus_changed(&self, focused: bool);
}

/// Forward focus changes to `controller` until the sender side goes away.
///
/// The current value is delivered first, so subscribing to an already
/// focused screen triggers its initial load. A refocus whose blur was never
/// observed is delivered as a blur followed by a focus.
pub async fn drive_focus<C>(controller: &C, mut focus: watch::Receiver<Focus>)
where
    C: FocusAware + ?Sized,
{
    let mut last = *focus.borrow_and_update();
    controller.focus_changed(last.focused).await;
    while focus.changed().await.is_ok() {
        let next = *focus.borrow_and_update();
        if next.focused && last.focused && next.visits != last.visits {
            controller.focus_changed(false).await;
        }
        controller.focus_changed(next.focused).await;
        last = next;
    }
}

/// In-memory navigation stack.
///
/// `navigate_to` a screen that is already on the stack pops back to it and
/// replaces its parameters; any other screen is pushed. `go_back` never pops
/// the root.
#[derive(Debug)]
pub struct StackNavigator {
    stack: Mutex<Vec<Route>>,
    focus: [watch::Sender<Focus>; 3],
}

impl StackNavigator {
    pub fn new(root: Route) -> Self {
        let navigator = Self {
            focus: [
                watch::Sender::new(Focus::default()),
                watch::Sender::new(Focus::default()),
                watch::Sender::new(Focus::default()),
            ],
            stack: Mutex::new(vec![root.clone()]),
        };
        navigator.publish(root.screen());
        navigator
    }

    pub fn current(&self) -> Option<Route> {
        self.stack.lock().last().cloned()
    }

    pub fn stack(&self) -> Vec<Route> {
        self.stack.lock().clone()
    }

    pub fn is_focused(&self, screen: Screen) -> bool {
        self.focus[screen.index()].borrow().focused
    }

    fn publish(&self, top: Screen) {
        for screen in Screen::ALL {
            let focused = screen == top;
            self.focus[screen.index()].send_if_modified(|current| current.set(focused));
        }
    }
}

impl Default for StackNavigator {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}

impl Navigator for StackNavigator {
    fn navigate_to(&self, route: Route) {
        let top = route.screen();
        {
            let mut stack = self.stack.lock();
            if let Some(pos) = stack.iter().position(|r| r.screen() == top) {
                stack.truncate(pos);
            }
            stack.push(route);
            debug!(screen = top.name(), depth = stack.len(), "navigate");
        }
        self.publish(top);
    }

    fn go_back(&self) {
        let top = {
            let mut stack = self.stack.lock();
            if stack.len() > 1 {
                stack.pop();
            }
            stack.last().map(Route::screen)
        };
        if let Some(top) = top {
            debug!(screen = top.name(), "back");
            self.publish(top);
        }
    }

    fn subscribe_focus(&self, screen: Screen) -> watch::Receiver<Focus> {
        self.focus[screen.index()].subscribe()
    }
}
