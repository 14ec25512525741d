use crossterm::event::KeyEvent;
use ratatui::{prelude::Backend, Frame};
use tokio::sync::mpsc::UnboundedSender;

use crate::state_store::{action::Action, State};

/// A piece of the UI that maps the latest [State] into its own props and
/// turns key presses into [Action]s.
pub trait Component {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self
    where
        Self: Sized;
    /// Rebuilds the props from a fresh state, keeping the internal state
    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized;

    /// Name shown in the usage hints
    fn name(&self) -> &str;

    fn handle_key_event(&mut self, key: KeyEvent);
}

pub trait ComponentRender<Props> {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, props: Props);
}
