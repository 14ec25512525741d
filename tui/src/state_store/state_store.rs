use std::time::Duration;

use platform::{
    api::LiveApi,
    session::{PollSchedule, PollTicket},
};
use tokio::sync::{
    broadcast,
    mpsc::{self, UnboundedReceiver, UnboundedSender},
};

use crate::termination::{Interrupted, Terminator};

use super::{action::Action, studio::Studio, State};

pub struct StateStore {
    state_tx: UnboundedSender<State>,
}

impl StateStore {
    pub fn new() -> (Self, UnboundedReceiver<State>) {
        let (state_tx, state_rx) = mpsc::unbounded_channel::<State>();

        (StateStore { state_tx }, state_rx)
    }
}

/// Resolves on the next login poll, or never when no login is in progress.
async fn next_poll(schedule: Option<&mut PollSchedule>) -> PollTicket {
    match schedule {
        Some(schedule) => schedule.tick().await,
        None => std::future::pending().await,
    }
}

impl StateStore {
    pub async fn main_loop<A: LiveApi>(
        self,
        mut studio: Studio<A>,
        mut terminator: Terminator,
        mut action_rx: UnboundedReceiver<Action>,
        mut interrupt_rx: broadcast::Receiver<Interrupted>,
    ) -> anyhow::Result<Interrupted> {
        studio.restore();

        // the initial state once
        self.state_tx.send(studio.state().clone())?;

        if studio.state().is_logged_in() {
            studio.refresh_catalog().await;
            self.state_tx.send(studio.state().clone())?;
        }

        let mut ticker = tokio::time::interval(Duration::from_secs(1));

        let result = loop {
            tokio::select! {
                // Handle the actions coming from the UI
                // and process them to do async operations
                Some(action) = action_rx.recv() => match action {
                    Action::RequestLogin => {
                        studio.mark_login_request_start();
                        // emit event to re-render any part depending on the login status
                        self.state_tx.send(studio.state().clone())?;

                        studio.handle_action(Action::RequestLogin).await;
                    },
                    Action::Exit => {
                        studio.handle_action(Action::Exit).await;
                        let _ = terminator.terminate(Interrupted::UserInt);

                        break Interrupted::UserInt;
                    },
                    action => studio.handle_action(action).await,
                },
                // Poll the QR login status while a code is on screen
                ticket = next_poll(studio.schedule_mut()) => {
                    studio.poll_login(ticket).await;
                },
                // Tick to terminate the select every N milliseconds
                _ = ticker.tick() => {
                    studio.tick_timer();
                },
                // Catch and handle interrupt signal to gracefully shutdown
                Ok(interrupted) = interrupt_rx.recv() => {
                    studio.save_preferences();

                    break interrupted;
                }
            }

            self.state_tx.send(studio.state().clone())?;
        };

        Ok(result)
    }
}
