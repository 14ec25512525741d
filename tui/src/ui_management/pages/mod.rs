use crossterm::event::KeyEvent;
use ratatui::{prelude::Backend, Frame};
use tokio::sync::mpsc::UnboundedSender;

use crate::state_store::{action::Action, State};

use self::{login_page::LoginPage, studio_page::StudioPage};

use super::components::{Component, ComponentRender};

mod login_page;
mod studio_page;

enum ActivePage {
    LoginPage,
    StudioPage,
}

struct Props {
    active_page: ActivePage,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Props {
            active_page: if state.is_logged_in() {
                ActivePage::StudioPage
            } else {
                ActivePage::LoginPage
            },
        }
    }
}

pub struct AppRouter {
    props: Props,
    //
    login_page: LoginPage,
    studio_page: StudioPage,
}

impl AppRouter {
    fn get_active_page_component(&self) -> &dyn Component {
        match self.props.active_page {
            ActivePage::LoginPage => &self.login_page,
            ActivePage::StudioPage => &self.studio_page,
        }
    }

    fn get_active_page_component_mut(&mut self) -> &mut dyn Component {
        match self.props.active_page {
            ActivePage::LoginPage => &mut self.login_page,
            ActivePage::StudioPage => &mut self.studio_page,
        }
    }
}

impl Component for AppRouter {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self
    where
        Self: Sized,
    {
        AppRouter {
            props: Props::from(state),
            //
            login_page: LoginPage::new(state, action_tx.clone()),
            studio_page: StudioPage::new(state, action_tx),
        }
        .move_with_state(state)
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        AppRouter {
            props: Props::from(state),
            //
            login_page: self.login_page.move_with_state(state),
            studio_page: self.studio_page.move_with_state(state),
        }
    }

    // route all functions to the active page
    fn name(&self) -> &str {
        self.get_active_page_component().name()
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        self.get_active_page_component_mut().handle_key_event(key)
    }
}

impl ComponentRender<()> for AppRouter {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, props: ()) {
        match self.props.active_page {
            ActivePage::LoginPage => self.login_page.render(frame, props),
            ActivePage::StudioPage => self.studio_page.render(frame, props),
        }
    }
}
