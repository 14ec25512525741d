use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use platform::api::MAX_TITLE_CHARS;
use ratatui::{
    prelude::{Backend, Rect},
    style::Color,
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use super::super::section::{
    usage::{HasUsageInfo, UsageInfo, UsageInfoLine},
    SectionActivation,
};
use crate::{
    state_store::{action::Action, State},
    ui_management::components::{
        input_box::{self, InputBox},
        Component, ComponentRender,
    },
};

struct Props {
    /// Title pushed before going live
    title: String,
    /// The title field is read-only while live
    locked: bool,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Self {
            title: state.title.clone(),
            locked: state.broadcast.active,
        }
    }
}

pub struct TitleInput {
    action_tx: UnboundedSender<Action>,
    /// State Mapped TitleInput Props
    props: Props,
    // Internal State for the Component
    input_box: InputBox,
    /// Whether the field is being edited
    editing: bool,
}

impl TitleInput {
    fn submit_title(&mut self) {
        // the store leaves the title alone when the input is blank
        let _ = self.action_tx.send(Action::UpdateTitle {
            title: String::from(self.input_box.text()),
        });
    }
}

impl Component for TitleInput {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self {
        let mut input_box = InputBox::new(state, action_tx.clone());
        input_box.set_max_chars(MAX_TITLE_CHARS);
        input_box.set_text(&state.title);

        Self {
            action_tx,
            props: Props::from(state),
            //
            input_box,
            editing: false,
        }
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        let mut input_box = self.input_box;
        if !self.editing {
            input_box.set_text(&state.title);
        }

        Self {
            props: Props::from(state),
            input_box,
            ..self
        }
    }

    fn name(&self) -> &str {
        "Title Input"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press || self.props.locked {
            return;
        }

        self.input_box.handle_key_event(key);

        if key.code == KeyCode::Enter {
            self.submit_title();
        }
    }
}

impl SectionActivation for TitleInput {
    fn activate(&mut self) {
        self.editing = true;
        self.input_box.set_text(&self.props.title);
    }

    fn deactivate(&mut self) {
        self.editing = false;
        self.input_box.set_text(&self.props.title);
    }
}

pub struct RenderProps {
    pub area: Rect,
    pub border_color: Color,
    pub show_cursor: bool,
}

impl ComponentRender<RenderProps> for TitleInput {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, props: RenderProps) {
        self.input_box.render(
            frame,
            input_box::RenderProps {
                title: "Title".into(),
                area: props.area,
                border_color: props.border_color,
                show_cursor: props.show_cursor && !self.props.locked,
            },
        )
    }
}

impl HasUsageInfo for TitleInput {
    fn usage_info(&self) -> UsageInfo {
        if self.props.locked {
            UsageInfo {
                description: Some("The title can not change while live".into()),
                lines: vec![UsageInfoLine::new(&["Esc"], "to cancel")],
            }
        } else {
            UsageInfo {
                description: Some(format!(
                    "Type the room title, at most {MAX_TITLE_CHARS} characters"
                )),
                lines: vec![
                    UsageInfoLine::new(&["Esc"], "to cancel"),
                    UsageInfoLine::new(&["Enter"], "to update the title"),
                ],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;
    use tokio::sync::mpsc;

    use super::*;

    #[test]
    fn test_enter_submits_the_edited_title() {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let state = State {
            title: "晚间".into(),
            ..Default::default()
        };
        let mut title_input = TitleInput::new(&state, action_tx);
        title_input.activate();

        for c in "杂谈".chars() {
            title_input.handle_key_event(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        title_input.handle_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        assert!(matches!(
            action_rx.try_recv(),
            Ok(Action::UpdateTitle { title }) if title == "晚间杂谈"
        ));
    }
}
