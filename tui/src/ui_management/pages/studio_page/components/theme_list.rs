use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    prelude::{Backend, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use super::super::section::{
    usage::{HasUsageInfo, UsageInfo, UsageInfoLine},
    SectionActivation,
};
use crate::{
    state_store::{action::Action, State},
    ui_management::components::{Component, ComponentRender},
};

struct Props {
    /// Theme names in catalog order
    themes: Vec<String>,
    /// Theme the category picker currently shows
    active_theme: Option<String>,
    /// Themes can not change while live
    locked: bool,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Self {
            themes: state.themes.clone(),
            active_theme: state.active_theme.clone(),
            locked: state.broadcast.active,
        }
    }
}

pub struct ThemeList {
    /// Sending actions to the state store
    action_tx: UnboundedSender<Action>,
    /// State Mapped ThemeList Props
    props: Props,
    // Internal Component State
    /// List with optional selection and current offset
    list_state: ListState,
}

impl ThemeList {
    fn next(&mut self) {
        if self.props.themes.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.props.themes.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.props.themes.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(0) | None => self.props.themes.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    fn get_theme_idx(&self, name: &str) -> Option<usize> {
        self.props.themes.iter().position(|theme| theme == name)
    }
}

impl Component for ThemeList {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx,
            props: Props::from(state),
            //
            list_state: ListState::default(),
        }
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        Self {
            props: Props::from(state),
            ..self
        }
    }

    fn name(&self) -> &str {
        "Theme List"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press || self.props.locked {
            return;
        }

        match key.code {
            KeyCode::Up => self.previous(),
            KeyCode::Down => self.next(),
            KeyCode::Enter => {
                let selected = self
                    .list_state
                    .selected()
                    .and_then(|idx| self.props.themes.get(idx));

                if let Some(theme) = selected {
                    let _ = self.action_tx.send(Action::SelectTheme {
                        theme: theme.clone(),
                    });
                }
            }
            _ => (),
        }
    }
}

impl SectionActivation for ThemeList {
    fn activate(&mut self) {
        let idx: usize = self
            .props
            .active_theme
            .as_ref()
            .and_then(|theme| self.get_theme_idx(theme))
            .unwrap_or(0);

        *self.list_state.offset_mut() = 0;
        self.list_state.select(Some(idx));
    }

    fn deactivate(&mut self) {
        *self.list_state.offset_mut() = 0;
        self.list_state.select(None);
    }
}

pub struct RenderProps {
    pub border_color: Color,
    pub area: Rect,
}

impl ComponentRender<RenderProps> for ThemeList {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, props: RenderProps) {
        let theme_list: Vec<ListItem> = self
            .props
            .themes
            .iter()
            .map(|theme| {
                let is_active = self.props.active_theme.as_ref() == Some(theme);
                let style = if is_active && self.list_state.selected().is_none() {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };

                ListItem::new(Line::from(Span::raw(theme.clone()))).style(style)
            })
            .collect();

        let theme_list = List::new(theme_list)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::new().fg(props.border_color))
                    .title("Themes"),
            )
            .highlight_style(
                Style::default()
                    // yellow that would work for both dark / light modes
                    .bg(Color::Rgb(255, 223, 102))
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">");

        let mut list_state = self.list_state.clone();
        frame.render_stateful_widget(theme_list, props.area, &mut list_state);
    }
}

impl HasUsageInfo for ThemeList {
    fn usage_info(&self) -> UsageInfo {
        if self.props.locked {
            return UsageInfo {
                description: Some("The theme can not change while live".into()),
                lines: vec![UsageInfoLine::new(&["Esc"], "to cancel")],
            };
        }

        UsageInfo {
            description: Some("Select the theme to pick a category from".into()),
            lines: vec![
                UsageInfoLine::new(&["Esc"], "to cancel"),
                UsageInfoLine::new(&["↑", "↓"], "to navigate"),
                UsageInfoLine::new(&["Enter"], "to show its categories"),
            ],
        }
    }
}
