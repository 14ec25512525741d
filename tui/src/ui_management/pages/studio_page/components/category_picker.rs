use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    prelude::{Backend, Constraint, Direction, Layout, Rect},
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
    ui_management::components::{
        input_box::{self, InputBox},
        Component, ComponentRender,
    },
};

struct Props {
    /// Categories matching the search query
    categories: Vec<String>,
    selected_category: Option<String>,
    search_query: String,
    active_theme: Option<String>,
    /// The category can not change while live
    locked: bool,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Self {
            categories: state.categories.clone(),
            selected_category: state.selected_category.clone(),
            search_query: state.search_query.clone(),
            active_theme: state.active_theme.clone(),
            locked: state.broadcast.active,
        }
    }
}

/// Search box over the categories of the active theme.
///
/// Typing narrows the list by name or by pinyin initials; the arrows move
/// through the matches and Enter picks one.
pub struct CategoryPicker {
    action_tx: UnboundedSender<Action>,
    /// State Mapped CategoryPicker Props
    props: Props,
    // Internal State for the Component
    search_box: InputBox,
    list_state: ListState,
    /// Whether the picker owns the keyboard
    active: bool,
}

impl CategoryPicker {
    fn next(&mut self) {
        if self.props.categories.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.props.categories.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    fn previous(&mut self) {
        if self.props.categories.is_empty() {
            return;
        }

        let i = match self.list_state.selected() {
            Some(0) | None => self.props.categories.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    fn submit_selection(&mut self) {
        let selected = self
            .list_state
            .selected()
            .and_then(|idx| self.props.categories.get(idx));

        if let Some(name) = selected {
            let _ = self.action_tx.send(Action::SelectCategory { name: name.clone() });
        }
    }

    fn search(&mut self) {
        let query = self.search_box.text().to_string();
        if query == self.props.search_query {
            return;
        }

        let _ = self.action_tx.send(Action::SearchCategories { query });
        // the results arrive with the next state; start at their top
        self.list_state.select(Some(0));
    }
}

impl Component for CategoryPicker {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self {
        Self {
            action_tx: action_tx.clone(),
            props: Props::from(state),
            //
            search_box: InputBox::new(state, action_tx),
            list_state: ListState::default(),
            active: false,
        }
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        let props = Props::from(state);
        let mut search_box = self.search_box;
        let mut list_state = self.list_state;

        if self.active {
            if matches!(list_state.selected(), Some(idx) if idx >= props.categories.len()) {
                list_state.select(Some(0));
            }
        } else {
            // the query is cleared by the store when the theme changes
            search_box.set_text(&props.search_query);
        }

        Self {
            props,
            search_box,
            list_state,
            ..self
        }
    }

    fn name(&self) -> &str {
        "Category Picker"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press || self.props.locked {
            return;
        }

        match key.code {
            KeyCode::Up => self.previous(),
            KeyCode::Down => self.next(),
            KeyCode::Enter => self.submit_selection(),
            KeyCode::Esc => (),
            _ => {
                self.search_box.handle_key_event(key);
                self.search();
            }
        }
    }
}

impl SectionActivation for CategoryPicker {
    fn activate(&mut self) {
        self.active = true;
        self.search_box.set_text(&self.props.search_query);

        let idx = self
            .props
            .selected_category
            .as_ref()
            .and_then(|name| self.props.categories.iter().position(|c| c == name))
            .unwrap_or(0);
        *self.list_state.offset_mut() = 0;
        self.list_state.select(Some(idx));
    }

    fn deactivate(&mut self) {
        self.active = false;
        *self.list_state.offset_mut() = 0;
        self.list_state.select(None);
    }
}

pub struct RenderProps {
    pub area: Rect,
    pub border_color: Color,
    pub show_cursor: bool,
}

impl ComponentRender<RenderProps> for CategoryPicker {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, props: RenderProps) {
        let [container_search, container_list] = *Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)].as_ref())
            .split(props.area)
        else {
            panic!("The category picker layout should have 2 chunks")
        };

        self.search_box.render(
            frame,
            input_box::RenderProps {
                title: "Search (name or pinyin initials)".into(),
                area: container_search,
                border_color: props.border_color,
                show_cursor: props.show_cursor,
            },
        );

        let items: Vec<ListItem> = self
            .props
            .categories
            .iter()
            .map(|name| {
                let is_selected = self.props.selected_category.as_ref() == Some(name);
                let (label, style) = if is_selected {
                    (format!("{name} *"), Style::default().add_modifier(Modifier::BOLD))
                } else {
                    (name.clone(), Style::default())
                };

                ListItem::new(Line::from(Span::raw(label))).style(style)
            })
            .collect();

        let title = match (&self.props.active_theme, &self.props.selected_category) {
            (Some(theme), Some(category)) => format!("Categories of {theme} [{category}]"),
            (Some(theme), None) => format!("Categories of {theme}"),
            (None, _) => "Categories".to_string(),
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::new().fg(props.border_color))
                    .title(title),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Rgb(255, 223, 102))
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol(">");

        let mut list_state = self.list_state.clone();
        frame.render_stateful_widget(list, container_list, &mut list_state);
    }
}

impl HasUsageInfo for CategoryPicker {
    fn usage_info(&self) -> UsageInfo {
        if self.props.locked {
            return UsageInfo {
                description: Some("The category can not change while live".into()),
                lines: vec![UsageInfoLine::new(&["Esc"], "to cancel")],
            };
        }

        UsageInfo {
            description: Some("Type to search, e.g. csgo or yxlm".into()),
            lines: vec![
                UsageInfoLine::new(&["Esc"], "to cancel"),
                UsageInfoLine::new(&["↑", "↓"], "to navigate"),
                UsageInfoLine::new(&["Enter"], "to pick the category"),
            ],
        }
    }
}
