use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use platform::session::BroadcastState;
use ratatui::{prelude::*, widgets::*, Frame};
use tokio::sync::mpsc::UnboundedSender;

use crate::state_store::{action::Action, LoginStatus, State};
use crate::ui_management::components::{
    log_pane::{self, LogPane},
    Component, ComponentRender,
};

use super::{
    components::{
        category_picker::{self, CategoryPicker},
        theme_list::{self, ThemeList},
        title_input::{self, TitleInput},
    },
    section::{
        usage::{widget_usage_to_text, HasUsageInfo, UsageInfo, UsageInfoLine},
        SectionActivation,
    },
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Section {
    ThemeList,
    CategoryPicker,
    TitleInput,
}

impl Section {
    const ALL: [Section; 3] = [
        Section::ThemeList,
        Section::CategoryPicker,
        Section::TitleInput,
    ];

    fn index(self) -> usize {
        Section::ALL
            .iter()
            .position(|section| *section == self)
            .unwrap_or(0)
    }

    fn next(self) -> Section {
        Section::ALL[(self.index() + 1) % Section::ALL.len()]
    }

    fn previous(self) -> Section {
        Section::ALL[(self.index() + Section::ALL.len() - 1) % Section::ALL.len()]
    }
}

struct Props {
    room_id: Option<u64>,
    selected_category: Option<String>,
    broadcast: BroadcastState,
    /// Seconds since the broadcast started
    live_timer: usize,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Props {
            room_id: match state.login_status {
                LoginStatus::LoggedIn { room_id } => Some(room_id),
                _ => None,
            },
            selected_category: state.selected_category.clone(),
            broadcast: state.broadcast.clone(),
            live_timer: state.live_timer,
        }
    }
}

const DEFAULT_HOVERED_SECTION: Section = Section::CategoryPicker;

/// StudioPage picks the category and title, and starts or stops the broadcast
pub struct StudioPage {
    /// Action sender
    action_tx: UnboundedSender<Action>,
    /// State Mapped StudioPage Props
    props: Props,
    // Internal State
    /// Currently active section, handling input
    active_section: Option<Section>,
    /// Section that is currently hovered
    last_hovered_section: Section,
    // Child Components
    theme_list: ThemeList,
    category_picker: CategoryPicker,
    title_input: TitleInput,
    log_pane: LogPane,
}

impl StudioPage {
    fn get_component_for_section(&self, section: Section) -> &dyn Component {
        match section {
            Section::ThemeList => &self.theme_list,
            Section::CategoryPicker => &self.category_picker,
            Section::TitleInput => &self.title_input,
        }
    }

    fn get_component_for_section_mut(&mut self, section: Section) -> &mut dyn Component {
        match section {
            Section::ThemeList => &mut self.theme_list,
            Section::CategoryPicker => &mut self.category_picker,
            Section::TitleInput => &mut self.title_input,
        }
    }

    fn get_section_activation_for_section(
        &mut self,
        section: Section,
    ) -> &mut dyn SectionActivation {
        match section {
            Section::ThemeList => &mut self.theme_list,
            Section::CategoryPicker => &mut self.category_picker,
            Section::TitleInput => &mut self.title_input,
        }
    }

    fn calculate_border_color(&self, section: Section) -> Color {
        match (self.active_section, self.last_hovered_section) {
            (Some(active_section), _) if active_section == section => Color::Yellow,
            (_, last_hovered_section) if last_hovered_section == section => Color::Blue,
            _ => Color::Reset,
        }
    }

    fn disable_section(&mut self, section: Section) {
        self.get_section_activation_for_section(section)
            .deactivate();

        self.active_section = None;
    }

    fn send(&self, action: Action) {
        let _ = self.action_tx.send(action);
    }
}

impl Component for StudioPage {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self
    where
        Self: Sized,
    {
        StudioPage {
            action_tx: action_tx.clone(),
            // set the props
            props: Props::from(state),
            // internal component state
            active_section: None,
            last_hovered_section: DEFAULT_HOVERED_SECTION,
            // child components
            theme_list: ThemeList::new(state, action_tx.clone()),
            category_picker: CategoryPicker::new(state, action_tx.clone()),
            title_input: TitleInput::new(state, action_tx.clone()),
            log_pane: LogPane::new(state, action_tx),
        }
        .move_with_state(state)
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        StudioPage {
            props: Props::from(state),
            // propagate the update to the child components
            theme_list: self.theme_list.move_with_state(state),
            category_picker: self.category_picker.move_with_state(state),
            title_input: self.title_input.move_with_state(state),
            log_pane: self.log_pane.move_with_state(state),
            ..self
        }
    }

    fn name(&self) -> &str {
        "Studio Page"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match self.active_section {
            None => match key.code {
                KeyCode::Char('e') => {
                    let section = self.last_hovered_section;

                    self.active_section = Some(section);
                    self.get_section_activation_for_section(section).activate();
                }
                KeyCode::Left => self.last_hovered_section = self.last_hovered_section.previous(),
                KeyCode::Right => self.last_hovered_section = self.last_hovered_section.next(),
                KeyCode::Char('s') => self.send(Action::ToggleBroadcast),
                KeyCode::Char('a') => self.send(Action::CopyServerAddress),
                KeyCode::Char('k') => self.send(Action::CopyStreamKey),
                KeyCode::Char('o') => self.send(Action::Logout),
                KeyCode::Char('q') => self.send(Action::Exit),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.send(Action::Exit)
                }
                _ => {}
            },
            Some(section) => {
                self.get_component_for_section_mut(section)
                    .handle_key_event(key);

                // a pick or a submit finishes the edit, escape abandons it
                if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                    self.disable_section(section);
                }
            }
        }
    }
}

fn format_duration(seconds: usize) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds / 60) % 60,
        seconds % 60
    )
}

impl StudioPage {
    fn stream_info(&self) -> Text<'static> {
        let broadcast = &self.props.broadcast;
        let status = if broadcast.active {
            Line::from(vec![
                "LIVE".red().bold(),
                format!(" for {}", format_duration(self.props.live_timer)).into(),
            ])
        } else {
            Line::from("Offline".dim())
        };
        let not_fetched = || "not fetched yet".to_string();

        Text::from(vec![
            status,
            Line::from(vec![
                "Server address: ".bold(),
                Span::raw(broadcast.server_address.clone().unwrap_or_else(not_fetched)),
            ]),
            Line::from(vec![
                "Stream key: ".bold(),
                Span::raw(broadcast.stream_key.clone().unwrap_or_else(not_fetched)),
            ]),
        ])
    }
}

impl ComponentRender<()> for StudioPage {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, _props: ()) {
        let [container_main, container_log] = *Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(8)].as_ref())
            .split(frame.size())
        else {
            panic!("The main layout should have 2 chunks")
        };

        let [left, middle, right] = *Layout::default()
            .direction(Direction::Horizontal)
            .constraints(
                [
                    Constraint::Percentage(25),
                    Constraint::Percentage(50),
                    Constraint::Percentage(25),
                ]
                .as_ref(),
            )
            .split(container_main)
        else {
            panic!("The studio layout should have 3 chunks")
        };

        let [container_theme_list, container_session_info] = *Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(4)].as_ref())
            .split(left)
        else {
            panic!("The left layout should have 2 chunks")
        };

        self.theme_list.render(
            frame,
            theme_list::RenderProps {
                border_color: self.calculate_border_color(Section::ThemeList),
                area: container_theme_list,
            },
        );

        let session_info = Paragraph::new(Text::from(vec![
            Line::from(format!(
                "Room: {}",
                self.props
                    .room_id
                    .map(|room_id| room_id.to_string())
                    .unwrap_or_default()
            )),
            Line::from(format!(
                "Category: {}",
                self.props.selected_category.as_deref().unwrap_or("none")
            )),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Session"));
        frame.render_widget(session_info, container_session_info);

        let [container_stream_info, container_category_picker, container_title] =
            *Layout::default()
                .direction(Direction::Vertical)
                .constraints(
                    [
                        Constraint::Length(5),
                        Constraint::Min(1),
                        Constraint::Length(3),
                    ]
                    .as_ref(),
                )
                .split(middle)
        else {
            panic!("The middle layout should have 3 chunks")
        };

        let stream_info = Paragraph::new(self.stream_info())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Stream"));
        frame.render_widget(stream_info, container_stream_info);

        self.category_picker.render(
            frame,
            category_picker::RenderProps {
                area: container_category_picker,
                border_color: self.calculate_border_color(Section::CategoryPicker),
                show_cursor: self.active_section == Some(Section::CategoryPicker),
            },
        );

        self.title_input.render(
            frame,
            title_input::RenderProps {
                area: container_title,
                border_color: self.calculate_border_color(Section::TitleInput),
                show_cursor: self.active_section == Some(Section::TitleInput),
            },
        );

        let mut usage_text: Text = widget_usage_to_text(self.usage_info());
        usage_text.patch_style(Style::default());
        let usage = Paragraph::new(usage_text)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Usage"));
        frame.render_widget(usage, right);

        self.log_pane.render(
            frame,
            log_pane::RenderProps {
                area: container_log,
            },
        );
    }
}

impl HasUsageInfo for StudioPage {
    fn usage_info(&self) -> UsageInfo {
        if let Some(section) = self.active_section {
            let handler: &dyn HasUsageInfo = match section {
                Section::ThemeList => &self.theme_list,
                Section::CategoryPicker => &self.category_picker,
                Section::TitleInput => &self.title_input,
            };

            return handler.usage_info();
        }

        let toggle = if self.props.broadcast.active {
            "to stop the broadcast"
        } else {
            "to go live"
        };

        UsageInfo {
            description: Some("Select a widget".into()),
            lines: vec![
                UsageInfoLine::new(&["q"], "to exit"),
                UsageInfoLine::new(&["←", "→"], "to hover widgets"),
                UsageInfoLine::new(
                    &["e"],
                    format!(
                        "to activate {}",
                        self.get_component_for_section(self.last_hovered_section)
                            .name()
                    ),
                ),
                UsageInfoLine::new(&["s"], toggle),
                UsageInfoLine::new(&["a"], "to copy the server address"),
                UsageInfoLine::new(&["k"], "to copy the stream key"),
                UsageInfoLine::new(&["o"], "to log out"),
            ],
        }
    }
}
