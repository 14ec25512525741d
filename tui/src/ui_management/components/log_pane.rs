use crossterm::event::KeyEvent;
use ratatui::{
    prelude::{Backend, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::state_store::{action::Action, LogLevel, LogLine, State};

use super::{Component, ComponentRender};

struct Props {
    /// Log lines, oldest first
    lines: Vec<LogLine>,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Props {
            lines: state.logs.asc_iter().cloned().collect(),
        }
    }
}

/// Read-only view of the latest log lines
pub struct LogPane {
    props: Props,
}

impl Component for LogPane {
    fn new(state: &State, _action_tx: UnboundedSender<Action>) -> Self {
        LogPane {
            props: Props::from(state),
        }
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        LogPane {
            props: Props::from(state),
        }
    }

    fn name(&self) -> &str {
        "Log"
    }

    fn handle_key_event(&mut self, _key: KeyEvent) {}
}

fn calculate_list_offset(height: u16, items_len: usize) -> usize {
    // go back by (container height - 2 for borders) to get the offset
    items_len.saturating_sub(height.saturating_sub(2) as usize)
}

fn level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Info => Style::default(),
        LogLevel::Warn => Style::default().fg(Color::Yellow),
        LogLevel::Error => Style::default().fg(Color::Red),
    }
}

pub struct RenderProps {
    pub area: Rect,
}

impl ComponentRender<RenderProps> for LogPane {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, props: RenderProps) {
        let offset = calculate_list_offset(props.area.height, self.props.lines.len());

        let items: Vec<ListItem> = self
            .props
            .lines
            .iter()
            .skip(offset)
            .map(|line| {
                ListItem::new(Line::from(Span::styled(
                    line.message.clone(),
                    level_style(line.level),
                )))
            })
            .collect();

        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Log"));
        frame.render_widget(list, props.area);
    }
}
