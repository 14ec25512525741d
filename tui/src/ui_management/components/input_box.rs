use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    prelude::{Backend, Rect},
    style::{Color, Style, Stylize},
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::state_store::{action::Action, State};

use super::{Component, ComponentRender};

/// Single line text editor. The cursor counts characters, not bytes, so
/// titles and searches in CJK scripts edit correctly.
pub struct InputBox {
    /// Current value of the input box
    text: String,
    /// Position of the cursor, in characters from the start
    cursor_position: usize,
    /// Upper bound on the number of characters, if any
    max_chars: Option<usize>,
}

impl InputBox {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, new_text: &str) {
        self.text = String::from(new_text);
        self.cursor_position = self.char_count();
    }

    pub fn set_max_chars(&mut self, max_chars: usize) {
        self.max_chars = Some(max_chars);
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor_position)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }

    fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    fn move_cursor_right(&mut self) {
        self.cursor_position = (self.cursor_position + 1).min(self.char_count());
    }

    fn enter_char(&mut self, new_char: char) {
        if matches!(self.max_chars, Some(max) if self.char_count() >= max) {
            return;
        }

        let idx = self.byte_index();
        self.text.insert(idx, new_char);

        self.move_cursor_right();
    }

    fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }

        self.move_cursor_left();
        let idx = self.byte_index();
        self.text.remove(idx);
    }

    /// Terminal columns between the start of the text and the cursor
    fn cursor_column(&self) -> u16 {
        let before_cursor: String = self.text.chars().take(self.cursor_position).collect();

        Span::raw(before_cursor).width() as u16
    }
}

impl Component for InputBox {
    fn new(_state: &State, _action_tx: UnboundedSender<Action>) -> Self {
        Self {
            text: String::new(),
            cursor_position: 0,
            max_chars: None,
        }
    }

    fn move_with_state(self, _state: &State) -> Self
    where
        Self: Sized,
    {
        Self { ..self }
    }

    fn name(&self) -> &str {
        "Input Box"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Char(to_insert) => self.enter_char(to_insert),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Home => self.cursor_position = 0,
            KeyCode::End => self.cursor_position = self.char_count(),
            _ => {}
        }
    }
}

pub struct RenderProps {
    pub title: String,
    pub area: Rect,
    pub border_color: Color,
    pub show_cursor: bool,
}

impl ComponentRender<RenderProps> for InputBox {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, props: RenderProps) {
        let title = match self.max_chars {
            Some(max) => format!("{} ({}/{})", props.title, self.char_count(), max),
            None => props.title,
        };
        let input = Paragraph::new(self.text.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .fg(props.border_color)
                    .title(title),
            );
        frame.render_widget(input, props.area);

        // the cursor is hidden unless the box is being edited
        if props.show_cursor {
            frame.set_cursor(
                props.area.x + self.cursor_column() + 1,
                // one line down, past the border
                props.area.y + 1,
            )
        }
    }
}
