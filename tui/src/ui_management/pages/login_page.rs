use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use qrcode::{render::unicode, QrCode};
use ratatui::{prelude::*, widgets::*, Frame};
use tokio::sync::mpsc::UnboundedSender;

use crate::state_store::{action::Action, LoginStatus, State};
use crate::ui_management::components::{
    log_pane::{self, LogPane},
    Component, ComponentRender,
};

struct Props {
    login_status: LoginStatus,
}

impl From<&State> for Props {
    fn from(state: &State) -> Self {
        Props {
            login_status: state.login_status.clone(),
        }
    }
}

/// QR code text rendered for one login URL
struct RenderedQr {
    url: String,
    text: String,
}

impl RenderedQr {
    fn new(url: &str) -> Self {
        // light modules are drawn with full blocks so the code reads on dark terminals
        let text = match QrCode::new(url.as_bytes()) {
            Ok(code) => code
                .render::<unicode::Dense1x2>()
                .dark_color(unicode::Dense1x2::Light)
                .light_color(unicode::Dense1x2::Dark)
                .build(),
            Err(err) => format!("could not draw the QR code: {err}\n\nopen {url} instead"),
        };

        RenderedQr {
            url: url.to_string(),
            text,
        }
    }
}

/// LoginPage shows the QR code to scan and the login progress
pub struct LoginPage {
    /// Action sender
    action_tx: UnboundedSender<Action>,
    /// State Mapped LoginPage Props
    props: Props,
    /// QR code of the current challenge, drawn once per URL
    qr: Option<RenderedQr>,
    // Child Components
    log_pane: LogPane,
}

impl LoginPage {
    fn is_busy(&self) -> bool {
        matches!(self.props.login_status, LoginStatus::Requesting)
    }

    fn status_line(&self) -> Line<'static> {
        match &self.props.login_status {
            LoginStatus::Idle | LoginStatus::LoggedIn { .. } => Line::from(vec![
                "Press ".into(),
                "<Enter>".bold(),
                " to log in with a QR code.".into(),
            ]),
            LoginStatus::Requesting => Line::from("Requesting a QR code...".italic()),
            LoginStatus::AwaitingScan { scanned: false, .. } => {
                Line::from("Scan the code with the mobile app.")
            }
            LoginStatus::AwaitingScan { scanned: true, .. } => {
                Line::from("Scanned, confirm the login on your phone.".green())
            }
            LoginStatus::Expired => Line::from(vec![
                "The QR code expired. Press ".yellow(),
                "<Enter>".bold(),
                " for a new one.".yellow(),
            ]),
            LoginStatus::Failed { reason } => Line::from(vec![
                Span::from(format!("Login failed: {reason}. ")).red(),
                "<Enter>".bold(),
                " to retry.".into(),
            ]),
        }
    }
}

impl Component for LoginPage {
    fn new(state: &State, action_tx: UnboundedSender<Action>) -> Self
    where
        Self: Sized,
    {
        LoginPage {
            action_tx: action_tx.clone(),
            props: Props::from(state),
            qr: None,
            log_pane: LogPane::new(state, action_tx),
        }
        .move_with_state(state)
    }

    fn move_with_state(self, state: &State) -> Self
    where
        Self: Sized,
    {
        let qr = match &state.login_status {
            LoginStatus::AwaitingScan { url, .. } => match self.qr {
                Some(qr) if qr.url == *url => Some(qr),
                _ => Some(RenderedQr::new(url)),
            },
            _ => None,
        };

        LoginPage {
            props: Props::from(state),
            qr,
            log_pane: self.log_pane.move_with_state(state),
            ..self
        }
    }

    fn name(&self) -> &str {
        "Login Page"
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match key.code {
            KeyCode::Enter if !self.is_busy() => {
                let _ = self.action_tx.send(Action::RequestLogin);
            }
            KeyCode::Esc => {
                let _ = self.action_tx.send(Action::CancelLogin);
            }
            KeyCode::Char('q') => {
                let _ = self.action_tx.send(Action::Exit);
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                let _ = self.action_tx.send(Action::Exit);
            }
            _ => {}
        }
    }
}

impl ComponentRender<()> for LoginPage {
    fn render<B: Backend>(&self, frame: &mut Frame<B>, _props: ()) {
        let [container_qr, container_status, container_help, container_log] = *Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                [
                    Constraint::Min(1),
                    Constraint::Length(3),
                    Constraint::Length(1),
                    Constraint::Length(8),
                ]
                .as_ref(),
            )
            .split(frame.size())
        else {
            panic!("The login layout should have 4 chunks")
        };

        let qr_text = match &self.qr {
            Some(qr) => Text::from(qr.text.as_str()),
            None => Text::from("No QR code yet"),
        };
        let qr = Paragraph::new(qr_text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("QR Login"));
        frame.render_widget(qr, container_qr);

        let status = Paragraph::new(self.status_line())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(status, container_status);

        let help = Paragraph::new(Line::from(vec![
            "(Enter)".bold(),
            " new QR code  ".into(),
            "(Esc)".bold(),
            " cancel  ".into(),
            "(q)".bold(),
            " exit".into(),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(help, container_help);

        self.log_pane.render(
            frame,
            log_pane::RenderProps {
                area: container_log,
            },
        );
    }
}
