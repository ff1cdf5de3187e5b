//! Terminal UI for the marketplace client.
//!
//! The screen shows the current page on the left and a history of commands
//! and notices on the right, with an input line underneath.

use crate::{
    app::{App, HELP, Notice, Tone},
    commands::{Command, parse_command},
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use ratatui::{
    DefaultTerminal, Frame,
    crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    layout::{Constraint, Flex, Layout, Margin, Position, Rect},
    style::Stylize,
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{Block, Clear, List, ListDirection, ListItem, Padding, Paragraph, Scrollbar, ScrollbarOrientation, Wrap},
};
use std::time::Duration;

mod widgets;

use widgets::{ScrollableList, UserInput};

const MAX_LOG_RECORDS: usize = 1024;
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Clone, Copy)]
enum RecordKind {
    Ack,
    Alert,
    Error,
    Info,
    You,
}

impl From<Tone> for RecordKind {
    fn from(tone: Tone) -> Self {
        match tone {
            Tone::Info => RecordKind::Info,
            Tone::Success => RecordKind::Ack,
            Tone::Error => RecordKind::Error,
            Tone::Alert => RecordKind::Alert,
        }
    }
}

/// A timestamped history line with an importance label.
struct Record {
    datetime: DateTime<Utc>,
    kind: RecordKind,
    content: String,
}

impl Record {
    fn new(kind: RecordKind, content: String) -> Self {
        Self {
            datetime: Utc::now(),
            kind,
            content,
        }
    }
}

impl From<Record> for ListItem<'_> {
    fn from(val: Record) -> Self {
        let repr = match val.kind {
            RecordKind::Ack => "OK".light_green(),
            RecordKind::Alert => "ALERT".light_magenta(),
            RecordKind::Error => "ERROR".light_red(),
            RecordKind::Info => "INFO".light_blue(),
            RecordKind::You => "YOU".light_yellow(),
        };

        let msg = vec![
            format!("[{} ", val.datetime.format("%H:%M:%S")).into(),
            Span::styled(format!("{repr:5}"), repr.style),
            format!("]: {}", val.content).into(),
        ];
        ListItem::new(Line::from(msg))
    }
}

pub struct TuiApp {
    app: App,
    /// Whether to display the help menu window
    show_help_menu: bool,
    help_handle: ScrollableList,
    log_handle: ScrollableList,
    user_input: UserInput,
}

impl TuiApp {
    pub fn new(app: App) -> Self {
        let mut help_handle = ScrollableList::new(MAX_LOG_RECORDS);
        help_handle.push("".into());
        for line in HELP.lines() {
            help_handle.push(line.to_string().into());
        }
        help_handle.push("".into());
        help_handle.jump_to_first();

        Self {
            app,
            show_help_menu: false,
            help_handle,
            log_handle: ScrollableList::new(MAX_LOG_RECORDS),
            user_input: UserInput::new(),
        }
    }

    fn add_log(&mut self, kind: RecordKind, content: String) {
        self.log_handle.push(Record::new(kind, content).into());
    }

    fn add_notices(&mut self, notices: Vec<Notice>) {
        for notice in notices {
            for line in notice.text.lines() {
                self.add_log(notice.tone.into(), line.to_string());
            }
        }
    }

    async fn handle_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }
        match parse_command(input) {
            Ok(Command::Help) => {
                self.show_help_menu = !self.show_help_menu;
            }
            Ok(command) => {
                // Passwords and card numbers stay out of the history.
                let echo = match &command {
                    Command::Login { email, .. } => format!("login {email} ****"),
                    Command::Register { email, name, .. } => format!("register {email} **** {name}"),
                    Command::Pay { .. } => "pay ****".to_string(),
                    _ => input.trim().to_string(),
                };
                self.add_log(RecordKind::You, echo);
                let notices = self.app.handle(command).await;
                self.add_notices(notices);
            }
            Err(e) => self.add_log(RecordKind::Error, e.to_string()),
        }
    }

    fn draw_page(&self, frame: &mut Frame, area: Rect) {
        let screen = self.app.screen();
        let lines: Vec<Line> = screen.lines.into_iter().map(Line::from).collect();
        let page = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::bordered()
                .padding(Padding::horizontal(1))
                .title(format!(" {}  ", screen.title).bold())
                .title_bottom(format!(" {}  ", self.app.route())),
        );
        frame.render_widget(page, area);
    }

    fn draw_log(&mut self, frame: &mut Frame, area: Rect) {
        let log_records = List::new(self.log_handle.list_items.clone())
            .direction(ListDirection::BottomToTop)
            .block(Block::bordered().title(" history  "));
        frame.render_stateful_widget(log_records, area, &mut self.log_handle.list_state);

        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .begin_symbol(None)
                .end_symbol(None),
            area.inner(Margin {
                vertical: 1,
                horizontal: 1,
            }),
            &mut self.log_handle.scroll_state,
        );
    }

    fn draw_user_input(&self, frame: &mut Frame, area: Rect) {
        let who = match self.app.profile() {
            Some(profile) => format!(" {} ({})  ", profile.email, profile.role),
            None => " guest  ".to_string(),
        };
        let prompt = if self.app.awaiting_confirmation() {
            " yes/no?  ".light_magenta()
        } else {
            who.light_green()
        };
        let user_input =
            Paragraph::new(self.user_input.value.as_str()).block(Block::bordered().title(prompt));
        frame.render_widget(user_input, area);
        frame.set_cursor_position(Position::new(
            area.x + self.user_input.char_idx as u16 + 1,
            area.y + 1,
        ));
    }

    fn draw_help_bar(&self, frame: &mut Frame, area: Rect) {
        let help_message = vec![
            "press ".into(),
            "Tab".bold().white(),
            " to view commands, ".into(),
            "Enter".bold().white(),
            " to run a command, ".into(),
            "Ctrl+R".bold().white(),
            " to refresh, or ".into(),
            "Esc".bold().white(),
            " to exit".into(),
        ];
        frame.render_widget(Paragraph::new(Line::from(help_message)), area);
    }

    fn draw_help_menu(&mut self, frame: &mut Frame) {
        let vertical = Layout::vertical([Constraint::Max(40)]).flex(Flex::Center);
        let horizontal = Layout::horizontal([Constraint::Max(92)]).flex(Flex::Center);
        let [help_menu_area] = vertical.areas(frame.area());
        let [help_menu_area] = horizontal.areas(help_menu_area);
        frame.render_widget(Clear, help_menu_area);

        let help_items = List::new(self.help_handle.list_items.clone())
            .direction(ListDirection::BottomToTop)
            .block(Block::bordered().title(" commands  "));
        frame.render_stateful_widget(help_items, help_menu_area, &mut self.help_handle.list_state);

        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .begin_symbol(None)
                .end_symbol(None),
            help_menu_area.inner(Margin {
                vertical: 1,
                horizontal: 1,
            }),
            &mut self.help_handle.scroll_state,
        );
    }

    fn draw(&mut self, frame: &mut Frame) {
        let window = Layout::vertical([
            Constraint::Min(6),    // Page + history
            Constraint::Length(3), // User input
            Constraint::Length(1), // Help bar
        ]);
        let [top_area, user_input_area, help_area] = window.areas(frame.area());
        let [page_area, log_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(top_area);

        self.draw_page(frame, page_area);
        self.draw_log(frame, log_area);
        self.draw_user_input(frame, user_input_area);
        self.draw_help_bar(frame, help_area);

        if self.show_help_menu {
            self.draw_help_menu(frame);
        }
    }

    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        let notices = self.app.start().await;
        self.add_notices(notices);

        loop {
            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(POLL_TIMEOUT)?
                && let Event::Key(KeyEvent {
                    code, modifiers, kind, ..
                }) = event::read()?
                && kind == KeyEventKind::Press
            {
                match modifiers {
                    KeyModifiers::CONTROL => match code {
                        KeyCode::Home => self.log_handle.jump_to_first(),
                        KeyCode::End => self.log_handle.jump_to_last(),
                        KeyCode::Char('r') => {
                            let notices = self.app.handle(Command::Refresh).await;
                            self.add_notices(notices);
                        }
                        KeyCode::Char('c') => return Ok(()),
                        _ => {}
                    },
                    KeyModifiers::NONE | KeyModifiers::SHIFT => match code {
                        KeyCode::Enter => {
                            let user_input = self.user_input.submit();
                            self.handle_input(&user_input).await;
                        }
                        KeyCode::Char(to_insert) => self.user_input.input(to_insert),
                        KeyCode::Backspace => self.user_input.backspace(),
                        KeyCode::Delete => self.user_input.delete(),
                        KeyCode::Left => self.user_input.move_left(),
                        KeyCode::Right => self.user_input.move_right(),
                        KeyCode::Up => {
                            if self.show_help_menu {
                                self.help_handle.move_up();
                            } else {
                                self.log_handle.move_up();
                            }
                        }
                        KeyCode::Down => {
                            if self.show_help_menu {
                                self.help_handle.move_down();
                            } else {
                                self.log_handle.move_down();
                            }
                        }
                        KeyCode::Home => self.user_input.jump_to_first(),
                        KeyCode::End => self.user_input.jump_to_last(),
                        KeyCode::Tab => self.show_help_menu = !self.show_help_menu,
                        KeyCode::Esc => return Ok(()),
                        _ => {}
                    },
                    _ => {}
                }
            }

            // Background fetches can end the session.
            let notices = self.app.poll_session();
            self.add_notices(notices);

            if self.app.should_quit() {
                return Ok(());
            }
        }
    }
}
