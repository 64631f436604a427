//! Terminal front end: key mapping and rendering.
//!
//! The renderer only reads the session. Keys are turned into
//! [`InputEvent`]s and handed back to [`Session::handle_event`].

use std::cmp::Ordering;
use std::io::{self, Stdout, stdout};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, List, ListItem, ListState, Paragraph},
};
use tracing::debug;

use crate::port::DeviceControlPort;
use crate::registry::ControlDescriptor;
use crate::session::{EventOutcome, InputEvent, Session};

const HEADER_HEIGHT: u16 = 5;
const SIDE_WIDTH: u16 = 28;

const HELP: [&str; 11] = [
    "Up/Down/Home/End  Navigate",
    "Left/Right          Adjust",
    "PgDn/PgUp      Jump Adjust",
    "1-9       Load preset file",
    "Tab     Switch preset file",
    "",
    "R Reset All  | U Update",
    "D Default",
    "N Minimum    | M Maximum",
    "L Load       | S Save",
    "Q Quit",
];

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Translate a key press into a session event.
pub fn map_key(key: KeyEvent) -> InputEvent {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => InputEvent::Quit,
            _ => InputEvent::Unrecognized,
        };
    }

    match key.code {
        KeyCode::Up => InputEvent::NavigatePrevious,
        KeyCode::Down => InputEvent::NavigateNext,
        KeyCode::Home => InputEvent::NavigateFirst,
        KeyCode::End => InputEvent::NavigateLast,
        KeyCode::Left => InputEvent::StepDown,
        KeyCode::Right => InputEvent::StepUp,
        KeyCode::PageDown => InputEvent::JumpDown,
        KeyCode::PageUp => InputEvent::JumpUp,
        KeyCode::Tab => InputEvent::LoadNextPreset,
        KeyCode::Char(c @ '1'..='9') => InputEvent::LoadPreset(c as u8 - b'0'),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'n' => InputEvent::ToMinimum,
            'm' => InputEvent::ToMaximum,
            'd' => InputEvent::ToDefault,
            'r' => InputEvent::ResetAll,
            'l' => InputEvent::LoadConfig,
            's' => InputEvent::SaveConfig,
            'u' => InputEvent::RefreshFromDevice,
            'q' => InputEvent::Quit,
            _ => InputEvent::Unrecognized,
        },
        _ => InputEvent::Unrecognized,
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

/// Take over the terminal and run until the operator quits.
pub fn run<P: DeviceControlPort>(session: &mut Session<P>) -> io::Result<()> {
    enable_raw_mode()?;
    let mut terminal = undo_on_error(setup_terminal(), || {
        let _ = execute!(stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
    })?;

    let result = run_loop(&mut terminal, session);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Run `undo` when `result` is an error, then pass the result through.
fn undo_on_error<T>(result: io::Result<T>, undo: impl FnOnce()) -> io::Result<T> {
    if result.is_err() {
        undo();
    }
    result
}

fn run_loop<P: DeviceControlPort>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session<P>,
) -> io::Result<()> {
    let mut list_state = ListState::default();
    let mut dirty = true;

    loop {
        if dirty {
            terminal.draw(|f| draw(f, session, &mut list_state))?;
        }

        let input = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key),
            Event::Resize(cols, rows) => {
                debug!(cols, rows, "Terminal resized");
                InputEvent::Resize
            }
            _ => continue,
        };

        match session.handle_event(input) {
            EventOutcome::Quit => return Ok(()),
            EventOutcome::Redraw => dirty = true,
            EventOutcome::Unchanged => dirty = false,
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// `+` above default, `-` below, blank at default.
pub fn deviation_marker(control: &ControlDescriptor) -> char {
    match control.deviation() {
        Ordering::Greater => '+',
        Ordering::Less => '-',
        Ordering::Equal => ' ',
    }
}

/// One list row: marker and name on the left, value right-aligned to `width`.
pub fn row_text(control: &ControlDescriptor, width: usize) -> String {
    let value = control.display_value();
    let name_width = width.saturating_sub(value.chars().count() + 3);
    let name: String = control.display_name.chars().take(name_width).collect();
    format!(
        "{} {:<name_width$} {}",
        deviation_marker(control),
        name,
        value,
        name_width = name_width
    )
}

/// Draw the whole screen.
pub fn draw<P: DeviceControlPort>(frame: &mut Frame, session: &Session<P>, list_state: &mut ListState) {
    let [header, body] = Layout::vertical([Constraint::Length(HEADER_HEIGHT), Constraint::Min(3)]).areas(frame.area());
    let [list_area, side] = Layout::horizontal([Constraint::Min(20), Constraint::Length(SIDE_WIDTH)]).areas(body);
    let [detail_area, help_area] =
        Layout::vertical([Constraint::Length(9), Constraint::Min(0)]).areas(side);

    draw_header(frame, header, session);
    draw_list(frame, list_area, session, list_state);
    draw_detail(frame, detail_area, session.active_control());
    frame.render_widget(
        Paragraph::new(HELP.iter().map(|line| Line::from(*line)).collect::<Vec<_>>()),
        help_area,
    );
}

fn draw_header<P: DeviceControlPort>(frame: &mut Frame, area: Rect, session: &Session<P>) {
    let summary = session.summary();
    let presets = session
        .catalog()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("  ");

    let lines = vec![
        Line::from(format!("Camera control: {}", session.status().unwrap_or_default()))
            .style(Style::new().add_modifier(Modifier::BOLD)),
        Line::from(format!(
            "V4L2:       {:<24} Config:  {}",
            summary.device.display().to_string(),
            summary.config_file.display()
        )),
        Line::from(format!("Format:     {:<24} Presets: {}", summary.format.pixel_format.to_string(), presets)),
        Line::from(format!("Resolution: {}x{}", summary.format.width, summary.format.height)),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

fn draw_list<P: DeviceControlPort>(frame: &mut Frame, area: Rect, session: &Session<P>, list_state: &mut ListState) {
    let registry = session.registry();
    let width = usize::from(area.width.saturating_sub(4));
    let items: Vec<ListItem> = registry.iter().map(|c| ListItem::new(row_text(c, width))).collect();

    let footer = format!("[ {} / {} ]", session.active_index() + 1, registry.len());
    let list = List::new(items)
        .block(Block::bordered().title_bottom(Line::from(footer).right_aligned()))
        .highlight_style(Style::new().add_modifier(Modifier::REVERSED));

    list_state.select(Some(session.active_index()));
    frame.render_stateful_widget(list, area, list_state);
}

fn draw_detail(frame: &mut Frame, area: Rect, control: Option<&ControlDescriptor>) {
    let block = Block::bordered();
    let Some(c) = control else {
        frame.render_widget(block, area);
        return;
    };

    let option = c.current_option().map(|o| o.item.to_string()).unwrap_or_default();
    let field = |label: &str, value: String| Line::from(format!("{}: {:>18}", label, value));
    let lines = vec![
        Line::from(c.display_name.chars().take(22).collect::<String>()),
        field("Val", c.value().to_string()),
        field("Min", c.minimum.to_string()),
        field("Max", c.maximum.to_string()),
        field("Stp", c.step.to_string()),
        field("Def", c.default_value.to_string()),
        field("Opt", option),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::fake::FakePort;
    use crate::port::{ControlInfo, ControlType, MenuItem};
    use crate::session::SessionConfig;
    use ratatui::backend::TestBackend;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn session() -> Session<FakePort> {
        let menu = ControlInfo {
            id: 0x0098_0918,
            name: "Power Line Frequency".into(),
            control_type: ControlType::Menu,
            minimum: 0,
            maximum: 2,
            step: 1,
            default_value: 1,
            flags: 0,
        };
        let port = FakePort::new()
            .with_integer(0x0098_0900, "Brightness", (0, 255, 1), 128, 140)
            .with_control(menu, Some(2))
            .with_menu_item(0x0098_0918, 0, MenuItem::Name("Disabled".into()))
            .with_menu_item(0x0098_0918, 1, MenuItem::Name("50 Hz".into()))
            .with_menu_item(0x0098_0918, 2, MenuItem::Name("60 Hz".into()));
        Session::new(port, SessionConfig::default()).unwrap()
    }

    #[test]
    fn keys_map_to_events() {
        assert_eq!(map_key(press(KeyCode::Up)), InputEvent::NavigatePrevious);
        assert_eq!(map_key(press(KeyCode::End)), InputEvent::NavigateLast);
        assert_eq!(map_key(press(KeyCode::PageUp)), InputEvent::JumpUp);
        assert_eq!(map_key(press(KeyCode::PageDown)), InputEvent::JumpDown);
        assert_eq!(map_key(press(KeyCode::Tab)), InputEvent::LoadNextPreset);
        assert_eq!(map_key(press(KeyCode::Char('7'))), InputEvent::LoadPreset(7));
        assert_eq!(map_key(press(KeyCode::Char('0'))), InputEvent::Unrecognized);
        assert_eq!(map_key(press(KeyCode::Char('M'))), InputEvent::ToMaximum);
        assert_eq!(map_key(press(KeyCode::Char('u'))), InputEvent::RefreshFromDevice);
        assert_eq!(map_key(press(KeyCode::Esc)), InputEvent::Unrecognized);
    }

    #[test]
    fn ctrl_c_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(key), InputEvent::Quit);
        let key = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(map_key(key), InputEvent::Unrecognized);
    }

    #[test]
    fn rows_show_marker_and_option_label() {
        let session = session();
        let registry = session.registry();

        let brightness = registry.find("brightness").unwrap();
        assert_eq!(deviation_marker(brightness), '+');
        let row = row_text(brightness, 30);
        assert!(row.starts_with("+ Brightness"));
        assert!(row.ends_with(" 140"));
        assert_eq!(row.chars().count(), 30);

        let menu = registry.find("power_line_frequency").unwrap();
        assert!(row_text(menu, 40).ends_with("60 Hz"));
        assert_eq!(deviation_marker(registry.find("fps").unwrap()), ' ');
    }

    #[test]
    fn long_names_are_truncated() {
        let session = session();
        let menu = session.registry().find("power_line_frequency").unwrap();
        let row = row_text(menu, 16);
        assert_eq!(row, "+ Power Li 60 Hz");
    }

    #[test]
    fn renders_header_list_and_footer() {
        let session = session();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let mut state = ListState::default();
        terminal.draw(|f| draw(f, &session, &mut state)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("/dev/video0"));
        assert!(text.contains("/boot/camera.txt"));
        assert!(text.contains("Brightness"));
        assert!(text.contains("[ 1 / 3 ]"));
        assert!(text.contains("Q Quit"));
    }

    #[test]
    fn failed_setup_restores_terminal() {
        let mut restored = false;
        let failed: io::Result<()> = Err(io::Error::other("no tty"));
        assert!(undo_on_error(failed, || restored = true).is_err());
        assert!(restored);

        let mut restored = false;
        assert_eq!(undo_on_error(Ok(7), || restored = true).unwrap(), 7);
        assert!(!restored);
    }
}
