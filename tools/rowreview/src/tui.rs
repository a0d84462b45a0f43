use crate::app::{ReviewApp, BACKSPACE, ENTER};
use crate::columns::RoleSection;
use crate::errors::ReviewError;
use crate::hotkeys::{controls_legend, ESC, TAB};
use crate::types::{Focus, Screen};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend, TestBackend};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

pub const SCORE_PLACEHOLDER: &str = "Enter your score here... please type only the number.";
pub const RESPONSE_PLACEHOLDER: &str =
    "Enter your response here... explain why the row deserves the score it received.";

pub fn draw_app(frame: &mut Frame<'_>, app: &ReviewApp) {
    match app.screen() {
        Screen::Review => draw_review(frame, app),
        Screen::Complete | Screen::Exited => draw_complete(frame, app),
    }
}

fn draw_review(frame: &mut Frame<'_>, app: &ReviewApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(2),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let session = app.session();
    let counter = if app.focus() == Focus::RowNumber {
        format!("Go to row: {}_ (of {})", app.row_input(), session.row_count())
    } else {
        format!(
            "Row {} of {}  |  reviewed {}",
            session.current_index() + 1,
            session.row_count(),
            session.reviewed_count()
        )
    };
    frame.render_widget(
        Paragraph::new(counter).block(Block::default().borders(Borders::ALL).title("Review Data")),
        chunks[0],
    );

    frame.render_widget(
        Paragraph::new(section_lines(&app.current_sections()))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Row")),
        chunks[1],
    );

    let form = app.form();
    frame.render_widget(
        field(
            "Your Score",
            &form.score,
            SCORE_PLACEHOLDER,
            app.focus() == Focus::Score,
        ),
        chunks[2],
    );
    frame.render_widget(
        field(
            "Your Response",
            &form.response,
            RESPONSE_PLACEHOLDER,
            app.focus() == Focus::Response,
        ),
        chunks[3],
    );

    let next_label = if session.is_last_row() {
        "Complete Review"
    } else {
        "Next"
    };
    let previous_style = if session.current_index() == 0 {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };
    let controls = vec![
        Line::from(vec![
            Span::styled("[Previous]", previous_style),
            Span::raw("  [Save & Exit]  "),
            Span::styled(format!("[{next_label}]"), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(controls_legend(Screen::Review)),
    ];
    frame.render_widget(Paragraph::new(controls), chunks[4]);

    frame.render_widget(
        Paragraph::new(app.status().unwrap_or_default().to_string())
            .style(Style::default().fg(Color::Yellow)),
        chunks[5],
    );
}

fn draw_complete(frame: &mut Frame<'_>, app: &ReviewApp) {
    let area = frame.area();
    let rows = app.session().row_count();
    let mut lines = vec![
        Line::from("You have reviewed all rows in the CSV file."),
        Line::from(""),
        Line::from(Span::styled(
            format!("All {rows} rows have been reviewed successfully."),
            Style::default().fg(Color::Green),
        )),
        Line::from(""),
        Line::from(controls_legend(Screen::Complete)),
    ];
    if let Some(status) = app.status() {
        lines.push(Line::from(""));
        lines.push(Line::from(status.to_string()));
    }
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Review Complete!")),
        area,
    );
}

fn section_lines(sections: &[RoleSection]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for section in sections {
        lines.push(Line::from(Span::styled(
            section.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for cell in &section.cells {
            let mut values = cell.value.split('\n');
            let first = values.next().unwrap_or_default();
            lines.push(Line::from(vec![
                Span::styled(format!("  {}: ", cell.label), Style::default().fg(Color::Gray)),
                Span::raw(first.to_string()),
            ]));
            for more in values {
                lines.push(Line::from(format!("    {more}")));
            }
        }
    }
    lines
}

fn field<'a>(title: &'a str, value: &'a str, placeholder: &'a str, focused: bool) -> Paragraph<'a> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let body = if value.is_empty() {
        Paragraph::new(Span::styled(placeholder, Style::default().fg(Color::DarkGray)))
    } else {
        Paragraph::new(value)
    };
    body.wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(title),
    )
}

/// Draws the current screen off-screen and returns it as plain text, one
/// line per terminal row.
pub fn render_app(app: &ReviewApp, width: u16, height: u16) -> Result<String, ReviewError> {
    if width == 0 || height == 0 {
        return Ok(String::new());
    }
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend).map_err(|e| ReviewError::Render(e.to_string()))?;
    terminal
        .draw(|frame| draw_app(frame, app))
        .map_err(|e| ReviewError::Render(e.to_string()))?;

    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..height {
        for x in 0..width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    Ok(out)
}

/// Runs the review screen on the real terminal until the reviewer exits.
pub fn run_interactive(app: &mut ReviewApp) -> Result<(), ReviewError> {
    enable_raw_mode().map_err(|e| ReviewError::Io(e.to_string()))?;
    let mut stdout = std::io::stdout();
    if let Err(error) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(ReviewError::Io(error.to_string()));
    }
    let result = Terminal::new(CrosstermBackend::new(stdout))
        .map_err(|e| ReviewError::Render(e.to_string()))
        .and_then(|mut terminal| {
            let looped = event_loop(&mut terminal, app);
            let _ = terminal.show_cursor();
            looped
        });

    let _ = disable_raw_mode();
    let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut ReviewApp) -> Result<(), ReviewError> {
    while !app.is_exited() {
        terminal
            .draw(|frame| draw_app(frame, app))
            .map_err(|e| ReviewError::Render(e.to_string()))?;
        let event = event::read().map_err(|e| ReviewError::Io(e.to_string()))?;
        if let Event::Key(key) = event {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some((ch, ctrl)) = key_input(key) {
                app.handle_key(ch, ctrl);
            }
        }
    }
    Ok(())
}

/// Flattens a crossterm key event into the `(char, ctrl)` pairs the app
/// understands.
pub fn key_input(key: KeyEvent) -> Option<(char, bool)> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let ch = match key.code {
        KeyCode::Char(ch) => ch,
        KeyCode::Tab => TAB,
        KeyCode::Esc => ESC,
        KeyCode::Enter => ENTER,
        KeyCode::Backspace => BACKSPACE,
        _ => return None,
    };
    Some((ch, ctrl))
}
