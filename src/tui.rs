use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::board::Board;
use crate::models::{Application, ApplicationDraft, COLUMNS, Status, column_for};
use crate::storage::KeyValueStore;

const FORM_FIELDS: [&str; 8] = [
    "Company *",
    "Position *",
    "Location",
    "Status",
    "Application Date",
    "Job URL",
    "Salary Range",
    "Notes",
];
const STATUS_FIELD: usize = 3;
const DATE_FIELD: usize = 4;

struct FormState {
    draft: ApplicationDraft,
    editing_id: Option<String>,
    field: usize,
    date_text: String,
    error: Option<String>,
}

impl FormState {
    fn new(draft: ApplicationDraft, editing_id: Option<String>) -> Self {
        let date_text = draft.application_date.format("%Y-%m-%d").to_string();
        Self {
            draft,
            editing_id,
            field: 0,
            date_text,
            error: None,
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            0 => Some(&mut self.draft.company),
            1 => Some(&mut self.draft.position),
            2 => Some(&mut self.draft.location),
            DATE_FIELD => Some(&mut self.date_text),
            5 => Some(&mut self.draft.job_url),
            6 => Some(&mut self.draft.salary_range),
            7 => Some(&mut self.draft.notes),
            _ => None,
        }
    }

    fn value(&self, field: usize) -> String {
        match field {
            0 => self.draft.company.clone(),
            1 => self.draft.position.clone(),
            2 => self.draft.location.clone(),
            STATUS_FIELD => format!("< {} >", column_for(self.draft.status).title),
            DATE_FIELD => self.date_text.clone(),
            5 => self.draft.job_url.clone(),
            6 => self.draft.salary_range.clone(),
            _ => self.draft.notes.clone(),
        }
    }

    fn cycle_status(&mut self, forward: bool) {
        let next = if forward {
            self.draft.status.next().unwrap_or(Status::Wishlist)
        } else {
            self.draft.status.prev().unwrap_or(Status::Rejected)
        };
        self.draft.status = next;
    }
}

enum Mode {
    Browse,
    Search,
    ConfirmDelete { id: String, label: String },
    Form(FormState),
}

struct AppState {
    focus: usize,
    selected: [usize; 5],
    search: String,
    mode: Mode,
    message: Option<String>,
}

impl AppState {
    fn new() -> Self {
        Self {
            focus: 0,
            selected: [0; 5],
            search: String::new(),
            mode: Mode::Browse,
            message: None,
        }
    }

    fn current<'a, S: KeyValueStore>(&self, board: &'a Board<S>) -> Option<&'a Application> {
        let view = board.view(&self.search);
        view[self.focus].applications.get(self.selected[self.focus]).copied()
    }

    /// Keeps every column's selection inside its (possibly filtered) length.
    fn clamp<S: KeyValueStore>(&mut self, board: &Board<S>) {
        for (i, col) in board.view(&self.search).iter().enumerate() {
            self.selected[i] = self.selected[i].min(col.count().saturating_sub(1));
        }
    }

    fn left(&mut self) {
        self.focus = self.focus.saturating_sub(1);
    }

    fn right(&mut self) {
        if self.focus < COLUMNS.len() - 1 {
            self.focus += 1;
        }
    }

    fn next<S: KeyValueStore>(&mut self, board: &Board<S>) {
        let count = board.view(&self.search)[self.focus].count();
        if count > 0 && self.selected[self.focus] < count - 1 {
            self.selected[self.focus] += 1;
        }
    }

    fn prev(&mut self) {
        self.selected[self.focus] = self.selected[self.focus].saturating_sub(1);
    }
}

pub fn run_board<S: KeyValueStore>(board: &mut Board<S>) -> Result<()> {
    let mut state = AppState::new();

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, board);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop<S: KeyValueStore>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    board: &mut Board<S>,
) -> Result<()> {
    loop {
        state.clamp(board);
        terminal.draw(|frame| draw(frame, state, board))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if !handle_key(key, state, board) {
                break;
            }
        }
    }
    Ok(())
}

/// Returns `false` when the board should close.
fn handle_key<S: KeyValueStore>(key: KeyEvent, state: &mut AppState, board: &mut Board<S>) -> bool {
    match std::mem::replace(&mut state.mode, Mode::Browse) {
        Mode::Browse => return handle_browse(key, state, board),
        Mode::Search => match key.code {
            KeyCode::Enter => {}
            KeyCode::Esc => state.search.clear(),
            KeyCode::Backspace => {
                state.search.pop();
                state.mode = Mode::Search;
            }
            KeyCode::Char(c) => {
                state.search.push(c);
                state.mode = Mode::Search;
            }
            _ => state.mode = Mode::Search,
        },
        Mode::ConfirmDelete { id, label } => {
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                board.delete_record(&id);
                state.message = Some(format!("Deleted {}", label));
            }
        }
        Mode::Form(form) => handle_form(key, form, state, board),
    }
    true
}

fn handle_browse<S: KeyValueStore>(key: KeyEvent, state: &mut AppState, board: &mut Board<S>) -> bool {
    state.message = None;
    let current_id = state.current(board).map(|a| a.id.clone());

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Left | KeyCode::Char('h') => state.left(),
        KeyCode::Right | KeyCode::Char('l') => state.right(),
        KeyCode::Down | KeyCode::Char('j') => state.next(board),
        KeyCode::Up | KeyCode::Char('k') => state.prev(),
        KeyCode::Char('/') => state.mode = Mode::Search,
        KeyCode::Char('a') => {
            let draft = board.new_draft(COLUMNS[state.focus].id);
            state.mode = Mode::Form(FormState::new(draft, None));
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            if let Some(id) = current_id {
                if let Some(draft) = board.edit_draft(&id) {
                    state.mode = Mode::Form(FormState::new(draft, Some(id)));
                }
            }
        }
        KeyCode::Char('d') => {
            if let Some(app) = state.current(board) {
                state.mode = Mode::ConfirmDelete {
                    id: app.id.clone(),
                    label: format!("{} at {}", app.position, app.company),
                };
            }
        }
        // Shift+h/l carry the card along, like dragging it to the next lane.
        KeyCode::Char('H') | KeyCode::Char('L') => {
            let forward = key.code == KeyCode::Char('L');
            let target = COLUMNS[state.focus].id;
            let target = if forward { target.next() } else { target.prev() };
            if let (Some(id), Some(target)) = (current_id, target) {
                drop_card(state, board, &id, target);
            }
        }
        KeyCode::Char(c @ '1'..='5') => {
            let target = COLUMNS[(c as u8 - b'1') as usize].id;
            if let Some(id) = current_id {
                drop_card(state, board, &id, target);
            }
        }
        _ => {}
    }
    true
}

fn drop_card<S: KeyValueStore>(state: &mut AppState, board: &mut Board<S>, id: &str, target: Status) {
    if let Err(e) = board.handle_drop(id, target.as_str()) {
        state.message = Some(e.to_string());
        return;
    }
    state.focus = target.index();
    let view = board.view(&state.search);
    if let Some(pos) = view[state.focus].applications.iter().position(|a| a.id == id) {
        state.selected[state.focus] = pos;
    }
}

fn handle_form<S: KeyValueStore>(
    key: KeyEvent,
    mut form: FormState,
    state: &mut AppState,
    board: &mut Board<S>,
) {
    match key.code {
        KeyCode::Esc => return,
        KeyCode::Enter => {
            match NaiveDate::parse_from_str(form.date_text.trim(), "%Y-%m-%d") {
                Ok(date) => form.draft.application_date = date,
                Err(_) => {
                    form.error = Some("Application date must be YYYY-MM-DD".to_string());
                    state.mode = Mode::Form(form);
                    return;
                }
            }
            let editing = form.editing_id.clone();
            match board.create_or_update(form.draft.clone(), editing.as_deref()) {
                Ok(id) => {
                    let status = form.draft.status;
                    state.focus = status.index();
                    let view = board.view(&state.search);
                    if let Some(pos) = view[state.focus].applications.iter().position(|a| a.id == id) {
                        state.selected[state.focus] = pos;
                    }
                    state.message = Some(if editing.is_some() {
                        "Application updated".to_string()
                    } else {
                        "Application added".to_string()
                    });
                    return;
                }
                Err(e) => form.error = Some(e.to_string()),
            }
        }
        KeyCode::Tab | KeyCode::Down => form.field = (form.field + 1) % FORM_FIELDS.len(),
        KeyCode::BackTab | KeyCode::Up => {
            form.field = (form.field + FORM_FIELDS.len() - 1) % FORM_FIELDS.len()
        }
        KeyCode::Left if form.field == STATUS_FIELD => form.cycle_status(false),
        KeyCode::Right | KeyCode::Char(' ') if form.field == STATUS_FIELD => form.cycle_status(true),
        KeyCode::Backspace => {
            if let Some(text) = form.text_mut() {
                text.pop();
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let Some(text) = form.text_mut() {
                text.push(c);
            }
        }
        _ => {}
    }
    state.mode = Mode::Form(form);
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Wishlist => Color::Cyan,
        Status::Applied => Color::Magenta,
        Status::Interviewing => Color::Green,
        Status::Offer => Color::Yellow,
        Status::Rejected => Color::Red,
    }
}

fn draw<S: KeyValueStore>(frame: &mut Frame, state: &AppState, board: &Board<S>) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(9),
            Constraint::Length(1),
        ])
        .split(frame.area());

    // Header with search box
    let search_style = if matches!(state.mode, Mode::Search) {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled("Job Board", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("   Search: "),
        Span::styled(state.search.as_str(), search_style),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, rows[0]);

    // Columns
    let lanes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 5); 5])
        .split(rows[1]);

    let view = board.view(&state.search);
    for (i, col) in view.iter().enumerate() {
        let color = status_color(col.column.id);
        let items: Vec<ListItem> = col
            .applications
            .iter()
            .map(|app| {
                ListItem::new(vec![
                    Line::from(Span::styled(
                        app.company.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    )),
                    Line::from(app.position.clone()),
                    Line::from(Span::styled(
                        app.display_date(),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();

        let focused = i == state.focus;
        let border = if focused {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title(format!(" {} ({}) ", col.column.title, col.count())),
            )
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> ");

        let mut list_state = ListState::default();
        if focused && col.count() > 0 {
            list_state.select(Some(state.selected[i]));
        }
        frame.render_stateful_widget(list, lanes[i], &mut list_state);
    }

    // Detail of the selected card
    let detail = Paragraph::new(build_detail(state.current(board)))
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false });
    frame.render_widget(detail, rows[2]);

    // Footer help
    let footer = match (&state.mode, &state.message) {
        (Mode::ConfirmDelete { label, .. }, _) => {
            format!(" Delete {}? Are you sure? (y/n)", label)
        }
        (Mode::Search, _) => " type to filter  enter:keep  esc:clear".to_string(),
        (Mode::Form(_), _) => " tab/shift-tab:field  ←/→:status  enter:save  esc:cancel".to_string(),
        (Mode::Browse, Some(msg)) => format!(" {}", msg),
        (Mode::Browse, None) => {
            " h/l:column j/k:card H/L:move 1-5:set status /:search a:add e:edit d:delete q:quit"
                .to_string()
        }
    };
    frame.render_widget(
        Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
        rows[3],
    );

    if let Mode::Form(form) = &state.mode {
        draw_form(frame, form);
    }
}

fn build_detail(app: Option<&Application>) -> Text<'_> {
    let Some(app) = app else {
        return Text::raw("No applications yet");
    };

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(vec![
        Span::styled(app.position.as_str(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" at {}", app.company)),
    ]));
    lines.push(Line::from(Span::styled(
        format!("Status: {}", column_for(app.status).title),
        Style::default().fg(status_color(app.status)),
    )));
    if let Some(location) = &app.location {
        lines.push(Line::from(format!("Location: {}", location)));
    }
    if let Some(salary) = &app.salary_range {
        lines.push(Line::from(format!("Salary: {}", salary)));
    }
    lines.push(Line::from(format!("Applied: {}", app.display_date())));
    if let Some(url) = &app.job_url {
        lines.push(Line::from(format!("URL: {}", url)));
    }
    if let Some(notes) = &app.notes {
        for line in textwrap::fill(notes, 90).lines() {
            lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(Color::Gray),
            )));
        }
    }
    Text::from(lines)
}

fn draw_form(frame: &mut Frame, form: &FormState) {
    let area = centered(frame.area(), 60, 22);
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = Vec::new();
    for (i, label) in FORM_FIELDS.iter().enumerate() {
        let active = i == form.field;
        let label_style = if active {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if active && i != STATUS_FIELD { "_" } else { "" };
        lines.push(Line::from(Span::styled(*label, label_style)));
        lines.push(Line::from(format!("  {}{}", form.value(i), cursor)));
    }
    if let Some(error) = &form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.as_str(),
            Style::default().fg(Color::Red),
        )));
    }

    let title = if form.editing_id.is_some() {
        " Edit Application "
    } else {
        " Add New Application "
    };
    let widget = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(widget, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(state: &mut AppState, board: &mut Board<MemoryStore>, text: &str) {
        for c in text.chars() {
            assert!(handle_key(press(KeyCode::Char(c)), state, board));
        }
    }

    fn seeded() -> (AppState, Board<MemoryStore>) {
        let mut board = Board::new(MemoryStore::new());
        board.load_initial();
        for (company, position) in [("Acme", "Engineer"), ("Globex", "SRE")] {
            let mut draft = board.new_draft(Status::Wishlist);
            draft.company = company.to_string();
            draft.position = position.to_string();
            board.create_or_update(draft, None).unwrap();
        }
        (AppState::new(), board)
    }

    #[test]
    fn test_form_adds_to_focused_column() {
        let mut board = Board::new(MemoryStore::new());
        let mut state = AppState::new();
        handle_key(press(KeyCode::Right), &mut state, &mut board);
        handle_key(press(KeyCode::Char('a')), &mut state, &mut board);
        type_text(&mut state, &mut board, "Initech");
        handle_key(press(KeyCode::Tab), &mut state, &mut board);
        type_text(&mut state, &mut board, "Analyst");
        handle_key(press(KeyCode::Enter), &mut state, &mut board);

        assert!(matches!(state.mode, Mode::Browse));
        let app = &board.applications()[0];
        assert_eq!(app.company, "Initech");
        assert_eq!(app.status, Status::Applied);
        assert_eq!(state.focus, Status::Applied.index());
    }

    #[test]
    fn test_form_stays_open_on_missing_field() {
        let mut board = Board::new(MemoryStore::new());
        let mut state = AppState::new();
        handle_key(press(KeyCode::Char('a')), &mut state, &mut board);
        type_text(&mut state, &mut board, "Acme");
        handle_key(press(KeyCode::Enter), &mut state, &mut board);

        match &state.mode {
            Mode::Form(form) => {
                assert_eq!(form.error.as_deref(), Some("Please fill in the position field"));
            }
            _ => panic!("form should stay open"),
        }
        assert!(board.applications().is_empty());

        handle_key(press(KeyCode::Esc), &mut state, &mut board);
        assert!(matches!(state.mode, Mode::Browse));
        assert!(board.applications().is_empty());
    }

    #[test]
    fn test_shift_l_moves_card_right() {
        let (mut state, mut board) = seeded();
        handle_key(press(KeyCode::Char('L')), &mut state, &mut board);

        assert_eq!(board.applications()[0].status, Status::Applied);
        assert_eq!(board.applications()[1].status, Status::Wishlist);
        assert_eq!(state.focus, Status::Applied.index());
        assert_eq!(state.current(&board).map(|a| a.company.as_str()), Some("Acme"));
    }

    #[test]
    fn test_number_key_sets_status() {
        let (mut state, mut board) = seeded();
        handle_key(press(KeyCode::Char('j')), &mut state, &mut board);
        handle_key(press(KeyCode::Char('4')), &mut state, &mut board);
        assert_eq!(board.applications()[1].status, Status::Offer);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let (mut state, mut board) = seeded();
        handle_key(press(KeyCode::Char('d')), &mut state, &mut board);
        handle_key(press(KeyCode::Char('n')), &mut state, &mut board);
        assert_eq!(board.applications().len(), 2);

        handle_key(press(KeyCode::Char('d')), &mut state, &mut board);
        handle_key(press(KeyCode::Char('y')), &mut state, &mut board);
        assert_eq!(board.applications().len(), 1);
        assert_eq!(board.applications()[0].company, "Globex");
    }

    #[test]
    fn test_search_narrows_selection() {
        let (mut state, mut board) = seeded();
        handle_key(press(KeyCode::Char('/')), &mut state, &mut board);
        type_text(&mut state, &mut board, "GLOB");
        handle_key(press(KeyCode::Enter), &mut state, &mut board);

        assert_eq!(state.search, "GLOB");
        state.clamp(&board);
        assert_eq!(state.current(&board).map(|a| a.company.as_str()), Some("Globex"));

        handle_key(press(KeyCode::Char('/')), &mut state, &mut board);
        handle_key(press(KeyCode::Esc), &mut state, &mut board);
        assert!(state.search.is_empty());
    }

    #[test]
    fn test_edit_form_prefills_and_saves() {
        let (mut state, mut board) = seeded();
        let id = board.applications()[0].id.clone();
        handle_key(press(KeyCode::Char('e')), &mut state, &mut board);
        for _ in 0..3 {
            handle_key(press(KeyCode::Tab), &mut state, &mut board);
        }
        handle_key(press(KeyCode::Right), &mut state, &mut board);
        handle_key(press(KeyCode::Right), &mut state, &mut board);
        handle_key(press(KeyCode::Enter), &mut state, &mut board);

        let app = board.get(&id).unwrap();
        assert_eq!(app.company, "Acme");
        assert_eq!(app.status, Status::Interviewing);
        assert_eq!(board.applications().len(), 2);
    }
}
