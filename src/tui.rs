use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::thread;
use std::time::Duration;

use crate::models::{RosterSnapshot, Status, UNITS};
use crate::roster::{self, FilterSet, FILTER_FIELDS};
use crate::store::{RosterStore, SheetSession, StoreError};

/// Pause after a committed edit so a held-down key cannot fire
/// duplicate writes.
const EDIT_DEBOUNCE_MS: u64 = 400;

struct AppState {
    snapshot: RosterSnapshot,
    filters: FilterSet,
    /// Original snapshot rows of the currently filtered view.
    filtered: Vec<usize>,
    selected: usize,
    scroll_offset: u16,
    notice: Option<String>,
    /// Pending free-text edit of the assigned recruiter field.
    input: Option<String>,
}

impl AppState {
    fn new(filters: FilterSet) -> Self {
        Self {
            snapshot: Vec::new(),
            filters,
            filtered: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            notice: None,
            input: None,
        }
    }

    fn current_row(&self) -> Option<usize> {
        self.filtered.get(self.selected).copied()
    }

    /// Full idempotent re-fetch; the store is the single source of
    /// truth across renders.
    fn refresh<S: SheetSession>(&mut self, store: &RosterStore<S>) {
        match store.fetch_all() {
            Ok(snapshot) => self.snapshot = snapshot,
            Err(StoreError::EmptyData) => {
                self.snapshot = Vec::new();
                self.notice = Some("No data found in the sheet.".to_string());
            }
            Err(e) => self.notice = Some(format!("Fetch failed: {e}")),
        }
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = roster::apply_filters(&self.snapshot, &self.filters)
            .iter()
            .map(|record| record.row)
            .collect();
        if self.selected >= self.filtered.len() {
            self.selected = self.filtered.len().saturating_sub(1);
        }
        self.scroll_offset = 0;
    }

    fn cycle_filter(&mut self, field: &str) {
        let options = roster::filter_options(&self.snapshot, field);
        let position = self
            .filters
            .get(field)
            .and_then(|current| options.iter().position(|o| o == current))
            .unwrap_or(0);
        let next = &options[(position + 1) % options.len()];
        self.filters.set(field, Some(next.clone()));
        self.refilter();
        self.selected = 0;
    }

    fn next(&mut self) {
        if !self.filtered.is_empty() && self.selected < self.filtered.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    /// Commits one cell edit against the record's original row, shows
    /// a notice, debounces, then re-fetches. On failure the on-screen
    /// value stays as edited until the next refresh reconciles it.
    fn commit<S: SheetSession>(
        &mut self,
        store: &RosterStore<S>,
        row: usize,
        column: &str,
        value: &str,
    ) {
        match store.write_cell(row, column, value) {
            Ok(()) => {
                self.notice = Some(format!("Updated {column}."));
                thread::sleep(Duration::from_millis(EDIT_DEBOUNCE_MS));
                self.refresh(store);
            }
            Err(e) => {
                self.notice = Some(format!("Update failed: {e}"));
            }
        }
    }

    fn cycle_status<S: SheetSession>(&mut self, store: &RosterStore<S>) {
        let Some(row) = self.current_row() else { return };
        let next = self.snapshot[row].status_display().next();
        self.commit(store, row, "status", next.label());
    }

    fn cycle_unit<S: SheetSession>(&mut self, store: &RosterStore<S>) {
        let Some(row) = self.current_row() else { return };
        let record = &self.snapshot[row];
        if !record.status_display().allows_unit() {
            self.notice = Some("Unit can only be set for Process in Unit / Offering / Hired.".to_string());
            return;
        }
        // empty first: the catalog plus an "unassigned" choice
        let mut options = vec![""];
        options.extend(UNITS);
        let position = options
            .iter()
            .position(|u| *u == record.select_unit)
            .unwrap_or(0);
        let next = options[(position + 1) % options.len()].to_string();
        self.commit(store, row, "select_unit", &next);
    }
}

pub fn run_browse<S: SheetSession>(store: &RosterStore<S>, filters: FilterSet) -> Result<()> {
    let mut state = AppState::new(filters);
    state.refresh(store);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, store);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop<S: SheetSession>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    store: &RosterStore<S>,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            // free-text entry for the assigned recruiter
            if let Some(buffer) = state.input.as_mut() {
                match key.code {
                    KeyCode::Esc => state.input = None,
                    KeyCode::Backspace => {
                        buffer.pop();
                    }
                    KeyCode::Char(c) => buffer.push(c),
                    KeyCode::Enter => {
                        let value = state.input.take().unwrap_or_default();
                        if let Some(row) = state.current_row() {
                            // only commit when the value actually changed
                            if value != state.snapshot[row].user {
                                state.commit(store, row, "user", &value);
                            }
                        }
                    }
                    _ => {}
                }
                continue;
            }

            let prev_selected = state.selected;
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Char('s') => state.cycle_status(store),
                KeyCode::Char('u') => state.cycle_unit(store),
                KeyCode::Char('e') => {
                    if let Some(row) = state.current_row() {
                        state.input = Some(state.snapshot[row].user.clone());
                    }
                }
                KeyCode::Char('r') => {
                    state.refresh(store);
                    state.notice = Some("Refreshed.".to_string());
                }
                KeyCode::Char('1') => state.cycle_filter(FILTER_FIELDS[0]),
                KeyCode::Char('2') => state.cycle_filter(FILTER_FIELDS[1]),
                KeyCode::Char('3') => state.cycle_filter(FILTER_FIELDS[2]),
                KeyCode::Char('4') => state.cycle_filter(FILTER_FIELDS[3]),
                _ => {}
            }
            if state.selected != prev_selected {
                list_state.select(Some(state.selected));
            }
        }
    }
    Ok(())
}

fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Waiting => " ",
        Status::Screening => "s",
        Status::Interview => "i",
        Status::ProcessInUnit => "p",
        Status::Offering => "o",
        Status::Hired => "+",
        Status::Rejected => "x",
    }
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(outer[0]);

    // Left panel: filtered roster
    let items: Vec<ListItem> = state
        .filtered
        .iter()
        .map(|&row| {
            let record = &state.snapshot[row];
            let code = if record.code.is_empty() { "-" } else { &record.code };
            ListItem::new(format!(
                "{} {:<24} {}",
                status_icon(record.status_display()),
                truncate(&record.name, 24),
                code
            ))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Talent ({}/{}) ",
            state.filtered.len(),
            state.snapshot.len()
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: applicant detail
    let detail = build_detail(state);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Applicant "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    // Active filters and last notice
    let mut status_line = String::new();
    for (i, field) in FILTER_FIELDS.iter().enumerate() {
        let selection = state.filters.get(field).unwrap_or(roster::ALL);
        if i > 0 {
            status_line.push_str("  ");
        }
        status_line.push_str(&format!("{}:{} {}", i + 1, field, selection));
    }
    if let Some(notice) = &state.notice {
        status_line.push_str("  |  ");
        status_line.push_str(notice);
    }
    frame.render_widget(
        Paragraph::new(format!(" {status_line}")).style(Style::default().fg(Color::Yellow)),
        outer[1],
    );

    let help = if state.input.is_some() {
        " type recruiter name, Enter:save Esc:cancel"
    } else {
        " j/k:navigate J/K:scroll 1-4:filters s:status u:unit e:recruiter r:refresh q:quit"
    };
    frame.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        outer[2],
    );
}

fn build_detail<'a>(state: &'a AppState) -> Text<'a> {
    let Some(row) = state.current_row() else {
        return Text::raw("No applicant selected");
    };
    let record = &state.snapshot[row];
    let descriptor = roster::row_descriptor(record);

    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        record.name.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if !record.posisi.is_empty() {
        lines.push(Line::from(format!("applied for {}", record.posisi)));
    }

    let status = record.status_display();
    let status_style = match status {
        Status::Hired => Style::default().fg(Color::Green),
        Status::Offering | Status::ProcessInUnit => Style::default().fg(Color::Cyan),
        Status::Rejected => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::Yellow),
    };
    lines.push(Line::from(Span::styled(
        format!("Status: {}", status.label()),
        status_style,
    )));
    lines.push(Line::from(""));

    for cell in &descriptor.cells {
        if matches!(cell.column, "name" | "posisi" | "status") {
            continue;
        }
        let label = match cell.column {
            "select_unit" => "unit",
            other => other,
        };
        let shown = if state.input.is_some() && cell.column == "user" {
            format!("{}_", state.input.as_deref().unwrap_or_default())
        } else {
            cell.display().to_string()
        };
        let marker = if cell.is_editable() { "*" } else { " " };
        for (i, part) in textwrap::fill(&shown, 64).lines().enumerate() {
            if i == 0 {
                lines.push(Line::from(format!("{marker} {label:<12} {part}")));
            } else {
                lines.push(Line::from(format!("  {:<12} {part}", "")));
            }
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "* editable field",
        Style::default().fg(Color::DarkGray),
    )));

    Text::from(lines)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
