use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};

use todo_api::{application::todo_service::{TodoService, TodoServiceImpl}, config::{Config, Storage}, domain::todo::{CreateTodo, Todo, UpdateTodo}, infrastructure::{memory_repo::InMemoryTodoRepository, sqlite_repo::SqliteTodoRepository}};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env().context("reading configuration")?;
    let location = match &config.storage {
        Storage::Durable(path) => path.display().to_string(),
        Storage::Volatile => "volatile (not persisted)".to_string(),
    };

    match &config.storage {
        Storage::Durable(path) => {
            let repo = SqliteTodoRepository::connect(path).await.with_context(|| format!("opening database {}", path.display()))?;
            repo.run_then_close(move |repo| with_terminal(TodoServiceImpl::new(repo), location))
                .await
                .context("terminal task panicked")?
        }
        Storage::Volatile => with_terminal(TodoServiceImpl::new(InMemoryTodoRepository::new()), location).await,
    }
}

async fn with_terminal<S: TodoService>(service: S, location: String) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, service, location).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create, Edit }

struct App<S: TodoService> {
    service: S,
    items: Vec<Todo>,
    selected: usize,
    last_tick: Instant,
    mode: Mode,
    list_state: ListState,
    draft: String,
    /// Last service error, shown in the footer until the next action.
    notice: Option<String>,
    location: String,
}

impl<S: TodoService> App<S> {
    async fn load(&mut self) -> Result<()> {
        self.items = self.service.list().await?;
        let len = self.items.len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
        Ok(())
    }

    fn selected_todo(&self) -> Option<&Todo> { self.items.get(self.selected) }

    fn report<T>(&mut self, outcome: todo_api::domain::error::TodoResult<T>) {
        self.notice = outcome.err().map(|e| e.to_string());
    }

    fn reset_draft(&mut self) {
        self.mode = Mode::View;
        self.draft.clear();
    }
}

async fn run_app<S: TodoService>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, service: S, location: String) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut app = App { service, items: vec![], selected: 0, last_tick: Instant::now(), mode: Mode::View, list_state: ListState::default(), draft: String::new(), notice: None, location };
    app.load().await?;

    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                ])
                .split(f.size());

            let header = Paragraph::new("Todos (n: new, e: edit, d: delete, r: reload, q: quit)  |  New/Edit: type text, Enter to save, Esc to cancel")
                .block(Block::default().borders(Borders::ALL).title("todo-tui"));
            f.render_widget(header, chunks[0]);

            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            let list_items: Vec<ListItem> = app.items.iter().map(|t| ListItem::new(format!("#{:<4} {}", t.id, t.text))).collect();
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(format!("items [{}] newest first", app.items.len())))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, middle[0], &mut app.list_state);

            let detail = match app.selected_todo() {
                Some(t) => format!(
                    "Id: {}\n\nText:\n{}\n\nCreated: {}\nUpdated: {}",
                    t.id,
                    t.text,
                    t.created_at.format("%Y-%m-%d %H:%M:%S"),
                    t.updated_at.format("%Y-%m-%d %H:%M:%S"),
                ),
                None => String::new(),
            };
            let details = Paragraph::new(detail)
                .block(Block::default().borders(Borders::ALL).title("details"));
            f.render_widget(details, middle[1]);

            let footer_text = match (&app.notice, app.mode) {
                (Some(notice), Mode::View) => format!("error: {notice}"),
                (None, Mode::View) => format!("DB_PATH={}", app.location),
                (_, Mode::Create) => format!("Create: {}_  |  (Enter to save, Esc to cancel)", app.draft),
                (_, Mode::Edit) => format!("Edit: {}_  |  (Enter to save, Esc to cancel)", app.draft),
            };
            let footer = Paragraph::new(footer_text)
                .block(Block::default().borders(Borders::ALL).title(match app.mode { Mode::View => "info", Mode::Create => "create", Mode::Edit => "edit" }));
            f.render_widget(footer, chunks[2]);
        })?;

        let timeout = tick_rate.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // Only act on key presses; ignore repeats and releases to prevent duplicate input
                if key.kind != KeyEventKind::Press { continue; }
                match app.mode {
                    Mode::View => match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Up => { if app.selected > 0 { app.selected -= 1; app.list_state.select(Some(app.selected)); } }
                        KeyCode::Down => { if app.selected + 1 < app.items.len() { app.selected += 1; app.list_state.select(Some(app.selected)); } }
                        KeyCode::Char('n') => { app.mode = Mode::Create; app.draft.clear(); app.notice = None; }
                        KeyCode::Char('e') => {
                            if let Some(text) = app.selected_todo().map(|t| t.text.clone()) {
                                app.mode = Mode::Edit;
                                app.draft = text;
                                app.notice = None;
                            }
                        }
                        KeyCode::Char('d') => {
                            if let Some(id) = app.selected_todo().map(|t| t.id) {
                                let outcome = app.service.delete(id).await;
                                app.report(outcome);
                                if app.selected > 0 { app.selected -= 1; }
                                app.load().await?;
                            }
                        }
                        KeyCode::Char('r') => { app.notice = None; app.load().await?; }
                        _ => {}
                    },
                    Mode::Create => match key.code {
                        KeyCode::Esc => app.reset_draft(),
                        KeyCode::Enter => {
                            let outcome = app.service.create(CreateTodo { text: app.draft.clone() }).await;
                            if outcome.is_ok() { app.selected = 0; }
                            app.report(outcome);
                            app.reset_draft();
                            app.load().await?;
                        }
                        KeyCode::Backspace => { app.draft.pop(); }
                        KeyCode::Char(c) => app.draft.push(c),
                        _ => {}
                    },
                    Mode::Edit => match key.code {
                        KeyCode::Esc => app.reset_draft(),
                        KeyCode::Enter => {
                            if let Some(id) = app.selected_todo().map(|t| t.id) {
                                let outcome = app.service.update(id, UpdateTodo { text: app.draft.clone() }).await;
                                app.report(outcome);
                            }
                            app.reset_draft();
                            app.load().await?;
                        }
                        KeyCode::Backspace => { app.draft.pop(); }
                        KeyCode::Char(c) => app.draft.push(c),
                        _ => {}
                    },
                }
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            app.last_tick = Instant::now();
        }
    }
    Ok(())
}
