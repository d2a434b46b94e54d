use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;
use time::OffsetDateTime;

use crate::api::{AdvisoryValidation, CatalogApi};
use crate::catalog::FormField;
use crate::config::{themes::ThemeRegistry, AppConfig};
use crate::ui::{self, RenderOptions};

mod actions;
pub mod state;
mod worker;

pub use actions::ActionDispatcher;
pub use state::{ApiRequest, Effect, Overlay, PageAction, PageState, PageView};
pub use worker::ApiWorker;

pub struct App {
    pub config: Arc<AppConfig>,
    state: PageState,
    list_state: ListState,
    worker: ApiWorker,
    toast_deadline: Option<(u64, Instant)>,
    render: RenderOptions,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, api: Box<dyn CatalogApi>) -> Result<Self> {
        let worker = ApiWorker::spawn(api, AdvisoryValidation::new(config.api.validation))
            .context("starting catalog api worker")?;
        let render = RenderOptions {
            palette: ThemeRegistry::default().palette(config.ui.theme),
            description_chars: config.ui.description_chars,
            now: OffsetDateTime::now_utc(),
        };
        let mut app = Self {
            state: PageState::new(config.ui.toast_duration()),
            list_state: ListState::default(),
            worker,
            toast_deadline: None,
            render,
            should_quit: false,
            tick_rate: config.tick_rate(),
            config,
        };
        app.dispatch(PageAction::Mount);
        Ok(app)
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            self.render.now = OffsetDateTime::now_utc();
            terminal
                .draw(|frame| {
                    ui::draw_app(frame, &self.state, &mut self.list_state, &self.render);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key(key);
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick();
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    /// Feeds an action through the page reducer and runs the resulting effects.
    pub fn dispatch(&mut self, action: PageAction) {
        let (next, effects) = std::mem::take(&mut self.state).update(action);
        self.state = next;
        for effect in effects {
            match effect {
                Effect::Request(request) => self.worker.dispatch(request),
                Effect::DismissToast { id, after } => {
                    self.toast_deadline = Some((id, Instant::now() + after));
                }
            }
        }
    }

    fn on_tick(&mut self) {
        for action in self.worker.drain() {
            self.dispatch(action);
        }
        if let Some((id, deadline)) = self.toast_deadline {
            if Instant::now() >= deadline {
                self.toast_deadline = None;
                self.dispatch(PageAction::ToastExpired(id));
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        let action = match &self.state.overlay {
            Some(Overlay::Form(form)) => form_key(key, form.focus),
            Some(Overlay::ConfirmDelete(_)) => confirm_key(key),
            None if self.state.search_active => search_key(key),
            None => match key.code {
                KeyCode::Char('q') if plain(key) => {
                    self.should_quit = true;
                    None
                }
                _ => self.list_key(key),
            },
        };
        if let Some(action) = action {
            self.dispatch(action);
        }
    }

    fn list_key(&self, key: KeyEvent) -> Option<PageAction> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('r') => Some(PageAction::Reload),
                _ => None,
            };
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => Some(PageAction::SelectNext),
            KeyCode::Up | KeyCode::Char('k') => Some(PageAction::SelectPrevious),
            KeyCode::Char('/') => Some(PageAction::BeginSearch),
            KeyCode::Char('c') => Some(PageAction::CycleCategory(1)),
            KeyCode::Char('C') => Some(PageAction::CycleCategory(-1)),
            KeyCode::Char('x') => Some(PageAction::ClearFilters),
            KeyCode::Char('a') => Some(PageAction::OpenCreate),
            KeyCode::Char('e') | KeyCode::Enter => Some(PageAction::OpenEditSelected),
            KeyCode::Char('d') | KeyCode::Delete => Some(PageAction::RequestDeleteSelected),
            KeyCode::Char('r') if self.state.error.is_some() => Some(PageAction::Reload),
            _ => None,
        }
    }
}

fn plain(key: KeyEvent) -> bool {
    !key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn search_key(key: KeyEvent) -> Option<PageAction> {
    match key.code {
        KeyCode::Esc => Some(PageAction::CancelSearch),
        KeyCode::Enter => Some(PageAction::FinishSearch),
        KeyCode::Backspace => Some(PageAction::SearchBackspace),
        KeyCode::Char(ch) if plain(key) => Some(PageAction::SearchInput(ch)),
        _ => None,
    }
}

fn form_key(key: KeyEvent, focus: FormField) -> Option<PageAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') => Some(PageAction::Submit),
            _ => None,
        };
    }
    let on_category = focus == FormField::Categoria;
    match key.code {
        KeyCode::Esc => Some(PageAction::CloseOverlay),
        KeyCode::Enter => Some(PageAction::Submit),
        KeyCode::Tab | KeyCode::Down => Some(PageAction::FormNextField),
        KeyCode::BackTab | KeyCode::Up => Some(PageAction::FormPreviousField),
        KeyCode::Left if on_category => Some(PageAction::FormCycleCategory(-1)),
        KeyCode::Right | KeyCode::Char(' ') if on_category => {
            Some(PageAction::FormCycleCategory(1))
        }
        KeyCode::Backspace => Some(PageAction::FormBackspace),
        KeyCode::Char(ch) if plain(key) => Some(PageAction::FormInput(ch)),
        _ => None,
    }
}

fn confirm_key(key: KeyEvent) -> Option<PageAction> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(PageAction::ConfirmDelete),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(PageAction::CloseOverlay),
        _ => None,
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
