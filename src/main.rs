//! Cognitive TestKit - terminal host for the assessment engine
//!
//! Maps terminal key presses onto the engine's keyboard hub and mouse clicks
//! on the stimulus panel onto click input.

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, MouseButton as CtMouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Position, Rect},
    Terminal,
};
use std::fs::File;
use std::io::stdout;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cognitive_testkit::{
    config::Config,
    input::MouseButton,
    ui::{App, AppState, AppView, HelpPanel, ResultsPanel, StatusBar, StimulusPanel, TabBar},
};

/// Key identifier the engine uses for a terminal key, if it has one
fn key_identifier(code: KeyCode) -> Option<String> {
    Some(match code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) if c.is_ascii_alphabetic() => format!("Key{}", c.to_ascii_uppercase()),
        KeyCode::Char(c) if c.is_ascii_digit() => format!("Digit{}", c),
        KeyCode::Left => "ArrowLeft".to_string(),
        KeyCode::Right => "ArrowRight".to_string(),
        KeyCode::Up => "ArrowUp".to_string(),
        KeyCode::Down => "ArrowDown".to_string(),
        KeyCode::Enter => "Enter".to_string(),
        _ => return None,
    })
}

fn mouse_button(button: CtMouseButton) -> MouseButton {
    match button {
        CtMouseButton::Left => MouseButton::Primary,
        CtMouseButton::Middle => MouseButton::Middle,
        CtMouseButton::Right => MouseButton::Secondary,
    }
}

/// Log to a file; the terminal belongs to the UI
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let path = std::env::temp_dir().join("cognitive-testkit.log");
    match File::create(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}

fn main() -> Result<()> {
    init_logging();

    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("config not loaded, using defaults: {}", e);
        Config::default()
    });

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.clone());
    let outcome = run(&mut terminal, &mut app, &config, &interrupted);

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    outcome?;

    println!("\n{}", app.generate_report().to_text());
    println!("Session duration: {}", app.elapsed_formatted());

    Ok(())
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    config: &Config,
    interrupted: &AtomicBool,
) -> Result<()> {
    let tick_rate = config.refresh_interval();
    let mut stimulus_area = Rect::default();

    loop {
        app.tick();

        let rows = app.current_rows();
        terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),  // Tab bar
                    Constraint::Length(11), // Stimulus
                    Constraint::Min(8),     // Results
                    Constraint::Length(1),  // Status bar
                ])
                .split(frame.area());

            let tab_names: Vec<&str> = AppView::all().iter().map(|v| v.name()).collect();
            frame.render_widget(
                TabBar::new(&tab_names, app.view.index(), app.colors),
                chunks[0],
            );

            match app.view {
                AppView::Help => {
                    let content = chunks[1].union(chunks[2]);
                    frame.render_widget(HelpPanel::new(app.colors), content);
                    stimulus_area = Rect::default();
                }
                view => {
                    frame.render_widget(
                        StimulusPanel::new(app.stimulus_view(), app.colors),
                        chunks[1],
                    );
                    frame.render_widget(
                        ResultsPanel::new(&rows, view.name(), app.colors),
                        chunks[2],
                    );
                    stimulus_area = chunks[1];
                }
            }

            let elapsed = app.elapsed_formatted();
            let completed = app.assessment().session().completed_tests().len();
            let status = StatusBar::new(
                app.phase_name(),
                app.view.name(),
                &elapsed,
                completed,
                app.colors,
            )
            .message(app.get_status());
            frame.render_widget(status, chunks[3]);
        })?;

        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                    if key.code == KeyCode::Char('c') && ctrl {
                        app.quit();
                    } else {
                        let claimed = key_identifier(key.code)
                            .is_some_and(|k| app.key_press(&k).prevent_default);
                        if !claimed {
                            handle_control(app, key.code, key.modifiers);
                        }
                    }
                }
                Event::Mouse(mouse) => {
                    if let MouseEventKind::Down(button) = mouse.kind {
                        if stimulus_area.contains(Position::new(mouse.column, mouse.row)) {
                            app.click(mouse_button(button));
                        }
                    }
                }
                _ => {}
            }
        }

        if interrupted.load(Ordering::SeqCst) {
            app.quit();
        }
        if app.state == AppState::Quitting {
            return Ok(());
        }
    }
}

/// Keys the engine did not claim drive navigation
fn handle_control(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Tab if modifiers.contains(KeyModifiers::SHIFT) => app.prev_view(),
        KeyCode::Tab => app.next_view(),
        KeyCode::Enter => app.confirm(),
        KeyCode::Char(c @ '1'..='6') => {
            let index = c as usize - '1' as usize;
            app.select_view(AppView::from_index(index));
        }
        KeyCode::Char('?') => app.select_view(AppView::Help),
        KeyCode::Char('r') => app.reset_current(),
        KeyCode::Char('n') => app.new_session(false),
        KeyCode::Char('s') => app.new_session(true),
        KeyCode::Char('e') => {
            let filename = format!(
                "cognitive_report_{}.json",
                chrono::Utc::now().format("%Y%m%d_%H%M%S")
            );
            if let Err(e) = app.export_report(&filename) {
                app.set_status(format!("Export failed: {}", e));
            }
        }
        _ => {}
    }
}
