use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use veiltext::app::App;
use veiltext::config::Config;
use veiltext::engine::FrequencyModel;
use veiltext::engine::frequency::CharClass;
use veiltext::engine::width::{self, Monospace};
use veiltext::event::{AppEvent, EventHandler, QueueScrollListener};
use veiltext::ui::components::inspector::Inspector;
use veiltext::ui::components::secure_message::SecureMessageCard;
use veiltext::ui::layout::{AppLayout, MESSAGE_HEIGHT, pack_hint_lines};
use veiltext::ui::theme::Theme;

#[derive(Parser)]
#[command(
    name = "veiltext",
    version,
    about = "Terminal demo of layout for text only a trusted renderer can read"
)]
struct Cli {
    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, help = "Layout mode (STANDARD, LESS, MORE, MAX)")]
    layout_mode: Option<String>,

    #[arg(short, long, help = "Scroll recheck interval in milliseconds")]
    interval: Option<u64>,

    #[arg(long, help = "Frequency model TOML file")]
    model: Option<PathBuf>,

    #[arg(short = 'n', long, help = "Number of messages to generate")]
    messages: Option<usize>,

    #[arg(long, help = "Print the frequency model and width estimate as JSON, then exit")]
    estimate: bool,

    #[arg(long, default_value_t = 1.0, help = "Cell width used by --estimate")]
    cell_width: f64,

    #[arg(long, help = "Write the effective configuration to the config file, print it, then exit")]
    write_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().context("loading config")?;
    if let Some(mode) = cli.layout_mode {
        config.layout_mode = mode;
        config.normalize_layout_mode();
    }
    if let Some(ms) = cli.interval {
        config.scroll_interval_ms = ms;
    }
    if let Some(path) = cli.model {
        config.frequency_model = Some(path);
    }
    if let Some(count) = cli.messages {
        config.message_count = count;
    }

    if cli.write_config {
        config.save()?;
        print!("{}", config.to_toml()?);
        println!("# written to {}", Config::config_path().display());
        return Ok(());
    }

    let model = config.frequency_model()?;
    if cli.estimate {
        return print_estimate(&model, cli.cell_width);
    }

    let _log_guard = init_logging(&config.log_file)?;

    let theme = cli
        .theme
        .as_deref()
        .and_then(Theme::load)
        .unwrap_or_default();
    let tick_rate = config.tick_rate();
    let mut app = App::new(config, theme, model);
    tracing::info!(
        messages = app.messages.len(),
        mode = %app.layout_mode,
        interval_ms = app.monitor.interval().as_millis() as u64,
        "starting"
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(tick_rate);
    app.monitor
        .set_listener(QueueScrollListener::new(events.sender()));

    let result = run_app(&mut terminal, &mut app, &events);
    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = %err, "exiting after error");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "veiltext.log".into(), |name| name.to_os_string());

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn print_estimate(model: &FrequencyModel, cell_width: f64) -> Result<()> {
    let widths = width::width_table(&Monospace::new(cell_width));
    let classes: Vec<serde_json::Value> = CharClass::ALL
        .iter()
        .map(|&class| {
            let table = model.table(class);
            serde_json::json!({
                "class": class.as_str(),
                "entries": table.len(),
                "total": table.total(),
            })
        })
        .collect();
    let report = serde_json::json!({
        "weights": model.weights(),
        "classes": classes,
        "required_width_len": model.required_width_len(),
        "cell_width": cell_width,
        "average_char_width": width::try_estimate(model, &widths)?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick => app.on_tick(),
            AppEvent::Scroll(event) => app.on_scroll_event(event),
            AppEvent::Resize(_, _) => app.redraw_visible(),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.shutdown();
        return;
    }

    let page = app.viewport_rows as isize;
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.shutdown(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_by(-1),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_by(1),
        KeyCode::PageUp => app.scroll_by(-page),
        KeyCode::PageDown => app.scroll_by(page),
        KeyCode::Char('m') => app.cycle_layout_mode(),
        KeyCode::Char('c') => app.clear_selected(),
        KeyCode::Char('r') => app.redraw_selected(),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &mut App) {
    let area = frame.area();
    let layout = AppLayout::new(area);
    app.set_viewport_rows(layout.message_rows());

    let colors = &app.theme.colors;
    let scroll_text = if app.is_scrolling() {
        "scrolling"
    } else {
        "idle"
    };
    let header_info = format!(
        " {} | {} | {} secure redraws",
        app.layout_mode, scroll_text, app.secure_redraws
    );
    let mut header_spans = vec![
        Span::styled(
            " veiltext ",
            Style::default()
                .fg(colors.header_fg())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            header_info,
            Style::default().fg(colors.fg()).bg(colors.header_bg()),
        ),
    ];
    if let Some(ref err) = app.last_error {
        header_spans.push(Span::styled(
            format!(" | {err}"),
            Style::default().fg(colors.error()).bg(colors.header_bg()),
        ));
    }
    let header =
        Paragraph::new(Line::from(header_spans)).style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, layout.header);

    let scrolling = app.is_scrolling();
    for (row, idx) in app.visible_range().enumerate() {
        let y = layout.main.y + row as u16 * MESSAGE_HEIGHT;
        let card_area = Rect::new(layout.main.x, y, layout.main.width, MESSAGE_HEIGHT)
            .intersection(layout.main);
        let card = SecureMessageCard::new(&app.messages[idx], idx, &app.theme)
            .selected(idx == app.selected)
            .scrolling(scrolling)
            .estimated_width(app.estimated_width(idx));
        frame.render_widget(card, card_area);
    }

    if let Some(sidebar) = layout.sidebar {
        let inspector = Inspector::new(
            app.messages.get(app.selected),
            &app.model,
            app.monitor.state(),
            app.secure_redraws,
            &app.theme,
        );
        frame.render_widget(inspector, sidebar);
    }

    let hints = [
        "[j/k] Move",
        "[PgUp/PgDn] Page",
        "[m] Layout mode",
        "[c] Clear",
        "[r] Redraw",
        "[q] Quit",
    ];
    let footer_lines: Vec<Line> = pack_hint_lines(&hints, layout.footer.width as usize)
        .into_iter()
        .map(|line| {
            Line::from(Span::styled(
                line,
                Style::default().fg(colors.placeholder()),
            ))
        })
        .collect();
    frame.render_widget(Paragraph::new(footer_lines), layout.footer);
}
