use anyhow::Result;

mod app;
mod backend;
mod config;
mod handler;
mod locale;
mod map;
mod session;
mod surface;
mod tui;
mod ui;

use app::App;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    log::info!("starting mapagent against {}", config.base_url());

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let mut app = App::new(&config, events.sender());
    app.request_models();
    // The terminal is live: from here on the map surface may mount.
    app.mark_interactive();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;
        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event),
            None => break,
        }
    }

    tui::restore()?;
    Ok(())
}

/// Logs go to a file; writing to the terminal would corrupt the TUI.
fn init_logging() {
    use simplelog::{ConfigBuilder, WriteLogger};

    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(file) = std::fs::File::create("mapagent.log") {
        let _ = WriteLogger::init(log::LevelFilter::Info, config, file);
    }
}
