//! weactterm - shell console on the WeAct Display FS
//!
//! stderr shares the terminal the user is typing into, so only warnings are
//! logged unless `-v` is given.

#[cfg(unix)]
fn main() -> anyhow::Result<()> {
    use anyhow::{anyhow, Context};
    use clap::Parser;

    use weact_app::{find_font, load_config, load_config_from, Config};
    use weact_core::{Display, Orientation, TextRenderer};
    use weact_term::cli::Cli;
    use weact_term::engine::{TerminalEngine, BANNER_HOLD};
    use weact_term::tty::RawModeGuard;
    use weact_term::{signals, Banner, TermError};

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match &cli.config {
        Some(path) => load_config_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => load_config().unwrap_or_else(|e| {
            log::warn!("Ignoring config file: {}", e);
            Config::default()
        }),
    };
    let settings = cli.resolve(&config)?;

    let font_path = find_font(settings.font).ok_or_else(|| {
        anyhow!(
            "Could not find a {} font; install fonts-dejavu or fonts-liberation",
            settings.font
        )
    })?;
    let text = TextRenderer::load(&font_path, settings.font_size)
        .with_context(|| format!("Failed to load font {}", font_path.display()))?;

    signals::install();

    let mut display = Display::open(&settings.port)
        .with_context(|| format!("Failed to initialize display on {}", settings.port))?;
    if settings.flip {
        if let Err(e) = display.set_orientation(Orientation::ReverseLandscape) {
            log::warn!("Failed to set flip orientation: {}", e);
        }
    }

    let raw_mode = RawModeGuard::enter(libc::STDIN_FILENO).map_err(TermError::RawMode)?;

    let mut engine = TerminalEngine::start(display, text, &settings.engine_config())
        .context("Failed to start shell")?;

    let banner = Banner {
        font_name: settings.font.name().to_string(),
        font_size: settings.font_size,
        flip: settings.flip,
    };
    engine.show_banner(&banner, BANNER_HOLD);

    let result = engine.run(libc::STDIN_FILENO);
    engine.shutdown();
    drop(raw_mode);

    let reason = result?;
    log::info!("Session ended: {:?}", reason);
    Ok(())
}

#[cfg(not(unix))]
fn main() {
    eprintln!("weactterm requires a Unix pseudo-terminal");
    std::process::exit(1);
}
