//! weactcli - show text on the WeAct Display FS
//!
//! Text comes from a file, from stdin, or from the command line, and is
//! either held on screen for two seconds or scrolled across it once.

mod cli;
mod show;

#[cfg(unix)]
fn main() -> anyhow::Result<()> {
    use anyhow::{anyhow, Context};
    use clap::Parser;

    use weact_app::{default_font, load_config, load_config_from, Config};
    use weact_core::{Color, Display, Orientation, TextRenderer};

    use crate::cli::{load_text, Cli};
    use crate::show::{show_scrolling, show_static};

    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
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

    let text = if cli.cls {
        None
    } else {
        let source = cli.source(is_tty(libc::STDIN_FILENO));
        log::debug!("Reading text from {:?}", source);
        Some(load_text(&source, std::io::stdin().lock())?)
    };

    log::debug!("{:?}", settings);

    let mut display = Display::open(&settings.port).with_context(|| {
        format!(
            "Failed to initialize display on {0}. Check that the device exists (ls -l {0}) \
             and that you may write to it (dialout group)",
            settings.port
        )
    })?;

    if settings.orientation != Orientation::Landscape {
        if let Err(e) = display.set_orientation(settings.orientation) {
            log::warn!("Failed to set orientation: {}", e);
        }
    }
    if settings.brightness != u8::MAX {
        if let Err(e) = display.set_brightness(settings.brightness, 0) {
            log::warn!("Failed to set brightness: {}", e);
        }
    }

    let Some(text) = text else {
        display.clear(Color::BLACK);
        display.update().context("Failed to clear screen")?;
        log::info!("Screen cleared");
        display.close();
        return Ok(());
    };

    let font_path = settings
        .font_path
        .clone()
        .or_else(default_font)
        .ok_or_else(|| anyhow!("Could not find a font; install fonts-dejavu or pass --font"))?;
    let font = TextRenderer::load(&font_path, settings.font_size)
        .with_context(|| format!("Failed to load font {}", font_path.display()))?;

    let shown = match settings.scroll {
        Some(spec) => show_scrolling(
            &mut display,
            &font,
            &text,
            settings.color,
            spec,
            settings.center,
        ),
        None => show_static(&mut display, &font, &text, settings.color, settings.center),
    };
    display.close();
    shown.context("Failed to update display")?;

    log::debug!("Operation completed successfully");
    Ok(())
}

#[cfg(unix)]
fn is_tty(fd: libc::c_int) -> bool {
    unsafe { libc::isatty(fd) == 1 }
}

#[cfg(not(unix))]
fn main() {
    eprintln!("weactcli requires a Unix serial port");
    std::process::exit(1);
}
