use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pseudotex::assembler::Assembler;
use pseudotex::{parser, read_source, render_module, ColorTheme, MacroRegistry};

fn cli() -> Command {
    Command::new("pseudotex")
        .about("Convert Python-style pseudocode to colored LaTeX")
        .arg(
            Arg::new("input")
                .help("Source file to convert")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .index(1),
        )
        .arg(
            Arg::new("prelude")
                .short('p')
                .long("prelude")
                .help("Print the packages and macro definitions before the pseudocode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("theme")
                .short('t')
                .long("theme")
                .help("Color theme: 0 default, 1 light, 2 dark")
                .value_parser(value_parser!(u8).range(0..3)),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Dump the parsed syntax tree as JSON to stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Write a standalone document with the prelude included")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("no-copy")
                .long("no-copy")
                .help("Do not copy the pseudocode to the clipboard")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (repeatable)")
                .action(ArgAction::Count),
        )
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    let input = matches
        .get_one::<PathBuf>("input")
        .context("no input file given")?;
    let theme_index = matches.get_one::<u8>("theme").copied();
    let theme = ColorTheme::preset(usize::from(theme_index.unwrap_or(0)))
        .context("theme index out of range")?;
    let macros = MacroRegistry::standard();
    let assembler = Assembler::new(&macros, theme);

    let source = read_source(input)?;
    let module = parser::parse(&source).with_context(|| format!("failed to parse {}", input.display()))?;
    if matches.get_flag("debug") {
        let tree = serde_json::to_string_pretty(&module).context("failed to serialize syntax tree")?;
        eprintln!("{}", tree);
    }
    let body = render_module(&module, &macros)
        .with_context(|| format!("failed to convert {}", input.display()))?;

    if let Some(output) = matches.get_one::<PathBuf>("output") {
        let document = assembler.document(&body)?;
        fs::write(output, document).with_context(|| format!("failed to write {}", output.display()))?;
        info!(path = %output.display(), theme = theme.name(), "wrote standalone document");
        return Ok(());
    }

    let pseudocode = assembler.bare(&body)?;
    if !matches.get_flag("no-copy") {
        copy_to_clipboard(&pseudocode);
    }

    if matches.get_flag("prelude") {
        println!("{}", assembler.prelude());
    }
    if theme_index.is_some() {
        println!("{}", assembler.colors());
    }
    print!("{}", pseudocode);

    Ok(())
}

#[cfg(feature = "clipboard")]
fn copy_to_clipboard(text: &str) {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text.to_string())) {
        Ok(()) => debug!(bytes = text.len(), "copied pseudocode to clipboard"),
        Err(err) => tracing::warn!("could not copy to clipboard: {}", err),
    }
}

#[cfg(not(feature = "clipboard"))]
fn copy_to_clipboard(_text: &str) {
    debug!("built without clipboard support; skipping copy");
}
