//! serterm - replay a serial byte stream through the terminal core
//!
//! Reads bytes from a file (or stdin), feeds them through the receive ring
//! as a UART would, then renders the resulting screen with crossterm.
//! Anything the terminal answered (device reports, XON/XOFF) is printed
//! escaped to stderr.
//!
//! # Quick Start
//!
//! ```text
//! serterm capture.bin          # Render a captured session
//! printf '\e[1;31mhi' | serterm --plain
//! serterm --vt52 vt52.log      # Start in VT52 mode
//! ```

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use serterm::config::{self, Charset, TerminalConfig};
use serterm::core::host::{Color, DrawStyle, Screen, Scroll, System, Uart};
use serterm::core::terminal::Terminal;
use serterm::ui::{GridScreen, LockState, Renderer};

/// Transmit ring size
const TRANSMIT_SIZE: usize = 256;
/// Receive ring size
const RECEIVE_SIZE: usize = 4096;
/// Bytes handed to the receive ring per simulated interrupt
const CHUNK_SIZE: usize = 512;

/// Command line options
#[derive(Default)]
struct Options {
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    charset: Option<Charset>,
    vt52: bool,
    plain: bool,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("serterm {}", VERSION);
}

fn print_help() {
    eprintln!("serterm {} - VT100/ANSI/VT52 serial terminal emulator", VERSION);
    eprintln!();
    eprintln!("Usage: serterm [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Reads FILE (or stdin) as bytes received from the remote host and");
    eprintln!("prints the resulting 24x80 screen.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Configuration file");
    eprintln!("                        (default: ~/.serterm/config.toml)");
    eprintln!("  --ascii               Decode input as 8-bit ASCII");
    eprintln!("  --utf8                Decode input as UTF-8");
    eprintln!("  --vt52                Start in VT52 mode");
    eprintln!("  --plain               No colors or attributes");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Log: ~/.serterm/serterm.log (level from SERTERM_LOG, default info)");
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let mut options = Options::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing config path".to_string());
                }
                options.config_path = Some(PathBuf::from(&args[i]));
            }
            "--ascii" => options.charset = Some(Charset::Ascii),
            "--utf8" => options.charset = Some(Charset::Utf8),
            "--vt52" => options.vt52 = true,
            "--plain" => options.plain = true,
            arg if arg.starts_with('-') && arg != "-" => {
                return Err(format!("Unknown option: {}", arg));
            }
            arg => {
                if options.input.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                if arg != "-" {
                    options.input = Some(PathBuf::from(arg));
                }
            }
        }
        i += 1;
    }

    Ok(options)
}

/// Host that keeps the screen in memory and collects what the terminal
/// transmits
#[derive(Default)]
struct StdoutHost {
    grid: GridScreen,
    transmitted: Vec<u8>,
    leds: LockState,
    resets: usize,
}

impl Screen for StdoutHost {
    fn draw_codepoint(&mut self, row: usize, col: usize, codepoint: char, style: &DrawStyle) {
        self.grid.draw_codepoint(row, col, codepoint, style);
    }

    fn clear_rows(&mut self, from_row: usize, to_row: usize, color: Color) {
        self.grid.clear_rows(from_row, to_row, color);
    }

    fn clear_cols(&mut self, row: usize, from_col: usize, to_col: usize, color: Color) {
        self.grid.clear_cols(row, from_col, to_col, color);
    }

    fn scroll(&mut self, scroll: Scroll, from_row: usize, to_row: usize, rows: usize, color: Color) {
        self.grid.scroll(scroll, from_row, to_row, rows, color);
    }

    fn shift_characters_left(&mut self, row: usize, col: usize, color: Color) {
        self.grid.shift_characters_left(row, col, color);
    }

    fn shift_characters_right(&mut self, row: usize, col: usize, color: Color) {
        self.grid.shift_characters_right(row, col, color);
    }

    fn draw_cursor(&mut self, row: usize, col: usize, color: Color) {
        self.grid.draw_cursor(row, col, color);
    }

    fn set_screen_mode(&mut self, negative: bool) {
        self.grid.set_screen_mode(negative);
    }
}

impl Uart for StdoutHost {
    fn transmit(&mut self, data: &[u8], _head: usize) {
        self.transmitted.extend_from_slice(data);
    }

    fn receive(&mut self, length: usize) {
        debug!("Receive ring armed: {} bytes", length);
    }
}

impl System for StdoutHost {
    fn keyboard_set_leds(&mut self, state: LockState) {
        self.leds = state;
    }

    fn system_reset(&mut self) {
        self.resets += 1;
    }
}

fn init_logging() {
    let log_path = config::home_dir()
        .map(|h| h.join(".serterm").join("serterm.log"))
        .unwrap_or_else(|| PathBuf::from("serterm.log"));

    // Create log directory if needed
    if let Some(parent) = log_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    // Open log file (append mode)
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env("SERTERM_LOG")
            .unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn load_config(options: &Options) -> anyhow::Result<TerminalConfig> {
    let mut config = match &options.config_path {
        Some(path) => TerminalConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TerminalConfig::default_path()
            .map(|path| TerminalConfig::load_or_default(&path))
            .unwrap_or_default(),
    };

    // Command line overrides the file
    if let Some(charset) = options.charset {
        config.charset = charset;
    }
    if options.vt52 {
        config.ansi_mode = false;
    }
    Ok(config)
}

fn read_input(options: &Options) -> anyhow::Result<Vec<u8>> {
    let mut input = Vec::new();
    match &options.input {
        Some(path) => {
            input = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        }
        None => {
            io::stdin()
                .lock()
                .read_to_end(&mut input)
                .context("Failed to read stdin")?;
        }
    }
    Ok(input)
}

/// Push `input` through the receive ring the way the UART interrupt and the
/// main loop share it on hardware
fn feed(term: &mut Terminal<StdoutHost>, mut input: &[u8]) {
    while !input.is_empty() {
        let chunk = &input[..input.len().min(CHUNK_SIZE)];
        let accepted = term.push_received(chunk);
        input = &input[accepted..];

        let head = term.receive_head();
        term.flow_control(term.pending(head));
        term.uart_receive(head);
        term.process_local_echo();
        term.timer_tick();
    }
    term.update_cursor();
}

fn main() -> anyhow::Result<()> {
    let options = match parse_args() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("serterm {} starting...", VERSION);

    let config = load_config(&options)?;
    let input = read_input(&options)?;
    info!("Replaying {} bytes", input.len());

    let mut term = Terminal::new(StdoutHost::default(), config, TRANSMIT_SIZE, RECEIVE_SIZE);
    term.init();
    feed(&mut term, &input);

    let host = term.host();
    info!(
        "Done: cursor {:?}, leds {:?}, resets {}",
        term.cursor_position(),
        host.leds,
        host.resets
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    Renderer::new(options.plain)
        .render(&mut out, &host.grid)
        .context("Failed to render screen")?;

    if !host.transmitted.is_empty() {
        let mut err = io::stderr().lock();
        writeln!(err, "transmitted: {}", host.transmitted.escape_ascii())?;
    }

    Ok(())
}
