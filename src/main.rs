//! # Etiqueta CLI
//!
//! Command-line interface for rendering label source to PNG.
//!
//! ## Usage
//!
//! ```bash
//! # Render a label file and write the PNG to stdout
//! etiqueta render label.zpl > label.png
//!
//! # Read from stdin, 2x1 inch label at 300 dpi, save to a file
//! cat label.zpl | etiqueta render - --dpi 300 --width 2 --height 1 --png out.png
//!
//! # Print the result summary (image as base64) as JSON
//! etiqueta render label.zpl --json
//!
//! # Show the probed font map
//! etiqueta fonts
//! ```

use clap::{Parser, Subcommand};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use etiqueta::{
    EtiquetaError, PrinterConfig, RenderOptions, Renderer,
    fonts::FontMap,
};

/// Etiqueta - Label command language renderer
#[derive(Parser, Debug)]
#[command(name = "etiqueta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render label source to a PNG
    Render {
        /// Label source file, or `-` for stdin
        #[arg(default_value = "-")]
        file: String,

        /// Print head resolution in dots per inch
        #[arg(long, default_value_t = PrinterConfig::DPMM_8.dpi)]
        dpi: f32,

        /// Label width in inches
        #[arg(long, default_value_t = 4.0)]
        width: f32,

        /// Label height in inches
        #[arg(long, default_value_t = 6.0)]
        height: f32,

        /// Save the PNG to this path instead of writing it to stdout
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,

        /// Directory --png must stay inside (defaults to the working directory)
        #[arg(long, value_name = "DIR")]
        allowed_dir: Option<PathBuf>,

        /// JSON object of font identifier to font file overrides
        #[arg(long, value_name = "JSON")]
        font_map: Option<PathBuf>,

        /// Print the render result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the font map and ultimate fallback font
    Fonts {
        /// JSON object of font identifier to font file overrides
        #[arg(long, value_name = "JSON")]
        font_map: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the command succeeded.
fn run(command: Commands) -> Result<bool, EtiquetaError> {
    match command {
        Commands::Render {
            file,
            dpi,
            width,
            height,
            png,
            allowed_dir,
            font_map,
            json,
        } => {
            let source = read_source(&file)?;
            let mut options = RenderOptions::new(source).with_dpi(dpi).with_size(width, height);
            if let Some(map) = font_map {
                options = options.with_font_map(load_font_map(&map)?);
            }
            if let Some(path) = &png {
                let allowed = match allowed_dir {
                    Some(dir) => dir,
                    None => std::env::current_dir()?,
                };
                options = options.save_to(path).with_allowed_dir(allowed);
            }

            let result = Renderer::new().render(&options);

            if json {
                let summary = serde_json::to_string_pretty(&result)
                    .map_err(|e| EtiquetaError::Encode(format!("result summary: {}", e)))?;
                println!("{}", summary);
            } else if let Some(error) = &result.error {
                eprintln!("Error: {}", error);
            } else if let Some(path) = &result.path {
                eprintln!("Saved to {}", path.display());
            } else if let Some(image) = &result.image {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(image)?;
                stdout.flush()?;
            }
            Ok(result.success)
        }

        Commands::Fonts { font_map } => {
            let overrides = font_map.as_deref().map(load_font_map).transpose()?;
            let fonts = Renderer::new().fonts(overrides.as_ref());

            println!("Font map:");
            for (id, path) in fonts.map().entries() {
                println!("  {:<12} {}", id, path);
            }
            match fonts.fallback() {
                Some(path) => println!("\nFallback: {}", path),
                None => println!("\nFallback: (none found)"),
            }
            Ok(true)
        }
    }
}

fn read_source(file: &str) -> Result<String, EtiquetaError> {
    if file == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        Ok(std::fs::read_to_string(file)?)
    }
}

fn load_font_map(path: &Path) -> Result<FontMap, EtiquetaError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| EtiquetaError::InvalidOptions(format!("font map {}: {}", path.display(), e)))
}

// ============================================================================
// LOGGING
// ============================================================================

/// Writes `[LEVEL] target: message` lines to stderr.
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
