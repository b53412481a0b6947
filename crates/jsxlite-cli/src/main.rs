use clap::{Args, Parser, Subcommand};
use jsxlite_codegen::{looks_already_compiled, CompileOptions, PostProcessRule};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "jsxlite")]
#[command(about = "jsxlite — compile markup-extended JavaScript to plain JavaScript")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    options: OptionFlags,

    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a source file to plain JavaScript
    Build {
        /// Input source file
        path: PathBuf,

        /// Output file (defaults to <stem>.js next to the input)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Check a source file for errors without writing output
    Check {
        /// Input source file
        path: PathBuf,
    },
}

#[derive(Args, Default)]
struct OptionFlags {
    /// JSON file with compile options (camelCase keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Element factory function, e.g. `h`
    #[arg(long, global = true)]
    factory: Option<String>,

    /// Fragment identifier, e.g. `Fragment`
    #[arg(long, global = true)]
    fragment: Option<String>,

    /// Maximum element nesting depth
    #[arg(long, global = true)]
    max_recursive_calls: Option<usize>,

    /// Do not prefix output with a "use strict" directive
    #[arg(long, global = true)]
    no_strict: bool,

    /// Remove import lines and export keywords from the output
    #[arg(long, global = true)]
    strip_modules: bool,

    /// Compile even when the input already looks compiled
    #[arg(long, global = true)]
    force: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = match load_options(&cli.options) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::Build { path, out } => cmd_build(&path, out, &options, cli.options.force),
        Command::Check { path } => cmd_check(&path, &options, cli.options.force),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Defaults, then the config file, then explicit flags.
fn load_options(flags: &OptionFlags) -> Result<CompileOptions, String> {
    let mut options = match &flags.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("reading {}: {e}", path.display()))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("invalid config {}: {e}", path.display()))?
        }
        None => CompileOptions::default(),
    };

    if let Some(factory) = &flags.factory {
        options.factory_name = factory.clone();
    }
    if let Some(fragment) = &flags.fragment {
        options.fragment_name = fragment.clone();
    }
    if let Some(max) = flags.max_recursive_calls {
        options.max_recursive_calls = max;
    }
    if flags.no_strict {
        options.inject_strict_mode = false;
    }
    if flags.strip_modules {
        options
            .post_process_rules
            .extend(PostProcessRule::strip_module_syntax());
    }

    log::debug!(
        "factory {}, fragment {}, {} post-process rules",
        options.factory_name,
        options.fragment_name,
        options.post_process_rules.len()
    );
    Ok(options)
}

fn read_source(path: &Path) -> String {
    if !path.exists() {
        eprintln!("Error: file not found: {}", path.display());
        std::process::exit(1);
    }
    match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {}: {e}", path.display());
            std::process::exit(1);
        }
    }
}

/// `<stem>.js` next to the input.
fn default_output_path(path: &Path) -> PathBuf {
    path.with_extension("js")
}

fn compile_or_exit(source: &str, options: &CompileOptions) -> String {
    match jsxlite_codegen::compile(source, options) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn cmd_build(path: &Path, out: Option<PathBuf>, options: &CompileOptions, force: bool) {
    let source = read_source(path);
    let out = out.unwrap_or_else(|| default_output_path(path));

    if out == path {
        eprintln!(
            "Error: output {} would overwrite the input; pass -o",
            out.display()
        );
        std::process::exit(1);
    }

    let code = if !force && looks_already_compiled(&source) {
        eprintln!("Skipped: {} already looks compiled", path.display());
        source
    } else {
        compile_or_exit(&source, options)
    };

    if let Err(e) = std::fs::write(&out, &code) {
        eprintln!("Error writing {}: {e}", out.display());
        std::process::exit(1);
    }

    eprintln!("Built: {}", out.display());
}

fn cmd_check(path: &Path, options: &CompileOptions, force: bool) {
    let source = read_source(path);

    if !force && looks_already_compiled(&source) {
        eprintln!("Skipped: {} already looks compiled", path.display());
        return;
    }

    compile_or_exit(&source, options);
    eprintln!("OK: {}", path.display());
}
