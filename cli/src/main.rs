//! trellis CLI — driving adapter for the trellis dispatch engine.
//!
//! Subcommands:
//! - `parse <web.xml> [--trace]` — parse a deployment descriptor, print it as JSON
//! - `check <rules>` — validate a rule-set config loads without errors
//! - `info` — print the descriptor classes and their methods
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::path::Path;
use std::process;

use tracing_subscriber::EnvFilter;
use trellis::{ClassResolver, RuleLoader, RuleLoaderBuilder, RuleSetConfig};

fn main() {
    init_logging();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "parse" => cmd_parse(&args[2..]),
        "check" => cmd_check(&args[2..]),
        "info" => cmd_info(),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("error: unknown command \"{other}\"");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_parse(args: &[String]) -> Result<(), String> {
    let options = parse_options(args)?;
    let path = options
        .path
        .ok_or_else(|| "parse requires a web.xml path".to_string())?;

    let xml = std::fs::read_to_string(&path)
        .map_err(|e| format!("failed to read \"{path}\": {e}"))?;

    tracing::debug!(path = %path, bytes = xml.len(), "parsing descriptor");
    let mut digester = trellis_webapp::digester();
    if options.trace {
        digester.enable_trace();
    }
    let parsed = trellis_webapp::parse_with(&mut digester, &xml);

    // Printed even when the parse failed.
    if let Some(trace) = digester.trace() {
        eprint!("{trace}");
    }

    let app = parsed.map_err(|e| format!("\"{path}\": {e}"))?;
    let json = serde_json::to_string_pretty(&app).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn cmd_check(args: &[String]) -> Result<(), String> {
    let [path] = args else {
        return Err("check requires exactly one rule-set config path".into());
    };

    let config = load_config(path)?;
    let registry = build_loader()
        .load(config)
        .map_err(|e| format!("config invalid: {e}"))?;

    println!(
        "Config valid: {} binding(s) across {} pattern(s)",
        registry.len(),
        registry.patterns().len()
    );
    Ok(())
}

#[allow(clippy::unnecessary_wraps)] // Uniform return type for all commands
fn cmd_info() -> Result<(), String> {
    print!("{}", describe_classes(&trellis_webapp::resolver()));
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// Composition root
// ═══════════════════════════════════════════════════════════════════════════════

fn build_loader() -> RuleLoader {
    RuleLoaderBuilder::new().build()
}

fn describe_classes(resolver: &ClassResolver) -> String {
    let mut out = String::new();
    for name in resolver.class_names() {
        let Some(class) = resolver.get(name) else {
            continue;
        };
        out.push_str(name);
        if !class.supertypes().is_empty() {
            out.push_str(&format!(" : {}", class.supertypes().join(", ")));
        }
        if !class.is_constructible() {
            out.push_str(" (not constructible)");
        }
        out.push('\n');
        for method in class.methods() {
            out.push_str(&format!("  {}\n", method.signature()));
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// Config loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_config(path: &str) -> Result<RuleSetConfig, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read \"{path}\": {e}"))?;
    parse_config(path, &content)
}

fn parse_config(path: &str, content: &str) -> Result<RuleSetConfig, String> {
    let is_json = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(content).map_err(|e| format!("JSON parse error: {e}"))
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(content).map_err(|e| format!("YAML parse error: {e}"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, PartialEq)]
struct ParseOptions {
    path: Option<String>,
    trace: bool,
}

fn parse_options(args: &[String]) -> Result<ParseOptions, String> {
    let mut options = ParseOptions::default();
    for arg in args {
        match arg.as_str() {
            "--trace" => options.trace = true,
            flag if flag.starts_with("--") => {
                return Err(format!("unexpected option \"{flag}\""));
            }
            path if options.path.is_none() => options.path = Some(path.to_owned()),
            extra => return Err(format!("unexpected argument \"{extra}\"")),
        }
    }
    Ok(options)
}

fn print_usage() {
    eprintln!(
        "Usage: trellis <command> [options]

Commands:
  parse <web.xml> [--trace]   Parse a deployment descriptor and print it as JSON
  check <rules>               Validate a rule-set config (.yaml, .yml or .json)
  info                        Print descriptor classes and their methods
  help                        Show this help

Set RUST_LOG (e.g. RUST_LOG=trellis=debug) for engine logging."
    );
}
