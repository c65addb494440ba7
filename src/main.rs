use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};

use matchup_compiler::compile::{Conversion, convert};
use matchup_compiler::schema::TeamContext;

struct CliArgs {
    input: PathBuf,
    output: PathBuf,
    context: TeamContext,
    pretty: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(cli) = parse_args(&args) else {
        eprintln!(
            "usage: matchup_compiler <input.json> <output.json> <HOME_ABBR> <AWAY_ABBR> [SEASON_YEAR]"
        );
        return ExitCode::from(2);
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[ERROR] {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: &CliArgs) -> Result<()> {
    let raw = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let document: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("invalid json in {}", cli.input.display()))?;

    let Conversion {
        document: compiled,
        diagnostics,
    } = convert(&document, &cli.context)?;

    // Warnings never suppress output; only fatal errors above do.
    for diag in &diagnostics {
        eprintln!("[WARN] {}: {}", diag.section, diag.message);
    }

    write_output(&cli.output, &compiled, cli.pretty)?;
    eprintln!(
        "[INFO] wrote {} ({} warnings)",
        cli.output.display(),
        diagnostics.len()
    );
    Ok(())
}

fn parse_args(args: &[String]) -> Option<CliArgs> {
    if args.len() < 4 || args.len() > 5 {
        return None;
    }
    let season_year = match args.get(4) {
        Some(raw) => Some(raw.trim().parse::<i32>().ok()?),
        None => opt_env("MATCHUP_SEASON_YEAR").and_then(|v| v.trim().parse::<i32>().ok()),
    };
    Some(CliArgs {
        input: PathBuf::from(&args[0]),
        output: PathBuf::from(&args[1]),
        context: TeamContext::new(args[2].trim(), args[3].trim(), season_year),
        pretty: env_bool("MATCHUP_PRETTY", true),
    })
}

fn write_output(
    path: &Path,
    compiled: &matchup_compiler::CompiledDocument,
    pretty: bool,
) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
    }
    let mut json = if pretty {
        serde_json::to_string_pretty(compiled).context("serialize failed")?
    } else {
        serde_json::to_string(compiled).context("serialize failed")?
    };
    json.push('\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to move output into place at {}", path.display()))?;
    Ok(())
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        if val.trim().is_empty() {
            None
        } else {
            Some(val)
        }
    })
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}
