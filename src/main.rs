mod debug_report;
mod telemetry;

use agentmatch::{AgentAnalyzer, AnalysisResult, Options, RulesetDefinition};
use serde::Serialize;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = match parse_args() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    if let Err(err) = telemetry::initialise() {
        eprintln!("error: {err}");
        return ExitCode::from(1);
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

struct CliConfig {
    rules: PathBuf,
    fields: Vec<String>,
    cache_size: Option<usize>,
    inputs: Vec<String>,
    json: bool,
    verbose: bool,
    color: bool,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    input: &'a str,
    fields: &'a AnalysisResult,
}

fn run(config: &CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let ruleset = RulesetDefinition::load(&config.rules)?;
    let options = Options {
        cache_size: config.cache_size.unwrap_or(Options::default().cache_size),
        fields: (!config.fields.is_empty()).then(|| config.fields.clone()),
    };
    let analyzer = AgentAnalyzer::from_ruleset(&ruleset, &options)?;
    let field_names = analyzer.all_possible_field_names();

    let mut stdout = io::stdout().lock();
    let mut emit = |input: &str| -> Result<(), Box<dyn std::error::Error>> {
        if config.verbose {
            let details = analyzer.analyze_verbose(input);
            debug_report::print_details(&details, &field_names, config.color);
        } else if config.json {
            let result = analyzer.analyze(input);
            serde_json::to_writer(&mut stdout, &JsonLine { input, fields: &result })?;
            writeln!(stdout)?;
        } else {
            let result = analyzer.analyze(input);
            debug_report::print_result(input, &result, &field_names, config.color);
        }
        Ok(())
    };

    if config.inputs.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line?;
            if !line.trim().is_empty() {
                emit(line.trim())?;
            }
        }
    } else {
        for input in &config.inputs {
            emit(input)?;
        }
    }
    Ok(())
}

fn parse_args() -> Result<CliConfig, String> {
    let mut rules: Option<PathBuf> = None;
    let mut fields = Vec::new();
    let mut cache_size = None;
    let mut inputs = Vec::new();
    let mut json = false;
    let mut verbose = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("agentmatch {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--json" => json = true,
            "--verbose" | "-v" => verbose = true,
            "--rules" | "-r" => {
                let value = args.next().ok_or_else(|| "error: --rules expects a file".to_string())?;
                rules = Some(PathBuf::from(value));
            }
            "--field" | "-f" => {
                let value = args.next().ok_or_else(|| "error: --field expects a name".to_string())?;
                fields.push(value);
            }
            "--cache-size" => {
                let value = args.next().ok_or_else(|| "error: --cache-size expects a value".to_string())?;
                cache_size = Some(parse_cache_size(&value)?);
            }
            "--" => {
                let rest = args.by_ref().collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    inputs.push(rest);
                }
                break;
            }
            _ if arg.starts_with("--rules=") => rules = Some(PathBuf::from(arg.trim_start_matches("--rules="))),
            _ if arg.starts_with("--field=") => fields.push(arg.trim_start_matches("--field=").to_string()),
            _ if arg.starts_with("--cache-size=") => {
                cache_size = Some(parse_cache_size(arg.trim_start_matches("--cache-size="))?);
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => inputs.push(arg),
        }
    }

    let rules = rules.ok_or_else(|| format!("error: --rules is required\n\n{}", help_text()))?;
    if json && verbose {
        return Err("error: --json and --verbose cannot be combined".to_string());
    }

    Ok(CliConfig { rules, fields, cache_size, inputs, json, verbose, color })
}

fn parse_cache_size(value: &str) -> Result<usize, String> {
    value.parse().map_err(|_| format!("error: invalid --cache-size '{value}' (expected a non-negative integer)"))
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "agentmatch {version}

Rule-driven user agent analyzer.

Usage:
  agentmatch --rules <file> [OPTIONS] [<user-agent>...]
  agentmatch --rules <file> [OPTIONS] -- <user agent words...>

Each argument is analyzed as one user agent. Without arguments, every
non-empty stdin line is analyzed.

Options:
  -r, --rules <file>         Ruleset (.yaml/.yml or .json). Required.
  -f, --field <name>         Only produce this field. Repeatable.
  --cache-size <n>           Result cache capacity, 0 disables it.
                             Default: {cache}
  --json                     Print one JSON object per input.
  -v, --verbose              Print active/fired matchers and timings.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {log_env}             Log filter (default: warn), e.g. agentmatch=debug.

Exit codes:
  0  Success.
  1  Ruleset or runtime error.
  2  Invalid arguments.
",
        version = env!("CARGO_PKG_VERSION"),
        cache = agentmatch::DEFAULT_CACHE_SIZE,
        log_env = telemetry::LOG_ENV,
    )
}
