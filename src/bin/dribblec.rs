use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use dribble_compiler::discovery::output_path_for;
use dribble_compiler::{build_project, compile_with_options, BuildConfig, BuildError};

const USAGE: &str = "Usage: dribblec <file.dribble>";

struct Args {
    input: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("[Dribble] {}", err);
        process::exit(1);
    }
}

fn parse_args() -> Result<Args, String> {
    let mut input = None;
    let mut config = None;
    let mut args = env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args
                    .next()
                    .ok_or_else(|| format!("missing value for --config\n{}", USAGE))?;
                config = Some(PathBuf::from(value));
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ if arg.starts_with("--") => {
                return Err(format!("unknown argument '{}'\n{}", arg, USAGE));
            }
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            _ => return Err(format!("unexpected argument '{}'\n{}", arg, USAGE)),
        }
    }

    if input.is_none() && config.is_none() {
        return Err(USAGE.to_string());
    }
    Ok(Args { input, config })
}

fn run(args: Args) -> Result<(), BuildError> {
    let config = match &args.config {
        Some(path) => BuildConfig::from_json_file(path)?,
        None => BuildConfig::default(),
    };

    match args.input {
        Some(input) => compile_file(&input, &config),
        // With only a config, build the whole routes tree it points at.
        None => {
            let report = build_project(&config)?;
            if report.is_success() {
                Ok(())
            } else {
                eprintln!(
                    "[Dribble] {} of {} components failed to compile",
                    report.failures.len(),
                    report.failures.len() + report.compiled
                );
                process::exit(1);
            }
        }
    }
}

fn compile_file(input: &Path, config: &BuildConfig) -> Result<(), BuildError> {
    let source = fs::read_to_string(input).map_err(|e| BuildError::io(input, e))?;
    let module = compile_with_options(&input.to_string_lossy(), &source, &config.compile)?;

    let output = output_path_for(input, &config.target_extension);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::write(&output, module.code).map_err(|e| BuildError::io(&output, e))?;

    println!("Compiled {} -> {}", input.display(), output.display());
    Ok(())
}
