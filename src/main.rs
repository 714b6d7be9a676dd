//! `fool` command-line driver.
//!
//! ```text
//! fool run <file.fool> [--code] [--ast] [--steps N] [--memory N]
//! fool build <file.fool> [-o out.asm] [--ast] [--memory N]
//! fool exec <file.asm> [--steps N] [--memory N]
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use fool::prelude::*;
use thiserror::Error;

const USAGE: &str = "usage:
  fool run <file.fool> [--code] [--ast] [--steps N] [--memory N]
  fool build <file.fool> [-o out.asm] [--ast] [--memory N]
  fool exec <file.asm> [--steps N] [--memory N]";

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0}")]
    Fool(#[from] FoolError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Build,
    Exec,
}

#[derive(Debug)]
struct Args {
    command: Command,
    input: PathBuf,
    output: Option<PathBuf>,
    show_code: bool,
    show_ast: bool,
    config: MachineConfig,
}

impl Args {
    fn parse(mut raw: impl Iterator<Item = String>) -> Result<Self, CliError> {
        let command = match raw.next().as_deref() {
            Some("run") => Command::Run,
            Some("build") => Command::Build,
            Some("exec") => Command::Exec,
            Some(other) => return Err(CliError::Usage(format!("unknown command '{other}'"))),
            None => return Err(CliError::Usage("missing command".into())),
        };

        let mut input = None;
        let mut output = None;
        let mut show_code = false;
        let mut show_ast = false;
        let mut config = MachineConfig::default();

        while let Some(arg) = raw.next() {
            match arg.as_str() {
                "--code" => show_code = true,
                "--ast" => show_ast = true,
                "-o" => output = Some(PathBuf::from(value_of(&mut raw, "-o")?)),
                "--steps" => config.step_limit = Some(number_of(&mut raw, "--steps")?),
                "--memory" => config.memory_size = number_of(&mut raw, "--memory")?,
                flag if flag.starts_with('-') => {
                    return Err(CliError::Usage(format!("unknown option '{flag}'")));
                }
                _ if input.is_none() => input = Some(PathBuf::from(&arg)),
                _ => return Err(CliError::Usage(format!("unexpected argument '{arg}'"))),
            }
        }

        let input = input.ok_or_else(|| CliError::Usage("missing input file".into()))?;
        if output.is_some() && command != Command::Build {
            return Err(CliError::Usage("-o is only valid for build".into()));
        }

        Ok(Self {
            command,
            input,
            output,
            show_code,
            show_ast,
            config,
        })
    }
}

fn value_of(raw: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, CliError> {
    raw.next()
        .ok_or_else(|| CliError::Usage(format!("{flag} needs a value")))
}

fn number_of<T: std::str::FromStr>(
    raw: &mut impl Iterator<Item = String>,
    flag: &str,
) -> Result<T, CliError> {
    let value = value_of(raw, flag)?;
    value
        .parse()
        .map_err(|_| CliError::Usage(format!("{flag}: '{value}' is not a number")))
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Compile `source`, printing the requested dumps.
fn compile(source: &str, args: &Args) -> Result<CompiledProgram, CliError> {
    let options = CompileOptions::with_memory_size(args.config.memory_size);
    let compiled = fool::compile(source, &options)?;
    if args.show_ast {
        eprintln!("{}", dump(&compiled.unit));
    }
    if args.show_code {
        eprintln!("{}", compiled.code);
    }
    Ok(compiled)
}

fn execute(args: &Args) -> Result<(), CliError> {
    let source = read(&args.input)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.command {
        Command::Run => {
            let compiled = compile(&source, args)?;
            fool::execute(&compiled.code, args.config, &mut out)?;
        }
        Command::Build => {
            let compiled = compile(&source, args)?;
            let text = format!("{}\n", compiled.code);
            match &args.output {
                Some(path) => fs::write(path, text).map_err(|source| CliError::Io {
                    path: path.clone(),
                    source,
                })?,
                None => out.write_all(text.as_bytes()).map_err(|source| CliError::Io {
                    path: PathBuf::from("<stdout>"),
                    source,
                })?,
            }
        }
        Command::Exec => {
            fool::execute_text(&source, args.config, &mut out)?;
        }
    }
    Ok(())
}

/// Syntax errors are shown against the offending source line.
fn report(error: &CliError, args: Option<&Args>) {
    if let CliError::Usage(message) = error {
        eprintln!("error: {message}\n{USAGE}");
        return;
    }
    if let (CliError::Fool(FoolError::Parse(errors)), Some(args)) = (error, args) {
        if let Ok(source) = fs::read_to_string(&args.input) {
            for parse_error in errors.iter() {
                eprint!("{}", parse_error.display_with_source(&source));
            }
            return;
        }
    }
    eprintln!("error: {error}");
}

fn main() -> ExitCode {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(error) => {
            report(&error, None);
            return ExitCode::from(2);
        }
    };

    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report(&error, Some(&args));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, CliError> {
        Args::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn run_with_flags() {
        let args = parse(&["run", "prog.fool", "--code", "--steps", "500"]).unwrap();
        assert_eq!(args.command, Command::Run);
        assert_eq!(args.input, PathBuf::from("prog.fool"));
        assert!(args.show_code);
        assert!(!args.show_ast);
        assert_eq!(args.config.step_limit, Some(500));
        assert_eq!(args.config.memory_size, MEMSIZE);
    }

    #[test]
    fn build_with_output() {
        let args = parse(&["build", "prog.fool", "-o", "prog.asm", "--memory", "512"]).unwrap();
        assert_eq!(args.output, Some(PathBuf::from("prog.asm")));
        assert_eq!(args.config.memory_size, 512);
    }

    #[test]
    fn bad_invocations() {
        assert!(matches!(parse(&[]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["lint", "x"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["run"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["run", "a", "b"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["run", "a", "--steps"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["run", "a", "--steps", "many"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["exec", "a", "-o", "b"]), Err(CliError::Usage(_))));
        assert!(matches!(parse(&["run", "a", "--fast"]), Err(CliError::Usage(_))));
    }
}
