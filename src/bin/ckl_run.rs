// ABOUTME: Script runner binary: executes a CheckerLang script with arguments

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use checkerlang::errors::CklError;
use checkerlang::interpreter::Interpreter;
use checkerlang::values::Value;

/// Run a CheckerLang script
#[derive(Parser, Debug)]
#[command(name = "ckl-run")]
#[command(version)]
#[command(about = "Runs a CheckerLang script")]
struct CliArgs {
    /// Script file to execute
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Arguments passed to the script as `args`
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,

    /// Run in secure mode (non-secure builtins are not available)
    #[arg(short = 's', long = "secure")]
    secure: bool,

    /// Load the legacy base library
    #[arg(short = 'l', long = "legacy")]
    legacy: bool,

    /// Add a directory to the module search path (can be repeated)
    #[arg(short = 'm', long = "modulepath", value_name = "DIR")]
    modulepath: Vec<String>,
}

fn report_error(error: &CklError) {
    match error {
        CklError::Runtime(e) => {
            let tag = e
                .value
                .as_string()
                .unwrap_or_else(|_| e.value.to_string());
            match &e.pos {
                Some(pos) => eprintln!("{}: {} (Line {})", tag, e.msg, pos),
                None => eprintln!("{}: {}", tag, e.msg),
            }
            for frame in &e.stacktrace {
                eprintln!("{}", frame);
            }
        }
        CklError::Syntax(e) => match &e.pos {
            Some(pos) => eprintln!("{} (Line {})", e.msg, pos),
            None => eprintln!("{}", e.msg),
        },
    }
}

fn main() -> ExitCode {
    let cli = CliArgs::parse();

    if !cli.script.exists() {
        eprintln!("File not found '{}'", cli.script.display());
        return ExitCode::FAILURE;
    }

    let interpreter = match Interpreter::new(cli.secure, cli.legacy) {
        Ok(interpreter) => interpreter,
        Err(error) => {
            report_error(&error);
            return ExitCode::FAILURE;
        }
    };

    let script_args: Vec<Value> = cli.args.iter().map(Value::string).collect();
    interpreter.environment.put("args", Value::list(script_args));
    interpreter.environment.put(
        "scriptname",
        Value::string(cli.script.to_string_lossy().to_string()),
    );
    let module_path: Vec<Value> = cli.modulepath.iter().map(Value::string).collect();
    interpreter
        .environment
        .put("checkerlang_module_path", Value::list(module_path));

    let script = match std::fs::read_to_string(&cli.script) {
        Ok(script) => script,
        Err(error) => {
            eprintln!("Cannot read script file '{}': {}", cli.script.display(), error);
            return ExitCode::FAILURE;
        }
    };

    let filename = cli
        .script
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| cli.script.to_string_lossy().to_string());

    match interpreter.interpret(&script, &filename) {
        Ok(result) => {
            if !result.is_null() {
                println!("{}", result);
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            report_error(&error);
            ExitCode::FAILURE
        }
    }
}
