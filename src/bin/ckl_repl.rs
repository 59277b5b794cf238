// ABOUTME: Interactive REPL binary with line editing and continuation prompts

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use checkerlang::errors::CklError;
use checkerlang::interpreter::Interpreter;
use checkerlang::parser::parse_script;
use checkerlang::values::Value;

/// Interactive CheckerLang session
#[derive(Parser, Debug)]
#[command(name = "ckl-repl")]
#[command(version)]
#[command(about = "Starts an interactive CheckerLang session")]
struct CliArgs {
    /// Script files executed before the interactive session starts
    #[arg(value_name = "SCRIPT")]
    scripts: Vec<PathBuf>,

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
                Some(pos) => println!("{}: {} (Line {})", tag, e.msg, pos),
                None => println!("{}: {}", tag, e.msg),
            }
            for frame in &e.stacktrace {
                println!("{}", frame);
            }
        }
        CklError::Syntax(e) => match &e.pos {
            Some(pos) => println!("{} (Line {})", e.msg, pos),
            None => println!("{}", e.msg),
        },
    }
}

fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let interpreter = match Interpreter::new(cli.secure, cli.legacy) {
        Ok(interpreter) => interpreter,
        Err(error) => {
            report_error(&error);
            return ExitCode::FAILURE;
        }
    };

    let module_path: Vec<Value> = cli.modulepath.iter().map(Value::string).collect();
    interpreter
        .environment
        .put("checkerlang_module_path", Value::list(module_path));

    for script in &cli.scripts {
        let source = match std::fs::read_to_string(script) {
            Ok(source) => source,
            Err(error) => {
                eprintln!("Cannot read script file '{}': {}", script.display(), error);
                return ExitCode::FAILURE;
            }
        };
        let filename = script
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| script.to_string_lossy().to_string());
        if let Err(error) = interpreter.interpret(&source, &filename) {
            report_error(&error);
        }
    }

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(error) => {
            eprintln!("Failed to initialize REPL: {}", error);
            return ExitCode::FAILURE;
        }
    };

    let mut line = match rl.readline("> ") {
        Ok(line) => line,
        Err(_) => return ExitCode::SUCCESS,
    };

    loop {
        if line.trim() == "exit" {
            break;
        }

        // incomplete input continues on the next prompt
        if let Err(e) = parse_script(&line, "{stdin}") {
            if e.msg.starts_with("Unexpected end of input") {
                match rl.readline("+ ") {
                    Ok(more) => {
                        line.push('\n');
                        line.push_str(&more);
                        continue;
                    }
                    Err(ReadlineError::Interrupted) => {}
                    Err(_) => break,
                }
            }
        }

        if !line.trim().is_empty() && line.trim() != ";" {
            let _ = rl.add_history_entry(&line);
            match interpreter.interpret(&line, "{stdin}") {
                Ok(value) => {
                    if !value.is_null() {
                        println!("{}", value);
                    }
                }
                Err(error) => report_error(&error),
            }
        }

        line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                String::new()
            }
            Err(_) => break,
        };
    }

    ExitCode::SUCCESS
}
