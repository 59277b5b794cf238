// ABOUTME: Embedding API: base environment construction and the Interpreter
// driving parse + evaluate with the runner/REPL bindings

use crate::builtins;
use crate::environment::{EnvRef, Environment};
use crate::errors::{CklError, RuntimeError};
use crate::io::{InputHandle, OutputHandle};
use crate::lexer::SourcePos;
use crate::parser;
use crate::values::{Value, ValueData};

pub fn get_none_environment() -> EnvRef {
    Environment::new()
}

/// Build the base environment: secure-mode flag, `bind_native`, `NULL`, and
/// the base (or legacy) module evaluated on top.
pub fn get_base_environment(secure: bool, legacy: bool) -> Result<EnvRef, CklError> {
    let env = Environment::new();
    env.put("checkerlang_secure_mode", Value::boolean(secure));
    builtins::bind_native(&env, "bind_native", None, &SourcePos::unknown())?;
    env.put("NULL", Value::null());
    let (filename, script) = if legacy {
        (":legacy", include_str!("modules/legacy.ckl"))
    } else {
        (":base", include_str!("modules/base.ckl"))
    };
    let node = parser::parse_script(script, filename)?;
    node.evaluate(&env)?;
    Ok(env)
}

pub struct Interpreter {
    pub base_environment: EnvRef,
    pub environment: EnvRef,
}

impl Interpreter {
    pub fn new(secure: bool, legacy: bool) -> Result<Interpreter, CklError> {
        let base_environment = get_base_environment(secure, legacy)?;
        base_environment.put("console", Value::output(OutputHandle::console()));
        base_environment.put("stdout", Value::output(OutputHandle::stdout()));
        base_environment.put("stdin", Value::input(InputHandle::stdin()));
        if !secure {
            builtins::bind_native(&base_environment, "run", None, &SourcePos::unknown())?;
        }
        let environment = Environment::with_parent(&base_environment);
        Ok(Interpreter {
            base_environment,
            environment,
        })
    }

    /// Parse and evaluate a script in the interpreter's global environment.
    pub fn interpret(&self, script: &str, filename: &str) -> Result<Value, CklError> {
        self.interpret_in(script, filename, &self.environment)
    }

    /// Parse and evaluate a script in the given environment (normally a
    /// child of the interpreter's global environment).
    pub fn interpret_in(
        &self,
        script: &str,
        filename: &str,
        env: &EnvRef,
    ) -> Result<Value, CklError> {
        let node = parser::parse_script(script, filename)?;
        let result = node.evaluate(env)?;
        match result.data {
            ValueData::Return(value, _) => Ok(*value),
            ValueData::Break(pos) => Err(CklError::Runtime(RuntimeError::new(
                "Cannot use break without surrounding loop",
                &pos,
            ))),
            ValueData::Continue(pos) => Err(CklError::Runtime(RuntimeError::new(
                "Cannot use continue without surrounding loop",
                &pos,
            ))),
            _ => Ok(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_evaluation() {
        let interpreter = Interpreter::new(false, false).expect("interpreter");
        let result = interpreter.interpret("2 + 3 * 4", "{test}").unwrap();
        assert_eq!(result.to_string(), "14");
    }

    #[test]
    fn test_secure_mode_omits_non_secure_builtins() {
        let interpreter = Interpreter::new(true, false).expect("interpreter");
        assert!(!interpreter.base_environment.is_defined("file_input"));
        assert!(!interpreter.base_environment.is_defined("execute"));
        assert!(!interpreter.base_environment.is_defined("run"));
        assert!(interpreter.base_environment.is_defined("add"));
    }

    #[test]
    fn test_legacy_mode_defines_aliases() {
        let interpreter = Interpreter::new(false, true).expect("interpreter");
        let result = interpreter.interpret("is_None(NULL)", "{test}").unwrap();
        assert_eq!(result.to_string(), "TRUE");
    }

    #[test]
    fn test_top_level_return_is_unwrapped() {
        let interpreter = Interpreter::new(false, false).expect("interpreter");
        let result = interpreter
            .interpret("for i in range(10) do if i == 5 then return i end", "{test}")
            .unwrap();
        assert_eq!(result.to_string(), "5");
    }
}
