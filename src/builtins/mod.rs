// ABOUTME: Builtin function catalog: the define_native! declaration macro,
// the bind_native dispatch and the secure-mode filtering

use crate::environment::{EnvRef, Environment};
use crate::errors::RuntimeError;
use crate::lexer::SourcePos;
use crate::values::{BuiltinFunc, FuncValue, Value};

// Declares a native builtin: the implementation function plus a
// `native_<ident>` constructor producing its BuiltinFunc descriptor.
// Builtins are secure by default; pass `secure: false` for the ones that
// must disappear in secure mode.
macro_rules! define_native {
    {
        $fn_ident:ident,
        name: $name:literal,
        params: [$($param:literal),* $(,)?],
        $(secure: $secure:literal,)?
        info: $info:expr,
        $body:expr
    } => {
        fn $fn_ident(
            args: &$crate::values::Args,
            env: &$crate::environment::EnvRef,
            pos: &$crate::lexer::SourcePos,
        ) -> Result<$crate::values::Value, $crate::errors::RuntimeError> {
            let implementation: fn(
                &$crate::values::Args,
                &$crate::environment::EnvRef,
                &$crate::lexer::SourcePos,
            ) -> Result<$crate::values::Value, $crate::errors::RuntimeError> = $body;
            implementation(args, env, pos)
        }

        paste::paste! {
            pub fn [<native_ $fn_ident>]() -> $crate::values::BuiltinFunc {
                $crate::values::BuiltinFunc {
                    name: $name,
                    params: &[$($param),*],
                    secure: define_native!(@secure $($secure)?),
                    info: $info,
                    fun: $fn_ident,
                }
            }
        }
    };
    (@secure) => { true };
    (@secure $s:literal) => { $s };
}

pub mod arithmetic;
pub mod collections;
pub mod comparison;
pub mod dates;
pub mod io;
pub mod json;
pub mod random;
pub mod reflection;
pub mod strings;
pub mod types;

fn secure_mode(env: &EnvRef) -> bool {
    match Environment::base_of(env).get_local("checkerlang_secure_mode") {
        Some(value) => value.bool_value().unwrap_or(false),
        None => false,
    }
}

/// Bind a builtin function, unless secure mode excludes it.
fn bind_native_fun(env: &EnvRef, func: BuiltinFunc, alias: Option<&str>) {
    if secure_mode(env) && !func.secure {
        return;
    }
    let name = func.name;
    let info = func.info;
    let value = Value::func(FuncValue::Builtin(func)).with_info(info);
    if let Some(alias) = alias {
        env.put(alias, value.clone());
    }
    env.put(name, value);
}

fn bind_constant(env: &EnvRef, name: &str, value: Value) {
    env.put(name, value);
}

/// Bind a native function or constant by name into the environment.
pub fn bind_native(
    env: &EnvRef,
    native: &str,
    alias: Option<&str>,
    pos: &SourcePos,
) -> Result<(), RuntimeError> {
    let func = match native {
        "acos" => arithmetic::native_func_acos(),
        "add" => arithmetic::native_func_add(),
        "append" => collections::native_func_append(),
        "asin" => arithmetic::native_func_asin(),
        "atan" => arithmetic::native_func_atan(),
        "atan2" => arithmetic::native_func_atan2(),
        "bind_native" => reflection::native_func_bind_native(),
        "bit_and" => arithmetic::native_func_bit_and(),
        "bit_or" => arithmetic::native_func_bit_or(),
        "bit_not" => arithmetic::native_func_bit_not(),
        "bit_xor" => arithmetic::native_func_bit_xor(),
        "bit_rotate_left" => arithmetic::native_func_bit_rotate_left(),
        "bit_rotate_right" => arithmetic::native_func_bit_rotate_right(),
        "bit_shift_left" => arithmetic::native_func_bit_shift_left(),
        "bit_shift_right" => arithmetic::native_func_bit_shift_right(),
        "body" => reflection::native_func_body(),
        "boolean" => types::native_func_boolean(),
        "ceiling" => arithmetic::native_func_ceiling(),
        "chr" => strings::native_func_chr(),
        "close" => io::native_func_close(),
        "compare" => comparison::native_func_compare(),
        "contains" => strings::native_func_contains(),
        "cos" => arithmetic::native_func_cos(),
        "date" => types::native_func_date(),
        "decimal" => types::native_func_decimal(),
        "delete_at" => collections::native_func_delete_at(),
        "div" => arithmetic::native_func_div(),
        "ends_with" => strings::native_func_ends_with(),
        "equals" => comparison::native_func_equals(),
        "escape_pattern" => strings::native_func_escape_pattern(),
        "eval" => reflection::native_func_eval(),
        "execute" => io::native_func_execute(),
        "exp" => arithmetic::native_func_exp(),
        "file_input" => io::native_func_file_input(),
        "file_copy" => io::native_func_file_copy(),
        "file_delete" => io::native_func_file_delete(),
        "file_exists" => io::native_func_file_exists(),
        "file_info" => io::native_func_file_info(),
        "file_move" => io::native_func_file_move(),
        "file_output" => io::native_func_file_output(),
        "find" => collections::native_func_find(),
        "find_last" => collections::native_func_find_last(),
        "floor" => arithmetic::native_func_floor(),
        "format_date" => dates::native_func_format_date(),
        "get_env" => io::native_func_get_env(),
        "get_output_string" => io::native_func_get_output_string(),
        "greater" => comparison::native_func_greater(),
        "greater_equals" => comparison::native_func_greater_equals(),
        "identity" => types::native_func_identity(),
        "if_empty" => types::native_func_if_empty(),
        "if_null" => types::native_func_if_null(),
        "if_null_or_empty" => types::native_func_if_null_or_empty(),
        "info" => reflection::native_func_info(),
        "insert_at" => collections::native_func_insert_at(),
        "int" => types::native_func_int(),
        "is_empty" => comparison::native_func_is_empty(),
        "is_not_empty" => comparison::native_func_is_not_empty(),
        "is_not_null" => comparison::native_func_is_not_null(),
        "is_null" => comparison::native_func_is_null(),
        "length" => collections::native_func_length(),
        "less" => comparison::native_func_less(),
        "less_equals" => comparison::native_func_less_equals(),
        "list" => types::native_func_list(),
        "list_dir" => io::native_func_list_dir(),
        "log" => arithmetic::native_func_log(),
        "lower" => strings::native_func_lower(),
        "ls" => reflection::native_func_ls(),
        "make_dir" => io::native_func_make_dir(),
        "map" => types::native_func_map(),
        "matches" => strings::native_func_matches(),
        "mod" => arithmetic::native_func_mod(),
        "mul" => arithmetic::native_func_mul(),
        "not_equals" => comparison::native_func_not_equals(),
        "object" => types::native_func_object(),
        "ord" => strings::native_func_ord(),
        "parse" => reflection::native_func_parse(),
        "parse_date" => dates::native_func_parse_date(),
        "parse_json" => json::native_func_parse_json(),
        "pattern" => types::native_func_pattern(),
        "pow" => arithmetic::native_func_pow(),
        "print" => io::native_func_print(),
        "println" => io::native_func_println(),
        "process_lines" => io::native_func_process_lines(),
        "put" => collections::native_func_put(),
        "random" => random::native_func_random(),
        "range" => collections::native_func_range(),
        "read" => io::native_func_read(),
        "read_all" => io::native_func_read_all(),
        "readln" => io::native_func_readln(),
        "remove" => collections::native_func_remove(),
        "round" => arithmetic::native_func_round(),
        "run" => io::native_func_run(),
        "s" => strings::native_func_s(),
        "set" => types::native_func_set(),
        "set_seed" => random::native_func_set_seed(),
        "sin" => arithmetic::native_func_sin(),
        "sorted" => collections::native_func_sorted(),
        "split" => strings::native_func_split(),
        "split2" => strings::native_func_split2(),
        "sqrt" => arithmetic::native_func_sqrt(),
        "str_input" => io::native_func_str_input(),
        "starts_with" => strings::native_func_starts_with(),
        "str_output" => io::native_func_str_output(),
        "string" => types::native_func_string(),
        "sub" => arithmetic::native_func_sub(),
        "sublist" => collections::native_func_sublist(),
        "substr" => strings::native_func_substr(),
        "sum" => arithmetic::native_func_sum(),
        "tan" => arithmetic::native_func_tan(),
        "timestamp" => dates::native_func_timestamp(),
        "trim" => strings::native_func_trim(),
        "type" => types::native_func_type(),
        "upper" => strings::native_func_upper(),
        "zip" => collections::native_func_zip(),
        "zip_map" => collections::native_func_zip_map(),
        "E" => {
            bind_constant(
                env,
                "E",
                Value::decimal(std::f64::consts::E)
                    .with_info("E\n\nThe mathematical constant E (Eulers number)"),
            );
            return Ok(());
        }
        "PI" => {
            bind_constant(
                env,
                "PI",
                Value::decimal(std::f64::consts::PI)
                    .with_info("PI\n\nThe mathematical constant PI"),
            );
            return Ok(());
        }
        "PS" => {
            bind_constant(
                env,
                "PS",
                Value::string(std::path::MAIN_SEPARATOR.to_string())
                    .with_info("PS\n\nThe OS path separator (posix: /, windows: \\)."),
            );
            return Ok(());
        }
        "LS" => {
            let sep = if cfg!(windows) { "\r\n" } else { "\n" };
            bind_constant(
                env,
                "LS",
                Value::string(sep)
                    .with_info("LS\n\nThe OS line separator (posix: \\n, windows: \\r\\n)."),
            );
            return Ok(());
        }
        "FS" => {
            let sep = if cfg!(windows) { ";" } else { ":" };
            bind_constant(
                env,
                "FS",
                Value::string(sep)
                    .with_info("FS\n\nThe OS field separator (posix: :, windows: ;)."),
            );
            return Ok(());
        }
        "OS_NAME" => {
            let name = match std::env::consts::OS {
                "linux" => "Linux",
                "macos" => "macOS",
                "windows" => "Windows",
                _ => "Unknown",
            };
            bind_constant(
                env,
                "OS_NAME",
                Value::string(name).with_info(
                    "OS_NAME\n\nThe name of the operating system, one of Windows, Linux, macOS",
                ),
            );
            return Ok(());
        }
        "OS_VERSION" => {
            bind_constant(
                env,
                "OS_VERSION",
                Value::string("unknown")
                    .with_info("OS_VERSION\n\nThe version of the operating system."),
            );
            return Ok(());
        }
        "OS_ARCH" => {
            let arch = match std::env::consts::ARCH {
                "x86_64" => "amd64",
                "x86" => "x86",
                other => other,
            };
            bind_constant(
                env,
                "OS_ARCH",
                Value::string(arch).with_info(
                    "OS_ARCH\n\nThe architecture of the operating system, e.g. amd64.",
                ),
            );
            return Ok(());
        }
        _ => {
            return Err(RuntimeError::new(
                format!("Unknown native {}", native),
                pos,
            ));
        }
    };
    bind_native_fun(env, func, alias);
    Ok(())
}
