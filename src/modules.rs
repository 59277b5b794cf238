// ABOUTME: Module loader: resolves require specs, loads bundled or on-disk
// module sources, caches module environments and applies the binding mode

use crate::environment::{EnvRef, Environment};
use crate::errors::RuntimeError;
use crate::lexer::SourcePos;
use crate::nodes::Node;
use crate::values::{ObjectValue, Value, ValueData};

/// Module sources bundled with the interpreter. Looked up before the
/// configured module path.
fn builtin_module_source(modulefile: &str) -> Option<&'static str> {
    match modulefile {
        "base.ckl" => Some(include_str!("modules/base.ckl")),
        "legacy.ckl" => Some(include_str!("modules/legacy.ckl")),
        "Math.ckl" => Some(include_str!("modules/Math.ckl")),
        "String.ckl" => Some(include_str!("modules/String.ckl")),
        "List.ckl" => Some(include_str!("modules/List.ckl")),
        "Random.ckl" => Some(include_str!("modules/Random.ckl")),
        _ => None,
    }
}

fn find_module_source(
    env: &EnvRef,
    modulefile: &str,
    pos: &SourcePos,
) -> Result<String, RuntimeError> {
    if let Some(source) = builtin_module_source(modulefile) {
        return Ok(source.to_string());
    }
    if env.is_defined("checkerlang_module_path") {
        let module_path = env.get("checkerlang_module_path", pos)?;
        if let ValueData::List(dirs) = &module_path.data {
            for dir in dirs.borrow().iter() {
                let path = std::path::Path::new(&dir.as_string()?).join(modulefile);
                if let Ok(source) = std::fs::read_to_string(&path) {
                    return Ok(source);
                }
            }
        }
    }
    if let Ok(source) = std::fs::read_to_string(modulefile) {
        return Ok(source);
    }
    Err(RuntimeError::new(
        format!("Module {} not found", modulefile),
        pos,
    ))
}

fn load_or_lookup(
    env: &EnvRef,
    identifier: &str,
    modulefile: &str,
    pos: &SourcePos,
) -> Result<EnvRef, RuntimeError> {
    if let Some(module_env) = Environment::lookup_module(env, identifier) {
        return Ok(module_env);
    }
    let module_env = Environment::with_parent(&Environment::base_of(env));
    let source = find_module_source(env, modulefile, pos)?;
    let stem = modulefile.trim_end_matches(".ckl");
    let node = crate::parser::parse_script(&source, &format!("mod:{}", stem)).map_err(|e| {
        RuntimeError::new(
            format!("Cannot parse module {}: {}", modulefile, e.msg),
            pos,
        )
    })?;
    node.evaluate(&module_env)?;
    Environment::store_module(env, identifier, module_env.clone());
    Ok(module_env)
}

/// Satisfy a `require` form: resolve the spec, load (or reuse) the module
/// environment with cycle detection, then bind qualified, unqualified or
/// selectively into the calling environment.
pub fn eval_require(
    modulespec: &Node,
    name: &Option<String>,
    unqualified: bool,
    symbols: &Option<Vec<(String, String)>>,
    env: &EnvRef,
    pos: &SourcePos,
) -> Result<Value, RuntimeError> {
    // A bare identifier keeps its spelling if it names a loaded module (or
    // nothing at all); a string-valued binding is used as a path; anything
    // else is evaluated and must yield a string.
    let spec = match modulespec {
        Node::Identifier { name: ident, .. } => {
            let mut spec = ident.clone();
            if env.is_defined(ident) {
                let value = env.get(ident, pos)?;
                let is_module = matches!(
                    &value.data,
                    ValueData::Object(obj) if obj.borrow().is_module
                );
                if !is_module {
                    if !value.is_string() {
                        return Err(RuntimeError::new(
                            format!(
                                "Expected string or identifier modulespec but got {}",
                                value.type_name()
                            ),
                            pos,
                        ));
                    }
                    spec = value.as_string()?;
                }
            }
            spec
        }
        node => {
            let value = node.evaluate(env)?;
            if !value.is_string() {
                return Err(RuntimeError::new(
                    format!(
                        "Expected string or identifier modulespec but got {}",
                        value.type_name()
                    ),
                    pos,
                ));
            }
            value.as_string()?
        }
    };

    let modulefile = if spec.ends_with(".ckl") {
        spec.clone()
    } else {
        format!("{}.ckl", spec)
    };
    let last_segment = spec.rsplit('/').next().unwrap_or(&spec);
    let module_identifier = last_segment.trim_end_matches(".ckl").to_string();
    let module_name = name.clone().unwrap_or_else(|| module_identifier.clone());

    Environment::push_module_stack(env, &module_identifier, pos)?;
    let loaded = load_or_lookup(env, &module_identifier, &modulefile, pos);
    Environment::pop_module_stack(env);
    let module_env = loaded?;

    if unqualified {
        let mut names = module_env.local_symbols();
        names.sort();
        for symbol in names {
            if symbol.starts_with('_') {
                continue;
            }
            if let Some(value) = module_env.get_local(&symbol) {
                env.put(&symbol, value);
            }
        }
    } else if let Some(symbols) = symbols {
        for (symbol, alias) in symbols {
            if symbol.starts_with('_') {
                continue;
            }
            if let Some(value) = module_env.get_local(symbol) {
                env.put(alias, value);
            }
        }
    } else {
        let mut obj = ObjectValue::new();
        obj.is_module = true;
        let mut names = module_env.local_symbols();
        names.sort();
        for symbol in names {
            if symbol.starts_with('_') {
                continue;
            }
            if let Some(value) = module_env.get_local(&symbol) {
                // nested modules are not re-exported
                if matches!(&value.data, ValueData::Object(o) if o.borrow().is_module) {
                    continue;
                }
                obj.members.insert(symbol, value);
            }
        }
        env.put(&module_name, Value::object(obj));
    }
    Ok(Value::null())
}
