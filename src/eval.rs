// ABOUTME: Tree-walking evaluator: node dispatch against an environment,
// function invocation with spreads and stack-trace accumulation

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::environment::{EnvRef, Environment};
use crate::errors::RuntimeError;
use crate::lexer::SourcePos;
use crate::modules;
use crate::nodes::{CompStyle, IterWhat, Node};
use crate::values::{
    resolve_member, Args, FuncValue, LambdaFunc, ObjectValue, Value, ValueData,
};

impl Node {
    pub fn evaluate(&self, env: &EnvRef) -> Result<Value, RuntimeError> {
        match self {
            Node::Literal { value, .. } => Ok(value.clone()),
            Node::NullLiteral { .. } => Ok(Value::null()),

            Node::Identifier { name, pos } => env.get(name, pos),

            Node::Assign { name, expr, pos } => {
                if !env.is_defined(name) {
                    return Err(RuntimeError::new(
                        format!("Variable {} is not defined", name),
                        pos,
                    ));
                }
                let value = expr.evaluate(env)?;
                env.set(name, value).map_err(|e| e.at(pos))?;
                env.get(name, pos)
            }

            Node::AssignDestructuring { names, expr, pos } => {
                let values = destructuring_values(&expr.evaluate(env)?, "assign", pos)?;
                let mut result = Value::null();
                for (i, name) in names.iter().enumerate() {
                    let value = values.get(i).cloned().unwrap_or_else(Value::null);
                    if !env.is_defined(name) {
                        return Err(RuntimeError::new(
                            format!("Variable {} is not defined", name),
                            pos,
                        ));
                    }
                    env.set(name, value.clone()).map_err(|e| e.at(pos))?;
                    result = value;
                }
                Ok(result)
            }

            Node::Def {
                name,
                expr,
                info,
                pos: _,
            } => {
                let mut value = expr.evaluate(env)?;
                if !info.is_empty() {
                    value = value.with_info(info);
                }
                rename_lambda(&value, name);
                env.put(name, value.clone());
                Ok(value)
            }

            Node::DefDestructuring {
                names,
                expr,
                info,
                pos,
            } => {
                let mut value = expr.evaluate(env)?;
                if !info.is_empty() {
                    value = value.with_info(info);
                }
                if !value.is_list() && !value.is_set() {
                    return Err(RuntimeError::new(
                        format!(
                            "Destructuring def expects list or set but got {}",
                            value.type_name()
                        ),
                        pos,
                    ));
                }
                let values = destructuring_values(&value, "def", pos)?;
                let mut result = Value::null();
                for (i, name) in names.iter().enumerate() {
                    let value = values.get(i).cloned().unwrap_or_else(Value::null);
                    rename_lambda(&value, name);
                    env.put(name, value.clone());
                    result = value;
                }
                Ok(result)
            }

            Node::Block {
                expressions,
                catches,
                finally_exprs,
                ..
            } => {
                let mut outcome: Result<Value, RuntimeError> = Ok(Value::boolean(true));
                for expression in expressions {
                    match expression.evaluate(env) {
                        Ok(value) => {
                            let unwinds =
                                value.is_return() || value.is_break() || value.is_continue();
                            outcome = Ok(value);
                            if unwinds {
                                break;
                            }
                        }
                        Err(err) => {
                            outcome = Err(err);
                            break;
                        }
                    }
                }
                if let Err(err) = &outcome {
                    let mut handled: Option<Result<Value, RuntimeError>> = None;
                    for (errvalue, expr) in catches {
                        let matched = match errvalue {
                            None => true,
                            Some(node) => match node.evaluate(env) {
                                Ok(value) => value == err.value,
                                Err(e) => {
                                    handled = Some(Err(e));
                                    break;
                                }
                            },
                        };
                        if matched {
                            handled = Some(expr.evaluate(env));
                            break;
                        }
                    }
                    if let Some(result) = handled {
                        outcome = result;
                    }
                }
                // finally expressions run unconditionally, even on error
                for expression in finally_exprs {
                    expression.evaluate(env)?;
                }
                outcome
            }

            Node::If {
                conditions,
                expressions,
                else_expr,
                pos,
            } => {
                for (condition, expression) in conditions.iter().zip(expressions.iter()) {
                    let value = condition.evaluate(env)?;
                    match value.bool_value() {
                        Some(true) => return expression.evaluate(env),
                        Some(false) => continue,
                        None => {
                            return Err(RuntimeError::new(
                                format!(
                                    "Expected boolean condition value but got {}",
                                    value.type_name()
                                ),
                                pos,
                            ));
                        }
                    }
                }
                else_expr.evaluate(env)
            }

            Node::For {
                identifiers,
                expr,
                block,
                what,
                pos,
            } => eval_for(identifiers, expr, block, *what, env, pos),

            Node::While {
                condition,
                block,
                pos,
            } => {
                let mut result = Value::boolean(true);
                loop {
                    let cond = condition.evaluate(env)?;
                    let cond = cond.bool_value().ok_or_else(|| {
                        RuntimeError::new(
                            format!("Expected boolean condition but got {}", cond.type_name()),
                            pos,
                        )
                    })?;
                    if !cond {
                        break;
                    }
                    let value = block.evaluate(env)?;
                    if value.is_break() {
                        result = Value::boolean(true);
                        break;
                    } else if value.is_continue() {
                        result = Value::boolean(true);
                    } else if value.is_return() {
                        result = value;
                        break;
                    } else {
                        result = value;
                    }
                }
                Ok(result)
            }

            Node::And { expressions, pos } => {
                for expression in expressions {
                    let value = expression.evaluate(env)?;
                    match value.bool_value() {
                        Some(true) => continue,
                        Some(false) => return Ok(Value::boolean(false)),
                        None => {
                            return Err(RuntimeError::new(
                                format!("Expected boolean but got {}", value.type_name()),
                                pos,
                            ));
                        }
                    }
                }
                Ok(Value::boolean(true))
            }

            Node::Or { expressions, pos } => {
                for expression in expressions {
                    let value = expression.evaluate(env)?;
                    match value.bool_value() {
                        Some(true) => return Ok(Value::boolean(true)),
                        Some(false) => continue,
                        None => {
                            return Err(RuntimeError::new(
                                format!("Expected boolean but got {}", value.type_name()),
                                pos,
                            ));
                        }
                    }
                }
                Ok(Value::boolean(false))
            }

            Node::Not { expr, pos } => {
                let value = expr.evaluate(env)?;
                match value.bool_value() {
                    Some(b) => Ok(Value::boolean(!b)),
                    None => Err(RuntimeError::new(
                        format!("Expected boolean but got {}", value.type_name()),
                        pos,
                    )),
                }
            }

            Node::In { expr, list, .. } => {
                let value = expr.evaluate(env)?;
                let container = list.evaluate(env)?;
                Ok(Value::boolean(value_in_container(&value, &container)))
            }

            Node::Funcall {
                func,
                names,
                args,
                pos,
            } => {
                let callee = func.evaluate(env)?;
                let callee = match &callee.data {
                    ValueData::Func(f) => f.clone(),
                    _ => {
                        return Err(RuntimeError::new(
                            format!("Expected a function but got {}", callee.type_name()),
                            pos,
                        ));
                    }
                };
                invoke(&callee, names, args, env, pos)
            }

            Node::Lambda {
                arg_names,
                defaults,
                body,
                ..
            } => Ok(Value::func(FuncValue::Lambda(LambdaFunc {
                name: std::cell::RefCell::new("lambda".to_string()),
                arg_names: arg_names.clone(),
                defaults: defaults.iter().map(|d| d.clone().map(Rc::new)).collect(),
                body: body.clone(),
                env: env.clone(),
            }))),

            Node::Deref {
                expr,
                index,
                default,
                pos,
            } => {
                let idx = index.evaluate(env)?;
                let value = expr.evaluate(env)?;
                eval_deref(&value, &idx, default.as_deref(), env, pos)
            }

            Node::DerefAssign {
                expr,
                index,
                value,
                pos,
            } => {
                let idx = index.evaluate(env)?;
                let container = expr.evaluate(env)?;
                let value = value.evaluate(env)?;
                eval_deref_assign(&container, &idx, value, pos)
            }

            Node::DerefInvoke {
                expr,
                member,
                names,
                args,
                pos,
            } => eval_deref_invoke(expr, member, names, args, env, pos),

            Node::ListLiteral { items, pos } => {
                let mut result = Vec::new();
                for item in items {
                    if let Node::Spread { .. } = item {
                        let value = item.evaluate(env)?;
                        let items = value.as_list().map_err(|e| e.at(pos))?;
                        for value in items.borrow().iter() {
                            result.push(value.clone());
                        }
                    } else {
                        result.push(item.evaluate(env)?);
                    }
                }
                Ok(Value::list(result))
            }

            Node::SetLiteral { items, .. } => {
                let mut result = BTreeSet::new();
                for item in items {
                    result.insert(item.evaluate(env)?);
                }
                Ok(Value::set(result))
            }

            Node::MapLiteral { keys, values, .. } => {
                let mut result = BTreeMap::new();
                for (key, value) in keys.iter().zip(values.iter()) {
                    result.insert(key.evaluate(env)?, value.evaluate(env)?);
                }
                Ok(Value::map(result))
            }

            Node::ObjectLiteral { keys, values, .. } => {
                let mut result = ObjectValue::new();
                for (key, value) in keys.iter().zip(values.iter()) {
                    result.members.insert(key.clone(), value.evaluate(env)?);
                }
                Ok(Value::object(result))
            }

            Node::Comprehension {
                set,
                value,
                loop1,
                loop2,
                condition,
                pos,
            } => {
                let local_env = Environment::with_parent(env);
                let mut items: Vec<Value> = Vec::new();
                let mut emit =
                    |local_env: &EnvRef, items: &mut Vec<Value>| -> Result<(), RuntimeError> {
                        let item = value.evaluate(local_env)?;
                        if let Some(condition) = condition {
                            let cond = condition.evaluate(local_env)?;
                            match cond.bool_value() {
                                Some(true) => items.push(item),
                                Some(false) => {}
                                None => {
                                    return Err(RuntimeError::new(
                                        format!(
                                            "Condition must be boolean but got {}",
                                            cond.type_name()
                                        ),
                                        pos,
                                    ));
                                }
                            }
                        } else {
                            items.push(item);
                        }
                        Ok(())
                    };
                match loop2 {
                    None => {
                        let values =
                            get_collection_values(&loop1.expr.evaluate(env)?, loop1.what, pos)?;
                        for value in values {
                            local_env.put(&loop1.identifier, value);
                            emit(&local_env, &mut items)?;
                        }
                    }
                    Some((CompStyle::Parallel, lp2)) => {
                        let values1 =
                            get_collection_values(&loop1.expr.evaluate(env)?, loop1.what, pos)?;
                        let values2 =
                            get_collection_values(&lp2.expr.evaluate(env)?, lp2.what, pos)?;
                        for i in 0..values1.len().max(values2.len()) {
                            local_env.put(
                                &loop1.identifier,
                                values1.get(i).cloned().unwrap_or_else(Value::null),
                            );
                            local_env.put(
                                &lp2.identifier,
                                values2.get(i).cloned().unwrap_or_else(Value::null),
                            );
                            emit(&local_env, &mut items)?;
                        }
                    }
                    Some((CompStyle::Product, lp2)) => {
                        let values1 =
                            get_collection_values(&loop1.expr.evaluate(env)?, loop1.what, pos)?;
                        let values2 =
                            get_collection_values(&lp2.expr.evaluate(env)?, lp2.what, pos)?;
                        for value1 in &values1 {
                            local_env.put(&loop1.identifier, value1.clone());
                            for value2 in &values2 {
                                local_env.put(&lp2.identifier, value2.clone());
                                emit(&local_env, &mut items)?;
                            }
                        }
                    }
                }
                if *set {
                    Ok(Value::set(items.into_iter().collect()))
                } else {
                    Ok(Value::list(items))
                }
            }

            Node::MapComprehension {
                key,
                value,
                loop1,
                condition,
                pos,
            } => {
                let local_env = Environment::with_parent(env);
                let mut result = BTreeMap::new();
                let values = get_collection_values(&loop1.expr.evaluate(env)?, loop1.what, pos)?;
                for item in values {
                    local_env.put(&loop1.identifier, item);
                    let k = key.evaluate(&local_env)?;
                    let v = value.evaluate(&local_env)?;
                    if let Some(condition) = condition {
                        let cond = condition.evaluate(&local_env)?;
                        match cond.bool_value() {
                            Some(true) => {
                                result.insert(k, v);
                            }
                            Some(false) => {}
                            None => {
                                return Err(RuntimeError::new(
                                    format!(
                                        "Condition must be boolean but got {}",
                                        cond.type_name()
                                    ),
                                    pos,
                                ));
                            }
                        }
                    } else {
                        result.insert(k, v);
                    }
                }
                Ok(Value::map(result))
            }

            Node::Spread { expr, .. } => expr.evaluate(env),

            Node::Break { pos } => Ok(Value::break_value(pos.clone())),
            Node::Continue { pos } => Ok(Value::continue_value(pos.clone())),
            Node::Return { expr, pos } => {
                let value = match expr {
                    Some(expr) => expr.evaluate(env)?,
                    None => Value::null(),
                };
                Ok(Value::return_value(value, pos.clone()))
            }

            Node::Error { expr, pos } => {
                let value = expr.evaluate(env)?;
                let msg = value.to_string();
                Err(RuntimeError::with_value(value, msg, pos))
            }

            Node::Require {
                modulespec,
                name,
                unqualified,
                symbols,
                pos,
            } => modules::eval_require(modulespec, name, *unqualified, symbols, env, pos),
        }
    }
}

fn rename_lambda(value: &Value, name: &str) {
    if let ValueData::Func(func) = &value.data {
        if let FuncValue::Lambda(lambda) = &**func {
            if lambda.name.borrow().as_str() == "lambda" {
                *lambda.name.borrow_mut() = name.to_string();
            }
        }
    }
}

fn destructuring_values(
    value: &Value,
    kind: &str,
    pos: &SourcePos,
) -> Result<Vec<Value>, RuntimeError> {
    match &value.data {
        ValueData::List(items) => Ok(items.borrow().clone()),
        ValueData::Set(items) => Ok(items.borrow().iter().cloned().collect()),
        _ => Err(RuntimeError::new(
            format!(
                "Destructuring {} expects list or set but got {}",
                kind,
                value.type_name()
            ),
            pos,
        )),
    }
}

/// The values an iteration visits, snapshotted so the body may mutate the
/// container. `what` selection applies to maps and objects; with no
/// selection, maps iterate entries and objects iterate keys.
pub fn get_collection_values(
    collection: &Value,
    what: Option<IterWhat>,
    pos: &SourcePos,
) -> Result<Vec<Value>, RuntimeError> {
    match &collection.data {
        ValueData::List(items) => Ok(items.borrow().clone()),
        ValueData::Set(items) => Ok(items.borrow().iter().cloned().collect()),
        ValueData::Map(entries) => {
            let entries = entries.borrow();
            match what {
                Some(IterWhat::Keys) => Ok(entries.keys().cloned().collect()),
                Some(IterWhat::Values) => Ok(entries.values().cloned().collect()),
                _ => Ok(entries
                    .iter()
                    .map(|(k, v)| Value::list(vec![k.clone(), v.clone()]))
                    .collect()),
            }
        }
        ValueData::Object(obj) => {
            let obj = obj.borrow();
            match what {
                Some(IterWhat::Values) => Ok(obj.members.values().cloned().collect()),
                Some(IterWhat::Entries) => Ok(obj
                    .members
                    .iter()
                    .map(|(k, v)| Value::list(vec![Value::string(k.clone()), v.clone()]))
                    .collect()),
                _ => Ok(obj
                    .members
                    .keys()
                    .map(|k| Value::string(k.clone()))
                    .collect()),
            }
        }
        ValueData::Str(s) => Ok(s
            .borrow()
            .chars()
            .map(|ch| Value::string(ch.to_string()))
            .collect()),
        _ => Err(RuntimeError::new(
            format!("Cannot iterate over {}", collection.type_name()),
            pos,
        )),
    }
}

fn bind_loop_vars(
    env: &EnvRef,
    identifiers: &[String],
    value: Value,
    pos: &SourcePos,
) -> Result<(), RuntimeError> {
    if identifiers.len() == 1 {
        env.put(&identifiers[0], value);
        return Ok(());
    }
    let values = match &value.data {
        ValueData::List(items) => items.borrow().clone(),
        ValueData::Set(items) => items.borrow().iter().cloned().collect(),
        _ => {
            return Err(RuntimeError::new(
                format!("Cannot destructure {} in for loop", value.type_name()),
                pos,
            ));
        }
    };
    for (i, identifier) in identifiers.iter().enumerate() {
        env.put(identifier, values.get(i).cloned().unwrap_or_else(Value::null));
    }
    Ok(())
}

fn eval_for(
    identifiers: &[String],
    expr: &Node,
    block: &Node,
    what: IterWhat,
    env: &EnvRef,
    pos: &SourcePos,
) -> Result<Value, RuntimeError> {
    let collection = expr.evaluate(env)?;

    let cleanup = |env: &EnvRef| {
        for identifier in identifiers {
            env.remove(identifier);
        }
    };

    // Runs one iteration; Some(value) means the loop is done with that result.
    let mut run_body = |value: Value| -> Result<Option<Value>, RuntimeError> {
        if let Err(err) = bind_loop_vars(env, identifiers, value, pos) {
            cleanup(env);
            return Err(err);
        }
        match block.evaluate(env) {
            Ok(result) => {
                if result.is_break() {
                    Ok(Some(Value::boolean(true)))
                } else if result.is_return() {
                    Ok(Some(result))
                } else {
                    Ok(None)
                }
            }
            Err(err) => {
                cleanup(env);
                Err(err)
            }
        }
    };

    if collection.is_input() {
        let input = collection.as_input().map_err(|e| e.at(pos))?;
        let mut result = Value::boolean(true);
        loop {
            let line = input.borrow_mut().read_line();
            let Some(line) = line else {
                break;
            };
            if let Some(stop) = run_body(Value::string(line))? {
                result = stop;
                break;
            }
        }
        cleanup(env);
        return Ok(result);
    }

    let values = get_collection_values(&collection, Some(what), pos)?;
    let mut result = Value::boolean(true);
    for value in values {
        if let Some(stop) = run_body(value)? {
            result = stop;
            break;
        }
    }
    cleanup(env);
    Ok(result)
}

fn value_in_container(value: &Value, container: &Value) -> bool {
    match &container.data {
        ValueData::List(items) => items.borrow().iter().any(|item| item == value),
        ValueData::Set(items) => items.borrow().contains(value),
        ValueData::Map(entries) => entries.borrow().contains_key(value),
        ValueData::Object(obj) => match value.as_string() {
            Ok(key) => obj.borrow().members.contains_key(&key),
            Err(_) => false,
        },
        ValueData::Str(s) => match value.as_string() {
            Ok(part) => s.borrow().contains(&part),
            Err(_) => false,
        },
        _ => false,
    }
}

fn eval_deref(
    value: &Value,
    idx: &Value,
    default: Option<&Node>,
    env: &EnvRef,
    pos: &SourcePos,
) -> Result<Value, RuntimeError> {
    match &value.data {
        ValueData::Null => Ok(Value::null()),
        ValueData::Str(s) => {
            if default.is_some() {
                return Err(RuntimeError::new(
                    "Default value not allowed in string dereference",
                    pos,
                ));
            }
            let s = s.borrow();
            let chars: Vec<char> = s.chars().collect();
            let i = normalize_index(idx.as_int().map_err(|e| e.at(pos))?, chars.len(), pos)?;
            Ok(Value::string(chars[i].to_string()))
        }
        ValueData::List(items) => {
            if default.is_some() {
                return Err(RuntimeError::new(
                    "Default value not allowed in list dereference",
                    pos,
                ));
            }
            let items = items.borrow();
            let i = normalize_index(idx.as_int().map_err(|e| e.at(pos))?, items.len(), pos)?;
            Ok(items[i].clone())
        }
        ValueData::Map(entries) => {
            let found = entries.borrow().get(idx).cloned();
            match found {
                Some(value) => Ok(value),
                None => match default {
                    Some(default) => default.evaluate(env),
                    None => Err(RuntimeError::new(
                        format!("Map does not contain key {}", idx),
                        pos,
                    )),
                },
            }
        }
        ValueData::Object(obj) => {
            let member = idx.as_string().map_err(|e| e.at(pos))?;
            match resolve_member(obj, &member) {
                Some(value) => Ok(value),
                None => match default {
                    Some(default) => default.evaluate(env),
                    None => Ok(Value::null()),
                },
            }
        }
        _ => Err(RuntimeError::new(
            format!("Cannot dereference value {}", value),
            pos,
        )),
    }
}

fn eval_deref_assign(
    container: &Value,
    idx: &Value,
    value: Value,
    pos: &SourcePos,
) -> Result<Value, RuntimeError> {
    match &container.data {
        ValueData::Str(s) => {
            let chars: Vec<char> = s.borrow().chars().collect();
            let i = normalize_index(idx.as_int().map_err(|e| e.at(pos))?, chars.len(), pos)?;
            let inserted = value.as_string().map_err(|e| e.at(pos))?;
            let mut result: String = chars[..i].iter().collect();
            result.push_str(&inserted);
            result.extend(&chars[i + 1..]);
            *s.borrow_mut() = result;
            Ok(container.clone())
        }
        ValueData::List(items) => {
            let len = items.borrow().len();
            let i = normalize_index(idx.as_int().map_err(|e| e.at(pos))?, len, pos)?;
            items.borrow_mut()[i] = value;
            Ok(container.clone())
        }
        ValueData::Map(entries) => {
            entries.borrow_mut().insert(idx.clone(), value);
            Ok(container.clone())
        }
        ValueData::Object(obj) => {
            let member = idx.as_string().map_err(|e| e.at(pos))?;
            obj.borrow_mut().members.insert(member, value);
            Ok(container.clone())
        }
        _ => Err(RuntimeError::new(
            format!("Cannot deref-assign {}", container),
            pos,
        )),
    }
}

fn normalize_index(index: i64, len: usize, pos: &SourcePos) -> Result<usize, RuntimeError> {
    let mut i = index;
    if i < 0 {
        i += len as i64;
    }
    if i < 0 || i >= len as i64 {
        Err(RuntimeError::new(
            format!("Index out of bounds {}", index),
            pos,
        ))
    } else {
        Ok(i as usize)
    }
}

fn eval_deref_invoke(
    expr: &Node,
    member: &str,
    names: &[Option<String>],
    args: &[Node],
    env: &EnvRef,
    pos: &SourcePos,
) -> Result<Value, RuntimeError> {
    let receiver = expr.evaluate(env)?;
    match &receiver.data {
        ValueData::Object(obj) => {
            let value = resolve_member(obj, member)
                .ok_or_else(|| RuntimeError::new(format!("Member {} not found", member), pos))?;
            let func = match &value.data {
                ValueData::Func(f) => f.clone(),
                _ => {
                    return Err(RuntimeError::new(
                        format!("Member {} is not a function", member),
                        pos,
                    ));
                }
            };
            // modules get no implicit self argument
            if obj.borrow().is_module {
                invoke(&func, names, args, env, pos)
            } else {
                let mut call_names = Vec::with_capacity(names.len() + 1);
                call_names.push(None);
                call_names.extend(names.iter().cloned());
                let mut call_args = Vec::with_capacity(args.len() + 1);
                call_args.push(Node::Literal {
                    value: receiver.clone(),
                    pos: pos.clone(),
                });
                call_args.extend(args.iter().cloned());
                invoke(&func, &call_names, &call_args, env, pos)
            }
        }
        ValueData::Map(entries) => {
            let value = entries
                .borrow()
                .get(&Value::string(member))
                .cloned()
                .ok_or_else(|| RuntimeError::new(format!("Member {} not found", member), pos))?;
            let func = match &value.data {
                ValueData::Func(f) => f.clone(),
                _ => {
                    return Err(RuntimeError::new(
                        format!("{} is not a function", member),
                        pos,
                    ));
                }
            };
            invoke(&func, names, args, env, pos)
        }
        _ => Err(RuntimeError::new(
            format!("Cannot deref-invoke {}", receiver.type_name()),
            pos,
        )),
    }
}

/// Evaluate actual arguments (expanding spreads), bind them against the
/// function's parameter list and execute. A failing call contributes one
/// stack-trace frame on the way out.
pub fn invoke(
    func: &Rc<FuncValue>,
    names: &[Option<String>],
    arg_nodes: &[Node],
    env: &EnvRef,
    pos: &SourcePos,
) -> Result<Value, RuntimeError> {
    let mut values: Vec<Value> = Vec::new();
    let mut value_names: Vec<Option<String>> = Vec::new();
    for (i, arg) in arg_nodes.iter().enumerate() {
        if let Node::Spread { .. } = arg {
            let spread_value = arg.evaluate(env)?;
            if let ValueData::Map(entries) = &spread_value.data {
                for (key, value) in entries.borrow().iter() {
                    values.push(value.clone());
                    match &key.data {
                        ValueData::Str(s) => value_names.push(Some(s.borrow().clone())),
                        _ => value_names.push(None),
                    }
                }
            } else {
                let items = spread_value.as_list().map_err(|e| e.at(pos))?;
                for value in items.borrow().iter() {
                    values.push(value.clone());
                    value_names.push(None);
                }
            }
        } else {
            values.push(arg.evaluate(env)?);
            value_names.push(names[i].clone());
        }
    }

    let mut args = Args::new(pos);
    args.add_args(&func.arg_names());
    args.set_args(&value_names, values)?;

    execute_func(func, &args, env, pos).map_err(|mut e| {
        e.stacktrace
            .push(format!("{}({}) {}", func.name(), args.to_string_abbrev(), pos));
        e
    })
}

/// Apply a function to already-bound arguments. Builtins run their native
/// implementation; lambdas bind parameters (defaults evaluated in the new
/// call environment) and evaluate their body.
pub fn execute_func(
    func: &Rc<FuncValue>,
    args: &Args,
    env: &EnvRef,
    pos: &SourcePos,
) -> Result<Value, RuntimeError> {
    match &**func {
        FuncValue::Builtin(builtin) => (builtin.fun)(args, env, pos),
        FuncValue::Lambda(lambda) => {
            let local = Environment::with_parent(&lambda.env);
            for (i, name) in lambda.arg_names.iter().enumerate() {
                if args.has_arg(name) {
                    local.put(name, args.get(name)?);
                } else if let Some(default) = &lambda.defaults[i] {
                    let value = default.evaluate(&local)?;
                    local.put(name, value);
                } else {
                    return Err(RuntimeError::new(
                        format!("Missing argument {}", name),
                        pos,
                    ));
                }
            }
            let result = lambda.body.evaluate(&local)?;
            match result.data {
                ValueData::Return(value, _) => Ok(*value),
                ValueData::Break(break_pos) => Err(RuntimeError::new(
                    "Cannot use break without surrounding loop",
                    &break_pos,
                )),
                ValueData::Continue(continue_pos) => Err(RuntimeError::new(
                    "Cannot use continue without surrounding loop",
                    &continue_pos,
                )),
                _ => Ok(result),
            }
        }
    }
}
