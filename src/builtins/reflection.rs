// ABOUTME: Reflection builtins: info text, lambda bodies, parse/eval of
// source text, symbol listing and native binding

use crate::errors::RuntimeError;
use crate::values::{FuncValue, Value, ValueData};

define_native! {
    func_info,
    name: "info",
    params: ["obj"],
    info: "info(obj)\n\nReturns the info text associated with a value (builtin documentation,\ndef docstrings).",
    |args, _env, _pos| {
        let obj = args.get("obj")?;
        match &obj.info {
            Some(info) => Ok(Value::string(info.to_string())),
            None => Ok(Value::string("")),
        }
    }
}

define_native! {
    func_body,
    name: "body",
    params: ["f"],
    info: "body(f)\n\nReturns the body of the lambda f as a node.\n\n: body(fn(x) 2 * x) ==> '(mul 2, x)'",
    |args, _env, pos| {
        let f = args.get("f")?;
        if let ValueData::Func(func) = &f.data {
            if let FuncValue::Lambda(lambda) = &**func {
                return Ok(Value {
                    data: ValueData::Node(lambda.body.clone()),
                    info: None,
                });
            }
        }
        Err(RuntimeError::new("f is not a lambda function", pos))
    }
}

define_native! {
    func_parse,
    name: "parse",
    params: ["s"],
    info: "parse(s)\n\nParses the string s and returns the resulting node.\n\n: parse('2+3') ==> '(add 2, 3)'",
    |args, _env, pos| {
        let s = args.get_string("s")?;
        match crate::parser::parse_script(&s, &pos.filename) {
            Ok(node) => Ok(Value::node(node)),
            Err(_) => Err(RuntimeError::new(
                format!("Cannot parse expression {}", s),
                pos,
            )),
        }
    }
}

define_native! {
    func_eval,
    name: "eval",
    params: ["s"],
    info: "eval(s)\n\nEvaluates the string or node s.\n\n: eval('1+1') ==> 2",
    |args, env, pos| {
        let s = args.get("s")?;
        if let ValueData::Node(node) = &s.data {
            return node.evaluate(env);
        }
        let source = args.get_string("s")?;
        let node = crate::parser::parse_script(&source, &pos.filename)
            .map_err(|_| RuntimeError::new("Cannot evaluate expression", pos))?;
        node.evaluate(env)
            .map_err(|_| RuntimeError::new("Cannot evaluate expression", pos))
    }
}

define_native! {
    func_ls,
    name: "ls",
    params: ["module"],
    info: "ls()\nls(module)\n\nReturns a list of all defined symbols in the current environment or in\nthe specified module.",
    |args, env, pos| {
        let mut result = Vec::new();
        if args.has_arg("module") {
            let module = args.get("module")?;
            let object = if module.is_string() {
                env.get(&module.as_string()?, pos)?
                    .as_object()
                    .map_err(|e| e.at(pos))?
            } else {
                module.as_object().map_err(|e| e.at(pos))?
            };
            for symbol in object.borrow().members.keys() {
                result.push(Value::string(symbol.clone()));
            }
        } else {
            for symbol in env.symbols() {
                result.push(Value::string(symbol));
            }
        }
        Ok(Value::list(result))
    }
}

define_native! {
    func_bind_native,
    name: "bind_native",
    params: ["native", "alias"],
    info: "bind_native(native)\nbind_native(native, alias)\n\nBinds a native function in the current environment.",
    |args, env, pos| {
        let native = args.get_string("native")?;
        let alias = if args.has_arg("alias") {
            Some(args.get_string("alias")?)
        } else {
            None
        };
        super::bind_native(env, &native, alias.as_deref(), pos)?;
        Ok(Value::null())
    }
}
