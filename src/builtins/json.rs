// ABOUTME: JSON parsing builtin mapping JSON values onto the runtime model

use std::collections::BTreeMap;

use crate::errors::RuntimeError;
use crate::values::Value;

fn convert(value: &serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::null(),
        serde_json::Value::Bool(b) => Value::boolean(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::int(i)
            } else {
                Value::decimal(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::string(s.clone()),
        serde_json::Value::Array(items) => {
            Value::list(items.iter().map(convert).collect())
        }
        serde_json::Value::Object(entries) => {
            let mut result = BTreeMap::new();
            for (key, value) in entries {
                result.insert(Value::string(key.clone()), convert(value));
            }
            Value::map(result)
        }
    }
}

define_native! {
    func_parse_json,
    name: "parse_json",
    params: ["s"],
    info: "parse_json(s)\n\nParses the JSON string s and returns a map or list. Objects become maps,\narrays become lists, numbers become ints or decimals.\n\n: parse_json('[1, 2.5, 3]') ==> [1, 2.5, 3]",
    |args, _env, pos| {
        let s = args.get_string("s")?;
        let parsed: serde_json::Value = serde_json::from_str(&s)
            .map_err(|_| RuntimeError::new("Cannot parse string as JSON", pos))?;
        Ok(convert(&parsed))
    }
}
