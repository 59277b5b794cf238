// ABOUTME: String builtins: case mapping, trimming, substring access,
// regex splitting/matching and the `s` template interpolation

use crate::errors::RuntimeError;
use crate::values::{Value, ValueData};

fn char_count(s: &str) -> i64 {
    s.chars().count() as i64
}

// Character-based substring indices as the language exposes them.
fn clamp_range(len: i64, start: i64, end: i64) -> Option<(usize, usize)> {
    let mut start = start;
    if start < 0 {
        start += len;
    }
    if start > len {
        return None;
    }
    let mut end = end;
    if end < 0 {
        end += len;
    }
    if end > len {
        end = len;
    }
    start = start.max(0);
    if end < start {
        end = start;
    }
    Some((start as usize, end as usize))
}

pub fn find_in_chars(haystack: &[char], needle: &[char], start: usize) -> i64 {
    if needle.is_empty() {
        return start.min(haystack.len()) as i64;
    }
    if needle.len() > haystack.len() {
        return -1;
    }
    for i in start..=haystack.len().saturating_sub(needle.len()) {
        if haystack[i..i + needle.len()] == *needle {
            return i as i64;
        }
    }
    -1
}

define_native! {
    func_lower,
    name: "lower",
    params: ["str"],
    info: "lower(str)\n\nConverts str to lower case letters.\n\n: lower('Hello') ==> 'hello'",
    |args, _env, _pos| {
        if args.is_null("str") {
            return Ok(Value::null());
        }
        Ok(Value::string(args.get_string("str")?.to_lowercase()))
    }
}

define_native! {
    func_upper,
    name: "upper",
    params: ["str"],
    info: "upper(str)\n\nConverts str to upper case letters.\n\n: upper('Hello') ==> 'HELLO'",
    |args, _env, _pos| {
        if args.is_null("str") {
            return Ok(Value::null());
        }
        Ok(Value::string(args.get_string("str")?.to_uppercase()))
    }
}

define_native! {
    func_trim,
    name: "trim",
    params: ["str"],
    info: "trim(str)\n\nTrims any leading or trailing whitespace from the string str.\n\n: trim(' a  ') ==> 'a'",
    |args, _env, _pos| {
        if args.is_null("str") {
            return Ok(Value::null());
        }
        Ok(Value::string(args.get_string("str")?.trim()))
    }
}

define_native! {
    func_chr,
    name: "chr",
    params: ["n"],
    info: "chr(n)\n\nReturns a single character string for the code point integer n.\n\n: chr(97) ==> 'a'",
    |args, _env, pos| {
        if args.is_null("n") {
            return Ok(Value::null());
        }
        let n = args.get_int("n")?;
        let ch = u32::try_from(n)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| RuntimeError::new(format!("Invalid code point {}", n), pos))?;
        Ok(Value::string(ch.to_string()))
    }
}

define_native! {
    func_ord,
    name: "ord",
    params: ["ch"],
    info: "ord(ch)\n\nReturns the code point integer of the character ch.\n\n: ord('a') ==> 97",
    |args, _env, pos| {
        if args.is_null("ch") {
            return Ok(Value::null());
        }
        let s = args.get_string("ch")?;
        let ch = s
            .chars()
            .next()
            .ok_or_else(|| RuntimeError::new("Cannot take ord of empty string", pos))?;
        Ok(Value::int(ch as i64))
    }
}

define_native! {
    func_substr,
    name: "substr",
    params: ["str", "startidx", "endidx"],
    info: "substr(str, startidx, endidx = length(str))\n\nReturns the substring starting with startidx. Endidx is not included.\n\n: substr('abcd', 2) ==> 'cd'",
    |args, _env, _pos| {
        if args.is_null("str") {
            return Ok(Value::null());
        }
        let s = args.get_string("str")?;
        let len = char_count(&s);
        let start = args.get_int("startidx")?;
        let end = args.get_int_or("endidx", len)?;
        match clamp_range(len, start, end) {
            None => Ok(Value::string("")),
            Some((start, end)) => {
                let chars: Vec<char> = s.chars().collect();
                Ok(Value::string(chars[start..end].iter().collect::<String>()))
            }
        }
    }
}

define_native! {
    func_escape_pattern,
    name: "escape_pattern",
    params: ["s"],
    info: "escape_pattern(s)\n\nEscapes special characters in the string s, so that the result can be\nused in pattern matching to match the literal string.\n\n: escape_pattern('|') ==> '\\\\|'",
    |args, _env, _pos| {
        if args.is_null("s") {
            return Ok(Value::null());
        }
        let value = args.get_string("s")?;
        Ok(Value::string(value.replace('|', "\\|").replace('.', "\\.")))
    }
}

fn split_value(value: &str, pattern: &regex::Regex) -> Value {
    if value.is_empty() {
        return Value::list(Vec::new());
    }
    Value::list(
        pattern
            .split(value)
            .map(Value::string)
            .collect::<Vec<Value>>(),
    )
}

define_native! {
    func_split,
    name: "split",
    params: ["str", "delim"],
    info: "split(str, delim = '[ \\t]+')\n\nSplits the string str into parts and returns a list of strings.\nThe delim is a regular expression.\n\n: split('a,b,c', //,//) ==> ['a', 'b', 'c']",
    |args, _env, _pos| {
        if args.is_null("str") {
            return Ok(Value::null());
        }
        let value = args.get_string("str")?;
        let delim = args.get_as_pattern_or("delim", "[ \\t]+")?;
        Ok(split_value(&value, &delim.regex))
    }
}

define_native! {
    func_split2,
    name: "split2",
    params: ["str", "sep1", "sep2"],
    info: "split2(str, sep1, sep2)\n\nPerforms a two-stage split of the string data, resulting in a list of\nlists of strings.\n\n: split2('a:b|c:d', escape_pattern('|'), escape_pattern(':')) ==> [['a', 'b'], ['c', 'd']]",
    |args, _env, _pos| {
        if args.is_null("str") {
            return Ok(Value::null());
        }
        let value = args.get_string("str")?;
        let sep1 = args.get_as_pattern("sep1")?;
        let sep2 = args.get_as_pattern("sep2")?;
        let outer = split_value(&value, &sep1.regex);
        if let ValueData::List(items) = &outer.data {
            let mut items = items.borrow_mut();
            for item in items.iter_mut() {
                let part = item.as_string()?;
                *item = split_value(&part, &sep2.regex);
            }
        }
        Ok(outer)
    }
}

define_native! {
    func_starts_with,
    name: "starts_with",
    params: ["str", "part"],
    info: "starts_with(str, part)\n\nReturns TRUE if the string str starts with part.\n\n: starts_with('abcdef', 'abc') ==> TRUE\n: starts_with(NULL, 'abc') ==> FALSE",
    |args, _env, _pos| {
        if args.is_null("str") {
            return Ok(Value::boolean(false));
        }
        Ok(Value::boolean(
            args.get_string("str")?.starts_with(&args.get_string("part")?),
        ))
    }
}

define_native! {
    func_ends_with,
    name: "ends_with",
    params: ["str", "part"],
    info: "ends_with(str, part)\n\nReturns TRUE if the string str ends with part.\n\n: ends_with('abcdef', 'def') ==> TRUE",
    |args, _env, _pos| {
        if args.is_null("str") {
            return Ok(Value::boolean(false));
        }
        Ok(Value::boolean(
            args.get_string("str")?.ends_with(&args.get_string("part")?),
        ))
    }
}

define_native! {
    func_contains,
    name: "contains",
    params: ["obj", "part"],
    info: "contains(obj, part)\n\nReturns TRUE if the string obj contains part. If obj is a list, set,\nmap or object, TRUE is returned if part is contained.\n\n: contains('abcdef', 'cde') ==> TRUE\n: contains([1, 2, 3], 2) ==> TRUE",
    |args, _env, _pos| {
        if args.is_null("obj") {
            return Ok(Value::boolean(false));
        }
        let obj = args.get("obj")?;
        let part = args.get("part")?;
        let result = match &obj.data {
            ValueData::List(items) => items.borrow().iter().any(|item| *item == part),
            ValueData::Set(items) => items.borrow().contains(&part),
            ValueData::Map(entries) => entries.borrow().contains_key(&part),
            ValueData::Object(object) => match part.as_string() {
                Ok(key) => object.borrow().members.contains_key(&key),
                Err(_) => false,
            },
            _ => obj.as_string()?.contains(&args.get_string("part")?),
        };
        Ok(Value::boolean(result))
    }
}

define_native! {
    func_matches,
    name: "matches",
    params: ["str", "pattern"],
    info: "matches(str, pattern)\n\nReturns TRUE, if str matches the regular expression pattern.\n\n: matches('abc12', //[a-c]+[1-9]+//) ==> TRUE\n: matches(NULL, //[a-c]+//) ==> FALSE",
    |args, _env, _pos| {
        if args.is_null("str") {
            return Ok(Value::boolean(false));
        }
        let s = args.get_string("str")?;
        let pattern = args.get_as_pattern("pattern")?;
        Ok(Value::boolean(pattern.matches_start(&s)))
    }
}

define_native! {
    func_s,
    name: "s",
    params: ["str", "start"],
    info: "s(str, start = 0)\n\nReturns a string where all placeholders of the form '{var}' are replaced\nwith the value of the expression var. A formatting spec can follow the\nexpression after a # character: [-|0]width[.precision][x].\n\n: def name = 'world'; s('hello {name}') ==> 'hello world'\n: def n = 255; s('n = {n#04x}') ==> 'n = 00ff'",
    |args, env, pos| {
        if args.is_null("str") {
            return Ok(Value::null());
        }
        let s = args.get_string("str")?;
        let mut chars: Vec<char> = s.chars().collect();
        let mut start = args.get_int_or("start", 0)?;
        if start < 0 {
            start += chars.len() as i64;
        }
        let mut start = start.max(0) as usize;

        loop {
            let idx1 = match find_in_chars(&chars, &['{'], start) {
                -1 => return Ok(Value::string(chars.iter().collect::<String>())),
                idx => idx as usize,
            };
            let idx2 = match find_in_chars(&chars, &['}'], idx1 + 1) {
                -1 => return Ok(Value::string(chars.iter().collect::<String>())),
                idx => idx as usize,
            };
            let mut variable: String = chars[idx1 + 1..idx2].iter().collect();
            let mut width = 0i64;
            let mut zeroes = false;
            let mut leading = true;
            let mut digits = -1i64;
            let mut base = 10;
            if let Some(idx3) = variable.find('#') {
                let mut spec = variable[idx3 + 1..].to_string();
                variable.truncate(idx3);
                if let Some(stripped) = spec.strip_prefix('-') {
                    leading = false;
                    spec = stripped.to_string();
                }
                if let Some(stripped) = spec.strip_prefix('0') {
                    zeroes = true;
                    leading = false;
                    spec = stripped.to_string();
                }
                if let Some(stripped) = spec.strip_suffix('x') {
                    base = 16;
                    spec = stripped.to_string();
                }
                match spec.find('.') {
                    None => {
                        width = spec.parse().unwrap_or(0);
                    }
                    Some(idx4) => {
                        digits = spec[idx4 + 1..].parse().unwrap_or(-1);
                        width = spec[..idx4].parse().unwrap_or(0);
                    }
                }
            }
            let node = crate::parser::parse_script(&variable, &pos.filename)
                .map_err(|e| RuntimeError::new(e.msg, pos))?;
            let mut value = node.evaluate(env)?.as_string().map_err(|e| e.at(pos))?;
            if base != 10 {
                let n: i64 = value.parse().map_err(|_| {
                    RuntimeError::new(format!("Cannot convert {} to int", value), pos)
                })?;
                value = format!("{:x}", n);
            } else if digits != -1 {
                let f: f64 = value.parse().map_err(|_| {
                    RuntimeError::new(format!("Cannot convert {} to decimal", value), pos)
                })?;
                let factor = 10f64.powi(digits as i32);
                value = crate::values::format_decimal((f * factor).round() / factor);
            }
            let mut value_chars: Vec<char> = value.chars().collect();
            while (value_chars.len() as i64) < width {
                if leading {
                    value_chars.insert(0, ' ');
                } else if zeroes {
                    value_chars.insert(0, '0');
                } else {
                    value_chars.push(' ');
                }
            }
            chars.splice(idx1..=idx2, value_chars.iter().cloned());
            start = idx1 + value_chars.len();
        }
    }
}
