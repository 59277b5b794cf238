// ABOUTME: Collection builtins: length, in-place mutation, slicing, search,
// range, sorting and zipping

use std::rc::Rc;

use crate::environment::{EnvRef, Environment};
use crate::errors::RuntimeError;
use crate::eval::execute_func;
use crate::lexer::SourcePos;
use crate::values::{Args, FuncValue, Value, ValueData};

use super::strings::find_in_chars;

fn call_unary(
    func: &Rc<FuncValue>,
    value: Value,
    env: &EnvRef,
    pos: &SourcePos,
) -> Result<Value, RuntimeError> {
    let arg_names = func.arg_names();
    let param = arg_names
        .first()
        .ok_or_else(|| RuntimeError::new("Function needs at least one argument", pos))?;
    let mut args = Args::new(pos);
    args.add_arg(param, value);
    execute_func(func, &args, env, pos)
}

fn call_binary(
    func: &Rc<FuncValue>,
    a: Value,
    b: Value,
    env: &EnvRef,
    pos: &SourcePos,
) -> Result<Value, RuntimeError> {
    let arg_names = func.arg_names();
    if arg_names.len() < 2 {
        return Err(RuntimeError::new(
            "Function needs at least two arguments",
            pos,
        ));
    }
    let mut args = Args::new(pos);
    args.add_arg(&arg_names[0], a);
    args.add_arg(&arg_names[1], b);
    execute_func(func, &args, env, pos)
}

define_native! {
    func_length,
    name: "length",
    params: ["obj"],
    info: "length(obj)\n\nReturns the length of obj. This works for strings, lists, sets, maps\nand objects.\n\n: length('123') ==> 3\n: length([1, 2, 3]) ==> 3",
    |args, _env, pos| {
        let obj = args.get("obj")?;
        let result = match &obj.data {
            ValueData::Str(s) => s.borrow().chars().count() as i64,
            ValueData::List(items) => items.borrow().len() as i64,
            ValueData::Set(items) => items.borrow().len() as i64,
            ValueData::Map(entries) => entries.borrow().len() as i64,
            ValueData::Object(object) => object.borrow().members.len() as i64,
            _ => {
                return Err(RuntimeError::new(
                    format!("Cannot determine length of {}", obj.type_name()),
                    pos,
                ));
            }
        };
        Ok(Value::int(result))
    }
}

define_native! {
    func_append,
    name: "append",
    params: ["lst", "element"],
    info: "append(lst, element)\n\nAppends the element to the list lst. The lst may also be a set.\nThe container is changed in place and returned.\n\n: append([1, 2], 3) ==> [1, 2, 3]",
    |args, _env, pos| {
        let lst = args.get("lst")?;
        let element = args.get("element")?;
        match &lst.data {
            ValueData::List(items) => {
                items.borrow_mut().push(element);
                Ok(lst.clone())
            }
            ValueData::Set(items) => {
                items.borrow_mut().insert(element);
                Ok(lst.clone())
            }
            _ => Err(RuntimeError::new(
                format!("Cannot append to {}", lst.type_name()),
                pos,
            )),
        }
    }
}

define_native! {
    func_insert_at,
    name: "insert_at",
    params: ["lst", "index", "value"],
    info: "insert_at(lst, index, value)\n\nInserts the element at the given index of the list lst.\nThe list is changed in place. If index is out of bounds, the list is\nnot changed at all.\n\n: insert_at([1, 2, 3], 0, 9) ==> [9, 1, 2, 3]\n: insert_at([1, 2, 3], -1, 9) ==> [1, 2, 3, 9]",
    |args, _env, pos| {
        let lst = args.get("lst")?;
        let ValueData::List(items) = &lst.data else {
            return Err(RuntimeError::new(
                format!("Cannot insert into {}", lst.type_name()),
                pos,
            ));
        };
        let len = items.borrow().len() as i64;
        let mut index = args.get_int("index")?;
        if index < 0 {
            index = len + index + 1;
        }
        if index < 0 {
            index += len;
        }
        let value = args.get("value")?;
        if index <= len && index >= 0 {
            items.borrow_mut().insert(index as usize, value);
        }
        Ok(lst.clone())
    }
}

define_native! {
    func_delete_at,
    name: "delete_at",
    params: ["lst", "index"],
    info: "delete_at(lst, index)\n\nRemoves the element at the given index from the list lst. The list is\nchanged in place. Returns the removed element or NULL, if no element\nwas removed.\n\n: delete_at(['a', 'b', 'c', 'd'], 2) ==> 'c'\n: delete_at(['a', 'b', 'c', 'd'], -3) ==> 'b'",
    |args, _env, pos| {
        let lst = args.get("lst")?;
        let ValueData::List(items) = &lst.data else {
            return Err(RuntimeError::new(
                format!("Cannot delete from {}", lst.type_name()),
                pos,
            ));
        };
        let len = items.borrow().len() as i64;
        let mut index = args.get_int("index")?;
        if index < 0 {
            index += len;
        }
        if index < 0 || index >= len {
            return Ok(Value::null());
        }
        let removed = items.borrow_mut().remove(index as usize);
        Ok(removed)
    }
}

define_native! {
    func_remove,
    name: "remove",
    params: ["lst", "element"],
    info: "remove(lst, element)\n\nRemoves the element from the list lst. The lst may also be a set, a map\nor an object. The container is changed in place and returned.\n\n: remove([1, 2, 3, 4], 3) ==> [1, 2, 4]",
    |args, _env, pos| {
        let lst = args.get("lst")?;
        let element = args.get("element")?;
        match &lst.data {
            ValueData::List(items) => {
                let idx = items.borrow().iter().position(|item| *item == element);
                if let Some(idx) = idx {
                    items.borrow_mut().remove(idx);
                }
                Ok(lst.clone())
            }
            ValueData::Set(items) => {
                items.borrow_mut().remove(&element);
                Ok(lst.clone())
            }
            ValueData::Map(entries) => {
                entries.borrow_mut().remove(&element);
                Ok(lst.clone())
            }
            ValueData::Object(object) => {
                let key = element.as_string().map_err(|e| e.at(pos))?;
                object.borrow_mut().members.shift_remove(&key);
                Ok(lst.clone())
            }
            _ => Err(RuntimeError::new(
                format!("Cannot remove from {}", lst.type_name()),
                pos,
            )),
        }
    }
}

define_native! {
    func_sublist,
    name: "sublist",
    params: ["lst", "startidx", "endidx"],
    info: "sublist(lst, startidx, endidx = length(lst))\n\nReturns the sublist starting with startidx. Endidx is not included.\n\n: sublist([1, 2, 3, 4], 2) ==> [3, 4]",
    |args, _env, _pos| {
        if args.is_null("lst") {
            return Ok(Value::null());
        }
        let items = args.get_list("lst")?;
        let items = items.borrow();
        let len = items.len() as i64;
        let mut start = args.get_int("startidx")?;
        if start < 0 {
            start += len;
        }
        if start > len {
            return Ok(Value::list(Vec::new()));
        }
        let mut end = args.get_int_or("endidx", len)?;
        if end < 0 {
            end += len;
        }
        if end > len {
            end = len;
        }
        let start = start.max(0) as usize;
        let end = end.max(start as i64) as usize;
        Ok(Value::list(items[start..end].to_vec()))
    }
}

define_native! {
    func_find,
    name: "find",
    params: ["obj", "part", "key", "start"],
    info: "find(obj, part, key = identity, start = 0)\n\nReturns the index of the first occurence of part in obj, or -1 if it is\nnot contained. Obj can be a string or a list; list elements can be mapped\nthrough the key function before comparing.\n\n: find('abcdefg', 'cde') ==> 2\n: find([1, 2, 3, 4], 3) ==> 2",
    |args, env, pos| {
        if args.is_null("obj") {
            return Ok(Value::null());
        }
        let obj = args.get("obj")?;
        let key = if args.has_arg("key") {
            Some(args.get_func("key")?)
        } else {
            None
        };
        match &obj.data {
            ValueData::Str(s) => {
                let part = args.get_string("part")?;
                let start = args.get_int_or("start", 0)?.max(0) as usize;
                let haystack: Vec<char> = s.borrow().chars().collect();
                let needle: Vec<char> = part.chars().collect();
                Ok(Value::int(find_in_chars(&haystack, &needle, start)))
            }
            ValueData::List(items) => {
                let item = args.get("part")?;
                let call_env = Environment::with_parent(env);
                let values = items.borrow().clone();
                for (idx, element) in values.iter().enumerate() {
                    let element = match &key {
                        Some(key) => call_unary(key, element.clone(), &call_env, pos)?,
                        None => element.clone(),
                    };
                    if element == item {
                        return Ok(Value::int(idx as i64));
                    }
                }
                Ok(Value::int(-1))
            }
            _ => Err(RuntimeError::new(
                "Find only works with strings and lists",
                pos,
            )),
        }
    }
}

define_native! {
    func_find_last,
    name: "find_last",
    params: ["obj", "part", "key", "start"],
    info: "find_last(obj, part, key = identity, start = length(obj) - 1)\n\nReturns the index of the last occurence of part in obj, or -1 if it is\nnot contained.\n\n: find_last('abcdefgcdexy', 'cde') ==> 7\n: find_last([1, 2, 3, 4, 3], 3) ==> 4",
    |args, env, pos| {
        if args.is_null("obj") {
            return Ok(Value::null());
        }
        let obj = args.get("obj")?;
        let key = if args.has_arg("key") {
            Some(args.get_func("key")?)
        } else {
            None
        };
        match &obj.data {
            ValueData::Str(s) => {
                let part = args.get_string("part")?;
                let haystack: Vec<char> = s.borrow().chars().collect();
                let needle: Vec<char> = part.chars().collect();
                let start = args.get_int_or("start", haystack.len() as i64 - 1)?;
                // search in the prefix up to (and excluding) start
                let mut best = -1i64;
                let mut idx = 0usize;
                loop {
                    let found = find_in_chars(&haystack, &needle, idx);
                    if found == -1 || found + needle.len() as i64 > start {
                        break;
                    }
                    best = found;
                    idx = found as usize + 1;
                }
                Ok(Value::int(best))
            }
            ValueData::List(items) => {
                let item = args.get("part")?;
                let call_env = Environment::with_parent(env);
                let values = items.borrow().clone();
                let start = args.get_int_or("start", values.len() as i64 - 1)?;
                if start < 0 {
                    return Ok(Value::int(-1));
                }
                let start = (start as usize).min(values.len().saturating_sub(1));
                for idx in (0..=start).rev() {
                    let element = match &key {
                        Some(key) => call_unary(key, values[idx].clone(), &call_env, pos)?,
                        None => values[idx].clone(),
                    };
                    if element == item {
                        return Ok(Value::int(idx as i64));
                    }
                }
                Ok(Value::int(-1))
            }
            _ => Err(RuntimeError::new(
                "Find_last only works with strings and lists",
                pos,
            )),
        }
    }
}

define_native! {
    func_range,
    name: "range",
    params: ["a", "b", "step"],
    info: "range(a)\nrange(a, b)\nrange(a, b, step)\n\nReturns a list of int values in the range. With only a, the range is\n[0, a); with a and b it is [a, b).\n\n: range(4) ==> [0, 1, 2, 3]\n: range(3, 6) ==> [3, 4, 5]",
    |args, _env, _pos| {
        let mut start = 0;
        let mut end = 0;
        if args.has_arg("a") && !args.has_arg("b") {
            end = args.get_int("a")?;
        } else if args.has_arg("a") && args.has_arg("b") {
            start = args.get_int("a")?;
            end = args.get_int("b")?;
        }
        let step = args.get_int_or("step", 1)?;
        let mut result = Vec::new();
        let mut i = start;
        if step > 0 {
            while i < end {
                result.push(Value::int(i));
                i += step;
            }
        } else if step < 0 {
            while i > end {
                result.push(Value::int(i));
                i += step;
            }
        }
        Ok(Value::list(result))
    }
}

define_native! {
    func_sorted,
    name: "sorted",
    params: ["lst", "cmp", "key"],
    info: "sorted(lst, cmp = compare, key = identity)\n\nReturns a sorted copy of the list, ordered by the value the key function\nreturns for each element, compared with the cmp function.\n\n: sorted([3, 2, 1]) ==> [1, 2, 3]",
    |args, env, pos| {
        let call_env = Environment::with_parent(env);
        let items = args.get_as_list("lst")?;
        let cmp = if args.has_arg("cmp") {
            args.get_func("cmp")?
        } else {
            env.get("compare", pos)?.as_func().map_err(|e| e.at(pos))?
        };
        let key = if args.has_arg("key") {
            Some(args.get_func("key")?)
        } else {
            None
        };
        let mut result: Vec<Value> = items.borrow().clone();
        // insertion sort driven by the user-supplied comparison
        for i in 1..result.len() {
            let pivot = match &key {
                Some(key) => call_unary(key, result[i].clone(), &call_env, pos)?,
                None => result[i].clone(),
            };
            let mut j = i;
            while j > 0 {
                let prev = match &key {
                    Some(key) => call_unary(key, result[j - 1].clone(), &call_env, pos)?,
                    None => result[j - 1].clone(),
                };
                let comparison =
                    call_binary(&cmp, pivot.clone(), prev.clone(), &call_env, pos)?
                        .as_int()
                        .map_err(|e| e.at(pos))?;
                if comparison < 0 {
                    result.swap(j, j - 1);
                    j -= 1;
                } else {
                    break;
                }
            }
        }
        Ok(Value::list(result))
    }
}

define_native! {
    func_zip,
    name: "zip",
    params: ["a", "b"],
    info: "zip(a, b)\n\nReturns a list of pairs, pairing the elements of a and b index-wise.\nThe result has the length of the shorter input list.\n\n: zip([1, 2, 3], [4, 5, 6, 7]) ==> [[1, 4], [2, 5], [3, 6]]",
    |args, _env, pos| {
        let a = args.get("a")?;
        let b = args.get("b")?;
        if a.is_null() || b.is_null() {
            return Ok(Value::null());
        }
        if let (ValueData::List(list_a), ValueData::List(list_b)) = (&a.data, &b.data) {
            let list_a = list_a.borrow();
            let list_b = list_b.borrow();
            let result: Vec<Value> = list_a
                .iter()
                .zip(list_b.iter())
                .map(|(x, y)| Value::list(vec![x.clone(), y.clone()]))
                .collect();
            return Ok(Value::list(result));
        }
        Err(RuntimeError::new(
            format!("Cannot zip {} and {}", a.type_name(), b.type_name()),
            pos,
        ))
    }
}

define_native! {
    func_zip_map,
    name: "zip_map",
    params: ["a", "b"],
    info: "zip_map(a, b)\n\nReturns a map with keys taken from a and values taken from b, paired\nindex-wise.\n\n: zip_map(['a', 'b'], [1, 2]) ==> <<<'a' => 1, 'b' => 2>>>",
    |args, _env, pos| {
        let a = args.get("a")?;
        let b = args.get("b")?;
        if a.is_null() || b.is_null() {
            return Ok(Value::null());
        }
        if let (ValueData::List(list_a), ValueData::List(list_b)) = (&a.data, &b.data) {
            let list_a = list_a.borrow();
            let list_b = list_b.borrow();
            let mut result = std::collections::BTreeMap::new();
            for (key, value) in list_a.iter().zip(list_b.iter()) {
                result.insert(key.clone(), value.clone());
            }
            return Ok(Value::map(result));
        }
        Err(RuntimeError::new(
            format!("Cannot zip_map {} and {}", a.type_name(), b.type_name()),
            pos,
        ))
    }
}

define_native! {
    func_put,
    name: "put",
    params: ["m", "key", "value"],
    info: "put(m, key, value)\n\nPuts the value into the map m at the given key. The map is changed in\nplace and returned.\n\n: put(<<<1 => 2>>>, 1, 9) ==> <<<1 => 9>>>",
    |args, _env, _pos| {
        let m = args.get("m")?;
        let entries = args.get_map("m")?;
        entries
            .borrow_mut()
            .insert(args.get("key")?, args.get("value")?);
        Ok(m)
    }
}
