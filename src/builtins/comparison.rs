// ABOUTME: Comparison builtins: the canonical total order and the
// emptiness/null predicates

use std::cmp::Ordering;

use crate::values::{Value, ValueData};

define_native! {
    func_compare,
    name: "compare",
    params: ["a", "b"],
    info: "compare(a, b)\n\nReturns an int less than 0 if a is less than b, 0 if a is equal to b,\nand an int greater than 0 if a is greater than b.\n\n: compare(1, 2) < 0 ==> TRUE\n: compare(NULL, NULL) == 0 ==> TRUE",
    |args, _env, _pos| {
        let a = args.get("a")?;
        let b = args.get("b")?;
        let result = match a.cmp(&b) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        };
        Ok(Value::int(result))
    }
}

define_native! {
    func_equals,
    name: "equals",
    params: ["a", "b"],
    info: "equals(a, b)\n\nReturns TRUE if a is equals to b.\nInteger values are propagated to decimal values, if required.\n\n: equals(1, 1.0) ==> TRUE\n: equals('a', 'b') ==> FALSE",
    |args, _env, _pos| {
        Ok(Value::boolean(args.get("a")? == args.get("b")?))
    }
}

define_native! {
    func_not_equals,
    name: "not_equals",
    params: ["a", "b"],
    info: "not_equals(a, b)\n\nReturns TRUE if a is not equals to b.\n\n: not_equals(1, 2) ==> TRUE",
    |args, _env, _pos| {
        Ok(Value::boolean(args.get("a")? != args.get("b")?))
    }
}

define_native! {
    func_less,
    name: "less",
    params: ["a", "b"],
    info: "less(a, b)\n\nReturns TRUE if a is less than b.\n\n: less(1, 2) ==> TRUE",
    |args, _env, _pos| {
        Ok(Value::boolean(args.get("a")? < args.get("b")?))
    }
}

define_native! {
    func_less_equals,
    name: "less_equals",
    params: ["a", "b"],
    info: "less_equals(a, b)\n\nReturns TRUE if a is less than or equals to b.\n\n: less_equals(1, 1) ==> TRUE",
    |args, _env, _pos| {
        Ok(Value::boolean(args.get("a")? <= args.get("b")?))
    }
}

define_native! {
    func_greater,
    name: "greater",
    params: ["a", "b"],
    info: "greater(a, b)\n\nReturns TRUE if a is greater than b.\n\n: greater(2, 1) ==> TRUE",
    |args, _env, _pos| {
        Ok(Value::boolean(args.get("a")? > args.get("b")?))
    }
}

define_native! {
    func_greater_equals,
    name: "greater_equals",
    params: ["a", "b"],
    info: "greater_equals(a, b)\n\nReturns TRUE if a is greater than or equals to b.\n\n: greater_equals(2, 1) ==> TRUE",
    |args, _env, _pos| {
        Ok(Value::boolean(args.get("a")? >= args.get("b")?))
    }
}

define_native! {
    func_is_empty,
    name: "is_empty",
    params: ["obj"],
    info: "is_empty(obj)\n\nReturns TRUE, if the obj is empty. Collections are empty if they contain\nno elements, strings if they contain no characters. NULL is always empty.\n\n: is_empty([]) ==> TRUE\n: is_empty('') ==> TRUE\n: is_empty(1) ==> FALSE",
    |args, _env, _pos| {
        let obj = args.get("obj")?;
        let result = match &obj.data {
            ValueData::Null => true,
            ValueData::Int(_) | ValueData::Decimal(_) => false,
            ValueData::Str(s) => s.borrow().is_empty(),
            ValueData::List(items) => items.borrow().is_empty(),
            ValueData::Set(items) => items.borrow().is_empty(),
            ValueData::Map(entries) => entries.borrow().is_empty(),
            ValueData::Object(obj) => obj.borrow().members.is_empty(),
            _ => false,
        };
        Ok(Value::boolean(result))
    }
}

define_native! {
    func_is_not_empty,
    name: "is_not_empty",
    params: ["obj"],
    info: "is_not_empty(obj)\n\nReturns TRUE, if the obj is not empty.\n\n: is_not_empty([1]) ==> TRUE",
    |args, _env, _pos| {
        let obj = args.get("obj")?;
        let result = match &obj.data {
            ValueData::Null => false,
            ValueData::Int(_) | ValueData::Decimal(_) => true,
            ValueData::Str(s) => !s.borrow().is_empty(),
            ValueData::List(items) => !items.borrow().is_empty(),
            ValueData::Set(items) => !items.borrow().is_empty(),
            ValueData::Map(entries) => !entries.borrow().is_empty(),
            ValueData::Object(obj) => !obj.borrow().members.is_empty(),
            _ => true,
        };
        Ok(Value::boolean(result))
    }
}

define_native! {
    func_is_null,
    name: "is_null",
    params: ["obj"],
    info: "is_null(obj)\n\nReturns TRUE, if the obj is NULL.\n\n: is_null(NULL) ==> TRUE\n: is_null('') ==> FALSE",
    |args, _env, _pos| {
        Ok(Value::boolean(args.get("obj")?.is_null()))
    }
}

define_native! {
    func_is_not_null,
    name: "is_not_null",
    params: ["obj"],
    info: "is_not_null(obj)\n\nReturns TRUE, if the obj is not NULL.\n\n: is_not_null(1) ==> TRUE",
    |args, _env, _pos| {
        Ok(Value::boolean(!args.get("obj")?.is_null()))
    }
}
