// ABOUTME: Type conversion builtins and the type/identity/if_* helpers

use crate::values::{ObjectValue, Value};

define_native! {
    func_int,
    name: "int",
    params: ["obj"],
    info: "int(obj)\n\nConverts the obj to an int, if possible.\n\n: int('12') ==> 12",
    |args, _env, _pos| {
        Ok(Value::int(args.get_as_int("obj")?))
    }
}

define_native! {
    func_decimal,
    name: "decimal",
    params: ["obj"],
    info: "decimal(obj)\n\nConverts the obj to a decimal, if possible.\n\n: decimal('1.2') ==> 1.2",
    |args, _env, _pos| {
        Ok(Value::decimal(args.get_as_decimal("obj")?))
    }
}

define_native! {
    func_boolean,
    name: "boolean",
    params: ["obj"],
    info: "boolean(obj)\n\nConverts the obj to a boolean, if possible.\n\n: boolean(1) ==> TRUE",
    |args, _env, _pos| {
        Ok(Value::boolean(args.get_as_boolean("obj")?))
    }
}

define_native! {
    func_string,
    name: "string",
    params: ["obj"],
    info: "string(obj)\n\nConverts the obj to a string, if possible.\n\n: string(123) ==> '123'",
    |args, _env, _pos| {
        Ok(Value::string(args.get_as_string("obj")?))
    }
}

define_native! {
    func_date,
    name: "date",
    params: ["obj"],
    info: "date(obj)\n\nConverts the obj to a date, if possible. Without argument, returns the\ncurrent date. Strings are accepted in the formats yyyyMMdd, yyyyMMddHH\nand yyyyMMddHHmmss.\n\n: string(date('20170102')) ==> '20170102000000'",
    |args, _env, _pos| {
        if !args.has_arg("obj") {
            return Ok(Value::date(crate::dates::now()));
        }
        Ok(Value::date(args.get_as_date("obj")?))
    }
}

define_native! {
    func_pattern,
    name: "pattern",
    params: ["obj"],
    info: "pattern(obj)\n\nConverts the obj to a regexp pattern, if possible.\n\n: pattern('xy[1-9]{3}') ==> //xy[1-9]{3}//",
    |args, _env, _pos| {
        Ok(Value::pattern(args.get_as_pattern("obj")?))
    }
}

define_native! {
    func_list,
    name: "list",
    params: ["obj"],
    info: "list(obj)\n\nConverts the obj to a list. Without argument, returns an empty list.\n\n: list(1) ==> [1]",
    |args, _env, _pos| {
        if !args.has_arg("obj") {
            return Ok(Value::list(Vec::new()));
        }
        Ok(Value::list_from(args.get_as_list("obj")?))
    }
}

define_native! {
    func_set,
    name: "set",
    params: ["obj"],
    info: "set(obj)\n\nConverts the obj to a set. Without argument, returns an empty set.\n\n: set([1, 2, 3, 3]) ==> <<1, 2, 3>>",
    |args, _env, _pos| {
        if !args.has_arg("obj") {
            return Ok(Value::set(std::collections::BTreeSet::new()));
        }
        Ok(Value::set_from(args.get_as_set("obj")?))
    }
}

define_native! {
    func_map,
    name: "map",
    params: ["obj"],
    info: "map(obj)\n\nConverts the obj to a map. Without argument, returns an empty map.\n\n: map([[1, 2], [3, 4]]) ==> <<<1 => 2, 3 => 4>>>",
    |args, _env, _pos| {
        if !args.has_arg("obj") {
            return Ok(Value::map(std::collections::BTreeMap::new()));
        }
        Ok(Value::map_from(args.get_as_map("obj")?))
    }
}

define_native! {
    func_object,
    name: "object",
    params: ["obj"],
    info: "object(obj)\n\nCreates an empty object value or converts a list of pairs or a map to\nan object.\n\n: object() ==> <**>\n: object(<<<a => 1>>>) ==> <*a=1*>",
    |args, _env, _pos| {
        if !args.has_arg("obj") {
            return Ok(Value::object(ObjectValue::new()));
        }
        Ok(Value::object_from(args.get_as_object("obj")?))
    }
}

define_native! {
    func_type,
    name: "type",
    params: ["obj"],
    info: "type(obj)\n\nReturns the name of the type of obj as a string.\n\n: type('Hello') ==> 'string'",
    |args, _env, _pos| {
        Ok(Value::string(args.get("obj")?.type_name()))
    }
}

define_native! {
    func_identity,
    name: "identity",
    params: ["obj"],
    info: "identity(obj)\n\nReturns obj.\n\n: identity(1) ==> 1",
    |args, _env, _pos| {
        args.get("obj")
    }
}

define_native! {
    func_if_empty,
    name: "if_empty",
    params: ["a", "b"],
    info: "if_empty(a, b)\n\nReturns b if a is an empty string, otherwise returns a.\n\n: if_empty('', 2) ==> 2",
    |args, _env, _pos| {
        let a = args.get("a")?;
        if a.is_string() && a.as_string()?.is_empty() {
            return args.get("b");
        }
        Ok(a)
    }
}

define_native! {
    func_if_null,
    name: "if_null",
    params: ["a", "b"],
    info: "if_null(a, b)\n\nReturns b if a is NULL, otherwise returns a.\n\n: if_null(NULL, 2) ==> 2",
    |args, _env, _pos| {
        let a = args.get("a")?;
        if a.is_null() {
            return args.get("b");
        }
        Ok(a)
    }
}

define_native! {
    func_if_null_or_empty,
    name: "if_null_or_empty",
    params: ["a", "b"],
    info: "if_null_or_empty(a, b)\n\nReturns b if a is NULL or an empty string, otherwise returns a.\n\n: if_null_or_empty('', 2) ==> 2",
    |args, _env, _pos| {
        let a = args.get("a")?;
        if a.is_null() || (a.is_string() && a.as_string()?.is_empty()) {
            return args.get("b");
        }
        Ok(a)
    }
}
