// ABOUTME: Arithmetic builtins: the polymorphic add/sub/mul/div/mod kernel,
// math functions and the 32-bit bitwise intrinsics

use std::collections::BTreeSet;

use crate::dates::{to_date, to_oa_date};
use crate::environment::EnvRef;
use crate::errors::RuntimeError;
use crate::lexer::SourcePos;
use crate::values::{Value, ValueData};

pub fn add_values(a: &Value, b: &Value, pos: &SourcePos) -> Result<Value, RuntimeError> {
    if a.is_null() || b.is_null() {
        return Ok(Value::null());
    }

    if let (ValueData::Int(x), ValueData::Int(y)) = (&a.data, &b.data) {
        return Ok(Value::int(x.wrapping_add(*y)));
    }

    if a.is_numerical() && b.is_numerical() {
        return Ok(Value::decimal(a.as_decimal()? + b.as_decimal()?));
    }

    if a.is_list() {
        let mut result: Vec<Value> = a.as_list()?.borrow().clone();
        if b.is_collection() {
            result.extend(b.as_list()?.borrow().iter().cloned());
        } else {
            result.push(b.clone());
        }
        return Ok(Value::list(result));
    }

    if a.is_set() {
        let mut result: BTreeSet<Value> = a.as_set()?.borrow().clone();
        if b.is_collection() {
            for item in b.as_list()?.borrow().iter() {
                result.insert(item.clone());
            }
        } else {
            result.insert(b.clone());
        }
        return Ok(Value::set(result));
    }

    if b.is_list() {
        let mut result = vec![a.clone()];
        result.extend(b.as_list()?.borrow().iter().cloned());
        return Ok(Value::list(result));
    }

    if b.is_set() {
        let mut result = BTreeSet::new();
        result.insert(a.clone());
        for item in b.as_set()?.borrow().iter() {
            result.insert(item.clone());
        }
        return Ok(Value::set(result));
    }

    if a.is_date() && b.is_numerical() {
        let shifted = to_date(to_oa_date(&a.as_date()?) + b.as_decimal()?);
        return Ok(Value::date(shifted));
    }

    if (a.is_string() && b.is_atomic()) || (a.is_atomic() && b.is_string()) {
        return Ok(Value::string(format!(
            "{}{}",
            a.as_string()?,
            b.as_string()?
        )));
    }

    Err(RuntimeError::new(
        format!("Cannot add {} and {}", a.type_name(), b.type_name()),
        pos,
    ))
}

pub fn sub_values(a: &Value, b: &Value, pos: &SourcePos) -> Result<Value, RuntimeError> {
    if a.is_list() {
        let minus = b.as_list().map_err(|e| e.at(pos))?;
        let minus = minus.borrow();
        let result: Vec<Value> = a
            .as_list()?
            .borrow()
            .iter()
            .filter(|item| !minus.iter().any(|m| m == *item))
            .cloned()
            .collect();
        return Ok(Value::list(result));
    }

    if a.is_set() {
        let minus: BTreeSet<Value> = if b.is_set() {
            b.as_set()?.borrow().clone()
        } else if b.is_list() {
            b.as_list()?.borrow().iter().cloned().collect()
        } else {
            let mut single = BTreeSet::new();
            single.insert(b.clone());
            single
        };
        let result: BTreeSet<Value> = a
            .as_set()?
            .borrow()
            .iter()
            .filter(|item| !minus.contains(*item))
            .cloned()
            .collect();
        return Ok(Value::set(result));
    }

    if a.is_date() {
        if b.is_date() {
            let diff = to_oa_date(&a.as_date()?) - to_oa_date(&b.as_date()?);
            return Ok(Value::int(diff.trunc() as i64));
        }
        if b.is_numerical() {
            let shifted = to_date(to_oa_date(&a.as_date()?) - b.as_decimal()?);
            return Ok(Value::date(shifted));
        }
    }

    if a.is_null() || b.is_null() {
        return Ok(Value::null());
    }

    if let (ValueData::Int(x), ValueData::Int(y)) = (&a.data, &b.data) {
        return Ok(Value::int(x.wrapping_sub(*y)));
    }

    if a.is_numerical() && b.is_numerical() {
        return Ok(Value::decimal(a.as_decimal()? - b.as_decimal()?));
    }

    Err(RuntimeError::new(
        format!("Cannot subtract {} from {}", b.type_name(), a.type_name()),
        pos,
    ))
}

pub fn mul_values(a: &Value, b: &Value, pos: &SourcePos) -> Result<Value, RuntimeError> {
    if a.is_null() || b.is_null() {
        return Ok(Value::null());
    }

    if a.is_string() && b.is_int() {
        let count = b.as_int()?.max(0) as usize;
        return Ok(Value::string(a.as_string()?.repeat(count)));
    }

    if a.is_list() && b.is_int() {
        let items = a.as_list()?;
        let items = items.borrow();
        let mut result = Vec::new();
        for _ in 0..b.as_int()?.max(0) {
            result.extend(items.iter().cloned());
        }
        return Ok(Value::list(result));
    }

    if let (ValueData::Int(x), ValueData::Int(y)) = (&a.data, &b.data) {
        return Ok(Value::int(x.wrapping_mul(*y)));
    }

    if a.is_numerical() && b.is_numerical() {
        return Ok(Value::decimal(a.as_decimal()? * b.as_decimal()?));
    }

    Err(RuntimeError::new(
        format!("Cannot multiply {} by {}", a.type_name(), b.type_name()),
        pos,
    ))
}

fn div_by_zero(env: &EnvRef, pos: &SourcePos) -> Result<Value, RuntimeError> {
    if env.is_defined("DIV_0_VALUE") {
        let value = env.get("DIV_0_VALUE", pos)?;
        if !value.is_null() {
            return Ok(value);
        }
    }
    Err(RuntimeError::new("divide by zero", pos))
}

pub fn div_values(
    a: &Value,
    b: &Value,
    env: &EnvRef,
    pos: &SourcePos,
) -> Result<Value, RuntimeError> {
    if a.is_null() || b.is_null() {
        return Ok(Value::null());
    }

    if let (ValueData::Int(x), ValueData::Int(y)) = (&a.data, &b.data) {
        if *y == 0 {
            return div_by_zero(env, pos);
        }
        // truncation toward zero
        return Ok(Value::int(((*x as f64) / (*y as f64)).trunc() as i64));
    }

    if a.is_numerical() && b.is_numerical() {
        let divisor = b.as_decimal()?;
        if divisor == 0.0 {
            return div_by_zero(env, pos);
        }
        return Ok(Value::decimal(a.as_decimal()? / divisor));
    }

    Err(RuntimeError::new(
        format!("Cannot divide {} by {}", a.type_name(), b.type_name()),
        pos,
    ))
}

pub fn mod_values(
    a: &Value,
    b: &Value,
    env: &EnvRef,
    pos: &SourcePos,
) -> Result<Value, RuntimeError> {
    if a.is_null() || b.is_null() {
        return Ok(Value::null());
    }

    if let (ValueData::Int(x), ValueData::Int(y)) = (&a.data, &b.data) {
        if *y == 0 {
            return div_by_zero(env, pos);
        }
        // floored modulo, the sign follows the divisor
        let mut r = x % y;
        if r != 0 && (r < 0) != (*y < 0) {
            r += y;
        }
        return Ok(Value::int(r));
    }

    if a.is_numerical() && b.is_numerical() {
        let divisor = b.as_decimal()?;
        if divisor == 0.0 {
            return div_by_zero(env, pos);
        }
        let value = a.as_decimal()?;
        return Ok(Value::decimal(value - divisor * (value / divisor).floor()));
    }

    Err(RuntimeError::new(
        format!(
            "Cannot calculate modulus of {} by {}",
            a.type_name(),
            b.type_name()
        ),
        pos,
    ))
}

define_native! {
    func_add,
    name: "add",
    params: ["a", "b"],
    info: "add(a, b)\n\nReturns the sum of a and b. For numerical values this uses usual\narithmetic. For lists and strings it concatenates. For sets it uses union.\n\n: add(1, 2) ==> 3",
    |args, _env, pos| {
        add_values(&args.get("a")?, &args.get("b")?, pos)
    }
}

define_native! {
    func_sub,
    name: "sub",
    params: ["a", "b"],
    info: "sub(a, b)\n\nReturns the subtraction of b from a. Lists and sets subtract their\nelements, dates subtract days.\n\n: sub(1, 2) ==> -1\n: sub([1, 2, 3], 2) ==> [1, 3]",
    |args, _env, pos| {
        sub_values(&args.get("a")?, &args.get("b")?, pos)
    }
}

define_native! {
    func_mul,
    name: "mul",
    params: ["a", "b"],
    info: "mul(a, b)\n\nReturns the product of a and b. A string or list multiplied by an int\nis repeated that many times.\n\n: mul(2, 3) ==> 6\n: mul('2', 3) ==> '222'",
    |args, _env, pos| {
        mul_values(&args.get("a")?, &args.get("b")?, pos)
    }
}

define_native! {
    func_div,
    name: "div",
    params: ["a", "b"],
    info: "div(a, b)\n\nReturns the value of a divided by b. If both values are ints, then the\nresult is also an int. Otherwise, it is a decimal.\n\n: div(6, 2) ==> 3",
    |args, env, pos| {
        div_values(&args.get("a")?, &args.get("b")?, env, pos)
    }
}

define_native! {
    func_mod,
    name: "mod",
    params: ["a", "b"],
    info: "mod(a, b)\n\nReturns the modulus of a modulo b.\n\n: mod(7, 2) ==> 1",
    |args, env, pos| {
        mod_values(&args.get("a")?, &args.get("b")?, env, pos)
    }
}

define_native! {
    func_pow,
    name: "pow",
    params: ["x", "y"],
    info: "pow(x, y)\n\nReturns the power x ^ y.\n\n: pow(2, 3) ==> 8\n: pow(2.5, 2) ==> 6.25",
    |args, _env, _pos| {
        if args.is_null("x") || args.is_null("y") {
            return Ok(Value::null());
        }
        let x = args.get("x")?;
        let y = args.get("y")?;
        if x.is_int() && y.is_int() {
            let result = (x.as_int()? as f64).powf(y.as_int()? as f64);
            return Ok(Value::int(result.trunc() as i64));
        }
        Ok(Value::decimal(args.get_numerical("x")?.powf(args.get_numerical("y")?)))
    }
}

define_native! {
    func_exp,
    name: "exp",
    params: ["x"],
    info: "exp(x)\n\nReturns the power e ^ x.\n\n: exp(0) ==> 1.0",
    |args, _env, _pos| {
        if args.is_null("x") {
            return Ok(Value::null());
        }
        Ok(Value::decimal(args.get_numerical("x")?.exp()))
    }
}

define_native! {
    func_log,
    name: "log",
    params: ["x"],
    info: "log(x)\n\nReturns the natural logarithm of x.\n\n: int(log(E)) ==> 1",
    |args, _env, _pos| {
        if args.is_null("x") {
            return Ok(Value::null());
        }
        Ok(Value::decimal(args.get_numerical("x")?.ln()))
    }
}

define_native! {
    func_sqrt,
    name: "sqrt",
    params: ["x"],
    info: "sqrt(x)\n\nReturns the square root of x as a decimal value.\n\n: sqrt(4) ==> 2.0",
    |args, _env, _pos| {
        if args.is_null("x") {
            return Ok(Value::null());
        }
        Ok(Value::decimal(args.get_numerical("x")?.sqrt()))
    }
}

define_native! {
    func_sin,
    name: "sin",
    params: ["x"],
    info: "sin(x)\n\nReturns the sinus of x.\n\n: sin(0) ==> 0.0",
    |args, _env, _pos| {
        if args.is_null("x") {
            return Ok(Value::null());
        }
        Ok(Value::decimal(args.get_numerical("x")?.sin()))
    }
}

define_native! {
    func_cos,
    name: "cos",
    params: ["x"],
    info: "cos(x)\n\nReturns the cosinus of x.\n\n: cos(PI) ==> -1.0",
    |args, _env, _pos| {
        if args.is_null("x") {
            return Ok(Value::null());
        }
        Ok(Value::decimal(args.get_numerical("x")?.cos()))
    }
}

define_native! {
    func_tan,
    name: "tan",
    params: ["x"],
    info: "tan(x)\n\nReturns the tangens of x.\n\n: tan(0) ==> 0.0",
    |args, _env, _pos| {
        if args.is_null("x") {
            return Ok(Value::null());
        }
        Ok(Value::decimal(args.get_numerical("x")?.tan()))
    }
}

define_native! {
    func_asin,
    name: "asin",
    params: ["x"],
    info: "asin(x)\n\nReturns the arcus sinus of x.\n\n: asin(0) ==> 0.0",
    |args, _env, _pos| {
        if args.is_null("x") {
            return Ok(Value::null());
        }
        Ok(Value::decimal(args.get_numerical("x")?.asin()))
    }
}

define_native! {
    func_acos,
    name: "acos",
    params: ["x"],
    info: "acos(x)\n\nReturns the arcus cosinus of x.\n\n: acos(1) ==> 0.0",
    |args, _env, _pos| {
        if args.is_null("x") {
            return Ok(Value::null());
        }
        Ok(Value::decimal(args.get_numerical("x")?.acos()))
    }
}

define_native! {
    func_atan,
    name: "atan",
    params: ["x"],
    info: "atan(x)\n\nReturns the arcus tangens of x.\n\n: atan(0) ==> 0.0",
    |args, _env, _pos| {
        if args.is_null("x") {
            return Ok(Value::null());
        }
        Ok(Value::decimal(args.get_numerical("x")?.atan()))
    }
}

define_native! {
    func_atan2,
    name: "atan2",
    params: ["y", "x"],
    info: "atan2(y, x)\n\nReturns the arcus tangens of y / x.\n\n: atan2(0, 1) ==> 0.0",
    |args, _env, _pos| {
        if args.is_null("y") || args.is_null("x") {
            return Ok(Value::null());
        }
        Ok(Value::decimal(
            args.get_numerical("y")?.atan2(args.get_numerical("x")?),
        ))
    }
}

define_native! {
    func_ceiling,
    name: "ceiling",
    params: ["x"],
    info: "ceiling(x)\n\nReturns the integral decimal value that is equal to or next higher than x.\n\n: ceiling(1.3) ==> 2.0",
    |args, _env, _pos| {
        if args.is_null("x") {
            return Ok(Value::null());
        }
        Ok(Value::decimal(args.get_numerical("x")?.ceil()))
    }
}

define_native! {
    func_floor,
    name: "floor",
    params: ["x"],
    info: "floor(x)\n\nReturns the integral decimal value that is equal to or next lower than x.\n\n: floor(1.3) ==> 1.0",
    |args, _env, _pos| {
        if args.is_null("x") {
            return Ok(Value::null());
        }
        Ok(Value::decimal(args.get_numerical("x")?.floor()))
    }
}

define_native! {
    func_round,
    name: "round",
    params: ["x", "digits"],
    info: "round(x, digits = 0)\n\nReturns the decimal value x rounded to the specified number of digits.\n\n: round(1.345, digits = 1) ==> 1.3",
    |args, _env, _pos| {
        if args.is_null("x") {
            return Ok(Value::null());
        }
        let x = args.get_numerical("x")?;
        let digits = args.get_int_or("digits", 0)?;
        let factor = 10f64.powi(digits as i32);
        Ok(Value::decimal((x * factor).round() / factor))
    }
}

define_native! {
    func_sum,
    name: "sum",
    params: ["list", "ignore"],
    info: "sum(list, ignore = [])\n\nReturns the sum of a list of numbers. Values contained in the optional\nlist ignore are counted as 0.\n\n: sum([1, 2, 3]) ==> 6\n: sum([1, 2.5, 3]) ==> 6.5",
    |args, _env, pos| {
        if args.is_null("list") {
            return Ok(Value::null());
        }
        let items = args.get_list("list")?;
        let ignore: Vec<Value> = if args.has_arg("ignore") {
            args.get_list("ignore")?.borrow().clone()
        } else {
            Vec::new()
        };
        let mut int_sum: i64 = 0;
        let mut dec_sum: f64 = 0.0;
        let mut decimal_required = false;
        for value in items.borrow().iter() {
            if ignore.iter().any(|ignored| ignored == value) {
                continue;
            }
            match &value.data {
                ValueData::Int(i) => {
                    int_sum = int_sum.wrapping_add(*i);
                    dec_sum += *i as f64;
                }
                ValueData::Decimal(d) => {
                    dec_sum += d;
                    decimal_required = true;
                }
                _ => {
                    return Err(RuntimeError::new(
                        format!("Cannot sum {}", value.type_name()),
                        pos,
                    ));
                }
            }
        }
        if decimal_required {
            Ok(Value::decimal(dec_sum))
        } else {
            Ok(Value::int(int_sum))
        }
    }
}

// The bitwise intrinsics operate on 32-bit unsigned values.

define_native! {
    func_bit_and,
    name: "bit_and",
    params: ["a", "b"],
    info: "bit_and(a, b)\n\nPerforms bitwise and for the two 32bit values a and b.\n\n: bit_and(5, 6) ==> 4",
    |args, _env, _pos| {
        let a = args.get_int("a")? as u32;
        let b = args.get_int("b")? as u32;
        Ok(Value::int((a & b) as i64))
    }
}

define_native! {
    func_bit_or,
    name: "bit_or",
    params: ["a", "b"],
    info: "bit_or(a, b)\n\nPerforms bitwise or for the two 32bit values a and b.\n\n: bit_or(1, 2) ==> 3",
    |args, _env, _pos| {
        let a = args.get_int("a")? as u32;
        let b = args.get_int("b")? as u32;
        Ok(Value::int((a | b) as i64))
    }
}

define_native! {
    func_bit_not,
    name: "bit_not",
    params: ["a"],
    info: "bit_not(a)\n\nPerforms bitwise not for the 32bit value a.\n\n: bit_not(1) ==> 4294967294\n: bit_not(0) ==> 4294967295",
    |args, _env, _pos| {
        let a = args.get_int("a")? as u32;
        Ok(Value::int((!a) as i64))
    }
}

define_native! {
    func_bit_xor,
    name: "bit_xor",
    params: ["a", "b"],
    info: "bit_xor(a, b)\n\nPerforms bitwise xor for the two 32bit values a and b.\n\n: bit_xor(1, 3) ==> 2",
    |args, _env, _pos| {
        let a = args.get_int("a")? as u32;
        let b = args.get_int("b")? as u32;
        Ok(Value::int((a ^ b) as i64))
    }
}

define_native! {
    func_bit_shift_left,
    name: "bit_shift_left",
    params: ["a", "n"],
    info: "bit_shift_left(a, n)\n\nPerforms bitwise shift of 32bit value a by n bits to the left.\n\n: bit_shift_left(1, 3) ==> 8",
    |args, _env, _pos| {
        let a = args.get_int("a")? as u32;
        let n = args.get_int("n")? as u32;
        Ok(Value::int(a.wrapping_shl(n) as i64))
    }
}

define_native! {
    func_bit_shift_right,
    name: "bit_shift_right",
    params: ["a", "n"],
    info: "bit_shift_right(a, n)\n\nPerforms bitwise shift of 32bit value a by n bits to the right.\n\n: bit_shift_right(4, 1) ==> 2",
    |args, _env, _pos| {
        let a = args.get_int("a")? as u32;
        let n = args.get_int("n")? as u32;
        Ok(Value::int(a.wrapping_shr(n) as i64))
    }
}

define_native! {
    func_bit_rotate_left,
    name: "bit_rotate_left",
    params: ["a", "n"],
    info: "bit_rotate_left(a, n)\n\nPerforms bitwise rotate of 32bit value a by n bits to the left.\n\n: bit_rotate_left(1, 2) ==> 4",
    |args, _env, _pos| {
        let a = args.get_int("a")? as u32;
        let n = args.get_int("n")? as u32;
        Ok(Value::int(a.rotate_left(n % 32) as i64))
    }
}

define_native! {
    func_bit_rotate_right,
    name: "bit_rotate_right",
    params: ["a", "n"],
    info: "bit_rotate_right(a, n)\n\nPerforms bitwise rotate of 32bit value a by n bits to the right.\n\n: bit_rotate_right(1, 2) ==> 1073741824",
    |args, _env, _pos| {
        let a = args.get_int("a")? as u32;
        let n = args.get_int("n")? as u32;
        Ok(Value::int(a.rotate_right(n % 32) as i64))
    }
}
