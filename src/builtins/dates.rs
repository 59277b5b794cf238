// ABOUTME: Date builtins: formatting, parsing with format lists and the
// current timestamp

use crate::dates;
use crate::values::{Value, ValueData};

define_native! {
    func_format_date,
    name: "format_date",
    params: ["date", "fmt"],
    info: "format_date(date, fmt = 'yyyy-MM-dd HH:mm:ss')\n\nFormats the date value according to fmt and returns a string value.\n\n: format_date(date('20170102')) ==> '2017-01-02 00:00:00'\n: format_date(date('2017010212'), fmt = 'HH') ==> '12'",
    |args, _env, _pos| {
        if args.is_null("date") {
            return Ok(Value::null());
        }
        let date = args.get_date("date")?;
        let fmt = args.get_string_or("fmt", "yyyy-MM-dd HH:mm:ss")?;
        Ok(Value::string(dates::format_date(&date, &fmt)))
    }
}

define_native! {
    func_parse_date,
    name: "parse_date",
    params: ["str", "fmt"],
    info: "parse_date(str, fmt = 'yyyyMMdd')\n\nParses the string str according to fmt and returns a date value. If the\nformat does not match or the date is invalid, NULL is returned. A list\nof formats is tried in order.\n\n: parse_date('20170102') ==> '20170102000000'\n: parse_date('20170144') ==> NULL",
    |args, _env, _pos| {
        if args.is_null("str") {
            return Ok(Value::null());
        }
        let text = args.get_string("str")?;
        let mut fmts: Vec<String> = Vec::new();
        if args.has_arg("fmt") {
            let fmt = args.get("fmt")?;
            if let ValueData::List(items) = &fmt.data {
                for item in items.borrow().iter() {
                    fmts.push(item.as_string()?);
                }
            } else {
                fmts.push(fmt.as_string()?);
            }
        } else {
            fmts.push("yyyyMMdd".to_string());
        }
        match dates::parse_date_multi(&text, &fmts) {
            Some(date) => Ok(Value::date(date)),
            None => Ok(Value::null()),
        }
    }
}

define_native! {
    func_timestamp,
    name: "timestamp",
    params: [],
    info: "timestamp()\n\nReturns the current system timestamp.",
    |_args, _env, _pos| {
        Ok(Value::int(dates::now().and_utc().timestamp()))
    }
}
