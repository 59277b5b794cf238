// ABOUTME: Runtime value model: tagged values with coercions, equality, canonical
// ordering and string forms, plus the argument-binding machinery for calls

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use regex::Regex;

use crate::dates;
use crate::environment::EnvRef;
use crate::errors::RuntimeError;
use crate::io::{InputHandle, OutputHandle};
use crate::lexer::SourcePos;
use crate::nodes::Node;

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type SetRef = Rc<RefCell<BTreeSet<Value>>>;
pub type MapRef = Rc<RefCell<BTreeMap<Value, Value>>>;
pub type ObjectRef = Rc<RefCell<ObjectValue>>;
pub type InputRef = Rc<RefCell<InputHandle>>;
pub type OutputRef = Rc<RefCell<OutputHandle>>;

/// A compiled regular expression together with its source text. The source
/// is canonical for equality and printing.
#[derive(Debug)]
pub struct PatternValue {
    pub source: String,
    pub regex: Regex,
}

impl PatternValue {
    pub fn compile(source: &str) -> Result<PatternValue, RuntimeError> {
        let regex = Regex::new(source).map_err(|_| {
            RuntimeError::without_pos(format!("Cannot compile pattern //{}//", source))
        })?;
        Ok(PatternValue {
            source: source.to_string(),
            regex,
        })
    }

    /// TRUE if the pattern matches at the start of the string.
    pub fn matches_start(&self, s: &str) -> bool {
        match self.regex.find(s) {
            Some(m) => m.start() == 0,
            None => false,
        }
    }
}

/// Member table of an object value. Insertion order is preserved; the
/// `is_module` flag suppresses the implicit self argument on method calls.
#[derive(Debug)]
pub struct ObjectValue {
    pub members: IndexMap<String, Value>,
    pub is_module: bool,
}

impl ObjectValue {
    pub fn new() -> ObjectValue {
        ObjectValue {
            members: IndexMap::new(),
            is_module: false,
        }
    }
}

impl Default for ObjectValue {
    fn default() -> Self {
        ObjectValue::new()
    }
}

/// Look up a member, following the `_proto_` chain until found or exhausted.
pub fn resolve_member(obj: &ObjectRef, key: &str) -> Option<Value> {
    if let Some(value) = obj.borrow().members.get(key) {
        return Some(value.clone());
    }
    let mut current = obj.clone();
    loop {
        let proto = match current.borrow().members.get("_proto_") {
            Some(Value {
                data: ValueData::Object(p),
                ..
            }) => p.clone(),
            _ => return None,
        };
        if let Some(value) = proto.borrow().members.get(key) {
            return Some(value.clone());
        }
        current = proto;
    }
}

pub type NativeFn = fn(&Args, &EnvRef, &SourcePos) -> Result<Value, RuntimeError>;

/// A native builtin: parameter names, secure flag and the implementation.
pub struct BuiltinFunc {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub secure: bool,
    pub info: &'static str,
    pub fun: NativeFn,
}

/// A user lambda closed over its defining environment. The name starts out
/// as "lambda" and is filled in when the lambda is bound with `def`.
pub struct LambdaFunc {
    pub name: RefCell<String>,
    pub arg_names: Vec<String>,
    pub defaults: Vec<Option<Rc<Node>>>,
    pub body: Rc<Node>,
    pub env: EnvRef,
}

pub enum FuncValue {
    Builtin(BuiltinFunc),
    Lambda(LambdaFunc),
}

impl FuncValue {
    pub fn name(&self) -> String {
        match self {
            FuncValue::Builtin(b) => b.name.to_string(),
            FuncValue::Lambda(l) => l.name.borrow().clone(),
        }
    }

    pub fn arg_names(&self) -> Vec<String> {
        match self {
            FuncValue::Builtin(b) => b.params.iter().map(|p| p.to_string()).collect(),
            FuncValue::Lambda(l) => l.arg_names.clone(),
        }
    }

    pub fn is_secure(&self) -> bool {
        match self {
            FuncValue::Builtin(b) => b.secure,
            FuncValue::Lambda(_) => true,
        }
    }
}

impl fmt::Debug for FuncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<#{}>", self.name())
    }
}

#[derive(Debug, Clone)]
pub enum ValueData {
    Null,
    Boolean(bool),
    Int(i64),
    Decimal(f64),
    Str(Rc<RefCell<String>>),
    Pattern(Rc<PatternValue>),
    Date(NaiveDateTime),
    List(ListRef),
    Set(SetRef),
    Map(MapRef),
    Object(ObjectRef),
    Func(Rc<FuncValue>),
    Node(Rc<Node>),
    Input(InputRef),
    Output(OutputRef),
    Break(SourcePos),
    Continue(SourcePos),
    Return(Box<Value>, SourcePos),
}

/// A runtime value. Every value carries an optional info string which the
/// `info` builtin exposes (documentation of builtins, `def` docstrings).
#[derive(Debug, Clone)]
pub struct Value {
    pub data: ValueData,
    pub info: Option<Rc<str>>,
}

impl Value {
    fn of(data: ValueData) -> Value {
        Value { data, info: None }
    }

    pub fn null() -> Value {
        Value::of(ValueData::Null)
    }

    pub fn boolean(b: bool) -> Value {
        Value::of(ValueData::Boolean(b))
    }

    pub fn int(i: i64) -> Value {
        Value::of(ValueData::Int(i))
    }

    pub fn decimal(d: f64) -> Value {
        Value::of(ValueData::Decimal(d))
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::of(ValueData::Str(Rc::new(RefCell::new(s.into()))))
    }

    pub fn pattern(p: Rc<PatternValue>) -> Value {
        Value::of(ValueData::Pattern(p))
    }

    pub fn date(d: NaiveDateTime) -> Value {
        Value::of(ValueData::Date(d))
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::of(ValueData::List(Rc::new(RefCell::new(items))))
    }

    pub fn list_from(items: ListRef) -> Value {
        Value::of(ValueData::List(items))
    }

    pub fn set(items: BTreeSet<Value>) -> Value {
        Value::of(ValueData::Set(Rc::new(RefCell::new(items))))
    }

    pub fn set_from(items: SetRef) -> Value {
        Value::of(ValueData::Set(items))
    }

    pub fn map(entries: BTreeMap<Value, Value>) -> Value {
        Value::of(ValueData::Map(Rc::new(RefCell::new(entries))))
    }

    pub fn map_from(entries: MapRef) -> Value {
        Value::of(ValueData::Map(entries))
    }

    pub fn object(obj: ObjectValue) -> Value {
        Value::of(ValueData::Object(Rc::new(RefCell::new(obj))))
    }

    pub fn object_from(obj: ObjectRef) -> Value {
        Value::of(ValueData::Object(obj))
    }

    pub fn func(f: FuncValue) -> Value {
        Value::of(ValueData::Func(Rc::new(f)))
    }

    pub fn func_from(f: Rc<FuncValue>) -> Value {
        Value::of(ValueData::Func(f))
    }

    pub fn node(n: Node) -> Value {
        Value::of(ValueData::Node(Rc::new(n)))
    }

    pub fn input(handle: InputHandle) -> Value {
        Value::of(ValueData::Input(Rc::new(RefCell::new(handle))))
    }

    pub fn output(handle: OutputHandle) -> Value {
        Value::of(ValueData::Output(Rc::new(RefCell::new(handle))))
    }

    pub fn break_value(pos: SourcePos) -> Value {
        Value::of(ValueData::Break(pos))
    }

    pub fn continue_value(pos: SourcePos) -> Value {
        Value::of(ValueData::Continue(pos))
    }

    pub fn return_value(value: Value, pos: SourcePos) -> Value {
        Value::of(ValueData::Return(Box::new(value), pos))
    }

    pub fn with_info(mut self, info: &str) -> Value {
        self.info = Some(Rc::from(info));
        self
    }

    // ------------------------------------------------------------------
    // Predicates
    // ------------------------------------------------------------------

    pub fn is_null(&self) -> bool {
        matches!(self.data, ValueData::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.data, ValueData::Boolean(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self.data, ValueData::Int(_))
    }

    pub fn is_decimal(&self) -> bool {
        matches!(self.data, ValueData::Decimal(_))
    }

    pub fn is_numerical(&self) -> bool {
        self.is_int() || self.is_decimal()
    }

    pub fn is_string(&self) -> bool {
        matches!(self.data, ValueData::Str(_))
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self.data, ValueData::Pattern(_))
    }

    pub fn is_date(&self) -> bool {
        matches!(self.data, ValueData::Date(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.data, ValueData::List(_))
    }

    pub fn is_set(&self) -> bool {
        matches!(self.data, ValueData::Set(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self.data, ValueData::Map(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self.data, ValueData::Object(_))
    }

    pub fn is_func(&self) -> bool {
        matches!(self.data, ValueData::Func(_))
    }

    pub fn is_node(&self) -> bool {
        matches!(self.data, ValueData::Node(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self.data, ValueData::Input(_))
    }

    pub fn is_output(&self) -> bool {
        matches!(self.data, ValueData::Output(_))
    }

    pub fn is_break(&self) -> bool {
        matches!(self.data, ValueData::Break(_))
    }

    pub fn is_continue(&self) -> bool {
        matches!(self.data, ValueData::Continue(_))
    }

    pub fn is_return(&self) -> bool {
        matches!(self.data, ValueData::Return(..))
    }

    pub fn is_collection(&self) -> bool {
        self.is_list() || self.is_set()
    }

    pub fn is_atomic(&self) -> bool {
        self.is_string()
            || self.is_int()
            || self.is_decimal()
            || self.is_boolean()
            || self.is_date()
            || self.is_pattern()
            || self.is_null()
    }

    pub fn bool_value(&self) -> Option<bool> {
        match self.data {
            ValueData::Boolean(b) => Some(b),
            _ => None,
        }
    }

    fn numeric_f64(&self) -> f64 {
        match self.data {
            ValueData::Int(i) => i as f64,
            ValueData::Decimal(d) => d,
            _ => f64::NAN,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.data {
            ValueData::Null => "null",
            ValueData::Boolean(_) => "boolean",
            ValueData::Int(_) => "int",
            ValueData::Decimal(_) => "decimal",
            ValueData::Str(_) => "string",
            ValueData::Pattern(_) => "pattern",
            ValueData::Date(_) => "date",
            ValueData::List(_) => "list",
            ValueData::Set(_) => "set",
            ValueData::Map(_) => "map",
            ValueData::Object(_) => "object",
            ValueData::Func(_) => "func",
            ValueData::Node(_) => "node",
            ValueData::Input(_) => "input",
            ValueData::Output(_) => "output",
            ValueData::Break(_) => "break",
            ValueData::Continue(_) => "continue",
            ValueData::Return(..) => "return",
        }
    }

    // ------------------------------------------------------------------
    // Coercions
    // ------------------------------------------------------------------

    /// String form of the value: the raw characters for strings, the
    /// pattern source for patterns, the canonical form for everything else.
    pub fn as_string(&self) -> Result<String, RuntimeError> {
        match &self.data {
            ValueData::Null => Ok(String::new()),
            ValueData::Boolean(_)
            | ValueData::Int(_)
            | ValueData::Decimal(_)
            | ValueData::Date(_)
            | ValueData::List(_)
            | ValueData::Set(_)
            | ValueData::Map(_)
            | ValueData::Object(_)
            | ValueData::Func(_)
            | ValueData::Node(_)
            | ValueData::Input(_) => Ok(self.to_string()),
            ValueData::Str(s) => Ok(s.borrow().clone()),
            ValueData::Pattern(p) => Ok(p.source.clone()),
            _ => Err(RuntimeError::without_pos("Cannot convert to String")),
        }
    }

    pub fn as_int(&self) -> Result<i64, RuntimeError> {
        match &self.data {
            ValueData::Null => Ok(0),
            ValueData::Boolean(b) => Ok(if *b { 1 } else { 0 }),
            ValueData::Int(i) => Ok(*i),
            ValueData::Decimal(d) => Ok(d.trunc() as i64),
            ValueData::Date(d) => Ok(d.and_utc().timestamp()),
            ValueData::Str(s) => {
                let s = s.borrow();
                s.parse::<i64>().map_err(|_| {
                    RuntimeError::without_pos(format!("Cannot convert {} to int", s))
                })
            }
            ValueData::List(items) => Ok(items.borrow().len() as i64),
            ValueData::Set(items) => Ok(items.borrow().len() as i64),
            ValueData::Map(entries) => Ok(entries.borrow().len() as i64),
            ValueData::Object(obj) => Ok(obj.borrow().members.len() as i64),
            _ => Err(RuntimeError::without_pos("Cannot convert to int")),
        }
    }

    pub fn as_decimal(&self) -> Result<f64, RuntimeError> {
        match &self.data {
            ValueData::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
            ValueData::Int(i) => Ok(*i as f64),
            ValueData::Decimal(d) => Ok(*d),
            ValueData::Date(d) => Ok(d.and_utc().timestamp() as f64),
            ValueData::Str(s) => {
                let s = s.borrow();
                s.parse::<f64>().map_err(|_| {
                    RuntimeError::without_pos(format!("Cannot convert {} to decimal", s))
                })
            }
            _ => Err(RuntimeError::without_pos("Cannot convert to decimal")),
        }
    }

    pub fn as_boolean(&self) -> Result<bool, RuntimeError> {
        match &self.data {
            ValueData::Boolean(b) => Ok(*b),
            ValueData::Int(i) => Ok(*i != 0),
            ValueData::Str(s) => {
                let s = s.borrow();
                if &*s == "1" {
                    Ok(true)
                } else if &*s == "0" {
                    Ok(false)
                } else {
                    Ok(s.to_uppercase() == "TRUE")
                }
            }
            ValueData::List(items) => Ok(!items.borrow().is_empty()),
            ValueData::Set(items) => Ok(!items.borrow().is_empty()),
            ValueData::Map(entries) => Ok(!entries.borrow().is_empty()),
            ValueData::Object(obj) => Ok(!obj.borrow().members.is_empty()),
            _ => Err(RuntimeError::without_pos("Cannot convert to boolean")),
        }
    }

    pub fn as_date(&self) -> Result<NaiveDateTime, RuntimeError> {
        match &self.data {
            ValueData::Date(d) => Ok(*d),
            ValueData::Int(i) => dates::from_timestamp(*i as f64)
                .ok_or_else(|| RuntimeError::without_pos("Cannot convert to date")),
            ValueData::Decimal(d) => dates::from_timestamp(*d)
                .ok_or_else(|| RuntimeError::without_pos("Cannot convert to date")),
            ValueData::Str(s) => {
                let s = s.borrow();
                dates::parse_basic_date(&s).ok_or_else(|| {
                    RuntimeError::without_pos(format!("Cannot convert {} to date", s))
                })
            }
            _ => Err(RuntimeError::without_pos("Cannot convert to date")),
        }
    }

    pub fn as_pattern(&self) -> Result<Rc<PatternValue>, RuntimeError> {
        match &self.data {
            ValueData::Pattern(p) => Ok(p.clone()),
            ValueData::Str(s) => Ok(Rc::new(PatternValue::compile(&s.borrow())?)),
            ValueData::Boolean(_) => Ok(Rc::new(PatternValue::compile(&self.to_string())?)),
            _ => Err(RuntimeError::without_pos("Cannot convert to pattern")),
        }
    }

    pub fn as_list(&self) -> Result<ListRef, RuntimeError> {
        match &self.data {
            ValueData::Boolean(_)
            | ValueData::Int(_)
            | ValueData::Decimal(_)
            | ValueData::Str(_)
            | ValueData::Pattern(_)
            | ValueData::Date(_) => Ok(Rc::new(RefCell::new(vec![self.clone()]))),
            ValueData::List(items) => Ok(items.clone()),
            ValueData::Set(items) => Ok(Rc::new(RefCell::new(
                items.borrow().iter().cloned().collect(),
            ))),
            ValueData::Map(entries) => {
                let mut values: Vec<Value> = entries.borrow().values().cloned().collect();
                values.sort();
                Ok(Rc::new(RefCell::new(values)))
            }
            ValueData::Object(obj) => Ok(Rc::new(RefCell::new(
                obj.borrow().members.values().cloned().collect(),
            ))),
            _ => Err(RuntimeError::without_pos("Cannot convert to list")),
        }
    }

    pub fn as_set(&self) -> Result<SetRef, RuntimeError> {
        match &self.data {
            ValueData::Set(items) => Ok(items.clone()),
            ValueData::List(items) => Ok(Rc::new(RefCell::new(
                items.borrow().iter().cloned().collect(),
            ))),
            ValueData::Map(entries) => Ok(Rc::new(RefCell::new(
                entries.borrow().keys().cloned().collect(),
            ))),
            ValueData::Object(obj) => Ok(Rc::new(RefCell::new(
                obj.borrow()
                    .members
                    .keys()
                    .map(|k| Value::string(k.clone()))
                    .collect(),
            ))),
            _ => Err(RuntimeError::without_pos("Cannot convert to set")),
        }
    }

    pub fn as_map(&self) -> Result<MapRef, RuntimeError> {
        match &self.data {
            ValueData::Map(entries) => Ok(entries.clone()),
            ValueData::List(items) => {
                let mut result = BTreeMap::new();
                for entry in items.borrow().iter() {
                    match &entry.data {
                        ValueData::List(pair) => {
                            let pair = pair.borrow();
                            if pair.len() != 2 {
                                return Err(RuntimeError::without_pos("Cannot convert to map"));
                            }
                            result.insert(pair[0].clone(), pair[1].clone());
                        }
                        _ => return Err(RuntimeError::without_pos("Cannot convert to map")),
                    }
                }
                Ok(Rc::new(RefCell::new(result)))
            }
            ValueData::Object(obj) => {
                let mut result = BTreeMap::new();
                for (key, value) in obj.borrow().members.iter() {
                    result.insert(Value::string(key.clone()), value.clone());
                }
                Ok(Rc::new(RefCell::new(result)))
            }
            _ => Err(RuntimeError::without_pos("Cannot convert to map")),
        }
    }

    pub fn as_object(&self) -> Result<ObjectRef, RuntimeError> {
        match &self.data {
            ValueData::Object(obj) => Ok(obj.clone()),
            ValueData::Map(entries) => {
                let mut result = ObjectValue::new();
                for (key, value) in entries.borrow().iter() {
                    result.members.insert(key.as_string()?, value.clone());
                }
                Ok(Rc::new(RefCell::new(result)))
            }
            ValueData::List(items) => {
                let mut result = ObjectValue::new();
                for entry in items.borrow().iter() {
                    match &entry.data {
                        ValueData::List(pair) => {
                            let pair = pair.borrow();
                            if pair.len() != 2 {
                                return Err(RuntimeError::without_pos(
                                    "Cannot convert to Object",
                                ));
                            }
                            result.members.insert(pair[0].as_string()?, pair[1].clone());
                        }
                        _ => {
                            return Err(RuntimeError::without_pos("Cannot convert to Object"));
                        }
                    }
                }
                Ok(Rc::new(RefCell::new(result)))
            }
            _ => Err(RuntimeError::without_pos("Cannot convert to Object")),
        }
    }

    pub fn as_func(&self) -> Result<Rc<FuncValue>, RuntimeError> {
        match &self.data {
            ValueData::Func(f) => Ok(f.clone()),
            _ => Err(RuntimeError::without_pos("Cannot convert to func")),
        }
    }

    pub fn as_node(&self) -> Result<Rc<Node>, RuntimeError> {
        match &self.data {
            ValueData::Node(n) => Ok(n.clone()),
            _ => Err(RuntimeError::without_pos("Cannot convert to Node")),
        }
    }

    pub fn as_input(&self) -> Result<InputRef, RuntimeError> {
        match &self.data {
            ValueData::Input(i) => Ok(i.clone()),
            _ => Err(RuntimeError::without_pos("Cannot convert to input")),
        }
    }

    pub fn as_output(&self) -> Result<OutputRef, RuntimeError> {
        match &self.data {
            ValueData::Output(o) => Ok(o.clone()),
            _ => Err(RuntimeError::without_pos("Cannot convert to output")),
        }
    }
}

// ----------------------------------------------------------------------
// Equality and ordering
// ----------------------------------------------------------------------

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        use ValueData::*;
        match (&self.data, &other.data) {
            (Null, Null) => true,
            (Int(a), Int(b)) => a == b,
            (Int(_), Decimal(_)) | (Decimal(_), Int(_)) | (Decimal(_), Decimal(_)) => {
                self.numeric_f64() == other.numeric_f64()
            }
            (Boolean(a), Boolean(b)) => a == b,
            (Str(a), Str(b)) => *a.borrow() == *b.borrow(),
            (Pattern(a), Pattern(b)) => a.source == b.source,
            (Date(a), Date(b)) => a == b,
            (List(a), List(b)) => *a.borrow() == *b.borrow(),
            (Set(a), Set(b)) => *a.borrow() == *b.borrow(),
            (Map(a), Map(b)) => *a.borrow() == *b.borrow(),
            (Object(a), Object(b)) => a.borrow().members == b.borrow().members,
            (Func(a), Func(b)) => Rc::ptr_eq(a, b),
            (Node(a), Node(b)) => a.to_string() == b.to_string(),
            (Input(a), Input(b)) => Rc::ptr_eq(a, b),
            (Output(a), Output(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for Value {}

// Canonical total order: numeric within the numeric types, otherwise the
// lexicographic order of the canonical string forms. Sets and maps are
// keyed by this order, so their iteration is sorted by construction.
impl Ord for Value {
    fn cmp(&self, other: &Value) -> Ordering {
        use ValueData::*;
        match (&self.data, &other.data) {
            (Int(a), Int(b)) => a.cmp(b),
            (Int(_), Decimal(_)) | (Decimal(_), Int(_)) | (Decimal(_), Decimal(_)) => {
                let a = self.numeric_f64();
                let b = other.numeric_f64();
                a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
            }
            (Boolean(a), Boolean(b)) => a.cmp(b),
            (Str(a), Str(b)) => a.borrow().cmp(&b.borrow()),
            (Date(a), Date(b)) => a.cmp(b),
            _ => self.to_string().cmp(&other.to_string()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ----------------------------------------------------------------------
// Canonical string form
// ----------------------------------------------------------------------

pub(crate) fn format_decimal(d: f64) -> String {
    let mut result = format!("{}", d);
    if !result.contains('.') && !result.contains("inf") && !result.contains("NaN") {
        result.push_str(".0");
    }
    result
}

fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '\r' => result.push_str("\\r"),
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            _ => result.push(ch),
        }
    }
    result
}

// Containers can contain themselves through aliasing; track the containers
// currently being rendered and print "..." on re-entry.
thread_local! {
    static RENDER_STACK: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

fn render_enter(ptr: usize) -> bool {
    RENDER_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.contains(&ptr) {
            false
        } else {
            stack.push(ptr);
            true
        }
    })
}

fn render_exit(ptr: usize) {
    RENDER_STACK.with(|stack| {
        stack.borrow_mut().pop();
        let _ = ptr;
    });
}

fn object_to_string(obj: &ObjectRef) -> String {
    if let Some(value) = resolve_member(obj, "_str_") {
        if let ValueData::Func(f) = &value.data {
            let mut args = Args::new(&SourcePos::unknown());
            args.add_args(&f.arg_names());
            if args
                .set_args(&[None], vec![Value::object_from(obj.clone())])
                .is_ok()
            {
                let env = crate::environment::Environment::new();
                if let Ok(result) =
                    crate::eval::execute_func(f, &args, &env, &SourcePos::unknown())
                {
                    if let Ok(s) = result.as_string() {
                        return s;
                    }
                }
            }
        }
    }
    let obj = obj.borrow();
    let parts: Vec<String> = obj
        .members
        .iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    format!("<*{}*>", parts.join(", "))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            ValueData::Null => write!(f, "NULL"),
            ValueData::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            ValueData::Int(i) => write!(f, "{}", i),
            ValueData::Decimal(d) => write!(f, "{}", format_decimal(*d)),
            ValueData::Str(s) => write!(f, "'{}'", escape_string(&s.borrow())),
            ValueData::Pattern(p) => write!(f, "//{}//", p.source),
            ValueData::Date(d) => write!(f, "{}", d.format("%Y%m%d%H%M%S")),
            ValueData::List(items) => {
                let ptr = Rc::as_ptr(items) as usize;
                if !render_enter(ptr) {
                    return write!(f, "[...]");
                }
                let parts: Vec<String> =
                    items.borrow().iter().map(|item| item.to_string()).collect();
                render_exit(ptr);
                write!(f, "[{}]", parts.join(", "))
            }
            ValueData::Set(items) => {
                let ptr = Rc::as_ptr(items) as usize;
                if !render_enter(ptr) {
                    return write!(f, "<<...>>");
                }
                let parts: Vec<String> =
                    items.borrow().iter().map(|item| item.to_string()).collect();
                render_exit(ptr);
                write!(f, "<<{}>>", parts.join(", "))
            }
            ValueData::Map(entries) => {
                let ptr = Rc::as_ptr(entries) as usize;
                if !render_enter(ptr) {
                    return write!(f, "<<<...>>>");
                }
                let parts: Vec<String> = entries
                    .borrow()
                    .iter()
                    .map(|(key, value)| format!("{} => {}", key, value))
                    .collect();
                render_exit(ptr);
                write!(f, "<<<{}>>>", parts.join(", "))
            }
            ValueData::Object(obj) => {
                let ptr = Rc::as_ptr(obj) as usize;
                if !render_enter(ptr) {
                    return write!(f, "<*...*>");
                }
                let result = object_to_string(obj);
                render_exit(ptr);
                write!(f, "{}", result)
            }
            ValueData::Func(func) => write!(f, "<#{}>", func.name()),
            ValueData::Node(node) => write!(f, "{}", node),
            ValueData::Input(_) => write!(f, "<!input-stream>"),
            ValueData::Output(_) => write!(f, "<!output-stream>"),
            ValueData::Break(_) => write!(f, "break"),
            ValueData::Continue(_) => write!(f, "continue"),
            ValueData::Return(value, _) => write!(f, "return {}", value),
        }
    }
}

// ----------------------------------------------------------------------
// Argument binding
// ----------------------------------------------------------------------

/// Bound arguments of a call: named arguments first, positionals fill the
/// leftmost open parameters, overflow goes into the rest parameter.
pub struct Args {
    pub arg_names: Vec<String>,
    pub rest_name: Option<String>,
    args: HashMap<String, Value>,
    pub pos: SourcePos,
}

impl Args {
    pub fn new(pos: &SourcePos) -> Args {
        Args {
            arg_names: Vec::new(),
            rest_name: None,
            args: HashMap::new(),
            pos: pos.clone(),
        }
    }

    pub fn add_arg(&mut self, name: &str, value: Value) -> &mut Args {
        self.arg_names.push(name.to_string());
        self.args.insert(name.to_string(), value);
        self
    }

    /// Declare the parameter list; a trailing `name...` becomes the rest
    /// parameter.
    pub fn add_args(&mut self, names: &[String]) -> &mut Args {
        for name in names {
            if name.ends_with("...") {
                self.rest_name = Some(name.clone());
            } else {
                self.arg_names.push(name.clone());
            }
        }
        self
    }

    fn next_positional_arg_name(&self) -> Option<String> {
        self.arg_names
            .iter()
            .find(|name| !self.args.contains_key(*name))
            .cloned()
    }

    pub fn set_args(
        &mut self,
        names: &[Option<String>],
        values: Vec<Value>,
    ) -> Result<(), RuntimeError> {
        for (i, name) in names.iter().enumerate() {
            if let Some(name) = name {
                if !self.arg_names.contains(name) {
                    return Err(RuntimeError::new(
                        format!("Argument {} is unknown", name),
                        &self.pos,
                    ));
                }
                self.args.insert(name.clone(), values[i].clone());
            }
        }

        let mut rest: Vec<Value> = Vec::new();
        let mut in_keywords = false;
        for (i, name) in names.iter().enumerate() {
            match name {
                None => {
                    if in_keywords {
                        return Err(RuntimeError::new(
                            "Positional arguments need to be placed before named arguments",
                            &self.pos,
                        ));
                    }
                    match self.next_positional_arg_name() {
                        None => {
                            if self.rest_name.is_none() {
                                return Err(RuntimeError::new("Too many arguments", &self.pos));
                            }
                            rest.push(values[i].clone());
                        }
                        Some(arg_name) => {
                            self.args.insert(arg_name, values[i].clone());
                        }
                    }
                }
                Some(name) => {
                    in_keywords = true;
                    self.args.insert(name.clone(), values[i].clone());
                }
            }
        }
        if let Some(rest_name) = &self.rest_name {
            self.args.insert(rest_name.clone(), Value::list(rest));
        }
        Ok(())
    }

    pub fn has_arg(&self, name: &str) -> bool {
        self.args.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<Value, RuntimeError> {
        self.args.get(name).cloned().ok_or_else(|| {
            RuntimeError::new(format!("Missing argument {}", name), &self.pos)
        })
    }

    pub fn is_null(&self, name: &str) -> bool {
        match self.args.get(name) {
            Some(value) => value.is_null(),
            None => false,
        }
    }

    pub fn get_string(&self, name: &str) -> Result<String, RuntimeError> {
        let value = self.get(name)?;
        if !value.is_string() {
            return Err(RuntimeError::new(
                format!("String required but got {}", value.type_name()),
                &self.pos,
            ));
        }
        value.as_string()
    }

    pub fn get_string_or(&self, name: &str, default: &str) -> Result<String, RuntimeError> {
        if !self.has_arg(name) {
            return Ok(default.to_string());
        }
        self.get_string(name)
    }

    pub fn get_boolean(&self, name: &str) -> Result<bool, RuntimeError> {
        let value = self.get(name)?;
        value.bool_value().ok_or_else(|| {
            RuntimeError::new(
                format!("Boolean required but got {}", value.type_name()),
                &self.pos,
            )
        })
    }

    pub fn get_boolean_or(&self, name: &str, default: bool) -> Result<bool, RuntimeError> {
        if !self.has_arg(name) {
            return Ok(default);
        }
        self.get_boolean(name)
    }

    pub fn get_int(&self, name: &str) -> Result<i64, RuntimeError> {
        let value = self.get(name)?;
        if !value.is_int() {
            return Err(RuntimeError::new(
                format!("Int required but got {}", value.type_name()),
                &self.pos,
            ));
        }
        value.as_int()
    }

    pub fn get_int_or(&self, name: &str, default: i64) -> Result<i64, RuntimeError> {
        if !self.has_arg(name) {
            return Ok(default);
        }
        self.get_int(name)
    }

    pub fn get_numerical(&self, name: &str) -> Result<f64, RuntimeError> {
        let value = self.get(name)?;
        if !value.is_numerical() {
            return Err(RuntimeError::new(
                format!("Numerical required but got {}", value.type_name()),
                &self.pos,
            ));
        }
        value.as_decimal()
    }

    pub fn get_list(&self, name: &str) -> Result<ListRef, RuntimeError> {
        let value = self.get(name)?;
        if !value.is_list() {
            return Err(RuntimeError::new(
                format!("List required but got {}", value.type_name()),
                &self.pos,
            ));
        }
        value.as_list()
    }

    pub fn get_map(&self, name: &str) -> Result<MapRef, RuntimeError> {
        let value = self.get(name)?;
        if !value.is_map() {
            return Err(RuntimeError::new(
                format!("Map required but got {}", value.type_name()),
                &self.pos,
            ));
        }
        value.as_map()
    }

    pub fn get_func(&self, name: &str) -> Result<Rc<FuncValue>, RuntimeError> {
        let value = self.get(name)?;
        if !value.is_func() {
            return Err(RuntimeError::new(
                format!("Func required but got {}", value.type_name()),
                &self.pos,
            ));
        }
        value.as_func()
    }

    pub fn get_date(&self, name: &str) -> Result<NaiveDateTime, RuntimeError> {
        let value = self.get(name)?;
        if !value.is_date() {
            return Err(RuntimeError::new(
                format!("Date required but got {}", value.type_name()),
                &self.pos,
            ));
        }
        value.as_date()
    }

    pub fn get_input_or(&self, name: &str, fallback: Value) -> Result<InputRef, RuntimeError> {
        let value = if self.has_arg(name) {
            self.get(name)?
        } else {
            fallback
        };
        if !value.is_input() {
            return Err(RuntimeError::new(
                format!("Input required but got {}", value.type_name()),
                &self.pos,
            ));
        }
        value.as_input()
    }

    pub fn get_output_or(&self, name: &str, fallback: Value) -> Result<OutputRef, RuntimeError> {
        let value = if self.has_arg(name) {
            self.get(name)?
        } else {
            fallback
        };
        if !value.is_output() {
            return Err(RuntimeError::new(
                format!("Output required but got {}", value.type_name()),
                &self.pos,
            ));
        }
        value.as_output()
    }

    pub fn get_as_string(&self, name: &str) -> Result<String, RuntimeError> {
        self.get(name)?.as_string().map_err(|e| e.at(&self.pos))
    }

    pub fn get_as_int(&self, name: &str) -> Result<i64, RuntimeError> {
        self.get(name)?.as_int().map_err(|e| e.at(&self.pos))
    }

    pub fn get_as_decimal(&self, name: &str) -> Result<f64, RuntimeError> {
        self.get(name)?.as_decimal().map_err(|e| e.at(&self.pos))
    }

    pub fn get_as_boolean(&self, name: &str) -> Result<bool, RuntimeError> {
        self.get(name)?.as_boolean().map_err(|e| e.at(&self.pos))
    }

    pub fn get_as_date(&self, name: &str) -> Result<NaiveDateTime, RuntimeError> {
        self.get(name)?.as_date().map_err(|e| e.at(&self.pos))
    }

    pub fn get_as_pattern(&self, name: &str) -> Result<Rc<PatternValue>, RuntimeError> {
        self.get(name)?.as_pattern().map_err(|e| e.at(&self.pos))
    }

    pub fn get_as_pattern_or(
        &self,
        name: &str,
        default: &str,
    ) -> Result<Rc<PatternValue>, RuntimeError> {
        if !self.has_arg(name) {
            return PatternValue::compile(default).map(Rc::new);
        }
        self.get_as_pattern(name)
    }

    pub fn get_as_list(&self, name: &str) -> Result<ListRef, RuntimeError> {
        self.get(name)?.as_list().map_err(|e| e.at(&self.pos))
    }

    pub fn get_as_set(&self, name: &str) -> Result<SetRef, RuntimeError> {
        self.get(name)?.as_set().map_err(|e| e.at(&self.pos))
    }

    pub fn get_as_map(&self, name: &str) -> Result<MapRef, RuntimeError> {
        self.get(name)?.as_map().map_err(|e| e.at(&self.pos))
    }

    pub fn get_as_object(&self, name: &str) -> Result<ObjectRef, RuntimeError> {
        self.get(name)?.as_object().map_err(|e| e.at(&self.pos))
    }

    pub fn get_as_node(&self, name: &str) -> Result<Rc<Node>, RuntimeError> {
        self.get(name)?.as_node().map_err(|e| e.at(&self.pos))
    }

    /// Frame description for stack traces; long values are abbreviated.
    pub fn to_string_abbrev(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut names: Vec<&String> = self.arg_names.iter().collect();
        if let Some(rest) = &self.rest_name {
            names.push(rest);
        }
        for name in names {
            if let Some(value) = self.args.get(name) {
                let mut value = value.to_string();
                if value.chars().count() > 50 {
                    let head: String = value.chars().take(50).collect();
                    let tail: String =
                        value.chars().skip(value.chars().count() - 5).collect();
                    value = format!("{}... {}", head, tail);
                }
                parts.push(format!("{}={}", name, value));
            }
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn test_canonical_int_and_decimal() {
        assert_eq!(Value::int(42).to_string(), "42");
        assert_eq!(Value::decimal(1.0).to_string(), "1.0");
        assert_eq!(Value::decimal(0.5).to_string(), "0.5");
        assert_eq!(Value::decimal(-2.5).to_string(), "-2.5");
    }

    #[test]
    fn test_canonical_string_escapes() {
        assert_eq!(Value::string("abc").to_string(), "'abc'");
        assert_eq!(Value::string("a'b").to_string(), "'a\\'b'");
        assert_eq!(Value::string("a\nb").to_string(), "'a\\nb'");
    }

    #[test]
    fn test_canonical_containers() {
        let list = Value::list(vec![Value::int(1), Value::string("a")]);
        assert_eq!(list.to_string(), "[1, 'a']");

        let mut set = BTreeSet::new();
        set.insert(Value::int(3));
        set.insert(Value::int(1));
        set.insert(Value::int(2));
        assert_eq!(Value::set(set).to_string(), "<<1, 2, 3>>");

        let mut map = BTreeMap::new();
        map.insert(Value::string("b"), Value::int(2));
        map.insert(Value::string("a"), Value::int(1));
        assert_eq!(Value::map(map).to_string(), "<<<'a' => 1, 'b' => 2>>>");
    }

    #[test]
    fn test_object_hides_underscore_members() {
        let mut obj = ObjectValue::new();
        obj.members.insert("a".to_string(), Value::int(1));
        obj.members.insert("_hidden".to_string(), Value::int(2));
        assert_eq!(Value::object(obj).to_string(), "<*a=1*>");
    }

    #[test]
    fn test_cross_numeric_equality() {
        assert_eq!(Value::int(1), Value::decimal(1.0));
        assert_ne!(Value::int(1), Value::decimal(1.5));
        assert_ne!(Value::int(1), Value::string("1"));
    }

    #[test]
    fn test_null_equality() {
        assert_eq!(Value::null(), Value::null());
        assert_ne!(Value::null(), Value::int(0));
        assert_ne!(Value::null(), Value::string(""));
    }

    #[test]
    fn test_total_order_falls_back_to_canonical_strings() {
        // '100' vs "'100'": the digit sorts after the quote
        assert_eq!(
            Value::int(100).cmp(&Value::string("100")),
            Ordering::Greater
        );
        assert_eq!(Value::null().cmp(&Value::int(1)), Ordering::Greater);
        assert_eq!(Value::null().cmp(&Value::null()), Ordering::Equal);
    }

    #[test]
    fn test_null_coercions() {
        assert_eq!(Value::null().as_int().unwrap(), 0);
        assert_eq!(Value::null().as_string().unwrap(), "");
    }

    #[test]
    fn test_string_coercions() {
        assert_eq!(Value::string("12").as_int().unwrap(), 12);
        assert_eq!(Value::string("1.5").as_decimal().unwrap(), 1.5);
        assert!(Value::string("1").as_boolean().unwrap());
        assert!(!Value::string("0").as_boolean().unwrap());
        assert!(Value::string("true").as_boolean().unwrap());
        assert!(Value::string("abc").as_int().is_err());
    }

    #[test]
    fn test_string_date_coercion_lengths() {
        assert_eq!(
            Value::string("20170102").as_date().unwrap().format("%Y%m%d%H%M%S").to_string(),
            "20170102000000"
        );
        assert_eq!(
            Value::string("2017010212").as_date().unwrap().format("%Y%m%d%H%M%S").to_string(),
            "20170102120000"
        );
        assert_eq!(
            Value::string("20170102123456").as_date().unwrap().format("%Y%m%d%H%M%S").to_string(),
            "20170102123456"
        );
        assert!(Value::string("201701").as_date().is_err());
        assert!(Value::string("20170133").as_date().is_err());
    }

    #[test]
    fn test_list_as_int_is_length() {
        let list = Value::list(vec![Value::int(1), Value::int(2)]);
        assert_eq!(list.as_int().unwrap(), 2);
    }

    #[test]
    fn test_aliasing_lists_share_storage() {
        let a = Value::list(vec![]);
        let b = a.clone();
        if let ValueData::List(items) = &a.data {
            items.borrow_mut().push(Value::int(1));
        }
        assert_eq!(b.to_string(), "[1]");
    }

    #[test]
    fn test_cyclic_list_renders_ellipsis() {
        let a = Value::list(vec![Value::int(1)]);
        if let ValueData::List(items) = &a.data {
            let alias = a.clone();
            items.borrow_mut().push(alias);
        }
        assert_eq!(a.to_string(), "[1, [...]]");
    }

    #[test]
    fn test_args_positional_and_named() {
        let pos = SourcePos::unknown();
        let mut args = Args::new(&pos);
        args.add_args(&["a".to_string(), "b".to_string()]);
        args.set_args(
            &[None, Some("b".to_string())],
            vec![Value::int(1), Value::int(2)],
        )
        .unwrap();
        assert_eq!(args.get("a").unwrap(), Value::int(1));
        assert_eq!(args.get("b").unwrap(), Value::int(2));
    }

    #[test]
    fn test_args_rest_collects_overflow() {
        let pos = SourcePos::unknown();
        let mut args = Args::new(&pos);
        args.add_args(&["a".to_string(), "rest...".to_string()]);
        args.set_args(
            &[None, None, None],
            vec![Value::int(1), Value::int(2), Value::int(3)],
        )
        .unwrap();
        assert_eq!(args.get("a").unwrap(), Value::int(1));
        assert_eq!(args.get("rest...").unwrap().to_string(), "[2, 3]");
    }

    #[test]
    fn test_args_unknown_name_is_error() {
        let pos = SourcePos::unknown();
        let mut args = Args::new(&pos);
        args.add_args(&["a".to_string()]);
        let result = args.set_args(&[Some("nope".to_string())], vec![Value::int(1)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_args_positional_after_named_is_error() {
        let pos = SourcePos::unknown();
        let mut args = Args::new(&pos);
        args.add_args(&["a".to_string(), "b".to_string()]);
        let result = args.set_args(
            &[Some("a".to_string()), None],
            vec![Value::int(1), Value::int(2)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_pattern_matches_at_start() {
        let p = PatternValue::compile("[a-z]+").unwrap();
        assert!(p.matches_start("abc12"));
        assert!(!p.matches_start("12abc"));
    }
}
