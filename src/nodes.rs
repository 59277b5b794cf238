// ABOUTME: AST node types produced by the parser, with their printable forms

use std::fmt;
use std::rc::Rc;

use crate::lexer::SourcePos;
use crate::values::Value;

/// Which aspect of an associative container an iteration visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterWhat {
    Keys,
    Values,
    Entries,
}

impl IterWhat {
    pub fn as_str(&self) -> &'static str {
        match self {
            IterWhat::Keys => "keys",
            IterWhat::Values => "values",
            IterWhat::Entries => "entries",
        }
    }
}

impl fmt::Display for IterWhat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Second-loop style of a two-loop comprehension: `for ... for ...`
/// (Cartesian product) or `for ... also for ...` (index-wise pairing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompStyle {
    Product,
    Parallel,
}

#[derive(Debug, Clone)]
pub struct CompLoop {
    pub identifier: String,
    pub what: Option<IterWhat>,
    pub expr: Box<Node>,
}

#[derive(Debug, Clone)]
pub enum Node {
    Literal {
        value: Value,
        pos: SourcePos,
    },
    NullLiteral {
        pos: SourcePos,
    },
    Identifier {
        name: String,
        pos: SourcePos,
    },
    Assign {
        name: String,
        expr: Box<Node>,
        pos: SourcePos,
    },
    AssignDestructuring {
        names: Vec<String>,
        expr: Box<Node>,
        pos: SourcePos,
    },
    Def {
        name: String,
        expr: Box<Node>,
        info: String,
        pos: SourcePos,
    },
    DefDestructuring {
        names: Vec<String>,
        expr: Box<Node>,
        info: String,
        pos: SourcePos,
    },
    Block {
        expressions: Vec<Node>,
        catches: Vec<(Option<Node>, Node)>,
        finally_exprs: Vec<Node>,
        pos: SourcePos,
    },
    If {
        conditions: Vec<Node>,
        expressions: Vec<Node>,
        else_expr: Box<Node>,
        pos: SourcePos,
    },
    For {
        identifiers: Vec<String>,
        expr: Box<Node>,
        block: Box<Node>,
        what: IterWhat,
        pos: SourcePos,
    },
    While {
        condition: Box<Node>,
        block: Box<Node>,
        pos: SourcePos,
    },
    And {
        expressions: Vec<Node>,
        pos: SourcePos,
    },
    Or {
        expressions: Vec<Node>,
        pos: SourcePos,
    },
    Not {
        expr: Box<Node>,
        pos: SourcePos,
    },
    In {
        expr: Box<Node>,
        list: Box<Node>,
        pos: SourcePos,
    },
    Funcall {
        func: Box<Node>,
        names: Vec<Option<String>>,
        args: Vec<Node>,
        pos: SourcePos,
    },
    Lambda {
        arg_names: Vec<String>,
        defaults: Vec<Option<Node>>,
        body: Rc<Node>,
        pos: SourcePos,
    },
    Deref {
        expr: Box<Node>,
        index: Box<Node>,
        default: Option<Box<Node>>,
        pos: SourcePos,
    },
    DerefAssign {
        expr: Box<Node>,
        index: Box<Node>,
        value: Box<Node>,
        pos: SourcePos,
    },
    DerefInvoke {
        expr: Box<Node>,
        member: String,
        names: Vec<Option<String>>,
        args: Vec<Node>,
        pos: SourcePos,
    },
    ListLiteral {
        items: Vec<Node>,
        pos: SourcePos,
    },
    SetLiteral {
        items: Vec<Node>,
        pos: SourcePos,
    },
    MapLiteral {
        keys: Vec<Node>,
        values: Vec<Node>,
        pos: SourcePos,
    },
    ObjectLiteral {
        keys: Vec<String>,
        values: Vec<Node>,
        pos: SourcePos,
    },
    Comprehension {
        set: bool,
        value: Box<Node>,
        loop1: CompLoop,
        loop2: Option<(CompStyle, CompLoop)>,
        condition: Option<Box<Node>>,
        pos: SourcePos,
    },
    MapComprehension {
        key: Box<Node>,
        value: Box<Node>,
        loop1: CompLoop,
        condition: Option<Box<Node>>,
        pos: SourcePos,
    },
    Spread {
        expr: Box<Node>,
        pos: SourcePos,
    },
    Break {
        pos: SourcePos,
    },
    Continue {
        pos: SourcePos,
    },
    Return {
        expr: Option<Box<Node>>,
        pos: SourcePos,
    },
    Error {
        expr: Box<Node>,
        pos: SourcePos,
    },
    Require {
        modulespec: Box<Node>,
        name: Option<String>,
        unqualified: bool,
        symbols: Option<Vec<(String, String)>>,
        pos: SourcePos,
    },
}

impl Node {
    pub fn pos(&self) -> &SourcePos {
        match self {
            Node::Literal { pos, .. }
            | Node::NullLiteral { pos }
            | Node::Identifier { pos, .. }
            | Node::Assign { pos, .. }
            | Node::AssignDestructuring { pos, .. }
            | Node::Def { pos, .. }
            | Node::DefDestructuring { pos, .. }
            | Node::Block { pos, .. }
            | Node::If { pos, .. }
            | Node::For { pos, .. }
            | Node::While { pos, .. }
            | Node::And { pos, .. }
            | Node::Or { pos, .. }
            | Node::Not { pos, .. }
            | Node::In { pos, .. }
            | Node::Funcall { pos, .. }
            | Node::Lambda { pos, .. }
            | Node::Deref { pos, .. }
            | Node::DerefAssign { pos, .. }
            | Node::DerefInvoke { pos, .. }
            | Node::ListLiteral { pos, .. }
            | Node::SetLiteral { pos, .. }
            | Node::MapLiteral { pos, .. }
            | Node::ObjectLiteral { pos, .. }
            | Node::Comprehension { pos, .. }
            | Node::MapComprehension { pos, .. }
            | Node::Spread { pos, .. }
            | Node::Break { pos }
            | Node::Continue { pos }
            | Node::Return { pos, .. }
            | Node::Error { pos, .. }
            | Node::Require { pos, .. } => pos,
        }
    }
}

fn join_nodes(nodes: &[Node], sep: &str) -> String {
    nodes
        .iter()
        .map(|node| node.to_string())
        .collect::<Vec<String>>()
        .join(sep)
}

fn comp_loop_to_string(lp: &CompLoop) -> String {
    let what = match lp.what {
        Some(what) => format!("{} ", what),
        None => String::new(),
    };
    format!("for {} in {}{}", lp.identifier, what, lp.expr)
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal { value, .. } => write!(f, "{}", value),
            Node::NullLiteral { .. } => write!(f, "NULL"),
            Node::Identifier { name, .. } => write!(f, "{}", name),
            Node::Assign { name, expr, .. } => write!(f, "({} = {})", name, expr),
            Node::AssignDestructuring { names, expr, .. } => {
                write!(f, "([{}] = {})", names.join(","), expr)
            }
            Node::Def { name, expr, .. } => write!(f, "(def {} = {})", name, expr),
            Node::DefDestructuring { names, expr, .. } => {
                write!(f, "(def [{}] = {})", names.join(","), expr)
            }
            Node::Block {
                expressions,
                catches,
                finally_exprs,
                ..
            } => {
                write!(f, "(block {}", join_nodes(expressions, ", "))?;
                for (err, expr) in catches {
                    match err {
                        Some(err) => write!(f, " catch {} {}", err, expr)?,
                        None => write!(f, " catch all {}", expr)?,
                    }
                }
                if !finally_exprs.is_empty() {
                    write!(f, " finally {}", join_nodes(finally_exprs, ", "))?;
                }
                write!(f, ")")
            }
            Node::If {
                conditions,
                expressions,
                else_expr,
                ..
            } => {
                let clauses: Vec<String> = conditions
                    .iter()
                    .zip(expressions.iter())
                    .map(|(cond, expr)| format!("if {}: {}", cond, expr))
                    .collect();
                write!(f, "({} else: {})", clauses.join(" "), else_expr)
            }
            Node::For {
                identifiers,
                expr,
                block,
                what,
                ..
            } => {
                let vars = if identifiers.len() == 1 {
                    identifiers[0].clone()
                } else {
                    format!("[{}]", identifiers.join(", "))
                };
                write!(f, "(for {} in {} {} do {})", vars, what, expr, block)
            }
            Node::While {
                condition, block, ..
            } => write!(f, "(while {} do {})", condition, block),
            Node::And { expressions, .. } => {
                write!(f, "({})", join_nodes(expressions, " and "))
            }
            Node::Or { expressions, .. } => write!(f, "({})", join_nodes(expressions, " or ")),
            Node::Not { expr, .. } => write!(f, "(not {})", expr),
            Node::In { expr, list, .. } => write!(f, "({} in {})", expr, list),
            Node::Funcall { func, args, .. } => {
                write!(f, "({} {})", func, join_nodes(args, ", "))
            }
            Node::Lambda {
                arg_names,
                defaults,
                body,
                ..
            } => {
                write!(f, "(lambda ")?;
                for (name, default) in arg_names.iter().zip(defaults.iter()) {
                    match default {
                        Some(default) => write!(f, "{}={}, ", name, default)?,
                        None => write!(f, "{}, ", name)?,
                    }
                }
                write!(f, "{})", body)
            }
            Node::Deref {
                expr,
                index,
                default,
                ..
            } => match default {
                Some(default) => write!(f, "{}[{}, {}]", expr, index, default),
                None => write!(f, "{}[{}]", expr, index),
            },
            Node::DerefAssign {
                expr, index, value, ..
            } => write!(f, "({}[{}] = {})", expr, index, value),
            Node::DerefInvoke {
                expr, member, args, ..
            } => write!(f, "({}->{}({}))", expr, member, join_nodes(args, ", ")),
            Node::ListLiteral { items, .. } => write!(f, "[{}]", join_nodes(items, ", ")),
            Node::SetLiteral { items, .. } => write!(f, "<<{}>>", join_nodes(items, ", ")),
            Node::MapLiteral { keys, values, .. } => {
                let entries: Vec<String> = keys
                    .iter()
                    .zip(values.iter())
                    .map(|(key, value)| format!("{} => {}", key, value))
                    .collect();
                write!(f, "<<<{}>>>", entries.join(", "))
            }
            Node::ObjectLiteral { keys, values, .. } => {
                let entries: Vec<String> = keys
                    .iter()
                    .zip(values.iter())
                    .map(|(key, value)| format!("{}={}", key, value))
                    .collect();
                write!(f, "<*{}*>", entries.join(", "))
            }
            Node::Comprehension {
                set,
                value,
                loop1,
                loop2,
                condition,
                ..
            } => {
                let (open, close) = if *set { ("<<", ">>") } else { ("[", "]") };
                write!(f, "{}{} {}", open, value, comp_loop_to_string(loop1))?;
                if let Some((style, lp)) = loop2 {
                    let also = match style {
                        CompStyle::Parallel => " also",
                        CompStyle::Product => "",
                    };
                    write!(f, "{} {}", also, comp_loop_to_string(lp))?;
                }
                if let Some(condition) = condition {
                    write!(f, " if {}", condition)?;
                }
                write!(f, "{}", close)
            }
            Node::MapComprehension {
                key,
                value,
                loop1,
                condition,
                ..
            } => {
                write!(f, "<<<{} => {} {}", key, value, comp_loop_to_string(loop1))?;
                if let Some(condition) = condition {
                    write!(f, " if {}", condition)?;
                }
                write!(f, ">>>")
            }
            Node::Spread { expr, .. } => write!(f, "...{}", expr),
            Node::Break { .. } => write!(f, "(break)"),
            Node::Continue { .. } => write!(f, "(continue)"),
            Node::Return { expr, .. } => match expr {
                Some(expr) => write!(f, "(return {})", expr),
                None => write!(f, "(return)"),
            },
            Node::Error { expr, .. } => write!(f, "(error {})", expr),
            Node::Require {
                modulespec,
                name,
                unqualified,
                ..
            } => {
                write!(f, "(require {}", modulespec)?;
                if let Some(name) = name {
                    write!(f, " as {}", name)?;
                }
                if *unqualified {
                    write!(f, " unqualified")?;
                }
                write!(f, ")")
            }
        }
    }
}
