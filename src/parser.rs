// ABOUTME: Recursive-descent parser over the token cursor, including the
// is-predicate sub-grammar, comprehensions, destructuring and call chains

use crate::errors::SyntaxError;
use crate::lexer::{Lexer, SourcePos, TokenKind};
use crate::nodes::{CompLoop, CompStyle, IterWhat, Node};
use crate::values::{PatternValue, Value};
use std::rc::Rc;

use TokenKind::{Identifier, Interpunction, Keyword, Operator};

pub fn parse_script(script: &str, filename: &str) -> Result<Node, SyntaxError> {
    let mut lexer = Lexer::new(script, filename)?;
    parse(&mut lexer)
}

pub fn parse(lexer: &mut Lexer) -> Result<Node, SyntaxError> {
    if !lexer.has_next() {
        return Ok(Node::NullLiteral {
            pos: SourcePos::new(&lexer.name, 1, 1),
        });
    }
    let result = parse_bare_block(lexer)?;
    if lexer.has_next() {
        let token = lexer.next_token()?;
        return Err(SyntaxError::new(
            format!("Expected end of input but got '{}'", token),
            token.pos,
        ));
    }
    Ok(unwrap_return(result))
}

/// A trailing `return expr` at the end of a function body or the top level
/// is unwrapped to the expression itself.
fn unwrap_return(node: Node) -> Node {
    match node {
        Node::Return { expr, pos } => match expr {
            Some(expr) => *expr,
            None => Node::NullLiteral { pos },
        },
        Node::Block {
            mut expressions,
            catches,
            finally_exprs,
            pos,
        } => {
            if let Some(last) = expressions.pop() {
                let last = match last {
                    Node::Return { expr, pos } => match expr {
                        Some(expr) => *expr,
                        None => Node::NullLiteral { pos },
                    },
                    other => other,
                };
                expressions.push(last);
            }
            Node::Block {
                expressions,
                catches,
                finally_exprs,
                pos,
            }
        }
        other => other,
    }
}

fn parse_bare_block(lexer: &mut Lexer) -> Result<Node, SyntaxError> {
    let pos = lexer.get_pos_next();
    let expression = if lexer.peekn(1, "do", Some(Keyword)) {
        parse_block(lexer)?
    } else {
        parse_statement(lexer)?
    };
    if !lexer.has_next() {
        return Ok(expression);
    }
    let mut expressions = vec![expression];
    while lexer.match_if(";", Some(Interpunction)) {
        if !lexer.has_next() {
            break;
        }
        let expression = if lexer.peekn(1, "do", Some(Keyword)) {
            parse_block(lexer)?
        } else {
            parse_statement(lexer)?
        };
        expressions.push(expression);
    }
    if expressions.len() == 1 {
        return Ok(expressions.remove(0));
    }
    Ok(Node::Block {
        expressions,
        catches: Vec::new(),
        finally_exprs: Vec::new(),
        pos,
    })
}

fn at_block_end(lexer: &Lexer) -> bool {
    lexer.peekn(1, "end", Some(Keyword))
        || lexer.peekn(1, "catch", Some(Keyword))
        || lexer.peekn(1, "finally", Some(Keyword))
}

fn parse_block(lexer: &mut Lexer) -> Result<Node, SyntaxError> {
    let pos = lexer.get_pos_next();
    let mut expressions = Vec::new();
    let mut catches = Vec::new();
    let mut finally_exprs = Vec::new();
    lexer.expect("do", Keyword)?;
    while !at_block_end(lexer) {
        let expression = if lexer.peekn(1, "do", Some(Keyword)) {
            parse_block(lexer)?
        } else {
            parse_statement(lexer)?
        };
        expressions.push(expression);
        if at_block_end(lexer) {
            break;
        }
        lexer.expect(";", Interpunction)?;
        if at_block_end(lexer) {
            break;
        }
    }
    while lexer.match_if("catch", Some(Keyword)) {
        let err = if lexer.match_if("all", Some(Identifier)) {
            None
        } else {
            Some(parse_expression(lexer)?)
        };
        let expr = if lexer.peekn(1, "do", Some(Keyword)) {
            parse_block(lexer)?
        } else {
            parse_statement(lexer)?
        };
        if lexer.peekn(1, ";", Some(Interpunction)) {
            lexer.eat(1);
        }
        catches.push((err, expr));
    }
    if lexer.match_if("finally", Some(Keyword)) {
        while !lexer.peekn(1, "end", Some(Keyword)) {
            let expression = if lexer.peekn(1, "do", Some(Keyword)) {
                parse_block(lexer)?
            } else {
                parse_statement(lexer)?
            };
            finally_exprs.push(expression);
            if lexer.peekn(1, "end", Some(Keyword)) {
                break;
            }
            lexer.expect(";", Interpunction)?;
        }
    }
    lexer.expect("end", Keyword)?;
    if expressions.len() == 1 && catches.is_empty() && finally_exprs.is_empty() {
        return Ok(expressions.remove(0));
    }
    Ok(Node::Block {
        expressions,
        catches,
        finally_exprs,
        pos,
    })
}

fn check_assignable(name: &str, pos: &SourcePos) -> Result<(), SyntaxError> {
    if name.starts_with("checkerlang_") {
        return Err(SyntaxError::new(
            format!("Cannot assign to system variable {}", name),
            pos.clone(),
        ));
    }
    Ok(())
}

fn parse_statement(lexer: &mut Lexer) -> Result<Node, SyntaxError> {
    if !lexer.has_next() {
        return Err(SyntaxError::new("Unexpected end of input", lexer.get_pos()));
    }

    // a string literal directly preceding `def` is the docstring
    let mut comment = String::new();
    if lexer.peek_kind(1, TokenKind::String) && lexer.peekn(2, "def", Some(Keyword)) {
        comment = lexer.next_token()?.value;
    }

    if lexer.match_if("require", Some(Keyword)) {
        let pos = lexer.get_pos();
        let modulespec = parse_expression(lexer)?;
        let mut unqualified = false;
        let mut symbols = None;
        let mut name = None;
        if lexer.match_if("unqualified", Some(Identifier)) {
            unqualified = true;
        } else if lexer.match_if_seq(&[("import", Some(Identifier)), ("[", Some(Interpunction))]) {
            let mut imports = Vec::new();
            while !lexer.peekn(1, "]", Some(Interpunction)) {
                let symbol = lexer.match_identifier()?;
                let symbolname = if lexer.match_if("as", Some(Keyword)) {
                    lexer.match_identifier()?
                } else {
                    symbol.clone()
                };
                imports.push((symbol, symbolname));
                if !lexer.peekn(1, "]", Some(Interpunction)) {
                    lexer.expect(",", Interpunction)?;
                }
            }
            lexer.expect("]", Interpunction)?;
            symbols = Some(imports);
        } else if lexer.match_if("as", Some(Keyword)) {
            name = Some(lexer.match_identifier()?);
        }
        return Ok(Node::Require {
            modulespec: Box::new(modulespec),
            name,
            unqualified,
            symbols,
            pos,
        });
    }

    if lexer.match_if("def", Some(Keyword)) {
        let pos = lexer.get_pos();
        if lexer.match_if("[", Some(Interpunction)) {
            let mut identifiers = Vec::new();
            while !lexer.peekn(1, "]", Some(Interpunction)) {
                let token = lexer.next_token()?;
                if token.kind == Keyword {
                    return Err(SyntaxError::new(
                        format!("Cannot redefine keyword '{}'", token),
                        token.pos,
                    ));
                }
                if token.kind != Identifier {
                    return Err(SyntaxError::new(
                        format!("Expected identifier but got '{}'", token),
                        token.pos,
                    ));
                }
                identifiers.push(token.value);
                if !lexer.peekn(1, "]", Some(Interpunction)) {
                    lexer.expect(",", Interpunction)?;
                }
            }
            lexer.expect("]", Interpunction)?;
            lexer.expect("=", Operator)?;
            return Ok(Node::DefDestructuring {
                names: identifiers,
                expr: Box::new(parse_expression(lexer)?),
                info: comment,
                pos,
            });
        }
        let token = lexer.next_token()?;
        if token.kind == Keyword {
            return Err(SyntaxError::new(
                format!("Cannot redefine keyword '{}'", token),
                token.pos,
            ));
        }
        if token.kind != Identifier {
            return Err(SyntaxError::new(
                format!("Expected identifier but got '{}'", token),
                token.pos,
            ));
        }
        if lexer.peekn(1, "(", Some(Interpunction)) {
            return Ok(Node::Def {
                name: token.value,
                expr: Box::new(parse_fn(lexer, pos.clone())?),
                info: comment,
                pos,
            });
        }
        lexer.expect("=", Operator)?;
        return Ok(Node::Def {
            name: token.value,
            expr: Box::new(parse_expression(lexer)?),
            info: comment,
            pos,
        });
    }

    if lexer.match_if("for", Some(Keyword)) {
        let pos = lexer.get_pos();
        let mut identifiers = Vec::new();
        if lexer.match_if("[", Some(Interpunction)) {
            while !lexer.peekn(1, "]", Some(Interpunction)) {
                let token = lexer.next_token()?;
                if token.kind != Identifier {
                    return Err(SyntaxError::new(
                        format!("Expected identifier in for loop but got '{}'", token),
                        token.pos,
                    ));
                }
                identifiers.push(token.value);
                if !lexer.peekn(1, "]", Some(Interpunction)) {
                    lexer.expect(",", Interpunction)?;
                }
            }
            lexer.expect("]", Interpunction)?;
        } else {
            let token = lexer.next_token()?;
            if token.kind != Identifier {
                return Err(SyntaxError::new(
                    format!("Expected identifier in for loop but got '{}'", token),
                    token.pos,
                ));
            }
            identifiers.push(token.value);
        }
        lexer.expect("in", Keyword)?;
        let what = parse_iter_what(lexer).unwrap_or(IterWhat::Values);
        let expression = parse_expression(lexer)?;
        let block = if lexer.peekn(1, "do", Some(Keyword)) {
            parse_block(lexer)?
        } else {
            parse_expression(lexer)?
        };
        return Ok(Node::For {
            identifiers,
            expr: Box::new(expression),
            block: Box::new(block),
            what,
            pos,
        });
    }

    if lexer.match_if("while", Some(Keyword)) {
        let pos = lexer.get_pos();
        let condition = parse_or_expr(lexer)?;
        let block = parse_block(lexer)?;
        return Ok(Node::While {
            condition: Box::new(condition),
            block: Box::new(block),
            pos,
        });
    }

    parse_expression(lexer)
}

fn parse_iter_what(lexer: &mut Lexer) -> Option<IterWhat> {
    if lexer.match_if("keys", Some(Identifier)) {
        Some(IterWhat::Keys)
    } else if lexer.match_if("values", Some(Identifier)) {
        Some(IterWhat::Values)
    } else if lexer.match_if("entries", Some(Identifier)) {
        Some(IterWhat::Entries)
    } else {
        None
    }
}

fn parse_expression(lexer: &mut Lexer) -> Result<Node, SyntaxError> {
    if lexer.peekn(1, "if", Some(Keyword)) {
        let pos = lexer.get_pos_next();
        let mut conditions = Vec::new();
        let mut expressions = Vec::new();
        let mut else_expr = Node::Literal {
            value: Value::boolean(true),
            pos: pos.clone(),
        };
        while lexer.match_if("if", Some(Keyword)) || lexer.match_if("elif", Some(Keyword)) {
            let condition = parse_or_expr(lexer)?;
            lexer.expect("then", Keyword)?;
            let expression = if lexer.peekn(1, "do", Some(Keyword)) {
                parse_block(lexer)?
            } else {
                parse_or_expr(lexer)?
            };
            conditions.push(condition);
            expressions.push(expression);
        }
        if lexer.match_if("else", Some(Keyword)) {
            else_expr = if lexer.peekn(1, "do", Some(Keyword)) {
                parse_block(lexer)?
            } else {
                parse_or_expr(lexer)?
            };
        }
        return Ok(Node::If {
            conditions,
            expressions,
            else_expr: Box::new(else_expr),
            pos,
        });
    }
    parse_or_expr(lexer)
}

fn parse_or_expr(lexer: &mut Lexer) -> Result<Node, SyntaxError> {
    let expr = parse_and_expr(lexer)?;
    if !lexer.peekn(1, "or", Some(Keyword)) {
        return Ok(expr);
    }
    let pos = lexer.get_pos_next();
    let mut expressions = vec![expr];
    while lexer.match_if("or", Some(Keyword)) {
        expressions.push(parse_and_expr(lexer)?);
    }
    Ok(Node::Or { expressions, pos })
}

fn parse_and_expr(lexer: &mut Lexer) -> Result<Node, SyntaxError> {
    let expr = parse_not_expr(lexer)?;
    if !lexer.peekn(1, "and", Some(Keyword)) {
        return Ok(expr);
    }
    let pos = lexer.get_pos_next();
    let mut expressions = vec![expr];
    while lexer.match_if("and", Some(Keyword)) {
        expressions.push(parse_not_expr(lexer)?);
    }
    Ok(Node::And { expressions, pos })
}

fn parse_not_expr(lexer: &mut Lexer) -> Result<Node, SyntaxError> {
    if lexer.match_if("not", Some(Keyword)) {
        let pos = lexer.get_pos();
        return Ok(Node::Not {
            expr: Box::new(parse_rel_expr(lexer)?),
            pos,
        });
    }
    parse_rel_expr(lexer)
}

const REL_OPS: &[&str] = &["==", "!=", "<>", "<", "<=", ">", ">=", "is"];

fn peek_rel_op(lexer: &Lexer) -> bool {
    match lexer.peek() {
        Some(token) => {
            REL_OPS.contains(&token.value.as_str())
                && (token.kind == Operator || token.kind == Keyword)
        }
        None => false,
    }
}

// Chained comparisons: `a < b <= c` becomes `less(a, b) and less_equals(b, c)`,
// the rhs of each comparison carrying over as the lhs of the next.
fn parse_rel_expr(lexer: &mut Lexer) -> Result<Node, SyntaxError> {
    let expr = parse_add_expr(lexer)?;
    if !peek_rel_op(lexer) {
        return Ok(expr);
    }
    let and_pos = lexer.get_pos_next();
    let mut clauses = Vec::new();
    let mut lhs = expr;
    while peek_rel_op(lexer) {
        let mut relop = lexer.next_token()?.value;
        if relop == "is" && lexer.peekn(1, "not", Some(Keyword)) {
            relop = "is not".to_string();
            lexer.eat(1);
        }
        let pos = lexer.get_pos();
        let rhs = parse_add_expr(lexer)?;
        let cmp = match relop.as_str() {
            "<" => bin_call("less", lhs.clone(), rhs.clone(), &pos),
            "<=" => bin_call("less_equals", lhs.clone(), rhs.clone(), &pos),
            ">" => bin_call("greater", lhs.clone(), rhs.clone(), &pos),
            ">=" => bin_call("greater_equals", lhs.clone(), rhs.clone(), &pos),
            "==" | "is" => bin_call("equals", lhs.clone(), rhs.clone(), &pos),
            _ => bin_call("not_equals", lhs.clone(), rhs.clone(), &pos),
        };
        clauses.push(cmp);
        lhs = rhs;
    }
    if clauses.len() == 1 {
        return Ok(clauses.remove(0));
    }
    Ok(Node::And {
        expressions: clauses,
        pos: and_pos,
    })
}

fn parse_add_expr(lexer: &mut Lexer) -> Result<Node, SyntaxError> {
    let mut expr = parse_mul_expr(lexer)?;
    while lexer.peek_one(1, &["+", "-"], Some(Operator)) {
        if lexer.match_if("+", Some(Operator)) {
            let pos = lexer.get_pos();
            expr = bin_call("add", expr, parse_mul_expr(lexer)?, &pos);
        } else if lexer.match_if("-", Some(Operator)) {
            let pos = lexer.get_pos();
            expr = bin_call("sub", expr, parse_mul_expr(lexer)?, &pos);
        }
    }
    Ok(expr)
}

fn parse_mul_expr(lexer: &mut Lexer) -> Result<Node, SyntaxError> {
    let mut expr = parse_unary_expr(lexer)?;
    while lexer.peek_one(1, &["*", "/", "%"], Some(Operator)) {
        if lexer.match_if("*", Some(Operator)) {
            let pos = lexer.get_pos();
            expr = bin_call("mul", expr, parse_unary_expr(lexer)?, &pos);
        } else if lexer.match_if("/", Some(Operator)) {
            let pos = lexer.get_pos();
            expr = bin_call("div", expr, parse_unary_expr(lexer)?, &pos);
        } else if lexer.match_if("%", Some(Operator)) {
            let pos = lexer.get_pos();
            expr = bin_call("mod", expr, parse_unary_expr(lexer)?, &pos);
        }
    }
    Ok(expr)
}

fn parse_unary_expr(lexer: &mut Lexer) -> Result<Node, SyntaxError> {
    if lexer.match_if("+", Some(Operator)) {
        return parse_pred_expr(lexer, false);
    }
    if lexer.match_if("-", Some(Operator)) {
        let pos = lexer.get_pos();
        match lexer.peek() {
            // fold the sign into int and decimal literals
            Some(token) if token.kind == TokenKind::Int || token.kind == TokenKind::Decimal => {
                return parse_pred_expr(lexer, true);
            }
            _ => {
                return Ok(bin_call(
                    "sub",
                    Node::Literal {
                        value: Value::int(0),
                        pos: pos.clone(),
                    },
                    parse_pred_expr(lexer, false)?,
                    &pos,
                ));
            }
        }
    }
    parse_pred_expr(lexer, false)
}

const TYPE_TAGS: &[&str] = &[
    "string", "int", "decimal", "boolean", "pattern", "null", "func", "input", "output", "list",
    "set", "map", "object", "node",
];

fn match_type_tag(lexer: &mut Lexer) -> Option<&'static str> {
    TYPE_TAGS
        .iter()
        .find(|tag| lexer.match_if(tag, Some(Identifier)))
        .copied()
}

fn string_of(expr: &Node, pos: &SourcePos) -> Node {
    func_call1("string", "obj", expr.clone(), pos)
}

fn type_check(expr: &Node, tag: &str, pos: &SourcePos) -> Node {
    func_call2(
        "equals",
        "a",
        func_call1("type", "obj", expr.clone(), pos),
        "b",
        Node::Literal {
            value: Value::string(tag),
            pos: pos.clone(),
        },
        pos,
    )
}

fn valid_date_check(name: &str, expr: &Node, fmt: &str, pos: &SourcePos) -> Node {
    func_call2(
        name,
        "str",
        string_of(expr, pos),
        "fmt",
        Node::Literal {
            value: Value::string(fmt),
            pos: pos.clone(),
        },
        pos,
    )
}

/// Parse the body of an `is [not] ...` predicate. Returns None when the
/// following tokens are no predicate, in which case the caller rewinds and
/// lets `is` act as the equality operator.
fn parse_is_predicate(
    lexer: &mut Lexer,
    expr: &Node,
    pos: &SourcePos,
) -> Result<Option<Node>, SyntaxError> {
    if lexer.match_if("in", None) {
        return Ok(Some(Node::In {
            expr: Box::new(expr.clone()),
            list: Box::new(parse_primary_expr(lexer, false)?),
            pos: pos.clone(),
        }));
    }
    if lexer.match_if("empty", Some(Identifier)) {
        return Ok(Some(func_call1("is_empty", "obj", expr.clone(), pos)));
    }
    if lexer.match_if("zero", Some(Identifier)) {
        return Ok(Some(func_call1("is_zero", "obj", expr.clone(), pos)));
    }
    if lexer.match_if("negative", Some(Identifier)) {
        return Ok(Some(func_call1("is_negative", "obj", expr.clone(), pos)));
    }
    if lexer.match_if("numerical", Some(Identifier)) {
        let call =
            collect_predicate_min_max_exact(lexer, "is_numerical", string_of(expr, pos), pos)?;
        return Ok(Some(call));
    }
    if lexer.match_if("alphanumerical", Some(Identifier)) {
        let call = collect_predicate_min_max_exact(
            lexer,
            "is_alphanumerical",
            string_of(expr, pos),
            pos,
        )?;
        return Ok(Some(call));
    }
    if lexer.match_if_seq(&[
        ("date", Some(Identifier)),
        ("with", Some(Identifier)),
        ("hour", Some(Identifier)),
    ]) {
        return Ok(Some(valid_date_check(
            "is_valid_date",
            expr,
            "yyyyMMddHH",
            pos,
        )));
    }
    if lexer.match_if("date", Some(Identifier)) {
        return Ok(Some(valid_date_check(
            "is_valid_date",
            expr,
            "yyyyMMdd",
            pos,
        )));
    }
    if lexer.match_if("time", Some(Identifier)) {
        return Ok(Some(valid_date_check("is_valid_time", expr, "HHmm", pos)));
    }
    if let Some(tag) = match_type_tag(lexer) {
        return Ok(Some(type_check(expr, tag, pos)));
    }
    Ok(None)
}

fn parse_pred_expr(lexer: &mut Lexer, unary_minus: bool) -> Result<Node, SyntaxError> {
    let expr = parse_primary_expr(lexer, unary_minus)?;
    let pos = lexer.get_pos_next();

    if lexer.match_if("is", Some(Keyword)) {
        let negated = lexer.match_if("not", Some(Keyword));
        match parse_is_predicate(lexer, &expr, &pos)? {
            Some(node) => {
                if negated {
                    return Ok(Node::Not {
                        expr: Box::new(node),
                        pos,
                    });
                }
                return Ok(node);
            }
            None => {
                // no predicate follows: rewind and let the relational
                // chain treat `is` as the equality operator
                if negated {
                    lexer.previous()?;
                }
                lexer.previous()?;
                return Ok(expr);
            }
        }
    }

    if lexer.match_if_seq(&[("not", Some(Keyword)), ("in", Some(Keyword))]) {
        return Ok(Node::Not {
            expr: Box::new(Node::In {
                expr: Box::new(expr),
                list: Box::new(parse_primary_expr(lexer, false)?),
                pos: pos.clone(),
            }),
            pos,
        });
    }
    if lexer.match_if("in", Some(Keyword)) {
        return Ok(Node::In {
            expr: Box::new(expr),
            list: Box::new(parse_primary_expr(lexer, false)?),
            pos,
        });
    }
    if lexer.match_if_seq(&[
        ("starts", Some(Identifier)),
        ("not", Some(Keyword)),
        ("with", Some(Identifier)),
    ]) {
        let call = func_call2(
            "starts_with",
            "str",
            expr,
            "part",
            parse_primary_expr(lexer, false)?,
            &pos,
        );
        return Ok(Node::Not {
            expr: Box::new(call),
            pos,
        });
    }
    if lexer.match_if_seq(&[("starts", Some(Identifier)), ("with", Some(Identifier))]) {
        return Ok(func_call2(
            "starts_with",
            "str",
            expr,
            "part",
            parse_primary_expr(lexer, false)?,
            &pos,
        ));
    }
    if lexer.match_if_seq(&[
        ("ends", Some(Identifier)),
        ("not", Some(Keyword)),
        ("with", Some(Identifier)),
    ]) {
        let call = func_call2(
            "ends_with",
            "str",
            expr,
            "part",
            parse_primary_expr(lexer, false)?,
            &pos,
        );
        return Ok(Node::Not {
            expr: Box::new(call),
            pos,
        });
    }
    if lexer.match_if_seq(&[("ends", Some(Identifier)), ("with", Some(Identifier))]) {
        return Ok(func_call2(
            "ends_with",
            "str",
            expr,
            "part",
            parse_primary_expr(lexer, false)?,
            &pos,
        ));
    }
    if lexer.match_if_seq(&[("contains", Some(Identifier)), ("not", Some(Keyword))]) {
        let call = func_call2(
            "contains",
            "obj",
            expr,
            "part",
            parse_primary_expr(lexer, false)?,
            &pos,
        );
        return Ok(Node::Not {
            expr: Box::new(call),
            pos,
        });
    }
    if lexer.match_if("contains", Some(Identifier)) {
        return Ok(func_call2(
            "contains",
            "obj",
            expr,
            "part",
            parse_primary_expr(lexer, false)?,
            &pos,
        ));
    }
    if lexer.match_if_seq(&[("matches", Some(Identifier)), ("not", Some(Keyword))]) {
        let call = func_call2(
            "matches",
            "str",
            expr,
            "pattern",
            parse_primary_expr(lexer, false)?,
            &pos,
        );
        return Ok(Node::Not {
            expr: Box::new(call),
            pos,
        });
    }
    if lexer.match_if("matches", Some(Identifier)) {
        return Ok(func_call2(
            "matches",
            "str",
            expr,
            "pattern",
            parse_primary_expr(lexer, false)?,
            &pos,
        ));
    }

    Ok(expr)
}

fn collect_predicate_min_max_exact(
    lexer: &mut Lexer,
    fn_name: &str,
    expr: Node,
    pos: &SourcePos,
) -> Result<Node, SyntaxError> {
    let mut min_len = Node::Literal {
        value: Value::int(0),
        pos: pos.clone(),
    };
    let mut max_len = Node::Literal {
        value: Value::int(9999),
        pos: pos.clone(),
    };
    if lexer.match_if("min_len", Some(Identifier)) {
        min_len = parse_primary_expr(lexer, false)?;
    }
    if lexer.match_if("max_len", Some(Identifier)) {
        max_len = parse_primary_expr(lexer, false)?;
    }
    if lexer.match_if("exact_len", Some(Identifier)) {
        let exact = parse_primary_expr(lexer, false)?;
        min_len = exact.clone();
        max_len = exact;
    }
    Ok(func_call3(
        fn_name, "str", expr, "min", min_len, "max", max_len, pos,
    ))
}

fn parse_primary_expr(lexer: &mut Lexer, unary_minus: bool) -> Result<Node, SyntaxError> {
    if !lexer.has_next() {
        return Err(SyntaxError::new("Unexpected end of input", lexer.get_pos()));
    }

    let token = lexer.next_token()?;

    if token.value == "(" && token.kind == Interpunction {
        let result = parse_bare_block(lexer)?;
        lexer.expect(")", Interpunction)?;
        return deref_or_call_or_invoke(lexer, result);
    }

    match token.kind {
        Identifier => {
            let result = Node::Identifier {
                name: token.value.clone(),
                pos: token.pos.clone(),
            };
            if lexer.match_if("=", Some(Operator)) {
                check_assignable(&token.value, &token.pos)?;
                return Ok(Node::Assign {
                    name: token.value,
                    expr: Box::new(parse_expression(lexer)?),
                    pos: token.pos,
                });
            }
            for op in ["+=", "-=", "*=", "/=", "%="] {
                if lexer.match_if(op, Some(Operator)) {
                    check_assignable(&token.value, &token.pos)?;
                    let value = parse_expression(lexer)?;
                    return Ok(Node::Assign {
                        name: token.value.clone(),
                        expr: Box::new(bin_call(compound_fn_name(op), result, value, &token.pos)),
                        pos: token.pos,
                    });
                }
            }
            deref_or_call_or_invoke(lexer, result)
        }
        TokenKind::String => {
            let result = Node::Literal {
                value: Value::string(token.value),
                pos: token.pos,
            };
            deref_or_invoke(lexer, result)
        }
        TokenKind::Int => {
            let value: i64 = token.value.parse().map_err(|_| {
                SyntaxError::new(
                    format!("Invalid int literal {}", token.value),
                    token.pos.clone(),
                )
            })?;
            let result = Node::Literal {
                value: Value::int(if unary_minus { -value } else { value }),
                pos: token.pos,
            };
            invoke_only(lexer, result)
        }
        TokenKind::Decimal => {
            let value: f64 = token.value.parse().map_err(|_| {
                SyntaxError::new(
                    format!("Invalid decimal literal {}", token.value),
                    token.pos.clone(),
                )
            })?;
            let result = Node::Literal {
                value: Value::decimal(if unary_minus { -value } else { value }),
                pos: token.pos,
            };
            invoke_only(lexer, result)
        }
        TokenKind::Boolean => {
            let result = Node::Literal {
                value: Value::boolean(token.value == "TRUE"),
                pos: token.pos,
            };
            invoke_only(lexer, result)
        }
        TokenKind::Pattern => {
            let source: String = {
                let chars: Vec<char> = token.value.chars().collect();
                chars[2..chars.len() - 2].iter().collect()
            };
            let pattern = PatternValue::compile(&source)
                .map_err(|e| SyntaxError::new(e.msg, token.pos.clone()))?;
            let result = Node::Literal {
                value: Value::pattern(Rc::new(pattern)),
                pos: token.pos,
            };
            invoke_only(lexer, result)
        }
        Keyword if token.value == "fn" => parse_fn(lexer, token.pos),
        Keyword if token.value == "break" => Ok(Node::Break { pos: token.pos }),
        Keyword if token.value == "continue" => Ok(Node::Continue { pos: token.pos }),
        Keyword if token.value == "return" => {
            if lexer.peekn(1, ";", Some(Interpunction)) || !lexer.has_next() {
                Ok(Node::Return {
                    expr: None,
                    pos: token.pos,
                })
            } else {
                Ok(Node::Return {
                    expr: Some(Box::new(parse_expression(lexer)?)),
                    pos: token.pos,
                })
            }
        }
        Keyword if token.value == "error" => Ok(Node::Error {
            expr: Box::new(parse_expression(lexer)?),
            pos: token.pos,
        }),
        Keyword if token.value == "do" => {
            lexer.previous()?;
            parse_block(lexer)
        }
        Interpunction if token.value == "[" => {
            let result = parse_list_literal(lexer, &token.pos)?;
            if lexer.peekn(1, "=", Some(Operator)) {
                if let Node::ListLiteral { items, .. } = &result {
                    let mut identifiers = Vec::new();
                    for item in items {
                        match item {
                            Node::Identifier { name, .. } => {
                                check_assignable(name, &token.pos)?;
                                identifiers.push(name.clone());
                            }
                            _ => {
                                return Err(SyntaxError::new(
                                    format!(
                                        "Destructuring assign expected identifier but got {}",
                                        item
                                    ),
                                    token.pos,
                                ));
                            }
                        }
                    }
                    lexer.expect("=", Operator)?;
                    return Ok(Node::AssignDestructuring {
                        names: identifiers,
                        expr: Box::new(parse_expression(lexer)?),
                        pos: token.pos,
                    });
                }
            }
            Ok(result)
        }
        Interpunction if token.value == "<<" => parse_set_literal(lexer, &token.pos),
        Interpunction if token.value == "<<<" => parse_map_literal(lexer, &token.pos),
        Interpunction if token.value == "<*" => parse_object_literal(lexer, &token.pos),
        Interpunction if token.value == "..." => {
            let inner = lexer.next_token()?;
            let result = if inner.value == "[" && inner.kind == Interpunction {
                parse_list_literal(lexer, &inner.pos)?
            } else if inner.value == "<<<" && inner.kind == Interpunction {
                parse_map_literal(lexer, &inner.pos)?
            } else if inner.kind == Identifier {
                Node::Identifier {
                    name: inner.value,
                    pos: inner.pos.clone(),
                }
            } else {
                return Err(SyntaxError::new(
                    "Spread operator only allowed with identifiers, list and map literals",
                    inner.pos,
                ));
            };
            Ok(Node::Spread {
                expr: Box::new(result),
                pos: token.pos,
            })
        }
        _ => Err(SyntaxError::new(
            format!("Invalid syntax at '{}'", token),
            token.pos,
        )),
    }
}

fn compound_fn_name(op: &str) -> &'static str {
    match op {
        "+=" => "add",
        "-=" => "sub",
        "*=" => "mul",
        "/=" => "div",
        _ => "mod",
    }
}

fn parse_comp_loop(lexer: &mut Lexer) -> Result<CompLoop, SyntaxError> {
    let identifier = lexer.match_identifier()?;
    lexer.expect("in", Keyword)?;
    let what = parse_iter_what(lexer);
    let expr = parse_or_expr(lexer)?;
    Ok(CompLoop {
        identifier,
        what,
        expr: Box::new(expr),
    })
}

fn parse_comprehension_tail(
    lexer: &mut Lexer,
    set: bool,
    value: Node,
    close: &str,
    pos: &SourcePos,
) -> Result<Node, SyntaxError> {
    let loop1 = parse_comp_loop(lexer)?;
    let loop2 = if lexer.match_if("for", Some(Keyword)) {
        Some((CompStyle::Product, parse_comp_loop(lexer)?))
    } else if lexer.match_if_seq(&[("also", Some(Keyword)), ("for", Some(Keyword))]) {
        Some((CompStyle::Parallel, parse_comp_loop(lexer)?))
    } else {
        None
    };
    let condition = if lexer.match_if("if", Some(Keyword)) {
        Some(Box::new(parse_or_expr(lexer)?))
    } else {
        None
    };
    lexer.expect(close, Interpunction)?;
    Ok(Node::Comprehension {
        set,
        value: Box::new(value),
        loop1,
        loop2,
        condition,
        pos: pos.clone(),
    })
}

fn parse_list_literal(lexer: &mut Lexer, pos: &SourcePos) -> Result<Node, SyntaxError> {
    if lexer.match_if("]", Some(Interpunction)) {
        return deref_or_invoke(
            lexer,
            Node::ListLiteral {
                items: Vec::new(),
                pos: pos.clone(),
            },
        );
    }
    let expr = parse_expression(lexer)?;
    if lexer.match_if("for", Some(Keyword)) {
        let comprehension = parse_comprehension_tail(lexer, false, expr, "]", pos)?;
        return deref_or_invoke(lexer, comprehension);
    }
    let mut items = Vec::new();
    let mut expr = Some(expr);
    while !lexer.peekn(1, "]", Some(Interpunction)) {
        match expr.take() {
            Some(e) => items.push(e),
            None => break,
        }
        if !lexer.peekn(1, "]", Some(Interpunction)) {
            lexer.expect(",", Interpunction)?;
            if !lexer.peekn(1, "]", Some(Interpunction)) {
                expr = Some(parse_expression(lexer)?);
            }
        }
    }
    if let Some(e) = expr.take() {
        items.push(e);
    }
    lexer.expect("]", Interpunction)?;
    deref_or_invoke(
        lexer,
        Node::ListLiteral {
            items,
            pos: pos.clone(),
        },
    )
}

fn parse_set_literal(lexer: &mut Lexer, pos: &SourcePos) -> Result<Node, SyntaxError> {
    if lexer.match_if(">>", Some(Interpunction)) {
        return deref_or_invoke(
            lexer,
            Node::SetLiteral {
                items: Vec::new(),
                pos: pos.clone(),
            },
        );
    }
    let expr = parse_expression(lexer)?;
    if lexer.match_if("for", Some(Keyword)) {
        let comprehension = parse_comprehension_tail(lexer, true, expr, ">>", pos)?;
        return deref_or_invoke(lexer, comprehension);
    }
    let mut items = vec![expr];
    if !lexer.peekn(1, ">>", Some(Interpunction)) {
        lexer.expect(",", Interpunction)?;
    }
    while !lexer.peekn(1, ">>", Some(Interpunction)) {
        items.push(parse_expression(lexer)?);
        if !lexer.peekn(1, ">>", Some(Interpunction)) {
            lexer.expect(",", Interpunction)?;
        }
    }
    lexer.expect(">>", Interpunction)?;
    deref_or_invoke(
        lexer,
        Node::SetLiteral {
            items,
            pos: pos.clone(),
        },
    )
}

fn implicit_string_key(key: Node) -> Node {
    match key {
        Node::Identifier { name, pos } => Node::Literal {
            value: Value::string(name),
            pos,
        },
        other => other,
    }
}

fn parse_map_literal(lexer: &mut Lexer, pos: &SourcePos) -> Result<Node, SyntaxError> {
    if lexer.match_if(">>>", Some(Interpunction)) {
        return deref_or_invoke(
            lexer,
            Node::MapLiteral {
                keys: Vec::new(),
                values: Vec::new(),
                pos: pos.clone(),
            },
        );
    }
    let key = parse_expression(lexer)?;
    lexer.expect("=>", Interpunction)?;
    let value = parse_expression(lexer)?;
    if lexer.match_if("for", Some(Keyword)) {
        let loop1 = parse_comp_loop(lexer)?;
        let condition = if lexer.match_if("if", Some(Keyword)) {
            Some(Box::new(parse_or_expr(lexer)?))
        } else {
            None
        };
        lexer.expect(">>>", Interpunction)?;
        let comprehension = Node::MapComprehension {
            key: Box::new(key),
            value: Box::new(value),
            loop1,
            condition,
            pos: pos.clone(),
        };
        return deref_or_invoke(lexer, comprehension);
    }
    let mut keys = vec![implicit_string_key(key)];
    let mut values = vec![value];
    if !lexer.peekn(1, ">>>", Some(Interpunction)) {
        lexer.expect(",", Interpunction)?;
    }
    while !lexer.peekn(1, ">>>", Some(Interpunction)) {
        let key = implicit_string_key(parse_expression(lexer)?);
        lexer.expect("=>", Interpunction)?;
        let value = parse_expression(lexer)?;
        keys.push(key);
        values.push(value);
        if !lexer.peekn(1, ">>>", Some(Interpunction)) {
            lexer.expect(",", Interpunction)?;
        }
    }
    lexer.expect(">>>", Interpunction)?;
    deref_or_invoke(
        lexer,
        Node::MapLiteral {
            keys,
            values,
            pos: pos.clone(),
        },
    )
}

fn parse_object_literal(lexer: &mut Lexer, pos: &SourcePos) -> Result<Node, SyntaxError> {
    let mut keys = Vec::new();
    let mut values = Vec::new();
    while !lexer.peekn(1, "*>", Some(Interpunction)) {
        let key = lexer.match_identifier()?;
        if lexer.peekn(1, "(", Some(Interpunction)) {
            let fn_pos = lexer.get_pos();
            let func = parse_fn(lexer, fn_pos)?;
            keys.push(key);
            values.push(func);
        } else {
            lexer.expect("=", Operator)?;
            keys.push(key);
            values.push(parse_expression(lexer)?);
        }
        if !lexer.peekn(1, "*>", Some(Interpunction)) {
            lexer.expect(",", Interpunction)?;
        }
    }
    lexer.expect("*>", Interpunction)?;
    deref_or_invoke(
        lexer,
        Node::ObjectLiteral {
            keys,
            values,
            pos: pos.clone(),
        },
    )
}

fn parse_fn(lexer: &mut Lexer, pos: SourcePos) -> Result<Node, SyntaxError> {
    let mut arg_names = Vec::new();
    let mut defaults = Vec::new();
    lexer.expect("(", Interpunction)?;
    while !lexer.match_if(")", Some(Interpunction)) {
        let token = lexer.next_token()?;
        if token.kind == Keyword {
            return Err(SyntaxError::new(
                format!("Cannot use keyword '{}' as parameter name", token),
                token.pos,
            ));
        }
        if token.kind != Identifier {
            return Err(SyntaxError::new(
                format!("Expected parameter name but got '{}'", token),
                token.pos,
            ));
        }
        let arg_name = token.value;
        let default = if lexer.match_if("=", Some(Operator)) {
            Some(parse_expression(lexer)?)
        } else {
            None
        };
        if arg_name.ends_with("...") && !lexer.peekn(1, ")", Some(Interpunction)) {
            return Err(SyntaxError::new(
                format!("Rest argument {} must be last argument", arg_name),
                token.pos,
            ));
        }
        arg_names.push(arg_name);
        defaults.push(default);
        if !lexer.peekn(1, ")", Some(Interpunction)) {
            lexer.expect(",", Interpunction)?;
        }
    }
    let body = if lexer.peekn(1, "do", Some(Keyword)) {
        parse_block(lexer)?
    } else {
        parse_expression(lexer)?
    };
    Ok(Node::Lambda {
        arg_names,
        defaults,
        body: Rc::new(unwrap_return(body)),
        pos,
    })
}

fn parse_call_args(
    lexer: &mut Lexer,
    names: &mut Vec<Option<String>>,
    args: &mut Vec<Node>,
) -> Result<(), SyntaxError> {
    while !lexer.peekn(1, ")", Some(Interpunction)) {
        if lexer.peek_kind(1, Identifier) && lexer.peekn(2, "=", Some(Operator)) {
            let name = lexer.match_identifier()?;
            lexer.expect("=", Operator)?;
            names.push(Some(name));
            args.push(parse_expression(lexer)?);
        } else {
            names.push(None);
            args.push(parse_expression(lexer)?);
        }
        if !lexer.peekn(1, ")", Some(Interpunction)) {
            lexer.expect(",", Interpunction)?;
        }
    }
    lexer.eat(1);
    Ok(())
}

fn invoke_suffix(lexer: &mut Lexer, node: Node) -> Result<Node, SyntaxError> {
    if !lexer.match_if("!>", Some(Operator)) {
        return Ok(node);
    }
    let func = if lexer.match_if_seq(&[("(", Some(Interpunction)), ("fn", Some(Keyword))]) {
        let fn_pos = lexer.get_pos();
        let func = parse_fn(lexer, fn_pos)?;
        lexer.expect(")", Interpunction)?;
        func
    } else {
        let mut func = Node::Identifier {
            name: lexer.match_identifier()?,
            pos: lexer.get_pos(),
        };
        while lexer.match_if("->", Some(Operator)) {
            let pos = lexer.get_pos();
            func = Node::Deref {
                expr: Box::new(func),
                index: Box::new(Node::Literal {
                    value: Value::string(lexer.match_identifier()?),
                    pos: pos.clone(),
                }),
                default: None,
                pos,
            };
        }
        func
    };
    let pos = lexer.get_pos();
    let mut names = vec![None];
    let mut args = vec![node];
    lexer.expect("(", Interpunction)?;
    parse_call_args(lexer, &mut names, &mut args)?;
    Ok(Node::Funcall {
        func: Box::new(func),
        names,
        args,
        pos,
    })
}

fn call_suffix(lexer: &mut Lexer, node: Node) -> Result<Node, SyntaxError> {
    if !lexer.match_if("(", Some(Interpunction)) {
        return Ok(node);
    }
    let pos = lexer.get_pos();
    let mut names = Vec::new();
    let mut args = Vec::new();
    parse_call_args(lexer, &mut names, &mut args)?;
    Ok(Node::Funcall {
        func: Box::new(node),
        names,
        args,
        pos,
    })
}

// Index/member access suffix; returns the new node and whether the chain is
// terminated (an assignment form consumes the rest of the expression).
fn deref_suffix(lexer: &mut Lexer, node: Node) -> Result<(Node, bool), SyntaxError> {
    if lexer.match_if("->", Some(Operator)) {
        let pos = lexer.get_pos();
        let identifier = lexer.match_identifier()?;
        let index = Node::Literal {
            value: Value::string(identifier.clone()),
            pos: pos.clone(),
        };
        if lexer.match_if("=", Some(Operator)) {
            let value = parse_expression(lexer)?;
            return Ok((
                Node::DerefAssign {
                    expr: Box::new(node),
                    index: Box::new(index),
                    value: Box::new(value),
                    pos,
                },
                true,
            ));
        }
        if lexer.match_if("(", Some(Interpunction)) {
            let mut names = Vec::new();
            let mut args = Vec::new();
            parse_call_args(lexer, &mut names, &mut args)?;
            return Ok((
                Node::DerefInvoke {
                    expr: Box::new(node),
                    member: identifier,
                    names,
                    args,
                    pos,
                },
                false,
            ));
        }
        for op in ["+=", "-=", "*=", "/=", "%="] {
            if lexer.match_if(op, Some(Operator)) {
                let value = parse_expression(lexer)?;
                let current = Node::Deref {
                    expr: Box::new(node.clone()),
                    index: Box::new(index.clone()),
                    default: None,
                    pos: pos.clone(),
                };
                return Ok((
                    Node::DerefAssign {
                        expr: Box::new(node),
                        index: Box::new(index),
                        value: Box::new(bin_call(compound_fn_name(op), current, value, &pos)),
                        pos,
                    },
                    true,
                ));
            }
        }
        return Ok((
            Node::Deref {
                expr: Box::new(node),
                index: Box::new(index),
                default: None,
                pos,
            },
            false,
        ));
    }

    if lexer.match_if("[", Some(Interpunction)) {
        let pos = lexer.get_pos();
        let index = parse_expression(lexer)?;
        let default = if lexer.match_if(",", Some(Interpunction)) {
            Some(parse_expression(lexer)?)
        } else {
            None
        };
        if lexer.match_if_seq(&[("]", Some(Interpunction)), ("=", Some(Operator))]) {
            let value = parse_expression(lexer)?;
            return Ok((
                Node::DerefAssign {
                    expr: Box::new(node),
                    index: Box::new(index),
                    value: Box::new(value),
                    pos,
                },
                true,
            ));
        }
        for op in ["+=", "-=", "*=", "/=", "%="] {
            if lexer.match_if_seq(&[("]", Some(Interpunction)), (op, Some(Operator))]) {
                let value = parse_expression(lexer)?;
                let current = Node::Deref {
                    expr: Box::new(node.clone()),
                    index: Box::new(index.clone()),
                    default: default.clone().map(Box::new),
                    pos: pos.clone(),
                };
                return Ok((
                    Node::DerefAssign {
                        expr: Box::new(node),
                        index: Box::new(index),
                        value: Box::new(bin_call(compound_fn_name(op), current, value, &pos)),
                        pos,
                    },
                    true,
                ));
            }
        }
        let result = Node::Deref {
            expr: Box::new(node),
            index: Box::new(index),
            default: default.map(Box::new),
            pos,
        };
        lexer.expect("]", Interpunction)?;
        return Ok((result, false));
    }

    Ok((node, false))
}

fn deref_or_call_or_invoke(lexer: &mut Lexer, mut node: Node) -> Result<Node, SyntaxError> {
    while lexer.peekn(1, "!>", Some(Operator))
        || lexer.peekn(1, "[", Some(Interpunction))
        || lexer.peekn(1, "(", Some(Interpunction))
        || lexer.peekn(1, "->", Some(Operator))
    {
        if lexer.peekn(1, "!>", Some(Operator)) {
            node = invoke_suffix(lexer, node)?;
        } else if lexer.peekn(1, "(", Some(Interpunction)) {
            node = call_suffix(lexer, node)?;
        } else {
            let (next, interrupt) = deref_suffix(lexer, node)?;
            node = next;
            if interrupt {
                break;
            }
        }
    }
    Ok(node)
}

fn deref_or_invoke(lexer: &mut Lexer, mut node: Node) -> Result<Node, SyntaxError> {
    while lexer.peekn(1, "!>", Some(Operator))
        || lexer.peekn(1, "[", Some(Interpunction))
        || lexer.peekn(1, "->", Some(Operator))
    {
        if lexer.peekn(1, "!>", Some(Operator)) {
            node = invoke_suffix(lexer, node)?;
        } else {
            let (next, interrupt) = deref_suffix(lexer, node)?;
            node = next;
            if interrupt {
                break;
            }
        }
    }
    Ok(node)
}

fn invoke_only(lexer: &mut Lexer, mut node: Node) -> Result<Node, SyntaxError> {
    while lexer.peekn(1, "!>", Some(Operator)) {
        node = invoke_suffix(lexer, node)?;
    }
    Ok(node)
}

fn func_call1(fn_name: &str, a: &str, expr_a: Node, pos: &SourcePos) -> Node {
    Node::Funcall {
        func: Box::new(Node::Identifier {
            name: fn_name.to_string(),
            pos: pos.clone(),
        }),
        names: vec![Some(a.to_string())],
        args: vec![expr_a],
        pos: pos.clone(),
    }
}

fn func_call2(
    fn_name: &str,
    a: &str,
    expr_a: Node,
    b: &str,
    expr_b: Node,
    pos: &SourcePos,
) -> Node {
    Node::Funcall {
        func: Box::new(Node::Identifier {
            name: fn_name.to_string(),
            pos: pos.clone(),
        }),
        names: vec![Some(a.to_string()), Some(b.to_string())],
        args: vec![expr_a, expr_b],
        pos: pos.clone(),
    }
}

#[allow(clippy::too_many_arguments)]
fn func_call3(
    fn_name: &str,
    a: &str,
    expr_a: Node,
    b: &str,
    expr_b: Node,
    c: &str,
    expr_c: Node,
    pos: &SourcePos,
) -> Node {
    Node::Funcall {
        func: Box::new(Node::Identifier {
            name: fn_name.to_string(),
            pos: pos.clone(),
        }),
        names: vec![
            Some(a.to_string()),
            Some(b.to_string()),
            Some(c.to_string()),
        ],
        args: vec![expr_a, expr_b, expr_c],
        pos: pos.clone(),
    }
}

fn bin_call(fn_name: &str, a: Node, b: Node, pos: &SourcePos) -> Node {
    func_call2(fn_name, "a", a, "b", b, pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(source: &str) -> String {
        parse_script(source, "-").expect("parse failed").to_string()
    }

    #[test]
    fn test_simple_identifier() {
        assert_eq!(parsed("eins"), "eins");
    }

    #[test]
    fn test_addition_desugars() {
        assert_eq!(parsed("2 + 3"), "(add 2, 3)");
    }

    #[test]
    fn test_if() {
        assert_eq!(
            parsed("if 1>2 then TRUE else FALSE"),
            "(if (greater 1, 2): TRUE else: FALSE)"
        );
    }

    #[test]
    fn test_if_defaults_to_true() {
        assert_eq!(
            parsed("if a == 1 then b in c or d == 9999"),
            "(if (equals a, 1): ((b in c) or (equals d, 9999)) else: TRUE)"
        );
    }

    #[test]
    fn test_in() {
        assert_eq!(
            parsed("feld1 in ['a', 'bb', 'ccc']"),
            "(feld1 in ['a', 'bb', 'ccc'])"
        );
        assert_eq!(parsed("feld1 in <<'a', 'bb'>>"), "(feld1 in <<'a', 'bb'>>)");
    }

    #[test]
    fn test_is_zero_predicate() {
        assert_eq!(parsed("1 is zero"), "(is_zero 1)");
    }

    #[test]
    fn test_relop_chains() {
        assert_eq!(parsed("a < b"), "(less a, b)");
        assert_eq!(parsed("a < b < c"), "((less a, b) and (less b, c))");
        assert_eq!(
            parsed("a <= b < c == d"),
            "((less_equals a, b) and (less b, c) and (equals c, d))"
        );
    }

    #[test]
    fn test_literal_collections() {
        assert_eq!(
            parsed("<<<'a' => 1, 'bb' => -1>>>"),
            "<<<'a' => 1, 'bb' => -1>>>"
        );
        assert_eq!(parsed("<<1, 2, 2, 3>>"), "<<1, 2, 2, 3>>");
        assert_eq!(parsed("[1, 2, 3] + 4"), "(add [1, 2, 3], 4)");
    }

    #[test]
    fn test_funcall() {
        assert_eq!(parsed("non_zero('12', '3')"), "(non_zero '12', '3')");
    }

    #[test]
    fn test_lambda() {
        assert_eq!(
            parsed("fn(a, b=3) string(a) * b(2, 3)"),
            "(lambda a, b=3, (mul (string a), (b 2, 3)))"
        );
    }

    #[test]
    fn test_while() {
        assert_eq!(
            parsed("while x > 0 do x = x - 1; end"),
            "(while (greater x, 0) do (x = (sub x, 1)))"
        );
    }

    #[test]
    fn test_spread() {
        assert_eq!(parsed("f(a, ...b, c)"), "(f a, ...b, c)");
        assert_eq!(parsed("f(a, ...[1, 2], c)"), "(f a, ...[1, 2], c)");
    }

    #[test]
    fn test_destructuring() {
        assert_eq!(parsed("def [a, b] = [1, 2]"), "(def [a,b] = [1, 2])");
        assert_eq!(parsed("[a, b] = [1, 2]"), "([a,b] = [1, 2])");
    }

    #[test]
    fn test_pipeline() {
        assert_eq!(
            parsed("0 !> sprintf(fmt=\"part2: {0}\") !> println()"),
            "(println (sprintf 0, 'part2: {0}'))"
        );
    }

    #[test]
    fn test_return_unwrapping() {
        assert_eq!(parsed("return x + 1"), "(add x, 1)");
        assert_eq!(parsed("do return x + 1; end"), "(add x, 1)");
        assert_eq!(
            parsed("def x = 1; return x + 1;"),
            "(block (def x = 1), (add x, 1))"
        );
        assert_eq!(
            parsed("return x + 1; def x = 1"),
            "(block (return (add x, 1)), (def x = 1))"
        );
        assert_eq!(
            parsed("def fun(x) return x + 1"),
            "(def fun = (lambda x, (add x, 1)))"
        );
        assert_eq!(
            parsed("def fun(x) do x = x * 2; return x + 1; end"),
            "(def fun = (lambda x, (block (x = (mul x, 2)), (add x, 1))))"
        );
        assert_eq!(
            parsed("def fun(x) do return x + 1; x = x * 2; end"),
            "(def fun = (lambda x, (block (return (add x, 1)), (x = (mul x, 2)))))"
        );
    }

    #[test]
    fn test_errors() {
        assert!(parse_script("1 + 1 1", "-").is_err());
        assert!(parse_script("1 + ", "-").is_err());
        assert!(parse_script("if 1 < 2 else FALSE", "-").is_err());
        assert!(parse_script("2 * (3 + 4( - 3", "-").is_err());
    }

    #[test]
    fn test_keyword_cannot_be_defined() {
        assert!(parse_script("def if = 1", "-").is_err());
        assert!(parse_script("fn(while) 1", "-").is_err());
    }

    #[test]
    fn test_system_variables_are_read_only() {
        assert!(parse_script("checkerlang_secure_mode = TRUE", "-").is_err());
        assert!(parse_script("[checkerlang_secure_mode] = [1]", "-").is_err());
    }

    #[test]
    fn test_rest_arg_must_be_last() {
        assert!(parse_script("fn(a..., b) 1", "-").is_err());
        assert!(parse_script("fn(a, b...) 1", "-").is_ok());
    }

    #[test]
    fn test_is_falls_back_to_equality() {
        assert_eq!(parsed("a is b"), "(equals a, b)");
        assert_eq!(parsed("a is not b"), "(not_equals a, b)");
    }

    #[test]
    fn test_predicate_suffixes() {
        assert_eq!(parsed("x is string"), "(equals (type x), 'string')");
        assert_eq!(parsed("'abc' starts with 'ab'"), "(starts_with 'abc', 'ab')");
        assert_eq!(
            parsed("'abc' starts not with 'ab'"),
            "(not (starts_with 'abc', 'ab'))"
        );
        assert_eq!(
            parsed("x is numerical exact_len 4"),
            "(is_numerical (string x), 4, 4)"
        );
        assert_eq!(
            parsed("x is date with hour"),
            "(is_valid_date (string x), 'yyyyMMddHH')"
        );
        assert_eq!(parsed("x is not zero"), "(not (is_zero x))");
    }

    #[test]
    fn test_comprehension_forms() {
        assert_eq!(
            parsed("[x * 2 for x in range(5)]"),
            "[(mul x, 2) for x in (range 5)]"
        );
        assert_eq!(
            parsed("[a * b for a in x also for b in y]"),
            "[(mul a, b) for a in x also for b in y]"
        );
        assert_eq!(
            parsed("[a * b for a in x for b in y]"),
            "[(mul a, b) for a in x for b in y]"
        );
        assert_eq!(
            parsed("<<x for x in keys m>>"),
            "<<x for x in keys m>>"
        );
        assert_eq!(
            parsed("<<<a => 2 * a for a in lst>>>"),
            "<<<a => (mul 2, a) for a in lst>>>"
        );
    }

    #[test]
    fn test_object_literal_method_shorthand() {
        assert_eq!(
            parsed("<*a = 1, f(x) 2 * x*>"),
            "<*a=1, f=(lambda x, (mul x, 2))*>"
        );
    }
}
