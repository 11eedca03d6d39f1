use crate::JSError;
use crate::core::number::number_to_string;
use crate::core::{
    BinaryOp, CompareOp, Expr, ForInTarget, ForInit, FunctionNode, LogicalOp, Program, PropertyAssignment, Statement, StatementKind,
    SwitchClause, Token, TokenKind, TokenStream, UnaryOp, UpdateOp, collect_declarations, keyword_text, next_node_id, parse_identifier, parse_number,
    parse_string,
};
use crate::unicode::utf16_to_utf8;
use std::collections::HashMap;
use std::rc::Rc;

/// First syntax error found in a source text. Parsing stops there.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub filename: Option<String>,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ParseError> for JSError {
    fn from(e: ParseError) -> Self {
        JSError::SyntaxError { message: e.message }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Lowest binary precedence, used to start precedence climbing.
const MIN_BINARY_PRECEDENCE: u8 = 4;

#[derive(Clone, Copy)]
enum BinaryToken {
    Logical(LogicalOp),
    Arith(BinaryOp),
    Compare(CompareOp),
}

fn binary_precedence(kind: TokenKind, accept_in: bool) -> Option<(u8, BinaryToken)> {
    use BinaryToken::*;
    let entry = match kind {
        TokenKind::Or => (4, Logical(LogicalOp::Or)),
        TokenKind::And => (5, Logical(LogicalOp::And)),
        TokenKind::BitOr => (6, Arith(BinaryOp::BitOr)),
        TokenKind::BitXor => (7, Arith(BinaryOp::BitXor)),
        TokenKind::BitAnd => (8, Arith(BinaryOp::BitAnd)),
        TokenKind::Eq => (9, Compare(CompareOp::Eq)),
        TokenKind::Ne => (9, Compare(CompareOp::Ne)),
        TokenKind::StrictEq => (9, Compare(CompareOp::StrictEq)),
        TokenKind::StrictNe => (9, Compare(CompareOp::StrictNe)),
        TokenKind::Lt => (10, Compare(CompareOp::Lt)),
        TokenKind::Gt => (10, Compare(CompareOp::Gt)),
        TokenKind::Le => (10, Compare(CompareOp::Le)),
        TokenKind::Ge => (10, Compare(CompareOp::Ge)),
        TokenKind::InstanceOf => (10, Compare(CompareOp::InstanceOf)),
        TokenKind::In if accept_in => (10, Compare(CompareOp::In)),
        TokenKind::Shl => (11, Arith(BinaryOp::Shl)),
        TokenKind::Sar => (11, Arith(BinaryOp::Sar)),
        TokenKind::Shr => (11, Arith(BinaryOp::Shr)),
        TokenKind::Plus => (12, Arith(BinaryOp::Add)),
        TokenKind::Minus => (12, Arith(BinaryOp::Sub)),
        TokenKind::Star => (13, Arith(BinaryOp::Mul)),
        TokenKind::Div => (13, Arith(BinaryOp::Div)),
        TokenKind::Percent => (13, Arith(BinaryOp::Mod)),
        _ => return None,
    };
    Some(entry)
}

fn compound_assignment_op(kind: TokenKind) -> Option<BinaryOp> {
    Some(match kind {
        TokenKind::AddAssign => BinaryOp::Add,
        TokenKind::SubAssign => BinaryOp::Sub,
        TokenKind::MulAssign => BinaryOp::Mul,
        TokenKind::DivAssign => BinaryOp::Div,
        TokenKind::ModAssign => BinaryOp::Mod,
        TokenKind::ShlAssign => BinaryOp::Shl,
        TokenKind::SarAssign => BinaryOp::Sar,
        TokenKind::ShrAssign => BinaryOp::Shr,
        TokenKind::AndAssign => BinaryOp::BitAnd,
        TokenKind::OrAssign => BinaryOp::BitOr,
        TokenKind::XorAssign => BinaryOp::BitXor,
        _ => return None,
    })
}

fn is_restricted_name(name: &str) -> bool {
    name == "eval" || name == "arguments"
}

#[derive(Default, Clone, Copy)]
struct PropertyKinds {
    data: bool,
    getter: bool,
    setter: bool,
}

/// Per function parsing state, saved and reset when entering a function body.
#[derive(Default)]
struct FunctionState {
    in_function: bool,
    labels: Vec<(String, bool)>, // label, labels an iteration statement
    fresh_labels: usize,
    iteration_depth: usize,
    breakable_depth: usize,
}

pub struct Parser {
    tokens: TokenStream,
    strict: bool,
    state: FunctionState,
}

impl Parser {
    pub fn new(source: &str, filename: Option<&str>) -> Self {
        Parser {
            tokens: TokenStream::new(source, filename),
            strict: false,
            state: FunctionState::default(),
        }
    }

    fn error_at(&self, tok: &Token, message: impl AsRef<str>) -> ParseError {
        let filename = tok.locator.filename.as_deref().map(str::to_string);
        let place = match &filename {
            Some(name) => format!("in {name} on line {}, column {}", tok.line(), tok.column()),
            None => format!("on line {}, column {}", tok.line(), tok.column()),
        };
        ParseError {
            message: format!("{} {place}.", message.as_ref()),
            filename,
            line: tok.line(),
            column: tok.column(),
        }
    }

    fn unexpected(&self, tok: &Token) -> ParseError {
        match tok.kind {
            TokenKind::Eof => self.error_at(tok, "Unexpected end of input"),
            TokenKind::Invalid => self.error_at(tok, format!("Invalid or unexpected token '{}'", tok.lexeme)),
            _ => self.error_at(tok, format!("Unexpected token '{tok}'")),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        let tok = self.tokens.next();
        if tok.kind != kind {
            return Err(self.unexpected(&tok));
        }
        Ok(tok)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.tokens.peek() == kind {
            self.tokens.next();
            true
        } else {
            false
        }
    }

    /// Statement terminator with automatic semicolon insertion.
    fn consume_semicolon(&mut self) -> ParseResult<()> {
        match self.tokens.peek() {
            TokenKind::Semicolon => {
                self.tokens.next();
                Ok(())
            }
            TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ if self.tokens.has_line_terminator_before_next() => Ok(()),
            _ => {
                let tok = self.tokens.next();
                Err(self.unexpected(&tok))
            }
        }
    }

    fn identifier_name(&self, tok: &Token) -> ParseResult<String> {
        if tok.escaped {
            parse_identifier(&tok.lexeme).map_err(|m| self.error_at(tok, m))
        } else {
            Ok(tok.lexeme.clone())
        }
    }

    /// An Identifier usable as a binding or reference name.
    fn binding_identifier(&mut self) -> ParseResult<String> {
        let tok = self.tokens.next();
        if tok.kind != TokenKind::Identifier {
            if tok.kind == TokenKind::Reserved {
                return Err(self.error_at(&tok, format!("Unexpected reserved word '{}'", tok.lexeme)));
            }
            return Err(self.unexpected(&tok));
        }
        self.identifier_name(&tok)
    }

    fn check_strict_binding(&self, tok: &Token, name: &str) -> ParseResult<()> {
        if self.strict && is_restricted_name(name) {
            return Err(self.error_at(tok, format!("Unexpected eval or arguments in strict mode ('{name}')")));
        }
        Ok(())
    }

    fn check_assignment_target(&self, tok: &Token, target: &Expr) -> ParseResult<()> {
        if !target.is_reference_target() {
            return Err(self.error_at(tok, "Invalid left-hand side in assignment"));
        }
        if let Expr::Name(name) = target {
            self.check_strict_binding(tok, name)?;
        }
        Ok(())
    }

    // ---- programs and function bodies ----

    pub fn parse_program(mut self, strict: bool) -> ParseResult<Program> {
        self.strict = strict;
        let body = self.parse_source_elements(TokenKind::Eof)?;
        self.expect(TokenKind::Eof)?;
        let program = Program {
            id: next_node_id(),
            body,
            strict: self.strict,
        };
        log::trace!("parsed program {} ({} statements, strict: {})", program.id, program.body.len(), program.strict);
        Ok(program)
    }

    /// Source elements up to `end`, handling the directive prologue.
    fn parse_source_elements(&mut self, end: TokenKind) -> ParseResult<Vec<Statement>> {
        let mut body = Vec::new();
        let mut in_prologue = true;
        let mut octal_in_prologue: Option<Token> = None;
        while self.tokens.peek() != end && self.tokens.peek() != TokenKind::Eof {
            if in_prologue {
                if self.tokens.peek() != TokenKind::String {
                    in_prologue = false;
                } else {
                    let tok = self.tokens.peek_token().clone();
                    let stmt = self.parse_source_element()?;
                    if !matches!(&stmt.kind, StatementKind::Expr(Expr::String(_))) {
                        in_prologue = false;
                    } else if tok.lexeme == "\"use strict\"" || tok.lexeme == "'use strict'" {
                        if let Some(octal) = &octal_in_prologue {
                            return Err(self.error_at(octal, "Octal escape sequences are not allowed in strict mode"));
                        }
                        self.strict = true;
                    } else if parse_string(&tok.lexeme, false).is_err() {
                        octal_in_prologue = Some(tok);
                    }
                    body.push(stmt);
                    continue;
                }
            }
            body.push(self.parse_source_element()?);
        }
        Ok(body)
    }

    fn parse_source_element(&mut self) -> ParseResult<Statement> {
        if self.tokens.peek() == TokenKind::Function {
            let tok = self.tokens.peek_token().clone();
            let func = self.parse_function(true)?;
            return Ok(Statement {
                kind: StatementKind::FunctionDeclaration(func),
                line: tok.line(),
                column: tok.column(),
            });
        }
        self.parse_statement()
    }

    /// `function name? (params) { body }` starting at the `function` keyword.
    fn parse_function(&mut self, declaration: bool) -> ParseResult<Rc<FunctionNode>> {
        let start = self.expect(TokenKind::Function)?;
        let name = if declaration || self.tokens.peek() == TokenKind::Identifier || self.tokens.peek() == TokenKind::Reserved {
            let tok = self.tokens.peek_token().clone();
            let name = self.binding_identifier()?;
            Some((tok, name))
        } else {
            None
        };
        self.parse_function_rest(&start, name)
    }

    /// Parameters and body shared by declarations, expressions and accessors.
    fn parse_function_rest(&mut self, start: &Token, name: Option<(Token, String)>) -> ParseResult<Rc<FunctionNode>> {
        self.expect(TokenKind::LParen)?;
        let mut params: Vec<(Token, String)> = Vec::new();
        if self.tokens.peek() != TokenKind::RParen {
            loop {
                let tok = self.tokens.peek_token().clone();
                let param = self.binding_identifier()?;
                params.push((tok, param));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::LBrace)?;

        let outer_strict = self.strict;
        let outer_state = std::mem::replace(
            &mut self.state,
            FunctionState {
                in_function: true,
                ..FunctionState::default()
            },
        );
        let body = self.parse_source_elements(TokenKind::RBrace);
        let strict = self.strict;
        self.state = outer_state;
        self.strict = outer_strict;
        let body = body?;
        let close = self.expect(TokenKind::RBrace)?;

        if strict {
            if let Some((tok, n)) = &name
                && is_restricted_name(n)
            {
                return Err(self.error_at(tok, format!("Unexpected eval or arguments in strict mode ('{n}')")));
            }
            for (i, (tok, p)) in params.iter().enumerate() {
                if is_restricted_name(p) {
                    return Err(self.error_at(tok, format!("Unexpected eval or arguments in strict mode ('{p}')")));
                }
                if params[..i].iter().any(|(_, q)| q == p) {
                    return Err(self.error_at(tok, "Duplicate parameter name not allowed in this context"));
                }
            }
        }

        let source = self.tokens.source_slice(start.locator.offset, close.locator.offset + 1);
        let scope = Rc::new(collect_declarations(&body));
        Ok(Rc::new(FunctionNode {
            id: next_node_id(),
            name: name.map(|(_, n)| n),
            params: params.into_iter().map(|(_, p)| p).collect(),
            body,
            scope,
            strict,
            source,
            line: start.line(),
            column: start.column(),
        }))
    }

    // ---- statements ----

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        let fresh_labels = std::mem::take(&mut self.state.fresh_labels);
        let tok = self.tokens.peek_token().clone();
        let kind = match tok.kind {
            TokenKind::LBrace => StatementKind::Block(self.parse_block()?),
            TokenKind::Var => {
                self.tokens.next();
                let decls = self.parse_var_declarations(true)?;
                self.consume_semicolon()?;
                StatementKind::Var(decls)
            }
            TokenKind::Semicolon => {
                self.tokens.next();
                StatementKind::Empty
            }
            TokenKind::If => self.parse_if()?,
            TokenKind::Do | TokenKind::While | TokenKind::For => {
                let n = self.state.labels.len();
                for label in &mut self.state.labels[n - fresh_labels..] {
                    label.1 = true;
                }
                self.state.iteration_depth += 1;
                self.state.breakable_depth += 1;
                let result = match tok.kind {
                    TokenKind::Do => self.parse_do_while(),
                    TokenKind::While => self.parse_while(),
                    _ => self.parse_for(),
                };
                self.state.iteration_depth -= 1;
                self.state.breakable_depth -= 1;
                result?
            }
            TokenKind::Continue => self.parse_continue()?,
            TokenKind::Break => self.parse_break()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::With => self.parse_with()?,
            TokenKind::Switch => self.parse_switch()?,
            TokenKind::Throw => self.parse_throw()?,
            TokenKind::Try => self.parse_try()?,
            TokenKind::Debugger => {
                self.tokens.next();
                self.consume_semicolon()?;
                StatementKind::Debugger
            }
            TokenKind::Function => {
                if self.strict {
                    return Err(self.error_at(
                        &tok,
                        "In strict mode code, functions can only be declared at top level or immediately within another function",
                    ));
                }
                StatementKind::FunctionDeclaration(self.parse_function(true)?)
            }
            _ => {
                let expr = self.parse_expression(true)?;
                if let Expr::Name(label) = &expr
                    && tok.kind == TokenKind::Identifier
                    && self.tokens.peek() == TokenKind::Colon
                {
                    self.tokens.next();
                    if self.state.labels.iter().any(|(l, _)| l == label) {
                        return Err(self.error_at(&tok, format!("Label '{label}' has already been declared")));
                    }
                    self.state.labels.push((label.clone(), false));
                    self.state.fresh_labels = fresh_labels + 1;
                    let body = self.parse_statement();
                    self.state.labels.pop();
                    StatementKind::Labelled(label.clone(), Box::new(body?))
                } else {
                    self.consume_semicolon()?;
                    StatementKind::Expr(expr)
                }
            }
        };
        Ok(Statement {
            kind,
            line: tok.line(),
            column: tok.column(),
        })
    }

    fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        self.expect(TokenKind::LBrace)?;
        let mut body = Vec::new();
        while self.tokens.peek() != TokenKind::RBrace {
            if self.tokens.peek() == TokenKind::Eof {
                let tok = self.tokens.next();
                return Err(self.unexpected(&tok));
            }
            body.push(self.parse_statement()?);
        }
        self.tokens.next();
        Ok(body)
    }

    fn parse_var_declarations(&mut self, accept_in: bool) -> ParseResult<Vec<(String, Option<Expr>)>> {
        let mut decls = Vec::new();
        loop {
            let tok = self.tokens.peek_token().clone();
            let name = self.binding_identifier()?;
            self.check_strict_binding(&tok, &name)?;
            let init = if self.eat(TokenKind::Assign) {
                Some(self.parse_assignment(accept_in)?)
            } else {
                None
            };
            decls.push((name, init));
            if !self.eat(TokenKind::Comma) {
                return Ok(decls);
            }
        }
    }

    fn parse_paren_expression(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let expr = self.parse_expression(true)?;
        self.expect(TokenKind::RParen)?;
        Ok(expr)
    }

    fn parse_if(&mut self) -> ParseResult<StatementKind> {
        self.tokens.next();
        let test = self.parse_paren_expression()?;
        let then = self.parse_statement()?;
        let otherwise = if self.eat(TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StatementKind::If(test, Box::new(then), otherwise))
    }

    fn parse_do_while(&mut self) -> ParseResult<StatementKind> {
        self.tokens.next();
        let body = self.parse_statement()?;
        self.expect(TokenKind::While)?;
        let test = self.parse_paren_expression()?;
        self.consume_semicolon()?;
        Ok(StatementKind::DoWhile(Box::new(body), test))
    }

    fn parse_while(&mut self) -> ParseResult<StatementKind> {
        self.tokens.next();
        let test = self.parse_paren_expression()?;
        let body = self.parse_statement()?;
        Ok(StatementKind::While(test, Box::new(body)))
    }

    fn parse_for(&mut self) -> ParseResult<StatementKind> {
        self.tokens.next();
        self.expect(TokenKind::LParen)?;
        let init = match self.tokens.peek() {
            TokenKind::Semicolon => None,
            TokenKind::Var => {
                self.tokens.next();
                let mut decls = self.parse_var_declarations(false)?;
                if decls.len() == 1 && self.eat(TokenKind::In) {
                    let (name, init) = decls.remove(0);
                    return self.parse_for_in_rest(ForInTarget::Var(name, init));
                }
                Some(ForInit::Var(decls))
            }
            _ => {
                let tok = self.tokens.peek_token().clone();
                let expr = self.parse_expression(false)?;
                if self.tokens.peek() == TokenKind::In {
                    self.tokens.next();
                    if !expr.is_reference_target() {
                        return Err(self.error_at(&tok, "Invalid left-hand side in for-in"));
                    }
                    self.check_assignment_target(&tok, &expr)?;
                    return self.parse_for_in_rest(ForInTarget::Expr(expr));
                }
                Some(ForInit::Expr(expr))
            }
        };
        self.expect(TokenKind::Semicolon)?;
        let test = if self.tokens.peek() == TokenKind::Semicolon {
            None
        } else {
            Some(self.parse_expression(true)?)
        };
        self.expect(TokenKind::Semicolon)?;
        let update = if self.tokens.peek() == TokenKind::RParen {
            None
        } else {
            Some(self.parse_expression(true)?)
        };
        self.expect(TokenKind::RParen)?;
        let body = self.parse_statement()?;
        Ok(StatementKind::For(init, test, update, Box::new(body)))
    }

    fn parse_for_in_rest(&mut self, target: ForInTarget) -> ParseResult<StatementKind> {
        let object = self.parse_expression(true)?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_statement()?;
        Ok(StatementKind::ForIn(target, object, Box::new(body)))
    }

    fn parse_jump_label(&mut self) -> ParseResult<Option<(Token, String)>> {
        if self.tokens.peek() == TokenKind::Identifier && !self.tokens.has_line_terminator_before_next() {
            let tok = self.tokens.peek_token().clone();
            let name = self.binding_identifier()?;
            return Ok(Some((tok, name)));
        }
        Ok(None)
    }

    fn parse_continue(&mut self) -> ParseResult<StatementKind> {
        let kw = self.tokens.next();
        let label = self.parse_jump_label()?;
        match &label {
            Some((tok, name)) => {
                if !self.state.labels.iter().any(|(l, is_loop)| l == name && *is_loop) {
                    return Err(self.error_at(tok, format!("Undefined label '{name}'")));
                }
            }
            None if self.state.iteration_depth == 0 => {
                return Err(self.error_at(&kw, "Illegal continue statement"));
            }
            None => {}
        }
        self.consume_semicolon()?;
        Ok(StatementKind::Continue(label.map(|(_, n)| n)))
    }

    fn parse_break(&mut self) -> ParseResult<StatementKind> {
        let kw = self.tokens.next();
        let label = self.parse_jump_label()?;
        match &label {
            Some((tok, name)) => {
                if !self.state.labels.iter().any(|(l, _)| l == name) {
                    return Err(self.error_at(tok, format!("Undefined label '{name}'")));
                }
            }
            None if self.state.breakable_depth == 0 => {
                return Err(self.error_at(&kw, "Illegal break statement"));
            }
            None => {}
        }
        self.consume_semicolon()?;
        Ok(StatementKind::Break(label.map(|(_, n)| n)))
    }

    fn parse_return(&mut self) -> ParseResult<StatementKind> {
        let kw = self.tokens.next();
        if !self.state.in_function {
            return Err(self.error_at(&kw, "Illegal return statement"));
        }
        let value = match self.tokens.peek() {
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => None,
            _ if self.tokens.has_line_terminator_before_next() => None,
            _ => Some(self.parse_expression(true)?),
        };
        self.consume_semicolon()?;
        Ok(StatementKind::Return(value))
    }

    fn parse_with(&mut self) -> ParseResult<StatementKind> {
        let kw = self.tokens.next();
        if self.strict {
            return Err(self.error_at(&kw, "Strict mode code may not include a with statement"));
        }
        let object = self.parse_paren_expression()?;
        let body = self.parse_statement()?;
        Ok(StatementKind::With(object, Box::new(body)))
    }

    fn parse_switch(&mut self) -> ParseResult<StatementKind> {
        self.tokens.next();
        let discriminant = self.parse_paren_expression()?;
        self.expect(TokenKind::LBrace)?;
        self.state.breakable_depth += 1;
        let clauses = self.parse_switch_clauses();
        self.state.breakable_depth -= 1;
        Ok(StatementKind::Switch(discriminant, clauses?))
    }

    fn parse_switch_clauses(&mut self) -> ParseResult<Vec<SwitchClause>> {
        let mut clauses = Vec::new();
        let mut seen_default = false;
        loop {
            let tok = self.tokens.next();
            let test = match tok.kind {
                TokenKind::RBrace => return Ok(clauses),
                TokenKind::Case => Some(self.parse_expression(true)?),
                TokenKind::Default => {
                    if seen_default {
                        return Err(self.error_at(&tok, "More than one default clause in switch statement"));
                    }
                    seen_default = true;
                    None
                }
                _ => return Err(self.unexpected(&tok)),
            };
            self.expect(TokenKind::Colon)?;
            let mut body = Vec::new();
            while !matches!(self.tokens.peek(), TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof) {
                body.push(self.parse_statement()?);
            }
            clauses.push(SwitchClause { test, body });
        }
    }

    fn parse_throw(&mut self) -> ParseResult<StatementKind> {
        let kw = self.tokens.next();
        if self.tokens.has_line_terminator_before_next() {
            return Err(self.error_at(&kw, "Illegal newline after throw"));
        }
        let value = self.parse_expression(true)?;
        self.consume_semicolon()?;
        Ok(StatementKind::Throw(value))
    }

    fn parse_try(&mut self) -> ParseResult<StatementKind> {
        let kw = self.tokens.next();
        let block = self.parse_block()?;
        let handler = if self.eat(TokenKind::Catch) {
            self.expect(TokenKind::LParen)?;
            let tok = self.tokens.peek_token().clone();
            let name = self.binding_identifier()?;
            self.check_strict_binding(&tok, &name)?;
            self.expect(TokenKind::RParen)?;
            Some((name, self.parse_block()?))
        } else {
            None
        };
        let finalizer = if self.eat(TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error_at(&kw, "Missing catch or finally after try"));
        }
        Ok(StatementKind::Try(block, handler, finalizer))
    }

    // ---- expressions ----

    /// Expression, possibly a comma sequence. `accept_in` is false inside a `for(` initializer.
    pub fn parse_expression(&mut self, accept_in: bool) -> ParseResult<Expr> {
        let first = self.parse_assignment(accept_in)?;
        if self.tokens.peek() != TokenKind::Comma {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.eat(TokenKind::Comma) {
            exprs.push(self.parse_assignment(accept_in)?);
        }
        Ok(Expr::Comma(exprs))
    }

    fn parse_assignment(&mut self, accept_in: bool) -> ParseResult<Expr> {
        let tok = self.tokens.peek_token().clone();
        let target = self.parse_conditional(accept_in)?;
        let kind = self.tokens.peek();
        if !kind.is_assignment() {
            return Ok(target);
        }
        self.check_assignment_target(&tok, &target)?;
        self.tokens.next();
        let value = self.parse_assignment(accept_in)?;
        Ok(Expr::Assign(compound_assignment_op(kind), Box::new(target), Box::new(value)))
    }

    fn parse_conditional(&mut self, accept_in: bool) -> ParseResult<Expr> {
        let test = self.parse_binary(MIN_BINARY_PRECEDENCE, accept_in)?;
        if !self.eat(TokenKind::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment(true)?;
        self.expect(TokenKind::Colon)?;
        let alternate = self.parse_assignment(accept_in)?;
        Ok(Expr::Conditional(Box::new(test), Box::new(consequent), Box::new(alternate)))
    }

    fn parse_binary(&mut self, min_precedence: u8, accept_in: bool) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        while let Some((precedence, op)) = binary_precedence(self.tokens.peek(), accept_in) {
            if precedence < min_precedence {
                break;
            }
            self.tokens.next();
            let right = Box::new(self.parse_binary(precedence + 1, accept_in)?);
            let l = Box::new(left);
            left = match op {
                BinaryToken::Logical(op) => Expr::Logical(op, l, right),
                BinaryToken::Arith(op) => Expr::Binary(op, l, right),
                BinaryToken::Compare(op) => Expr::Compare(op, l, right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let tok = self.tokens.peek_token().clone();
        let op = match tok.kind {
            TokenKind::Delete => UnaryOp::Delete,
            TokenKind::Void => UnaryOp::Void,
            TokenKind::TypeOf => UnaryOp::TypeOf,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Minus,
            TokenKind::BitNot => UnaryOp::BitNot,
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Increment | TokenKind::Decrement => {
                self.tokens.next();
                let operand_tok = self.tokens.peek_token().clone();
                let operand = self.parse_unary()?;
                self.check_assignment_target(&operand_tok, &operand)?;
                let op = if tok.kind == TokenKind::Increment {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                return Ok(Expr::PrefixCount(op, Box::new(operand)));
            }
            _ => return self.parse_postfix(),
        };
        self.tokens.next();
        let operand = self.parse_unary()?;
        if op == UnaryOp::Delete && self.strict && matches!(operand, Expr::Name(_)) {
            return Err(self.error_at(&tok, "Delete of an unqualified identifier in strict mode"));
        }
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let tok = self.tokens.peek_token().clone();
        let expr = self.parse_left_hand_side()?;
        let op = match self.tokens.peek() {
            TokenKind::Increment => UpdateOp::Increment,
            TokenKind::Decrement => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        if self.tokens.has_line_terminator_before_next() {
            return Ok(expr);
        }
        self.check_assignment_target(&tok, &expr)?;
        self.tokens.next();
        Ok(Expr::PostfixCount(op, Box::new(expr)))
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if self.eat(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_assignment(true)?);
            if self.eat(TokenKind::RParen) {
                return Ok(args);
            }
            self.expect(TokenKind::Comma)?;
        }
    }

    /// IdentifierName after a `.`: identifiers, keywords and reserved words.
    fn parse_property_name_after_dot(&mut self) -> ParseResult<String> {
        let tok = self.tokens.next();
        match tok.kind {
            TokenKind::Identifier => self.identifier_name(&tok),
            TokenKind::Reserved => Ok(tok.lexeme.clone()),
            kind if kind.is_keyword() => Ok(tok.lexeme.clone()),
            _ => Err(self.unexpected(&tok)),
        }
    }

    /// MemberExpression, including `new` with arguments.
    fn parse_member(&mut self) -> ParseResult<Expr> {
        let mut expr = if self.eat(TokenKind::New) {
            let callee = self.parse_member()?;
            if self.tokens.peek() == TokenKind::LParen {
                let args = self.parse_arguments()?;
                Expr::New(Box::new(callee), args)
            } else {
                return Ok(Expr::New(Box::new(callee), Vec::new()));
            }
        } else {
            self.parse_primary()?
        };
        loop {
            match self.tokens.peek() {
                TokenKind::Dot => {
                    self.tokens.next();
                    let name = self.parse_property_name_after_dot()?;
                    expr = Expr::Dot(Box::new(expr), name);
                }
                TokenKind::LBracket => {
                    self.tokens.next();
                    let key = self.parse_expression(true)?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Bracket(Box::new(expr), Box::new(key));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_left_hand_side(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_member()?;
        loop {
            match self.tokens.peek() {
                TokenKind::LParen => {
                    let args = self.parse_arguments()?;
                    expr = Expr::Call(Box::new(expr), args);
                }
                TokenKind::Dot => {
                    self.tokens.next();
                    let name = self.parse_property_name_after_dot()?;
                    expr = Expr::Dot(Box::new(expr), name);
                }
                TokenKind::LBracket => {
                    self.tokens.next();
                    let key = self.parse_expression(true)?;
                    self.expect(TokenKind::RBracket)?;
                    expr = Expr::Bracket(Box::new(expr), Box::new(key));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let kind = self.tokens.peek();
        match kind {
            TokenKind::Function => return Ok(Expr::Function(self.parse_function(false)?)),
            TokenKind::LBracket => return self.parse_array_literal(),
            TokenKind::LBrace => return self.parse_object_literal(),
            TokenKind::LParen => return self.parse_paren_expression(),
            TokenKind::Div | TokenKind::DivAssign => return self.parse_regexp_literal(),
            _ => {}
        }
        let tok = self.tokens.next();
        let expr = match tok.kind {
            TokenKind::This => Expr::This,
            TokenKind::Null => Expr::Null,
            TokenKind::True => Expr::Boolean(true),
            TokenKind::False => Expr::Boolean(false),
            TokenKind::Identifier => Expr::Name(self.identifier_name(&tok)?),
            TokenKind::Integer | TokenKind::Decimal => {
                Expr::Number(parse_number(&tok.lexeme, !self.strict).map_err(|m| self.error_at(&tok, m))?)
            }
            TokenKind::String => Expr::String(parse_string(&tok.lexeme, !self.strict).map_err(|m| self.error_at(&tok, m))?),
            TokenKind::Reserved => return Err(self.error_at(&tok, format!("Unexpected reserved word '{}'", tok.lexeme))),
            _ => return Err(self.unexpected(&tok)),
        };
        Ok(expr)
    }

    fn parse_regexp_literal(&mut self) -> ParseResult<Expr> {
        let tok = self.tokens.scan_regexp();
        if tok.kind != TokenKind::RegExp {
            return Err(self.error_at(&tok, "Invalid regular expression: missing /"));
        }
        let Some((body, flags)) = tok.lexeme[1..].rsplit_once('/') else {
            return Err(self.error_at(&tok, "Invalid regular expression: missing /"));
        };
        let mut seen = String::new();
        for c in flags.chars() {
            if !matches!(c, 'g' | 'i' | 'm') || seen.contains(c) {
                return Err(self.error_at(&tok, format!("Invalid regular expression flags '{flags}'")));
            }
            seen.push(c);
        }
        Ok(Expr::RegExp(body.to_string(), flags.to_string()))
    }

    fn parse_array_literal(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LBracket)?;
        let mut elements = Vec::new();
        loop {
            match self.tokens.peek() {
                TokenKind::RBracket => {
                    self.tokens.next();
                    return Ok(Expr::Array(elements));
                }
                TokenKind::Comma => {
                    self.tokens.next();
                    elements.push(None);
                }
                _ => {
                    elements.push(Some(self.parse_assignment(true)?));
                    if self.tokens.peek() != TokenKind::RBracket {
                        self.expect(TokenKind::Comma)?;
                    }
                }
            }
        }
    }

    fn parse_property_key(&mut self) -> ParseResult<(Token, String)> {
        let tok = self.tokens.next();
        let key = match tok.kind {
            TokenKind::Identifier => self.identifier_name(&tok)?,
            TokenKind::Reserved => tok.lexeme.clone(),
            TokenKind::String => utf16_to_utf8(&parse_string(&tok.lexeme, !self.strict).map_err(|m| self.error_at(&tok, m))?),
            TokenKind::Integer | TokenKind::Decimal => {
                number_to_string(parse_number(&tok.lexeme, !self.strict).map_err(|m| self.error_at(&tok, m))?)
            }
            kind => match keyword_text(kind) {
                Some(word) => word.to_string(),
                None => return Err(self.unexpected(&tok)),
            },
        };
        Ok((tok, key))
    }

    fn parse_object_literal(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LBrace)?;
        let mut props = Vec::new();
        let mut seen: HashMap<String, PropertyKinds> = HashMap::new();
        while !self.eat(TokenKind::RBrace) {
            let (tok, key) = self.parse_property_key()?;
            let is_accessor_word = tok.kind == TokenKind::Identifier && !tok.escaped && (key == "get" || key == "set");
            let prop = if is_accessor_word && self.tokens.peek() != TokenKind::Colon {
                let (_, name) = self.parse_property_key()?;
                let func = self.parse_function_rest(&tok, None)?;
                if key == "get" {
                    if !func.params.is_empty() {
                        return Err(self.error_at(&tok, "Getter must not have any formal parameters"));
                    }
                    PropertyAssignment::Getter(name, func)
                } else {
                    if func.params.len() != 1 {
                        return Err(self.error_at(&tok, "Setter must have exactly one formal parameter"));
                    }
                    PropertyAssignment::Setter(name, func)
                }
            } else {
                self.expect(TokenKind::Colon)?;
                PropertyAssignment::Init(key, self.parse_assignment(true)?)
            };

            let (name, kinds) = match &prop {
                PropertyAssignment::Init(n, _) => (n, PropertyKinds { data: true, ..Default::default() }),
                PropertyAssignment::Getter(n, _) => (n, PropertyKinds { getter: true, ..Default::default() }),
                PropertyAssignment::Setter(n, _) => (n, PropertyKinds { setter: true, ..Default::default() }),
            };
            let previous = seen.entry(name.clone()).or_default();
            let conflict = (kinds.data && previous.data && self.strict)
                || (kinds.data && (previous.getter || previous.setter))
                || ((kinds.getter || kinds.setter) && previous.data)
                || (kinds.getter && previous.getter)
                || (kinds.setter && previous.setter);
            if conflict {
                return Err(self.error_at(&tok, format!("Duplicate property '{name}' in object literal")));
            }
            previous.data |= kinds.data;
            previous.getter |= kinds.getter;
            previous.setter |= kinds.setter;
            props.push(prop);

            if self.tokens.peek() != TokenKind::RBrace {
                self.expect(TokenKind::Comma)?;
            }
        }
        Ok(Expr::Object(props))
    }

    /// A lone function expression covering the whole input, as built by the
    /// Function constructor.
    pub fn parse_standalone_function(mut self) -> ParseResult<Rc<FunctionNode>> {
        let func = self.parse_function(false)?;
        self.expect(TokenKind::Eof)?;
        Ok(func)
    }
}

/// Parse a complete program. `strict` forces strict mode from the start
/// (used for eval called from strict code).
pub fn parse_program(source: &str, filename: Option<&str>, strict: bool) -> Result<Program, ParseError> {
    Parser::new(source, filename).parse_program(strict)
}

/// Build the function described by the Function constructor's parameter and body texts.
pub fn parse_function_constructor(params: &str, body: &str) -> Result<Rc<FunctionNode>, ParseError> {
    let source = format!("function anonymous({params}\n) {{\n{body}\n}}");
    Parser::new(&source, None).parse_standalone_function()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Program {
        parse_program(src, None, false).unwrap()
    }

    fn parse_err(src: &str) -> String {
        parse_program(src, None, false).unwrap_err().message
    }

    fn first_expr(src: &str) -> Expr {
        match parse(src).body.remove(0).kind {
            StatementKind::Expr(e) => e,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn precedence_climbing() {
        match first_expr("1 + 2 * 3") {
            Expr::Binary(BinaryOp::Add, l, r) => {
                assert!(matches!(*l, Expr::Number(n) if n == 1.0));
                assert!(matches!(*r, Expr::Binary(BinaryOp::Mul, ..)));
            }
            other => panic!("{other:?}"),
        }
        assert!(matches!(first_expr("a || b && c"), Expr::Logical(LogicalOp::Or, _, _)));
        assert!(matches!(first_expr("a - b - c"), Expr::Binary(BinaryOp::Sub, l, _) if matches!(*l, Expr::Binary(BinaryOp::Sub, ..))));
        assert!(matches!(first_expr("a = b = c"), Expr::Assign(None, _, r) if matches!(*r, Expr::Assign(..))));
    }

    #[test]
    fn automatic_semicolon_insertion() {
        let program = parse("a = 1\nb = 2");
        assert_eq!(program.body.len(), 2);

        let program = parse("function f() { return\n42 }");
        let StatementKind::FunctionDeclaration(f) = &program.body[0].kind else {
            panic!("expected function");
        };
        assert!(matches!(f.body[0].kind, StatementKind::Return(None)));
        assert_eq!(f.body.len(), 2);

        let program = parse("a\n++b");
        assert!(matches!(&program.body[1].kind, StatementKind::Expr(Expr::PrefixCount(..))));

        assert!(parse_err("throw\n1").contains("Illegal newline after throw"));
        assert!(parse_err("a b").contains("Unexpected token 'b'"));
    }

    #[test]
    fn for_in_heads() {
        let program = parse("for (var k in o) {}");
        assert!(matches!(&program.body[0].kind, StatementKind::ForIn(ForInTarget::Var(..), ..)));
        let program = parse("for (a.b in o);");
        assert!(matches!(&program.body[0].kind, StatementKind::ForIn(ForInTarget::Expr(..), ..)));
        let program = parse("for (var i = 0, n = ('x' in o); i < n; i++);");
        assert!(matches!(&program.body[0].kind, StatementKind::For(Some(ForInit::Var(_)), ..)));
        assert!(parse_err("for (f() in o);").contains("Invalid left-hand side"));
    }

    #[test]
    fn strict_mode_rules() {
        let strict = |body: &str| parse_program(&format!("'use strict'; {body}"), None, false);
        assert!(parse("'use strict'; var x;").strict);
        assert!(!parse("'use\\x20strict'; var x;").strict);
        assert!(strict("with (o) {}").is_err());
        assert!(strict("var x = 010;").is_err());
        assert!(strict("function f(a, a) {}").is_err());
        assert!(strict("var eval;").is_err());
        assert!(strict("arguments = 1;").is_err());
        assert!(strict("delete x;").is_err());
        assert!(strict("if (1) { function g() {} }").is_err());
        assert!(strict("var o = { a: 1, a: 2 };").is_err());
        assert!(parse_program("function f(a, a) {}", None, false).is_ok());
        assert!(parse_program("function f(eval) { 'use strict'; }", None, false).is_err());
        assert!(parse_program("var o = { a: 1, a: 2 };", None, false).is_ok());
        assert!(parse_program("if (1) { function g() {} }", None, false).is_ok());
    }

    #[test]
    fn object_literal_accessors() {
        match first_expr("({ get x() { return 1 }, set x(v) {}, if: 2, 'q': 3, 1.5: 4 })") {
            Expr::Object(props) => {
                assert_eq!(props.len(), 5);
                assert!(matches!(&props[0], PropertyAssignment::Getter(n, _) if n == "x"));
                assert!(matches!(&props[3], PropertyAssignment::Init(n, _) if n == "q"));
                assert!(matches!(&props[4], PropertyAssignment::Init(n, _) if n == "1.5"));
            }
            other => panic!("{other:?}"),
        }
        assert!(parse_err("({ a: 1, get a() {} })").contains("Duplicate property"));
        assert!(parse_err("({ get a() {}, get a() {} })").contains("Duplicate property"));
    }

    #[test]
    fn labels_and_jumps() {
        assert!(parse_program("outer: for (;;) { inner: while (1) { continue outer; } }", None, false).is_ok());
        assert!(parse_err("a: { continue a; }").contains("Undefined label"));
        assert!(parse_err("break;").contains("Illegal break"));
        assert!(parse_err("return 1;").contains("Illegal return"));
        assert!(parse_err("a: a: ;").contains("already been declared"));
    }

    #[test]
    fn regexp_and_function_source() {
        assert!(matches!(first_expr("/a+b/gi"), Expr::RegExp(p, f) if p == "a+b" && f == "gi"));
        assert!(parse_err("/a/gg").contains("Invalid regular expression flags"));
        let program = parse("var f = function add(a, b) { return a + b; };");
        let StatementKind::Var(decls) = &program.body[0].kind else {
            panic!("expected var");
        };
        let Some(Expr::Function(f)) = &decls[0].1 else {
            panic!("expected function expression");
        };
        assert_eq!(f.source, "function add(a, b) { return a + b; }");
        assert_eq!(f.name.as_deref(), Some("add"));
    }

    #[test]
    fn new_and_member_chains() {
        assert!(matches!(first_expr("new a.b(1).c"), Expr::Dot(base, _) if matches!(*base, Expr::New(..))));
        assert!(matches!(first_expr("new X"), Expr::New(_, args) if args.is_empty()));
        assert!(matches!(first_expr("a.if.class"), Expr::Dot(..)));
        assert!(matches!(first_expr("[1,,2,]"), Expr::Array(items) if items.len() == 3 && items[1].is_none()));
    }

    #[test]
    fn function_constructor_source() {
        let f = parse_function_constructor("a, b", "return a + b").unwrap();
        assert_eq!(f.params, vec!["a".to_string(), "b".to_string()]);
        assert!(parse_function_constructor("", "}); (function() {").is_err());
    }
}
