//! XML output for tokens and parse trees.
//!
//! The parse-tree writer replays the original token stream through a cursor
//! while walking the AST, so terminals appear exactly as tokenized.

use crate::ast::*;
use crate::token::SpannedToken;

/// Rough XML bytes per token, for buffer pre-sizing.
const BYTES_PER_TOKEN: usize = 40;

/// Token stream XML (the `XT.xml` format).
pub fn tokens_to_xml(tokens: &[SpannedToken]) -> String {
    let mut output = String::with_capacity(21 + tokens.len() * BYTES_PER_TOKEN);

    output.push_str("<tokens>\n");

    for token in tokens {
        let tag = token.token.xml_tag();
        output.push('<');
        output.push_str(tag);
        output.push_str("> ");
        output.push_str(&token.token.xml_value());
        output.push_str(" </");
        output.push_str(tag);
        output.push_str(">\n");
    }

    output.push_str("</tokens>\n");
    output
}

/// Indented parse-tree XML writer (the `X.xml` format).
pub struct XmlWriter {
    output: String,
    indent: usize,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    pub fn write_class(mut self, class: &Class, tokens: &[SpannedToken]) -> String {
        self.output.reserve(tokens.len() * BYTES_PER_TOKEN * 2);
        let mut cursor = TokenCursor::new(tokens);
        self.class(class, &mut cursor);
        self.output
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
    }

    fn open_tag(&mut self, tag: &str) {
        self.write_indent();
        self.output.push('<');
        self.output.push_str(tag);
        self.output.push_str(">\n");
        self.indent += 1;
    }

    fn close_tag(&mut self, tag: &str) {
        self.indent -= 1;
        self.write_indent();
        self.output.push_str("</");
        self.output.push_str(tag);
        self.output.push_str(">\n");
    }

    /// Emit the next terminal from the token stream.
    fn terminal(&mut self, cursor: &mut TokenCursor) {
        if let Some(token) = cursor.advance() {
            let tag = token.token.xml_tag();
            let value = token.token.xml_value();
            self.write_indent();
            self.output.push('<');
            self.output.push_str(tag);
            self.output.push_str("> ");
            self.output.push_str(&value);
            self.output.push_str(" </");
            self.output.push_str(tag);
            self.output.push_str(">\n");
        }
    }

    fn terminals(&mut self, cursor: &mut TokenCursor, count: usize) {
        for _ in 0..count {
            self.terminal(cursor);
        }
    }

    fn class(&mut self, class: &Class, cursor: &mut TokenCursor) {
        self.open_tag("class");
        self.terminals(cursor, 3); // 'class' name '{'

        for dec in &class.class_var_decs {
            self.class_var_dec(dec, cursor);
        }
        for sub in &class.subroutine_decs {
            self.subroutine_dec(sub, cursor);
        }

        self.terminal(cursor); // '}'
        self.close_tag("class");
    }

    fn class_var_dec(&mut self, dec: &ClassVarDec, cursor: &mut TokenCursor) {
        self.open_tag("classVarDec");
        self.terminals(cursor, 3); // kind type name
        for _ in 1..dec.names.len() {
            self.terminals(cursor, 2); // ',' name
        }
        self.terminal(cursor); // ';'
        self.close_tag("classVarDec");
    }

    fn subroutine_dec(&mut self, sub: &SubroutineDec, cursor: &mut TokenCursor) {
        self.open_tag("subroutineDec");
        self.terminals(cursor, 4); // kind returnType name '('

        self.open_tag("parameterList");
        if !sub.parameters.is_empty() {
            self.terminals(cursor, 2); // type name
            for _ in 1..sub.parameters.len() {
                self.terminals(cursor, 3); // ',' type name
            }
        }
        self.close_tag("parameterList");

        self.terminal(cursor); // ')'

        self.open_tag("subroutineBody");
        self.terminal(cursor); // '{'
        for dec in &sub.body.var_decs {
            self.var_dec(dec, cursor);
        }
        self.statements(&sub.body.statements, cursor);
        self.terminal(cursor); // '}'
        self.close_tag("subroutineBody");

        self.close_tag("subroutineDec");
    }

    fn var_dec(&mut self, dec: &VarDec, cursor: &mut TokenCursor) {
        self.open_tag("varDec");
        self.terminals(cursor, 3); // 'var' type name
        for _ in 1..dec.names.len() {
            self.terminals(cursor, 2); // ',' name
        }
        self.terminal(cursor); // ';'
        self.close_tag("varDec");
    }

    fn statements(&mut self, statements: &[Statement], cursor: &mut TokenCursor) {
        self.open_tag("statements");
        for stmt in statements {
            match stmt {
                Statement::Let(s) => self.let_statement(s, cursor),
                Statement::If(s) => self.if_statement(s, cursor),
                Statement::While(s) => self.while_statement(s, cursor),
                Statement::Do(s) => self.do_statement(s, cursor),
                Statement::Return(s) => self.return_statement(s, cursor),
            }
        }
        self.close_tag("statements");
    }

    fn let_statement(&mut self, stmt: &LetStatement, cursor: &mut TokenCursor) {
        self.open_tag("letStatement");
        self.terminals(cursor, 2); // 'let' name

        if let Some(index) = &stmt.index {
            self.terminal(cursor); // '['
            self.expression(index, cursor);
            self.terminal(cursor); // ']'
        }

        self.terminal(cursor); // '='
        self.expression(&stmt.value, cursor);
        self.terminal(cursor); // ';'
        self.close_tag("letStatement");
    }

    fn if_statement(&mut self, stmt: &IfStatement, cursor: &mut TokenCursor) {
        self.open_tag("ifStatement");
        self.terminals(cursor, 2); // 'if' '('
        self.expression(&stmt.condition, cursor);
        self.terminals(cursor, 2); // ')' '{'
        self.statements(&stmt.then_statements, cursor);
        self.terminal(cursor); // '}'

        if let Some(else_stmts) = &stmt.else_statements {
            self.terminals(cursor, 2); // 'else' '{'
            self.statements(else_stmts, cursor);
            self.terminal(cursor); // '}'
        }

        self.close_tag("ifStatement");
    }

    fn while_statement(&mut self, stmt: &WhileStatement, cursor: &mut TokenCursor) {
        self.open_tag("whileStatement");
        self.terminals(cursor, 2); // 'while' '('
        self.expression(&stmt.condition, cursor);
        self.terminals(cursor, 2); // ')' '{'
        self.statements(&stmt.statements, cursor);
        self.terminal(cursor); // '}'
        self.close_tag("whileStatement");
    }

    fn do_statement(&mut self, stmt: &DoStatement, cursor: &mut TokenCursor) {
        self.open_tag("doStatement");
        self.terminal(cursor); // 'do'
        self.subroutine_call(&stmt.call, cursor);
        self.terminal(cursor); // ';'
        self.close_tag("doStatement");
    }

    fn return_statement(&mut self, stmt: &ReturnStatement, cursor: &mut TokenCursor) {
        self.open_tag("returnStatement");
        self.terminal(cursor); // 'return'
        if let Some(value) = &stmt.value {
            self.expression(value, cursor);
        }
        self.terminal(cursor); // ';'
        self.close_tag("returnStatement");
    }

    fn expression(&mut self, expr: &Expression, cursor: &mut TokenCursor) {
        self.open_tag("expression");
        self.term(&expr.term, cursor);
        for (_, term) in &expr.ops {
            self.terminal(cursor); // op
            self.term(term, cursor);
        }
        self.close_tag("expression");
    }

    fn term(&mut self, term: &Term, cursor: &mut TokenCursor) {
        self.open_tag("term");
        match term {
            Term::IntegerConstant(..)
            | Term::StringConstant(..)
            | Term::KeywordConstant(..)
            | Term::VarName(..) => {
                self.terminal(cursor);
            }
            Term::ArrayAccess(_, expr, _) => {
                self.terminals(cursor, 2); // name '['
                self.expression(expr, cursor);
                self.terminal(cursor); // ']'
            }
            Term::SubroutineCall(call) => {
                self.subroutine_call(call, cursor);
            }
            Term::Parenthesized(expr, _) => {
                self.terminal(cursor); // '('
                self.expression(expr, cursor);
                self.terminal(cursor); // ')'
            }
            Term::UnaryOp(_, inner, _) => {
                self.terminal(cursor); // op
                self.term(inner, cursor);
            }
        }
        self.close_tag("term");
    }

    fn subroutine_call(&mut self, call: &SubroutineCall, cursor: &mut TokenCursor) {
        if call.receiver.is_some() {
            self.terminals(cursor, 2); // receiver '.'
        }
        self.terminals(cursor, 2); // name '('

        self.open_tag("expressionList");
        if !call.arguments.is_empty() {
            self.expression(&call.arguments[0], cursor);
            for expr in &call.arguments[1..] {
                self.terminal(cursor); // ','
                self.expression(expr, cursor);
            }
        }
        self.close_tag("expressionList");

        self.terminal(cursor); // ')'
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

struct TokenCursor<'a> {
    tokens: &'a [SpannedToken],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    fn new(tokens: &'a [SpannedToken]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn advance(&mut self) -> Option<&'a SpannedToken> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }
}
