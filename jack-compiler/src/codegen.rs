//! VM code generation for Jack classes.
//!
//! Walks the AST produced by `jack-analyzer` and emits VM commands through
//! the [`VmWriter`]. No optimization is performed; the emitted code is the
//! direct lowering of each construct.

use crate::error::CompileError;
use crate::symbol_table::{SymbolKind, SymbolTable};
use crate::vm_writer::VmWriter;
use jack_analyzer::ast::*;

pub struct CodeGenerator {
    symbols: SymbolTable,
    vm: VmWriter,
    /// Per-class counter for if/while labels.
    label_counter: u32,
    class_name: String,
    errors: Vec<CompileError>,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            vm: VmWriter::new(),
            label_counter: 0,
            class_name: String::new(),
            errors: Vec::new(),
        }
    }

    /// Compile one class to VM text.
    pub fn compile(class: &Class) -> Result<String, Vec<CompileError>> {
        let mut compiler = CodeGenerator::new();
        compiler.compile_class(class);

        if compiler.errors.is_empty() {
            Ok(compiler.vm.into_output())
        } else {
            Err(compiler.errors)
        }
    }

    fn unique_label(&mut self, prefix: &str) -> String {
        let label = format!("{}_{}", prefix, self.label_counter);
        self.label_counter += 1;
        label
    }

    fn error(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn compile_class(&mut self, class: &Class) {
        self.class_name = class.name.clone();
        self.symbols.start_class(&class.name);

        for var_dec in &class.class_var_decs {
            self.compile_class_var_dec(var_dec);
        }

        for sub in &class.subroutine_decs {
            self.compile_subroutine(sub);
        }
    }

    fn compile_class_var_dec(&mut self, dec: &ClassVarDec) {
        let kind = match dec.kind {
            ClassVarKind::Static => SymbolKind::Static,
            ClassVarKind::Field => SymbolKind::Field,
        };

        for name in &dec.names {
            if let Err(e) = self
                .symbols
                .define(name, dec.var_type.clone(), kind, dec.span.clone())
            {
                self.error(e);
            }
        }
    }

    fn compile_subroutine(&mut self, sub: &SubroutineDec) {
        self.symbols.start_subroutine();

        // A method's receiver is argument 0.
        if sub.kind == SubroutineKind::Method
            && let Err(e) = self.symbols.define(
                "this",
                Type::ClassName(self.class_name.clone()),
                SymbolKind::Argument,
                sub.span.clone(),
            )
        {
            self.error(e);
        }

        for param in &sub.parameters {
            if let Err(e) = self.symbols.define(
                &param.name,
                param.var_type.clone(),
                SymbolKind::Argument,
                sub.span.clone(),
            ) {
                self.error(e);
            }
        }

        for var_dec in &sub.body.var_decs {
            for name in &var_dec.names {
                if let Err(e) = self.symbols.define(
                    name,
                    var_dec.var_type.clone(),
                    SymbolKind::Local,
                    var_dec.span.clone(),
                ) {
                    self.error(e);
                }
            }
        }

        // The function directive waits until all var decs are counted.
        let num_locals = self.symbols.var_count(SymbolKind::Local);
        self.vm.write_function(&self.class_name, &sub.name, num_locals);

        match sub.kind {
            SubroutineKind::Constructor => {
                // Allocate the object and anchor `this`.
                let field_count = self.symbols.field_count();
                self.vm.write_push("constant", field_count);
                self.vm.write_call("Memory.alloc", 1);
                self.vm.write_pop("pointer", 0);
            }
            SubroutineKind::Method => {
                self.vm.write_push("argument", 0);
                self.vm.write_pop("pointer", 0);
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements(&sub.body.statements);
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn compile_statements(&mut self, statements: &[Statement]) {
        for stmt in statements {
            self.compile_statement(stmt);
        }
    }

    fn compile_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Let(s) => self.compile_let(s),
            Statement::If(s) => self.compile_if(s),
            Statement::While(s) => self.compile_while(s),
            Statement::Do(s) => self.compile_do(s),
            Statement::Return(s) => self.compile_return(s),
        }
    }

    fn compile_let(&mut self, stmt: &LetStatement) {
        let symbol = match self.symbols.lookup(&stmt.var_name) {
            Some(s) => s.clone(),
            None => {
                self.error(CompileError::undefined_variable(
                    &stmt.var_name,
                    stmt.span.clone(),
                ));
                return;
            }
        };

        if let Some(index_expr) = &stmt.index {
            // let a[i] = e: the target address is computed before the RHS,
            // and the RHS value detours through temp 0 so the RHS may itself
            // use THAT (e.g. let a[i] = b[j]).
            self.vm.write_push(symbol.segment(), symbol.index);
            self.compile_expression(index_expr);
            self.vm.write_arithmetic("add");
            self.compile_expression(&stmt.value);
            self.vm.write_pop("temp", 0);
            self.vm.write_pop("pointer", 1);
            self.vm.write_push("temp", 0);
            self.vm.write_pop("that", 0);
        } else {
            self.compile_expression(&stmt.value);
            self.vm.write_pop(symbol.segment(), symbol.index);
        }
    }

    fn compile_if(&mut self, stmt: &IfStatement) {
        let else_label = self.unique_label("IF_ELSE");
        let end_label = self.unique_label("IF_END");

        self.compile_expression(&stmt.condition);
        self.vm.write_arithmetic("not");
        self.vm.write_if_goto(&else_label);

        self.compile_statements(&stmt.then_statements);
        self.vm.write_goto(&end_label);

        self.vm.write_label(&else_label);
        if let Some(else_stmts) = &stmt.else_statements {
            self.compile_statements(else_stmts);
        }

        self.vm.write_label(&end_label);
    }

    fn compile_while(&mut self, stmt: &WhileStatement) {
        let loop_label = self.unique_label("WHILE_EXP");
        let end_label = self.unique_label("WHILE_END");

        self.vm.write_label(&loop_label);

        self.compile_expression(&stmt.condition);
        self.vm.write_arithmetic("not");
        self.vm.write_if_goto(&end_label);

        self.compile_statements(&stmt.statements);
        self.vm.write_goto(&loop_label);

        self.vm.write_label(&end_label);
    }

    fn compile_do(&mut self, stmt: &DoStatement) {
        self.compile_subroutine_call(&stmt.call);
        // do-calls discard the return value.
        self.vm.write_pop("temp", 0);
    }

    fn compile_return(&mut self, stmt: &ReturnStatement) {
        if let Some(expr) = &stmt.value {
            self.compile_expression(expr);
        } else {
            // Void convention: a value is always returned.
            self.vm.write_push("constant", 0);
        }
        self.vm.write_return();
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn compile_expression(&mut self, expr: &Expression) {
        self.compile_term(&expr.term);

        for (op, term) in &expr.ops {
            self.compile_term(term);
            self.compile_binary_op(*op);
        }
    }

    fn compile_term(&mut self, term: &Term) {
        match term {
            Term::IntegerConstant(value, _) => {
                self.vm.write_push("constant", *value);
            }

            Term::StringConstant(s, _) => {
                self.compile_string_constant(s);
            }

            Term::KeywordConstant(kw, _) => {
                self.compile_keyword_constant(*kw);
            }

            Term::VarName(name, span) => match self.symbols.lookup(name) {
                Some(symbol) => {
                    self.vm.write_push(symbol.segment(), symbol.index);
                }
                None => {
                    self.error(CompileError::undefined_variable(name, span.clone()));
                }
            },

            Term::ArrayAccess(name, index_expr, span) => match self.symbols.lookup(name) {
                Some(symbol) => {
                    let (segment, index) = (symbol.segment(), symbol.index);
                    self.vm.write_push(segment, index);
                    self.compile_expression(index_expr);
                    self.vm.write_arithmetic("add");
                    self.vm.write_pop("pointer", 1);
                    self.vm.write_push("that", 0);
                }
                None => {
                    self.error(CompileError::undefined_variable(name, span.clone()));
                }
            },

            Term::SubroutineCall(call) => {
                self.compile_subroutine_call(call);
            }

            Term::Parenthesized(expr, _) => {
                self.compile_expression(expr);
            }

            Term::UnaryOp(op, inner, _) => {
                self.compile_term(inner);
                match op {
                    UnaryOp::Neg => self.vm.write_arithmetic("neg"),
                    UnaryOp::Not => self.vm.write_arithmetic("not"),
                }
            }
        }
    }

    fn compile_string_constant(&mut self, s: &str) {
        self.vm.write_push("constant", s.len() as u16);
        self.vm.write_call("String.new", 1);

        for ch in s.chars() {
            self.vm.write_push("constant", ch as u16);
            self.vm.write_call("String.appendChar", 2);
        }
    }

    fn compile_keyword_constant(&mut self, kw: KeywordConstant) {
        match kw {
            KeywordConstant::True => {
                // true is the all-ones word
                self.vm.write_push("constant", 0);
                self.vm.write_arithmetic("not");
            }
            KeywordConstant::False | KeywordConstant::Null => {
                self.vm.write_push("constant", 0);
            }
            KeywordConstant::This => {
                self.vm.write_push("pointer", 0);
            }
        }
    }

    fn compile_binary_op(&mut self, op: BinaryOp) {
        match op {
            BinaryOp::Add => self.vm.write_arithmetic("add"),
            BinaryOp::Sub => self.vm.write_arithmetic("sub"),
            BinaryOp::And => self.vm.write_arithmetic("and"),
            BinaryOp::Or => self.vm.write_arithmetic("or"),
            BinaryOp::Lt => self.vm.write_arithmetic("lt"),
            BinaryOp::Gt => self.vm.write_arithmetic("gt"),
            BinaryOp::Eq => self.vm.write_arithmetic("eq"),
            BinaryOp::Mul => self.vm.write_call("Math.multiply", 2),
            BinaryOp::Div => self.vm.write_call("Math.divide", 2),
        }
    }

    /// Three-way call dispatch:
    /// - `name(args)`       -> method on `this`: push pointer 0,
    ///                         `call ClassName.name n+1`
    /// - `var.name(args)`   -> method on the instance: push the variable,
    ///                         `call TypeOf(var).name n+1`
    /// - `Class.name(args)` -> plain function/constructor: `call Class.name n`
    fn compile_subroutine_call(&mut self, call: &SubroutineCall) {
        let (target_class, num_args) = match &call.receiver {
            Some(receiver) => {
                if let Some(symbol) = self.symbols.lookup(receiver) {
                    let class = match &symbol.symbol_type {
                        Type::ClassName(name) => name.clone(),
                        // Method call on a primitive; nothing sensible to
                        // dispatch to, so the receiver name stands in.
                        _ => receiver.clone(),
                    };
                    self.vm.write_push(symbol.segment(), symbol.index);
                    (class, call.arguments.len() as u16 + 1)
                } else {
                    (receiver.clone(), call.arguments.len() as u16)
                }
            }
            None => {
                self.vm.write_push("pointer", 0);
                (self.class_name.clone(), call.arguments.len() as u16 + 1)
            }
        };

        for arg in &call.arguments {
            self.compile_expression(arg);
        }

        self.vm.write_call_qualified(&target_class, &call.name, num_args);
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
