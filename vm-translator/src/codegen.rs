//! Hack assembly emission for VM commands.
//!
//! One `CodeWriter` translates an entire compilation unit (a file or a whole
//! directory). It owns the label counter shared by relational operations and
//! call return addresses, so labels stay unique across every file written
//! through it.

use crate::memory::{SegmentAccess, segment_access};
use crate::parser::{ArithmeticOp, Segment, VmCommand};

pub struct CodeWriter {
    /// Shared counter for TRUE/FALSE/END triples and call_n return labels.
    label_counter: usize,
    /// Basename of the file being translated, for static slot symbols.
    static_filename: String,
    /// Enclosing function, for `f$label` scoping.
    current_function: String,
}

impl CodeWriter {
    pub fn new() -> Self {
        Self {
            label_counter: 0,
            static_filename: String::new(),
            current_function: String::new(),
        }
    }

    /// Switch to a new source file. The label counter keeps counting.
    pub fn set_filename(&mut self, filename: &str) {
        self.static_filename = filename.to_string();
    }

    fn next_label(&mut self) -> usize {
        let n = self.label_counter;
        self.label_counter += 1;
        n
    }

    pub fn translate(&mut self, cmd: &VmCommand, buf: &mut String) {
        match cmd {
            VmCommand::Arithmetic(op) => self.translate_arithmetic(*op, buf),
            VmCommand::Push { segment, index } => self.translate_push(*segment, *index, buf),
            VmCommand::Pop { segment, index } => self.translate_pop(*segment, *index, buf),
            VmCommand::Label { name } => self.translate_label(name, buf),
            VmCommand::Goto { label } => self.translate_goto(label, buf),
            VmCommand::IfGoto { label } => self.translate_if_goto(label, buf),
            VmCommand::Function { name, num_locals } => {
                self.translate_function(name, *num_locals, buf)
            }
            VmCommand::Call { name, num_args } => self.translate_call(name, *num_args, buf),
            VmCommand::Return => self.translate_return(buf),
        }
    }

    /// Emit the directory-mode prologue: SP = 256, then a real
    /// `call Sys.init 0` whose return label comes from the shared counter.
    pub fn write_bootstrap(&mut self, buf: &mut String) {
        buf.push_str("@256\nD=A\n@SP\nM=D\n");
        self.translate_call("Sys.init", 0, buf);
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    fn translate_arithmetic(&mut self, op: ArithmeticOp, buf: &mut String) {
        match op {
            ArithmeticOp::Add => self.binary_op("M=D+M", buf),
            ArithmeticOp::Sub => self.binary_op("M=M-D", buf),
            ArithmeticOp::And => self.binary_op("M=D&M", buf),
            ArithmeticOp::Or => self.binary_op("M=D|M", buf),
            ArithmeticOp::Neg => self.unary_op("M=-M", buf),
            ArithmeticOp::Not => self.unary_op("M=!M", buf),
            ArithmeticOp::Eq => self.relational_op("JEQ", buf),
            ArithmeticOp::Gt => self.relational_op("JGT", buf),
            ArithmeticOp::Lt => self.relational_op("JLT", buf),
        }
    }

    /// Pop y into D, then compute `x op y` in place at the new stack top.
    fn binary_op(&self, operation: &str, buf: &mut String) {
        buf.push_str("@SP\nAM=M-1\nD=M\nA=A-1\n");
        buf.push_str(operation);
        buf.push('\n');
    }

    fn unary_op(&self, operation: &str, buf: &mut String) {
        buf.push_str("@SP\nA=M-1\n");
        buf.push_str(operation);
        buf.push('\n');
    }

    /// Compute x - y, then branch through a TRUE_n/FALSE_n/END_n triple to
    /// leave -1 (true) or 0 (false) on the stack.
    fn relational_op(&mut self, jump: &str, buf: &mut String) {
        let n = self.next_label();

        buf.push_str("@SP\nAM=M-1\nD=M\nA=A-1\nD=M-D\n");

        buf.push_str("@TRUE_");
        write_usize(n, buf);
        buf.push_str("\nD;");
        buf.push_str(jump);
        buf.push('\n');

        buf.push_str("@FALSE_");
        write_usize(n, buf);
        buf.push_str("\n0;JMP\n");

        buf.push_str("(TRUE_");
        write_usize(n, buf);
        buf.push_str(")\nD=-1\n@END_");
        write_usize(n, buf);
        buf.push_str("\n0;JMP\n");

        buf.push_str("(FALSE_");
        write_usize(n, buf);
        buf.push_str(")\nD=0\n");

        buf.push_str("(END_");
        write_usize(n, buf);
        buf.push_str(")\n@SP\nA=M-1\nM=D\n");
    }

    // =========================================================================
    // Memory access
    // =========================================================================

    fn translate_push(&self, segment: Segment, index: u16, buf: &mut String) {
        match segment_access(segment) {
            SegmentAccess::Constant => {
                buf.push('@');
                write_usize(index as usize, buf);
                buf.push_str("\nD=A\n");
            }
            SegmentAccess::Indirect(base) => {
                buf.push('@');
                write_usize(index as usize, buf);
                buf.push_str("\nD=A\n@");
                buf.push_str(base);
                buf.push_str("\nA=D+M\nD=M\n");
            }
            SegmentAccess::Direct(base) => {
                buf.push('@');
                write_usize((base + index) as usize, buf);
                buf.push_str("\nD=M\n");
            }
            SegmentAccess::Static => {
                buf.push('@');
                buf.push_str(&self.static_filename);
                buf.push('.');
                write_usize(index as usize, buf);
                buf.push_str("\nD=M\n");
            }
        }
        buf.push_str("@SP\nA=M\nM=D\n@SP\nM=M+1\n");
    }

    fn translate_pop(&self, segment: Segment, index: u16, buf: &mut String) {
        match segment_access(segment) {
            SegmentAccess::Constant => {
                // The parser rejects `pop constant`.
                debug_assert!(false, "pop to constant reached codegen");
            }
            SegmentAccess::Indirect(base) => {
                // Target address goes through R13; stack top lands in D.
                buf.push('@');
                write_usize(index as usize, buf);
                buf.push_str("\nD=A\n@");
                buf.push_str(base);
                buf.push_str("\nD=D+M\n@R13\nM=D\n@SP\nAM=M-1\nD=M\n@R13\nA=M\nM=D\n");
            }
            SegmentAccess::Direct(base) => {
                buf.push_str("@SP\nAM=M-1\nD=M\n@");
                write_usize((base + index) as usize, buf);
                buf.push_str("\nM=D\n");
            }
            SegmentAccess::Static => {
                buf.push_str("@SP\nAM=M-1\nD=M\n@");
                buf.push_str(&self.static_filename);
                buf.push('.');
                write_usize(index as usize, buf);
                buf.push_str("\nM=D\n");
            }
        }
    }

    // =========================================================================
    // Program flow
    // =========================================================================

    fn translate_label(&self, name: &str, buf: &mut String) {
        buf.push('(');
        self.write_scoped_label(name, buf);
        buf.push_str(")\n");
    }

    fn translate_goto(&self, label: &str, buf: &mut String) {
        buf.push('@');
        self.write_scoped_label(label, buf);
        buf.push_str("\n0;JMP\n");
    }

    fn translate_if_goto(&self, label: &str, buf: &mut String) {
        buf.push_str("@SP\nAM=M-1\nD=M\n@");
        self.write_scoped_label(label, buf);
        buf.push_str("\nD;JNE\n");
    }

    /// Labels are scoped as `function$label`; outside any function the
    /// filename stands in for the function.
    fn write_scoped_label(&self, label: &str, buf: &mut String) {
        if !self.current_function.is_empty() {
            buf.push_str(&self.current_function);
        } else {
            buf.push_str(&self.static_filename);
        }
        buf.push('$');
        buf.push_str(label);
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn translate_function(&mut self, name: &str, num_locals: u16, buf: &mut String) {
        self.current_function = name.to_string();

        buf.push('(');
        buf.push_str(name);
        buf.push_str(")\n");

        // Local slots start zeroed.
        for _ in 0..num_locals {
            buf.push_str("@SP\nA=M\nM=0\n@SP\nM=M+1\n");
        }
    }

    fn translate_call(&mut self, name: &str, num_args: u16, buf: &mut String) {
        let n = self.next_label();

        // Push return address
        buf.push_str("@call_");
        write_usize(n, buf);
        buf.push_str("\nD=A\n@SP\nA=M\nM=D\n@SP\nM=M+1\n");

        // Save the caller frame
        for base in ["LCL", "ARG", "THIS", "THAT"] {
            buf.push('@');
            buf.push_str(base);
            buf.push_str("\nD=M\n@SP\nA=M\nM=D\n@SP\nM=M+1\n");
        }

        // ARG = SP - num_args - 5
        buf.push_str("@SP\nD=M\n@");
        write_usize(num_args as usize + 5, buf);
        buf.push_str("\nD=D-A\n@ARG\nM=D\n");

        // LCL = SP
        buf.push_str("@SP\nD=M\n@LCL\nM=D\n");

        buf.push('@');
        buf.push_str(name);
        buf.push_str("\n0;JMP\n");

        buf.push_str("(call_");
        write_usize(n, buf);
        buf.push_str(")\n");
    }

    fn translate_return(&self, buf: &mut String) {
        // frame = LCL (R13); the return address is read before *ARG is
        // overwritten, because for 0-arg calls they share a slot.
        buf.push_str("@LCL\nD=M\n@R13\nM=D\n");

        // retAddr = *(frame - 5) (R14)
        buf.push_str("@5\nA=D-A\nD=M\n@R14\nM=D\n");

        // *ARG = pop()
        buf.push_str("@SP\nAM=M-1\nD=M\n@ARG\nA=M\nM=D\n");

        // SP = ARG + 1
        buf.push_str("@ARG\nD=M+1\n@SP\nM=D\n");

        // Restore THAT, THIS, ARG, LCL from the frame
        buf.push_str("@R13\nAM=M-1\nD=M\n@THAT\nM=D\n");
        buf.push_str("@R13\nAM=M-1\nD=M\n@THIS\nM=D\n");
        buf.push_str("@R13\nAM=M-1\nD=M\n@ARG\nM=D\n");
        buf.push_str("@R13\nAM=M-1\nD=M\n@LCL\nM=D\n");

        // goto retAddr
        buf.push_str("@R14\nA=M\n0;JMP\n");
    }
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Append a decimal number without allocating.
fn write_usize(n: usize, buf: &mut String) {
    if n == 0 {
        buf.push('0');
        return;
    }

    let mut digits = [0u8; 20];
    let mut i = 0;
    let mut num = n;

    while num > 0 {
        digits[i] = (num % 10) as u8;
        num /= 10;
        i += 1;
    }

    while i > 0 {
        i -= 1;
        buf.push((b'0' + digits[i]) as char);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;

    fn translate(writer: &mut CodeWriter, source: &str) -> String {
        let mut buf = String::new();
        for (i, line) in source.lines().enumerate() {
            if let Some(cmd) = parse_line(line, i + 1, "Test.vm").unwrap() {
                writer.translate(&cmd, &mut buf);
            }
        }
        buf
    }

    #[test]
    fn push_constant() {
        let mut w = CodeWriter::new();
        let asm = translate(&mut w, "push constant 7");
        assert!(asm.starts_with("@7\nD=A\n"));
        assert!(asm.contains("@SP\nA=M\nM=D\n@SP\nM=M+1"));
    }

    #[test]
    fn push_local_goes_through_base_pointer() {
        let mut w = CodeWriter::new();
        let asm = translate(&mut w, "push local 2");
        assert!(asm.contains("@2\nD=A\n@LCL\nA=D+M\nD=M"));
    }

    #[test]
    fn pop_argument_routes_address_through_r13() {
        let mut w = CodeWriter::new();
        let asm = translate(&mut w, "pop argument 3");
        assert!(asm.contains("@3\nD=A\n@ARG\nD=D+M\n@R13"));
        assert!(asm.contains("@R13\nA=M\nM=D"));
    }

    #[test]
    fn pointer_and_temp_are_direct_addresses() {
        let mut w = CodeWriter::new();
        assert!(translate(&mut w, "push pointer 0").contains("@3\nD=M"));
        assert!(translate(&mut w, "push pointer 1").contains("@4\nD=M"));
        assert!(translate(&mut w, "push temp 3").contains("@8\nD=M"));
        assert!(translate(&mut w, "pop temp 0").contains("@5\nM=D"));
    }

    #[test]
    fn static_slots_use_filename_symbols() {
        let mut w = CodeWriter::new();
        w.set_filename("Foo");
        let asm = translate(&mut w, "push static 2\npop static 5");
        assert!(asm.contains("@Foo.2\nD=M"));
        assert!(asm.contains("@Foo.5\nM=D"));
    }

    #[test]
    fn binary_op_leaves_result_in_place() {
        let mut w = CodeWriter::new();
        let asm = translate(&mut w, "add");
        assert_eq!(asm, "@SP\nAM=M-1\nD=M\nA=A-1\nM=D+M\n");
    }

    #[test]
    fn sub_computes_x_minus_y() {
        let mut w = CodeWriter::new();
        assert!(translate(&mut w, "sub").contains("M=M-D"));
    }

    #[test]
    fn unary_ops_touch_only_the_top() {
        let mut w = CodeWriter::new();
        assert_eq!(translate(&mut w, "neg"), "@SP\nA=M-1\nM=-M\n");
        assert_eq!(translate(&mut w, "not"), "@SP\nA=M-1\nM=!M\n");
    }

    #[test]
    fn relational_op_emits_label_triple() {
        let mut w = CodeWriter::new();
        let asm = translate(&mut w, "eq");
        assert!(asm.contains("D=M-D"));
        assert!(asm.contains("@TRUE_0\nD;JEQ"));
        assert!(asm.contains("@FALSE_0\n0;JMP"));
        assert!(asm.contains("(TRUE_0)\nD=-1"));
        assert!(asm.contains("(FALSE_0)\nD=0"));
        assert!(asm.contains("(END_0)"));
    }

    #[test]
    fn relational_labels_advance_the_shared_counter() {
        let mut w = CodeWriter::new();
        let asm = translate(&mut w, "lt\ngt");
        assert!(asm.contains("(END_0)"));
        assert!(asm.contains("@TRUE_1\nD;JGT"));
    }

    #[test]
    fn labels_are_scoped_to_the_current_function() {
        let mut w = CodeWriter::new();
        let asm = translate(&mut w, "function Foo.bar 0\nlabel LOOP\ngoto LOOP\nif-goto LOOP");
        assert!(asm.contains("(Foo.bar$LOOP)"));
        assert!(asm.contains("@Foo.bar$LOOP\n0;JMP"));
        assert!(asm.contains("@Foo.bar$LOOP\nD;JNE"));
    }

    #[test]
    fn labels_outside_functions_fall_back_to_the_filename() {
        let mut w = CodeWriter::new();
        w.set_filename("Test");
        let asm = translate(&mut w, "label LOOP");
        assert!(asm.contains("(Test$LOOP)"));
    }

    #[test]
    fn function_zeroes_its_locals() {
        let mut w = CodeWriter::new();
        let asm = translate(&mut w, "function Foo.bar 2");
        assert!(asm.starts_with("(Foo.bar)\n"));
        assert_eq!(asm.matches("M=0").count(), 2);
    }

    #[test]
    fn call_builds_the_frame() {
        let mut w = CodeWriter::new();
        let asm = translate(&mut w, "call Foo.bar 2");
        assert!(asm.starts_with("@call_0\nD=A\n"));
        // Saved frame, in order
        let lcl = asm.find("@LCL\nD=M").unwrap();
        let arg = asm.find("@ARG\nD=M").unwrap();
        let this = asm.find("@THIS\nD=M").unwrap();
        let that = asm.find("@THAT\nD=M").unwrap();
        assert!(lcl < arg && arg < this && this < that);
        // ARG = SP - 2 - 5
        assert!(asm.contains("@7\nD=D-A\n@ARG\nM=D"));
        assert!(asm.contains("@Foo.bar\n0;JMP"));
        assert!(asm.ends_with("(call_0)\n"));
    }

    #[test]
    fn return_reads_ret_addr_before_clobbering_arg() {
        let mut w = CodeWriter::new();
        let asm = translate(&mut w, "return");
        let ret_read = asm.find("@5\nA=D-A\nD=M\n@R14").unwrap();
        let arg_write = asm.find("@ARG\nA=M\nM=D").unwrap();
        assert!(ret_read < arg_write);
        assert!(asm.contains("@ARG\nD=M+1\n@SP\nM=D"));
        assert!(asm.ends_with("@R14\nA=M\n0;JMP\n"));
    }

    #[test]
    fn bootstrap_sets_sp_then_calls_sys_init() {
        let mut w = CodeWriter::new();
        let mut buf = String::new();
        w.write_bootstrap(&mut buf);
        assert!(buf.starts_with("@256\nD=A\n@SP\nM=D\n"));
        assert!(buf.contains("@Sys.init\n0;JMP"));
        // ARG = SP - 0 - 5
        assert!(buf.contains("@5\nD=D-A\n@ARG\nM=D"));
        assert!(buf.contains("(call_0)"));
    }

    #[test]
    fn write_usize_digits() {
        let mut buf = String::new();
        write_usize(0, &mut buf);
        write_usize(42, &mut buf);
        write_usize(65535, &mut buf);
        assert_eq!(buf, "04265535");
    }
}
