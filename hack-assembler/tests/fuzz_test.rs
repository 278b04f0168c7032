use hack_assembler::assemble;
use proptest::prelude::*;

// Property-based tests: the assembler may reject input but must never panic,
// and well-formed input obeys the one-word-per-instruction output shape.

fn arb_asm_line() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<u16>().prop_map(|n| format!("@{}", n)),
        "[a-zA-Z_][a-zA-Z0-9_]*".prop_map(|s| format!("@{}", s)),
        "[a-zA-Z_][a-zA-Z0-9_]*".prop_map(|s| format!("({})", s)),
        "[ADM01]+",
        "//[^\n]*",
        "[ \t\r\n]*",
        "[\\x20-\\x7E]+",
    ]
}

fn arb_asm_program() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_asm_line(), 0..100).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #[test]
    fn no_panic_on_arbitrary_input(input in arb_asm_program()) {
        let _ = assemble(&input);
    }

    /// Every valid numeric A-instruction yields exactly one 16-bit line.
    #[test]
    fn valid_a_instructions_encode(addr in 0u16..=32767) {
        let output = assemble(&format!("@{}", addr)).unwrap();
        prop_assert_eq!(output.lines().count(), 1);
        prop_assert_eq!(output.lines().next().unwrap().len(), 16);
        // Value survives the round trip through the binary encoding.
        let decoded = u16::from_str_radix(output.trim_end(), 2).unwrap();
        prop_assert_eq!(decoded, addr);
    }

    #[test]
    fn predefined_symbols_always_resolve(
        symbol in prop_oneof![
            Just("R0"), Just("R7"), Just("R15"),
            Just("SP"), Just("LCL"), Just("ARG"), Just("THIS"), Just("THAT"),
            Just("SCREEN"), Just("KBD")
        ]
    ) {
        let is_ok = assemble(&format!("@{}", symbol)).is_ok();
        prop_assert!(is_ok);
    }

    #[test]
    fn out_of_range_a_values_error(addr in 32768u32..=99999) {
        let is_err = assemble(&format!("@{}", addr)).is_err();
        prop_assert!(is_err);
    }

    #[test]
    fn comments_produce_no_output(comment in "//[^\n]*") {
        prop_assert_eq!(assemble(&comment).unwrap(), "");
    }

    /// Output line count equals real-instruction count, independent of
    /// labels, comments, and blank lines.
    #[test]
    fn one_line_per_real_instruction(vars in prop::collection::vec("[a-z][a-z0-9]{0,8}", 1..10)) {
        let mut source = String::new();
        for (i, var) in vars.iter().enumerate() {
            source.push_str(&format!("(L{})\n// set {}\n@{}\nM=1\n\n", i, var, var));
        }

        let output = assemble(&source).unwrap();
        prop_assert_eq!(output.lines().count(), vars.len() * 2);
        for line in output.lines() {
            prop_assert_eq!(line.len(), 16);
        }
    }

    #[test]
    fn duplicate_labels_error(label in "[A-Z][A-Z0-9_]{0,10}") {
        let source = format!("({})\n@0\n({})\n@1", label, label);
        prop_assert!(assemble(&source).is_err());
    }
}
