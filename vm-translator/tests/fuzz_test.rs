use hack_assembler::assemble;
use proptest::prelude::*;
use vm_translator::parser::parse_line;
use vm_translator::translate;

// Property-based tests: the parser/translator must never panic, and every
// well-formed command sequence must translate to assembly that assembles.

fn arb_vm_line() -> impl Strategy<Value = String> {
    prop_oneof![
        prop_oneof![
            Just("add"), Just("sub"), Just("neg"), Just("eq"), Just("gt"),
            Just("lt"), Just("and"), Just("or"), Just("not"), Just("return"),
        ]
        .prop_map(str::to_string),
        ("(push|pop)", "(argument|local|this|that|temp|pointer|static)", 0u16..8)
            .prop_map(|(op, seg, i)| format!("{} {} {}", op, seg, i)),
        (0u16..=32767).prop_map(|i| format!("push constant {}", i)),
        ("(label|goto|if-goto)", "[A-Za-z_][A-Za-z0-9_.:]{1,10}")
            .prop_map(|(op, name)| format!("{} {}", op, name)),
        ("[A-Z][a-z]{1,6}\\.[a-z]{1,6}", 0u16..5)
            .prop_map(|(name, n)| format!("function {} {}", name, n)),
        ("[A-Z][a-z]{1,6}\\.[a-z]{1,6}", 0u16..5)
            .prop_map(|(name, n)| format!("call {} {}", name, n)),
        "//[^\n]*".prop_map(|s| s.to_string()),
        "[ \t]*".prop_map(|s| s.to_string()),
        // Garbage lines to exercise the error paths
        "[\\x20-\\x7E]{0,30}".prop_map(|s| s.to_string()),
    ]
}

proptest! {
    #[test]
    fn no_panic_on_arbitrary_lines(lines in prop::collection::vec(arb_vm_line(), 0..50)) {
        let source = lines.join("\n");
        let _ = translate(&source, "Fuzz");
    }

    /// Well-formed VM programs translate to assembly the assembler
    /// accepts, one 16-bit word per line.
    #[test]
    fn valid_programs_assemble(
        pushes in prop::collection::vec((0u16..=32767), 1..20),
        seg_ops in prop::collection::vec(
            ("(argument|local|this|that)", 0u16..8),
            0..10
        ),
    ) {
        let mut source = String::new();
        for v in &pushes {
            source.push_str(&format!("push constant {}\n", v));
        }
        for (seg, i) in &seg_ops {
            source.push_str(&format!("pop {} {}\n", seg, i));
            source.push_str(&format!("push {} {}\n", seg, i));
        }
        source.push_str("add\n");

        let asm = translate(&source, "Fuzz").unwrap();
        let binary = assemble(&asm).expect("translator output must assemble");
        for line in binary.lines() {
            prop_assert_eq!(line.len(), 16);
            prop_assert!(line.bytes().all(|b| b == b'0' || b == b'1'));
        }
    }

    /// Parse/serialize round trip over well-formed commands.
    #[test]
    fn display_round_trips(
        seg in "(argument|local|this|that|temp|pointer|static)",
        index in 0u16..2,
        label in "[A-Za-z_][A-Za-z0-9_.:]{1,12}",
    ) {
        for text in [
            format!("push {} {}", seg, index),
            format!("pop {} {}", seg, index),
            format!("label {}", label),
            format!("goto {}", label),
            format!("if-goto {}", label),
        ] {
            let cmd = parse_line(&text, 1, "Fuzz.vm").unwrap().unwrap();
            prop_assert_eq!(cmd.to_string(), text);
        }
    }

    #[test]
    fn relational_labels_never_collide(n in 1usize..20) {
        let source = "push constant 1\npush constant 2\nlt\n".repeat(n);
        let asm = translate(&source, "Fuzz").unwrap();

        let mut seen = std::collections::HashSet::new();
        for line in asm.lines() {
            if line.starts_with('(') {
                prop_assert!(seen.insert(line.to_string()), "duplicate label {}", line);
            }
        }
    }
}
