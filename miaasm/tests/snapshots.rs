use miaasm::{assemble, assemble_program};

fn hex_words(words: &[u16]) -> String {
    words
        .iter()
        .map(|w| format!("{w:04x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn test_immediate_load() {
    let program = assemble("LOAD 0 #5\nHALT").unwrap();

    insta::assert_snapshot!(hex_words(&program.instruction_words), @"0100 0005 8000");
}

#[test]
fn test_forward_branch() {
    let program = assemble("BRA %end\nHALT\n%end\nHALT").unwrap();

    insta::assert_snapshot!(hex_words(&program.instruction_words), @"6001 8000 8000");
}

#[test]
fn test_addressing_modes() {
    let source = "@VAR_ADDRESS=0xFF\n:a = 7\nLOAD 0 a\nLOAD 1 [[a]]\nLOAD 2 [a,]\nLSR 2 #8\nHALT";
    let program = assemble(source).unwrap();

    insta::assert_snapshot!(hex_words(&program.instruction_words), @"00ff 06ff 0bff 5808 8000");
}

#[test]
fn test_dump_head() {
    let dump = assemble_program("LOAD 0 #5\nHALT").unwrap();
    let head = dump.lines().take(5).collect::<Vec<_>>().join("\n");

    insta::assert_snapshot!(head, @r###"
    PM:
    00: 0100
    01: 0005
    02: 8000
    03: 0000
    "###);
}
