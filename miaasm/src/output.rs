use crate::assemble::{Program, MEM_SIZE};

/// Render the 256-word program memory as a `.mia` dump: instruction words
/// from address zero, zero fill, and the variable region counting down from
/// its base (last-declared variable lowest). The reference-machine snapshot
/// block is appended unchanged; it describes the fixed microprogram and
/// register state the lab environment expects, not the assembled program.
pub fn render_dump(program: &Program) -> String {
    let mut lines = Vec::with_capacity(MEM_SIZE);

    for (addr, word) in program.instruction_words.iter().enumerate() {
        lines.push(format!("{addr:02x}: {word:04x}"));
    }

    let count = program.variable_values.len();
    let floor = program
        .variable_base_address
        .filter(|_| count > 0)
        .map(|base| (usize::from(base) + 1).saturating_sub(count));

    if let Some(floor) = floor {
        for addr in program.instruction_words.len()..floor {
            lines.push(format!("{addr:02x}: 0000"));
        }
        for (offset, value) in program.variable_values.iter().rev().enumerate() {
            lines.push(format!("{:02x}: {value:04x}", floor + offset));
        }
        for addr in (floor + count)..MEM_SIZE {
            lines.push(format!("{addr:02x}: 0000"));
        }
    } else {
        for addr in program.instruction_words.len()..MEM_SIZE {
            lines.push(format!("{addr:02x}: 0000"));
        }
    }

    let mut out = String::from("PM:\n");
    out.push_str(&lines.join("\n"));
    out.push_str(REFERENCE_TAIL);
    out
}

/// Fixed snapshot of the reference machine appended to every dump file.
const REFERENCE_TAIL: &str = "

MyM:
00: 00f8000
01: 008a000
02: 0004100
03: 0078080
04: 00fa080
05: 0078000
06: 00b8080
07: 0240000
08: 1184000
09: 0138080
0a: 00b0180
0b: 0190180
0c: 0380000
0d: 08b0000
0e: 0130180
0f: 0380000
10: 0ab0000
11: 0130180
12: 0380000
13: 0cb0000
14: 0130180
15: 0041000
16: 0380000
17: 1a00800
18: 000061a
19: 0000297
1a: 0130180
1b: 02c0000
1c: 0840000
1d: 0118180
1e: 02c0420
1f: 0840000
20: 0118180
21: 0000780
22: 0380000
23: 0a80180
24: 02c0429
25: 00004a8
26: 00005aa
27: 00002a9
28: 000072a
29: 0840000
2a: 0118180
2b: 02c022d
2c: 0840000
2d: 0118180
2e: 0000000
2f: 0000000
30: 0000000
31: 0000000
32: 0000000
33: 0000000
34: 0000000
35: 0000000
36: 0000000
37: 0000000
38: 0000000
39: 0000000
3a: 0000000
3b: 0000000
3c: 0000000
3d: 0000000
3e: 0000000
3f: 0000000
40: 0000000
41: 0000000
42: 0000000
43: 0000000
44: 0000000
45: 0000000
46: 0000000
47: 0000000
48: 0000000
49: 0000000
4a: 0000000
4b: 0000000
4c: 0000000
4d: 0000000
4e: 0000000
4f: 0000000
50: 0000000
51: 0000000
52: 0000000
53: 0000000
54: 0000000
55: 0000000
56: 0000000
57: 0000000
58: 0000000
59: 0000000
5a: 0000000
5b: 0000000
5c: 0000000
5d: 0000000
5e: 0000000
5f: 0000000
60: 0000000
61: 0000000
62: 0000000
63: 0000000
64: 0000000
65: 0000000
66: 0000000
67: 0000000
68: 0000000
69: 0000000
6a: 0000000
6b: 0000000
6c: 0000000
6d: 0000000
6e: 0000000
6f: 0000000
70: 0000000
71: 0000000
72: 0000000
73: 0000000
74: 0000000
75: 0000000
76: 0000000
77: 0000000
78: 0000000
79: 0000000
7a: 0000000
7b: 0000000
7c: 0000000
7d: 0000000
7e: 0000000
7f: 0000000

K1:
00: 0a
01: 0b
02: 0c
03: 0f
04: 12
05: 15
06: 1b
07: 1e
08: 21
09: 22
0a: 24
0b: 2b
0c: 00
0d: 00
0e: 00
0f: 00

K2:
00: 03
01: 04
02: 05
03: 07

PC:
00

ASR:
00

AR:
0000

HR:
0000

GR0:
0008

GR1:
0000

GR2:
0000

GR3:
0000

IR:
0000

MyPC:
00

SMyPC:
00

LC:
00

O_flag:

C_flag:

N_flag:

Z_flag:

L_flag:
End_of_dump_file
";
