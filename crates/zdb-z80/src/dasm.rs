//! Table-driven Z80 disassembler.
//!
//! Templates carry placeholders for operand bytes: `{n}` immediate byte,
//! `{nn}` immediate word, `{d}` signed index displacement, `{e}` relative
//! jump rendered as its absolute target. Instruction length is derived from
//! the placeholders, so the renderer and the length can never disagree.

use crate::bus::Bus;

/// One decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembled {
    pub mnemonic: String,
    pub length: u8,
    pub tstates: u8,
}

const R: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];
const ALU: [&str; 8] = [
    "ADD A,", "ADC A,", "SUB ", "SBC A,", "AND ", "XOR ", "OR ", "CP ",
];
const ROT: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SLL", "SRL"];
const RP: [&str; 4] = ["BC", "DE", "HL", "SP"];

/// Opcodes 0x00-0x3F: (template, T-states).
static X0: [(&str, u8); 64] = [
    ("NOP", 4),
    ("LD BC,{nn}", 10),
    ("LD (BC),A", 7),
    ("INC BC", 6),
    ("INC B", 4),
    ("DEC B", 4),
    ("LD B,{n}", 7),
    ("RLCA", 4),
    ("EX AF,AF'", 4),
    ("ADD HL,BC", 11),
    ("LD A,(BC)", 7),
    ("DEC BC", 6),
    ("INC C", 4),
    ("DEC C", 4),
    ("LD C,{n}", 7),
    ("RRCA", 4),
    ("DJNZ {e}", 13),
    ("LD DE,{nn}", 10),
    ("LD (DE),A", 7),
    ("INC DE", 6),
    ("INC D", 4),
    ("DEC D", 4),
    ("LD D,{n}", 7),
    ("RLA", 4),
    ("JR {e}", 12),
    ("ADD HL,DE", 11),
    ("LD A,(DE)", 7),
    ("DEC DE", 6),
    ("INC E", 4),
    ("DEC E", 4),
    ("LD E,{n}", 7),
    ("RRA", 4),
    ("JR NZ,{e}", 12),
    ("LD HL,{nn}", 10),
    ("LD ({nn}),HL", 16),
    ("INC HL", 6),
    ("INC H", 4),
    ("DEC H", 4),
    ("LD H,{n}", 7),
    ("DAA", 4),
    ("JR Z,{e}", 12),
    ("ADD HL,HL", 11),
    ("LD HL,({nn})", 16),
    ("DEC HL", 6),
    ("INC L", 4),
    ("DEC L", 4),
    ("LD L,{n}", 7),
    ("CPL", 4),
    ("JR NC,{e}", 12),
    ("LD SP,{nn}", 10),
    ("LD ({nn}),A", 13),
    ("INC SP", 6),
    ("INC (HL)", 11),
    ("DEC (HL)", 11),
    ("LD (HL),{n}", 10),
    ("SCF", 4),
    ("JR C,{e}", 12),
    ("ADD HL,SP", 11),
    ("LD A,({nn})", 13),
    ("DEC SP", 6),
    ("INC A", 4),
    ("DEC A", 4),
    ("LD A,{n}", 7),
    ("CCF", 4),
];

/// Opcodes 0xC0-0xFF: (template, T-states). Prefix bytes carry an empty
/// template and are resolved by the dispatcher.
static X3: [(&str, u8); 64] = [
    ("RET NZ", 11),
    ("POP BC", 10),
    ("JP NZ,{nn}", 10),
    ("JP {nn}", 10),
    ("CALL NZ,{nn}", 17),
    ("PUSH BC", 11),
    ("ADD A,{n}", 7),
    ("RST 0x00", 11),
    ("RET Z", 11),
    ("RET", 10),
    ("JP Z,{nn}", 10),
    ("", 0), // CB prefix
    ("CALL Z,{nn}", 17),
    ("CALL {nn}", 17),
    ("ADC A,{n}", 7),
    ("RST 0x08", 11),
    ("RET NC", 11),
    ("POP DE", 10),
    ("JP NC,{nn}", 10),
    ("OUT ({n}),A", 11),
    ("CALL NC,{nn}", 17),
    ("PUSH DE", 11),
    ("SUB {n}", 7),
    ("RST 0x10", 11),
    ("RET C", 11),
    ("EXX", 4),
    ("JP C,{nn}", 10),
    ("IN A,({n})", 11),
    ("CALL C,{nn}", 17),
    ("", 0), // DD prefix
    ("SBC A,{n}", 7),
    ("RST 0x18", 11),
    ("RET PO", 11),
    ("POP HL", 10),
    ("JP PO,{nn}", 10),
    ("EX (SP),HL", 19),
    ("CALL PO,{nn}", 17),
    ("PUSH HL", 11),
    ("AND {n}", 7),
    ("RST 0x20", 11),
    ("RET PE", 11),
    ("JP (HL)", 4),
    ("JP PE,{nn}", 10),
    ("EX DE,HL", 4),
    ("CALL PE,{nn}", 17),
    ("", 0), // ED prefix
    ("XOR {n}", 7),
    ("RST 0x28", 11),
    ("RET P", 11),
    ("POP AF", 10),
    ("JP P,{nn}", 10),
    ("DI", 4),
    ("CALL P,{nn}", 17),
    ("PUSH AF", 11),
    ("OR {n}", 7),
    ("RST 0x30", 11),
    ("RET M", 11),
    ("LD SP,HL", 6),
    ("JP M,{nn}", 10),
    ("EI", 4),
    ("CALL M,{nn}", 17),
    ("", 0), // FD prefix
    ("CP {n}", 7),
    ("RST 0x38", 11),
];

fn main_template(opcode: u8) -> (String, u8) {
    match opcode >> 6 {
        0 => {
            let (template, tstates) = X0[usize::from(opcode)];
            (template.to_string(), tstates)
        }
        1 => {
            if opcode == 0x76 {
                return ("HALT".to_string(), 4);
            }
            let dst = R[usize::from((opcode >> 3) & 7)];
            let src = R[usize::from(opcode & 7)];
            let tstates = if dst == "(HL)" || src == "(HL)" { 7 } else { 4 };
            (format!("LD {dst},{src}"), tstates)
        }
        2 => {
            let op = ALU[usize::from((opcode >> 3) & 7)];
            let src = R[usize::from(opcode & 7)];
            let tstates = if src == "(HL)" { 7 } else { 4 };
            (format!("{op}{src}"), tstates)
        }
        _ => {
            let (template, tstates) = X3[usize::from(opcode & 0x3F)];
            (template.to_string(), tstates)
        }
    }
}

fn cb_template(sub: u8, operand: &str) -> String {
    let bit = (sub >> 3) & 7;
    match sub >> 6 {
        0 => format!("{} {operand}", ROT[usize::from((sub >> 3) & 7)]),
        1 => format!("BIT {bit},{operand}"),
        2 => format!("RES {bit},{operand}"),
        _ => format!("SET {bit},{operand}"),
    }
}

fn ed_template(sub: u8) -> (String, u8) {
    let rp = RP[usize::from((sub >> 4) & 3)];
    match sub {
        0x42 | 0x52 | 0x62 | 0x72 => (format!("SBC HL,{rp}"), 15),
        0x4A | 0x5A | 0x6A | 0x7A => (format!("ADC HL,{rp}"), 15),
        0x43 | 0x53 | 0x63 | 0x73 => (format!("LD ({{nn}}),{rp}"), 20),
        0x4B | 0x5B | 0x6B | 0x7B => (format!("LD {rp},({{nn}})"), 20),
        0x44 => ("NEG".to_string(), 8),
        0x45 => ("RETN".to_string(), 14),
        0x4D => ("RETI".to_string(), 14),
        0x46 => ("IM 0".to_string(), 8),
        0x56 => ("IM 1".to_string(), 8),
        0x5E => ("IM 2".to_string(), 8),
        0x47 => ("LD I,A".to_string(), 9),
        0x4F => ("LD R,A".to_string(), 9),
        0x57 => ("LD A,I".to_string(), 9),
        0x5F => ("LD A,R".to_string(), 9),
        0x67 => ("RRD".to_string(), 18),
        0x6F => ("RLD".to_string(), 18),
        0xA0 => ("LDI".to_string(), 16),
        0xA8 => ("LDD".to_string(), 16),
        0xB0 => ("LDIR".to_string(), 16),
        0xB8 => ("LDDR".to_string(), 16),
        0xA1 => ("CPI".to_string(), 16),
        0xA9 => ("CPD".to_string(), 16),
        0xB1 => ("CPIR".to_string(), 16),
        0xB9 => ("CPDR".to_string(), 16),
        _ => ("NOP*".to_string(), 8),
    }
}

/// Renders a template, consuming operand bytes from `cursor` in placeholder
/// order, and returns the mnemonic plus the number of operand bytes used.
fn render<B: Bus>(template: &str, bus: &B, mut cursor: u16) -> (String, u8) {
    let mut out = String::with_capacity(template.len() + 8);
    let mut used = 0u8;
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let close = rest[open..].find('}').map(|i| open + i).unwrap_or(open);
        match &rest[open..=close] {
            "{nn}" => {
                let word = bus.read_word(cursor);
                cursor = cursor.wrapping_add(2);
                used += 2;
                out.push_str(&format!("0x{word:04X}"));
            }
            "{n}" => {
                let byte = bus.read(cursor);
                cursor = cursor.wrapping_add(1);
                used += 1;
                out.push_str(&format!("0x{byte:02X}"));
            }
            "{d}" => {
                let disp = bus.read(cursor) as i8;
                cursor = cursor.wrapping_add(1);
                used += 1;
                if disp < 0 {
                    out.push_str(&format!("-0x{:02X}", i16::from(disp).unsigned_abs()));
                } else {
                    out.push_str(&format!("+0x{disp:02X}"));
                }
            }
            "{e}" => {
                let disp = bus.read(cursor) as i8;
                cursor = cursor.wrapping_add(1);
                used += 1;
                let target = cursor.wrapping_add(disp as u16);
                out.push_str(&format!("0x{target:04X}"));
            }
            other => out.push_str(other),
        }
        rest = &rest[close + 1..];
    }
    out.push_str(rest);
    (out, used)
}

fn indexed(template: &str, index: &str) -> (String, bool) {
    if template.contains("(HL)") {
        (template.replace("(HL)", &format!("({index}{{d}})")), true)
    } else {
        (template.replace("HL", index), false)
    }
}

/// Disassembles the instruction at `addr`.
pub fn disassemble<B: Bus>(bus: &B, addr: u16) -> Disassembled {
    let opcode = bus.read(addr);
    match opcode {
        0xCB => {
            let sub = bus.read(addr.wrapping_add(1));
            let operand = R[usize::from(sub & 7)];
            let tstates = if operand == "(HL)" { 15 } else { 8 };
            Disassembled {
                mnemonic: cb_template(sub, operand),
                length: 2,
                tstates,
            }
        }
        0xED => {
            let sub = bus.read(addr.wrapping_add(1));
            let (template, tstates) = ed_template(sub);
            let (mnemonic, used) = render(&template, bus, addr.wrapping_add(2));
            Disassembled {
                mnemonic,
                length: 2 + used,
                tstates,
            }
        }
        0xDD | 0xFD => {
            let index = if opcode == 0xDD { "IX" } else { "IY" };
            let sub = bus.read(addr.wrapping_add(1));
            if sub == 0xCB {
                // DD CB d sub: displacement precedes the final opcode.
                let operand = format!("({index}{{d}})");
                let mnemonic = cb_template(bus.read(addr.wrapping_add(3)), &operand);
                let (mnemonic, _) = render(&mnemonic, bus, addr.wrapping_add(2));
                return Disassembled {
                    mnemonic,
                    length: 4,
                    tstates: 23,
                };
            }
            if matches!(sub, 0xDD | 0xED | 0xFD) {
                // Stacked prefix: the first prefix is inert.
                let inner = disassemble(bus, addr.wrapping_add(1));
                return Disassembled {
                    mnemonic: inner.mnemonic,
                    length: inner.length.saturating_add(1),
                    tstates: inner.tstates.saturating_add(4),
                };
            }
            let (template, tstates) = main_template(sub);
            let (template, uses_disp) = indexed(&template, index);
            let (mnemonic, used) = render(&template, bus, addr.wrapping_add(2));
            Disassembled {
                mnemonic,
                length: 2 + used,
                tstates: tstates.saturating_add(if uses_disp { 12 } else { 4 }),
            }
        }
        _ => {
            let (template, tstates) = main_template(opcode);
            let (mnemonic, used) = render(&template, bus, addr.wrapping_add(1));
            Disassembled {
                mnemonic,
                length: 1 + used,
                tstates,
            }
        }
    }
}
