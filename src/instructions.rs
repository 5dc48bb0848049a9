// typed instruction ir and the gate catalogue.
//
// the decoder produces these values; the executor consumes them. a parameter
// cell is always 8 bytes on the wire and carries no type tag - the slot it
// fills (gate angle vs qubit count) decides how the bits are read back.

use std::fmt;

// instruction-kind tags on the wire.
pub const KIND_NOP: u8 = 0;
pub const KIND_PRIMITIVE: u8 = 1;
pub const KIND_STANDARD_GATE: u8 = 2;

// one 8-byte parameter cell, stored as raw bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionParam(u64);

impl InstructionParam {
    pub fn from_u64(value: u64) -> Self {
        InstructionParam(value)
    }

    pub fn from_f64(value: f64) -> Self {
        InstructionParam(value.to_bits())
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from_bits(self.0)
    }

    pub fn to_le_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        InstructionParam(u64::from_le_bytes(bytes))
    }
}

// primitive opcodes. everything above `Measure` is a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PrimitiveOpcode {
    Alloc = 0,
    Reset = 1,
    Measure = 2,
}

impl PrimitiveOpcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PrimitiveOpcode::Alloc),
            1 => Some(PrimitiveOpcode::Reset),
            2 => Some(PrimitiveOpcode::Measure),
            _ => None,
        }
    }

    pub fn ident(self) -> &'static str {
        match self {
            PrimitiveOpcode::Alloc => "Alloc",
            PrimitiveOpcode::Reset => "Reset",
            PrimitiveOpcode::Measure => "Measure",
        }
    }
}

// the full gate catalogue, in wire-id order. the executor only runs a
// strict subset of these; the rest exist so the compiler handshake can
// ask about them by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StandardGate {
    I = 0,
    H,
    X,
    Y,
    Z,
    XPow,
    YPow,
    ZPow,
    S,
    Sd,
    T,
    Td,
    V,
    Vd,
    P,
    Rx,
    Ry,
    Rz,
    Rn,
    U,
    Cx,
    Cy,
    Cz,
    Ch,
    Cp,
    Swp,
    SSwp,
    SSwpd,
    ISwp,
    ISwpd,
    SiSwp,
    SiSwpd,
    Can,
    Ccx,
    CSwp,
}

// identifier strings, indexed by wire id.
pub const GATE_IDENTS: [&str; 35] = [
    "I", "H", "X", "Y", "Z", "XPOW", "YPOW", "ZPOW", "S", "SD", "T", "TD", "V", "VD", "P", "RX",
    "RY", "RZ", "RN", "U", "CX", "CY", "CZ", "CH", "CP", "SWP", "SSWP", "SSWPD", "ISWP", "ISWPD",
    "SISWP", "SISWPD", "CAN", "CCX", "CSWP",
];

// how the executor realizes a gate, or that it cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateClass {
    // single-qubit, no parameters
    FixedSingle,
    // single-qubit, one angle parameter
    RotationSingle,
    // two-qubit, no parameters
    FixedDouble,
    // two-qubit, one angle parameter
    RotationDouble,
    // three-qubit, no parameters
    FixedTriple,
    // in the catalogue but outside the execution subset
    Unsupported,
}

// expected shape of a standard-gate instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDescriptor {
    pub num_params: usize,
    pub num_targets: usize,
    pub class: GateClass,
}

const fn descriptor(num_params: usize, num_targets: usize, class: GateClass) -> GateDescriptor {
    GateDescriptor {
        num_params,
        num_targets,
        class,
    }
}

impl StandardGate {
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => StandardGate::I,
            1 => StandardGate::H,
            2 => StandardGate::X,
            3 => StandardGate::Y,
            4 => StandardGate::Z,
            5 => StandardGate::XPow,
            6 => StandardGate::YPow,
            7 => StandardGate::ZPow,
            8 => StandardGate::S,
            9 => StandardGate::Sd,
            10 => StandardGate::T,
            11 => StandardGate::Td,
            12 => StandardGate::V,
            13 => StandardGate::Vd,
            14 => StandardGate::P,
            15 => StandardGate::Rx,
            16 => StandardGate::Ry,
            17 => StandardGate::Rz,
            18 => StandardGate::Rn,
            19 => StandardGate::U,
            20 => StandardGate::Cx,
            21 => StandardGate::Cy,
            22 => StandardGate::Cz,
            23 => StandardGate::Ch,
            24 => StandardGate::Cp,
            25 => StandardGate::Swp,
            26 => StandardGate::SSwp,
            27 => StandardGate::SSwpd,
            28 => StandardGate::ISwp,
            29 => StandardGate::ISwpd,
            30 => StandardGate::SiSwp,
            31 => StandardGate::SiSwpd,
            32 => StandardGate::Can,
            33 => StandardGate::Ccx,
            34 => StandardGate::CSwp,
            _ => return None,
        })
    }

    pub fn from_ident(ident: &str) -> Option<Self> {
        GATE_IDENTS
            .iter()
            .position(|&name| name == ident)
            .and_then(|id| StandardGate::from_id(id as u8))
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn ident(self) -> &'static str {
        GATE_IDENTS[self as usize]
    }

    // arity pair plus execution class. arities for the non-executable
    // members follow their textbook definitions so the dispatcher can
    // still report shape errors before rejecting them.
    pub fn descriptor(self) -> GateDescriptor {
        use GateClass::*;
        match self {
            StandardGate::I => descriptor(0, 1, FixedSingle),
            StandardGate::H => descriptor(0, 1, FixedSingle),
            StandardGate::X => descriptor(0, 1, FixedSingle),
            StandardGate::Y => descriptor(0, 1, FixedSingle),
            StandardGate::Z => descriptor(0, 1, FixedSingle),
            StandardGate::XPow => descriptor(1, 1, Unsupported),
            StandardGate::YPow => descriptor(1, 1, Unsupported),
            StandardGate::ZPow => descriptor(1, 1, Unsupported),
            StandardGate::S => descriptor(0, 1, FixedSingle),
            StandardGate::Sd => descriptor(0, 1, FixedSingle),
            StandardGate::T => descriptor(0, 1, FixedSingle),
            StandardGate::Td => descriptor(0, 1, FixedSingle),
            StandardGate::V => descriptor(0, 1, Unsupported),
            StandardGate::Vd => descriptor(0, 1, Unsupported),
            StandardGate::P => descriptor(1, 1, RotationSingle),
            StandardGate::Rx => descriptor(1, 1, RotationSingle),
            StandardGate::Ry => descriptor(1, 1, RotationSingle),
            StandardGate::Rz => descriptor(1, 1, RotationSingle),
            StandardGate::Rn => descriptor(4, 1, Unsupported),
            StandardGate::U => descriptor(3, 1, Unsupported),
            StandardGate::Cx => descriptor(0, 2, FixedDouble),
            StandardGate::Cy => descriptor(0, 2, FixedDouble),
            StandardGate::Cz => descriptor(0, 2, FixedDouble),
            StandardGate::Ch => descriptor(0, 2, Unsupported),
            StandardGate::Cp => descriptor(1, 2, RotationDouble),
            StandardGate::Swp => descriptor(0, 2, FixedDouble),
            StandardGate::SSwp => descriptor(0, 2, FixedDouble),
            StandardGate::SSwpd => descriptor(0, 2, Unsupported),
            StandardGate::ISwp => descriptor(0, 2, Unsupported),
            StandardGate::ISwpd => descriptor(0, 2, Unsupported),
            StandardGate::SiSwp => descriptor(0, 2, Unsupported),
            StandardGate::SiSwpd => descriptor(0, 2, Unsupported),
            StandardGate::Can => descriptor(3, 2, Unsupported),
            StandardGate::Ccx => descriptor(0, 3, FixedTriple),
            StandardGate::CSwp => descriptor(0, 3, Unsupported),
        }
    }
}

// catalogue membership by name, advertised to the compiler front-end.
// deliberately wider than what the executor can run.
pub fn is_gate_available(ident: &str) -> bool {
    GATE_IDENTS.contains(&ident)
}

// printable name for a raw gate id, including ids outside the catalogue.
pub fn gate_ident(id: u8) -> String {
    match StandardGate::from_id(id) {
        Some(gate) => gate.ident().to_string(),
        None => format!("0x{:02X}", id),
    }
}

// one decoded instruction. the gate id is kept raw so that ids the
// catalogue does not know survive decoding and fail at dispatch instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Nop,
    Primitive {
        opcode: PrimitiveOpcode,
        params: Vec<InstructionParam>,
    },
    StandardGate {
        gate: u8,
        params: Vec<InstructionParam>,
        targets: Vec<u64>,
    },
}

impl Instruction {
    // appends the wire encoding of this instruction. kept next to the
    // decoder's field order so the two cannot drift apart.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Instruction::Nop => out.push(KIND_NOP),
            Instruction::Primitive { opcode, params } => {
                out.push(KIND_PRIMITIVE);
                out.push(*opcode as u8);
                out.push(params.len() as u8);
                for param in params {
                    out.extend_from_slice(&param.to_le_bytes());
                }
            }
            Instruction::StandardGate {
                gate,
                params,
                targets,
            } => {
                out.push(KIND_STANDARD_GATE);
                out.push(*gate);
                out.push(params.len() as u8);
                for param in params {
                    out.extend_from_slice(&param.to_le_bytes());
                }
                out.push(targets.len() as u8);
                for target in targets {
                    out.extend_from_slice(&target.to_le_bytes());
                }
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Nop => write!(f, "Nop"),
            Instruction::Primitive { opcode, params } => {
                write!(f, "{}", opcode.ident())?;
                for param in params {
                    write!(f, " {}", param.as_u64())?;
                }
                Ok(())
            }
            Instruction::StandardGate {
                gate,
                params,
                targets,
            } => {
                write!(f, "{}", gate_ident(*gate))?;
                // parameters render as floats; every executable
                // parametric gate takes angles
                for param in params {
                    write!(f, " {}", param.as_f64())?;
                }
                for target in targets {
                    write!(f, " q{}", target)?;
                }
                Ok(())
            }
        }
    }
}
