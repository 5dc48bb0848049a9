// binary bytecode decoder.
//
// the stream is a concatenation of variable-length instructions, all
// multi-byte fields little-endian. decoding is purely structural: field
// widths and tag ranges are checked here, instruction shape (arity against
// the catalogue) is the dispatcher's job. per instruction:
//
//   kind tag (1 byte): 0 = nop, 1 = primitive, 2 = standard gate
//   primitive:     opcode (1) | param count (1) | params (8 each)
//   standard gate: gate id (1) | param count (1) | params (8 each)
//                  | target count (1) | targets (8 each)
//
// unknown gate ids are not a decode error - the byte is consumed and kept
// raw, and the dispatcher rejects it if the catalogue has no entry.

use crate::error::ExecError;
use crate::instructions::{
    Instruction, InstructionParam, PrimitiveOpcode, KIND_NOP, KIND_PRIMITIVE, KIND_STANDARD_GATE,
};
use log::debug;

// cursor over the raw stream, tracking the offset for error reports.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn truncated(&self) -> ExecError {
        ExecError::BytecodeParse {
            message: "unexpected end of bytecode".to_string(),
            offset: self.pos,
        }
    }

    fn read_u8(&mut self) -> Result<u8, ExecError> {
        let byte = *self.bytes.get(self.pos).ok_or_else(|| self.truncated())?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_u64(&mut self) -> Result<u64, ExecError> {
        if self.pos + 8 > self.bytes.len() {
            // report the position of the first missing byte
            self.pos = self.bytes.len();
            return Err(self.truncated());
        }
        let mut cell = [0u8; 8];
        cell.copy_from_slice(&self.bytes[self.pos..self.pos + 8]);
        self.pos += 8;
        Ok(u64::from_le_bytes(cell))
    }

    fn read_param(&mut self) -> Result<InstructionParam, ExecError> {
        Ok(InstructionParam::from_u64(self.read_u64()?))
    }
}

// renders a byte run as space-separated hex, for debug dumps.
fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<Vec<_>>()
        .join(" ")
}

// parses the whole stream into an instruction list, preserving order.
pub fn decode(bytes: &[u8]) -> Result<Vec<Instruction>, ExecError> {
    if log::log_enabled!(log::Level::Debug) && !bytes.is_empty() {
        debug!("bytecode: {}", hex_bytes(bytes));
    }

    let mut reader = Reader::new(bytes);
    let mut instructions = Vec::new();

    while !reader.is_empty() {
        let start = reader.pos;
        let kind = reader.read_u8()?;
        let instruction = match kind {
            KIND_NOP => Instruction::Nop,
            KIND_PRIMITIVE => {
                // only alloc, reset and measure exist on this backend
                let raw_opcode = reader.read_u8()?;
                let opcode = PrimitiveOpcode::from_u8(raw_opcode).ok_or_else(|| {
                    ExecError::BytecodeParse {
                        message: format!("invalid primitive opcode: {}", raw_opcode),
                        offset: start + 1,
                    }
                })?;
                let count = reader.read_u8()?;
                let mut params = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    params.push(reader.read_param()?);
                }
                Instruction::Primitive { opcode, params }
            }
            KIND_STANDARD_GATE => {
                let gate = reader.read_u8()?;
                let num_params = reader.read_u8()?;
                let mut params = Vec::with_capacity(num_params as usize);
                for _ in 0..num_params {
                    params.push(reader.read_param()?);
                }
                let num_targets = reader.read_u8()?;
                let mut targets = Vec::with_capacity(num_targets as usize);
                for _ in 0..num_targets {
                    targets.push(reader.read_u64()?);
                }
                Instruction::StandardGate {
                    gate,
                    params,
                    targets,
                }
            }
            unknown => {
                return Err(ExecError::BytecodeParse {
                    message: format!("invalid instruction type: {}", unknown),
                    offset: start,
                });
            }
        };
        debug!(
            "{:40} {}",
            hex_bytes(&bytes[start..reader.pos]),
            instruction
        );
        instructions.push(instruction);
    }

    Ok(instructions)
}
