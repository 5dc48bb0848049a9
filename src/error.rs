use thiserror::Error;

// every failure the backend can surface, one variant per error kind.
// the wire contract only carries the numeric code from `code()`; the
// messages exist for diagnostic logging.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExecError {
    // the byte stream could not be parsed into instructions. `offset` is
    // the position of the byte where decoding gave up.
    #[error("bytecode parse error at byte {offset}: {message}")]
    BytecodeParse { message: String, offset: usize },

    // the program broke an execution-time rule (uninitialized register,
    // qubit address out of range, malformed alloc).
    #[error("{0}")]
    QuantumProgramExecute(String),

    #[error("gate {gate} expected {expected} parameters, got {actual} parameters")]
    MissingOrExtraParameter {
        gate: String,
        expected: usize,
        actual: usize,
    },

    #[error("the target size of gate {gate} is {expected}, got {actual}")]
    TargetSizeNotMatch {
        gate: String,
        expected: usize,
        actual: usize,
    },

    // catalogue member outside the execution subset, or a gate id the
    // catalogue does not know at all.
    #[error("unsupported gate {0}")]
    UnsupportedGate(String),

    // anything that escaped classification.
    #[error("unknown error: {0}")]
    Internal(String),
}

impl ExecError {
    // the error byte of the external execute result. 0 is reserved for
    // success and never produced here.
    pub fn code(&self) -> u8 {
        match self {
            ExecError::BytecodeParse { .. } => 2,
            ExecError::QuantumProgramExecute(_)
            | ExecError::MissingOrExtraParameter { .. }
            | ExecError::TargetSizeNotMatch { .. }
            | ExecError::UnsupportedGate(_) => 1,
            ExecError::Internal(_) => 255,
        }
    }
}
