use thiserror::Error;

use crate::opcode::Opcode;

/// Errors surfaced to the caller of the chipset api.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ChipError {
    #[error("The rom is {size} bytes long, but only {max} bytes fit into memory.")]
    RomTooLarge { size: usize, max: usize },
    #[error("Unable to read the rom archive '{0}'.")]
    Archive(String),
}

/// Anomalies found while executing a rom. These never stop the chipset, they are
/// reported after the documented recovery was applied.
#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum ProcessError {
    #[error("Invalid opcode state '{0}'.")]
    Opcode(#[from] OpcodeError),
    #[error("Invalid stack state '{0}'.")]
    Stack(#[from] StackError),
    #[error("Memory access at {address:#06X} is out of bounds.")]
    OutOfBounds { address: usize },
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum OpcodeError {
    #[error("An unsupported opcode was used {0:#06X?}.")]
    InvalidOpcode(Opcode),
    #[error("Pointer location invalid there can not be an opcode at {pointer}, if data len is {len}")]
    MemoryInvalid { pointer: usize, len: usize },
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum StackError {
    #[error("Stack is full!")]
    Full,
    #[error("Stack is empty!")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ChipError::RomTooLarge {
            size: 4000,
            max: 3584,
        };
        assert_eq!(
            "The rom is 4000 bytes long, but only 3584 bytes fit into memory.",
            err.to_string()
        );

        let err: ProcessError = OpcodeError::InvalidOpcode(0x00EA).into();
        assert_eq!(
            "Invalid opcode state 'An unsupported opcode was used 0x00EA.'.",
            err.to_string()
        );

        let err: ProcessError = StackError::Empty.into();
        assert_eq!("Invalid stack state 'Stack is empty!'.", err.to_string());
    }
}
