//! Opcode abstractions, functionality and constants.
use std::convert::TryFrom;

use crate::{
    definitions::memory,
    OpcodeError, ProcessError,
};

/// the base mask used for generating all the other sub masks
pub(crate) const OPCODE_MASK_FFFF: u16 = u16::MAX;

/// the mask for the first twelve bits
pub(crate) const OPCODE_MASK_FFF0: u16 = OPCODE_MASK_FFFF << 4;

/// the mask for the first eight bits
pub(crate) const OPCODE_MASK_FF00: u16 = OPCODE_MASK_FFFF << 8;

/// the mask for the first four bits
pub(crate) const OPCODE_MASK_F000: u16 = OPCODE_MASK_FFFF << 12;

/// the mask for the last four bits
pub(crate) const OPCODE_MASK_000F: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FFF0;

/// the mask for the last eight bits
pub(crate) const OPCODE_MASK_00FF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FF00;

/// the mask for the last twelve bits
pub(crate) const OPCODE_MASK_0FFF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_F000;

/// the size of a single byte
const BYTE_SIZE: u16 = 0x8;

/// a wrapper type for u16 to make it clear what is meant to be used
pub type Opcode = u16;

/// will build an opcode from data and the given point
/// # Arguments
///
/// - `data` - A slice of u8 data entries used to generate the opcodes
/// - `pointer` - Where in the data the opcode shall be extracted, so `pointer` and `pointer + 1` make
/// the opcode up
///
/// # Example
/// ```rust
/// # use chip::opcode::*;
/// # use chip::OpcodeError;
///  const OPCODES: [Opcode; 2] = [0x00EE, 0x1EDA];
///  const SPLIT_OPCODE: [u8; 4] = [0x00, 0xEE, 0x1E, 0xDA];
///  for (i, val) in OPCODES.iter().enumerate() {
///      let opcode = build_opcode(&SPLIT_OPCODE, i * 2).expect("This will work.");
///      assert_eq!(opcode, *val);
///  }
/// # let pointer = 3;
/// # let err = OpcodeError::MemoryInvalid {pointer, len: SPLIT_OPCODE.len() };
/// # assert_eq!(
/// #    Err(err),
/// #    build_opcode(&SPLIT_OPCODE, pointer)
/// # );
/// ```
pub fn build_opcode(data: &[u8], pointer: usize) -> Result<Opcode, OpcodeError> {
    // controlling that there is no illegal access here
    if pointer + 1 < data.len() {
        Ok(Opcode::from_be_bytes([data[pointer], data[pointer + 1]]))
    } else {
        Err(OpcodeError::MemoryInvalid {
            pointer,
            len: data.len(),
        })
    }
}

/// These are special traits used to filter out information
/// from opcodes
pub trait OpcodeTrait {
    /// this is an opcode extractor that will return the
    /// opcode number form any opcode
    /// - `T` is the opcode type
    fn t(&self) -> usize;

    /// this is an opcode extractor for the opcode type `TNNN`
    /// - `T` is the opcode type
    /// - `NNN` is an address
    fn nnn(&self) -> usize;

    /// this is an opcode extractor for the opcode type `TXNN`
    /// - `T` is the opcode type
    /// - `X` is a register index
    /// - `NN` is a constant
    fn xnn(&self) -> (usize, u8);

    /// this is an opcode extractor for the opcode type `TXYN`
    /// - `T` is the opcode type
    /// - `X` is a register index
    /// - `Y` is a register index
    /// - `N` is a constant or opcode subtype
    fn xyn(&self) -> (usize, usize, usize);

    /// this is an opcode extractor for the opcode type `TXYT`
    /// - `T` is the opcode type
    /// - `X` is a register index
    /// - `Y` is a register index
    fn xy(&self) -> (usize, usize);

    /// this is an opcode extractor for the opcode type `TXTT`
    /// - `T` is the opcode type
    /// - `X` is a register index
    fn x(&self) -> usize;
}

impl OpcodeTrait for Opcode {
    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.t(), 0x1000);
    /// ```
    fn t(&self) -> usize {
        (self & OPCODE_MASK_F000) as usize
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.nnn(), 0xEDA)
    /// ```
    fn nnn(&self) -> usize {
        (self & OPCODE_MASK_0FFF) as usize
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.xnn(), (0xE, 0xDA));
    /// ```
    fn xnn(&self) -> (usize, u8) {
        let x = self.x();
        let nn = (self & OPCODE_MASK_00FF) as u8;
        (x, nn)
    }

    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.xyn(), (0xE, 0xD, 0xA));
    /// ```
    fn xyn(&self) -> (usize, usize, usize) {
        let (x, y) = self.xy();
        let n = (self & OPCODE_MASK_000F) as usize;
        (x, y, n)
    }

    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.xy(), (0xE, 0xD));
    /// ```
    fn xy(&self) -> (usize, usize) {
        let x = self.x();
        const MASK: u16 = OPCODE_MASK_00FF ^ OPCODE_MASK_000F;
        const NIBBLE: u16 = BYTE_SIZE / 2;
        let y = ((self & MASK) >> NIBBLE) as usize;
        (x, y)
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.x(), 0xE);
    /// ```
    fn x(&self) -> usize {
        ((self & OPCODE_MASK_0FFF & OPCODE_MASK_FF00) >> BYTE_SIZE) as usize
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Represents the program steps that the chip
/// can take.
pub enum ProgramCounterStep {
    /// Will not change the program counter
    None,
    /// Will move the program counter to the next opcode
    Next,
    /// Will skip the next opcode
    Skip,
    /// Will simply move the program counter to the given location,
    /// the location is wrapped into memory.
    Jump(usize),
}

impl ProgramCounterStep {
    /// Will return a Skip if the condition is true.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next, ProgramCounterStep::cond(false));
    /// assert_eq!(ProgramCounterStep::Skip, ProgramCounterStep::cond(true));
    /// ```
    #[inline]
    pub fn cond(cond: bool) -> Self {
        if cond {
            ProgramCounterStep::Skip
        } else {
            ProgramCounterStep::Next
        }
    }

    /// Will calculate the next program counter based of the current one.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next.apply(0x200), 0x202);
    /// assert_eq!(ProgramCounterStep::Skip.apply(0x200), 0x204);
    /// assert_eq!(ProgramCounterStep::Jump(0x1004).apply(0x200), 0x004);
    /// assert_eq!(ProgramCounterStep::Skip.apply(0xFFE), 0x002);
    /// ```
    #[inline]
    pub fn apply(&self, pc: usize) -> usize {
        let next = match *self {
            ProgramCounterStep::None => pc,
            ProgramCounterStep::Next => pc + memory::opcodes::SIZE,
            ProgramCounterStep::Skip => pc + 2 * memory::opcodes::SIZE,
            ProgramCounterStep::Jump(pointer) => pointer,
        };
        next & memory::ADDRESS_MASK
    }
}

/// The sub operations of the `8XYN` family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    /// `8XY0` - `Vx = Vy`
    Assign,
    /// `8XY1` - `Vx |= Vy`
    Or,
    /// `8XY2` - `Vx &= Vy`
    And,
    /// `8XY3` - `Vx ^= Vy`
    Xor,
    /// `8XY4` - `Vx += Vy`, `VF` is the carry
    Add,
    /// `8XY5` - `Vx -= Vy`, `VF` is the "no borrow" flag
    Sub,
    /// `8XY6` - `Vx >>= 1`, `VF` is the shifted out bit
    ShiftRight,
    /// `8XY7` - `Vx = Vy - Vx`, `VF` is the "no borrow" flag
    SubReverse,
    /// `8XYE` - `Vx <<= 1`, `VF` is the shifted out bit
    ShiftLeft,
}

impl ArithmeticOp {
    fn from_nibble(n: usize) -> Option<Self> {
        let op = match n {
            0x0 => ArithmeticOp::Assign,
            0x1 => ArithmeticOp::Or,
            0x2 => ArithmeticOp::And,
            0x3 => ArithmeticOp::Xor,
            0x4 => ArithmeticOp::Add,
            0x5 => ArithmeticOp::Sub,
            0x6 => ArithmeticOp::ShiftRight,
            0x7 => ArithmeticOp::SubReverse,
            0xE => ArithmeticOp::ShiftLeft,
            _ => return None,
        };
        Some(op)
    }
}

/// A fully decoded instruction.
///
/// Register fields (`x`, `y`) are always in `0..16`, `nnn` is always a twelve bit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0` - Clears the screen.
    ClearDisplay,
    /// `00EE` - Returns from a subroutine.
    Return,
    /// `1NNN` - Jumps to address `NNN`.
    Jump { nnn: usize },
    /// `2NNN` - Calls subroutine at `NNN`.
    Call { nnn: usize },
    /// `3XNN` - Skips the next instruction if `VX` equals `NN`.
    SkipIfEqual { x: usize, nn: u8 },
    /// `4XNN` - Skips the next instruction if `VX` doesn't equal `NN`.
    SkipIfNotEqual { x: usize, nn: u8 },
    /// `5XY0` - Skips the next instruction if `VX` equals `VY`.
    SkipIfRegistersEqual { x: usize, y: usize },
    /// `6XNN` - Sets `VX` to `NN`.
    Set { x: usize, nn: u8 },
    /// `7XNN` - Adds `NN` to `VX`. (Carry flag is not changed)
    Add { x: usize, nn: u8 },
    /// `8XYN` - Register to register arithmetic.
    Arithmetic { op: ArithmeticOp, x: usize, y: usize },
    /// `9XY0` - Skips the next instruction if `VX` doesn't equal `VY`.
    SkipIfRegistersNotEqual { x: usize, y: usize },
    /// `ANNN` - Sets `I` to the address `NNN`.
    SetIndex { nnn: usize },
    /// `BNNN` - Jumps to the address `NNN` plus `V0`.
    JumpOffset { nnn: usize },
    /// `CXNN` - Sets `VX` to a random byte and `NN`.
    Random { x: usize, nn: u8 },
    /// `DXYN` - Draws a `8xN` sprite from `I` at `(VX, VY)`.
    Draw { x: usize, y: usize, n: usize },
    /// `EX9E` - Skips the next instruction if the key stored in `VX` is pressed.
    SkipIfPressed { x: usize },
    /// `EXA1` - Skips the next instruction if the key stored in `VX` isn't pressed.
    SkipIfNotPressed { x: usize },
    /// `FX07` - Sets `VX` to the value of the delay timer.
    GetDelayTimer { x: usize },
    /// `FX0A` - A key press is awaited, and then stored in `VX`.
    AwaitKeyPress { x: usize },
    /// `FX15` - Sets the delay timer to `VX`.
    SetDelayTimer { x: usize },
    /// `FX18` - Sets the sound timer to `VX`.
    SetSoundTimer { x: usize },
    /// `FX1E` - Adds `VX` to `I`. `VF` is not affected.
    AddToIndex { x: usize },
    /// `FX29` - Sets `I` to the font character in `VX`.
    SetIndexToSprite { x: usize },
    /// `FX33` - Stores the binary-coded decimal representation of `VX` at `I..I+3`.
    StoreBcd { x: usize },
    /// `FX55` - Stores `V0` to `VX` (including `VX`) in memory starting at `I`.
    StoreRegisters { x: usize },
    /// `FX65` - Fills `V0` to `VX` (including `VX`) from memory starting at `I`.
    LoadRegisters { x: usize },
}

#[inline]
fn err<T>(value: Opcode) -> Result<T, OpcodeError> {
    Err(OpcodeError::InvalidOpcode(value))
}

impl TryFrom<Opcode> for Instruction {
    type Error = OpcodeError;

    fn try_from(value: Opcode) -> Result<Self, Self::Error> {
        // Shifting t here so that match can use a lookup table instead of 'if else' blocks
        const SHIFT: usize = 4 * 3;
        let t = value.t() >> SHIFT;
        let instruction = match t {
            0x0 => match value {
                0x00E0 => Instruction::ClearDisplay,
                0x00EE => Instruction::Return,
                // 0NNN (machine code routines) is not supported
                _ => return err(value),
            },
            0x1 => Instruction::Jump { nnn: value.nnn() },
            0x2 => Instruction::Call { nnn: value.nnn() },
            0x3 => {
                let (x, nn) = value.xnn();
                Instruction::SkipIfEqual { x, nn }
            }
            0x4 => {
                let (x, nn) = value.xnn();
                Instruction::SkipIfNotEqual { x, nn }
            }
            0x5 => match value.xyn() {
                (x, y, 0) => Instruction::SkipIfRegistersEqual { x, y },
                _ => return err(value),
            },
            0x6 => {
                let (x, nn) = value.xnn();
                Instruction::Set { x, nn }
            }
            0x7 => {
                let (x, nn) = value.xnn();
                Instruction::Add { x, nn }
            }
            0x8 => {
                let (x, y, n) = value.xyn();
                match ArithmeticOp::from_nibble(n) {
                    Some(op) => Instruction::Arithmetic { op, x, y },
                    None => return err(value),
                }
            }
            0x9 => match value.xyn() {
                (x, y, 0) => Instruction::SkipIfRegistersNotEqual { x, y },
                _ => return err(value),
            },
            0xA => Instruction::SetIndex { nnn: value.nnn() },
            0xB => Instruction::JumpOffset { nnn: value.nnn() },
            0xC => {
                let (x, nn) = value.xnn();
                Instruction::Random { x, nn }
            }
            0xD => {
                let (x, y, n) = value.xyn();
                Instruction::Draw { x, y, n }
            }
            0xE => match value.xnn() {
                (x, 0x9E) => Instruction::SkipIfPressed { x },
                (x, 0xA1) => Instruction::SkipIfNotPressed { x },
                _ => return err(value),
            },
            0xF => match value.xnn() {
                (x, 0x07) => Instruction::GetDelayTimer { x },
                (x, 0x0A) => Instruction::AwaitKeyPress { x },
                (x, 0x15) => Instruction::SetDelayTimer { x },
                (x, 0x18) => Instruction::SetSoundTimer { x },
                (x, 0x1E) => Instruction::AddToIndex { x },
                (x, 0x29) => Instruction::SetIndexToSprite { x },
                (x, 0x33) => Instruction::StoreBcd { x },
                (x, 0x55) => Instruction::StoreRegisters { x },
                (x, 0x65) => Instruction::LoadRegisters { x },
                _ => return err(value),
            },
            _ => return err(value),
        };
        Ok(instruction)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// Represents the outcome of a single step, reported from the interpreter up to the host.
pub enum Operation {
    /// If no action has to be taken.
    None,
    /// The chipset waits for the next key press.
    Wait,
    /// The display changed and should be redrawn.
    Draw,
    /// The instruction ran into an anomaly, the recovery was already applied.
    Fault(ProcessError),
}

#[cfg(test)]
mod tests {
    use std::convert::{TryFrom, TryInto};

    use super::*;

    #[test]
    fn test_tryfrom_opcode_simple() {
        let value: Opcode = 0x00E0;
        let conv: Result<Instruction, _> = value.try_into();
        assert_eq!(conv, Ok(Instruction::ClearDisplay));
    }

    #[test]
    fn test_tryfrom_opcode_simple_fail() {
        let value: Opcode = 0x00E1;
        let conv: Result<Instruction, _> = value.try_into();
        assert_eq!(conv, Err(OpcodeError::InvalidOpcode(value)));
    }

    #[test]
    fn test_tryfrom_opcode_multiple() {
        use Instruction::*;

        let tests = [
            (0x00E0, Ok(ClearDisplay)),
            (0x00EE, Ok(Return)),
            (0x0123, Err(())),
            (0x1919, Ok(Jump { nnn: 0x919 })),
            (0x2222, Ok(Call { nnn: 0x222 })),
            (0x3123, Ok(SkipIfEqual { x: 0x1, nn: 0x23 })),
            (0x4123, Ok(SkipIfNotEqual { x: 0x1, nn: 0x23 })),
            (0x5120, Ok(SkipIfRegistersEqual { x: 0x1, y: 0x2 })),
            (0x5121, Err(())),
            (0x6123, Ok(Set { x: 0x1, nn: 0x23 })),
            (0x7123, Ok(Add { x: 0x1, nn: 0x23 })),
            (
                0x8120,
                Ok(Arithmetic {
                    op: ArithmeticOp::Assign,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8124,
                Ok(Arithmetic {
                    op: ArithmeticOp::Add,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x8127,
                Ok(Arithmetic {
                    op: ArithmeticOp::SubReverse,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (
                0x812E,
                Ok(Arithmetic {
                    op: ArithmeticOp::ShiftLeft,
                    x: 0x1,
                    y: 0x2,
                }),
            ),
            (0x8128, Err(())),
            (0x9120, Ok(SkipIfRegistersNotEqual { x: 0x1, y: 0x2 })),
            (0x9121, Err(())),
            (0xA222, Ok(SetIndex { nnn: 0x222 })),
            (0xB222, Ok(JumpOffset { nnn: 0x222 })),
            (0xC123, Ok(Random { x: 0x1, nn: 0x23 })),
            (0xD123, Ok(Draw { x: 0x1, y: 0x2, n: 0x3 })),
            (0xE19E, Ok(SkipIfPressed { x: 0x1 })),
            (0xE1A1, Ok(SkipIfNotPressed { x: 0x1 })),
            (0xE111, Err(())),
            (0xF307, Ok(GetDelayTimer { x: 0x3 })),
            (0xF30A, Ok(AwaitKeyPress { x: 0x3 })),
            (0xF315, Ok(SetDelayTimer { x: 0x3 })),
            (0xF318, Ok(SetSoundTimer { x: 0x3 })),
            (0xF31E, Ok(AddToIndex { x: 0x3 })),
            (0xF329, Ok(SetIndexToSprite { x: 0x3 })),
            (0xF333, Ok(StoreBcd { x: 0x3 })),
            (0xF355, Ok(StoreRegisters { x: 0x3 })),
            (0xF365, Ok(LoadRegisters { x: 0x3 })),
            (0xF0AA, Err(())),
        ];
        for (value, res) in tests {
            let conv = Instruction::try_from(value);
            assert_eq!(conv, res.map_err(|_| OpcodeError::InvalidOpcode(value)));
        }
    }

    #[test]
    fn test_every_arithmetic_nibble() {
        let valid = [0x0, 0x1, 0x2, 0x3, 0x4, 0x5, 0x6, 0x7, 0xE];
        for n in 0..16 {
            assert_eq!(
                valid.contains(&n),
                ArithmeticOp::from_nibble(n).is_some(),
                "nibble {:#X}",
                n
            );
        }
    }

    #[test]
    fn test_step_none_keeps_counter() {
        assert_eq!(ProgramCounterStep::None.apply(0x234), 0x234);
    }
}
