//! The pretty print implementation for the [`ChipSet`](super::ChipSet).
//! It shows the cpu state followed by a memory dump.

use super::ChipSet;
use crate::{definitions::cpu, timer::TimerCallback};
use once_cell::sync::Lazy;
use std::fmt;

/// The length of the pretty print data
/// as a single instruction is u16 the octa
/// size will show how often the block shall
/// be repeated has to be bigger then 2
const HEX_PRINT_STEP: usize = 8;

const INDENT: &str = "\t";

macro_rules! intformat {
    () => {
        // The formatted string will be 2 sysbols for the prefix (0x)
        // and 4 for the rest long.
        "{:#06X}"
    };
}

impl<S> fmt::Display for ChipSet<S>
where
    S: TimerCallback,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Rom: {}", self.name)?;
        writeln!(
            f,
            concat!(
                "Program counter: ",
                intformat!(),
                " Index: ",
                intformat!(),
                " Opcode: ",
                intformat!()
            ),
            self.program_counter, self.index_register, self.opcode
        )?;
        writeln!(
            f,
            "Delay timer: {} Sound timer: {} Mode: {:?}",
            self.delay_timer.get_value(),
            self.sound_timer.get_value(),
            self.mode
        )?;

        writeln!(f, "Registers:")?;
        for (i, chunk) in self.registers.chunks(cpu::register::SIZE / 2).enumerate() {
            write!(f, "{}", INDENT)?;
            for (j, value) in chunk.iter().enumerate() {
                write!(f, "V{:X}: {:#04X} ", i * chunk.len() + j, value)?;
            }
            writeln!(f)?;
        }

        write!(f, "Stack:")?;
        for pointer in self.stack.iter() {
            write!(f, concat!(" ", intformat!()), pointer)?;
        }
        writeln!(f)?;

        writeln!(f, "Memory:")?;
        opcode_print::write_memory(f, &self.memory[..])
    }
}

/// Handles all the opcode prints
mod opcode_print {
    use super::{Lazy, HEX_PRINT_STEP, INDENT};
    use crate::{definitions::memory, opcode::Opcode};
    use std::fmt;

    /// The internal length of the given data
    /// as the data is stored as u8 and an opcode
    /// is u16 long
    const POINTER_INCREMENT: usize = HEX_PRINT_STEP * memory::opcodes::SIZE;
    /// The values that are used when there are at lease two rows of zeros.
    pub(super) const FILLER_BASE: &str = "...";

    /// Prepares the line that will be used, in the case that there is at least two lines of only zeros.
    pub(super) static ZERO_FILLER: Lazy<String> = Lazy::new(|| {
        let formatted = format!(concat!(intformat!()), 0u16);
        let lenght = formatted.len() * (HEX_PRINT_STEP - 2) + (HEX_PRINT_STEP - 1)
            - FILLER_BASE.len();
        let filler = " ".repeat(lenght / 2);

        format!(
            "{}{}{}{}{}",
            formatted, filler, FILLER_BASE, filler, formatted
        )
    });

    fn only_null(row: &[u8]) -> bool {
        row.iter().all(|&b| b == 0)
    }

    fn write_pointers(f: &mut fmt::Formatter<'_>, from: usize, to: usize) -> fmt::Result {
        write!(
            f,
            concat!("{}", intformat!(), " - ", intformat!(), " :"),
            INDENT, from, to
        )
    }

    pub(super) fn write_memory(f: &mut fmt::Formatter<'_>, data: &[u8]) -> fmt::Result {
        let rows: Vec<&[u8]> = data.chunks(POINTER_INCREMENT).collect();

        let mut i = 0;
        while i < rows.len() {
            let from = i * POINTER_INCREMENT;

            // collapse at least two rows of zeros
            let mut end = i;
            while end + 1 < rows.len() && only_null(rows[end]) && only_null(rows[end + 1]) {
                end += 1;
            }
            if end > i {
                write_pointers(f, from, (end + 1) * POINTER_INCREMENT - 1)?;
                writeln!(f, " {}", *ZERO_FILLER)?;
                i = end + 1;
                continue;
            }

            let row = rows[i];
            write_pointers(f, from, from + row.len() - 1)?;
            for opcode in row.chunks(memory::opcodes::SIZE) {
                let opcode = match *opcode {
                    [high, low] => Opcode::from_be_bytes([high, low]),
                    [high] => Opcode::from_be_bytes([high, 0]),
                    _ => 0,
                };
                write!(f, concat!(" ", intformat!()), opcode)?;
            }
            writeln!(f)?;
            i += 1;
        }
        Ok(())
    }
}
