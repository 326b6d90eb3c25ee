use std::convert::TryFrom;

use crate::{
    definitions::{cpu, display, memory},
    opcode::{ArithmeticOp, Instruction, Opcode, Operation, ProgramCounterStep},
    timer::TimerCallback,
    ProcessError,
};

use super::{ChipSet, Mode};

impl<S> ChipSet<S>
where
    S: TimerCallback,
{
    /// will decode and execute a single opcode, including the movement
    /// of the program counter.
    ///
    /// On error nothing was changed.
    pub(super) fn calc(&mut self, opcode: Opcode) -> Result<Operation, ProcessError> {
        log::trace!("pc {:#06X} opcode {:#06X}", self.program_counter, opcode);

        let instruction = Instruction::try_from(opcode)?;
        let (step, operation) = self.execute(instruction)?;

        self.advance(step);
        Ok(operation)
    }

    fn execute(
        &mut self,
        instruction: Instruction,
    ) -> Result<(ProgramCounterStep, Operation), ProcessError> {
        let mut operation = Operation::None;

        let step = match instruction {
            Instruction::ClearDisplay => {
                for row in self.display.iter_mut() {
                    *row = [false; display::WIDTH];
                }
                self.redraw = true;
                operation = Operation::Draw;
                ProgramCounterStep::Next
            }
            Instruction::Return => {
                let pc = self.pop_stack()?;
                log::debug!("return to {:#06X}", pc);
                ProgramCounterStep::Jump(pc)
            }
            Instruction::Jump { nnn } => ProgramCounterStep::Jump(nnn),
            Instruction::Call { nnn } => {
                // the return address is the opcode after the call
                let next = ProgramCounterStep::Next.apply(self.program_counter);
                self.push_stack(next)?;
                log::debug!("call {:#06X} from {:#06X}", nnn, self.program_counter);
                ProgramCounterStep::Jump(nnn)
            }
            Instruction::SkipIfEqual { x, nn } => {
                ProgramCounterStep::cond(self.registers[x] == nn)
            }
            Instruction::SkipIfNotEqual { x, nn } => {
                ProgramCounterStep::cond(self.registers[x] != nn)
            }
            Instruction::SkipIfRegistersEqual { x, y } => {
                ProgramCounterStep::cond(self.registers[x] == self.registers[y])
            }
            Instruction::Set { x, nn } => {
                self.registers[x] = nn;
                ProgramCounterStep::Next
            }
            Instruction::Add { x, nn } => {
                // let VX overflow, but ignore carry
                self.registers[x] = self.registers[x].wrapping_add(nn);
                ProgramCounterStep::Next
            }
            Instruction::Arithmetic { op, x, y } => {
                self.arithmetic(op, x, y);
                ProgramCounterStep::Next
            }
            Instruction::SkipIfRegistersNotEqual { x, y } => {
                ProgramCounterStep::cond(self.registers[x] != self.registers[y])
            }
            Instruction::SetIndex { nnn } => {
                self.index_register = nnn;
                ProgramCounterStep::Next
            }
            Instruction::JumpOffset { nnn } => {
                ProgramCounterStep::Jump(nnn + self.registers[0] as usize)
            }
            Instruction::Random { x, nn } => {
                // using a fill bytes call here, as the trait RngCore does not
                // support random u8.
                let mut rand: [u8; 1] = [0];
                self.rng.fill_bytes(&mut rand);
                self.registers[x] = nn & rand[0];
                ProgramCounterStep::Next
            }
            Instruction::Draw { x, y, n } => {
                self.draw_sprite(x, y, n);
                operation = Operation::Draw;
                ProgramCounterStep::Next
            }
            Instruction::SkipIfPressed { x } => {
                ProgramCounterStep::cond(self.keyboard.is_pressed(self.registers[x] as usize))
            }
            Instruction::SkipIfNotPressed { x } => {
                ProgramCounterStep::cond(!self.keyboard.is_pressed(self.registers[x] as usize))
            }
            Instruction::GetDelayTimer { x } => {
                self.registers[x] = self.delay_timer.get_value();
                ProgramCounterStep::Next
            }
            Instruction::AwaitKeyPress { x } => {
                // the counter moves once the key was captured
                log::debug!("awaiting a key press for V{:X}", x);
                self.mode = Mode::AwaitingKey { register: x };
                operation = Operation::Wait;
                ProgramCounterStep::None
            }
            Instruction::SetDelayTimer { x } => {
                self.delay_timer.set_value(self.registers[x]);
                ProgramCounterStep::Next
            }
            Instruction::SetSoundTimer { x } => {
                self.sound_timer.set_value(self.registers[x]);
                ProgramCounterStep::Next
            }
            Instruction::AddToIndex { x } => {
                // VF is not affected
                let vx = self.registers[x] as usize;
                self.index_register = (self.index_register + vx) & memory::ADDRESS_MASK;
                ProgramCounterStep::Next
            }
            Instruction::SetIndexToSprite { x } => {
                let character = self.registers[x] as usize;
                self.index_register = (display::fontset::LOCATION
                    + character * display::fontset::CHAR_SIZE)
                    & memory::ADDRESS_MASK;
                ProgramCounterStep::Next
            }
            Instruction::StoreBcd { x } => {
                let i = self.index_register;
                let r = self.registers[x];

                self.write_memory(i, r / 100); // 246u8 / 100 => 2
                self.write_memory(i + 1, r / 10 % 10); // 246u8 / 10 => 24 % 10 => 4
                self.write_memory(i + 2, r % 10); // 246u8 % 10 => 6
                ProgramCounterStep::Next
            }
            Instruction::StoreRegisters { x } => {
                // I itself is left unmodified
                let index = self.index_register;
                for offset in 0..=x {
                    self.write_memory(index + offset, self.registers[offset]);
                }
                ProgramCounterStep::Next
            }
            Instruction::LoadRegisters { x } => {
                let index = self.index_register;
                for offset in 0..=x {
                    self.registers[offset] = self.read_memory(index + offset);
                }
                ProgramCounterStep::Next
            }
        };

        Ok((step, operation))
    }

    /// The `8XYN` family, the flag is written after the result.
    fn arithmetic(&mut self, op: ArithmeticOp, x: usize, y: usize) {
        let vx = self.registers[x];
        let vy = self.registers[y];

        let (result, flag) = match op {
            ArithmeticOp::Assign => (vy, None),
            ArithmeticOp::Or => (vx | vy, None),
            ArithmeticOp::And => (vx & vy, None),
            ArithmeticOp::Xor => (vx ^ vy, None),
            ArithmeticOp::Add => {
                let (res, carry) = vx.overflowing_add(vy);
                (res, Some(carry as u8))
            }
            ArithmeticOp::Sub => (vx.wrapping_sub(vy), Some((vx >= vy) as u8)),
            ArithmeticOp::ShiftRight => (vx >> 1, Some(vx & 1)),
            ArithmeticOp::SubReverse => (vy.wrapping_sub(vx), Some((vy >= vx) as u8)),
            ArithmeticOp::ShiftLeft => (vx << 1, Some(vx >> 7)),
        };

        self.registers[x] = result;
        if let Some(flag) = flag {
            self.registers[cpu::register::LAST] = flag;
        }
    }

    /// Draws a sprite at coordinate (VX, VY) that has a width of 8 pixels and a height of N
    /// pixels. Each row of 8 pixels is read as bit-coded starting from memory location I; I
    /// value doesn’t change after the execution of this instruction. VF is set to 1 if any
    /// screen pixels are flipped from set to unset when the sprite is drawn, and to 0 if that
    /// doesn’t happen.
    ///
    /// The starting position wraps around the screen, the sprite itself is clipped at the edges.
    /// see https://tobiasvl.github.io/blog/write-a-chip-8-emulator/
    fn draw_sprite(&mut self, reg_x: usize, reg_y: usize, n: usize) {
        let coorx = self.registers[reg_x] as usize % display::WIDTH;
        let coory = self.registers[reg_y] as usize % display::HEIGHT;
        let index = self.index_register;

        let mut collision = false;

        for i in 0..n {
            let y = coory + i;
            if y >= display::HEIGHT {
                break;
            }

            let row = self.read_memory(index + i);

            for j in 0..display::SPRITE_WIDTH {
                let x = coorx + j;
                if x >= display::WIDTH {
                    break;
                }

                // the most significant bit is the leftmost pixel
                let mask = 0x80 >> j;
                if row & mask == 0 {
                    continue;
                }

                let pixel = &mut self.display[y][x];
                collision |= *pixel;
                *pixel = !*pixel;
            }
        }

        self.registers[cpu::register::LAST] = collision as u8;
        self.redraw = true;
    }
}
