use std::time::Duration;

use crate::{
    chip8::ChipSet,
    definitions::{cpu, timer},
    devices::{DisplayCommands, KeyboardCommands, SoundCommands},
    opcode::Operation,
    timer::{NoCallback, TimedWorker, TimerCallback},
};

/// The amount of instructions run between two timer ticks.
pub const STEPS_PER_FRAME: usize = (cpu::HERTZ / timer::HERTZ) as usize;

/// Drives a chipset frame by frame, a frame being a single 60Hz timer tick.
pub struct Runner<D, K, A, S = NoCallback>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    A: SoundCommands,
    S: TimerCallback,
{
    chip: ChipSet<S>,
    display: D,
    keyboard: K,
    sound: A,
    steps_per_frame: usize,
    faults: usize,
}

impl<D, K, A, S> Runner<D, K, A, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    A: SoundCommands,
    S: TimerCallback,
{
    /// Will wrap the chipset, which should already contain a rom.
    pub fn new(chip: ChipSet<S>, display: D, keyboard: K, sound: A) -> Self {
        Self {
            chip,
            display,
            keyboard,
            sound,
            steps_per_frame: STEPS_PER_FRAME,
            faults: 0,
        }
    }

    /// Will change the amount of instructions run per frame.
    pub fn with_steps_per_frame(mut self, steps: usize) -> Self {
        self.steps_per_frame = steps;
        self
    }

    pub fn get_chip(&self) -> &ChipSet<S> {
        &self.chip
    }

    pub fn get_chip_mut(&mut self) -> &mut ChipSet<S> {
        &mut self.chip
    }

    /// The amount of faults the rom ran into so far.
    pub fn get_faults(&self) -> usize {
        self.faults
    }

    /// Will run a single frame:
    /// read the keyboard, run the instructions, tick the timers and
    /// hand the display to the host if it changed.
    pub fn run_frame(&mut self) {
        let keys = self.keyboard.get_keyboard();
        self.chip.set_keyboard(&keys);

        for _ in 0..self.steps_per_frame {
            match self.chip.step() {
                Operation::Fault(_) => self.faults += 1,
                // the keyboard only changes between frames
                Operation::Wait => break,
                Operation::None | Operation::Draw => {}
            }
        }

        if self.chip.tick_timers() {
            log::trace!("Sound timer expired.");
            self.sound.beep();
        }

        if self.chip.needs_redraw() {
            self.display.display(self.chip.get_display());
            self.chip.clear_redraw();
        }
    }
}

/// Will move the runner onto a worker, that runs a frame at 60Hz.
pub fn run<D, K, A, S, W>(mut runner: Runner<D, K, A, S>) -> W
where
    D: DisplayCommands + Send + 'static,
    K: KeyboardCommands + Send + 'static,
    A: SoundCommands + Send + 'static,
    S: TimerCallback + 'static,
    W: TimedWorker,
{
    let mut worker = W::new();
    worker.start(
        move || runner.run_frame(),
        Duration::from_millis(timer::INTERVAL),
    );
    worker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        definitions::keyboard,
        devices::{MockDisplayCommands, MockKeyboardCommands, MockSoundCommands},
        timer::Worker,
    };

    fn setup_chip(rom: &[u8]) -> ChipSet {
        let mut chip = ChipSet::new();
        chip.load(rom).unwrap();
        chip
    }

    fn silent_keyboard(frames: usize) -> MockKeyboardCommands {
        let mut input = MockKeyboardCommands::new();
        input
            .expect_get_keyboard()
            .times(frames)
            .returning(|| [false; keyboard::SIZE]);
        input
    }

    #[test]
    fn test_steps_per_frame() {
        assert_eq!(STEPS_PER_FRAME, 9);
    }

    #[test]
    fn test_frame_draws_on_change_only() {
        // clear the screen, then loop forever
        let chip = setup_chip(&[0x00, 0xE0, 0x12, 0x02]);

        let mut display = MockDisplayCommands::new();
        display
            .expect_display()
            .withf(|pixels| pixels.iter().flatten().all(|&p| !p))
            .times(1)
            .return_const(());
        let mut sound = MockSoundCommands::new();
        sound.expect_beep().times(0);

        let mut runner = Runner::new(chip, display, silent_keyboard(2), sound);
        runner.run_frame();
        runner.run_frame();

        assert!(!runner.get_chip().needs_redraw());
        assert_eq!(runner.get_faults(), 0);
    }

    #[test]
    fn test_beep_on_sound_expiry() {
        // V0 = 1, sound timer = V0, loop forever
        let chip = setup_chip(&[0x60, 0x01, 0xF0, 0x18, 0x12, 0x04]);

        let mut display = MockDisplayCommands::new();
        display.expect_display().return_const(());
        let mut sound = MockSoundCommands::new();
        sound.expect_beep().times(1).return_const(());

        let mut runner = Runner::new(chip, display, silent_keyboard(3), sound);
        for _ in 0..3 {
            runner.run_frame();
        }
        assert_eq!(runner.get_chip().get_sound_timer(), 0);
    }

    #[test]
    fn test_key_wait_across_frames() {
        // wait for a key in V3, loop forever
        let chip = setup_chip(&[0xF3, 0x0A, 0x12, 0x02]);

        let mut display = MockDisplayCommands::new();
        display.expect_display().return_const(());
        let mut sound = MockSoundCommands::new();
        sound.expect_beep().times(0);

        let mut frames = 0;
        let mut input = MockKeyboardCommands::new();
        input.expect_get_keyboard().times(2).returning(move || {
            frames += 1;
            let mut keys = [false; keyboard::SIZE];
            keys[0x7] = frames > 1;
            keys
        });

        let mut runner = Runner::new(chip, display, input, sound);

        runner.run_frame();
        assert!(runner.get_chip().is_waiting_for_key());

        runner.run_frame();
        assert!(!runner.get_chip().is_waiting_for_key());
        assert_eq!(runner.get_chip().get_registers()[0x3], 0x7);
    }

    #[test]
    fn test_faults_are_counted() {
        // empty memory only contains unsupported opcodes
        let chip = setup_chip(&[]);

        let mut display = MockDisplayCommands::new();
        display.expect_display().return_const(());
        let mut sound = MockSoundCommands::new();
        sound.expect_beep().times(0);

        let mut runner =
            Runner::new(chip, display, silent_keyboard(1), sound).with_steps_per_frame(4);
        runner.run_frame();

        assert_eq!(runner.get_faults(), 4);
        assert_eq!(runner.get_chip().get_program_counter(), cpu::PROGRAM_COUNTER + 8);
    }

    #[test]
    fn test_run_on_worker() {
        let chip = setup_chip(&[0x12, 0x00]);

        let mut display = MockDisplayCommands::new();
        display.expect_display().return_const(());
        let mut input = MockKeyboardCommands::new();
        input
            .expect_get_keyboard()
            .returning(|| [false; keyboard::SIZE]);
        let sound = MockSoundCommands::new();

        let mut worker: Worker = run(Runner::new(chip, display, input, sound));
        assert!(worker.is_alive());

        std::thread::sleep(Duration::from_millis(50));
        worker.stop();
        assert!(!worker.is_alive());
    }
}
