use {
    crate::{
        definitions::{cpu, display, keyboard, memory},
        devices::Keyboard,
        opcode::{self, Opcode, Operation, ProgramCounterStep},
        resources::Rom,
        timer::{NoCallback, Timer, TimerCallback},
        ChipError, OpcodeError, ProcessError, StackError,
    },
    rand::RngCore,
    tinyvec::ArrayVec,
};

/// The observable modes of the chipset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every step executes the next opcode.
    Running,
    /// Entered by `FX0A`, every step only polls the keyboard until
    /// a key is pressed, which is then stored into the register.
    AwaitingKey { register: usize },
}

/// The ChipSet struct represents the current state
/// of the system, it contains all the structures
/// needed for emulating an instant on the
/// Chip8 CPU.
///
/// The chipset has no clock of it's own, the host calls [`step`](ChipSet::step)
/// for every instruction and [`tick_timers`](ChipSet::tick_timers) at 60Hz.
pub struct ChipSet<S = NoCallback>
where
    S: TimerCallback,
{
    /// name of the loaded rom
    pub(super) name: String,
    /// the last opcode fetched, all two bytes long and stored big-endian
    pub(super) opcode: Opcode,
    /// - `0x000-0x1FF` - Chip 8 interpreter (contains font set in emu)
    /// - `0x050-0x0A0` - Used for the built in `4x5` pixel font set (`0-F`)
    /// - `0x200-0xFFF` - Program ROM and work RAM
    pub(super) memory: Box<[u8; memory::SIZE]>,
    /// `8-bit` data registers named `V0` to `VF`. The `VF` register doubles as a flag for some
    /// instructions. In an addition operation, `VF` is the carry flag, while in subtraction, it
    /// is the "no borrow" flag. In the draw instruction `VF` is set upon pixel collision.
    pub(super) registers: [u8; cpu::register::SIZE],
    /// The index register `I`, always a twelve bit address
    pub(super) index_register: usize,
    /// The address of the next instruction to be executed from memory.
    pub(super) program_counter: usize,
    /// The stack is only used to store return addresses when subroutines are called. The original
    /// [RCA 1802](https://de.wikipedia.org/wiki/RCA1802) version allocated `48` bytes for up to
    /// `12` levels of nesting; modern implementations usually have more.
    /// (here we are using `16`)
    pub(super) stack: ArrayVec<[usize; cpu::stack::SIZE]>,
    /// Delay timer: This timer is intended to be used for timing the events of games. Its value
    /// can be set and read.
    pub(super) delay_timer: Timer<NoCallback>,
    /// Sound timer: This timer is used for sound effects. The callback runs once it expires.
    pub(super) sound_timer: Timer<S>,
    /// The graphics of the Chip 8 are black and white and the screen has a total of `2048` pixels
    /// `(64 x 32)`, stored row by row.
    pub(super) display: Box<[[bool; display::WIDTH]; display::HEIGHT]>,
    /// Set whenever the display changed, cleared by the host once it rendered.
    pub(super) redraw: bool,
    /// The state of the hex keyboard, as reported by the host.
    pub(super) keyboard: Keyboard,
    pub(super) mode: Mode,
    /// This stores the random number generator, used by the chipset.
    /// It is stored into the chipset, so as to enable simple mocking
    /// of the given type.
    pub(super) rng: Box<dyn RngCore + Send>,
}

impl ChipSet<NoCallback> {
    /// will create a new chipset object without a sound callback
    pub fn new() -> Self {
        Self::with_callback(NoCallback)
    }
}

impl Default for ChipSet<NoCallback> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> ChipSet<S>
where
    S: TimerCallback,
{
    /// will create a new chipset object, the callback will be run
    /// every time the sound timer expires.
    pub fn with_callback(callback: S) -> Self {
        let mut chip = Self {
            name: String::new(),
            opcode: 0,
            memory: Box::new([0; memory::SIZE]),
            registers: [0; cpu::register::SIZE],
            index_register: 0,
            program_counter: cpu::PROGRAM_COUNTER,
            stack: ArrayVec::new(),
            delay_timer: Timer::new(0),
            sound_timer: Timer::with_callback(0, callback),
            display: Box::new([[false; display::WIDTH]; display::HEIGHT]),
            redraw: false,
            keyboard: Keyboard::new(),
            mode: Mode::Running,
            rng: Box::new(rand::rngs::OsRng),
        };
        chip.reset();
        chip
    }

    /// Will replace the random number generator used by `CXNN`.
    pub fn set_rng<R>(&mut self, rng: R)
    where
        R: RngCore + Send + 'static,
    {
        self.rng = Box::new(rng);
    }

    /// Will bring the chipset back into the state it was constructed in,
    /// the memory only contains the font set afterwards.
    pub fn reset(&mut self) {
        self.name.clear();
        self.opcode = 0;

        self.memory.fill(0);
        // load fonts
        self.memory[display::fontset::LOCATION
            ..(display::fontset::LOCATION + display::fontset::FONTSET.len())]
            .copy_from_slice(&display::fontset::FONTSET);

        self.registers = [0; cpu::register::SIZE];
        self.index_register = 0;
        self.program_counter = cpu::PROGRAM_COUNTER;
        self.stack.clear();
        self.delay_timer.set_value(0);
        self.sound_timer.set_value(0);

        for row in self.display.iter_mut() {
            *row = [false; display::WIDTH];
        }
        // the host still shows the old screen
        self.redraw = true;

        self.keyboard.reset();
        self.mode = Mode::Running;
    }

    /// Will reset the chipset and write the program into memory at `0x200`.
    ///
    /// A program that doesn't fit into memory is rejected, the chipset
    /// is left untouched in that case.
    pub fn load(&mut self, data: &[u8]) -> Result<(), ChipError> {
        if data.len() > cpu::MAX_ROM_SIZE {
            return Err(ChipError::RomTooLarge {
                size: data.len(),
                max: cpu::MAX_ROM_SIZE,
            });
        }

        self.reset();

        // write the rom data into memory
        self.memory[cpu::PROGRAM_COUNTER..(cpu::PROGRAM_COUNTER + data.len())]
            .copy_from_slice(data);

        log::debug!("Loaded a program with {} bytes.", data.len());
        Ok(())
    }

    /// Will load the given rom, see [`load`](ChipSet::load).
    pub fn load_rom(&mut self, rom: &Rom) -> Result<(), ChipError> {
        self.load(rom.get_data())?;
        self.name = rom.get_name().to_string();
        Ok(())
    }

    /// will get the next opcode from memory
    pub(super) fn fetch(&self) -> Result<Opcode, ProcessError> {
        opcode::build_opcode(&self.memory[..], self.program_counter).map_err(|err| match err {
            OpcodeError::MemoryInvalid { pointer, .. } => ProcessError::OutOfBounds {
                address: pointer + 1,
            },
            err => err.into(),
        })
    }

    fn execute_next(&mut self) -> Result<Operation, ProcessError> {
        self.opcode = self.fetch()?;
        self.calc(self.opcode)
    }

    /// Will advance the program by a single step.
    ///
    /// While the chipset awaits a key press the step only polls the keyboard.
    /// Faults never stop the chipset, the faulting instruction is skipped
    /// and the fault is returned as [`Operation::Fault`].
    pub fn step(&mut self) -> Operation {
        if let Mode::AwaitingKey { register } = self.mode {
            return self.poll_key(register);
        }

        match self.execute_next() {
            Ok(operation) => operation,
            Err(err) => {
                log::warn!(
                    "{} Skipping the instruction at {:#06X}.",
                    err,
                    self.program_counter
                );
                self.advance(ProgramCounterStep::Next);
                Operation::Fault(err)
            }
        }
    }

    fn poll_key(&mut self, register: usize) -> Operation {
        match self.keyboard.first_pressed() {
            Some(key) => {
                log::debug!("Captured key {:#X} into V{:X}.", key, register);
                self.registers[register] = key as u8;
                self.mode = Mode::Running;
                self.advance(ProgramCounterStep::Next);
                Operation::None
            }
            None => Operation::Wait,
        }
    }

    /// Will count both timers down by one, has to be called at 60Hz.
    ///
    /// Returns true if the sound timer just expired, so the tone
    /// has to be played. The sound callback was run in that case.
    pub fn tick_timers(&mut self) -> bool {
        self.delay_timer.tick();
        self.sound_timer.tick()
    }

    /// Will move the program counter, the counter always stays inside of memory.
    pub(super) fn advance(&mut self, step: ProgramCounterStep) {
        self.program_counter = step.apply(self.program_counter);
    }

    /// Will push the return address to the stack
    pub(super) fn push_stack(&mut self, pointer: usize) -> Result<(), StackError> {
        match self.stack.try_push(pointer) {
            None => Ok(()),
            Some(_) => Err(StackError::Full),
        }
    }

    /// Will pop the last return address from the stack
    pub(super) fn pop_stack(&mut self) -> Result<usize, StackError> {
        self.stack.pop().ok_or(StackError::Empty)
    }

    /// Will read memory, addresses outside of memory wrap around.
    pub(super) fn read_memory(&self, address: usize) -> u8 {
        self.memory[wrap_address(address)]
    }

    /// Will write memory, addresses outside of memory wrap around.
    pub(super) fn write_memory(&mut self, address: usize, value: u8) {
        self.memory[wrap_address(address)] = value;
    }

    /// Will write keyboard data into interncal keyboard representation.
    pub fn set_keyboard(&mut self, keys: &[bool; keyboard::SIZE]) {
        self.keyboard.set_mult(keys);
    }

    /// Will set the value of the given key
    pub fn set_key(&mut self, key: usize, to: bool) {
        self.keyboard.set_key(key, to)
    }

    /// Will toggle the given key
    pub fn toggle_key(&mut self, key: usize) {
        self.keyboard.toggle_key(key)
    }

    /// Will get the current state of the keyboard
    pub fn get_keyboard(&self) -> &[bool] {
        self.keyboard.get_keys()
    }

    /// Will return a immutable slice of the current display configuration, row by row
    pub fn get_display(&self) -> &[[bool; display::WIDTH]] {
        &self.display[..]
    }

    /// Checks if the display changed since the host last rendered it.
    pub fn needs_redraw(&self) -> bool {
        self.redraw
    }

    /// Has to be called by the host after rendering the display.
    pub fn clear_redraw(&mut self) {
        self.redraw = false;
    }

    pub fn get_mode(&self) -> Mode {
        self.mode
    }

    pub fn is_waiting_for_key(&self) -> bool {
        matches!(self.mode, Mode::AwaitingKey { .. })
    }

    /// will return the sound timer
    pub fn get_sound_timer(&self) -> u8 {
        self.sound_timer.get_value()
    }

    /// will return the delay timer
    pub fn get_delay_timer(&self) -> u8 {
        self.delay_timer.get_value()
    }

    pub fn get_program_counter(&self) -> usize {
        self.program_counter
    }

    pub fn get_index_register(&self) -> usize {
        self.index_register
    }

    pub fn get_registers(&self) -> &[u8] {
        &self.registers
    }

    /// The return addresses, the last entry is the top of the stack.
    pub fn get_stack(&self) -> &[usize] {
        &self.stack
    }

    pub fn get_memory(&self) -> &[u8] {
        &self.memory[..]
    }

    /// The opcode fetched by the last step
    pub fn get_opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }
}

fn wrap_address(address: usize) -> usize {
    if address >= memory::SIZE {
        log::warn!("Memory access at {:#06X} wrapped around.", address);
    }
    address & memory::ADDRESS_MASK
}
