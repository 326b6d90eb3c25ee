use chip::{
    chip8::ChipSet,
    devices::{DisplayCommands, KeyboardCommands, SoundCommands},
    resources::Rom,
    Runner,
};
use criterion::{criterion_group, criterion_main, Criterion};

const ROM_NAME: &str = "CLOCK";

/// Counts V0 up, draws its digit and loops, so every frame redraws.
static BASE_ROM: once_cell::sync::Lazy<Rom> = once_cell::sync::Lazy::new(|| {
    Rom::new(
        ROM_NAME,
        vec![
            0x00, 0xE0, // clear the screen
            0x70, 0x01, // V0 += 1
            0x80, 0x06, // V0 >>= 1, so VF changes
            0x70, 0x01, // V0 += 1
            0xF0, 0x29, // I = font(V0)
            0xD1, 0x15, // draw the digit at (V1, V1)
            0x12, 0x00, // loop
        ],
    )
});

struct Headless;

impl DisplayCommands for Headless {
    fn display(&mut self, pixels: &[[bool; chip::definitions::display::WIDTH]]) {
        criterion::black_box(pixels);
    }
}

impl KeyboardCommands for Headless {
    fn get_keyboard(&mut self) -> [bool; chip::definitions::keyboard::SIZE] {
        [false; chip::definitions::keyboard::SIZE]
    }
}

impl SoundCommands for Headless {
    fn beep(&mut self) {}
}

/// will setup the default configured chip
fn get_default_chip() -> ChipSet {
    let mut chip = ChipSet::new();
    chip.load_rom(&BASE_ROM)
        .expect("The benchmark rom fits into memory.");
    chip
}

pub fn frame_bench(c: &mut Criterion) {
    let mut runner = Runner::new(get_default_chip(), Headless, Headless, Headless);
    c.bench_function("frame_bench", |b| {
        b.iter(|| runner.run_frame());
    });
}

pub fn step_bench(c: &mut Criterion) {
    let mut chip = get_default_chip();
    c.bench_function("step_bench", |b| {
        b.iter(|| criterion::black_box(chip.step()));
    });
}

pub fn print_bench(c: &mut Criterion) {
    let chip = get_default_chip();
    c.bench_function("print_bench", |b| {
        b.iter(|| {
            let _ = format!("{}", chip);
        });
    });
}

criterion_group!(benches, frame_bench, step_bench, print_bench);
criterion_main!(benches);
