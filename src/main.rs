//! A minimal headless driver: loads a boot image and disk file, runs the
//! machine for a fixed number of scheduling slices and reports framebuffer
//! damage. No window, no input devices, no real argument parsing -- this
//! exists to exercise the library surface, not to be a usable frontend.

use log::{error, info};
use oberon_risc_emu::cpu::ROM_WORDS;
use oberon_risc_emu::disk::Disk;
use oberon_risc_emu::{Configuration, Machine};
use std::env;
use std::fs;
use std::process::ExitCode;

const SLICE_INSTRUCTIONS: u32 = 2_000_000;
const SLICES: u32 = 10;

fn load_boot_rom(path: &str) -> Option<[u32; ROM_WORDS]> {
    let bytes = fs::read(path).ok()?;
    if bytes.len() != ROM_WORDS * 4 {
        error!(
            "boot image {} is {} bytes, expected {}",
            path,
            bytes.len(),
            ROM_WORDS * 4
        );
        return None;
    }
    let mut rom = [0u32; ROM_WORDS];
    for (word, chunk) in rom.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Some(rom)
}

fn main() -> ExitCode {
    env_logger::init();

    let mut args = env::args().skip(1);
    let boot_path = match args.next() {
        Some(p) => p,
        None => {
            error!("usage: oberon-headless <boot.img> [disk.img]");
            return ExitCode::FAILURE;
        }
    };
    let disk_path = args.next();

    let rom = match load_boot_rom(&boot_path) {
        Some(rom) => rom,
        None => return ExitCode::FAILURE,
    };

    let mut machine = Machine::with_configuration(rom, &Configuration::default());

    if let Some(disk_path) = disk_path {
        match Disk::open(&disk_path) {
            Ok(disk) => machine.attach_spi(1, Box::new(disk)),
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    for slice in 0..SLICES {
        machine.run(SLICE_INSTRUCTIONS);
        let damage = machine.framebuffer_damage();
        info!(
            "slice {}: pc=0x{:08X} damage=({},{})-({},{})",
            slice,
            machine.program_counter(),
            damage.x1,
            damage.y1,
            damage.x2,
            damage.y2
        );
    }

    ExitCode::SUCCESS
}
