//! An emulator for the Oberon RISC5 processor: a 32-bit load/store CPU with
//! a small quirky floating-point unit, a memory-mapped I/O bus, and the
//! devices wired to it (disk, clipboard, PS/2 keyboard encoding, PCLink).
//!
//! Everything lives in a single owned [`Machine`]; there is no interior
//! mutability and no global state, matching the single-driver-thread model
//! a host embeds this crate under.

pub mod cpu;
pub mod damage;
pub mod devices;
pub mod disk;
pub mod error;
mod fp;
pub mod memory;
pub mod pclink;
pub mod ps2;

pub use error::Error;

use cpu::ROM_WORDS;
use damage::DamageTracker;
use devices::{Clipboard, Led, Serial, Spi};
use memory::{DEFAULT_DISPLAY_START, DEFAULT_FB_HEIGHT, DEFAULT_FB_WIDTH, DEFAULT_MEM_SIZE};
use std::collections::VecDeque;

/// Frontend-owned options assembled into a machine at construction or
/// reconfiguration time. This crate never reads `std::env::args` or a
/// config file itself; a driver (CLI flags, a config file, hardcoded
/// defaults) builds one of these and hands it over.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub mem_megabytes: u32,
    pub screen_width: u32,
    pub screen_height: u32,
    pub switches: u32,
    pub boot_from_serial: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            mem_megabytes: DEFAULT_MEM_SIZE >> 20,
            screen_width: DEFAULT_FB_WIDTH,
            screen_height: DEFAULT_FB_HEIGHT,
            switches: 0,
            boot_from_serial: false,
        }
    }
}

pub struct Machine {
    pub(crate) pc: u32,
    pub(crate) r: [u32; 16],
    pub(crate) h: u32,
    pub(crate) z: bool,
    pub(crate) n: bool,
    pub(crate) c: bool,
    pub(crate) v: bool,
    pub(crate) progress: u32,

    pub(crate) ram: Vec<u32>,
    pub(crate) rom: [u32; ROM_WORDS],
    pub(crate) mem_size: u32,
    pub(crate) display_start: u32,
    pub(crate) damage: DamageTracker,

    pub(crate) current_tick: u32,
    pub(crate) switches: u32,
    pub(crate) mouse: u32,
    pub(crate) key_fifo: VecDeque<u8>,

    pub(crate) spi_selected: usize,
    pub(crate) spi: [Option<Box<dyn Spi>>; 4],
    pub(crate) serial: Option<Box<dyn Serial>>,
    pub(crate) clipboard: Option<Box<dyn Clipboard>>,
    pub(crate) leds: Option<Box<dyn Led>>,
}

impl Machine {
    /// Build a machine around the given 512-word boot ROM, with the default
    /// 1 MB RAM / 1024x768 display layout.
    pub fn new(boot_rom: [u32; ROM_WORDS]) -> Self {
        let fb_width_words = (DEFAULT_FB_WIDTH / 32) as i32;
        let fb_height = DEFAULT_FB_HEIGHT as i32;
        let mut machine = Machine {
            pc: 0,
            r: [0; 16],
            h: 0,
            z: false,
            n: false,
            c: false,
            v: false,
            progress: 0,

            ram: vec![0u32; (DEFAULT_MEM_SIZE / 4) as usize],
            rom: boot_rom,
            mem_size: DEFAULT_MEM_SIZE,
            display_start: DEFAULT_DISPLAY_START,
            damage: DamageTracker::new(fb_width_words, fb_height),

            current_tick: 0,
            switches: 0,
            mouse: 0,
            key_fifo: VecDeque::with_capacity(memory::KEY_FIFO_CAPACITY),

            spi_selected: 0,
            spi: [None, None, None, None],
            serial: None,
            clipboard: None,
            leds: None,
        };
        machine.reset();
        machine
    }

    /// Build a machine from a frontend-assembled [`Configuration`]: applies
    /// the requested memory/display geometry and switches, and forces
    /// `switches = 1` when `boot_from_serial` is set (the RISC boot ROM
    /// reads the switches register once at reset to decide whether to boot
    /// from the SD card or the serial line).
    pub fn with_configuration(boot_rom: [u32; ROM_WORDS], config: &Configuration) -> Self {
        let mut machine = Self::new(boot_rom);
        if config.mem_megabytes != DEFAULT_MEM_SIZE >> 20
            || config.screen_width != DEFAULT_FB_WIDTH
            || config.screen_height != DEFAULT_FB_HEIGHT
        {
            machine.configure_memory(config.mem_megabytes, config.screen_width, config.screen_height);
        }
        let switches = if config.boot_from_serial { 1 } else { config.switches };
        machine.set_switches(switches);
        machine
    }

    pub fn registers(&self) -> &[u32; 16] {
        &self.r
    }

    pub fn program_counter(&self) -> u32 {
        self.pc
    }
}

#[cfg(test)]
impl Machine {
    /// Load a program into the start of RAM and point the PC at it, for
    /// tests that exercise a handful of instructions directly.
    pub(crate) fn load_program(&mut self, words: &[u32]) {
        self.ram[..words.len()].copy_from_slice(words);
        self.pc = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::ROM_WORDS;

    #[test]
    fn default_configuration_matches_plain_new() {
        let a = Machine::new([0u32; ROM_WORDS]);
        let b = Machine::with_configuration([0u32; ROM_WORDS], &Configuration::default());
        assert_eq!(a.mem_size, b.mem_size);
        assert_eq!(a.display_start, b.display_start);
        assert_eq!(b.switches, 0);
    }

    #[test]
    fn boot_from_serial_forces_switches_to_one() {
        let config = Configuration {
            boot_from_serial: true,
            ..Configuration::default()
        };
        let m = Machine::with_configuration([0u32; ROM_WORDS], &config);
        assert_eq!(m.switches, 1);
    }

    #[test]
    fn non_default_geometry_reconfigures_memory() {
        let config = Configuration {
            mem_megabytes: 2,
            screen_width: 640,
            screen_height: 480,
            ..Configuration::default()
        };
        let m = Machine::with_configuration([0u32; ROM_WORDS], &config);
        assert_eq!(m.display_start, 2 << 20);
    }
}
