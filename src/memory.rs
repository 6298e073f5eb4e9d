//! The memory-mapped bus: RAM, the boot ROM, the fixed I/O register window,
//! and the wired devices reachable through it.

use crate::cpu::ROM_START;
use log::debug;

pub const IO_START: u32 = 0xFFFF_FFC0;
pub const DEFAULT_MEM_SIZE: u32 = 0x0010_0000;
pub const DEFAULT_DISPLAY_START: u32 = 0x000E_7F00;
pub const DEFAULT_FB_WIDTH: u32 = 1024;
pub const DEFAULT_FB_HEIGHT: u32 = 768;
pub(crate) const KEY_FIFO_CAPACITY: usize = 16;

use crate::Machine;

impl Machine {
    /// Reallocate RAM for `megabytes_ram` (clamped to 1..=32) and patch the
    /// boot ROM's memory-limit and stack-origin constants to match.
    pub fn configure_memory(&mut self, megabytes_ram: u32, screen_width: u32, screen_height: u32) {
        let megabytes_ram = megabytes_ram.clamp(1, 32);
        let display_start = megabytes_ram << 20;
        let mem_size = display_start + (screen_width * screen_height) / 8;
        let fb_width_words = (screen_width / 32) as i32;
        let fb_height = screen_height as i32;

        self.display_start = display_start;
        self.mem_size = mem_size;
        self.damage.reconfigure(fb_width_words, fb_height);
        self.ram = vec![0u32; (mem_size / 4) as usize];

        let mem_lim = display_start - 16;
        self.rom[372] = 0x6100_0000u32.wrapping_add(mem_lim >> 16);
        self.rom[373] = 0x4116_0000u32.wrapping_add(mem_lim & 0xFFFF);
        let stack_org = display_start / 2;
        self.rom[376] = 0x6100_0000u32.wrapping_add(stack_org >> 16);

        // Tell the display driver where the framebuffer now lives; disk
        // images built for the default layout still find it at the
        // classic address.
        let header = (DEFAULT_DISPLAY_START / 4) as usize;
        self.ram[header] = 0x5369_7A67; // "SIZg"
        self.ram[header + 1] = screen_width;
        self.ram[header + 2] = screen_height;
        self.ram[header + 3] = display_start;

        self.reset();
    }

    pub fn reset(&mut self) {
        self.pc = ROM_START / 4;
    }

    pub fn set_time(&mut self, tick: u32) {
        self.current_tick = tick;
    }

    pub fn set_switches(&mut self, switches: u32) {
        self.switches = switches;
    }

    pub fn mouse_moved(&mut self, x: i32, y: i32) {
        if (0..4096).contains(&x) {
            self.mouse = (self.mouse & !0x0000_0FFF) | x as u32;
        }
        if (0..4096).contains(&y) {
            self.mouse = (self.mouse & !0x00FF_F000) | ((y as u32) << 12);
        }
    }

    /// `button` is 1 (right), 2 (middle) or 3 (left).
    pub fn mouse_button(&mut self, button: u32, down: bool) {
        if (1..4).contains(&button) {
            let bit = 1u32 << (27 - button);
            if down {
                self.mouse |= bit;
            } else {
                self.mouse &= !bit;
            }
        }
    }

    /// Drops the entire batch if it would overflow the 16-byte FIFO.
    pub fn keyboard_input(&mut self, scancodes: &[u8]) {
        if self.key_fifo.len() + scancodes.len() <= KEY_FIFO_CAPACITY {
            self.key_fifo.extend(scancodes.iter().copied());
        } else {
            debug!(
                "dropping {}-byte keyboard batch: FIFO would overflow",
                scancodes.len()
            );
        }
    }

    pub fn attach_led(&mut self, led: Box<dyn crate::devices::Led>) {
        self.leds = Some(led);
    }

    pub fn attach_serial(&mut self, serial: Box<dyn crate::devices::Serial>) {
        self.serial = Some(serial);
    }

    /// Only slots 1 and 2 are ever addressed by the hardware's slave select.
    pub fn attach_spi(&mut self, index: usize, spi: Box<dyn crate::devices::Spi>) {
        if index == 1 || index == 2 {
            self.spi[index] = Some(spi);
        }
    }

    pub fn attach_clipboard(&mut self, clipboard: Box<dyn crate::devices::Clipboard>) {
        self.clipboard = Some(clipboard);
    }

    /// The framebuffer as 32-bit little-endian words, lowest bit leftmost.
    pub fn framebuffer(&self) -> &[u32] {
        &self.ram[(self.display_start / 4) as usize..]
    }

    pub fn framebuffer_damage(&mut self) -> crate::damage::Damage {
        self.damage.drain()
    }

    pub(crate) fn load_word(&mut self, address: u32) -> u32 {
        if address < self.mem_size {
            self.ram[(address / 4) as usize]
        } else {
            self.load_io(address)
        }
    }

    pub(crate) fn load_byte(&mut self, address: u32) -> u8 {
        let w = self.load_word(address);
        (w >> ((address % 4) * 8)) as u8
    }

    pub(crate) fn store_word(&mut self, address: u32, value: u32) {
        if address < self.display_start {
            self.ram[(address / 4) as usize] = value;
        } else if address < self.mem_size {
            self.ram[(address / 4) as usize] = value;
            self.damage
                .mark_word_dirty(address / 4 - self.display_start / 4);
        } else {
            self.store_io(address, value);
        }
    }

    pub(crate) fn store_byte(&mut self, address: u32, value: u8) {
        if address < self.mem_size {
            let mut w = self.load_word(address);
            let shift = (address & 3) * 8;
            w &= !(0xFFu32 << shift);
            w |= (value as u32) << shift;
            self.store_word(address, w);
        } else {
            self.store_io(address, value as u32);
        }
    }

    fn load_io(&mut self, address: u32) -> u32 {
        match address.wrapping_sub(IO_START) {
            0 => {
                self.progress = self.progress.saturating_sub(1);
                self.current_tick
            }
            4 => self.switches,
            8 => self.serial.as_deref_mut().map_or(0, |s| s.read_data()),
            12 => self.serial.as_deref_mut().map_or(0, |s| s.read_status()),
            16 => self.spi[self.spi_selected]
                .as_deref_mut()
                .map_or(0xFF, |spi| spi.read_data()),
            20 => 1, // bit 0: rx ready; other bits unused
            24 => {
                let mut mouse = self.mouse;
                if !self.key_fifo.is_empty() {
                    mouse |= 0x1000_0000;
                } else {
                    self.progress = self.progress.saturating_sub(1);
                }
                mouse
            }
            28 => self.key_fifo.pop_front().unwrap_or(0) as u32,
            40 => self
                .clipboard
                .as_deref_mut()
                .map_or(0, |c| c.read_control()),
            44 => self.clipboard.as_deref_mut().map_or(0, |c| c.read_data()),
            _ => 0,
        }
    }

    fn store_io(&mut self, address: u32, value: u32) {
        match address.wrapping_sub(IO_START) {
            4 => {
                if let Some(leds) = self.leds.as_deref_mut() {
                    leds.write(value);
                }
            }
            8 => {
                if let Some(serial) = self.serial.as_deref_mut() {
                    serial.write_data(value);
                }
            }
            16 => {
                if let Some(spi) = self.spi[self.spi_selected].as_deref_mut() {
                    spi.write_data(value);
                }
            }
            20 => {
                self.spi_selected = (value & 3) as usize;
            }
            40 => {
                if let Some(clipboard) = self.clipboard.as_deref_mut() {
                    clipboard.write_control(value);
                }
            }
            44 => {
                if let Some(clipboard) = self.clipboard.as_deref_mut() {
                    clipboard.write_data(value);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Machine;

    fn machine() -> Machine {
        Machine::new([0u32; crate::cpu::ROM_WORDS])
    }

    #[test]
    fn word_store_load_round_trips() {
        let mut m = machine();
        m.store_word(0x1000, 0xDEAD_BEEF);
        assert_eq!(m.load_word(0x1000), 0xDEAD_BEEF);
    }

    #[test]
    fn byte_store_preserves_other_bytes_in_word() {
        let mut m = machine();
        m.store_word(0x1000, 0x1122_3344);
        m.store_byte(0x1001, 0xAB);
        let w = m.load_word(0x1000);
        assert_eq!(w.to_le_bytes(), [0x44, 0xAB, 0x22, 0x11]);
        assert_eq!(m.load_byte(0x1001), 0xAB);
    }

    #[test]
    fn out_of_range_load_reads_zero() {
        let mut m = machine();
        assert_eq!(m.load_word(0xFFFF_FF00), 0);
    }

    #[test]
    fn framebuffer_store_marks_damage() {
        let mut m = machine();
        m.framebuffer_damage();
        let addr = m.display_start + 4 * 5;
        m.store_word(addr, 0xFFFF_FFFF);
        let d = m.framebuffer_damage();
        assert_eq!(d.x1, 5);
        assert_eq!(d.x2, 5);
    }

    #[test]
    fn keyboard_input_drops_batch_on_overflow() {
        let mut m = machine();
        m.keyboard_input(&[0u8; 20]);
        assert!(m.key_fifo.is_empty());
        m.keyboard_input(&[1, 2, 3]);
        assert_eq!(m.key_fifo.len(), 3);
    }

    #[test]
    fn configure_memory_clamps_and_patches_rom() {
        let mut m = machine();
        m.configure_memory(0, 640, 480);
        assert_eq!(m.display_start, 1 << 20);
        assert_ne!(m.rom[372], 0);
    }
}
