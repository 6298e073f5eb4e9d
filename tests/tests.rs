//! Black-box tests exercising only the crate's public surface: constructing
//! a machine, attaching devices, and driving them the way a frontend would.
//! Instruction-level behavior (register arithmetic, byte stores, branch
//! links) is exercised at the unit level next to the interpreter, since the
//! bus internals those tests poke are deliberately not part of the public
//! API a host embeds against.

use oberon_risc_emu::cpu::ROM_WORDS;
use oberon_risc_emu::devices::Spi;
use oberon_risc_emu::disk::Disk;
use oberon_risc_emu::pclink::PcLink;
use oberon_risc_emu::ps2::{Key, Ps2Encoder};
use oberon_risc_emu::Machine;
use std::fs;
use std::sync::atomic::{AtomicU32, Ordering};

fn branch_to_self_rom() -> [u32; ROM_WORDS] {
    let mut rom = [0u32; ROM_WORDS];
    // Branch-form, always-true predicate (bits 24..26 = 7), u=1 (pc-relative),
    // offset -1: branches back to the instruction that just ran. An idle
    // busy-loop standing in for real firmware, which is supplied as an
    // opaque binary blob outside this crate's scope.
    rom[0] = 0xE000_0000u32 | (7 << 24) | 0x00FF_FFFF;
    rom
}

#[test]
fn idle_machine_runs_without_fault_and_stays_in_rom() {
    let mut m = Machine::new(branch_to_self_rom());
    m.set_time(0);
    m.run(1_000_000);
    assert_eq!(m.program_counter(), 0xFFFF_F800 / 4);
}

#[test]
fn fresh_machine_reports_full_damage_once() {
    let mut m = Machine::new(branch_to_self_rom());
    let first = m.framebuffer_damage();
    assert!(first.y1 <= first.y2, "a fresh machine starts fully dirty");
    let second = m.framebuffer_damage();
    assert!(second.y1 > second.y2, "draining resets to empty");
}

static DISK_COUNTER: AtomicU32 = AtomicU32::new(0);

fn scratch_disk_image() -> std::path::PathBuf {
    let n = DISK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!("oberon_disk_test_{}_{}.img", std::process::id(), n));
    fs::write(&path, vec![0u8; 512 * 4]).unwrap();
    path
}

#[test]
fn disk_replay_round_trips_a_written_sector() {
    let path = scratch_disk_image();
    let mut disk = Disk::open(&path).expect("open scratch image");

    let send_command = |disk: &mut Disk, cmd: u8, arg: u32| {
        disk.write_data(0xFF);
        disk.write_data(cmd as u32);
        disk.write_data((arg >> 24) & 0xFF);
        disk.write_data((arg >> 16) & 0xFF);
        disk.write_data((arg >> 8) & 0xFF);
        disk.write_data(0);
    };

    // CMD24: write sector 0 with a recognizable pattern.
    send_command(&mut disk, 88, 0);
    disk.write_data(0xFF);
    disk.read_data();
    disk.write_data(254);
    for i in 0..128u32 {
        disk.write_data(i);
    }
    disk.write_data(0);
    disk.write_data(0);

    // CMD17: read sector 0 back via the attached-as-SPI-device interface.
    send_command(&mut disk, 81, 0);
    disk.write_data(0xFF);
    disk.read_data();
    disk.write_data(0xFF);
    assert_eq!(disk.read_data(), 0);
    disk.write_data(0xFF);
    assert_eq!(disk.read_data(), 254);
    disk.write_data(0xFF);
    assert_eq!(disk.read_data(), 0); // first word of sector 0, written as 0

    fs::remove_file(&path).ok();
}

#[test]
fn disk_attaches_to_machine_spi_slot() {
    let path = scratch_disk_image();
    let disk = Disk::open(&path).expect("open scratch image");
    let mut m = Machine::new(branch_to_self_rom());
    m.attach_spi(1, Box::new(disk));
    fs::remove_file(&path).ok();
}

#[test]
fn scenario_ps2_numlock_hack_press_release_of_up() {
    let mut encoder = Ps2Encoder::new();
    assert_eq!(encoder.encode(Key::Up, true).as_slice(), &[0xE0, 0x12, 0xE0, 0x75]);
    assert_eq!(
        encoder.encode(Key::Up, false).as_slice(),
        &[0xE0, 0xF0, 0x75, 0xE0, 0xF0, 0x12]
    );
}

#[test]
fn machine_keyboard_input_feeds_through_to_status_and_data_ports() {
    let mut m = Machine::new(branch_to_self_rom());
    let mut encoder = Ps2Encoder::new();
    let seq = encoder.encode(Key::A, true);
    m.keyboard_input(seq.as_slice());
    // No public peek at the FIFO besides running the CPU against it; this
    // simply checks that feeding a batch doesn't panic or get silently
    // capped below its declared 16-byte capacity.
    m.keyboard_input(&[0u8; 16]);
}

static PCLINK_COUNTER: AtomicU32 = AtomicU32::new(0);

fn scratch_pclink_dir() -> std::path::PathBuf {
    let n = PCLINK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("oberon_pclink_test_{}_{}", std::process::id(), n));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn pclink_rec_job_transfers_a_file_end_to_end() {
    let dir = scratch_pclink_dir();
    fs::write(dir.join("Payload.Mod"), b"end to end").unwrap();
    fs::write(dir.join("PCLink.REC"), "Payload.Mod\n").unwrap();

    let mut link = PcLink::new(&dir);
    assert_eq!(link.read_status(), 3); // job picked up, xmit ready

    let mut received = Vec::new();
    received.push(link.read_data() as u8); // mode byte
    for _ in 0.."Payload.Mod".len() + 1 {
        received.push(link.read_data() as u8); // filename + NUL
    }
    let len = link.read_data() as u8;
    for _ in 0..len {
        received.push(link.read_data() as u8);
    }
    assert_eq!(link.read_data(), 0); // zero-length marks completion
    assert_eq!(&received[received.len() - len as usize..], b"end to end");

    fs::remove_dir_all(&dir).ok();
}
