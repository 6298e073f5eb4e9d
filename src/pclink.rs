//! The PCLink host<->guest file transfer protocol, layered over the same
//! serial port model used by `RS232`. A host drops a one-line job file
//! (`PCLink.REC`/`PCLink.SND`) naming a file to receive or send; the guest's
//! PCLink driver polls `read_status` and drives the rest of the exchange.

use crate::devices::Serial;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;

const ACK: u8 = 0x10;
const REC: u8 = 0x21;
const SND: u8 = 0x22;
const REC_JOB: &str = "PCLink.REC";
const SND_JOB: &str = "PCLink.SND";
/// Job files larger than this aren't a single filename; ignore them.
const MAX_JOB_FILE_LEN: u64 = 33;
const MAX_REC_FILE_LEN: u64 = 0x0100_0000;

pub struct PcLink {
    dir: PathBuf,
    mode: u8,
    rx_count: u32,
    tx_count: u32,
    filename: String,
    fnlen: u32,
    flen: i32,
    file: Option<File>,
    buf: [u8; 256],
}

impl PcLink {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        PcLink {
            dir: working_dir.into(),
            mode: 0,
            rx_count: 0,
            tx_count: 0,
            filename: String::new(),
            fnlen: 0,
            flen: 0,
            file: None,
            buf: [0; 256],
        }
    }

    /// Reads a job file's single-line filename, deleting the job file if its
    /// contents don't look like exactly one filename.
    fn get_job(&self, job_name: &str) -> Option<String> {
        let path = self.dir.join(job_name);
        let size = fs::metadata(&path).ok()?.len();
        if size == 0 || size > MAX_JOB_FILE_LEN {
            let _ = fs::remove_file(&path);
            return None;
        }
        let contents = fs::read_to_string(&path).ok()?;
        let name: String = contents.lines().next().unwrap_or("").trim().chars().take(31).collect();
        if name.is_empty() {
            let _ = fs::remove_file(&path);
            return None;
        }
        Some(name)
    }

    fn start_rec(&mut self, name: String) {
        if let Ok(meta) = fs::metadata(self.dir.join(&name)) {
            let size = meta.len();
            if size < MAX_REC_FILE_LEN {
                if let Ok(file) = File::open(self.dir.join(&name)) {
                    self.fnlen = name.len() as u32 + 1;
                    self.filename = name;
                    self.flen = size as i32;
                    self.file = Some(file);
                    self.mode = REC;
                    self.rx_count = 0;
                    self.tx_count = 0;
                    info!("PCLink REC {} ({} bytes)", self.filename, self.flen);
                }
            }
        }
        if self.mode == 0 {
            let _ = fs::remove_file(self.dir.join(REC_JOB));
        }
    }

    fn start_snd(&mut self, name: String) {
        if let Ok(file) = File::create(self.dir.join(&name)) {
            self.fnlen = name.len() as u32 + 1;
            self.filename = name;
            self.flen = -1;
            self.file = Some(file);
            self.mode = SND;
            self.rx_count = 0;
            self.tx_count = 0;
            info!("PCLink SND {}", self.filename);
        }
        if self.mode == 0 {
            let _ = fs::remove_file(self.dir.join(SND_JOB));
        }
    }
}

impl Serial for PcLink {
    fn read_status(&mut self) -> u32 {
        if self.mode == 0 {
            if let Some(name) = self.get_job(REC_JOB) {
                self.start_rec(name);
            } else if let Some(name) = self.get_job(SND_JOB) {
                self.start_snd(name);
            }
        }
        2 + (self.mode != 0) as u32
    }

    fn read_data(&mut self) -> u32 {
        let mut ch: u8 = 0;
        if self.mode != 0 {
            if self.rx_count == 0 {
                ch = self.mode;
            } else if self.rx_count < self.fnlen + 1 {
                let idx = (self.rx_count - 1) as usize;
                ch = self.filename.as_bytes().get(idx).copied().unwrap_or(0);
            } else if self.mode == SND {
                ch = ACK;
                if self.flen == 0 {
                    self.mode = 0;
                    let _ = fs::remove_file(self.dir.join(SND_JOB));
                }
            } else {
                let pos = (self.rx_count - self.fnlen - 1) % 256;
                if pos == 0 || self.flen == 0 {
                    if self.flen > 255 {
                        ch = 255;
                    } else {
                        ch = self.flen as u8;
                        if self.flen == 0 {
                            self.mode = 0;
                            let _ = fs::remove_file(self.dir.join(REC_JOB));
                        }
                    }
                } else if let Some(file) = self.file.as_mut() {
                    let mut byte = [0u8];
                    match file.read_exact(&mut byte) {
                        Ok(()) => {
                            ch = byte[0];
                            self.flen -= 1;
                        }
                        Err(e) => warn!("PCLink REC short read: {}", e),
                    }
                }
            }
        }
        self.rx_count += 1;
        ch as u32
    }

    fn write_data(&mut self, value: u32) {
        if self.mode != 0 {
            if self.tx_count == 0 {
                if value != ACK as u32 {
                    self.file = None;
                    if self.mode == SND {
                        let _ = fs::remove_file(self.dir.join(&self.filename));
                        let _ = fs::remove_file(self.dir.join(SND_JOB));
                    } else {
                        let _ = fs::remove_file(self.dir.join(REC_JOB));
                    }
                    self.mode = 0;
                }
            } else if self.mode == SND {
                let pos = ((self.tx_count - 1) % 256) as usize;
                self.buf[pos] = value as u8;
                let lim = self.buf[0] as usize;
                if pos == lim {
                    if let Some(file) = self.file.as_mut() {
                        let _ = file.write_all(&self.buf[1..1 + lim]);
                    }
                    if lim < 255 {
                        self.flen = 0;
                        self.file = None;
                    }
                }
            }
        }
        self.tx_count += 1;
    }
}
