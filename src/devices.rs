//! The capability traits that stand in for the reference implementation's
//! function-pointer-bearing structs (`RISC_Serial`, `RISC_SPI`,
//! `RISC_Clipboard`, `RISC_LED`). Each wired device on the I/O bus
//! implements exactly the capability set it needs; the bus holds each as an
//! owned `Box<dyn Trait>` in an `Option` slot rather than reaching for a
//! hidden global, so a device absent from a slot is just `None`.

pub trait Led {
    fn write(&mut self, value: u32);
}

pub trait Serial {
    fn read_status(&mut self) -> u32;
    fn read_data(&mut self) -> u32;
    fn write_data(&mut self, value: u32);
}

pub trait Spi {
    fn read_data(&mut self) -> u32;
    fn write_data(&mut self, value: u32);
}

pub trait Clipboard {
    fn write_control(&mut self, value: u32);
    fn read_control(&mut self) -> u32;
    fn write_data(&mut self, value: u32);
    fn read_data(&mut self) -> u32;
}
