//! PS/2 code-set-2 scancode encoding for the emulated keyboard port.

const LEFT_SHIFT_CODE: u8 = 0x12;
const RIGHT_SHIFT_CODE: u8 = 0x59;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    Digit1, Digit2, Digit3, Digit4, Digit5,
    Digit6, Digit7, Digit8, Digit9, Digit0,

    Return, Escape, Backspace, Tab, Space,
    Minus, Equals, LeftBracket, RightBracket, Backslash,
    Semicolon, Apostrophe, Grave, Comma, Period, Slash,

    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,

    Insert, Home, PageUp, Delete, End, PageDown,
    Right, Left, Down, Up,

    KpDivide, KpMultiply, KpMinus, KpPlus, KpEnter,
    Kp1, Kp2, Kp3, Kp4, Kp5, Kp6, Kp7, Kp8, Kp9, Kp0, KpPeriod,

    NonUsBackslash, Application,
    LeftCtrl, LeftShift, LeftAlt, LeftGui,
    RightCtrl, RightShift, RightAlt, RightGui,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Normal,
    Extended,
    NumLockHack,
    ShiftHack,
}

impl Key {
    fn info(self) -> (u8, Class) {
        use Class::*;
        use Key::*;
        match self {
            A => (0x1C, Normal), B => (0x32, Normal), C => (0x21, Normal),
            D => (0x23, Normal), E => (0x24, Normal), F => (0x2B, Normal),
            G => (0x34, Normal), H => (0x33, Normal), I => (0x43, Normal),
            J => (0x3B, Normal), K => (0x42, Normal), L => (0x4B, Normal),
            M => (0x3A, Normal), N => (0x31, Normal), O => (0x44, Normal),
            P => (0x4D, Normal), Q => (0x15, Normal), R => (0x2D, Normal),
            S => (0x1B, Normal), T => (0x2C, Normal), U => (0x3C, Normal),
            V => (0x2A, Normal), W => (0x1D, Normal), X => (0x22, Normal),
            Y => (0x35, Normal), Z => (0x1A, Normal),

            Digit1 => (0x16, Normal), Digit2 => (0x1E, Normal),
            Digit3 => (0x26, Normal), Digit4 => (0x25, Normal),
            Digit5 => (0x2E, Normal), Digit6 => (0x36, Normal),
            Digit7 => (0x3D, Normal), Digit8 => (0x3E, Normal),
            Digit9 => (0x46, Normal), Digit0 => (0x45, Normal),

            Return => (0x5A, Normal), Escape => (0x76, Normal),
            Backspace => (0x66, Normal), Tab => (0x0D, Normal),
            Space => (0x29, Normal),

            Minus => (0x4E, Normal), Equals => (0x55, Normal),
            LeftBracket => (0x54, Normal), RightBracket => (0x5B, Normal),
            Backslash => (0x5D, Normal),
            Semicolon => (0x4C, Normal), Apostrophe => (0x52, Normal),
            Grave => (0x0E, Normal), Comma => (0x41, Normal),
            Period => (0x49, Normal), Slash => (0x4A, Normal),

            F1 => (0x05, Normal), F2 => (0x06, Normal), F3 => (0x04, Normal),
            F4 => (0x0C, Normal), F5 => (0x03, Normal), F6 => (0x0B, Normal),
            F7 => (0x83, Normal), F8 => (0x0A, Normal), F9 => (0x01, Normal),
            F10 => (0x09, Normal), F11 => (0x78, Normal), F12 => (0x07, Normal),

            Insert => (0x70, NumLockHack), Home => (0x6C, NumLockHack),
            PageUp => (0x7D, NumLockHack), Delete => (0x71, NumLockHack),
            End => (0x69, NumLockHack), PageDown => (0x7A, NumLockHack),
            Right => (0x74, NumLockHack), Left => (0x6B, NumLockHack),
            Down => (0x72, NumLockHack), Up => (0x75, NumLockHack),

            KpDivide => (0x4A, ShiftHack),
            KpMultiply => (0x7C, Normal), KpMinus => (0x7B, Normal),
            KpPlus => (0x79, Normal), KpEnter => (0x5A, Extended),
            Kp1 => (0x69, Normal), Kp2 => (0x72, Normal), Kp3 => (0x7A, Normal),
            Kp4 => (0x6B, Normal), Kp5 => (0x73, Normal), Kp6 => (0x74, Normal),
            Kp7 => (0x6C, Normal), Kp8 => (0x75, Normal), Kp9 => (0x7D, Normal),
            Kp0 => (0x70, Normal), KpPeriod => (0x71, Normal),

            NonUsBackslash => (0x61, Normal),
            Application => (0x2F, Extended),

            LeftCtrl => (0x14, Normal), LeftShift => (LEFT_SHIFT_CODE, Normal),
            LeftAlt => (0x11, Normal), LeftGui => (0x1F, Extended),
            RightCtrl => (0x14, Extended), RightShift => (RIGHT_SHIFT_CODE, Normal),
            RightAlt => (0x11, Extended), RightGui => (0x27, Extended),
        }
    }
}

/// A PS/2 byte sequence, at most 8 bytes, with no heap allocation.
#[derive(Debug, Clone, Copy)]
pub struct ScancodeSequence {
    bytes: [u8; 8],
    len: usize,
}

impl ScancodeSequence {
    fn new() -> Self {
        ScancodeSequence { bytes: [0; 8], len: 0 }
    }

    fn push(&mut self, byte: u8) {
        self.bytes[self.len] = byte;
        self.len += 1;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Encodes make/break key events into PS/2 code-set-2 byte sequences,
/// tracking its own shift-key state for the keypad-divide quirk rather
/// than querying a host modifier API.
#[derive(Debug, Default)]
pub struct Ps2Encoder {
    left_shift_held: bool,
    right_shift_held: bool,
}

impl Ps2Encoder {
    pub fn new() -> Self {
        Ps2Encoder::default()
    }

    pub fn encode(&mut self, key: Key, make: bool) -> ScancodeSequence {
        let (code, class) = key.info();
        let mut out = ScancodeSequence::new();

        match class {
            Class::Normal => {
                if !make {
                    out.push(0xF0);
                }
                out.push(code);
            }
            Class::Extended => {
                out.push(0xE0);
                if !make {
                    out.push(0xF0);
                }
                out.push(code);
            }
            Class::NumLockHack => {
                if make {
                    out.push(0xE0);
                    out.push(LEFT_SHIFT_CODE);
                    out.push(0xE0);
                    out.push(code);
                } else {
                    out.push(0xE0);
                    out.push(0xF0);
                    out.push(code);
                    out.push(0xE0);
                    out.push(0xF0);
                    out.push(LEFT_SHIFT_CODE);
                }
            }
            Class::ShiftHack => {
                if make {
                    if self.left_shift_held {
                        out.push(0xE0);
                        out.push(0xF0);
                        out.push(LEFT_SHIFT_CODE);
                    }
                    if self.right_shift_held {
                        out.push(0xE0);
                        out.push(0xF0);
                        out.push(RIGHT_SHIFT_CODE);
                    }
                    out.push(0xE0);
                    out.push(code);
                } else {
                    out.push(0xE0);
                    out.push(0xF0);
                    out.push(code);
                    if self.right_shift_held {
                        out.push(0xE0);
                        out.push(RIGHT_SHIFT_CODE);
                    }
                    if self.left_shift_held {
                        out.push(0xE0);
                        out.push(LEFT_SHIFT_CODE);
                    }
                }
            }
        }

        match key {
            Key::LeftShift => self.left_shift_held = make,
            Key::RightShift => self.right_shift_held = make,
            _ => {}
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_key_press_is_single_byte() {
        let mut enc = Ps2Encoder::new();
        assert_eq!(enc.encode(Key::A, true).as_slice(), &[0x1C]);
    }

    #[test]
    fn normal_key_release_is_prefixed_with_f0() {
        let mut enc = Ps2Encoder::new();
        assert_eq!(enc.encode(Key::A, false).as_slice(), &[0xF0, 0x1C]);
    }

    #[test]
    fn extended_key_press_is_prefixed_with_e0() {
        let mut enc = Ps2Encoder::new();
        assert_eq!(enc.encode(Key::RightCtrl, true).as_slice(), &[0xE0, 0x14]);
    }

    #[test]
    fn numlock_hack_wraps_code_in_fake_shift() {
        let mut enc = Ps2Encoder::new();
        assert_eq!(
            enc.encode(Key::Up, true).as_slice(),
            &[0xE0, 0x12, 0xE0, 0x75]
        );
        assert_eq!(
            enc.encode(Key::Up, false).as_slice(),
            &[0xE0, 0xF0, 0x75, 0xE0, 0xF0, 0x12]
        );
    }

    #[test]
    fn shift_hack_cancels_held_shift_around_code() {
        let mut enc = Ps2Encoder::new();
        enc.encode(Key::LeftShift, true);
        assert_eq!(
            enc.encode(Key::KpDivide, true).as_slice(),
            &[0xE0, 0xF0, 0x12, 0xE0, 0x4A]
        );
        assert_eq!(
            enc.encode(Key::KpDivide, false).as_slice(),
            &[0xE0, 0xF0, 0x4A, 0xE0, 0x12]
        );
    }

    #[test]
    fn shift_hack_with_no_shift_held_emits_bare_code() {
        let mut enc = Ps2Encoder::new();
        assert_eq!(enc.encode(Key::KpDivide, true).as_slice(), &[0xE0, 0x4A]);
    }
}
