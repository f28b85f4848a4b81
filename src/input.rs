//! Input Bindings
//!
//! The fixed catalog of logical 3DS inputs, their default SDL scancodes, and
//! the pressed-state bitset the emulation window keeps up to date.

use sdl2::keyboard::Scancode;

/// Number of logical inputs in the catalog
pub const NUM_INPUTS: usize = 24;

/// Logical input names, in catalog order
pub const MAPPING: [&str; NUM_INPUTS] = [
    "pad_a",
    "pad_b",
    "pad_x",
    "pad_y",
    "pad_l",
    "pad_r",
    "pad_zl",
    "pad_zr",
    "pad_start",
    "pad_select",
    "pad_home",
    "pad_dup",
    "pad_ddown",
    "pad_dleft",
    "pad_dright",
    "pad_cup",
    "pad_cdown",
    "pad_cleft",
    "pad_cright",
    "pad_circle_up",
    "pad_circle_down",
    "pad_circle_left",
    "pad_circle_right",
    "pad_circle_modifier",
];

/// Default scancode for each catalog entry
pub const DEFAULTS: [i32; NUM_INPUTS] = [
    // directly mapped keys
    Scancode::A as i32,
    Scancode::S as i32,
    Scancode::Z as i32,
    Scancode::X as i32,
    Scancode::Q as i32,
    Scancode::W as i32,
    Scancode::Num1 as i32,
    Scancode::Num2 as i32,
    Scancode::M as i32,
    Scancode::N as i32,
    Scancode::B as i32,
    Scancode::T as i32,
    Scancode::G as i32,
    Scancode::F as i32,
    Scancode::H as i32,
    Scancode::I as i32,
    Scancode::K as i32,
    Scancode::J as i32,
    Scancode::L as i32,
    // indirectly mapped keys
    Scancode::Up as i32,
    Scancode::Down as i32,
    Scancode::Left as i32,
    Scancode::Right as i32,
    Scancode::D as i32,
];

/// Find a logical input by name (case-sensitive)
pub fn index_of(name: &str) -> Option<usize> {
    MAPPING.iter().position(|&n| n == name)
}

/// Human readable name of a scancode
pub fn scancode_name(code: i32) -> String {
    match Scancode::from_i32(code).map(|sc| sc.name()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("Unknown ({})", code),
    }
}

/// Current physical code of every logical input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingTable {
    codes: [i32; NUM_INPUTS],
}

impl Default for BindingTable {
    fn default() -> Self {
        Self { codes: DEFAULTS }
    }
}

impl BindingTable {
    /// Physical code bound to the `index`-th input
    pub fn code(&self, index: usize) -> i32 {
        self.codes[index]
    }

    /// Rebind the `index`-th input
    pub fn set(&mut self, index: usize, code: i32) {
        self.codes[index] = code;
    }

    /// Logical input bound to a physical code, if any
    pub fn lookup(&self, code: i32) -> Option<usize> {
        self.codes.iter().position(|&c| c == code)
    }

    /// (logical name, physical code) pairs in catalog order
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        MAPPING.iter().copied().zip(self.codes.iter().copied())
    }
}

/// Pressed state of the logical inputs (bit n = catalog entry n)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState(u32);

impl ButtonState {
    /// Set input state
    pub fn set(&mut self, index: usize, pressed: bool) {
        if pressed {
            self.0 |= 1 << index;
        } else {
            self.0 &= !(1 << index);
        }
    }

    /// Check if input is pressed
    pub fn is_pressed(&self, index: usize) -> bool {
        (self.0 & (1 << index)) != 0
    }

    /// Raw bitmask
    pub fn bits(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_names_unique() {
        let names: HashSet<&str> = MAPPING.iter().copied().collect();
        assert_eq!(names.len(), NUM_INPUTS);
    }

    #[test]
    fn test_index_of_is_case_sensitive() {
        assert_eq!(index_of("pad_a"), Some(0));
        assert_eq!(index_of("pad_circle_modifier"), Some(NUM_INPUTS - 1));
        assert_eq!(index_of("PAD_A"), None);
        assert_eq!(index_of("pad_q"), None);
        assert_eq!(index_of(""), None);
    }

    #[test]
    fn test_default_bindings() {
        let table = BindingTable::default();
        assert_eq!(table.code(0), Scancode::A as i32);
        assert_eq!(table.code(index_of("pad_circle_up").unwrap()), Scancode::Up as i32);
        assert_eq!(table.lookup(Scancode::S as i32), Some(1));
        assert_eq!(table.lookup(Scancode::Escape as i32), None);
    }

    #[test]
    fn test_entries_in_catalog_order() {
        let mut table = BindingTable::default();
        table.set(2, 99);
        let entries: Vec<_> = table.entries().collect();
        assert_eq!(entries.len(), NUM_INPUTS);
        assert_eq!(entries[0].0, "pad_a");
        assert_eq!(entries[2], ("pad_x", 99));
    }

    #[test]
    fn test_scancode_name() {
        assert_eq!(scancode_name(Scancode::A as i32), "A");
        assert_eq!(scancode_name(Scancode::Up as i32), "Up");
        assert_eq!(scancode_name(-1), "Unknown (-1)");
    }

    #[test]
    fn test_button_state() {
        let mut state = ButtonState::default();
        assert!(!state.is_pressed(0));

        state.set(0, true);
        state.set(23, true);
        assert!(state.is_pressed(0));
        assert!(state.is_pressed(23));
        assert_eq!(state.bits(), (1 << 23) | 1);

        state.set(0, false);
        assert!(!state.is_pressed(0));
        assert_eq!(state.bits(), 1 << 23);
    }
}
