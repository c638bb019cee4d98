//! Three-sample majority debounce over a bit-packed input word.
//!
//! Each bit is filtered independently. An output bit turns on after the input
//! has been on for three consecutive samples and turns off after three
//! consecutive off samples; anything in between holds the previous output.

/// Filter memory: the two previous samples and the current output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceState {
    b: u32,
    c: u32,
    z: u32,
}

impl DebounceState {
    /// All history and output bits clear.
    pub const fn new() -> Self {
        Self { b: 0, c: 0, z: 0 }
    }

    /// Feed one sample, get the filtered word.
    #[inline]
    pub fn update(&mut self, a: u32) -> u32 {
        self.z = (self.z & (a | self.b | self.c)) | (a & self.b & self.c);
        self.c = self.b;
        self.b = a;
        self.z
    }

    /// Current filtered word.
    #[inline]
    pub fn output(&self) -> u32 {
        self.z
    }
}
