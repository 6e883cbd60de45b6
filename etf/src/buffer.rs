//! Append-only output storage for the encoder. The capacity doubles to the next power of two
//! whenever a write would not fit, so a message built from many small writes only reallocates a
//! logarithmic number of times.

const INITIAL_CAPACITY: usize = 16;

#[derive(Debug)]
pub struct OutputBuffer {
    bytes: Vec<u8>,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuffer {

    pub fn new() -> Self {
        Self { bytes: Vec::with_capacity(INITIAL_CAPACITY) }
    }

    /// Number of bytes written so far, which is also the position of the next write.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Makes room for `additional` more bytes.
    pub fn ensure(&mut self, additional: usize) {
        let required = self.bytes.len().saturating_add(additional);
        if required > self.bytes.capacity() {
            let target = required.checked_next_power_of_two().unwrap_or(required);
            self.bytes.reserve_exact(target - self.bytes.len());
        }
    }

    pub fn put_slice(&mut self, src: &[u8]) {
        self.ensure(src.len());
        self.bytes.extend_from_slice(src);
    }

    pub fn put_u8(&mut self, v: u8) {
        self.put_slice(&[v]);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.put_slice(&v.to_be_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.put_slice(&v.to_be_bytes());
    }

    pub fn put_i32(&mut self, v: i32) {
        self.put_slice(&v.to_be_bytes());
    }

    pub fn put_f64(&mut self, v: f64) {
        self.put_slice(&v.to_be_bytes());
    }

    /// Overwrites four already written bytes at `at`. Used to fill in lengths which are only known
    /// after the payload has been written. `at + 4` must not lie beyond the written bytes, which
    /// holds for every offset taken from `len()` before a placeholder was put.
    pub(crate) fn patch_u32(&mut self, at: usize, v: u32) {
        self.bytes[at..at + 4].copy_from_slice(&v.to_be_bytes());
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the written bytes without any spare capacity.
    pub fn into_vec(self) -> Vec<u8> {
        let mut bytes = self.bytes;
        bytes.shrink_to_fit();
        bytes
    }

}
