use crate::error::FaultKind;

/// LS8 can address 256 bytes.
pub const MEMORY_SIZE: usize = 0x100;

/// Flat byte-addressed memory. Holds the program, its data and the stack.
#[derive(Clone)]
pub struct Memory {
    cells: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            cells: [0; MEMORY_SIZE],
        }
    }

    pub fn read(&self, addr: usize) -> Result<u8, FaultKind> {
        self.cells
            .get(addr)
            .copied()
            .ok_or(FaultKind::AddressOutOfRange(addr))
    }

    pub fn write(&mut self, addr: usize, val: u8) -> Result<(), FaultKind> {
        let cell = self
            .cells
            .get_mut(addr)
            .ok_or(FaultKind::AddressOutOfRange(addr))?;
        *cell = val;
        Ok(())
    }

    /// Read without faulting, for trace output.
    pub fn peek(&self, addr: usize) -> Option<u8> {
        self.cells.get(addr).copied()
    }

    /// Copy `bytes` to the start of memory. Nothing is written if they do not fit.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<(), FaultKind> {
        if bytes.len() > MEMORY_SIZE {
            return Err(FaultKind::AddressOutOfRange(bytes.len() - 1));
        }
        self.cells[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_write_bounds() {
        let mut mem = Memory::new();
        mem.write(0, 0x82).unwrap();
        mem.write(0xFF, 0x01).unwrap();
        assert_eq!(mem.read(0), Ok(0x82));
        assert_eq!(mem.read(0xFF), Ok(0x01));
        assert_eq!(mem.read(0x100), Err(FaultKind::AddressOutOfRange(0x100)));
        assert_eq!(
            mem.write(0x100, 1),
            Err(FaultKind::AddressOutOfRange(0x100))
        );
        assert_eq!(mem.peek(0x100), None);
    }

    #[test]
    fn write_all_is_all_or_nothing() {
        let mut mem = Memory::new();
        assert!(mem.write_all(&[1; MEMORY_SIZE + 1]).is_err());
        assert_eq!(mem.read(0), Ok(0));

        mem.write_all(&[1, 2, 3]).unwrap();
        assert_eq!(mem.read(2), Ok(3));
        assert_eq!(mem.read(3), Ok(0));
    }
}
