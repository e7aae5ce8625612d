//! Register access.
//!
//! Every register the clock controller touches is reached through the
//! [`Mmio`] trait, so the same sequencing code drives the real register file
//! on target and a simulated one on the host. Busy-waits go through the same
//! trait, which lets a simulated backend advance a virtual clock instead of
//! sleeping.
use core::fmt;

/// 32-bit memory-mapped register access with microsecond delays.
pub trait Mmio {
    /// Read the 32-bit register at physical address `addr`.
    fn read32(&mut self, addr: u32) -> u32;

    /// Write `value` to the 32-bit register at physical address `addr`.
    fn write32(&mut self, addr: u32, value: u32);

    /// Busy-wait for at least `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Read the register at `addr`, pass its value through `f`, and write the
    /// result back.
    fn modify32(&mut self, addr: u32, f: impl FnOnce(u32) -> u32)
    where
        Self: Sized,
    {
        let val = self.read32(addr);
        self.write32(addr, f(val));
    }

    /// Poll the register at `addr` until any bit in `mask` reads as set.
    ///
    /// The register is re-read once per microsecond. After `timeout_us`
    /// microseconds have been spent waiting, this gives up and returns
    /// [`PollTimeout`]. On success, the last value read is returned.
    fn poll32(&mut self, addr: u32, mask: u32, timeout_us: u32) -> Result<u32, PollTimeout> {
        let mut waited_us = 0;
        loop {
            let val = self.read32(addr);
            if val & mask != 0 {
                return Ok(val);
            }

            if waited_us >= timeout_us {
                return Err(PollTimeout { addr, waited_us });
            }

            self.delay_us(1);
            waited_us += 1;
        }
    }
}

impl<M: Mmio + ?Sized> Mmio for &mut M {
    #[inline]
    fn read32(&mut self, addr: u32) -> u32 {
        (**self).read32(addr)
    }

    #[inline]
    fn write32(&mut self, addr: u32, value: u32) {
        (**self).write32(addr, value)
    }

    #[inline]
    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    #[inline]
    fn poll32(&mut self, addr: u32, mask: u32, timeout_us: u32) -> Result<u32, PollTimeout> {
        (**self).poll32(addr, mask, timeout_us)
    }
}

/// Returned by [`Mmio::poll32`] when the condition never came true.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PollTimeout {
    /// The register that was being polled.
    pub addr: u32,
    /// How long we waited before giving up.
    pub waited_us: u32,
}

impl fmt::Display for PollTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { addr, waited_us } = self;
        write!(f, "timed out after {waited_us}us polling register {addr:#010x}")
    }
}

#[cfg(feature = "use-std")]
impl std::error::Error for PollTimeout {}

/// Volatile access to the physical register file.
///
/// Addresses are used as-is, so the ANATOP, CCM, GPC and SRC blocks must be
/// identity-mapped. Delays are delegated to the provided closure, which is
/// called with a number of microseconds.
pub struct Volatile<D> {
    delay: D,
}

impl<D: FnMut(u32)> Volatile<D> {
    /// # Safety
    ///
    /// - The ANATOP, CCM, GPC and SRC register blocks must be identity-mapped
    ///   and accessible.
    /// - Nothing else may be reconfiguring clocks while this exists.
    pub unsafe fn new(delay: D) -> Self {
        Self { delay }
    }
}

impl<D: FnMut(u32)> Mmio for Volatile<D> {
    #[inline]
    fn read32(&mut self, addr: u32) -> u32 {
        // SAFETY: the constructor requires the register blocks to be mapped.
        unsafe { core::ptr::read_volatile(addr as usize as *const u32) }
    }

    #[inline]
    fn write32(&mut self, addr: u32, value: u32) {
        // SAFETY: the constructor requires the register blocks to be mapped.
        unsafe { core::ptr::write_volatile(addr as usize as *mut u32, value) }
    }

    #[inline]
    fn delay_us(&mut self, us: u32) {
        (self.delay)(us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A register that becomes ready after a fixed number of reads.
    struct Countdown {
        reads_until_ready: u32,
        reads: u32,
        delayed_us: u32,
    }

    impl Mmio for Countdown {
        fn read32(&mut self, _addr: u32) -> u32 {
            self.reads += 1;
            if self.reads > self.reads_until_ready {
                0b100
            } else {
                0
            }
        }

        fn write32(&mut self, _addr: u32, _value: u32) {}

        fn delay_us(&mut self, us: u32) {
            self.delayed_us += us;
        }
    }

    #[test]
    fn poll_returns_ready_value() {
        let mut regs = Countdown {
            reads_until_ready: 3,
            reads: 0,
            delayed_us: 0,
        };
        assert_eq!(regs.poll32(0x1000, 0b100, 10), Ok(0b100));
        assert_eq!(regs.reads, 4);
        assert_eq!(regs.delayed_us, 3);
    }

    #[test]
    fn poll_timeout_spends_exactly_the_budget() {
        let mut regs = Countdown {
            reads_until_ready: u32::MAX,
            reads: 0,
            delayed_us: 0,
        };
        let err = regs.poll32(0x1000, 0b100, 600).unwrap_err();
        assert_eq!(
            err,
            PollTimeout {
                addr: 0x1000,
                waited_us: 600
            }
        );
        assert_eq!(regs.delayed_us, 600);
    }

    #[test]
    fn poll_with_zero_budget_reads_once() {
        let mut regs = Countdown {
            reads_until_ready: u32::MAX,
            reads: 0,
            delayed_us: 0,
        };
        assert!(regs.poll32(0x1000, 0b100, 0).is_err());
        assert_eq!(regs.reads, 1);
        assert_eq!(regs.delayed_us, 0);
    }

    #[test]
    fn modify_through_reference() {
        struct One(u32);
        impl Mmio for One {
            fn read32(&mut self, _: u32) -> u32 {
                self.0
            }
            fn write32(&mut self, _: u32, value: u32) {
                self.0 = value;
            }
            fn delay_us(&mut self, _: u32) {}
        }

        let mut reg = One(0b0101);
        Mmio::modify32(&mut &mut reg, 0, |v| v | 0b1000);
        assert_eq!(reg.0, 0b1101);
    }
}
