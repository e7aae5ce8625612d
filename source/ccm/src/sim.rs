//! A simulated register bank for running the clock controller on the host.
//!
//! [`SimBank`] stores every register in a sparse map (unwritten registers
//! read as 0) and models just enough of the PLLs to drive the configuration
//! sequences: whenever a PLL's `GNRL_CTL` is written, its `LOCK` bit follows
//! its `RST` bit. Delays advance a virtual clock instead of sleeping.
use crate::{
    pll::{IntPllRate, PllId},
    regs::{DivCtl, GnrlCtl},
    Mmio,
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default)]
pub struct SimBank {
    regs: BTreeMap<u32, u32>,
    stuck: BTreeSet<PllId>,
    elapsed_us: u64,
    reads: Vec<u32>,
    writes: Vec<(u32, u32)>,
}

impl SimBank {
    /// An all-zero register bank. Every PLL is held in reset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A register bank in the state the boot ROM leaves it in.
    ///
    /// The first two system PLLs run locked at 800 MHz and 1 GHz with all of
    /// their output taps gated. The fractional PLLs are bypassed and held in
    /// reset with their outputs enabled. Everything else reads as 0.
    #[must_use]
    pub fn power_on() -> Self {
        let mut bank = Self::new();
        for (pll, rate) in [
            (PllId::Sys1, IntPllRate::Mhz800),
            (PllId::Sys2, IntPllRate::Mhz1000),
        ] {
            let d = rate.dividers();
            let ctl = GnrlCtl::new()
                .with(GnrlCtl::RST, true)
                .with(GnrlCtl::LOCK, true);
            let div = DivCtl::new()
                .with(DivCtl::MAIN_DIV, u32::from(d.main))
                .with(DivCtl::PRE_DIV, u32::from(d.pre))
                .with(DivCtl::POST_DIV, u32::from(d.post));
            bank.poke(pll.gnrl_ctl(), ctl.bits());
            bank.poke(pll.div_ctl(), div.bits());
        }

        for pll in [PllId::Audio1, PllId::Audio2, PllId::Video, PllId::Dram] {
            let ctl = GnrlCtl::new()
                .with(GnrlCtl::BYPASS, true)
                .with(GnrlCtl::CLKE, true);
            bank.poke(pll.gnrl_ctl(), ctl.bits());
        }
        bank
    }

    /// Make `pll` never assert lock, no matter how it is programmed.
    #[must_use]
    pub fn never_lock(mut self, pll: PllId) -> Self {
        self.stuck.insert(pll);
        self
    }

    /// Read a register without logging it or running the PLL model.
    #[must_use]
    pub fn peek(&self, addr: u32) -> u32 {
        self.regs.get(&addr).copied().unwrap_or(0)
    }

    /// Write a register without logging it or running the PLL model.
    pub fn poke(&mut self, addr: u32, value: u32) {
        self.regs.insert(addr, value);
    }

    /// Total time spent in [`Mmio::delay_us`].
    #[must_use]
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    /// Addresses of every [`Mmio::read32`], in order.
    #[must_use]
    pub fn reads(&self) -> &[u32] {
        &self.reads
    }

    /// Every [`Mmio::write32`] as `(addr, value)`, in order.
    #[must_use]
    pub fn writes(&self) -> &[(u32, u32)] {
        &self.writes
    }

    pub fn clear_log(&mut self) {
        self.reads.clear();
        self.writes.clear();
    }

    /// A copy of every register that has been written.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<u32, u32> {
        self.regs.clone()
    }

    fn model_pll(&self, pll: PllId, value: u32) -> u32 {
        let mut ctl = GnrlCtl::from_bits(value);
        let locks = ctl.get(GnrlCtl::RST) && !self.stuck.contains(&pll);
        ctl.set(GnrlCtl::LOCK, locks);
        ctl.bits()
    }
}

impl Mmio for SimBank {
    fn read32(&mut self, addr: u32) -> u32 {
        self.reads.push(addr);
        self.peek(addr)
    }

    fn write32(&mut self, addr: u32, value: u32) {
        self.writes.push((addr, value));
        let value = match PllId::from_gnrl_ctl(addr) {
            Some(pll) => self.model_pll(pll, value),
            None => value,
        };
        tracing::trace!(
            addr = %format_args!("{addr:#010x}"),
            value = %format_args!("{value:#010x}"),
            "sim write"
        );
        self.regs.insert(addr, value);
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += u64::from(us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Ccm, ClockSource, Frequency, Off};

    #[test]
    fn lock_follows_reset() {
        let mut bank = SimBank::new();
        let gnrl = PllId::Gpu.gnrl_ctl();
        bank.write32(gnrl, GnrlCtl::new().with(GnrlCtl::RST, true).bits());
        assert!(GnrlCtl::from_bits(bank.peek(gnrl)).get(GnrlCtl::LOCK));

        // software can't set LOCK itself
        bank.write32(gnrl, GnrlCtl::new().with(GnrlCtl::LOCK, true).bits());
        assert!(!GnrlCtl::from_bits(bank.peek(gnrl)).get(GnrlCtl::LOCK));
    }

    #[test]
    fn stuck_pll_never_locks() {
        let mut bank = SimBank::new().never_lock(PllId::Arm);
        let gnrl = PllId::Arm.gnrl_ctl();
        bank.write32(gnrl, GnrlCtl::new().with(GnrlCtl::RST, true).bits());
        assert!(!GnrlCtl::from_bits(bank.peek(gnrl)).get(GnrlCtl::LOCK));
    }

    #[test]
    fn non_pll_registers_are_plain_storage() {
        let mut bank = SimBank::new();
        bank.write32(0x3038_4000, 0xFFFF_FFFF);
        assert_eq!(bank.read32(0x3038_4000), 0xFFFF_FFFF);
        assert_eq!(bank.read32(0x3038_4010), 0);
        assert_eq!(bank.writes(), &[(0x3038_4000, 0xFFFF_FFFF)]);
        assert_eq!(bank.reads(), &[0x3038_4000, 0x3038_4010]);

        bank.clear_log();
        assert!(bank.writes().is_empty());
        assert!(bank.reads().is_empty());
        assert_eq!(bank.snapshot().len(), 1);
    }

    #[test]
    fn power_on_state() {
        let mut ccm = Ccm::new(SimBank::power_on());
        assert_eq!(
            ccm.decode_integer_pll(PllId::Sys2, crate::Tap::Div1),
            Ok(Frequency::Off(Off::TapDisabled))
        );
        assert_eq!(
            ccm.source_frequency(ClockSource::VIDEO_PLL),
            Frequency::Off(Off::InReset)
        );
        assert_eq!(
            ccm.source_frequency(ClockSource::ARM_PLL),
            Frequency::Off(Off::InReset)
        );

        ccm.enable_pll_taps(PllId::Sys2).unwrap();
        assert_eq!(
            ccm.source_frequency(ClockSource::SYS_PLL2_1000M),
            Frequency::Hz(1_000_000_000)
        );
        assert_eq!(ccm.borrow_raw().elapsed_us(), 0);
    }
}
