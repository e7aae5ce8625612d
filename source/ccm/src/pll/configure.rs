use super::{FracRate, IntPllRate, PllId, PllKind, PreConfig};
use crate::{
    regs::{DivCtl, FdivCtl1, GnrlCtl},
    ClockError, Ccm, Mmio,
};

/// Time between programming the dividers and releasing the PLL from reset.
pub const RESET_SETTLE_US: u32 = 100;
/// How long a fractional PLL gets to lock.
pub const FRAC_LOCK_TIMEOUT_US: u32 = 600;
/// How long an integer PLL gets to lock.
pub const INT_LOCK_TIMEOUT_US: u32 = 100;

/// The rate to configure a PLL to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PllTarget {
    /// One of the integer PLL buckets.
    Bucket(IntPllRate),
    /// An exact rate from the fractional PLL rate table.
    Hz(u32),
}

impl From<IntPllRate> for PllTarget {
    fn from(rate: IntPllRate) -> Self {
        Self::Bucket(rate)
    }
}

impl<R: Mmio> Ccm<R> {
    /// Configure `pll` to `target`.
    ///
    /// Integer PLLs take a [`PllTarget::Bucket`], fractional PLLs take a
    /// [`PllTarget::Hz`] from the rate table. Every call runs the full
    /// bypass / reset / lock sequence, even if the PLL already runs at the
    /// requested rate.
    pub fn configure_pll(
        &mut self,
        pll: PllId,
        target: impl Into<PllTarget>,
    ) -> Result<(), ClockError> {
        match (pll.kind(), target.into()) {
            (PllKind::Integer, PllTarget::Bucket(rate)) => self.configure_integer(pll, rate),
            (PllKind::Fractional, PllTarget::Hz(hz)) => self.configure_fractional(pll, hz),
            (PllKind::Integer, PllTarget::Hz(hz)) => match IntPllRate::from_hz(hz) {
                Some(rate) => self.configure_integer(pll, rate),
                None => Err(ClockError::UnsupportedRate { hz }),
            },
            (PllKind::Fractional, PllTarget::Bucket(rate)) => {
                self.configure_fractional(pll, rate.hz())
            }
        }
    }

    /// Reprogram a fractional PLL to `hz`, which must be an exact entry in
    /// [`FRAC_RATES`](super::FRAC_RATES).
    ///
    /// The PLL is bypassed and held in reset while its dividers change, then
    /// released and given [`FRAC_LOCK_TIMEOUT_US`] to lock. Bypass is cleared
    /// whether or not it locked; a lock timeout is returned as
    /// [`ClockError::LockTimeout`] after that.
    #[tracing::instrument(level = "debug", skip(self, pll), fields(%pll))]
    pub fn configure_fractional(&mut self, pll: PllId, hz: u32) -> Result<(), ClockError> {
        if pll.kind() != PllKind::Fractional {
            return Err(ClockError::WrongPllKind {
                pll,
                expected: PllKind::Fractional,
            });
        }
        let rate = FracRate::lookup(hz).ok_or(ClockError::UnsupportedRate { hz })?;

        for op in pll.desc().pre_config {
            self.pre_config(op);
        }

        let gnrl = pll.gnrl_ctl();
        let mut ctl = GnrlCtl::from_bits(self.regs.read32(gnrl));
        ctl.set(GnrlCtl::BYPASS, true).set(GnrlCtl::LOCK_SEL, true);
        self.regs.write32(gnrl, ctl.bits());
        ctl.set(GnrlCtl::RST, false);
        self.regs.write32(gnrl, ctl.bits());

        let d = rate.dividers;
        let div = DivCtl::new()
            .with(DivCtl::MAIN_DIV, u32::from(d.main))
            .with(DivCtl::PRE_DIV, u32::from(d.pre))
            .with(DivCtl::POST_DIV, u32::from(d.post));
        self.regs.write32(pll.div_ctl(), div.bits());
        let k = FdivCtl1::new().with(FdivCtl1::DSM, u32::from(d.k));
        self.regs.write32(pll.fdiv_ctl1(), k.bits());

        self.regs.delay_us(RESET_SETTLE_US);
        ctl.set(GnrlCtl::RST, true);
        self.regs.write32(gnrl, ctl.bits());

        let locked = self.wait_for_lock(pll, FRAC_LOCK_TIMEOUT_US);

        ctl.set(GnrlCtl::BYPASS, false);
        self.regs.write32(gnrl, ctl.bits());
        tracing::debug!(hz, "fractional PLL configured");

        locked
    }

    /// Reprogram an integer PLL to one of the rate buckets.
    ///
    /// Same sequence as [`Ccm::configure_fractional`] with a
    /// [`INT_LOCK_TIMEOUT_US`] lock budget. Afterwards every output tap the
    /// PLL exposes is enabled, whether or not it locked.
    #[tracing::instrument(level = "debug", skip(self, pll), fields(%pll))]
    pub fn configure_integer(&mut self, pll: PllId, rate: IntPllRate) -> Result<(), ClockError> {
        if pll.kind() != PllKind::Integer {
            return Err(ClockError::WrongPllKind {
                pll,
                expected: PllKind::Integer,
            });
        }

        let gnrl = pll.gnrl_ctl();
        self.regs.modify32(gnrl, |v| {
            GnrlCtl::from_bits(v)
                .with(GnrlCtl::BYPASS, true)
                .with(GnrlCtl::LOCK_SEL, true)
                .bits()
        });
        self.regs
            .modify32(gnrl, |v| GnrlCtl::from_bits(v).with(GnrlCtl::RST, false).bits());

        let d = rate.dividers();
        let div = DivCtl::new()
            .with(DivCtl::MAIN_DIV, u32::from(d.main))
            .with(DivCtl::PRE_DIV, u32::from(d.pre))
            .with(DivCtl::POST_DIV, u32::from(d.post));
        self.regs.write32(pll.div_ctl(), div.bits());

        self.regs.delay_us(RESET_SETTLE_US);
        self.regs
            .modify32(gnrl, |v| GnrlCtl::from_bits(v).with(GnrlCtl::RST, true).bits());

        let locked = self.wait_for_lock(pll, INT_LOCK_TIMEOUT_US);

        self.regs
            .modify32(gnrl, |v| GnrlCtl::from_bits(v).with(GnrlCtl::BYPASS, false).bits());
        let taps = pll.taps();
        self.regs.modify32(gnrl, |v| {
            let mut ctl = GnrlCtl::from_bits(v);
            taps.enable_all(&mut ctl);
            ctl.bits()
        });
        tracing::debug!(?rate, "integer PLL configured");

        locked
    }

    /// Enable every output tap of an integer PLL without reprogramming it.
    pub fn enable_pll_taps(&mut self, pll: PllId) -> Result<(), ClockError> {
        if pll.kind() != PllKind::Integer {
            return Err(ClockError::WrongPllKind {
                pll,
                expected: PllKind::Integer,
            });
        }

        let taps = pll.taps();
        self.regs.modify32(pll.gnrl_ctl(), |v| {
            let mut ctl = GnrlCtl::from_bits(v);
            taps.enable_all(&mut ctl);
            ctl.bits()
        });
        tracing::debug!(%pll, ?taps, "PLL taps enabled");
        Ok(())
    }

    fn wait_for_lock(&mut self, pll: PllId, timeout_us: u32) -> Result<(), ClockError> {
        let lock = GnrlCtl::new().with(GnrlCtl::LOCK, true).bits();
        match self.regs.poll32(pll.gnrl_ctl(), lock, timeout_us) {
            Ok(_) => Ok(()),
            Err(timeout) => {
                tracing::warn!(
                    %pll,
                    waited_us = timeout.waited_us,
                    "PLL failed to lock, taking it out of bypass anyway"
                );
                Err(ClockError::LockTimeout {
                    pll,
                    waited_us: timeout.waited_us,
                })
            }
        }
    }

    fn pre_config(&mut self, op: &PreConfig) {
        tracing::trace!(?op);
        match *op {
            PreConfig::Set { addr, mask } => self.regs.modify32(addr, |v| v | mask),
            PreConfig::Write { addr, value } => self.regs.write32(addr, value),
        }
    }
}
