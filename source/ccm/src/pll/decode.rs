use super::{PllId, PllKind, Tap};
use crate::{
    regs::{DivCtl, FdivCtl1, GnrlCtl, RefClkSel},
    ClockError, Ccm, Frequency, Mmio, Off, OSC_24M_HZ,
};

/// Largest post-divider exponent a fractional PLL supports.
const FRAC_POST_DIV_MAX: u32 = 6;
/// Fractional numerators are in units of 1/65536.
const FRAC_DENOM: u64 = 65536;

/// Output of an integer PLL tap: `24 MHz * main / (pre * 2^post * tap_div)`.
///
/// A pre-divider of 0 is treated as 1. Rates above `u32::MAX` saturate.
#[must_use]
pub fn integer_pll_hz(main: u32, pre: u32, post: u32, tap_div: u32) -> u32 {
    let pre = u64::from(pre.max(1));
    let denom = pre * (1u64 << post) * u64::from(tap_div.max(1));
    saturate(u64::from(OSC_24M_HZ) * u64::from(main) / denom)
}

/// Output of a fractional PLL:
/// `24 MHz * (main * 65536 + k) / (65536 * pre * 2^post)`.
///
/// A pre-divider of 0 is treated as 1, and the post-divider exponent is
/// clamped to 6.
#[must_use]
pub fn fractional_pll_hz(main: u32, pre: u32, post: u32, k: u32) -> u32 {
    let pre = u64::from(pre.max(1));
    let post = post.min(FRAC_POST_DIV_MAX);
    let num = (u64::from(main) * FRAC_DENOM + u64::from(k)) * u64::from(OSC_24M_HZ);
    saturate(num / (FRAC_DENOM * pre * (1u64 << post)))
}

fn saturate(hz: u64) -> u32 {
    u32::try_from(hz).unwrap_or(u32::MAX)
}

/// Checks shared by both PLL kinds, in the order the hardware needs them.
///
/// Returns `Some` if the PLL's output is decided without looking at its
/// dividers.
fn preamble(pll: PllId, ctl: GnrlCtl) -> Option<Frequency> {
    if ctl.get(GnrlCtl::REF_CLK_SEL) != RefClkSel::Osc24M {
        tracing::debug!(%pll, "PLL is not referenced from the 24 MHz oscillator");
        return Some(Frequency::Off(Off::ExternalReference));
    }

    if !ctl.get(GnrlCtl::RST) {
        return Some(Frequency::Off(Off::InReset));
    }

    if ctl.get(GnrlCtl::BYPASS) {
        return Some(Frequency::Hz(OSC_24M_HZ));
    }

    None
}

impl<R: Mmio> Ccm<R> {
    /// Decode the current output frequency of one tap of an integer PLL.
    ///
    /// A PLL that is running but not locked is an error here
    /// ([`ClockError::NotLocked`]), while [`Ccm::decode_fractional_pll`]
    /// reports the same condition as [`Off::NotLocked`]. Callers that treat
    /// "0 Hz" as "unknown" should go through [`Ccm::source_frequency`], which
    /// folds both into [`Frequency::Off`].
    pub fn decode_integer_pll(&mut self, pll: PllId, tap: Tap) -> Result<Frequency, ClockError> {
        if pll.kind() != PllKind::Integer {
            return Err(ClockError::WrongPllKind {
                pll,
                expected: PllKind::Integer,
            });
        }
        if !pll.taps().contains(tap) {
            return Err(ClockError::InvalidTap { pll, tap });
        }

        let ctl = GnrlCtl::from_bits(self.regs.read32(pll.gnrl_ctl()));
        if let Some(freq) = preamble(pll, ctl) {
            return Ok(freq);
        }

        if !ctl.get(GnrlCtl::LOCK) {
            tracing::debug!(%pll, "PLL is not locked");
            return Err(ClockError::NotLocked { pll });
        }

        if !tap.is_enabled(ctl) {
            return Ok(Frequency::Off(Off::TapDisabled));
        }

        let div = DivCtl::from_bits(self.regs.read32(pll.div_ctl()));
        let hz = integer_pll_hz(
            div.get(DivCtl::MAIN_DIV),
            div.get(DivCtl::PRE_DIV),
            div.get(DivCtl::POST_DIV),
            tap.divisor(),
        );
        tracing::trace!(%pll, ?tap, hz);
        Ok(Frequency::Hz(hz))
    }

    /// Decode the current output frequency of a fractional PLL.
    ///
    /// Unlike [`Ccm::decode_integer_pll`], an unlocked PLL is not an error:
    /// it decodes as [`Off::NotLocked`]. A non-fractional `pll` decodes as
    /// [`Off::NoSource`].
    pub fn decode_fractional_pll(&mut self, pll: PllId) -> Frequency {
        if pll.kind() != PllKind::Fractional {
            return Frequency::Off(Off::NoSource);
        }

        let ctl = GnrlCtl::from_bits(self.regs.read32(pll.gnrl_ctl()));
        if let Some(freq) = preamble(pll, ctl) {
            return freq;
        }

        if !ctl.get(GnrlCtl::LOCK) {
            tracing::debug!(%pll, "PLL is not locked");
            return Frequency::Off(Off::NotLocked);
        }

        if !ctl.get(GnrlCtl::CLKE) {
            return Frequency::Off(Off::TapDisabled);
        }

        let div = DivCtl::from_bits(self.regs.read32(pll.div_ctl()));
        let k = FdivCtl1::from_bits(self.regs.read32(pll.fdiv_ctl1()));
        let hz = fractional_pll_hz(
            div.get(DivCtl::MAIN_DIV),
            div.get(DivCtl::PRE_DIV),
            div.get(DivCtl::POST_DIV),
            k.get(FdivCtl1::DSM),
        );
        tracing::trace!(%pll, hz);
        Frequency::Hz(hz)
    }
}
