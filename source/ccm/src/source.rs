//! Clock sources and frequencies.
use crate::{
    pll::{PllKind, Tap},
    Ccm, ClockError, Mmio, PllId, RootId, OSC_24M_HZ, OSC_32K_HZ, OSC_HDMI_HZ,
};
use core::fmt;

/// Something a clock root can select as its input.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClockSource {
    /// The 24 MHz crystal oscillator.
    Osc24M,
    /// The 32 kHz RTC oscillator.
    Osc32K,
    /// The HDMI PHY reference oscillator.
    OscHdmi,
    /// One output tap of a PLL.
    Pll(PllId, Tap),
    /// The DRAM alternate clock root, selectable by the DRAM clock mux.
    DramAlt,
    /// External clock pad `CLK_EXTn`, `n` in `1..=4`. Its frequency is
    /// unknown to us.
    Ext(u8),
}

impl ClockSource {
    pub const ARM_PLL: Self = Self::Pll(PllId::Arm, Tap::Div1);
    pub const GPU_PLL: Self = Self::Pll(PllId::Gpu, Tap::Div1);
    pub const VPU_PLL: Self = Self::Pll(PllId::Vpu, Tap::Div1);

    pub const SYS_PLL1_800M: Self = Self::Pll(PllId::Sys1, Tap::Div1);
    pub const SYS_PLL1_400M: Self = Self::Pll(PllId::Sys1, Tap::Div2);
    pub const SYS_PLL1_266M: Self = Self::Pll(PllId::Sys1, Tap::Div3);
    pub const SYS_PLL1_200M: Self = Self::Pll(PllId::Sys1, Tap::Div4);
    pub const SYS_PLL1_160M: Self = Self::Pll(PllId::Sys1, Tap::Div5);
    pub const SYS_PLL1_133M: Self = Self::Pll(PllId::Sys1, Tap::Div6);
    pub const SYS_PLL1_100M: Self = Self::Pll(PllId::Sys1, Tap::Div8);
    pub const SYS_PLL1_80M: Self = Self::Pll(PllId::Sys1, Tap::Div10);
    pub const SYS_PLL1_40M: Self = Self::Pll(PllId::Sys1, Tap::Div20);

    pub const SYS_PLL2_1000M: Self = Self::Pll(PllId::Sys2, Tap::Div1);
    pub const SYS_PLL2_500M: Self = Self::Pll(PllId::Sys2, Tap::Div2);
    pub const SYS_PLL2_333M: Self = Self::Pll(PllId::Sys2, Tap::Div3);
    pub const SYS_PLL2_250M: Self = Self::Pll(PllId::Sys2, Tap::Div4);
    pub const SYS_PLL2_200M: Self = Self::Pll(PllId::Sys2, Tap::Div5);
    pub const SYS_PLL2_166M: Self = Self::Pll(PllId::Sys2, Tap::Div6);
    pub const SYS_PLL2_125M: Self = Self::Pll(PllId::Sys2, Tap::Div8);
    pub const SYS_PLL2_100M: Self = Self::Pll(PllId::Sys2, Tap::Div10);
    pub const SYS_PLL2_50M: Self = Self::Pll(PllId::Sys2, Tap::Div20);

    pub const SYS_PLL3: Self = Self::Pll(PllId::Sys3, Tap::Div1);
    pub const DRAM_PLL: Self = Self::Pll(PllId::Dram, Tap::Div1);
    pub const AUDIO_PLL1: Self = Self::Pll(PllId::Audio1, Tap::Div1);
    pub const AUDIO_PLL2: Self = Self::Pll(PllId::Audio2, Tap::Div1);
    pub const VIDEO_PLL: Self = Self::Pll(PllId::Video, Tap::Div1);

    pub const EXT1: Self = Self::Ext(1);
    pub const EXT2: Self = Self::Ext(2);
    pub const EXT3: Self = Self::Ext(3);
    pub const EXT4: Self = Self::Ext(4);
}

impl fmt::Display for ClockSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Osc24M => f.write_str("osc_24m"),
            Self::Osc32K => f.write_str("osc_32k"),
            Self::OscHdmi => f.write_str("osc_hdmi"),
            Self::Pll(pll, Tap::Div1) => f.write_str(pll.name()),
            Self::Pll(pll, tap) => write!(f, "{}_div{}", pll.name(), tap.divisor()),
            Self::DramAlt => f.write_str("dram_alt_root"),
            Self::Ext(n) => write!(f, "clk_ext{n}"),
        }
    }
}

/// A clock's frequency, or the reason it has none.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Frequency {
    Hz(u32),
    Off(Off),
}

/// Why a clock is not running (or not known to be).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Off {
    /// The PLL is referenced from something other than the 24 MHz crystal.
    ExternalReference,
    /// The PLL is held in reset.
    InReset,
    /// The PLL is out of reset but has not locked.
    NotLocked,
    /// The PLL output tap is gated off.
    TapDisabled,
    /// The clock root is disabled.
    RootDisabled,
    /// The selected source does not exist.
    NoSource,
    /// The source is an external pad.
    External,
}

impl Frequency {
    /// The frequency in Hz, with every [`Frequency::Off`] collapsed to 0.
    #[must_use]
    pub const fn hz(self) -> u32 {
        match self {
            Self::Hz(hz) => hz,
            Self::Off(_) => 0,
        }
    }

    #[must_use]
    pub const fn is_off(self) -> bool {
        matches!(self, Self::Off(_))
    }

    /// Apply `f` to a running frequency; off stays off.
    #[must_use]
    pub fn map(self, f: impl FnOnce(u32) -> u32) -> Self {
        match self {
            Self::Hz(hz) => Self::Hz(f(hz)),
            off => off,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hz(hz) => write!(f, "{hz} Hz"),
            Self::Off(why) => write!(f, "off ({why})"),
        }
    }
}

impl fmt::Display for Off {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ExternalReference => "external reference",
            Self::InReset => "in reset",
            Self::NotLocked => "not locked",
            Self::TapDisabled => "output disabled",
            Self::RootDisabled => "root disabled",
            Self::NoSource => "no source",
            Self::External => "external pad",
        })
    }
}

impl<R: Mmio> Ccm<R> {
    /// The current frequency of a clock source.
    ///
    /// An integer PLL that has not locked reads as [`Off::NotLocked`] rather
    /// than as an error. A PLL tap that does not exist reads as
    /// [`Off::NoSource`], as it does for [`Ccm::decode_fractional_pll`].
    pub fn source_frequency(&mut self, source: ClockSource) -> Frequency {
        match source {
            ClockSource::Osc24M => Frequency::Hz(OSC_24M_HZ),
            ClockSource::Osc32K => Frequency::Hz(OSC_32K_HZ),
            ClockSource::OscHdmi => Frequency::Hz(OSC_HDMI_HZ),
            ClockSource::Ext(_) => Frequency::Off(Off::External),
            ClockSource::DramAlt => self.root_frequency(RootId::DramAlt),
            ClockSource::Pll(pll, tap) => match pll.kind() {
                PllKind::Integer => match self.decode_integer_pll(pll, tap) {
                    Ok(freq) => freq,
                    Err(ClockError::NotLocked { .. }) => Frequency::Off(Off::NotLocked),
                    Err(error) => {
                        tracing::debug!(%error, "no such PLL output");
                        Frequency::Off(Off::NoSource)
                    }
                },
                PllKind::Fractional => self.decode_fractional_pll(pll),
            },
        }
    }
}
