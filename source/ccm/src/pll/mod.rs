//! ANATOP PLLs.
//!
//! The i.MX 8M has two families of PLL:
//!
//! - **Integer** PLLs (ARM, GPU, VPU and the three system PLLs), which
//!   multiply the 24 MHz reference by `main / (pre * 2^post)`. The first two
//!   system PLLs additionally expose eight fixed-ratio output taps.
//! - **Fractional** PLLs (DRAM, both audio PLLs and the video PLL), which add
//!   a 16-bit fractional numerator to the main divider.
//!
//! Decoding a PLL (see [`Ccm::decode_integer_pll`] and
//! [`Ccm::decode_fractional_pll`]) reads its current state back out of its
//! control registers. Configuring one (see [`Ccm::configure_pll`]) runs the
//! bypass / reset / lock-wait sequence.
//!
//! [`Ccm::decode_integer_pll`]: crate::Ccm::decode_integer_pll
//! [`Ccm::decode_fractional_pll`]: crate::Ccm::decode_fractional_pll
//! [`Ccm::configure_pll`]: crate::Ccm::configure_pll
use crate::regs::{GnrlCtl, ANATOP_BASE, GPC_BASE, SRC_BASE};
use core::fmt;
use serde::{Deserialize, Serialize};

mod configure;
mod decode;

pub use self::configure::PllTarget;
pub use self::decode::{fractional_pll_hz, integer_pll_hz};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PllKind {
    Integer,
    Fractional,
}

impl fmt::Display for PllKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer => f.write_str("an integer PLL"),
            Self::Fractional => f.write_str("a fractional PLL"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PllId {
    Arm,
    Gpu,
    Vpu,
    Sys1,
    Sys2,
    Sys3,
    Dram,
    Audio1,
    Audio2,
    Video,
}

/// One output tap of a PLL, named by its fixed divisor.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Tap {
    Div1,
    Div2,
    Div3,
    Div4,
    Div5,
    Div6,
    Div8,
    Div10,
    Div20,
}

/// Which output taps a PLL instance exposes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Taps {
    /// Only the direct output.
    Direct,
    /// The direct output and every fixed divider.
    All,
}

/// A register poke performed before a PLL's output is disturbed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PreConfig {
    /// Set `mask` in the register at `addr`, leaving other bits alone.
    Set { addr: u32, mask: u32 },
    /// Overwrite the register at `addr`.
    Write { addr: u32, value: u32 },
}

pub(crate) struct PllDesc {
    pub(crate) name: &'static str,
    pub(crate) kind: PllKind,
    /// Offset of `GNRL_CTL` within ANATOP.
    pub(crate) offset: u32,
    pub(crate) taps: Taps,
    pub(crate) pre_config: &'static [PreConfig],
}

/// The DRAM PLL feeds the DDR controller, which must be powered down and
/// held in reset while the PLL is reprogrammed.
const DRAM_PRE_CONFIG: &[PreConfig] = &[
    // DDR1 power domain request.
    PreConfig::Set {
        addr: GPC_BASE + 0xEC,
        mask: 1 << 7,
    },
    // DDR1 clock isolation.
    PreConfig::Set {
        addr: GPC_BASE + 0xF8,
        mask: 1 << 5,
    },
    // Hold the DDR controller and PHY in reset.
    PreConfig::Write {
        addr: SRC_BASE + 0x1004,
        value: 0x8F00_0000,
    },
];

impl PllId {
    pub const ALL: [PllId; 10] = [
        PllId::Arm,
        PllId::Gpu,
        PllId::Vpu,
        PllId::Sys1,
        PllId::Sys2,
        PllId::Sys3,
        PllId::Dram,
        PllId::Audio1,
        PllId::Audio2,
        PllId::Video,
    ];

    pub(crate) fn desc(self) -> &'static PllDesc {
        use PllKind::*;
        match self {
            PllId::Audio1 => &PllDesc {
                name: "audio_pll1",
                kind: Fractional,
                offset: 0x00,
                taps: Taps::Direct,
                pre_config: &[],
            },
            PllId::Audio2 => &PllDesc {
                name: "audio_pll2",
                kind: Fractional,
                offset: 0x14,
                taps: Taps::Direct,
                pre_config: &[],
            },
            PllId::Video => &PllDesc {
                name: "video_pll",
                kind: Fractional,
                offset: 0x28,
                taps: Taps::Direct,
                pre_config: &[],
            },
            PllId::Dram => &PllDesc {
                name: "dram_pll",
                kind: Fractional,
                offset: 0x50,
                taps: Taps::Direct,
                pre_config: DRAM_PRE_CONFIG,
            },
            PllId::Gpu => &PllDesc {
                name: "gpu_pll",
                kind: Integer,
                offset: 0x64,
                taps: Taps::Direct,
                pre_config: &[],
            },
            PllId::Vpu => &PllDesc {
                name: "vpu_pll",
                kind: Integer,
                offset: 0x74,
                taps: Taps::Direct,
                pre_config: &[],
            },
            PllId::Arm => &PllDesc {
                name: "arm_pll",
                kind: Integer,
                offset: 0x84,
                taps: Taps::Direct,
                pre_config: &[],
            },
            PllId::Sys1 => &PllDesc {
                name: "sys_pll1",
                kind: Integer,
                offset: 0x94,
                taps: Taps::All,
                pre_config: &[],
            },
            PllId::Sys2 => &PllDesc {
                name: "sys_pll2",
                kind: Integer,
                offset: 0x104,
                taps: Taps::All,
                pre_config: &[],
            },
            PllId::Sys3 => &PllDesc {
                name: "sys_pll3",
                kind: Integer,
                offset: 0x114,
                taps: Taps::Direct,
                pre_config: &[],
            },
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        self.desc().name
    }

    #[must_use]
    pub fn kind(self) -> PllKind {
        self.desc().kind
    }

    #[must_use]
    pub fn taps(self) -> Taps {
        self.desc().taps
    }

    /// Address of `GNRL_CTL`.
    #[must_use]
    pub fn gnrl_ctl(self) -> u32 {
        ANATOP_BASE + self.desc().offset
    }

    /// Address of `DIV_CTL` (integer) or `FDIV_CTL0` (fractional).
    #[must_use]
    pub fn div_ctl(self) -> u32 {
        self.gnrl_ctl() + 0x4
    }

    /// Address of `FDIV_CTL1`. Only meaningful for fractional PLLs.
    #[must_use]
    pub fn fdiv_ctl1(self) -> u32 {
        self.gnrl_ctl() + 0x8
    }

    /// Find the PLL whose `GNRL_CTL` register lives at `addr`.
    #[must_use]
    pub fn from_gnrl_ctl(addr: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|pll| pll.gnrl_ctl() == addr)
    }
}

impl fmt::Display for PllId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Tap {
    pub const ALL: [Tap; 9] = [
        Tap::Div1,
        Tap::Div2,
        Tap::Div3,
        Tap::Div4,
        Tap::Div5,
        Tap::Div6,
        Tap::Div8,
        Tap::Div10,
        Tap::Div20,
    ];

    #[must_use]
    pub const fn divisor(self) -> u32 {
        match self {
            Tap::Div1 => 1,
            Tap::Div2 => 2,
            Tap::Div3 => 3,
            Tap::Div4 => 4,
            Tap::Div5 => 5,
            Tap::Div6 => 6,
            Tap::Div8 => 8,
            Tap::Div10 => 10,
            Tap::Div20 => 20,
        }
    }

    /// Whether this tap's output enable is set in `ctl`.
    #[must_use]
    pub fn is_enabled(self, ctl: GnrlCtl) -> bool {
        match self {
            Tap::Div1 => ctl.get(GnrlCtl::CLKE),
            Tap::Div2 => ctl.get(GnrlCtl::DIV2_CLKE),
            Tap::Div3 => ctl.get(GnrlCtl::DIV3_CLKE),
            Tap::Div4 => ctl.get(GnrlCtl::DIV4_CLKE),
            Tap::Div5 => ctl.get(GnrlCtl::DIV5_CLKE),
            Tap::Div6 => ctl.get(GnrlCtl::DIV6_CLKE),
            Tap::Div8 => ctl.get(GnrlCtl::DIV8_CLKE),
            Tap::Div10 => ctl.get(GnrlCtl::DIV10_CLKE),
            Tap::Div20 => ctl.get(GnrlCtl::DIV20_CLKE),
        }
    }

    /// Set this tap's output enable in `ctl`.
    pub fn enable(self, ctl: &mut GnrlCtl) {
        match self {
            Tap::Div1 => ctl.set(GnrlCtl::CLKE, true),
            Tap::Div2 => ctl.set(GnrlCtl::DIV2_CLKE, true),
            Tap::Div3 => ctl.set(GnrlCtl::DIV3_CLKE, true),
            Tap::Div4 => ctl.set(GnrlCtl::DIV4_CLKE, true),
            Tap::Div5 => ctl.set(GnrlCtl::DIV5_CLKE, true),
            Tap::Div6 => ctl.set(GnrlCtl::DIV6_CLKE, true),
            Tap::Div8 => ctl.set(GnrlCtl::DIV8_CLKE, true),
            Tap::Div10 => ctl.set(GnrlCtl::DIV10_CLKE, true),
            Tap::Div20 => ctl.set(GnrlCtl::DIV20_CLKE, true),
        };
    }
}

impl Taps {
    #[must_use]
    pub fn contains(self, tap: Tap) -> bool {
        matches!(self, Taps::All) || tap == Tap::Div1
    }

    /// Set the output enable of every tap in this set.
    pub fn enable_all(self, ctl: &mut GnrlCtl) {
        for tap in Tap::ALL {
            if self.contains(tap) {
                tap.enable(ctl);
            }
        }
    }
}

/// Integer PLL rate buckets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntPllRate {
    Mhz600,
    Mhz750,
    Mhz800,
    Mhz1000,
    Mhz1200,
    Mhz2000,
}

/// Divider settings for one PLL rate.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Dividers {
    pub main: u16,
    pub pre: u8,
    /// log2 of the post-divider.
    pub post: u8,
    /// Fractional numerator; always 0 for integer PLLs.
    pub k: u16,
}

/// One entry of the fractional PLL rate table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FracRate {
    pub hz: u32,
    pub dividers: Dividers,
}

/// Rates a fractional PLL can be configured to. Lookups are exact.
pub const FRAC_RATES: &[FracRate] = &[
    FracRate::new(800_000_000, 300, 9, 0, 0),
    FracRate::new(750_000_000, 250, 8, 0, 0),
    FracRate::new(650_000_000, 325, 3, 2, 0),
    FracRate::new(600_000_000, 300, 3, 2, 0),
    FracRate::new(594_000_000, 99, 1, 2, 0),
    FracRate::new(400_000_000, 300, 9, 1, 0),
    FracRate::new(100_000_000, 300, 9, 3, 0),
];

impl FracRate {
    const fn new(hz: u32, main: u16, pre: u8, post: u8, k: u16) -> Self {
        Self {
            hz,
            dividers: Dividers { main, pre, post, k },
        }
    }

    #[must_use]
    pub fn lookup(hz: u32) -> Option<&'static FracRate> {
        FRAC_RATES.iter().find(|rate| rate.hz == hz)
    }
}

impl IntPllRate {
    pub const ALL: [IntPllRate; 6] = [
        IntPllRate::Mhz600,
        IntPllRate::Mhz750,
        IntPllRate::Mhz800,
        IntPllRate::Mhz1000,
        IntPllRate::Mhz1200,
        IntPllRate::Mhz2000,
    ];

    #[must_use]
    pub const fn hz(self) -> u32 {
        match self {
            IntPllRate::Mhz600 => 600_000_000,
            IntPllRate::Mhz750 => 750_000_000,
            IntPllRate::Mhz800 => 800_000_000,
            IntPllRate::Mhz1000 => 1_000_000_000,
            IntPllRate::Mhz1200 => 1_200_000_000,
            IntPllRate::Mhz2000 => 2_000_000_000,
        }
    }

    #[must_use]
    pub const fn dividers(self) -> Dividers {
        let (main, pre, post) = match self {
            IntPllRate::Mhz600 => (300, 3, 2),
            IntPllRate::Mhz750 => (250, 2, 2),
            IntPllRate::Mhz800 => (400, 3, 2),
            IntPllRate::Mhz1000 => (250, 3, 1),
            IntPllRate::Mhz1200 => (200, 2, 1),
            IntPllRate::Mhz2000 => (250, 3, 0),
        };
        Dividers {
            main,
            pre,
            post,
            k: 0,
        }
    }

    /// Find the bucket for an exact rate in Hz.
    #[must_use]
    pub fn from_hz(hz: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|rate| rate.hz() == hz)
    }
}
