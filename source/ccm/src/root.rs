//! CCM clock roots.
//!
//! Each root slice selects one source from a fixed menu of up to eight, then
//! divides it by a pre-divider (`1..=8`) and a post-divider (`1..=64`).
//! The whole slice is a single register, so [`Ccm::set_root`] changes the
//! source, both dividers and the enable bit in one write.
//!
//! The CCM expects a root's consumers to be gated off while the root is
//! changed. That is left to the caller; see [`Ccm::with_gates_off`].
use crate::{
    regs::{TargetRoot, CCM_BASE, ROOT_OFFSET, ROOT_STRIDE},
    ClockError, ClockSource as S, Ccm, Frequency, Mmio, Off,
};

pub const PRE_DIV_MAX: u8 = 8;
pub const POST_DIV_MAX: u8 = 64;

pub(crate) struct RootDesc {
    name: &'static str,
    slice: u32,
    menu: &'static [S],
}

macro_rules! roots {
    (
        $(
            $(#[$meta:meta])*
            $Root:ident => $name:literal @ $slice:literal [$($src:expr),+ $(,)?];
        )+
    ) => {
        /// A CCM clock root.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum RootId {
            $(
                $(#[$meta])*
                $Root,
            )+
        }

        impl RootId {
            pub const ALL: &'static [RootId] = &[$(RootId::$Root,)+];

            pub(crate) fn desc(self) -> &'static RootDesc {
                match self {
                    $(
                        RootId::$Root => &RootDesc {
                            name: $name,
                            slice: $slice,
                            menu: &[$($src),+],
                        },
                    )+
                }
            }
        }
    };
}

roots! {
    ArmA53 => "arm_a53" @ 0 [
        S::Osc24M, S::ARM_PLL, S::SYS_PLL2_500M, S::SYS_PLL2_1000M,
        S::SYS_PLL1_800M, S::SYS_PLL1_400M, S::AUDIO_PLL1, S::SYS_PLL3,
    ];
    EnetAxi => "enet_axi" @ 17 [
        S::Osc24M, S::SYS_PLL1_266M, S::SYS_PLL1_800M, S::SYS_PLL2_250M,
        S::SYS_PLL2_200M, S::AUDIO_PLL1, S::VIDEO_PLL, S::SYS_PLL3,
    ];
    NandUsdhcBus => "nand_usdhc_bus" @ 18 [
        S::Osc24M, S::SYS_PLL1_266M, S::SYS_PLL1_800M, S::SYS_PLL2_200M,
        S::SYS_PLL1_133M, S::SYS_PLL3, S::SYS_PLL2_250M, S::AUDIO_PLL1,
    ];
    DisplayAxi => "disp_axi" @ 20 [
        S::Osc24M, S::SYS_PLL2_1000M, S::SYS_PLL1_800M, S::SYS_PLL3,
        S::SYS_PLL1_40M, S::AUDIO_PLL2, S::EXT1, S::EXT4,
    ];
    DisplayApb => "disp_apb" @ 21 [
        S::Osc24M, S::SYS_PLL2_125M, S::SYS_PLL1_800M, S::SYS_PLL3,
        S::SYS_PLL1_40M, S::AUDIO_PLL2, S::EXT1, S::EXT3,
    ];
    UsbBus => "usb_bus" @ 23 [
        S::Osc24M, S::SYS_PLL2_500M, S::SYS_PLL1_800M, S::SYS_PLL2_100M,
        S::SYS_PLL2_200M, S::EXT2, S::EXT4, S::AUDIO_PLL2,
    ];
    Noc => "noc" @ 26 [
        S::Osc24M, S::SYS_PLL1_800M, S::SYS_PLL3, S::SYS_PLL2_1000M,
        S::SYS_PLL2_500M, S::AUDIO_PLL1, S::VIDEO_PLL, S::AUDIO_PLL2,
    ];
    Ahb => "ahb" @ 32 [
        S::Osc24M, S::SYS_PLL1_133M, S::SYS_PLL1_800M, S::SYS_PLL1_400M,
        S::SYS_PLL2_125M, S::SYS_PLL3, S::AUDIO_PLL1, S::VIDEO_PLL,
    ];
    /// DRAM clock select. Picks between the DRAM PLL and the DRAM
    /// alternate root.
    DramSel => "dram_sel" @ 48 [
        S::DRAM_PLL, S::DramAlt,
    ];
    DramAlt => "dram_alt" @ 64 [
        S::Osc24M, S::SYS_PLL1_800M, S::SYS_PLL1_100M, S::SYS_PLL2_500M,
        S::SYS_PLL2_1000M, S::SYS_PLL3, S::AUDIO_PLL1, S::SYS_PLL1_266M,
    ];
    DramApb => "dram_apb" @ 65 [
        S::Osc24M, S::SYS_PLL2_200M, S::SYS_PLL1_40M, S::SYS_PLL1_160M,
        S::SYS_PLL1_800M, S::SYS_PLL3, S::SYS_PLL2_250M, S::AUDIO_PLL2,
    ];
    LcdifPixel => "lcdif_pixel" @ 74 [
        S::Osc24M, S::VIDEO_PLL, S::AUDIO_PLL2, S::AUDIO_PLL1,
        S::SYS_PLL1_800M, S::SYS_PLL2_1000M, S::SYS_PLL3, S::EXT4,
    ];
    EnetRef => "enet_ref" @ 83 [
        S::Osc24M, S::SYS_PLL2_125M, S::SYS_PLL2_50M, S::SYS_PLL2_100M,
        S::SYS_PLL1_160M, S::AUDIO_PLL1, S::VIDEO_PLL, S::EXT4,
    ];
    EnetTimer => "enet_timer" @ 84 [
        S::Osc24M, S::SYS_PLL2_100M, S::AUDIO_PLL1, S::EXT1,
        S::EXT2, S::EXT3, S::EXT4, S::VIDEO_PLL,
    ];
    EnetPhyRef => "enet_phy_ref" @ 85 [
        S::Osc24M, S::SYS_PLL2_50M, S::SYS_PLL2_125M, S::SYS_PLL2_200M,
        S::SYS_PLL2_500M, S::VIDEO_PLL, S::AUDIO_PLL2,
    ];
    Nand => "nand" @ 86 [
        S::Osc24M, S::SYS_PLL2_500M, S::AUDIO_PLL1, S::SYS_PLL1_400M,
        S::AUDIO_PLL2, S::SYS_PLL3, S::SYS_PLL2_250M, S::VIDEO_PLL,
    ];
    Qspi => "qspi" @ 87 [
        S::Osc24M, S::SYS_PLL1_400M, S::SYS_PLL2_333M, S::SYS_PLL2_500M,
        S::AUDIO_PLL2, S::SYS_PLL1_266M, S::SYS_PLL3, S::SYS_PLL1_100M,
    ];
    Usdhc1 => "usdhc1" @ 88 [
        S::Osc24M, S::SYS_PLL1_400M, S::SYS_PLL1_800M, S::SYS_PLL2_500M,
        S::SYS_PLL3, S::SYS_PLL1_266M, S::AUDIO_PLL2, S::SYS_PLL1_100M,
    ];
    Usdhc2 => "usdhc2" @ 89 [
        S::Osc24M, S::SYS_PLL1_400M, S::SYS_PLL1_800M, S::SYS_PLL2_500M,
        S::SYS_PLL3, S::SYS_PLL1_266M, S::AUDIO_PLL2, S::SYS_PLL1_100M,
    ];
    I2c1 => "i2c1" @ 90 [
        S::Osc24M, S::SYS_PLL1_160M, S::SYS_PLL2_50M, S::SYS_PLL3,
        S::AUDIO_PLL1, S::VIDEO_PLL, S::AUDIO_PLL2, S::SYS_PLL1_133M,
    ];
    I2c2 => "i2c2" @ 91 [
        S::Osc24M, S::SYS_PLL1_160M, S::SYS_PLL2_50M, S::SYS_PLL3,
        S::AUDIO_PLL1, S::VIDEO_PLL, S::AUDIO_PLL2, S::SYS_PLL1_133M,
    ];
    I2c3 => "i2c3" @ 92 [
        S::Osc24M, S::SYS_PLL1_160M, S::SYS_PLL2_50M, S::SYS_PLL3,
        S::AUDIO_PLL1, S::VIDEO_PLL, S::AUDIO_PLL2, S::SYS_PLL1_133M,
    ];
    I2c4 => "i2c4" @ 93 [
        S::Osc24M, S::SYS_PLL1_160M, S::SYS_PLL2_50M, S::SYS_PLL3,
        S::AUDIO_PLL1, S::VIDEO_PLL, S::AUDIO_PLL2, S::SYS_PLL1_133M,
    ];
    Uart1 => "uart1" @ 94 [
        S::Osc24M, S::SYS_PLL1_80M, S::SYS_PLL2_200M, S::SYS_PLL2_100M,
        S::SYS_PLL3, S::EXT2, S::EXT4, S::AUDIO_PLL2,
    ];
    Uart2 => "uart2" @ 95 [
        S::Osc24M, S::SYS_PLL1_80M, S::SYS_PLL2_200M, S::SYS_PLL2_100M,
        S::SYS_PLL3, S::EXT2, S::EXT3, S::AUDIO_PLL2,
    ];
    Uart3 => "uart3" @ 96 [
        S::Osc24M, S::SYS_PLL1_80M, S::SYS_PLL2_200M, S::SYS_PLL2_100M,
        S::SYS_PLL3, S::EXT2, S::EXT4, S::AUDIO_PLL2,
    ];
    Uart4 => "uart4" @ 97 [
        S::Osc24M, S::SYS_PLL1_80M, S::SYS_PLL2_200M, S::SYS_PLL2_100M,
        S::SYS_PLL3, S::EXT2, S::EXT3, S::AUDIO_PLL2,
    ];
    UsbCoreRef => "usb_core_ref" @ 98 [
        S::Osc24M, S::SYS_PLL1_100M, S::SYS_PLL1_40M, S::SYS_PLL2_100M,
        S::SYS_PLL2_200M, S::EXT2, S::EXT3, S::AUDIO_PLL2,
    ];
    UsbPhyRef => "usb_phy_ref" @ 99 [
        S::Osc24M, S::SYS_PLL1_100M, S::SYS_PLL1_40M, S::SYS_PLL2_100M,
        S::SYS_PLL2_200M, S::EXT2, S::EXT3, S::AUDIO_PLL2,
    ];
    Gic => "gic" @ 100 [
        S::Osc24M, S::SYS_PLL2_200M, S::SYS_PLL1_40M, S::SYS_PLL2_100M,
        S::SYS_PLL1_800M, S::EXT2, S::EXT4, S::AUDIO_PLL2,
    ];
    Ecspi1 => "ecspi1" @ 101 [
        S::Osc24M, S::SYS_PLL2_200M, S::SYS_PLL1_40M, S::SYS_PLL1_160M,
        S::SYS_PLL1_800M, S::SYS_PLL3, S::SYS_PLL2_250M, S::AUDIO_PLL2,
    ];
    Ecspi2 => "ecspi2" @ 102 [
        S::Osc24M, S::SYS_PLL2_200M, S::SYS_PLL1_40M, S::SYS_PLL1_160M,
        S::SYS_PLL1_800M, S::SYS_PLL3, S::SYS_PLL2_250M, S::AUDIO_PLL2,
    ];
    Wdog => "wdog" @ 114 [
        S::Osc24M, S::SYS_PLL1_133M, S::SYS_PLL1_160M, S::VPU_PLL,
        S::SYS_PLL2_125M, S::SYS_PLL3, S::SYS_PLL1_80M, S::SYS_PLL2_166M,
    ];
    Usdhc3 => "usdhc3" @ 121 [
        S::Osc24M, S::SYS_PLL1_400M, S::SYS_PLL1_800M, S::SYS_PLL2_500M,
        S::SYS_PLL3, S::SYS_PLL1_266M, S::AUDIO_PLL2, S::SYS_PLL1_100M,
    ];
    DsiCore => "dsi_core" @ 122 [
        S::Osc24M, S::SYS_PLL1_266M, S::SYS_PLL2_250M, S::SYS_PLL1_800M,
        S::SYS_PLL2_1000M, S::SYS_PLL3, S::AUDIO_PLL2, S::VIDEO_PLL,
    ];
    DsiPhyRef => "dsi_phy_ref" @ 123 [
        S::Osc24M, S::SYS_PLL2_125M, S::SYS_PLL2_100M, S::SYS_PLL1_800M,
        S::SYS_PLL2_1000M, S::EXT2, S::AUDIO_PLL2, S::VIDEO_PLL,
    ];
    Ecspi3 => "ecspi3" @ 131 [
        S::Osc24M, S::SYS_PLL2_200M, S::SYS_PLL1_40M, S::SYS_PLL1_160M,
        S::SYS_PLL1_800M, S::SYS_PLL3, S::SYS_PLL2_250M, S::AUDIO_PLL2,
    ];
}

impl RootId {
    #[must_use]
    pub fn name(self) -> &'static str {
        self.desc().name
    }

    /// The sources this root can select, in mux order.
    #[must_use]
    pub fn menu(self) -> &'static [S] {
        self.desc().menu
    }

    /// Address of this root's `TARGET_ROOT` register.
    #[must_use]
    pub fn target(self) -> u32 {
        slice_addr(self.desc().slice)
    }
}

pub(crate) const fn slice_addr(slice: u32) -> u32 {
    CCM_BASE + ROOT_OFFSET + slice * ROOT_STRIDE
}

/// The settings of one clock root.
///
/// Divisors are one-based here; the register stores them zero-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RootConfig {
    pub enabled: bool,
    /// Index into the root's source menu.
    pub source: u8,
    pub pre_div: u8,
    pub post_div: u8,
}

impl RootConfig {
    /// An enabled root on menu entry `source`, undivided.
    #[must_use]
    pub const fn source(source: u8) -> Self {
        Self {
            enabled: true,
            source,
            pre_div: 1,
            post_div: 1,
        }
    }

    #[must_use]
    pub const fn pre_div(self, pre_div: u8) -> Self {
        Self { pre_div, ..self }
    }

    #[must_use]
    pub const fn post_div(self, post_div: u8) -> Self {
        Self { post_div, ..self }
    }

    #[must_use]
    pub const fn disabled(self) -> Self {
        Self {
            enabled: false,
            ..self
        }
    }

    fn to_reg(self) -> TargetRoot {
        TargetRoot::new()
            .with(TargetRoot::ENABLE, self.enabled)
            .with(TargetRoot::MUX, u32::from(self.source))
            .with(TargetRoot::PRE_PODF, u32::from(self.pre_div - 1))
            .with(TargetRoot::POST_PODF, u32::from(self.post_div - 1))
    }

    fn from_reg(reg: TargetRoot) -> Self {
        // fields are at most 6 bits wide
        Self {
            enabled: reg.get(TargetRoot::ENABLE),
            source: reg.get(TargetRoot::MUX) as u8,
            pre_div: reg.get(TargetRoot::PRE_PODF) as u8 + 1,
            post_div: reg.get(TargetRoot::POST_PODF) as u8 + 1,
        }
    }
}

impl<R: Mmio> Ccm<R> {
    /// Program a clock root in a single register write.
    ///
    /// The source index and both dividers are validated first; if any is out
    /// of range, nothing is written.
    pub fn set_root(&mut self, root: RootId, config: RootConfig) -> Result<(), ClockError> {
        if usize::from(config.source) >= root.menu().len() {
            return Err(ClockError::InvalidSource {
                root,
                index: config.source,
            });
        }
        if !(1..=PRE_DIV_MAX).contains(&config.pre_div)
            || !(1..=POST_DIV_MAX).contains(&config.post_div)
        {
            return Err(ClockError::InvalidDivider {
                root,
                pre_div: config.pre_div,
                post_div: config.post_div,
            });
        }

        tracing::debug!(
            root = root.name(),
            source = %root.menu()[usize::from(config.source)],
            pre_div = config.pre_div,
            post_div = config.post_div,
            enabled = config.enabled,
            "set clock root"
        );
        self.regs.write32(root.target(), config.to_reg().bits());
        Ok(())
    }

    /// Program several roots, in order.
    ///
    /// Every root is attempted even if an earlier one is rejected; the first
    /// error is returned.
    pub fn set_roots(&mut self, roots: &[(RootId, RootConfig)]) -> Result<(), ClockError> {
        let mut result = Ok(());
        for &(root, config) in roots {
            let set = self.set_root(root, config);
            result = result.and(set);
        }
        result
    }

    /// Read back a root's current settings.
    pub fn root_config(&mut self, root: RootId) -> RootConfig {
        RootConfig::from_reg(TargetRoot::from_bits(self.regs.read32(root.target())))
    }

    /// The source a root currently selects, if its mux points at a menu
    /// entry.
    pub fn root_source(&mut self, root: RootId) -> Option<S> {
        let config = self.root_config(root);
        root.menu().get(usize::from(config.source)).copied()
    }

    /// The current output frequency of a clock root.
    ///
    /// A disabled root is [`Off::RootDisabled`] and its source is not
    /// looked at.
    pub fn root_frequency(&mut self, root: RootId) -> Frequency {
        let config = self.root_config(root);
        if !config.enabled {
            return Frequency::Off(Off::RootDisabled);
        }

        let Some(&source) = root.menu().get(usize::from(config.source)) else {
            return Frequency::Off(Off::NoSource);
        };

        self.source_frequency(source).map(|hz| {
            hz / u32::from(config.post_div) / u32::from(config.pre_div)
        })
    }
}
