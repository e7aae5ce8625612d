//! Per-peripheral clock setup.
//!
//! These follow the CCM's rule for changing a root: gate its consumers off,
//! reprogram the root, gate them back on.
use crate::{
    root::{POST_DIV_MAX, PRE_DIV_MAX},
    Ccm, ClockError, GateId, Mmio, PllId, RootConfig, RootId,
};

/// The rate the video PLL is run at for the display pipeline.
pub const VIDEO_PLL_HZ: u32 = 594_000_000;

const UARTS: [(RootId, GateId); 4] = [
    (RootId::Uart1, GateId::Uart1),
    (RootId::Uart2, GateId::Uart2),
    (RootId::Uart3, GateId::Uart3),
    (RootId::Uart4, GateId::Uart4),
];

const USDHCS: [(RootId, GateId); 3] = [
    (RootId::Usdhc1, GateId::Usdhc1),
    (RootId::Usdhc2, GateId::Usdhc2),
    (RootId::Usdhc3, GateId::Usdhc3),
];

const I2CS: [GateId; 4] = [GateId::I2c1, GateId::I2c2, GateId::I2c3, GateId::I2c4];

/// UART root: the 24 MHz oscillator.
pub(crate) const UART_ROOT: RootConfig = RootConfig::source(0);
/// USDHC root: `sys_pll1` 400 MHz / 2.
pub(crate) const USDHC_ROOT: RootConfig = RootConfig::source(1).post_div(2);

/// Ethernet reference clock rates.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnetRefFreq {
    Mhz125,
    Mhz50,
    Mhz25,
}

/// DRAM alternate / APB root settings for running DRAM off the PLL.
struct DramBypass {
    hz: u32,
    alt: RootConfig,
    apb: RootConfig,
}

const DRAM_BYPASS: &[DramBypass] = &[
    DramBypass {
        hz: 100_000_000,
        alt: RootConfig::source(2),
        apb: RootConfig::source(2).pre_div(2),
    },
    DramBypass {
        hz: 250_000_000,
        alt: RootConfig::source(3).pre_div(2),
        apb: RootConfig::source(2).pre_div(2),
    },
    DramBypass {
        hz: 400_000_000,
        alt: RootConfig::source(1).pre_div(2),
        apb: RootConfig::source(3).pre_div(2),
    },
];

impl<R: Mmio> Ccm<R> {
    /// Put UART `index` (0-based) on the 24 MHz oscillator.
    pub fn enable_uart_clock(&mut self, index: u8) -> Result<(), ClockError> {
        let &(root, gate) = UARTS
            .get(usize::from(index))
            .ok_or(ClockError::InvalidIndex {
                peripheral: "uart",
                index,
            })?;
        self.with_gates_off(&[gate], |ccm| ccm.set_root(root, UART_ROOT))
    }

    /// Put USDHC `index` (0-based) on `sys_pll1` 400 MHz / 2.
    pub fn enable_usdhc_clock(&mut self, index: u8) -> Result<(), ClockError> {
        let &(root, gate) = USDHCS
            .get(usize::from(index))
            .ok_or(ClockError::InvalidIndex {
                peripheral: "usdhc",
                index,
            })?;
        self.with_gates_off(&[gate], |ccm| ccm.set_root(root, USDHC_ROOT))
    }

    /// Gate I2C `index` (0-based) on or off.
    pub fn enable_i2c_clock(&mut self, index: u8, enable: bool) -> Result<(), ClockError> {
        let &gate = I2CS
            .get(usize::from(index))
            .ok_or(ClockError::InvalidIndex {
                peripheral: "i2c",
                index,
            })?;
        self.enable_gate(gate, enable);
        Ok(())
    }

    /// Gate the OCOTP (fuse) controller on or off.
    pub fn enable_ocotp_clock(&mut self, enable: bool) {
        self.enable_gate(GateId::Ocotp, enable);
    }

    /// Bring up the display pipeline clocks, or gate them off.
    ///
    /// Enabling runs the video PLL at [`VIDEO_PLL_HZ`] and derives the display
    /// AXI (500 MHz), display APB (200 MHz), DSI core (266 MHz) and DSI PHY
    /// reference (27 MHz) roots. The display gate is turned back on even if
    /// the video PLL fails to lock.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn enable_display_clock(&mut self, enable: bool) -> Result<(), ClockError> {
        if !enable {
            self.enable_gate(GateId::DispMix, false);
            return Ok(());
        }

        self.with_gates_off(&[GateId::DispMix], |ccm| {
            let pll = ccm.configure_fractional(PllId::Video, VIDEO_PLL_HZ);
            let roots = ccm.set_roots(&[
                (RootId::DisplayAxi, RootConfig::source(1).pre_div(2)),
                (RootId::DisplayApb, RootConfig::source(2).pre_div(4)),
                (RootId::DsiCore, RootConfig::source(1)),
                (RootId::DsiPhyRef, RootConfig::source(7).post_div(22)),
            ]);
            pll.and(roots)
        })
    }

    /// Bring up the USB bus and reference clocks, or gate them off.
    pub fn enable_usb_clock(&mut self, enable: bool) -> Result<(), ClockError> {
        if !enable {
            self.enable_gate(GateId::UsbMscalePl301, false);
            return Ok(());
        }

        self.with_gates_off(&[GateId::UsbMscalePl301], |ccm| {
            ccm.set_roots(&[
                // sys_pll2 500 MHz
                (RootId::UsbBus, RootConfig::source(1)),
                // sys_pll1 100 MHz
                (RootId::UsbCoreRef, RootConfig::source(1)),
                (RootId::UsbPhyRef, RootConfig::source(1)),
            ])
        })
    }

    /// Set up the Ethernet MAC clocks.
    ///
    /// If `phy_ref_25m` is set, the PHY reference root is also set up to
    /// provide 25 MHz.
    pub fn set_enet_clock(
        &mut self,
        freq: EnetRefFreq,
        phy_ref_25m: bool,
    ) -> Result<(), ClockError> {
        let enet_ref = match freq {
            EnetRefFreq::Mhz125 => RootConfig::source(1),
            EnetRefFreq::Mhz50 => RootConfig::source(2),
            EnetRefFreq::Mhz25 => RootConfig::source(2).post_div(2),
        };

        self.with_gates_off(&[GateId::Enet1, GateId::SimEnet], |ccm| {
            let mut result = ccm.set_roots(&[
                // sys_pll1 266 MHz
                (RootId::EnetAxi, RootConfig::source(1)),
                (RootId::EnetRef, enet_ref),
                // sys_pll2 100 MHz / 4
                (RootId::EnetTimer, RootConfig::source(1).post_div(4)),
            ]);
            if phy_ref_25m {
                // sys_pll2 50 MHz / 2
                let phy = ccm.set_root(RootId::EnetPhyRef, RootConfig::source(1).post_div(2));
                result = result.and(phy);
            }
            result
        })
    }

    /// Set the LCD pixel clock as close to `khz` as the video PLL allows,
    /// rounding down.
    ///
    /// Returns [`ClockError::UnsupportedRate`] if the required division can't
    /// be split into a pre-divider and a post-divider.
    pub fn set_lcd_clock(&mut self, khz: u32) -> Result<(), ClockError> {
        let unsupported = ClockError::UnsupportedRate {
            hz: khz.saturating_mul(1000),
        };
        if khz == 0 {
            return Err(unsupported);
        }

        let div = (VIDEO_PLL_HZ / 1000).div_ceil(khz).max(1);
        let (pre, post) = (1..=PRE_DIV_MAX)
            .flat_map(|pre| (1..=POST_DIV_MAX).map(move |post| (pre, post)))
            .find(|&(pre, post)| u32::from(pre) * u32::from(post) == div)
            .ok_or(unsupported)?;

        tracing::debug!(khz, pre, post, "LCD pixel clock");
        self.set_root(
            RootId::LcdifPixel,
            RootConfig::source(1).pre_div(pre).post_div(post),
        )
    }

    /// Configure the DRAM PLL.
    pub fn dram_pll_init(&mut self, hz: u32) -> Result<(), ClockError> {
        self.configure_fractional(PllId::Dram, hz)
    }

    /// Run DRAM from the alternate root instead of the DRAM PLL.
    ///
    /// `hz` must be 100, 250 or 400 MHz.
    pub fn dram_enable_bypass(&mut self, hz: u32) -> Result<(), ClockError> {
        let bypass = DRAM_BYPASS
            .iter()
            .find(|bypass| bypass.hz == hz)
            .ok_or(ClockError::UnsupportedRate { hz })?;

        self.set_roots(&[
            (RootId::DramAlt, bypass.alt),
            (RootId::DramApb, bypass.apb),
            (RootId::DramSel, RootConfig::source(1)),
        ])
    }

    /// Switch DRAM back to the DRAM PLL.
    pub fn dram_disable_bypass(&mut self) -> Result<(), ClockError> {
        self.set_roots(&[
            (RootId::DramSel, RootConfig::source(0)),
            (RootId::DramApb, RootConfig::source(4).pre_div(5)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sim::SimBank, ClockSource, ErrorKind, Frequency, SystemClock};

    fn booted() -> Ccm<SimBank> {
        let mut ccm = Ccm::new(SimBank::power_on());
        ccm.enable_pll_taps(PllId::Sys1).unwrap();
        ccm.enable_pll_taps(PllId::Sys2).unwrap();
        ccm
    }

    #[test]
    fn uart_index_bounds() {
        let mut ccm = Ccm::new(SimBank::new());
        ccm.enable_uart_clock(3).unwrap();
        assert_eq!(
            ccm.get_clock_frequency(RootId::Uart4),
            Frequency::Hz(24_000_000)
        );
        assert!(ccm.gate_enabled(GateId::Uart4));

        let err = ccm.enable_uart_clock(4).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn usdhc_runs_at_200m() {
        let mut ccm = booted();
        ccm.enable_usdhc_clock(1).unwrap();
        assert_eq!(
            ccm.get_clock_frequency(SystemClock::Esdhc2),
            Frequency::Hz(200_000_000)
        );
        assert!(ccm.gate_enabled(GateId::Usdhc2));
        assert_eq!(
            ccm.enable_usdhc_clock(3),
            Err(ClockError::InvalidIndex {
                peripheral: "usdhc",
                index: 3
            })
        );
    }

    #[test]
    fn i2c_gates() {
        let mut ccm = Ccm::new(SimBank::new());
        ccm.enable_i2c_clock(2, true).unwrap();
        assert!(ccm.gate_enabled(GateId::I2c3));
        ccm.enable_i2c_clock(2, false).unwrap();
        assert!(!ccm.gate_enabled(GateId::I2c3));
        assert!(ccm.enable_i2c_clock(4, true).is_err());

        ccm.enable_ocotp_clock(true);
        assert!(ccm.gate_enabled(GateId::Ocotp));
    }

    #[test]
    fn display_pipeline() {
        let mut ccm = booted();
        ccm.enable_display_clock(true).unwrap();
        assert_eq!(
            ccm.get_clock_frequency(ClockSource::VIDEO_PLL),
            Frequency::Hz(VIDEO_PLL_HZ)
        );
        assert_eq!(
            ccm.get_clock_frequency(RootId::DisplayAxi),
            Frequency::Hz(500_000_000)
        );
        assert_eq!(
            ccm.get_clock_frequency(RootId::DisplayApb),
            Frequency::Hz(200_000_000)
        );
        assert_eq!(
            ccm.get_clock_frequency(RootId::DsiPhyRef),
            Frequency::Hz(27_000_000)
        );
        assert!(ccm.gate_enabled(GateId::DispMix));

        ccm.enable_display_clock(false).unwrap();
        assert!(!ccm.gate_enabled(GateId::DispMix));
    }

    #[test]
    fn display_gate_comes_back_after_lock_timeout() {
        let mut ccm = Ccm::new(SimBank::power_on().never_lock(PllId::Video));
        let err = ccm.enable_display_clock(true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LockTimeout);
        assert!(ccm.gate_enabled(GateId::DispMix));
        // the roots were still programmed
        assert!(ccm.root_config(RootId::DsiPhyRef).enabled);
    }

    #[test]
    fn usb_clocks() {
        let mut ccm = booted();
        ccm.enable_usb_clock(true).unwrap();
        assert_eq!(
            ccm.get_clock_frequency(RootId::UsbBus),
            Frequency::Hz(500_000_000)
        );
        assert_eq!(
            ccm.get_clock_frequency(RootId::UsbCoreRef),
            Frequency::Hz(100_000_000)
        );
        assert!(ccm.gate_enabled(GateId::UsbMscalePl301));
    }

    #[test]
    fn enet_clocks() {
        let mut ccm = booted();
        ccm.set_enet_clock(EnetRefFreq::Mhz25, true).unwrap();
        assert_eq!(
            ccm.get_clock_frequency(SystemClock::Enet),
            Frequency::Hz(266_666_666)
        );
        assert_eq!(
            ccm.get_clock_frequency(RootId::EnetRef),
            Frequency::Hz(25_000_000)
        );
        assert_eq!(
            ccm.get_clock_frequency(RootId::EnetTimer),
            Frequency::Hz(25_000_000)
        );
        assert_eq!(
            ccm.get_clock_frequency(RootId::EnetPhyRef),
            Frequency::Hz(25_000_000)
        );
        assert!(ccm.gate_enabled(GateId::Enet1));
        assert!(ccm.gate_enabled(GateId::SimEnet));
    }

    #[test]
    fn lcd_clock_divides_video_pll() {
        let mut ccm = booted();
        ccm.configure_fractional(PllId::Video, VIDEO_PLL_HZ).unwrap();

        ccm.set_lcd_clock(33_000).unwrap();
        assert_eq!(
            ccm.get_clock_frequency(RootId::LcdifPixel),
            Frequency::Hz(33_000_000)
        );

        // 594000 / 70000 rounds up to a divisor of 9
        ccm.set_lcd_clock(70_000).unwrap();
        assert_eq!(
            ccm.get_clock_frequency(RootId::LcdifPixel),
            Frequency::Hz(66_000_000)
        );
    }

    #[test]
    fn lcd_clock_without_factorization() {
        let mut ccm = Ccm::new(SimBank::new());
        // needs a divisor of 67, which is prime and larger than 64
        assert_eq!(
            ccm.set_lcd_clock(8_866),
            Err(ClockError::UnsupportedRate { hz: 8_866_000 })
        );
        assert_eq!(
            ccm.set_lcd_clock(0),
            Err(ClockError::UnsupportedRate { hz: 0 })
        );
        assert!(ccm.borrow_raw().writes().is_empty());
    }

    #[test]
    fn dram_bypass() {
        let mut ccm = booted();
        ccm.dram_enable_bypass(400_000_000).unwrap();
        assert_eq!(
            ccm.root_config(RootId::DramAlt),
            RootConfig::source(1).pre_div(2)
        );
        assert_eq!(
            ccm.root_config(RootId::DramApb),
            RootConfig::source(3).pre_div(2)
        );
        assert_eq!(ccm.root_config(RootId::DramSel), RootConfig::source(1));
        // sys_pll1 800 MHz / 2, through the DRAM select mux
        assert_eq!(
            ccm.get_clock_frequency(RootId::DramSel),
            Frequency::Hz(400_000_000)
        );

        ccm.dram_disable_bypass().unwrap();
        assert_eq!(ccm.root_config(RootId::DramSel), RootConfig::source(0));
        assert_eq!(
            ccm.root_config(RootId::DramApb),
            RootConfig::source(4).pre_div(5)
        );

        assert_eq!(
            ccm.dram_enable_bypass(300_000_000),
            Err(ClockError::UnsupportedRate { hz: 300_000_000 })
        );
    }

    #[test]
    fn dram_pll() {
        let mut ccm = Ccm::new(SimBank::power_on());
        ccm.dram_pll_init(750_000_000).unwrap();
        assert_eq!(
            ccm.decode_fractional_pll(PllId::Dram),
            Frequency::Hz(750_000_000)
        );
    }
}
