//! Bringing up the clock tree from reset.
//!
//! [`Ccm::init_clock_tree`] runs a fixed list of [`BootStep`]s. The order
//! matters: a PLL is locked before any root selects it, and a peripheral's
//! gate is off while its root changes. A step that fails is recorded in the
//! [`InitReport`] and the remaining steps still run, since each peripheral's
//! clocks are independent of the others.
use crate::{
    periph::{UART_ROOT, USDHC_ROOT},
    BoardConfig, Ccm, ClockError, GateId, Mmio, PllId, RootConfig, RootId,
};
use core::fmt;

/// One step of [`Ccm::init_clock_tree`], in the order they run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BootStep {
    /// Move the CPU onto `sys_pll2` 500 MHz while its PLL changes.
    CpuSafeSource,
    ArmPll,
    /// Move the CPU back onto the ARM PLL.
    CpuRoot,
    /// Enable every output tap of `sys_pll1` and `sys_pll2`.
    SysPllTaps,
    /// Bring up `sys_pll3` and move the NOC onto it.
    SysPll3,
    Gic,
    Uart,
    Usdhc,
    Dram,
    Qspi,
    Nand,
    Wdog,
    TempSensor,
    Ecspi,
    SecDebug,
    Display,
}

impl BootStep {
    pub const ALL: [BootStep; 16] = [
        BootStep::CpuSafeSource,
        BootStep::ArmPll,
        BootStep::CpuRoot,
        BootStep::SysPllTaps,
        BootStep::SysPll3,
        BootStep::Gic,
        BootStep::Uart,
        BootStep::Usdhc,
        BootStep::Dram,
        BootStep::Qspi,
        BootStep::Nand,
        BootStep::Wdog,
        BootStep::TempSensor,
        BootStep::Ecspi,
        BootStep::SecDebug,
        BootStep::Display,
    ];
}

impl fmt::Display for BootStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::CpuSafeSource => "cpu safe source",
            Self::ArmPll => "arm pll",
            Self::CpuRoot => "cpu root",
            Self::SysPllTaps => "sys pll taps",
            Self::SysPll3 => "sys pll3",
            Self::Gic => "gic",
            Self::Uart => "uart",
            Self::Usdhc => "usdhc",
            Self::Dram => "dram",
            Self::Qspi => "qspi",
            Self::Nand => "nand",
            Self::Wdog => "watchdog",
            Self::TempSensor => "temperature sensor",
            Self::Ecspi => "ecspi",
            Self::SecDebug => "security debug",
            Self::Display => "display",
        })
    }
}

/// A [`BootStep`] that did not complete.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StepFailure {
    pub step: BootStep,
    pub error: ClockError,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.step, self.error)
    }
}

/// The outcome of [`Ccm::init_clock_tree`].
#[derive(Clone, Debug, Default)]
pub struct InitReport {
    failures: heapless::Vec<StepFailure, { BootStep::ALL.len() }>,
}

impl InitReport {
    /// The steps that failed, in the order they ran.
    #[must_use]
    pub fn failures(&self) -> &[StepFailure] {
        &self.failures
    }

    /// Whether every step succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, step: BootStep, result: Result<(), ClockError>) {
        if let Err(error) = result {
            tracing::warn!(%step, %error, "clock tree step failed, continuing");
            // each step runs once, so there is always room
            let _ = self.failures.push(StepFailure { step, error });
        }
    }
}

const UART_GATES: &[GateId] = &[GateId::Uart1, GateId::Uart2, GateId::Uart3, GateId::Uart4];
const USDHC_GATES: &[GateId] = &[GateId::Usdhc1, GateId::Usdhc2, GateId::Usdhc3];
const WDOG_GATES: &[GateId] = &[GateId::Wdog1, GateId::Wdog2, GateId::Wdog3];
const ECSPI_GATES: &[GateId] = &[GateId::Ecspi1, GateId::Ecspi2, GateId::Ecspi3];

impl<R: Mmio> Ccm<R> {
    /// Bring the whole clock tree up from its reset state.
    ///
    /// Every [`BootStep`] is attempted. Failed steps are logged and listed in
    /// the returned [`InitReport`]; this only returns `Err` if the tree has
    /// already been brought up through this handle.
    #[tracing::instrument(level = "info", skip(self, config), fields(variant = ?config.variant))]
    pub fn init_clock_tree(&mut self, config: &BoardConfig) -> Result<InitReport, ClockError> {
        if self.initialized {
            return Err(ClockError::AlreadyInitialized);
        }
        self.initialized = true;

        let mut report = InitReport::default();
        for step in BootStep::ALL {
            tracing::debug!(%step, "running clock tree step");
            let result = self.boot_step(step, config);
            report.record(step, result);
        }

        tracing::info!(failed = report.failures.len(), "clock tree initialized");
        Ok(report)
    }

    fn boot_step(&mut self, step: BootStep, config: &BoardConfig) -> Result<(), ClockError> {
        match step {
            BootStep::CpuSafeSource => {
                // sys_pll2 500 MHz
                self.set_root(RootId::ArmA53, RootConfig::source(2))
            }
            BootStep::ArmPll => self.configure_integer(PllId::Arm, config.arm_pll),
            // runs whether or not the ARM PLL locked
            BootStep::CpuRoot => self.set_root(RootId::ArmA53, RootConfig::source(1)),
            BootStep::SysPllTaps => self
                .enable_pll_taps(PllId::Sys1)
                .and(self.enable_pll_taps(PllId::Sys2)),
            BootStep::SysPll3 => {
                let pll = self.configure_integer(PllId::Sys3, config.variant.sys_pll3_rate());
                // moves the NOC whether or not the PLL locked
                pll.and(self.set_root(RootId::Noc, RootConfig::source(2)))
            }
            BootStep::Gic => self.with_gates_off(&[GateId::Gic], |ccm| {
                // sys_pll2 100 MHz
                ccm.set_root(RootId::Gic, RootConfig::source(3))
            }),
            BootStep::Uart => self.with_gates_off(UART_GATES, |ccm| {
                ccm.set_roots(&[
                    (RootId::Uart1, UART_ROOT),
                    (RootId::Uart2, UART_ROOT),
                    (RootId::Uart3, UART_ROOT),
                    (RootId::Uart4, UART_ROOT),
                ])
            }),
            BootStep::Usdhc => self.with_gates_off(USDHC_GATES, |ccm| {
                ccm.set_roots(&[
                    // sys_pll1 266 MHz
                    (RootId::NandUsdhcBus, RootConfig::source(1)),
                    (RootId::Usdhc1, USDHC_ROOT),
                    (RootId::Usdhc2, USDHC_ROOT),
                    (RootId::Usdhc3, USDHC_ROOT),
                ])
            }),
            BootStep::Dram => self.with_gates_off(&[GateId::Ddr1], |ccm| {
                ccm.set_roots(&[
                    (RootId::DramAlt, RootConfig::source(1)),
                    (RootId::DramApb, RootConfig::source(1)),
                ])
            }),
            BootStep::Qspi => self.with_gates_off(&[GateId::Qspi], |ccm| {
                ccm.set_root(RootId::Qspi, RootConfig::source(0))
            }),
            BootStep::Nand => self.with_gates_off(&[GateId::RawNand], |ccm| {
                // sys_pll1 400 MHz / 4
                ccm.set_root(RootId::Nand, RootConfig::source(3).post_div(4))
            }),
            BootStep::Wdog => self.with_gates_off(WDOG_GATES, |ccm| {
                ccm.set_root(RootId::Wdog, RootConfig::source(0))
            }),
            BootStep::TempSensor => {
                self.enable_gate(GateId::TempSensor, true);
                Ok(())
            }
            BootStep::Ecspi => self.with_gates_off(ECSPI_GATES, |ccm| {
                ccm.set_roots(&[
                    (RootId::Ecspi1, RootConfig::source(0)),
                    (RootId::Ecspi2, RootConfig::source(0)),
                    (RootId::Ecspi3, RootConfig::source(0)),
                ])
            }),
            BootStep::SecDebug => {
                self.enable_gate(GateId::SecDebug, true);
                Ok(())
            }
            BootStep::Display => self.enable_display_clock(config.display),
        }
    }
}
