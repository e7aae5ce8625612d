//! # i.MX 8M clock controller
//!
//! PLL and clock-tree configuration for the i.MX 8M Mini and Nano.
//!
//! The clock tree starts at the 24 MHz crystal, which feeds the ANATOP PLLs.
//! Each PLL exposes one or more output taps. The CCM's clock *roots* pick one
//! of those taps (or an oscillator) from a fixed per-root menu and divide it
//! down, and the CCM's clock *gates* switch the result on or off for each
//! peripheral.
//!
//! Everything is reached through a [`Ccm`] handle, which owns a register
//! backend implementing [`Mmio`]:
//!
//! ```rust
//! # #[cfg(feature = "use-std")] {
//! use ccm::{sim::SimBank, BoardConfig, Ccm, RootId};
//!
//! let mut ccm = Ccm::new(SimBank::power_on());
//! let report = ccm.init_clock_tree(&BoardConfig::default()).unwrap();
//! assert!(report.is_clean());
//! assert_eq!(ccm.get_clock_frequency(RootId::Uart1).hz(), 24_000_000);
//! # }
//! ```
#![cfg_attr(not(any(feature = "use-std", test)), no_std)]

pub mod clock;
pub mod config;
mod dump;
pub mod error;
pub mod gate;
pub mod mmio;
pub mod periph;
pub mod pll;
pub mod regs;
pub mod root;
#[cfg(any(test, feature = "use-std"))]
pub mod sim;
pub mod source;
pub mod tree;

#[cfg(test)]
mod test_util;

pub use self::{
    clock::{ClockId, SystemClock},
    config::{BoardConfig, SocVariant},
    error::{ClockError, ErrorKind},
    gate::GateId,
    mmio::Mmio,
    periph::EnetRefFreq,
    pll::{IntPllRate, PllId, PllKind, PllTarget, Tap},
    root::{RootConfig, RootId},
    source::{ClockSource, Frequency, Off},
    tree::{BootStep, InitReport, StepFailure},
};

/// Frequency of the 24 MHz crystal oscillator, the reference for every PLL.
pub const OSC_24M_HZ: u32 = 24_000_000;
/// Frequency of the 32 kHz RTC oscillator.
pub const OSC_32K_HZ: u32 = 32_000;
/// Frequency of the HDMI PHY reference oscillator.
pub const OSC_HDMI_HZ: u32 = 26_000_000;

/// A handle to the clock controller.
///
/// Owns the register backend for its whole lifetime. There is no global
/// state: every operation goes through `&mut self`.
pub struct Ccm<R> {
    regs: R,
    initialized: bool,
}

impl<R> Ccm<R> {
    #[must_use]
    pub fn new(regs: R) -> Self {
        Self {
            regs,
            initialized: false,
        }
    }

    /// Give back the register backend.
    #[must_use]
    pub fn release(self) -> R {
        self.regs
    }

    /// Lend out the register backend, e.g. to inspect a simulated bank.
    pub fn borrow_raw(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Whether [`Ccm::init_clock_tree`] has already run on this handle.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
