//! Frequency lookups by clock identity.
use crate::{
    regs::TargetRoot, root::slice_addr, Ccm, ClockSource, Frequency, Mmio, RootId,
};

/// `IPG_CLK_ROOT` only has a post-divider, so it isn't a [`RootId`].
const IPG_SLICE: u32 = 33;

/// Clocks that drivers ask for by function rather than by root.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SystemClock {
    /// The Cortex-A53 core clock.
    Arm,
    /// The peripheral bus clock, derived from AHB.
    Ipg,
    /// ECSPI1.
    Cspi,
    /// USDHC1.
    Esdhc1,
    /// USDHC2.
    Esdhc2,
    /// USDHC3.
    Esdhc3,
    /// I2C1.
    I2c,
    /// UART1.
    Uart,
    Qspi,
    /// The ENET AXI bus clock.
    Enet,
}

/// Anything [`Ccm::get_clock_frequency`] can look up.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClockId {
    Source(ClockSource),
    Root(RootId),
    System(SystemClock),
}

impl From<ClockSource> for ClockId {
    fn from(source: ClockSource) -> Self {
        Self::Source(source)
    }
}

impl From<RootId> for ClockId {
    fn from(root: RootId) -> Self {
        Self::Root(root)
    }
}

impl From<SystemClock> for ClockId {
    fn from(clock: SystemClock) -> Self {
        Self::System(clock)
    }
}

impl<R: Mmio> Ccm<R> {
    /// Look up the current frequency of a clock.
    ///
    /// Use [`Frequency::hz`] to get 0 for clocks that are off or unknown.
    pub fn get_clock_frequency(&mut self, clock: impl Into<ClockId>) -> Frequency {
        match clock.into() {
            ClockId::Source(source) => self.source_frequency(source),
            ClockId::Root(root) => self.root_frequency(root),
            ClockId::System(clock) => self.system_clock(clock),
        }
    }

    fn system_clock(&mut self, clock: SystemClock) -> Frequency {
        let root = match clock {
            SystemClock::Arm => RootId::ArmA53,
            SystemClock::Cspi => RootId::Ecspi1,
            SystemClock::Esdhc1 => RootId::Usdhc1,
            SystemClock::Esdhc2 => RootId::Usdhc2,
            SystemClock::Esdhc3 => RootId::Usdhc3,
            SystemClock::I2c => RootId::I2c1,
            SystemClock::Uart => RootId::Uart1,
            SystemClock::Qspi => RootId::Qspi,
            SystemClock::Enet => RootId::EnetAxi,
            SystemClock::Ipg => {
                let ipg = TargetRoot::from_bits(self.regs.read32(slice_addr(IPG_SLICE)));
                let div = (ipg.get(TargetRoot::POST_PODF) & 0b11) + 1;
                return self.root_frequency(RootId::Ahb).map(|hz| hz / 2 / div);
            }
        };
        self.root_frequency(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sim::SimBank, Off, RootConfig};

    #[test]
    fn system_clocks_follow_their_roots() {
        let mut ccm = Ccm::new(SimBank::new());
        ccm.set_root(RootId::Uart1, RootConfig::source(0)).unwrap();
        ccm.set_root(RootId::I2c1, RootConfig::source(0).post_div(3))
            .unwrap();

        assert_eq!(
            ccm.get_clock_frequency(SystemClock::Uart),
            Frequency::Hz(24_000_000)
        );
        assert_eq!(
            ccm.get_clock_frequency(RootId::Uart1),
            Frequency::Hz(24_000_000)
        );
        assert_eq!(
            ccm.get_clock_frequency(SystemClock::I2c),
            Frequency::Hz(8_000_000)
        );
        assert_eq!(
            ccm.get_clock_frequency(SystemClock::Esdhc3),
            Frequency::Off(Off::RootDisabled)
        );
        assert_eq!(
            ccm.get_clock_frequency(ClockSource::Osc24M),
            Frequency::Hz(24_000_000)
        );
    }

    #[test]
    fn ipg_divides_ahb() {
        let mut bank = SimBank::new();
        // IPG post-divider field is 1 -> divide by 2
        bank.poke(slice_addr(IPG_SLICE), 1);
        let mut ccm = Ccm::new(bank);
        ccm.set_root(RootId::Ahb, RootConfig::source(0)).unwrap();
        assert_eq!(
            ccm.get_clock_frequency(SystemClock::Ipg),
            Frequency::Hz(24_000_000 / 2 / 2)
        );
    }
}
