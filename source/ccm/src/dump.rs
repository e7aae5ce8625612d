use crate::{Ccm, ClockId, ClockSource as S, Mmio, RootId};
use core::fmt;

const DUMP: &[(&str, ClockId)] = &[
    ("ARM_PLL", ClockId::Source(S::ARM_PLL)),
    ("SYS_PLL1_800", ClockId::Source(S::SYS_PLL1_800M)),
    ("SYS_PLL1_400", ClockId::Source(S::SYS_PLL1_400M)),
    ("SYS_PLL1_266", ClockId::Source(S::SYS_PLL1_266M)),
    ("SYS_PLL1_200", ClockId::Source(S::SYS_PLL1_200M)),
    ("SYS_PLL1_160", ClockId::Source(S::SYS_PLL1_160M)),
    ("SYS_PLL1_133", ClockId::Source(S::SYS_PLL1_133M)),
    ("SYS_PLL1_100", ClockId::Source(S::SYS_PLL1_100M)),
    ("SYS_PLL1_80", ClockId::Source(S::SYS_PLL1_80M)),
    ("SYS_PLL1_40", ClockId::Source(S::SYS_PLL1_40M)),
    ("SYS_PLL2_1000", ClockId::Source(S::SYS_PLL2_1000M)),
    ("SYS_PLL2_500", ClockId::Source(S::SYS_PLL2_500M)),
    ("SYS_PLL2_333", ClockId::Source(S::SYS_PLL2_333M)),
    ("SYS_PLL2_250", ClockId::Source(S::SYS_PLL2_250M)),
    ("SYS_PLL2_200", ClockId::Source(S::SYS_PLL2_200M)),
    ("SYS_PLL2_166", ClockId::Source(S::SYS_PLL2_166M)),
    ("SYS_PLL2_125", ClockId::Source(S::SYS_PLL2_125M)),
    ("SYS_PLL2_100", ClockId::Source(S::SYS_PLL2_100M)),
    ("SYS_PLL2_50", ClockId::Source(S::SYS_PLL2_50M)),
    ("SYS_PLL3", ClockId::Source(S::SYS_PLL3)),
    ("DRAM_PLL", ClockId::Source(S::DRAM_PLL)),
    ("AUDIO_PLL1", ClockId::Source(S::AUDIO_PLL1)),
    ("AUDIO_PLL2", ClockId::Source(S::AUDIO_PLL2)),
    ("VIDEO_PLL", ClockId::Source(S::VIDEO_PLL)),
    ("UART1", ClockId::Root(RootId::Uart1)),
    ("USDHC1", ClockId::Root(RootId::Usdhc1)),
    ("QSPI", ClockId::Root(RootId::Qspi)),
];

impl<R: Mmio> Ccm<R> {
    /// Write one `NAME: N MHz` line for every PLL tap and a few peripheral
    /// roots.
    ///
    /// Clocks that are off print as 0 MHz.
    pub fn dump(&mut self, out: &mut impl fmt::Write) -> fmt::Result {
        for &(name, clock) in DUMP {
            let mhz = self.get_clock_frequency(clock).hz() / 1_000_000;
            writeln!(out, "{name:>13}: {mhz:>4} MHz")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sim::SimBank, PllId};

    #[test]
    fn dump_power_on() {
        let mut ccm = Ccm::new(SimBank::power_on());
        ccm.enable_pll_taps(PllId::Sys1).unwrap();

        let mut out = String::new();
        ccm.dump(&mut out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), DUMP.len());
        assert_eq!(lines[0].trim(), "ARM_PLL:    0 MHz");
        assert_eq!(lines[2].trim(), "SYS_PLL1_400:  400 MHz");
        assert_eq!(lines[3].trim(), "SYS_PLL1_266:  266 MHz");
        // taps are still gated
        assert_eq!(lines[10].trim(), "SYS_PLL2_1000:    0 MHz");
        assert!(lines.iter().all(|line| line.ends_with(" MHz")));
    }
}
