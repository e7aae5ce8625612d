//! CCM clock gates.
use crate::{
    regs::{Ccgr, GateSetting, CCGR_OFFSET, CCGR_STRIDE, CCM_BASE},
    Ccm, Mmio,
};

macro_rules! gates {
    ($($Gate:ident => $name:literal @ $index:literal,)+) => {
        /// A CCM clock gate (`CCGR`).
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum GateId {
            $($Gate,)+
        }

        impl GateId {
            pub const ALL: &'static [GateId] = &[$(GateId::$Gate,)+];

            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $(GateId::$Gate => $name,)+
                }
            }

            /// Index of this gate's `CCGR` register.
            #[must_use]
            pub fn index(self) -> u32 {
                match self {
                    $(GateId::$Gate => $index,)+
                }
            }
        }
    };
}

gates! {
    Ddr1 => "ddr1" @ 5,
    Ecspi1 => "ecspi1" @ 7,
    Ecspi2 => "ecspi2" @ 8,
    Ecspi3 => "ecspi3" @ 9,
    Enet1 => "enet1" @ 10,
    I2c1 => "i2c1" @ 23,
    I2c2 => "i2c2" @ 24,
    I2c3 => "i2c3" @ 25,
    I2c4 => "i2c4" @ 26,
    Ocotp => "ocotp" @ 34,
    Qspi => "qspi" @ 47,
    RawNand => "rawnand" @ 48,
    SecDebug => "sec_debug" @ 60,
    SimEnet => "sim_enet" @ 64,
    TempSensor => "temp_sensor" @ 72,
    Uart1 => "uart1" @ 73,
    Uart2 => "uart2" @ 74,
    Uart3 => "uart3" @ 75,
    Uart4 => "uart4" @ 76,
    UsbMscalePl301 => "usb_mscale_pl301" @ 77,
    Usdhc1 => "usdhc1" @ 81,
    Usdhc2 => "usdhc2" @ 82,
    Wdog1 => "wdog1" @ 83,
    Wdog2 => "wdog2" @ 84,
    Wdog3 => "wdog3" @ 85,
    Gic => "gic" @ 92,
    DispMix => "dispmix" @ 93,
    Usdhc3 => "usdhc3" @ 94,
}

impl GateId {
    /// Address of this gate's `CCGR` register.
    #[must_use]
    pub fn addr(self) -> u32 {
        CCM_BASE + CCGR_OFFSET + self.index() * CCGR_STRIDE
    }
}

impl<R: Mmio> Ccm<R> {
    /// Turn a clock gate fully on or fully off.
    pub fn enable_gate(&mut self, gate: GateId, enable: bool) {
        let setting = if enable {
            GateSetting::Always
        } else {
            GateSetting::Off
        };
        tracing::trace!(gate = gate.name(), enable);
        self.regs
            .write32(gate.addr(), Ccgr::new().with(Ccgr::SETTING, setting).bits());
    }

    /// Whether a gate is on in any mode.
    pub fn gate_enabled(&mut self, gate: GateId) -> bool {
        Ccgr::from_bits(self.regs.read32(gate.addr())).get(Ccgr::SETTING) != GateSetting::Off
    }

    /// Gate `gates` off, run `f`, then gate them back on.
    ///
    /// Clock roots should only be changed while everything they feed is gated
    /// off; this wraps that pattern.
    pub fn with_gates_off<T>(&mut self, gates: &[GateId], f: impl FnOnce(&mut Self) -> T) -> T {
        for &gate in gates {
            self.enable_gate(gate, false);
        }
        let ret = f(self);
        for &gate in gates {
            self.enable_gate(gate, true);
        }
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimBank;

    #[test]
    fn indices_are_unique() {
        for (i, a) in GateId::ALL.iter().enumerate() {
            for b in &GateId::ALL[i + 1..] {
                assert_ne!(a.index(), b.index(), "{a:?} and {b:?}");
            }
        }
        assert_eq!(GateId::Ddr1.addr(), 0x3038_4050);
    }

    #[test]
    fn gate_on_off() {
        let mut ccm = Ccm::new(SimBank::new());
        assert!(!ccm.gate_enabled(GateId::Uart2));
        ccm.enable_gate(GateId::Uart2, true);
        assert!(ccm.gate_enabled(GateId::Uart2));
        assert_eq!(ccm.borrow_raw().peek(GateId::Uart2.addr()), 0b11);
        ccm.enable_gate(GateId::Uart2, false);
        assert!(!ccm.gate_enabled(GateId::Uart2));
    }

    #[test]
    fn gates_are_off_during_the_closure() {
        let mut ccm = Ccm::new(SimBank::new());
        ccm.enable_gate(GateId::Gic, true);
        let was_on = ccm.with_gates_off(&[GateId::Gic], |ccm| ccm.gate_enabled(GateId::Gic));
        assert!(!was_on);
        assert!(ccm.gate_enabled(GateId::Gic));
    }
}
