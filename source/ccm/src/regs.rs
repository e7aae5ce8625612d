//! Register layouts for the ANATOP PLLs and the CCM.
use mycelium_bitfield::{bitfield, enum_from_bits};

/// Analog block: PLL control registers.
pub const ANATOP_BASE: u32 = 0x3036_0000;
/// Clock control module: clock roots and clock gates.
pub const CCM_BASE: u32 = 0x3038_0000;
/// System reset controller.
pub const SRC_BASE: u32 = 0x3039_0000;
/// General power controller.
pub const GPC_BASE: u32 = 0x303A_0000;

/// Offset of `CCM_CCGR0` within the CCM.
pub(crate) const CCGR_OFFSET: u32 = 0x4000;
pub(crate) const CCGR_STRIDE: u32 = 0x10;
/// Offset of `CCM_TARGET_ROOT0` within the CCM.
pub(crate) const ROOT_OFFSET: u32 = 0x8000;
pub(crate) const ROOT_STRIDE: u32 = 0x80;

enum_from_bits! {
    /// PLL reference clock selection.
    #[derive(Debug, Eq, PartialEq)]
    pub enum RefClkSel<u8> {
        /// The 24 MHz crystal.
        Osc24M = 0b00,
        /// `PAD_CLK`, an external reference.
        PadClk = 0b01,
        Reserved2 = 0b10,
        Reserved3 = 0b11,
    }
}

bitfield! {
    /// `*_PLL_GNRL_CTL`: PLL general control, shared by integer and
    /// fractional PLLs.
    ///
    /// Integer PLLs with several output taps use the `DIVn_CLKE` bits; PLLs
    /// with a single output only use `CLKE`.
    pub struct GnrlCtl<u32> {
        pub const REF_CLK_SEL: RefClkSel;
        const _RESERVED_0 = 2;
        /// Bypass the PLL; its output follows the reference.
        pub const BYPASS: bool;
        const _RESERVED_1 = 4;
        /// Reset release. When clear, the PLL is held in reset.
        pub const RST: bool;
        const _RESERVED_2 = 1;
        /// Direct output enable.
        pub const CLKE: bool;
        const _RESERVED_3 = 1;
        pub const DIV2_CLKE: bool;
        const _RESERVED_4 = 1;
        pub const DIV3_CLKE: bool;
        const _RESERVED_5 = 1;
        pub const DIV4_CLKE: bool;
        const _RESERVED_6 = 1;
        pub const DIV5_CLKE: bool;
        const _RESERVED_7 = 1;
        pub const DIV6_CLKE: bool;
        const _RESERVED_8 = 1;
        pub const DIV8_CLKE: bool;
        const _RESERVED_9 = 1;
        pub const DIV10_CLKE: bool;
        const _RESERVED_10 = 1;
        pub const DIV20_CLKE: bool;
        const _EXT_BYPASS = 1;
        /// Use the PLL's own lock detector rather than the lock counter.
        pub const LOCK_SEL: bool;
        const _RESERVED_11 = 1;
        /// PLL lock status. Read-only.
        pub const LOCK: bool;
    }
}

bitfield! {
    /// `*_PLL_DIV_CTL` on integer PLLs, `*_PLL_FDIV_CTL0` on fractional PLLs.
    pub struct DivCtl<u32> {
        /// Post-divider, as the log2 of the divisor.
        pub const POST_DIV = 3;
        const _RESERVED_0 = 1;
        /// Pre-divider, as the divisor itself.
        pub const PRE_DIV = 6;
        const _RESERVED_1 = 2;
        /// Main (feedback) divider.
        pub const MAIN_DIV = 10;
    }
}

bitfield! {
    /// `*_PLL_FDIV_CTL1`: fractional PLL numerator.
    pub struct FdivCtl1<u32> {
        /// Delta-sigma numerator, in units of 1/65536.
        pub const DSM = 16;
    }
}

bitfield! {
    /// `CCM_TARGET_ROOTn`: one clock root slice.
    pub struct TargetRoot<u32> {
        /// Post-divider, stored as divisor - 1.
        pub const POST_PODF = 6;
        const _RESERVED_0 = 10;
        /// Pre-divider, stored as divisor - 1.
        pub const PRE_PODF = 3;
        const _RESERVED_1 = 5;
        /// Index into the root's source menu.
        pub const MUX = 3;
        const _RESERVED_2 = 1;
        pub const ENABLE: bool;
    }
}

enum_from_bits! {
    /// Clock gate setting for one domain.
    #[derive(Debug, Eq, PartialEq)]
    pub enum GateSetting<u8> {
        /// Clock is off.
        Off = 0b00,
        /// Clock is on in run mode only.
        Run = 0b01,
        /// Clock is on in run and wait modes.
        RunWait = 0b10,
        /// Clock is always on.
        Always = 0b11,
    }
}

bitfield! {
    /// `CCM_CCGRn`: one clock gate.
    pub struct Ccgr<u32> {
        pub const SETTING: GateSetting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn gnrl_ctl_is_valid() {
        GnrlCtl::assert_valid();
        println!("{}", GnrlCtl::new())
    }

    #[test]
    fn div_ctl_is_valid() {
        DivCtl::assert_valid();
        println!("{}", DivCtl::new())
    }

    #[test]
    fn fdiv_ctl1_is_valid() {
        FdivCtl1::assert_valid();
        println!("{}", FdivCtl1::new())
    }

    #[test]
    fn target_root_is_valid() {
        TargetRoot::assert_valid();
        println!("{}", TargetRoot::new())
    }

    #[test]
    fn ccgr_is_valid() {
        Ccgr::assert_valid();
        println!("{}", Ccgr::new())
    }

    #[test]
    fn gnrl_ctl_bit_positions() {
        let bit = |ctl: GnrlCtl| ctl.bits();
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::BYPASS, true)), 1 << 4);
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::RST, true)), 1 << 9);
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::CLKE, true)), 1 << 11);
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::DIV2_CLKE, true)), 1 << 13);
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::DIV3_CLKE, true)), 1 << 15);
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::DIV4_CLKE, true)), 1 << 17);
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::DIV5_CLKE, true)), 1 << 19);
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::DIV6_CLKE, true)), 1 << 21);
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::DIV8_CLKE, true)), 1 << 23);
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::DIV10_CLKE, true)), 1 << 25);
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::DIV20_CLKE, true)), 1 << 27);
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::LOCK_SEL, true)), 1 << 29);
        assert_eq!(bit(GnrlCtl::new().with(GnrlCtl::LOCK, true)), 1 << 31);
        assert_eq!(
            bit(GnrlCtl::new().with(GnrlCtl::REF_CLK_SEL, RefClkSel::PadClk)),
            0b01
        );
    }

    #[test]
    fn gate_on_is_both_bits() {
        let gate = Ccgr::new().with(Ccgr::SETTING, GateSetting::Always);
        assert_eq!(gate.bits(), 0b11);
        assert_eq!(Ccgr::from_bits(0b11).get(Ccgr::SETTING), GateSetting::Always);
    }

    proptest! {
        #[test]
        fn div_ctl_packing(main in 0u32..1024, pre in 0u32..64, post in 0u32..8) {
            let packed = DivCtl::new()
                .with(DivCtl::MAIN_DIV, main)
                .with(DivCtl::PRE_DIV, pre)
                .with(DivCtl::POST_DIV, post);
            let manual = (main << 12) | (pre << 4) | post;
            prop_assert_eq!(
                packed.bits(),
                manual,
                "\n{:032b} (actual)\n{:032b} (expected)",
                packed.bits(),
                manual,
            );

            let unpacked = DivCtl::from_bits(manual);
            prop_assert_eq!(unpacked.get(DivCtl::MAIN_DIV), main);
            prop_assert_eq!(unpacked.get(DivCtl::PRE_DIV), pre);
            prop_assert_eq!(unpacked.get(DivCtl::POST_DIV), post);
        }

        #[test]
        fn target_root_packing(
            enable: bool,
            mux in 0u32..8,
            pre in 0u32..8,
            post in 0u32..64,
        ) {
            let packed = TargetRoot::new()
                .with(TargetRoot::ENABLE, enable)
                .with(TargetRoot::MUX, mux)
                .with(TargetRoot::PRE_PODF, pre)
                .with(TargetRoot::POST_PODF, post);
            let manual = ((enable as u32) << 28) | (mux << 24) | (pre << 16) | post;
            prop_assert_eq!(
                packed.bits(),
                manual,
                "\n{:032b} (actual)\n{:032b} (expected)",
                packed.bits(),
                manual,
            );
        }

        #[test]
        fn fdiv_ctl1_packing(k: u16) {
            let packed = FdivCtl1::new().with(FdivCtl1::DSM, u32::from(k));
            prop_assert_eq!(packed.bits(), u32::from(k));
        }
    }
}
