//! Board-level settings for bringing up the clock tree.
use crate::IntPllRate;
use serde::{Deserialize, Serialize};

/// Which member of the i.MX 8M family the board carries.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocVariant {
    /// i.MX 8M Mini.
    #[default]
    Imx8mm,
    /// i.MX 8M Nano.
    Imx8mn,
}

impl SocVariant {
    /// The rate `sys_pll3` is brought up at.
    #[must_use]
    pub const fn sys_pll3_rate(self) -> IntPllRate {
        match self {
            Self::Imx8mm => IntPllRate::Mhz750,
            Self::Imx8mn => IntPllRate::Mhz600,
        }
    }
}

/// Settings for [`Ccm::init_clock_tree`](crate::Ccm::init_clock_tree).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardConfig {
    #[serde(default)]
    pub variant: SocVariant,
    /// Rate for the Cortex-A53 PLL.
    ///
    /// Defaults to 1.2 GHz.
    #[serde(default = "BoardConfig::default_arm_pll")]
    pub arm_pll: IntPllRate,
    /// Whether to bring up the display pipeline clocks.
    ///
    /// Defaults to `true`.
    #[serde(default = "BoardConfig::default_display")]
    pub display: bool,
}

impl BoardConfig {
    #[must_use]
    pub const fn new(variant: SocVariant) -> Self {
        Self {
            variant,
            arm_pll: Self::default_arm_pll(),
            display: Self::default_display(),
        }
    }

    const fn default_arm_pll() -> IntPllRate {
        IntPllRate::Mhz1200
    }

    const fn default_display() -> bool {
        true
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::new(SocVariant::Imx8mm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_is_default() {
        let config: BoardConfig = toml::from_str("").unwrap();
        assert_eq!(config, BoardConfig::default());
        assert_eq!(config.arm_pll, IntPllRate::Mhz1200);
        assert!(config.display);
    }

    #[test]
    fn nano_board() {
        let config: BoardConfig = toml::from_str(
            r#"
            variant = "imx8mn"
            arm_pll = "mhz1000"
            display = false
            "#,
        )
        .unwrap();
        assert_eq!(config.variant, SocVariant::Imx8mn);
        assert_eq!(config.variant.sys_pll3_rate(), IntPllRate::Mhz600);
        assert_eq!(config.arm_pll, IntPllRate::Mhz1000);
        assert!(!config.display);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res = toml::from_str::<BoardConfig>("uart_baud = 115200");
        assert!(res.is_err());
    }
}
