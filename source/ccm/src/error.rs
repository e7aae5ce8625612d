use crate::{pll::PllKind, PllId, RootId, Tap};
use core::fmt;

/// Errors returned by clock controller operations.
///
/// Argument and rate errors are detected before any register is touched.
/// [`ClockError::LockTimeout`] is only returned after the full configuration
/// sequence has run, including taking the PLL back out of bypass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClockError {
    /// The source index is past the end of the root's source menu.
    InvalidSource { root: RootId, index: u8 },
    /// A root divider is outside of `1..=8` (pre) or `1..=64` (post).
    InvalidDivider {
        root: RootId,
        pre_div: u8,
        post_div: u8,
    },
    /// The operation does not apply to this kind of PLL.
    WrongPllKind { pll: PllId, expected: PllKind },
    /// The PLL has no such output tap.
    InvalidTap { pll: PllId, tap: Tap },
    /// A peripheral instance index is out of range.
    InvalidIndex { peripheral: &'static str, index: u8 },
    /// The requested rate has no entry in the rate table.
    UnsupportedRate { hz: u32 },
    /// The PLL did not assert lock within its budget.
    LockTimeout { pll: PllId, waited_us: u32 },
    /// The PLL is running but has not asserted lock.
    NotLocked { pll: PllId },
    /// The clock tree has already been brought up on this handle.
    AlreadyInitialized,
}

/// The broad category of a [`ClockError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    UnsupportedRate,
    LockTimeout,
    NotLocked,
    AlreadyInitialized,
}

impl ClockError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidSource { .. }
            | Self::InvalidDivider { .. }
            | Self::WrongPllKind { .. }
            | Self::InvalidTap { .. }
            | Self::InvalidIndex { .. } => ErrorKind::InvalidArgument,
            Self::UnsupportedRate { .. } => ErrorKind::UnsupportedRate,
            Self::LockTimeout { .. } => ErrorKind::LockTimeout,
            Self::NotLocked { .. } => ErrorKind::NotLocked,
            Self::AlreadyInitialized => ErrorKind::AlreadyInitialized,
        }
    }
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSource { root, index } => write!(
                f,
                "{} has no source {index} (menu has {} entries)",
                root.name(),
                root.menu().len()
            ),
            Self::InvalidDivider {
                root,
                pre_div,
                post_div,
            } => write!(
                f,
                "{} cannot divide by {pre_div} (pre) and {post_div} (post)",
                root.name()
            ),
            Self::WrongPllKind { pll, expected } => {
                write!(f, "{} is not {expected}", pll.name())
            }
            Self::InvalidTap { pll, tap } => {
                write!(f, "{} has no /{} output", pll.name(), tap.divisor())
            }
            Self::InvalidIndex { peripheral, index } => {
                write!(f, "there is no {peripheral}{index}")
            }
            Self::UnsupportedRate { hz } => write!(f, "no rate table entry for {hz} Hz"),
            Self::LockTimeout { pll, waited_us } => {
                write!(f, "{} did not lock within {waited_us}us", pll.name())
            }
            Self::NotLocked { pll } => write!(f, "{} is not locked", pll.name()),
            Self::AlreadyInitialized => f.write_str("the clock tree has already been initialized"),
        }
    }
}

#[cfg(feature = "use-std")]
impl std::error::Error for ClockError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let err = ClockError::WrongPllKind {
            pll: PllId::Dram,
            expected: PllKind::Integer,
        };
        assert_eq!(err.to_string(), "dram_pll is not an integer PLL");

        let err = ClockError::InvalidSource {
            root: RootId::EnetPhyRef,
            index: 7,
        };
        assert_eq!(
            err.to_string(),
            "enet_phy_ref has no source 7 (menu has 7 entries)"
        );

        let err = ClockError::LockTimeout {
            pll: PllId::Video,
            waited_us: 600,
        };
        assert_eq!(err.to_string(), "video_pll did not lock within 600us");
        assert_eq!(err.kind(), ErrorKind::LockTimeout);
    }

    #[test]
    fn not_locked_is_its_own_kind() {
        let err = ClockError::NotLocked { pll: PllId::Arm };
        assert_eq!(err.kind(), ErrorKind::NotLocked);
        assert_eq!(
            ClockError::InvalidIndex {
                peripheral: "usdhc",
                index: 3
            }
            .kind(),
            ErrorKind::InvalidArgument
        );
    }
}
