use ccm::{sim::SimBank, BoardConfig, Ccm, PllId, SocVariant};
use clap::{Parser, ValueEnum};
use miette::{Context, IntoDiagnostic};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

/// Bring up the i.MX 8M clock tree on a simulated register bank and print
/// the resulting clock frequencies.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// a TOML board configuration file.
    ///
    /// if this is not present, the default i.MX 8M Mini configuration is
    /// used.
    #[arg(short, long)]
    board: Option<PathBuf>,

    /// which SoC to bring up, overriding the board file.
    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// a PLL that never locks. may be given more than once.
    #[arg(long, value_enum)]
    stuck: Vec<Pll>,

    /// a comma-separated list of `tracing` targets and levels to enable.
    ///
    /// for example, `info,ccm=debug,ccm::pll=trace` will enable the `INFO`
    /// level globally, the `DEBUG` level for the clock controller, and the
    /// `TRACE` level for its PLL code.
    ///
    /// see <https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/targets/struct.Targets.html#filtering-with-targets>
    /// for more details on this syntax.
    #[arg(
        short,
        long = "trace",
        env = "CLKDUMP_TRACE",
        default_value_t = tracing_subscriber::filter::Targets::new().with_default(LevelFilter::WARN),
    )]
    trace_filter: tracing_subscriber::filter::Targets,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Variant {
    Imx8mm,
    Imx8mn,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Pll {
    Arm,
    Gpu,
    Vpu,
    Sys1,
    Sys2,
    Sys3,
    Dram,
    Audio1,
    Audio2,
    Video,
}

impl From<Variant> for SocVariant {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Imx8mm => SocVariant::Imx8mm,
            Variant::Imx8mn => SocVariant::Imx8mn,
        }
    }
}

impl From<Pll> for PllId {
    fn from(pll: Pll) -> Self {
        match pll {
            Pll::Arm => PllId::Arm,
            Pll::Gpu => PllId::Gpu,
            Pll::Vpu => PllId::Vpu,
            Pll::Sys1 => PllId::Sys1,
            Pll::Sys2 => PllId::Sys2,
            Pll::Sys3 => PllId::Sys3,
            Pll::Dram => PllId::Dram,
            Pll::Audio1 => PllId::Audio1,
            Pll::Audio2 => PllId::Audio2,
            Pll::Video => PllId::Video,
        }
    }
}

fn main() -> miette::Result<()> {
    use tracing_subscriber::prelude::*;

    let Args {
        board,
        variant,
        stuck,
        trace_filter,
    } = Args::parse();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().without_time())
        .with(trace_filter)
        .init();

    let mut config = match board {
        Some(path) => load_board(&path)?,
        None => BoardConfig::default(),
    };
    if let Some(variant) = variant {
        config.variant = variant.into();
    }

    let out = run(&config, &stuck)?;
    print!("{out}");
    Ok(())
}

fn load_board(path: &Path) -> miette::Result<BoardConfig> {
    let text = std::fs::read_to_string(path)
        .into_diagnostic()
        .with_context(|| format!("failed to read board file {}", path.display()))?;
    parse_board(&text).with_context(|| format!("invalid board file {}", path.display()))
}

fn parse_board(text: &str) -> miette::Result<BoardConfig> {
    toml::from_str(text).into_diagnostic()
}

fn run(config: &BoardConfig, stuck: &[Pll]) -> miette::Result<String> {
    use std::fmt::Write;

    let bank = stuck
        .iter()
        .fold(SimBank::power_on(), |bank, &pll| bank.never_lock(pll.into()));
    let mut ccm = Ccm::new(bank);
    let report = ccm
        .init_clock_tree(config)
        .into_diagnostic()
        .context("failed to initialize the clock tree")?;

    let mut out = String::new();
    for failure in report.failures() {
        writeln!(out, "! {failure}").into_diagnostic()?;
    }
    ccm.dump(&mut out).into_diagnostic()?;
    tracing::debug!(
        elapsed_us = ccm.borrow_raw().elapsed_us(),
        writes = ccm.borrow_raw().writes().len(),
        "done"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccm::IntPllRate;

    #[test]
    fn board_files_parse() {
        let mini = parse_board(include_str!("../boards/nitrogen8mm.toml")).unwrap();
        assert_eq!(mini.variant, SocVariant::Imx8mm);
        assert_eq!(mini.arm_pll, IntPllRate::Mhz1200);

        let nano = parse_board(include_str!("../boards/nitrogen8mn.toml")).unwrap();
        assert_eq!(nano.variant, SocVariant::Imx8mn);
    }

    #[test]
    fn bad_board_is_an_error() {
        assert!(parse_board("variant = \"imx8mq\"").is_err());
    }

    #[test]
    fn clean_run() {
        let out = run(&BoardConfig::default(), &[]).unwrap();
        assert!(!out.contains('!'));
        assert!(out.contains("ARM_PLL: 1200 MHz"));
        assert!(out.contains("SYS_PLL3:  750 MHz"));
        assert!(out.contains("VIDEO_PLL:  594 MHz"));
        assert!(out.contains("UART1:   24 MHz"));
    }

    #[test]
    fn stuck_pll_is_reported() {
        let out = run(&BoardConfig::default(), &[Pll::Sys3]).unwrap();
        let first = out.lines().next().unwrap();
        assert!(first.starts_with("! sys pll3 failed"), "{first}");
        assert!(out.contains("SYS_PLL3:    0 MHz"));
    }

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from([
            "clkdump",
            "--variant",
            "imx8mn",
            "--stuck",
            "video",
            "--stuck",
            "arm",
        ])
        .unwrap();
        assert_eq!(args.variant, Some(Variant::Imx8mn));
        assert_eq!(args.stuck, [Pll::Video, Pll::Arm]);
        assert!(args.board.is_none());
    }
}
