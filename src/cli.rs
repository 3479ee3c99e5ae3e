use clap::{Parser, Subcommand, ValueEnum};

use crate::graph::ScalePolicy;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List network interfaces and their cumulative counters
    Ifaces {
        /// Include the loopback interface as well
        #[arg(long)]
        all: bool,
        /// Show cumulative byte totals
        #[arg(long)]
        verbose: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = IfacesFormat::Text)]
        format: IfacesFormat,
    },
    /// Watch live throughput in a terminal graph
    Watch(Watch),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IfacesFormat {
    Text,
    Json,
}

#[derive(Parser, Clone, Debug)]
pub struct Watch {
    /// Include loopback traffic in the aggregate
    #[arg(long)]
    pub all: bool,

    /// Vertical scaling policy for the graph
    #[arg(long, value_enum, default_value_t = ScaleOpt::Split)]
    pub scale: ScaleOpt,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ScaleOpt {
    /// One shared ceiling for both directions
    Linear,
    /// Square-root-compressed split between the directions
    Split,
}

impl From<ScaleOpt> for ScalePolicy {
    fn from(v: ScaleOpt) -> Self {
        match v {
            ScaleOpt::Linear => ScalePolicy::Linear,
            ScaleOpt::Split => ScalePolicy::Split,
        }
    }
}
