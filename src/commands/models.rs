use crate::aggregator::BreakdownAxis;
use std::path::PathBuf;

/// Arguments for the join command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct JoinArgs {
    /// Series file: `{ label: [[ts, value], ...] }` or `[{ label, series }]`
    pub input: PathBuf,

    /// Output path for joined rows
    pub output: PathBuf,

    /// Sort rows by timestamp instead of first-seen order
    pub sort: bool,
}

impl Default for JoinArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::from("joined.json"),
            sort: false,
        }
    }
}

/// Arguments for the flatten command
#[derive(Debug, Clone)]
pub struct FlattenArgs {
    /// Breakdown file, or an overview payload carrying `totalDataChartBreakdown`
    pub input: PathBuf,

    /// Output path for flattened rows
    pub output: PathBuf,

    /// Grouping axis
    pub axis: BreakdownAxis,
}

impl Default for FlattenArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::from("flattened.json"),
            axis: BreakdownAxis::Version,
        }
    }
}

/// Arguments for the rollup command
#[derive(Debug, Clone)]
pub struct RollupArgs {
    /// Entity list, or an overview payload carrying `protocols`
    pub input: PathBuf,

    /// Parent-protocol directory
    pub directory: PathBuf,

    /// Output path for rolled-up rows
    pub output: PathBuf,

    /// Skip zero-valued children when summing
    pub zero_as_missing: bool,
}

impl Default for RollupArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            directory: PathBuf::new(),
            output: PathBuf::from("rollup.json"),
            zero_as_missing: false,
        }
    }
}

/// One per-chain input, `chain=path` or a bare path named after its file stem
#[derive(Debug, Clone, PartialEq)]
pub struct ChainInput {
    pub chain: String,
    pub path: PathBuf,
}

impl ChainInput {
    pub fn parse(arg: &str) -> Self {
        match arg.split_once('=') {
            Some((chain, path)) if !chain.trim().is_empty() => Self {
                chain: chain.to_string(),
                path: PathBuf::from(path),
            },
            _ => {
                let path = PathBuf::from(arg);
                let chain = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Self { chain, path }
            }
        }
    }
}

/// Arguments for the merge command
#[derive(Debug, Clone)]
pub struct MergeArgs {
    /// Per-chain payload files
    pub inputs: Vec<ChainInput>,

    /// Chains to merge; empty or "All" returns the first payload unchanged
    pub chains: Vec<String>,

    /// Output path for merged entities
    pub output: PathBuf,

    /// Derive pf/ps on merged records
    pub ratios: bool,

    /// Merge protocol TVL lists instead of metric summaries
    pub tvl: bool,
}

impl Default for MergeArgs {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            chains: Vec::new(),
            output: PathBuf::from("merged.json"),
            ratios: false,
            tvl: false,
        }
    }
}
