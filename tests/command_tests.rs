use defi_metrics_studio::aggregator::BreakdownAxis;
use defi_metrics_studio::commands::{
    execute_flatten, execute_join, execute_merge, execute_rollup, ChainInput, FlattenArgs, JoinArgs,
    MergeArgs, RollupArgs,
};
use defi_metrics_studio::output::read_document;
use defi_metrics_studio::utils::config::SCHEMA_VERSION;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_json(dir: &Path, name: &str, value: serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();
    path
}

#[test]
fn test_join_command_writes_rows_and_legend() {
    let dir = TempDir::new().unwrap();
    let input = write_json(
        dir.path(),
        "series.json",
        json!({ "Fees": [[2, 1.0], [1, 3.0]], "Revenue": [[1, 0.5]], "Missing": null }),
    );
    let output = dir.path().join("out/joined.json");

    execute_join(JoinArgs {
        input,
        output: output.clone(),
        sort: true,
    })
    .unwrap();

    let document = read_document(&output).unwrap();
    assert_eq!(document.version, SCHEMA_VERSION);
    assert_eq!(document.kind, "join");
    assert_eq!(document.legend, Some(vec!["Fees".to_string(), "Revenue".to_string()]));
    assert_eq!(document.data, json!([
        { "date": "1", "Fees": 3.0, "Revenue": 0.5 },
        { "date": "2", "Fees": 1.0 }
    ]));
}

#[test]
fn test_flatten_command_reads_overview_breakdown() {
    let dir = TempDir::new().unwrap();
    let input = write_json(
        dir.path(),
        "overview.json",
        json!({
            "total24h": 10,
            "totalDataChartBreakdown": [
                [100, { "avax": { "v1": 1 }, "bsc": { "v1": 2, "v2": 3 } }]
            ]
        }),
    );
    let output = dir.path().join("flat.json");

    execute_flatten(FlattenArgs {
        input,
        output: output.clone(),
        axis: BreakdownAxis::Chain,
    })
    .unwrap();

    let document = read_document(&output).unwrap();
    assert_eq!(document.legend, Some(vec!["Avalanche".to_string(), "BSC".to_string()]));
    assert_eq!(document.data, json!([
        { "date": "100", "Avalanche": 1.0 },
        { "date": "100", "BSC": 5.0 }
    ]));
}

#[test]
fn test_rollup_command_groups_children() {
    let dir = TempDir::new().unwrap();
    let input = write_json(
        dir.path(),
        "protocols.json",
        json!({
            "protocols": [
                { "name": "Dex V1", "parentProtocol": "parent#dex", "total24h": 100, "total48hto24h": 80 },
                { "name": "Dex V2", "parentProtocol": "parent#dex", "total24h": 50, "total48hto24h": 60 },
                { "name": "Solo", "total24h": 50 }
            ]
        }),
    );
    let directory = write_json(
        dir.path(),
        "parents.json",
        json!([{ "id": "parent#dex", "name": "Dex", "mcap": 1000 }]),
    );
    let output = dir.path().join("rollup.json");

    execute_rollup(RollupArgs {
        input,
        directory,
        output: output.clone(),
        zero_as_missing: false,
    })
    .unwrap();

    let document = read_document(&output).unwrap();
    assert_eq!(document.record_count(), 2);
    let dex = &document.data[0];
    assert_eq!(dex["name"], "Dex");
    assert_eq!(dex["total24h"], 150.0);
    assert_eq!(dex["dominance"], 75.0);
    assert_eq!(dex["subRows"].as_array().map(Vec::len), Some(2));
    assert!((dex["change_1d"].as_f64().unwrap() - 7.142857).abs() < 1e-5);
    assert_eq!(document.data[1]["name"], "Solo");
}

#[test]
fn test_merge_command_tolerates_missing_chain_file() {
    let dir = TempDir::new().unwrap();
    let eth = write_json(
        dir.path(),
        "ethereum.json",
        json!([{ "name": "Dex", "total24h": 100, "change_1d": 10 }]),
    );
    let output = dir.path().join("merged.json");

    execute_merge(MergeArgs {
        inputs: vec![
            ChainInput::parse(eth.to_str().unwrap()),
            ChainInput {
                chain: "solana".to_string(),
                path: dir.path().join("solana.json"),
            },
        ],
        chains: vec!["ethereum".to_string(), "solana".to_string()],
        output: output.clone(),
        ratios: false,
        tvl: false,
    })
    .unwrap();

    let document = read_document(&output).unwrap();
    assert_eq!(document.kind, "merge");
    let dex = &document.data[0];
    assert_eq!(dex["total24h"], 100.0);
    assert_eq!(dex["change_1d"], 10.0);
    assert_eq!(dex["chains"], json!(["ethereum"]));
    assert_eq!(dex["chainBreakdown"]["ethereum"]["chain"], "ethereum");
}
