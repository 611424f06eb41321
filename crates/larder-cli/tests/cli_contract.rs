use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;
use tempfile::{Builder, TempDir};

const RECIPES_CSV: &str = "\
Item name,Flour (g),Egg(count),Green Onion (g)
Beef Noodle Soup,120,0,10
Scallion Pancake,80,1,15
";

const MAY_EXPORT_CSV: &str = "\
Group,Count
Beef Noodle Soup,120
Scallion Pancake (8),60
Gift Card,3
";

const JUNE_EXPORT_CSV: &str = "\
Item name,Count
beef noodle soup,140
Scallion Pancake,66
";

const SHIPMENTS_CSV: &str = "\
Ingredient,Quantity per shipment,Number of shipments,frequency,Unit of shipment
Flour,50,2,biweekly,lbs
Egg,30,1,weekly,eggs
Green Onion,2,1,every other day,lbs
";

struct Workspace {
    _dir: TempDir,
    root: PathBuf,
    home: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = Builder::new()
            .prefix("larder-cli-")
            .tempdir_in("/tmp")
            .unwrap_or_else(|error| panic!("temp dir: {error}"));
        let root = dir.path().to_path_buf();
        let home = root.join("home");
        fs::create_dir_all(&home).unwrap_or_else(|error| panic!("home dir: {error}"));
        for (name, body) in [
            ("May_Data_Matrix.csv", MAY_EXPORT_CSV),
            ("June_Data_Matrix.csv", JUNE_EXPORT_CSV),
            ("recipes.csv", RECIPES_CSV),
            ("shipments.csv", SHIPMENTS_CSV),
        ] {
            fs::write(root.join(name), body).unwrap_or_else(|error| panic!("{name}: {error}"));
        }
        Self {
            _dir: dir,
            root,
            home,
        }
    }

    fn path(&self, name: &str) -> String {
        self.root.join(name).display().to_string()
    }

    fn run(&self, args: &[&str]) -> (Option<i32>, String) {
        run_in_home(&self.home, args)
    }
}

fn run_in_home(home: &Path, args: &[&str]) -> (Option<i32>, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_larder"))
        .args(args)
        .env("LARDER_HOME", home)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|error| panic!("failed to spawn larder: {error}"));
    (
        output.status.code(),
        String::from_utf8_lossy(&output.stdout).to_string(),
    )
}

fn parse_json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|error| panic!("invalid JSON ({error}): {body}"))
}

#[test]
fn no_arguments_prints_the_short_help() {
    let workspace = Workspace::new();
    let (code, body) = workspace.run(&[]);
    assert_eq!(code, Some(0));
    assert!(body.starts_with("Larder - ingredient demand forecasting"));
    assert!(body.contains("larder forecast --help"));
}

#[test]
fn top_level_help_lists_every_command() {
    let workspace = Workspace::new();
    let (code, body) = workspace.run(&["--help"]);
    assert_eq!(code, Some(0));
    for command in ["larder forecast", "larder usage", "larder supply"] {
        assert!(body.contains(command), "missing {command} in help");
    }
}

#[test]
fn forecast_help_documents_the_input_tables() {
    let workspace = Workspace::new();
    let (code, body) = workspace.run(&["forecast", "--help"]);
    assert_eq!(code, Some(0));
    assert!(body.contains("Input Tables:"));
    assert!(body.contains("--shipments"));
}

#[test]
fn forecast_json_reconciles_and_writes_the_report() {
    let workspace = Workspace::new();
    let report = workspace.path("report.csv");
    let (code, body) = workspace.run(&[
        "forecast",
        "--sales",
        &workspace.path("May_Data_Matrix.csv"),
        &workspace.path("June_Data_Matrix.csv"),
        "--recipes",
        &workspace.path("recipes.csv"),
        "--shipments",
        &workspace.path("shipments.csv"),
        "--output",
        &report,
        "--json",
    ]);
    assert_eq!(code, Some(0), "{body}");

    let value = parse_json(&body);
    assert_eq!(value["ok"], Value::Bool(true));
    assert_eq!(value["command"], Value::String("forecast".to_string()));
    assert_eq!(
        value["data"]["shipment_stage"],
        Value::String("applied".to_string())
    );
    let rows = value["data"]["rows"].as_array().cloned().unwrap_or_default();
    assert_eq!(rows.len(), 15);
    assert!(
        rows.iter()
            .all(|row| row["match_status"] == Value::String("matched".to_string()))
    );

    let csv = fs::read_to_string(&report).unwrap_or_else(|error| panic!("report: {error}"));
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some(
            "month_label,date,ingredient,forecasted_usage_native,shipment_unit,\
             forecasted_usage_in_shipment_unit,monthly_supply_qty,shortfall_or_surplus,\
             action_flag,match_status,supply_suspect"
        )
    );
    assert_eq!(lines.count(), 15);
}

#[test]
fn forecast_text_without_shipments_marks_the_stage_skipped() {
    let workspace = Workspace::new();
    let (code, body) = workspace.run(&[
        "forecast",
        "--sales",
        &workspace.path("May_Data_Matrix.csv"),
        "--sales",
        &workspace.path("June_Data_Matrix.csv"),
        "--recipes",
        &workspace.path("recipes.csv"),
    ]);
    assert_eq!(code, Some(0), "{body}");
    assert!(body.starts_with("Forecast run_"));
    assert!(body.contains("not provided"));
    assert!(body.contains("unclassified"));
}

#[test]
fn usage_and_supply_render_text_tables() {
    let workspace = Workspace::new();
    let (code, body) = workspace.run(&[
        "usage",
        "--sales",
        &workspace.path("May_Data_Matrix.csv"),
        &workspace.path("June_Data_Matrix.csv"),
        "--recipes",
        &workspace.path("recipes.csv"),
    ]);
    assert_eq!(code, Some(0), "{body}");
    assert!(body.starts_with("Ingredient usage: 3 ingredients across 2 months."));
    assert!(body.contains("Items with no recipe: gift card"));

    let (code, body) = workspace.run(&["supply", "--shipments", &workspace.path("shipments.csv")]);
    assert_eq!(code, Some(0), "{body}");
    assert!(body.starts_with("Monthly supply for 3 shipment rows."));
    assert!(body.contains("216.00"));
    assert!(body.contains("every other day"));
}

#[test]
fn home_config_changes_the_horizon() {
    let workspace = Workspace::new();
    fs::write(workspace.home.join("config.toml"), "forecast_horizon = 1\n")
        .unwrap_or_else(|error| panic!("config: {error}"));
    let (code, body) = workspace.run(&[
        "forecast",
        "--sales",
        &workspace.path("May_Data_Matrix.csv"),
        &workspace.path("June_Data_Matrix.csv"),
        "--recipes",
        &workspace.path("recipes.csv"),
        "--json",
    ]);
    assert_eq!(code, Some(0), "{body}");
    let value = parse_json(&body);
    assert_eq!(value["data"]["settings"]["forecast_horizon"], Value::from(1));
    assert_eq!(value["data"]["rows"].as_array().map(Vec::len), Some(9));
}

#[test]
fn missing_input_file_is_a_json_error_with_exit_one() {
    let workspace = Workspace::new();
    let (code, body) = workspace.run(&[
        "forecast",
        "--sales",
        &workspace.path("May_Data_Matrix.csv"),
        "--recipes",
        &workspace.path("missing.csv"),
        "--json",
    ]);
    assert_eq!(code, Some(1));
    let value = parse_json(&body);
    assert_eq!(value["ok"], Value::Bool(false));
    assert_eq!(
        value["error"]["code"],
        Value::String("input_unreadable".to_string())
    );
}

#[test]
fn schema_error_text_lists_found_headers() {
    let workspace = Workspace::new();
    fs::write(workspace.root.join("bad_shipments.csv"), "Item,Qty\nFlour,5\n")
        .unwrap_or_else(|error| panic!("bad shipments: {error}"));
    let (code, body) = workspace.run(&[
        "supply",
        "--shipments",
        &workspace.path("bad_shipments.csv"),
    ]);
    assert_eq!(code, Some(1));
    assert!(body.contains("  Error:    shipment_schema_mismatch"));
    assert!(body.contains("  Found:    item, qty"));
}

#[test]
fn parse_errors_point_at_command_help() {
    let workspace = Workspace::new();
    let (code, body) = workspace.run(&["forecast", "--sales", "May.csv", "--json"]);
    assert_eq!(code, Some(1));
    let value = parse_json(&body);
    assert_eq!(
        value["error"]["code"],
        Value::String("invalid_argument".to_string())
    );
    assert_eq!(
        value["data"]["command_hint"],
        Value::String("forecast".to_string())
    );
    let message = value["error"]["message"].as_str().unwrap_or("");
    assert!(message.contains("--recipes"));
    assert!(!message.contains("For more information"));
}
