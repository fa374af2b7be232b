use serde_json::Value;
use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

/// Helper function to run barline with CLI args and CSV input
fn run_barline(args: &[&str], csv_content: &str) -> Result<Value, String> {
    let mut child = Command::new(env!("CARGO_BIN_EXE_barline"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    // Write CSV to stdin
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(csv_content.as_bytes())
            .map_err(|e| format!("Failed to write to stdin: {}", e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        serde_json::from_slice(&output.stdout).map_err(|e| format!("Output is not JSON: {}", e))
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

fn write_temp(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes()).expect("Failed to write temp file");
    file
}

fn fixture() -> String {
    fs::read_to_string("test/deliveries.csv").expect("Failed to read test CSV")
}

fn names(items: &Value) -> Vec<String> {
    items
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_end_to_end_default_spec() {
    let result = run_barline(&[], &fixture());
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let spec = result.unwrap();

    assert_eq!(spec["autosize"], "fit");
    assert_eq!(spec["data"][0]["name"], "dataProcessed");
    assert_eq!(spec["data"][0]["values"].as_array().unwrap().len(), 6);
    assert_eq!(
        names(&spec["marks"]),
        vec!["markGroupBar", "markLine", "markGroupPoint", "barHorRule"]
    );
    assert_eq!(
        names(&spec["signals"]),
        vec![
            "signal_currentHoverRect",
            "signal_currentHoverSymbol",
            "interpolateTypeSignal",
            "signalVar_fontSize",
            "barClick",
            "lineClick",
            "legendClick"
        ]
    );
    assert_eq!(spec["legends"][0]["title"], "Legend");
}

#[test]
fn test_rows_sorted_and_missing_amount_omitted() {
    let spec = run_barline(&[], &fixture()).unwrap();
    let values = spec["data"][0]["values"].as_array().unwrap();
    assert_eq!(values[0]["period"], "2023-11-20");
    assert_eq!(values[0]["type"], "Bikes");
    assert_eq!(values[1]["type"], "Vans");
    assert_eq!(values[5]["period"], "2023-11-22");
    // the empty amount cell belongs to Bikes on the 22nd
    assert!(values[4].get("amount").is_none());
    assert_eq!(values[4]["typeLabel"], "Bicycles");
}

#[test]
fn test_dimensions_from_container_file() {
    let container = write_temp(r#"{"width": "auto", "height": 380, "minWidth": 400, "maxWidth": 2000}"#);
    let spec = run_barline(
        &["--container", container.path().to_str().unwrap(), "--measured-width", "300"],
        &fixture(),
    )
    .unwrap();
    assert_eq!(spec["width"], 400.0);
    assert_eq!(spec["height"], 380.0);
    // 3 periods across 400px: 133px per label, no tilt, font capped at 15
    assert_eq!(spec["axes"][2]["labelAngle"], 0.0);
    assert_eq!(spec["axes"][2]["labelFontSize"], 15.0);
}

#[test]
fn test_config_file_and_flags() {
    let config = write_temp(
        r#"{
            "title": "From config",
            "truncate": false,
            "interpolation": "step",
            "graphSort": [null, "descending", null],
            "lang": { "legend": "Fleet", "yAxisName": "Parcels" },
            "dataScaleMap": { "legendLabel": "typeLabel", "typeColor": "colorOverride" },
            "tooltipLabel": { "amount": "Parcels", "period": null }
        }"#,
    );
    let spec = run_barline(
        &[
            "--config",
            config.path().to_str().unwrap(),
            "--title",
            "From flag",
            "--fast-render",
            "--pretty",
        ],
        &fixture(),
    )
    .unwrap();

    assert_eq!(spec["title"]["text"], "From flag");
    assert_eq!(spec["signals"][2]["value"], "step");
    assert_eq!(spec["axes"][0]["title"], "Parcels");
    assert_eq!(spec["axes"][2]["labelOverlap"], "parity");
    assert_eq!(spec["axes"][2]["labelAngle"], -35.0);
    assert_eq!(spec["legends"][0]["title"], "Fleet");
    assert_eq!(spec["legends"][1]["title"], "Fleet");

    let values = spec["data"][0]["values"].as_array().unwrap();
    assert_eq!(values[0]["type"], "Vans");
    assert_eq!(values[0]["colorOverride"], "#282828");
    assert_eq!(values[1]["colorOverride"], "#222222");

    let tooltip = spec["marks"][0]["marks"][1]["encode"]["enter"]["tooltip"]["signal"]
        .as_str()
        .unwrap();
    assert!(tooltip.starts_with(r#"{ "Type": scale("scale_legendForBar", datum["type"])"#));
    assert!(tooltip.contains(r#""Parcels": format(datum["amount"], ",")"#));
    assert!(tooltip.contains(r#""On": timeFormat(datum["period"], "%b %d, %Y")"#));
}

#[test]
fn test_empty_csv_produces_valid_spec() {
    let spec = run_barline(&[], "period,amount,secondaryAmount,type,secondaryType\n").unwrap();
    assert_eq!(spec["data"][0]["values"], serde_json::json!([]));
    assert_eq!(spec["marks"].as_array().unwrap().len(), 4);
}

#[test]
fn test_error_non_numeric_amount() {
    let result = run_barline(&[], "period,amount,type\n2023-11-20,lots,Bikes\n");
    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(err.contains("'lots'"), "unexpected error: {}", err);
}

#[test]
fn test_error_missing_required_column() {
    let result = run_barline(&[], "period,amount\n2023-11-20,1\n");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Column 'type' not found"));
}

#[test]
fn test_error_malformed_config() {
    let config = write_temp(r#"{"interpolation": "wiggly"}"#);
    let result = run_barline(&["--config", config.path().to_str().unwrap()], &fixture());
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Invalid graph configuration"));
}

#[test]
fn test_log_file_receives_debug_events() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let log_path = dir.path().join("barline.log");
    let result = run_barline(&["--log", log_path.to_str().unwrap()], &fixture());
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let log = fs::read_to_string(&log_path).expect("Log file missing");
    assert!(log.contains("synthesized specification"));
}
