use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const SAMPLE_TABLE: &str = "energy,intensity\n\
    0,1.0\n1,3.0\n2,2.0\n3,5.0\n4,4.0\n5,6.0\n6,5.0\n7,7.0\n8,6.0\n9,8.0\n10,7.0\n";

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_specfit-rs"))
        .args(args)
        .output()
        .expect("binary should run")
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent directory should be creatable");
    }
    fs::write(path, content).expect("fixture file should be writable");
}

fn settings_document(outfile: Option<&Path>) -> String {
    let outfile_entry = outfile
        .map(|path| format!(r#", "outfile": "{}""#, path.display()))
        .unwrap_or_default();
    format!(
        r#"{{"columns": ["energy", "intensity"], "energy_start": 2.0, "energy_stop": 8.0{outfile_entry}}}"#
    )
}

fn outcome_document() -> String {
    r#"
    {
      "residual": [0.5, -0.5, 0.25, 0.0, -0.25, 0.5, 0.0],
      "parameters": [
        {
          "name": "constant_amplitude_1",
          "value": 5.0,
          "init_value": 4.0,
          "stderr": 0.2,
          "correlations": {"linear_slope_2": 0.6}
        },
        {
          "name": "linear_slope_2",
          "value": 0.4,
          "init_value": 0.5,
          "stderr": 0.05,
          "correlations": {"constant_amplitude_1": 0.6}
        },
        {
          "name": "linear_intercept_2",
          "value": 0.0,
          "stderr": 0.1
        }
      ],
      "statistics": {
        "method": "leastsq",
        "function_evals": 30,
        "data_points": 7,
        "variable_count": 3,
        "degrees_of_freedom": 4,
        "chi_square": 0.875,
        "reduced_chi_square": 0.21875,
        "akaike_criterion": -8.0,
        "bayesian_criterion": -8.2,
        "errorbars_estimated": true
      }
    }
    "#
    .to_string()
}

fn preprocessed_fixture(temp: &TempDir) -> (PathBuf, PathBuf) {
    let input_path = temp.path().join("spectrum.csv");
    let settings_path = temp.path().join("settings.json");
    let output_path = temp.path().join("preprocessed.csv");
    write_file(&input_path, SAMPLE_TABLE);
    write_file(&settings_path, &settings_document(None));

    let output = run_cli(&[
        "preprocess",
        "--input",
        input_path.to_str().expect("path should be utf-8"),
        "--settings",
        settings_path.to_str().expect("path should be utf-8"),
        "--output",
        output_path.to_str().expect("path should be utf-8"),
    ]);
    assert!(
        output.status.success(),
        "preprocess should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    (output_path, settings_path)
}

#[test]
fn preprocess_command_applies_the_inclusive_range() {
    let temp = TempDir::new().expect("tempdir should be created");
    let (output_path, _) = preprocessed_fixture(&temp);

    let written = fs::read_to_string(&output_path).expect("output table should be readable");
    let rows: Vec<&str> = written.lines().collect();
    assert_eq!(rows[0], "energy,intensity");
    // 7 of the 11 samples fall inside [2, 8].
    assert_eq!(rows.len(), 8);
    assert!(rows[1].starts_with("2,"));
    assert!(rows[7].starts_with("8,"));
}

#[test]
fn preprocess_command_prints_the_data_statistics() {
    let temp = TempDir::new().expect("tempdir should be created");
    let input_path = temp.path().join("spectrum.csv");
    let settings_path = temp.path().join("settings.json");
    let output_path = temp.path().join("preprocessed.csv");
    write_file(&input_path, SAMPLE_TABLE);
    write_file(&settings_path, &settings_document(None));

    let output = run_cli(&[
        "preprocess",
        "--input",
        input_path.to_str().expect("path should be utf-8"),
        "--settings",
        settings_path.to_str().expect("path should be utf-8"),
        "--output",
        output_path.to_str().expect("path should be utf-8"),
    ]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_end = stdout.rfind(']').expect("statistics JSON should be printed");
    let statistics: Value =
        serde_json::from_str(&stdout[..=json_end]).expect("statistics should parse");
    // Statistics describe the unfiltered 11-row table.
    assert_eq!(statistics[0]["count"], Value::from(11));
    assert_eq!(statistics[0]["column"], Value::from("energy"));
}

#[test]
fn non_numeric_table_is_rejected_with_a_named_diagnostic() {
    let temp = TempDir::new().expect("tempdir should be created");
    let input_path = temp.path().join("broken.csv");
    let settings_path = temp.path().join("settings.json");
    write_file(&input_path, "energy,intensity\n0,abc\n");
    write_file(&settings_path, &settings_document(None));

    let output = run_cli(&[
        "preprocess",
        "--input",
        input_path.to_str().expect("path should be utf-8"),
        "--settings",
        settings_path.to_str().expect("path should be utf-8"),
        "--output",
        temp.path()
            .join("out.csv")
            .to_str()
            .expect("path should be utf-8"),
    ]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: [INPUT.TABLE_NUMERIC]"));
    assert!(stderr.contains("abc"));
}

#[test]
fn postprocess_command_writes_all_four_artifacts() {
    let temp = TempDir::new().expect("tempdir should be created");
    let (preprocessed_path, _) = preprocessed_fixture(&temp);

    let outfile = temp.path().join("artifacts/run");
    let settings_path = temp.path().join("post_settings.json");
    let result_path = temp.path().join("outcome.json");
    write_file(&settings_path, &settings_document(Some(&outfile)));
    write_file(&result_path, &outcome_document());

    let output = run_cli(&[
        "postprocess",
        "--input",
        preprocessed_path.to_str().expect("path should be utf-8"),
        "--result",
        result_path.to_str().expect("path should be utf-8"),
        "--settings",
        settings_path.to_str().expect("path should be utf-8"),
    ]);
    assert!(
        output.status.success(),
        "postprocess should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    for suffix in ["_summary.json", "_fit.csv", "_correlation.csv", "_errors.csv"] {
        let path = temp.path().join(format!("artifacts/run{suffix}"));
        assert!(path.exists(), "artifact '{}' should exist", path.display());
    }

    let summary_text = fs::read_to_string(temp.path().join("artifacts/run_summary.json"))
        .expect("summary should be readable");
    let summary: Value = serde_json::from_str(&summary_text).expect("summary should parse");
    assert!(summary["fit_insights"]["variables"]["constant_amplitude_1"].is_object());
    assert_eq!(
        summary["fit_insights"]["correlations"]["constant_amplitude_1, linear_slope_2"],
        Value::from(0.6)
    );
    // A zero-valued parameter serializes its infinite relative error as null.
    assert!(
        summary["fit_insights"]["variables"]["linear_intercept_2"]["error_absolute"].is_null()
    );

    let fit_text = fs::read_to_string(temp.path().join("artifacts/run_fit.csv"))
        .expect("fit table should be readable");
    let header = fit_text.lines().next().expect("header should exist");
    assert!(header.starts_with("energy,intensity,residual,fit,"));
}

#[test]
fn postprocess_without_outfile_exits_non_zero_before_writing() {
    let temp = TempDir::new().expect("tempdir should be created");
    let (preprocessed_path, settings_path) = preprocessed_fixture(&temp);

    let result_path = temp.path().join("outcome.json");
    write_file(&result_path, &outcome_document());

    let output = run_cli(&[
        "postprocess",
        "--input",
        preprocessed_path.to_str().expect("path should be utf-8"),
        "--result",
        result_path.to_str().expect("path should be utf-8"),
        "--settings",
        settings_path.to_str().expect("path should be utf-8"),
    ]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: [IO.OUTFILE_MISSING]"));

    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .expect("tempdir should be readable")
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .ends_with("_summary.json")
        })
        .collect();
    assert!(leftovers.is_empty(), "no summary artifact should be written");
}

#[test]
fn report_command_prints_the_report_dictionary() {
    let temp = TempDir::new().expect("tempdir should be created");
    let result_path = temp.path().join("outcome.json");
    write_file(&result_path, &outcome_document());

    let output = run_cli(&[
        "report",
        "--result",
        result_path.to_str().expect("path should be utf-8"),
    ]);
    assert!(
        output.status.success(),
        "report should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: Value = serde_json::from_slice(&output.stdout).expect("report should parse");
    assert_eq!(report["configurations"]["fitting_method"], Value::from("leastsq"));
    assert_eq!(report["statistics"]["chi_square"], Value::from(0.875));
    assert!(report["variables"]["linear_slope_2"].is_object());
    // The pair appears once, ordered by first occurrence.
    assert!(
        report["correlations"]
            .get("constant_amplitude_1, linear_slope_2")
            .is_some()
    );
    assert!(
        report["correlations"]
            .get("linear_slope_2, constant_amplitude_1")
            .is_none()
    );
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let output = run_cli(&["frobnicate"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: [INPUT.CLI_USAGE]"));
}
