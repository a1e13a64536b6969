// SPDX-FileCopyrightText: 2026 Ledgerdesk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end runs of the `ledgerdesk` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ledgerdesk_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ledgerdesk"))
}

fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let file = dir.join("ledgerdesk.toml");
    std::fs::write(&file, contents).expect("write config");
    file
}

/// Runs the binary with a scrubbed environment so host overrides do not leak in.
fn run(args: &[&str]) -> Output {
    Command::new(ledgerdesk_bin())
        .args(args)
        .env_clear()
        .env("RUST_LOG", "error")
        .output()
        .expect("run ledgerdesk")
}

#[test]
fn config_prints_effective_values() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_config(
        dir.path(),
        "[agent]\nendpoint = \"ws://agent.internal:9000/ws/admin\"\n",
    );

    let out = run(&["config", "--config", file.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("ws://agent.internal:9000/ws/admin"));
    assert!(stdout.contains("/overdue-recurring-invoices"));
}

#[test]
fn invalid_config_exits_with_status_two() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_config(dir.path(), "[backend]\nbase_ulr = \"http://x\"\n");

    let out = run(&["config", "--config", file.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(2));
}

#[tokio::test(flavor = "multi_thread")]
async fn dashboard_json_reports_backend_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dashboard-metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "today_revenue": 420.5,
            "invoice_stats": {
                "pending": {"count": 3, "amount": 300.0},
                "success": {"count": 1, "amount": 120.5}
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/overdue-recurring-invoices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "invoices": [{"invoice_id": "INV-9", "overdue_days": 12}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/closed-opportunities"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = write_config(
        dir.path(),
        &format!("[backend]\nbase_url = \"{}\"\n", server.uri()),
    );
    let file = file.to_str().unwrap().to_string();

    let out = tokio::task::spawn_blocking(move || run(&["dashboard", "--json", "--config", &file]))
        .await
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let report: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["dashboard"]["today_revenue"], 420.5);
    assert_eq!(report["derived"]["breakdown"]["total"], 4);
    assert_eq!(report["overdue_invoices"][0]["invoice_id"], "INV-9");
    assert!(
        report["errors"]["closed_opportunities"]
            .as_str()
            .unwrap()
            .contains("503")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn dashboard_fails_when_backend_is_down() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = write_config(
        dir.path(),
        &format!("[backend]\nbase_url = \"{}\"\n", server.uri()),
    );
    let file = file.to_str().unwrap().to_string();

    let out = tokio::task::spawn_blocking(move || run(&["dashboard", "--config", &file]))
        .await
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
}
