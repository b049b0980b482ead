// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ql_storage::ConfigDocument;

fn doc_with_app(port: u16) -> ConfigDocument {
    let mut doc = ConfigDocument::initial();
    doc.add_app(
        serde_json::from_value(serde_json::json!({
            "id": "web",
            "name": "Web App",
            "port": port,
            "path": "/tmp/app",
            "command": "npm run dev",
        }))
        .unwrap(),
    )
    .unwrap();
    doc
}

#[test]
fn suggest_skips_registry_owners() {
    let mut doc = doc_with_app(5174);
    doc.reserve_port(5175, "metrics".to_string()).unwrap();

    // 5174 is app-owned, 5175 reserved; 5176 is the first free.
    assert_eq!(suggest(&doc, 5174).unwrap(), 5176);
}

#[test]
fn suggest_returns_base_when_free() {
    let doc = ConfigDocument::initial();
    assert_eq!(suggest(&doc, 5174).unwrap(), 5174);
}

#[test]
fn suggest_does_not_probe_the_os() {
    // Bind a port, then confirm suggest still offers it: occupancy is the
    // system's concern, not the registry's.
    let std_listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
    let port = std_listener.local_addr().unwrap().port();
    let doc = ConfigDocument::initial();
    assert_eq!(suggest(&doc, port).unwrap(), port);
}

#[tokio::test]
async fn bind_probe_detects_occupancy() {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    assert!(is_port_in_use(port).await);
    drop(listener);
    assert!(!is_port_in_use(port).await);
}

#[tokio::test]
async fn check_combines_registry_and_system() {
    let doc = doc_with_app(5174);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    // Registry-free but system-occupied.
    let result = check(&doc, port, None).await;
    assert!(result.registry_available);
    assert!(result.system_in_use);
    assert!(!result.available);
    assert!(result.suggested_port.is_some());
}

#[tokio::test]
async fn check_reports_app_ownership() {
    let doc = doc_with_app(5174);
    let result = check(&doc, 5174, None).await;
    assert!(!result.registry_available);
    assert_eq!(result.registry_reason.as_deref(), Some("app"));
    assert_eq!(result.registry_used_by.as_deref(), Some("Web App"));
    assert!(!result.available);
}

#[tokio::test]
async fn check_reports_reservation() {
    let doc = ConfigDocument::initial();
    let result = check(&doc, 8000, None).await;
    assert!(!result.registry_available);
    assert_eq!(result.registry_reason.as_deref(), Some("reserved"));
}

#[tokio::test]
async fn check_honors_exclusion() {
    let doc = doc_with_app(5174);
    let result = check(&doc, 5174, Some("web")).await;
    assert!(result.registry_available);
    // Availability still depends on the OS; the registry side is clear.
    assert_eq!(result.registry_reason, None);
}
