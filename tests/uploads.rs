//! Integration tests for the catch-all upload interception.

mod common;

use printdeck::plugins::ExtensionRegistry;

#[tokio::test]
async fn multipart_upload_is_spooled_and_stored() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path(), 28531);
    let uploads_folder = config.folders.uploads.clone();
    let addr = common::spawn_server(config, ExtensionRegistry::empty()).await;

    let form = reqwest::multipart::Form::new()
        .text("select", "true")
        .part(
            "file",
            reqwest::multipart::Part::bytes(b"G28\nG1 X10\n".to_vec())
                .file_name("part.gcode")
                .mime_str("application/octet-stream")
                .unwrap(),
        );

    let response = common::client()
        .post(format!("http://{addr}/api/files/local"))
        .multipart(form)
        .send()
        .await
        .expect("server reachable");
    assert_eq!(response.status(), 201);
    let json: serde_json::Value = response.json().await.unwrap();
    assert_eq!(json["done"], true);
    assert_eq!(json["name"], "part.gcode");

    // The spooled file was stored under its original name.
    let stored = std::fs::read_to_string(uploads_folder.join("part.gcode")).unwrap();
    assert_eq!(stored, "G28\nG1 X10\n");
}

#[tokio::test]
async fn upload_without_a_file_part_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path(), 28532);
    let addr = common::spawn_server(config, ExtensionRegistry::empty()).await;

    let form = reqwest::multipart::Form::new().text("select", "true");
    let response = common::client()
        .post(format!("http://{addr}/api/files/local"))
        .multipart(form)
        .send()
        .await
        .expect("server reachable");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn unknown_upload_target_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path(), 28533);
    let addr = common::spawn_server(config, ExtensionRegistry::empty()).await;

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(b"G28\n".to_vec()).file_name("part.gcode"),
    );
    let response = common::client()
        .post(format!("http://{addr}/api/files/sdcard"))
        .multipart(form)
        .send()
        .await
        .expect("server reachable");
    assert_eq!(response.status(), 404);
}
