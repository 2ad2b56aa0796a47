use std::ffi::OsString;

use crate::GatewayParams;

fn args(list: &[&str]) -> impl Iterator<Item = OsString> {
    std::iter::once(OsString::from("chaingate"))
        .chain(list.iter().map(OsString::from).collect::<Vec<_>>())
}

#[test]
fn defaults_without_file_or_flags() {
    let params = GatewayParams::try_new(args(&[])).unwrap();
    assert_eq!(params, GatewayParams::default());
    assert_eq!(params.wait.proof_window, 1);
}

#[test]
fn cli_overrides_defaults() {
    let params = GatewayParams::try_new(args(&[
        "--feed-url",
        "ws://10.0.0.1:26657/websocket",
        "--proof-window",
        "3",
    ]))
    .unwrap();
    assert_eq!(params.feed.url.as_str(), "ws://10.0.0.1:26657/websocket");
    assert_eq!(params.wait.proof_window, 3);
    assert_eq!(params.node, GatewayParams::default().node);
}

#[test]
fn toml_sections_deserialize_with_partial_fields() {
    let params: GatewayParams = toml::from_str(
        r#"
        [feed]
        url = "ws://node.internal:26657/websocket"

        [wait]
        proof-window = 2
        "#,
    )
    .unwrap();
    assert_eq!(params.feed.url.as_str(), "ws://node.internal:26657/websocket");
    assert_eq!(params.wait.proof_window, 2);
    assert_eq!(params.wait.default_timeout_secs, 80);
}

#[test]
fn unknown_fields_are_rejected() {
    let result = toml::from_str::<GatewayParams>(
        r#"
        [feed]
        uri = "ws://127.0.0.1:26657/websocket"
        "#,
    );
    assert!(result.is_err());
}
