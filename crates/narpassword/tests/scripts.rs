use anyhow::Result;
use narpassword::invoke::{parse_script, Invocation, Session};
use narpassword::private_test_utils::{hex_buffer, init_tracing};
use serde_json::{json, Value};

fn run(session: &mut Session, script: &[Invocation]) -> Vec<std::result::Result<Value, String>> {
    script
        .iter()
        .map(|invocation| session.apply(invocation).map_err(|err| err.to_string()))
        .collect()
}

#[test]
fn script_from_json() -> Result<()> {
    let _guard = init_tracing();
    let script = parse_script(
        r#"[
            {"op": "setBytes", "args": [0, 2, [65, 219, 202]]},
            {"op": "setByte", "args": [16, 13]},
            {"op": "rotateLeftByCounter"},
            {"op": "getBytes", "args": [0, 1]},
            {"op": "getBytes", "args": [14, 16]},
            {"op": "copy", "args": ["working"], "buffer": "password"},
            {"op": "rotateRightByCounter", "buffer": "password"},
            {"op": "getBytes", "args": [0, 2], "buffer": "password"},
            {"op": "getBytes", "args": [0, 2]}
        ]"#,
    )?;
    let mut session = Session::new();
    let results = run(&mut session, &script);
    assert_eq!(
        results,
        vec![
            Ok(Value::Null),
            Ok(Value::Null),
            Ok(Value::Null),
            Ok(json!([0x79, 0x40])),
            Ok(json!([0x08, 0x3b, 13])),
            Ok(Value::Null),
            Ok(Value::Null),
            Ok(json!([0x41, 0xdb, 0xca])),
            Ok(json!([0x79, 0x40, 0])),
        ]
    );
    Ok(())
}

#[test]
fn failing_invocations_do_not_mutate() -> Result<()> {
    let _guard = init_tracing();
    let mut session = Session::with_buffer("working", hex_buffer("0a0b0c0d")?);
    let script = vec![
        Invocation::new("setBytes", vec![json!(0), json!(3), json!([1, 2, 3, "x"])]),
        Invocation::new("setBits", vec![json!([0, 1, 40]), json!([true, true, true])]),
        Invocation::new("rotateLeft", vec![]),
        Invocation::new("fixChecksum", vec![]),
        Invocation::new("bytes", vec![]),
    ];
    let results = run(&mut session, &script);
    assert!(results[0].as_ref().unwrap_err().contains("must be numbers"));
    assert!(results[1].as_ref().unwrap_err().contains("out-of-bounds"));
    assert!(results[2].as_ref().unwrap_err().contains("out-of-bounds"));
    assert!(results[3].as_ref().unwrap_err().contains("out-of-bounds"));
    assert_eq!(results[4], Ok(json!([0xa, 0xb, 0xc, 0xd])));
    Ok(())
}

#[test]
fn malformed_script_is_rejected() {
    assert!(parse_script(r#"[{"args": [1]}]"#).is_err());
    assert!(parse_script(r#"{"op": "bytes"}"#).is_err());
}
