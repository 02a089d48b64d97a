//! Wire Format Tests
//!
//! Documents written the way other XML-RPC implementations send them:
//! pretty-printed, with declarations, `<i4>`, CDATA sections, arbitrary
//! namespace prefixes and gzip framing. Every one must decode to the same
//! values our own writer produces.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io::Write;

use xmlrpc_common::faults::PARSE_ERROR;
use xmlrpc_common::{Fault, Response, StreamConfig, Value, XmlRpcCodec, XmlRpcError};

const EXTENSIONS_URI: &str = "http://ws.apache.org/xmlrpc/namespaces/extensions";

fn decode_call(xml: &str, config: &StreamConfig) -> xmlrpc_common::Result<xmlrpc_common::Request> {
    XmlRpcCodec::new().decode_request(config, xml.as_bytes(), false)
}

#[test]
fn test_pretty_printed_call() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- sent by a foreign client -->
<methodCall>
  <methodName>examples.getStateName</methodName>
  <params>
    <param>
      <value><i4>41</i4></value>
    </param>
    <param>
      <value>South Dakota</value>
    </param>
    <param>
      <value><dateTime.iso8601>19980717T14:08:55</dateTime.iso8601></value>
    </param>
  </params>
</methodCall>
"#;
    let request = decode_call(xml, &StreamConfig::default()).unwrap();
    assert_eq!(request.method_name(), "examples.getStateName");
    assert_eq!(
        request.params(),
        &[
            Value::Int(41),
            Value::from("South Dakota"),
            Value::DateTime(
                NaiveDate::from_ymd_opt(1998, 7, 17)
                    .unwrap()
                    .and_hms_opt(14, 8, 55)
                    .unwrap()
            ),
        ]
    );
}

#[test]
fn test_struct_and_array_response() {
    let xml = r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param>
      <value>
        <struct>
          <member><name>tags</name><value><array><data>
            <value><string>a</string></value>
            <value><boolean>0</boolean></value>
          </data></array></value></member>
          <member>
            <name>ratio</name>
            <value><double>-0.5</double></value>
          </member>
        </struct>
      </value>
    </param>
  </params>
</methodResponse>"#;
    let value = XmlRpcCodec::new()
        .decode_response(&StreamConfig::default(), xml.as_bytes(), false)
        .unwrap();

    let mut members = BTreeMap::new();
    members.insert(
        "tags".to_string(),
        Value::Array(vec![Value::from("a"), Value::Bool(false)]),
    );
    members.insert("ratio".to_string(), Value::Double(-0.5));
    assert_eq!(value, Value::Struct(members));
}

#[test]
fn test_fault_response_from_foreign_server() {
    let xml = r#"<methodResponse><fault><value><struct>
        <member><name>faultString</name><value><string>Too many parameters.</string></value></member>
        <member><name>faultCode</name><value><int>4</int></value></member>
    </struct></value></fault></methodResponse>"#;
    let err = XmlRpcCodec::new()
        .decode_response(&StreamConfig::default(), xml.as_bytes(), false)
        .unwrap_err();
    assert_eq!(err.fault(), Some(&Fault::new(4, "Too many parameters.")));
}

#[test]
fn test_cdata_and_entities_in_strings() {
    let xml = "<methodCall><methodName>say</methodName><params>\
        <param><value><string><![CDATA[<b>bold</b>]]></string></value></param>\
        <param><value>fish &amp; chips &lt;3</value></param>\
        </params></methodCall>";
    let request = decode_call(xml, &StreamConfig::default()).unwrap();
    assert_eq!(
        request.params(),
        &[Value::from("<b>bold</b>"), Value::from("fish & chips <3")]
    );
}

#[test]
fn test_extension_prefix_is_not_fixed() {
    let xml = format!(
        r#"<methodCall xmlns:apache="{}"><methodName>m</methodName><params>
            <param><value><apache:i8>-9000000000</apache:i8></value></param>
            <param><value><apache:nil/></value></param>
        </params></methodCall>"#,
        EXTENSIONS_URI
    );
    let extended = StreamConfig::default().with_extensions(true);
    let request = decode_call(&xml, &extended).unwrap();
    assert_eq!(request.params(), &[Value::I8(-9_000_000_000), Value::Nil]);

    let err = decode_call(&xml, &StreamConfig::default()).unwrap_err();
    assert!(matches!(err, XmlRpcError::ExtensionRequired("i8")));
}

#[test]
fn test_gzip_from_foreign_peer() {
    let xml = "<methodResponse><params><param><value><int>7</int></value></param></params></methodResponse>";
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::best());
    encoder.write_all(xml.as_bytes()).unwrap();
    let body = encoder.finish().unwrap();

    let value = XmlRpcCodec::new()
        .decode_response(&StreamConfig::default(), &body, true)
        .unwrap();
    assert_eq!(value, Value::Int(7));
}

#[test]
fn test_garbage_maps_to_parse_fault() {
    let err = decode_call("<methodCall><methodName>x", &StreamConfig::default()).unwrap_err();
    assert_eq!(Fault::from_error(&err).code, PARSE_ERROR);
}

#[test]
fn test_written_response_reads_back_as_fault() {
    let codec = XmlRpcCodec::new();
    let config = StreamConfig::default();
    let body = codec
        .encode_response(&config, &Response::fault(-1, "bad"), false)
        .unwrap();
    let text = std::str::from_utf8(&body).unwrap();
    assert!(text.contains("<name>faultCode</name>"));
    assert!(text.contains("<name>faultString</name>"));

    let err = codec.decode_response(&config, &body, false).unwrap_err();
    assert_eq!(err.fault(), Some(&Fault::new(-1, "bad")));
}
