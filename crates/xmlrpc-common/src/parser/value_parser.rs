//! Streaming value parser.
//!
//! [`ValueParser`] rebuilds one `<value>` tree from parse events using an
//! explicit stack of in-progress frames instead of recursion:
//!
//! - `<value>` pushes a value frame
//! - a scalar tag records its kind on that frame; character data accumulates
//! - `<array>`, `<struct>` and `<ex:dom>` push a container frame above it
//! - `</value>` pops the frame and hands the finished value to the container
//!   below, or, when the stack is empty, completes the parse
//!
//! Struct member names arrive in a `<name>` element and are held on the
//! struct frame until the member's value closes.
//!
//! A parser builds exactly one top-level value and is then spent. Any error
//! aborts the parse; no partial value is ever returned.

use std::collections::BTreeMap;

use crate::config::StreamConfig;
use crate::protocol::error::{Result, XmlRpcError};
use crate::types::{ScalarKind, TypeParser, TypeRegistry};
use crate::value::Value;
use crate::xml::{self, ContentHandler, FragmentBuilder, StartTag};

enum Frame {
    Value(ValueFrame),
    Array { items: Vec<Value>, in_data: bool },
    Struct(StructFrame),
    Node(FragmentBuilder),
}

#[derive(Default)]
struct ValueFrame {
    text: String,
    content: Content,
}

#[derive(Default)]
enum Content {
    /// No typed child yet; text so far is an implicit string
    #[default]
    Pending,
    Scalar { kind: ScalarKind, tag: String },
    /// A container frame sits above this one
    Container,
    Done(Value),
}

#[derive(Default)]
struct StructFrame {
    members: BTreeMap<String, Value>,
    in_member: bool,
    /// Some while inside `<name>`
    name_text: Option<String>,
    /// Name waiting for its value
    name: Option<String>,
}

pub struct ValueParser<'a> {
    registry: &'a TypeRegistry,
    config: &'a StreamConfig,
    stack: Vec<Frame>,
    result: Option<Value>,
}

impl<'a> ValueParser<'a> {
    pub fn new(registry: &'a TypeRegistry, config: &'a StreamConfig) -> Self {
        Self {
            registry,
            config,
            stack: Vec::new(),
            result: None,
        }
    }

    /// Whether the top-level `</value>` has been seen.
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Takes the finished value, leaving the parser spent.
    pub fn take_value(&mut self) -> Option<Value> {
        self.result.take()
    }

    pub fn into_value(self) -> Result<Value> {
        self.result
            .ok_or_else(|| XmlRpcError::Parse("Value is incomplete".to_string()))
    }

    /// Hands a closed `<value>` to whatever is below it.
    fn complete(&mut self, value: Value) -> Result<()> {
        match self.stack.last_mut() {
            None => {
                self.result = Some(value);
                Ok(())
            }
            Some(Frame::Array { items, in_data: true }) => {
                items.push(value);
                Ok(())
            }
            Some(Frame::Struct(frame)) => {
                let name = frame
                    .name
                    .take()
                    .ok_or_else(|| XmlRpcError::Parse("Struct member value without a name".to_string()))?;
                if frame.members.contains_key(&name) {
                    return Err(XmlRpcError::Parse(format!("Duplicate struct member '{}'", name)));
                }
                frame.members.insert(name, value);
                Ok(())
            }
            _ => Err(XmlRpcError::Parse("Misplaced <value>".to_string())),
        }
    }

    /// Stores a finished container in the value frame that opened it.
    fn close_container(&mut self, value: Value) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Value(frame)) if matches!(frame.content, Content::Container) => {
                frame.content = Content::Done(value);
                Ok(())
            }
            _ => Err(XmlRpcError::Parse(format!(
                "Unbalanced </{}>",
                value.type_name()
            ))),
        }
    }
}

/// Builds the frame for a typed child of `<value>`.
fn child_frame(
    registry: &TypeRegistry,
    config: &StreamConfig,
    namespace: &str,
    name: &str,
) -> Result<Frame> {
    let frame = match registry.resolve(config, namespace, name)? {
        TypeParser::Scalar(kind) => Frame::Value(ValueFrame {
            text: String::new(),
            content: Content::Scalar {
                kind,
                tag: name.to_string(),
            },
        }),
        TypeParser::Array => Frame::Array {
            items: Vec::new(),
            in_data: false,
        },
        TypeParser::Struct => Frame::Struct(StructFrame::default()),
        TypeParser::Node => Frame::Node(FragmentBuilder::new()),
    };
    Ok(frame)
}

fn unexpected_start(name: &str) -> XmlRpcError {
    XmlRpcError::Parse(format!("Unexpected <{}>", name))
}

fn unexpected_end(name: &str) -> XmlRpcError {
    XmlRpcError::Parse(format!("Unexpected </{}>", name))
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

impl ContentHandler for ValueParser<'_> {
    fn start_element(&mut self, namespace: &str, name: &str) -> Result<()> {
        if self.result.is_some() {
            return Err(unexpected_start(name));
        }
        let structural = namespace.is_empty();

        let push = match self.stack.last_mut() {
            None => {
                if !(structural && name == "value") {
                    return Err(XmlRpcError::Parse(format!("Expected <value>, got <{}>", name)));
                }
                Frame::Value(ValueFrame::default())
            }
            Some(Frame::Value(frame)) => {
                if !matches!(frame.content, Content::Pending) {
                    return Err(unexpected_start(name));
                }
                if !is_blank(&frame.text) {
                    return Err(XmlRpcError::Parse(format!(
                        "Character data mixed with <{}> inside <value>",
                        name
                    )));
                }
                let child = child_frame(self.registry, self.config, namespace, name)?;
                frame.text.clear();
                match child {
                    // scalars live on the value frame itself
                    Frame::Value(scalar) => {
                        frame.content = scalar.content;
                        return Ok(());
                    }
                    container => {
                        frame.content = Content::Container;
                        container
                    }
                }
            }
            Some(Frame::Array { in_data, .. }) => {
                if !structural {
                    return Err(unexpected_start(name));
                }
                match (name, *in_data) {
                    ("data", false) => {
                        *in_data = true;
                        return Ok(());
                    }
                    ("value", true) => Frame::Value(ValueFrame::default()),
                    _ => return Err(unexpected_start(name)),
                }
            }
            Some(Frame::Struct(frame)) => {
                if !structural {
                    return Err(unexpected_start(name));
                }
                match name {
                    "member" if !frame.in_member => {
                        frame.in_member = true;
                        return Ok(());
                    }
                    "name" if frame.in_member && frame.name.is_none() && frame.name_text.is_none() => {
                        frame.name_text = Some(String::new());
                        return Ok(());
                    }
                    "value" if frame.name.is_some() => Frame::Value(ValueFrame::default()),
                    _ => return Err(unexpected_start(name)),
                }
            }
            Some(Frame::Node(fragment)) => return fragment.start_element(namespace, name),
        };

        self.stack.push(push);
        Ok(())
    }

    fn start_tag(&mut self, namespace: &str, tag: &StartTag<'_>) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Node(fragment)) => fragment.start_tag(namespace, tag),
            _ => self.start_element(namespace, tag.local_name()),
        }
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        match self.stack.last_mut() {
            Some(Frame::Value(frame)) => match frame.content {
                Content::Pending | Content::Scalar { .. } => frame.text.push_str(text),
                Content::Container | Content::Done(_) => {
                    if !is_blank(text) {
                        return Err(XmlRpcError::Parse(
                            "Character data after typed value".to_string(),
                        ));
                    }
                }
            },
            Some(Frame::Struct(StructFrame {
                name_text: Some(name),
                ..
            })) => name.push_str(text),
            Some(Frame::Node(fragment)) => fragment.characters(text)?,
            Some(Frame::Array { .. }) | Some(Frame::Struct(_)) | None => {
                if !is_blank(text) {
                    return Err(XmlRpcError::Parse(format!(
                        "Unexpected character data '{}'",
                        text.trim()
                    )));
                }
            }
        }
        Ok(())
    }

    fn end_element(&mut self, namespace: &str, name: &str) -> Result<()> {
        let frame = self.stack.pop().ok_or_else(|| unexpected_end(name))?;

        match frame {
            Frame::Value(mut frame) => match frame.content {
                Content::Scalar { kind, tag } if tag == name => {
                    let value = kind.parse(&frame.text)?;
                    frame.text.clear();
                    frame.content = Content::Done(value);
                    self.stack.push(Frame::Value(frame));
                    Ok(())
                }
                Content::Pending if name == "value" => self.complete(Value::String(frame.text)),
                Content::Done(value) if name == "value" => self.complete(value),
                _ => Err(unexpected_end(name)),
            },
            Frame::Array { items, in_data } => match (name, in_data) {
                ("data", true) => {
                    self.stack.push(Frame::Array {
                        items,
                        in_data: false,
                    });
                    Ok(())
                }
                ("array", false) => self.close_container(Value::Array(items)),
                _ => Err(unexpected_end(name)),
            },
            Frame::Struct(mut frame) => match name {
                "name" if frame.name_text.is_some() => {
                    frame.name = frame.name_text.take();
                    self.stack.push(Frame::Struct(frame));
                    Ok(())
                }
                "member" if frame.in_member && frame.name.is_none() && frame.name_text.is_none() => {
                    frame.in_member = false;
                    self.stack.push(Frame::Struct(frame));
                    Ok(())
                }
                "member" if frame.name.is_some() => Err(XmlRpcError::Parse(format!(
                    "Struct member '{}' has no value",
                    frame.name.unwrap_or_default()
                ))),
                "struct" if !frame.in_member => self.close_container(Value::Struct(frame.members)),
                _ => Err(unexpected_end(name)),
            },
            Frame::Node(mut fragment) if fragment.is_open() => {
                fragment.end_element(namespace, name)?;
                self.stack.push(Frame::Node(fragment));
                Ok(())
            }
            Frame::Node(fragment) if name == "dom" => {
                self.close_container(Value::ExternalNode(fragment.finish()?))
            }
            Frame::Node(_) => Err(unexpected_end(name)),
        }
    }
}

/// Parses a standalone `<value>` document.
pub fn parse_value(registry: &TypeRegistry, config: &StreamConfig, xml_text: &str) -> Result<Value> {
    let mut parser = ValueParser::new(registry, config);
    xml::parse(xml_text.as_bytes(), &mut parser)?;
    parser.into_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::EXTENSIONS_URI;

    fn parse(xml_text: &str) -> Result<Value> {
        parse_value(&TypeRegistry::new(), &StreamConfig::default(), xml_text)
    }

    fn parse_ext(xml_text: &str) -> Result<Value> {
        parse_value(
            &TypeRegistry::new(),
            &StreamConfig::default().with_extensions(true),
            xml_text,
        )
    }

    #[test]
    fn test_bare_text_is_string() {
        assert_eq!(parse("<value>hello</value>").unwrap(), Value::from("hello"));
        assert_eq!(parse("<value></value>").unwrap(), Value::from(""));
        assert_eq!(parse("<value/>").unwrap(), Value::from(""));
    }

    #[test]
    fn test_typed_scalars() {
        assert_eq!(parse("<value><i4>42</i4></value>").unwrap(), Value::Int(42));
        assert_eq!(parse("<value><boolean>1</boolean></value>").unwrap(), Value::Bool(true));
        assert_eq!(parse("<value><double>2.5</double></value>").unwrap(), Value::Double(2.5));
        assert_eq!(parse("<value><string>a b</string></value>").unwrap(), Value::from("a b"));
        assert_eq!(parse("<value><string/></value>").unwrap(), Value::from(""));
    }

    #[test]
    fn test_whitespace_around_typed_value() {
        assert_eq!(parse("<value>\n  <int>7</int>\n</value>").unwrap(), Value::Int(7));
    }

    #[test]
    fn test_struct_member_order_is_irrelevant() {
        let a = parse(
            "<value><struct>\
             <member><name>2</name><value><int>3</int></value></member>\
             <member><name>3</name><value><int>5</int></value></member>\
             </struct></value>",
        )
        .unwrap();
        let b = parse(
            "<value><struct>\
             <member><name>3</name><value><int>5</int></value></member>\
             <member><name>2</name><value><int>3</int></value></member>\
             </struct></value>",
        )
        .unwrap();
        assert_eq!(a, b);
        let members = a.as_struct().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members.get("2"), Some(&Value::Int(3)));
        assert_eq!(members.get("3"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_nested_arrays() {
        let value = parse(
            "<value><array><data>\
             <value><array><data><value>array</value><value><string>string</string></value></data></array></value>\
             </data></array></value>",
        )
        .unwrap();
        assert_eq!(
            value,
            Value::Array(vec![Value::Array(vec![
                Value::from("array"),
                Value::from("string")
            ])])
        );
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(parse("<value><array><data/></array></value>").unwrap(), Value::Array(vec![]));
        assert_eq!(parse("<value><struct/></value>").unwrap(), Value::Struct(BTreeMap::new()));
    }

    #[test]
    fn test_malformed_int_is_fatal() {
        let err = parse("<value><int>abc</int></value>").unwrap_err();
        assert!(matches!(err, XmlRpcError::MalformedValue { .. }));
    }

    #[test]
    fn test_unknown_tag_is_fatal() {
        let err = parse("<value><bogus>1</bogus></value>").unwrap_err();
        assert!(matches!(err, XmlRpcError::UnknownTag(_)));
    }

    #[test]
    fn test_extension_tags_rejected_without_extensions() {
        let xml_text = format!("<value xmlns:ex=\"{}\"><ex:i8>5</ex:i8></value>", EXTENSIONS_URI);
        assert!(matches!(
            parse(&xml_text).unwrap_err(),
            XmlRpcError::ExtensionRequired("i8")
        ));
        assert_eq!(parse_ext(&xml_text).unwrap(), Value::I8(5));
    }

    #[test]
    fn test_nil_and_dom_extensions() {
        let nil = format!("<value xmlns:ex=\"{}\"><ex:nil/></value>", EXTENSIONS_URI);
        assert_eq!(parse_ext(&nil).unwrap(), Value::Nil);

        let dom = format!(
            "<value xmlns:ex=\"{}\"><ex:dom><a><b>x &amp; y</b></a></ex:dom></value>",
            EXTENSIONS_URI
        );
        assert_eq!(
            parse_ext(&dom).unwrap(),
            Value::ExternalNode("<a><b>x &amp; y</b></a>".to_string())
        );
    }

    #[test]
    fn test_dom_fragment_is_canonical() {
        let dom = format!(
            "<value xmlns:ex=\"{}\"><ex:dom>\n  <a k=\"v\"><b></b><c>it&apos;s</c></a>\n</ex:dom></value>",
            EXTENSIONS_URI
        );
        assert_eq!(
            parse_ext(&dom).unwrap(),
            Value::ExternalNode(r#"<a k="v"><b/><c>it's</c></a>"#.to_string())
        );

        let empty = format!("<value xmlns:ex=\"{}\"><ex:dom/></value>", EXTENSIONS_URI);
        assert_eq!(parse_ext(&empty).unwrap(), Value::ExternalNode(String::new()));
    }

    #[test]
    fn test_dom_with_two_roots_fails() {
        let dom = format!(
            "<value xmlns:ex=\"{}\"><ex:dom><a/><b/></ex:dom></value>",
            EXTENSIONS_URI
        );
        assert!(matches!(
            parse_ext(&dom).unwrap_err(),
            XmlRpcError::MalformedValue { kind: "dom", .. }
        ));
    }

    #[test]
    fn test_member_without_value_fails() {
        let err = parse("<value><struct><member><name>a</name></member></struct></value>").unwrap_err();
        assert!(err.to_string().contains("no value"));
    }

    #[test]
    fn test_duplicate_member_fails() {
        assert!(parse(
            "<value><struct>\
             <member><name>a</name><value>1</value></member>\
             <member><name>a</name><value>2</value></member>\
             </struct></value>"
        )
        .is_err());
    }

    #[test]
    fn test_mixed_content_fails() {
        assert!(parse("<value>text<int>1</int></value>").is_err());
    }

    #[test]
    fn test_array_without_data_fails() {
        assert!(parse("<value><array><value>1</value></array></value>").is_err());
    }

    #[test]
    fn test_second_value_after_completion_fails() {
        let registry = TypeRegistry::new();
        let config = StreamConfig::default();
        let mut parser = ValueParser::new(&registry, &config);
        parser.start_element("", "value").unwrap();
        parser.characters("x").unwrap();
        parser.end_element("", "value").unwrap();
        assert!(parser.is_complete());
        assert!(parser.start_element("", "value").is_err());
    }
}
