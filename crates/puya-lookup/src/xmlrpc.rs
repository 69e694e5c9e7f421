//! Minimal XML-RPC codec: `methodCall` encoding and `methodResponse` decoding.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

/// An XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Double(f64),
    String(String),
    DateTime(String),
    Base64(String),
    Array(Vec<Value>),
    Struct(BTreeMap<String, Value>),
    Nil,
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// Build a struct from `(name, value)` pairs.
    pub fn structure<I, K>(members: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Struct(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<value>");
        match self {
            Value::Int(i) => {
                let _ = write!(out, "<int>{i}</int>");
            }
            Value::Bool(b) => {
                let _ = write!(out, "<boolean>{}</boolean>", u8::from(*b));
            }
            Value::Double(d) => {
                let _ = write!(out, "<double>{d}</double>");
            }
            Value::String(s) => {
                let _ = write!(out, "<string>{}</string>", escape(s.as_str()));
            }
            Value::DateTime(s) => {
                let _ = write!(
                    out,
                    "<dateTime.iso8601>{}</dateTime.iso8601>",
                    escape(s.as_str())
                );
            }
            Value::Base64(s) => {
                let _ = write!(out, "<base64>{}</base64>", escape(s.as_str()));
            }
            Value::Array(items) => {
                out.push_str("<array><data>");
                for item in items {
                    item.write_xml(out);
                }
                out.push_str("</data></array>");
            }
            Value::Struct(members) => {
                out.push_str("<struct>");
                for (name, value) in members {
                    let _ = write!(out, "<member><name>{}</name>", escape(name.as_str()));
                    value.write_xml(out);
                    out.push_str("</member>");
                }
                out.push_str("</struct>");
            }
            Value::Nil => out.push_str("<nil/>"),
        }
        out.push_str("</value>");
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// A decoded `methodResponse`.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success(Value),
    Fault { code: i64, message: String },
}

/// Errors decoding an XML-RPC document.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Unexpected element <{found}>, expected {expected}")]
    UnexpectedElement { found: String, expected: String },

    #[error("Missing element <{0}>")]
    MissingElement(String),

    #[error("Invalid {kind} value '{text}'")]
    InvalidScalar { kind: &'static str, text: String },
}

/// Encode a `methodCall` document.
pub fn encode_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?><methodCall><methodName>");
    out.push_str(&escape(method));
    out.push_str("</methodName><params>");
    for param in params {
        out.push_str("<param>");
        param.write_xml(&mut out);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>");
    out
}

/// Decode a `methodResponse` document into its single result value or a fault.
pub fn decode_response(xml: &str) -> Result<Response, CodecError> {
    let root = parse_tree(xml)?;
    expect_name(&root, "methodResponse")?;

    let body = root
        .children
        .first()
        .ok_or_else(|| CodecError::MissingElement("params".to_string()))?;

    match body.name.as_str() {
        "params" => {
            let param = child(body, "param")?;
            let value = decode_value(child(param, "value")?)?;
            Ok(Response::Success(value))
        }
        "fault" => {
            let fault = decode_value(child(body, "value")?)?;
            let members = fault.as_struct().ok_or_else(|| CodecError::UnexpectedElement {
                found: "value".to_string(),
                expected: "fault struct".to_string(),
            })?;
            let code = members
                .get("faultCode")
                .and_then(Value::as_i64)
                .unwrap_or_default();
            let message = match members.get("faultString") {
                Some(Value::String(s)) => s.clone(),
                _ => String::new(),
            };
            Ok(Response::Fault { code, message })
        }
        other => Err(CodecError::UnexpectedElement {
            found: other.to_string(),
            expected: "params or fault".to_string(),
        }),
    }
}

/// A parsed element with its children and concatenated text.
#[derive(Debug, Default)]
struct Element {
    name: String,
    children: Vec<Element>,
    text: String,
}

fn parse_tree(xml: &str) -> Result<Element, CodecError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                stack.push(Element {
                    name: String::from_utf8_lossy(e.local_name().as_ref()).to_string(),
                    ..Element::default()
                });
            }
            Ok(Event::Empty(e)) => {
                let element = Element {
                    name: String::from_utf8_lossy(e.local_name().as_ref()).to_string(),
                    ..Element::default()
                };
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| CodecError::Xml("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| CodecError::Xml(e.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CodecError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(CodecError::Xml("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| CodecError::Xml("empty document".to_string()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), CodecError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(CodecError::Xml("multiple root elements".to_string())),
    }
}

fn expect_name(element: &Element, name: &str) -> Result<(), CodecError> {
    if element.name == name {
        Ok(())
    } else {
        Err(CodecError::UnexpectedElement {
            found: element.name.clone(),
            expected: format!("<{name}>"),
        })
    }
}

fn child<'a>(element: &'a Element, name: &str) -> Result<&'a Element, CodecError> {
    element
        .children
        .iter()
        .find(|c| c.name == name)
        .ok_or_else(|| CodecError::MissingElement(name.to_string()))
}

fn decode_value(element: &Element) -> Result<Value, CodecError> {
    expect_name(element, "value")?;

    // An untyped <value> is a string.
    let Some(typed) = element.children.first() else {
        return Ok(Value::String(element.text.clone()));
    };

    let text = typed.text.as_str();
    match typed.name.as_str() {
        "int" | "i4" | "i8" => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| invalid("int", text)),
        "boolean" => match text.trim() {
            "1" | "true" => Ok(Value::Bool(true)),
            "0" | "false" => Ok(Value::Bool(false)),
            _ => Err(invalid("boolean", text)),
        },
        "double" => text
            .trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| invalid("double", text)),
        "string" => Ok(Value::String(text.to_string())),
        "dateTime.iso8601" => Ok(Value::DateTime(text.trim().to_string())),
        "base64" => Ok(Value::Base64(text.trim().to_string())),
        "nil" => Ok(Value::Nil),
        "array" => {
            let data = child(typed, "data")?;
            let items = data
                .children
                .iter()
                .map(decode_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(items))
        }
        "struct" => {
            let mut members = BTreeMap::new();
            for member in &typed.children {
                expect_name(member, "member")?;
                let name = child(member, "name")?.text.clone();
                let value = decode_value(child(member, "value")?)?;
                members.insert(name, value);
            }
            Ok(Value::Struct(members))
        }
        other => Err(CodecError::UnexpectedElement {
            found: other.to_string(),
            expected: "a value type".to_string(),
        }),
    }
}

fn invalid(kind: &'static str, text: &str) -> CodecError {
    CodecError::InvalidScalar {
        kind,
        text: text.to_string(),
    }
}
