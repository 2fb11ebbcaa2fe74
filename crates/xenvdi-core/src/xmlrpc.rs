//! XML-RPC value model and wire codec.
//!
//! Only the subset of XML-RPC the management API speaks is supported:
//! scalar values, structs, arrays and `nil`. A `<value>` element with no
//! type child is a string.

use std::collections::BTreeMap;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};

/// A single XML-RPC value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Boolean(bool),
    Double(f64),
    DateTime(String),
    /// Base64 payloads are kept in their encoded text form.
    Base64(String),
    Struct(BTreeMap<String, Value>),
    Array(Vec<Value>),
    Nil,
}

impl Value {
    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the members, if this is a struct.
    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Struct(members) => Some(members),
            _ => None,
        }
    }

    /// Look up a struct member by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_struct().and_then(|members| members.get(key))
    }

    /// Consume the value as a string, failing on any other type.
    pub fn into_string(self) -> Result<String> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(Error::xml_rpc(format!(
                "expected a string, found {}",
                other.type_name()
            ))),
        }
    }

    /// The XML-RPC type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Int(_) => "int",
            Value::Boolean(_) => "boolean",
            Value::Double(_) => "double",
            Value::DateTime(_) => "dateTime.iso8601",
            Value::Base64(_) => "base64",
            Value::Struct(_) => "struct",
            Value::Array(_) => "array",
            Value::Nil => "nil",
        }
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

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(members: BTreeMap<String, Value>) -> Self {
        Value::Struct(members)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

/// Encode a `methodCall` document.
pub fn encode_call(method: &str, params: &[Value]) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", None, None)),
    )?;
    start(&mut writer, "methodCall")?;
    text_element(&mut writer, "methodName", method)?;
    start(&mut writer, "params")?;
    for param in params {
        start(&mut writer, "param")?;
        write_value(&mut writer, param)?;
        end(&mut writer, "param")?;
    }
    end(&mut writer, "params")?;
    end(&mut writer, "methodCall")?;

    String::from_utf8(writer.into_inner()).map_err(|e| Error::xml_rpc(e.to_string()))
}

/// Decode a `methodResponse` document into its single return value.
///
/// A `<fault>` response is turned into an [`Error::XmlRpc`] carrying the
/// fault code and string.
pub fn parse_response(xml: &str) -> Result<Value> {
    let mut parser = Parser::new(xml);
    parser.expect_start("methodResponse")?;
    match parser.next()? {
        Token::Start(tag) if tag == "params" => {
            parser.expect_start("param")?;
            let value = parser.read_value()?;
            parser.expect_end("param")?;
            parser.expect_end("params")?;
            parser.expect_end("methodResponse")?;
            Ok(value)
        }
        Token::Start(tag) if tag == "fault" => {
            let fault = parser.read_value()?;
            parser.expect_end("fault")?;
            Err(fault_error(&fault))
        }
        other => Err(unexpected("params or fault", &other)),
    }
}

fn fault_error(fault: &Value) -> Error {
    let code = match fault.get("faultCode") {
        Some(Value::Int(code)) => code.to_string(),
        Some(Value::String(code)) => code.clone(),
        _ => "?".to_string(),
    };
    let message = fault
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or("no fault string");
    Error::xml_rpc(format!("fault {}: {}", code, message))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::xml_rpc(e.to_string()))
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new(name)))
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<()> {
    emit(writer, Event::End(BytesEnd::new(name)))
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    start(writer, name)?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    end(writer, name)
}

fn write_value(writer: &mut Writer<Vec<u8>>, value: &Value) -> Result<()> {
    start(writer, "value")?;
    match value {
        Value::String(s) => text_element(writer, "string", s)?,
        Value::Int(i) => {
            // i4 only holds 32 bits; wider values need the i8 extension.
            let tag = if i32::try_from(*i).is_ok() { "int" } else { "i8" };
            text_element(writer, tag, &i.to_string())?
        }
        Value::Boolean(b) => text_element(writer, "boolean", if *b { "1" } else { "0" })?,
        Value::Double(d) => text_element(writer, "double", &d.to_string())?,
        Value::DateTime(s) => text_element(writer, "dateTime.iso8601", s)?,
        Value::Base64(s) => text_element(writer, "base64", s)?,
        Value::Struct(members) => {
            start(writer, "struct")?;
            for (name, member) in members {
                start(writer, "member")?;
                text_element(writer, "name", name)?;
                write_value(writer, member)?;
                end(writer, "member")?;
            }
            end(writer, "struct")?;
        }
        Value::Array(items) => {
            start(writer, "array")?;
            start(writer, "data")?;
            for item in items {
                write_value(writer, item)?;
            }
            end(writer, "data")?;
            end(writer, "array")?;
        }
        Value::Nil => emit(writer, Event::Empty(BytesStart::new("nil")))?,
    }
    end(writer, "value")
}

#[derive(Debug)]
enum Token {
    Start(String),
    End(String),
    Empty(String),
    Text(String),
    Eof,
}

fn unexpected(wanted: &str, found: &Token) -> Error {
    Error::xml_rpc(format!("expected {}, found {:?}", wanted, found))
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

struct Parser<'a> {
    reader: Reader<&'a [u8]>,
}

impl<'a> Parser<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
        }
    }

    /// Next token, including whitespace-only text.
    fn raw_next(&mut self) -> Result<Token> {
        loop {
            let event = self
                .reader
                .read_event()
                .map_err(|e| Error::xml_rpc(e.to_string()))?;
            return Ok(match event {
                Event::Start(e) => Token::Start(tag_name(e.name().as_ref())),
                Event::End(e) => Token::End(tag_name(e.name().as_ref())),
                Event::Empty(e) => Token::Empty(tag_name(e.name().as_ref())),
                Event::Text(e) => Token::Text(
                    e.unescape()
                        .map_err(|e| Error::xml_rpc(e.to_string()))?
                        .into_owned(),
                ),
                Event::CData(e) => Token::Text(String::from_utf8_lossy(&e.into_inner()).into_owned()),
                Event::Eof => Token::Eof,
                // Declarations, comments and processing instructions carry no data.
                _ => continue,
            });
        }
    }

    /// Next structural token, skipping indentation between elements.
    fn next(&mut self) -> Result<Token> {
        loop {
            match self.raw_next()? {
                Token::Text(text) if text.trim().is_empty() => continue,
                token => return Ok(token),
            }
        }
    }

    fn expect_start(&mut self, name: &str) -> Result<()> {
        match self.next()? {
            Token::Start(tag) if tag == name => Ok(()),
            other => Err(unexpected(&format!("<{}>", name), &other)),
        }
    }

    fn expect_end(&mut self, name: &str) -> Result<()> {
        match self.next()? {
            Token::End(tag) if tag == name => Ok(()),
            other => Err(unexpected(&format!("</{}>", name), &other)),
        }
    }

    fn text_until_end(&mut self, name: &str) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.raw_next()? {
                Token::Text(chunk) => text.push_str(&chunk),
                Token::End(tag) if tag == name => return Ok(text),
                other => return Err(unexpected(&format!("text in <{}>", name), &other)),
            }
        }
    }

    /// Read a complete `<value>` element.
    fn read_value(&mut self) -> Result<Value> {
        match self.next()? {
            Token::Start(tag) if tag == "value" => self.value_body(),
            Token::Empty(tag) if tag == "value" => Ok(Value::String(String::new())),
            other => Err(unexpected("<value>", &other)),
        }
    }

    /// Read what follows an opening `<value>` up to and including its end tag.
    fn value_body(&mut self) -> Result<Value> {
        let mut text = String::new();
        loop {
            match self.raw_next()? {
                Token::Text(chunk) => text.push_str(&chunk),
                Token::End(tag) if tag == "value" => return Ok(Value::String(text)),
                Token::Start(tag) if text.trim().is_empty() => {
                    let value = self.typed_value(&tag)?;
                    self.expect_end("value")?;
                    return Ok(value);
                }
                Token::Empty(tag) if text.trim().is_empty() => {
                    let value = empty_typed_value(&tag)?;
                    self.expect_end("value")?;
                    return Ok(value);
                }
                other => return Err(unexpected("value content", &other)),
            }
        }
    }

    fn typed_value(&mut self, tag: &str) -> Result<Value> {
        match tag {
            "string" => Ok(Value::String(self.text_until_end(tag)?)),
            "int" | "i4" | "i8" => {
                let text = self.text_until_end(tag)?;
                text.trim()
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|e| Error::xml_rpc(format!("invalid {} '{}': {}", tag, text, e)))
            }
            "boolean" => {
                let text = self.text_until_end(tag)?;
                match text.trim() {
                    "1" => Ok(Value::Boolean(true)),
                    "0" => Ok(Value::Boolean(false)),
                    other => Err(Error::xml_rpc(format!("invalid boolean '{}'", other))),
                }
            }
            "double" => {
                let text = self.text_until_end(tag)?;
                text.trim()
                    .parse::<f64>()
                    .map(Value::Double)
                    .map_err(|e| Error::xml_rpc(format!("invalid double '{}': {}", text, e)))
            }
            "dateTime.iso8601" => Ok(Value::DateTime(self.text_until_end(tag)?.trim().to_string())),
            "base64" => Ok(Value::Base64(self.text_until_end(tag)?.trim().to_string())),
            "nil" => {
                self.text_until_end(tag)?;
                Ok(Value::Nil)
            }
            "struct" => self.struct_body(),
            "array" => self.array_body(),
            other => Err(Error::xml_rpc(format!("unsupported value type <{}>", other))),
        }
    }

    fn struct_body(&mut self) -> Result<Value> {
        let mut members = BTreeMap::new();
        loop {
            match self.next()? {
                Token::Start(tag) if tag == "member" => {
                    self.expect_start("name")?;
                    let name = self.text_until_end("name")?;
                    let value = self.read_value()?;
                    self.expect_end("member")?;
                    members.insert(name, value);
                }
                Token::End(tag) if tag == "struct" => return Ok(Value::Struct(members)),
                other => return Err(unexpected("<member>", &other)),
            }
        }
    }

    fn array_body(&mut self) -> Result<Value> {
        let mut items = Vec::new();
        match self.next()? {
            Token::Start(tag) if tag == "data" => loop {
                match self.next()? {
                    Token::Start(tag) if tag == "value" => items.push(self.value_body()?),
                    Token::Empty(tag) if tag == "value" => items.push(Value::String(String::new())),
                    Token::End(tag) if tag == "data" => break,
                    other => return Err(unexpected("<value>", &other)),
                }
            },
            Token::Empty(tag) if tag == "data" => {}
            other => return Err(unexpected("<data>", &other)),
        }
        self.expect_end("array")?;
        Ok(Value::Array(items))
    }
}

fn empty_typed_value(tag: &str) -> Result<Value> {
    match tag {
        "string" => Ok(Value::String(String::new())),
        "base64" => Ok(Value::Base64(String::new())),
        "nil" => Ok(Value::Nil),
        "struct" => Ok(Value::Struct(BTreeMap::new())),
        "array" => Ok(Value::Array(Vec::new())),
        other => Err(Error::xml_rpc(format!("empty <{}/> has no value", other))),
    }
}
