//! Streaming dump reader.
//!
//! Decodes the front-end's XML dump document into [`Dump`]. The file is
//! memory-mapped before parsing; records are handed to
//! [`ConfigurationBuilder`] in document order and resolved in one pass when
//! the enclosing `<dump>` element closes.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use memmap2::Mmap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::dump::builder::{ConfigurationBuilder, RawScope, RawToken, RawVariable};
use crate::dump::model::{Dump, ScopeKind};
use crate::error::{AnalysisError, Result};

/// Read and decode a dump file.
pub fn read_dump<P: AsRef<Path>>(path: P) -> Result<Dump> {
    let file = File::open(path.as_ref())?;

    // Safety: the file is opened read-only and never modified while mapped.
    let mmap = unsafe { Mmap::map(&file)? };

    parse_dump(&mmap)
}

/// Decode a dump document from raw bytes.
pub fn parse_dump(bytes: &[u8]) -> Result<Dump> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();

    let mut dump = Dump::default();
    let mut current: Option<ConfigurationBuilder> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => match e.name().as_ref() {
                b"dump" => {
                    let attrs = attributes(&e)?;
                    let mut builder = ConfigurationBuilder::new();
                    if let Some(name) = non_empty(&attrs, "cfg") {
                        builder.name(&name);
                    }
                    current = Some(builder);
                }
                b"token" => {
                    if let Some(builder) = current.as_mut() {
                        builder.token(read_token(&e)?);
                    }
                }
                b"scope" => {
                    if let Some(builder) = current.as_mut() {
                        builder.scope(read_scope(&e)?);
                    }
                }
                b"var" => {
                    if let Some(builder) = current.as_mut() {
                        builder.variable(read_variable(&e)?);
                    }
                }
                _ => {}
            },
            Event::End(e) => {
                if e.name().as_ref() == b"dump" {
                    if let Some(builder) = current.take() {
                        dump.configurations.push(builder.finish()?);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(builder) = current.take() {
        // Tolerate a truncated closing tag; the records are complete.
        dump.configurations.push(builder.finish()?);
    }

    Ok(dump)
}

fn read_token(e: &BytesStart<'_>) -> Result<RawToken> {
    let attrs = attributes(e)?;
    let id = required(&attrs, "id", "token")?;
    let text = required(&attrs, "str", "token")?;
    let scope = required(&attrs, "scope", "token")?;
    let line = match attrs.get("linenr") {
        Some(v) => v.parse::<u32>().map_err(|_| {
            AnalysisError::MalformedDump(format!("token `{id}` has bad linenr `{v}`"))
        })?,
        None => 0,
    };

    let mut token = RawToken::new(&id, &text, line, &scope);
    token.ast_parent = non_empty(&attrs, "astParent");
    token.ast_op1 = non_empty(&attrs, "astOperand1");
    token.ast_op2 = non_empty(&attrs, "astOperand2");
    token.variable = non_empty(&attrs, "variable");
    token.is_arithmetic_op = attrs.get("isArithmeticalOp").map(|v| v == "true").unwrap_or(false);
    Ok(token)
}

fn read_scope(e: &BytesStart<'_>) -> Result<RawScope> {
    let attrs = attributes(e)?;
    let id = required(&attrs, "id", "scope")?;
    let kind = ScopeKind::from_tag(attrs.get("type").map(String::as_str).unwrap_or(""));

    let mut scope = RawScope::new(&id, kind);
    scope.name = non_empty(&attrs, "className");
    scope.start = non_empty(&attrs, "classStart");
    scope.end = non_empty(&attrs, "classEnd");
    scope.nested_in = non_empty(&attrs, "nestedIn");
    Ok(scope)
}

fn read_variable(e: &BytesStart<'_>) -> Result<RawVariable> {
    let attrs = attributes(e)?;
    let id = required(&attrs, "id", "var")?;

    let mut variable = RawVariable {
        id,
        name_token: non_empty(&attrs, "nameToken"),
        scope: non_empty(&attrs, "scope"),
        is_argument: false,
    };
    variable.is_argument = attrs.get("access").map(|v| v == "Argument").unwrap_or(false);
    Ok(variable)
}

fn attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr =
            attr.map_err(|err| AnalysisError::MalformedDump(format!("bad attribute: {err}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| AnalysisError::MalformedDump(format!("bad attribute value: {err}")))?
            .into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn required(attrs: &HashMap<String, String>, key: &str, element: &str) -> Result<String> {
    attrs
        .get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| AnalysisError::MalformedDump(format!("<{element}> is missing `{key}`")))
}

fn non_empty(attrs: &HashMap<String, String>, key: &str) -> Option<String> {
    attrs.get(key).filter(|v| !v.is_empty()).cloned()
}
