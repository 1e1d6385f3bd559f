//! Decoder for the reply of `ListInstancesWithDesktopEntries`.
//!
//! The manager answers with a body of one `a(ss)` argument. Seen as a single
//! value the body is the structure `(a(ss))`: one field holding an ordered
//! list of `(instance_name, desktop_entry)` pairs. The body signature is
//! checked first, since a body of one `(a(ss))` argument reads as the same
//! structure. The decoder works on plain [`zbus::zvariant::Value`]s so it
//! does not depend on how the reply was fetched.

use thiserror::Error;
use zbus::zvariant::{OwnedValue, Value};

/// Name and expected signature of a remote method's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplySchema {
    pub method: &'static str,
    /// Signature of the reply's arguments, as carried by the message.
    pub body: &'static str,
    /// Signature of the whole reply body, seen as one structure.
    pub signature: &'static str,
}

/// Schema of `org.bubblejail.Manager.Unstable.ListInstancesWithDesktopEntries`.
pub const LIST_INSTANCES_SCHEMA: ReplySchema = ReplySchema {
    method: "ListInstancesWithDesktopEntries",
    body: "a(ss)",
    signature: "(a(ss))",
};

/// One instance as advertised by the manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub name: String,
    /// `None` when the manager sent an empty string.
    pub desktop_entry: Option<String>,
}

impl InstanceRecord {
    fn from_pair(name: &str, desktop_entry: &str) -> Self {
        Self {
            name: name.to_string(),
            desktop_entry: (!desktop_entry.is_empty()).then(|| desktop_entry.to_string()),
        }
    }
}

/// A reply value did not have the shape described by its [`ReplySchema`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("reply of {method} does not match `{expected}`, got `{found}`")]
pub struct SchemaMismatch {
    pub method: &'static str,
    pub expected: &'static str,
    pub found: String,
}

/// Raw reply as received from the bus.
///
/// `signature` is the body signature from the message, empty when the reply
/// carried no arguments. `body` holds the arguments as one structure; it may
/// be left out when the signature already rules the reply out.
#[derive(Debug)]
pub struct RawReply {
    pub signature: String,
    pub body: Option<OwnedValue>,
}

impl RawReply {
    /// Reply whose arguments are the fields of `body`.
    pub fn new(body: Option<OwnedValue>) -> Self {
        let signature = body.as_deref().map(arguments_signature).unwrap_or_default();
        Self { signature, body }
    }

    pub fn with_signature(signature: impl Into<String>, body: Option<OwnedValue>) -> Self {
        Self {
            signature: signature.into(),
            body,
        }
    }
}

/// Argument signature of a body seen as one value: the fields of a structure,
/// or the value itself as a single argument.
fn arguments_signature(value: &Value<'_>) -> String {
    let signature = value.value_signature();
    let signature = signature.as_str();
    match value {
        Value::Structure(_) => signature
            .strip_prefix('(')
            .and_then(|inner| inner.strip_suffix(')'))
            .unwrap_or(signature)
            .to_string(),
        _ => signature.to_string(),
    }
}

impl ReplySchema {
    fn mismatch(&self, found: impl Into<String>) -> SchemaMismatch {
        SchemaMismatch {
            method: self.method,
            expected: self.signature,
            found: found.into(),
        }
    }

    /// Checks the body signature carried by the message.
    pub fn validate_body(&self, signature: &str) -> Result<(), SchemaMismatch> {
        if signature == self.body {
            Ok(())
        } else {
            Err(SchemaMismatch {
                method: self.method,
                expected: self.body,
                found: signature.to_string(),
            })
        }
    }

    /// Checks that `value` has exactly this schema's signature.
    pub fn validate_top_level(&self, value: &Value<'_>) -> Result<(), SchemaMismatch> {
        let found = value.value_signature();
        if found.as_str() == self.signature {
            Ok(())
        } else {
            Err(self.mismatch(found.as_str()))
        }
    }
}

/// Checks `value` against [`LIST_INSTANCES_SCHEMA`].
pub fn validate_top_level(value: &Value<'_>) -> Result<(), SchemaMismatch> {
    LIST_INSTANCES_SCHEMA.validate_top_level(value)
}

/// Decodes a `(a(ss))` value into records, in the order they were sent.
///
/// Nothing is returned unless the whole value matches the schema.
pub fn decode(value: &Value<'_>) -> Result<Vec<InstanceRecord>, SchemaMismatch> {
    let schema = LIST_INSTANCES_SCHEMA;
    schema.validate_top_level(value)?;

    let shape_error = || schema.mismatch(value.value_signature().as_str());

    let Value::Structure(top) = value else {
        return Err(shape_error());
    };
    let [Value::Array(pairs)] = top.fields() else {
        return Err(shape_error());
    };

    pairs
        .iter()
        .map(|pair| match pair {
            Value::Structure(pair) => match pair.fields() {
                [Value::Str(name), Value::Str(desktop_entry)] => Ok(InstanceRecord::from_pair(
                    name.as_str(),
                    desktop_entry.as_str(),
                )),
                _ => Err(shape_error()),
            },
            _ => Err(shape_error()),
        })
        .collect()
}

/// Decodes a reply as received from the bus.
///
/// The body must be exactly one `a(ss)` argument; an empty body or any other
/// argument list is a mismatch.
pub fn decode_reply(reply: &RawReply) -> Result<Vec<InstanceRecord>, SchemaMismatch> {
    let schema = LIST_INSTANCES_SCHEMA;
    schema.validate_body(&reply.signature)?;
    match &reply.body {
        Some(body) => decode(body),
        None => Err(schema.mismatch("")),
    }
}
