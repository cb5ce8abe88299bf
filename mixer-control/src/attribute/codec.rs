//! Wire encoding of attribute bags.
//!
//! The messages below follow the layout of the Mixer `Attributes` proto: a
//! map from attribute name to a value oneof. Maps are declared as
//! `btree_map` so the encoded form is stable for equal bags.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use bytes::Bytes;
use prost::Message;

use crate::attribute::{AttributeBag, Value};
use crate::error::{Error, Result};

#[derive(Clone, PartialEq, Message)]
pub(crate) struct AttributesProto {
    #[prost(btree_map = "string, message", tag = "1")]
    pub(crate) attributes: BTreeMap<String, AttributeValueProto>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct AttributeValueProto {
    #[prost(oneof = "attribute_value::Kind", tags = "2, 3, 4, 5, 6, 7, 8, 9, 10")]
    pub(crate) kind: Option<attribute_value::Kind>,
}

pub(crate) mod attribute_value {
    use super::{StringList, StringMap};

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub(crate) enum Kind {
        #[prost(string, tag = "2")]
        StringValue(String),
        #[prost(int64, tag = "3")]
        Int64Value(i64),
        #[prost(double, tag = "4")]
        DoubleValue(f64),
        #[prost(bool, tag = "5")]
        BoolValue(bool),
        #[prost(bytes = "bytes", tag = "6")]
        BytesValue(bytes::Bytes),
        #[prost(message, tag = "7")]
        TimestampValue(prost_types::Timestamp),
        #[prost(message, tag = "8")]
        DurationValue(prost_types::Duration),
        #[prost(message, tag = "9")]
        StringMapValue(StringMap),
        #[prost(message, tag = "10")]
        StringListValue(StringList),
    }
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct StringMap {
    #[prost(btree_map = "string, string", tag = "1")]
    pub(crate) entries: BTreeMap<String, String>,
}

#[derive(Clone, PartialEq, Message)]
pub(crate) struct StringList {
    #[prost(string, repeated, tag = "1")]
    pub(crate) values: Vec<String>,
}

pub(crate) fn encode(bag: &AttributeBag) -> Bytes {
    let proto = AttributesProto {
        attributes: bag
            .iter()
            .map(|(name, value)| {
                let kind = Some(to_wire(value));
                (name.to_owned(), AttributeValueProto { kind })
            })
            .collect(),
    };
    Bytes::from(proto.encode_to_vec())
}

pub(crate) fn decode(bytes: &[u8]) -> Result<AttributeBag> {
    let proto = AttributesProto::decode(bytes)?;
    let mut bag = AttributeBag::new();
    for (name, value) in proto.attributes {
        let value = from_wire(&name, value)?;
        bag.set(name, value);
    }
    Ok(bag)
}

fn to_wire(value: &Value) -> attribute_value::Kind {
    use attribute_value::Kind;

    match value {
        Value::String(v) => Kind::StringValue(v.clone()),
        Value::Int64(v) => Kind::Int64Value(*v),
        Value::Double(v) => Kind::DoubleValue(*v),
        Value::Bool(v) => Kind::BoolValue(*v),
        Value::Bytes(v) => Kind::BytesValue(v.clone()),
        Value::Timestamp(v) => Kind::TimestampValue(prost_types::Timestamp::from(*v)),
        Value::Duration(v) => Kind::DurationValue(wire_duration(*v)),
        Value::StringMap(v) => Kind::StringMapValue(StringMap { entries: v.clone() }),
        Value::StringList(v) => Kind::StringListValue(StringList { values: v.clone() }),
    }
}

// Durations beyond i64 seconds saturate.
fn wire_duration(duration: Duration) -> prost_types::Duration {
    prost_types::Duration::try_from(duration).unwrap_or(prost_types::Duration {
        seconds: i64::MAX,
        nanos: 999_999_999,
    })
}

fn from_wire(name: &str, value: AttributeValueProto) -> Result<Value> {
    use attribute_value::Kind;

    let invalid = |reason: String| Error::InvalidValue {
        name: name.to_owned(),
        reason,
    };

    let Some(kind) = value.kind else {
        return Err(invalid("missing value".to_owned()));
    };
    let value = match kind {
        Kind::StringValue(v) => Value::String(v),
        Kind::Int64Value(v) => Value::Int64(v),
        Kind::DoubleValue(v) => Value::Double(v),
        Kind::BoolValue(v) => Value::Bool(v),
        Kind::BytesValue(v) => Value::Bytes(v),
        Kind::TimestampValue(v) => {
            Value::Timestamp(SystemTime::try_from(v).map_err(|e| invalid(e.to_string()))?)
        }
        Kind::DurationValue(v) => {
            Value::Duration(Duration::try_from(v).map_err(|e| invalid(e.to_string()))?)
        }
        Kind::StringMapValue(v) => Value::StringMap(v.entries),
        Kind::StringListValue(v) => Value::StringList(v.values),
    };
    Ok(value)
}
