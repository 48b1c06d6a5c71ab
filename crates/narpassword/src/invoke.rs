//! Applying untyped operations to named buffers.
//!
//! Arguments that come from outside the type system (e.g. a JSON script) have to be checked at
//! runtime. An [`Invocation`] names an operation and carries its arguments as raw
//! [`serde_json::Value`]s. [`Session::apply`] validates them and reports the same error kinds
//! as the typed [`BitBuffer`] API, plus the argument kinds the typed API rules out statically
//! ([`MissingArgument`](BitBufferError::MissingArgument),
//! [`NotANumber`](BitBufferError::NotANumber), [`NotAnArray`](BitBufferError::NotAnArray), ...).
use crate::errors::BitBufferError;
use crate::BitBuffer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// Buffer an invocation targets if it does not name one.
pub const DEFAULT_BUFFER: &str = "working";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Invocation {
    pub op: String,
    #[serde(default)]
    pub args: Vec<Value>,
    /// Target buffer, [`DEFAULT_BUFFER`] if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer: Option<String>,
}

impl Invocation {
    pub fn new(op: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            op: op.into(),
            args,
            buffer: None,
        }
    }

    pub fn on(mut self, buffer: impl Into<String>) -> Self {
        self.buffer = Some(buffer.into());
        self
    }

    pub fn target(&self) -> &str {
        self.buffer.as_deref().unwrap_or(DEFAULT_BUFFER)
    }
}

/// Parse a JSON array of invocations.
pub fn parse_script(json: &str) -> Result<Vec<Invocation>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Operations on a single buffer. `new` and `copy` act on the session and are handled by
/// [`Session::apply`] before an `Op` is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    GetBit,
    SetBit,
    GetBits,
    SetBits,
    GetByte,
    SetByte,
    GetBytes,
    SetBytes,
    Bytes,
    Checksum,
    ValidateChecksum,
    FixChecksum,
    RotateLeft,
    RotateRight,
    RotateLeftByCounter,
    RotateRightByCounter,
}

impl FromStr for Op {
    type Err = BitBufferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "getBit" => Op::GetBit,
            "setBit" => Op::SetBit,
            "getBits" => Op::GetBits,
            "setBits" => Op::SetBits,
            "getByte" => Op::GetByte,
            "setByte" => Op::SetByte,
            "getBytes" => Op::GetBytes,
            "setBytes" => Op::SetBytes,
            "bytes" => Op::Bytes,
            "checksum" => Op::Checksum,
            "validateChecksum" => Op::ValidateChecksum,
            "fixChecksum" => Op::FixChecksum,
            "rotateLeft" => Op::RotateLeft,
            "rotateRight" => Op::RotateRight,
            "rotateLeftByCounter" => Op::RotateLeftByCounter,
            "rotateRightByCounter" => Op::RotateRightByCounter,
            other => return Err(BitBufferError::UnknownOperation(other.to_owned())),
        };
        Ok(op)
    }
}

/// Named, independently owned buffers.
///
/// A new session holds an empty buffer named [`DEFAULT_BUFFER`].
#[derive(Debug, Clone)]
pub struct Session {
    buffers: BTreeMap<String, BitBuffer>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_BUFFER, BitBuffer::empty())
    }

    pub fn with_buffer(name: impl Into<String>, buffer: BitBuffer) -> Self {
        let mut buffers = BTreeMap::new();
        buffers.insert(name.into(), buffer);
        Self { buffers }
    }

    pub fn buffer(&self, name: &str) -> Option<&BitBuffer> {
        self.buffers.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, buffer: BitBuffer) -> Option<BitBuffer> {
        self.buffers.insert(name.into(), buffer)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.buffers.keys().map(String::as_str)
    }

    /// Applies `invocation` and returns its result, `null` for operations without one.
    ///
    /// Operations on a buffer name the session does not hold act on a fresh empty buffer, which
    /// is kept afterwards.
    #[tracing::instrument(skip_all, fields(op = %invocation.op, buffer = invocation.target()), err)]
    pub fn apply(&mut self, invocation: &Invocation) -> Result<Value, BitBufferError> {
        let args = invocation.args.as_slice();
        let target = invocation.target();

        match invocation.op.as_str() {
            "new" => {
                self.insert(target, BitBuffer::empty());
                return Ok(Value::Null);
            }
            "copy" => {
                let copy = match args.first() {
                    Some(Value::String(source)) => self
                        .buffers
                        .get(source)
                        .map(BitBuffer::copy)
                        .ok_or(BitBufferError::InvalidCopySource)?,
                    _ => return Err(BitBufferError::InvalidCopySource),
                };
                self.insert(target, copy);
                return Ok(Value::Null);
            }
            _ => {}
        }

        let op: Op = invocation.op.parse()?;
        debug!(?op, "Applying");
        let buffer = self
            .buffers
            .entry(target.to_owned())
            .or_insert_with(BitBuffer::empty);
        apply_to_buffer(buffer, op, args)
    }
}

fn apply_to_buffer<S>(
    buffer: &mut BitBuffer<S>,
    op: Op,
    args: &[Value],
) -> Result<Value, BitBufferError>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
{
    let ret = match op {
        Op::GetBit => buffer.get_bit(bit_index(args, 0)?)?.into(),
        Op::SetBit => {
            let index = bit_index(args, 0)?;
            // an out-of-bounds index is reported before a missing value
            let bit_len = buffer.bit_len();
            if index >= bit_len {
                return Err(BitBufferError::BitOutOfBounds { index, bit_len });
            }
            let value = bit_value(args, 1)?;
            buffer.set_bit(index, value)?;
            Value::Null
        }
        Op::GetBits => {
            let indices = index_list(array_arg(args, 0, "Bits to get")?, "Bit index")?;
            buffer.get_bits(&indices)?.into()
        }
        Op::SetBits => {
            let indices = array_arg(args, 0, "Bits to set")?;
            let values = array_arg(args, 1, "Bit values")?;
            let indices = index_list(indices, "Bit index")?;
            let values: Vec<bool> = values.iter().map(truthy).collect();
            buffer.set_bits(&indices, &values)?;
            Value::Null
        }
        Op::GetByte => buffer.get_byte(byte_bound(args, 0, "Byte index")?)?.into(),
        Op::SetByte => {
            let index = byte_bound(args, 0, "Byte index")?;
            let value = match args.get(1) {
                None | Some(Value::Null) => return Err(BitBufferError::MissingArgument("a byte value")),
                Some(value) => byte_value(value)?,
            };
            buffer.set_byte(index, value)?;
            Value::Null
        }
        Op::GetBytes => {
            let start = byte_bound(args, 0, "Start byte")?;
            let end = byte_bound(args, 1, "End byte")?;
            buffer.get_bytes(start, end)?.to_vec().into()
        }
        Op::SetBytes => {
            let start = byte_bound(args, 0, "Start byte")?;
            let end = byte_bound(args, 1, "End byte")?;
            let values = array_arg(args, 2, "Byte values")?;
            let values = values
                .iter()
                .map(byte_value)
                .collect::<Result<Vec<_>, _>>()?;
            buffer.set_bytes(start, end, &values)?;
            Value::Null
        }
        Op::Bytes => buffer.as_bytes().to_vec().into(),
        Op::Checksum => buffer.checksum()?.into(),
        Op::ValidateChecksum => {
            buffer.validate_checksum()?;
            Value::Null
        }
        Op::FixChecksum => {
            buffer.fix_checksum()?;
            Value::Null
        }
        Op::RotateLeft => {
            buffer.rotate_left()?;
            Value::Null
        }
        Op::RotateRight => {
            buffer.rotate_right()?;
            Value::Null
        }
        Op::RotateLeftByCounter => {
            buffer.rotate_left_by_counter()?;
            Value::Null
        }
        Op::RotateRightByCounter => {
            buffer.rotate_right_by_counter()?;
            Value::Null
        }
    };
    Ok(ret)
}

/// Bit indices are required arguments.
fn bit_index(args: &[Value], pos: usize) -> Result<usize, BitBufferError> {
    match args.get(pos) {
        None | Some(Value::Null) => Err(BitBufferError::MissingArgument("a bit index")),
        Some(value) => index(value, "Bit index"),
    }
}

fn bit_value(args: &[Value], pos: usize) -> Result<bool, BitBufferError> {
    match args.get(pos) {
        None | Some(Value::Null) => Err(BitBufferError::MissingArgument("a bit value")),
        Some(value) => Ok(truthy(value)),
    }
}

/// Byte bounds report a missing value as not being a number.
fn byte_bound(args: &[Value], pos: usize, name: &'static str) -> Result<usize, BitBufferError> {
    match args.get(pos) {
        None => Err(BitBufferError::NotANumber(name)),
        Some(value) => index(value, name),
    }
}

fn array_arg<'a>(
    args: &'a [Value],
    pos: usize,
    name: &'static str,
) -> Result<&'a [Value], BitBufferError> {
    match args.get(pos) {
        Some(Value::Array(values)) => Ok(values),
        _ => Err(BitBufferError::NotAnArray(name)),
    }
}

fn index_list(values: &[Value], name: &'static str) -> Result<Vec<usize>, BitBufferError> {
    values.iter().map(|value| index(value, name)).collect()
}

/// Only non-negative integers are indices.
fn index(value: &Value, name: &'static str) -> Result<usize, BitBufferError> {
    value
        .as_u64()
        .and_then(|idx| usize::try_from(idx).ok())
        .ok_or(BitBufferError::NotANumber(name))
}

fn byte_value(value: &Value) -> Result<u8, BitBufferError> {
    value
        .as_u64()
        .and_then(|byte| u8::try_from(byte).ok())
        .ok_or(BitBufferError::NotByteValues)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
