// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # In-memory backend
//!
//! [`ValueWriter`] records a Describe walk as a [`Value`] tree and
//! [`ValueReader`] replays a tree into Create (or into Describe of an
//! existing value). Together they give a lossless round trip for every
//! supported shape and serve as the reference implementation of
//! [`Inspector`].
//!
//! ```rust
//! use shapecast::{from_value, to_value, Inspect};
//!
//! #[derive(Inspect, Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let mut point = Point { x: 3, y: 4 };
//! let tree = to_value(&mut point).unwrap();
//! let back: Point = from_value(&tree).unwrap();
//! assert_eq!(back, point);
//! ```
//!
//! Every walk starts by registering the root as a member named
//! [`ELEMENT_NAME`], so the root is handled exactly like any nested member.

use crate::cache;
use crate::config::{DEFAULT_VERSION, ELEMENT_NAME};
use crate::contract::{Context, Inspector, NullableSlot, ObjectSlot, ScalarMut, ScalarValue, TypedSlot};
use crate::error::{Error, Result};
use crate::Inspect;
use std::collections::VecDeque;
use std::mem;

/// Backend-neutral value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent nullable member.
    Null,
    Scalar(ScalarValue),
    Bytes(Vec<u8>),
    /// Array or collection; `items` are row-major.
    Array { lengths: Vec<usize>, items: Vec<Value> },
    /// Record walked at `version`.
    Object {
        type_name: String,
        version: u32,
        members: Vec<(String, Value)>,
    },
    /// Polymorphic member holding a value of runtime type `type_name`.
    Typed {
        type_name: String,
        version: u32,
        value: Box<Value>,
    },
}

impl Value {
    /// First member called `name` of an object.
    pub fn member(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Object { members, .. } => members
                .iter()
                .find(|(member, _)| member == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Value::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Record `value` as a tree.
pub fn to_value<T: Inspect>(value: &mut T) -> Result<Value> {
    let mut writer = ValueWriter::new();
    cache::handler::<T>()?.field(&mut writer, ELEMENT_NAME, value)?;
    writer.finish()
}

/// Build a fresh `T` from `tree`.
pub fn from_value<T: Inspect>(tree: &Value) -> Result<T> {
    let mut reader = ValueReader::new(tree.clone());
    let value = cache::handler::<T>()?.create_field(&mut reader, ELEMENT_NAME)?;
    reader.finish()?;
    Ok(value)
}

/// Overwrite `value` in place from `tree`.
pub fn read_into<T: Inspect>(value: &mut T, tree: &Value) -> Result<()> {
    let mut reader = ValueReader::new(tree.clone());
    cache::handler::<T>()?.field(&mut reader, ELEMENT_NAME, value)?;
    reader.finish()
}

#[derive(Default)]
struct WriteFrame {
    members: Vec<(String, Value)>,
    lengths: Option<Vec<usize>>,
}

impl WriteFrame {
    fn close(self, type_name: &str, version: u32) -> Value {
        match self.lengths {
            Some(lengths) => Value::Array {
                lengths,
                items: self.members.into_iter().map(|(_, value)| value).collect(),
            },
            None => Value::Object {
                type_name: type_name.to_string(),
                version,
                members: self.members,
            },
        }
    }
}

/// Describe-side backend producing a [`Value`].
pub struct ValueWriter {
    frames: Vec<WriteFrame>,
    context: Context,
}

impl Default for ValueWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![WriteFrame::default()],
            context: Context::new(),
        }
    }

    /// The single root member, once the walk is done.
    pub fn finish(mut self) -> Result<Value> {
        let root = self.frames.pop().filter(|_| self.frames.is_empty());
        match root.map(|frame| frame.members) {
            Some(mut members) if members.len() == 1 => Ok(members.remove(0).1),
            Some(members) => Err(Error::backend(format!(
                "expected one root member, recorded {}",
                members.len()
            ))),
            None => Err(Error::backend("unbalanced object frames")),
        }
    }

    fn push(&mut self, name: &str, value: Value) -> Result<()> {
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| Error::backend("no open frame"))?;
        frame.members.push((name.to_string(), value));
        Ok(())
    }

    fn pop(&mut self) -> Result<WriteFrame> {
        if self.frames.len() < 2 {
            return Err(Error::backend("frame stack underflow"));
        }
        self.frames
            .pop()
            .ok_or_else(|| Error::backend("frame stack underflow"))
    }
}

impl Inspector for ValueWriter {
    fn field(&mut self, name: &str, value: ScalarMut<'_>) -> Result<()> {
        self.push(name, Value::Scalar(value.get()))
    }

    fn nullable_field(&mut self, name: &str, slot: &mut dyn NullableSlot) -> Result<()> {
        if slot.is_present() {
            slot.value(self)
        } else {
            self.push(name, Value::Null)
        }
    }

    fn object_field(&mut self, name: &str, slot: &mut dyn ObjectSlot) -> Result<()> {
        let version = slot.latest_version();
        self.frames.push(WriteFrame::default());
        slot.describe(self, version)?;
        let value = self.pop()?.close(&slot.names().short, version);
        self.push(name, value)
    }

    fn typed_field(&mut self, name: &str, slot: &mut dyn TypedSlot) -> Result<()> {
        let Some(concrete) = slot.concrete() else {
            return self.push(name, Value::Null);
        };
        let version = slot.latest_version()?;
        self.frames.push(WriteFrame::default());
        slot.describe(self, version)?;
        let inner = self.pop()?.close(&concrete.short, version);
        self.push(
            name,
            Value::Typed {
                type_name: concrete.full.clone(),
                version,
                value: Box::new(inner),
            },
        )
    }

    fn begin_array(&mut self, lengths: &mut [usize]) -> Result<()> {
        let frame = self
            .frames
            .last_mut()
            .ok_or_else(|| Error::backend("no open frame"))?;
        frame.lengths = Some(lengths.to_vec());
        Ok(())
    }

    fn enter_array_level(&mut self, _rank: usize) -> Result<()> {
        Ok(())
    }

    fn leave_array_level(&mut self, _rank: usize) -> Result<()> {
        Ok(())
    }

    fn byte_array(&mut self, name: &str, bytes: &mut Vec<u8>) -> Result<()> {
        self.push(name, Value::Bytes(bytes.clone()))
    }

    fn context(&mut self) -> &mut Context {
        &mut self.context
    }
}

#[derive(Default)]
struct ReadFrame {
    members: VecDeque<(String, Value)>,
    array: Option<(Vec<usize>, Vec<Value>)>,
}

impl ReadFrame {
    fn open(value: Value) -> (Self, u32) {
        match value {
            Value::Object {
                version, members, ..
            } => (
                Self {
                    members: members.into(),
                    array: None,
                },
                version,
            ),
            Value::Array { lengths, items } => (
                Self {
                    members: VecDeque::new(),
                    array: Some((lengths, items)),
                },
                DEFAULT_VERSION,
            ),
            other => (
                Self {
                    members: VecDeque::from([(ELEMENT_NAME.to_string(), other)]),
                    array: None,
                },
                DEFAULT_VERSION,
            ),
        }
    }
}

/// Create-side backend consuming a [`Value`].
pub struct ValueReader {
    frames: Vec<ReadFrame>,
    context: Context,
}

impl ValueReader {
    /// Reader whose root member is `tree`.
    #[must_use]
    pub fn new(tree: Value) -> Self {
        Self {
            frames: vec![ReadFrame {
                members: VecDeque::from([(ELEMENT_NAME.to_string(), tree)]),
                array: None,
            }],
            context: Context::new(),
        }
    }

    /// Fail if any part of the tree was left unread.
    pub fn finish(mut self) -> Result<()> {
        match self.frames.pop() {
            Some(root) if self.frames.is_empty() => unread(&root),
            _ => Err(Error::backend("unbalanced object frames")),
        }
    }

    fn top(&mut self) -> Result<&mut ReadFrame> {
        self.frames
            .last_mut()
            .ok_or_else(|| Error::backend("no open frame"))
    }

    fn next(&mut self, name: &str) -> Result<Value> {
        let (found, value) = self
            .top()?
            .members
            .pop_front()
            .ok_or_else(|| Error::backend(format!("member '{name}' missing from tree")))?;
        if found != name {
            return Err(Error::backend(format!(
                "expected member '{name}', found '{found}'"
            )));
        }
        Ok(value)
    }

    fn pop(&mut self) -> Result<()> {
        if self.frames.len() < 2 {
            return Err(Error::backend("frame stack underflow"));
        }
        match self.frames.pop() {
            Some(frame) => unread(&frame),
            None => Err(Error::backend("frame stack underflow")),
        }
    }
}

fn unread(frame: &ReadFrame) -> Result<()> {
    match frame.members.front() {
        None => Ok(()),
        Some((name, _)) => Err(Error::backend(format!(
            "{} unread members starting at '{name}'",
            frame.members.len()
        ))),
    }
}

fn mismatch(expected: &str, found: &Value) -> Error {
    let found = match found {
        Value::Null => "null",
        Value::Scalar(value) => value.kind().name(),
        Value::Bytes(_) => "bytes",
        Value::Array { .. } => "array",
        Value::Object { .. } => "object",
        Value::Typed { .. } => "typed object",
    };
    Error::TypeMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

impl Inspector for ValueReader {
    fn field(&mut self, name: &str, value: ScalarMut<'_>) -> Result<()> {
        let mut value = value;
        match self.next(name)? {
            Value::Scalar(stored) => value.set(stored),
            other => Err(mismatch(value.kind().name(), &other)),
        }
    }

    fn nullable_field(&mut self, name: &str, slot: &mut dyn NullableSlot) -> Result<()> {
        let absent = matches!(self.top()?.members.front(), Some((_, Value::Null)));
        if absent {
            self.next(name)?;
            slot.clear();
            return Ok(());
        }
        slot.value(self)
    }

    fn object_field(&mut self, name: &str, slot: &mut dyn ObjectSlot) -> Result<()> {
        let stored = self.next(name)?;
        if matches!(stored, Value::Null | Value::Scalar(_) | Value::Typed { .. }) {
            return Err(mismatch(&slot.names().full, &stored));
        }
        let (frame, version) = ReadFrame::open(stored);
        self.frames.push(frame);
        if slot.is_present() {
            slot.describe(self, version)?;
        } else {
            slot.create(self, version)?;
        }
        self.pop()
    }

    fn typed_field(&mut self, name: &str, slot: &mut dyn TypedSlot) -> Result<()> {
        let (type_name, version, inner) = match self.next(name)? {
            Value::Typed {
                type_name,
                version,
                value,
            } => (type_name, version, *value),
            other => return Err(mismatch(&slot.declared().full, &other)),
        };
        let (frame, _) = ReadFrame::open(inner);
        self.frames.push(frame);
        let same_type = slot
            .concrete()
            .is_some_and(|concrete| concrete.matches(&type_name));
        if same_type {
            slot.describe(self, version)?;
        } else {
            slot.create_as(&type_name, self, version)?;
        }
        self.pop()
    }

    fn begin_array(&mut self, lengths: &mut [usize]) -> Result<()> {
        let frame = self.top()?;
        let (stored, items) = frame
            .array
            .take()
            .ok_or_else(|| Error::backend("array extents requested outside an array"))?;
        if stored.len() != lengths.len() {
            return Err(Error::LengthMismatch {
                type_name: "array rank".to_string(),
                expected: lengths.len(),
                found: stored.len(),
            });
        }
        lengths.copy_from_slice(&stored);
        frame.members = items
            .into_iter()
            .map(|item| (ELEMENT_NAME.to_string(), item))
            .collect();
        Ok(())
    }

    fn enter_array_level(&mut self, _rank: usize) -> Result<()> {
        Ok(())
    }

    fn leave_array_level(&mut self, _rank: usize) -> Result<()> {
        Ok(())
    }

    fn byte_array(&mut self, name: &str, bytes: &mut Vec<u8>) -> Result<()> {
        match self.next(name)? {
            Value::Bytes(stored) => {
                let _previous = mem::replace(bytes, stored);
                Ok(())
            }
            other => Err(mismatch("bytes", &other)),
        }
    }

    fn context(&mut self) -> &mut Context {
        &mut self.context
    }
}
