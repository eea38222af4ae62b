// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared test backend: records every contract call in order.

#![allow(dead_code)]

use shapecast::{
    Context, Inspect, Inspector, NullableSlot, ObjectSlot, Result, ScalarMut, ScalarValue,
    TypedSlot,
};

/// One recorded contract call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Field(String, ScalarValue),
    Null(String),
    Open { name: String, type_name: String, version: u32 },
    Close(String),
    Typed { name: String, type_name: String },
    Array(Vec<usize>),
    Enter(usize),
    Leave(usize),
    Bytes(String, Vec<u8>),
}

/// Encode-side backend capturing a Describe walk.
#[derive(Default)]
pub struct CallLog {
    pub calls: Vec<Call>,
    pub context: Context,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of every Field call, in order.
    pub fn field_names(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Field(name, _) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Inspector for CallLog {
    fn field(&mut self, name: &str, value: ScalarMut<'_>) -> Result<()> {
        self.calls.push(Call::Field(name.to_string(), value.get()));
        Ok(())
    }

    fn nullable_field(&mut self, name: &str, slot: &mut dyn NullableSlot) -> Result<()> {
        if slot.is_present() {
            return slot.value(self);
        }
        self.calls.push(Call::Null(name.to_string()));
        Ok(())
    }

    fn object_field(&mut self, name: &str, slot: &mut dyn ObjectSlot) -> Result<()> {
        let version = slot.latest_version();
        self.calls.push(Call::Open {
            name: name.to_string(),
            type_name: slot.names().short.clone(),
            version,
        });
        slot.describe(self, version)?;
        self.calls.push(Call::Close(name.to_string()));
        Ok(())
    }

    fn typed_field(&mut self, name: &str, slot: &mut dyn TypedSlot) -> Result<()> {
        let Some(concrete) = slot.concrete() else {
            self.calls.push(Call::Null(name.to_string()));
            return Ok(());
        };
        self.calls.push(Call::Typed {
            name: name.to_string(),
            type_name: concrete.short.clone(),
        });
        let version = slot.latest_version()?;
        slot.describe(self, version)
    }

    fn begin_array(&mut self, lengths: &mut [usize]) -> Result<()> {
        self.calls.push(Call::Array(lengths.to_vec()));
        Ok(())
    }

    fn enter_array_level(&mut self, rank: usize) -> Result<()> {
        self.calls.push(Call::Enter(rank));
        Ok(())
    }

    fn leave_array_level(&mut self, rank: usize) -> Result<()> {
        self.calls.push(Call::Leave(rank));
        Ok(())
    }

    fn byte_array(&mut self, name: &str, bytes: &mut Vec<u8>) -> Result<()> {
        self.calls.push(Call::Bytes(name.to_string(), bytes.clone()));
        Ok(())
    }

    fn context(&mut self) -> &mut Context {
        &mut self.context
    }
}

/// Describe `value` at its latest version into a fresh log.
pub fn describe<T: Inspect>(value: &mut T) -> CallLog {
    let mut log = CallLog::new();
    let handler = shapecast::handler::<T>().expect("handler");
    handler
        .describe(value, &mut log, handler.latest_version())
        .expect("describe");
    log
}
