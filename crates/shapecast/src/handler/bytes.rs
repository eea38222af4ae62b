// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bulk path for rank-1 `u8` sequences (`Vec<u8>`, `Box<[u8]>`, `[u8; N]`).
//!
//! Detected by `TypeId` when the handler is built. Values cross the backend
//! boundary as one `Vec<u8>` instead of one Field call per byte.

use super::{element_create, element_describe, member_fn, prop_fn, Ops, Place, TypeHandler};
use crate::contract::Inspector;
use crate::error::{Error, Result};
use crate::Inspect;
use std::any::{Any, TypeId};

/// Conversions between a byte container and `Vec<u8>`.
pub(crate) struct ByteCodec<T> {
    /// Move the bytes out (the value may be left empty).
    pub(crate) take: fn(&mut T) -> Vec<u8>,
    /// Rebuild the container from backend bytes.
    pub(crate) make: fn(Vec<u8>) -> Result<T>,
}

pub(crate) fn is_byte<E: 'static>() -> bool {
    TypeId::of::<E>() == TypeId::of::<u8>()
}

/// Copy out a slice whose element type is `u8` at runtime.
pub(crate) fn collect_bytes<E: 'static>(elements: &[E]) -> Vec<u8> {
    elements
        .iter()
        .filter_map(|e| (e as &dyn Any).downcast_ref::<u8>().copied())
        .collect()
}

/// Reinterpret backend bytes as `Vec<E>` where `E` is `u8` at runtime.
pub(crate) fn into_elements<E: 'static>(bytes: Vec<u8>) -> Result<Vec<E>> {
    let boxed: Box<dyn Any> = Box::new(bytes);
    boxed
        .downcast::<Vec<E>>()
        .map(|elements| *elements)
        .map_err(|_| Error::TypeMismatch {
            expected: std::any::type_name::<E>().to_string(),
            found: "u8".to_string(),
        })
}

pub(crate) fn byte_ops<T: Inspect>(codec: ByteCodec<T>) -> Ops<T> {
    let ByteCodec { take, make } = codec;

    let member = member_fn(
        move |_: &TypeHandler<T>,
              inspector: &mut dyn Inspector,
              name: &str,
              mut place: Place<'_, T>| {
            let mut bytes = place.get_mut().map(take).unwrap_or_default();
            if let Err(err) = inspector.byte_array(name, &mut bytes) {
                // Backend error wins; the taken bytes go back when they still fit.
                let occupied = place.get_mut().is_some();
                if let (true, Ok(value)) = (occupied, make(bytes)) {
                    place.put(value);
                }
                return Err(err);
            }
            place.put(make(bytes)?);
            Ok(())
        },
    );
    let prop = prop_fn(
        move |_: &TypeHandler<T>,
              inspector: &mut dyn Inspector,
              name: &str,
              value: T,
              set: &mut dyn FnMut(T)| {
            let mut value = value;
            let mut bytes = take(&mut value);
            inspector.byte_array(name, &mut bytes)?;
            set(make(bytes)?);
            Ok(())
        },
    );
    Ops {
        member,
        prop,
        describe: element_describe(),
        create: Some(element_create()),
        children: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache;
    use crate::contract::{Context, NullableSlot, ObjectSlot, ScalarMut, TypedSlot};

    /// Backend that rejects every byte payload.
    #[derive(Default)]
    struct RejectBytes {
        context: Context,
    }

    impl Inspector for RejectBytes {
        fn field(&mut self, _name: &str, _value: ScalarMut<'_>) -> Result<()> {
            Ok(())
        }
        fn nullable_field(&mut self, _name: &str, _slot: &mut dyn NullableSlot) -> Result<()> {
            Ok(())
        }
        fn object_field(&mut self, _name: &str, _slot: &mut dyn ObjectSlot) -> Result<()> {
            Ok(())
        }
        fn typed_field(&mut self, _name: &str, _slot: &mut dyn TypedSlot) -> Result<()> {
            Ok(())
        }
        fn begin_array(&mut self, _lengths: &mut [usize]) -> Result<()> {
            Ok(())
        }
        fn enter_array_level(&mut self, _rank: usize) -> Result<()> {
            Ok(())
        }
        fn leave_array_level(&mut self, _rank: usize) -> Result<()> {
            Ok(())
        }
        fn byte_array(&mut self, name: &str, _bytes: &mut Vec<u8>) -> Result<()> {
            Err(Error::Backend(format!("stream closed at {name}")))
        }
        fn context(&mut self) -> &mut Context {
            &mut self.context
        }
    }

    #[test]
    fn test_backend_error_is_not_masked_by_length_check() {
        let handler = cache::handler::<[u8; 4]>().expect("fixed bytes");
        let err = handler
            .create_field(&mut RejectBytes::default(), "raw")
            .expect_err("backend rejects bytes");
        assert_eq!(err, Error::Backend("stream closed at raw".into()));
    }

    #[test]
    fn test_failed_write_leaves_value_intact() {
        let handler = cache::handler::<Vec<u8>>().expect("byte vec");
        let mut payload = vec![9u8, 8, 7];
        let err = handler
            .field(&mut RejectBytes::default(), "raw", &mut payload)
            .expect_err("backend rejects bytes");
        assert!(matches!(err, Error::Backend(_)));
        assert_eq!(payload, vec![9, 8, 7]);
    }

    #[test]
    fn test_byte_detection() {
        assert!(is_byte::<u8>());
        assert!(!is_byte::<i8>());
    }

    #[test]
    fn test_collect_and_rebuild() {
        let bytes = collect_bytes(&[1u8, 2, 3]);
        assert_eq!(bytes, vec![1, 2, 3]);
        let rebuilt: Vec<u8> = into_elements(bytes).expect("same element type");
        assert_eq!(rebuilt, vec![1, 2, 3]);
        assert!(into_elements::<u16>(vec![1]).is_err());
    }
}
