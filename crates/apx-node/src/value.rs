use crate::error::{NodeError, NodeResult};
use crate::registry::TypeRegistry;
use apx_syntax::{Literal, TypeDescriptor, SCALAR_MAX, SCALAR_MIN};

/// Checks an init value against the effective type of a port.
pub(crate) fn check_init_value(
    registry: &TypeRegistry,
    port: &str,
    descriptor: &TypeDescriptor,
    value: &Literal,
) -> NodeResult<()> {
    let out_of_range = |value: &Literal, bounds: String| NodeError::DefaultValueOutOfRange {
        port: port.to_string(),
        value: value.to_string(),
        bounds,
    };
    let mismatch = |expected: String, found: String| NodeError::DefaultValueTypeMismatch {
        port: port.to_string(),
        expected,
        found,
    };

    match (descriptor, value) {
        (TypeDescriptor::IntegerRange(range), Literal::Integer(v)) => {
            if range.contains(*v) {
                Ok(())
            } else {
                Err(out_of_range(value, format!("a value in [{}, {}]", range.min, range.max)))
            }
        }
        (TypeDescriptor::Integer(int), Literal::Integer(v)) => {
            if int.contains(*v) {
                Ok(())
            } else {
                let (min, max) = int.bounds();
                Err(out_of_range(value, format!("a value in [{}, {}]", min, max)))
            }
        }
        (TypeDescriptor::Bool, Literal::Integer(v)) => {
            if *v == 0 || *v == 1 {
                Ok(())
            } else {
                Err(out_of_range(value, "0 or 1".to_string()))
            }
        }
        (TypeDescriptor::Scalar, Literal::Integer(v)) => {
            if (i128::from(SCALAR_MIN)..=i128::from(SCALAR_MAX)).contains(v) {
                Ok(())
            } else {
                Err(out_of_range(value, format!("a value in [{}, {}]", SCALAR_MIN, SCALAR_MAX)))
            }
        }
        (TypeDescriptor::String { len }, Literal::String(text)) => {
            if text.len() <= *len as usize {
                Ok(())
            } else {
                Err(out_of_range(value, format!("a string of at most {} bytes", len)))
            }
        }
        (TypeDescriptor::Text { unit, len }, Literal::String(text)) => {
            if unit.encode(text).len() <= *len as usize {
                Ok(())
            } else {
                Err(out_of_range(value, format!("a string of at most {} code units", len)))
            }
        }
        (TypeDescriptor::Array { element, len }, Literal::List(items)) => {
            if items.len() != *len as usize {
                return Err(mismatch(
                    format!("a list of {} items", len),
                    format!("a list of {} items", items.len()),
                ));
            }
            items
                .iter()
                .try_for_each(|item| check_init_value(registry, port, element, item))
        }
        (TypeDescriptor::Record(fields), Literal::List(items)) => {
            if items.len() != fields.len() {
                return Err(mismatch(
                    format!("a list of {} record fields", fields.len()),
                    format!("a list of {} items", items.len()),
                ));
            }
            fields
                .iter()
                .zip(items)
                .try_for_each(|(field, item)| check_init_value(registry, port, &field.ty, item))
        }
        (TypeDescriptor::Reference(_), _) => {
            let target = registry.resolve_descriptor(descriptor)?;
            check_init_value(registry, port, target, value)
        }
        (descriptor, value) => Err(mismatch(
            descriptor.kind_name().to_string(),
            value.kind_name().to_string(),
        )),
    }
}

/// Logs every integer range of `descriptor` whose raw bounds do not fit the
/// packed width. Such values are truncated when packed.
pub(crate) fn warn_truncated_ranges(owner: &str, descriptor: &TypeDescriptor) {
    match descriptor {
        TypeDescriptor::IntegerRange(range) if !range.raw_bounds_fit() => {
            log::warn!(
                "`{}`: range ({},{}) is packed in {} byte(s) but its raw values do not fit; values are truncated",
                owner,
                range.min,
                range.max,
                range.packed_width()
            );
        }
        TypeDescriptor::Record(fields) => {
            for field in fields {
                warn_truncated_ranges(owner, &field.ty);
            }
        }
        TypeDescriptor::Array { element, .. } => warn_truncated_ranges(owner, element),
        _ => {}
    }
}
