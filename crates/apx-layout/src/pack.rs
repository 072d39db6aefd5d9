use crate::{LayoutComputer, LayoutError, PortSignal, TypeResolver};
use apx_syntax::{Literal, TypeDescriptor, SCALAR_WIDTH};

fn shape_mismatch(expected: &'static str, found: &Literal) -> LayoutError {
    LayoutError::InitValueShape {
        expected,
        found: found.kind_name(),
    }
}

impl<'r, R: TypeResolver + ?Sized> LayoutComputer<'r, R> {
    /// Packs the init values of a sequence of ports into one buffer, following
    /// the same order and widths as [`compute_signal_layout`](Self::compute_signal_layout).
    /// Ports without an init value and queued ports are zero-filled.
    pub fn pack_init_data<'p>(
        &mut self,
        ports: impl IntoIterator<Item = PortSignal<'p>>,
    ) -> Result<Vec<u8>, LayoutError> {
        let mut out = Vec::new();
        for port in ports {
            match (port.init_value, port.queue_length) {
                (Some(value), None) => self.pack_value(port.ty, value, &mut out)?,
                (Some(value), Some(_)) => return Err(shape_mismatch("queue", value)),
                (None, _) => {
                    let width = self.port_width(&port)?;
                    out.resize(out.len() + width as usize, 0);
                }
            }
        }
        Ok(out)
    }

    /// Appends the little-endian encoding of `value` as `ty` to `out`.
    ///
    /// Integers are stored raw and truncated to the packed width. Strings are
    /// truncated or NUL-padded to their declared length in code units.
    pub fn pack_value(
        &mut self,
        ty: &TypeDescriptor,
        value: &Literal,
        out: &mut Vec<u8>,
    ) -> Result<(), LayoutError> {
        match (ty, value) {
            (TypeDescriptor::IntegerRange(range), Literal::Integer(v)) => {
                write_le(out, *v, range.packed_width());
                Ok(())
            }
            (TypeDescriptor::Integer(int), Literal::Integer(v)) => {
                write_le(out, *v, int.ty.width());
                Ok(())
            }
            (TypeDescriptor::Bool, Literal::Integer(v)) => {
                write_le(out, *v, 1);
                Ok(())
            }
            (TypeDescriptor::Scalar, Literal::Integer(v)) => {
                write_le(out, *v, SCALAR_WIDTH);
                Ok(())
            }
            (TypeDescriptor::Text { unit, len }, Literal::String(text)) => {
                let mut units = unit.encode(text);
                units.resize(*len as usize, 0);
                for code in units {
                    write_le(out, i128::from(code), unit.width());
                }
                Ok(())
            }
            (TypeDescriptor::String { len }, Literal::String(text)) => {
                let len = *len as usize;
                let bytes = text.as_bytes();
                let used = bytes.len().min(len);
                out.extend_from_slice(&bytes[..used]);
                out.resize(out.len() + (len - used), 0);
                Ok(())
            }
            (TypeDescriptor::Record(fields), Literal::List(items)) => {
                if fields.len() != items.len() {
                    return Err(shape_mismatch("record", value));
                }
                for (field, item) in fields.iter().zip(items) {
                    self.pack_value(&field.ty, item, out)?;
                }
                Ok(())
            }
            (TypeDescriptor::Array { element, len }, Literal::List(items)) => {
                if items.len() != *len as usize {
                    return Err(shape_mismatch("array", value));
                }
                for item in items {
                    self.pack_value(element, item, out)?;
                }
                Ok(())
            }
            (TypeDescriptor::Reference(type_ref), _) => {
                let (_, target) = self.resolve(type_ref)?;
                self.pack_value(target, value, out)
            }
            (ty, value) => Err(shape_mismatch(ty.kind_name(), value)),
        }
    }
}

fn write_le(out: &mut Vec<u8>, value: i128, width: u32) {
    out.extend_from_slice(&value.to_le_bytes()[..width as usize]);
}
