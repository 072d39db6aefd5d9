use crate::{LayoutComputer, LayoutError, TypeResolver};
use apx_syntax::{Literal, TypeDescriptor};

/// One port as seen by the layout: its name, type, optional init value and
/// optional queue length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSignal<'p> {
    pub name: &'p str,
    pub ty: &'p TypeDescriptor,
    pub init_value: Option<&'p Literal>,
    pub queue_length: Option<u32>,
}

impl<'p> PortSignal<'p> {
    pub fn new(name: &'p str, ty: &'p TypeDescriptor) -> Self {
        PortSignal {
            name,
            ty,
            init_value: None,
            queue_length: None,
        }
    }

    pub fn with_init_value(mut self, init_value: Option<&'p Literal>) -> Self {
        self.init_value = init_value;
        self
    }

    pub fn with_queue_length(mut self, queue_length: Option<u32>) -> Self {
        self.queue_length = queue_length;
        self
    }
}

/// Width of the element counter in front of a queue of `len` elements.
pub fn queue_header_width(len: u32) -> u32 {
    if len <= u8::MAX as u32 {
        1
    } else if len <= u16::MAX as u32 {
        2
    } else {
        4
    }
}

/// Position of one port in its direction's data buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortSlot {
    pub offset: u32,
    pub width: u32,
}

/// Buffer layout of all ports of one direction, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalLayout {
    pub slots: Vec<PortSlot>,
    /// Total buffer size; equals the sum of all slot widths.
    pub size: u32,
}

impl<'r, R: TypeResolver + ?Sized> LayoutComputer<'r, R> {
    /// Lays out ports back to back: each port starts where the previous one
    /// ended and the first one starts at zero.
    ///
    /// A queued port takes a little-endian element counter followed by room
    /// for `queue_length` elements.
    pub fn compute_signal_layout<'p>(
        &mut self,
        ports: impl IntoIterator<Item = PortSignal<'p>>,
    ) -> Result<SignalLayout, LayoutError> {
        let mut layout = SignalLayout::default();
        for port in ports {
            let name = port.name;
            let width = self.port_width(&port).map_err(|err| match err {
                LayoutError::UnresolvedReference { reference } => LayoutError::UnresolvedPortType {
                    port: name.to_string(),
                    reference,
                },
                other => other,
            })?;
            log::debug!("port `{}` at offset {} ({} bytes)", name, layout.size, width);
            layout.slots.push(PortSlot {
                offset: layout.size,
                width,
            });
            layout.size = layout
                .size
                .checked_add(width)
                .ok_or_else(|| LayoutError::WidthOverflow(name.to_string()))?;
        }
        Ok(layout)
    }

    /// Width of a port's slot, including the counter of a queued port.
    pub fn port_width(&mut self, port: &PortSignal<'_>) -> Result<u32, LayoutError> {
        let element = self.packed_width(port.ty)?;
        match port.queue_length {
            None => Ok(element),
            Some(len) => element
                .checked_mul(len)
                .and_then(|data| data.checked_add(queue_header_width(len)))
                .ok_or_else(|| LayoutError::WidthOverflow(port.name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::VecResolver;
    use crate::{queue_header_width, LayoutComputer, LayoutError, PortSignal, PortSlot};
    use apx_syntax::{parse_signature, TypeDescriptor};
    use proptest::prelude::*;

    fn parse_all(sigs: &[&str]) -> Vec<(String, TypeDescriptor)> {
        sigs.iter()
            .enumerate()
            .map(|(i, sig)| (format!("Port{}", i), parse_signature(sig).unwrap()))
            .collect()
    }

    #[test]
    fn test_ports_are_laid_out_in_order() {
        let resolver = VecResolver::new(&[("Mode_T", "C(0,3)")]);
        let ports = parse_all(&[r#"T["Mode_T"]"#, "S", "C(0,1000)", "a[5]"]);
        let layout = LayoutComputer::new(&resolver)
            .compute_signal_layout(ports.iter().map(|(n, t)| PortSignal::new(n, t)))
            .unwrap();
        assert_eq!(
            layout.slots,
            vec![
                PortSlot { offset: 0, width: 1 },
                PortSlot { offset: 1, width: 4 },
                PortSlot { offset: 5, width: 2 },
                PortSlot { offset: 7, width: 5 },
            ]
        );
        assert_eq!(layout.size, 12);
    }

    #[test]
    fn test_queued_port_has_counter_and_elements() {
        let resolver = VecResolver::new(&[]);
        let ports = parse_all(&["C(0,1000)", "S", "C"]);
        let signals = [
            PortSignal::new("Plain", &ports[0].1),
            PortSignal::new("Events", &ports[1].1).with_queue_length(Some(10)),
            PortSignal::new("Wide", &ports[2].1).with_queue_length(Some(300)),
        ];
        let layout = LayoutComputer::new(&resolver).compute_signal_layout(signals).unwrap();
        assert_eq!(
            layout.slots,
            vec![
                PortSlot { offset: 0, width: 2 },
                PortSlot { offset: 2, width: 1 + 4 * 10 },
                PortSlot { offset: 43, width: 2 + 300 },
            ]
        );
        assert_eq!(layout.size, 345);
    }

    #[test]
    fn test_queue_header_width() {
        assert_eq!(queue_header_width(1), 1);
        assert_eq!(queue_header_width(255), 1);
        assert_eq!(queue_header_width(256), 2);
        assert_eq!(queue_header_width(65535), 2);
        assert_eq!(queue_header_width(65536), 4);
    }

    #[test]
    fn test_empty_direction() {
        let resolver = VecResolver::new(&[]);
        let layout = LayoutComputer::new(&resolver)
            .compute_signal_layout(std::iter::empty())
            .unwrap();
        assert!(layout.slots.is_empty());
        assert_eq!(layout.size, 0);
    }

    #[test]
    fn test_unresolved_port_type_names_the_port() {
        let resolver = VecResolver::new(&[]);
        let ports = parse_all(&["S", "T[3]"]);
        let err = LayoutComputer::new(&resolver)
            .compute_signal_layout(ports.iter().map(|(n, t)| PortSignal::new(n, t)))
            .unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnresolvedPortType {
                port: "Port1".to_string(),
                reference: "T[3]".to_string(),
            }
        );
    }

    fn arb_signature() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("S".to_string()),
            Just("C".to_string()),
            (0i64..100_000).prop_map(|max| format!("C(0,{})", max)),
            (1u32..16).prop_map(|n| format!("a[{}]", n)),
            (1u32..4).prop_map(|n| format!("S[{}]", n)),
            Just(r#"{"a"C"b"S}"#.to_string()),
        ]
    }

    proptest! {
        #[test]
        fn prop_layout_is_gapless(sigs in prop::collection::vec(arb_signature(), 0..12)) {
            let resolver = VecResolver::new(&[]);
            let refs: Vec<&str> = sigs.iter().map(|s| s.as_str()).collect();
            let ports = parse_all(&refs);
            let layout = LayoutComputer::new(&resolver)
                .compute_signal_layout(ports.iter().map(|(n, t)| PortSignal::new(n, t)))
                .unwrap();

            let mut expected_offset = 0;
            for slot in &layout.slots {
                prop_assert_eq!(slot.offset, expected_offset);
                expected_offset += slot.width;
            }
            prop_assert_eq!(layout.size, expected_offset);
        }
    }
}
