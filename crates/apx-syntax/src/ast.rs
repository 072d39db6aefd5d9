use std::fmt;

/// Packed width in bytes of the `S` scalar.
pub const SCALAR_WIDTH: u32 = 4;
/// Smallest value accepted for a scalar (signed 32-bit).
pub const SCALAR_MIN: i64 = i32::MIN as i64;
/// Largest value accepted for a scalar (unsigned 32-bit).
pub const SCALAR_MAX: i64 = u32::MAX as i64;

/// Canonical description of a data type, as produced by the signature parser.
///
/// References are kept symbolic; they are resolved by the type registry of the
/// node that owns the signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// `C(min,max)`
    IntegerRange(IntRange),
    /// `c`, `s`, `l`, `q`, `B`, `L` and `Q`, optionally with limits
    Integer(FixedInt),
    /// `b`
    Bool,
    /// `S`
    Scalar,
    /// `a[N]`
    String { len: u32 },
    /// `A[N]`, `u[N]` and `U[N]`
    Text { unit: CharUnit, len: u32 },
    /// `{"field"<sig>...}`
    Record(Vec<RecordField>),
    /// `<sig>[N]`
    Array { element: Box<TypeDescriptor>, len: u32 },
    /// `T["Name"]` or `T[index]`
    Reference(TypeRef),
}

/// Inclusive integer bounds of a `C(min,max)` signature.
///
/// The range validates literal values only; packed data stores the raw value
/// without any bias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

/// Integer type codes with a fixed packed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerType {
    /// `B`
    Byte,
    /// `c`
    Int8,
    /// `s`
    Int16,
    /// `l`
    Int32,
    /// `q`
    Int64,
    /// `L`
    UInt32,
    /// `Q`
    UInt64,
}

impl IntegerType {
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "B" => IntegerType::Byte,
            "c" => IntegerType::Int8,
            "s" => IntegerType::Int16,
            "l" => IntegerType::Int32,
            "q" => IntegerType::Int64,
            "L" => IntegerType::UInt32,
            "Q" => IntegerType::UInt64,
            _ => return None,
        })
    }

    pub fn code(self) -> char {
        match self {
            IntegerType::Byte => 'B',
            IntegerType::Int8 => 'c',
            IntegerType::Int16 => 's',
            IntegerType::Int32 => 'l',
            IntegerType::Int64 => 'q',
            IntegerType::UInt32 => 'L',
            IntegerType::UInt64 => 'Q',
        }
    }

    pub fn width(self) -> u32 {
        match self {
            IntegerType::Byte | IntegerType::Int8 => 1,
            IntegerType::Int16 => 2,
            IntegerType::Int32 | IntegerType::UInt32 => 4,
            IntegerType::Int64 | IntegerType::UInt64 => 8,
        }
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            IntegerType::Int8 | IntegerType::Int16 | IntegerType::Int32 | IntegerType::Int64
        )
    }

    /// Smallest and largest value the type can store.
    pub fn bounds(self) -> (i128, i128) {
        let bits = 8 * self.width();
        if self.is_signed() {
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        } else {
            (0, (1i128 << bits) - 1)
        }
    }
}

/// A fixed-width integer with optional `(min,max)` limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedInt {
    pub ty: IntegerType,
    pub limits: Option<(i128, i128)>,
}

impl FixedInt {
    pub fn new(ty: IntegerType) -> Self {
        FixedInt { ty, limits: None }
    }

    /// Returns `None` unless `min <= max` and both fit the type.
    pub fn with_limits(ty: IntegerType, min: i128, max: i128) -> Option<Self> {
        let (lower, upper) = ty.bounds();
        if min > max || min < lower || max > upper {
            return None;
        }
        Some(FixedInt {
            ty,
            limits: Some((min, max)),
        })
    }

    /// The declared limits, or the full range of the type.
    pub fn bounds(&self) -> (i128, i128) {
        self.limits.unwrap_or_else(|| self.ty.bounds())
    }

    pub fn contains(&self, value: i128) -> bool {
        let (min, max) = self.bounds();
        min <= value && value <= max
    }
}

/// Code unit of a character string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharUnit {
    /// `A`, UTF-8
    Char8,
    /// `u`, UTF-16
    Char16,
    /// `U`, UTF-32
    Char32,
}

impl CharUnit {
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "A" => CharUnit::Char8,
            "u" => CharUnit::Char16,
            "U" => CharUnit::Char32,
            _ => return None,
        })
    }

    pub fn code(self) -> char {
        match self {
            CharUnit::Char8 => 'A',
            CharUnit::Char16 => 'u',
            CharUnit::Char32 => 'U',
        }
    }

    pub fn width(self) -> u32 {
        match self {
            CharUnit::Char8 => 1,
            CharUnit::Char16 => 2,
            CharUnit::Char32 => 4,
        }
    }

    /// Encodes `text` as code units of this width.
    pub fn encode(self, text: &str) -> Vec<u32> {
        match self {
            CharUnit::Char8 => text.bytes().map(u32::from).collect(),
            CharUnit::Char16 => text.encode_utf16().map(u32::from).collect(),
            CharUnit::Char32 => text.chars().map(u32::from).collect(),
        }
    }
}

/// Symbolic reference to a named data type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Name(String),
    Index(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordField {
    pub name: String,
    pub ty: TypeDescriptor,
}

impl IntRange {
    /// Range of a bare `C`.
    pub const UINT8: IntRange = IntRange { min: 0, max: 255 };

    /// Creates a range, returning `None` if `min > max`, if either bound falls
    /// outside `[i32::MIN, u32::MAX]` or if the span does not fit in 32 bits.
    pub fn new(min: i64, max: i64) -> Option<Self> {
        if min > max || min < SCALAR_MIN || max > SCALAR_MAX {
            return None;
        }
        if (max - min) as u64 > u32::MAX as u64 {
            return None;
        }
        Some(IntRange { min, max })
    }

    /// Smallest of 1, 2 or 4 bytes whose unsigned range covers `max - min`.
    pub fn packed_width(&self) -> u32 {
        let span = (self.max - self.min) as u64;
        if span <= u8::MAX as u64 {
            1
        } else if span <= u16::MAX as u64 {
            2
        } else {
            4
        }
    }

    pub fn contains(&self, value: i128) -> bool {
        i128::from(self.min) <= value && value <= i128::from(self.max)
    }

    pub fn is_signed(&self) -> bool {
        self.min < 0
    }

    /// Whether both raw bounds can be stored in [`packed_width`](Self::packed_width)
    /// bytes. Values are packed without bias, so a range such as `C(1000,1010)`
    /// gets one byte but its values do not fit in it.
    pub fn raw_bounds_fit(&self) -> bool {
        let bits = 8 * self.packed_width();
        if self.is_signed() {
            let limit = 1i64 << (bits - 1);
            -limit <= self.min && self.max < limit
        } else {
            (self.max as u64) <= (1u64 << bits) - 1
        }
    }
}

impl TypeDescriptor {
    /// Short name of the descriptor kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeDescriptor::IntegerRange(_) => "integer range",
            TypeDescriptor::Integer(_) => "integer",
            TypeDescriptor::Bool => "bool",
            TypeDescriptor::Scalar => "scalar",
            TypeDescriptor::String { .. } | TypeDescriptor::Text { .. } => "string",
            TypeDescriptor::Record(_) => "record",
            TypeDescriptor::Array { .. } => "array",
            TypeDescriptor::Reference(_) => "reference",
        }
    }

    /// Visits every type reference nested in this descriptor, depth first.
    pub fn for_each_reference<'a>(&'a self, f: &mut impl FnMut(&'a TypeRef)) {
        match self {
            TypeDescriptor::Reference(type_ref) => f(type_ref),
            TypeDescriptor::Record(fields) => {
                for field in fields {
                    field.ty.for_each_reference(f);
                }
            }
            TypeDescriptor::Array { element, .. } => element.for_each_reference(f),
            TypeDescriptor::IntegerRange(_)
            | TypeDescriptor::Integer(_)
            | TypeDescriptor::Bool
            | TypeDescriptor::Scalar
            | TypeDescriptor::String { .. }
            | TypeDescriptor::Text { .. } => {}
        }
    }

    /// Collects the nested type references in visiting order.
    pub fn references(&self) -> Vec<&TypeRef> {
        let mut refs = Vec::new();
        self.for_each_reference(&mut |r| refs.push(r));
        refs
    }

    /// Returns a copy with every reference rewritten by `f`.
    pub fn map_references(&self, f: &mut impl FnMut(&TypeRef) -> TypeRef) -> TypeDescriptor {
        match self {
            TypeDescriptor::Reference(type_ref) => TypeDescriptor::Reference(f(type_ref)),
            TypeDescriptor::Record(fields) => TypeDescriptor::Record(
                fields
                    .iter()
                    .map(|field| RecordField {
                        name: field.name.clone(),
                        ty: field.ty.map_references(f),
                    })
                    .collect(),
            ),
            TypeDescriptor::Array { element, len } => TypeDescriptor::Array {
                element: Box::new(element.map_references(f)),
                len: *len,
            },
            TypeDescriptor::IntegerRange(_)
            | TypeDescriptor::Integer(_)
            | TypeDescriptor::Bool
            | TypeDescriptor::Scalar
            | TypeDescriptor::String { .. }
            | TypeDescriptor::Text { .. } => self.clone(),
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in text.chars() {
        if c == '"' || c == '\\' {
            write!(f, "\\")?;
        }
        write!(f, "{}", c)?;
    }
    write!(f, "\"")
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Name(name) => {
                write!(f, "T[")?;
                write_quoted(f, name)?;
                write!(f, "]")
            }
            TypeRef::Index(index) => write!(f, "T[{}]", index),
        }
    }
}

/// Prints the canonical signature; parsing the output yields an equal descriptor.
impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::IntegerRange(range) => write!(f, "C({},{})", range.min, range.max),
            TypeDescriptor::Integer(int) => {
                write!(f, "{}", int.ty.code())?;
                if let Some((min, max)) = int.limits {
                    write!(f, "({},{})", min, max)?;
                }
                Ok(())
            }
            TypeDescriptor::Bool => write!(f, "b"),
            TypeDescriptor::Scalar => write!(f, "S"),
            TypeDescriptor::String { len } => write!(f, "a[{}]", len),
            TypeDescriptor::Text { unit, len } => write!(f, "{}[{}]", unit.code(), len),
            TypeDescriptor::Record(fields) => {
                write!(f, "{{")?;
                for field in fields {
                    write_quoted(f, &field.name)?;
                    write!(f, "{}", field.ty)?;
                }
                write!(f, "}}")
            }
            TypeDescriptor::Array { element, len } => write!(f, "{}[{}]", element, len),
            TypeDescriptor::Reference(type_ref) => write!(f, "{}", type_ref),
        }
    }
}

/// Literal value of an init attribute (`=3`, `="abc"`, `={1, 2}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Integer(i128),
    String(String),
    List(Vec<Literal>),
}

impl Literal {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Literal::Integer(_) => "integer",
            Literal::String(_) => "string",
            Literal::List(_) => "list",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(value) => write!(f, "{}", value),
            Literal::String(text) => write_quoted(f, text),
            Literal::List(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Attributes attached to a port: `=<init>`, `Q[N]` and `P`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortAttributes {
    pub init_value: Option<Literal>,
    /// Maximum number of queued elements of a queued port.
    pub queue_length: Option<u32>,
    pub is_parameter: bool,
}

impl PortAttributes {
    pub fn is_empty(&self) -> bool {
        self.init_value.is_none() && self.queue_length.is_none() && !self.is_parameter
    }
}

/// Prints the attribute list without the leading `:` (`=3,P`, `Q[10]`).
impl fmt::Display for PortAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut items = Vec::new();
        if let Some(init) = &self.init_value {
            items.push(format!("={}", init));
        }
        if let Some(len) = self.queue_length {
            items.push(format!("Q[{}]", len));
        }
        if self.is_parameter {
            items.push("P".to_string());
        }
        write!(f, "{}", items.join(","))
    }
}

/// Attributes attached to a data type. Only value tables are understood.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeAttributes {
    pub value_table: Vec<String>,
}

impl TypeAttributes {
    pub fn is_empty(&self) -> bool {
        self.value_table.is_empty()
    }
}

impl fmt::Display for TypeAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value_table.is_empty() {
            return Ok(());
        }
        write!(f, "VT(")?;
        for (i, label) in self.value_table.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write_quoted(f, label)?;
        }
        write!(f, ")")
    }
}
