// cgen.rs - C binding emission for a finalized node
//
// The header declares one typedef per data type, value table constants and
// the accessor prototypes. The source embeds the APX text and the initial
// buffer contents and implements each accessor by packing or unpacking the
// port's bytes at its offset.

use crate::config::GeneratorConfig;
use crate::error::CodegenResult;
use apx_node::{Node, NodeError, NodePort, PortDirection};
use apx_layout::queue_header_width;
use apx_syntax::{CharUnit, IntRange, IntegerType, TypeDescriptor, TypeRef, SCALAR_WIDTH};
use indexmap::IndexSet;
use std::fmt::{self, Write as _};

const SECTION_RULE: &str = "//////////////////////////////////////////////////////////////////////////////";
const INDENT: &str = "   ";
const INIT_DATA_PER_LINE: usize = 8;

// ── Offsets ─────────────────────────────────────────────────────────────────

/// Byte offset expression: a constant plus loop index terms.
#[derive(Debug, Clone, Default)]
struct Offset {
    base: u32,
    terms: Vec<(String, u32)>,
}

impl Offset {
    fn at(base: u32) -> Self {
        Offset {
            base,
            terms: vec![],
        }
    }

    fn add(&self, bytes: u32) -> Self {
        Offset {
            base: self.base + bytes,
            terms: self.terms.clone(),
        }
    }

    fn indexed(&self, var: &str, stride: u32) -> Self {
        let mut terms = self.terms.clone();
        terms.push((var.to_string(), stride));
        Offset {
            base: self.base,
            terms,
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.base != 0 || self.terms.is_empty() {
            parts.push(self.base.to_string());
        }
        for (var, stride) in &self.terms {
            if *stride == 1 {
                parts.push(var.clone());
            } else {
                parts.push(format!("{} * {}u", var, stride));
            }
        }
        write!(f, "{}", parts.join(" + "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Pack,
    Unpack,
}

/// Loop variable and element count of a queued accessor.
const QUEUE_LEN: &str = "queueLen";

// ── Context ─────────────────────────────────────────────────────────────────

pub(crate) struct CodegenCtx<'a> {
    node: &'a Node,
    config: &'a GeneratorConfig,
    /// Base name of generated files and symbols
    name: &'a str,
    includes: &'a [String],
    direct_write: &'a IndexSet<String>,
    /// APX text embedded in the source
    definition: &'a str,
    out: String,
}

impl<'a> CodegenCtx<'a> {
    pub(crate) fn new(
        node: &'a Node,
        config: &'a GeneratorConfig,
        name: &'a str,
        includes: &'a [String],
        direct_write: &'a IndexSet<String>,
        definition: &'a str,
    ) -> Self {
        CodegenCtx {
            node,
            config,
            name,
            includes,
            direct_write,
            definition,
            out: String::new(),
        }
    }

    pub(crate) fn header_file_name(&self) -> String {
        format!("{}{}.h", self.config.file_prefix, self.name)
    }

    pub(crate) fn source_file_name(&self) -> String {
        format!("{}{}.c", self.config.file_prefix, self.name)
    }

    fn section(&mut self, title: &str) {
        let _ = writeln!(self.out, "{}", SECTION_RULE);
        let _ = writeln!(self.out, "// {}", title);
        let _ = writeln!(self.out, "{}", SECTION_RULE);
    }

    // ── Names ───────────────────────────────────────────────────────────

    fn symbol(&self, function: &str) -> String {
        format!("{}{}_{}", self.config.file_prefix, function, self.name)
    }

    fn accessor(&self, port: &NodePort) -> String {
        let function = match port.direction() {
            PortDirection::Provide => "Write",
            PortDirection::Require => "Read",
        };
        format!("{}{}_{}_{}", self.config.file_prefix, function, self.name, port.name())
    }

    fn type_name(&self, type_ref: &TypeRef) -> CodegenResult<&'a str> {
        let node: &'a Node = self.node;
        let types = node.types();
        let id = types.lookup(type_ref)?;
        let data_type = types.get(id).ok_or_else(|| NodeError::UnknownTypeReference {
            reference: type_ref.to_string(),
        })?;
        Ok(data_type.name())
    }

    /// Ports with an inline string, array or record type get their own typedef.
    fn port_typedef_name(&self, port: &NodePort) -> Option<String> {
        match port.descriptor() {
            TypeDescriptor::String { .. }
            | TypeDescriptor::Text { .. }
            | TypeDescriptor::Array { .. }
            | TypeDescriptor::Record(_) => {
                Some(format!("{}_{}_T", self.name, port.name()))
            }
            _ => None,
        }
    }

    fn port_c_type(&self, port: &NodePort) -> CodegenResult<String> {
        if let Some(name) = self.port_typedef_name(port) {
            return Ok(name);
        }
        match port.descriptor() {
            TypeDescriptor::Reference(type_ref) => Ok(self.type_name(type_ref)?.to_string()),
            descriptor => Ok(primitive_c_type(descriptor).unwrap_or("uint32").to_string()),
        }
    }

    fn is_primitive(&self, descriptor: &TypeDescriptor) -> CodegenResult<bool> {
        Ok(primitive_c_type(self.node.resolve_descriptor(descriptor)?).is_some())
    }

    fn prototype(&self, port: &NodePort) -> CodegenResult<String> {
        let c_type = self.port_c_type(port)?;
        let primitive = self.is_primitive(port.descriptor())?;
        let param = match port.direction() {
            PortDirection::Require => format!("{} *val", c_type),
            PortDirection::Provide if primitive => format!("{} val", c_type),
            PortDirection::Provide => format!("const {} *val", c_type),
        };
        Ok(format!("Std_ReturnType {}({})", self.accessor(port), param))
    }

    fn data_written_callback(&self) -> String {
        format!(
            "void {}_inPortDataWritten(void *arg, apx_nodeData_t *nodeData, uint32_t offset, uint32_t len)",
            self.name
        )
    }

    /// C declaration of `declarator` with type `ty`, without the trailing `;`.
    fn c_declaration(&self, ty: &TypeDescriptor, declarator: String, indent: usize) -> CodegenResult<String> {
        match ty {
            TypeDescriptor::IntegerRange(_)
            | TypeDescriptor::Integer(_)
            | TypeDescriptor::Bool
            | TypeDescriptor::Scalar => Ok(format!("{} {}", primitive_c_type(ty).unwrap_or("uint32"), declarator)),
            TypeDescriptor::String { len } => Ok(format!("uint8 {}[{}]", declarator, len)),
            TypeDescriptor::Text { unit, len } => Ok(format!("{} {}[{}]", char_c_type(*unit), declarator, len)),
            TypeDescriptor::Array { element, len } => {
                self.c_declaration(element, format!("{}[{}]", declarator, len), indent)
            }
            TypeDescriptor::Reference(type_ref) => Ok(format!("{} {}", self.type_name(type_ref)?, declarator)),
            TypeDescriptor::Record(fields) => {
                let pad = INDENT.repeat(indent);
                let mut decl = format!("struct\n{}{{\n", pad);
                for field in fields {
                    let field_decl = self.c_declaration(&field.ty, field.name.clone(), indent + 1)?;
                    let _ = writeln!(decl, "{}{}{};", pad, INDENT, field_decl);
                }
                let _ = write!(decl, "{}}} {}", pad, declarator);
                Ok(decl)
            }
        }
    }

    /// Nesting depth of arrays in the effective type, i.e. the number of loop
    /// variables an accessor needs.
    fn array_depth(&self, ty: &TypeDescriptor) -> CodegenResult<usize> {
        match ty {
            TypeDescriptor::Array { element, .. } => Ok(1 + self.array_depth(element)?),
            TypeDescriptor::Record(fields) => {
                let mut depth = 0;
                for field in fields {
                    depth = depth.max(self.array_depth(&field.ty)?);
                }
                Ok(depth)
            }
            TypeDescriptor::Reference(_) => self.array_depth(self.node.resolve_descriptor(ty)?),
            TypeDescriptor::Text { unit, .. } if *unit != CharUnit::Char8 => Ok(1),
            _ => Ok(0),
        }
    }

    fn packed_width(&self, ty: &TypeDescriptor) -> CodegenResult<u32> {
        Ok(self.node.packed_width(ty).map_err(NodeError::from)?)
    }

    // ── Header ──────────────────────────────────────────────────────────

    pub(crate) fn emit_header(&mut self) -> CodegenResult<String> {
        self.out.clear();
        let guard = include_guard(&self.header_file_name());
        let _ = writeln!(self.out, "#ifndef {}", guard);
        let _ = writeln!(self.out, "#define {}", guard);
        self.out.push('\n');

        self.section("INCLUDES");
        let mut includes: IndexSet<&str> = IndexSet::new();
        includes.insert("Std_Types.h");
        includes.insert("apx_nodeData.h");
        includes.extend(self.config.includes.iter().map(String::as_str));
        includes.extend(self.includes.iter().map(String::as_str));
        for include in includes {
            let _ = writeln!(self.out, "#include \"{}\"", include);
        }
        self.out.push('\n');

        self.section("CONSTANTS AND DATA TYPES");
        self.emit_typedefs()?;
        self.out.push('\n');

        self.section("GLOBAL FUNCTION PROTOTYPES");
        let _ = writeln!(self.out, "void {}(void);", self.symbol("Init"));
        let _ = writeln!(self.out, "apx_nodeData_t * {}(void);", self.symbol("GetNodeData"));
        self.out.push('\n');
        for port in self.node.require_ports().iter().chain(self.node.provide_ports()) {
            let prototype = self.prototype(port)?;
            let _ = writeln!(self.out, "{};", prototype);
        }
        let _ = writeln!(self.out, "{};", self.data_written_callback());
        self.out.push('\n');
        let _ = writeln!(self.out, "#endif //{}", guard);
        Ok(std::mem::take(&mut self.out))
    }

    fn emit_typedefs(&mut self) -> CodegenResult<()> {
        let node = self.node;
        for (_, data_type) in node.types().iter() {
            let decl = self.c_declaration(data_type.descriptor(), data_type.name().to_string(), 0)?;
            let _ = writeln!(self.out, "typedef {};", decl);

            let value_table = &data_type.attributes().value_table;
            if value_table.is_empty() {
                continue;
            }
            let first = match node.resolve_descriptor(data_type.descriptor())? {
                TypeDescriptor::IntegerRange(range) => i128::from(range.min),
                TypeDescriptor::Integer(int) => int.limits.map_or(0, |(min, _)| min),
                _ => 0,
            };
            for (value, label) in (first..).zip(value_table) {
                let suffix = if value >= 0 { "u" } else { "" };
                let _ = writeln!(
                    self.out,
                    "#define {} (({}){}{})",
                    label,
                    data_type.name(),
                    value,
                    suffix
                );
            }
        }
        for port in node.provide_ports().iter().chain(node.require_ports()) {
            if let Some(name) = self.port_typedef_name(port) {
                let decl = self.c_declaration(port.descriptor(), name, 0)?;
                let _ = writeln!(self.out, "typedef {};", decl);
            }
        }
        Ok(())
    }

    // ── Source ──────────────────────────────────────────────────────────

    pub(crate) fn emit_source(&mut self) -> CodegenResult<String> {
        self.out.clear();
        let node = self.node;
        let in_len = node.require_buffer_size();
        let out_len = node.provide_buffer_size();

        self.section("INCLUDES");
        let _ = writeln!(self.out, "#include <string.h>");
        let _ = writeln!(self.out, "#include \"{}\"", self.header_file_name());
        let _ = writeln!(self.out, "#include \"pack.h\"");
        self.out.push('\n');

        self.section("CONSTANTS AND DATA TYPES");
        let _ = writeln!(self.out, "#define APX_DEFINITON_LEN {}u", self.definition.len());
        let _ = writeln!(self.out, "#define APX_IN_PORT_DATA_LEN {}u", in_len);
        let _ = writeln!(self.out, "#define APX_OUT_PORT_DATA_LEN {}u", out_len);
        self.out.push('\n');

        self.section("LOCAL VARIABLES");
        self.emit_buffers("out", "OUT", node.init_data(PortDirection::Provide));
        self.emit_buffers("in", "IN", node.init_data(PortDirection::Require));
        let _ = writeln!(self.out, "static apx_nodeData_t m_nodeData;");
        let _ = writeln!(self.out, "static const char *m_apxDefinitionData=");
        let _ = writeln!(self.out, "{};", c_string_lines(self.definition));
        self.out.push('\n');

        self.section("GLOBAL FUNCTIONS");
        self.emit_init(in_len, out_len);
        let _ = writeln!(self.out, "apx_nodeData_t * {}(void)", self.symbol("GetNodeData"));
        let _ = writeln!(self.out, "{{\n{}return &m_nodeData;\n}}\n", INDENT);

        for port in node.require_ports() {
            self.emit_read(port)?;
        }
        for port in node.provide_ports() {
            if self.direct_write.contains(port.name()) {
                self.emit_direct_write(port)?;
            } else {
                self.emit_shadow_write(port)?;
            }
        }

        let _ = writeln!(self.out, "{}", self.data_written_callback());
        let _ = writeln!(self.out, "{{");
        for param in ["arg", "nodeData", "offset", "len"] {
            let _ = writeln!(self.out, "{}(void) {};", INDENT, param);
        }
        let _ = writeln!(self.out, "}}");
        Ok(std::mem::take(&mut self.out))
    }

    fn emit_buffers(&mut self, prefix: &str, upper: &str, init_data: &[u8]) {
        if init_data.is_empty() {
            return;
        }
        let _ = writeln!(
            self.out,
            "static const uint8_t m_{}PortInitData[APX_{}_PORT_DATA_LEN]= {{",
            prefix, upper
        );
        let rows: Vec<String> = init_data
            .chunks(INIT_DATA_PER_LINE)
            .map(|row| {
                let bytes: Vec<String> = row.iter().map(|b| b.to_string()).collect();
                format!("{}{}", INDENT, bytes.join(", "))
            })
            .collect();
        let _ = writeln!(self.out, "{}", rows.join(",\n"));
        let _ = writeln!(self.out, "}};\n");
        let _ = writeln!(self.out, "static uint8 m_{}Portdata[APX_{}_PORT_DATA_LEN];", prefix, upper);
        let _ = writeln!(
            self.out,
            "static uint8_t m_{}PortDirtyFlags[APX_{}_PORT_DATA_LEN];",
            prefix, upper
        );
    }

    fn emit_init(&mut self, in_len: u32, out_len: u32) {
        let _ = writeln!(self.out, "void {}(void)", self.symbol("Init"));
        let _ = writeln!(self.out, "{{");
        let mut buffer_args = Vec::new();
        for (prefix, upper, len) in [("in", "IN", in_len), ("out", "OUT", out_len)] {
            if len > 0 {
                let _ = writeln!(
                    self.out,
                    "{}memcpy(&m_{p}Portdata[0], &m_{p}PortInitData[0], APX_{u}_PORT_DATA_LEN);",
                    INDENT,
                    p = prefix,
                    u = upper
                );
                let _ = writeln!(
                    self.out,
                    "{}memset(&m_{p}PortDirtyFlags[0], 0, sizeof(m_{p}PortDirtyFlags));",
                    INDENT,
                    p = prefix
                );
                buffer_args.push(format!(
                    "&m_{p}Portdata[0], &m_{p}PortDirtyFlags[0], APX_{u}_PORT_DATA_LEN",
                    p = prefix,
                    u = upper
                ));
            } else {
                buffer_args.push(format!("0, 0, APX_{}_PORT_DATA_LEN", upper));
            }
        }
        let _ = writeln!(
            self.out,
            "{}apx_nodeData_create(&m_nodeData, \"{}\", (uint8_t*) &m_apxDefinitionData[0], APX_DEFINITON_LEN, {});",
            INDENT,
            self.node.name(),
            buffer_args.join(", ")
        );
        let _ = writeln!(self.out, "}}\n");
    }

    fn emit_loop_vars(&mut self, port: &NodePort) -> CodegenResult<()> {
        for depth in 0..self.array_depth(port.descriptor())? {
            let _ = writeln!(self.out, "{}uint32 i{};", INDENT, depth);
        }
        Ok(())
    }

    fn emit_read(&mut self, port: &NodePort) -> CodegenResult<()> {
        if let Some(len) = port.queue_length() {
            return self.emit_queue_read(port, len);
        }
        let value = if self.is_primitive(port.descriptor())? { "*val" } else { "(*val)" };
        let prototype = self.prototype(port)?;
        let _ = writeln!(self.out, "{}", prototype);
        let _ = writeln!(self.out, "{{");
        self.emit_loop_vars(port)?;
        let _ = writeln!(self.out, "{}apx_nodeData_lockInPortData(&m_nodeData);", INDENT);
        let mut body = String::new();
        self.emit_access(
            &mut body,
            Access::Unpack,
            port.descriptor(),
            value,
            "m_inPortdata",
            &Offset::at(port.offset()),
            0,
            1,
        )?;
        self.out.push_str(&body);
        let _ = writeln!(self.out, "{}apx_nodeData_unlockInPortData(&m_nodeData);", INDENT);
        let _ = writeln!(self.out, "{}return E_OK;", INDENT);
        let _ = writeln!(self.out, "}}\n");
        Ok(())
    }

    /// Pops the oldest element of a queued require port. The remaining
    /// elements move to the front of the queue.
    fn emit_queue_read(&mut self, port: &NodePort, len: u32) -> CodegenResult<()> {
        let value = if self.is_primitive(port.descriptor())? { "*val" } else { "(*val)" };
        let header = queue_header_width(len);
        let element_width = self.packed_width(port.descriptor())?;
        let first = port.offset() + header;
        let prototype = self.prototype(port)?;
        let _ = writeln!(self.out, "{}", prototype);
        let _ = writeln!(self.out, "{{");
        let _ = writeln!(self.out, "{}uint32 {};", INDENT, QUEUE_LEN);
        self.emit_loop_vars(port)?;
        let _ = writeln!(self.out, "{}apx_nodeData_lockInPortData(&m_nodeData);", INDENT);
        let mut body = String::new();
        let counter = Offset::at(port.offset());
        emit_integer(&mut body, INDENT, Access::Unpack, header, "uint32", QUEUE_LEN, "m_inPortdata", &counter);
        let _ = writeln!(body, "{}if ({} == 0u)", INDENT, QUEUE_LEN);
        let _ = writeln!(body, "{}{{", INDENT);
        let _ = writeln!(body, "{}{}apx_nodeData_unlockInPortData(&m_nodeData);", INDENT, INDENT);
        let _ = writeln!(body, "{}{}return E_NOT_OK;", INDENT, INDENT);
        let _ = writeln!(body, "{}}}", INDENT);
        self.emit_access(
            &mut body,
            Access::Unpack,
            port.descriptor(),
            value,
            "m_inPortdata",
            &Offset::at(first),
            0,
            1,
        )?;
        let _ = writeln!(
            body,
            "{}memmove(&m_inPortdata[{}], &m_inPortdata[{}], ({} - 1u) * {}u);",
            INDENT,
            first,
            first + element_width,
            QUEUE_LEN,
            element_width
        );
        let remaining = format!("({} - 1u)", QUEUE_LEN);
        emit_integer(&mut body, INDENT, Access::Pack, header, "uint32", &remaining, "m_inPortdata", &counter);
        self.out.push_str(&body);
        let _ = writeln!(self.out, "{}apx_nodeData_unlockInPortData(&m_nodeData);", INDENT);
        let _ = writeln!(self.out, "{}return E_OK;", INDENT);
        let _ = writeln!(self.out, "}}\n");
        Ok(())
    }

    fn write_value(&self, port: &NodePort) -> CodegenResult<&'static str> {
        Ok(if self.is_primitive(port.descriptor())? { "val" } else { "(*val)" })
    }

    /// Packs into the shadow buffer under the lock, then hands the updated
    /// range to the node data.
    fn emit_shadow_write(&mut self, port: &NodePort) -> CodegenResult<()> {
        if let Some(len) = port.queue_length() {
            return self.emit_queue_write(port, len);
        }
        let value = self.write_value(port)?;
        let prototype = self.prototype(port)?;
        let _ = writeln!(self.out, "{}", prototype);
        let _ = writeln!(self.out, "{{");
        self.emit_loop_vars(port)?;
        let _ = writeln!(self.out, "{}apx_nodeData_lockOutPortData(&m_nodeData);", INDENT);
        let mut body = String::new();
        self.emit_access(
            &mut body,
            Access::Pack,
            port.descriptor(),
            value,
            "m_outPortdata",
            &Offset::at(port.offset()),
            0,
            1,
        )?;
        self.out.push_str(&body);
        let _ = writeln!(self.out, "{}apx_nodeData_unlockOutPortData(&m_nodeData);", INDENT);
        let _ = writeln!(
            self.out,
            "{}apx_nodeData_updateOutPortData(&m_nodeData, &m_outPortdata[{}], {}u, {}u, false);",
            INDENT,
            port.offset(),
            port.offset(),
            port.width()
        );
        let _ = writeln!(self.out, "{}return E_OK;", INDENT);
        let _ = writeln!(self.out, "}}\n");
        Ok(())
    }

    /// Appends one element to a queued provide port and sends the whole queue.
    fn emit_queue_write(&mut self, port: &NodePort, len: u32) -> CodegenResult<()> {
        let value = self.write_value(port)?;
        let header = queue_header_width(len);
        let element_width = self.packed_width(port.descriptor())?;
        let prototype = self.prototype(port)?;
        let _ = writeln!(self.out, "{}", prototype);
        let _ = writeln!(self.out, "{{");
        let _ = writeln!(self.out, "{}uint32 {};", INDENT, QUEUE_LEN);
        self.emit_loop_vars(port)?;
        let _ = writeln!(self.out, "{}apx_nodeData_lockOutPortData(&m_nodeData);", INDENT);
        let mut body = String::new();
        let counter = Offset::at(port.offset());
        emit_integer(&mut body, INDENT, Access::Unpack, header, "uint32", QUEUE_LEN, "m_outPortdata", &counter);
        let _ = writeln!(body, "{}if ({} >= {}u)", INDENT, QUEUE_LEN, len);
        let _ = writeln!(body, "{}{{", INDENT);
        let _ = writeln!(body, "{}{}apx_nodeData_unlockOutPortData(&m_nodeData);", INDENT, INDENT);
        let _ = writeln!(body, "{}{}return E_NOT_OK;", INDENT, INDENT);
        let _ = writeln!(body, "{}}}", INDENT);
        self.emit_access(
            &mut body,
            Access::Pack,
            port.descriptor(),
            value,
            "m_outPortdata",
            &Offset::at(port.offset() + header).indexed(QUEUE_LEN, element_width),
            0,
            1,
        )?;
        let grown = format!("({} + 1u)", QUEUE_LEN);
        emit_integer(&mut body, INDENT, Access::Pack, header, "uint32", &grown, "m_outPortdata", &counter);
        self.out.push_str(&body);
        let _ = writeln!(self.out, "{}apx_nodeData_unlockOutPortData(&m_nodeData);", INDENT);
        let _ = writeln!(
            self.out,
            "{}apx_nodeData_updateOutPortData(&m_nodeData, &m_outPortdata[{}], {}u, {}u, false);",
            INDENT,
            port.offset(),
            port.offset(),
            port.width()
        );
        let _ = writeln!(self.out, "{}return E_OK;", INDENT);
        let _ = writeln!(self.out, "}}\n");
        Ok(())
    }

    /// Packs into a local buffer that is written straight to the transport,
    /// bypassing the shadow buffer.
    fn emit_direct_write(&mut self, port: &NodePort) -> CodegenResult<()> {
        let value = self.write_value(port)?;
        let prototype = self.prototype(port)?;
        let _ = writeln!(self.out, "{}", prototype);
        let _ = writeln!(self.out, "{{");
        let _ = writeln!(self.out, "{}uint8 data[{}];", INDENT, port.width());
        self.emit_loop_vars(port)?;
        let mut body = String::new();
        self.emit_access(
            &mut body,
            Access::Pack,
            port.descriptor(),
            value,
            "data",
            &Offset::at(0),
            0,
            1,
        )?;
        self.out.push_str(&body);
        let _ = writeln!(
            self.out,
            "{}apx_nodeData_updateOutPortData(&m_nodeData, &data[0], {}u, {}u, true);",
            INDENT,
            port.offset(),
            port.width()
        );
        let _ = writeln!(self.out, "{}return E_OK;", INDENT);
        let _ = writeln!(self.out, "}}\n");
        Ok(())
    }

    /// Emits the statements that copy `value` to or from `buffer` at `offset`.
    #[allow(clippy::too_many_arguments)]
    fn emit_access(
        &self,
        out: &mut String,
        access: Access,
        ty: &TypeDescriptor,
        value: &str,
        buffer: &str,
        offset: &Offset,
        depth: usize,
        indent: usize,
    ) -> CodegenResult<()> {
        let pad = INDENT.repeat(indent);
        match ty {
            TypeDescriptor::IntegerRange(range) => {
                emit_integer(out, &pad, access, range.packed_width(), integer_c_type(range), value, buffer, offset);
                Ok(())
            }
            TypeDescriptor::Integer(int) => {
                emit_integer(out, &pad, access, int.ty.width(), fixed_c_type(int.ty), value, buffer, offset);
                Ok(())
            }
            TypeDescriptor::Bool => {
                emit_integer(out, &pad, access, 1, "boolean", value, buffer, offset);
                Ok(())
            }
            TypeDescriptor::Scalar => {
                emit_integer(out, &pad, access, SCALAR_WIDTH, "uint32", value, buffer, offset);
                Ok(())
            }
            TypeDescriptor::Text { unit: CharUnit::Char8, len } => {
                let _ = match access {
                    Access::Pack => writeln!(out, "{}memcpy(&{}[{}], {}, {}u);", pad, buffer, offset, value, len),
                    Access::Unpack => writeln!(out, "{}memcpy({}, &{}[{}], {}u);", pad, value, buffer, offset, len),
                };
                Ok(())
            }
            TypeDescriptor::Text { unit, len } => {
                // wide code units are stored little-endian one by one
                let var = format!("i{}", depth);
                let _ = writeln!(out, "{}for ({v} = 0u; {v} < {}u; {v}++)", pad, len, v = var);
                let _ = writeln!(out, "{}{{", pad);
                emit_integer(
                    out,
                    &INDENT.repeat(indent + 1),
                    access,
                    unit.width(),
                    char_c_type(*unit),
                    &format!("{}[{}]", value, var),
                    buffer,
                    &offset.indexed(&var, unit.width()),
                );
                let _ = writeln!(out, "{}}}", pad);
                Ok(())
            }
            TypeDescriptor::String { len } => {
                let _ = match access {
                    Access::Pack => writeln!(out, "{}memcpy(&{}[{}], {}, {}u);", pad, buffer, offset, value, len),
                    Access::Unpack => writeln!(out, "{}memcpy({}, &{}[{}], {}u);", pad, value, buffer, offset, len),
                };
                Ok(())
            }
            TypeDescriptor::Array { element, len } => {
                let var = format!("i{}", depth);
                let stride = self.packed_width(element)?;
                let _ = writeln!(out, "{}for ({v} = 0u; {v} < {}u; {v}++)", pad, len, v = var);
                let _ = writeln!(out, "{}{{", pad);
                self.emit_access(
                    out,
                    access,
                    element,
                    &format!("{}[{}]", value, var),
                    buffer,
                    &offset.indexed(&var, stride),
                    depth + 1,
                    indent + 1,
                )?;
                let _ = writeln!(out, "{}}}", pad);
                Ok(())
            }
            TypeDescriptor::Record(fields) => {
                let mut field_offset = 0;
                for field in fields {
                    self.emit_access(
                        out,
                        access,
                        &field.ty,
                        &format!("{}.{}", value, field.name),
                        buffer,
                        &offset.add(field_offset),
                        depth,
                        indent,
                    )?;
                    field_offset += self.packed_width(&field.ty)?;
                }
                Ok(())
            }
            TypeDescriptor::Reference(_) => {
                let target = self.node.resolve_descriptor(ty)?;
                self.emit_access(out, access, target, value, buffer, offset, depth, indent)
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_integer(
    out: &mut String,
    pad: &str,
    access: Access,
    width: u32,
    c_type: &str,
    value: &str,
    buffer: &str,
    offset: &Offset,
) {
    let _ = match (access, width) {
        (Access::Pack, 1) => writeln!(out, "{}{}[{}] = (uint8) {};", pad, buffer, offset, value),
        (Access::Unpack, 1) => writeln!(out, "{}{} = ({}) {}[{}];", pad, value, c_type, buffer, offset),
        (Access::Pack, 8) => writeln!(out, "{}packLE64(&{}[{}], (uint64) {});", pad, buffer, offset, value),
        (Access::Unpack, 8) => writeln!(
            out,
            "{}{} = ({}) unpackLE64(&{}[{}]);",
            pad, value, c_type, buffer, offset
        ),
        (Access::Pack, _) => writeln!(
            out,
            "{}packLE(&{}[{}], (uint32) {}, (uint8) {}u);",
            pad, buffer, offset, value, width
        ),
        (Access::Unpack, _) => writeln!(
            out,
            "{}{} = ({}) unpackLE(&{}[{}], (uint8) {}u);",
            pad, value, c_type, buffer, offset, width
        ),
    };
}

/// C type of a descriptor that is passed by value.
fn primitive_c_type(ty: &TypeDescriptor) -> Option<&'static str> {
    match ty {
        TypeDescriptor::IntegerRange(range) => Some(integer_c_type(range)),
        TypeDescriptor::Integer(int) => Some(fixed_c_type(int.ty)),
        TypeDescriptor::Bool => Some("boolean"),
        TypeDescriptor::Scalar => Some("uint32"),
        _ => None,
    }
}

fn fixed_c_type(ty: IntegerType) -> &'static str {
    match ty {
        IntegerType::Byte => "uint8",
        IntegerType::Int8 => "sint8",
        IntegerType::Int16 => "sint16",
        IntegerType::Int32 => "sint32",
        IntegerType::Int64 => "sint64",
        IntegerType::UInt32 => "uint32",
        IntegerType::UInt64 => "uint64",
    }
}

fn char_c_type(unit: CharUnit) -> &'static str {
    match unit {
        CharUnit::Char8 => "uint8",
        CharUnit::Char16 => "uint16",
        CharUnit::Char32 => "uint32",
    }
}

fn integer_c_type(range: &IntRange) -> &'static str {
    match (range.is_signed(), range.packed_width()) {
        (false, 1) => "uint8",
        (false, 2) => "uint16",
        (false, _) => "uint32",
        (true, 1) => "sint8",
        (true, 2) => "sint16",
        (true, _) => "sint32",
    }
}

fn include_guard(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

/// Splits `text` into one C string literal per line.
fn c_string_lines(text: &str) -> String {
    let lines: Vec<String> = text
        .split_inclusive('\n')
        .map(|line| {
            let mut literal = String::from("\"");
            for c in line.chars() {
                match c {
                    '\\' => literal.push_str("\\\\"),
                    '"' => literal.push_str("\\\""),
                    '\n' => literal.push_str("\\n"),
                    _ => literal.push(c),
                }
            }
            literal.push('"');
            literal
        })
        .collect();
    if lines.is_empty() {
        return "\"\"".to_string();
    }
    lines.join("\n")
}
