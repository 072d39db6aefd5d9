// Node fixtures shared by the generator and context tests
#![allow(dead_code)]

use apx_node::{DataType, Node, NodeBuilder, Port};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `N` with one mode type, one provide and one require port.
pub fn mode_node() -> Node {
    let mut builder = NodeBuilder::new("N");
    builder.append(DataType::new("Mode_T", "C(0,15)").unwrap()).unwrap();
    builder
        .append(Port::provide("Status", r#"T["Mode_T"]"#, Some("=0")).unwrap())
        .unwrap();
    builder
        .append(Port::require("Mode", r#"T["Mode_T"]"#, Some("=15")).unwrap())
        .unwrap();
    builder.finalize().unwrap()
}

/// A node exercising records, arrays, strings and value tables.
pub fn composite_node() -> Node {
    let mut builder = NodeBuilder::new("Composite");
    builder
        .append(
            DataType::new("Mode_T", "C(0,3)")
                .unwrap()
                .with_attributes(r#"VT("Mode_Off","Mode_On","Mode_Error","Mode_NotAvailable")"#)
                .unwrap(),
        )
        .unwrap();
    builder
        .append(DataType::new("Pair_T", r#"{"Id"C(0,1000)"Modes"T["Mode_T"][2]}"#).unwrap())
        .unwrap();
    builder
        .append(Port::provide("Pair", r#"T["Pair_T"]"#, Some("={513, {1, 2}}")).unwrap())
        .unwrap();
    builder
        .append(Port::provide("Label", "a[4]", Some(r#"="ab""#)).unwrap())
        .unwrap();
    builder
        .append(Port::require("Offset", "C(-100,100)", Some("=-1")).unwrap())
        .unwrap();
    builder
        .append(Port::require("Speeds", "S[2]", None).unwrap())
        .unwrap();
    builder.finalize().unwrap()
}

/// Fixed-width integers, a boolean, UTF-16 text and a value table on a byte.
pub fn fixed_width_node() -> Node {
    let mut builder = NodeBuilder::new("W");
    builder
        .append(
            DataType::new("Level_T", "B(0,3)")
                .unwrap()
                .with_attributes(r#"VT("Level_Low","Level_Mid","Level_High","Level_Max")"#)
                .unwrap(),
        )
        .unwrap();
    builder
        .append(Port::provide("Counter", "Q", Some("=0x0102030405060708")).unwrap())
        .unwrap();
    builder.append(Port::provide("Enabled", "b", Some("=1")).unwrap()).unwrap();
    builder
        .append(Port::require("Temp", "s(-400,1500)", Some("=-1")).unwrap())
        .unwrap();
    builder
        .append(Port::require("Name", "u[3]", Some(r#"="ab""#)).unwrap())
        .unwrap();
    builder.finalize().unwrap()
}

/// One queued provide port and one queued require port.
pub fn queued_node() -> Node {
    let mut builder = NodeBuilder::new("Q");
    builder
        .append(Port::provide("Events", "C(0,1000)", Some("Q[10]")).unwrap())
        .unwrap();
    builder
        .append(Port::require("Commands", "C(0,7)", Some("Q[4]")).unwrap())
        .unwrap();
    builder.finalize().unwrap()
}
