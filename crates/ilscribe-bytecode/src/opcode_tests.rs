//! Tests for the opcode table.

use super::opcode::{OpCode, OperandType, UnknownOpcode};

#[test]
fn base_sizes() {
    assert_eq!(OpCode::NOP.size(), 1);
    assert_eq!(OpCode::LDSTR.size(), 1);
    assert_eq!(OpCode::CONV_U.size(), 1);
    assert_eq!(OpCode::ARGLIST.size(), 2);
    assert_eq!(OpCode::CEQ.size(), 2);
    assert_eq!(OpCode::LDLOC.size(), 2);
    assert_eq!(OpCode::READONLY.size(), 2);
}

#[test]
fn every_opcode_is_one_or_two_bytes() {
    for op in OpCode::all() {
        let expected = if op.value() > 0xFF { 2 } else { 1 };
        assert_eq!(op.size(), expected, "{op}");
    }
}

#[test]
fn single_byte_arguments() {
    assert!(OpCode::BR_S.takes_single_byte_argument());
    assert!(OpCode::LDC_I4_S.takes_single_byte_argument());
    assert!(OpCode::LDLOC_S.takes_single_byte_argument());
    assert!(OpCode::UNALIGNED.takes_single_byte_argument());

    assert!(!OpCode::BR.takes_single_byte_argument());
    assert!(!OpCode::LDLOC.takes_single_byte_argument());
    assert!(!OpCode::LDC_R4.takes_single_byte_argument());
    assert!(!OpCode::LDLOC_0.takes_single_byte_argument());
}

#[test]
fn branch_family() {
    assert!(OpCode::BR.is_branch());
    assert!(OpCode::BR_S.is_branch());
    assert!(OpCode::BRTRUE_S.is_branch());
    assert!(OpCode::BRFALSE.is_branch());

    assert!(!OpCode::BREAK.is_branch());
    assert!(!OpCode::BEQ.is_branch());
    assert!(!OpCode::LEAVE.is_branch());
}

#[test]
fn lookup_by_name_and_value() {
    assert_eq!(OpCode::from_name("ldloc.s"), Some(OpCode::LDLOC_S));
    assert_eq!(OpCode::from_name("constrained."), Some(OpCode::CONSTRAINED));
    assert_eq!(OpCode::from_name("ldloc.9"), None);

    assert_eq!(OpCode::from_value(0x72), Some(OpCode::LDSTR));
    assert_eq!(OpCode::from_value(0xFE0C), Some(OpCode::LDLOC));
    assert_eq!(OpCode::from_value(0x24), None);
}

#[test]
fn parse_mnemonic() {
    assert_eq!("switch".parse::<OpCode>(), Ok(OpCode::SWITCH));
    assert_eq!(
        "jump".parse::<OpCode>(),
        Err(UnknownOpcode("jump".to_string()))
    );
    assert_eq!(
        UnknownOpcode("jump".to_string()).to_string(),
        "unknown opcode mnemonic `jump`"
    );
}

#[test]
fn table_has_unique_names_and_values() {
    let all = OpCode::all();
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            assert_ne!(a.value(), b.value(), "{a} / {b}");
            assert_ne!(a.name(), b.name());
        }
    }
}

#[test]
fn write_two_byte_opcode() {
    let mut out = Vec::new();
    OpCode::NOP.write_to(&mut out);
    OpCode::CEQ.write_to(&mut out);
    OpCode::LDLOC.write_to(&mut out);
    assert_eq!(out, [0x00, 0xFE, 0x01, 0xFE, 0x0C]);
}

#[test]
fn operand_widths() {
    assert_eq!(OpCode::LDLOC_S.operand_type().width(), 1);
    assert_eq!(OpCode::LDLOC.operand_type().width(), 2);
    assert_eq!(OpCode::LDC_R4.operand_type().width(), 4);
    assert_eq!(OpCode::LDC_R8.operand_type().width(), 8);
    assert_eq!(OperandType::InlineNone.width(), 0);
}

#[test]
fn display_respects_padding() {
    assert_eq!(format!("[{:<8}]", OpCode::RET), "[ret     ]");
}
