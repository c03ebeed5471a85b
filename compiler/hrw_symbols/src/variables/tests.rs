use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_slots_are_assigned_in_order() {
    let mut vars = Variables::new();
    let first = vars.declare("is_mobile", VarType::Bool).map(|v| v.slot);
    let second = vars.declare("seen", VarType::Bool).map(|v| v.slot);
    let counter = vars.declare("hits", VarType::Int8).map(|v| v.slot);
    assert_eq!(first, Ok(0));
    assert_eq!(second, Ok(1));
    assert_eq!(counter, Ok(0));

    let names: Vec<_> = vars.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["is_mobile", "seen", "hits"]);
}

#[test]
fn test_targets_and_assignments() {
    let mut vars = Variables::new();
    let flag = match vars.declare("flag", VarType::Bool) {
        Ok(v) => v.clone(),
        Err(err) => panic!("{err}"),
    };
    assert_eq!(flag.condition_target(), "%{STATE-FLAG:0}");
    assert!(flag.is_negatable());
    assert_eq!(flag.assign("true").as_deref(), Ok("set-state-flag 0 true"));
    assert!(flag.assign("1").is_err());
    assert_eq!(flag.declaration(), "flag: bool;");

    let level = match vars.declare("level", VarType::Int16) {
        Ok(v) => v.clone(),
        Err(err) => panic!("{err}"),
    };
    assert_eq!(level.condition_target(), "%{STATE-INT16:0}");
    assert!(!level.is_negatable());
    assert_eq!(level.assign("1000").as_deref(), Ok("set-state-int16 0 1000"));
    assert!(level.assign("70000").is_err());
}

#[test]
fn test_declaration_errors() {
    let mut vars = Variables::new();
    assert!(vars.declare("ok", VarType::Int16).is_ok());

    let exhausted = vars.declare("second", VarType::Int16);
    assert!(matches!(exhausted, Err(SymbolResolutionError::InvalidVariable { .. })));

    assert!(vars.declare("ok", VarType::Bool).is_err());
    assert!(vars.declare("if", VarType::Bool).is_err());
    assert!(vars.declare("inbound.req.X", VarType::Bool).is_err());
    assert!(vars.declare("9lives", VarType::Bool).is_err());
}

#[test]
fn test_bool_slots_exhaust_at_sixteen() {
    let mut vars = Variables::new();
    for i in 0..16 {
        assert!(vars.declare(&format!("f{i}"), VarType::Bool).is_ok());
    }
    assert!(vars.declare("f16", VarType::Bool).is_err());
}

#[test]
fn test_auto_declared_slots() {
    let mut vars = Variables::new();
    let auto = vars.for_slot(VarType::Int8, 2).map(|v| v.name.clone());
    assert_eq!(auto.as_deref(), Ok("int8_2"));

    // Same slot resolves to the same variable.
    let again = vars.for_slot(VarType::Int8, 2).map(|v| v.name.clone());
    assert_eq!(again.as_deref(), Ok("int8_2"));
    assert_eq!(vars.len(), 1);

    assert!(vars.for_slot(VarType::Int16, 1).is_err());

    // Declarations skip slots already taken.
    let declared = vars.declare("a", VarType::Int8).map(|v| v.slot);
    assert_eq!(declared, Ok(0));
}

#[test]
fn test_type_keywords() {
    assert_eq!(VarType::from_keyword("boolean"), Some(VarType::Bool));
    assert_eq!(VarType::from_keyword("INT8"), Some(VarType::Int8));
    assert_eq!(VarType::from_keyword("string"), None);
    assert_eq!(VarType::from_state_tag("STATE-INT16"), Some(VarType::Int16));
    assert_eq!(VarType::from_set_command("set-state-flag"), Some(VarType::Bool));
}
