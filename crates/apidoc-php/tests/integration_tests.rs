//! Integration tests for apidoc-php

use apidoc::export::{export_json, inject_into_file};
use apidoc::{Absence, ApidocError, DefaultValue, DiagnosticKind, Diagnostics, FunctionSchema};
use apidoc_php::{compile_all, compile_function, ExtractorConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures_path() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures"))
}

fn fixture_config() -> ExtractorConfig {
    ExtractorConfig::default().with_root(fixtures_path().join("lbplanner"))
}

fn compile_fixture() -> (Vec<FunctionSchema>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let functions = compile_all(&fixture_config(), &mut diagnostics).unwrap();
    (functions, diagnostics)
}

fn find<'a>(functions: &'a [FunctionSchema], name: &str) -> &'a FunctionSchema {
    functions
        .iter()
        .find(|f| f.name() == name)
        .unwrap_or_else(|| panic!("function {name} was not compiled"))
}

const WEEKDAYS: &str =
    "{ Monday = 1, Tuesday = 2, Wednesday = 3, Thursday = 4, Friday = 5, Saturday = 6, Sunday = 7 }";

/// Minimal plugin tree with one registered service per `(group, name, source)`
fn write_plugin(services: &[(&str, &str, &str)], classes: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let mut registry = String::from("<?php\n$functions = [\n");

    for (group, name, source) in services {
        registry.push_str(&format!(
            "    'local_lbplanner_{group}_{name}' => [\n        'classpath' => 'local/lbplanner/services/{group}/{name}.php',\n        'description' => 'Test function',\n        'capabilities' => 'local/lb_planner:student',\n    ],\n"
        ));
        let path = dir.path().join("services").join(group);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(format!("{name}.php")), source).unwrap();
    }
    registry.push_str("];\n");

    fs::create_dir_all(dir.path().join("db")).unwrap();
    fs::write(dir.path().join("db").join("services.php"), registry).unwrap();

    for (relative, source) in classes {
        let path = dir.path().join("classes").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, source).unwrap();
    }
    dir
}

fn service(group: &str, name: &str, imports: &str, parameters: &str, returns: &str) -> String {
    format!(
        r"<?php
namespace local_lbplanner_services;

{imports}

/**
 * Test service.
 *
 * @package local_lbplanner
 * @subpackage services_{group}
 * @copyright 2025 necodeIT
 */
class {group}_{name} extends external_api {{
    public static function {name}_parameters(): external_function_parameters {{
        {parameters}
    }}

    public static function {name}_returns() {{
        {returns}
    }}
}}
"
    )
}

fn temp_config(dir: &TempDir) -> ExtractorConfig {
    ExtractorConfig::default().with_root(dir.path())
}

#[test]
fn test_fixture_plugin_compiles_cleanly() {
    let (functions, diagnostics) = compile_fixture();

    assert!(
        diagnostics.is_empty(),
        "Expected no diagnostics, got: {:#?}",
        diagnostics.records()
    );
    let names: Vec<&str> = functions.iter().map(|f| f.name()).collect();
    assert_eq!(
        names,
        vec!["get_user", "get_my_slots", "update_slot", "get_board"]
    );
}

#[test]
fn test_registry_metadata() {
    let (functions, _) = compile_fixture();

    let update = find(&functions, "update_slot");
    assert_eq!(update.info.group, "slots");
    assert_eq!(update.info.capabilities, vec!["slotmaster", "teacher"]);
    assert_eq!(update.info.description, "Update a slot's values");
    assert_eq!(
        update.info.path,
        PathBuf::from("services/slots/update_slot.php")
    );

    assert!(find(&functions, "get_user").info.capabilities.is_empty());
}

#[test]
fn test_user_id_default() {
    let (functions, _) = compile_fixture();

    let params = find(&functions, "get_user").parameters.element().unwrap();
    let userid = params.as_object().unwrap().field("userid").unwrap();
    let userid = userid.as_value().unwrap();
    assert_eq!(userid.value_type, "int");
    assert!(!userid.required);
    assert!(!userid.nullable);
    assert_eq!(
        userid.default_value,
        Some(DefaultValue::Text("derived from token".to_string()))
    );
}

#[test]
fn test_enum_format_in_description() {
    let (functions, _) = compile_fixture();

    let params = find(&functions, "update_slot").parameters.element().unwrap();
    let params = params.as_object().unwrap();
    let names: Vec<&str> = params.fields.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["slotid", "weekday", "room", "notify"]);

    let weekday = params.field("weekday").unwrap().as_value().unwrap();
    assert_eq!(
        weekday.description,
        format!("The weekday this slot happens on. {WEEKDAYS} (null to ignore)")
    );
    assert!(!weekday.required);
    assert!(weekday.nullable);

    let notify = params.field("notify").unwrap().as_value().unwrap();
    assert_eq!(notify.value_type, "bool");
    assert_eq!(notify.default_value, Some(DefaultValue::Bool(false)));

    let room = params.field("room").unwrap().as_value().unwrap();
    assert_eq!(room.value_type, "String");
}

#[test]
fn test_inherited_enum_format_through_self_delegation() {
    let (functions, _) = compile_fixture();

    let returns = find(&functions, "get_user").returns.element().unwrap();
    let returns = returns.as_object().unwrap();
    assert_eq!(returns.fields.len(), 6);
    assert_eq!(
        returns.field("showcolumninfo").unwrap().description(),
        "Column to move finished modules to: { None = \"\", Backlog = \"backlog\", Inprogress = \"inprogress\", Todo = \"todo\", Done = \"done\" }"
    );
    assert_eq!(
        returns
            .field("profileimageurl")
            .unwrap()
            .as_value()
            .unwrap()
            .value_type,
        "String"
    );
}

#[test]
fn test_enum_case_keys() {
    let (functions, _) = compile_fixture();

    let returns = find(&functions, "get_board").returns.element().unwrap();
    let columns: Vec<&str> = returns
        .as_object()
        .unwrap()
        .fields
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(columns, vec!["todo", "inprogress", "done"]);
}

#[test]
fn test_nested_delegation() {
    let (functions, _) = compile_fixture();

    let returns = find(&functions, "get_my_slots").returns.element().unwrap();
    let slot = returns.as_array().unwrap().element().as_object().unwrap();
    assert_eq!(
        slot.field("weekday").unwrap().description(),
        format!("The day this unit repeats weekly: {WEEKDAYS}")
    );

    let supervisors = slot.field("supervisors").unwrap().as_array().unwrap();
    assert_eq!(
        supervisors.element().description(),
        "this slot's supervisors' userIDs"
    );

    let filter = slot
        .field("filters")
        .unwrap()
        .as_array()
        .unwrap()
        .element()
        .as_object()
        .unwrap();
    assert_eq!(filter.fields.len(), 4);
    assert!(filter.field("courseid").unwrap().as_value().unwrap().nullable);
}

#[test]
fn test_null_and_empty_schemas() {
    let (functions, _) = compile_fixture();

    assert_eq!(
        find(&functions, "update_slot").returns.absence(),
        Some(Absence::NullLiteral)
    );
    assert_eq!(
        find(&functions, "get_my_slots").parameters.absence(),
        Some(Absence::EmptyStructure)
    );
}

#[test]
fn test_json_export() {
    let (functions, _) = compile_fixture();
    let json = export_json(&functions).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let funcs = value.as_array().unwrap();
    assert_eq!(funcs.len(), 4);
    assert_eq!(funcs[0]["name"], "get_user");
    assert_eq!(funcs[0]["group"], "user");
    assert_eq!(funcs[0]["parameters"]["type"], "object");
    assert_eq!(
        funcs[0]["parameters"]["fields"]["userid"]["default_value"],
        "derived from token"
    );
    assert!(funcs[1]["parameters"].is_null());
    assert_eq!(funcs[1]["returns"]["type"], "array");
    assert!(funcs[2]["returns"].is_null());
}

#[test]
fn test_inject_into_script() {
    let (functions, _) = compile_fixture();
    let json = export_json(&functions).unwrap();

    let dir = TempDir::new().unwrap();
    let script = dir.path().join("script.js");
    fs::write(&script, "'use strict';\nconst funcs = [];\nrender(funcs);\n").unwrap();

    inject_into_file(&script, &json).unwrap();
    let injected = fs::read_to_string(&script).unwrap();
    let lines: Vec<&str> = injected.lines().collect();
    assert_eq!(lines[0], "'use strict';");
    assert_eq!(lines[1], format!("const funcs = {json}"));
    assert_eq!(lines[2], "render(funcs);");
}

#[test]
fn test_missing_enum_case_is_soft() {
    let dir = write_plugin(
        &[(
            "slots",
            "get_slot",
            &service(
                "slots",
                "get_slot",
                "use local_lbplanner\\enums\\WEEKDAY;",
                "return new external_function_parameters([
            'day' => new external_value(PARAM_INT, 'Day ' . WEEKDAY::FUNDAY),
        ]);",
                "return null;",
            ),
        )],
        &[(
            "enums/WEEKDAY.php",
            "<?php\nnamespace local_lbplanner\\enums;\nclass WEEKDAY extends Enum {\n    const MONDAY = 1;\n}\n",
        )],
    );

    let mut diagnostics = Diagnostics::new();
    let functions = compile_all(&temp_config(&dir), &mut diagnostics).unwrap();

    assert_eq!(functions.len(), 1);
    let params = functions[0].parameters.element().unwrap().as_object().unwrap();
    assert_eq!(params.field("day").unwrap().description(), "Day ?");
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.records()[0].kind, DiagnosticKind::Resolution);
    assert_eq!(
        diagnostics.records()[0].function.as_deref(),
        Some("slots_get_slot")
    );
}

#[test]
fn test_cyclic_delegation_is_fatal() {
    let dir = write_plugin(
        &[(
            "plan",
            "get_plan",
            &service(
                "plan",
                "get_plan",
                "use local_lbplanner\\model\\plan;",
                "return new external_function_parameters([]);",
                "return plan::api_structure();",
            ),
        )],
        &[
            (
                "model/plan.php",
                "<?php\nnamespace local_lbplanner\\model;\nclass plan {\n    public static function api_structure() {\n        return deadline::api_structure();\n    }\n}\n",
            ),
            (
                "model/deadline.php",
                "<?php\nnamespace local_lbplanner\\model;\nclass deadline {\n    public static function api_structure() {\n        return plan::api_structure();\n    }\n}\n",
            ),
        ],
    );

    let mut diagnostics = Diagnostics::new();
    let err = compile_all(&temp_config(&dir), &mut diagnostics).unwrap_err();
    match err {
        ApidocError::CyclicDelegation { chain } => assert_eq!(
            chain,
            "plan::api_structure() -> deadline::api_structure() -> plan::api_structure()"
        ),
        other => panic!("expected cyclic delegation, got {other}"),
    }
}

#[test]
fn test_double_quoted_string_aborts_run() {
    let dir = write_plugin(
        &[(
            "feedback",
            "submit_feedback",
            &service(
                "feedback",
                "submit_feedback",
                "",
                "return new external_function_parameters([]);",
                "return new external_value(PARAM_INT, \"The ID of the new feedback\");",
            ),
        )],
        &[],
    );

    let mut diagnostics = Diagnostics::new();
    let err = compile_all(&temp_config(&dir), &mut diagnostics).unwrap_err();
    assert!(matches!(err, ApidocError::UnsupportedFeature { .. }));
    assert!(err.to_string().contains("submit_feedback.php"));
}

#[test]
fn test_missing_method_skips_function() {
    let source = "<?php\n/**\n * @subpackage services_user\n * @copyright 2025 necodeIT\n */\nclass user_delete_user {\n    public static function delete_user_parameters() {\n        return null;\n    }\n}\n";
    let dir = write_plugin(&[("user", "delete_user", source)], &[]);

    let mut diagnostics = Diagnostics::new();
    let functions = compile_all(&temp_config(&dir), &mut diagnostics).unwrap();
    assert!(functions.is_empty());
    assert_eq!(diagnostics.count_of(DiagnosticKind::Extraction), 1);
    assert!(diagnostics.records()[0]
        .message
        .contains("delete_user_returns()"));
}

#[test]
fn test_null_parameters_and_empty_returns_are_flagged() {
    let dir = write_plugin(
        &[(
            "config",
            "get_version",
            &service(
                "config",
                "get_version",
                "",
                "return null;",
                "return new external_single_structure([]);",
            ),
        )],
        &[],
    );

    let mut diagnostics = Diagnostics::new();
    let functions = compile_all(&temp_config(&dir), &mut diagnostics).unwrap();
    assert_eq!(functions.len(), 1);
    assert_eq!(
        functions[0].parameters.absence(),
        Some(Absence::NullLiteral)
    );
    assert_eq!(
        functions[0].returns.absence(),
        Some(Absence::EmptyStructure)
    );
    assert_eq!(diagnostics.count_of(DiagnosticKind::Extraction), 2);
}

#[test]
fn test_conventions_and_unregistered_files() {
    let source = service(
        "slots",
        "get_slot",
        "",
        "return new external_function_parameters([]);",
        "return null;",
    )
    .replace("services_slots", "services_plan");
    let dir = write_plugin(&[("slots", "get_slot", &source)], &[]);
    fs::write(dir.path().join("services/slots/stray.php"), "<?php\n").unwrap();

    let mut diagnostics = Diagnostics::new();
    compile_all(&temp_config(&dir), &mut diagnostics).unwrap();
    assert_eq!(diagnostics.count_of(DiagnosticKind::Convention), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::Extraction), 1);

    let mut diagnostics = Diagnostics::new();
    let config = temp_config(&dir).with_conventions(false);
    compile_all(&config, &mut diagnostics).unwrap();
    assert_eq!(diagnostics.count_of(DiagnosticKind::Convention), 0);
}

#[test]
fn test_compile_single_function() {
    let config = fixture_config();
    let info = apidoc::FunctionInfo::new("get_board", "kanban", "services/kanban/get_board.php");

    let mut diagnostics = Diagnostics::new();
    let compiled = compile_function(&info, &config, &mut diagnostics)
        .unwrap()
        .unwrap();
    let column = compiled
        .parameters
        .element()
        .unwrap()
        .as_object()
        .unwrap()
        .field("column")
        .unwrap()
        .description()
        .to_string();
    assert!(column.starts_with("The column to start from: { None = \"\", Backlog"));
    assert!(diagnostics.is_empty());
}

#[test]
fn test_missing_registry_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut diagnostics = Diagnostics::new();
    let err = compile_all(&temp_config(&dir), &mut diagnostics).unwrap_err();
    assert!(matches!(err, ApidocError::Io { .. }));
}

fn plan_service(parameters: &str, returns: &str) -> String {
    service(
        "plan",
        "get_plan",
        "use local_lbplanner\\model\\plan;",
        parameters,
        returns,
    )
}

fn plan_class(methods: &str) -> String {
    format!("<?php\nnamespace local_lbplanner\\model;\nclass plan {{\n{methods}\n}}\n")
}

#[test]
fn test_missing_delegated_method_is_reported_once() {
    let dir = write_plugin(
        &[(
            "plan",
            "get_plan",
            &plan_service(
                "return new external_function_parameters([]);",
                "return new external_multiple_structure(plan::missing_structure());",
            ),
        )],
        &[("model/plan.php", &plan_class(""))],
    );

    let mut diagnostics = Diagnostics::new();
    let functions = compile_all(&temp_config(&dir), &mut diagnostics).unwrap();

    assert_eq!(functions.len(), 1);
    let returns = functions[0].returns.element().unwrap().as_array().unwrap();
    assert_eq!(returns.element(), &apidoc::IrElement::placeholder());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.records()[0].kind, DiagnosticKind::Resolution);
    assert!(diagnostics.records()[0]
        .message
        .contains("plan::missing_structure()"));
}

#[test]
fn test_unresolved_import_is_reported_once() {
    let dir = write_plugin(
        &[(
            "plan",
            "get_plan",
            &plan_service(
                "return new external_function_parameters([]);",
                "return new external_multiple_structure(nowhere::api_structure());",
            ),
        )],
        &[],
    );

    let mut diagnostics = Diagnostics::new();
    compile_all(&temp_config(&dir), &mut diagnostics).unwrap();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics.records()[0].message,
        "Couldn't find symbol: nowhere"
    );
}

#[test]
fn test_unresolved_parameters_are_not_flagged_as_null() {
    let dir = write_plugin(
        &[(
            "plan",
            "get_plan",
            &plan_service("return plan::missing();", "return null;"),
        )],
        &[("model/plan.php", &plan_class(""))],
    );

    let mut diagnostics = Diagnostics::new();
    let functions = compile_all(&temp_config(&dir), &mut diagnostics).unwrap();

    assert_eq!(
        functions[0].parameters.absence(),
        Some(Absence::Unresolved)
    );
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.count_of(DiagnosticKind::Extraction), 0);
}

#[test]
fn test_duplicate_delegated_method_is_fatal() {
    let dir = write_plugin(
        &[(
            "plan",
            "get_plan",
            &plan_service(
                "return new external_function_parameters([]);",
                "return plan::api_structure();",
            ),
        )],
        &[(
            "model/plan.php",
            &plan_class(
                "    public static function api_structure() {\n        return null;\n    }\n    public static function api_structure() {\n        return null;\n    }",
            ),
        )],
    );

    let mut diagnostics = Diagnostics::new();
    let err = compile_all(&temp_config(&dir), &mut diagnostics).unwrap_err();
    match err {
        ApidocError::DuplicateDefinition { name, count, file } => {
            assert_eq!(name, "api_structure");
            assert_eq!(count, 2);
            assert!(file.ends_with("classes/model/plan.php"));
        }
        other => panic!("expected duplicate definition, got {other}"),
    }
}

#[test]
fn test_duplicate_service_method_is_fatal() {
    let source = service(
        "plan",
        "get_plan",
        "",
        "return new external_function_parameters([]);",
        "return null;",
    )
    .replace(
        "    public static function get_plan_returns() {",
        "    public static function get_plan_parameters() {\n        return null;\n    }\n\n    public static function get_plan_returns() {",
    );
    let dir = write_plugin(&[("plan", "get_plan", &source)], &[]);

    let mut diagnostics = Diagnostics::new();
    let err = compile_all(&temp_config(&dir), &mut diagnostics).unwrap_err();
    assert!(matches!(
        err,
        ApidocError::DuplicateDefinition { ref name, count: 2, .. } if name == "get_plan_parameters"
    ));
}

#[test]
fn test_delegation_depth_limit() {
    let dir = write_plugin(
        &[(
            "plan",
            "get_plan",
            &plan_service(
                "return new external_function_parameters([]);",
                "return plan::a();",
            ),
        )],
        &[(
            "model/plan.php",
            &plan_class(
                "    public static function a() {\n        return self::b();\n    }\n    public static function b() {\n        return new external_value(PARAM_INT, 'plan ID');\n    }",
            ),
        )],
    );

    let mut diagnostics = Diagnostics::new();
    let shallow = temp_config(&dir).with_max_delegation_depth(1);
    let err = compile_all(&shallow, &mut diagnostics).unwrap_err();
    match err {
        ApidocError::DelegationTooDeep { limit, chain } => {
            assert_eq!(limit, 1);
            assert_eq!(chain, "plan::a() -> self::b()");
        }
        other => panic!("expected delegation depth error, got {other}"),
    }

    let mut diagnostics = Diagnostics::new();
    let deep = temp_config(&dir).with_max_delegation_depth(2);
    let functions = compile_all(&deep, &mut diagnostics).unwrap();
    assert_eq!(functions[0].returns.element().unwrap().description(), "plan ID");
    assert!(diagnostics.is_empty());
}

#[test]
fn test_missing_service_file_is_reported_once() {
    let dir = write_plugin(
        &[(
            "plan",
            "get_plan",
            &plan_service("return new external_function_parameters([]);", "return null;"),
        )],
        &[],
    );
    fs::remove_file(dir.path().join("services/plan/get_plan.php")).unwrap();

    let mut diagnostics = Diagnostics::new();
    let functions = compile_all(&temp_config(&dir), &mut diagnostics).unwrap();

    assert!(functions.is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert!(diagnostics.records()[0].message.contains("does not exist"));
}
