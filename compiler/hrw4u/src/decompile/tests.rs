use super::*;
use pretty_assertions::assert_eq;

fn decompile_text(config: &str) -> String {
    match decompile(config, &CompileOptions::default()) {
        Ok(output) => output.text,
        Err(err) => panic!("decompile failed: {err}"),
    }
}

#[test]
fn test_conditional_rule() {
    let config = "\
cond %{READ_RESPONSE_HDR_HOOK} [AND]
cond %{STATUS} =404
    set-status 403 [L]
";
    assert_eq!(
        decompile_text(config),
        "READ_RESPONSE {\n    if inbound.status == 404 {\n        http.status = 403;\n        break;\n    }\n}\n"
    );
}

#[test]
fn test_rules_share_section_block() {
    let config = "\
# header rules
cond %{READ_REQUEST_HDR_HOOK} [AND]
    set-header X-A \"1\"

cond %{READ_REQUEST_HDR_HOOK} [AND]
cond %{CLIENT-HEADER:X-Foo} =\"\" [NOT,OR]
cond %{CLIENT-HEADER:X-Bar} =\"\"
    rm-header X-Foo
";
    assert_eq!(
        decompile_text(config),
        "READ_REQUEST {\n    \
         inbound.req.X-A = \"1\";\n\
         \n    \
         if inbound.req.X-Foo || !inbound.req.X-Bar {\n        \
         inbound.req.X-Foo = \"\";\n    \
         }\n\
         }\n"
    );
}

#[test]
fn test_sections_and_comparisons() {
    let config = "\
set-header X-Early \"e\"
cond %{SEND_RESPONSE_HDR_HOOK}
cond %{RANDOM:100} <50
cond %{TRUE} [NOT]
    set-header X-Rand \"yes\"
cond %{CLIENT-URL:PATH} =/admin [NOCASE]
    set-status 403
";
    assert_eq!(
        decompile_text(config),
        "READ_RESPONSE {\n    \
         outbound.resp.X-Early = \"e\";\n\
         }\n\
         \n\
         SEND_RESPONSE {\n    \
         if random(100) < 50 && !true {\n        \
         inbound.resp.X-Rand = \"yes\";\n    \
         }\n\
         \n    \
         if inbound.url.path == \"/admin\" with NOCASE {\n        \
         http.status = 403;\n    \
         }\n\
         }\n"
    );
}

#[test]
fn test_negated_compare_and_regex() {
    let config = "\
cond %{REMAP_PSEUDO_HOOK}
cond %{METHOD} =GET [NOT]
cond %{CLIENT-URL:PATH} /^\\/api/
    no-op
";
    assert_eq!(
        decompile_text(config),
        "REMAP {\n    \
         if inbound.method != \"GET\" && inbound.url.path ~ /^\\/api/ {\n        \
         no-op();\n    \
         }\n\
         }\n"
    );
}

#[test]
fn test_state_variables_declared() {
    let config = "\
cond %{READ_REQUEST_HDR_HOOK} [AND]
cond %{STATE-FLAG:0}
    set-state-int8 1 42
";
    assert_eq!(
        decompile_text(config),
        "VARS {\n    \
         bool_0: bool;\n    \
         int8_1: int8;\n\
         }\n\
         \n\
         READ_REQUEST {\n    \
         if bool_0 {\n        \
         int8_1 = 42;\n    \
         }\n\
         }\n"
    );
}

#[test]
fn test_default_section() {
    let options = CompileOptions::default().with_default_section(Section::Remap);
    let output = decompile("set-destination PATH \"/x\"\n", &options);
    assert_eq!(
        output.map(|o| o.text).as_deref(),
        Ok("REMAP {\n    inbound.url.path = \"/x\";\n}\n")
    );
}

#[test]
fn test_empty_config() {
    assert_eq!(decompile_text("\n# nothing here\n\n"), "");
}

#[test]
fn test_batch_error() {
    let config = "cond %{TXN_START_HOOK}\ncond %{METHOD}\n    no-op\n";
    assert_eq!(
        decompile(config, &CompileOptions::default()),
        Err(SymbolResolutionError::not_decompilable("%{METHOD}", Section::TxnStart))
    );
}

#[test]
fn test_interactive_diagnostics() {
    let config = "cond %{TXN_START_HOOK}\ncond %{METHOD}\n    no-op\n";
    let output = match decompile(config, &CompileOptions::interactive()) {
        Ok(output) => output,
        Err(err) => panic!("interactive decompile returned {err}"),
    };
    // The guarded no-op is dropped along with its failed condition.
    assert_eq!(output.text, "");
    assert_eq!(output.diagnostics.len(), 1);

    let diag = &output.diagnostics[0];
    assert_eq!(
        diag.message,
        "no hrw4u equivalent for '%{METHOD}' in the TXN_START section"
    );
    assert_eq!(diag.primary_span(), Some(Span::new(23, 37)));
    assert!(diag.notes.iter().any(|n| n == "Current section: TXN_START"));
}

#[test]
fn test_malformed_condition() {
    assert_eq!(
        decompile("cond STATUS\n", &CompileOptions::default()),
        Err(SymbolResolutionError::invalid_argument(
            "cond STATUS",
            "expected a %{...} condition"
        ))
    );
    assert_eq!(
        decompile("cond %{STATUS\n", &CompileOptions::default()),
        Err(SymbolResolutionError::invalid_argument(
            "cond %{STATUS",
            "unterminated %{ token"
        ))
    );
}

#[test]
fn test_parse_condition() {
    let cond = parse_condition(" %{ACCESS:%{CLIENT-HEADER:Path}} =1 [NOT, OR]");
    let Ok(cond) = cond else {
        panic!("condition did not parse");
    };
    assert_eq!(cond.token, "%{ACCESS:%{CLIENT-HEADER:Path}}");
    assert_eq!(cond.comparison, "=1");
    assert_eq!(cond.modifiers, vec!["NOT", "OR"]);
    assert!(cond.has_modifier("OR"));
    assert!(!cond.has_modifier("AND"));
}

#[test]
fn test_dsl_literal() {
    assert_eq!(dsl_literal("404"), "404");
    assert_eq!(dsl_literal("\"x y\""), "\"x y\"");
    assert_eq!(dsl_literal("GET"), "\"GET\"");
    assert_eq!(dsl_literal(""), "\"\"");
}

#[test]
fn test_failed_condition_drops_rule() {
    let config = "\
cond %{READ_RESPONSE_HDR_HOOK}
cond %{NOPE-THING} =1
    set-status 403
cond %{READ_RESPONSE_HDR_HOOK}
    set-status 200
";
    let output = match decompile(config, &CompileOptions::interactive()) {
        Ok(output) => output,
        Err(err) => panic!("interactive decompile returned {err}"),
    };
    assert_eq!(output.text, "READ_RESPONSE {\n    http.status = 200;\n}\n");
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].primary_span(), Some(Span::new(31, 52)));
}

#[test]
fn test_elif_else() {
    let config = "\
cond %{READ_RESPONSE_HDR_HOOK} [AND]
cond %{STATUS} =404
    set-status 403
elif
    cond %{STATUS} =500
        set-status 502
else
    no-op
";
    assert_eq!(
        decompile_text(config),
        "READ_RESPONSE {\n    \
         if inbound.status == 404 {\n        \
         http.status = 403;\n    \
         } elif inbound.status == 500 {\n        \
         http.status = 502;\n    \
         } else {\n        \
         no-op();\n    \
         }\n\
         }\n"
    );
}

#[test]
fn test_else_needs_condition() {
    let config = "cond %{READ_RESPONSE_HDR_HOOK}\nelse\n    no-op\n";
    assert_eq!(
        decompile(config, &CompileOptions::default()),
        Err(SymbolResolutionError::invalid_argument(
            "else",
            "no preceding condition to continue"
        ))
    );
}

#[test]
fn test_groups() {
    let config = "\
cond %{READ_REQUEST_HDR_HOOK} [AND]
cond %{GROUP}
    cond %{METHOD} =GET [OR]
    cond %{METHOD} =HEAD
cond %{GROUP:END} [NOT]
cond %{CLIENT-HEADER:X-Foo} =\"\" [NOT]
    no-op
";
    assert_eq!(
        decompile_text(config),
        "READ_REQUEST {\n    \
         if !(inbound.method == \"GET\" || inbound.method == \"HEAD\") && inbound.req.X-Foo {\n        \
         no-op();\n    \
         }\n\
         }\n"
    );

    let unbalanced = "cond %{READ_REQUEST_HDR_HOOK}\ncond %{GROUP:END}\n    no-op\n";
    assert_eq!(
        decompile(unbalanced, &CompileOptions::default()),
        Err(SymbolResolutionError::invalid_argument(GROUP_END, "no open %{GROUP}"))
    );

    let unterminated = "cond %{READ_REQUEST_HDR_HOOK}\ncond %{GROUP}\ncond %{METHOD} =GET\n    no-op\n";
    assert_eq!(
        decompile(unterminated, &CompileOptions::default()),
        Err(SymbolResolutionError::invalid_argument(GROUP_START, "missing %{GROUP:END}"))
    );
}

#[test]
fn test_empty_value_on_plain_condition() {
    let config = "\
cond %{READ_RESPONSE_HDR_HOOK}
cond %{STATUS} =\"\"
    no-op
cond %{READ_RESPONSE_HDR_HOOK}
cond %{STATUS} =\"\" [NOT]
    no-op
";
    assert_eq!(
        decompile_text(config),
        "READ_RESPONSE {\n    \
         if inbound.status == \"\" {\n        \
         no-op();\n    \
         }\n\
         \n    \
         if inbound.status != \"\" {\n        \
         no-op();\n    \
         }\n\
         }\n"
    );
}

#[test]
fn test_sets_and_ranges() {
    let config = "\
cond %{READ_REQUEST_HDR_HOOK}
cond %{METHOD} (GET,HEAD)
cond %{IP:CLIENT} {10.0.0.0/8} [NOT]
    no-op
";
    assert_eq!(
        decompile_text(config),
        "READ_REQUEST {\n    \
         if inbound.method in [GET,HEAD] && !(inbound.ip in {10.0.0.0/8}) {\n        \
         no-op();\n    \
         }\n\
         }\n"
    );
}
