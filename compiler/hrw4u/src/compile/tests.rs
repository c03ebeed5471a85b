use super::*;
use crate::ast::{
    Comparable, CompareOp, Comparison, Connective, Document, Factor, IfBlock, Item, SectionBlock, Statement, Term,
    VarDecl,
};
use hrw_ir::Span;
use pretty_assertions::assert_eq;

fn assign(name: &str, value: &str) -> Statement {
    Statement::Assign {
        name: name.to_owned(),
        value: value.to_owned(),
        span: Span::DUMMY,
    }
}

fn call(name: &str, args: &[&str]) -> Statement {
    Statement::Call {
        name: name.to_owned(),
        args: args.iter().map(|a| (*a).to_owned()).collect(),
        span: Span::DUMMY,
    }
}

fn ident(name: &str) -> Term {
    Term::new(Factor::Ident(name.to_owned()), Span::DUMMY)
}

fn comparison(name: &str, op: CompareOp, value: &str) -> Comparison {
    Comparison::new(Comparable::Ident(name.to_owned()), op, value)
}

fn compare(name: &str, op: CompareOp, value: &str) -> Term {
    Term::new(Factor::Compare(comparison(name, op, value)), Span::DUMMY)
}

fn section(section: Section, body: Vec<Item>) -> SectionBlock {
    SectionBlock {
        section,
        body,
        span: Span::DUMMY,
    }
}

fn if_block(terms: Vec<Term>, body: Vec<Statement>) -> Item {
    Item::If(IfBlock::new(terms, body, Span::DUMMY))
}

fn doc(sections: Vec<SectionBlock>) -> Document {
    Document {
        vars: Vec::new(),
        sections,
    }
}

fn compile_text(doc: &Document) -> String {
    match compile(doc, &CompileOptions::default()) {
        Ok(output) => output.text,
        Err(err) => panic!("compile failed: {err}"),
    }
}

#[test]
fn test_statement_run() {
    let doc = doc(vec![section(
        Section::ReadResponse,
        vec![Item::Statement(assign("http.status", "403"))],
    )]);
    assert_eq!(
        compile_text(&doc),
        "cond %{READ_RESPONSE_HDR_HOOK} [AND]\n    set-status 403\n"
    );
}

#[test]
fn test_implicit_header_test() {
    let doc = doc(vec![section(
        Section::ReadRequest,
        vec![if_block(
            vec![ident("inbound.req.X-Foo")],
            vec![assign("inbound.req.X-Bar", "\"1\"")],
        )],
    )]);
    assert_eq!(
        compile_text(&doc),
        "cond %{READ_REQUEST_HDR_HOOK} [AND]\n\
         cond %{CLIENT-HEADER:X-Foo} =\"\" [NOT]\n    \
         set-header X-Bar \"1\"\n"
    );

    let negated = Document {
        vars: Vec::new(),
        sections: vec![section(
            Section::ReadRequest,
            vec![if_block(vec![ident("inbound.req.X-Foo").negated()], vec![call("no-op", &[])])],
        )],
    };
    assert_eq!(
        compile_text(&negated),
        "cond %{READ_REQUEST_HDR_HOOK} [AND]\n\
         cond %{CLIENT-HEADER:X-Foo} =\"\"\n    \
         no-op\n"
    );
}

#[test]
fn test_comparisons_and_connectives() {
    let doc = doc(vec![section(
        Section::ReadResponse,
        vec![if_block(
            vec![
                compare("inbound.status", CompareOp::Eq, "404").or(),
                compare("inbound.status", CompareOp::Gt, "499"),
                compare("inbound.method", CompareOp::Ne, "\"GET\""),
            ],
            vec![Statement::Break { span: Span::DUMMY }],
        )],
    )]);
    assert_eq!(
        compile_text(&doc),
        "cond %{READ_RESPONSE_HDR_HOOK} [AND]\n\
         cond %{STATUS} =404 [OR]\n\
         cond %{STATUS} >499\n\
         cond %{METHOD} =\"GET\" [NOT]\n    \
         no-op [L]\n"
    );
}

#[test]
fn test_last_term_drops_or() {
    let doc = doc(vec![section(
        Section::Remap,
        vec![if_block(
            vec![Term::new(
                Factor::Call {
                    name: "random".to_owned(),
                    args: vec!["100".to_owned()],
                },
                Span::DUMMY,
            )
            .or()],
            vec![assign("inbound.url.path", "\"/b\"")],
        )],
    )]);
    assert_eq!(
        compile_text(&doc),
        "cond %{REMAP_PSEUDO_HOOK} [AND]\n\
         cond %{RANDOM:100}\n    \
         set-destination PATH \"/b\"\n"
    );
}

#[test]
fn test_bool_literal_and_variable() {
    let mut doc = doc(vec![section(
        Section::ReadRequest,
        vec![
            if_block(vec![ident("is_bot")], vec![assign("is_bot", "false")]),
            if_block(
                vec![Term::new(Factor::Bool(false), Span::DUMMY).negated()],
                vec![call("no-op", &[])],
            ),
        ],
    )]);
    doc.vars.push(VarDecl {
        name: "is_bot".to_owned(),
        ty: "bool".to_owned(),
        span: Span::DUMMY,
    });
    assert_eq!(
        compile_text(&doc),
        "cond %{READ_REQUEST_HDR_HOOK} [AND]\n\
         cond %{STATE-FLAG:0}\n    \
         set-state-flag 0 false\n\
         \n\
         cond %{READ_REQUEST_HDR_HOOK} [AND]\n\
         cond %{FALSE} [NOT]\n    \
         no-op\n"
    );
}

#[test]
fn test_rules_split_around_if() {
    let doc = doc(vec![
        section(
            Section::SendResponse,
            vec![
                Item::Statement(assign("inbound.resp.X-A", "\"1\"")),
                if_block(vec![ident("inbound.resp.X-B")], vec![assign("inbound.resp.X-B", "")]),
                Item::Statement(assign("inbound.resp.X-C", "\"3\"")),
            ],
        ),
        section(Section::TxnStart, vec![Item::Statement(call("no-op", &[]))]),
    ]);
    assert_eq!(
        compile_text(&doc),
        "cond %{SEND_RESPONSE_HDR_HOOK} [AND]\n    \
         set-header X-A \"1\"\n\
         \n\
         cond %{SEND_RESPONSE_HDR_HOOK} [AND]\n\
         cond %{HEADER:X-B} =\"\" [NOT]\n    \
         rm-header X-B\n\
         \n\
         cond %{SEND_RESPONSE_HDR_HOOK} [AND]\n    \
         set-header X-C \"3\"\n\
         \n\
         cond %{TXN_START_HOOK} [AND]\n    \
         no-op\n"
    );
}

#[test]
fn test_interpolated_value() {
    let doc = doc(vec![section(
        Section::ReadRequest,
        vec![Item::Statement(assign("inbound.req.X-Path", "\"{inbound.url.path}\""))],
    )]);
    assert_eq!(
        compile_text(&doc),
        "cond %{READ_REQUEST_HDR_HOOK} [AND]\n    set-header X-Path \"%{CLIENT-URL:PATH}\"\n"
    );
}

#[test]
fn test_batch_stops_at_first_error() {
    let doc = doc(vec![section(
        Section::TxnStart,
        vec![
            Item::Statement(assign("http.status", "403")),
            Item::Statement(call("frobnicate", &[])),
        ],
    )]);
    assert_eq!(
        compile(&doc, &CompileOptions::default()),
        Err(SymbolResolutionError::restricted("http.status", Section::TxnStart))
    );
}

#[test]
fn test_interactive_collects_and_continues() {
    let span = Span::new(10, 25);
    let doc = doc(vec![section(
        Section::TxnStart,
        vec![
            Item::Statement(Statement::Assign {
                name: "http.status".to_owned(),
                value: "403".to_owned(),
                span,
            }),
            Item::Statement(call("no-op", &[])),
        ],
    )]);

    let output = match compile(&doc, &CompileOptions::interactive()) {
        Ok(output) => output,
        Err(err) => panic!("interactive compile returned {err}"),
    };
    assert_eq!(output.text, "cond %{TXN_START_HOOK} [AND]\n    no-op\n");
    assert!(output.has_errors());
    assert_eq!(output.diagnostics.len(), 1);

    let diag = &output.diagnostics[0];
    assert_eq!(diag.message, "http.status is not available in the TXN_START section");
    assert_eq!(diag.primary_span(), Some(span));
}

#[test]
fn test_vars_section_rejected() {
    let doc = doc(vec![section(Section::Vars, vec![Item::Statement(call("no-op", &[]))])]);
    assert_eq!(
        compile(&doc, &CompileOptions::default()),
        Err(SymbolResolutionError::invalid_argument(
            "VARS",
            "only variable declarations are allowed here"
        ))
    );
}

#[test]
fn test_unknown_variable_type() {
    let mut doc = Document::default();
    doc.vars.push(VarDecl {
        name: "ratio".to_owned(),
        ty: "float".to_owned(),
        span: Span::DUMMY,
    });
    assert_eq!(
        compile(&doc, &CompileOptions::default()),
        Err(SymbolResolutionError::InvalidVariable {
            name: "ratio".to_owned(),
            reason: "unknown type 'float'".to_owned(),
        })
    );
}

#[test]
fn test_connective_default() {
    assert_eq!(Connective::default(), Connective::And);
    assert_eq!(CompareOp::Ne.as_str(), "!=");
}

#[test]
fn test_failed_condition_drops_rule() {
    let cond_span = Span::new(30, 52);
    let doc = doc(vec![section(
        Section::TxnStart,
        vec![
            Item::If(IfBlock::new(
                vec![Term::new(
                    Factor::Compare(comparison("inbound.status", CompareOp::Eq, "404")),
                    cond_span,
                )],
                vec![call("counter", &["\"x\""])],
                Span::new(27, 80),
            )),
            Item::Statement(call("no-op", &[])),
        ],
    )]);

    let output = match compile(&doc, &CompileOptions::interactive()) {
        Ok(output) => output,
        Err(err) => panic!("interactive compile returned {err}"),
    };
    // The counter must not run unguarded.
    assert_eq!(output.text, "cond %{TXN_START_HOOK} [AND]\n    no-op\n");
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].primary_span(), Some(cond_span));
}

#[test]
fn test_group() {
    let doc = doc(vec![section(
        Section::ReadRequest,
        vec![if_block(
            vec![
                Term::new(
                    Factor::Group(vec![
                        compare("inbound.method", CompareOp::Eq, "\"GET\"").or(),
                        compare("inbound.method", CompareOp::Eq, "\"HEAD\""),
                    ]),
                    Span::DUMMY,
                )
                .negated(),
                ident("inbound.req.X-Foo"),
            ],
            vec![call("no-op", &[])],
        )],
    )]);
    assert_eq!(
        compile_text(&doc),
        "cond %{READ_REQUEST_HDR_HOOK} [AND]\n\
         cond %{GROUP}\n    \
         cond %{METHOD} =\"GET\" [OR]\n    \
         cond %{METHOD} =\"HEAD\"\n\
         cond %{GROUP:END} [NOT]\n\
         cond %{CLIENT-HEADER:X-Foo} =\"\" [NOT]\n    \
         no-op\n"
    );
}

#[test]
fn test_elif_else() {
    let block = IfBlock::new(
        vec![compare("inbound.status", CompareOp::Eq, "404")],
        vec![assign("http.status", "403")],
        Span::DUMMY,
    )
    .elif(
        vec![compare("inbound.status", CompareOp::Eq, "500")],
        vec![assign("http.status", "502")],
        Span::DUMMY,
    )
    .otherwise(vec![call("no-op", &[])]);
    let doc = doc(vec![section(Section::ReadResponse, vec![Item::If(block)])]);
    assert_eq!(
        compile_text(&doc),
        "cond %{READ_RESPONSE_HDR_HOOK} [AND]\n\
         cond %{STATUS} =404\n    \
         set-status 403\n\
         elif\n    \
         cond %{STATUS} =500\n        \
         set-status 502\n\
         else\n    \
         no-op\n"
    );
}

#[test]
fn test_match_set_and_range() {
    let doc = doc(vec![section(
        Section::ReadRequest,
        vec![if_block(
            vec![
                Term::new(
                    Factor::Compare(comparison("inbound.url.path", CompareOp::Match, "/^\\/api/").with("nocase")),
                    Span::DUMMY,
                ),
                compare("inbound.method", CompareOp::In, "[GET, HEAD]"),
                compare("inbound.ip", CompareOp::In, "{10.0.0.0/8, 192.168.0.0/16}").negated(),
                compare("inbound.req.X-Foo", CompareOp::NotMatch, "/bot/"),
            ],
            vec![call("no-op", &[])],
        )],
    )]);
    assert_eq!(
        compile_text(&doc),
        "cond %{READ_REQUEST_HDR_HOOK} [AND]\n\
         cond %{CLIENT-URL:PATH} /^\\/api/ [NOCASE]\n\
         cond %{METHOD} (GET, HEAD)\n\
         cond %{IP:CLIENT} {10.0.0.0/8, 192.168.0.0/16} [NOT]\n\
         cond %{CLIENT-HEADER:X-Foo} /bot/ [NOT]\n    \
         no-op\n"
    );
}

#[test]
fn test_negated_negative_comparison() {
    let doc = doc(vec![section(
        Section::ReadResponse,
        vec![if_block(
            vec![compare("inbound.status", CompareOp::Ne, "200").negated()],
            vec![call("no-op", &[])],
        )],
    )]);
    assert_eq!(
        compile_text(&doc),
        "cond %{READ_RESPONSE_HDR_HOOK} [AND]\ncond %{STATUS} =200\n    no-op\n"
    );
}

#[test]
fn test_comparison_errors() {
    let with_unknown = doc(vec![section(
        Section::ReadRequest,
        vec![if_block(
            vec![Term::new(
                Factor::Compare(comparison("inbound.method", CompareOp::Eq, "\"GET\"").with("QSA")),
                Span::DUMMY,
            )],
            vec![call("no-op", &[])],
        )],
    )]);
    assert_eq!(
        compile(&with_unknown, &CompileOptions::default()),
        Err(SymbolResolutionError::invalid_argument("QSA", "unknown condition modifier"))
    );

    let bad_set = doc(vec![section(
        Section::ReadRequest,
        vec![if_block(
            vec![compare("inbound.method", CompareOp::In, "GET")],
            vec![call("no-op", &[])],
        )],
    )]);
    assert!(matches!(
        compile(&bad_set, &CompileOptions::default()),
        Err(SymbolResolutionError::InvalidArgument { .. })
    ));
}
