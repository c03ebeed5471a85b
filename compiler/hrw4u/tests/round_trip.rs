//! Compile documents, decompile the result, and compare.

use hrw4u::{
    compile, decompile, Comparable, CompareOp, Comparison, CompileOptions, Document, Factor, IfBlock, Item, SectionBlock,
    Statement, Term,
};
use hrw_ir::{Section, Span};
use pretty_assertions::assert_eq;

fn status_is(value: &str) -> Term {
    Term::new(
        Factor::Compare(Comparison::new(
            Comparable::Ident("inbound.status".to_owned()),
            CompareOp::Eq,
            value,
        )),
        Span::DUMMY,
    )
}

fn status_rule() -> Document {
    Document {
        vars: Vec::new(),
        sections: vec![SectionBlock {
            section: Section::ReadResponse,
            body: vec![Item::If(IfBlock::new(
                vec![status_is("404")],
                vec![Statement::Assign {
                    name: "http.status".to_owned(),
                    value: "403".to_owned(),
                    span: Span::DUMMY,
                }],
                Span::DUMMY,
            ))],
            span: Span::DUMMY,
        }],
    }
}

#[test]
fn status_rewrite_round_trips() {
    let options = CompileOptions::default();
    let compiled = match compile(&status_rule(), &options) {
        Ok(output) => output,
        Err(err) => panic!("compile failed: {err}"),
    };
    assert_eq!(
        compiled.text,
        "cond %{READ_RESPONSE_HDR_HOOK} [AND]\ncond %{STATUS} =404\n    set-status 403\n"
    );

    let decompiled = match decompile(&compiled.text, &options) {
        Ok(output) => output,
        Err(err) => panic!("decompile failed: {err}"),
    };
    assert_eq!(
        decompiled.text,
        "READ_RESPONSE {\n    if inbound.status == 404 {\n        http.status = 403;\n    }\n}\n"
    );
    assert!(!decompiled.has_errors());
}

#[test]
fn header_rules_round_trip_per_section() {
    let config = "\
cond %{READ_REQUEST_HDR_HOOK} [AND]
    set-header X-In \"1\"

cond %{SEND_REQUEST_HDR_HOOK} [AND]
    set-header X-Up \"2\"

cond %{SEND_RESPONSE_HDR_HOOK} [AND]
    rm-header Server
";
    let options = CompileOptions::default();
    let decompiled = match decompile(config, &options) {
        Ok(output) => output.text,
        Err(err) => panic!("decompile failed: {err}"),
    };
    assert_eq!(
        decompiled,
        "READ_REQUEST {\n    inbound.req.X-In = \"1\";\n}\n\n\
         SEND_REQUEST {\n    outbound.req.X-Up = \"2\";\n}\n\n\
         SEND_RESPONSE {\n    inbound.resp.Server = \"\";\n}\n"
    );

    let sections = [
        (Section::ReadRequest, "inbound.req.X-In", "\"1\""),
        (Section::SendRequest, "outbound.req.X-Up", "\"2\""),
        (Section::SendResponse, "inbound.resp.Server", "\"\""),
    ];
    let doc = Document {
        vars: Vec::new(),
        sections: sections
            .iter()
            .map(|(section, name, value)| SectionBlock {
                section: *section,
                body: vec![Item::Statement(Statement::Assign {
                    name: (*name).to_owned(),
                    value: (*value).to_owned(),
                    span: Span::DUMMY,
                })],
                span: Span::DUMMY,
            })
            .collect(),
    };
    let recompiled = match compile(&doc, &options) {
        Ok(output) => output.text,
        Err(err) => panic!("compile failed: {err}"),
    };
    assert_eq!(recompiled, config);
}

#[test]
fn branches_and_groups_round_trip() {
    let no_op = || Statement::Call {
        name: "no-op".to_owned(),
        args: Vec::new(),
        span: Span::DUMMY,
    };
    let block = IfBlock::new(
        vec![Term::new(Factor::Group(vec![status_is("404").or(), status_is("410")]), Span::DUMMY).negated()],
        vec![no_op()],
        Span::DUMMY,
    )
    .elif(vec![status_is("500")], vec![no_op()], Span::DUMMY)
    .otherwise(vec![Statement::Break { span: Span::DUMMY }]);
    let doc = Document {
        vars: Vec::new(),
        sections: vec![SectionBlock {
            section: Section::ReadResponse,
            body: vec![Item::If(block)],
            span: Span::DUMMY,
        }],
    };

    let options = CompileOptions::default();
    let compiled = match compile(&doc, &options) {
        Ok(output) => output.text,
        Err(err) => panic!("compile failed: {err}"),
    };
    let decompiled = match decompile(&compiled, &options) {
        Ok(output) => output.text,
        Err(err) => panic!("decompile failed: {err}"),
    };
    assert_eq!(
        decompiled,
        "READ_RESPONSE {\n    \
         if !(inbound.status == 404 || inbound.status == 410) {\n        \
         no-op();\n    \
         } elif inbound.status == 500 {\n        \
         no-op();\n    \
         } else {\n        \
         break;\n    \
         }\n\
         }\n"
    );
}
