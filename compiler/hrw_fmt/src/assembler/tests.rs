use super::*;
use pretty_assertions::assert_eq;
use std::fmt::Write as _;

#[test]
fn test_append_and_build() {
    let mut out = OutputAssembler::new();
    out.append("cond %{READ_RESPONSE_HDR_HOOK}").append(" [AND]");
    out.append_line("");
    out.append_indented("set-status 403", 1);
    assert_eq!(
        out.build(),
        "cond %{READ_RESPONSE_HDR_HOOK} [AND]\n    set-status 403\n"
    );
    assert_eq!(out.size(), out.build().len());
}

#[test]
fn test_build_is_repeatable() {
    let mut out = OutputAssembler::new();
    out.append("a");
    let first = out.build();
    let second = out.build();
    assert_eq!(first, second);
    out.append("b");
    assert_eq!(out.build(), "ab");
}

#[test]
fn test_join() {
    let mut out = OutputAssembler::new();
    out.append("(").join(["GET", "POST", "PUT"], ",").append(")");
    assert_eq!(out.as_str(), "(GET,POST,PUT)");

    let mut empty = OutputAssembler::new();
    empty.join(Vec::<String>::new(), ", ");
    assert!(empty.is_empty());
}

#[test]
fn test_clear_keeps_capacity() {
    let mut out = OutputAssembler::with_capacity(64);
    out.append("some generated text");
    let capacity = out.capacity();
    out.clear();
    assert_eq!(out.size(), 0);
    assert_eq!(out.build(), "");
    assert_eq!(out.capacity(), capacity);
    assert!(out.is_empty());
}

#[test]
fn test_fmt_write() {
    let mut out = OutputAssembler::new();
    let _ = write!(out, "set-status {}", 403);
    assert_eq!(out.into_string(), "set-status 403");
}

#[test]
fn test_growth_is_geometric() {
    // Linear accumulation: the number of reallocations grows with log(n),
    // so total bytes copied stay proportional to the output size.
    let mut out = OutputAssembler::new();
    let mut reallocations = 0;
    let mut capacity = out.capacity();
    let n = 100_000;
    for _ in 0..n {
        out.append("set-header X-Foo \"bar\"\n");
        if out.capacity() != capacity {
            reallocations += 1;
            capacity = out.capacity();
        }
    }
    assert_eq!(out.size(), n * "set-header X-Foo \"bar\"\n".len());
    assert!(reallocations <= 40, "{reallocations} reallocations");
}
