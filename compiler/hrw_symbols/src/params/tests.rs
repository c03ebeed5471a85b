use super::*;
use pretty_assertions::assert_eq;

#[test]
fn test_suffix_groups() {
    assert!(SuffixGroup::Any.validate("X-Forwarded-For"));
    assert!(!SuffixGroup::Any.validate(""));
    assert!(!SuffixGroup::Any.validate("has space"));

    assert!(SuffixGroup::Url.validate("path"));
    assert!(SuffixGroup::Url.validate("PATH"));
    assert!(!SuffixGroup::Url.validate("fragment"));

    assert!(SuffixGroup::Capture.validate("3"));
    assert!(!SuffixGroup::Capture.validate("10"));
    assert!(!SuffixGroup::Capture.validate("a"));
}

#[test]
fn test_value_checks() {
    let status = ValueCheck::Int { min: 100, max: 599 };
    assert_eq!(status.validate("403"), Ok(()));
    assert_eq!(status.validate("\"404\""), Ok(()));
    assert!(status.validate("99").is_err());
    assert!(status.validate("abc").is_err());

    assert_eq!(ValueCheck::Bool.validate("true"), Ok(()));
    assert!(ValueCheck::Bool.validate("yes").is_err());

    let algs = ValueCheck::OneOf(&["cubic", "bbr"]);
    assert_eq!(algs.validate("BBR"), Ok(()));
    assert!(algs.validate("reno").is_err());

    assert_eq!(ValueCheck::Any.validate(""), Ok(()));
}

#[test]
fn test_arity_display() {
    assert_eq!(Arity::NONE.to_string(), "exactly 0 arguments");
    assert_eq!(Arity::exactly(1).to_string(), "exactly 1 argument");
    assert_eq!(Arity::new(1, 2).to_string(), "1 to 2 arguments");
    assert_eq!(Arity::new(1, Arity::VARIADIC).to_string(), "at least 1 argument");
    assert!(Arity::new(1, 2).contains(2));
    assert!(!Arity::new(1, 2).contains(0));
}

#[test]
fn test_modifiers() {
    assert_eq!(OpModifiers::parse_one("l"), Some(OpModifiers::LAST));
    assert_eq!(OpModifiers::parse_one("LAST"), Some(OpModifiers::LAST));
    assert_eq!(OpModifiers::parse_one("INV"), Some(OpModifiers::INV));
    assert_eq!(OpModifiers::parse_one("NOCASE"), None);

    assert_eq!(OpModifiers::empty().render(), "");
    assert_eq!((OpModifiers::LAST | OpModifiers::QSA).render(), "[L,QSA]");
    assert_eq!(OpModifiers::INV.render(), "[I]");
}

#[test]
fn test_condition_modifiers() {
    assert_eq!(CondModifiers::parse_one("nocase"), Some(CondModifiers::NOCASE));
    assert_eq!(CondModifiers::parse_one("LAST"), Some(CondModifiers::LAST));
    assert_eq!(CondModifiers::parse_one("QSA"), None);
    assert!(CondModifiers::MATCH.contains(CondModifiers::SUF));
    assert!(!CondModifiers::MATCH.contains(CondModifiers::NOT));

    assert_eq!(CondModifiers::empty().render(), "");
    assert_eq!(
        (CondModifiers::OR | CondModifiers::NOT | CondModifiers::NOCASE).render(),
        "[NOT,NOCASE,OR]"
    );
}

#[test]
fn test_descriptor_builders() {
    let params = MapParams::new("inbound.url.", "%{CLIENT-URL:")
        .only_in(SectionSet::HTTP)
        .with_upper(SuffixGroup::Url);

    assert!(params.is_prefix());
    assert!(params.is_valid_in(Section::ReadRequest));
    assert!(!params.is_valid_in(Section::TxnStart));
    assert!(!params.is_valid_in(Section::Vars));
    assert_eq!(params.valid_sections(), SectionSet::HTTP);
    assert_eq!(params.render_target(Some("path")), "%{CLIENT-URL:PATH}");

    assert_eq!(params.primitive(), "CLIENT-URL");

    let exact = MapParams::new("inbound.ip", "%{IP:CLIENT}");
    assert!(!exact.is_prefix());
    assert!(exact.round_trip);
    assert_eq!(exact.restricted, SectionSet::VARS);
    assert_eq!(exact.render_target(None), "%{IP:CLIENT}");
    assert_eq!(exact.primitive(), "IP:CLIENT");

    let bare = MapParams::new("STATUS", "STATUS");
    assert_eq!(bare.render_target(None), "STATUS");
    assert_eq!(bare.primitive(), "STATUS");
}

#[test]
fn test_operator_target_is_primary_command() {
    let keyed = MapParams::operator(
        "inbound.req.",
        OpTemplate::keyed("set-header", "rm-header", Some("add-header")),
    );
    assert_eq!(keyed.target, "set-header");

    let call = MapParams::operator(
        "keep_query",
        OpTemplate::call_with("rm-destination", &["QUERY"], OpModifiers::INV),
    );
    assert_eq!(call.target, "rm-destination");
}
