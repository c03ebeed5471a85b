//! The shipped header-rewrite vocabulary.
//!
//! Adding a symbol requires only adding a row here. Where several hrw4u
//! spellings share one primitive, exactly one is round-trippable per section;
//! the others are marked `alias()`, and `REVERSE_ALIASES` picks the spelling
//! the decompiler produces in each section.

use hrw_ir::{SectionSet, SymbolKind};

use crate::params::{Arity, MapParams, OpModifiers, OpTemplate, SuffixGroup, ValueCheck};
use crate::table::{ReverseAlias, TableData};

const HTTP: SectionSet = SectionSet::HTTP;
const CLIENT_REQUEST: SectionSet = SectionSet::CLIENT_REQUEST;
/// Hooks where the origin request is still being built.
const UPSTREAM_REQUEST: SectionSet = SectionSet::CLIENT_REQUEST.union(SectionSet::SEND_REQUEST);
/// Hooks where a response to the client exists.
const CLIENT_RESPONSE: SectionSet = SectionSet::READ_RESPONSE
    .union(SectionSet::SEND_RESPONSE)
    .union(SectionSet::TXN_CLOSE);

const HEADER_OPS: OpTemplate = OpTemplate::keyed("set-header", "rm-header", Some("add-header"));
const COOKIE_OPS: OpTemplate = OpTemplate::keyed("set-cookie", "rm-cookie", Some("add-cookie"));
const URL_OPS: OpTemplate = OpTemplate::keyed("set-destination", "rm-destination", None);

const STATUS_CODE: ValueCheck = ValueCheck::Int { min: 100, max: 599 };

/// Every table the built-in resolvers use.
pub static DATA: TableData = TableData {
    conditions: CONDITIONS,
    operators: OPERATORS,
    functions: FUNCTIONS,
    statements: STATEMENTS,
    reverse_aliases: REVERSE_ALIASES,
};

pub const CONDITIONS: &[MapParams] = &[
    // Addresses
    MapParams::new("inbound.ip", "%{IP:CLIENT}").with_doc("Client IP address."),
    MapParams::new("inbound.server", "%{IP:INBOUND}").with_doc("Local address the client connected to."),
    MapParams::new("outbound.ip", "%{IP:SERVER}")
        .only_in(HTTP)
        .with_doc("Origin server IP address."),
    MapParams::new("outbound.server", "%{IP:OUTBOUND}")
        .only_in(HTTP)
        .with_doc("Local address of the origin connection."),
    // Request line and status
    MapParams::new("inbound.method", "%{METHOD}")
        .only_in(HTTP)
        .with_doc("Client request method."),
    MapParams::new("outbound.method", "%{METHOD}")
        .only_in(UPSTREAM_REQUEST)
        .alias(),
    MapParams::new("inbound.status", "%{STATUS}")
        .only_in(HTTP)
        .with_doc("HTTP status code of the transaction response."),
    MapParams::new("outbound.status", "%{STATUS}").only_in(HTTP).alias(),
    // Time and connection state
    MapParams::new("now", "%{NOW}").with_doc("Current time, seconds since the epoch."),
    MapParams::new("now.", "%{NOW:")
        .with_upper(SuffixGroup::Date)
        .with_doc("Component of the current local time."),
    MapParams::new("tcp.info", "%{TCP-INFO}").with_doc("TCP statistics for the client connection."),
    MapParams::new("capture.", "%{LAST-CAPTURE:")
        .with_suffix(SuffixGroup::Capture)
        .with_doc("Capture group of the last regular expression match."),
    MapParams::new("geo.", "%{GEO:")
        .with_upper(SuffixGroup::Geo)
        .with_doc("Geolocation of the client address."),
    MapParams::new("id.", "%{ID:")
        .with_upper(SuffixGroup::Id)
        .with_doc("Request, process or unique identifier."),
    MapParams::new("http.cntl.", "%{HTTP-CNTL:")
        .only_in(HTTP)
        .with_upper(SuffixGroup::HttpCntl)
        .negatable()
        .with_doc("Transaction control flag."),
    // Connections and certificates
    MapParams::new("inbound.conn.", "%{INBOUND:")
        .with_upper(SuffixGroup::Conn)
        .negatable()
        .with_doc("Property of the client connection."),
    MapParams::new("inbound.conn.client-cert.", "%{INBOUND:CLIENT-CERT:")
        .with_upper(SuffixGroup::Cert)
        .with_doc("Field of the certificate presented by the client."),
    MapParams::new("inbound.conn.server-cert.", "%{INBOUND:SERVER-CERT:")
        .with_upper(SuffixGroup::Cert)
        .with_doc("Field of the certificate presented to the client."),
    MapParams::new("inbound.conn.client-cert.san.", "%{INBOUND:CLIENT-CERT:SAN:")
        .with_upper(SuffixGroup::San)
        .with_doc("Subject alternative name of the client certificate."),
    MapParams::new("inbound.conn.client-cert.SAN.", "%{INBOUND:CLIENT-CERT:SAN:")
        .with_upper(SuffixGroup::San)
        .alias(),
    MapParams::new("inbound.conn.server-cert.san.", "%{INBOUND:SERVER-CERT:SAN:")
        .with_upper(SuffixGroup::San)
        .with_doc("Subject alternative name of the server certificate."),
    MapParams::new("inbound.conn.server-cert.SAN.", "%{INBOUND:SERVER-CERT:SAN:")
        .with_upper(SuffixGroup::San)
        .alias(),
    MapParams::new("outbound.conn.", "%{OUTBOUND:")
        .only_in(HTTP)
        .with_upper(SuffixGroup::Conn)
        .negatable()
        .with_doc("Property of the origin connection."),
    MapParams::new("outbound.conn.client-cert.", "%{OUTBOUND:CLIENT-CERT:")
        .only_in(HTTP)
        .with_upper(SuffixGroup::Cert),
    MapParams::new("outbound.conn.server-cert.", "%{OUTBOUND:SERVER-CERT:")
        .only_in(HTTP)
        .with_upper(SuffixGroup::Cert),
    MapParams::new("outbound.conn.client-cert.san.", "%{OUTBOUND:CLIENT-CERT:SAN:")
        .only_in(HTTP)
        .with_upper(SuffixGroup::San),
    MapParams::new("outbound.conn.client-cert.SAN.", "%{OUTBOUND:CLIENT-CERT:SAN:")
        .only_in(HTTP)
        .with_upper(SuffixGroup::San)
        .alias(),
    MapParams::new("outbound.conn.server-cert.san.", "%{OUTBOUND:SERVER-CERT:SAN:")
        .only_in(HTTP)
        .with_upper(SuffixGroup::San),
    MapParams::new("outbound.conn.server-cert.SAN.", "%{OUTBOUND:SERVER-CERT:SAN:")
        .only_in(HTTP)
        .with_upper(SuffixGroup::San)
        .alias(),
    // Headers and cookies
    MapParams::new("inbound.req.", "%{CLIENT-HEADER:")
        .only_in(HTTP)
        .negatable()
        .with_doc("Client request header."),
    MapParams::new("inbound.resp.", "%{HEADER:")
        .only_in(CLIENT_RESPONSE)
        .negatable()
        .alias()
        .with_doc("Header of the response sent to the client."),
    MapParams::new("outbound.req.", "%{HEADER:")
        .only_in(UPSTREAM_REQUEST)
        .negatable()
        .alias()
        .with_doc("Header of the request sent to the origin."),
    MapParams::new("outbound.resp.", "%{HEADER:")
        .only_in(HTTP)
        .negatable()
        .alias()
        .with_doc("Header of the origin response."),
    MapParams::new("inbound.cookie.", "%{COOKIE:")
        .only_in(HTTP)
        .negatable()
        .with_doc("Client request cookie."),
    MapParams::new("outbound.cookie.", "%{COOKIE:")
        .only_in(HTTP)
        .negatable()
        .alias(),
    // URLs
    MapParams::new("inbound.url.", "%{CLIENT-URL:")
        .only_in(HTTP)
        .with_upper(SuffixGroup::Url)
        .with_doc("Component of the client request URL."),
    MapParams::new("outbound.url.", "%{NEXT-HOP:")
        .only_in(UPSTREAM_REQUEST)
        .with_upper(SuffixGroup::Url)
        .with_doc("Component of the next-hop URL."),
    MapParams::new("from.url.", "%{FROM-URL:")
        .only_in(HTTP)
        .with_upper(SuffixGroup::Url)
        .with_doc("Component of the remap rule's source URL."),
    MapParams::new("to.url.", "%{TO-URL:")
        .with_upper(SuffixGroup::Url)
        .with_doc("Component of the remap rule's target URL."),
];

pub const OPERATORS: &[MapParams] = &[
    MapParams::operator("http.cntl.", OpTemplate::value("set-http-cntl"))
        .only_in(HTTP)
        .with_upper(SuffixGroup::HttpCntl)
        .with_value(ValueCheck::Bool)
        .with_doc("Turn a transaction control flag on or off."),
    MapParams::operator("http.status", OpTemplate::value("set-status"))
        .only_in(HTTP)
        .with_value(STATUS_CODE)
        .with_doc("Set the response status code."),
    MapParams::operator("http.status.reason", OpTemplate::value("set-status-reason"))
        .only_in(HTTP)
        .with_doc("Set the response reason phrase."),
    MapParams::operator("inbound.status", OpTemplate::value("set-status"))
        .only_in(HTTP)
        .with_value(STATUS_CODE)
        .alias(),
    MapParams::operator("inbound.status.reason", OpTemplate::value("set-status-reason"))
        .only_in(HTTP)
        .alias(),
    MapParams::operator("outbound.status", OpTemplate::value("set-status"))
        .only_in(HTTP)
        .with_value(STATUS_CODE)
        .alias(),
    MapParams::operator("outbound.status.reason", OpTemplate::value("set-status-reason"))
        .only_in(HTTP)
        .alias(),
    MapParams::operator("inbound.conn.dscp", OpTemplate::value("set-conn-dscp"))
        .only_in(HTTP)
        .with_value(ValueCheck::Int { min: 0, max: 63 })
        .with_doc("Set the DSCP value of the client connection."),
    MapParams::operator("inbound.conn.mark", OpTemplate::value("set-conn-mark"))
        .only_in(HTTP)
        .with_value(ValueCheck::Int {
            min: 0,
            max: 4_294_967_295,
        })
        .with_doc("Set the packet mark of the client connection."),
    MapParams::operator("outbound.conn.dscp", OpTemplate::value("set-conn-dscp"))
        .only_in(CLIENT_REQUEST)
        .with_value(ValueCheck::Int { min: 0, max: 63 })
        .alias(),
    MapParams::operator("outbound.conn.mark", OpTemplate::value("set-conn-mark"))
        .only_in(CLIENT_REQUEST)
        .with_value(ValueCheck::Int {
            min: 0,
            max: 4_294_967_295,
        })
        .alias(),
    MapParams::operator("inbound.resp.body", OpTemplate::value("set-body"))
        .only_in(HTTP)
        .with_doc("Replace the response body."),
    // Headers
    MapParams::operator("inbound.req.", HEADER_OPS)
        .only_in(HTTP)
        .alias()
        .with_doc("Set, append to or remove a client request header."),
    MapParams::operator("inbound.resp.", HEADER_OPS)
        .only_in(CLIENT_RESPONSE)
        .alias()
        .with_doc("Set, append to or remove a client response header."),
    MapParams::operator("outbound.req.", HEADER_OPS)
        .only_in(UPSTREAM_REQUEST)
        .alias()
        .with_doc("Set, append to or remove an origin request header."),
    MapParams::operator("outbound.resp.", HEADER_OPS)
        .only_in(HTTP)
        .alias()
        .with_doc("Set, append to or remove an origin response header."),
    // Cookies and URLs
    MapParams::operator("inbound.cookie.", COOKIE_OPS)
        .only_in(HTTP)
        .with_doc("Set, append to or remove a client request cookie."),
    MapParams::operator("outbound.cookie.", COOKIE_OPS)
        .only_in(HTTP)
        .alias(),
    MapParams::operator("inbound.url.", URL_OPS)
        .only_in(HTTP)
        .with_upper(SuffixGroup::Url)
        .with_doc("Rewrite or remove a component of the request URL."),
    MapParams::operator("outbound.url.", URL_OPS)
        .only_in(UPSTREAM_REQUEST)
        .with_upper(SuffixGroup::Url)
        .alias(),
];

pub const FUNCTIONS: &[MapParams] = &[
    MapParams::new("access", "ACCESS")
        .with_arity(1, 1)
        .with_doc("True if the file at the given path exists."),
    MapParams::new("cache", "CACHE").with_doc("Cache lookup result: miss, hit-stale, hit-fresh or skipped."),
    MapParams::new("cidr", "CIDR")
        .with_arity(1, 2)
        .with_doc("Client address masked to the given IPv4 and IPv6 prefix lengths."),
    MapParams::new("internal", "INTERNAL-TRANSACTION")
        .negatable()
        .with_doc("True for transactions originated inside the proxy."),
    MapParams::new("random", "RANDOM")
        .with_arity(1, 1)
        .with_doc("Random number from 0 up to, but not including, the argument."),
    MapParams::new("ssn-txn-count", "SSN-TXN-COUNT").with_doc("Transactions seen on the client session."),
    MapParams::new("txn-count", "TXN-COUNT").with_doc("Transactions seen on the origin connection."),
];

pub const STATEMENTS: &[MapParams] = &[
    MapParams::operator("add-header", OpTemplate::call("add-header"))
        .only_in(HTTP)
        .with_arity(2, 2)
        .alias()
        .with_doc("Append a header value."),
    MapParams::operator("counter", OpTemplate::call("counter"))
        .with_arity(1, 1)
        .with_doc("Increment a statistics counter."),
    MapParams::operator("keep_query", OpTemplate::call_with("rm-destination", &["QUERY"], OpModifiers::INV))
        .only_in(HTTP)
        .with_arity(1, 1)
        .with_doc("Keep only the listed query parameters."),
    MapParams::operator("no-op", OpTemplate::call("no-op")).with_doc("Do nothing."),
    MapParams::operator("remove_query", OpTemplate::call_with("rm-destination", &["QUERY"], OpModifiers::empty()))
        .only_in(HTTP)
        .with_arity(1, 1)
        .with_doc("Remove the listed query parameters."),
    MapParams::operator("run-plugin", OpTemplate::call("run-plugin"))
        .only_in(HTTP)
        .with_arity(1, Arity::VARIADIC)
        .with_doc("Run a remap plugin with the given arguments."),
    MapParams::operator("set-body-from", OpTemplate::call("set-body-from"))
        .only_in(HTTP)
        .with_arity(1, 1)
        .with_doc("Fetch the response body from a URL."),
    MapParams::operator("set-cc-alg", OpTemplate::call("set-cc-alg"))
        .only_in(HTTP)
        .with_arity(1, 1)
        .with_doc("Set the congestion control algorithm of the client connection."),
    MapParams::operator("set-config", OpTemplate::call("set-config"))
        .only_in(HTTP)
        .with_arity(2, 2)
        .with_doc("Override a configuration variable for this transaction."),
    MapParams::operator("set-debug", OpTemplate::call("set-debug")).with_doc("Enable debugging for this transaction."),
    MapParams::operator("set-effective-address", OpTemplate::call("set-effective-address"))
        .only_in(HTTP)
        .with_arity(1, 1)
        .with_doc("Override the client address used by later plugins."),
    MapParams::operator("set-plugin-cntl", OpTemplate::call("set-plugin-cntl"))
        .only_in(HTTP)
        .with_arity(2, 2)
        .with_doc("Set a plugin control option."),
    MapParams::operator("set-redirect", OpTemplate::call("set-redirect"))
        .only_in(HTTP)
        .with_arity(2, 2)
        .with_doc("Redirect the client with the given status and URL."),
    MapParams::operator("skip-remap", OpTemplate::call("skip-remap"))
        .only_in(SectionSet::PRE_REMAP.union(SectionSet::READ_REQUEST))
        .with_arity(1, 1)
        .with_doc("Skip remap processing for this transaction."),
];

/// Per-section spellings for primitives shared by several aliases.
pub const REVERSE_ALIASES: &[ReverseAlias] = &[
    // %{HEADER:...} means the client request before the origin is contacted.
    ReverseAlias::new(SymbolKind::Condition, "inbound.req.", CLIENT_REQUEST).with_primitive("%{HEADER:"),
    ReverseAlias::new(SymbolKind::Condition, "outbound.req.", SectionSet::SEND_REQUEST),
    ReverseAlias::new(SymbolKind::Condition, "outbound.resp.", SectionSet::READ_RESPONSE),
    ReverseAlias::new(
        SymbolKind::Condition,
        "inbound.resp.",
        SectionSet::SEND_RESPONSE.union(SectionSet::TXN_CLOSE),
    ),
    ReverseAlias::new(SymbolKind::Operator, "inbound.req.", CLIENT_REQUEST),
    ReverseAlias::new(SymbolKind::Operator, "outbound.req.", SectionSet::SEND_REQUEST),
    ReverseAlias::new(SymbolKind::Operator, "outbound.resp.", SectionSet::READ_RESPONSE),
    ReverseAlias::new(
        SymbolKind::Operator,
        "inbound.resp.",
        SectionSet::SEND_RESPONSE.union(SectionSet::TXN_CLOSE),
    ),
];
