//! The HTTP primitive table.
//!
//! Each entry pairs a fetcher from [`fetchers`](crate::fetchers) with a
//! matcher from the core library. Constructors validate their literal
//! arguments here, at build time, so a malformed rule never reaches a request.
//!
//! Arguments named `fold` are case-folding flags: `true` compares
//! case-insensitively.

use gatecond::{
    register_core_primitives, split_patterns, ArgKind, BoolMatcher, Condition, ContainMatcher,
    ExactMatcher, Fetcher, HashValueMatcher, InMatcher, IpInMatcher, IpRangeMatcher,
    PathElementPrefixMatcher, PeriodicTimeMatcher, PrefixInMatcher, PrimitiveTableBuilder,
    RegMatcher, SuffixInMatcher, TimeMatcher, ValueError, ValueMatcher,
};
use http::StatusCode;

use crate::fetchers::{
    ContextValueFetcher, CookieValueFetcher, HeaderValueFetcher, QueryValueFetcher,
    ResHeaderValueFetcher, TagFetcher, CLIENT_IP, CLIENT_TRUSTED, COOKIE_KEYS, HEADER_KEYS, HOST,
    HOST_TAG, METHOD, PATH, PEER_IP, PORT, PROTO, QUERY_EXIST, QUERY_KEYS, RES_CODE,
    RES_HEADER_KEYS, SECURE, TIME, TLS_CLIENT_AUTH, TLS_CLIENT_CA, TLS_SNI, URL,
    USER_AGENT_VALUE, VIP,
};
use crate::Request;

use ArgKind::{Bool as B, Str as S};

fn prim(
    name: &'static str,
    fetcher: impl Fetcher<Request> + 'static,
    matcher: impl ValueMatcher + 'static,
) -> Condition<Request> {
    Condition::primitive(name, Box::new(fetcher), Box::new(matcher))
}

/// A flag primitive: the fetched boolean must be `true`.
fn flag(name: &'static str, fetcher: impl Fetcher<Request> + 'static) -> Condition<Request> {
    prim(name, fetcher, BoolMatcher::new(true))
}

fn host_patterns(patterns: &str) -> Result<InMatcher, ValueError> {
    if let Some(p) = split_patterns(patterns).into_iter().find(|p| p.contains(':')) {
        return Err(ValueError::HostWithPort(p));
    }
    Ok(InMatcher::new(patterns, true))
}

fn port_patterns(patterns: &str) -> Result<InMatcher, ValueError> {
    for p in split_patterns(patterns) {
        if p.parse::<u16>().is_err() {
            return Err(ValueError::Port(p));
        }
    }
    Ok(InMatcher::new(patterns, false))
}

fn status_patterns(patterns: &str) -> Result<InMatcher, ValueError> {
    for p in split_patterns(patterns) {
        let valid = p
            .parse::<u16>()
            .ok()
            .and_then(|code| StatusCode::from_u16(code).ok())
            .is_some();
        if !valid {
            return Err(ValueError::StatusCode(p));
        }
    }
    Ok(InMatcher::new(patterns, false))
}

/// Register every HTTP primitive on top of the core ones.
#[must_use]
pub fn register_http_primitives(
    builder: PrimitiveTableBuilder<Request>,
) -> PrimitiveTableBuilder<Request> {
    let builder = register_core_primitives(builder);
    let builder = register_request_line(builder);
    let builder = register_addresses(builder);
    let builder = register_path(builder);
    let builder = register_query(builder);
    let builder = register_cookies(builder);
    let builder = register_headers(builder);
    let builder = register_time(builder);
    let builder = register_response(builder);
    register_tls(builder)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request line, host, tags, context
// ═══════════════════════════════════════════════════════════════════════════════

fn register_request_line(b: PrimitiveTableBuilder<Request>) -> PrimitiveTableBuilder<Request> {
    b.primitive("req_proto_secure", &[], |_| Ok(flag("req_proto_secure", SECURE)))
        .primitive("req_proto_match", &[S], |a| {
            Ok(prim("req_proto_match", PROTO, ExactMatcher::new(a.str(0)?, false)))
        })
        .primitive("req_method_in", &[S], |a| {
            Ok(prim("req_method_in", METHOD, InMatcher::new(a.str(0)?, false)))
        })
        .primitive("req_port_in", &[S], |a| {
            Ok(prim("req_port_in", PORT, port_patterns(a.str(0)?)?))
        })
        .primitive("req_host_in", &[S], |a| {
            Ok(prim("req_host_in", HOST, host_patterns(a.str(0)?)?))
        })
        .primitive("req_host_regmatch", &[S], |a| {
            Ok(prim("req_host_regmatch", HOST, RegMatcher::new(a.str(0)?)?))
        })
        .primitive("req_host_suffix_in", &[S], |a| {
            Ok(prim("req_host_suffix_in", HOST, SuffixInMatcher::new(a.str(0)?, true)))
        })
        .primitive("req_host_tag_in", &[S], |a| {
            Ok(prim("req_host_tag_in", HOST_TAG, InMatcher::new(a.str(0)?, false)))
        })
        .primitive("req_tag_match", &[S, S], |a| {
            Ok(prim(
                "req_tag_match",
                TagFetcher::new(a.str(0)?),
                ExactMatcher::new(a.str(1)?, false),
            ))
        })
        .primitive("req_context_value_in", &[S, S, B], |a| {
            Ok(prim(
                "req_context_value_in",
                ContextValueFetcher::new(a.str(0)?),
                InMatcher::new(a.str(1)?, a.bool(2)?),
            ))
        })
        .primitive("req_ua_regmatch", &[S], |a| {
            Ok(prim("req_ua_regmatch", USER_AGENT_VALUE, RegMatcher::new(a.str(0)?)?))
        })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Client, virtual, and peer addresses
// ═══════════════════════════════════════════════════════════════════════════════

fn register_addresses(b: PrimitiveTableBuilder<Request>) -> PrimitiveTableBuilder<Request> {
    b.primitive("req_cip_trusted", &[], |_| Ok(flag("req_cip_trusted", CLIENT_TRUSTED)))
        .primitive("req_cip_in", &[S], |a| {
            Ok(prim("req_cip_in", CLIENT_IP, IpInMatcher::new(a.str(0)?)?))
        })
        .primitive("req_cip_range", &[S, S], |a| {
            Ok(prim(
                "req_cip_range",
                CLIENT_IP,
                IpRangeMatcher::new(a.str(0)?, a.str(1)?)?,
            ))
        })
        .primitive("req_cip_hash_in", &[S], |a| {
            Ok(prim(
                "req_cip_hash_in",
                CLIENT_IP,
                HashValueMatcher::new(a.str(0)?, false)?,
            ))
        })
        .primitive("req_vip_in", &[S], |a| {
            Ok(prim("req_vip_in", VIP, IpInMatcher::new(a.str(0)?)?))
        })
        .primitive("req_vip_range", &[S, S], |a| {
            Ok(prim("req_vip_range", VIP, IpRangeMatcher::new(a.str(0)?, a.str(1)?)?))
        })
        .primitive("ses_vip_range", &[S, S], |a| {
            Ok(prim("ses_vip_range", VIP, IpRangeMatcher::new(a.str(0)?, a.str(1)?)?))
        })
        .primitive("ses_sip_range", &[S, S], |a| {
            Ok(prim(
                "ses_sip_range",
                PEER_IP,
                IpRangeMatcher::new(a.str(0)?, a.str(1)?)?,
            ))
        })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Path and URL
// ═══════════════════════════════════════════════════════════════════════════════

fn register_path(b: PrimitiveTableBuilder<Request>) -> PrimitiveTableBuilder<Request> {
    b.primitive("req_path_in", &[S, B], |a| {
        Ok(prim("req_path_in", PATH, InMatcher::new(a.str(0)?, a.bool(1)?)))
    })
    .primitive("req_path_prefix_in", &[S, B], |a| {
        Ok(prim(
            "req_path_prefix_in",
            PATH,
            PrefixInMatcher::new(a.str(0)?, a.bool(1)?),
        ))
    })
    .primitive("req_path_suffix_in", &[S, B], |a| {
        Ok(prim(
            "req_path_suffix_in",
            PATH,
            SuffixInMatcher::new(a.str(0)?, a.bool(1)?),
        ))
    })
    .primitive("req_path_contain", &[S, B], |a| {
        Ok(prim(
            "req_path_contain",
            PATH,
            ContainMatcher::new(a.str(0)?, a.bool(1)?),
        ))
    })
    .primitive("req_path_regmatch", &[S], |a| {
        Ok(prim("req_path_regmatch", PATH, RegMatcher::new(a.str(0)?)?))
    })
    .primitive("req_path_element_prefix_in", &[S, B], |a| {
        Ok(prim(
            "req_path_element_prefix_in",
            PATH,
            PathElementPrefixMatcher::new(a.str(0)?, a.bool(1)?),
        ))
    })
    .primitive("req_url_regmatch", &[S], |a| {
        Ok(prim("req_url_regmatch", URL, RegMatcher::new(a.str(0)?)?))
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Query string
// ═══════════════════════════════════════════════════════════════════════════════

fn register_query(b: PrimitiveTableBuilder<Request>) -> PrimitiveTableBuilder<Request> {
    b.primitive("req_query_exist", &[], |_| Ok(flag("req_query_exist", QUERY_EXIST)))
        .primitive("req_query_key_in", &[S], |a| {
            Ok(prim("req_query_key_in", QUERY_KEYS, InMatcher::new(a.str(0)?, false)))
        })
        .primitive("req_query_key_prefix_in", &[S], |a| {
            Ok(prim(
                "req_query_key_prefix_in",
                QUERY_KEYS,
                PrefixInMatcher::new(a.str(0)?, false),
            ))
        })
        .primitive("req_query_value_in", &[S, S, B], |a| {
            Ok(prim(
                "req_query_value_in",
                QueryValueFetcher::new(a.str(0)?),
                InMatcher::new(a.str(1)?, a.bool(2)?),
            ))
        })
        .primitive("req_query_value_prefix_in", &[S, S, B], |a| {
            Ok(prim(
                "req_query_value_prefix_in",
                QueryValueFetcher::new(a.str(0)?),
                PrefixInMatcher::new(a.str(1)?, a.bool(2)?),
            ))
        })
        .primitive("req_query_value_suffix_in", &[S, S, B], |a| {
            Ok(prim(
                "req_query_value_suffix_in",
                QueryValueFetcher::new(a.str(0)?),
                SuffixInMatcher::new(a.str(1)?, a.bool(2)?),
            ))
        })
        .primitive("req_query_value_contain", &[S, S, B], |a| {
            Ok(prim(
                "req_query_value_contain",
                QueryValueFetcher::new(a.str(0)?),
                ContainMatcher::new(a.str(1)?, a.bool(2)?),
            ))
        })
        .primitive("req_query_value_regmatch", &[S, S], |a| {
            Ok(prim(
                "req_query_value_regmatch",
                QueryValueFetcher::new(a.str(0)?),
                RegMatcher::new(a.str(1)?)?,
            ))
        })
        .primitive("req_query_value_hash_in", &[S, S, B], |a| {
            Ok(prim(
                "req_query_value_hash_in",
                QueryValueFetcher::new(a.str(0)?),
                HashValueMatcher::new(a.str(1)?, a.bool(2)?)?,
            ))
        })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Cookies
// ═══════════════════════════════════════════════════════════════════════════════

fn register_cookies(b: PrimitiveTableBuilder<Request>) -> PrimitiveTableBuilder<Request> {
    b.primitive("req_cookie_key_in", &[S], |a| {
        Ok(prim("req_cookie_key_in", COOKIE_KEYS, InMatcher::new(a.str(0)?, false)))
    })
    .primitive("req_cookie_value_in", &[S, S, B], |a| {
        Ok(prim(
            "req_cookie_value_in",
            CookieValueFetcher::new(a.str(0)?),
            InMatcher::new(a.str(1)?, a.bool(2)?),
        ))
    })
    .primitive("req_cookie_value_prefix_in", &[S, S, B], |a| {
        Ok(prim(
            "req_cookie_value_prefix_in",
            CookieValueFetcher::new(a.str(0)?),
            PrefixInMatcher::new(a.str(1)?, a.bool(2)?),
        ))
    })
    .primitive("req_cookie_value_suffix_in", &[S, S, B], |a| {
        Ok(prim(
            "req_cookie_value_suffix_in",
            CookieValueFetcher::new(a.str(0)?),
            SuffixInMatcher::new(a.str(1)?, a.bool(2)?),
        ))
    })
    .primitive("req_cookie_value_contain", &[S, S, B], |a| {
        Ok(prim(
            "req_cookie_value_contain",
            CookieValueFetcher::new(a.str(0)?),
            ContainMatcher::new(a.str(1)?, a.bool(2)?),
        ))
    })
    .primitive("req_cookie_value_hash_in", &[S, S, B], |a| {
        Ok(prim(
            "req_cookie_value_hash_in",
            CookieValueFetcher::new(a.str(0)?),
            HashValueMatcher::new(a.str(1)?, a.bool(2)?)?,
        ))
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request headers
// ═══════════════════════════════════════════════════════════════════════════════

fn register_headers(b: PrimitiveTableBuilder<Request>) -> PrimitiveTableBuilder<Request> {
    b.primitive("req_header_key_in", &[S], |a| {
        Ok(prim("req_header_key_in", HEADER_KEYS, InMatcher::new(a.str(0)?, true)))
    })
    .primitive("req_header_value_in", &[S, S, B], |a| {
        Ok(prim(
            "req_header_value_in",
            HeaderValueFetcher::new(a.str(0)?),
            InMatcher::new(a.str(1)?, a.bool(2)?),
        ))
    })
    .primitive("req_header_value_prefix_in", &[S, S, B], |a| {
        Ok(prim(
            "req_header_value_prefix_in",
            HeaderValueFetcher::new(a.str(0)?),
            PrefixInMatcher::new(a.str(1)?, a.bool(2)?),
        ))
    })
    .primitive("req_header_value_suffix_in", &[S, S, B], |a| {
        Ok(prim(
            "req_header_value_suffix_in",
            HeaderValueFetcher::new(a.str(0)?),
            SuffixInMatcher::new(a.str(1)?, a.bool(2)?),
        ))
    })
    .primitive("req_header_value_contain", &[S, S, B], |a| {
        Ok(prim(
            "req_header_value_contain",
            HeaderValueFetcher::new(a.str(0)?),
            ContainMatcher::new(a.str(1)?, a.bool(2)?),
        ))
    })
    .primitive("req_header_value_regmatch", &[S, S], |a| {
        Ok(prim(
            "req_header_value_regmatch",
            HeaderValueFetcher::new(a.str(0)?),
            RegMatcher::new(a.str(1)?)?,
        ))
    })
    .primitive("req_header_value_hash_in", &[S, S, B], |a| {
        Ok(prim(
            "req_header_value_hash_in",
            HeaderValueFetcher::new(a.str(0)?),
            HashValueMatcher::new(a.str(1)?, a.bool(2)?)?,
        ))
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Time
// ═══════════════════════════════════════════════════════════════════════════════

fn register_time(b: PrimitiveTableBuilder<Request>) -> PrimitiveTableBuilder<Request> {
    b.primitive("req_time_range", &[S, S], |a| {
        Ok(prim("req_time_range", TIME, TimeMatcher::new(a.str(0)?, a.str(1)?)?))
    })
    .primitive("req_periodic_time_range", &[S, S, S], |a| {
        Ok(prim(
            "req_periodic_time_range",
            TIME,
            PeriodicTimeMatcher::new(a.str(0)?, a.str(1)?, a.str(2)?)?,
        ))
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Response
// ═══════════════════════════════════════════════════════════════════════════════

fn register_response(b: PrimitiveTableBuilder<Request>) -> PrimitiveTableBuilder<Request> {
    b.primitive("res_code_in", &[S], |a| {
        Ok(prim("res_code_in", RES_CODE, status_patterns(a.str(0)?)?))
    })
    .primitive("res_header_key_in", &[S], |a| {
        Ok(prim(
            "res_header_key_in",
            RES_HEADER_KEYS,
            InMatcher::new(a.str(0)?, true),
        ))
    })
    .primitive("res_header_value_in", &[S, S, B], |a| {
        Ok(prim(
            "res_header_value_in",
            ResHeaderValueFetcher::new(a.str(0)?),
            InMatcher::new(a.str(1)?, a.bool(2)?),
        ))
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// TLS
// ═══════════════════════════════════════════════════════════════════════════════

fn register_tls(b: PrimitiveTableBuilder<Request>) -> PrimitiveTableBuilder<Request> {
    b.primitive("ses_tls_client_auth", &[], |_| {
        Ok(flag("ses_tls_client_auth", TLS_CLIENT_AUTH))
    })
    .primitive("ses_tls_sni_in", &[S], |a| {
        Ok(prim("ses_tls_sni_in", TLS_SNI, InMatcher::new(a.str(0)?, true)))
    })
    .primitive("ses_tls_client_ca_in", &[S], |a| {
        Ok(prim(
            "ses_tls_client_ca_in",
            TLS_CLIENT_CA,
            InMatcher::new(a.str(0)?, false),
        ))
    })
}
