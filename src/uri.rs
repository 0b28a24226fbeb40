//! CoAP URI compilation
//!
//! Decomposes a `coap://host[:port]/path[?query]` string into the option list
//! the request carries on the wire, plus the host/port the transport needs.
//! Path and query decoding is bounded by a staging limit; input that exceeds
//! it fails instead of being truncated.

use crate::config::COAP_DEFAULT_PORT;
use crate::error::{GatewayError, Result};
use crate::options::{
    OPTION_URI_PATH, OPTION_URI_PORT, OPTION_URI_QUERY, OptionList, encode_u16_minimal,
};

/// Result of compiling a CoAP URI
#[derive(Debug, Clone)]
pub struct CompiledUri {
    /// Host component exactly as it appeared in the URI (brackets stripped
    /// for IPv6 literals)
    pub host: String,
    /// Port component, or the CoAP default when absent
    pub port: u16,
    /// Uri-Port/Uri-Path/Uri-Query options in ascending, stable order
    pub options: OptionList,
}

/// Compile a CoAP URI string into its option list
///
/// `staging_limit` bounds the total decoded bytes of the path and of the
/// query (each counted separately, mirroring the fixed staging buffer this
/// replaces).
pub fn compile(url: &str, staging_limit: usize) -> Result<CompiledUri> {
    let rest = url
        .strip_prefix("coap://")
        .ok_or_else(|| GatewayError::UriParse(format!("missing coap:// scheme in '{url}'")))?;

    let (authority, path, query) = split_parts(rest);
    let (host, port) = parse_authority(authority)?;

    let mut options = OptionList::new();

    if port != COAP_DEFAULT_PORT {
        options.insert(OPTION_URI_PORT, encode_u16_minimal(port));
    }

    let mut path_bytes = 0usize;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let decoded = percent_decode(segment)?;
        path_bytes += decoded.len();
        if path_bytes > staging_limit {
            return Err(GatewayError::UriTooLong {
                limit: staging_limit,
                actual: path_bytes,
            });
        }
        options.insert(OPTION_URI_PATH, decoded);
    }

    let mut query_bytes = 0usize;
    for term in query.split('&').filter(|s| !s.is_empty()) {
        let decoded = percent_decode(term)?;
        query_bytes += decoded.len();
        if query_bytes > staging_limit {
            return Err(GatewayError::UriTooLong {
                limit: staging_limit,
                actual: query_bytes,
            });
        }
        options.insert(OPTION_URI_QUERY, decoded);
    }

    Ok(CompiledUri {
        host,
        port,
        options,
    })
}

/// Split `host[:port]/path?query` into its three pieces
fn split_parts(rest: &str) -> (&str, &str, &str) {
    let (authority, tail) = match rest.find(['/', '?']) {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };

    match tail.split_once('?') {
        Some((path, query)) => (authority, path, query),
        None => (authority, tail, ""),
    }
}

/// Parse `host[:port]`, with IPv6 literals in brackets
fn parse_authority(authority: &str) -> Result<(String, u16)> {
    let (host, port_str) = if let Some(inner) = authority.strip_prefix('[') {
        let (host, after) = inner
            .split_once(']')
            .ok_or_else(|| GatewayError::UriParse("unterminated IPv6 literal".to_string()))?;
        match after.strip_prefix(':') {
            Some(p) => (host, Some(p)),
            None if after.is_empty() => (host, None),
            None => {
                return Err(GatewayError::UriParse(format!(
                    "unexpected trailing characters after IPv6 literal: '{after}'"
                )));
            }
        }
    } else {
        match authority.split_once(':') {
            Some((h, p)) => (h, Some(p)),
            None => (authority, None),
        }
    };

    let port = match port_str {
        Some(p) => p
            .parse::<u16>()
            .map_err(|_| GatewayError::UriParse(format!("invalid port '{p}'")))?,
        None => COAP_DEFAULT_PORT,
    };

    Ok((host.to_string(), port))
}

/// Decode %XX escapes; malformed escapes are a parse error
fn percent_decode(s: &str) -> Result<Vec<u8>> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = s
                .get(i + 1..i + 3)
                .ok_or_else(|| GatewayError::UriParse(format!("truncated percent escape in '{s}'")))?;
            let value = u8::from_str_radix(hex, 16)
                .map_err(|_| GatewayError::UriParse(format!("invalid percent escape '%{hex}'")))?;
            out.push(value);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OPTION_URI_HOST;

    #[test]
    fn test_default_port_emits_no_port_option() {
        let compiled = compile("coap://example.org:5683/rd", 40).unwrap();
        assert_eq!(compiled.port, COAP_DEFAULT_PORT);
        assert!(compiled.options.values_for(OPTION_URI_PORT).is_empty());
    }

    #[test]
    fn test_nondefault_port_is_minimal_big_endian() {
        let compiled = compile("coap://example.org:61616/rd", 40).unwrap();
        assert_eq!(compiled.port, 61616);
        let ports = compiled.options.values_for(OPTION_URI_PORT);
        assert_eq!(ports, vec![[0xF0, 0xB0].as_slice()]);

        let compiled = compile("coap://example.org:80/rd", 40).unwrap();
        assert_eq!(compiled.options.values_for(OPTION_URI_PORT), vec![[80].as_slice()]);
    }

    #[test]
    fn test_path_segments_stay_in_order() {
        let compiled = compile("coap://h/a/b/c", 40).unwrap();
        let paths = compiled.options.values_for(OPTION_URI_PATH);
        assert_eq!(paths, vec![b"a".as_slice(), b"b", b"c"]);
    }

    #[test]
    fn test_rd_registration_shape() {
        let compiled = compile("coap://127.0.0.1:61616/rd?ep=sensor1", 40).unwrap();
        assert_eq!(compiled.host, "127.0.0.1");

        // end-to-end ascending option numbers: Port(7) < Path(11) < Query(15)
        let numbers: Vec<u16> = compiled.options.iter().map(|e| e.number).collect();
        let mut sorted = numbers.clone();
        sorted.sort();
        assert_eq!(numbers, sorted);
        assert_eq!(
            numbers,
            vec![OPTION_URI_PORT, OPTION_URI_PATH, OPTION_URI_QUERY]
        );
        assert_eq!(
            compiled.options.values_for(OPTION_URI_QUERY),
            vec![b"ep=sensor1".as_slice()]
        );
        assert!(compiled.options.values_for(OPTION_URI_HOST).is_empty());
    }

    #[test]
    fn test_query_terms_split_on_ampersand() {
        let compiled = compile("coap://h/rd?ep=node1&lt=90", 40).unwrap();
        let queries = compiled.options.values_for(OPTION_URI_QUERY);
        assert_eq!(queries, vec![b"ep=node1".as_slice(), b"lt=90"]);
    }

    #[test]
    fn test_ipv6_literal() {
        let compiled = compile("coap://[2001:db8::1]:61616/rd", 40).unwrap();
        assert_eq!(compiled.host, "2001:db8::1");
        assert_eq!(compiled.port, 61616);
    }

    #[test]
    fn test_percent_decoding() {
        let compiled = compile("coap://h/temp%20probe", 40).unwrap();
        assert_eq!(
            compiled.options.values_for(OPTION_URI_PATH),
            vec![b"temp probe".as_slice()]
        );

        let err = compile("coap://h/bad%zz", 40).unwrap_err();
        assert!(matches!(err, GatewayError::UriParse(_)));
    }

    #[test]
    fn test_missing_scheme_fails() {
        let err = compile("http://example.org/rd", 40).unwrap_err();
        assert!(matches!(err, GatewayError::UriParse(_)));

        let err = compile("rd?ep=x", 40).unwrap_err();
        assert!(matches!(err, GatewayError::UriParse(_)));
    }

    #[test]
    fn test_invalid_port_fails() {
        let err = compile("coap://h:99999/rd", 40).unwrap_err();
        assert!(matches!(err, GatewayError::UriParse(_)));
    }

    #[test]
    fn test_staging_limit_enforced_not_truncated() {
        let long = "a".repeat(41);
        let err = compile(&format!("coap://h/{long}"), 40).unwrap_err();
        assert!(matches!(err, GatewayError::UriTooLong { limit: 40, .. }));

        // path and query budgets are independent
        let ok = compile(&format!("coap://h/{}?{}", "a".repeat(40), "b".repeat(40)), 40);
        assert!(ok.is_ok());
    }
}
