//! SIP addresses and the canonical keys derived from them.
//!
//! An [`AddressKey`] is the string form of an address once the display name,
//! URI parameters and URI headers are gone. Two addresses that point at the
//! same participant (different `tag`/`gr` parameters, different display names,
//! host case) share one key.

use std::{fmt, str::FromStr};

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0},
    combinator::{map, opt, recognize},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address is empty")]
    Empty,
    #[error("address {0:?} has no URI scheme")]
    MissingScheme(String),
    #[error("unsupported URI scheme {0:?}")]
    UnsupportedScheme(String),
    #[error("address has an empty host")]
    EmptyHost,
    #[error("invalid port {0:?}")]
    InvalidPort(String),
    #[error("unterminated '<' in address")]
    UnterminatedAngleBracket,
    #[error("unexpected {0:?} at the end of address")]
    TrailingInput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Sip,
    Sips,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sip => "sip",
            Self::Sips => "sips",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct SipAddress {
    display_name: Option<String>,
    scheme: Scheme,
    username: Option<String>,
    host: String,
    port: Option<u16>,
    params: Vec<(String, Option<String>)>,
    headers: Vec<(String, String)>,
}

impl SipAddress {
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn param(&self, name: &str) -> Option<Option<&str>> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_deref())
    }

    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    /// Drops URI parameters and URI headers in place.
    pub fn clean(&mut self) {
        self.params.clear();
        self.headers.clear();
    }

    /// Returns a cleaned copy, leaving `self` untouched.
    pub fn cleaned(&self) -> Self {
        let mut clone = self.clone();
        clone.clean();
        clone
    }

    /// URI form without the display name.
    pub fn as_string_uri_only(&self) -> String {
        let mut uri = format!("{}:", self.scheme.as_str());

        if let Some(user) = &self.username {
            uri.push_str(user);
            uri.push('@');
        }

        uri.push_str(&self.host);

        if let Some(port) = self.port {
            uri.push_str(&format!(":{port}"));
        }

        for (name, value) in &self.params {
            uri.push(';');
            uri.push_str(name);
            if let Some(value) = value {
                uri.push('=');
                uri.push_str(value);
            }
        }

        if !self.headers.is_empty() {
            let headers = self
                .headers
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("&");
            uri.push('?');
            uri.push_str(&headers);
        }

        uri
    }

    /// Human-facing name: display name, then user part, then the bare URI.
    pub fn formatted_name(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| self.as_string_uri_only())
    }
}

impl fmt::Display for SipAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "\"{}\" <{}>", name, self.as_string_uri_only()),
            None => f.write_str(&self.as_string_uri_only()),
        }
    }
}

impl FromStr for SipAddress {
    type Err = AddressParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AddressParseError::Empty);
        }

        let (display_name, uri) = split_name_addr(raw)?;
        let mut address = parse_uri(uri)?;
        address.display_name = display_name;
        Ok(address)
    }
}

impl TryFrom<String> for SipAddress {
    type Error = AddressParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Canonical cache key for a participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AddressKey(String);

impl AddressKey {
    pub fn normalize(address: &SipAddress) -> Self {
        Self(address.cleaned().as_string_uri_only())
    }

    pub fn parse(raw: &str) -> Result<Self, AddressParseError> {
        raw.parse::<SipAddress>().map(|address| Self::normalize(&address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type ParseResult<'a, T> = IResult<&'a str, T>;

// scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn is_scheme_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
}

fn is_user_char(c: char) -> bool {
    !matches!(c, '@' | ':' | ';' | '?' | '<' | '>') && !c.is_whitespace()
}

fn is_password_char(c: char) -> bool {
    !matches!(c, '@' | ';' | '?' | '<' | '>') && !c.is_whitespace()
}

// hostname = *( domainlabel "." ) toplabel [ "." ]; IPv4 fits the same set
fn is_host_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_')
}

fn is_ipv6_char(c: char) -> bool {
    c.is_ascii_hexdigit() || matches!(c, ':' | '.')
}

fn is_param_char(c: char) -> bool {
    !matches!(c, ';' | '?' | '=' | '<' | '>') && !c.is_whitespace()
}

fn is_header_char(c: char) -> bool {
    !matches!(c, '&' | '=' | '<' | '>') && !c.is_whitespace()
}

fn scheme(input: &str) -> ParseResult<'_, &str> {
    terminated(take_while1(is_scheme_char), char(':'))(input)
}

// userinfo = user [ ":" password ] "@"; the password is consumed and dropped.
// It only ever matches before the first ';', so '@' inside a parameter value
// never moves the user/host boundary.
fn userinfo(input: &str) -> ParseResult<'_, &str> {
    terminated(
        take_while1(is_user_char),
        pair(
            opt(preceded(char(':'), take_while(is_password_char))),
            char('@'),
        ),
    )(input)
}

// host = hostname / IPv4address / IPv6reference
fn host(input: &str) -> ParseResult<'_, &str> {
    alt((
        recognize(delimited(char('['), take_while1(is_ipv6_char), char(']'))),
        take_while1(is_host_char),
    ))(input)
}

fn port(input: &str) -> ParseResult<'_, &str> {
    preceded(char(':'), take_while(|c: char| !matches!(c, ';' | '?')))(input)
}

// uri-parameter = ";" pname [ "=" pvalue ]
fn uri_param(input: &str) -> ParseResult<'_, (String, Option<String>)> {
    map(
        preceded(
            char(';'),
            pair(
                take_while1(is_param_char),
                opt(preceded(char('='), take_while(is_param_char))),
            ),
        ),
        |(name, value): (&str, Option<&str>)| {
            (name.to_ascii_lowercase(), value.map(str::to_owned))
        },
    )(input)
}

// headers = "?" header *( "&" header )
fn uri_headers(input: &str) -> ParseResult<'_, Vec<(String, String)>> {
    preceded(
        char('?'),
        separated_list1(
            char('&'),
            map(
                pair(
                    take_while1(is_header_char),
                    opt(preceded(char('='), take_while(is_header_char))),
                ),
                |(name, value): (&str, Option<&str>)| {
                    (name.to_owned(), value.unwrap_or_default().to_owned())
                },
            ),
        ),
    )(input)
}

// name-addr = [ display-name ] LAQUOT addr-spec RAQUOT
fn name_addr(input: &str) -> ParseResult<'_, (&str, &str)> {
    pair(
        terminated(
            alt((
                delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
                take_while(|c: char| c != '<' && c != '"'),
            )),
            multispace0,
        ),
        delimited(char('<'), take_while(|c: char| c != '>'), char('>')),
    )(input)
}

fn split_name_addr(raw: &str) -> Result<(Option<String>, &str), AddressParseError> {
    if !raw.contains('<') {
        return Ok((None, raw));
    }

    // Header parameters after the closing bracket are not part of the URI.
    let (_, (name, uri)) =
        name_addr(raw).map_err(|_| AddressParseError::UnterminatedAngleBracket)?;

    let name = name.trim();
    let display_name = (!name.is_empty()).then(|| name.to_owned());

    Ok((display_name, uri.trim()))
}

fn parse_uri(uri: &str) -> Result<SipAddress, AddressParseError> {
    let (rest, scheme_name) =
        scheme(uri).map_err(|_| AddressParseError::MissingScheme(uri.to_owned()))?;

    let scheme = match scheme_name.to_ascii_lowercase().as_str() {
        "sip" => Scheme::Sip,
        "sips" => Scheme::Sips,
        _ => return Err(AddressParseError::UnsupportedScheme(scheme_name.to_owned())),
    };

    let (rest, username) = opt(userinfo)(rest).map_err(|_| AddressParseError::EmptyHost)?;
    let (rest, host) = host(rest).map_err(|_| AddressParseError::EmptyHost)?;
    let (rest, port) = opt(port)(rest).map_err(|_| AddressParseError::EmptyHost)?;

    let port = port
        .map(|value| {
            value
                .parse::<u16>()
                .map_err(|_| AddressParseError::InvalidPort(value.to_owned()))
        })
        .transpose()?;

    let (rest, params) = many0(uri_param)(rest)
        .map_err(|_| AddressParseError::TrailingInput(rest.to_owned()))?;
    let (rest, headers) = opt(uri_headers)(rest)
        .map_err(|_| AddressParseError::TrailingInput(rest.to_owned()))?;

    if !rest.is_empty() {
        return Err(AddressParseError::TrailingInput(rest.to_owned()));
    }

    Ok(SipAddress {
        display_name: None,
        scheme,
        username: username.map(str::to_owned),
        host: host.to_ascii_lowercase(),
        port,
        params,
        headers: headers.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> SipAddress {
        raw.parse().expect("address should parse")
    }

    #[test]
    fn parses_bare_sip_uri() {
        let address = parse("sip:alice@example.org");

        assert_eq!(address.scheme(), Scheme::Sip);
        assert_eq!(address.username(), Some("alice"));
        assert_eq!(address.host(), "example.org");
        assert_eq!(address.port(), None);
        assert_eq!(address.display_name(), None);
    }

    #[test]
    fn parses_name_addr_with_port_params_and_headers() {
        let address =
            parse("\"Alice Liddell\" <sips:alice@Example.ORG:5061;transport=tls;gr?Subject=hi>");

        assert_eq!(address.display_name(), Some("Alice Liddell"));
        assert_eq!(address.scheme(), Scheme::Sips);
        assert_eq!(address.host(), "example.org");
        assert_eq!(address.port(), Some(5061));
        assert_eq!(address.param("transport"), Some(Some("tls")));
        assert_eq!(address.param("gr"), Some(None));
        assert!(address.has_headers());
    }

    #[test]
    fn parses_ipv6_host_with_port() {
        let address = parse("sip:bob@[2001:db8::1]:5070");

        assert_eq!(address.host(), "[2001:db8::1]");
        assert_eq!(address.port(), Some(5070));
    }

    #[test]
    fn drops_password_from_userinfo() {
        let address = parse("sip:carol:secret@example.org");

        assert_eq!(address.username(), Some("carol"));
        assert!(!address.as_string_uri_only().contains("secret"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert_eq!("".parse::<SipAddress>(), Err(AddressParseError::Empty));
        assert_eq!(
            "alice".parse::<SipAddress>(),
            Err(AddressParseError::MissingScheme("alice".to_owned()))
        );
        assert_eq!(
            "http://example.org".parse::<SipAddress>(),
            Err(AddressParseError::UnsupportedScheme("http".to_owned()))
        );
        assert_eq!(
            "sip:alice@".parse::<SipAddress>(),
            Err(AddressParseError::EmptyHost)
        );
        assert_eq!(
            "sip:alice@example.org:port".parse::<SipAddress>(),
            Err(AddressParseError::InvalidPort("port".to_owned()))
        );
        assert_eq!(
            "Alice <sip:alice@example.org".parse::<SipAddress>(),
            Err(AddressParseError::UnterminatedAngleBracket)
        );
    }

    #[test]
    fn clean_removes_params_and_headers_but_keeps_identity() {
        let mut address = parse("\"A\" <sip:alice@example.org:5060;tag=abc;gr=urn:x?Foo=bar>");

        address.clean();

        assert_eq!(address.as_string_uri_only(), "sip:alice@example.org:5060");
        assert_eq!(address.display_name(), Some("A"));
    }

    #[test]
    fn same_participant_normalizes_to_same_key() {
        let first = parse("\"Alice\" <sip:alice@EXAMPLE.org;tag=1>");
        let second = parse("sip:alice@example.org;gr=urn:uuid:42?X=1");

        assert_eq!(AddressKey::normalize(&first), AddressKey::normalize(&second));
        assert_eq!(AddressKey::normalize(&first).as_str(), "sip:alice@example.org");
    }

    #[test]
    fn at_sign_inside_parameter_does_not_move_the_host() {
        let address = parse("sip:alice@example.org;maddr=relay@proxy.example.org");

        assert_eq!(address.username(), Some("alice"));
        assert_eq!(address.host(), "example.org");
        assert_eq!(
            address.param("maddr"),
            Some(Some("relay@proxy.example.org"))
        );
        assert_eq!(
            AddressKey::parse("sip:alice@example.org;maddr=relay@proxy.example.org"),
            AddressKey::parse("sip:alice@example.org")
        );
    }

    #[test]
    fn host_without_user_keeps_parameters_out_of_userinfo() {
        let address = parse("sip:example.org;lr;maddr=a@b");

        assert_eq!(address.username(), None);
        assert_eq!(address.host(), "example.org");
        assert_eq!(address.param("lr"), Some(None));
    }

    #[test]
    fn rejects_garbage_after_the_host() {
        assert_eq!(
            "sip:alice@exa mple.org".parse::<SipAddress>(),
            Err(AddressParseError::TrailingInput(" mple.org".to_owned()))
        );
    }

    #[test]
    fn different_users_do_not_share_a_key() {
        let alice = AddressKey::normalize(&parse("sip:alice@example.org"));
        let bob = AddressKey::normalize(&parse("sip:bob@example.org"));

        assert_ne!(alice, bob);
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "sip:alice@example.org",
            "\"Bob\" <sips:bob@Example.org:5061;transport=tls?Subject=x>",
            "sip:[::1]:5060;lr",
            "sip:example.org",
        ];

        for raw in samples {
            let once = AddressKey::parse(raw).expect("sample should parse");
            let twice = AddressKey::parse(once.as_str()).expect("key should parse");

            assert_eq!(once, twice, "key for {raw} should be stable");
        }
    }

    #[test]
    fn formatted_name_falls_back_from_display_name_to_user_to_uri() {
        assert_eq!(parse("\"Al\" <sip:alice@example.org>").formatted_name(), "Al");
        assert_eq!(parse("sip:alice@example.org").formatted_name(), "alice");
        assert_eq!(parse("sip:example.org").formatted_name(), "sip:example.org");
    }

    #[test]
    fn display_includes_quoted_name() {
        let address = parse("Alice <sip:alice@example.org>");

        assert_eq!(address.to_string(), "\"Alice\" <sip:alice@example.org>");
    }
}
