//! Local checks run before anything is sent to the cluster

use std::time::Duration;

use velero_rest_common::Error;

/// Longest DNS-1123 subdomain
pub const MAX_SUBDOMAIN_LEN: usize = 253;

/// Longest DNS-1123 label
pub const MAX_LABEL_LEN: usize = 63;

const SUBDOMAIN_MESSAGE: &str = "a lowercase RFC 1123 subdomain must consist of lower case \
     alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character";

const LABEL_MESSAGE: &str = "a lowercase RFC 1123 label must consist of lower case \
     alphanumeric characters or '-', and must start and end with an alphanumeric character";

fn is_label(s: &str, allow_dot: bool) -> bool {
    let bytes = s.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    let edge_ok = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    edge_ok(first)
        && edge_ok(last)
        && bytes
            .iter()
            .all(|b| edge_ok(b) || *b == b'-' || (allow_dot && *b == b'.'))
}

/// Validate an object name (DNS-1123 subdomain)
pub fn validate_object_name(kind: &str, name: &str) -> Result<(), Error> {
    if name.len() > MAX_SUBDOMAIN_LEN {
        return Err(Error::validation(format!(
            "invalid {kind} name \"{name}\": must be no more than {MAX_SUBDOMAIN_LEN} characters"
        )));
    }
    if !is_label(name, true) {
        return Err(Error::validation(format!(
            "invalid {kind} name \"{name}\": {SUBDOMAIN_MESSAGE}"
        )));
    }
    Ok(())
}

/// Validate a namespace selector: a DNS-1123 label, or `*` for every namespace
pub fn validate_namespace(namespace: &str) -> Result<(), Error> {
    if namespace == "*" {
        return Ok(());
    }
    if namespace.len() > MAX_LABEL_LEN || !is_label(namespace, false) {
        return Err(Error::validation(format!(
            "invalid namespace \"{namespace}\": {LABEL_MESSAGE}"
        )));
    }
    Ok(())
}

/// Parse a Go duration string such as `720h`, `1h30m` or `90s`.
///
/// Velero stores TTLs in this format. Fractions are accepted (`1.5h`); a sign,
/// an empty string or a value too large for a `Duration` is not.
pub fn parse_go_duration(input: &str) -> Option<Duration> {
    if input == "0" {
        return Some(Duration::ZERO);
    }

    let mut rest = input;
    let mut total = 0f64;
    if rest.is_empty() {
        return None;
    }

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_len == 0 {
            return None;
        }
        let value: f64 = rest[..number_len].parse().ok()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let seconds = match &rest[..unit_len] {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 1e-3,
            "us" | "µs" => 1e-6,
            "ns" => 1e-9,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total += value * seconds;
    }

    if !total.is_finite() {
        return None;
    }
    Duration::try_from_secs_f64(total).ok()
}

/// Validate a backup TTL
pub fn validate_ttl(ttl: &str) -> Result<(), Error> {
    parse_go_duration(ttl).map(|_| ()).ok_or_else(|| {
        Error::validation(format!(
            "invalid ttl \"{ttl}\": expected a duration such as 720h or 72h30m"
        ))
    })
}
