//! SSRF-safe download URL validation.
//!
//! A URL is only fetchable when it is HTTPS, its hostname is on the
//! configured allowlist (exact match or subdomain), and every address it
//! points at is globally routable. Literal IPs are checked directly;
//! hostnames are resolved (A + AAAA) and every resolved address must pass.

use crate::error::DownloadError;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use url::{Host, Url};

/// Upper bound on DNS resolution during validation
const DNS_TIMEOUT: Duration = Duration::from_secs(5);

/// Validate a download URL against the host allowlist.
///
/// Returns `DownloadError::BadUrl` describing the first failed check.
pub fn validate_download_url(url: &str, allowed_hosts: &[String]) -> Result<(), DownloadError> {
    validate_with_resolver(url, allowed_hosts, resolve_host_addrs)
}

/// Validation with an injectable resolver, so tests can avoid real DNS.
pub(crate) fn validate_with_resolver<R>(
    url: &str,
    allowed_hosts: &[String],
    resolver: R,
) -> Result<(), DownloadError>
where
    R: Fn(&str) -> Result<Vec<IpAddr>, String>,
{
    let reject = |reason: String| DownloadError::BadUrl {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url).map_err(|e| reject(format!("invalid URL: {e}")))?;

    if parsed.scheme() != "https" {
        return Err(reject("scheme must be https".to_string()));
    }

    let host = match parsed.host() {
        None => return Err(reject("URL has no hostname".to_string())),
        Some(host) => host,
    };

    let hostname = host.to_string().to_ascii_lowercase();
    if !is_allowed_host(&hostname, allowed_hosts) {
        return Err(reject(format!("host {hostname} is not on the allowlist")));
    }

    match host {
        Host::Ipv4(ip) if !is_globally_routable(IpAddr::V4(ip)) => {
            Err(reject(format!("address {ip} is not globally routable")))
        }
        Host::Ipv6(ip) if !is_globally_routable(IpAddr::V6(ip)) => {
            Err(reject(format!("address {ip} is not globally routable")))
        }
        Host::Ipv4(_) | Host::Ipv6(_) => Ok(()),
        Host::Domain(_) => {
            let addresses = resolver(&hostname).map_err(reject)?;
            for address in addresses {
                if !is_globally_routable(address) {
                    return Err(reject(format!(
                        "host {hostname} resolves to non-global address {address}"
                    )));
                }
            }
            Ok(())
        }
    }
}

/// Whether `hostname` equals an allowlisted host or is a subdomain of one.
///
/// Both sides are compared lowercased. An empty allowlist matches nothing.
pub fn is_allowed_host(hostname: &str, allowed_hosts: &[String]) -> bool {
    let hostname = hostname.to_ascii_lowercase();
    allowed_hosts.iter().any(|allowed| {
        let allowed = allowed.to_ascii_lowercase();
        hostname == allowed || hostname.ends_with(&format!(".{allowed}"))
    })
}

/// Whether an address is reachable on the public internet.
///
/// Excludes loopback, private, link-local, multicast, reserved and
/// unspecified ranges, in both address families.
pub fn is_globally_routable(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(v4) => ipv4_is_global(v4),
        IpAddr::V6(v6) => ipv6_is_global(v6),
    }
}

fn ipv4_is_global(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_unspecified()
        // shared address space 100.64.0.0/10
        || (octets[0] == 100 && (octets[1] & 0xc0) == 64)
        // reserved 240.0.0.0/4
        || octets[0] >= 240)
}

fn ipv6_is_global(ip: Ipv6Addr) -> bool {
    // v4-mapped addresses inherit the v4 classification
    if let Some(v4) = ip.to_ipv4_mapped() {
        return ipv4_is_global(v4);
    }
    let segments = ip.segments();
    !(ip.is_loopback()
        || ip.is_multicast()
        || ip.is_unspecified()
        // unique local fc00::/7
        || (segments[0] & 0xfe00) == 0xfc00
        // link-local fe80::/10
        || (segments[0] & 0xffc0) == 0xfe80
        // documentation 2001:db8::/32
        || (segments[0] == 0x2001 && segments[1] == 0xdb8))
}

/// Resolve A + AAAA records for a hostname, bounded by `DNS_TIMEOUT`.
///
/// Resolution runs on a helper thread; if it doesn't answer in time the
/// lookup is treated as a failure and the URL is rejected.
fn resolve_host_addrs(hostname: &str) -> Result<Vec<IpAddr>, String> {
    let target = format!("{hostname}:443");
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let result = target
            .to_socket_addrs()
            .map(|addrs| addrs.map(|addr| addr.ip()).collect::<Vec<_>>())
            .map_err(|e| format!("DNS resolution failed: {e}"));
        let _ = tx.send(result);
    });

    match rx.recv_timeout(DNS_TIMEOUT) {
        Ok(result) => result,
        Err(_) => Err("DNS resolution timed out".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|h| h.to_string()).collect()
    }

    fn global_resolver(_: &str) -> Result<Vec<IpAddr>, String> {
        Ok(vec![IpAddr::V4(Ipv4Addr::new(142, 250, 80, 110))])
    }

    #[test]
    fn rejects_non_https_scheme() {
        let error = validate_download_url(
            "http://photos.google.com/unsafe",
            &hosts(&["photos.google.com"]),
        )
        .unwrap_err();
        assert!(error.to_string().contains("https"));
    }

    #[test]
    fn rejects_literal_private_ips() {
        for url in [
            "https://127.0.0.1/metadata",
            "https://10.0.0.1/payload",
            "https://[::1]/metadata",
        ] {
            assert!(
                validate_download_url(url, &hosts(&["photos.google.com"])).is_err(),
                "expected rejection for {url}"
            );
        }
    }

    #[test]
    fn rejects_literal_global_ip_not_on_allowlist() {
        let error = validate_download_url("https://8.8.8.8/x", &hosts(&["photos.google.com"]))
            .unwrap_err();
        assert!(error.to_string().contains("not on the allowlist"));
    }

    #[test]
    fn allowlisted_literal_ip_must_still_be_global() {
        // no DNS involved for literal IPs, so the real entry point is fine
        assert!(validate_download_url("https://8.8.8.8/x", &hosts(&["8.8.8.8"])).is_ok());
        assert!(validate_download_url("https://10.0.0.1/x", &hosts(&["10.0.0.1"])).is_err());
    }

    #[test]
    fn rejects_missing_hostname() {
        assert!(validate_download_url("https://", &hosts(&["photos.google.com"])).is_err());
    }

    #[test]
    fn accepts_allowed_host_with_global_address() {
        let result = validate_with_resolver(
            "https://photos.google.com/lr/abc",
            &hosts(&["photos.google.com"]),
            global_resolver,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn accepts_subdomain_of_allowed_host() {
        let result = validate_with_resolver(
            "https://lh3.googleusercontent.com/x",
            &hosts(&["googleusercontent.com"]),
            global_resolver,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_host_resolving_to_private_address() {
        let result = validate_with_resolver(
            "https://photos.google.com/lr/abc",
            &hosts(&["photos.google.com"]),
            |_| Ok(vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_resolver_failure() {
        let result = validate_with_resolver(
            "https://photos.google.com/lr/abc",
            &hosts(&["photos.google.com"]),
            |_| Err("DNS resolution timed out".to_string()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn allowed_host_supports_exact_and_subdomains() {
        let allowed = hosts(&["photos.google.com"]);

        assert!(is_allowed_host("photos.google.com", &allowed));
        assert!(is_allowed_host("a.photos.google.com", &allowed));
        assert!(is_allowed_host("PHOTOS.GOOGLE.COM", &allowed));
        assert!(!is_allowed_host("notphotos.google.com.evil.com", &allowed));
        assert!(!is_allowed_host("photos.google.com", &[]));
    }

    #[test]
    fn allowlist_entries_are_case_insensitive() {
        assert!(is_allowed_host(
            "lh3.googleusercontent.com",
            &hosts(&["GoogleUserContent.com"])
        ));
    }

    #[test]
    fn global_routability_excludes_special_ranges() {
        let non_global = [
            "127.0.0.1",
            "10.0.0.1",
            "172.16.5.5",
            "192.168.1.1",
            "169.254.0.1",
            "224.0.0.1",
            "255.255.255.255",
            "0.0.0.0",
            "100.64.0.1",
            "240.0.0.1",
            "::1",
            "::",
            "fc00::1",
            "fe80::1",
            "ff02::1",
        ];
        for raw in non_global {
            let address: IpAddr = raw.parse().unwrap();
            assert!(!is_globally_routable(address), "{raw} should be non-global");
        }

        let global = ["142.250.80.110", "8.8.8.8", "2607:f8b0:4004:c07::6a"];
        for raw in global {
            let address: IpAddr = raw.parse().unwrap();
            assert!(is_globally_routable(address), "{raw} should be global");
        }
    }

    #[test]
    fn v4_mapped_v6_is_classified_as_v4() {
        let mapped: IpAddr = "::ffff:10.0.0.1".parse().unwrap();
        assert!(!is_globally_routable(mapped));
    }
}
