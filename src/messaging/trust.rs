// --- Origin Allow-List ---

/// Gate every inbound cross-context message before any other component sees
/// it. Accepts an origin only when its host is exactly an allow-listed
/// domain or a subdomain of one; anything else is dropped without ceremony,
/// since foreign-origin probing is ordinary background noise on a busy page.
#[derive(Debug, Clone)]
pub struct TrustGate {
    allowed: Vec<String>,
}

impl TrustGate {
    pub fn new<S: AsRef<str>>(domains: &[S]) -> Self {
        TrustGate {
            allowed: domains
                .iter()
                .map(|d| d.as_ref().trim().to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn accept(&self, origin: &str) -> bool {
        let Some(host) = host_of(origin) else {
            return false;
        };
        self.allowed.iter().any(|domain| {
            host == *domain
                || (host.len() > domain.len()
                    && host.ends_with(domain.as_str())
                    && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
        })
    }
}

impl Default for TrustGate {
    fn default() -> Self {
        TrustGate::new(crate::config::DEFAULT_TRUSTED_ORIGINS)
    }
}

/// Extract the lowercased host from an origin like `https://a.b.net:443`.
/// Bare hostnames pass through unchanged.
fn host_of(origin: &str) -> Option<String> {
    let trimmed = origin.trim();
    let rest = match trimmed.find("://") {
        Some(idx) => &trimmed[idx + 3..],
        None => trimmed,
    };
    let mut host = rest.split('/').next().unwrap_or("");
    if let Some((h, port)) = host.rsplit_once(':') {
        if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) {
            host = h;
        }
    }
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}
