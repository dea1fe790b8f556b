/// Capabilities of the host the tool runs on.
///
/// Kept as a plain value so validation can be exercised for any platform,
/// not just the one the tests happen to run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub name: &'static str,
    /// Whether a lookup can be pointed at a DNS server other than the system one.
    pub supports_resolver_override: bool,
}

impl Platform {
    pub fn current() -> Self {
        Self {
            name: std::env::consts::OS,
            supports_resolver_override: !cfg!(windows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_platform_matches_target() {
        let platform = Platform::current();
        assert_eq!(platform.name, std::env::consts::OS);
        assert_eq!(platform.supports_resolver_override, !cfg!(windows));
    }
}
