use crate::core::ConfigError;
use std::fmt;
use std::time::Duration;

/// Named execution profiles. Every query shape is bound to one of them at
/// compile time; nothing looks a profile up by name at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    Default,
    Long,
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Long => write!(f, "long"),
        }
    }
}

/// Replica selection strategy of a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routing {
    None,
    /// Prefer replicas of the named datacenter before any other.
    DatacenterLocal(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPolicy {
    pub kind: PolicyKind,
    pub timeout: Duration,
    pub routing: Routing,
}

/// Both profiles, resolved once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPolicies {
    default: ExecutionPolicy,
    long: ExecutionPolicy,
}

impl ExecutionPolicies {
    /// Builds the `default` and `long` profiles.
    ///
    /// `default` uses `default_timeout` with no routing preference, `long`
    /// uses `long_timeout` and routes to `local_datacenter` first.
    pub fn build(
        default_timeout: Duration,
        long_timeout: Duration,
        local_datacenter: &str,
    ) -> Result<Self, ConfigError> {
        if default_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                profile: "default",
                value: default_timeout,
            });
        }
        if long_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout {
                profile: "long",
                value: long_timeout,
            });
        }

        Ok(Self {
            default: ExecutionPolicy {
                kind: PolicyKind::Default,
                timeout: default_timeout,
                routing: Routing::None,
            },
            long: ExecutionPolicy {
                kind: PolicyKind::Long,
                timeout: long_timeout,
                routing: Routing::DatacenterLocal(local_datacenter.to_string()),
            },
        })
    }

    pub const fn get(&self, kind: PolicyKind) -> &ExecutionPolicy {
        match kind {
            PolicyKind::Default => &self.default,
            PolicyKind::Long => &self.long,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_resolves_both_profiles() {
        let policies =
            ExecutionPolicies::build(Duration::from_secs(5), Duration::from_secs(30), "dc1").unwrap();

        let default = policies.get(PolicyKind::Default);
        assert_eq!(default.timeout, Duration::from_secs(5));
        assert_eq!(default.routing, Routing::None);
        assert_eq!(default.kind, PolicyKind::Default);

        let long = policies.get(PolicyKind::Long);
        assert_eq!(long.timeout, Duration::from_secs(30));
        assert_eq!(long.routing, Routing::DatacenterLocal("dc1".to_string()));
        assert_eq!(long.kind, PolicyKind::Long);
    }

    #[test]
    fn test_zero_default_timeout_rejected() {
        let result = ExecutionPolicies::build(Duration::ZERO, Duration::from_secs(30), "dc1");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTimeout { profile: "default", .. })
        ));
    }

    #[test]
    fn test_zero_long_timeout_rejected() {
        let result = ExecutionPolicies::build(Duration::from_secs(5), Duration::ZERO, "dc1");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidTimeout { profile: "long", .. })
        ));
    }

    #[test]
    fn test_policy_kind_display() {
        assert_eq!(PolicyKind::Default.to_string(), "default");
        assert_eq!(PolicyKind::Long.to_string(), "long");
    }
}
