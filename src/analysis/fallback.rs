//! When to answer with demonstration data instead of sparse real data.

use std::str::FromStr;

/// Sample count below which real aggregates are replaced by demo data.
pub const DEFAULT_MIN_SAMPLES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Use demo data when fewer than this many samples were fetched.
    MinimumSamples(usize),
    /// Always report real data, however sparse.
    Never,
    /// Always report demo data.
    Always,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        FallbackPolicy::MinimumSamples(DEFAULT_MIN_SAMPLES)
    }
}

impl FallbackPolicy {
    pub fn use_demo_data(&self, sample_count: usize) -> bool {
        match *self {
            FallbackPolicy::MinimumSamples(min) => sample_count < min,
            FallbackPolicy::Never => false,
            FallbackPolicy::Always => true,
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(FallbackPolicy::default()),
            "never" => Ok(FallbackPolicy::Never),
            "always" => Ok(FallbackPolicy::Always),
            other => Err(format!(
                "unknown fallback policy '{}', expected auto, never or always",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        let policy = FallbackPolicy::default();
        assert!(policy.use_demo_data(0));
        assert!(policy.use_demo_data(9));
        assert!(!policy.use_demo_data(10));
        assert!(!policy.use_demo_data(500));
    }

    #[test]
    fn test_forced_policies() {
        assert!(!FallbackPolicy::Never.use_demo_data(0));
        assert!(FallbackPolicy::Always.use_demo_data(10_000));
    }

    #[test]
    fn test_parse() {
        assert_eq!("AUTO".parse::<FallbackPolicy>().unwrap(), FallbackPolicy::default());
        assert_eq!("never".parse::<FallbackPolicy>().unwrap(), FallbackPolicy::Never);
        assert_eq!(" always ".parse::<FallbackPolicy>().unwrap(), FallbackPolicy::Always);
        assert!("maybe".parse::<FallbackPolicy>().is_err());
    }
}
