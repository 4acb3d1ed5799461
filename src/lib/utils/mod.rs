/// Small shared validation helpers
use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ARN_PATTERN: Regex = Regex::new(r"^arn:aws:[a-z0-9\-]+:[a-z0-9\-]*:[0-9]*:.+$")
        .expect("could not compile pattern");
}

#[cfg(test)]
pub mod tests {
    use std::fs::File;
    use std::io::Read;
    use std::path::PathBuf;

    use anyhow::Result;

    use crate::conf::PlatformConfig;
    use crate::utils::{ensure_arn, ensure_present};

    pub fn get_sample_resource_file(p: &str) -> Result<String> {
        let mut s = String::new();
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let file_path = root.join("resources/tests").join(p);
        let mut f = File::open(file_path)?;
        let _count = f.read_to_string(&mut s);
        Ok(s)
    }

    pub fn sample_config() -> PlatformConfig {
        let s = get_sample_resource_file("bloginfra.toml").expect("could not find bloginfra.toml");
        toml::from_str(&s).expect("could not parse sample context")
    }

    #[test]
    fn arn_pattern_accepts_real_identifiers() {
        assert!(ensure_arn(
            "certificate",
            "arn:aws:acm:us-east-1:139054167618:certificate/aac754cf-b9a9-40ae-89bc-735e03897092"
        )
        .is_ok());
        assert!(ensure_arn(
            "channel",
            "arn:aws:chatbot::139054167618:chat-configuration/slack-channel/pr-notifications"
        )
        .is_ok());
    }

    #[test]
    fn arn_pattern_rejects_garbage() {
        assert!(ensure_arn("certificate", "not-an-arn").is_err());
        assert!(ensure_arn("certificate", "arn:aws:acm").is_err());
    }

    #[test]
    fn blank_values_are_missing() {
        assert!(ensure_present("repository owner", "").is_err());
        assert!(ensure_present("repository owner", "   ").is_err());
        assert!(ensure_present("repository owner", "Acme").is_ok());
    }
}

/// Validates that a required configuration field carries a value
pub fn ensure_present(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("missing required field: {}", field));
    }
    Ok(())
}

/// Validates that a field holds a plausible resource ARN
pub fn ensure_arn(field: &str, value: &str) -> Result<()> {
    ensure_present(field, value)?;
    if !ARN_PATTERN.is_match(value) {
        return Err(anyhow!("invalid ARN for {}: {:?}", field, value));
    }
    Ok(())
}
