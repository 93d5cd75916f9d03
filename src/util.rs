//! Small helpers for ids, Kubernetes names and version strings.

use std::cmp::Ordering;

use sha2::{Digest as _, Sha256};

const K8S_MAX_NAME_LENGTH: usize = 63;

/// A short stable id derived from `input` (the first 12 hex digits of its
/// SHA-256). The same input always yields the same id.
pub fn stable_uid(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest[..6].iter().map(|b| format!("{b:02x}")).collect()
}

/// A fresh short id for list rows.
pub fn short_uid() -> String {
    stable_uid(&uuid::Uuid::new_v4().to_string())
}

pub fn is_legal_k8s_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= K8S_MAX_NAME_LENGTH
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.starts_with('-')
        && !name.ends_with('-')
}

/// Lower-case `name`, replace every character that is not a letter, digit
/// or `-` with `-`, strip leading/trailing dashes and cap the length at 63.
pub fn to_legal_k8s_name(name: &str) -> String {
    if is_legal_k8s_name(name) {
        return name.to_string();
    }
    let replaced: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = replaced.trim_matches('-');
    let capped: String = trimmed.chars().take(K8S_MAX_NAME_LENGTH).collect();
    capped.trim_end_matches('-').to_string()
}

/// The registry host of an image reference: the first path component when
/// it looks like a host (`contains '.'` or `':'`, or is `localhost`).
pub fn registry_address(image: &str) -> Option<String> {
    let image = image.trim();
    let (first, rest) = image.split_once('/')?;
    if rest.is_empty() {
        return None;
    }
    (first.contains('.') || first.contains(':') || first == "localhost").then(|| first.to_string())
}

/// Compare dotted version strings numerically (`"4.10.0" > "4.9"`).
/// Non-numeric segments compare as zero.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |v: &str| -> Vec<u64> {
        v.trim()
            .trim_start_matches('v')
            .split(['.', '-', '+'])
            .map(|s| s.parse().unwrap_or(0))
            .collect()
    };
    let (left, right) = (parse(a), parse(b));
    let len = left.len().max(right.len());
    (0..len)
        .map(|i| {
            let l = left.get(i).copied().unwrap_or(0);
            let r = right.get(i).copied().unwrap_or(0);
            l.cmp(&r)
        })
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_uid_is_deterministic_and_short() {
        let a = stable_uid("DOMAIN_UID-jdbc-myds");
        assert_eq!(a, stable_uid("DOMAIN_UID-jdbc-myds"));
        assert_ne!(a, stable_uid("jdbc-myds"));
        assert_eq!(a.len(), 12);
    }

    #[test]
    fn short_uids_differ() {
        assert_ne!(short_uid(), short_uid());
    }

    #[test]
    fn legal_names_pass_through() {
        assert_eq!(to_legal_k8s_name("base-domain"), "base-domain");
    }

    #[test]
    fn illegal_names_are_converted() {
        assert_eq!(to_legal_k8s_name("base_domain"), "base-domain");
        assert_eq!(to_legal_k8s_name("My Domain!"), "my-domain");
        assert_eq!(to_legal_k8s_name("__x__"), "x");
        assert_eq!(to_legal_k8s_name(&"a".repeat(80)).len(), 63);
    }

    #[test]
    fn registry_addresses_come_from_the_first_component() {
        assert_eq!(
            registry_address("ghcr.io/oracle/weblogic-kubernetes-operator:4.1.0").as_deref(),
            Some("ghcr.io")
        );
        assert_eq!(registry_address("localhost/app").as_deref(), Some("localhost"));
        assert_eq!(registry_address("myhost:5000/app:1").as_deref(), Some("myhost:5000"));
        assert_eq!(registry_address("oracle/weblogic:12.2.1.4"), None);
        assert_eq!(registry_address("logstash:6.6.0"), None);
        assert_eq!(registry_address(""), None);
    }

    #[test]
    fn versions_compare_numerically() {
        assert_eq!(compare_versions("4.1.0", "4.1.0"), Ordering::Equal);
        assert_eq!(compare_versions("4.10.0", "4.9.3"), Ordering::Greater);
        assert_eq!(compare_versions("3.4", "4.1.0"), Ordering::Less);
        assert_eq!(compare_versions("4.1", "4.1.0"), Ordering::Equal);
        assert_eq!(compare_versions("v4.2.1", "4.1.0"), Ordering::Greater);
    }
}
