//! Per-run line prefix resolution.
//!
//! The prefix is computed exactly once, inside the worker thread before the
//! first entry is taken. A bad or unresolvable host name disables host-name
//! prefixing for the run; it never stops the worker.

use log::warn;

use crate::config::ShipperConfig;

/// Characters that invalidate an explicitly configured host name.
const FORBIDDEN_HOST_NAME_CHARS: &[char] = &[
    '/', '\\', '[', ']', '"', ':', ';', '|', '<', '>', '+', '=', ',', '?', '*', ' ', '_',
];

/// True when an explicitly configured host name may be used in the prefix.
pub(crate) fn is_valid_host_name(name: &str) -> bool {
    !name.contains(FORBIDDEN_HOST_NAME_CHARS)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve the local machine name without touching the configuration.
fn resolve_machine_name() -> Option<String> {
    if let Ok(name) = std::env::var("HOSTNAME")
        && !name.trim().is_empty()
    {
        return Some(name);
    }
    #[cfg(unix)]
    if let Ok(name) = nix::unistd::gethostname()
        && let Some(name) = name.to_str()
        && !name.is_empty()
    {
        return Some(name.to_owned());
    }
    #[cfg(windows)]
    if let Ok(name) = std::env::var("COMPUTERNAME")
        && !name.trim().is_empty()
    {
        return Some(name);
    }
    None
}

/// Build the prefix prepended to every frame of this worker run.
///
/// Layout is `"<logID> "` then `"HostName=<hostname> "`, each segment
/// present only when configured and valid; the empty string otherwise.
pub(crate) fn build(config: &ShipperConfig) -> String {
    let host_segment = if config.use_host_name {
        resolve_host_name(config)
    } else {
        None
    };

    let mut prefix = String::new();
    if let Some(log_id) = non_blank(config.log_id.as_deref()) {
        prefix.push_str(log_id);
        prefix.push(' ');
    }
    if let Some(host) = host_segment {
        prefix.push_str("HostName=");
        prefix.push_str(&host);
        prefix.push(' ');
    }
    prefix
}

fn resolve_host_name(config: &ShipperConfig) -> Option<String> {
    match non_blank(config.host_name.as_deref()) {
        Some(name) => {
            if is_valid_host_name(name) {
                Some(name.to_owned())
            } else {
                warn!("logferry: configured host name {name:?} contains forbidden characters; host-name prefixing disabled");
                None
            }
        }
        // Auto-resolved names are used as-is, without validation.
        None => match resolve_machine_name() {
            Some(name) => Some(name),
            None => {
                warn!("logferry: local host name could not be resolved; host-name prefixing disabled");
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn config_with(
        log_id: Option<&str>,
        use_host_name: bool,
        host_name: Option<&str>,
    ) -> ShipperConfig {
        ShipperConfig {
            log_id: log_id.map(str::to_owned),
            use_host_name,
            host_name: host_name.map(str::to_owned),
            ..ShipperConfig::default()
        }
    }

    #[rstest]
    #[case("box-01")]
    #[case("web.example.com")]
    #[case("A1")]
    fn accepts_alphanumeric_dot_dash_names(#[case] name: &str) {
        assert!(is_valid_host_name(name));
    }

    #[rstest]
    #[case("bad/name")]
    #[case("bad\\name")]
    #[case("bad[name")]
    #[case("bad]name")]
    #[case("bad\"name")]
    #[case("bad:name")]
    #[case("bad;name")]
    #[case("bad|name")]
    #[case("bad<name")]
    #[case("bad>name")]
    #[case("bad+name")]
    #[case("bad=name")]
    #[case("bad,name")]
    #[case("bad?name")]
    #[case("bad*name")]
    #[case("bad name")]
    #[case("bad_name")]
    fn rejects_every_forbidden_character(#[case] name: &str) {
        assert!(!is_valid_host_name(name));
    }

    #[rstest]
    fn empty_when_nothing_configured() {
        assert_eq!(build(&config_with(None, false, None)), "");
    }

    #[rstest]
    fn log_id_segment_only() {
        assert_eq!(build(&config_with(Some("app"), false, None)), "app ");
    }

    #[rstest]
    fn explicit_host_name_segment() {
        assert_eq!(
            build(&config_with(None, true, Some("box-01"))),
            "HostName=box-01 "
        );
    }

    #[rstest]
    fn combines_log_id_and_host_name() {
        assert_eq!(
            build(&config_with(Some("app"), true, Some("box-01"))),
            "app HostName=box-01 "
        );
    }

    #[rstest]
    fn invalid_host_name_disables_the_segment() {
        assert_eq!(build(&config_with(Some("app"), true, Some("bad_name"))), "app ");
    }

    #[rstest]
    fn blank_log_id_is_ignored() {
        assert_eq!(build(&config_with(Some("  "), false, None)), "");
    }
}
