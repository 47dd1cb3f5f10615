//! Platform-specific `ping` and `traceroute` invocation

use std::time::Duration;

#[cfg(target_os = "windows")]
pub const PING_PROGRAM: &str = "ping.exe";

#[cfg(not(target_os = "windows"))]
pub const PING_PROGRAM: &str = "ping";

#[cfg(target_os = "windows")]
pub const TRACE_PROGRAM: &str = "tracert";

#[cfg(not(target_os = "windows"))]
pub const TRACE_PROGRAM: &str = "traceroute";

/// Path trace arguments; `tracert` is told not to resolve hop names
pub fn trace_args(target: &str) -> Vec<String> {
    if cfg!(target_os = "windows") {
        vec!["-d".to_string(), target.to_string()]
    } else {
        vec![target.to_string()]
    }
}

/// Whole seconds for flags that only take integers, never below one
#[cfg_attr(target_os = "windows", allow(dead_code))]
fn whole_seconds(wait: Duration) -> u64 {
    wait.as_secs().max(1)
}

/// Windows: one echo, reply timeout in milliseconds
#[cfg(target_os = "windows")]
pub fn ping_args(target: &str, wait: Duration) -> Vec<String> {
    let millis = wait.as_millis().max(1);
    vec![
        "-n".to_string(),
        "1".to_string(),
        "-w".to_string(),
        millis.to_string(),
        target.to_string(),
    ]
}

/// BSD family: one echo, `-t` bounds the whole run in seconds
#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
))]
pub fn ping_args(target: &str, wait: Duration) -> Vec<String> {
    vec![
        "-c".to_string(),
        "1".to_string(),
        "-t".to_string(),
        whole_seconds(wait).to_string(),
        target.to_string(),
    ]
}

/// Linux (iputils/busybox): one echo, `-W` bounds the reply wait in seconds
#[cfg(not(any(
    target_os = "windows",
    target_os = "macos",
    target_os = "ios",
    target_os = "freebsd",
    target_os = "openbsd",
    target_os = "netbsd",
    target_os = "dragonfly"
)))]
pub fn ping_args(target: &str, wait: Duration) -> Vec<String> {
    vec![
        "-c".to_string(),
        "1".to_string(),
        "-W".to_string(),
        whole_seconds(wait).to_string(),
        target.to_string(),
    ]
}
