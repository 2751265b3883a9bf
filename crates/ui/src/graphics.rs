//! Terminal graphics detection for cover rendering.

use std::time::Duration;

use ratatui_image::picker::{Capability, Picker, ProtocolType, cap_parser::QueryStdioOptions};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TerminalHint {
    Kitty,
    Iterm,
    Tmux,
    Plain,
}

fn env_non_empty(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .is_some_and(|value| !value.trim().is_empty())
}

fn env_contains(key: &str, needle: &str) -> bool {
    std::env::var(key)
        .ok()
        .is_some_and(|value| value.contains(needle))
}

pub(crate) fn terminal_hint() -> TerminalHint {
    if env_non_empty("ITERM_SESSION_ID")
        || env_contains("TERM_PROGRAM", "iTerm")
        || env_contains("LC_TERMINAL", "iTerm")
    {
        return TerminalHint::Iterm;
    }

    // `KITTY_WINDOW_ID` is not forwarded over SSH, `TERM` is.
    if env_non_empty("KITTY_WINDOW_ID")
        || std::env::var("TERM")
            .ok()
            .is_some_and(|term| term.trim().starts_with("xterm-kitty"))
    {
        return TerminalHint::Kitty;
    }

    if std::env::var_os("TMUX").is_some() {
        return TerminalHint::Tmux;
    }

    TerminalHint::Plain
}

/// How long to wait for the terminal to answer a capability query, or `None`
/// when querying is pointless and halfblocks should be used directly.
pub(crate) fn query_timeout(hint: TerminalHint) -> Option<Duration> {
    match hint {
        TerminalHint::Kitty | TerminalHint::Iterm => Some(Duration::from_millis(1500)),
        TerminalHint::Tmux => Some(Duration::from_millis(300)),
        TerminalHint::Plain => None,
    }
}

fn allow_tmux_passthrough() {
    if std::env::var_os("TMUX").is_none() {
        return;
    }

    // Failures are ignored (old tmux, restricted env).
    let _ = std::process::Command::new("tmux")
        .args(["set-option", "-g", "allow-passthrough", "on"])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status();
}

fn prefer_kitty(picker: &mut Picker, hint: TerminalHint) -> bool {
    let supported = match hint {
        TerminalHint::Iterm => false,
        TerminalHint::Kitty => env_non_empty("KITTY_WINDOW_ID")
            || picker
                .capabilities()
                .iter()
                .any(|cap| matches!(cap, Capability::Kitty)),
        TerminalHint::Tmux | TerminalHint::Plain => picker
            .capabilities()
            .iter()
            .any(|cap| matches!(cap, Capability::Kitty)),
    };
    if supported {
        picker.set_protocol_type(ProtocolType::Kitty);
    }
    supported
}

pub(crate) fn protocol_label(picker: &Picker) -> &'static str {
    match picker.protocol_type() {
        ProtocolType::Halfblocks => "halfblocks",
        ProtocolType::Sixel => "sixel",
        ProtocolType::Kitty => "kitty",
        ProtocolType::Iterm2 => "iterm2",
    }
}

/// Must run after raw mode is enabled: the query reads the terminal's reply
/// from stdin.
pub(crate) fn build_picker(background: image::Rgba<u8>) -> Picker {
    let hint = terminal_hint();
    allow_tmux_passthrough();

    let mut picker = match query_timeout(hint) {
        Some(timeout) => {
            let mut options = QueryStdioOptions::default();
            options.timeout = timeout;
            options.text_sizing_protocol = false;
            Picker::from_query_stdio_with_options(options).unwrap_or_else(|err| {
                debug!(error = %err, "terminal graphics query failed");
                Picker::halfblocks()
            })
        }
        None => Picker::halfblocks(),
    };
    picker.set_background_color(background);
    prefer_kitty(&mut picker, hint);
    debug!(?hint, protocol = protocol_label(&picker), "graphics protocol selected");
    picker
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::{Mutex, OnceLock};

    const HINT_VARS: [&str; 6] = [
        "KITTY_WINDOW_ID",
        "TERM",
        "TMUX",
        "ITERM_SESSION_ID",
        "TERM_PROGRAM",
        "LC_TERMINAL",
    ];

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn with_hint_env<T>(vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = env_lock().lock().unwrap();

        let prev = HINT_VARS
            .iter()
            .map(|key| ((*key).to_string(), std::env::var_os(key)))
            .collect::<Vec<(String, Option<OsString>)>>();

        for key in HINT_VARS {
            unsafe { std::env::remove_var(key) };
        }
        for (key, value) in vars {
            unsafe { std::env::set_var(key, value) };
        }

        let out = f();

        for (key, value) in prev {
            match value {
                Some(v) => unsafe { std::env::set_var(key, v) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
        out
    }

    #[test]
    fn plain_terminal_skips_query() {
        let hint = with_hint_env(&[("TERM", "xterm-256color")], terminal_hint);
        assert_eq!(hint, TerminalHint::Plain);
        assert_eq!(query_timeout(hint), None);
    }

    #[test]
    fn kitty_detected_from_term_or_window_id() {
        assert_eq!(
            with_hint_env(&[("TERM", "xterm-kitty")], terminal_hint),
            TerminalHint::Kitty
        );
        assert_eq!(
            with_hint_env(&[("KITTY_WINDOW_ID", "3")], terminal_hint),
            TerminalHint::Kitty
        );
        assert_eq!(
            query_timeout(TerminalHint::Kitty),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn iterm_wins_over_kitty_term() {
        let hint = with_hint_env(
            &[("TERM", "xterm-kitty"), ("TERM_PROGRAM", "iTerm.app")],
            terminal_hint,
        );
        assert_eq!(hint, TerminalHint::Iterm);
    }

    #[test]
    fn tmux_queries_quickly() {
        let hint = with_hint_env(&[("TMUX", "/tmp/tmux-1000/default,1,0")], terminal_hint);
        assert_eq!(hint, TerminalHint::Tmux);
        assert_eq!(query_timeout(hint), Some(Duration::from_millis(300)));
    }

    #[test]
    fn kitty_preferred_only_with_reliable_signal() {
        with_hint_env(&[], || {
            let mut picker = Picker::halfblocks();
            assert!(!prefer_kitty(&mut picker, TerminalHint::Plain));
            assert_eq!(protocol_label(&picker), "halfblocks");
        });
        with_hint_env(&[("KITTY_WINDOW_ID", "1")], || {
            let mut picker = Picker::halfblocks();
            assert!(prefer_kitty(&mut picker, TerminalHint::Kitty));
            assert_eq!(protocol_label(&picker), "kitty");
        });
        let mut picker = Picker::halfblocks();
        assert!(!prefer_kitty(&mut picker, TerminalHint::Iterm));
    }
}
