//! Secret backends for reading the Gauges API token.
//!
//! Each backend is configured through `GAUGES_*` variables and shells out to
//! the vendor CLI. A backend that is not configured, or whose CLI fails,
//! yields `None` so resolution can move on to the next source.

use std::process::{Command, Stdio};

/// Variable lookup used by every backend; `std::env::var` in production.
pub type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read `name` through `lookup`, trimmed, treating blank values as unset.
pub(crate) fn var(lookup: Lookup<'_>, name: &str) -> Option<String> {
    lookup(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Run a CLI and capture trimmed stdout. Stderr is discarded so secrets or
/// prompts never leak into our output.
fn capture(args: &[&str], env_extra: &[(&str, &str)]) -> Option<String> {
    let (bin, rest) = args.split_first()?;
    let mut cmd = Command::new(bin);
    cmd.args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    for (k, v) in env_extra {
        cmd.env(k, v);
    }
    let out = cmd.output().ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 1Password secret reference for the token, if configured.
///
/// - `GAUGES_OP_ENTRY_PATH`: `op://Vault/Item`
/// - or `GAUGES_OP_VAULT` + `GAUGES_OP_ITEM`
/// - `GAUGES_OP_FIELD`: field name, default `TOKEN`
pub fn one_password_uri(lookup: Lookup<'_>) -> Option<String> {
    let field = match lookup("GAUGES_OP_FIELD") {
        Some(f) => {
            let f = f.trim().to_string();
            if f.is_empty() {
                return None;
            }
            f
        }
        None => "TOKEN".to_string(),
    };
    if let Some(path) = var(lookup, "GAUGES_OP_ENTRY_PATH") {
        return Some(format!("{}/{}", path.trim_end_matches('/'), field));
    }
    let vault = var(lookup, "GAUGES_OP_VAULT")?;
    let item = var(lookup, "GAUGES_OP_ITEM")?;
    Some(format!("op://{}/{}/{}", vault, item, field))
}

/// 1Password CLI (`op read`).
pub fn one_password(lookup: Lookup<'_>) -> Option<String> {
    let uri = one_password_uri(lookup)?;
    capture(&["op", "read", &uri], &[])
}

/// Bitwarden CLI (`bw get password <GAUGES_BW_ITEM_ID>`).
///
/// `GAUGES_BW_SESSION` is forwarded as `BW_SESSION` for a locked vault.
pub fn bitwarden(lookup: Lookup<'_>) -> Option<String> {
    let id = var(lookup, "GAUGES_BW_ITEM_ID")?;
    match var(lookup, "GAUGES_BW_SESSION") {
        Some(session) => capture(
            &["bw", "get", "password", &id],
            &[("BW_SESSION", session.as_str())],
        ),
        None => capture(&["bw", "get", "password", &id], &[]),
    }
}

/// KeePassXC CLI (`keepassxc-cli show -a <attr> <db> <entry>`).
///
/// - `GAUGES_KPXC_DB`: path to the .kdbx file
/// - `GAUGES_KPXC_ENTRY`: entry title or path
/// - `GAUGES_KPXC_ATTRIBUTE`: default `Password`
pub fn keepassxc(lookup: Lookup<'_>) -> Option<String> {
    let db = var(lookup, "GAUGES_KPXC_DB")?;
    let entry = var(lookup, "GAUGES_KPXC_ENTRY")?;
    let attr = lookup("GAUGES_KPXC_ATTRIBUTE").unwrap_or_else(|| "Password".to_string());
    let attr = attr.trim();
    if attr.is_empty() {
        return None;
    }
    capture(&["keepassxc-cli", "show", "-a", attr, &db, &entry], &[])
}
