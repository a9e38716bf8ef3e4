// ABOUTME: Boot command resolution from the container's `boot` label.
// ABOUTME: Pure parsing into a closed set of actions; no I/O.

use crate::runtime::ContainerInfo;
use crate::types::ContainerId;
use std::fmt;

/// Label holding the boot command.
pub const BOOT_LABEL: &str = "boot";

/// Shell used for `CMD` boot commands.
pub const SHELL: [&str; 2] = ["/bin/sh", "-c"];

/// What to run once a container has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootAction {
    /// Nothing declared; the start counts as ready.
    None,
    /// `CMD ...`: the rest of the label run through `/bin/sh -c`.
    Shell {
        container: ContainerId,
        argv: Vec<String>,
    },
    /// Anything else: the label's tokens used verbatim as argv.
    Raw {
        container: ContainerId,
        argv: Vec<String>,
    },
}

impl BootAction {
    pub fn argv(&self) -> Option<&[String]> {
        match self {
            BootAction::None => None,
            BootAction::Shell { argv, .. } | BootAction::Raw { argv, .. } => Some(argv),
        }
    }
}

impl fmt::Display for BootAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argv() {
            None => f.write_str("NONE"),
            Some(argv) => write!(f, "{:?}", argv),
        }
    }
}

/// Derive the boot action from a container's labels.
///
/// The label value is split on single spaces. A first token of `NONE`
/// disables the check, `CMD` wraps the remaining tokens (re-joined with
/// spaces) in a shell, and anything else is executed as-is.
pub fn resolve(container: &ContainerInfo) -> BootAction {
    let Some(label) = container.labels.get(BOOT_LABEL) else {
        return BootAction::None;
    };

    let mut tokens = label.split(' ');
    match tokens.next() {
        Some("NONE") => BootAction::None,
        Some("CMD") => {
            let script = tokens.collect::<Vec<_>>().join(" ");
            let mut argv: Vec<String> = SHELL.iter().map(|s| s.to_string()).collect();
            argv.push(script);
            BootAction::Shell {
                container: container.id.clone(),
                argv,
            }
        }
        _ => BootAction::Raw {
            container: container.id.clone(),
            argv: label.split(' ').map(str::to_string).collect(),
        },
    }
}
