// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Two socket addresses and a verbosity switch.

use boot::addr::Addr;
use boot::daemon::{DEFAULT_DOCKER, DEFAULT_LISTEN, DaemonConfig};
use clap::Parser;

#[derive(Parser)]
#[command(name = "boot")]
#[command(about = "Docker socket proxy that holds back start events until a container's boot command succeeds")]
#[command(version)]
pub struct Cli {
    /// Docker socket
    #[arg(long, env = "BOOT_DOCKER", default_value = DEFAULT_DOCKER)]
    pub docker: Addr,

    /// Boot socket
    #[arg(long, env = "BOOT_LISTEN", default_value = DEFAULT_LISTEN)]
    pub listen: Addr,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn config(&self) -> DaemonConfig {
        DaemonConfig {
            docker: self.docker.clone(),
            listen: self.listen.clone(),
        }
    }
}
