// ABOUTME: Throwaway containers on the local Docker daemon for opt-in runtime tests.
// ABOUTME: Each container is force-removed when its guard drops.

use bollard::Docker;
use bollard::models::ContainerCreateBody;
use bollard::query_parameters::{
    CreateContainerOptions, CreateImageOptions, RemoveContainerOptions, StartContainerOptions,
};
use boot::addr::Addr;
use boot::daemon::DEFAULT_DOCKER;
use boot::types::ContainerId;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

const IMAGE: &str = "alpine:3.20";

static NEXT: AtomicUsize = AtomicUsize::new(0);

/// Daemon address, overridable with `BOOT_TEST_DOCKER`.
pub fn docker_addr() -> Addr {
    let raw = std::env::var("BOOT_TEST_DOCKER").unwrap_or_else(|_| DEFAULT_DOCKER.to_string());
    Addr::parse(&raw).expect("BOOT_TEST_DOCKER should be a daemon address")
}

fn client() -> Docker {
    match docker_addr() {
        Addr::Unix(path) => Docker::connect_with_unix(
            path.to_str().expect("socket path should be UTF-8"),
            120,
            bollard::API_DEFAULT_VERSION,
        ),
        addr @ Addr::Tcp(_) => {
            Docker::connect_with_http(&addr.to_string(), 120, bollard::API_DEFAULT_VERSION)
        }
    }
    .expect("docker client")
}

/// A container running `sleep`, removed on drop.
pub struct TestContainer {
    docker: Docker,
    id: String,
}

impl TestContainer {
    /// Create a container with an optional `boot` label, and start it unless `start` is false.
    pub async fn create(boot: Option<&str>, start: bool) -> Self {
        let docker = client();
        pull(&docker).await;

        let mut labels = HashMap::new();
        if let Some(value) = boot {
            labels.insert("boot".to_string(), value.to_string());
        }
        let name = format!(
            "boot-test-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        );

        let config = ContainerCreateBody {
            image: Some(IMAGE.to_string()),
            cmd: Some(vec!["sleep".to_string(), "300".to_string()]),
            labels: Some(labels),
            ..Default::default()
        };
        let created = docker
            .create_container(
                Some(CreateContainerOptions {
                    name: Some(name),
                    ..Default::default()
                }),
                config,
            )
            .await
            .expect("create container");

        let container = Self {
            docker,
            id: created.id,
        };
        if start {
            container
                .docker
                .start_container(&container.id, None::<StartContainerOptions>)
                .await
                .expect("start container");
        }
        container
    }

    pub fn id(&self) -> ContainerId {
        ContainerId::new(self.id.clone())
    }
}

impl Drop for TestContainer {
    fn drop(&mut self) {
        let id = std::mem::take(&mut self.id);
        // The test's runtime cannot be blocked on from inside it, so clean up on a fresh one.
        let cleanup = std::thread::spawn(move || {
            let Ok(rt) = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            else {
                return;
            };
            rt.block_on(async {
                let _ = client()
                    .remove_container(
                        &id,
                        Some(RemoveContainerOptions {
                            force: true,
                            ..Default::default()
                        }),
                    )
                    .await;
            });
        });
        let _ = cleanup.join();
    }
}

async fn pull(docker: &Docker) {
    let mut pull_stream = docker.create_image(
        Some(CreateImageOptions {
            from_image: Some(IMAGE.to_string()),
            ..Default::default()
        }),
        None,
        None,
    );
    while let Some(result) = pull_stream.next().await {
        result.expect("pull test image");
    }
}
