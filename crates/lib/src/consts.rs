//! Shared constants.

/// Label holding the absolute project directory a container belongs to.
pub const LABEL_COMPOSE_DIR: &str = "compose-dir";

/// Label holding the service name a container instantiates.
pub const LABEL_COMPOSE_SERVICE: &str = "compose-service";

/// Label holding the configuration fingerprint computed at creation time.
pub const LABEL_CONFIG_FINGERPRINT: &str = "config-fingerprint";

/// Manifest file names probed in the project directory, in order.
pub const COMPOSE_FILE_NAMES: &[&str] = &["docker-compose.yml", "docker-compose.yaml", "compose.yml", "compose.yaml"];

/// Length of each hex segment of a fingerprint.
pub const FINGERPRINT_SEGMENT_LEN: usize = 20;

/// Lower bound for the padded service-name column.
pub const MIN_SERVICE_NAME_WIDTH: usize = 10;

/// Life-cycle state reported by the runtime for a live container.
pub const STATE_RUNNING: &str = "running";

/// Life-cycle state reported by the runtime for a stopped container.
pub const STATE_EXITED: &str = "exited";

/// Restart policy that makes `startup` bring a container back.
pub const RESTART_ALWAYS: &str = "always";

pub const DEFAULT_RUNTIME_BINARY: &str = "podman";

pub const PODMAN_SOCKET: &str = "unix:///run/podman/podman.sock";

/// Attempts made by `startup` to list containers before giving up.
pub const STARTUP_LIST_ATTEMPTS: usize = 20;
