//! Per-installation device identity

use mindmap_fs::KvStore;
use mindmap_tree::now_millis;
use tracing::warn;
use uuid::Uuid;

/// Key under which the generated device id is persisted.
pub const DEVICE_ID_KEY: &str = "device-id";

/// Who is saving: a stable id plus a human-readable descriptor.
///
/// Constructed explicitly and handed to the
/// [`VersionStore`](crate::VersionStore), so tests can use fixed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub id: String,
    pub name: String,
}

impl DeviceIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Read the persisted device id, generating and storing one on first
    /// use. Storage failures fall back to an unpersisted id.
    pub fn load_or_create(kv: &dyn KvStore) -> Self {
        let name = detect_device_name();

        match kv.get(DEVICE_ID_KEY) {
            Ok(Some(id)) if !id.trim().is_empty() => return Self::new(id, name),
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Could not read device id");
                return Self::new(format!("device-{}", now_millis()), name);
            }
        }

        let id = generate_device_id();
        if let Err(e) = kv.set(DEVICE_ID_KEY, &id) {
            warn!(error = %e, "Could not persist device id");
        }
        Self::new(id, name)
    }

    /// Replace the detected descriptor, e.g. from user configuration.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

fn generate_device_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("device-{}-{}", now_millis(), &random[..9])
}

/// `"<OS> - <host>"`, best effort.
pub fn detect_device_name() -> String {
    let os = match std::env::consts::OS {
        "windows" => "Windows",
        "macos" => "macOS",
        "linux" => "Linux",
        "ios" => "iOS",
        "android" => "Android",
        "" => "Unknown OS",
        other => other,
    };
    let host = ["HOSTNAME", "COMPUTERNAME", "HOST"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| "Unknown Host".to_string());
    format!("{} - {}", os, host)
}
