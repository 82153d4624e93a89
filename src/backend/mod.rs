//! Access to the remote secrets engine.
//!
//! [`Backend`] is the seam between the workflows and the transport: it speaks in
//! resource paths and raw JSON `data` payloads. Typed views of the payloads live in
//! [`responses`] and are produced by [`read_as`], [`list_as`] and [`write_as`].

pub mod responses;
pub mod vault;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, VaultOpenVpnError};

pub use vault::VaultClient;

/// Path-based access to a secrets engine.
///
/// Each call returns the `data` object of the backend's answer, or `None` when the
/// resource does not exist or the answer carried no data.
pub trait Backend {
    /// Reads the resource at `path`.
    fn read(&self, path: &str) -> Result<Option<Value>>;

    /// Writes `body` to the resource at `path`.
    fn write(&self, path: &str, body: &Value) -> Result<Option<Value>>;

    /// Lists the children of `path`.
    fn list(&self, path: &str) -> Result<Option<Value>>;
}

/// Joins a mount point and path segments into a backend resource path.
///
/// Surrounding slashes on the mount point are ignored, so `/pki`, `pki/` and `pki`
/// all address the same mount.
///
/// # Example
/// ```
/// use vault_openvpn::backend::resource_path;
/// assert_eq!(resource_path("/pki/", &["cert", "ca"]), "pki/cert/ca");
/// ```
pub fn resource_path(mount: &str, segments: &[&str]) -> String {
    std::iter::once(mount.trim_matches('/'))
        .chain(segments.iter().copied())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reads `path` and decodes its data into `T`.
pub fn read_as<T, B>(backend: &B, path: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    B: Backend + ?Sized,
{
    backend
        .read(path)?
        .map(|data| decode_data("read", path, data))
        .transpose()
}

/// Lists `path` and decodes its data into `T`.
pub fn list_as<T, B>(backend: &B, path: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    B: Backend + ?Sized,
{
    backend
        .list(path)?
        .map(|data| decode_data("list", path, data))
        .transpose()
}

/// Serialises `body`, writes it to `path` and decodes the answer into `T`.
pub fn write_as<T, S, B>(backend: &B, path: &str, body: &S) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: Serialize,
    B: Backend + ?Sized,
{
    let body = serde_json::to_value(body).map_err(|e| {
        VaultOpenVpnError::EncodingError(format!("request body for {path:?}: {e}"))
    })?;

    backend
        .write(path, &body)?
        .map(|data| decode_data("write", path, data))
        .transpose()
}

fn decode_data<T: DeserializeOwned>(operation: &str, path: &str, data: Value) -> Result<T> {
    serde_json::from_value(data).map_err(|e| {
        VaultOpenVpnError::DecodingError(format!(
            "unexpected {operation} response from {path:?}: {e}"
        ))
    })
}
