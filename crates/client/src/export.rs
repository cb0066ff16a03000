//! Saving a log export somewhere the user can get at it.

use socketdeck_core::LogExport;

/// Offer the export as a file download. Returns the file name.
#[cfg(target_arch = "wasm32")]
pub fn save(export: &LogExport, file_name: &str) -> anyhow::Result<String> {
    use anyhow::{anyhow, Context};
    use wasm_bindgen::JsCast;

    let json = export.to_json_pretty().context("serializing logs")?;
    let href = data_url(&json);

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| anyhow!("no document"))?;
    let body = document.body().ok_or_else(|| anyhow!("no document body"))?;
    let anchor = document
        .create_element("a")
        .map_err(|e| anyhow!("create anchor: {:?}", e))?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| anyhow!("element is not an anchor"))?;
    anchor.set_href(&href);
    anchor.set_download(file_name);

    // Detached anchors are not clickable everywhere.
    body.append_child(&anchor).map_err(|e| anyhow!("attach anchor: {:?}", e))?;
    anchor.click();
    anchor.remove();

    Ok(file_name.to_string())
}

/// `data:` URL carrying the export as JSON.
#[cfg(target_arch = "wasm32")]
fn data_url(json: &str) -> String {
    format!("data:application/json;charset=utf-8,{}", urlencoding::encode(json))
}

/// Write the export into the working directory. Returns the path written.
#[cfg(not(target_arch = "wasm32"))]
pub fn save(export: &LogExport, file_name: &str) -> anyhow::Result<String> {
    let dir = std::env::current_dir()?;
    save_in(export, &dir.join(file_name))
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save_in(export: &LogExport, path: &std::path::Path) -> anyhow::Result<String> {
    use anyhow::Context;

    let json = export.to_json_pretty().context("serializing logs")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    crate::log_info!("exported {} connection log(s) to {}", export.len(), path.display());
    Ok(path.display().to_string())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use socketdeck_core::{ConnectionId, ExportEntry};

    #[test]
    fn writes_pretty_json_keyed_by_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("websocket_logs_2024-05-01.json");

        let mut export = LogExport::default();
        export.push(
            ConnectionId(3),
            ExportEntry {
                url: "ws://host/a".into(),
                log: "[10:00:00] hi\n".into(),
            },
        );
        save_in(&export, &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["Connection 3"]["url"], "ws://host/a");
        assert_eq!(written["Connection 3"]["log"], "[10:00:00] hi\n");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("out.json");
        assert!(save_in(&LogExport::default(), &path).is_err());
    }
}
