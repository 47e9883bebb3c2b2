//! `pollcast check-config`

use std::path::Path;

use anyhow::{Context, Result};
use pollcast_config::{
    Settings, collect_redacted_paths, collect_referenced_vars, load_and_prepare, read_document,
    validate,
};

pub async fn run(path: &Path) -> Result<()> {
    let settings = load_and_prepare(path).await?;
    let env_vars = collect_referenced_vars(&read_document(path).await?);
    println!("{}", render(path, &settings, &env_vars)?);
    Ok(())
}

fn render(path: &Path, settings: &Settings, env_vars: &[String]) -> Result<String> {
    let mut out = format!("Config OK: {}\n", path.display());
    if !env_vars.is_empty() {
        out.push_str(&format!("env: {}\n", env_vars.join(", ")));
    }

    for warning in validate(settings.config()).warnings {
        out.push_str(&format!("warning: {warning}\n"));
    }
    let masked = collect_redacted_paths(settings.document());
    if !masked.is_empty() {
        out.push_str(&format!("masked: {}\n", masked.join(", ")));
    }

    let shown = serde_json::to_string_pretty(&settings.redacted())
        .context("Failed to render config")?;
    out.push_str(&shown);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollcast_config::load_and_prepare_with;
    use std::collections::HashMap;

    #[tokio::test]
    async fn output_masks_token_and_lists_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pollcast.toml");
        tokio::fs::write(
            &path,
            "[api]\ntoken = \"${BOT_TOKEN}\"\npoll_timeout_secs = 0\n",
        )
        .await
        .unwrap();
        let env: HashMap<String, String> = [(
            "BOT_TOKEN".to_string(),
            "123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw".to_string(),
        )]
        .into();

        let settings = load_and_prepare_with(&path, &env).await.unwrap();
        let env_vars = collect_referenced_vars(&read_document(&path).await.unwrap());
        let out = render(&path, &settings, &env_vars).unwrap();

        assert!(out.starts_with("Config OK:"));
        assert!(out.contains("env: BOT_TOKEN\n"));
        assert!(out.contains("api.poll_timeout_secs"));
        assert!(out.contains("masked: api.token"));
        assert!(out.contains("\"1234***\""));
        assert!(!out.contains("AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw"));
    }
}
